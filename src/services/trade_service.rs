//! Trade entry against a position, under the single-trade rule.

use crate::domain::error::TradebookError;
use crate::domain::normalize::normalize_position;
use crate::domain::position::{Position, PositionStatus};
use crate::domain::trade::{derive_option_execution, NewTrade, Trade};
use crate::domain::trade_constraint::{ensure_can_add_trade, trade_entry_state, TradeEntryState};
use crate::domain::validation::{validate_position, validate_trade};
use crate::ports::clock_port::Clock;
use crate::ports::store_port::{PositionStore, POSITIONS};

use super::new_id;

#[derive(Clone, Copy)]
pub struct TradeService<'a> {
    store: &'a dyn PositionStore,
    clock: &'a dyn Clock,
}

impl<'a> TradeService<'a> {
    pub fn new(store: &'a dyn PositionStore, clock: &'a dyn Clock) -> Self {
        Self { store, clock }
    }

    fn load(&self, position_id: &str) -> Result<Position, TradebookError> {
        self.store
            .get_position(position_id)?
            .map(normalize_position)
            .ok_or_else(|| TradebookError::not_found(POSITIONS, position_id))
    }

    /// Whether a trade-entry form should be offered for this position.
    pub fn entry_state(&self, position_id: &str) -> Result<TradeEntryState, TradebookError> {
        Ok(trade_entry_state(&self.load(position_id)?))
    }

    pub fn get_trades(&self, position_id: &str) -> Result<Vec<Trade>, TradebookError> {
        Ok(self.load(position_id)?.trades)
    }

    /// Record a fill and persist the owning position in one update.
    ///
    /// The single-trade rule is checked before anything is written. Fills on
    /// option positions that arrive without execution metadata get it derived
    /// from the position's contract terms.
    pub fn add_trade(&self, new: NewTrade) -> Result<Trade, TradebookError> {
        let mut position = self.load(&new.position_id)?;
        if let Err(e) = ensure_can_add_trade(&position) {
            tracing::warn!(position_id = %position.id, "trade rejected: {e}");
            return Err(e);
        }

        let option = match (new.option, position.option.as_ref()) {
            (Some(exec), _) => Some(exec),
            (None, Some(terms)) if position.is_option_strategy() => Some(derive_option_execution(
                &position.symbol,
                terms,
                new.trade_type,
                new.quantity,
                new.underlying_price_at_trade,
            )),
            (None, _) => None,
        };
        let trade = Trade {
            id: new_id(),
            position_id: position.id.clone(),
            trade_type: new.trade_type,
            quantity: new.quantity,
            price: new.price,
            timestamp: new.timestamp.unwrap_or_else(|| self.clock.now()),
            option,
        };
        validate_trade(&trade, &position)?;

        position.trades.push(trade.clone());
        position.status = PositionStatus::Open;
        validate_position(&position, position.created_date.date_naive())?;
        self.store.update_position(&position)?;

        tracing::info!(
            position_id = %position.id,
            trade_id = %trade.id,
            quantity = trade.quantity,
            price = trade.price,
            "trade recorded"
        );
        Ok(trade)
    }
}
