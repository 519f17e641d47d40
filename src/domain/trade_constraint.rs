//! Single-trade lifecycle rule for the current phase.

use super::error::TradebookError;
use super::position::Position;

pub const PHASE_LABEL: &str = "Phase 1A";
pub const MAX_TRADES_PER_POSITION: usize = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradeSlot {
    NoTrade,
    HasTrade,
}

impl TradeSlot {
    pub fn of(position: &Position) -> Self {
        if position.trades.is_empty() {
            TradeSlot::NoTrade
        } else {
            TradeSlot::HasTrade
        }
    }
}

/// What a trade-entry screen should show for a position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TradeEntryState {
    Available,
    Blocked { message: String },
}

fn limit_error() -> TradebookError {
    TradebookError::TradeLimit {
        phase: PHASE_LABEL.to_string(),
    }
}

pub fn ensure_can_add_trade(position: &Position) -> Result<(), TradebookError> {
    match TradeSlot::of(position) {
        TradeSlot::NoTrade => Ok(()),
        TradeSlot::HasTrade => Err(limit_error()),
    }
}

/// Guards whole-record writes, which could otherwise smuggle in extra trades.
pub fn ensure_within_trade_limit(position: &Position) -> Result<(), TradebookError> {
    if position.trades.len() > MAX_TRADES_PER_POSITION {
        return Err(limit_error());
    }
    Ok(())
}

pub fn trade_entry_state(position: &Position) -> TradeEntryState {
    match ensure_can_add_trade(position) {
        Ok(()) => TradeEntryState::Available,
        Err(e) => TradeEntryState::Blocked {
            message: e.to_string(),
        },
    }
}
