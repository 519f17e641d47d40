//! Position CRUD over a [`PositionStore`].

use crate::domain::error::{TradebookError, ValidationError};
use crate::domain::normalize::normalize_position;
use crate::domain::position::{NewPosition, Position, PositionStatus};
use crate::domain::trade_constraint::ensure_within_trade_limit;
use crate::domain::validation::{validate_position, validate_trade};
use crate::ports::clock_port::Clock;
use crate::ports::store_port::{PositionStore, POSITIONS};

use super::new_id;

#[derive(Clone, Copy)]
pub struct PositionService<'a> {
    store: &'a dyn PositionStore,
    clock: &'a dyn Clock,
}

impl<'a> PositionService<'a> {
    pub fn new(store: &'a dyn PositionStore, clock: &'a dyn Clock) -> Self {
        Self { store, clock }
    }

    /// Validate and persist a new planned position.
    pub fn create(&self, new: NewPosition) -> Result<Position, TradebookError> {
        let position = Position::assemble(new, new_id(), self.clock.now());
        validate_position(&position, self.clock.today())?;
        let position = normalize_position(position);
        self.store.insert_position(&position)?;
        tracing::info!(
            position_id = %position.id,
            symbol = %position.symbol,
            strategy = %position.strategy_type,
            "position created"
        );
        Ok(position)
    }

    pub fn get_by_id(&self, id: &str) -> Result<Option<Position>, TradebookError> {
        Ok(self.store.get_position(id)?.map(normalize_position))
    }

    pub fn require(&self, id: &str) -> Result<Position, TradebookError> {
        self.get_by_id(id)?
            .ok_or_else(|| TradebookError::not_found(POSITIONS, id))
    }

    pub fn get_all(&self) -> Result<Vec<Position>, TradebookError> {
        Ok(self
            .store
            .list_positions()?
            .into_iter()
            .map(normalize_position)
            .collect())
    }

    pub fn get_by_symbol(&self, symbol: &str) -> Result<Vec<Position>, TradebookError> {
        Ok(self
            .store
            .positions_by_symbol(symbol)?
            .into_iter()
            .map(normalize_position)
            .collect())
    }

    pub fn get_by_status(&self, status: PositionStatus) -> Result<Vec<Position>, TradebookError> {
        Ok(self
            .store
            .positions_by_status(status)?
            .into_iter()
            .map(normalize_position)
            .collect())
    }

    /// Replace a stored position.
    ///
    /// `created_date` and `trades` are immutable here; trades are added only
    /// through the trade service. Once a trade is recorded, the fields it was
    /// executed against (symbol, strategy, trade kind, option terms) are fixed
    /// too. Option expirations are checked against the creation date, so later
    /// edits of a position whose contract has since expired remain possible.
    pub fn update(&self, position: &Position) -> Result<(), TradebookError> {
        let position = &normalize_position(position.clone());
        let existing = self.require(&position.id)?;
        if existing.created_date != position.created_date {
            return Err(ValidationError::new("created_date cannot be changed").into());
        }
        if existing.trades != position.trades {
            return Err(
                ValidationError::new("trades can only be added through the trade service").into(),
            );
        }
        if existing.has_trades()
            && (existing.symbol != position.symbol
                || existing.strategy_type != position.strategy_type
                || existing.trade_kind != position.trade_kind
                || existing.option != position.option)
        {
            return Err(ValidationError::new(
                "symbol, strategy and option terms cannot change once a trade is recorded",
            )
            .into());
        }
        ensure_within_trade_limit(position)?;
        validate_position(position, position.created_date.date_naive())?;
        for trade in &position.trades {
            validate_trade(trade, position)?;
        }

        self.store.update_position(position)?;
        tracing::debug!(position_id = %position.id, "position updated");
        Ok(())
    }

    /// Append a journal entry id, keeping the list free of duplicates.
    pub fn link_journal_entry(
        &self,
        position_id: &str,
        entry_id: &str,
    ) -> Result<Position, TradebookError> {
        let mut position = self.require(position_id)?;
        if !position.journal_entry_ids.iter().any(|id| id == entry_id) {
            position.journal_entry_ids.push(entry_id.to_string());
            self.update(&position)?;
        }
        Ok(position)
    }

    /// Drop a journal entry id from the position's list. Missing ids are ignored.
    pub fn unlink_journal_entry(
        &self,
        position_id: &str,
        entry_id: &str,
    ) -> Result<Position, TradebookError> {
        let mut position = self.require(position_id)?;
        let before = position.journal_entry_ids.len();
        position.journal_entry_ids.retain(|id| id != entry_id);
        if position.journal_entry_ids.len() != before {
            self.update(&position)?;
        }
        Ok(position)
    }

    pub fn delete(&self, id: &str) -> Result<(), TradebookError> {
        self.store.delete_position(id)?;
        tracing::info!(position_id = %id, "position deleted");
        Ok(())
    }

    pub fn clear_all(&self) -> Result<(), TradebookError> {
        self.store.clear_positions()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sqlite_adapter::SqliteAdapter;
    use crate::adapters::system_clock::FixedClock;
    use crate::domain::position::{
        OptionTerms, OptionType, PriceBasis, StrategyType, TradeKind,
    };
    use crate::domain::trade::{NewTrade, TradeType};
    use crate::services::trade_service::TradeService;
    use chrono::{NaiveDate, TimeZone, Utc};

    fn clock() -> FixedClock {
        FixedClock(Utc.with_ymd_and_hms(2024, 6, 3, 14, 30, 0).unwrap())
    }

    fn store() -> SqliteAdapter {
        let store = SqliteAdapter::in_memory().unwrap();
        store.initialize_schema().unwrap();
        store
    }

    fn long_stock() -> NewPosition {
        NewPosition {
            symbol: "aapl".into(),
            strategy_type: StrategyType::LongStock,
            trade_kind: TradeKind::Stock,
            target_entry_price: 150.0,
            target_quantity: 100.0,
            profit_target: 165.0,
            profit_target_basis: None,
            stop_loss: 135.0,
            stop_loss_basis: None,
            option: None,
            position_thesis: "Services margin expansion".into(),
        }
    }

    fn short_put(expiration: NaiveDate) -> NewPosition {
        NewPosition {
            symbol: "SPY".into(),
            strategy_type: StrategyType::ShortPut,
            trade_kind: TradeKind::Option,
            target_entry_price: 2.25,
            target_quantity: 10.0,
            profit_target: 0.5,
            profit_target_basis: Some(PriceBasis::OptionPrice),
            stop_loss: 505.0,
            stop_loss_basis: Some(PriceBasis::StockPrice),
            option: Some(OptionTerms {
                option_type: OptionType::Put,
                strike_price: 520.0,
                expiration_date: expiration,
                premium_per_contract: 2.25,
            }),
            position_thesis: "Collect premium below support".into(),
        }
    }

    #[test]
    fn create_then_get_round_trips() {
        let (store, clock) = (store(), clock());
        let service = PositionService::new(&store, &clock);
        let created = service.create(long_stock()).unwrap();

        assert_eq!(created.symbol, "AAPL");
        assert_eq!(created.status, PositionStatus::Planned);
        assert_eq!(created.created_date, clock.now());
        assert_eq!(created.profit_target_basis, Some(PriceBasis::StockPrice));
        assert!(created.journal_entry_ids.is_empty());
        assert_eq!(service.get_by_id(&created.id).unwrap(), Some(created));
    }

    #[test]
    fn invalid_position_is_not_persisted() {
        let (store, clock) = (store(), clock());
        let service = PositionService::new(&store, &clock);
        let mut new = long_stock();
        new.target_entry_price = 0.0;
        let err = service.create(new).unwrap_err();
        assert_eq!(err.to_string(), "target_entry_price must be positive");
        assert!(service.get_all().unwrap().is_empty());
    }

    #[test]
    fn expired_short_put_rejected() {
        let (store, clock) = (store(), clock());
        let service = PositionService::new(&store, &clock);
        let err = service
            .create(short_put(NaiveDate::from_ymd_opt(2024, 5, 31).unwrap()))
            .unwrap_err();
        assert_eq!(err.to_string(), "expiration_date cannot be in the past");
        assert!(service.get_all().unwrap().is_empty());
    }

    #[test]
    fn short_put_keeps_option_terms() {
        let (store, clock) = (store(), clock());
        let service = PositionService::new(&store, &clock);
        let created = service
            .create(short_put(NaiveDate::from_ymd_opt(2024, 7, 19).unwrap()))
            .unwrap();
        let fetched = service.require(&created.id).unwrap();
        assert_eq!(fetched.option.as_ref().unwrap().strike_price, 520.0);
        assert_eq!(fetched.profit_target_basis, Some(PriceBasis::OptionPrice));
    }

    #[test]
    fn update_rejects_immutable_changes() {
        let (store, clock) = (store(), clock());
        let service = PositionService::new(&store, &clock);
        let created = service.create(long_stock()).unwrap();

        let mut moved = created.clone();
        moved.created_date = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(
            service.update(&moved).unwrap_err().to_string(),
            "created_date cannot be changed"
        );

        let mut edited = created.clone();
        edited.profit_target = 170.0;
        service.update(&edited).unwrap();
        assert_eq!(service.require(&created.id).unwrap().profit_target, 170.0);
    }

    #[test]
    fn update_revalidates_whole_record() {
        let (store, clock) = (store(), clock());
        let service = PositionService::new(&store, &clock);
        let mut pos = service.create(long_stock()).unwrap();
        pos.position_thesis = "short".into();
        assert_eq!(
            service.update(&pos).unwrap_err().to_string(),
            "position_thesis must be at least 10 characters"
        );
    }

    #[test]
    fn traded_position_cannot_switch_strategy() {
        let (store, clock) = (store(), clock());
        let service = PositionService::new(&store, &clock);
        let trades = TradeService::new(&store, &clock);
        let pos = service.create(long_stock()).unwrap();
        trades
            .add_trade(NewTrade {
                position_id: pos.id.clone(),
                trade_type: TradeType::Buy,
                quantity: 100.0,
                price: 149.5,
                timestamp: None,
                underlying_price_at_trade: None,
                option: None,
            })
            .unwrap();

        let traded = service.require(&pos.id).unwrap();
        let put = short_put(NaiveDate::from_ymd_opt(2024, 7, 19).unwrap());
        let mut switched = traded.clone();
        switched.strategy_type = put.strategy_type;
        switched.trade_kind = put.trade_kind;
        switched.option = put.option;
        switched.profit_target_basis = put.profit_target_basis;
        switched.stop_loss_basis = put.stop_loss_basis;

        assert_eq!(
            service.update(&switched).unwrap_err().to_string(),
            "symbol, strategy and option terms cannot change once a trade is recorded"
        );
        assert_eq!(service.require(&pos.id).unwrap(), traded);

        let mut edited = traded.clone();
        edited.position_thesis = "Services margin expansion, raised target".into();
        edited.profit_target = 170.0;
        service.update(&edited).unwrap();
        assert_eq!(service.require(&pos.id).unwrap(), edited);
    }

    #[test]
    fn update_normalizes_symbol() {
        let (store, clock) = (store(), clock());
        let service = PositionService::new(&store, &clock);
        let mut pos = service.create(long_stock()).unwrap();
        pos.symbol = " msft ".into();
        service.update(&pos).unwrap();

        let stored = service.require(&pos.id).unwrap();
        assert_eq!(stored.symbol, "MSFT");
        assert_eq!(service.get_by_symbol("msft").unwrap(), vec![stored]);
    }

    #[test]
    fn unlink_journal_entry_keeps_others() {
        let (store, clock) = (store(), clock());
        let service = PositionService::new(&store, &clock);
        let pos = service.create(long_stock()).unwrap();
        service.link_journal_entry(&pos.id, "j1").unwrap();
        service.link_journal_entry(&pos.id, "j2").unwrap();

        service.unlink_journal_entry(&pos.id, "j1").unwrap();
        let unlinked = service.unlink_journal_entry(&pos.id, "missing").unwrap();
        assert_eq!(unlinked.journal_entry_ids, vec!["j2".to_string()]);
        assert_eq!(service.require(&pos.id).unwrap().journal_entry_ids, vec!["j2".to_string()]);
    }

    #[test]
    fn update_missing_is_not_found() {
        let (store, clock) = (store(), clock());
        let service = PositionService::new(&store, &clock);
        let mut pos = service.create(long_stock()).unwrap();
        pos.id = "nope".into();
        assert!(matches!(
            service.update(&pos),
            Err(TradebookError::NotFound { .. })
        ));
    }

    #[test]
    fn link_journal_entry_is_idempotent() {
        let (store, clock) = (store(), clock());
        let service = PositionService::new(&store, &clock);
        let pos = service.create(long_stock()).unwrap();
        service.link_journal_entry(&pos.id, "j1").unwrap();
        let linked = service.link_journal_entry(&pos.id, "j1").unwrap();
        assert_eq!(linked.journal_entry_ids, vec!["j1".to_string()]);
    }

    #[test]
    fn lookups_delete_and_clear() {
        let (store, clock) = (store(), clock());
        let service = PositionService::new(&store, &clock);
        let a = service.create(long_stock()).unwrap();
        service.create(long_stock()).unwrap();
        assert_eq!(service.get_by_symbol("AAPL").unwrap().len(), 2);
        assert_eq!(service.get_by_status(PositionStatus::Planned).unwrap().len(), 2);

        service.delete(&a.id).unwrap();
        assert!(service.get_by_id(&a.id).unwrap().is_none());
        assert!(matches!(
            service.delete(&a.id),
            Err(TradebookError::NotFound { .. })
        ));

        service.clear_all().unwrap();
        assert!(service.get_all().unwrap().is_empty());
    }
}
