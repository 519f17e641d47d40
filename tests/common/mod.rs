#![allow(dead_code)]

use std::cell::Cell;

use chrono::{NaiveDate, TimeZone, Utc};
use tradebook::adapters::sqlite_adapter::SqliteAdapter;
pub use tradebook::adapters::system_clock::FixedClock;
use tradebook::domain::error::TradebookError;
use tradebook::domain::journal::{JournalEntry, JournalEntryType, JournalField};
use tradebook::domain::position::{
    NewPosition, OptionTerms, OptionType, Position, PositionStatus, PriceBasis, StrategyType,
    TradeKind,
};
use tradebook::domain::trade::{NewTrade, TradeType};
use tradebook::ports::store_port::{JournalStore, PositionStore};

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Monday 2024-06-03, mid-session.
pub fn clock() -> FixedClock {
    FixedClock(Utc.with_ymd_and_hms(2024, 6, 3, 14, 30, 0).unwrap())
}

pub fn store() -> SqliteAdapter {
    let store = SqliteAdapter::in_memory().unwrap();
    store.initialize_schema().unwrap();
    store
}

pub fn long_stock() -> NewPosition {
    NewPosition {
        symbol: "AAPL".into(),
        strategy_type: StrategyType::LongStock,
        trade_kind: TradeKind::Stock,
        target_entry_price: 150.0,
        target_quantity: 100.0,
        profit_target: 165.0,
        profit_target_basis: None,
        stop_loss: 135.0,
        stop_loss_basis: None,
        option: None,
        position_thesis: "Services margin expansion into earnings".into(),
    }
}

pub fn short_put(expiration: NaiveDate) -> NewPosition {
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
        position_thesis: "Collect premium above the 520 support shelf".into(),
    }
}

pub fn buy(position_id: &str, quantity: f64, price: f64) -> NewTrade {
    NewTrade {
        position_id: position_id.into(),
        trade_type: TradeType::Buy,
        quantity,
        price,
        timestamp: None,
        underlying_price_at_trade: None,
        option: None,
    }
}

pub fn sell_to_open(position_id: &str, contracts: f64, premium: f64) -> NewTrade {
    NewTrade {
        position_id: position_id.into(),
        trade_type: TradeType::Sell,
        quantity: contracts,
        price: premium,
        timestamp: None,
        underlying_price_at_trade: Some(531.0),
        option: None,
    }
}

pub fn plan_fields() -> Vec<JournalField> {
    vec![
        JournalField::answer(
            JournalEntryType::PositionPlan,
            "thesis",
            "Earnings catalyst with tight risk",
        )
        .unwrap(),
    ]
}

/// A [`PositionStore`] that can be told to reject updates.
pub struct FlakyPositionStore<'a> {
    pub inner: &'a dyn PositionStore,
    pub fail_updates: Cell<bool>,
}

impl<'a> FlakyPositionStore<'a> {
    pub fn new(inner: &'a dyn PositionStore) -> Self {
        Self {
            inner,
            fail_updates: Cell::new(false),
        }
    }
}

fn injected(what: &str) -> TradebookError {
    TradebookError::Database {
        reason: format!("injected {what} failure"),
    }
}

impl PositionStore for FlakyPositionStore<'_> {
    fn insert_position(&self, position: &Position) -> Result<(), TradebookError> {
        self.inner.insert_position(position)
    }
    fn get_position(&self, id: &str) -> Result<Option<Position>, TradebookError> {
        self.inner.get_position(id)
    }
    fn list_positions(&self) -> Result<Vec<Position>, TradebookError> {
        self.inner.list_positions()
    }
    fn positions_by_symbol(&self, symbol: &str) -> Result<Vec<Position>, TradebookError> {
        self.inner.positions_by_symbol(symbol)
    }
    fn positions_by_status(&self, status: PositionStatus) -> Result<Vec<Position>, TradebookError> {
        self.inner.positions_by_status(status)
    }
    fn update_position(&self, position: &Position) -> Result<(), TradebookError> {
        if self.fail_updates.get() {
            return Err(injected("position update"));
        }
        self.inner.update_position(position)
    }
    fn delete_position(&self, id: &str) -> Result<(), TradebookError> {
        self.inner.delete_position(id)
    }
    fn clear_positions(&self) -> Result<(), TradebookError> {
        self.inner.clear_positions()
    }
}

/// A [`JournalStore`] that can be told to reject inserts.
pub struct FailingJournalStore<'a> {
    pub inner: &'a dyn JournalStore,
    pub fail_inserts: Cell<bool>,
}

impl<'a> FailingJournalStore<'a> {
    pub fn new(inner: &'a dyn JournalStore) -> Self {
        Self {
            inner,
            fail_inserts: Cell::new(true),
        }
    }
}

impl JournalStore for FailingJournalStore<'_> {
    fn insert_entry(&self, entry: &JournalEntry) -> Result<(), TradebookError> {
        if self.fail_inserts.get() {
            return Err(injected("journal insert"));
        }
        self.inner.insert_entry(entry)
    }
    fn get_entry(&self, id: &str) -> Result<Option<JournalEntry>, TradebookError> {
        self.inner.get_entry(id)
    }
    fn list_entries(&self) -> Result<Vec<JournalEntry>, TradebookError> {
        self.inner.list_entries()
    }
    fn entries_by_position(&self, position_id: &str) -> Result<Vec<JournalEntry>, TradebookError> {
        self.inner.entries_by_position(position_id)
    }
    fn entries_by_trade(&self, trade_id: &str) -> Result<Vec<JournalEntry>, TradebookError> {
        self.inner.entries_by_trade(trade_id)
    }
    fn entries_by_type(
        &self,
        entry_type: JournalEntryType,
    ) -> Result<Vec<JournalEntry>, TradebookError> {
        self.inner.entries_by_type(entry_type)
    }
    fn update_entry(&self, entry: &JournalEntry) -> Result<(), TradebookError> {
        self.inner.update_entry(entry)
    }
    fn delete_entry(&self, id: &str) -> Result<(), TradebookError> {
        self.inner.delete_entry(id)
    }
    fn clear_entries(&self) -> Result<(), TradebookError> {
        self.inner.clear_entries()
    }
}
