//! Services: validated CRUD façades over the stores.
//!
//! Services are plain `Copy` values borrowing their ports. [`Tradebook`]
//! wires a full set from one position store, one journal store and a clock.

pub mod journal_service;
pub mod position_journal;
pub mod position_service;
pub mod trade_service;

use crate::ports::clock_port::Clock;
use crate::ports::store_port::{JournalStore, PositionStore};

use journal_service::JournalService;
use position_journal::PositionJournalTransaction;
use position_service::PositionService;
use trade_service::TradeService;

pub(crate) fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

#[derive(Clone, Copy)]
pub struct Tradebook<'a> {
    pub positions: PositionService<'a>,
    pub trades: TradeService<'a>,
    pub journal: JournalService<'a>,
    pub transactions: PositionJournalTransaction<'a>,
}

impl<'a> Tradebook<'a> {
    pub fn new(
        position_store: &'a dyn PositionStore,
        journal_store: &'a dyn JournalStore,
        clock: &'a dyn Clock,
    ) -> Self {
        let positions = PositionService::new(position_store, clock);
        let journal = JournalService::new(journal_store, positions, clock);
        Self {
            positions,
            trades: TradeService::new(position_store, clock),
            journal,
            transactions: PositionJournalTransaction::new(positions, journal),
        }
    }
}
