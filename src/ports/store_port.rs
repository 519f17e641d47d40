//! Record storage port traits.
//!
//! Writes are whole-record. `insert_*` rejects an existing id with
//! `DuplicateRecord`; `update_*` and `delete_*` reject a missing one with
//! `NotFound`. Reads return records exactly as stored; normalization is the
//! caller's concern.

use crate::domain::error::TradebookError;
use crate::domain::journal::{JournalEntry, JournalEntryType};
use crate::domain::position::{Position, PositionStatus};

pub const POSITIONS: &str = "positions";
pub const JOURNAL_ENTRIES: &str = "journal_entries";

pub trait PositionStore {
    fn insert_position(&self, position: &Position) -> Result<(), TradebookError>;
    fn get_position(&self, id: &str) -> Result<Option<Position>, TradebookError>;
    /// All positions, oldest first.
    fn list_positions(&self) -> Result<Vec<Position>, TradebookError>;
    fn positions_by_symbol(&self, symbol: &str) -> Result<Vec<Position>, TradebookError>;
    fn positions_by_status(&self, status: PositionStatus) -> Result<Vec<Position>, TradebookError>;
    fn update_position(&self, position: &Position) -> Result<(), TradebookError>;
    fn delete_position(&self, id: &str) -> Result<(), TradebookError>;
    fn clear_positions(&self) -> Result<(), TradebookError>;
}

pub trait JournalStore {
    fn insert_entry(&self, entry: &JournalEntry) -> Result<(), TradebookError>;
    fn get_entry(&self, id: &str) -> Result<Option<JournalEntry>, TradebookError>;
    /// All entries, oldest first.
    fn list_entries(&self) -> Result<Vec<JournalEntry>, TradebookError>;
    fn entries_by_position(&self, position_id: &str) -> Result<Vec<JournalEntry>, TradebookError>;
    fn entries_by_trade(&self, trade_id: &str) -> Result<Vec<JournalEntry>, TradebookError>;
    fn entries_by_type(
        &self,
        entry_type: JournalEntryType,
    ) -> Result<Vec<JournalEntry>, TradebookError>;
    fn update_entry(&self, entry: &JournalEntry) -> Result<(), TradebookError>;
    fn delete_entry(&self, id: &str) -> Result<(), TradebookError>;
    fn clear_entries(&self) -> Result<(), TradebookError>;
}
