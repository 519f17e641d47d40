//! Journal entry CRUD over a [`JournalStore`].

use crate::domain::error::{TradebookError, ValidationError};
use crate::domain::journal::{JournalEntry, JournalEntryType, NewJournalEntry};
use crate::domain::validation::validate_journal_entry;
use crate::ports::clock_port::Clock;
use crate::ports::store_port::{JournalStore, JOURNAL_ENTRIES};

use super::new_id;
use super::position_service::PositionService;

#[derive(Clone, Copy)]
pub struct JournalService<'a> {
    store: &'a dyn JournalStore,
    positions: PositionService<'a>,
    clock: &'a dyn Clock,
}

impl<'a> JournalService<'a> {
    pub fn new(
        store: &'a dyn JournalStore,
        positions: PositionService<'a>,
        clock: &'a dyn Clock,
    ) -> Self {
        Self {
            store,
            positions,
            clock,
        }
    }

    /// Checks that the entry's position exists and owns the referenced trade.
    fn check_references(&self, entry: &JournalEntry) -> Result<(), TradebookError> {
        let position = self.positions.require(&entry.position_id)?;
        if let Some(trade_id) = &entry.trade_id {
            if !position.trades.iter().any(|t| &t.id == trade_id) {
                return Err(ValidationError::new(format!(
                    "trade {trade_id} does not belong to position {}",
                    position.id
                ))
                .into());
            }
        }
        Ok(())
    }

    /// Validate and persist an entry. Does not touch the position's `journal_entry_ids`.
    pub fn create(&self, new: NewJournalEntry) -> Result<JournalEntry, TradebookError> {
        let entry = JournalEntry::assemble(new, new_id(), self.clock.now());
        validate_journal_entry(&entry)?;
        self.check_references(&entry)?;
        self.store.insert_entry(&entry)?;
        tracing::info!(
            entry_id = %entry.id,
            position_id = %entry.position_id,
            entry_type = %entry.entry_type,
            "journal entry created"
        );
        Ok(entry)
    }

    /// Create an entry and link it from its position.
    ///
    /// If linking fails the entry is removed again and the linking error returned.
    pub fn add_to_position(&self, new: NewJournalEntry) -> Result<JournalEntry, TradebookError> {
        let entry = self.create(new)?;
        if let Err(e) = self.positions.link_journal_entry(&entry.position_id, &entry.id) {
            tracing::warn!(entry_id = %entry.id, "linking journal entry failed, removing it: {e}");
            if let Err(cleanup) = self.store.delete_entry(&entry.id) {
                tracing::error!(entry_id = %entry.id, "journal entry cleanup failed: {cleanup}");
            }
            return Err(e);
        }
        Ok(entry)
    }

    pub fn get_by_id(&self, id: &str) -> Result<Option<JournalEntry>, TradebookError> {
        self.store.get_entry(id)
    }

    pub fn get_all(&self) -> Result<Vec<JournalEntry>, TradebookError> {
        self.store.list_entries()
    }

    pub fn get_by_position_id(&self, position_id: &str) -> Result<Vec<JournalEntry>, TradebookError> {
        self.store.entries_by_position(position_id)
    }

    pub fn get_by_trade_id(&self, trade_id: &str) -> Result<Vec<JournalEntry>, TradebookError> {
        self.store.entries_by_trade(trade_id)
    }

    pub fn get_by_entry_type(
        &self,
        entry_type: JournalEntryType,
    ) -> Result<Vec<JournalEntry>, TradebookError> {
        self.store.entries_by_type(entry_type)
    }

    /// Replace an entry's fields. Ownership and creation time are fixed.
    pub fn update(&self, entry: &JournalEntry) -> Result<(), TradebookError> {
        let existing = self
            .store
            .get_entry(&entry.id)?
            .ok_or_else(|| TradebookError::not_found(JOURNAL_ENTRIES, &entry.id))?;
        if existing.position_id != entry.position_id
            || existing.trade_id != entry.trade_id
            || existing.entry_type != entry.entry_type
        {
            return Err(ValidationError::new(
                "journal entries cannot be moved to another position, trade or type",
            )
            .into());
        }
        if existing.created_at != entry.created_at {
            return Err(ValidationError::new("created_at cannot be changed").into());
        }
        validate_journal_entry(entry)?;
        self.store.update_entry(entry)
    }

    /// Delete an entry and drop its id from the owning position.
    ///
    /// The position is unlinked first; if the delete then fails the link is
    /// restored and the delete error returned.
    pub fn delete(&self, id: &str) -> Result<(), TradebookError> {
        let owner = match self.store.get_entry(id)? {
            Some(entry) => self.positions.get_by_id(&entry.position_id)?,
            None => None,
        };
        if let Some(position) = &owner {
            self.positions.unlink_journal_entry(&position.id, id)?;
        }
        if let Err(e) = self.store.delete_entry(id) {
            if let Some(position) = &owner {
                if let Err(relink) = self.positions.link_journal_entry(&position.id, id) {
                    tracing::error!(entry_id = %id, "restoring journal link failed: {relink}");
                }
            }
            return Err(e);
        }
        tracing::info!(entry_id = %id, "journal entry deleted");
        Ok(())
    }

    pub fn clear_all(&self) -> Result<(), TradebookError> {
        self.store.clear_entries()
    }
}
