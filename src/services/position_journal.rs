//! Creates a position together with its plan journal entry.
//!
//! The two records live in separate collections. Consistency is kept by
//! compensation: if the entry cannot be written or linked after the position
//! was stored, the position (and any written entry) is deleted again and the
//! original error is returned. Cleanup is best-effort; a crash between the
//! writes can still leave a position without its plan entry.

use serde::{Deserialize, Serialize};

use crate::domain::error::TradebookError;
use crate::domain::journal::{JournalEntry, JournalEntryType, JournalField, NewJournalEntry};
use crate::domain::position::{NewPosition, Position};

use super::journal_service::JournalService;
use super::position_service::PositionService;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionWithJournalInput {
    pub position: NewPosition,
    pub journal_fields: Vec<JournalField>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionWithJournal {
    pub position: Position,
    pub journal_entry: JournalEntry,
}

#[derive(Clone, Copy)]
pub struct PositionJournalTransaction<'a> {
    positions: PositionService<'a>,
    journal: JournalService<'a>,
}

impl<'a> PositionJournalTransaction<'a> {
    pub fn new(positions: PositionService<'a>, journal: JournalService<'a>) -> Self {
        Self { positions, journal }
    }

    pub fn create_position_with_journal(
        &self,
        input: PositionWithJournalInput,
    ) -> Result<PositionWithJournal, TradebookError> {
        let position = self.positions.create(input.position)?;

        let journal_entry = match self.journal.create(NewJournalEntry {
            position_id: position.id.clone(),
            trade_id: None,
            entry_type: JournalEntryType::PositionPlan,
            fields: input.journal_fields,
        }) {
            Ok(entry) => entry,
            Err(e) => {
                self.roll_back(&position.id, None, &e);
                return Err(e);
            }
        };

        match self
            .positions
            .link_journal_entry(&position.id, &journal_entry.id)
        {
            Ok(position) => Ok(PositionWithJournal {
                position,
                journal_entry,
            }),
            Err(e) => {
                self.roll_back(&position.id, Some(&journal_entry.id), &e);
                Err(e)
            }
        }
    }

    fn roll_back(&self, position_id: &str, entry_id: Option<&str>, cause: &TradebookError) {
        tracing::warn!(%position_id, "position+journal create failed, rolling back: {cause}");
        if let Some(entry_id) = entry_id {
            if let Err(e) = self.journal.delete(entry_id) {
                tracing::error!(%entry_id, "rollback could not delete journal entry: {e}");
            }
        }
        if let Err(e) = self.positions.delete(position_id) {
            tracing::error!(%position_id, "rollback could not delete position: {e}");
        }
    }
}
