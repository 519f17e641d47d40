//! Read-side normalization of stored records.

use super::position::{Position, PositionStatus, PriceBasis};

/// Fill schema defaults left unset by older writers and re-derive status from trades.
/// The symbol is trimmed and uppercased.
pub fn normalize_position(mut position: Position) -> Position {
    position.symbol = position.symbol.trim().to_uppercase();
    position.profit_target_basis.get_or_insert(PriceBasis::default());
    position.stop_loss_basis.get_or_insert(PriceBasis::default());
    position.status = if position.trades.is_empty() {
        PositionStatus::Planned
    } else {
        PositionStatus::Open
    };
    let mut seen = std::collections::HashSet::new();
    position
        .journal_entry_ids
        .retain(|id| seen.insert(id.clone()));
    position
}
