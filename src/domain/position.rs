//! Position records: a planned or executed trade idea.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::timestamp::{flexible_date, flexible_datetime};
use super::trade::Trade;

/// Shares per listed option contract.
pub const CONTRACT_MULTIPLIER: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StrategyType {
    #[serde(rename = "Long Stock")]
    LongStock,
    #[serde(rename = "Short Put")]
    ShortPut,
}

impl StrategyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyType::LongStock => "Long Stock",
            StrategyType::ShortPut => "Short Put",
        }
    }

    /// The trade kind a position of this strategy must carry.
    pub fn required_trade_kind(&self) -> TradeKind {
        match self {
            StrategyType::LongStock => TradeKind::Stock,
            StrategyType::ShortPut => TradeKind::Option,
        }
    }
}

impl fmt::Display for StrategyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeKind {
    Stock,
    Option,
}

impl TradeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TradeKind::Stock => "stock",
            TradeKind::Option => "option",
        }
    }
}

impl fmt::Display for TradeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether an exit target is quoted in underlying or option price terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceBasis {
    #[default]
    StockPrice,
    OptionPrice,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionType {
    Put,
    Call,
}

impl OptionType {
    pub fn occ_code(&self) -> char {
        match self {
            OptionType::Put => 'P',
            OptionType::Call => 'C',
        }
    }
}

/// Contract terms carried only by option strategies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionTerms {
    pub option_type: OptionType,
    pub strike_price: f64,
    #[serde(with = "flexible_date")]
    pub expiration_date: NaiveDate,
    pub premium_per_contract: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PositionStatus {
    #[default]
    Planned,
    Open,
}

impl PositionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PositionStatus::Planned => "planned",
            PositionStatus::Open => "open",
        }
    }
}

impl fmt::Display for PositionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Caller-supplied fields of a position before the store assigns identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewPosition {
    pub symbol: String,
    pub strategy_type: StrategyType,
    pub trade_kind: TradeKind,
    pub target_entry_price: f64,
    pub target_quantity: f64,
    pub profit_target: f64,
    #[serde(default)]
    pub profit_target_basis: Option<PriceBasis>,
    pub stop_loss: f64,
    #[serde(default)]
    pub stop_loss_basis: Option<PriceBasis>,
    #[serde(default)]
    pub option: Option<OptionTerms>,
    pub position_thesis: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub id: String,
    pub symbol: String,
    pub strategy_type: StrategyType,
    pub trade_kind: TradeKind,
    pub target_entry_price: f64,
    pub target_quantity: f64,
    pub profit_target: f64,
    #[serde(default)]
    pub profit_target_basis: Option<PriceBasis>,
    pub stop_loss: f64,
    #[serde(default)]
    pub stop_loss_basis: Option<PriceBasis>,
    #[serde(default)]
    pub option: Option<OptionTerms>,
    pub position_thesis: String,
    #[serde(default)]
    pub status: PositionStatus,
    #[serde(default)]
    pub journal_entry_ids: Vec<String>,
    #[serde(default)]
    pub trades: Vec<Trade>,
    #[serde(with = "flexible_datetime")]
    pub created_date: DateTime<Utc>,
}

impl Position {
    /// Build a planned position from caller input.
    pub fn assemble(new: NewPosition, id: String, created_date: DateTime<Utc>) -> Self {
        Position {
            id,
            symbol: new.symbol.trim().to_uppercase(),
            strategy_type: new.strategy_type,
            trade_kind: new.trade_kind,
            target_entry_price: new.target_entry_price,
            target_quantity: new.target_quantity,
            profit_target: new.profit_target,
            profit_target_basis: new.profit_target_basis,
            stop_loss: new.stop_loss,
            stop_loss_basis: new.stop_loss_basis,
            option: new.option,
            position_thesis: new.position_thesis,
            status: PositionStatus::Planned,
            journal_entry_ids: Vec::new(),
            trades: Vec::new(),
            created_date,
        }
    }

    pub fn is_option_strategy(&self) -> bool {
        self.strategy_type == StrategyType::ShortPut
    }

    pub fn has_trades(&self) -> bool {
        !self.trades.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_new() -> NewPosition {
        NewPosition {
            symbol: " aapl ".into(),
            strategy_type: StrategyType::LongStock,
            trade_kind: TradeKind::Stock,
            target_entry_price: 150.0,
            target_quantity: 100.0,
            profit_target: 165.0,
            profit_target_basis: None,
            stop_loss: 135.0,
            stop_loss_basis: None,
            option: None,
            position_thesis: "Earnings momentum into the print".into(),
        }
    }

    #[test]
    fn assemble_starts_planned_and_empty() {
        let at = Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap();
        let pos = Position::assemble(sample_new(), "p-1".into(), at);
        assert_eq!(pos.id, "p-1");
        assert_eq!(pos.symbol, "AAPL");
        assert_eq!(pos.status, PositionStatus::Planned);
        assert!(pos.journal_entry_ids.is_empty());
        assert!(!pos.has_trades());
        assert_eq!(pos.created_date, at);
    }

    #[test]
    fn strategy_serde_names() {
        assert_eq!(
            serde_json::to_string(&StrategyType::ShortPut).unwrap(),
            "\"Short Put\""
        );
        let s: StrategyType = serde_json::from_str("\"Long Stock\"").unwrap();
        assert_eq!(s, StrategyType::LongStock);
        assert_eq!(
            serde_json::to_string(&PriceBasis::OptionPrice).unwrap(),
            "\"option_price\""
        );
    }

    #[test]
    fn required_trade_kind_per_strategy() {
        assert_eq!(StrategyType::LongStock.required_trade_kind(), TradeKind::Stock);
        assert_eq!(StrategyType::ShortPut.required_trade_kind(), TradeKind::Option);
    }

    #[test]
    fn legacy_document_defaults() {
        let json = r#"{
            "id": "p-9", "symbol": "MSFT", "strategy_type": "Long Stock",
            "trade_kind": "stock", "target_entry_price": 300, "target_quantity": 10,
            "profit_target": 330, "stop_loss": 280,
            "position_thesis": "Cloud growth re-acceleration",
            "created_date": "2023-11-02"
        }"#;
        let pos: Position = serde_json::from_str(json).unwrap();
        assert!(pos.journal_entry_ids.is_empty());
        assert!(pos.trades.is_empty());
        assert_eq!(pos.status, PositionStatus::Planned);
        assert_eq!(pos.profit_target_basis, None);
        assert_eq!(
            pos.created_date,
            Utc.with_ymd_and_hms(2023, 11, 2, 0, 0, 0).unwrap()
        );
    }
}
