//! Trades: individual fills applied to a position.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::position::{OptionTerms, OptionType};
use super::timestamp::{flexible_date, flexible_datetime};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeType {
    Buy,
    Sell,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptionAction {
    SellToOpen,
    BuyToClose,
    BuyToOpen,
    SellToClose,
    Expired,
    Assigned,
}

/// Option execution metadata recorded with a fill on an option strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionExecution {
    pub action: OptionAction,
    pub occ_symbol: String,
    pub option_type: OptionType,
    pub strike_price: f64,
    #[serde(with = "flexible_date")]
    pub expiration_date: NaiveDate,
    pub contract_quantity: u32,
    #[serde(default)]
    pub underlying_price_at_trade: Option<f64>,
    #[serde(default)]
    pub created_stock_position_id: Option<String>,
    #[serde(default)]
    pub cost_basis_adjustment: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub id: String,
    pub position_id: String,
    pub trade_type: TradeType,
    pub quantity: f64,
    pub price: f64,
    #[serde(with = "flexible_datetime")]
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub option: Option<OptionExecution>,
}

/// A fill as entered by the caller; id and default timestamp come from the service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTrade {
    pub position_id: String,
    pub trade_type: TradeType,
    pub quantity: f64,
    pub price: f64,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub underlying_price_at_trade: Option<f64>,
    #[serde(default)]
    pub option: Option<OptionExecution>,
}

/// Longest underlying root an OCC symbol can carry.
pub const OCC_ROOT_MAX_CHARS: usize = 6;

/// Standard 21-character OCC contract symbol, e.g. `SPY   250117P00520000`.
///
/// Roots longer than [`OCC_ROOT_MAX_CHARS`] are cut to fit; option positions
/// reject such symbols up front.
pub fn build_occ_symbol(
    underlying: &str,
    expiration: NaiveDate,
    option_type: OptionType,
    strike: f64,
) -> String {
    let strike_thousandths = (strike * 1000.0).round() as u64;
    let root: String = underlying
        .trim()
        .to_uppercase()
        .chars()
        .take(OCC_ROOT_MAX_CHARS)
        .collect();
    format!(
        "{:<6}{}{}{:08}",
        root,
        expiration.format("%y%m%d"),
        option_type.occ_code(),
        strike_thousandths
    )
}

/// Derive execution metadata for a fill on an option position that arrived without it.
pub fn derive_option_execution(
    underlying: &str,
    terms: &OptionTerms,
    trade_type: TradeType,
    quantity: f64,
    underlying_price_at_trade: Option<f64>,
) -> OptionExecution {
    let action = match trade_type {
        TradeType::Sell => OptionAction::SellToOpen,
        TradeType::Buy => OptionAction::BuyToClose,
    };
    OptionExecution {
        action,
        occ_symbol: build_occ_symbol(
            underlying,
            terms.expiration_date,
            terms.option_type,
            terms.strike_price,
        ),
        option_type: terms.option_type,
        strike_price: terms.strike_price,
        expiration_date: terms.expiration_date,
        contract_quantity: quantity.max(0.0).round() as u32,
        underlying_price_at_trade,
        created_stock_position_id: None,
        cost_basis_adjustment: None,
    }
}
