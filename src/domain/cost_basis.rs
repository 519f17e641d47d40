//! Cost basis and profit/loss derived from a position's trades.

use std::collections::HashMap;

use super::position::{Position, StrategyType, CONTRACT_MULTIPLIER};
use super::trade::{Trade, TradeType};

/// Rendered in place of a P&L figure when none can be computed.
pub const NO_DATA: &str = "—";

fn buys(trades: &[Trade]) -> impl Iterator<Item = &Trade> {
    trades.iter().filter(|t| t.trade_type == TradeType::Buy)
}

/// Price of the first buy trade, or 0 when there is none.
pub fn calculate_simple_cost_basis(trades: &[Trade]) -> f64 {
    buys(trades).next().map(|t| t.price).unwrap_or(0.0)
}

/// Sum of `quantity * price` over buy trades.
pub fn calculate_total_cost_basis(trades: &[Trade]) -> f64 {
    buys(trades).map(|t| t.quantity * t.price).sum()
}

/// Total bought quantity.
pub fn calculate_total_quantity(trades: &[Trade]) -> f64 {
    buys(trades).map(|t| t.quantity).sum()
}

/// Quantity-weighted mean buy price, or `fallback_price` when nothing has been bought.
pub fn calculate_average_cost(trades: &[Trade], fallback_price: f64) -> f64 {
    let quantity = calculate_total_quantity(trades);
    if quantity > 0.0 {
        calculate_total_cost_basis(trades) / quantity
    } else {
        fallback_price
    }
}

/// Unrealized P&L at the current price of the position's underlying.
///
/// `None` when the position has no trades yet or no price is known for its
/// symbol. Stock positions use `(price - average cost) * quantity`. Short
/// puts are valued at expiration: premium collected less intrinsic value owed
/// on the contracts still open.
pub fn calculate_position_pnl(
    position: &Position,
    price_by_underlying: &HashMap<String, f64>,
) -> Option<f64> {
    if position.trades.is_empty() {
        return None;
    }
    let current = *price_by_underlying.get(&position.symbol)?;

    match position.strategy_type {
        StrategyType::LongStock => {
            let average = calculate_average_cost(&position.trades, position.target_entry_price);
            Some((current - average) * calculate_total_quantity(&position.trades))
        }
        StrategyType::ShortPut => {
            let strike = position.option.as_ref()?.strike_price;
            let (mut net_premium, mut open_contracts) = (0.0, 0.0);
            for t in &position.trades {
                match t.trade_type {
                    TradeType::Sell => {
                        net_premium += t.price * t.quantity;
                        open_contracts += t.quantity;
                    }
                    TradeType::Buy => {
                        net_premium -= t.price * t.quantity;
                        open_contracts -= t.quantity;
                    }
                }
            }
            let intrinsic = (strike - current).max(0.0);
            Some((net_premium - intrinsic * open_contracts.max(0.0)) * CONTRACT_MULTIPLIER)
        }
    }
}

/// P&L as a percentage of cost basis; undefined unless the basis is positive.
pub fn calculate_pnl_percentage(pnl: f64, cost_basis: f64) -> Option<f64> {
    (cost_basis > 0.0).then(|| pnl / cost_basis * 100.0)
}

pub fn format_pnl(pnl: Option<f64>) -> String {
    match pnl {
        Some(v) if v < 0.0 => format!("-${:.2}", v.abs()),
        Some(v) => format!("${v:.2}"),
        None => NO_DATA.to_string(),
    }
}
