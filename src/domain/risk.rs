//! Risk figures shown while planning a position.

use serde::Serialize;

use super::position::{Position, StrategyType, CONTRACT_MULTIPLIER};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskMetrics {
    pub total_investment: f64,
    pub max_profit: f64,
    pub max_loss: f64,
    pub risk_reward_ratio: String,
    pub break_even: Option<f64>,
}

/// `"1:N"` where N is reward per unit of risk; `"0:0"` when there is no positive risk.
pub fn format_risk_reward(max_profit: f64, max_loss: f64) -> String {
    if max_loss.is_nan() || max_loss <= 0.0 {
        return "0:0".to_string();
    }
    let ratio = format!("{:.2}", max_profit / max_loss);
    let ratio = ratio.trim_end_matches('0').trim_end_matches('.');
    format!("1:{ratio}")
}

pub fn calculate_stock_risk(
    entry_price: f64,
    quantity: f64,
    profit_target: f64,
    stop_loss: f64,
) -> RiskMetrics {
    let max_profit = (profit_target - entry_price) * quantity;
    let max_loss = (entry_price - stop_loss) * quantity;
    RiskMetrics {
        total_investment: entry_price * quantity,
        max_profit,
        max_loss,
        risk_reward_ratio: format_risk_reward(max_profit, max_loss),
        break_even: Some(entry_price),
    }
}

/// Cash-secured short put. `total_investment` is the collateral held against assignment.
///
/// `max_profit` covers every contract; `max_loss` is quoted per contract
/// (one assignment of 100 shares at the break-even price).
pub fn calculate_short_put_risk(strike: f64, premium: f64, contracts: f64) -> RiskMetrics {
    let break_even = strike - premium;
    let max_profit = premium * contracts * CONTRACT_MULTIPLIER;
    let max_loss = break_even * CONTRACT_MULTIPLIER;
    RiskMetrics {
        total_investment: strike * contracts * CONTRACT_MULTIPLIER,
        max_profit,
        max_loss,
        risk_reward_ratio: format_risk_reward(max_profit, max_loss),
        break_even: Some(break_even),
    }
}

/// Risk at the position's planned targets; `None` for a short put missing its terms.
pub fn calculate_position_risk(position: &Position) -> Option<RiskMetrics> {
    match position.strategy_type {
        StrategyType::LongStock => Some(calculate_stock_risk(
            position.target_entry_price,
            position.target_quantity,
            position.profit_target,
            position.stop_loss,
        )),
        StrategyType::ShortPut => position.option.as_ref().map(|terms| {
            calculate_short_put_risk(
                terms.strike_price,
                terms.premium_per_contract,
                position.target_quantity,
            )
        }),
    }
}
