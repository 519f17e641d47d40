//! Record validation.
//!
//! Field validators return a [`ValidationResult`] so a form can show several
//! problems at once. The record validators fail fast on the first violated
//! rule, checked in a fixed order: required fields, numeric shape, strategy
//! rules, free-text length.

use chrono::NaiveDate;
use std::collections::HashSet;

use super::error::ValidationError;
use super::journal::{prompt_text, JournalEntry, JournalEntryType};
use super::position::{OptionType, Position, PriceBasis, StrategyType, TradeKind};
use super::trade::{Trade, OCC_ROOT_MAX_CHARS};

pub const MIN_THESIS_CHARS: usize = 10;
pub const MAX_SYMBOL_CHARS: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub error: Option<String>,
}

impl ValidationResult {
    pub fn valid() -> Self {
        Self {
            is_valid: true,
            error: None,
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self {
            is_valid: false,
            error: Some(message.into()),
        }
    }

    pub fn into_result(self) -> Result<(), ValidationError> {
        match self.error {
            Some(message) if !self.is_valid => Err(ValidationError::new(message)),
            _ => Ok(()),
        }
    }
}

impl From<Result<(), ValidationError>> for ValidationResult {
    fn from(result: Result<(), ValidationError>) -> Self {
        match result {
            Ok(()) => ValidationResult::valid(),
            Err(e) => ValidationResult::invalid(e.message),
        }
    }
}

fn is_positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

fn is_non_negative(value: f64) -> bool {
    value.is_finite() && value >= 0.0
}

fn is_whole(value: f64) -> bool {
    value.fract() == 0.0
}

fn require(condition: bool, message: &str) -> Result<(), ValidationError> {
    if condition {
        Ok(())
    } else {
        Err(ValidationError::new(message))
    }
}

// --- field validators ---

pub fn validate_symbol(symbol: &str) -> ValidationResult {
    let symbol = symbol.trim();
    if symbol.is_empty() {
        return ValidationResult::invalid("Symbol is required");
    }
    if symbol.chars().count() > MAX_SYMBOL_CHARS {
        return ValidationResult::invalid(format!(
            "Symbol must be {MAX_SYMBOL_CHARS} characters or fewer"
        ));
    }
    if !symbol
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-')
    {
        return ValidationResult::invalid("Symbol may only contain letters, numbers, '.' or '-'");
    }
    ValidationResult::valid()
}

pub fn validate_strike_price(strike: Option<f64>) -> ValidationResult {
    match strike {
        None => ValidationResult::invalid("Strike price is required"),
        Some(v) if !is_positive(v) => ValidationResult::invalid("Strike price must be positive"),
        Some(_) => ValidationResult::valid(),
    }
}

/// An expiration on or before `today` has already passed.
pub fn validate_expiration_date(expiration: Option<NaiveDate>, today: NaiveDate) -> ValidationResult {
    match expiration {
        None => ValidationResult::invalid("Expiration date is required"),
        Some(d) if d <= today => {
            ValidationResult::invalid("expiration_date cannot be in the past")
        }
        Some(_) => ValidationResult::valid(),
    }
}

pub fn validate_quantity(quantity: Option<f64>, kind: TradeKind) -> ValidationResult {
    match quantity {
        None => ValidationResult::invalid("Quantity is required"),
        Some(q) if !is_positive(q) => ValidationResult::invalid("Quantity must be positive"),
        Some(q) if kind == TradeKind::Stock && !is_whole(q) => {
            ValidationResult::invalid("Quantity must be a whole number for stock positions")
        }
        Some(_) => ValidationResult::valid(),
    }
}

pub fn validate_premium(premium: Option<f64>) -> ValidationResult {
    match premium {
        None => ValidationResult::invalid("Premium is required"),
        Some(p) if !p.is_finite() || p < 0.0 => {
            ValidationResult::invalid("Premium cannot be negative")
        }
        Some(_) => ValidationResult::valid(),
    }
}

// --- record validators ---

pub fn validate_position(position: &Position, today: NaiveDate) -> Result<(), ValidationError> {
    require(!position.id.trim().is_empty(), "id is required")?;
    require(!position.symbol.trim().is_empty(), "symbol is required")?;
    require(
        !position.position_thesis.trim().is_empty(),
        "position_thesis is required",
    )?;

    validate_symbol(&position.symbol).into_result()?;
    require(
        is_positive(position.target_entry_price),
        "target_entry_price must be positive",
    )?;
    require(
        is_positive(position.target_quantity),
        "target_quantity must be positive",
    )?;
    if position.strategy_type == StrategyType::LongStock {
        require(
            is_whole(position.target_quantity),
            "target_quantity must be a whole number for stock positions",
        )?;
    }
    require(
        is_non_negative(position.profit_target),
        "profit_target cannot be negative",
    )?;
    require(
        is_non_negative(position.stop_loss),
        "stop_loss cannot be negative",
    )?;

    validate_strategy_rules(position, today)?;

    require(
        position.position_thesis.trim().chars().count() >= MIN_THESIS_CHARS,
        "position_thesis must be at least 10 characters",
    )?;
    Ok(())
}

/// Non-throwing check of the strategy-conditional rules alone.
pub fn validate_option_position(position: &Position, today: NaiveDate) -> ValidationResult {
    validate_strategy_rules(position, today).into()
}

fn validate_strategy_rules(position: &Position, today: NaiveDate) -> Result<(), ValidationError> {
    let required_kind = position.strategy_type.required_trade_kind();
    if position.trade_kind != required_kind {
        return Err(ValidationError::new(format!(
            "trade_kind must be {} for {} strategy",
            required_kind, position.strategy_type
        )));
    }

    match position.strategy_type {
        StrategyType::LongStock => {
            require(
                position.option.is_none(),
                "option fields are only allowed for Short Put strategy",
            )?;
            let option_basis = Some(PriceBasis::OptionPrice);
            require(
                position.profit_target_basis != option_basis
                    && position.stop_loss_basis != option_basis,
                "option_price basis is only allowed for Short Put strategy",
            )?;
        }
        StrategyType::ShortPut => {
            let terms = position.option.as_ref().ok_or_else(|| {
                ValidationError::new("option_type is required for Short Put strategy")
            })?;
            require(
                position.symbol.trim().chars().count() <= OCC_ROOT_MAX_CHARS,
                "symbol must be 6 characters or fewer for option strategies",
            )?;
            require(
                terms.option_type == OptionType::Put,
                "option_type must be put for Short Put strategy",
            )?;
            validate_strike_price(Some(terms.strike_price)).into_result()?;
            validate_expiration_date(Some(terms.expiration_date), today).into_result()?;
            validate_premium(Some(terms.premium_per_contract)).into_result()?;
            require(
                position.profit_target_basis.is_some(),
                "profit_target_basis is required for Short Put strategy",
            )?;
            require(
                position.stop_loss_basis.is_some(),
                "stop_loss_basis is required for Short Put strategy",
            )?;
        }
    }
    Ok(())
}

pub fn validate_trade(trade: &Trade, position: &Position) -> Result<(), ValidationError> {
    require(!trade.id.trim().is_empty(), "trade id is required")?;
    require(
        trade.position_id == position.id,
        "trade position_id does not match its position",
    )?;

    require(is_positive(trade.quantity), "quantity must be positive")?;
    require(is_positive(trade.price), "price must be positive")?;
    match position.trade_kind {
        TradeKind::Stock => require(
            is_whole(trade.quantity),
            "quantity must be a whole number for stock trades",
        )?,
        TradeKind::Option => require(
            is_whole(trade.quantity),
            "quantity must be a whole number of contracts",
        )?,
    }

    match (&trade.option, position.is_option_strategy()) {
        (Some(_), false) => Err(ValidationError::new(
            "option execution details are only allowed for option positions",
        )),
        (None, true) => Err(ValidationError::new(format!(
            "option execution details are required for {} trades",
            position.strategy_type
        ))),
        (None, false) => Ok(()),
        (Some(exec), true) => {
            require(!exec.occ_symbol.trim().is_empty(), "occ_symbol is required")?;
            validate_strike_price(Some(exec.strike_price)).into_result()?;
            require(
                exec.contract_quantity > 0,
                "contract_quantity must be positive",
            )?;
            require(
                f64::from(exec.contract_quantity) == trade.quantity,
                "contract_quantity must equal the trade quantity",
            )?;
            if let Some(px) = exec.underlying_price_at_trade {
                require(
                    is_positive(px),
                    "underlying_price_at_trade must be positive",
                )?;
            }
            Ok(())
        }
    }
}

pub fn validate_journal_entry(entry: &JournalEntry) -> Result<(), ValidationError> {
    require(!entry.id.trim().is_empty(), "journal entry id is required")?;
    require(!entry.position_id.trim().is_empty(), "position_id is required")?;

    match entry.entry_type {
        JournalEntryType::TradeExecution => require(
            entry
                .trade_id
                .as_deref()
                .is_some_and(|id| !id.trim().is_empty()),
            "trade_id is required for trade_execution entries",
        )?,
        JournalEntryType::PositionPlan => require(
            entry.trade_id.is_none(),
            "position_plan entries cannot reference a trade",
        )?,
    }

    require(
        !entry.fields.is_empty(),
        "at least one journal field is required",
    )?;
    let mut seen = HashSet::new();
    for field in &entry.fields {
        if prompt_text(entry.entry_type, &field.name).is_none() {
            return Err(ValidationError::new(format!(
                "unknown journal field '{}' for {} entries",
                field.name, entry.entry_type
            )));
        }
        if !seen.insert(field.name.as_str()) {
            return Err(ValidationError::new(format!(
                "duplicate journal field '{}'",
                field.name
            )));
        }
    }
    Ok(())
}
