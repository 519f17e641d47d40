//! Core domain types, rules and calculators.

pub mod error;
pub mod timestamp;
pub mod position;
pub mod trade;
pub mod journal;
pub mod validation;
pub mod trade_constraint;
pub mod normalize;
pub mod cost_basis;
pub mod risk;
pub mod config_validation;
