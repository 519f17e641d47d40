//! tradebook: position planning, single-trade entry and trade journaling.
//!
//! Hexagonal layout: domain rules and calculators in [`domain`], port traits
//! in [`ports`], concrete storage/config/clock in [`adapters`], and the
//! validated CRUD façades that tie them together in [`services`].

pub mod domain;
pub mod ports;
pub mod adapters;
pub mod services;
pub mod cli;
