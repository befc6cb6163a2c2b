//! Domain types for FXQL rate quotations.
//!
//! This module provides:
//! - Lossless numeric handling via Decimal wrapper
//! - The closed currency whitelist
//! - Parsed and stored rate records

pub mod currency;
pub mod decimal;
pub mod rate;

pub use currency::{Currency, ParseCurrencyError};
pub use decimal::Decimal;
pub use rate::{ParsedRate, StoredRate};
