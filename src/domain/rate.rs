//! Rate records produced by the parser and returned by storage.

use serde::{Deserialize, Serialize};

use super::{Currency, Decimal};

/// One validated quotation for a currency pair.
///
/// Serialized with the PascalCase field names of the public API
/// (`EntryId`, `SourceCurrency`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ParsedRate {
    /// 1-based ordinal of the statement that produced this rate. Zero until
    /// the aggregator assigns it.
    pub entry_id: usize,
    pub source_currency: Currency,
    pub destination_currency: Currency,
    pub buy_price: Decimal,
    pub sell_price: Decimal,
    pub cap_amount: i64,
}

impl ParsedRate {
    /// The (source, destination) key used for de-duplication and storage.
    pub fn pair(&self) -> (Currency, Currency) {
        (self.source_currency, self.destination_currency)
    }
}

/// A rate row as materialized by the persistence layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredRate {
    pub id: String,
    #[serde(flatten)]
    pub rate: ParsedRate,
    pub created_at_ms: i64,
    pub updated_at_ms: i64,
}
