//! Collapses repeated currency pairs and fixes the output order.

use std::collections::BTreeMap;

use crate::domain::{Currency, ParsedRate};

/// De-duplicates rates by (source, destination).
///
/// Each rate's ordinal is its 1-based position in `rates`. A repeated pair
/// overwrites both the stored fields and the ordinal, so the survivor carries
/// its last occurrence's values and is placed by that occurrence's ordinal.
/// Output is sorted ascending by `entry_id`.
pub fn aggregate(rates: Vec<ParsedRate>) -> Vec<ParsedRate> {
    let mut latest: BTreeMap<(Currency, Currency), (usize, ParsedRate)> = BTreeMap::new();

    for (index, rate) in rates.into_iter().enumerate() {
        let ordinal = index + 1;
        latest.insert(rate.pair(), (ordinal, rate));
    }

    let mut aggregated: Vec<ParsedRate> = latest
        .into_values()
        .map(|(ordinal, rate)| ParsedRate {
            entry_id: ordinal,
            ..rate
        })
        .collect();
    aggregated.sort_by_key(|rate| rate.entry_id);
    aggregated
}
