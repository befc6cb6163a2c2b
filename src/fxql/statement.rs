//! Parses a single statement block into a [`ParsedRate`].

use regex::{Match, Regex};
use std::sync::LazyLock;

use super::error::{FxqlError, Position};
use super::splitter::StatementBlock;
use super::validator::{validate_amount, validate_cap, validate_currency_pair};
use crate::domain::ParsedRate;

static HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Z]{3})-([A-Z]{3})\s*\{$").expect("header pattern is valid")
});
static HEADER_SPACING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Z]{3}-[A-Z]{3}\s+\{").expect("spacing pattern is valid"));
static BUY_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^BUY\s+([0-9]*\.?[0-9]+)$").expect("BUY pattern is valid"));
static SELL_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^SELL\s+([0-9]*\.?[0-9]+)$").expect("SELL pattern is valid"));
static CAP_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^CAP\s+([0-9]*\.?[0-9]+)$").expect("CAP pattern is valid"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Buy,
    Sell,
    Cap,
}

/// A trimmed, non-empty line with enough context to report columns
/// against the untrimmed input.
#[derive(Debug, Clone, Copy)]
struct SourceLine<'a> {
    number: usize,
    indent: usize,
    text: &'a str,
}

impl SourceLine<'_> {
    /// 1-based column of a byte offset into `text`.
    fn column(&self, offset: usize) -> usize {
        self.indent + self.text[..offset].chars().count() + 1
    }
}

fn source_lines(block: &StatementBlock) -> Vec<SourceLine<'_>> {
    block
        .text
        .split('\n')
        .enumerate()
        .filter_map(|(index, raw)| {
            let text = raw.trim();
            if text.is_empty() {
                return None;
            }
            let leading = &raw[..raw.len() - raw.trim_start().len()];
            Some(SourceLine {
                number: block.line + index,
                indent: leading.chars().count(),
                text,
            })
        })
        .collect()
}

/// Matches a body line against the BUY/SELL/CAP grammar, returning the
/// field and its numeric literal.
fn classify(text: &str) -> Option<(Field, Match<'_>)> {
    [
        (Field::Buy, &*BUY_LINE),
        (Field::Sell, &*SELL_LINE),
        (Field::Cap, &*CAP_LINE),
    ]
    .into_iter()
    .find_map(|(field, pattern)| {
        pattern
            .captures(text)
            .and_then(|captures| captures.get(1))
            .map(|value| (field, value))
    })
}

/// Parses one block. The returned rate has `entry_id` 0; the aggregator
/// assigns the final ordinal.
pub fn parse_statement(block: &StatementBlock) -> Result<ParsedRate, FxqlError> {
    let lines = source_lines(block);
    let Some((header, body)) = lines.split_first() else {
        return Err(FxqlError::currency(
            "Invalid currency pair format: \"\"",
            Position::at(block.line, 1),
        ));
    };

    let captures = HEADER.captures(header.text).ok_or_else(|| {
        FxqlError::currency(
            format!("Invalid currency pair format: \"{}\"", header.text),
            Position::at(header.number, 1),
        )
    })?;
    let (Some(source), Some(destination)) = (captures.get(1), captures.get(2)) else {
        return Err(FxqlError::currency(
            format!("Invalid currency pair format: \"{}\"", header.text),
            Position::at(header.number, 1),
        ));
    };

    let (source_currency, destination_currency) = validate_currency_pair(
        source.as_str(),
        destination.as_str(),
        header.number,
        header.column(source.start()),
    )?;

    if !HEADER_SPACING.is_match(header.text) {
        let brace = header.text.find('{').unwrap_or(header.text.len());
        return Err(FxqlError::syntax(
            format!(
                "Missing single space after currency pair {}-{}",
                source.as_str(),
                destination.as_str()
            ),
            Position::at(header.number, header.column(brace)),
        ));
    }

    let mut buy_price = None;
    let mut sell_price = None;
    let mut cap_amount = None;

    for line in body {
        let text = line.text.strip_suffix('}').unwrap_or(line.text).trim_end();
        if text.is_empty() {
            continue;
        }

        match classify(text) {
            Some((Field::Buy, value)) => {
                buy_price = Some(validate_amount(
                    value.as_str(),
                    line.number,
                    line.column(value.start()),
                )?);
            }
            Some((Field::Sell, value)) => {
                sell_price = Some(validate_amount(
                    value.as_str(),
                    line.number,
                    line.column(value.start()),
                )?);
            }
            Some((Field::Cap, value)) => {
                cap_amount = Some(validate_cap(
                    value.as_str(),
                    line.number,
                    line.column(value.start()),
                )?);
            }
            None => {
                return Err(FxqlError::syntax(
                    format!("Invalid line format: \"{}\"", text),
                    Position::line(line.number),
                ));
            }
        }
    }

    let (Some(buy_price), Some(sell_price), Some(cap_amount)) =
        (buy_price, sell_price, cap_amount)
    else {
        let missing: Vec<&str> = [
            ("BUY", buy_price.is_none()),
            ("SELL", sell_price.is_none()),
            ("CAP", cap_amount.is_none()),
        ]
        .into_iter()
        .filter_map(|(name, missing)| missing.then_some(name))
        .collect();
        return Err(FxqlError::syntax(
            format!("Missing required fields: {}", missing.join(", ")),
            Position::line(block.line),
        ));
    };

    Ok(ParsedRate {
        entry_id: 0,
        source_currency,
        destination_currency,
        buy_price,
        sell_price,
        cap_amount,
    })
}
