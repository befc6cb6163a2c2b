//! FXQL parsing pipeline.
//!
//! Pure and synchronous: raw text in, validated and de-duplicated rates (or
//! the first error) out. No I/O, no shared state.
//!
//! - `splitter` - normalization and statement splitting
//! - `statement` - per-block grammar
//! - `validator` - currency, amount and cap checks
//! - `aggregate` - last-occurrence de-duplication and ordering

pub mod aggregate;
pub mod error;
pub mod splitter;
pub mod statement;
pub mod validator;

pub use aggregate::aggregate;
pub use error::{ErrorBody, ErrorKind, FxqlError, Position};
pub use splitter::{split, StatementBlock, MAX_STATEMENTS};
pub use statement::parse_statement;

use crate::domain::ParsedRate;
use tracing::debug;

/// Parses a full FXQL payload.
///
/// Stops at the first failing statement. Syntax errors are annotated with
/// the statement's ordinal ("... at statement N", position line N); currency,
/// amount and cap errors are returned as raised.
pub fn parse(raw: &str) -> Result<Vec<ParsedRate>, FxqlError> {
    let blocks = split(raw)?;
    debug!(statements = blocks.len(), "Split FXQL payload");

    let mut rates = Vec::with_capacity(blocks.len());
    for (index, block) in blocks.iter().enumerate() {
        let statement = index + 1;
        let rate = parse_statement(block).map_err(|err| annotate(err, statement))?;
        rates.push(rate);
    }

    let aggregated = aggregate(rates);
    debug!(
        statements = blocks.len(),
        rates = aggregated.len(),
        "Parsed FXQL payload"
    );
    Ok(aggregated)
}

fn annotate(err: FxqlError, statement: usize) -> FxqlError {
    match err.kind {
        ErrorKind::InvalidSyntax => FxqlError::syntax(
            format!("{} at statement {}", err.message, statement),
            Position::line(statement),
        ),
        ErrorKind::InvalidCurrency
        | ErrorKind::InvalidAmount
        | ErrorKind::InvalidCap
        | ErrorKind::RateLimitExceeded
        | ErrorKind::ServerError => err,
    }
}
