//! Splits a raw FXQL payload into independent statement blocks.

use regex::Regex;
use std::sync::LazyLock;

use super::error::{FxqlError, Position};

/// Maximum number of statements accepted in one request.
pub const MAX_STATEMENTS: usize = 1000;

/// A closing brace followed by at least one blank line.
static SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\}\s*\n\s*\n").expect("separator pattern is valid"));

/// One `CCC-CCC { ... }` statement, always ending in `}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatementBlock {
    pub text: String,
    /// 1-based line of the block's first line in the normalized input.
    pub line: usize,
}

/// Turns escaped `\n` sequences and CRLF into plain newlines.
pub fn normalize(raw: &str) -> String {
    raw.replace("\\n", "\n").replace("\r\n", "\n")
}

pub fn split(raw: &str) -> Result<Vec<StatementBlock>, FxqlError> {
    let normalized = normalize(raw);
    let body = normalized.trim_start();
    let skipped_lines = normalized[..normalized.len() - body.len()]
        .matches('\n')
        .count();
    let body = body.trim_end();

    let mut bounds = Vec::new();
    let mut start = 0;
    for separator in SEPARATOR.find_iter(body) {
        bounds.push((start, separator.start()));
        start = separator.end();
    }
    bounds.push((start, body.len()));

    let mut blocks = Vec::new();
    let mut line = skipped_lines + 1;
    let mut counted_to = 0;
    for (start, end) in bounds {
        let segment = &body[start..end];
        let text = segment.trim();
        if text.is_empty() {
            continue;
        }

        let text_start = start + (segment.len() - segment.trim_start().len());
        line += body[counted_to..text_start].matches('\n').count();
        counted_to = text_start;

        let text = if text.ends_with('}') {
            text.to_string()
        } else {
            format!("{text}}}")
        };
        blocks.push(StatementBlock { text, line });
    }

    if blocks.len() > MAX_STATEMENTS {
        return Err(FxqlError::syntax(
            format!(
                "Request exceeds maximum limit of {} currency pairs",
                MAX_STATEMENTS
            ),
            Position::at(1, 1),
        ));
    }
    if blocks.is_empty() {
        return Err(FxqlError::syntax(
            "No FXQL statements found",
            Position::at(1, 1),
        ));
    }

    Ok(blocks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fxql::error::ErrorKind;

    const BLOCK: &str = "USD-GBP {\nBUY 0.85\nSELL 0.90\nCAP 10000\n}";

    #[test]
    fn test_split_preserves_order_and_count() {
        let input = format!(
            "{}\n\nEUR-USD {{\nBUY 1.05\nSELL 1.10\nCAP 15000\n}}\n\nGBP-EUR {{\nBUY 1.15\nSELL 1.2\nCAP 12000\n}}",
            BLOCK
        );
        let blocks = split(&input).unwrap();
        assert_eq!(blocks.len(), 3);
        assert!(blocks[0].text.starts_with("USD-GBP"));
        assert!(blocks[1].text.starts_with("EUR-USD"));
        assert!(blocks[2].text.starts_with("GBP-EUR"));
        assert!(blocks.iter().all(|b| b.text.ends_with('}')));
    }

    #[test]
    fn test_split_tracks_first_line_of_each_block() {
        let input = format!("\n\n{}\n\n\n{}", BLOCK, BLOCK);
        let blocks = split(&input).unwrap();
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].line, 3);
        assert_eq!(blocks[1].line, 10);
    }

    #[test]
    fn test_split_normalizes_crlf_and_escaped_newlines() {
        let crlf = BLOCK.replace('\n', "\r\n");
        let escaped = BLOCK.replace('\n', "\\n");
        let expected = split(BLOCK).unwrap();
        assert_eq!(split(&crlf).unwrap(), expected);
        assert_eq!(split(&escaped).unwrap(), expected);
    }

    #[test]
    fn test_split_appends_brace_consumed_by_separator() {
        let input = format!("{}\n\n{}", BLOCK, BLOCK);
        let blocks = split(&input).unwrap();
        assert_eq!(blocks[0].text, BLOCK);
        assert_eq!(blocks[1].text, BLOCK);
    }

    #[test]
    fn test_split_without_blank_line_is_one_block() {
        let input = format!("{}\n{}", BLOCK, BLOCK);
        let blocks = split(&input).unwrap();
        assert_eq!(blocks.len(), 1);
    }

    #[test]
    fn test_split_empty_and_whitespace_input() {
        for input in ["", "   \n   \t   ", "\r\n\r\n"] {
            let err = split(input).unwrap_err();
            assert_eq!(err.kind, ErrorKind::InvalidSyntax);
            assert_eq!(err.message, "No FXQL statements found");
            assert_eq!(err.position, Some(Position::at(1, 1)));
        }
    }

    #[test]
    fn test_split_limit() {
        let at_limit = vec![BLOCK; MAX_STATEMENTS].join("\n\n");
        assert_eq!(split(&at_limit).unwrap().len(), MAX_STATEMENTS);

        let over_limit = vec![BLOCK; MAX_STATEMENTS + 1].join("\n\n");
        let err = split(&over_limit).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidSyntax);
        assert!(err.message.contains("maximum limit of 1000"));
        assert_eq!(err.position, Some(Position::at(1, 1)));
    }
}
