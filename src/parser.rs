//! Filter expression parser using nom.
//!
//! Parses the `column op value` shorthand accepted on the command line into
//! the parts of a filter condition.
//!
//! ```text
//! country_code = US
//! amount>10.5
//! event_type LIKE 'pur%'
//! ───┬────── ─┬── ──┬───
//!    │        │     └── Value (rest of input, outer quotes stripped)
//!    │        └── Operator (=, !=, >, <, LIKE)
//!    └── Column name
//! ```

use nom::{
    branch::alt,
    bytes::complete::{tag, tag_no_case, take_while1},
    character::complete::{char, multispace0, multispace1, one_of},
    combinator::{eof, not, value},
    sequence::terminated,
    IResult,
};

use crate::error::{ForgeError, ForgeResult};
use crate::filter::Operator;

/// A filter expression split into its parts.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterExpr {
    pub column: String,
    pub operator: Operator,
    pub value: String,
}

/// Parse a complete filter expression.
pub fn parse_filter(input: &str) -> ForgeResult<FilterExpr> {
    let trimmed = input.trim();

    let (after_column, column) = parse_column(trimmed)
        .map_err(|_| ForgeError::parse(0, format!("Expected column name in '{}'", trimmed)))?;
    let (after_operator, operator) = parse_operator(after_column)
        .map_err(|_| operator_error(trimmed.len() - after_column.len(), after_column))?;

    Ok(FilterExpr {
        column: column.to_string(),
        operator,
        value: unquote(after_operator.trim()).to_string(),
    })
}

/// Error for text at the operator position that is not a known operator.
/// A run of comparison symbols is reported as the whole token.
fn operator_error(position: usize, remaining: &str) -> ForgeError {
    let symbols: IResult<&str, &str> = take_while1(|c: char| "=!<>".contains(c))(remaining);
    match symbols {
        Ok((_, token)) => ForgeError::InvalidOperator(token.to_string()),
        Err(_) if remaining.is_empty() => {
            ForgeError::parse(position, "Expected operator (=, !=, >, <, LIKE)")
        }
        Err(_) => ForgeError::parse(
            position,
            format!("Expected operator (=, !=, >, <, LIKE) before '{}'", remaining),
        ),
    }
}

/// Parse the column name and the whitespace after it.
fn parse_column(input: &str) -> IResult<&str, &str> {
    terminated(parse_identifier, multispace0)(input)
}

/// Parse an identifier (column name).
fn parse_identifier(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| c.is_alphanumeric() || c == '_')(input)
}

/// Parse a comparison operator. `!=` is tried before `=`; a symbol operator
/// must not run into another comparison symbol (`>=`, `<>`, `==`).
fn parse_operator(input: &str) -> IResult<&str, Operator> {
    alt((
        value(Operator::Ne, terminated(tag("!="), not(one_of("=<>")))),
        value(Operator::Eq, terminated(char('='), not(one_of("=<>")))),
        value(Operator::Gt, terminated(char('>'), not(one_of("=<>")))),
        value(Operator::Lt, terminated(char('<'), not(one_of("=<>")))),
        value(
            Operator::Like,
            terminated(tag_no_case("like"), alt((multispace1, eof))),
        ),
    ))(input)
}

/// Strip one pair of surrounding single quotes.
fn unquote(raw: &str) -> &str {
    raw.strip_prefix('\'')
        .and_then(|s| s.strip_suffix('\''))
        .unwrap_or(raw)
}
