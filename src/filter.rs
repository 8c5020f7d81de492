//! Filter predicates for the projection builder.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{ForgeError, ForgeResult};
use crate::schema::InputSchema;

/// Comparison operators a filter may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operator {
    #[serde(rename = "=")]
    Eq,
    #[serde(rename = "!=")]
    Ne,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "LIKE")]
    Like,
}

impl Operator {
    pub const ALL: [Operator; 5] = [
        Operator::Eq,
        Operator::Ne,
        Operator::Gt,
        Operator::Lt,
        Operator::Like,
    ];

    /// SQL token for this operator.
    pub fn as_str(self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::Ne => "!=",
            Operator::Gt => ">",
            Operator::Lt => "<",
            Operator::Like => "LIKE",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operator {
    type Err = ForgeError;

    fn from_str(s: &str) -> ForgeResult<Self> {
        match s.trim() {
            "=" => Ok(Operator::Eq),
            "!=" => Ok(Operator::Ne),
            ">" => Ok(Operator::Gt),
            "<" => Ok(Operator::Lt),
            op if op.eq_ignore_ascii_case("like") => Ok(Operator::Like),
            op => Err(ForgeError::InvalidOperator(op.to_string())),
        }
    }
}

/// Identifier of a filter within one builder.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilterId(pub String);

impl FilterId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FilterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FilterId {
    fn from(s: &str) -> Self {
        FilterId(s.to_string())
    }
}

/// A single `<column> <operator> <value>` predicate.
///
/// The value is kept exactly as entered. Whether it is quoted depends on the
/// column's declared type at render time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterCondition {
    pub id: FilterId,
    pub column: String,
    pub operator: Operator,
    pub value: String,
}

impl FilterCondition {
    /// Render this predicate against the given schema.
    ///
    /// String and date columns wrap the value in single quotes; every other
    /// type, and any column the schema does not declare, leaves it bare.
    /// Embedded quotes are not escaped.
    pub fn to_sql(&self, schema: &InputSchema) -> String {
        let quoted = schema
            .column(&self.column)
            .map(|c| c.column_type.is_quoted())
            .unwrap_or(false);
        if quoted {
            format!("{} {} '{}'", self.column, self.operator, self.value)
        } else {
            format!("{} {} {}", self.column, self.operator, self.value)
        }
    }
}

/// A single field edit applied to an existing filter.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterEdit {
    Column(String),
    Operator(Operator),
    Value(String),
}
