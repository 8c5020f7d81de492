//! Input and output schemas for the projection builder.
//!
//! The input schema describes the single source table a query may read and
//! the columns it exposes. The output schema fixes which of those columns
//! every generated query must project and which ones the user may toggle.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use strsim::levenshtein;

use crate::error::{ForgeError, ForgeResult};

/// Declared type of a source column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Long,
    String,
    Date,
    Double,
    Boolean,
}

impl ColumnType {
    /// Whether filter literals on this type are wrapped in single quotes.
    pub fn is_quoted(self) -> bool {
        matches!(self, ColumnType::String | ColumnType::Date)
    }

    /// Whether this type holds numbers.
    pub fn is_numeric(self) -> bool {
        matches!(self, ColumnType::Long | ColumnType::Double)
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ColumnType::Long => "long",
            ColumnType::String => "string",
            ColumnType::Date => "date",
            ColumnType::Double => "double",
            ColumnType::Boolean => "boolean",
        };
        f.write_str(name)
    }
}

impl FromStr for ColumnType {
    type Err = ForgeError;

    fn from_str(s: &str) -> ForgeResult<Self> {
        match s.to_ascii_lowercase().as_str() {
            "long" => Ok(ColumnType::Long),
            "string" => Ok(ColumnType::String),
            "date" => Ok(ColumnType::Date),
            "double" => Ok(ColumnType::Double),
            "boolean" => Ok(ColumnType::Boolean),
            _ => Err(ForgeError::invalid("column type", s)),
        }
    }
}

/// A column the source table exposes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: ColumnType,
    /// Closed set of values the column may hold, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ColumnDescriptor {
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
            options: None,
            description: None,
        }
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn options(mut self, options: &[&str]) -> Self {
        self.options = Some(options.iter().map(|o| o.to_string()).collect());
        self
    }
}

/// The source table and its columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputSchema {
    pub table_name: String,
    pub columns: Vec<ColumnDescriptor>,
}

impl InputSchema {
    /// The `user_events` table the builder ships with.
    pub fn user_events() -> Self {
        Self {
            table_name: "user_events".to_string(),
            columns: vec![
                ColumnDescriptor::new("user_id", ColumnType::Long)
                    .describe("Unique identifier for the user"),
                ColumnDescriptor::new("event_type", ColumnType::String)
                    .options(&["click", "view", "purchase", "login"]),
                ColumnDescriptor::new("event_date", ColumnType::Date)
                    .describe("Date of the event"),
                ColumnDescriptor::new("amount", ColumnType::Double)
                    .describe("Transaction amount if applicable"),
                ColumnDescriptor::new("country_code", ColumnType::String)
                    .options(&["US", "CA", "GB", "DE", "FR"]),
                ColumnDescriptor::new("is_premium", ColumnType::Boolean)
                    .describe("User subscription status"),
            ],
        }
    }

    /// Look up a column by name.
    pub fn column(&self, name: &str) -> Option<&ColumnDescriptor> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Resolve a column, failing with a suggestion when it is not declared.
    pub fn require_column(&self, name: &str) -> ForgeResult<&ColumnDescriptor> {
        self.column(name).ok_or_else(|| ForgeError::UnknownColumn {
            column: name.to_string(),
            suggestion: self.did_you_mean(name),
        })
    }

    /// Closest declared column name within a Levenshtein distance of 3.
    fn did_you_mean(&self, input: &str) -> Option<String> {
        self.columns
            .iter()
            .map(|c| (levenshtein(input, &c.name), &c.name))
            .filter(|(dist, _)| *dist <= 3)
            .min_by_key(|(dist, _)| *dist)
            .map(|(_, name)| name.clone())
    }
}

impl Default for InputSchema {
    fn default() -> Self {
        Self::user_events()
    }
}

/// Columns a generated query must or may project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputSchema {
    pub name: String,
    pub required_columns: Vec<String>,
    pub optional_columns: Vec<String>,
}

impl OutputSchema {
    /// "Reporting Standard v1".
    pub fn reporting_standard() -> Self {
        Self {
            name: "Reporting Standard v1".to_string(),
            required_columns: vec![
                "user_id".to_string(),
                "event_type".to_string(),
                "event_date".to_string(),
            ],
            optional_columns: vec!["amount".to_string(), "country_code".to_string()],
        }
    }

    pub fn is_required(&self, name: &str) -> bool {
        self.required_columns.iter().any(|c| c == name)
    }

    pub fn is_optional(&self, name: &str) -> bool {
        self.optional_columns.iter().any(|c| c == name)
    }

    /// Every column that may appear in the selection, required first.
    pub fn selectable(&self) -> impl Iterator<Item = &str> {
        self.required_columns
            .iter()
            .chain(self.optional_columns.iter())
            .map(String::as_str)
    }
}

impl Default for OutputSchema {
    fn default() -> Self {
        Self::reporting_standard()
    }
}
