//! # qforge — schema-constrained Spark SQL templates
//!
//! qforge renders Spark SQL from typed field state. There is no parser for
//! the output and nothing is executed: field values are substituted into a
//! fixed template and the text is handed back.
//!
//! ## Quick Example
//!
//! ```rust
//! use qforge::prelude::*;
//!
//! let mut query = ProjectionQuery::default();
//! query.toggle_column("amount").unwrap();
//! query.push_filter("country_code", Operator::Eq, "GB").unwrap();
//! query.set_limit(10);
//!
//! let sql = query.to_sql();
//! assert!(sql.contains("  AND country_code = 'GB'"));
//! ```
//!
//! ## Renderers
//!
//! | Builder            | Output                                           |
//! |--------------------|--------------------------------------------------|
//! | `ProjectionQuery`  | `SELECT … FROM … WHERE … LIMIT …;`               |
//! | `AnomalyRule`      | four-stage CTE comparing a training window with the reference day |

pub mod anomaly;
pub mod config;
pub mod error;
pub mod filter;
pub mod lint;
pub mod parser;
pub mod projection;
pub mod render;
pub mod schema;
pub mod variants;

pub mod prelude {
    pub use crate::anomaly::{AnomalyRule, Protocol, RuleParameters, Target, TargetCatalog, TemplateStyle};
    pub use crate::config::ForgeConfig;
    pub use crate::error::*;
    pub use crate::filter::{FilterCondition, FilterEdit, FilterId, Operator};
    pub use crate::lint::{Finding, Lint, Severity};
    pub use crate::parser::parse_filter;
    pub use crate::projection::ProjectionQuery;
    pub use crate::render::ToSql;
    pub use crate::schema::{ColumnDescriptor, ColumnType, InputSchema, OutputSchema};
    pub use crate::variants::{Variant, VARIANTS};
}

/// Parse a `column op value` filter expression.
///
/// # Example
///
/// ```
/// use qforge::parse_filter;
///
/// let expr = parse_filter("amount > 10").unwrap();
/// assert_eq!(expr.column, "amount");
/// assert_eq!(expr.value, "10");
/// ```
pub fn parse_filter(input: &str) -> Result<parser::FilterExpr, error::ForgeError> {
    parser::parse_filter(input)
}
