//! Advisory checks on builder state.
//!
//! Rendering accepts anything. These checks point out input that will
//! produce broken or surprising SQL; they never block rendering.

use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;
use tracing::debug;

use crate::anomaly::AnomalyRule;
use crate::filter::Operator;
use crate::projection::ProjectionQuery;

/// How bad a finding is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Valid SQL, probably not what was meant.
    Warning,
    /// The rendered SQL will not run.
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => f.write_str("warning"),
            Severity::Error => f.write_str("error"),
        }
    }
}

/// A single lint finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Finding {
    pub severity: Severity,
    /// Field the finding is about (`limit`, `filter 2`, `training_period`).
    pub field: String,
    pub message: String,
}

impl Finding {
    fn warning(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            field: field.into(),
            message: message.into(),
        }
    }

    fn error(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]: {}", self.severity, self.field, self.message)
    }
}

/// State that can be checked.
pub trait Lint {
    fn lint(&self) -> Vec<Finding>;
}

impl Lint for ProjectionQuery {
    fn lint(&self) -> Vec<Finding> {
        let mut findings = Vec::new();

        check_count(&mut findings, "limit", self.limit(), false);

        for filter in self.filters() {
            let field = format!("filter {}", filter.id);
            let Some(column) = self.input_schema().column(&filter.column) else {
                findings.push(Finding::error(
                    field,
                    format!("column '{}' is not in the input schema", filter.column),
                ));
                continue;
            };

            if filter.value.is_empty() {
                findings.push(Finding::warning(
                    &field,
                    format!("empty value renders as `{}`", filter.to_sql(self.input_schema())),
                ));
                continue;
            }

            // LIKE values are patterns, not members of the value set.
            let pattern = filter.operator == Operator::Like;

            if let Some(options) = column.options.as_ref().filter(|_| !pattern) {
                if !options.iter().any(|o| o == &filter.value) {
                    findings.push(Finding::warning(
                        &field,
                        format!(
                            "'{}' is not one of the allowed values for {} ({})",
                            filter.value,
                            column.name,
                            options.join(", ")
                        ),
                    ));
                }
            }

            if !pattern && column.column_type.is_numeric() && filter.value.trim().parse::<f64>().is_err() {
                findings.push(Finding::error(
                    &field,
                    format!("{} is {} but '{}' is not a number", column.name, column.column_type, filter.value),
                ));
            }

            if column.column_type.is_quoted() && filter.value.contains('\'') {
                findings.push(Finding::error(
                    &field,
                    "value contains a single quote, which ends the literal early",
                ));
            }
        }

        report(&findings);
        findings
    }
}

impl Lint for AnomalyRule {
    fn lint(&self) -> Vec<Finding> {
        let p = &self.params;
        let mut findings = Vec::new();

        check_count(&mut findings, "training_period", &p.training_period, true);
        check_count(&mut findings, "threshold", &p.threshold, false);

        if NaiveDate::parse_from_str(p.reference_date.trim(), "%Y-%m-%d").is_err() {
            findings.push(Finding::error(
                "reference_date",
                format!("'{}' is not a YYYY-MM-DD date", p.reference_date),
            ));
        }

        for (field, text) in [
            ("rule_name", &p.rule_name),
            ("group_id", &p.group_id),
            ("group_name", &p.group_name),
        ] {
            if text.contains('\'') {
                findings.push(Finding::error(
                    field,
                    "value contains a single quote, which ends the literal early",
                ));
            }
        }

        if self.catalog.is_empty() {
            findings.push(Finding::warning("targets", "target catalog is empty; the rule matches nothing"));
        }

        report(&findings);
        findings
    }
}

/// Check a field that should hold a non-negative integer.
fn check_count(findings: &mut Vec<Finding>, field: &str, text: &str, positive: bool) {
    match text.trim().parse::<i64>() {
        Err(_) => findings.push(Finding::error(field, format!("'{}' is not an integer", text))),
        Ok(n) if n < 0 => findings.push(Finding::warning(field, format!("{} is negative", n))),
        Ok(0) if positive => findings.push(Finding::warning(field, "0 gives an empty window")),
        Ok(_) => {}
    }
}

fn report(findings: &[Finding]) {
    for finding in findings {
        debug!(field = %finding.field, severity = %finding.severity, "{}", finding.message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anomaly::TargetCatalog;
    use crate::filter::FilterEdit;

    #[test]
    fn test_defaults_are_clean() {
        assert!(ProjectionQuery::default().lint().is_empty());
        assert!(AnomalyRule::compact().lint().is_empty());
        assert!(AnomalyRule::annotated().lint().is_empty());
    }

    #[test]
    fn test_limit_not_integer() {
        let mut query = ProjectionQuery::default();
        query.set_limit("");
        let findings = query.lint();
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::Error);
        assert_eq!(findings[0].field, "limit");
    }

    #[test]
    fn test_empty_filter_value() {
        let mut query = ProjectionQuery::default();
        query.add_filter();
        let findings = query.lint();
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::Warning);
        assert!(findings[0].message.contains("user_id = "));
    }

    #[test]
    fn test_value_outside_options() {
        let mut query = ProjectionQuery::default();
        query.push_filter("country_code", Operator::Eq, "JP").unwrap();
        let findings = query.lint();
        assert_eq!(findings.len(), 1);
        assert!(findings[0].message.contains("US, CA, GB, DE, FR"));
    }

    #[test]
    fn test_like_pattern_skips_value_set() {
        let mut query = ProjectionQuery::default();
        query.push_filter("event_type", Operator::Like, "pur%").unwrap();
        query.push_filter("country_code", Operator::Like, "U_").unwrap();
        query.push_filter("amount", Operator::Like, "1%").unwrap();
        assert!(query.lint().is_empty());

        query.push_filter("event_type", Operator::Eq, "pur%").unwrap();
        let findings = query.lint();
        assert_eq!(findings.len(), 1);
        assert!(findings[0].message.contains("not one of the allowed values"));
    }

    #[test]
    fn test_non_numeric_on_numeric_column() {
        let mut query = ProjectionQuery::default();
        let id = query.filters()[0].id.clone();
        query
            .update_filter(&id, FilterEdit::Column("amount".to_string()))
            .unwrap();
        let findings = query.lint();
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::Error);
    }

    #[test]
    fn test_quote_in_string_literal() {
        let mut query = ProjectionQuery::default();
        query.push_filter("event_type", Operator::Like, "o'brien").unwrap();
        let findings = query.lint();
        assert!(findings.iter().any(|f| f.message.contains("single quote")));
    }

    #[test]
    fn test_rule_checks() {
        let mut rule = AnomalyRule::new(Default::default(), TargetCatalog::new(vec![]));
        rule.params.training_period = "-3".to_string();
        rule.params.threshold = "one".to_string();
        rule.params.reference_date = "2026-13-01".to_string();
        rule.params.group_name = "Ops' team".to_string();

        let findings = rule.lint();
        let fields: Vec<&str> = findings.iter().map(|f| f.field.as_str()).collect();
        assert_eq!(
            fields,
            vec!["training_period", "threshold", "reference_date", "group_name", "targets"]
        );
    }

    #[test]
    fn test_zero_training_period() {
        let mut rule = AnomalyRule::compact();
        rule.params.training_period = "0".to_string();
        let findings = rule.lint();
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::Warning);
    }
}
