//! SQL template renderer.
//!
//! Turns builder state into Spark SQL text. Rendering is a pure function of
//! the current state: nothing is cached, nothing is validated, and field
//! values are substituted exactly as entered.

use tracing::debug;

use crate::anomaly::{AnomalyRule, TemplateStyle};
use crate::projection::ProjectionQuery;

/// Trait for rendering builder state to SQL.
pub trait ToSql {
    /// Render this state to a SQL string.
    fn to_sql(&self) -> String;
}

impl ToSql for ProjectionQuery {
    fn to_sql(&self) -> String {
        let mut sql = String::from("SELECT\n  ");

        // Columns
        if self.selected().is_empty() {
            sql.push('*');
        } else {
            sql.push_str(&self.selected().join(",\n  "));
        }

        // FROM
        sql.push_str("\nFROM ");
        sql.push_str(&self.input_schema().table_name);
        sql.push('\n');

        // WHERE, one predicate per filter in insertion order. An empty filter
        // list leaves a blank line.
        if !self.filters().is_empty() {
            let predicates: Vec<String> = self
                .filters()
                .iter()
                .map(|f| f.to_sql(self.input_schema()))
                .collect();
            sql.push_str("WHERE\n  ");
            sql.push_str(&predicates.join("\n  AND "));
        }

        // LIMIT
        sql.push_str(&format!("\nLIMIT {};", self.limit()));

        debug!(
            columns = self.selected().len(),
            filters = self.filters().len(),
            "rendered projection query"
        );
        sql
    }
}

impl ToSql for AnomalyRule {
    fn to_sql(&self) -> String {
        let p = &self.params;
        let ref_ts = self.reference_timestamp();
        let annotated = self.style == TemplateStyle::Annotated;
        let mut sql = String::new();

        // Targets: explode the embedded JSON catalog into (number, name) rows
        sql.push_str("WITH targets AS (\n");
        sql.push_str("  SELECT target_entry.key AS mobile_number, target_entry.value.target_name AS target_name \n");
        sql.push_str(&format!(
            "  FROM (SELECT from_json('{}', 'array<map<string,struct<target_name:string>>>') AS arr) raw \n",
            self.catalog.to_json()
        ));
        sql.push_str("  LATERAL VIEW EXPLODE(arr) a AS target_map \n");
        sql.push_str("  LATERAL VIEW EXPLODE(MAP_ENTRIES(target_map)) t AS target_entry\n");
        sql.push_str("), \n");

        // Training window summary
        sql.push_str("T_summary_tp AS (\n");
        if annotated {
            sql.push_str("  -- Training Period Summary: Analyzing historical behavior\n");
        }
        sql.push_str("  SELECT MOBILENUMBER, COUNT(DISTINCT CALLEDNUMBER) AS unique_destinations \n");
        sql.push_str(&format!("  FROM {}\n", self.data_source));
        sql.push_str(&format!(
            "  WHERE to_date(DATE) BETWEEN date_sub('{ts}', CAST('{n}' AS INT)) AND date_sub('{ts}', 1)\n",
            ts = ref_ts,
            n = p.training_period
        ));
        sql.push_str(&format!("    AND PROTOCOL = '{}' \n", p.protocol));
        sql.push_str("    AND MOBILENUMBER IN (SELECT mobile_number FROM targets)\n");
        sql.push_str("  GROUP BY MOBILENUMBER\n");
        sql.push_str("), \n");

        // Threshold match
        sql.push_str("T_anomaly AS (\n");
        if annotated {
            sql.push_str("  -- Identifying targets that meet the threshold criteria\n");
        }
        sql.push_str("  SELECT t.mobile_number, t.target_name, s.unique_destinations \n");
        sql.push_str("  FROM targets t \n");
        sql.push_str("  JOIN T_summary_tp s ON t.mobile_number = s.MOBILENUMBER \n");
        sql.push_str(&format!("  WHERE s.unique_destinations = {}\n", p.threshold));
        sql.push_str("), \n");

        // Activity on the reference date
        sql.push_str("T_active_agg AS (\n");
        if annotated {
            sql.push_str("  -- Current Activity: Capturing metadata for the detection date\n");
        }
        sql.push_str("  SELECT MOBILENUMBER, MIN(TRANSACTIONSTARTTIME) AS FirstSeenStartTime, MAX(TRANSACTIONSTARTTIME) AS LastSeenStartTime \n");
        sql.push_str(&format!("  FROM {}\n", self.data_source));
        sql.push_str(&format!("  WHERE to_date(DATE) = to_date('{}') \n", ref_ts));
        sql.push_str(&format!("    AND PROTOCOL = '{}' \n", p.protocol));
        sql.push_str("    AND MOBILENUMBER IN (SELECT mobile_number FROM targets) \n");
        sql.push_str("  GROUP BY MOBILENUMBER \n");
        sql.push_str(")\n");

        // Final projection
        sql.push_str("SELECT \n");
        sql.push_str(&format!(
            "  concat(a.mobile_number, '-AID-{}-', '{}-', '{}') AS id,\n",
            p.training_period, p.protocol, ref_ts
        ));
        sql.push_str("  a.mobile_number AS MobileNumber,\n");
        sql.push_str("  a.target_name AS TargetName,\n");
        sql.push_str(&format!("  '{}' AS RuleId,\n", p.training_period));
        sql.push_str(&format!("  '{}' AS RuleName,\n", p.rule_name));
        sql.push_str(&format!("  '{}' AS GroupId,\n", p.group_id));
        sql.push_str(&format!("  '{}' AS GroupName,\n", p.group_name));
        sql.push_str(&format!(
            "  concat('Target connected to exactly {} unique destination(s) during the {} days prior.') AS Evidence,\n",
            p.threshold, p.training_period
        ));
        sql.push_str(&format!("  '{}' AS Date,\n", ref_ts));
        sql.push_str("  a.unique_destinations AS BehaviourMetricValue,\n");
        sql.push_str("  d.FirstSeenStartTime, \n");
        sql.push_str("  d.LastSeenStartTime \n");
        sql.push_str("FROM T_anomaly a \n");
        sql.push_str("JOIN T_active_agg d ON d.MOBILENUMBER = a.mobile_number;");

        debug!(
            targets = self.catalog.len(),
            style = ?self.style,
            "rendered anomaly rule"
        );
        sql
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{FilterEdit, Operator};
    use crate::schema::{InputSchema, OutputSchema};

    #[test]
    fn test_default_projection() {
        let query = ProjectionQuery::default();
        assert_eq!(
            query.to_sql(),
            "SELECT\n  user_id,\n  event_type,\n  event_date\nFROM user_events\nWHERE\n  event_type = 'purchase'\nLIMIT 100;"
        );
    }

    #[test]
    fn test_no_filters_leaves_blank_line() {
        let query = ProjectionQuery::new(InputSchema::user_events(), OutputSchema::reporting_standard());
        assert_eq!(
            query.to_sql(),
            "SELECT\n  user_id,\n  event_type,\n  event_date\nFROM user_events\n\nLIMIT 100;"
        );
    }

    #[test]
    fn test_empty_selection_falls_back_to_star() {
        let output = OutputSchema {
            name: "Open".to_string(),
            required_columns: vec![],
            optional_columns: vec!["amount".to_string()],
        };
        let query = ProjectionQuery::new(InputSchema::user_events(), output);
        assert!(query.to_sql().starts_with("SELECT\n  *\nFROM user_events"));
    }

    #[test]
    fn test_filters_and_joined_in_order() {
        let mut query = ProjectionQuery::default();
        query.push_filter("amount", Operator::Gt, "10").unwrap();
        query.push_filter("country_code", Operator::Ne, "US").unwrap();
        let sql = query.to_sql();
        assert!(sql.contains(
            "WHERE\n  event_type = 'purchase'\n  AND amount > 10\n  AND country_code != 'US'\nLIMIT 100;"
        ));
    }

    #[test]
    fn test_empty_value_filter_is_emitted() {
        let mut query = ProjectionQuery::default();
        query.add_filter();
        let sql = query.to_sql();
        assert!(sql.contains("\n  AND user_id = \n"));
        assert_eq!(sql.matches("\n  AND ").count(), 1);
    }

    #[test]
    fn test_removing_last_filter_empties_where() {
        let mut query = ProjectionQuery::default();
        let id = query.filters()[0].id.clone();
        query.remove_filter(&id);
        assert!(!query.to_sql().contains("WHERE"));
    }

    #[test]
    fn test_limit_verbatim() {
        let mut query = ProjectionQuery::default();
        query.set_limit("abc");
        assert!(query.to_sql().ends_with("\nLIMIT abc;"));
    }

    #[test]
    fn test_update_changes_quoting() {
        let mut query = ProjectionQuery::default();
        let id = query.filters()[0].id.clone();
        query
            .update_filter(&id, FilterEdit::Column("user_id".to_string()))
            .unwrap();
        assert!(query.to_sql().contains("  user_id = purchase\n"));
    }

    #[test]
    fn test_anomaly_window_bounds() {
        let sql = AnomalyRule::compact().to_sql();
        assert!(sql.contains(
            "BETWEEN date_sub('2026-01-08 00:00:00', CAST('5' AS INT)) AND date_sub('2026-01-08 00:00:00', 1)"
        ));
        assert!(sql.contains("WHERE s.unique_destinations = 1\n"));
        assert!(sql.contains("AND PROTOCOL = 'VOICE' \n"));
    }

    #[test]
    fn test_anomaly_annotations_only_when_annotated() {
        let compact = AnomalyRule::compact().to_sql();
        assert!(!compact.contains("--"));
        let annotated = AnomalyRule::annotated().to_sql();
        assert_eq!(annotated.matches("\n  -- ").count(), 3);
        assert!(annotated.contains("7042556677"));
    }

    #[test]
    fn test_anomaly_user_text_not_escaped() {
        let mut rule = AnomalyRule::compact();
        rule.params.rule_name = "it's".to_string();
        assert!(rule.to_sql().contains("  'it's' AS RuleName,\n"));
    }

    #[test]
    fn test_render_deterministic() {
        let rule = AnomalyRule::annotated();
        assert_eq!(rule.to_sql(), rule.to_sql());
        let query = ProjectionQuery::default();
        assert_eq!(query.to_sql(), query.to_sql());
    }
}
