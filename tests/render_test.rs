use pretty_assertions::assert_eq;
use qforge::prelude::*;

const COMPACT: &str = include_str!("fixtures/anomaly_compact.sql");
const ANNOTATED: &str = include_str!("fixtures/anomaly_annotated.sql");

#[test]
fn test_compact_template_matches_fixture() {
    assert_eq!(AnomalyRule::compact().to_sql(), COMPACT);
}

#[test]
fn test_annotated_template_matches_fixture() {
    assert_eq!(AnomalyRule::annotated().to_sql(), ANNOTATED);
}

#[test]
fn test_variant_defaults_render_their_templates() {
    let v2 = Variant::AnomalyTemplate.anomaly_rule().unwrap();
    let v3 = Variant::AnomalyProduction.anomaly_rule().unwrap();
    assert_eq!(v2.to_sql(), COMPACT);
    assert_eq!(v3.to_sql(), ANNOTATED);
}

#[test]
fn test_window_bounds_follow_parameters() {
    let mut rule = AnomalyRule::compact();
    rule.params.training_period = "14".to_string();
    rule.params.reference_date = "2026-03-01".to_string();
    rule.params.protocol = Protocol::Data;
    rule.params.threshold = "3".to_string();

    let sql = rule.to_sql();
    assert!(sql.contains(
        "BETWEEN date_sub('2026-03-01 00:00:00', CAST('14' AS INT)) AND date_sub('2026-03-01 00:00:00', 1)"
    ));
    assert!(sql.contains("WHERE to_date(DATE) = to_date('2026-03-01 00:00:00') \n"));
    assert_eq!(sql.matches("AND PROTOCOL = 'DATA' \n").count(), 2);
    assert!(sql.contains("  concat(a.mobile_number, '-AID-14-', 'DATA-', '2026-03-01 00:00:00') AS id,\n"));
    assert!(sql.contains("exactly 3 unique destination(s) during the 14 days prior."));
    assert!(sql.contains("  '14' AS RuleId,\n"));
}

#[test]
fn test_invalid_numbers_are_interpolated_verbatim() {
    let mut rule = AnomalyRule::compact();
    rule.params.training_period = String::new();
    rule.params.threshold = "abc".to_string();

    let sql = rule.to_sql();
    assert!(sql.contains("CAST('' AS INT)"));
    assert!(sql.contains("WHERE s.unique_destinations = abc\n"));
}

#[test]
fn test_custom_catalog_and_source() {
    let rule = AnomalyRule::new(
        RuleParameters::default(),
        TargetCatalog::new(vec![Target::new("555", "Solo")]),
    )
    .with_data_source("calls.cdr");

    let sql = rule.to_sql();
    assert!(sql.contains(r#"from_json('[{"555":{"target_name":"Solo"}}]', "#));
    assert_eq!(sql.matches("  FROM calls.cdr\n").count(), 2);
}

#[test]
fn test_projection_full_text() {
    let mut query = ProjectionQuery::default();
    query.toggle_column("country_code").unwrap();
    query.push_filter("amount", Operator::Gt, "25.5").unwrap();
    query.push_filter("event_date", Operator::Lt, "2026-01-01").unwrap();
    query.set_limit(50);

    assert_eq!(
        query.to_sql(),
        "SELECT\n  user_id,\n  event_type,\n  event_date,\n  country_code\nFROM user_events\nWHERE\n  event_type = 'purchase'\n  AND amount > 25.5\n  AND event_date < '2026-01-01'\nLIMIT 50;"
    );
}

#[test]
fn test_required_columns_always_rendered() {
    let mut query = ProjectionQuery::default();
    for column in ["user_id", "event_type", "event_date", "amount", "amount", "country_code"] {
        query.toggle_column(column).unwrap();
    }
    let sql = query.to_sql();
    let select = &sql[..sql.find("\nFROM").unwrap()];
    for required in &query.output_schema().required_columns {
        assert!(select.contains(required.as_str()), "missing {}", required);
    }
    assert!(!select.contains("amount"));
}

#[test]
fn test_predicate_count_matches_filters() {
    let mut query = ProjectionQuery::default();
    query.add_filter();
    query.add_filter();
    query.push_filter("is_premium", Operator::Eq, "true").unwrap();

    let sql = query.to_sql();
    let where_clause = &sql[sql.find("WHERE\n").unwrap()..sql.find("\nLIMIT").unwrap()];
    assert_eq!(where_clause.matches("\n  AND ").count() + 1, query.filters().len());
}

#[test]
fn test_remove_middle_filter_keeps_order() {
    let mut query = ProjectionQuery::default();
    let middle = query.push_filter("amount", Operator::Gt, "1").unwrap();
    query.push_filter("country_code", Operator::Eq, "FR").unwrap();

    query.remove_filter(&middle).unwrap();
    assert_eq!(query.filters().len(), 2);
    assert!(query
        .to_sql()
        .contains("WHERE\n  event_type = 'purchase'\n  AND country_code = 'FR'\nLIMIT 100;"));
}

#[test]
fn test_parsed_filters_render() {
    let mut query = ProjectionQuery::new(InputSchema::user_events(), OutputSchema::reporting_standard());
    for text in ["event_type LIKE 'pur%'", "user_id!=0"] {
        let expr = parse_filter(text).unwrap();
        query.push_filter(&expr.column, expr.operator, expr.value).unwrap();
    }
    assert!(query
        .to_sql()
        .contains("WHERE\n  event_type LIKE 'pur%'\n  AND user_id != 0\nLIMIT 100;"));
}

#[test]
fn test_render_is_idempotent() {
    let mut query = ProjectionQuery::default();
    query.add_filter();
    let first = query.to_sql();
    let second = query.to_sql();
    assert_eq!(first, second);

    let rule = AnomalyRule::annotated();
    assert_eq!(rule.to_sql(), rule.to_sql());
}
