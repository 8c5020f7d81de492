//! Anomaly-rule template state.
//!
//! A rule compares each target's historical behaviour over a training window
//! against a threshold and joins the matches with the target's activity on
//! the reference date. All numeric and date parameters are kept as raw text
//! and interpolated verbatim.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::{ForgeError, ForgeResult};

/// Table expression the rule reads call records from.
pub const DEFAULT_DATA_SOURCE: &str =
    "parquet.`hdfs://SUNIPR/user/ctadmin/vijay/TargetAnomalies/MASS`";

/// Call-record protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Protocol {
    Voice,
    Sms,
    Data,
}

impl Protocol {
    pub const ALL: [Protocol; 3] = [Protocol::Voice, Protocol::Sms, Protocol::Data];

    pub fn as_str(self) -> &'static str {
        match self {
            Protocol::Voice => "VOICE",
            Protocol::Sms => "SMS",
            Protocol::Data => "DATA",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Protocol {
    type Err = ForgeError;

    fn from_str(s: &str) -> ForgeResult<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "VOICE" => Ok(Protocol::Voice),
            "SMS" => Ok(Protocol::Sms),
            "DATA" => Ok(Protocol::Data),
            _ => Err(ForgeError::invalid("protocol", s)),
        }
    }
}

/// How much commentary the rendered template carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateStyle {
    /// Bare stages.
    #[default]
    Compact,
    /// One `--` comment line at the top of each aggregation stage.
    Annotated,
}

impl FromStr for TemplateStyle {
    type Err = ForgeError;

    fn from_str(s: &str) -> ForgeResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(TemplateStyle::Compact),
            "annotated" => Ok(TemplateStyle::Annotated),
            _ => Err(ForgeError::invalid("template style", s)),
        }
    }
}

/// A monitored subscriber.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    pub tel: String,
    pub name: String,
}

impl Target {
    pub fn new(tel: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            tel: tel.into(),
            name: name.into(),
        }
    }
}

#[derive(Serialize)]
struct TargetMeta<'a> {
    target_name: &'a str,
}

/// Fixed list of targets embedded into the template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TargetCatalog(Vec<Target>);

impl TargetCatalog {
    pub fn new(targets: Vec<Target>) -> Self {
        Self(targets)
    }

    /// Three-target seed used by the compact template.
    pub fn compact() -> Self {
        Self(vec![
            Target::new("9811002233", "VIP Exec Global"),
            Target::new("9123456789", "Gateway Node East"),
            Target::new("8800112244", "Staff Admin Alpha"),
        ])
    }

    /// Four-target seed used by the annotated template.
    pub fn annotated() -> Self {
        let mut catalog = Self::compact();
        catalog.0.push(Target::new("7042556677", "Sensor Fleet 01"));
        catalog
    }

    pub fn targets(&self) -> &[Target] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Compact JSON of the form `[{"<tel>":{"target_name":"<name>"}}, ...]`.
    pub fn to_json(&self) -> String {
        let entries: Vec<BTreeMap<&str, TargetMeta<'_>>> = self
            .0
            .iter()
            .map(|t| BTreeMap::from([(t.tel.as_str(), TargetMeta { target_name: &t.name })]))
            .collect();
        // Serializing string-keyed maps of plain structs cannot fail.
        serde_json::to_string(&entries).unwrap_or_else(|_| "[]".to_string())
    }
}

/// User-editable rule parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleParameters {
    pub rule_name: String,
    /// Lookback window in days.
    pub training_period: String,
    /// `YYYY-MM-DD`.
    pub reference_date: String,
    pub protocol: Protocol,
    /// Exact count of unique destinations that flags a target.
    pub threshold: String,
    pub group_id: String,
    pub group_name: String,
}

impl Default for RuleParameters {
    fn default() -> Self {
        Self {
            rule_name: "Target is calling one person only".to_string(),
            training_period: "5".to_string(),
            reference_date: "2026-01-08".to_string(),
            protocol: Protocol::Voice,
            threshold: "1".to_string(),
            group_id: "1767861204".to_string(),
            group_name: "Release v110 Full Suite".to_string(),
        }
    }
}

/// A fully configured anomaly rule, ready to render.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnomalyRule {
    pub params: RuleParameters,
    pub catalog: TargetCatalog,
    pub style: TemplateStyle,
    pub data_source: String,
}

impl AnomalyRule {
    pub fn new(params: RuleParameters, catalog: TargetCatalog) -> Self {
        Self {
            params,
            catalog,
            style: TemplateStyle::Compact,
            data_source: DEFAULT_DATA_SOURCE.to_string(),
        }
    }

    /// Compact template with the three-target catalog.
    pub fn compact() -> Self {
        Self::new(RuleParameters::default(), TargetCatalog::compact())
    }

    /// Annotated template with the four-target catalog.
    pub fn annotated() -> Self {
        Self::new(RuleParameters::default(), TargetCatalog::annotated())
            .with_style(TemplateStyle::Annotated)
    }

    pub fn with_style(mut self, style: TemplateStyle) -> Self {
        self.style = style;
        self
    }

    pub fn with_data_source(mut self, data_source: impl Into<String>) -> Self {
        self.data_source = data_source.into();
        self
    }

    /// Midnight of the reference date, as interpolated into the template.
    pub fn reference_timestamp(&self) -> String {
        format!("{} 00:00:00", self.params.reference_date)
    }

    /// Concrete `[reference - period, reference - 1]` window, when both the
    /// date and the period parse.
    pub fn training_window(&self) -> Option<(NaiveDate, NaiveDate)> {
        let reference = NaiveDate::parse_from_str(self.params.reference_date.trim(), "%Y-%m-%d").ok()?;
        let days: i64 = self.params.training_period.trim().parse().ok()?;
        let start = reference.checked_sub_signed(Duration::try_days(days)?)?;
        let end = reference.checked_sub_signed(Duration::try_days(1)?)?;
        Some((start, end))
    }
}

impl Default for AnomalyRule {
    fn default() -> Self {
        Self::compact()
    }
}
