//! `qforge.toml` configuration.
//!
//! ```toml
//! [projection]
//! columns = ["amount"]
//! limit = 500
//!
//! [[projection.filters]]
//! column = "country_code"
//! value = "GB"
//!
//! [anomaly]
//! training_period = 7
//! protocol = "SMS"
//! style = "annotated"
//! ```

use serde::{Deserialize, Deserializer};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::anomaly::{AnomalyRule, Target, TargetCatalog, TemplateStyle};
use crate::error::{ForgeError, ForgeResult};
use crate::projection::ProjectionQuery;
use crate::schema::InputSchema;

/// File name looked up in the working directory and the user config dir.
pub const CONFIG_FILE: &str = "qforge.toml";

/// Top-level configuration file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ForgeConfig {
    pub projection: ProjectionConfig,
    pub anomaly: AnomalyConfig,
}

/// A scalar kept as text. Accepts TOML strings, integers and floats so that
/// `limit = 100` and `limit = "100"` mean the same thing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawText(pub String);

impl<'de> Deserialize<'de> for RawText {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Scalar {
            Text(String),
            Int(i64),
            Float(f64),
        }

        Ok(match Scalar::deserialize(deserializer)? {
            Scalar::Text(s) => RawText(s),
            Scalar::Int(n) => RawText(n.to_string()),
            Scalar::Float(x) => RawText(x.to_string()),
        })
    }
}

impl fmt::Display for RawText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProjectionConfig {
    /// Source table name override.
    pub table: Option<String>,
    /// Optional columns to select on top of the required ones.
    pub columns: Vec<String>,
    pub limit: Option<RawText>,
    pub filters: Vec<FilterConfig>,
    /// Drop the built-in `event_type = 'purchase'` filter first.
    pub replace_default_filters: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FilterConfig {
    pub column: String,
    #[serde(default = "default_operator")]
    pub operator: String,
    #[serde(default = "empty_text")]
    pub value: RawText,
}

fn default_operator() -> String {
    "=".to_string()
}

fn empty_text() -> RawText {
    RawText(String::new())
}

impl ProjectionConfig {
    /// The input schema with the configured table name applied.
    pub fn input_schema(&self) -> InputSchema {
        let mut schema = InputSchema::user_events();
        if let Some(table) = &self.table {
            schema.table_name = table.clone();
        }
        schema
    }

    /// Apply this section on top of an existing builder.
    pub fn apply(&self, query: &mut ProjectionQuery) -> ForgeResult<()> {
        if let Some(table) = &self.table {
            query.set_table(table.clone());
        }
        for column in &self.columns {
            query.select_column(column)?;
        }
        if let Some(limit) = &self.limit {
            query.set_limit(limit);
        }
        if self.replace_default_filters {
            query.clear_filters();
        }
        for filter in &self.filters {
            query.push_filter(&filter.column, filter.operator.parse()?, filter.value.0.clone())?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnomalyConfig {
    pub rule_name: Option<String>,
    pub training_period: Option<RawText>,
    pub reference_date: Option<String>,
    pub protocol: Option<String>,
    pub threshold: Option<RawText>,
    pub group_id: Option<RawText>,
    pub group_name: Option<String>,
    pub style: Option<TemplateStyle>,
    pub data_source: Option<String>,
    pub targets: Option<Vec<Target>>,
}

impl AnomalyConfig {
    /// Apply this section on top of an existing rule.
    pub fn apply(&self, rule: &mut AnomalyRule) -> ForgeResult<()> {
        let p = &mut rule.params;
        if let Some(v) = &self.rule_name {
            p.rule_name = v.clone();
        }
        if let Some(v) = &self.training_period {
            p.training_period = v.0.clone();
        }
        if let Some(v) = &self.reference_date {
            p.reference_date = v.clone();
        }
        if let Some(v) = &self.protocol {
            p.protocol = v.parse()?;
        }
        if let Some(v) = &self.threshold {
            p.threshold = v.0.clone();
        }
        if let Some(v) = &self.group_id {
            p.group_id = v.0.clone();
        }
        if let Some(v) = &self.group_name {
            p.group_name = v.clone();
        }
        if let Some(style) = self.style {
            rule.style = style;
        }
        if let Some(source) = &self.data_source {
            rule.data_source = source.clone();
        }
        if let Some(targets) = &self.targets {
            rule.catalog = TargetCatalog::new(targets.clone());
        }
        Ok(())
    }
}

impl ForgeConfig {
    /// Parse configuration from TOML text.
    pub fn parse(content: &str) -> ForgeResult<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Read and parse a configuration file.
    pub fn from_file(path: &Path) -> ForgeResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ForgeError::Config(format!("{}: {}", path.display(), e)))?;
        toml::from_str(&content)
            .map_err(|e| ForgeError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Find a configuration file: `./qforge.toml`, then
    /// `<config dir>/qforge/qforge.toml`.
    pub fn discover() -> Option<PathBuf> {
        let local = PathBuf::from(CONFIG_FILE);
        if local.exists() {
            return Some(local);
        }
        dirs::config_dir()
            .map(|dir| dir.join("qforge").join(CONFIG_FILE))
            .filter(|path| path.exists())
    }

    /// Load configuration. An explicit path must exist; otherwise the
    /// discovered file is used, or built-in defaults when there is none.
    pub fn load(explicit: Option<&Path>) -> ForgeResult<(Self, Option<PathBuf>)> {
        let path = match explicit {
            Some(path) => Some(path.to_path_buf()),
            None => Self::discover(),
        };

        match path {
            Some(path) => {
                debug!(path = %path.display(), "loading config");
                Ok((Self::from_file(&path)?, Some(path)))
            }
            None => {
                debug!("no config file, using defaults");
                Ok((Self::default(), None))
            }
        }
    }
}
