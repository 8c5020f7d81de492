//! The builder variants and their entry points.

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use crate::anomaly::AnomalyRule;
use crate::error::{ForgeError, ForgeResult};

/// One of the three builders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Variant {
    /// SELECT/FROM/WHERE builder with schema-driven column selection.
    CoreQuery,
    /// CTE anomaly template, compact.
    AnomalyTemplate,
    /// CTE anomaly template, annotated, with the larger target seed.
    AnomalyProduction,
}

/// Hub listing entry for a variant.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct VariantInfo {
    pub variant: Variant,
    pub path: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub tag: &'static str,
}

pub static VARIANTS: [VariantInfo; 3] = [
    VariantInfo {
        variant: Variant::CoreQuery,
        path: "/1",
        title: "V1: Core Query Builder",
        description: "Basic SELECT/FROM/WHERE implementation with schema-driven field selection.",
        tag: "Foundation",
    },
    VariantInfo {
        variant: Variant::AnomalyTemplate,
        path: "/2",
        title: "V2: Anomaly Detection Template",
        description: "Advanced CTE-based pipeline focusing on training periods and behavior thresholds.",
        tag: "Analytics",
    },
    VariantInfo {
        variant: Variant::AnomalyProduction,
        path: "/3",
        title: "V3: Production-Ready Builder",
        description: "Annotated CTE stages, strict metadata mapping, and HDFS optimization.",
        tag: "Production",
    },
];

impl Variant {
    pub fn info(self) -> &'static VariantInfo {
        match self {
            Variant::CoreQuery => &VARIANTS[0],
            Variant::AnomalyTemplate => &VARIANTS[1],
            Variant::AnomalyProduction => &VARIANTS[2],
        }
    }

    /// Default anomaly rule for the anomaly variants.
    pub fn anomaly_rule(self) -> Option<AnomalyRule> {
        match self {
            Variant::CoreQuery => None,
            Variant::AnomalyTemplate => Some(AnomalyRule::compact()),
            Variant::AnomalyProduction => Some(AnomalyRule::annotated()),
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.info().title)
    }
}

impl FromStr for Variant {
    type Err = ForgeError;

    /// Accepts the hub path (`/2`) or the bare number (`2`).
    fn from_str(s: &str) -> ForgeResult<Self> {
        let key = s.trim();
        let key = key.strip_prefix('/').unwrap_or(key);
        VARIANTS
            .iter()
            .find(|v| &v.path[1..] == key)
            .map(|v| v.variant)
            .ok_or_else(|| ForgeError::invalid("variant", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anomaly::TemplateStyle;

    #[test]
    fn test_lookup_by_path() {
        assert_eq!("/1".parse::<Variant>().unwrap(), Variant::CoreQuery);
        assert_eq!("3".parse::<Variant>().unwrap(), Variant::AnomalyProduction);
        assert!("/4".parse::<Variant>().is_err());
        assert!("".parse::<Variant>().is_err());
    }

    #[test]
    fn test_info_matches_table() {
        for info in &VARIANTS {
            assert_eq!(info.variant.info().path, info.path);
        }
    }

    #[test]
    fn test_anomaly_defaults() {
        assert!(Variant::CoreQuery.anomaly_rule().is_none());
        let v2 = Variant::AnomalyTemplate.anomaly_rule().unwrap();
        assert_eq!(v2.style, TemplateStyle::Compact);
        assert_eq!(v2.catalog.len(), 3);
        let v3 = Variant::AnomalyProduction.anomaly_rule().unwrap();
        assert_eq!(v3.style, TemplateStyle::Annotated);
        assert_eq!(v3.catalog.len(), 4);
    }
}
