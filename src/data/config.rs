use std::path::Path;

use serde::{Deserialize, Serialize};

use super::error::Result;
use super::model::ColumnMap;

/// What to do with an amount below zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NegativeAmounts {
    /// Keep refunds and corrections as-is.
    #[default]
    Accept,
    Reject,
}

/// What to do with a row whose cells cannot be normalized.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowErrorPolicy {
    /// Abort the whole load on the first bad row.
    #[default]
    FailFast,
    /// Drop the row and record it on the table.
    Skip,
}

/// Knobs for loading and normalizing one dataset.
///
/// ```json
/// {
///   "columns": { "country": "Country", "product": "Product", "date": "Date",
///                "amount": "Revenue", "units": "Units Sold" },
///   "negative_amounts": "reject",
///   "row_errors": "skip"
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Explicit column mapping; `None` auto-detects a known preset.
    pub columns: Option<ColumnMap>,
    pub negative_amounts: NegativeAmounts,
    pub row_errors: RowErrorPolicy,
}

impl PipelineConfig {
    pub fn from_json_str(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_gives_fail_fast_defaults() {
        let cfg = PipelineConfig::from_json_str("{}").unwrap();
        assert_eq!(cfg, PipelineConfig::default());
        assert_eq!(cfg.row_errors, RowErrorPolicy::FailFast);
        assert_eq!(cfg.negative_amounts, NegativeAmounts::Accept);
    }

    #[test]
    fn parses_explicit_settings() {
        let cfg = PipelineConfig::from_json_str(
            r#"{
                "columns": {"country": "Country", "product": "Product", "date": "Date",
                            "amount": "Revenue", "units": "Units Sold"},
                "negative_amounts": "reject",
                "row_errors": "skip"
            }"#,
        )
        .unwrap();
        assert_eq!(cfg.columns, Some(ColumnMap::revenue_units()));
        assert_eq!(cfg.negative_amounts, NegativeAmounts::Reject);
        assert_eq!(cfg.row_errors, RowErrorPolicy::Skip);
    }
}
