//! Guide configuration shared with the validation backend.
//!
//! The backend owns this file and stores more than the review overlay needs
//! (fonts, enabled checks); only the layout keys are read here.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Page margins in millimetres.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MarginsMm {
    #[serde(default)]
    pub top: f64,
    #[serde(default)]
    pub bottom: f64,
    #[serde(default)]
    pub left: f64,
    #[serde(default)]
    pub right: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GuideConfig {
    #[serde(default)]
    pub margin_mm: Option<MarginsMm>,
    /// Indent name -> offset in millimetres from the left margin.
    /// Kept as raw JSON: entries that are not numbers are simply unset.
    #[serde(default)]
    pub indent_rules: Option<BTreeMap<String, serde_json::Value>>,
}

impl GuideConfig {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn left_margin_mm(&self) -> Option<f64> {
        self.margin_mm.map(|m| m.left)
    }

    pub fn indent_mm(&self, name: &str) -> Option<f64> {
        self.indent_rules.as_ref()?.get(name)?.as_f64()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unrelated_keys_are_ignored() {
        let json = r#"{
            "margin_mm": {"top": 38.1, "bottom": 25.4, "left": 38.1, "right": 25.4},
            "font": {"name": "TH Sarabun New", "size": 16, "tolerance": 0.5},
            "check_list": {"check_margin": true},
            "indent_rules": {"paragraph": 12.7, "bullet_point": 5}
        }"#;
        let config = GuideConfig::from_json(json).unwrap();
        assert_eq!(config.left_margin_mm(), Some(38.1));
        assert_eq!(config.indent_mm("paragraph"), Some(12.7));
        assert_eq!(config.indent_mm("bullet_text"), None);
    }

    #[test]
    fn test_non_numeric_indent_entries_are_skipped() {
        let config = GuideConfig::from_json(
            r#"{"indent_rules": {"paragraph": 12.7, "note": "see manual", "bullet_text": null}}"#,
        )
        .unwrap();
        assert_eq!(config.indent_mm("paragraph"), Some(12.7));
        assert_eq!(config.indent_mm("note"), None);
        assert_eq!(config.indent_mm("bullet_text"), None);
    }

    #[test]
    fn test_missing_sections_mean_no_guides() {
        let config = GuideConfig::from_json("{}").unwrap();
        assert!(config.margin_mm.is_none());
        assert!(config.indent_rules.is_none());
        assert_eq!(config.left_margin_mm(), None);
    }

    #[test]
    fn test_partial_margins_default_to_zero() {
        let config = GuideConfig::from_json(r#"{"margin_mm": {"left": 30}}"#).unwrap();
        let margins = config.margin_mm.unwrap();
        assert_eq!(margins.left, 30.0);
        assert_eq!(margins.top, 0.0);
    }
}
