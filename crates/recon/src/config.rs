use std::path::Path;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::ReconError;
use crate::mapping::FieldMapping;
use crate::rules::{MatchMode, ModeName, Rules};

// ---------------------------------------------------------------------------
// Request
// ---------------------------------------------------------------------------

/// One reconciliation request: mode, column mapping, and custom-mode rules.
///
/// Loaded from a `.recon.toml` file or a JSON body:
///
/// ```toml
/// mode = "custom"
///
/// [mapping.amount]
/// a = "Amount"
/// b = "value"
///
/// [rules]
/// amount_tolerance = 5
/// composite_keys_a = ["Date", "Memo"]
/// composite_keys_b = ["posted", "narrative"]
///
/// [rules.field_types]
/// Date = "date"
/// posted = "date"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct ReconRequest {
    #[serde(default)]
    pub mode: ModeName,
    #[serde(default)]
    pub mapping: FieldMapping,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rules: Option<Rules>,
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl ReconRequest {
    pub fn auto(mapping: FieldMapping) -> Self {
        Self { mode: ModeName::Auto, mapping, rules: None }
    }

    pub fn custom(mapping: FieldMapping, rules: Rules) -> Self {
        Self { mode: ModeName::Custom, mapping, rules: Some(rules) }
    }

    pub fn from_toml(input: &str) -> Result<Self, ReconError> {
        let request: ReconRequest =
            toml::from_str(input).map_err(|e| ReconError::ConfigParse(e.to_string()))?;
        request.validate()?;
        Ok(request)
    }

    pub fn from_json(input: &str) -> Result<Self, ReconError> {
        let request: ReconRequest =
            serde_json::from_str(input).map_err(|e| ReconError::ConfigParse(e.to_string()))?;
        request.validate()?;
        Ok(request)
    }

    /// Parse and validate a request file.
    pub fn from_file(path: &Path) -> Result<Self, ReconError> {
        let request = Self::parse_file(path)?;
        request.validate()?;
        Ok(request)
    }

    /// Parse a request file without validating it, so callers can layer
    /// overrides before [`validate`](Self::validate). `.json` files parse as
    /// JSON, everything else as TOML.
    pub fn parse_file(path: &Path) -> Result<Self, ReconError> {
        let input = std::fs::read_to_string(path)
            .map_err(|e| ReconError::Io(format!("{}: {e}", path.display())))?;
        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        let parsed: Result<Self, String> = if is_json {
            serde_json::from_str(&input).map_err(|e| e.to_string())
        } else {
            toml::from_str(&input).map_err(|e| e.to_string())
        };
        parsed.map_err(|msg| ReconError::ConfigParse(format!("{}: {msg}", path.display())))
    }

    pub fn validate(&self) -> Result<(), ReconError> {
        if self.mode == ModeName::Auto {
            if self.rules.is_some() {
                debug!("rules ignored in auto mode");
            }
            return Ok(());
        }

        let rules = self.rules.as_ref().ok_or_else(|| {
            ReconError::InvalidRequest("custom mode requires rules".into())
        })?;

        if rules.composite_keys_a.is_empty() || rules.composite_keys_b.is_empty() {
            return Err(ReconError::InvalidRequest(
                "custom mode requires compositeKeysA and compositeKeysB".into(),
            ));
        }

        if rules.composite_keys_a.len() != rules.composite_keys_b.len() {
            return Err(ReconError::InvalidRequest(format!(
                "compositeKeysA has {} column(s) but compositeKeysB has {}",
                rules.composite_keys_a.len(),
                rules.composite_keys_b.len()
            )));
        }

        Ok(())
    }

    /// Validated matching mode. Rules are dropped in auto mode.
    pub fn match_mode(&self) -> Result<MatchMode, ReconError> {
        self.validate()?;
        Ok(match (self.mode, &self.rules) {
            (ModeName::Custom, Some(rules)) => MatchMode::Custom(rules.clone()),
            _ => MatchMode::Auto,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::FieldType;

    const CUSTOM_TOML: &str = r#"
mode = "custom"

[mapping.id]
a = "Ref"
b = "reference"

[mapping.amount]
b = "value"

[rules]
amount_tolerance = 5
date_tolerance_days = 1
composite_keys_a = ["Date", "Memo"]
composite_keys_b = ["posted", "narrative"]

[rules.field_types]
Date = "date"
posted = "date"
"#;

    #[test]
    fn parse_custom_toml() {
        let request = ReconRequest::from_toml(CUSTOM_TOML).unwrap();
        assert_eq!(request.mode, ModeName::Custom);
        assert_eq!(request.mapping.id.a.as_deref(), Some("Ref"));
        assert_eq!(request.mapping.amount.a, None);
        assert_eq!(request.mapping.amount.b.as_deref(), Some("value"));

        let MatchMode::Custom(rules) = request.match_mode().unwrap() else {
            panic!("expected custom mode");
        };
        assert_eq!(rules.amount_tolerance, 5.0);
        assert_eq!(rules.field_type("posted"), FieldType::Date);
    }

    #[test]
    fn parse_json_wire_form() {
        let json = r#"{
            "mode": "custom",
            "mapping": { "date": { "a": "Posted" } },
            "rules": {
                "amountTolerance": "abc",
                "dateToleranceDays": 3,
                "compositeKeysA": ["Ref"],
                "compositeKeysB": ["reference"],
                "fieldTypes": {}
            }
        }"#;
        let request = ReconRequest::from_json(json).unwrap();
        let mode = request.match_mode().unwrap();
        assert_eq!(mode.tolerances().amount, 0.0);
        assert_eq!(mode.tolerances().date_days, 3.0);
    }

    #[test]
    fn empty_request_is_auto() {
        let request = ReconRequest::from_toml("").unwrap();
        assert_eq!(request.mode, ModeName::Auto);
        assert_eq!(request.match_mode().unwrap(), MatchMode::Auto);
    }

    #[test]
    fn auto_ignores_rules() {
        let json = r#"{ "mode": "auto", "rules": { "amountTolerance": 100 } }"#;
        let request = ReconRequest::from_json(json).unwrap();
        assert_eq!(request.match_mode().unwrap(), MatchMode::Auto);
    }

    #[test]
    fn reject_custom_without_rules() {
        let err = ReconRequest::from_toml(r#"mode = "custom""#).unwrap_err();
        assert!(err.to_string().contains("custom mode requires rules"));
    }

    #[test]
    fn reject_custom_without_keys() {
        let input = r#"
mode = "custom"
[rules]
amount_tolerance = 1
"#;
        let err = ReconRequest::from_toml(input).unwrap_err();
        assert!(err.to_string().contains("compositeKeysA"));
    }

    #[test]
    fn reject_key_length_mismatch() {
        let input = r#"
mode = "custom"
[rules]
composite_keys_a = ["a", "b"]
composite_keys_b = ["a"]
"#;
        let err = ReconRequest::from_toml(input).unwrap_err();
        assert!(err.to_string().contains("2 column(s)"));
    }

    #[test]
    fn reject_one_sided_keys() {
        let input = r#"{ "mode": "custom", "rules": { "compositeKeysA": ["ref"], "compositeKeysB": [] } }"#;
        let err = ReconRequest::from_json(input).unwrap_err();
        assert!(matches!(err, ReconError::InvalidRequest(_)));
    }

    #[test]
    fn reject_unknown_mode() {
        let err = ReconRequest::from_json(r#"{ "mode": "fuzzy" }"#).unwrap_err();
        assert!(matches!(err, ReconError::ConfigParse(_)));
    }

    #[test]
    fn from_file_picks_format_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let json_path = dir.path().join("request.json");
        std::fs::write(&json_path, r#"{ "mode": "auto" }"#).unwrap();
        assert_eq!(ReconRequest::from_file(&json_path).unwrap().mode, ModeName::Auto);

        let toml_path = dir.path().join("request.recon.toml");
        std::fs::write(&toml_path, CUSTOM_TOML).unwrap();
        assert_eq!(ReconRequest::from_file(&toml_path).unwrap().mode, ModeName::Custom);

        let missing = dir.path().join("nope.toml");
        assert!(matches!(ReconRequest::from_file(&missing), Err(ReconError::Io(_))));
    }

    #[test]
    fn parse_file_defers_validation() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("partial.recon.toml");
        std::fs::write(&path, "mode = \"custom\"\n[rules]\namount_tolerance = 2\n").unwrap();

        let mut request = ReconRequest::parse_file(&path).unwrap();
        assert!(request.validate().is_err());
        assert!(ReconRequest::from_file(&path).is_err());

        let rules = request.rules.as_mut().unwrap();
        rules.composite_keys_a = vec!["Ref".into()];
        rules.composite_keys_b = vec!["reference".into()];
        assert!(request.validate().is_ok());
    }

    #[test]
    fn parse_error_names_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.toml");
        std::fs::write(&path, "mode = ").unwrap();
        let err = ReconRequest::parse_file(&path).unwrap_err();
        assert!(matches!(err, ReconError::ConfigParse(_)));
        assert!(err.to_string().contains("broken.toml"));
    }
}
