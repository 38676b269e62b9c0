//! Pipeline payload and audit record types.
//!
//! A pipeline is plain data: an ordered list of `{action, params}` objects
//! decoded from JSON. Nothing in it is executable.

use anyhow::{Context as _, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use super::params::Params;

/// Current pipeline document version
pub const SPEC_VERSION: &str = "0.1";

/// One declarative cleaning step.
///
/// `action` stays a raw string so that an unknown identifier surfaces as an
/// `UnknownAction` receipt at dispatch time instead of a decoding failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    pub action: String,

    #[serde(default)]
    pub params: Params,
}

impl Step {
    pub fn new(action: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            params: Params::new(),
        }
    }

    /// Builder-style parameter insertion.
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }
}

/// Audit record of one executed step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Receipt {
    /// Zero-based position of the step in the submitted list
    pub step_index: usize,
    pub action: String,
    pub success: bool,
    pub message: String,
    pub rows_before: usize,
    pub rows_after: usize,
    pub columns_before: usize,
    pub columns_after: usize,
    /// Error tag (`unknown_action`, `invalid_params`, `transform_runtime_error`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<String>,
    pub duration_ms: u64,
}

impl Receipt {
    pub fn rows_removed(&self) -> usize {
        self.rows_before.saturating_sub(self.rows_after)
    }
}

/// A named, versioned pipeline document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineSpec {
    #[serde(default = "default_version")]
    pub version: String,

    #[serde(default)]
    pub name: String,

    pub steps: Vec<Step>,
}

impl PipelineSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            version: SPEC_VERSION.to_owned(),
            name: name.into(),
            steps: Vec::new(),
        }
    }

    /// Load a pipeline from a JSON file.
    ///
    /// Accepts either a full document or a bare `[{action, params}]` array.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read pipeline file {}", path.display()))?;
        Self::from_json(&content)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let value: serde_json::Value =
            serde_json::from_str(json).context("Failed to parse pipeline JSON")?;

        if value.is_array() {
            let steps: Vec<Step> =
                serde_json::from_value(value).context("Failed to decode step list")?;
            return Ok(Self {
                steps,
                ..Self::new("")
            });
        }

        serde_json::from_value(value).context("Failed to decode pipeline document")
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize pipeline")
    }
}

fn default_version() -> String {
    SPEC_VERSION.to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_bare_step_array() -> Result<()> {
        let spec = PipelineSpec::from_json(
            r#"[
                {"action": "general_drop_duplicates"},
                {"action": "numeric_impute_by_method", "params": {"method": "mean"}}
            ]"#,
        )?;

        assert_eq!(spec.version, SPEC_VERSION);
        assert_eq!(spec.steps.len(), 2);
        assert!(spec.steps[0].params.is_empty());
        assert_eq!(spec.steps[1].params.get("method"), Some(&json!("mean")));
        Ok(())
    }

    #[test]
    fn test_document_keeps_unknown_actions() -> Result<()> {
        let spec = PipelineSpec::from_json(
            r#"{"name": "tidy", "steps": [{"action": "launch_rockets", "params": {}}]}"#,
        )?;
        assert_eq!(spec.name, "tidy");
        assert_eq!(spec.steps[0].action, "launch_rockets");
        Ok(())
    }

    #[test]
    fn test_document_serialization() -> Result<()> {
        let mut spec = PipelineSpec::new("customers");
        spec.steps.push(
            Step::new("text_change_case")
                .with_param("columns", json!(["name"]))
                .with_param("case", "lower"),
        );

        let json = spec.to_json()?;
        assert!(json.contains("\"action\": \"text_change_case\""));
        assert_eq!(PipelineSpec::from_json(&json)?, spec);
        Ok(())
    }

    #[test]
    fn test_rejects_non_pipeline_json() {
        assert!(PipelineSpec::from_json(r#"{"steps": 3}"#).is_err());
        assert!(PipelineSpec::from_json("not json").is_err());
    }
}
