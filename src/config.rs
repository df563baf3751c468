// ⚙️ Form Configuration - Settings as data
// Loaded from JSON; every field has a default so `{}` is a valid config.

use crate::rows::MAX_FIRST_LOCAL_ID;
use crate::validation::OverlapPolicy;
use anyhow::{bail, Context as AnyhowContext, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormConfig {
    /// Text mirrored into a lab row's file label when no file is chosen
    pub no_file_placeholder: String,

    /// Extensions the lab file input accepts (empty = anything)
    pub accepted_file_extensions: Vec<String>,

    /// Whether overlapping (not just identical) schedule slots are rejected
    pub overlap_policy: OverlapPolicy,

    /// First LocalId handed out in a form session (at most `MAX_FIRST_LOCAL_ID`)
    pub first_local_id: u64,
}

impl Default for FormConfig {
    fn default() -> Self {
        FormConfig {
            no_file_placeholder: "No file selected".to_string(),
            accepted_file_extensions: vec![".pdf".to_string()],
            overlap_policy: OverlapPolicy::Allow,
            first_local_id: 1,
        }
    }
}

impl FormConfig {
    /// Load config from JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;

        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let config: FormConfig =
            serde_json::from_str(content).context("Failed to parse config JSON")?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the form session cannot honor
    pub fn validate(&self) -> Result<()> {
        if self.first_local_id > MAX_FIRST_LOCAL_ID {
            bail!(
                "first_local_id {} exceeds the maximum of {}",
                self.first_local_id,
                MAX_FIRST_LOCAL_ID
            );
        }
        Ok(())
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_json_uses_defaults() {
        let config = FormConfig::from_json("{}").unwrap();
        assert_eq!(config, FormConfig::default());
    }

    #[test]
    fn test_partial_override() {
        let config = FormConfig::from_json(
            r#"{
                "overlap_policy": "reject",
                "no_file_placeholder": "Ningún archivo seleccionado"
            }"#,
        )
        .unwrap();

        assert_eq!(config.overlap_policy, OverlapPolicy::Reject);
        assert_eq!(config.no_file_placeholder, "Ningún archivo seleccionado");
        assert_eq!(config.accepted_file_extensions, vec![".pdf".to_string()]);
    }

    #[test]
    fn test_invalid_json_is_error() {
        assert!(FormConfig::from_json("{not json").is_err());
        assert!(FormConfig::from_file("/nonexistent/config.json").is_err());
    }

    #[test]
    fn test_first_local_id_out_of_range() {
        let err = FormConfig::from_json(r#"{"first_local_id": 18446744073709551615}"#).unwrap_err();
        assert!(err.to_string().contains("first_local_id"));

        let config = FormConfig::from_json(r#"{"first_local_id": 500}"#).unwrap();
        assert_eq!(config.first_local_id, 500);
    }
}
