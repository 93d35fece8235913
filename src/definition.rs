//! Packaged API-capability definition.
//!
//! The host renders provider settings forms from a static definition
//! document shipped with the provider. The document lives at
//! `definitions/api_defaults.yml` and is compiled into the library.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;

use crate::{Error, Result};

const API_DEFAULTS: &str = include_str!("../definitions/api_defaults.yml");

/// Capability definition for every supported operation type.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiDefinition {
    pub chat: OperationDefinition,
}

/// Definition of one operation's configurable settings.
#[derive(Debug, Clone, Deserialize)]
pub struct OperationDefinition {
    #[serde(default)]
    pub configurations: BTreeMap<String, SettingDefinition>,
}

/// One configurable generation setting.
#[derive(Debug, Clone, Deserialize)]
pub struct SettingDefinition {
    pub label: String,
    #[serde(rename = "type")]
    pub value_type: String,
    #[serde(default)]
    pub default: Option<Value>,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub constraints: Option<Constraints>,
}

/// Value bounds for a setting.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Constraints {
    #[serde(default)]
    pub min: Option<f64>,
    #[serde(default)]
    pub max: Option<f64>,
    #[serde(default)]
    pub step: Option<f64>,
}

/// Parse the packaged definition document.
pub fn api_defaults() -> Result<ApiDefinition> {
    serde_yaml_bw::from_str(API_DEFAULTS)
        .map_err(|e| Error::config(format!("invalid api_defaults.yml: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_packaged_definition_parses() {
        let definition = api_defaults().unwrap();
        assert!(definition.chat.configurations.contains_key("temperature"));
        assert!(definition.chat.configurations.contains_key("maxOutputTokens"));
    }

    #[test]
    fn test_temperature_bounds() {
        let definition = api_defaults().unwrap();
        let temperature = &definition.chat.configurations["temperature"];
        assert_eq!(temperature.value_type, "float");
        let constraints = temperature.constraints.as_ref().unwrap();
        assert_eq!(constraints.min, Some(0.0));
        assert_eq!(constraints.max, Some(2.0));
    }
}
