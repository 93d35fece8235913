//! Host configuration access and normalization.
//!
//! The host hands the adapter a flat configuration map. Gemini expects a
//! typed [`GenerationConfig`](crate::wire::GenerationConfig), so the map is
//! normalized once on [`set_configuration`](crate::GeminiProvider::set_configuration)
//! and converted to the wire shape per chat call.

use std::collections::HashMap;

use serde_json::{Map, Value};

use crate::wire::GenerationConfig;
use crate::{Error, Result};

/// Host configuration store the adapter reads its settings from.
pub trait SettingsStore: Send + Sync {
    /// Store name for logging.
    fn name(&self) -> &str;

    /// Fetch a setting value, `None` when unset.
    fn get(&self, name: &str) -> Option<String>;
}

/// In-memory settings, for hosts that wire configuration directly and for
/// tests.
#[derive(Debug, Clone, Default)]
pub struct StaticSettings {
    values: HashMap<String, String>,
}

impl StaticSettings {
    pub fn new<K, V>(values: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            values: values
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl SettingsStore for StaticSettings {
    fn name(&self) -> &str {
        "static"
    }

    fn get(&self, name: &str) -> Option<String> {
        self.values.get(name).cloned()
    }
}

/// Generation options normalized for Gemini.
///
/// Invariants held after construction:
/// - `stopSequences` is always present as an ordered list of strings; a
///   comma-delimited host string is split, an absent key becomes `[]`.
/// - `responseSchema` and `responseMimeType` are stripped. The generic host
///   contract accepts them but this provider does not support them yet, and
///   forwarding them unfiltered would corrupt the request.
#[derive(Debug, Clone, Default)]
pub struct GenerationOptions {
    options: Map<String, Value>,
}

impl GenerationOptions {
    /// Normalize a raw host configuration map.
    pub fn from_map(mut options: Map<String, Value>) -> Self {
        let stop_sequences = match options.remove("stopSequences") {
            Some(Value::String(raw)) => raw
                .split(',')
                .map(|s| Value::String(s.to_owned()))
                .collect(),
            Some(Value::Array(list)) => list,
            Some(_) | None => Vec::new(),
        };
        options.insert("stopSequences".into(), Value::Array(stop_sequences));

        options.remove("responseSchema");
        options.remove("responseMimeType");

        Self { options }
    }

    /// The normalized map, as stored.
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.options
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.options.get(name)
    }

    /// Build the wire generation config from the normalized map.
    ///
    /// Host values may arrive as native numbers or as flat strings; both are
    /// accepted. A value that fits neither is a configuration error naming
    /// the offending option.
    pub fn to_generation_config(&self) -> Result<GenerationConfig> {
        Ok(GenerationConfig {
            temperature: self.float_option("temperature")?,
            top_p: self.float_option("topP")?,
            top_k: self.int_option("topK")?,
            candidate_count: self.int_option("candidateCount")?,
            max_output_tokens: self.int_option("maxOutputTokens")?,
            stop_sequences: self.stop_sequences(),
        })
    }

    fn stop_sequences(&self) -> Vec<String> {
        match self.options.get("stopSequences") {
            Some(Value::Array(list)) => list
                .iter()
                .filter_map(|v| v.as_str().map(str::to_owned))
                .collect(),
            _ => Vec::new(),
        }
    }

    fn float_option(&self, name: &str) -> Result<Option<f64>> {
        match self.options.get(name) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Number(n)) => Ok(n.as_f64()),
            Some(Value::String(s)) => s
                .parse::<f64>()
                .map(Some)
                .map_err(|_| Error::config(format!("option {name} is not a number: {s:?}"))),
            Some(other) => Err(Error::config(format!(
                "option {name} is not a number: {other}"
            ))),
        }
    }

    fn int_option(&self, name: &str) -> Result<Option<u32>> {
        match self.options.get(name) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Number(n)) => n
                .as_u64()
                .and_then(|v| u32::try_from(v).ok())
                .map(Some)
                .ok_or_else(|| Error::config(format!("option {name} is out of range: {n}"))),
            Some(Value::String(s)) => s
                .parse::<u32>()
                .map(Some)
                .map_err(|_| Error::config(format!("option {name} is not an integer: {s:?}"))),
            Some(other) => Err(Error::config(format!(
                "option {name} is not an integer: {other}"
            ))),
        }
    }
}
