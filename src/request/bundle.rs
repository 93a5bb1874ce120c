// Copyright 2026 Daniel Pelikan
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Raw key/value parameter sets delivered by the launcher.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::fields::EVENT_TYPE;

/// An undecoded request: named string parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Bundle {
    fields: BTreeMap<String, String>,
}

impl Bundle {
    /// Create an empty bundle.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a parameter.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(key.into(), value.into());
    }

    /// Builder-style [`Bundle::insert`].
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    /// Look up a parameter. Empty values are treated as absent.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.trim().is_empty())
    }

    /// The `event-type` token, if any.
    pub fn event_type(&self) -> Option<&str> {
        self.get(EVENT_TYPE)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Consume the bundle, returning the raw map.
    pub fn into_fields(self) -> BTreeMap<String, String> {
        self.fields
    }
}

impl FromIterator<(String, String)> for Bundle {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

/// Parse a single `key=value` argument.
///
/// The key must be non-empty; the value may contain further `=` characters.
pub fn parse_key_value(arg: &str) -> Result<(String, String), String> {
    let (key, value) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got `{}`", arg))?;

    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty key in `{}`", arg));
    }

    Ok((key.to_string(), value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_key_value() {
        assert_eq!(
            parse_key_value("device-name=Pixel 7"),
            Ok(("device-name".to_string(), "Pixel 7".to_string()))
        );
        assert_eq!(
            parse_key_value("title=a=b"),
            Ok(("title".to_string(), "a=b".to_string()))
        );
        assert!(parse_key_value("no-separator").is_err());
        assert!(parse_key_value("=value").is_err());
    }

    #[test]
    fn test_empty_values_read_as_absent() {
        let bundle = Bundle::new()
            .with("event-type", "pin-request")
            .with("device-name", "   ");

        assert_eq!(bundle.event_type(), Some("pin-request"));
        assert_eq!(bundle.get("device-name"), None);
        assert_eq!(bundle.len(), 2);
    }

    #[test]
    fn test_deserialize_from_json_object() -> anyhow::Result<()> {
        let bundle: Bundle = serde_json::from_str(
            r#"{"event-type":"authorize-request","agent-path":"/agent/1"}"#,
        )?;

        assert_eq!(bundle.event_type(), Some("authorize-request"));
        assert_eq!(bundle.get("agent-path"), Some("/agent/1"));
        Ok(())
    }
}
