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

//! Decoding of inbound bundles into typed popup requests.

mod bundle;
mod kind;

pub use bundle::{parse_key_value, Bundle};
pub use kind::RequestKind;

use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::warn;

use crate::error::PopupError;

/// Bundle keys understood by the decoder.
pub mod fields {
    pub const EVENT_TYPE: &str = "event-type";
    pub const DEVICE_NAME: &str = "device-name";
    pub const PASSKEY: &str = "passkey";
    pub const AGENT_PATH: &str = "agent-path";
    pub const FILE: &str = "file";
    pub const TITLE: &str = "title";
    pub const TYPE: &str = "type";
    pub const TIMEOUT: &str = "timeout";
}

/// Longest title the daemon may send for app-confirm and information popups.
pub const TITLE_MAX_LEN: usize = 255;

/// Button arrangement requested for app-confirm and information popups.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonLayout {
    TwoButtons,
    OneButton,
    NoButtons,
}

impl ButtonLayout {
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        if value.eq_ignore_ascii_case("twobtn") {
            Some(ButtonLayout::TwoButtons)
        } else if value.eq_ignore_ascii_case("onebtn") {
            Some(ButtonLayout::OneButton)
        } else if value.eq_ignore_ascii_case("none") {
            Some(ButtonLayout::NoButtons)
        } else {
            None
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ButtonLayout::TwoButtons => "twobtn",
            ButtonLayout::OneButton => "onebtn",
            ButtonLayout::NoButtons => "none",
        }
    }
}

impl Serialize for ButtonLayout {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// A validated request, immutable once decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PopupRequest {
    kind: RequestKind,
    fields: BTreeMap<String, String>,
}

impl PopupRequest {
    /// Classify and validate a bundle.
    ///
    /// Fails with [`PopupError::UnknownKind`] when `event-type` is absent or
    /// unrecognised; use [`PopupRequest::decode`] when the kind is already known.
    pub fn from_bundle(bundle: &Bundle) -> Result<Self, PopupError> {
        let token = bundle
            .event_type()
            .ok_or_else(|| PopupError::UnknownKind(String::new()))?;
        let kind = RequestKind::from_token(token)?;
        Self::decode(kind, bundle)
    }

    /// Validate a bundle against the field requirements of `kind`.
    pub fn decode(kind: RequestKind, bundle: &Bundle) -> Result<Self, PopupError> {
        for &field in kind.required_fields() {
            if bundle.get(field).is_none() {
                return Err(PopupError::MissingField { kind, field });
            }
        }

        if kind.required_fields().contains(&fields::TYPE) {
            if let Some(value) = bundle.get(fields::TYPE) {
                if ButtonLayout::parse(value).is_none() {
                    return Err(PopupError::InvalidField {
                        kind,
                        field: fields::TYPE,
                        reason: format!("`{}` is not one of twobtn, onebtn, none", value),
                    });
                }
            }
        }

        if let Some(title) = bundle.get(fields::TITLE) {
            if title.len() > TITLE_MAX_LEN {
                return Err(PopupError::InvalidField {
                    kind,
                    field: fields::TITLE,
                    reason: format!("{} bytes exceeds {}", title.len(), TITLE_MAX_LEN),
                });
            }
        }

        // Only a presentation hint; a bad value is dropped, not fatal.
        let bad_hint = bundle
            .get(fields::TIMEOUT)
            .filter(|t| t.trim().parse::<u64>().is_err());
        if let Some(timeout) = bad_hint {
            warn!("{}: ignoring `timeout` hint `{}`", kind, timeout);
        }

        let fields = bundle
            .clone()
            .into_fields()
            .into_iter()
            .filter(|(key, value)| key != fields::EVENT_TYPE && !value.trim().is_empty())
            .filter(|(key, _)| !(bad_hint.is_some() && key == fields::TIMEOUT))
            .collect();

        Ok(Self { kind, fields })
    }

    pub fn kind(&self) -> RequestKind {
        self.kind
    }

    /// All decoded parameters except `event-type`.
    pub fn fields(&self) -> &BTreeMap<String, String> {
        &self.fields
    }

    pub fn field(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    pub fn device_name(&self) -> Option<&str> {
        self.field(fields::DEVICE_NAME)
    }

    pub fn passkey(&self) -> Option<&str> {
        self.field(fields::PASSKEY)
    }

    pub fn agent_path(&self) -> Option<&str> {
        self.field(fields::AGENT_PATH)
    }

    pub fn file(&self) -> Option<&str> {
        self.field(fields::FILE)
    }

    pub fn title(&self) -> Option<&str> {
        self.field(fields::TITLE)
    }

    pub fn button_layout(&self) -> Option<ButtonLayout> {
        self.field(fields::TYPE).and_then(ButtonLayout::parse)
    }

    /// Visibility hint from the `timeout` key, forwarded to the presenter.
    pub fn timeout_override(&self) -> Option<Duration> {
        self.field(fields::TIMEOUT)
            .and_then(|t| t.trim().parse::<u64>().ok())
            .map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    fn pin_bundle() -> Bundle {
        Bundle::new()
            .with("event-type", "pin-request")
            .with("device-name", "Pixel 7")
            .with("agent-path", "/agent/1")
    }

    #[test]
    fn test_decode_pin_request() -> Result<()> {
        let request = PopupRequest::from_bundle(&pin_bundle())?;

        assert_eq!(request.kind(), RequestKind::PinRequest);
        assert_eq!(request.device_name(), Some("Pixel 7"));
        assert_eq!(request.agent_path(), Some("/agent/1"));
        assert!(!request.fields().contains_key("event-type"));
        Ok(())
    }

    #[test]
    fn test_missing_event_type_is_unknown() {
        let bundle = Bundle::new().with("device-name", "Pixel 7");
        assert!(matches!(
            PopupRequest::from_bundle(&bundle),
            Err(PopupError::UnknownKind(_))
        ));
    }

    #[test]
    fn test_missing_required_field() {
        let bundle = Bundle::new()
            .with("event-type", "passkey-confirm-request")
            .with("device-name", "Pixel 7")
            .with("agent-path", "/agent/1");

        match PopupRequest::from_bundle(&bundle) {
            Err(PopupError::MissingField { kind, field }) => {
                assert_eq!(kind, RequestKind::PasskeyConfirm);
                assert_eq!(field, "passkey");
            }
            other => panic!("expected MissingField, got {:?}", other),
        }
    }

    #[test]
    fn test_app_confirm_layout_validation() -> Result<()> {
        let valid = Bundle::new()
            .with("event-type", "app-confirm-request")
            .with("title", "Enable Bluetooth?")
            .with("type", "OneBtn");
        let request = PopupRequest::from_bundle(&valid)?;
        assert_eq!(request.button_layout(), Some(ButtonLayout::OneButton));

        let invalid = valid.clone().with("type", "threebtn");
        let err = PopupRequest::from_bundle(&invalid).unwrap_err();
        assert!(err.is_malformed());
        assert!(matches!(
            err,
            PopupError::InvalidField { field: "type", .. }
        ));
        Ok(())
    }

    #[test]
    fn test_overlong_title_is_invalid() {
        let bundle = Bundle::new()
            .with("event-type", "bt-information")
            .with("title", "x".repeat(TITLE_MAX_LEN + 1))
            .with("type", "none");

        assert!(matches!(
            PopupRequest::from_bundle(&bundle),
            Err(PopupError::InvalidField { field: "title", .. })
        ));
    }

    #[test]
    fn test_timeout_override() -> Result<()> {
        let request = PopupRequest::from_bundle(&pin_bundle().with("timeout", "120"))?;
        assert_eq!(request.timeout_override(), Some(Duration::from_secs(120)));

        Ok(())
    }

    #[test]
    fn test_bad_timeout_hint_is_dropped() -> Result<()> {
        let request = PopupRequest::from_bundle(&pin_bundle().with("timeout", "soon"))?;
        assert_eq!(request.kind(), RequestKind::PinRequest);
        assert_eq!(request.timeout_override(), None);
        assert_eq!(request.field("timeout"), None);
        assert_eq!(request.device_name(), Some("Pixel 7"));
        Ok(())
    }

    #[test]
    fn test_toast_kinds_need_no_fields() -> Result<()> {
        let bundle = Bundle::new().with("event-type", "handsfree-connect-request");
        let request = PopupRequest::from_bundle(&bundle)?;
        assert_eq!(request.kind(), RequestKind::HandsfreeConnect);
        assert!(request.fields().is_empty());
        Ok(())
    }
}
