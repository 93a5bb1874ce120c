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

//! Request kinds and their `event-type` tokens.

use serde::{Serialize, Serializer};
use std::fmt;

use crate::error::PopupError;

/// The closed set of requests the daemon can raise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestKind {
    PinRequest,
    PasskeyRequest,
    PasskeyConfirm,
    PasskeyDisplay,
    PasskeyAutoAccepted,
    KeyboardPasskeyRequest,
    AuthorizeRequest,
    AppConfirm,
    PushAuthorize,
    ConfirmOverwrite,
    ExchangeRequest,
    PhonebookRequest,
    MessageRequest,
    BtInformation,
    UnableToPair,
    HandsfreeConnect,
    HandsfreeDisconnect,
    MusicAutoConnect,
    SystemReset,
    PairingRetry,
    LegacyPairFailed,
    Terminate,
}

impl RequestKind {
    /// Every kind, in table order.
    pub const ALL: [RequestKind; 22] = [
        RequestKind::PinRequest,
        RequestKind::PasskeyRequest,
        RequestKind::PasskeyConfirm,
        RequestKind::PasskeyDisplay,
        RequestKind::PasskeyAutoAccepted,
        RequestKind::KeyboardPasskeyRequest,
        RequestKind::AuthorizeRequest,
        RequestKind::AppConfirm,
        RequestKind::PushAuthorize,
        RequestKind::ConfirmOverwrite,
        RequestKind::ExchangeRequest,
        RequestKind::PhonebookRequest,
        RequestKind::MessageRequest,
        RequestKind::BtInformation,
        RequestKind::UnableToPair,
        RequestKind::HandsfreeConnect,
        RequestKind::HandsfreeDisconnect,
        RequestKind::MusicAutoConnect,
        RequestKind::SystemReset,
        RequestKind::PairingRetry,
        RequestKind::LegacyPairFailed,
        RequestKind::Terminate,
    ];

    /// The `event-type` token the daemon uses for this kind.
    pub fn token(self) -> &'static str {
        match self {
            RequestKind::PinRequest => "pin-request",
            RequestKind::PasskeyRequest => "passkey-request",
            RequestKind::PasskeyConfirm => "passkey-confirm-request",
            RequestKind::PasskeyDisplay => "passkey-display-request",
            RequestKind::PasskeyAutoAccepted => "passkey-auto-accepted",
            RequestKind::KeyboardPasskeyRequest => "keyboard-passkey-request",
            RequestKind::AuthorizeRequest => "authorize-request",
            RequestKind::AppConfirm => "app-confirm-request",
            RequestKind::PushAuthorize => "push-authorize-request",
            RequestKind::ConfirmOverwrite => "confirm-overwrite-request",
            RequestKind::ExchangeRequest => "exchange-request",
            RequestKind::PhonebookRequest => "phonebook-request",
            RequestKind::MessageRequest => "message-request",
            RequestKind::BtInformation => "bt-information",
            RequestKind::UnableToPair => "unable-to-pairing",
            RequestKind::HandsfreeConnect => "handsfree-connect-request",
            RequestKind::HandsfreeDisconnect => "handsfree-disconnect-request",
            RequestKind::MusicAutoConnect => "music-auto-connect-request",
            RequestKind::SystemReset => "system-reset-request",
            RequestKind::PairingRetry => "pairing-retry-request",
            RequestKind::LegacyPairFailed => "remote-legacy-pair-failed",
            RequestKind::Terminate => "terminate",
        }
    }

    /// Classify an `event-type` token, ignoring ASCII case.
    pub fn from_token(token: &str) -> Result<Self, PopupError> {
        let token = token.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|kind| kind.token().eq_ignore_ascii_case(token))
            .ok_or_else(|| PopupError::UnknownKind(token.to_string()))
    }

    /// Fields that must be present (and non-empty) for this kind.
    pub fn required_fields(self) -> &'static [&'static str] {
        use super::fields::*;

        match self {
            RequestKind::PinRequest | RequestKind::PasskeyRequest => &[DEVICE_NAME, AGENT_PATH],
            RequestKind::PasskeyConfirm
            | RequestKind::PasskeyDisplay
            | RequestKind::PasskeyAutoAccepted
            | RequestKind::KeyboardPasskeyRequest => &[DEVICE_NAME, PASSKEY],
            RequestKind::AuthorizeRequest
            | RequestKind::PhonebookRequest
            | RequestKind::MessageRequest
            | RequestKind::SystemReset => &[DEVICE_NAME, AGENT_PATH],
            RequestKind::AppConfirm | RequestKind::BtInformation => &[TITLE, TYPE],
            RequestKind::PushAuthorize => &[DEVICE_NAME, FILE],
            RequestKind::ExchangeRequest => &[DEVICE_NAME],
            RequestKind::ConfirmOverwrite => &[FILE],
            RequestKind::UnableToPair
            | RequestKind::HandsfreeConnect
            | RequestKind::HandsfreeDisconnect
            | RequestKind::MusicAutoConnect
            | RequestKind::PairingRetry
            | RequestKind::LegacyPairFailed
            | RequestKind::Terminate => &[],
        }
    }
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

impl Serialize for RequestKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.token())
    }
}
