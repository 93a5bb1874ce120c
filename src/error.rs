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

//! Error taxonomy for request handling.

use thiserror::Error;

use crate::request::RequestKind;

/// Errors raised while classifying, binding or answering a request.
///
/// Everything except [`PopupError::BusConnectFailure`] is resolved locally by
/// the session controller; only the bus connection is fatal.
#[derive(Debug, Error)]
pub enum PopupError {
    /// The `event-type` token is not one of the known request kinds.
    #[error("unknown event type `{0}`")]
    UnknownKind(String),

    /// A field the request kind depends on is absent or empty.
    #[error("{kind} is missing required field `{field}`")]
    MissingField {
        kind: RequestKind,
        field: &'static str,
    },

    /// A field is present but its value cannot be used.
    #[error("{kind} has invalid `{field}`: {reason}")]
    InvalidField {
        kind: RequestKind,
        field: &'static str,
        reason: String,
    },

    /// No proxy could be built for the reply target.
    #[error("cannot bind endpoint {target}: {reason}")]
    EndpointBindFailure { target: String, reason: String },

    /// The message bus is unreachable.
    #[error("cannot connect to the {bus} bus: {reason}")]
    BusConnectFailure { bus: String, reason: String },

    /// A reply could not be handed to the bus.
    #[error("failed to deliver {0}")]
    Delivery(String),

    /// The host UI could not show the request.
    #[error("presentation failed: {0}")]
    Presentation(String),
}

impl PopupError {
    /// Whether this error means the input bundle itself was malformed.
    pub fn is_malformed(&self) -> bool {
        matches!(
            self,
            PopupError::MissingField { .. } | PopupError::InvalidField { .. }
        )
    }
}
