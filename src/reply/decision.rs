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

//! User decisions and their wire values.

use serde::{Deserialize, Serialize};

/// What the user (or the timeout policy) decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Decision {
    Accept,
    AcceptAlways,
    Reject,
    Cancel,
}

impl Decision {
    pub fn is_accept(self) -> bool {
        matches!(self, Decision::Accept | Decision::AcceptAlways)
    }
}

/// A decision plus the text the user entered, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserDecision {
    pub decision: Decision,
    pub text: Option<String>,
}

impl UserDecision {
    pub fn new(decision: Decision) -> Self {
        Self {
            decision,
            text: None,
        }
    }

    pub fn accept() -> Self {
        Self::new(Decision::Accept)
    }

    /// Accept carrying an entered PIN or passkey.
    pub fn accept_with(text: impl Into<String>) -> Self {
        Self {
            decision: Decision::Accept,
            text: Some(text.into()),
        }
    }

    pub fn reject() -> Self {
        Self::new(Decision::Reject)
    }

    pub fn cancel() -> Self {
        Self::new(Decision::Cancel)
    }
}

impl From<Decision> for UserDecision {
    fn from(decision: Decision) -> Self {
        Self::new(decision)
    }
}

/// Reply codes understood by the Bluetooth agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum AgentReply {
    Accept = 0,
    Reject = 1,
    Cancel = 2,
    AcceptAlways = 4,
}

impl AgentReply {
    pub fn code(self) -> u32 {
        self as u32
    }
}

/// Code carried by the `Response` broadcast.
pub fn response_code(decision: Decision) -> i32 {
    if decision.is_accept() {
        0
    } else {
        1
    }
}
