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

//! Single-session discipline: at most one request is awaiting an answer.

mod controller;

use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::time::Instant;

use crate::bus::Proxy;
use crate::reply::ReplyContract;
use crate::request::RequestKind;

pub use controller::SessionController;

/// Identifies one request from entry to resolution.
///
/// Decisions carry the id so that a late answer for a preempted popup cannot
/// resolve its successor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Observable controller state.
///
/// Resolution takes the session and emits its reply in one step, so the
/// controller goes straight from awaiting back to idle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Awaiting,
}

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    User,
    Timeout,
    Preempted,
    Terminated,
    Shutdown,
    PresentationFailed,
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Resolution::User => "user decision",
            Resolution::Timeout => "timeout",
            Resolution::Preempted => "preemption",
            Resolution::Terminated => "terminate request",
            Resolution::Shutdown => "shutdown",
            Resolution::PresentationFailed => "presentation failure",
        };
        f.write_str(reason)
    }
}

/// The one request currently waiting for an answer.
///
/// Everything a reply needs lives here and is dropped with it: the bound
/// endpoint, the deadline and the trusted flag.
#[derive(Debug)]
struct Session {
    id: SessionId,
    kind: RequestKind,
    contract: &'static ReplyContract,
    endpoint: Option<Proxy>,
    deadline: Option<Instant>,
    trusted: bool,
    /// False for malformed requests answered by the fallback timer.
    presented: bool,
}
