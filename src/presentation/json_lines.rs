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

//! JSON-lines presenter for an external UI process.

use serde::Serialize;
use std::collections::BTreeMap;
use std::io::Write;
use std::time::Duration;
use tracing::{debug, warn};

use super::PresentationPort;
use crate::error::PopupError;
use crate::reply::contract;
use crate::request::{PopupRequest, RequestKind};
use crate::session::SessionId;

/// One line written to the host.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
enum HostCommand<'a> {
    Present {
        session: SessionId,
        kind: RequestKind,
        fields: &'a BTreeMap<String, String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        timeout_secs: Option<u64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        visible_secs: Option<u64>,
        accept_always: bool,
    },
    Dismiss {
        session: SessionId,
    },
}

/// Writes present/dismiss commands as one JSON object per line.
pub struct JsonLinesPresenter<W: Write> {
    out: W,
}

impl<W: Write> JsonLinesPresenter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn write(&mut self, command: &HostCommand<'_>) -> Result<(), PopupError> {
        let line =
            serde_json::to_string(command).map_err(|e| PopupError::Presentation(e.to_string()))?;
        writeln!(self.out, "{}", line)
            .and_then(|_| self.out.flush())
            .map_err(|e| PopupError::Presentation(e.to_string()))?;
        debug!("Host <- {}", line);
        Ok(())
    }
}

impl<W: Write> PresentationPort for JsonLinesPresenter<W> {
    fn present(
        &mut self,
        session: SessionId,
        request: &PopupRequest,
        timeout: Option<Duration>,
    ) -> Result<(), PopupError> {
        self.write(&HostCommand::Present {
            session,
            kind: request.kind(),
            fields: request.fields(),
            timeout_secs: timeout.map(|t| t.as_secs()),
            visible_secs: request.timeout_override().map(|t| t.as_secs()),
            accept_always: contract(request.kind()).accept_always,
        })
    }

    fn dismiss(&mut self, session: SessionId) {
        if let Err(e) = self.write(&HostCommand::Dismiss { session }) {
            warn!("Failed to dismiss session {}: {}", session, e);
        }
    }
}
