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

//! Presenter for running without a UI.

use std::time::Duration;
use tracing::info;

use super::PresentationPort;
use crate::error::PopupError;
use crate::request::PopupRequest;
use crate::session::SessionId;

/// Logs requests instead of showing them.
///
/// Nobody answers, so every session ends by deadline, preemption or
/// termination.
#[derive(Debug, Default)]
pub struct HeadlessPresenter;

impl HeadlessPresenter {
    pub fn new() -> Self {
        Self
    }
}

impl PresentationPort for HeadlessPresenter {
    fn present(
        &mut self,
        session: SessionId,
        request: &PopupRequest,
        timeout: Option<Duration>,
    ) -> Result<(), PopupError> {
        let subject = request
            .device_name()
            .or_else(|| request.title())
            .or_else(|| request.file())
            .unwrap_or("-");

        match request.passkey() {
            Some(passkey) => info!(
                "Session {}: {} for {}, passkey {} (timeout {:?})",
                session,
                request.kind(),
                subject,
                passkey,
                timeout
            ),
            None => info!(
                "Session {}: {} for {} (timeout {:?})",
                session,
                request.kind(),
                subject,
                timeout
            ),
        }
        Ok(())
    }

    fn dismiss(&mut self, session: SessionId) {
        info!("Session {} dismissed", session);
    }
}
