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

//! Presentation port: how a request reaches the user.
//!
//! Presenting is fire-and-forget. The user's answer comes back later as a
//! decision event on the event loop, tagged with the session it belongs to.

mod headless;
mod json_lines;
#[cfg(test)]
pub mod recording;

use std::time::Duration;

use crate::error::PopupError;
use crate::request::PopupRequest;
use crate::session::SessionId;

pub use headless::HeadlessPresenter;
pub use json_lines::JsonLinesPresenter;

/// Something that can show and hide popups.
pub trait PresentationPort {
    /// Show `request`. `timeout` is the time left before the mediator answers
    /// on the user's behalf, if any.
    fn present(
        &mut self,
        session: SessionId,
        request: &PopupRequest,
        timeout: Option<Duration>,
    ) -> Result<(), PopupError>;

    /// Hide the popup of a session that was resolved without the user.
    fn dismiss(&mut self, session: SessionId);
}
