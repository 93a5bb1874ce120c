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

//! In-memory presenter for tests.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use super::PresentationPort;
use crate::error::PopupError;
use crate::request::{PopupRequest, RequestKind};
use crate::session::SessionId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Shown {
    Present {
        session: SessionId,
        kind: RequestKind,
        timeout: Option<Duration>,
    },
    Dismiss(SessionId),
}

/// Records presenter calls; optionally refuses to present.
#[derive(Clone, Default)]
pub struct RecordingPresenter {
    shown: Rc<RefCell<Vec<Shown>>>,
    fail: bool,
}

impl RecordingPresenter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn shown(&self) -> Vec<Shown> {
        self.shown.borrow().clone()
    }
}

impl PresentationPort for RecordingPresenter {
    fn present(
        &mut self,
        session: SessionId,
        request: &PopupRequest,
        timeout: Option<Duration>,
    ) -> Result<(), PopupError> {
        if self.fail {
            return Err(PopupError::Presentation("no display".to_string()));
        }
        self.shown.borrow_mut().push(Shown::Present {
            session,
            kind: request.kind(),
            timeout,
        });
        Ok(())
    }

    fn dismiss(&mut self, session: SessionId) {
        self.shown.borrow_mut().push(Shown::Dismiss(session));
    }
}
