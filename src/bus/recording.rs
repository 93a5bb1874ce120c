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

//! In-memory sink for tests.

use std::cell::RefCell;
use std::rc::Rc;

use super::{MessageSink, Outgoing};
use crate::error::PopupError;

/// Records every emitted message; optionally fails delivery.
#[derive(Clone, Default)]
pub struct RecordingSink {
    sent: Rc<RefCell<Vec<Outgoing>>>,
    /// Number of sent messages covered by the last flush.
    flushed: Rc<RefCell<usize>>,
    fail: bool,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// A sink whose every delivery fails (after recording the attempt).
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn sent(&self) -> Vec<Outgoing> {
        self.sent.borrow().clone()
    }

    /// How many emitted messages were covered by a flush.
    pub fn flushed(&self) -> usize {
        *self.flushed.borrow()
    }

    pub fn clear(&self) {
        self.sent.borrow_mut().clear();
        *self.flushed.borrow_mut() = 0;
    }
}

impl MessageSink for RecordingSink {
    fn emit(&mut self, message: &Outgoing) -> Result<(), PopupError> {
        self.sent.borrow_mut().push(message.clone());
        if self.fail {
            return Err(PopupError::Delivery(message.to_string()));
        }
        Ok(())
    }

    fn flush(&mut self) {
        *self.flushed.borrow_mut() = self.sent.borrow().len();
    }
}
