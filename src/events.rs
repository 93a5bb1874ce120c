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

//! Event processing and the mediator's main loop.

use serde::Deserialize;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, info, warn};

use crate::reply::{Decision, UserDecision};
use crate::request::Bundle;
use crate::session::{SessionController, SessionId};

/// Everything the controller reacts to, besides its own deadline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediatorEvent {
    /// A new request from the daemon side.
    Bundle(Bundle),
    /// The user answered a popup.
    Decision {
        session: SessionId,
        decision: UserDecision,
    },
    /// The user toggled "don't ask again".
    Trusted { session: SessionId, value: bool },
    /// Host input reached end of file.
    InputClosed,
    /// SIGINT or SIGTERM.
    Shutdown,
}

/// One line of host input.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum HostMessage {
    Bundle {
        fields: Bundle,
    },
    Decision {
        session: SessionId,
        decision: Decision,
        #[serde(default)]
        text: Option<String>,
    },
    Trusted {
        session: SessionId,
        value: bool,
    },
}

impl From<HostMessage> for MediatorEvent {
    fn from(message: HostMessage) -> Self {
        match message {
            HostMessage::Bundle { fields } => MediatorEvent::Bundle(fields),
            HostMessage::Decision {
                session,
                decision,
                text,
            } => MediatorEvent::Decision {
                session,
                decision: UserDecision { decision, text },
            },
            HostMessage::Trusted { session, value } => MediatorEvent::Trusted { session, value },
        }
    }
}

/// Parse one line of host input. Blank lines yield `None`.
pub fn parse_host_line(line: &str) -> serde_json::Result<Option<HostMessage>> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    serde_json::from_str(line).map(Some)
}

/// Forward host input lines as events until end of file.
pub fn spawn_host_reader<R>(reader: R, tx: mpsc::UnboundedSender<MediatorEvent>) -> JoinHandle<()>
where
    R: AsyncBufRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut lines = reader.lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => match parse_host_line(&line) {
                    Ok(Some(message)) => {
                        debug!("Host -> {:?}", message);
                        if tx.send(message.into()).is_err() {
                            return;
                        }
                    }
                    Ok(None) => {}
                    Err(e) => warn!("Skipping malformed host line: {}", e),
                },
                Ok(None) => break,
                Err(e) => {
                    warn!("Failed to read host input: {}", e);
                    break;
                }
            }
        }

        info!("Host input closed");
        let _ = tx.send(MediatorEvent::InputClosed);
    })
}

/// Turn SIGINT and SIGTERM into a shutdown event.
pub fn spawn_signal_handler(tx: mpsc::UnboundedSender<MediatorEvent>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut terminate =
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(signal) => Some(signal),
                Err(e) => {
                    warn!("Cannot listen for SIGTERM: {}", e);
                    None
                }
            };

        tokio::select! {
            _ = tokio::signal::ctrl_c() => info!("Interrupted"),
            _ = async {
                match terminate.as_mut() {
                    Some(signal) => {
                        signal.recv().await;
                    }
                    None => std::future::pending::<()>().await,
                }
            } => info!("Terminated"),
        }

        let _ = tx.send(MediatorEvent::Shutdown);
    })
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

/// Drives a [`SessionController`] from events and its deadline.
pub struct EventLoop {
    controller: SessionController,
    events: mpsc::UnboundedReceiver<MediatorEvent>,
}

impl EventLoop {
    pub fn new(controller: SessionController, events: mpsc::UnboundedReceiver<MediatorEvent>) -> Self {
        Self { controller, events }
    }

    pub fn controller(&self) -> &SessionController {
        &self.controller
    }

    /// Process a single event.
    pub fn process_event(&mut self, event: MediatorEvent) {
        match event {
            MediatorEvent::Bundle(bundle) => self.controller.handle_bundle(&bundle),
            MediatorEvent::Decision { session, decision } => {
                self.controller.handle_decision(session, decision)
            }
            MediatorEvent::Trusted { session, value } => self.controller.set_trusted(session, value),
            MediatorEvent::InputClosed | MediatorEvent::Shutdown => self.controller.shutdown(),
        }
    }

    /// Run until the controller is done.
    ///
    /// The deadline is re-read every iteration, so a resolved or preempted
    /// session's timer can never fire.
    pub async fn run(&mut self) {
        while !self.controller.should_exit() {
            let deadline = self.controller.deadline();

            tokio::select! {
                event = self.events.recv() => match event {
                    Some(event) => self.process_event(event),
                    None => {
                        debug!("All event sources are gone");
                        self.controller.shutdown();
                    }
                },
                _ = wait_until(deadline) => self.controller.handle_deadline(Instant::now()),
            }
        }

        info!("Event loop finished");
    }
}
