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

//! Session controller.

use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use super::{Resolution, Session, SessionId, SessionState};
use crate::bus::{Endpoints, MessageSink, Proxy};
use crate::error::PopupError;
use crate::presentation::PresentationPort;
use crate::reply::{contract, Channel, ReplyContract, UserDecision, MALFORMED_TIMEOUT};
use crate::request::{fields, Bundle, PopupRequest, RequestKind};

/// Owns the active session, the reply sink and the presenter.
pub struct SessionController {
    sink: Box<dyn MessageSink>,
    presenter: Box<dyn PresentationPort>,
    endpoints: Endpoints,
    one_shot: bool,
    active: Option<Session>,
    next_id: u64,
    handled: usize,
    terminated: bool,
}

impl SessionController {
    pub fn new(
        sink: Box<dyn MessageSink>,
        presenter: Box<dyn PresentationPort>,
        endpoints: Endpoints,
        one_shot: bool,
    ) -> Self {
        Self {
            sink,
            presenter,
            endpoints,
            one_shot,
            active: None,
            next_id: 1,
            handled: 0,
            terminated: false,
        }
    }

    /// Classify and start a request, preempting any active session.
    pub fn handle_bundle(&mut self, bundle: &Bundle) {
        self.handled += 1;

        let kind = match RequestKind::from_token(bundle.event_type().unwrap_or_default()) {
            Ok(kind) => kind,
            Err(e) => {
                warn!("Dropping request: {}", e);
                return;
            }
        };

        if kind == RequestKind::Terminate {
            info!("Terminate requested");
            self.resolve_active(Resolution::Terminated);
            self.terminated = true;
            return;
        }

        let (admitted, endpoint) = match self.admit(kind, bundle) {
            Some(admitted) => admitted,
            None => return,
        };

        // The old reply goes out before anything is sent for the new request.
        self.resolve_active(Resolution::Preempted);

        match admitted {
            Ok(request) => self.start(request, endpoint),
            Err(e) => self.start_malformed(kind, endpoint, e),
        }
    }

    /// Apply the user's answer to the session it was given for.
    pub fn handle_decision(&mut self, session: SessionId, decision: UserDecision) {
        let current = self
            .active
            .as_ref()
            .is_some_and(|active| active.id == session && active.presented);

        if current {
            self.resolve(decision, Resolution::User);
        } else {
            debug!("Ignoring decision for inactive session {}", session);
        }
    }

    /// Toggle the "don't ask again" flag of the active session.
    pub fn set_trusted(&mut self, session: SessionId, value: bool) {
        match self.active.as_mut() {
            Some(active) if active.id == session => {
                debug!("Session {} trusted = {}", session, value);
                active.trusted = value;
            }
            _ => debug!("Ignoring trusted flag for inactive session {}", session),
        }
    }

    /// Answer on the user's behalf once the deadline has passed.
    pub fn handle_deadline(&mut self, now: Instant) {
        if matches!(self.deadline(), Some(deadline) if now >= deadline) {
            self.resolve_active(Resolution::Timeout);
        }
    }

    /// Answer any active session and stop.
    pub fn shutdown(&mut self) {
        self.resolve_active(Resolution::Shutdown);
        self.terminated = true;
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.active.as_ref().and_then(|s| s.deadline)
    }

    pub fn state(&self) -> SessionState {
        if self.active.is_some() {
            SessionState::Awaiting
        } else {
            SessionState::Idle
        }
    }

    pub fn active_session(&self) -> Option<SessionId> {
        self.active.as_ref().map(|s| s.id)
    }

    /// Whether the event loop should stop.
    ///
    /// One-shot mediators stop once idle after their first request.
    pub fn should_exit(&self) -> bool {
        self.terminated || (self.one_shot && self.handled > 0 && self.active.is_none())
    }

    /// Decode and bind a request without side effects.
    ///
    /// `None` means the request is dropped and must not disturb the active
    /// session. A malformed request comes back as `Err` when its reply target
    /// can still be reached.
    fn admit(
        &self,
        kind: RequestKind,
        bundle: &Bundle,
    ) -> Option<(Result<PopupRequest, PopupError>, Option<Proxy>)> {
        match PopupRequest::decode(kind, bundle) {
            Ok(request) => match self.bind(contract(kind), request.agent_path()) {
                Ok(endpoint) => Some((Ok(request), endpoint)),
                Err(e) => {
                    warn!("Abandoning {}: {}", kind, e);
                    None
                }
            },
            Err(e) if e.is_malformed() => {
                let contract = contract(kind);
                if !contract.replies() {
                    warn!("Dropping malformed request: {}", e);
                    return None;
                }
                match self.bind(contract, bundle.get(fields::AGENT_PATH)) {
                    Ok(endpoint) => Some((Err(e), endpoint)),
                    Err(bind_err) => {
                        warn!("Dropping malformed request: {} ({})", e, bind_err);
                        None
                    }
                }
            }
            Err(e) => {
                warn!("Dropping {}: {}", kind, e);
                None
            }
        }
    }

    fn start(&mut self, request: PopupRequest, endpoint: Option<Proxy>) {
        let kind = request.kind();
        let contract = contract(kind);

        let id = self.next_session_id();
        let timeout = contract.timeout_for(&request);
        info!("Session {}: {} (timeout {:?})", id, kind, timeout);

        self.active = Some(Session {
            id,
            kind,
            contract,
            endpoint,
            deadline: timeout.map(|t| Instant::now() + t),
            trusted: false,
            presented: false,
        });

        match self.presenter.present(id, &request, timeout) {
            Ok(()) => {
                if let Some(session) = self.active.as_mut() {
                    session.presented = true;
                }
            }
            Err(e) => {
                warn!("Session {}: {}", id, e);
                self.resolve_active(Resolution::PresentationFailed);
            }
        }
    }

    /// Keep the requester from hanging on a request that cannot be shown.
    fn start_malformed(&mut self, kind: RequestKind, endpoint: Option<Proxy>, err: PopupError) {
        let contract = contract(kind);
        let id = self.next_session_id();
        warn!(
            "Session {}: {}, answering {:?} shortly",
            id, err, contract.timeout_decision
        );

        self.active = Some(Session {
            id,
            kind,
            contract,
            endpoint,
            deadline: Some(Instant::now() + Duration::from_secs(MALFORMED_TIMEOUT)),
            trusted: false,
            presented: false,
        });
    }

    fn bind(
        &self,
        contract: &ReplyContract,
        agent_path: Option<&str>,
    ) -> Result<Option<Proxy>, PopupError> {
        match contract.channel {
            Channel::Agent => {
                let path = agent_path.ok_or(PopupError::MissingField {
                    kind: contract.kind,
                    field: fields::AGENT_PATH,
                })?;
                self.endpoints.agent(path).map(Some)
            }
            Channel::Obex => Ok(Some(self.endpoints.obex())),
            Channel::Service => Ok(Some(self.endpoints.service())),
            Channel::Broadcast | Channel::Silent => Ok(None),
        }
    }

    fn next_session_id(&mut self) -> SessionId {
        let id = SessionId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Resolve the active session, if any, with its timeout decision.
    fn resolve_active(&mut self, reason: Resolution) {
        let decision = self
            .active
            .as_ref()
            .map(|session| UserDecision::new(session.contract.timeout_decision));

        if let Some(decision) = decision {
            self.resolve(decision, reason);
        }
    }

    /// Take the active session and emit its reply.
    fn resolve(&mut self, decision: UserDecision, reason: Resolution) {
        let Some(session) = self.active.take() else {
            return;
        };

        info!(
            "Session {}: {} resolved by {} ({:?})",
            session.id, session.kind, reason, decision.decision
        );

        let messages = session.contract.encode(
            &decision,
            session.trusted,
            session.endpoint.as_ref(),
            self.endpoints.signal(),
        );

        for message in &messages {
            match self.sink.emit(message) {
                Ok(()) => info!("Sent {}", message),
                Err(e) => error!("Session {}: {}", session.id, e),
            }
        }
        if !messages.is_empty() {
            self.sink.flush();
        }

        if session.presented && reason != Resolution::User {
            self.presenter.dismiss(session.id);
        }
    }
}
