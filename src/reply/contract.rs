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

//! The reply contract table.
//!
//! One row per request kind describes where the answer goes, what it looks
//! like on the wire, how long the user has, and what is sent when they never
//! answer. The timeout decision is always reject- or cancel-class.

use std::time::Duration;
use tracing::warn;

use super::decision::{response_code, AgentReply, Decision, UserDecision};
use crate::bus::{AgentMethod, CallArgs, Outgoing, Proxy, ResponseSignal, SignalTarget};
use crate::request::{ButtonLayout, PopupRequest, RequestKind};

/// Seconds allowed for PIN, passkey and pairing confirmations.
pub const AUTHENTICATION_TIMEOUT: u64 = 35;
/// Seconds allowed for authorization prompts.
pub const AUTHORIZATION_TIMEOUT: u64 = 25;
/// Seconds a notification stays up.
pub const NOTIFICATION_TIMEOUT: u64 = 2;
/// Seconds before a malformed request is answered with its timeout decision.
pub const MALFORMED_TIMEOUT: u64 = 1;
/// Seconds a toast stays up.
pub const TOAST_TIMEOUT: u64 = 3;
/// Seconds the pairing retry prompt stays up.
pub const PAIRING_RETRY_TIMEOUT: u64 = 5;

/// Longest PIN the agent accepts.
pub const PIN_MAX_LEN: usize = 16;
/// Longest passkey the agent accepts.
pub const PASSKEY_MAX_LEN: usize = 6;

/// Where the reply goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    /// Method call on the agent object named by `agent-path`.
    Agent,
    /// Method call on the fixed object push agent.
    Obex,
    /// Method call on the Bluetooth service itself.
    Service,
    /// Response signal only.
    Broadcast,
    /// Display only; nobody waits for an answer.
    Silent,
}

/// How long a request stays up before the timeout decision is sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timeout {
    Never,
    Fixed(u64),
    /// Two-button popups wait longer than acknowledgement-only ones.
    ByLayout { two_buttons: u64, otherwise: u64 },
}

/// Which response signal accompanies the reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalShape {
    Response,
    ResetResponse,
}

/// Static reply description for one request kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyContract {
    pub kind: RequestKind,
    pub channel: Channel,
    pub method: Option<AgentMethod>,
    pub signal: Option<SignalShape>,
    pub timeout: Timeout,
    pub timeout_decision: Decision,
    /// "Don't ask again" turns an accept into accept-always.
    pub accept_always: bool,
    /// The pairing call is always refused; the decision travels in the signal.
    pub refuse_pairing: bool,
    /// The call is only made when the user did not accept.
    pub cancel_only: bool,
}

const fn row(
    kind: RequestKind,
    channel: Channel,
    method: Option<AgentMethod>,
    signal: Option<SignalShape>,
    timeout: Timeout,
    timeout_decision: Decision,
) -> ReplyContract {
    ReplyContract {
        kind,
        channel,
        method,
        signal,
        timeout,
        timeout_decision,
        accept_always: false,
        refuse_pairing: false,
        cancel_only: false,
    }
}

const fn always(mut contract: ReplyContract) -> ReplyContract {
    contract.accept_always = true;
    contract
}

const fn refusing(mut contract: ReplyContract) -> ReplyContract {
    contract.refuse_pairing = true;
    contract
}

const fn cancelling(mut contract: ReplyContract) -> ReplyContract {
    contract.cancel_only = true;
    contract
}

const fn toast(kind: RequestKind) -> ReplyContract {
    row(
        kind,
        Channel::Silent,
        None,
        None,
        Timeout::Fixed(TOAST_TIMEOUT),
        Decision::Cancel,
    )
}

/// Indexed by `RequestKind as usize`; order follows the enum.
static TABLE: [ReplyContract; 22] = [
    row(
        RequestKind::PinRequest,
        Channel::Agent,
        Some(AgentMethod::ReplyPinCode),
        None,
        Timeout::Fixed(AUTHENTICATION_TIMEOUT),
        Decision::Cancel,
    ),
    row(
        RequestKind::PasskeyRequest,
        Channel::Agent,
        Some(AgentMethod::ReplyPasskey),
        None,
        Timeout::Fixed(AUTHENTICATION_TIMEOUT),
        Decision::Cancel,
    ),
    row(
        RequestKind::PasskeyConfirm,
        Channel::Agent,
        Some(AgentMethod::ReplyConfirmation),
        None,
        Timeout::Fixed(AUTHENTICATION_TIMEOUT),
        Decision::Cancel,
    ),
    // Dismissed by the remote side, not by a local timer.
    row(
        RequestKind::PasskeyDisplay,
        Channel::Silent,
        None,
        None,
        Timeout::Never,
        Decision::Cancel,
    ),
    row(
        RequestKind::PasskeyAutoAccepted,
        Channel::Silent,
        None,
        None,
        Timeout::Never,
        Decision::Cancel,
    ),
    // The passkey is typed on the remote keyboard; the popup can only abort.
    cancelling(row(
        RequestKind::KeyboardPasskeyRequest,
        Channel::Service,
        Some(AgentMethod::CancelBonding),
        None,
        Timeout::Fixed(AUTHENTICATION_TIMEOUT),
        Decision::Cancel,
    )),
    always(row(
        RequestKind::AuthorizeRequest,
        Channel::Agent,
        Some(AgentMethod::ReplyAuthorize),
        None,
        Timeout::Fixed(AUTHORIZATION_TIMEOUT),
        Decision::Cancel,
    )),
    row(
        RequestKind::AppConfirm,
        Channel::Broadcast,
        None,
        Some(SignalShape::Response),
        Timeout::ByLayout {
            two_buttons: AUTHORIZATION_TIMEOUT,
            otherwise: NOTIFICATION_TIMEOUT,
        },
        Decision::Reject,
    ),
    row(
        RequestKind::PushAuthorize,
        Channel::Obex,
        Some(AgentMethod::ReplyAuthorize),
        None,
        Timeout::Fixed(AUTHORIZATION_TIMEOUT),
        Decision::Cancel,
    ),
    row(
        RequestKind::ConfirmOverwrite,
        Channel::Obex,
        Some(AgentMethod::ReplyOverwrite),
        Some(SignalShape::Response),
        Timeout::Fixed(AUTHORIZATION_TIMEOUT),
        Decision::Reject,
    ),
    always(row(
        RequestKind::ExchangeRequest,
        Channel::Obex,
        Some(AgentMethod::ReplyAuthorize),
        None,
        Timeout::Fixed(AUTHORIZATION_TIMEOUT),
        Decision::Cancel,
    )),
    always(row(
        RequestKind::PhonebookRequest,
        Channel::Agent,
        Some(AgentMethod::ReplyAuthorize),
        None,
        Timeout::Fixed(AUTHORIZATION_TIMEOUT),
        Decision::Cancel,
    )),
    always(row(
        RequestKind::MessageRequest,
        Channel::Agent,
        Some(AgentMethod::ReplyAuthorize),
        None,
        Timeout::Fixed(AUTHORIZATION_TIMEOUT),
        Decision::Cancel,
    )),
    row(
        RequestKind::BtInformation,
        Channel::Silent,
        None,
        None,
        Timeout::Fixed(NOTIFICATION_TIMEOUT),
        Decision::Reject,
    ),
    toast(RequestKind::UnableToPair),
    toast(RequestKind::HandsfreeConnect),
    toast(RequestKind::HandsfreeDisconnect),
    toast(RequestKind::MusicAutoConnect),
    refusing(row(
        RequestKind::SystemReset,
        Channel::Agent,
        Some(AgentMethod::ReplyConfirmation),
        Some(SignalShape::ResetResponse),
        Timeout::Fixed(AUTHENTICATION_TIMEOUT),
        Decision::Cancel,
    )),
    row(
        RequestKind::PairingRetry,
        Channel::Broadcast,
        None,
        Some(SignalShape::Response),
        Timeout::Fixed(PAIRING_RETRY_TIMEOUT),
        Decision::Reject,
    ),
    toast(RequestKind::LegacyPairFailed),
    row(
        RequestKind::Terminate,
        Channel::Silent,
        None,
        None,
        Timeout::Never,
        Decision::Cancel,
    ),
];

/// Look up the contract for a request kind.
pub fn contract(kind: RequestKind) -> &'static ReplyContract {
    &TABLE[kind as usize]
}

impl ReplyContract {
    /// Whether anyone on the bus hears about this request's outcome.
    pub fn replies(&self) -> bool {
        self.channel != Channel::Silent
    }

    /// Deadline budget for a request of this kind.
    pub fn timeout_for(&self, request: &PopupRequest) -> Option<Duration> {
        match self.timeout {
            Timeout::Never => None,
            Timeout::Fixed(secs) => Some(Duration::from_secs(secs)),
            Timeout::ByLayout {
                two_buttons,
                otherwise,
            } => match request.button_layout() {
                Some(ButtonLayout::TwoButtons) => Some(Duration::from_secs(two_buttons)),
                _ => Some(Duration::from_secs(otherwise)),
            },
        }
    }

    /// Agent reply code for a decision.
    pub fn agent_reply(&self, decision: Decision, trusted: bool) -> AgentReply {
        match decision {
            Decision::Accept if trusted && self.accept_always => AgentReply::AcceptAlways,
            Decision::AcceptAlways if self.accept_always => AgentReply::AcceptAlways,
            Decision::Accept | Decision::AcceptAlways => AgentReply::Accept,
            Decision::Reject => AgentReply::Reject,
            Decision::Cancel => AgentReply::Cancel,
        }
    }

    /// Encode a decision into the wire messages of one reply.
    ///
    /// The method call (if any) comes first, then the signal. `endpoint` is the
    /// proxy bound for agent and obex channels.
    pub fn encode(
        &self,
        decision: &UserDecision,
        trusted: bool,
        endpoint: Option<&Proxy>,
        signal: &SignalTarget,
    ) -> Vec<Outgoing> {
        let mut messages = Vec::with_capacity(2);
        let mut effective = decision.decision;
        let mut text = String::new();

        if let Some(method) = self.method {
            if method.carries_text() && effective.is_accept() {
                match decision.text.as_deref() {
                    Some(entered) if entry_is_valid(method, entered) => text = entered.to_string(),
                    _ => {
                        warn!(
                            "{} accepted without a usable entry, cancelling instead",
                            self.kind
                        );
                        effective = Decision::Cancel;
                    }
                }
            }

            match endpoint {
                Some(_) if self.cancel_only && effective.is_accept() => {}
                Some(proxy) => {
                    let code = if self.refuse_pairing {
                        AgentReply::Cancel
                    } else {
                        self.agent_reply(effective, trusted)
                    }
                    .code();

                    let args = if !method.carries_decision() {
                        CallArgs::Empty
                    } else if method.carries_text() {
                        CallArgs::DecisionWithText(code, text)
                    } else {
                        CallArgs::Decision(code)
                    };

                    messages.push(Outgoing::Call {
                        proxy: proxy.clone(),
                        method,
                        args,
                    });
                }
                None => warn!("{} has no bound endpoint, skipping {}", self.kind, method.name()),
            }
        }

        if let Some(shape) = self.signal {
            let code = response_code(effective);
            let signal_value = match shape {
                SignalShape::Response => ResponseSignal::Response(code),
                SignalShape::ResetResponse => ResponseSignal::ResetResponse(code, i32::from(trusted)),
            };
            messages.push(Outgoing::Signal {
                target: signal.clone(),
                signal: signal_value,
            });
        }

        messages
    }
}

/// Check an entered PIN or passkey against the agent's limits.
fn entry_is_valid(method: AgentMethod, entered: &str) -> bool {
    match method {
        AgentMethod::ReplyPinCode => !entered.is_empty() && entered.chars().count() <= PIN_MAX_LEN,
        AgentMethod::ReplyPasskey => {
            !entered.is_empty()
                && entered.len() <= PASSKEY_MAX_LEN
                && entered.chars().all(|c| c.is_ascii_digit())
        }
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::{Endpoints, AGENT_INTERFACE, AGENT_SERVICE};
    use crate::config::Config;
    use crate::request::Bundle;
    use anyhow::Result;

    fn agent_proxy() -> Result<Proxy> {
        Ok(Proxy::new(AGENT_SERVICE, "/agent/1", AGENT_INTERFACE)?)
    }

    fn signal_target() -> Result<SignalTarget> {
        Ok(Endpoints::from_config(&Config::default())?.signal().clone())
    }

    #[test]
    fn test_table_is_indexed_by_kind() {
        for kind in RequestKind::ALL {
            assert_eq!(contract(kind).kind, kind);
        }
    }

    #[test]
    fn test_timeout_decisions_never_accept() {
        for kind in RequestKind::ALL {
            assert!(
                !contract(kind).timeout_decision.is_accept(),
                "{} times out into an accept",
                kind
            );
        }
    }

    #[test]
    fn test_channels_have_methods() {
        for kind in RequestKind::ALL {
            let c = contract(kind);
            match c.channel {
                Channel::Agent | Channel::Obex | Channel::Service => {
                    assert!(c.method.is_some(), "{}", kind)
                }
                Channel::Broadcast => {
                    assert!(c.method.is_none() && c.signal.is_some(), "{}", kind)
                }
                Channel::Silent => assert!(c.method.is_none() && c.signal.is_none(), "{}", kind),
            }
        }
    }

    #[test]
    fn test_timeouts() -> Result<()> {
        let pin = PopupRequest::from_bundle(
            &Bundle::new()
                .with("event-type", "pin-request")
                .with("device-name", "Pixel 7")
                .with("agent-path", "/agent/1"),
        )?;
        assert_eq!(
            contract(RequestKind::PinRequest).timeout_for(&pin),
            Some(Duration::from_secs(35))
        );

        let app = |layout: &str| {
            PopupRequest::from_bundle(
                &Bundle::new()
                    .with("event-type", "app-confirm-request")
                    .with("title", "Enable Bluetooth?")
                    .with("type", layout),
            )
        };
        let confirm = contract(RequestKind::AppConfirm);
        assert_eq!(confirm.timeout_for(&app("twobtn")?), Some(Duration::from_secs(25)));
        assert_eq!(confirm.timeout_for(&app("onebtn")?), Some(Duration::from_secs(2)));
        assert_eq!(confirm.timeout_for(&app("none")?), Some(Duration::from_secs(2)));

        let display = PopupRequest::from_bundle(
            &Bundle::new()
                .with("event-type", "passkey-display-request")
                .with("device-name", "Keyboard")
                .with("passkey", "123456"),
        )?;
        assert_eq!(contract(RequestKind::PasskeyDisplay).timeout_for(&display), None);
        Ok(())
    }

    #[test]
    fn test_trusted_flag_turns_accept_into_accept_always() {
        for kind in [
            RequestKind::AuthorizeRequest,
            RequestKind::PhonebookRequest,
            RequestKind::MessageRequest,
            RequestKind::ExchangeRequest,
        ] {
            let c = contract(kind);
            assert_eq!(c.agent_reply(Decision::Accept, true), AgentReply::AcceptAlways);
            assert_eq!(c.agent_reply(Decision::Accept, false), AgentReply::Accept);
            assert_eq!(c.agent_reply(Decision::Cancel, true), AgentReply::Cancel);
        }

        // Kinds without an accept-always answer ignore the flag.
        let pin = contract(RequestKind::PasskeyConfirm);
        assert_eq!(pin.agent_reply(Decision::Accept, true), AgentReply::Accept);
        assert_eq!(pin.agent_reply(Decision::AcceptAlways, false), AgentReply::Accept);
    }

    #[test]
    fn test_encode_pin_accept() -> Result<()> {
        let proxy = agent_proxy()?;
        let messages = contract(RequestKind::PinRequest).encode(
            &UserDecision::accept_with("1234"),
            false,
            Some(&proxy),
            &signal_target()?,
        );

        assert_eq!(
            messages,
            vec![Outgoing::Call {
                proxy,
                method: AgentMethod::ReplyPinCode,
                args: CallArgs::DecisionWithText(0, "1234".to_string()),
            }]
        );
        Ok(())
    }

    #[test]
    fn test_encode_pin_cancel_sends_empty_text() -> Result<()> {
        let proxy = agent_proxy()?;
        let messages = contract(RequestKind::PinRequest).encode(
            &UserDecision::cancel(),
            false,
            Some(&proxy),
            &signal_target()?,
        );

        assert_eq!(
            messages,
            vec![Outgoing::Call {
                proxy,
                method: AgentMethod::ReplyPinCode,
                args: CallArgs::DecisionWithText(2, String::new()),
            }]
        );
        Ok(())
    }

    #[test]
    fn test_invalid_passkey_entry_degrades_to_cancel() -> Result<()> {
        let proxy = agent_proxy()?;
        let c = contract(RequestKind::PasskeyRequest);

        for entry in ["12a456", "1234567", ""] {
            let messages = c.encode(
                &UserDecision::accept_with(entry),
                false,
                Some(&proxy),
                &signal_target()?,
            );
            assert_eq!(
                messages,
                vec![Outgoing::Call {
                    proxy: proxy.clone(),
                    method: AgentMethod::ReplyPasskey,
                    args: CallArgs::DecisionWithText(2, String::new()),
                }],
                "entry {:?}",
                entry
            );
        }
        Ok(())
    }

    #[test]
    fn test_encode_app_confirm_broadcast() -> Result<()> {
        let target = signal_target()?;
        let c = contract(RequestKind::AppConfirm);

        assert_eq!(
            c.encode(&UserDecision::accept(), false, None, &target),
            vec![Outgoing::Signal {
                target: target.clone(),
                signal: ResponseSignal::Response(0),
            }]
        );
        assert_eq!(
            c.encode(&UserDecision::new(c.timeout_decision), false, None, &target),
            vec![Outgoing::Signal {
                target,
                signal: ResponseSignal::Response(1),
            }]
        );
        Ok(())
    }

    #[test]
    fn test_encode_overwrite_calls_then_signals() -> Result<()> {
        let target = signal_target()?;
        let obex = Endpoints::from_config(&Config::default())?.obex();
        let messages = contract(RequestKind::ConfirmOverwrite).encode(
            &UserDecision::accept(),
            false,
            Some(&obex),
            &target,
        );

        assert_eq!(
            messages,
            vec![
                Outgoing::Call {
                    proxy: obex,
                    method: AgentMethod::ReplyOverwrite,
                    args: CallArgs::Decision(0),
                },
                Outgoing::Signal {
                    target,
                    signal: ResponseSignal::Response(0),
                },
            ]
        );
        Ok(())
    }

    #[test]
    fn test_system_reset_refuses_pairing() -> Result<()> {
        let proxy = agent_proxy()?;
        let target = signal_target()?;
        let messages = contract(RequestKind::SystemReset).encode(
            &UserDecision::accept(),
            true,
            Some(&proxy),
            &target,
        );

        assert_eq!(
            messages,
            vec![
                Outgoing::Call {
                    proxy,
                    method: AgentMethod::ReplyConfirmation,
                    args: CallArgs::Decision(2),
                },
                Outgoing::Signal {
                    target,
                    signal: ResponseSignal::ResetResponse(0, 1),
                },
            ]
        );
        Ok(())
    }

    #[test]
    fn test_keyboard_passkey_cancel_aborts_bonding() -> Result<()> {
        let target = signal_target()?;
        let service = Endpoints::from_config(&Config::default())?.service();
        let c = contract(RequestKind::KeyboardPasskeyRequest);

        let cancel = vec![Outgoing::Call {
            proxy: service.clone(),
            method: AgentMethod::CancelBonding,
            args: CallArgs::Empty,
        }];
        assert_eq!(
            c.encode(&UserDecision::new(c.timeout_decision), false, Some(&service), &target),
            cancel
        );
        assert_eq!(
            c.encode(&UserDecision::reject(), false, Some(&service), &target),
            cancel
        );

        // The remote keyboard completes the pairing on its own.
        assert!(c
            .encode(&UserDecision::accept(), false, Some(&service), &target)
            .is_empty());
        Ok(())
    }

    #[test]
    fn test_silent_kinds_encode_nothing() -> Result<()> {
        let target = signal_target()?;
        for kind in [
            RequestKind::PasskeyDisplay,
            RequestKind::BtInformation,
            RequestKind::HandsfreeConnect,
            RequestKind::Terminate,
        ] {
            assert!(contract(kind)
                .encode(&UserDecision::accept(), false, None, &target)
                .is_empty());
        }
        Ok(())
    }
}
