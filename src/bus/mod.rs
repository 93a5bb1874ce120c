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

//! Outgoing D-Bus replies: proxies, message model and the sink they go through.
//!
//! Replies are fire-and-forget. Method calls carry the no-reply flag and
//! signals are plain broadcasts; nothing here waits on the daemon.

pub mod dbus_sink;
#[cfg(test)]
pub mod recording;

use dbus::strings::{BusName, Interface, Path};
use std::fmt;

use crate::config::Config;
use crate::error::PopupError;

pub use dbus_sink::DbusSink;

/// Well-known name of the Bluetooth agent service.
pub const AGENT_SERVICE: &str = "org.projectx.bt";
/// Interface of per-request agent objects.
pub const AGENT_INTERFACE: &str = "org.bluez.Agent1";
/// Object path of the Bluetooth service's request handler.
pub const SERVICE_PATH: &str = "/org/projectx/bt_service";
/// Interface of the Bluetooth service's request handler.
pub const SERVICE_INTERFACE: &str = "org.projectx.btservice";
/// Well-known name of the object push agent service.
pub const OBEX_SERVICE: &str = "org.bluez.frwk_agent";
/// Fixed object path of the object push agent.
pub const OBEX_PATH: &str = "/org/obex/ops_agent";
/// Interface of the object push agent.
pub const OBEX_INTERFACE: &str = "org.openobex.Agent";
/// Object path the response signals are emitted from.
pub const SIGNAL_PATH: &str = "/org/projectx/bt_syspopup_res";
/// Interface of the response signals.
pub const SIGNAL_INTERFACE: &str = "User.Bluetooth.syspopup";

/// A validated (service, object path, interface) triple.
///
/// Proxies are cheap, created per request and dropped when the session
/// resolves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Proxy {
    service: BusName<'static>,
    path: Path<'static>,
    interface: Interface<'static>,
}

impl Proxy {
    pub fn new(service: &str, path: &str, interface: &str) -> Result<Self, PopupError> {
        let target = format!("{}{} ({})", service, path, interface);
        let bind_error = |reason: String| PopupError::EndpointBindFailure {
            target: target.clone(),
            reason,
        };

        Ok(Self {
            service: BusName::new(service.to_string()).map_err(bind_error)?,
            path: Path::new(path.to_string()).map_err(bind_error)?,
            interface: Interface::new(interface.to_string()).map_err(bind_error)?,
        })
    }

    pub fn service(&self) -> &BusName<'static> {
        &self.service
    }

    pub fn path(&self) -> &Path<'static> {
        &self.path
    }

    pub fn interface(&self) -> &Interface<'static> {
        &self.interface
    }
}

impl fmt::Display for Proxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", &*self.service, &*self.path)
    }
}

/// Where response signals are broadcast from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignalTarget {
    path: Path<'static>,
    interface: Interface<'static>,
}

impl SignalTarget {
    pub fn new(path: &str, interface: &str) -> Result<Self, PopupError> {
        let bind_error = |reason: String| PopupError::EndpointBindFailure {
            target: format!("{} ({})", path, interface),
            reason,
        };

        Ok(Self {
            path: Path::new(path.to_string()).map_err(bind_error)?,
            interface: Interface::new(interface.to_string()).map_err(bind_error)?,
        })
    }

    pub fn path(&self) -> &Path<'static> {
        &self.path
    }

    pub fn interface(&self) -> &Interface<'static> {
        &self.interface
    }
}

/// The reply targets of this mediator, resolved from configuration.
#[derive(Debug, Clone)]
pub struct Endpoints {
    agent_service: String,
    agent_interface: String,
    obex: Proxy,
    service: Proxy,
    signal: SignalTarget,
}

impl Endpoints {
    /// Validate the configured names. The agent service and interface are
    /// checked here once so that only the per-request path can fail later.
    pub fn from_config(config: &Config) -> Result<Self, PopupError> {
        Proxy::new(&config.agent.service, "/", &config.agent.interface)?;

        Ok(Self {
            agent_service: config.agent.service.clone(),
            agent_interface: config.agent.interface.clone(),
            obex: Proxy::new(
                &config.obex.service,
                &config.obex.path,
                &config.obex.interface,
            )?,
            service: Proxy::new(
                &config.agent.service,
                &config.service.path,
                &config.service.interface,
            )?,
            signal: SignalTarget::new(&config.signal.path, &config.signal.interface)?,
        })
    }

    /// Bind a proxy to the agent object the daemon named in the request.
    pub fn agent(&self, path: &str) -> Result<Proxy, PopupError> {
        Proxy::new(&self.agent_service, path, &self.agent_interface)
    }

    pub fn obex(&self) -> Proxy {
        self.obex.clone()
    }

    /// The Bluetooth service itself, for requests outside any agent.
    pub fn service(&self) -> Proxy {
        self.service.clone()
    }

    pub fn signal(&self) -> &SignalTarget {
        &self.signal
    }
}

/// Reply methods exposed by agent objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentMethod {
    ReplyPinCode,
    ReplyPasskey,
    ReplyConfirmation,
    ReplyAuthorize,
    ReplyOverwrite,
    /// Abort the bonding in progress; takes no arguments.
    CancelBonding,
}

impl AgentMethod {
    pub fn name(self) -> &'static str {
        match self {
            AgentMethod::ReplyPinCode => "ReplyPinCode",
            AgentMethod::ReplyPasskey => "ReplyPasskey",
            AgentMethod::ReplyConfirmation => "ReplyConfirmation",
            AgentMethod::ReplyAuthorize => "ReplyAuthorize",
            AgentMethod::ReplyOverwrite => "ReplyOverwrite",
            AgentMethod::CancelBonding => "CancelBonding",
        }
    }

    /// Whether the call carries entered text after the decision code.
    pub fn carries_text(self) -> bool {
        matches!(self, AgentMethod::ReplyPinCode | AgentMethod::ReplyPasskey)
    }

    /// Whether the call carries a decision code at all.
    pub fn carries_decision(self) -> bool {
        self != AgentMethod::CancelBonding
    }
}

/// Arguments of an agent reply call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallArgs {
    Empty,
    Decision(u32),
    DecisionWithText(u32, String),
}

/// Broadcast response signals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseSignal {
    /// `Response(code)`: 0 accept, 1 reject.
    Response(i32),
    /// `ResetResponse(code, flag)`: reset choice and checkbox state.
    ResetResponse(i32, i32),
}

impl ResponseSignal {
    pub fn member(self) -> &'static str {
        match self {
            ResponseSignal::Response(_) => "Response",
            ResponseSignal::ResetResponse(..) => "ResetResponse",
        }
    }
}

/// One message on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outgoing {
    Call {
        proxy: Proxy,
        method: AgentMethod,
        args: CallArgs,
    },
    Signal {
        target: SignalTarget,
        signal: ResponseSignal,
    },
}

impl fmt::Display for Outgoing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outgoing::Call {
                proxy,
                method,
                args: CallArgs::Empty,
            } => write!(f, "{}.{}() on {}", &**proxy.interface(), method.name(), proxy),
            Outgoing::Call {
                proxy,
                method,
                args: CallArgs::Decision(code),
            } => write!(f, "{}.{}({}) on {}", &**proxy.interface(), method.name(), code, proxy),
            // Entered text is never logged.
            Outgoing::Call {
                proxy,
                method,
                args: CallArgs::DecisionWithText(code, _),
            } => write!(
                f,
                "{}.{}({}, <text>) on {}",
                &**proxy.interface(),
                method.name(),
                code,
                proxy
            ),
            Outgoing::Signal {
                target,
                signal: ResponseSignal::Response(code),
            } => write!(f, "signal {}.Response({})", &**target.interface(), code),
            Outgoing::Signal {
                target,
                signal: ResponseSignal::ResetResponse(code, flag),
            } => write!(
                f,
                "signal {}.ResetResponse({}, {})",
                &**target.interface(),
                code,
                flag
            ),
        }
    }
}

/// Transport for outgoing replies.
pub trait MessageSink {
    /// Hand one message to the bus without waiting for an answer.
    fn emit(&mut self, message: &Outgoing) -> Result<(), PopupError>;

    /// Block until everything emitted so far has left the process.
    fn flush(&mut self) {}
}
