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

//! D-Bus transport for replies.

use dbus::channel::{Channel, Sender};
use dbus::message::Message;
use dbus::nonblock::SyncConnection;
use dbus::strings::Member;
use std::sync::Arc;
use tracing::{debug, error, info};

use super::{CallArgs, MessageSink, Outgoing, ResponseSignal};
use crate::config::BusKind;
use crate::error::PopupError;

/// Sends replies over a shared bus connection.
pub struct DbusSink {
    conn: Arc<SyncConnection>,
}

impl DbusSink {
    /// Connect to the bus. Must be called from within a tokio runtime; the
    /// connection's I/O driver is spawned onto it.
    pub fn connect(bus: BusKind) -> Result<Self, PopupError> {
        info!("Connecting to the {} bus...", bus);

        let connected = match bus {
            BusKind::System => dbus_tokio::connection::new_system_sync(),
            BusKind::Session => dbus_tokio::connection::new_session_sync(),
        };

        let (resource, conn) = connected.map_err(|e| PopupError::BusConnectFailure {
            bus: bus.to_string(),
            reason: e.to_string(),
        })?;

        tokio::spawn(async move {
            let err = resource.await;
            error!("Lost connection to D-Bus: {}", err);
        });

        info!("Connected to the {} bus as {}", bus, conn.unique_name());
        Ok(Self { conn })
    }

    /// Build the wire message for an outgoing reply.
    fn build(message: &Outgoing) -> Result<Message, PopupError> {
        match message {
            Outgoing::Call {
                proxy,
                method,
                args,
            } => {
                let member = Member::new(method.name())
                    .map_err(|e| PopupError::Delivery(format!("{}: {}", message, e)))?;
                let call =
                    Message::method_call(proxy.service(), proxy.path(), proxy.interface(), &member);

                let mut call = match args {
                    CallArgs::Empty => call,
                    CallArgs::Decision(code) => call.append1(*code),
                    CallArgs::DecisionWithText(code, text) => call.append2(*code, text.as_str()),
                };
                call.set_no_reply(true);
                Ok(call)
            }
            Outgoing::Signal { target, signal } => {
                let member = Member::new(signal.member())
                    .map_err(|e| PopupError::Delivery(format!("{}: {}", message, e)))?;
                let msg = Message::signal(target.path(), target.interface(), &member);

                Ok(match signal {
                    ResponseSignal::Response(code) => msg.append1(*code),
                    ResponseSignal::ResetResponse(code, flag) => msg.append2(*code, *flag),
                })
            }
        }
    }
}

impl MessageSink for DbusSink {
    fn emit(&mut self, message: &Outgoing) -> Result<(), PopupError> {
        let msg = Self::build(message)?;

        let serial = self
            .conn
            .send(msg)
            .map_err(|_| PopupError::Delivery(message.to_string()))?;

        debug!("Sent {} (serial {})", message, serial);
        Ok(())
    }

    fn flush(&mut self) {
        let channel: &Channel = (*self.conn).as_ref();
        channel.flush();
    }
}
