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

//! Reply side of a request: decisions and the per-kind contract table.

mod contract;
mod decision;

pub use contract::{
    contract, Channel, ReplyContract, SignalShape, Timeout, AUTHENTICATION_TIMEOUT,
    AUTHORIZATION_TIMEOUT, MALFORMED_TIMEOUT, NOTIFICATION_TIMEOUT,
};
pub use decision::{response_code, AgentReply, Decision, UserDecision};
