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

//! Bluetooth popup mediator.
//!
//! Classifies requests from the Bluetooth daemon, shows them through a
//! presentation port, and sends exactly one reply per request back over
//! D-Bus, whether the user answers, the popup times out or it is preempted.

pub mod bus;
pub mod config;
pub mod error;
pub mod events;
pub mod presentation;
pub mod reply;
pub mod request;
pub mod session;
