// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Connections to the administration server.
//!
//! # Clients
//!
//! - [`ApiClient`]: JSON over the REST API, configured with [`HttpConfig`]
//! - [`PushChannel`]: persistent connection carrying named events
//!   - [`LocalChannel`]: in-process channel, events injected by the caller
//!   - [`MqttChannel`]: events carried as MQTT topics (feature `mqtt`)

mod channel;
mod http;
#[cfg(feature = "mqtt")]
mod mqtt;

pub use channel::{ChannelHandlers, EmittedEvent, EventHandler, LocalChannel, PushChannel};
pub use http::{ApiClient, HttpConfig};
#[cfg(feature = "mqtt")]
pub use mqtt::{MqttChannel, MqttChannelBuilder};
