// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `ZoneSync` Lib - client-side synchronization of zones and devices.
//!
//! This library keeps an administration client in step with its server. For
//! each resource type it combines:
//!
//! - **HTTP CRUD** against the REST API, with delete confirmation and
//!   translation of server errors into user-facing messages
//! - **Push updates** received over a persistent channel (MQTT or in-process)
//! - **Observer registries** fanning every change out to the views that
//!   subscribed, whether the change was local or pushed
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use zonesync_lib::app::AppContext;
//! use zonesync_lib::message::LogMessenger;
//! use zonesync_lib::resource::Zone;
//! use zonesync_lib::service::ResourceChange;
//!
//! #[tokio::main]
//! async fn main() -> zonesync_lib::Result<()> {
//!     let app = AppContext::connect(
//!         "http://192.168.1.10:3000",
//!         "mqtt://192.168.1.10:1883",
//!         Arc::new(LogMessenger::approving()),
//!     )
//!     .await?;
//!
//!     app.zones().subscribe(|change: &ResourceChange<Zone>| {
//!         println!("zones changed: {change:?}");
//!     });
//!
//!     let north = app.zones().create(&Zone::new("North")).await?;
//!     app.zones().delete(&north.id).await?;
//!
//!     app.shutdown().await
//! }
//! ```
//!
//! ## Views
//!
//! Views hold their subscriptions in a [`ViewScope`](session::ViewScope),
//! which releases them when the view goes away:
//!
//! ```no_run
//! use std::sync::Arc;
//! use zonesync_lib::app::AppContext;
//! use zonesync_lib::message::ChannelMessenger;
//! use zonesync_lib::protocol::{HttpConfig, LocalChannel};
//! use zonesync_lib::session::MemoryTokenStore;
//!
//! # fn example() -> zonesync_lib::Result<()> {
//! let (messenger, _ui) = ChannelMessenger::new();
//! let app = AppContext::new(
//!     HttpConfig::parse("http://127.0.0.1:3000")?.into_client()?,
//!     Arc::new(LocalChannel::new()),
//!     Arc::new(messenger),
//! );
//!
//! let mut view = app.main_view(Arc::new(MemoryTokenStore::new()));
//! view.activate(|section| println!("redraw {section:?}"));
//! // ...
//! view.deactivate();
//! # Ok(())
//! # }
//! ```

pub mod app;
pub mod error;
pub mod message;
pub mod protocol;
pub mod resource;
pub mod service;
pub mod session;
pub mod subscription;

pub use app::AppContext;
pub use error::{Error, Operation, ParseError, RemoteError, Result, TransportError};
pub use message::{ChannelMessenger, LogMessenger, Messenger, Notice, NoticeLevel};
pub use protocol::{ApiClient, HttpConfig, LocalChannel, PushChannel};
#[cfg(feature = "mqtt")]
pub use protocol::{MqttChannel, MqttChannelBuilder};
pub use resource::{Device, LivenessPolicy, Resource, ResourceId, Zone};
pub use service::{
    DeleteOutcome, DeviceService, ResourceChange, ResourceService, ServiceOptions, ZoneService,
};
pub use session::{MainView, MemoryTokenStore, TokenStore, ViewScope};
pub use subscription::{ObserverRegistry, Subscribable, SubscriptionId};
