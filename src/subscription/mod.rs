// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Subscription system for resource changes.
//!
//! This module provides a callback-based subscription system for receiving
//! notifications when a resource collection changes, whether the change was
//! made by this client over HTTP or pushed by the server.
//!
//! # Overview
//!
//! The subscription system consists of:
//!
//! - [`SubscriptionId`] - A unique identifier for a subscription, used to unsubscribe
//! - [`ObserverRegistry`] - Generic registry that stores callbacks and dispatches payloads
//! - [`Subscribable`] - Trait for types that support subscriptions
//!
//! # Usage
//!
//! ```
//! use zonesync_lib::subscription::ObserverRegistry;
//!
//! let registry = ObserverRegistry::<String>::new();
//! let sub_id = registry.subscribe(|name| println!("{name} changed"));
//!
//! registry.notify(&"North".to_string());
//! registry.unsubscribe(sub_id);
//! ```

mod registry;
mod subscribable;

pub use registry::{ObserverRegistry, SubscriptionId};
pub use subscribable::Subscribable;
