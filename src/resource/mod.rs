// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Resource types managed through the synchronization layer.
//!
//! Each resource type describes where it lives on the server: its REST
//! endpoint, the JSON keys wrapping it in responses, and the push-channel
//! events that carry its collection. The services in
//! [`service`](crate::service) are generic over [`Resource`], so zones and
//! devices share one implementation.

mod device;
mod resource_id;
mod zone;

use std::fmt::Debug;
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;

pub use device::{Device, LivenessPolicy};
pub use resource_id::ResourceId;
pub use zone::Zone;

/// A server-owned resource kind.
pub trait Resource: Serialize + DeserializeOwned + Clone + Debug + Send + Sync + 'static {
    /// Lowercase kind name used in logs and errors.
    const KIND: &'static str;
    /// Capitalized name used in user-facing messages.
    const LABEL: &'static str;
    /// REST endpoint, e.g. `/api/zone`.
    const ENDPOINT: &'static str;
    /// Key wrapping the collection in list responses and push payloads.
    const COLLECTION_KEY: &'static str;
    /// Key wrapping a single item in create/update/delete responses.
    const ITEM_KEY: &'static str;
    /// Push event asking the server to broadcast the collection.
    const READ_REQUEST_EVENT: &'static str;
    /// Push event carrying the broadcast collection.
    const READ_RESPONSE_EVENT: &'static str;
    /// How long a delete confirmation prompt stays on screen.
    const CONFIRM_DISPLAY: Duration;

    /// Returns the resource identifier.
    fn id(&self) -> &ResourceId;

    /// Returns the display name.
    fn name(&self) -> &str;
}
