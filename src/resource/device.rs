// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device resource and liveness tracking.

use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{Resource, ResourceId};

/// A device reporting to the server.
///
/// `last_message` is the time the server last heard from the device
/// (epoch milliseconds on the wire). `online` is derived from it; see
/// [`LivenessPolicy`].
///
/// # Examples
///
/// ```
/// use zonesync_lib::resource::{Device, ResourceId};
///
/// let device = Device::new("Boiler").in_zone(ResourceId::new("5a1b"));
/// assert!(!device.online);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    /// Device identifier.
    #[serde(rename = "_id")]
    pub id: ResourceId,
    /// Display name.
    #[serde(rename = "Name", default)]
    pub name: String,
    /// Zone the device belongs to, if any.
    #[serde(rename = "Zone", default, skip_serializing_if = "Option::is_none")]
    pub zone: Option<ResourceId>,
    /// Time of the last message received from the device.
    #[serde(
        rename = "lastMessage",
        default,
        with = "chrono::serde::ts_milliseconds_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub last_message: Option<DateTime<Utc>>,
    /// Whether the device is currently reachable.
    #[serde(rename = "Online", default)]
    pub online: bool,
    /// Server fields not modelled by this type.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Device {
    /// Creates a device with a freshly generated identifier.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_id(ResourceId::generate(), name)
    }

    /// Creates a device with the given identifier.
    #[must_use]
    pub fn with_id(id: ResourceId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            zone: None,
            last_message: None,
            online: false,
            extra: Map::new(),
        }
    }

    /// Assigns the device to a zone.
    #[must_use]
    pub fn in_zone(mut self, zone: ResourceId) -> Self {
        self.zone = Some(zone);
        self
    }

    /// Records a message from the device and marks it online.
    pub fn mark_seen(&mut self, at: DateTime<Utc>) {
        self.last_message = Some(at);
        self.online = true;
    }

    /// Returns `true` if the device has been silent for longer than `threshold`.
    ///
    /// A device that never reported is always stale.
    #[must_use]
    pub fn is_stale(&self, now: DateTime<Utc>, threshold: Duration) -> bool {
        let Some(last) = self.last_message else {
            return true;
        };
        TimeDelta::from_std(threshold).is_ok_and(|limit| now.signed_duration_since(last) > limit)
    }
}

impl Resource for Device {
    const KIND: &'static str = "device";
    const LABEL: &'static str = "Device";
    const ENDPOINT: &'static str = "/api/device";
    const COLLECTION_KEY: &'static str = "Devices";
    const ITEM_KEY: &'static str = "Device";
    const READ_REQUEST_EVENT: &'static str = "Devices/Device/Read/Request";
    const READ_RESPONSE_EVENT: &'static str = "Devices/Device/Read/Response";
    const CONFIRM_DISPLAY: Duration = Duration::from_secs(5);

    fn id(&self) -> &ResourceId {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Rule that turns silent devices offline.
///
/// # Examples
///
/// ```
/// use chrono::{TimeDelta, Utc};
/// use zonesync_lib::resource::{Device, LivenessPolicy};
///
/// let mut devices = vec![Device::new("Boiler")];
/// devices[0].mark_seen(Utc::now() - TimeDelta::seconds(60));
///
/// let changed = LivenessPolicy::default().apply(&mut devices, Utc::now());
/// assert_eq!(changed, 1);
/// assert!(!devices[0].online);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LivenessPolicy {
    offline_after: Duration,
}

impl LivenessPolicy {
    /// Default silence after which a device is considered offline.
    pub const DEFAULT_OFFLINE_AFTER: Duration = Duration::from_secs(10);

    /// Creates a policy with a custom threshold.
    #[must_use]
    pub fn new(offline_after: Duration) -> Self {
        Self { offline_after }
    }

    /// Returns the offline threshold.
    #[must_use]
    pub fn offline_after(&self) -> Duration {
        self.offline_after
    }

    /// Marks stale devices offline.
    ///
    /// Returns the number of devices whose `online` flag changed.
    pub fn apply(&self, devices: &mut [Device], now: DateTime<Utc>) -> usize {
        let mut changed = 0;
        for device in devices.iter_mut().filter(|d| d.online) {
            if device.is_stale(now, self.offline_after) {
                tracing::debug!(device = %device.id, "Device went silent, marking offline");
                device.online = false;
                changed += 1;
            }
        }
        changed
    }
}

impl Default for LivenessPolicy {
    fn default() -> Self {
        Self::new(Self::DEFAULT_OFFLINE_AFTER)
    }
}
