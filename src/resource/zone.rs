// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Zone resource.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{Resource, ResourceId};

/// A named area that groups devices.
///
/// Fields the library does not model are kept in [`extra`](Self::extra) so
/// that an update sends back everything the server returned.
///
/// # Examples
///
/// ```
/// use zonesync_lib::resource::Zone;
///
/// let zone = Zone::new("North");
/// assert_eq!(zone.name, "North");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    /// Zone identifier.
    #[serde(rename = "_id")]
    pub id: ResourceId,
    /// Display name.
    #[serde(rename = "Name", default)]
    pub name: String,
    /// Server fields not modelled by this type.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Zone {
    /// Creates a zone with a freshly generated identifier.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_id(ResourceId::generate(), name)
    }

    /// Creates a zone with the given identifier.
    #[must_use]
    pub fn with_id(id: ResourceId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            extra: Map::new(),
        }
    }
}

impl Resource for Zone {
    const KIND: &'static str = "zone";
    const LABEL: &'static str = "Zone";
    const ENDPOINT: &'static str = "/api/zone";
    const COLLECTION_KEY: &'static str = "Zones";
    const ITEM_KEY: &'static str = "Zone";
    const READ_REQUEST_EVENT: &'static str = "Zones/Zone/Read/Request";
    const READ_RESPONSE_EVENT: &'static str = "Zones/Zone/Read/Response";
    const CONFIRM_DISPLAY: Duration = Duration::from_secs(10);

    fn id(&self) -> &ResourceId {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }
}
