// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Resource services: HTTP CRUD plus live push updates.
//!
//! One [`ResourceService`] exists per resource type. Every change it sees,
//! whether caused by a local HTTP mutation or pushed by the server, reaches
//! its subscribers through a single [`ObserverRegistry`](crate::subscription::ObserverRegistry):
//!
//! ```text
//! create/update/delete ──┐
//!                        ├──► registry.notify(ResourceChange) ──► subscribers
//! push read response ────┘
//! ```

mod resource_service;

use std::time::Duration;

pub use resource_service::ResourceService;

use crate::resource::{Device, Resource, ResourceId, Zone};

/// Service for zones.
pub type ZoneService<C, M> = ResourceService<Zone, C, M>;

/// Service for devices.
pub type DeviceService<C, M> = ResourceService<Device, C, M>;

/// Payload delivered to service subscribers.
#[derive(Debug, Clone, PartialEq)]
pub enum ResourceChange<R> {
    /// A resource was created through this client.
    Created(R),
    /// A resource was updated through this client.
    Updated(R),
    /// A resource was deleted through this client.
    Deleted(ResourceId),
    /// The server pushed the current collection.
    Refreshed(Vec<R>),
}

impl<R: Resource> ResourceChange<R> {
    /// Returns the ids touched by this change.
    #[must_use]
    pub fn ids(&self) -> Vec<&ResourceId> {
        match self {
            Self::Created(r) | Self::Updated(r) => vec![r.id()],
            Self::Deleted(id) => vec![id],
            Self::Refreshed(items) => items.iter().map(Resource::id).collect(),
        }
    }
}

/// Result of a confirmed-or-declined delete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// The server processed the delete. Carries the requested id even when
    /// the server reports that no record was removed.
    Deleted(ResourceId),
    /// The user declined the confirmation; no request was sent.
    Declined,
}

impl DeleteOutcome {
    /// Returns `true` if the user declined.
    #[must_use]
    pub fn is_declined(&self) -> bool {
        matches!(self, Self::Declined)
    }

    /// Returns the deleted id, if the request was sent.
    #[must_use]
    pub fn deleted_id(&self) -> Option<&ResourceId> {
        match self {
            Self::Deleted(id) => Some(id),
            Self::Declined => None,
        }
    }
}

/// Tuning for a [`ResourceService`].
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use zonesync_lib::service::ServiceOptions;
///
/// let options = ServiceOptions::new()
///     .with_confirm_display(Duration::from_secs(15))
///     .with_push_error_display(Duration::from_secs(5));
/// assert_eq!(options.confirm_display(), Some(Duration::from_secs(15)));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceOptions {
    confirm_display: Option<Duration>,
    notice_display: Duration,
    push_error_display: Duration,
}

impl ServiceOptions {
    /// Default display time for success and error notices.
    pub const DEFAULT_NOTICE_DISPLAY: Duration = Duration::from_secs(10);
    /// Default display time for errors pushed by the server.
    pub const DEFAULT_PUSH_ERROR_DISPLAY: Duration = Duration::from_secs(7);

    /// Creates options with default values.
    ///
    /// The delete prompt display time falls back to the resource's
    /// [`Resource::CONFIRM_DISPLAY`].
    #[must_use]
    pub fn new() -> Self {
        Self {
            confirm_display: None,
            notice_display: Self::DEFAULT_NOTICE_DISPLAY,
            push_error_display: Self::DEFAULT_PUSH_ERROR_DISPLAY,
        }
    }

    /// Overrides how long delete prompts stay visible.
    #[must_use]
    pub fn with_confirm_display(mut self, display: Duration) -> Self {
        self.confirm_display = Some(display);
        self
    }

    /// Sets how long notices stay visible.
    #[must_use]
    pub fn with_notice_display(mut self, display: Duration) -> Self {
        self.notice_display = display;
        self
    }

    /// Sets how long pushed errors stay visible.
    #[must_use]
    pub fn with_push_error_display(mut self, display: Duration) -> Self {
        self.push_error_display = display;
        self
    }

    /// Returns the delete prompt override, if any.
    #[must_use]
    pub fn confirm_display(&self) -> Option<Duration> {
        self.confirm_display
    }

    /// Returns the notice display time.
    #[must_use]
    pub fn notice_display(&self) -> Duration {
        self.notice_display
    }

    /// Returns the pushed error display time.
    #[must_use]
    pub fn push_error_display(&self) -> Duration {
        self.push_error_display
    }
}

impl Default for ServiceOptions {
    fn default() -> Self {
        Self::new()
    }
}
