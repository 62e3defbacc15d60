// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Subscribable trait for sources of change notifications.

use crate::subscription::SubscriptionId;

/// Trait for types that fan out change notifications to subscribers.
///
/// Implemented by the resource services. View scopes rely only on this
/// trait, so anything that owns an [`ObserverRegistry`](super::ObserverRegistry)
/// can be watched the same way.
///
/// # Examples
///
/// ```no_run
/// use zonesync_lib::subscription::Subscribable;
///
/// fn watch<S: Subscribable<Payload = u32>>(source: &S) {
///     let sub_id = source.subscribe(|value| println!("changed: {value}"));
///
///     // Unsubscribe when no longer needed
///     source.unsubscribe(sub_id);
/// }
/// ```
pub trait Subscribable {
    /// Value passed to subscribers on each notification.
    type Payload;

    /// Registers a callback for change notifications.
    fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&Self::Payload) + Send + Sync + 'static;

    /// Unsubscribes a callback by its subscription ID.
    ///
    /// Returns `true` if the subscription was found and removed.
    fn unsubscribe(&self, id: SubscriptionId) -> bool;
}
