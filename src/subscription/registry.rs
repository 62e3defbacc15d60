// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Observer registry for resource change subscriptions.
//!
//! This module provides the core types for managing subscription callbacks:
//!
//! - [`SubscriptionId`] - Unique identifier for unsubscribing
//! - [`ObserverRegistry`] - Registry for storing and dispatching callbacks

use std::collections::BTreeMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;

/// Unique identifier for a subscription.
///
/// This ID is returned when creating a subscription and can be used to
/// unsubscribe later. IDs are unique within a registry's lifetime and
/// increase monotonically, so they also encode registration order.
///
/// # Examples
///
/// ```
/// use zonesync_lib::subscription::ObserverRegistry;
///
/// let registry = ObserverRegistry::<u32>::new();
/// let sub_id = registry.subscribe(|value| println!("got {value}"));
///
/// // Later, unsubscribe
/// assert!(registry.unsubscribe(sub_id));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    /// Creates a new subscription ID with the given value.
    #[must_use]
    pub(crate) fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw ID value.
    #[must_use]
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Sub({})", self.0)
    }
}

/// Type alias for registered callbacks.
type Callback<T> = Arc<dyn Fn(&T) + Send + Sync>;

/// Registry mapping subscription handles to callbacks.
///
/// One registry exists per resource type and service instance. It outlives
/// many generations of subscribers, so removal must be exact: every handle
/// is released once and nothing accumulates.
///
/// # Delivery semantics
///
/// [`notify`](Self::notify) takes a snapshot of the registered callbacks and
/// releases the lock before invoking them, in registration order:
///
/// - callbacks registered during a notification are not called by it
/// - callbacks removed during a notification (including by
///   [`unsubscribe_all`](Self::unsubscribe_all)) are skipped from then on
/// - a panicking callback is logged and does not stop delivery to the rest
///
/// Callbacks may therefore call back into the registry without deadlocking.
///
/// # Thread Safety
///
/// The registry uses `parking_lot::RwLock` and can be shared between tasks.
pub struct ObserverRegistry<T> {
    /// Counter for generating unique subscription IDs.
    next_id: AtomicU64,
    /// Registered callbacks, ordered by subscription ID.
    callbacks: RwLock<BTreeMap<SubscriptionId, Callback<T>>>,
}

impl<T> ObserverRegistry<T> {
    /// Creates a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            callbacks: RwLock::new(BTreeMap::new()),
        }
    }

    fn next_id(&self) -> SubscriptionId {
        SubscriptionId::new(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Registers a callback.
    ///
    /// The callback is eligible for the next [`notify`](Self::notify) call
    /// as soon as this returns.
    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let id = self.next_id();
        self.callbacks.write().insert(id, Arc::new(callback));
        tracing::trace!(subscription = %id, "Subscriber registered");
        id
    }

    /// Unregisters a callback by its subscription ID.
    ///
    /// Returns `true` if a callback was found and removed. Unknown or
    /// already removed IDs are ignored.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let removed = self.callbacks.write().remove(&id).is_some();
        if removed {
            tracing::trace!(subscription = %id, "Subscriber removed");
        }
        removed
    }

    /// Removes every registered callback.
    ///
    /// Returns the number of callbacks removed.
    pub fn unsubscribe_all(&self) -> usize {
        let mut callbacks = self.callbacks.write();
        let count = callbacks.len();
        callbacks.clear();
        count
    }

    /// Invokes every currently registered callback with `payload`.
    ///
    /// Returns the number of callbacks that ran to completion.
    pub fn notify(&self, payload: &T) -> usize {
        let snapshot: Vec<(SubscriptionId, Callback<T>)> = self
            .callbacks
            .read()
            .iter()
            .map(|(id, callback)| (*id, Arc::clone(callback)))
            .collect();

        let mut delivered = 0;
        for (id, callback) in snapshot {
            // Skip subscribers removed by an earlier callback of this round
            if !self.callbacks.read().contains_key(&id) {
                continue;
            }

            match panic::catch_unwind(AssertUnwindSafe(|| callback(payload))) {
                Ok(()) => delivered += 1,
                Err(_) => {
                    tracing::error!(subscription = %id, "Subscriber callback panicked");
                }
            }
        }
        delivered
    }

    /// Returns the number of registered callbacks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.callbacks.read().len()
    }

    /// Returns `true` if there are no registered callbacks.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.callbacks.read().is_empty()
    }

    /// Returns `true` if the given subscription is still registered.
    #[must_use]
    pub fn contains(&self, id: SubscriptionId) -> bool {
        self.callbacks.read().contains_key(&id)
    }
}

impl<T> Default for ObserverRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for ObserverRegistry<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObserverRegistry")
            .field("callback_count", &self.len())
            .finish()
    }
}
