// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! RAII guard for a view's subscriptions.

use std::sync::{Arc, Weak};

use crate::message::Messenger;
use crate::protocol::PushChannel;
use crate::resource::Resource;
use crate::service::ResourceService;
use crate::subscription::{Subscribable, SubscriptionId};

type Release = Box<dyn FnOnce() + Send>;

/// Owns the subscriptions a view made.
///
/// Every handle registered through the scope is released exactly once, on
/// [`close`](Self::close) or when the scope is dropped, whichever comes
/// first. Dropping covers early returns, `?` propagation and unwinding.
///
/// The scope holds weak references, so it never keeps a service alive.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use zonesync_lib::session::ViewScope;
/// use zonesync_lib::subscription::{ObserverRegistry, Subscribable, SubscriptionId};
///
/// struct Counter(ObserverRegistry<u32>);
///
/// impl Subscribable for Counter {
///     type Payload = u32;
///     fn subscribe<F>(&self, callback: F) -> SubscriptionId
///     where
///         F: Fn(&u32) + Send + Sync + 'static,
///     {
///         self.0.subscribe(callback)
///     }
///     fn unsubscribe(&self, id: SubscriptionId) -> bool {
///         self.0.unsubscribe(id)
///     }
/// }
///
/// let counter = Arc::new(Counter(ObserverRegistry::new()));
/// {
///     let mut scope = ViewScope::new();
///     scope.watch(&counter, |value| println!("{value}"));
///     assert_eq!(counter.0.len(), 1);
/// }
/// assert!(counter.0.is_empty());
/// ```
#[derive(Default)]
pub struct ViewScope {
    releases: Vec<Release>,
}

impl ViewScope {
    /// Creates an empty scope.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribes to `source` for the lifetime of this scope.
    pub fn watch<S, F>(&mut self, source: &Arc<S>, callback: F) -> SubscriptionId
    where
        S: Subscribable + Send + Sync + 'static,
        F: Fn(&S::Payload) + Send + Sync + 'static,
    {
        let id = source.subscribe(callback);
        let source: Weak<S> = Arc::downgrade(source);
        self.releases.push(Box::new(move || {
            if let Some(source) = source.upgrade() {
                source.unsubscribe(id);
            }
        }));
        id
    }

    /// Makes this scope the exclusive owner of `service`'s listeners.
    ///
    /// On close the service drops every subscriber and its push handler,
    /// not only the ones registered through this scope.
    pub fn exclusive<R, C, M>(&mut self, service: &Arc<ResourceService<R, C, M>>)
    where
        R: Resource,
        C: PushChannel + 'static,
        M: Messenger + 'static,
    {
        let service = Arc::downgrade(service);
        self.releases.push(Box::new(move || {
            if let Some(service) = service.upgrade() {
                service.clear_listeners();
            }
        }));
    }

    /// Releases everything held by the scope.
    ///
    /// Returns the number of releases performed; `0` on later calls.
    pub fn close(&mut self) -> usize {
        let releases = std::mem::take(&mut self.releases);
        let count = releases.len();
        for release in releases {
            release();
        }
        if count > 0 {
            tracing::debug!(released = count, "View scope closed");
        }
        count
    }

    /// Returns the number of pending releases.
    #[must_use]
    pub fn len(&self) -> usize {
        self.releases.len()
    }

    /// Returns `true` if the scope holds nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.releases.is_empty()
    }
}

impl Drop for ViewScope {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for ViewScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ViewScope")
            .field("pending", &self.releases.len())
            .finish()
    }
}
