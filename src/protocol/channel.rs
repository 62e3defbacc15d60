// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Push channel abstraction and in-process implementation.
//!
//! A push channel is a persistent connection to the server carrying named
//! events with JSON payloads. Services register handlers for the events they
//! care about and emit requests on it.
//!
//! ```text
//! Server push: Zones/Zone/Read/Response → { "Zones": [...] }
//!                     ↓
//!          ChannelHandlers.dispatch()
//!                     ↓
//!     handlers registered for the event name
//!                     ↓
//!         ZoneService registry.notify()
//! ```

use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use parking_lot::{Mutex, RwLock};
use serde_json::Value;

use crate::error::{Result, TransportError};
use crate::subscription::SubscriptionId;

/// Handler invoked with the payload of an incoming event.
pub type EventHandler = Arc<dyn Fn(&Value) + Send + Sync>;

/// Client side of a persistent server connection.
#[allow(async_fn_in_trait)]
pub trait PushChannel: Send + Sync {
    /// Registers a handler for an event name.
    ///
    /// Returns a handle for removing this handler alone with
    /// [`off`](Self::off).
    fn on(&self, event: &str, handler: EventHandler) -> SubscriptionId;

    /// Removes one handler. Returns `false` if it was already gone.
    fn off(&self, event: &str, id: SubscriptionId) -> bool;

    /// Removes every handler registered for an event name.
    ///
    /// Returns the number of handlers removed.
    fn clear(&self, event: &str) -> usize;

    /// Sends an event to the server.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] if the channel is closed or the send fails.
    async fn emit(&self, event: &str, payload: Value) -> Result<()>;

    /// Closes the connection and drops all handlers.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] if the underlying client fails to disconnect.
    async fn disconnect(&self) -> Result<()>;
}

// ============================================================================
// ChannelHandlers
// ============================================================================

/// Table of event handlers shared by push channel implementations.
///
/// Dispatch follows the same rules as
/// [`ObserverRegistry::notify`](crate::subscription::ObserverRegistry::notify):
/// the handler list is snapshotted before invocation and a panicking handler
/// does not prevent delivery to the others.
pub struct ChannelHandlers {
    next_id: AtomicU64,
    handlers: RwLock<HashMap<String, Vec<(SubscriptionId, EventHandler)>>>,
}

impl ChannelHandlers {
    /// Creates an empty handler table.
    #[must_use]
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            handlers: RwLock::new(HashMap::new()),
        }
    }

    /// Adds a handler.
    ///
    /// Returns the handler's id and `true` if it is the first handler for
    /// the event.
    pub fn add(&self, event: &str, handler: EventHandler) -> (SubscriptionId, bool) {
        let id = SubscriptionId::new(self.next_id.fetch_add(1, Ordering::Relaxed));
        let mut handlers = self.handlers.write();
        let entry = handlers.entry(event.to_string()).or_default();
        entry.push((id, handler));
        (id, entry.len() == 1)
    }

    /// Removes one handler.
    ///
    /// Returns the number of handlers left for the event, or `None` if `id`
    /// was not registered.
    pub fn remove_one(&self, event: &str, id: SubscriptionId) -> Option<usize> {
        let mut handlers = self.handlers.write();
        let list = handlers.get_mut(event)?;
        let position = list.iter().position(|(handler_id, _)| *handler_id == id)?;
        list.remove(position);
        let left = list.len();
        if left == 0 {
            handlers.remove(event);
        }
        Some(left)
    }

    /// Removes all handlers for an event.
    pub fn remove(&self, event: &str) -> usize {
        self.handlers.write().remove(event).map_or(0, |list| list.len())
    }

    /// Removes all handlers for all events.
    pub fn remove_all(&self) -> usize {
        let mut handlers = self.handlers.write();
        let count = handlers.values().map(Vec::len).sum();
        handlers.clear();
        count
    }

    /// Invokes the handlers registered for `event`.
    ///
    /// Returns the number of handlers that completed normally.
    pub fn dispatch(&self, event: &str, payload: &Value) -> usize {
        let snapshot: Vec<EventHandler> = match self.handlers.read().get(event) {
            Some(list) => list.iter().map(|(_, handler)| Arc::clone(handler)).collect(),
            None => {
                tracing::trace!(event = %event, "No handler for event");
                return 0;
            }
        };

        let mut delivered = 0;
        for handler in snapshot {
            match panic::catch_unwind(AssertUnwindSafe(|| handler(payload))) {
                Ok(()) => delivered += 1,
                Err(_) => tracing::error!(event = %event, "Event handler panicked"),
            }
        }
        delivered
    }

    /// Returns the number of handlers for an event.
    #[must_use]
    pub fn handler_count(&self, event: &str) -> usize {
        self.handlers.read().get(event).map_or(0, Vec::len)
    }

    /// Returns the event names that currently have handlers.
    #[must_use]
    pub fn events(&self) -> Vec<String> {
        let mut events: Vec<String> = self.handlers.read().keys().cloned().collect();
        events.sort();
        events
    }
}

impl Default for ChannelHandlers {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ChannelHandlers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChannelHandlers")
            .field("events", &self.events())
            .finish()
    }
}

// ============================================================================
// LocalChannel
// ============================================================================

/// An event sent through a [`LocalChannel`].
#[derive(Debug, Clone, PartialEq)]
pub struct EmittedEvent {
    /// Event name.
    pub event: String,
    /// JSON payload.
    pub payload: Value,
}

/// In-process push channel.
///
/// Outgoing events are recorded instead of sent; incoming events are
/// injected with [`deliver`](Self::deliver). Useful for embedding the
/// services without a broker and for tests.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use serde_json::json;
/// use zonesync_lib::protocol::{LocalChannel, PushChannel};
///
/// let channel = LocalChannel::new();
/// channel.on("Zones/Zone/Read/Response", Arc::new(|payload| {
///     println!("zones: {payload}");
/// }));
///
/// assert_eq!(channel.deliver("Zones/Zone/Read/Response", &json!({ "Zones": [] })), 1);
/// ```
#[derive(Debug, Default)]
pub struct LocalChannel {
    handlers: ChannelHandlers,
    emitted: Mutex<Vec<EmittedEvent>>,
    closed: AtomicBool,
}

impl LocalChannel {
    /// Creates an open channel with no handlers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulates an event pushed by the server.
    ///
    /// Returns the number of handlers that ran. Nothing is delivered once
    /// the channel is disconnected.
    pub fn deliver(&self, event: &str, payload: &Value) -> usize {
        if self.closed.load(Ordering::SeqCst) {
            tracing::debug!(event = %event, "Dropping event on closed channel");
            return 0;
        }
        self.handlers.dispatch(event, payload)
    }

    /// Returns every event emitted so far, oldest first.
    #[must_use]
    pub fn emitted(&self) -> Vec<EmittedEvent> {
        self.emitted.lock().clone()
    }

    /// Returns the number of handlers registered for an event.
    #[must_use]
    pub fn handler_count(&self, event: &str) -> usize {
        self.handlers.handler_count(event)
    }

    /// Returns `true` until [`disconnect`](PushChannel::disconnect) is called.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        !self.closed.load(Ordering::SeqCst)
    }
}

impl PushChannel for LocalChannel {
    fn on(&self, event: &str, handler: EventHandler) -> SubscriptionId {
        tracing::debug!(event = %event, "Registering local channel handler");
        self.handlers.add(event, handler).0
    }

    fn off(&self, event: &str, id: SubscriptionId) -> bool {
        self.handlers.remove_one(event, id).is_some()
    }

    fn clear(&self, event: &str) -> usize {
        self.handlers.remove(event)
    }

    async fn emit(&self, event: &str, payload: Value) -> Result<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(TransportError::ChannelClosed(format!("cannot emit {event}")).into());
        }
        tracing::debug!(event = %event, payload = %payload, "Emitting local event");
        self.emitted.lock().push(EmittedEvent {
            event: event.to_string(),
            payload,
        });
        Ok(())
    }

    async fn disconnect(&self) -> Result<()> {
        if !self.closed.swap(true, Ordering::SeqCst) {
            let dropped = self.handlers.remove_all();
            tracing::debug!(dropped, "Local channel disconnected");
        }
        Ok(())
    }
}
