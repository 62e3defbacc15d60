// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Generic resource service.

use std::future::Future;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use crate::error::{Error, Operation, ParseError, RemoteError, Result};
use crate::message::{Messenger, Notice};
use crate::protocol::{ApiClient, PushChannel};
use crate::resource::{Resource, ResourceId};
use crate::service::{DeleteOutcome, ResourceChange, ServiceOptions};
use crate::subscription::{ObserverRegistry, Subscribable, SubscriptionId};

/// Message shown when a request fails below the application layer.
const TRANSPORT_FAILURE_MESSAGE: &str = "An error occurred with the HTTP request.";

/// Key of the structured error carried in response bodies and push payloads.
const ERROR_KEY: &str = "Error";

/// State reachable from the push handler.
///
/// The handler registered on the channel only holds a [`Weak`] reference,
/// so a dropped service stops reacting to pushes even if the channel
/// outlives it.
struct Shared<R, M> {
    registry: ObserverRegistry<ResourceChange<R>>,
    messenger: Arc<M>,
    options: ServiceOptions,
}

impl<R: Resource, M: Messenger> Shared<R, M> {
    fn success(&self, text: String) {
        self.messenger
            .notify(Notice::success(text).with_display(self.options.notice_display()));
    }

    /// Reports a structured server error and converts it.
    fn remote_failure(&self, operation: Operation, detail: &Value) -> Error {
        let detail = detail.to_string();
        tracing::error!(
            resource = R::KIND,
            %operation,
            error = %detail,
            "Server rejected operation"
        );
        self.messenger.notify(
            Notice::error(format!("Error: {detail}")).with_display(self.options.notice_display()),
        );
        RemoteError {
            kind: R::KIND,
            operation,
            detail,
        }
        .into()
    }

    /// Reports a transport or decoding failure.
    fn request_failure(&self, operation: Operation, error: Error) -> Error {
        tracing::error!(
            resource = R::KIND,
            %operation,
            error = %error,
            "Request failed"
        );
        self.messenger.notify(
            Notice::error(TRANSPORT_FAILURE_MESSAGE).with_display(self.options.notice_display()),
        );
        error
    }

    fn handle_push(&self, payload: &Value) {
        if let Some(detail) = server_error(payload) {
            let error = RemoteError {
                kind: R::KIND,
                operation: Operation::Push,
                detail: detail.to_string(),
            };
            tracing::error!(resource = R::KIND, error = %error, "Server pushed an error");
            self.messenger.notify(
                Notice::error(format!("An error occurred: {}", error.detail))
                    .with_display(self.options.push_error_display()),
            );
            return;
        }

        let Some(items) = payload.get(R::COLLECTION_KEY) else {
            tracing::warn!(
                resource = R::KIND,
                key = R::COLLECTION_KEY,
                "Push payload without collection, ignoring"
            );
            return;
        };

        match serde_json::from_value::<Vec<R>>(items.clone()) {
            Ok(items) => {
                let count = items.len();
                let delivered = self.registry.notify(&ResourceChange::Refreshed(items));
                tracing::debug!(resource = R::KIND, count, delivered, "Applied pushed collection");
            }
            Err(e) => {
                tracing::warn!(resource = R::KIND, error = %e, "Undecodable push payload, ignoring");
            }
        }
    }
}

/// JavaScript-style truthiness, which is how the server signals flags.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Returns the structured error in a body, if it carries one.
fn server_error(body: &Value) -> Option<&Value> {
    body.get(ERROR_KEY).filter(|e| is_truthy(e))
}

/// Client-side coordinator for one resource type.
///
/// Wraps the REST endpoint of `R` and its push-channel read response.
/// Every successful mutation and every pushed collection is fanned out to
/// the subscribers of a single registry, so views see local and remote
/// changes the same way.
///
/// Failures are reported to the user once through the [`Messenger`], logged
/// with `tracing`, and returned to the caller.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use zonesync_lib::message::LogMessenger;
/// use zonesync_lib::protocol::{HttpConfig, LocalChannel};
/// use zonesync_lib::resource::Zone;
/// use zonesync_lib::service::{ResourceChange, ServiceOptions, ZoneService};
///
/// # async fn example() -> zonesync_lib::Result<()> {
/// let api = HttpConfig::parse("http://127.0.0.1:3000")?.into_client()?;
/// let zones: ZoneService<_, _> = ZoneService::new(
///     api,
///     Arc::new(LocalChannel::new()),
///     Arc::new(LogMessenger::approving()),
///     ServiceOptions::default(),
/// );
///
/// zones.subscribe(|change: &ResourceChange<Zone>| println!("{change:?}"));
/// zones.create(&Zone::new("North")).await?;
/// # Ok(())
/// # }
/// ```
pub struct ResourceService<R: Resource, C: PushChannel, M: Messenger> {
    api: ApiClient,
    channel: Arc<C>,
    shared: Arc<Shared<R, M>>,
    /// Handle of the registered push handler; the lock covers channel
    /// registration so attach and detach never interleave.
    push_handler: Mutex<Option<SubscriptionId>>,
}

impl<R: Resource, C: PushChannel, M: Messenger + 'static> ResourceService<R, C, M> {
    /// Creates a service and registers its push handler on `channel`.
    pub fn new(api: ApiClient, channel: Arc<C>, messenger: Arc<M>, options: ServiceOptions) -> Self {
        let service = Self {
            api,
            channel,
            shared: Arc::new(Shared {
                registry: ObserverRegistry::new(),
                messenger,
                options,
            }),
            push_handler: Mutex::new(None),
        };
        service.attach_push();
        service
    }

    fn attach_push(&self) {
        let mut handler = self.push_handler.lock();
        if handler.is_some() {
            return;
        }

        let shared: Weak<Shared<R, M>> = Arc::downgrade(&self.shared);
        let id = self.channel.on(
            R::READ_RESPONSE_EVENT,
            Arc::new(move |payload: &Value| {
                if let Some(shared) = shared.upgrade() {
                    shared.handle_push(payload);
                }
            }),
        );
        *handler = Some(id);
        tracing::debug!(resource = R::KIND, event = R::READ_RESPONSE_EVENT, "Push handler attached");
    }

    // ========================================================================
    // HTTP operations
    // ========================================================================

    /// Fetches the whole collection.
    ///
    /// Never notifies subscribers.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RemoteOperation`] if the server answers with an
    /// error body, [`Error::Transport`] or [`Error::Parse`] otherwise.
    pub async fn list(&self) -> Result<Vec<R>> {
        let body = self
            .request(Operation::List, self.api.get_json(R::ENDPOINT))
            .await?;
        self.decode(Operation::List, &body, R::COLLECTION_KEY)
    }

    /// Creates a resource and notifies subscribers with
    /// [`ResourceChange::Created`].
    ///
    /// Returns the resource as stored by the server.
    ///
    /// # Errors
    ///
    /// See [`list`](Self::list). Nothing is notified on failure.
    pub async fn create(&self, resource: &R) -> Result<R> {
        let body = self
            .request(Operation::Create, self.api.post_json(R::ENDPOINT, resource))
            .await?;
        let created: R = self.decode(Operation::Create, &body, R::ITEM_KEY)?;

        self.shared
            .success(format!("{} {} was created.", R::LABEL, created.name()));
        self.shared
            .registry
            .notify(&ResourceChange::Created(created.clone()));
        Ok(created)
    }

    /// Updates a resource and notifies subscribers with
    /// [`ResourceChange::Updated`].
    ///
    /// # Errors
    ///
    /// See [`list`](Self::list). Nothing is notified on failure.
    pub async fn update(&self, resource: &R) -> Result<R> {
        let body = self
            .request(Operation::Update, self.api.put_json(R::ENDPOINT, resource))
            .await?;
        let updated: R = self.decode(Operation::Update, &body, R::ITEM_KEY)?;

        self.shared
            .success(format!("{} {} was updated.", R::LABEL, updated.name()));
        self.shared
            .registry
            .notify(&ResourceChange::Updated(updated.clone()));
        Ok(updated)
    }

    /// Asks the user for confirmation, then deletes a resource.
    ///
    /// A declined prompt sends nothing and returns
    /// [`DeleteOutcome::Declined`]. Subscribers are notified with
    /// [`ResourceChange::Deleted`] only when the server reports at least one
    /// removed record; the id is returned for any successful response.
    ///
    /// The prompt has no timeout: this future stays pending until the user
    /// answers.
    ///
    /// # Errors
    ///
    /// See [`list`](Self::list).
    pub async fn delete(&self, id: &ResourceId) -> Result<DeleteOutcome> {
        let display = self
            .shared
            .options
            .confirm_display()
            .unwrap_or(R::CONFIRM_DISPLAY);
        let prompt = format!("Delete this {}?", R::KIND);

        if !self.shared.messenger.confirm(&prompt, display).await {
            tracing::debug!(resource = R::KIND, id = %id, "Delete declined");
            return Ok(DeleteOutcome::Declined);
        }

        let path = format!("{}/{}", R::ENDPOINT, urlencoding::encode(id.as_str()));
        let body = self
            .request(Operation::Delete, self.api.delete_json(&path))
            .await?;
        let result: Value = self.decode(Operation::Delete, &body, R::ITEM_KEY)?;

        let ok = result.get("ok").is_some_and(is_truthy);
        let removed = result.get("n").is_some_and(is_truthy);
        if ok && removed {
            self.shared.success(format!("The {} was deleted.", R::KIND));
            self.shared
                .registry
                .notify(&ResourceChange::Deleted(id.clone()));
        } else {
            tracing::warn!(resource = R::KIND, id = %id, result = %result, "Server removed no record");
        }

        Ok(DeleteOutcome::Deleted(id.clone()))
    }

    /// Awaits an API call and screens its body for a structured error.
    async fn request<F>(&self, operation: Operation, call: F) -> Result<Value>
    where
        F: Future<Output = Result<Value>>,
    {
        let body = call
            .await
            .map_err(|e| self.shared.request_failure(operation, e))?;

        if let Some(error) = server_error(&body) {
            return Err(self.shared.remote_failure(operation, error));
        }
        Ok(body)
    }

    fn decode<T: DeserializeOwned>(&self, operation: Operation, body: &Value, key: &str) -> Result<T> {
        body.get(key)
            .ok_or_else(|| ParseError::MissingField(key.to_string()))
            .and_then(|field| serde_json::from_value(field.clone()).map_err(ParseError::Json))
            .map_err(|e| self.shared.request_failure(operation, e.into()))
    }

    // ========================================================================
    // Push channel
    // ========================================================================

    /// Asks the server to broadcast the current collection to every client.
    ///
    /// The answer arrives as a push and is delivered as
    /// [`ResourceChange::Refreshed`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transport`] if the channel cannot send.
    pub async fn request_refresh(&self) -> Result<()> {
        self.send_message(R::READ_REQUEST_EVENT, json!({})).await
    }

    /// Sends an arbitrary event on the push channel.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transport`] if the channel cannot send.
    pub async fn send_message(&self, event: &str, payload: Value) -> Result<()> {
        self.channel.emit(event, payload).await.inspect_err(|e| {
            tracing::warn!(resource = R::KIND, event = %event, error = %e, "Failed to send push event");
        })
    }

    // ========================================================================
    // Subscriptions
    // ========================================================================

    /// Registers a change callback.
    ///
    /// Re-attaches the push handler if [`clear_listeners`](Self::clear_listeners)
    /// removed it.
    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&ResourceChange<R>) + Send + Sync + 'static,
    {
        self.attach_push();
        let id = self.shared.registry.subscribe(callback);
        tracing::debug!(resource = R::KIND, subscription = %id, "Subscribed");
        id
    }

    /// Removes a change callback. Returns `false` if it was already gone.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.shared.registry.unsubscribe(id)
    }

    /// Drops every subscriber and the push handler.
    ///
    /// Calling it again is a no-op. Only this service's own push handler
    /// is removed; other services listening on the same channel event keep
    /// receiving pushes.
    pub fn clear_listeners(&self) {
        let removed = self.shared.registry.unsubscribe_all();
        let detached = detach_push::<R, C>(&self.channel, &mut self.push_handler.lock());
        if removed > 0 || detached {
            tracing::debug!(resource = R::KIND, removed, detached, "Listeners cleared");
        }
    }

    /// Returns `true` while the push handler is registered.
    #[must_use]
    pub fn is_push_attached(&self) -> bool {
        self.push_handler.lock().is_some()
    }

    /// Returns the number of change callbacks.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.shared.registry.len()
    }
}

impl<R: Resource, C: PushChannel, M: Messenger + 'static> Subscribable for ResourceService<R, C, M> {
    type Payload = ResourceChange<R>;

    fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&ResourceChange<R>) + Send + Sync + 'static,
    {
        ResourceService::subscribe(self, callback)
    }

    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        ResourceService::unsubscribe(self, id)
    }
}

impl<R: Resource, C: PushChannel, M: Messenger> Drop for ResourceService<R, C, M> {
    fn drop(&mut self) {
        detach_push::<R, C>(&self.channel, self.push_handler.get_mut());
    }
}

/// Removes the registered push handler, if any. Returns `true` when one was
/// removed.
fn detach_push<R: Resource, C: PushChannel>(
    channel: &C,
    handler: &mut Option<SubscriptionId>,
) -> bool {
    match handler.take() {
        Some(id) => channel.off(R::READ_RESPONSE_EVENT, id),
        None => false,
    }
}

impl<R: Resource, C: PushChannel, M: Messenger + 'static> std::fmt::Debug for ResourceService<R, C, M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceService")
            .field("kind", &R::KIND)
            .field("base_url", &self.api.base_url())
            .field("subscribers", &self.shared.registry.len())
            .field("push_attached", &self.is_push_attached())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{ChannelMessenger, LogMessenger, NoticeLevel, UiMessage};
    use crate::protocol::{HttpConfig, LocalChannel};
    use crate::resource::{Device, Zone};
    use parking_lot::Mutex;
    use std::time::Duration;

    fn api() -> ApiClient {
        HttpConfig::new("127.0.0.1").into_client().unwrap()
    }

    fn zone_service(channel: &Arc<LocalChannel>) -> ResourceService<Zone, LocalChannel, LogMessenger> {
        ResourceService::new(
            api(),
            Arc::clone(channel),
            Arc::new(LogMessenger::approving()),
            ServiceOptions::default(),
        )
    }

    #[test]
    fn truthiness_follows_server_conventions() {
        assert!(!is_truthy(&json!(null)));
        assert!(!is_truthy(&json!(false)));
        assert!(!is_truthy(&json!(0)));
        assert!(!is_truthy(&json!("")));
        assert!(is_truthy(&json!(1)));
        assert!(is_truthy(&json!("db down")));
        assert!(is_truthy(&json!({ "code": 11000 })));
        assert!(is_truthy(&json!([])));
    }

    #[test]
    fn server_error_ignores_falsy_values() {
        assert!(server_error(&json!({ "Error": null, "Zones": [] })).is_none());
        assert!(server_error(&json!({ "Zones": [] })).is_none());
        assert_eq!(
            server_error(&json!({ "Error": "db down" })),
            Some(&json!("db down"))
        );
    }

    #[test]
    fn new_service_attaches_push_handler() {
        let channel = Arc::new(LocalChannel::new());
        let zones = zone_service(&channel);

        assert!(zones.is_push_attached());
        assert_eq!(channel.handler_count(Zone::READ_RESPONSE_EVENT), 1);
        assert_eq!(zones.subscriber_count(), 0);
    }

    #[test]
    fn pushed_collection_reaches_subscribers() {
        let channel = Arc::new(LocalChannel::new());
        let zones = zone_service(&channel);
        let seen = Arc::new(Mutex::new(Vec::new()));

        let seen_clone = Arc::clone(&seen);
        zones.subscribe(move |change| seen_clone.lock().push(change.clone()));

        channel.deliver(
            Zone::READ_RESPONSE_EVENT,
            &json!({ "Zones": [{ "_id": "z1", "Name": "North" }] }),
        );

        let seen = seen.lock();
        assert_eq!(seen.len(), 1);
        let ResourceChange::Refreshed(items) = &seen[0] else {
            panic!("expected a refresh");
        };
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name(), "North");
    }

    #[test]
    fn pushed_error_is_surfaced_without_notification() {
        let channel = Arc::new(LocalChannel::new());
        let (messenger, mut ui) = ChannelMessenger::new();
        let zones: ResourceService<Zone, _, _> = ResourceService::new(
            api(),
            Arc::clone(&channel),
            Arc::new(messenger),
            ServiceOptions::default(),
        );
        let calls = Arc::new(Mutex::new(0));
        let calls_clone = Arc::clone(&calls);
        zones.subscribe(move |_| *calls_clone.lock() += 1);

        channel.deliver(Zone::READ_RESPONSE_EVENT, &json!({ "Error": "db down" }));

        assert_eq!(*calls.lock(), 0);
        let Ok(UiMessage::Notice(notice)) = ui.try_recv() else {
            panic!("expected an error notice");
        };
        assert_eq!(notice.level, NoticeLevel::Error);
        assert_eq!(notice.text, r#"An error occurred: "db down""#);
        assert_eq!(notice.display, Duration::from_secs(7));
        assert!(ui.try_recv().is_err());
    }

    #[test]
    fn undecodable_push_is_dropped() {
        let channel = Arc::new(LocalChannel::new());
        let zones = zone_service(&channel);
        let calls = Arc::new(Mutex::new(0));
        let calls_clone = Arc::clone(&calls);
        zones.subscribe(move |_| *calls_clone.lock() += 1);

        channel.deliver(Zone::READ_RESPONSE_EVENT, &json!({ "Zones": "not a list" }));
        channel.deliver(Zone::READ_RESPONSE_EVENT, &json!({ "Other": [] }));

        assert_eq!(*calls.lock(), 0);
    }

    #[test]
    fn device_push_uses_device_event() {
        let channel = Arc::new(LocalChannel::new());
        let devices: ResourceService<Device, _, _> = ResourceService::new(
            api(),
            Arc::clone(&channel),
            Arc::new(LogMessenger::approving()),
            ServiceOptions::default(),
        );
        let calls = Arc::new(Mutex::new(0));
        let calls_clone = Arc::clone(&calls);
        devices.subscribe(move |_| *calls_clone.lock() += 1);

        channel.deliver(Zone::READ_RESPONSE_EVENT, &json!({ "Zones": [] }));
        channel.deliver(
            Device::READ_RESPONSE_EVENT,
            &json!({ "Devices": [{ "_id": "d1", "Name": "Sensor" }] }),
        );

        assert_eq!(*calls.lock(), 1);
    }

    #[test]
    fn clear_listeners_is_idempotent() {
        let channel = Arc::new(LocalChannel::new());
        let zones = zone_service(&channel);
        zones.subscribe(|_| {});
        zones.subscribe(|_| {});

        zones.clear_listeners();
        assert_eq!(zones.subscriber_count(), 0);
        assert!(!zones.is_push_attached());
        assert_eq!(channel.handler_count(Zone::READ_RESPONSE_EVENT), 0);

        zones.clear_listeners();
        assert_eq!(zones.subscriber_count(), 0);
        assert!(!zones.is_push_attached());
        assert_eq!(channel.handler_count(Zone::READ_RESPONSE_EVENT), 0);
        assert!(channel.emitted().is_empty());
        assert!(channel.is_connected());
    }

    #[test]
    fn subscribe_reattaches_push_after_clear() {
        let channel = Arc::new(LocalChannel::new());
        let zones = zone_service(&channel);
        zones.clear_listeners();

        let calls = Arc::new(Mutex::new(0));
        let calls_clone = Arc::clone(&calls);
        zones.subscribe(move |_| *calls_clone.lock() += 1);

        assert!(zones.is_push_attached());
        channel.deliver(Zone::READ_RESPONSE_EVENT, &json!({ "Zones": [] }));
        assert_eq!(*calls.lock(), 1);
    }

    #[test]
    fn dropping_service_detaches_push() {
        let channel = Arc::new(LocalChannel::new());
        let zones = zone_service(&channel);
        assert_eq!(channel.handler_count(Zone::READ_RESPONSE_EVENT), 1);

        drop(zones);
        assert_eq!(channel.handler_count(Zone::READ_RESPONSE_EVENT), 0);
    }

    #[test]
    fn clearing_one_service_keeps_other_listeners() {
        let channel = Arc::new(LocalChannel::new());
        let first = zone_service(&channel);
        let second = zone_service(&channel);
        assert_eq!(channel.handler_count(Zone::READ_RESPONSE_EVENT), 2);

        let calls = Arc::new(Mutex::new(0));
        let calls_clone = Arc::clone(&calls);
        second.subscribe(move |_| *calls_clone.lock() += 1);

        first.clear_listeners();
        assert_eq!(channel.handler_count(Zone::READ_RESPONSE_EVENT), 1);
        assert!(second.is_push_attached());

        channel.deliver(Zone::READ_RESPONSE_EVENT, &json!({ "Zones": [] }));
        assert_eq!(*calls.lock(), 1);
    }

    #[test]
    fn dropping_one_service_keeps_other_listeners() {
        let channel = Arc::new(LocalChannel::new());
        let first = zone_service(&channel);
        let second = zone_service(&channel);

        let calls = Arc::new(Mutex::new(0));
        let calls_clone = Arc::clone(&calls);
        second.subscribe(move |_| *calls_clone.lock() += 1);

        drop(first);
        assert_eq!(channel.handler_count(Zone::READ_RESPONSE_EVENT), 1);

        channel.deliver(Zone::READ_RESPONSE_EVENT, &json!({ "Zones": [] }));
        assert_eq!(*calls.lock(), 1);
    }

    /// Channel whose handler registration takes a while.
    struct SlowChannel {
        inner: LocalChannel,
        delay: Duration,
    }

    impl PushChannel for SlowChannel {
        fn on(&self, event: &str, handler: crate::protocol::EventHandler) -> SubscriptionId {
            std::thread::sleep(self.delay);
            self.inner.on(event, handler)
        }

        fn off(&self, event: &str, id: SubscriptionId) -> bool {
            self.inner.off(event, id)
        }

        fn clear(&self, event: &str) -> usize {
            self.inner.clear(event)
        }

        async fn emit(&self, event: &str, payload: Value) -> Result<()> {
            self.inner.emit(event, payload).await
        }

        async fn disconnect(&self) -> Result<()> {
            self.inner.disconnect().await
        }
    }

    #[test]
    fn clear_during_slow_attach_leaves_single_handler() {
        let channel = Arc::new(SlowChannel {
            inner: LocalChannel::new(),
            delay: Duration::from_millis(200),
        });
        let zones: ResourceService<Zone, _, _> = ResourceService::new(
            api(),
            Arc::clone(&channel),
            Arc::new(LogMessenger::approving()),
            ServiceOptions::default(),
        );
        zones.clear_listeners();

        let calls = Arc::new(Mutex::new(0));
        std::thread::scope(|scope| {
            scope.spawn(|| {
                zones.subscribe(|_| {});
            });

            // Lands while the other thread is still inside `on`
            std::thread::sleep(Duration::from_millis(50));
            zones.clear_listeners();
            let calls_clone = Arc::clone(&calls);
            zones.subscribe(move |_| *calls_clone.lock() += 1);
        });

        assert_eq!(channel.inner.handler_count(Zone::READ_RESPONSE_EVENT), 1);
        assert!(zones.is_push_attached());

        channel.inner.deliver(Zone::READ_RESPONSE_EVENT, &json!({ "Zones": [] }));
        assert_eq!(*calls.lock(), 1);

        zones.clear_listeners();
        assert_eq!(channel.inner.handler_count(Zone::READ_RESPONSE_EVENT), 0);
    }

    #[test]
    fn unsubscribe_unknown_id_is_noop() {
        let channel = Arc::new(LocalChannel::new());
        let zones = zone_service(&channel);
        let id = zones.subscribe(|_| {});

        assert!(zones.unsubscribe(id));
        assert!(!zones.unsubscribe(id));
    }

    #[tokio::test]
    async fn request_refresh_emits_read_request() {
        let channel = Arc::new(LocalChannel::new());
        let zones = zone_service(&channel);

        zones.request_refresh().await.unwrap();

        let emitted = channel.emitted();
        assert_eq!(emitted.len(), 1);
        assert_eq!(emitted[0].event, "Zones/Zone/Read/Request");
        assert_eq!(emitted[0].payload, json!({}));
    }

    #[tokio::test]
    async fn send_message_fails_on_closed_channel() {
        let channel = Arc::new(LocalChannel::new());
        let zones = zone_service(&channel);
        channel.disconnect().await.unwrap();

        let result = zones.send_message("Devices/Device/Command", json!({ "On": true })).await;
        assert!(result.unwrap_err().is_transport());
    }

    #[tokio::test]
    async fn declined_delete_sends_nothing() {
        let channel = Arc::new(LocalChannel::new());
        let zones: ResourceService<Zone, _, _> = ResourceService::new(
            // Nothing listens here; a request would fail with a transport error
            HttpConfig::new("127.0.0.1").with_port(9).into_client().unwrap(),
            Arc::clone(&channel),
            Arc::new(LogMessenger::declining()),
            ServiceOptions::default(),
        );

        let outcome = zones.delete(&ResourceId::new("z1")).await.unwrap();
        assert_eq!(outcome, DeleteOutcome::Declined);
    }
}
