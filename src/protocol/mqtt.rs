// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! MQTT-backed push channel.
//!
//! Event names map one-to-one to MQTT topics (`Zones/Zone/Read/Response`)
//! and payloads are JSON documents.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use rumqttc::{AsyncClient, EventLoop, MqttOptions, QoS};
use serde_json::Value;

use crate::error::{ParseError, Result, TransportError};
use crate::protocol::channel::{ChannelHandlers, EventHandler, PushChannel};
use crate::subscription::SubscriptionId;

/// Global counter for generating unique client IDs.
static CLIENT_ID_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Default MQTT port.
const DEFAULT_MQTT_PORT: u16 = 1883;

/// Default keep-alive interval.
const DEFAULT_KEEP_ALIVE: Duration = Duration::from_secs(30);

/// Push channel over an MQTT broker.
///
/// The first handler registered for an event subscribes to its topic;
/// clearing the event unsubscribes. A background task polls the event loop
/// and routes incoming publishes to the registered handlers.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use zonesync_lib::protocol::{MqttChannel, PushChannel};
///
/// # async fn example() -> zonesync_lib::Result<()> {
/// let channel = MqttChannel::connect("mqtt://192.168.1.50:1883").await?;
/// channel.on("Zones/Zone/Read/Response", Arc::new(|payload| {
///     println!("zones: {payload}");
/// }));
/// channel.emit("Zones/Zone/Read/Request", serde_json::json!({})).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct MqttChannel {
    client: AsyncClient,
    handlers: Arc<ChannelHandlers>,
    connected: Arc<AtomicBool>,
}

impl MqttChannel {
    /// Connects to an MQTT broker with default options.
    ///
    /// # Arguments
    ///
    /// * `broker_url` - The MQTT broker URL (e.g., `mqtt://192.168.1.50:1883`)
    ///
    /// # Errors
    ///
    /// Returns error if the URL is invalid.
    pub async fn connect(broker_url: impl Into<String>) -> Result<Self> {
        MqttChannelBuilder::new().broker(broker_url).build().await
    }

    /// Returns `true` while the event loop is running.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Returns the number of handlers registered for an event.
    #[must_use]
    pub fn handler_count(&self, event: &str) -> usize {
        self.handlers.handler_count(event)
    }

    fn unsubscribe_topic(&self, topic: &str) {
        tracing::debug!(topic = %topic, "Unsubscribing from push topic");
        if let Err(e) = self.client.try_unsubscribe(topic) {
            tracing::warn!(topic = %topic, error = %e, "Failed to unsubscribe from push topic");
        }
    }
}

impl PushChannel for MqttChannel {
    fn on(&self, event: &str, handler: EventHandler) -> SubscriptionId {
        let (id, first) = self.handlers.add(event, handler);
        if first {
            tracing::debug!(topic = %event, "Subscribing to push topic");
            if let Err(e) = self.client.try_subscribe(event, QoS::AtLeastOnce) {
                tracing::warn!(topic = %event, error = %e, "Failed to subscribe to push topic");
            }
        }
        id
    }

    fn off(&self, event: &str, id: SubscriptionId) -> bool {
        match self.handlers.remove_one(event, id) {
            Some(0) => {
                self.unsubscribe_topic(event);
                true
            }
            Some(_) => true,
            None => false,
        }
    }

    fn clear(&self, event: &str) -> usize {
        let removed = self.handlers.remove(event);
        if removed > 0 {
            self.unsubscribe_topic(event);
        }
        removed
    }

    async fn emit(&self, event: &str, payload: Value) -> Result<()> {
        if !self.is_connected() {
            return Err(TransportError::ChannelClosed(format!("cannot emit {event}")).into());
        }

        let bytes = serde_json::to_vec(&payload).map_err(ParseError::Json)?;

        tracing::debug!(topic = %event, payload = %payload, "Publishing push event");

        self.client
            .publish(event, QoS::AtLeastOnce, false, bytes)
            .await
            .map_err(TransportError::Mqtt)?;
        Ok(())
    }

    async fn disconnect(&self) -> Result<()> {
        if !self.connected.swap(false, Ordering::SeqCst) {
            return Ok(());
        }
        self.handlers.remove_all();
        self.client
            .disconnect()
            .await
            .map_err(TransportError::Mqtt)?;
        tracing::debug!("MQTT push channel disconnected");
        Ok(())
    }
}

/// Parses an MQTT URL into host and port.
fn parse_mqtt_url(url: &str) -> std::result::Result<(String, u16), TransportError> {
    let url = url
        .strip_prefix("mqtt://")
        .or_else(|| url.strip_prefix("tcp://"))
        .unwrap_or(url);

    let (host, port) = if let Some((h, p)) = url.rsplit_once(':') {
        let port = p
            .parse()
            .map_err(|_| TransportError::InvalidAddress(format!("Invalid port: {p}")))?;
        (h.to_string(), port)
    } else {
        (url.to_string(), DEFAULT_MQTT_PORT)
    };

    if host.is_empty() {
        return Err(TransportError::InvalidAddress("broker host is empty".to_string()));
    }

    Ok((host, port))
}

/// Polls the MQTT event loop and routes publishes to handlers.
async fn handle_mqtt_events(
    mut event_loop: EventLoop,
    handlers: Arc<ChannelHandlers>,
    connected: Arc<AtomicBool>,
) {
    use rumqttc::{Event, Packet};

    loop {
        match event_loop.poll().await {
            Ok(Event::Incoming(Packet::ConnAck(connack))) => {
                tracing::debug!(?connack, "MQTT push channel connected");
            }
            Ok(Event::Incoming(Packet::SubAck(suback))) => {
                tracing::debug!(?suback, "MQTT subscription acknowledged");
            }
            Ok(Event::Incoming(Packet::Publish(publish))) => {
                let topic = String::from_utf8_lossy(AsRef::<[u8]>::as_ref(&publish.topic));
                match serde_json::from_slice::<Value>(&publish.payload) {
                    Ok(payload) => {
                        let delivered = handlers.dispatch(&topic, &payload);
                        tracing::trace!(topic = %topic, delivered, "Routed push event");
                    }
                    Err(e) => {
                        tracing::warn!(
                            topic = %topic,
                            error = %e,
                            "Ignoring push event with non-JSON payload"
                        );
                    }
                }
            }
            Ok(_) => {}
            Err(e) => {
                if connected.swap(false, Ordering::SeqCst) {
                    tracing::error!(error = %e, "MQTT event loop error");
                }
                break;
            }
        }
    }
}

/// Builder for an [`MqttChannel`] with custom options.
#[derive(Debug, Default)]
pub struct MqttChannelBuilder {
    broker: Option<String>,
    username: Option<String>,
    password: Option<String>,
    client_id: Option<String>,
    keep_alive: Option<Duration>,
}

impl MqttChannelBuilder {
    /// Creates a new builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the MQTT broker URL.
    #[must_use]
    pub fn broker(mut self, broker: impl Into<String>) -> Self {
        self.broker = Some(broker.into());
        self
    }

    /// Sets authentication credentials for the MQTT broker.
    #[must_use]
    pub fn credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// Sets a custom client ID.
    #[must_use]
    pub fn client_id(mut self, id: impl Into<String>) -> Self {
        self.client_id = Some(id.into());
        self
    }

    /// Sets the keep-alive interval.
    #[must_use]
    pub fn keep_alive(mut self, duration: Duration) -> Self {
        self.keep_alive = Some(duration);
        self
    }

    /// Builds the channel and starts its event loop.
    ///
    /// # Errors
    ///
    /// Returns error if the broker is missing or its URL is invalid.
    pub async fn build(self) -> Result<MqttChannel> {
        let broker = self
            .broker
            .ok_or_else(|| TransportError::InvalidAddress("broker is required".to_string()))?;

        let (host, port) = parse_mqtt_url(&broker)?;

        let client_id = self.client_id.unwrap_or_else(|| {
            let counter = CLIENT_ID_COUNTER.fetch_add(1, Ordering::Relaxed);
            format!("zonesync_{}_{}", std::process::id(), counter)
        });

        let mut mqtt_options = MqttOptions::new(&client_id, host, port);
        mqtt_options.set_keep_alive(self.keep_alive.unwrap_or(DEFAULT_KEEP_ALIVE));
        mqtt_options.set_clean_session(true);

        if let (Some(username), Some(password)) = (self.username, self.password) {
            mqtt_options.set_credentials(username, password);
        }

        let (client, event_loop) = AsyncClient::new(mqtt_options, 10);

        let handlers = Arc::new(ChannelHandlers::new());
        let connected = Arc::new(AtomicBool::new(true));

        let loop_handlers = Arc::clone(&handlers);
        let loop_connected = Arc::clone(&connected);
        tokio::spawn(async move {
            handle_mqtt_events(event_loop, loop_handlers, loop_connected).await;
        });

        // Let the broker process CONNECT before the first subscription
        tokio::time::sleep(Duration::from_millis(200)).await;

        Ok(MqttChannel {
            client,
            handlers,
            connected,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_mqtt_url_with_port() {
        let (host, port) = parse_mqtt_url("mqtt://192.168.1.50:1883").unwrap();
        assert_eq!(host, "192.168.1.50");
        assert_eq!(port, 1883);
    }

    #[test]
    fn parse_mqtt_url_default_port() {
        let (host, port) = parse_mqtt_url("192.168.1.50").unwrap();
        assert_eq!(host, "192.168.1.50");
        assert_eq!(port, 1883);
    }

    #[test]
    fn parse_mqtt_url_tcp_scheme() {
        let (host, port) = parse_mqtt_url("tcp://broker.local:8883").unwrap();
        assert_eq!(host, "broker.local");
        assert_eq!(port, 8883);
    }

    #[test]
    fn parse_mqtt_url_rejects_bad_input() {
        assert!(parse_mqtt_url("mqtt://broker:port").is_err());
        assert!(parse_mqtt_url("mqtt://").is_err());
    }

    #[test]
    fn builder_collects_options() {
        let builder = MqttChannelBuilder::new()
            .broker("mqtt://broker:1883")
            .credentials("user", "pass")
            .client_id("admin_ui")
            .keep_alive(Duration::from_secs(60));

        assert_eq!(builder.broker, Some("mqtt://broker:1883".to_string()));
        assert_eq!(builder.username, Some("user".to_string()));
        assert_eq!(builder.password, Some("pass".to_string()));
        assert_eq!(builder.client_id, Some("admin_ui".to_string()));
        assert_eq!(builder.keep_alive, Some(Duration::from_secs(60)));
    }

    #[tokio::test]
    async fn builder_requires_broker() {
        let result = MqttChannelBuilder::new().build().await;
        assert!(result.is_err());
    }
}
