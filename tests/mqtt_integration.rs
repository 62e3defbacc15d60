// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Integration tests for the MQTT push channel using mockforge-mqtt.

#![cfg(feature = "mqtt")]

use std::sync::Arc;
use std::time::Duration;

use mockforge_mqtt::broker::MqttConfig;
use mockforge_mqtt::start_mqtt_server;
use serde_json::json;
use tokio::time::sleep;
use zonesync_lib::app::AppContext;
use zonesync_lib::message::LogMessenger;
use zonesync_lib::protocol::{MqttChannel, MqttChannelBuilder, PushChannel};
use zonesync_lib::resource::{Resource, Zone};

/// Helper to find an available port for testing.
fn get_test_port() -> u16 {
    use std::sync::atomic::{AtomicU16, Ordering};
    static PORT_COUNTER: AtomicU16 = AtomicU16::new(18950);
    PORT_COUNTER.fetch_add(1, Ordering::SeqCst)
}

/// Starts a mock MQTT broker on the given port.
async fn start_mock_broker(port: u16) {
    let config = MqttConfig {
        port,
        host: "127.0.0.1".to_string(),
        ..Default::default()
    };

    tokio::spawn(async move {
        let _ = start_mqtt_server(config).await;
    });

    // Give the broker time to bind before clients connect
    sleep(Duration::from_millis(500)).await;
}

// ============================================================================
// Connection
// ============================================================================

mod connection {
    use super::*;

    #[tokio::test]
    async fn connect_to_broker() {
        let port = get_test_port();
        start_mock_broker(port).await;

        let result = MqttChannel::connect(format!("mqtt://127.0.0.1:{port}")).await;

        assert!(result.is_ok(), "Failed to connect: {:?}", result.err());
        assert!(result.unwrap().is_connected());
    }

    #[tokio::test]
    async fn connect_with_tcp_scheme() {
        let port = get_test_port();
        start_mock_broker(port).await;

        let result = MqttChannel::connect(format!("tcp://127.0.0.1:{port}")).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn connect_with_builder_options() {
        let port = get_test_port();
        start_mock_broker(port).await;

        let result = MqttChannelBuilder::new()
            .broker(format!("127.0.0.1:{port}"))
            .client_id("zonesync_admin")
            .keep_alive(Duration::from_secs(10))
            .build()
            .await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn invalid_broker_url_fails() {
        let result = MqttChannel::connect("mqtt://127.0.0.1:not-a-port").await;
        assert!(result.unwrap_err().is_transport());
    }
}

// ============================================================================
// Channel operations
// ============================================================================

mod channel {
    use super::*;

    #[tokio::test]
    async fn handlers_are_tracked_per_event() {
        let port = get_test_port();
        start_mock_broker(port).await;
        let channel = MqttChannel::connect(format!("mqtt://127.0.0.1:{port}"))
            .await
            .unwrap();

        let first = channel.on(Zone::READ_RESPONSE_EVENT, Arc::new(|_| {}));
        channel.on(Zone::READ_RESPONSE_EVENT, Arc::new(|_| {}));
        channel.on(Zone::READ_RESPONSE_EVENT, Arc::new(|_| {}));
        assert_eq!(channel.handler_count(Zone::READ_RESPONSE_EVENT), 3);

        assert!(channel.off(Zone::READ_RESPONSE_EVENT, first));
        assert!(!channel.off(Zone::READ_RESPONSE_EVENT, first));
        assert_eq!(channel.handler_count(Zone::READ_RESPONSE_EVENT), 2);

        assert_eq!(channel.clear(Zone::READ_RESPONSE_EVENT), 2);
        assert_eq!(channel.clear(Zone::READ_RESPONSE_EVENT), 0);
    }

    #[tokio::test]
    async fn emit_publishes_while_connected() {
        let port = get_test_port();
        start_mock_broker(port).await;
        let channel = MqttChannel::connect(format!("mqtt://127.0.0.1:{port}"))
            .await
            .unwrap();

        let result = channel.emit(Zone::READ_REQUEST_EVENT, json!({})).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn disconnect_is_idempotent_and_blocks_emits() {
        let port = get_test_port();
        start_mock_broker(port).await;
        let channel = MqttChannel::connect(format!("mqtt://127.0.0.1:{port}"))
            .await
            .unwrap();
        channel.on(Zone::READ_RESPONSE_EVENT, Arc::new(|_| {}));

        channel.disconnect().await.unwrap();
        channel.disconnect().await.unwrap();

        assert!(!channel.is_connected());
        assert_eq!(channel.handler_count(Zone::READ_RESPONSE_EVENT), 0);
        assert!(channel.emit(Zone::READ_REQUEST_EVENT, json!({})).await.is_err());
    }
}

// ============================================================================
// Application over MQTT
// ============================================================================

mod application {
    use super::*;

    #[tokio::test]
    async fn services_attach_to_mqtt_channel() {
        let port = get_test_port();
        start_mock_broker(port).await;

        let app = AppContext::connect(
            "http://127.0.0.1:3000",
            &format!("mqtt://127.0.0.1:{port}"),
            Arc::new(LogMessenger::approving()),
        )
        .await
        .unwrap();

        assert!(app.zones().is_push_attached());
        assert_eq!(app.channel().handler_count(Zone::READ_RESPONSE_EVENT), 1);
        assert!(app.zones().request_refresh().await.is_ok());

        app.shutdown().await.unwrap();
        assert!(!app.zones().is_push_attached());
        assert!(!app.channel().is_connected());
    }
}
