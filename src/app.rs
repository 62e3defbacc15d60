// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Application container.
//!
//! Builds the services once and hands out shared references, so every view
//! of the application talks to the same registries and push handlers.

use std::sync::Arc;

use chrono::Utc;

use crate::error::Result;
use crate::message::Messenger;
use crate::protocol::{ApiClient, PushChannel};
use crate::resource::{Device, LivenessPolicy};
use crate::service::{DeviceService, ServiceOptions, ZoneService};
use crate::session::{MainView, TokenStore};

/// Owns the services of one application instance.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use zonesync_lib::app::AppContext;
/// use zonesync_lib::message::LogMessenger;
/// use zonesync_lib::protocol::{HttpConfig, LocalChannel};
/// use zonesync_lib::session::MemoryTokenStore;
///
/// # fn example() -> zonesync_lib::Result<()> {
/// let app = AppContext::new(
///     HttpConfig::new("127.0.0.1").with_port(3000).into_client()?,
///     Arc::new(LocalChannel::new()),
///     Arc::new(LogMessenger::approving()),
/// );
///
/// let mut view = app.main_view(Arc::new(MemoryTokenStore::new()));
/// view.activate(|section| println!("redraw {section:?}"));
/// # Ok(())
/// # }
/// ```
pub struct AppContext<C: PushChannel + 'static, M: Messenger + 'static> {
    channel: Arc<C>,
    messenger: Arc<M>,
    zones: Arc<ZoneService<C, M>>,
    devices: Arc<DeviceService<C, M>>,
    liveness: LivenessPolicy,
}

impl<C: PushChannel + 'static, M: Messenger + 'static> AppContext<C, M> {
    /// Creates the services with default options.
    pub fn new(api: ApiClient, channel: Arc<C>, messenger: Arc<M>) -> Self {
        Self::with_options(api, channel, messenger, ServiceOptions::default())
    }

    /// Creates the services with custom options.
    pub fn with_options(
        api: ApiClient,
        channel: Arc<C>,
        messenger: Arc<M>,
        options: ServiceOptions,
    ) -> Self {
        let zones = Arc::new(ZoneService::new(
            api.clone(),
            Arc::clone(&channel),
            Arc::clone(&messenger),
            options,
        ));
        let devices = Arc::new(DeviceService::new(
            api,
            Arc::clone(&channel),
            Arc::clone(&messenger),
            options,
        ));

        Self {
            channel,
            messenger,
            zones,
            devices,
            liveness: LivenessPolicy::default(),
        }
    }

    /// Replaces the device liveness policy.
    #[must_use]
    pub fn with_liveness(mut self, liveness: LivenessPolicy) -> Self {
        self.liveness = liveness;
        self
    }

    /// Returns the zone service.
    #[must_use]
    pub fn zones(&self) -> &Arc<ZoneService<C, M>> {
        &self.zones
    }

    /// Returns the device service.
    #[must_use]
    pub fn devices(&self) -> &Arc<DeviceService<C, M>> {
        &self.devices
    }

    /// Returns the shared push channel.
    #[must_use]
    pub fn channel(&self) -> &Arc<C> {
        &self.channel
    }

    /// Returns the shared messenger.
    #[must_use]
    pub fn messenger(&self) -> &Arc<M> {
        &self.messenger
    }

    /// Returns the device liveness policy.
    #[must_use]
    pub fn liveness(&self) -> LivenessPolicy {
        self.liveness
    }

    /// Marks devices silent for too long as offline.
    ///
    /// Returns how many devices went offline.
    pub fn refresh_liveness(&self, devices: &mut [Device]) -> usize {
        self.liveness.apply(devices, Utc::now())
    }

    /// Creates a main view bound to `tokens`.
    pub fn main_view(&self, tokens: Arc<dyn TokenStore>) -> MainView<C, M> {
        MainView::new(tokens, Arc::clone(&self.zones), Arc::clone(&self.devices))
    }

    /// Drops every listener and closes the push channel.
    ///
    /// # Errors
    ///
    /// Returns error if the channel fails to disconnect.
    pub async fn shutdown(&self) -> Result<()> {
        self.zones.clear_listeners();
        self.devices.clear_listeners();
        self.channel.disconnect().await?;
        tracing::debug!("Application context shut down");
        Ok(())
    }
}

#[cfg(feature = "mqtt")]
impl<M: Messenger + 'static> AppContext<crate::protocol::MqttChannel, M> {
    /// Connects to the API and to an MQTT broker carrying the push events.
    ///
    /// # Errors
    ///
    /// Returns error if either address is invalid.
    pub async fn connect(api_url: &str, broker_url: &str, messenger: Arc<M>) -> Result<Self> {
        let api = crate::protocol::HttpConfig::parse(api_url)?.into_client()?;
        let channel = crate::protocol::MqttChannel::connect(broker_url).await?;
        Ok(Self::new(api, Arc::new(channel), messenger))
    }
}

impl<C: PushChannel + 'static, M: Messenger + 'static> std::fmt::Debug for AppContext<C, M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppContext")
            .field("zones", &self.zones)
            .field("devices", &self.devices)
            .field("liveness", &self.liveness)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::LogMessenger;
    use crate::protocol::{HttpConfig, LocalChannel};
    use crate::resource::{Resource, Zone};
    use chrono::TimeDelta;
    use std::time::Duration;

    fn app() -> AppContext<LocalChannel, LogMessenger> {
        AppContext::new(
            HttpConfig::new("127.0.0.1").into_client().unwrap(),
            Arc::new(LocalChannel::new()),
            Arc::new(LogMessenger::approving()),
        )
    }

    #[test]
    fn views_share_service_instances() {
        let app = app();
        let first = app.main_view(Arc::new(crate::session::MemoryTokenStore::new()));
        let second = app.main_view(Arc::new(crate::session::MemoryTokenStore::new()));

        assert!(Arc::ptr_eq(first.zones(), second.zones()));
        assert!(Arc::ptr_eq(first.devices(), app.devices()));
    }

    #[tokio::test]
    async fn shutdown_clears_and_disconnects() {
        let app = app();
        app.zones().subscribe(|_| {});
        app.devices().subscribe(|_| {});

        app.shutdown().await.unwrap();

        assert_eq!(app.zones().subscriber_count(), 0);
        assert_eq!(app.devices().subscriber_count(), 0);
        assert_eq!(app.channel().handler_count(Zone::READ_RESPONSE_EVENT), 0);
        assert!(!app.channel().is_connected());
        assert!(app.zones().request_refresh().await.is_err());
    }

    #[test]
    fn refresh_liveness_uses_policy() {
        let app = app().with_liveness(LivenessPolicy::new(Duration::from_secs(30)));
        let now = Utc::now();

        let mut fresh = Device::new("fresh");
        fresh.mark_seen(now);
        let mut stale = Device::new("stale");
        stale.mark_seen(now - TimeDelta::seconds(120));

        let mut devices = vec![fresh, stale];
        assert_eq!(app.refresh_liveness(&mut devices), 1);
        assert!(devices[0].online);
        assert!(!devices[1].online);
    }
}
