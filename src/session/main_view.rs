// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Main screen controller.

use std::sync::Arc;

use crate::error::Result;
use crate::message::Messenger;
use crate::protocol::PushChannel;
use crate::service::{DeviceService, ZoneService};
use crate::session::{TokenStore, ViewScope};

/// Part of the main screen affected by a change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    /// The zone list.
    Zones,
    /// The device list.
    Devices,
}

/// Controller of the main screen.
///
/// Watches both services while active and reports which section needs to
/// be redrawn. The session token is read from and written to the injected
/// [`TokenStore`] only.
pub struct MainView<C: PushChannel + 'static, M: Messenger + 'static> {
    tokens: Arc<dyn TokenStore>,
    zones: Arc<ZoneService<C, M>>,
    devices: Arc<DeviceService<C, M>>,
    scope: Option<ViewScope>,
    token: Option<String>,
}

impl<C: PushChannel + 'static, M: Messenger + 'static> MainView<C, M> {
    /// Creates an inactive view.
    pub fn new(
        tokens: Arc<dyn TokenStore>,
        zones: Arc<ZoneService<C, M>>,
        devices: Arc<DeviceService<C, M>>,
    ) -> Self {
        Self {
            tokens,
            zones,
            devices,
            scope: None,
            token: None,
        }
    }

    /// Loads the session token and starts watching both services.
    ///
    /// `on_change` runs once per change notification. Does nothing if the
    /// view is already active.
    pub fn activate<F>(&mut self, on_change: F)
    where
        F: Fn(Section) + Send + Sync + 'static,
    {
        if self.scope.is_some() {
            return;
        }

        self.token = self.tokens.token();

        let on_change = Arc::new(on_change);
        let mut scope = ViewScope::new();

        let zones_changed = Arc::clone(&on_change);
        scope.watch(&self.zones, move |_| (*zones_changed)(Section::Zones));
        scope.watch(&self.devices, move |_| (*on_change)(Section::Devices));

        tracing::debug!(signed_in = self.token.is_some(), "Main view activated");
        self.scope = Some(scope);
    }

    /// Stops watching. Returns `false` if the view was not active.
    ///
    /// Only this view's callbacks are removed. The services keep their push
    /// handlers attached after the last subscriber leaves; detach them with
    /// [`ViewScope::exclusive`] or `clear_listeners` when nothing else
    /// should listen.
    pub fn deactivate(&mut self) -> bool {
        match self.scope.take() {
            Some(mut scope) => {
                scope.close();
                tracing::debug!("Main view deactivated");
                true
            }
            None => false,
        }
    }

    /// Returns `true` between [`activate`](Self::activate) and
    /// [`deactivate`](Self::deactivate).
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.scope.is_some()
    }

    /// Returns the session token loaded by this view.
    #[must_use]
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Persists a freshly issued session token.
    pub fn store_session_token(&mut self, token: &str) {
        self.tokens.set_token(token);
        self.token = Some(token.to_string());
    }

    /// Forgets the session token.
    pub fn logout(&mut self) {
        self.tokens.delete_token();
        self.token = None;
    }

    /// Asks the server to broadcast zones and devices.
    ///
    /// # Errors
    ///
    /// Returns the first push channel failure.
    pub async fn request_refresh(&self) -> Result<()> {
        self.zones.request_refresh().await?;
        self.devices.request_refresh().await
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
}

impl<C: PushChannel + 'static, M: Messenger + 'static> std::fmt::Debug for MainView<C, M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MainView")
            .field("active", &self.is_active())
            .field("signed_in", &self.token.is_some())
            .finish_non_exhaustive()
    }
}
