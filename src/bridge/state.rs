// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Mutable bridge context.

use tokio_util::sync::CancellationToken;

/// Everything the bridge remembers between events.
///
/// Owned by the bridge loop; handlers run one at a time, so no locking is
/// involved.
#[derive(Debug, Default)]
pub struct BridgeState {
    foreground_app: Option<String>,
    bus_connected: bool,
    device_connected: bool,
    last_error: Option<String>,
    channels_armed: bool,
    timers: CancellationToken,
}

impl BridgeState {
    /// Creates an empty state: nothing connected, no foreground app.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Application currently in the foreground, if known.
    #[must_use]
    pub fn foreground_app(&self) -> Option<&str> {
        self.foreground_app.as_deref()
    }

    /// Records the foreground app; an empty id clears it.
    pub fn set_foreground_app(&mut self, app_id: &str) {
        self.foreground_app = (!app_id.is_empty()).then(|| app_id.to_string());
    }

    /// Returns whether the bus is connected.
    #[must_use]
    pub fn bus_connected(&self) -> bool {
        self.bus_connected
    }

    /// Returns whether the television is connected and paired.
    #[must_use]
    pub fn device_connected(&self) -> bool {
        self.device_connected
    }

    /// Payload of the aggregate `connected` topic.
    #[must_use]
    pub fn connected_payload(&self) -> &'static str {
        if self.device_connected { "1" } else { "0" }
    }

    /// Marks the bus as connected.
    pub fn bus_up(&mut self) {
        self.bus_connected = true;
    }

    /// Marks the bus as disconnected. Returns `true` if it was connected.
    pub fn bus_down(&mut self) -> bool {
        std::mem::replace(&mut self.bus_connected, false)
    }

    /// Marks the television as connected.
    ///
    /// Starts a fresh connection epoch: the channel subscription may be armed
    /// again and the error history is forgotten.
    pub fn device_up(&mut self) {
        self.device_connected = true;
        self.last_error = None;
        self.channels_armed = false;
    }

    /// Marks the television as disconnected and cancels pending timers.
    pub fn device_down(&mut self) {
        self.device_connected = false;
        self.last_error = None;
        self.timers.cancel();
        self.timers = CancellationToken::new();
    }

    /// Remembers a device error. Returns `false` if it repeats the last one.
    pub fn note_error(&mut self, error: &str) -> bool {
        if self.last_error.as_deref() == Some(error) {
            return false;
        }
        self.last_error = Some(error.to_string());
        true
    }

    /// Claims the channel subscription for this connection.
    ///
    /// Returns `true` only for the first call since the last connect.
    pub fn arm_channels(&mut self) -> bool {
        !std::mem::replace(&mut self.channels_armed, true)
    }

    /// Token cancelled on the next device disconnect.
    #[must_use]
    pub fn timers(&self) -> CancellationToken {
        self.timers.clone()
    }

    /// Cancels pending timers without touching connection flags.
    pub fn cancel_timers(&self) {
        self.timers.cancel();
    }
}
