// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Television control client.
//!
//! LG webOS televisions expose a JSON-over-WebSocket API (SSAP) on port
//! 3000. [`WebOsClient`] keeps one connection open, pairs using a stored
//! client key, and reconnects after the connection drops.
//!
//! Calls are fire-and-forget: they are queued to the connection task and
//! never awaited by the caller. Everything that comes back, including
//! subscription updates, arrives as a [`DeviceEvent`].
//!
//! # Examples
//!
//! ```no_run
//! use lgtv_bridge::device::{DeviceControl, DeviceEvent, KeyStore, WebOsClient};
//! use lgtv_bridge::command::{DeviceRequest, uri};
//!
//! # async fn example() -> lgtv_bridge::Result<()> {
//! let (tv, mut events) = WebOsClient::builder()
//!     .url("ws://192.168.1.20:3000")
//!     .key_store(KeyStore::for_host("./lgkey", "192.168.1.20"))
//!     .build()?;
//!
//! while let Some(event) = events.recv().await {
//!     if let DeviceEvent::Connected = event {
//!         tv.request(DeviceRequest::new(uri::TURN_OFF, None))?;
//!     }
//! }
//! # Ok(())
//! # }
//! ```

mod client;
mod key_store;
pub mod message;

pub use client::{WebOsClient, WebOsClientBuilder};
pub use key_store::KeyStore;

use serde_json::Value;

use crate::command::{DeviceRequest, PointerEvent};
use crate::error::ProtocolError;

/// Something that happened on the television connection.
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceEvent {
    /// A connection attempt is starting.
    Connecting {
        /// Endpoint being dialed.
        url: String,
    },
    /// The television is showing the pairing prompt.
    Prompt,
    /// Pairing completed; calls are accepted from now on.
    Connected,
    /// A paired connection was lost.
    Disconnected,
    /// Connection-level failure.
    Error(String),
    /// A subscription pushed an update.
    Update {
        /// Subscribed API identifier.
        uri: String,
        /// Update body.
        payload: Value,
    },
    /// The television refused a subscription.
    SubscriptionFailed {
        /// Subscribed API identifier.
        uri: String,
        /// Failure text.
        error: String,
    },
}

/// Fire-and-forget control surface of the television.
///
/// Implementations queue the call and return immediately; an error means the
/// call could not be queued at all.
pub trait DeviceControl: Clone + Send + Sync + 'static {
    /// Issues a one-shot request.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::ChannelClosed`] if the client has shut down.
    fn request(&self, request: DeviceRequest) -> Result<(), ProtocolError>;

    /// Subscribes to updates; they arrive as [`DeviceEvent::Update`].
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::ChannelClosed`] if the client has shut down.
    fn subscribe(&self, uri: &str) -> Result<(), ProtocolError>;

    /// Sends an event over the pointer input socket.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::ChannelClosed`] if the client has shut down.
    fn send_pointer(&self, event: PointerEvent) -> Result<(), ProtocolError>;
}
