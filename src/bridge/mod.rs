// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The bridge between the bus and the television.
//!
//! [`Bridge`] owns all mutable state and processes one event at a time:
//!
//! - bus messages on `<prefix>/set/...` are routed to television calls
//! - television events are relayed as status messages on the bus
//!
//! Calls in either direction are queued and never awaited. Delayed actions
//! (channel subscription, window maximize gesture) run as timers that are
//! cancelled when the television disconnects.
//!
//! # Examples
//!
//! ```no_run
//! use lgtv_bridge::bridge::Bridge;
//! use clap::Parser;
//! use lgtv_bridge::config::{BridgeConfig, Cli};
//! use lgtv_bridge::device::{KeyStore, WebOsClient};
//! use lgtv_bridge::protocol::MqttBus;
//! use lgtv_bridge::wake::WakeOnLan;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> lgtv_bridge::Result<()> {
//! let config = BridgeConfig::try_from(Cli::parse())?;
//! let (bus, bus_events) = MqttBus::builder().url(config.mqtt_url()).connect()?;
//! let (tv, tv_events) = WebOsClient::builder()
//!     .url(config.tv_url())
//!     .key_store(KeyStore::for_host(config.key_path(), config.tv_host()))
//!     .build()?;
//! let waker = WakeOnLan::new(config.tv_mac(), config.broadcast());
//!
//! Bridge::new(config.topic_prefix().clone(), bus, tv, waker)
//!     .run(bus_events, tv_events, CancellationToken::new())
//!     .await;
//! # Ok(())
//! # }
//! ```

mod relay;
mod router;
mod state;
#[cfg(test)]
mod testing;

pub use state::BridgeState;

use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::device::{DeviceControl, DeviceEvent};
use crate::error::Error;
use crate::protocol::{BusEvent, BusPublisher};
use crate::topic::TopicPrefix;
use crate::wake::WakeOnLan;

/// Application id of the live TV tuner.
pub const LIVE_TV_APP_ID: &str = "com.webos.app.livetv";

/// Delay between the tuner coming to the foreground and subscribing to
/// channel updates; the channel API is not ready right away.
pub const CHANNEL_ARM_DELAY: Duration = Duration::from_millis(2500);

/// Delay between opening a target and the maximize gesture.
pub const MAXIMIZE_DELAY: Duration = Duration::from_millis(5000);

/// Results of background work, fed back into the bridge loop.
#[derive(Debug)]
enum Feedback {
    /// A wake packet was sent (or failed to be).
    Woken(Result<usize, Error>),
}

/// Routes bus commands to the television and relays its status back.
pub struct Bridge<B, D> {
    prefix: TopicPrefix,
    bus: B,
    device: D,
    waker: WakeOnLan,
    state: BridgeState,
    feedback_tx: mpsc::UnboundedSender<Feedback>,
    feedback_rx: mpsc::UnboundedReceiver<Feedback>,
}

impl<B: BusPublisher, D: DeviceControl> Bridge<B, D> {
    /// Creates a bridge with empty state.
    #[must_use]
    pub fn new(prefix: TopicPrefix, bus: B, device: D, waker: WakeOnLan) -> Self {
        let (feedback_tx, feedback_rx) = mpsc::unbounded_channel();
        Self {
            prefix,
            bus,
            device,
            waker,
            state: BridgeState::new(),
            feedback_tx,
            feedback_rx,
        }
    }

    /// Returns the current state.
    #[must_use]
    pub fn state(&self) -> &BridgeState {
        &self.state
    }

    /// Processes events until `shutdown` is cancelled or both event sources
    /// are closed.
    pub async fn run(
        mut self,
        mut bus_events: mpsc::Receiver<BusEvent>,
        mut device_events: mpsc::Receiver<DeviceEvent>,
        shutdown: CancellationToken,
    ) {
        let mut bus_open = true;
        let mut device_open = true;

        while bus_open || device_open {
            tokio::select! {
                () = shutdown.cancelled() => break,
                event = bus_events.recv(), if bus_open => match event {
                    Some(event) => self.handle_bus_event(event),
                    None => {
                        tracing::warn!("Bus event stream closed");
                        bus_open = false;
                    }
                },
                event = device_events.recv(), if device_open => match event {
                    Some(event) => self.handle_device_event(event),
                    None => {
                        tracing::warn!("Television event stream closed");
                        device_open = false;
                    }
                },
                Some(feedback) = self.feedback_rx.recv() => self.handle_feedback(feedback),
            }
        }

        self.state.cancel_timers();
        tracing::info!("Bridge stopped");
    }

    fn handle_feedback(&mut self, feedback: Feedback) {
        match feedback {
            Feedback::Woken(result) => self.power_on_completed(result),
        }
    }

    fn publish(&self, topic: &str, payload: &str) {
        if let Err(e) = self.bus.publish(topic, payload) {
            tracing::warn!(topic = %topic, error = %e, "Failed to publish");
        }
    }
}
