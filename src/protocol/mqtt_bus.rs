// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! MQTT broker connection for the bridge.
//!
//! The connection is persistent: the rumqttc event loop is polled in a
//! background task and reconnects on its own after a failure. Everything
//! the broker delivers is forwarded as a [`BusEvent`].
//!
//! # Examples
//!
//! ```no_run
//! use lgtv_bridge::protocol::{BusEvent, BusPublisher, MqttBus};
//!
//! # async fn example() -> lgtv_bridge::Result<()> {
//! let (bus, mut events) = MqttBus::builder()
//!     .url("mqtt://192.168.1.50:1883")
//!     .credentials("user", "password")
//!     .connect()?;
//!
//! while let Some(event) = events.recv().await {
//!     if let BusEvent::Connected = event {
//!         bus.subscribe("lgtv/set/#")?;
//!     }
//! }
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use rumqttc::{AsyncClient, EventLoop, MqttOptions, QoS};
use tokio::sync::mpsc;

use super::{BusEvent, BusPublisher};
use crate::error::ProtocolError;

/// Default MQTT port.
const DEFAULT_PORT: u16 = 1883;

/// Capacity of the rumqttc request queue.
const REQUEST_CAPACITY: usize = 64;

/// Capacity of the event channel.
const EVENT_CAPACITY: usize = 64;

/// Configuration for an MQTT broker connection.
#[derive(Debug, Clone)]
pub struct MqttBusConfig {
    host: String,
    port: u16,
    credentials: Option<(String, String)>,
    client_id: Option<String>,
    keep_alive: Duration,
    reconnect_delay: Duration,
}

impl Default for MqttBusConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: DEFAULT_PORT,
            credentials: None,
            client_id: None,
            keep_alive: Duration::from_secs(30),
            reconnect_delay: Duration::from_secs(1),
        }
    }
}

/// A persistent MQTT broker connection.
///
/// `MqttBus` is cheaply cloneable (via `Arc`). Publishing never blocks: a
/// message is queued for the event loop, or rejected if the queue is full.
#[derive(Clone)]
pub struct MqttBus {
    inner: Arc<MqttBusInner>,
}

struct MqttBusInner {
    client: AsyncClient,
    config: MqttBusConfig,
    connected: AtomicBool,
}

impl MqttBus {
    /// Creates a new builder for configuring the connection.
    #[must_use]
    pub fn builder() -> MqttBusBuilder {
        MqttBusBuilder::default()
    }

    /// Returns whether the broker is currently connected.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.inner.connected.load(Ordering::Acquire)
    }

    /// Returns the host address of the broker.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.inner.config.host
    }

    /// Returns the port of the broker.
    #[must_use]
    pub fn port(&self) -> u16 {
        self.inner.config.port
    }

    /// Disconnects from the broker.
    ///
    /// # Errors
    ///
    /// Returns error if the disconnect request cannot be queued.
    pub async fn disconnect(&self) -> Result<(), ProtocolError> {
        tracing::info!(
            host = %self.inner.config.host,
            port = %self.inner.config.port,
            "Disconnecting from MQTT broker"
        );
        self.inner.client.disconnect().await?;
        self.inner.connected.store(false, Ordering::Release);
        Ok(())
    }
}

impl BusPublisher for MqttBus {
    fn publish(&self, topic: &str, payload: &str) -> Result<(), ProtocolError> {
        tracing::debug!(topic = %topic, payload = %payload, "mqtt >");
        self.inner
            .client
            .try_publish(topic, QoS::AtMostOnce, false, payload.as_bytes().to_vec())?;
        Ok(())
    }

    fn subscribe(&self, filter: &str) -> Result<(), ProtocolError> {
        tracing::info!(filter = %filter, "mqtt subscribe");
        self.inner.client.try_subscribe(filter, QoS::AtMostOnce)?;
        Ok(())
    }
}

impl std::fmt::Debug for MqttBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MqttBus")
            .field("host", &self.inner.config.host)
            .field("port", &self.inner.config.port)
            .field("connected", &self.is_connected())
            .finish()
    }
}

/// Builder for an MQTT broker connection.
///
/// # Examples
///
/// ```no_run
/// use lgtv_bridge::protocol::MqttBus;
/// use std::time::Duration;
///
/// # async fn example() -> lgtv_bridge::Result<()> {
/// let (bus, events) = MqttBus::builder()
///     .url("tcp://192.168.1.50:1883")
///     .client_id("lgtv_livingroom")
///     .keep_alive(Duration::from_secs(60))
///     .connect()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct MqttBusBuilder {
    url: Option<String>,
    config: MqttBusConfig,
}

impl MqttBusBuilder {
    /// Sets the broker URL (`mqtt://host:port`, `tcp://host:port` or `host[:port]`).
    #[must_use]
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Sets authentication credentials.
    #[must_use]
    pub fn credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.config.credentials = Some((username.into(), password.into()));
        self
    }

    /// Sets a custom client ID.
    #[must_use]
    pub fn client_id(mut self, id: impl Into<String>) -> Self {
        self.config.client_id = Some(id.into());
        self
    }

    /// Sets the keep-alive interval (default: 30 seconds).
    #[must_use]
    pub fn keep_alive(mut self, duration: Duration) -> Self {
        self.config.keep_alive = duration;
        self
    }

    /// Sets the pause after a connection error before polling again
    /// (default: 1 second).
    #[must_use]
    pub fn reconnect_delay(mut self, duration: Duration) -> Self {
        self.config.reconnect_delay = duration;
        self
    }

    /// Spawns the event loop and returns the bus with its event receiver.
    ///
    /// The broker does not have to be reachable yet; the event loop keeps
    /// retrying and reports [`BusEvent::Connected`] once it succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::InvalidAddress`] if the URL is missing or
    /// malformed.
    pub fn connect(mut self) -> Result<(MqttBus, mpsc::Receiver<BusEvent>), ProtocolError> {
        let url = self
            .url
            .ok_or_else(|| ProtocolError::InvalidAddress("MQTT broker URL is required".to_string()))?;
        let (host, port) = parse_mqtt_url(&url)?;
        self.config.host = host;
        self.config.port = port;

        let client_id = self
            .config
            .client_id
            .clone()
            .unwrap_or_else(|| format!("lgtv_bridge_{}", uuid::Uuid::new_v4().simple()));

        let mut mqtt_options = MqttOptions::new(&client_id, &self.config.host, self.config.port);
        mqtt_options.set_keep_alive(self.config.keep_alive);
        mqtt_options.set_clean_session(true);

        if let Some((ref username, ref password)) = self.config.credentials {
            mqtt_options.set_credentials(username, password);
        }

        let (client, event_loop) = AsyncClient::new(mqtt_options, REQUEST_CAPACITY);
        let (event_tx, event_rx) = mpsc::channel(EVENT_CAPACITY);

        let bus = MqttBus {
            inner: Arc::new(MqttBusInner {
                client,
                config: self.config,
                connected: AtomicBool::new(false),
            }),
        };

        tracing::info!(host = %bus.host(), port = %bus.port(), client_id = %client_id, "Connecting to MQTT broker");

        let bus_clone = bus.clone();
        tokio::spawn(async move {
            handle_bus_events(event_loop, bus_clone, event_tx).await;
        });

        Ok((bus, event_rx))
    }
}

/// Parses an MQTT URL into host and port.
fn parse_mqtt_url(url: &str) -> Result<(String, u16), ProtocolError> {
    let url = url
        .strip_prefix("mqtt://")
        .or_else(|| url.strip_prefix("tcp://"))
        .unwrap_or(url);
    let url = url.trim_end_matches('/');

    let (host, port) = if let Some((h, p)) = url.rsplit_once(':') {
        let port = p
            .parse()
            .map_err(|_| ProtocolError::InvalidAddress(format!("Invalid port: {p}")))?;
        (h.to_string(), port)
    } else {
        (url.to_string(), DEFAULT_PORT)
    };

    if host.is_empty() {
        return Err(ProtocolError::InvalidAddress(
            "MQTT broker host is required".to_string(),
        ));
    }

    Ok((host, port))
}

/// Polls the event loop forever, forwarding connection changes and messages.
async fn handle_bus_events(mut event_loop: EventLoop, bus: MqttBus, events: mpsc::Sender<BusEvent>) {
    use rumqttc::{Event, Packet};

    loop {
        let event = match event_loop.poll().await {
            Ok(Event::Incoming(Packet::ConnAck(connack))) => {
                tracing::debug!(?connack, "MQTT broker connected");
                bus.inner.connected.store(true, Ordering::Release);
                Some(BusEvent::Connected)
            }
            Ok(Event::Incoming(Packet::SubAck(suback))) => {
                tracing::debug!(?suback, "MQTT subscription acknowledged");
                None
            }
            Ok(Event::Incoming(Packet::Publish(publish))) => {
                let payload = String::from_utf8_lossy(&publish.payload).into_owned();
                Some(BusEvent::Message {
                    topic: publish.topic,
                    payload,
                })
            }
            Ok(Event::Incoming(Packet::Disconnect)) => {
                tracing::info!("MQTT broker sent disconnect");
                lost_connection(&bus)
            }
            Ok(_) => None,
            Err(e) => {
                tracing::debug!(error = %e, "MQTT event loop error");
                let was_connected = bus.inner.connected.swap(false, Ordering::AcqRel);
                for event in connection_error_events(was_connected, &e.to_string()) {
                    if events.send(event).await.is_err() {
                        return;
                    }
                }
                tokio::time::sleep(bus.inner.config.reconnect_delay).await;
                continue;
            }
        };

        if let Some(event) = event
            && events.send(event).await.is_err()
        {
            tracing::debug!("Bus event receiver dropped, stopping MQTT event loop");
            return;
        }
    }
}

/// Marks the bus as disconnected, returning an event only on the transition.
/// Events reported for a failed poll. A drop of a live connection reports
/// the disconnect first, then the error text.
fn connection_error_events(was_connected: bool, error: &str) -> Vec<BusEvent> {
    let error = BusEvent::Error(error.to_string());
    if was_connected {
        vec![BusEvent::Disconnected, error]
    } else {
        vec![error]
    }
}

fn lost_connection(bus: &MqttBus) -> Option<BusEvent> {
    bus.inner
        .connected
        .swap(false, Ordering::AcqRel)
        .then_some(BusEvent::Disconnected)
}
