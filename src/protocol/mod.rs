// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Message bus connection.
//!
//! The bridge talks to an MQTT broker through [`MqttBus`]. The rest of the
//! crate only depends on the [`BusPublisher`] trait and consumes
//! [`BusEvent`]s, so tests can substitute an in-memory bus.

mod mqtt_bus;

pub use mqtt_bus::{MqttBus, MqttBusBuilder, MqttBusConfig};

use crate::error::ProtocolError;

/// Something that happened on the bus connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BusEvent {
    /// The broker accepted the connection.
    Connected,
    /// An established connection was lost.
    Disconnected,
    /// A connection attempt failed while already disconnected.
    Error(String),
    /// A message arrived on a subscribed topic.
    Message {
        /// Topic the message was published to.
        topic: String,
        /// Payload, decoded lossily as UTF-8.
        payload: String,
    },
}

/// Outbound side of the bus.
///
/// Both calls queue the packet and return immediately.
pub trait BusPublisher: Send + Sync + 'static {
    /// Publishes a message (QoS 0, not retained).
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::Mqtt`] if the request queue is full or closed.
    fn publish(&self, topic: &str, payload: &str) -> Result<(), ProtocolError>;

    /// Subscribes to a topic filter.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::Mqtt`] if the request queue is full or closed.
    fn subscribe(&self, filter: &str) -> Result<(), ProtocolError>;
}
