// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `lgtv_bridge` - An MQTT bridge for LG webOS televisions.
//!
//! Commands published under `<prefix>/set/...` are translated into calls on
//! the television's WebSocket API, and status pushed by the television is
//! republished under `<prefix>/status/...`.
//!
//! # Topics
//!
//! | Topic | Direction | Payload |
//! |-------|-----------|---------|
//! | `<prefix>/set/<action>[/...]` | in | see [`command`] |
//! | `<prefix>/connected` | out | `"1"` / `"0"` |
//! | `<prefix>/status/volume` | out | volume level |
//! | `<prefix>/status/mute` | out | `"true"` / `"false"` |
//! | `<prefix>/status/soundOutput` | out | output route |
//! | `<prefix>/status/foregroundApp` | out | application id |
//! | `<prefix>/status/currentChannel` | out | `{"val": .., "lgtv": ..}` |
//!
//! # Components
//!
//! - [`protocol::MqttBus`]: persistent broker connection
//! - [`device::WebOsClient`]: persistent television connection with pairing
//! - [`wake::WakeOnLan`]: magic packets for a powered-off television
//! - [`bridge::Bridge`]: command routing and status relay
//!
//! # Quick Start
//!
//! ```no_run
//! use clap::Parser;
//! use lgtv_bridge::config::Cli;
//! use lgtv_bridge::{Bridge, BridgeConfig, KeyStore, MqttBus, WakeOnLan, WebOsClient};
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> lgtv_bridge::Result<()> {
//!     let config = BridgeConfig::try_from(Cli::parse())?;
//!
//!     let (bus, bus_events) = MqttBus::builder().url(config.mqtt_url()).connect()?;
//!     let (tv, tv_events) = WebOsClient::builder()
//!         .url(config.tv_url())
//!         .key_store(KeyStore::for_host(config.key_path(), config.tv_host()))
//!         .build()?;
//!     let waker = WakeOnLan::new(config.tv_mac(), config.broadcast());
//!
//!     Bridge::new(config.topic_prefix().clone(), bus, tv, waker)
//!         .run(bus_events, tv_events, CancellationToken::new())
//!         .await;
//!     Ok(())
//! }
//! ```

pub mod bridge;
pub mod command;
pub mod config;
pub mod device;
pub mod error;
pub mod protocol;
pub mod topic;
pub mod types;
pub mod wake;

pub use bridge::{Bridge, BridgeState};
pub use command::{Command, DeviceRequest, PointerEvent};
pub use config::BridgeConfig;
pub use device::{DeviceControl, DeviceEvent, KeyStore, WebOsClient, WebOsClientBuilder};
pub use error::{ConfigError, DeviceError, Error, ParseError, ProtocolError, Result};
pub use protocol::{BusEvent, BusPublisher, MqttBus, MqttBusBuilder};
pub use topic::TopicPrefix;
pub use types::{MacAddress, PowerState, Volume};
pub use wake::WakeOnLan;
