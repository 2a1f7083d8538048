// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Process configuration from command-line flags or the environment.
//!
//! Every flag falls back to the environment variable of the same name.
//!
//! | Variable | Flag | Required | Default |
//! |----------|------|----------|---------|
//! | `TOPIC_PREFIX` | `--topic-prefix` | yes | |
//! | `TV_IP` | `--tv-ip` | yes | |
//! | `TV_MAC` | `--tv-mac` | no | wake disabled |
//! | `BROADCAST_IP` | `--broadcast-ip` | no | `255.255.255.255` |
//! | `CLIENT_KEY_PATH` | `--client-key-path` | no | `./lgkey/` |
//! | `MQTT_URL` | `--mqtt-url` | no | `mqtt://127.0.0.1:1883` |
//! | `MQTT_USERNAME` / `MQTT_PASSWORD` | `--mqtt-username` / `--mqtt-password` | no | anonymous |

use std::net::IpAddr;
use std::path::PathBuf;

use clap::Parser;

use crate::error::ConfigError;
use crate::topic::TopicPrefix;
use crate::types::MacAddress;

/// Default directory for pairing key files.
pub const DEFAULT_KEY_PATH: &str = "./lgkey/";

/// Default broker URL.
pub const DEFAULT_MQTT_URL: &str = "mqtt://127.0.0.1:1883";

/// Default destination for wake packets.
pub const DEFAULT_BROADCAST_IP: &str = "255.255.255.255";

/// Port of the television's SSAP WebSocket endpoint.
pub const TV_PORT: u16 = 3000;

/// Command-line interface of the `lgtv-bridge` binary.
#[derive(Debug, Parser)]
#[command(
    name = "lgtv-bridge",
    version,
    about = "Bridge an MQTT topic namespace to an LG webOS television"
)]
pub struct Cli {
    /// Root of the bus topic namespace, e.g. `lgtv`.
    #[arg(long, env = "TOPIC_PREFIX")]
    pub topic_prefix: String,

    /// Television host name or address. A `ws://host:port` URL is accepted.
    #[arg(long, env = "TV_IP")]
    pub tv_ip: String,

    /// Television hardware address, needed for power on.
    #[arg(long, env = "TV_MAC")]
    pub tv_mac: Option<String>,

    /// Destination address for wake packets.
    #[arg(long, env = "BROADCAST_IP", default_value = DEFAULT_BROADCAST_IP)]
    pub broadcast_ip: String,

    /// Directory holding pairing key files.
    #[arg(long, env = "CLIENT_KEY_PATH", default_value = DEFAULT_KEY_PATH)]
    pub client_key_path: PathBuf,

    /// Broker URL (`mqtt://`, `tcp://` or bare `host:port`).
    #[arg(long, env = "MQTT_URL", default_value = DEFAULT_MQTT_URL)]
    pub mqtt_url: String,

    /// Broker user name. Anonymous when unset.
    #[arg(long, env = "MQTT_USERNAME")]
    pub mqtt_username: Option<String>,

    /// Broker password, used with `--mqtt-username`.
    #[arg(long, env = "MQTT_PASSWORD", hide_env_values = true)]
    pub mqtt_password: Option<String>,
}

/// Configuration for one bridge instance.
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    topic_prefix: TopicPrefix,
    tv_host: String,
    tv_mac: Option<MacAddress>,
    broadcast: IpAddr,
    key_path: PathBuf,
    mqtt_url: String,
    mqtt_credentials: Option<(String, String)>,
}

impl TryFrom<Cli> for BridgeConfig {
    type Error = ConfigError;

    /// Validates parsed flags. Blank values count as unset.
    fn try_from(cli: Cli) -> Result<Self, Self::Error> {
        let present = |value: Option<String>| value.filter(|v| !v.trim().is_empty());

        let topic_prefix = TopicPrefix::new(
            present(Some(cli.topic_prefix)).ok_or(ConfigError::Missing("TOPIC_PREFIX"))?,
        )?;

        let tv_host = present(Some(cli.tv_ip))
            .map(|ip| strip_ws_url(&ip).to_string())
            .ok_or(ConfigError::Missing("TV_IP"))?;

        let tv_mac = present(cli.tv_mac)
            .map(|mac| {
                mac.parse::<MacAddress>().map_err(|e| ConfigError::Invalid {
                    name: "TV_MAC",
                    message: e.to_string(),
                })
            })
            .transpose()?;

        let broadcast = cli
            .broadcast_ip
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid {
                name: "BROADCAST_IP",
                message: format!("not an IP address: {}", cli.broadcast_ip),
            })?;

        let mqtt_url = present(Some(cli.mqtt_url)).unwrap_or_else(|| DEFAULT_MQTT_URL.to_string());
        let mqtt_credentials = present(cli.mqtt_username)
            .map(|user| (user, cli.mqtt_password.unwrap_or_default()));

        Ok(Self {
            topic_prefix,
            tv_host,
            tv_mac,
            broadcast,
            key_path: cli.client_key_path,
            mqtt_url,
            mqtt_credentials,
        })
    }
}

impl BridgeConfig {
    /// Returns the bus topic prefix.
    #[must_use]
    pub fn topic_prefix(&self) -> &TopicPrefix {
        &self.topic_prefix
    }

    /// Returns the television host name or address.
    #[must_use]
    pub fn tv_host(&self) -> &str {
        &self.tv_host
    }

    /// Returns the SSAP WebSocket URL of the television.
    #[must_use]
    pub fn tv_url(&self) -> String {
        format!("ws://{}:{TV_PORT}", self.tv_host)
    }

    /// Returns the hardware address used for wake packets.
    #[must_use]
    pub fn tv_mac(&self) -> Option<MacAddress> {
        self.tv_mac
    }

    /// Returns the broadcast address used for wake packets.
    #[must_use]
    pub fn broadcast(&self) -> IpAddr {
        self.broadcast
    }

    /// Returns the directory holding pairing key files.
    #[must_use]
    pub fn key_path(&self) -> &std::path::Path {
        &self.key_path
    }

    /// Returns the MQTT broker URL.
    #[must_use]
    pub fn mqtt_url(&self) -> &str {
        &self.mqtt_url
    }

    /// Returns the MQTT credentials, if configured.
    #[must_use]
    pub fn mqtt_credentials(&self) -> Option<(&str, &str)> {
        self.mqtt_credentials
            .as_ref()
            .map(|(u, p)| (u.as_str(), p.as_str()))
    }
}

/// Reduces `ws://host:port` to `host`; plain hosts pass through.
fn strip_ws_url(value: &str) -> &str {
    let Some((_, rest)) = value.split_once("://") else {
        return value.trim();
    };
    let rest = rest.split('/').next().unwrap_or(rest);
    rest.rsplit_once(':').map_or(rest, |(host, _)| host)
}
