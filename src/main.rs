// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `lgtv-bridge` binary: wires the configured broker and television
//! together and runs until interrupted.

use clap::Parser;
use lgtv_bridge::config::Cli;
use lgtv_bridge::{Bridge, BridgeConfig, KeyStore, MqttBus, WakeOnLan, WebOsClient};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing();
    tracing::info!(
        "{} {} starting",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION")
    );

    let config = match BridgeConfig::try_from(cli) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Invalid configuration, not starting");
            std::process::exit(1);
        }
    };

    if let Err(e) = run(config).await {
        tracing::error!(error = %e, "Bridge failed");
        std::process::exit(1);
    }
}

async fn run(config: BridgeConfig) -> lgtv_bridge::Result<()> {
    let mut bus = MqttBus::builder().url(config.mqtt_url());
    if let Some((username, password)) = config.mqtt_credentials() {
        bus = bus.credentials(username, password);
    }
    let (bus, bus_events) = bus.connect()?;

    let key_store = KeyStore::for_host(config.key_path(), config.tv_host());
    tracing::info!(path = %key_store.path().display(), "Using pairing key file");
    let (tv, tv_events) = WebOsClient::builder()
        .url(config.tv_url())
        .key_store(key_store)
        .build()?;

    if config.tv_mac().is_none() {
        tracing::warn!("TV_MAC not set, power on will not work");
    }
    let waker = WakeOnLan::new(config.tv_mac(), config.broadcast());

    let shutdown = CancellationToken::new();
    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutdown requested");
            shutdown.cancel();
        }
    });

    Bridge::new(config.topic_prefix().clone(), bus.clone(), tv, waker)
        .run(bus_events, tv_events, shutdown)
        .await;

    bus.disconnect().await?;
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}
