// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Status relay: connection changes and subscription updates become bus
//! messages.

use serde_json::{Value, json};

use super::{Bridge, CHANNEL_ARM_DELAY, LIVE_TV_APP_ID};
use crate::command::uri;
use crate::device::{DeviceControl, DeviceEvent};
use crate::error::ParseError;
use crate::protocol::{BusEvent, BusPublisher};
use crate::topic::status;

/// Television subscriptions opened on every connect.
const CONNECT_SUBSCRIPTIONS: [&str; 3] = [
    uri::AUDIO_STATUS,
    uri::FOREGROUND_APP_INFO,
    uri::EXTERNAL_INPUT_LIST,
];

impl<B: BusPublisher, D: DeviceControl> Bridge<B, D> {
    /// Handles a bus connection event.
    pub fn handle_bus_event(&mut self, event: BusEvent) {
        match event {
            BusEvent::Connected => {
                self.state.bus_up();
                tracing::info!("mqtt connected");
                self.publish(&self.prefix.connected(), self.state.connected_payload());

                let filter = self.prefix.command_filter();
                if let Err(e) = self.bus.subscribe(&filter) {
                    tracing::error!(filter = %filter, error = %e, "Failed to subscribe");
                }
            }
            BusEvent::Disconnected => {
                if self.state.bus_down() {
                    tracing::error!("mqtt disconnected");
                }
            }
            BusEvent::Error(e) => tracing::error!(error = %e, "mqtt error"),
            BusEvent::Message { topic, payload } => self.handle_message(&topic, &payload),
        }
    }

    /// Handles a television connection event or subscription update.
    pub fn handle_device_event(&mut self, event: DeviceEvent) {
        match event {
            DeviceEvent::Connecting { url } => tracing::info!(url = %url, "tv trying to connect"),
            DeviceEvent::Prompt => tracing::info!("authorization required"),
            DeviceEvent::Connected => self.device_connected(),
            DeviceEvent::Disconnected => {
                self.state.device_down();
                tracing::info!("tv disconnected");
                self.publish(&self.prefix.connected(), "0");
            }
            DeviceEvent::Error(e) => {
                if self.state.note_error(&e) {
                    tracing::error!(error = %e, "tv error");
                }
            }
            DeviceEvent::Update { uri, payload } => self.handle_update(&uri, &payload),
            DeviceEvent::SubscriptionFailed { uri, error } => {
                tracing::error!(uri = %uri, error = %error, "Subscription failed");
            }
        }
    }

    fn device_connected(&mut self) {
        self.state.device_up();
        tracing::info!("tv connected");
        self.publish(&self.prefix.connected(), "1");

        for uri in CONNECT_SUBSCRIPTIONS {
            if let Err(e) = self.device.subscribe(uri) {
                tracing::warn!(uri = %uri, error = %e, "Subscription not queued");
            }
        }
    }

    fn handle_update(&mut self, uri: &str, payload: &Value) {
        match uri {
            uri::AUDIO_STATUS => self.relay_audio_status(payload),
            uri::FOREGROUND_APP_INFO => self.relay_foreground_app(payload),
            uri::CURRENT_CHANNEL => self.relay_channel(payload),
            uri::EXTERNAL_INPUT_LIST => tracing::info!(inputs = %payload, "getExternalInputList"),
            _ => tracing::debug!(uri = %uri, "Ignoring update"),
        }
    }

    fn relay_audio_status(&self, payload: &Value) {
        tracing::info!(payload = %payload, "audio status");
        let Some(volume_status) = payload.get("volumeStatus") else {
            let error = ParseError::MissingField("volumeStatus".to_string());
            tracing::error!(error = %error, payload = %payload, "Unexpected audio status");
            return;
        };

        for (field, key) in [
            (status::VOLUME, "volume"),
            (status::MUTE, "muteStatus"),
            (status::SOUND_OUTPUT, "soundOutput"),
        ] {
            match volume_status.get(key) {
                Some(value) => self.publish(&self.prefix.status(field), &status_text(value)),
                None => tracing::warn!(field = key, "Audio status field missing"),
            }
        }
    }

    fn relay_foreground_app(&mut self, payload: &Value) {
        let app_id = payload.get("appId").and_then(Value::as_str).unwrap_or_default();
        tracing::info!(app_id = %app_id, "foreground app");
        self.publish(&self.prefix.status(status::FOREGROUND_APP), app_id);
        self.state.set_foreground_app(app_id);

        if app_id == LIVE_TV_APP_ID && self.state.arm_channels() {
            self.schedule_channel_subscription();
        }
    }

    fn relay_channel(&self, payload: &Value) {
        let message = json!({
            "val": payload.get("channelNumber").cloned().unwrap_or(Value::Null),
            "lgtv": payload,
        });
        self.publish(
            &self.prefix.status(status::CURRENT_CHANNEL),
            &message.to_string(),
        );
    }

    fn schedule_channel_subscription(&self) {
        let device = self.device.clone();
        let timers = self.state.timers();
        tokio::spawn(async move {
            let subscribe = async {
                tokio::time::sleep(CHANNEL_ARM_DELAY).await;
                device.subscribe(uri::CURRENT_CHANNEL)
            };
            match timers.run_until_cancelled(subscribe).await {
                Some(Err(e)) => tracing::warn!(error = %e, "Channel subscription not queued"),
                Some(Ok(())) => {}
                None => tracing::debug!("Channel subscription cancelled"),
            }
        });
    }
}

/// String form of a status value: strings verbatim, anything else as JSON.
fn status_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::bridge::testing::bridge;

    fn update(uri: &str, payload: Value) -> DeviceEvent {
        DeviceEvent::Update {
            uri: uri.to_string(),
            payload,
        }
    }

    fn foreground(app_id: &str) -> DeviceEvent {
        update(uri::FOREGROUND_APP_INFO, json!({ "appId": app_id }))
    }

    #[test]
    fn status_text_coercion() {
        assert_eq!(status_text(&json!("tv_speaker")), "tv_speaker");
        assert_eq!(status_text(&json!(12)), "12");
        assert_eq!(status_text(&json!(false)), "false");
        assert_eq!(status_text(&Value::Null), "null");
    }

    #[tokio::test]
    async fn connect_publishes_and_subscribes() {
        let (mut bridge, device) = bridge();
        bridge.handle_device_event(DeviceEvent::Connected);

        assert_eq!(bridge.bus.published_to("lgtv/connected"), vec!["1"]);
        assert_eq!(device.subscriptions(), CONNECT_SUBSCRIPTIONS.to_vec());
        assert!(bridge.state().device_connected());
    }

    #[tokio::test]
    async fn disconnect_publishes_zero_once() {
        let (mut bridge, _device) = bridge();
        bridge.handle_device_event(DeviceEvent::Connected);
        bridge.handle_device_event(DeviceEvent::Disconnected);

        assert_eq!(bridge.bus.published_to("lgtv/connected"), vec!["1", "0"]);
        assert!(!bridge.state().device_connected());
    }

    #[tokio::test]
    async fn audio_status_fans_out() {
        let (mut bridge, _device) = bridge();
        bridge.handle_device_event(update(
            uri::AUDIO_STATUS,
            json!({
                "volumeStatus": { "volume": 15, "muteStatus": false, "soundOutput": "tv_speaker" },
                "returnValue": true
            }),
        ));

        assert_eq!(
            bridge.bus.published(),
            vec![
                ("lgtv/status/volume".to_string(), "15".to_string()),
                ("lgtv/status/mute".to_string(), "false".to_string()),
                ("lgtv/status/soundOutput".to_string(), "tv_speaker".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn malformed_audio_status_is_not_published() {
        let (mut bridge, _device) = bridge();
        bridge.handle_device_event(update(uri::AUDIO_STATUS, json!({ "volume": 15 })));
        assert!(bridge.bus.published().is_empty());
    }

    #[tokio::test]
    async fn foreground_app_updates_state() {
        let (mut bridge, _device) = bridge();
        bridge.handle_device_event(foreground("netflix"));
        assert_eq!(bridge.state().foreground_app(), Some("netflix"));

        bridge.handle_device_event(update(uri::FOREGROUND_APP_INFO, json!({})));
        assert!(bridge.state().foreground_app().is_none());

        assert_eq!(
            bridge.bus.published_to("lgtv/status/foregroundApp"),
            vec!["netflix", ""]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn channel_subscription_armed_once() {
        let (mut bridge, device) = bridge();
        bridge.handle_device_event(DeviceEvent::Connected);
        bridge.handle_device_event(foreground(LIVE_TV_APP_ID));
        bridge.handle_device_event(foreground(LIVE_TV_APP_ID));

        tokio::time::sleep(Duration::from_millis(2400)).await;
        assert!(!device.subscriptions().contains(&uri::CURRENT_CHANNEL.to_string()));

        tokio::time::sleep(Duration::from_millis(200)).await;
        bridge.handle_device_event(foreground("netflix"));
        bridge.handle_device_event(foreground(LIVE_TV_APP_ID));
        tokio::time::sleep(Duration::from_secs(5)).await;

        let channel_subs = device
            .subscriptions()
            .into_iter()
            .filter(|s| s == uri::CURRENT_CHANNEL)
            .count();
        assert_eq!(channel_subs, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn channel_subscription_rearmed_after_reconnect() {
        let (mut bridge, device) = bridge();
        bridge.handle_device_event(DeviceEvent::Connected);
        bridge.handle_device_event(foreground(LIVE_TV_APP_ID));
        tokio::time::sleep(Duration::from_secs(3)).await;

        bridge.handle_device_event(DeviceEvent::Disconnected);
        bridge.handle_device_event(DeviceEvent::Connected);
        bridge.handle_device_event(foreground(LIVE_TV_APP_ID));
        tokio::time::sleep(Duration::from_secs(3)).await;

        let channel_subs = device
            .subscriptions()
            .into_iter()
            .filter(|s| s == uri::CURRENT_CHANNEL)
            .count();
        assert_eq!(channel_subs, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn disconnect_cancels_pending_timers() {
        let (mut bridge, device) = bridge();
        bridge.handle_device_event(DeviceEvent::Connected);
        bridge.handle_device_event(foreground(LIVE_TV_APP_ID));
        bridge.handle_message("lgtv/set/open_max", "https://example.com");

        tokio::time::sleep(Duration::from_millis(1000)).await;
        bridge.handle_device_event(DeviceEvent::Disconnected);
        tokio::time::sleep(Duration::from_secs(10)).await;

        assert!(!device.subscriptions().contains(&uri::CURRENT_CHANNEL.to_string()));
        assert!(device.pointer_events().is_empty());
    }

    #[tokio::test]
    async fn channel_update_is_composite() {
        let (mut bridge, _device) = bridge();
        let raw = json!({ "channelNumber": "7", "channelName": "BBC One" });
        bridge.handle_device_event(update(uri::CURRENT_CHANNEL, raw.clone()));

        let published = bridge.bus.published_to("lgtv/status/currentChannel");
        assert_eq!(published.len(), 1);
        let message: Value = serde_json::from_str(&published[0]).unwrap();
        assert_eq!(message, json!({ "val": "7", "lgtv": raw }));
    }

    #[tokio::test]
    async fn bus_connect_reports_device_state_and_subscribes() {
        let (mut bridge, _device) = bridge();
        bridge.handle_bus_event(BusEvent::Connected);
        bridge.handle_device_event(DeviceEvent::Connected);
        bridge.handle_bus_event(BusEvent::Disconnected);
        bridge.handle_bus_event(BusEvent::Connected);

        assert_eq!(bridge.bus.published_to("lgtv/connected"), vec!["0", "1", "1"]);
        assert_eq!(bridge.bus.filters(), vec!["lgtv/set/#", "lgtv/set/#"]);
        assert!(bridge.state().bus_connected());
    }

    #[tokio::test]
    async fn bus_message_is_routed() {
        let (mut bridge, device) = bridge();
        bridge.handle_bus_event(BusEvent::Message {
            topic: "lgtv/set/toast".to_string(),
            payload: "hi".to_string(),
        });
        assert_eq!(device.requests().len(), 1);
    }

    #[tokio::test]
    async fn repeated_device_errors_tracked() {
        let (mut bridge, _device) = bridge();
        bridge.handle_device_event(DeviceEvent::Error("ECONNREFUSED".to_string()));
        assert!(!bridge.state.note_error("ECONNREFUSED"));

        bridge.handle_device_event(DeviceEvent::Disconnected);
        assert!(bridge.state.note_error("ECONNREFUSED"));
    }

    #[tokio::test]
    async fn run_stops_on_shutdown() {
        let (bridge, device) = bridge();
        let (bus_tx, bus_rx) = tokio::sync::mpsc::channel(8);
        let (device_tx, device_rx) = tokio::sync::mpsc::channel(8);
        let shutdown = tokio_util::sync::CancellationToken::new();

        let handle = tokio::spawn(bridge.run(bus_rx, device_rx, shutdown.clone()));
        device_tx.send(DeviceEvent::Connected).await.unwrap();
        bus_tx
            .send(BusEvent::Message {
                topic: "lgtv/set/mute".to_string(),
                payload: "false".to_string(),
            })
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(50)).await;
        shutdown.cancel();
        handle.await.unwrap();

        assert_eq!(device.subscriptions().len(), CONNECT_SUBSCRIPTIONS.len());
        assert_eq!(device.requests().len(), 1);
    }
}
