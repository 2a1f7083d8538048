// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Inbound command routing.

use std::time::Duration;

use super::{Bridge, Feedback, MAXIMIZE_DELAY};
use crate::command::{Command, DeviceRequest, PointerDelta, PointerEvent, uri};
use crate::device::DeviceControl;
use crate::error::{Error, ProtocolError};
use crate::protocol::BusPublisher;
use crate::types::PowerState;

/// Pointer moves making up the maximize gesture.
const MAXIMIZE_STEPS: usize = 22;

/// Pause between the last move of the gesture and the click.
const MAXIMIZE_CLICK_DELAY: Duration = Duration::from_millis(1000);

impl<B: BusPublisher, D: DeviceControl> Bridge<B, D> {
    /// Handles one inbound bus message.
    ///
    /// Topics outside `<prefix>/set/` are ignored. Malformed payloads are
    /// logged and the message is dropped; at most one television call is
    /// issued per message.
    pub fn handle_message(&mut self, topic: &str, payload: &str) {
        tracing::info!(topic = %topic, payload = %payload, "mqtt <");

        let Some(command_topic) = self.prefix.parse_command(topic) else {
            return;
        };

        match Command::parse(command_topic, payload) {
            Ok(command) => self.dispatch(command),
            Err(e) => {
                tracing::error!(
                    action = %command_topic.action(),
                    payload = %payload,
                    error = %e,
                    "Dropping command with malformed payload"
                );
            }
        }
    }

    fn dispatch(&mut self, command: Command) {
        match command {
            Command::Pointer(event) => {
                tracing::info!(kind = event.kind(), "lg > pointer");
                report(self.device.send_pointer(event));
            }
            Command::Power(PowerState::On) => self.power_on(),
            command => {
                let Some(request) = command.to_request() else {
                    return;
                };
                if let Command::Power(PowerState::Off) = command {
                    tracing::info!("power_off");
                }
                tracing::info!("lg > {request}");
                report(self.device.request(request));

                if let Command::Open { maximize: true, .. } = command {
                    self.schedule_maximize();
                }
            }
        }
    }

    /// Sends the wake packet in the background; the outcome comes back as
    /// [`Feedback::Woken`].
    fn power_on(&self) {
        tracing::info!("power_on");
        let waker = self.waker.clone();
        let feedback = self.feedback_tx.clone();
        tokio::spawn(async move {
            let result = waker.wake().await;
            // The receiver lives as long as the bridge.
            let _ = feedback.send(Feedback::Woken(result));
        });
    }

    /// Finishes power-on once the wake packet is out.
    ///
    /// A television in network standby completes its wake handshake when it
    /// receives `turnOff`, so that request is sent whenever no foreground
    /// application is known.
    pub(super) fn power_on_completed(&mut self, result: Result<usize, Error>) {
        match result {
            Ok(bytes) => tracing::info!(bytes, "WOL: packet sent"),
            Err(e) => tracing::error!(error = %e, "WOL: failed"),
        }

        if self.state.foreground_app().is_none() {
            tracing::info!("lg > {} (to turn it on...)", uri::TURN_OFF);
            report(self.device.request(DeviceRequest::new(uri::TURN_OFF, None)));
        }
    }

    /// Moves the pointer into the window's corner and clicks the maximize
    /// button after [`MAXIMIZE_DELAY`].
    fn schedule_maximize(&self) {
        let device = self.device.clone();
        let timers = self.state.timers();
        tokio::spawn(async move {
            let gesture = async {
                tokio::time::sleep(MAXIMIZE_DELAY).await;
                let step = PointerEvent::Glide(PointerDelta::new(11, -8));
                for _ in 0..MAXIMIZE_STEPS {
                    device.send_pointer(step.clone())?;
                }
                tokio::time::sleep(MAXIMIZE_CLICK_DELAY).await;
                device.send_pointer(PointerEvent::Click)
            };

            match timers.run_until_cancelled(gesture).await {
                Some(result) => report(result),
                None => tracing::debug!("Maximize gesture cancelled"),
            }
        });
    }
}

fn report(result: Result<(), ProtocolError>) {
    if let Err(e) = result {
        tracing::warn!(error = %e, "Television call not queued");
    }
}

#[cfg(test)]
mod tests {
    use std::net::{IpAddr, Ipv4Addr};

    use serde_json::json;
    use tokio::net::UdpSocket;

    use super::*;
    use crate::bridge::testing::{DeviceCall, bridge, bridge_with};
    use crate::types::MacAddress;
    use crate::wake::{MAGIC_PACKET_LEN, WakeOnLan};

    fn request(uri: &str, payload: serde_json::Value) -> DeviceCall {
        DeviceCall::Request(DeviceRequest::new(uri, Some(payload)))
    }

    #[tokio::test]
    async fn ignores_topics_outside_set() {
        let (mut bridge, device) = bridge();
        bridge.handle_message("lgtv/status/volume", "10");
        bridge.handle_message("lgtv/connected", "1");
        bridge.handle_message("other/set/volume", "10");
        bridge.handle_message("lgtv/set/", "10");
        bridge.handle_message("lgtv", "");
        assert!(device.calls().is_empty());
    }

    #[tokio::test]
    async fn leading_slash_is_optional() {
        let (mut bridge, device) = bridge();
        bridge.handle_message("/lgtv/set/toast", "hello");
        assert_eq!(
            device.calls(),
            vec![request(uri::CREATE_TOAST, json!({"message": "hello"}))]
        );
    }

    #[tokio::test]
    async fn mute_payloads() {
        let (mut bridge, device) = bridge();
        bridge.handle_message("lgtv/set/mute", "false");
        bridge.handle_message("lgtv/set/mute", "true");
        bridge.handle_message("lgtv/set/mute", "");
        bridge.handle_message("lgtv/set/mute", "0");
        assert_eq!(
            device.calls(),
            vec![
                request(uri::SET_MUTE, json!({"mute": false})),
                request(uri::SET_MUTE, json!({"mute": true})),
                request(uri::SET_MUTE, json!({"mute": true})),
                request(uri::SET_MUTE, json!({"mute": true})),
            ]
        );
    }

    #[tokio::test]
    async fn volume_parse_failure_still_calls() {
        let (mut bridge, device) = bridge();
        bridge.handle_message("lgtv/set/volume", "37");
        bridge.handle_message("lgtv/set/volume", "abc");
        assert_eq!(
            device.calls(),
            vec![
                request(uri::SET_VOLUME, json!({"volume": 37})),
                request(uri::SET_VOLUME, json!({"volume": null})),
            ]
        );
    }

    #[tokio::test]
    async fn power_off_payloads() {
        let (mut bridge, device) = bridge();
        bridge.handle_message("lgtv/set/power", "0");
        bridge.handle_message("lgtv/set/power", "false");
        assert_eq!(
            device.calls(),
            vec![
                DeviceCall::Request(DeviceRequest::new(uri::TURN_OFF, None)),
                DeviceCall::Request(DeviceRequest::new(uri::TURN_OFF, None)),
            ]
        );
    }

    #[tokio::test]
    async fn power_on_sends_wake_packet_then_turn_off() {
        let receiver = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let port = receiver.local_addr().unwrap().port();
        let mac: MacAddress = "a0:b1:c2:d3:e4:f5".parse().unwrap();
        let waker = WakeOnLan::new(Some(mac), IpAddr::V4(Ipv4Addr::LOCALHOST)).with_port(port);
        let (mut bridge, device) = bridge_with(waker);

        bridge.handle_message("lgtv/set/power", "on");

        let mut buf = [0u8; 256];
        let (len, _) = receiver.recv_from(&mut buf).await.unwrap();
        assert_eq!(len, MAGIC_PACKET_LEN);
        assert_eq!(&buf[6..12], &mac.octets());
        assert!(device.calls().is_empty());

        let feedback = bridge.feedback_rx.recv().await.unwrap();
        bridge.handle_feedback(feedback);
        assert_eq!(
            device.requests(),
            vec![DeviceRequest::new(uri::TURN_OFF, None)]
        );
    }

    #[tokio::test]
    async fn power_on_with_foreground_app_only_wakes() {
        let (mut bridge, device) = bridge();
        bridge.state.set_foreground_app("com.webos.app.hdmi2");

        for payload in ["1", "on", ""] {
            bridge.handle_message("lgtv/set/power", payload);
            let feedback = bridge.feedback_rx.recv().await.unwrap();
            bridge.handle_feedback(feedback);
        }
        assert!(device.calls().is_empty());
    }

    #[tokio::test]
    async fn power_on_without_mac_still_finishes() {
        let (mut bridge, device) = bridge();
        bridge.handle_message("lgtv/set/power", "1");

        let Feedback::Woken(result) = bridge.feedback_rx.recv().await.unwrap();
        assert!(result.is_err());
        bridge.power_on_completed(result);
        assert_eq!(device.requests().len(), 1);
    }

    #[tokio::test]
    async fn fallback_forwards_path_and_payload() {
        let (mut bridge, device) = bridge();
        bridge.handle_message("lgtv/set/foo/bar", r#"{"x":1}"#);
        bridge.handle_message("lgtv/set/foo/bar", "");
        assert_eq!(
            device.calls(),
            vec![
                request("ssap://foo/bar", json!({"x": 1})),
                DeviceCall::Request(DeviceRequest::new("ssap://foo/bar", None)),
            ]
        );
    }

    #[tokio::test]
    async fn fallback_with_bad_json_is_dropped() {
        let (mut bridge, device) = bridge();
        bridge.handle_message("lgtv/set/foo/bar", "{not json");
        assert!(device.calls().is_empty());

        bridge.handle_message("lgtv/set/toast", "still alive");
        assert_eq!(device.calls().len(), 1);
    }

    #[tokio::test]
    async fn pointer_commands() {
        let (mut bridge, device) = bridge();
        bridge.handle_message("lgtv/set/move", r#"{"dx":4,"dy":-1}"#);
        bridge.handle_message("lgtv/set/drag", r#"{"dx":1,"dy":1}"#);
        bridge.handle_message("lgtv/set/scroll", r#"{"dx":0,"dy":5}"#);
        bridge.handle_message("lgtv/set/click", "whatever");
        bridge.handle_message("lgtv/set/button", "home");
        bridge.handle_message("lgtv/set/move", "garbage");

        assert_eq!(
            device.pointer_events(),
            vec![
                PointerEvent::Move {
                    delta: PointerDelta::new(4, -1),
                    drag: false
                },
                PointerEvent::Move {
                    delta: PointerDelta::new(1, 1),
                    drag: true
                },
                PointerEvent::Scroll(PointerDelta::new(0, 5)),
                PointerEvent::Click,
                PointerEvent::Button("HOME".to_string()),
            ]
        );
        assert!(device.requests().is_empty());
    }

    #[tokio::test]
    async fn launch_and_deep_links() {
        let (mut bridge, device) = bridge();
        bridge.handle_message("lgtv/set/launch", "com.webos.app.browser");
        bridge.handle_message("lgtv/set/netflix", "80057281");
        bridge.handle_message("lgtv/set/youtube", "");

        assert_eq!(
            device.calls(),
            vec![
                request(uri::LAUNCH_APP, json!({"id": "com.webos.app.browser"})),
                request(
                    uri::LAUNCHER_LAUNCH,
                    json!({
                        "id": "netflix",
                        "contentId": "m=http://api.netflix.com/catalog/titles/movies/80057281&source_type=4"
                    })
                ),
                request(uri::LAUNCH_APP, json!({"id": "youtube.leanback.v4"})),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn open_max_runs_gesture_after_delay() {
        let (mut bridge, device) = bridge();
        bridge.handle_message("lgtv/set/open_max", "https://example.com");
        assert_eq!(
            device.calls(),
            vec![request(uri::LAUNCHER_OPEN, json!({"target": "https://example.com"}))]
        );

        tokio::time::sleep(Duration::from_millis(4900)).await;
        assert!(device.pointer_events().is_empty());

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(device.pointer_events().len(), MAXIMIZE_STEPS);

        tokio::time::sleep(Duration::from_millis(1000)).await;
        let events = device.pointer_events();
        assert_eq!(events.len(), MAXIMIZE_STEPS + 1);
        assert_eq!(events.last(), Some(&PointerEvent::Click));
        assert!(
            events[..MAXIMIZE_STEPS]
                .iter()
                .all(|ev| ev.encode() == "type:move\ndx:11\ndy:-8\ndown:0\n\n")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn open_does_not_maximize() {
        let (mut bridge, device) = bridge();
        bridge.handle_message("lgtv/set/open", "https://example.com");
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(device.pointer_events().is_empty());
    }
}
