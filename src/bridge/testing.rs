// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Recording doubles for the bus and the television.

use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;

use parking_lot::Mutex;

use super::Bridge;
use crate::command::{DeviceRequest, PointerEvent};
use crate::device::DeviceControl;
use crate::error::ProtocolError;
use crate::protocol::BusPublisher;
use crate::topic::TopicPrefix;
use crate::wake::WakeOnLan;

/// A call made on [`RecordingDevice`].
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum DeviceCall {
    Request(DeviceRequest),
    Subscribe(String),
    Pointer(PointerEvent),
}

#[derive(Debug, Clone, Default)]
pub(crate) struct RecordingDevice {
    calls: Arc<Mutex<Vec<DeviceCall>>>,
}

impl RecordingDevice {
    pub(crate) fn calls(&self) -> Vec<DeviceCall> {
        self.calls.lock().clone()
    }

    pub(crate) fn requests(&self) -> Vec<DeviceRequest> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                DeviceCall::Request(req) => Some(req),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn subscriptions(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                DeviceCall::Subscribe(uri) => Some(uri),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn pointer_events(&self) -> Vec<PointerEvent> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                DeviceCall::Pointer(event) => Some(event),
                _ => None,
            })
            .collect()
    }
}

impl DeviceControl for RecordingDevice {
    fn request(&self, request: DeviceRequest) -> Result<(), ProtocolError> {
        self.calls.lock().push(DeviceCall::Request(request));
        Ok(())
    }

    fn subscribe(&self, uri: &str) -> Result<(), ProtocolError> {
        self.calls.lock().push(DeviceCall::Subscribe(uri.to_string()));
        Ok(())
    }

    fn send_pointer(&self, event: PointerEvent) -> Result<(), ProtocolError> {
        self.calls.lock().push(DeviceCall::Pointer(event));
        Ok(())
    }
}

#[derive(Debug, Default)]
pub(crate) struct RecordingBus {
    published: Mutex<Vec<(String, String)>>,
    filters: Mutex<Vec<String>>,
}

impl RecordingBus {
    pub(crate) fn published(&self) -> Vec<(String, String)> {
        self.published.lock().clone()
    }

    pub(crate) fn published_to(&self, topic: &str) -> Vec<String> {
        self.published()
            .into_iter()
            .filter(|(t, _)| t == topic)
            .map(|(_, payload)| payload)
            .collect()
    }

    pub(crate) fn filters(&self) -> Vec<String> {
        self.filters.lock().clone()
    }
}

impl BusPublisher for RecordingBus {
    fn publish(&self, topic: &str, payload: &str) -> Result<(), ProtocolError> {
        self.published
            .lock()
            .push((topic.to_string(), payload.to_string()));
        Ok(())
    }

    fn subscribe(&self, filter: &str) -> Result<(), ProtocolError> {
        self.filters.lock().push(filter.to_string());
        Ok(())
    }
}

/// Bridge under the `lgtv` prefix with recording doubles and no MAC.
pub(crate) fn bridge() -> (Bridge<RecordingBus, RecordingDevice>, RecordingDevice) {
    let waker = WakeOnLan::new(None, IpAddr::V4(Ipv4Addr::LOCALHOST));
    bridge_with(waker)
}

pub(crate) fn bridge_with(
    waker: WakeOnLan,
) -> (Bridge<RecordingBus, RecordingDevice>, RecordingDevice) {
    let device = RecordingDevice::default();
    let prefix = TopicPrefix::new("lgtv").unwrap();
    let bridge = Bridge::new(prefix, RecordingBus::default(), device.clone(), waker);
    (bridge, device)
}
