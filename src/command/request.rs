// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device API requests.

use std::fmt;

use serde_json::Value;

/// Well-known device API identifiers.
pub mod uri {
    /// Power the television off.
    pub const TURN_OFF: &str = "ssap://system/turnOff";
    /// Show a toast notification.
    pub const CREATE_TOAST: &str = "ssap://com.webos.notification/createToast";
    /// Set master volume.
    pub const SET_VOLUME: &str = "ssap://com.webos.service.audio/master/setVolume";
    /// Set mute state.
    pub const SET_MUTE: &str = "luna://com.webos.service.apiadapter/audio/setMute";
    /// Switch the audio output route.
    pub const CHANGE_SOUND_OUTPUT: &str =
        "luna://com.webos.service.apiadapter/audio/changeSoundOutput";
    /// Launch an application by id.
    pub const LAUNCH_APP: &str = "ssap://com.webos.applicationManager/launch";
    /// Launch through the system launcher.
    pub const LAUNCHER_LAUNCH: &str = "ssap://system.launcher/launch";
    /// Open a URL or target through the system launcher.
    pub const LAUNCHER_OPEN: &str = "ssap://system.launcher/open";
    /// Obtain the pointer input socket path.
    pub const POINTER_INPUT_SOCKET: &str =
        "ssap://com.webos.service.networkinput/getPointerInputSocket";
    /// Audio status updates.
    pub const AUDIO_STATUS: &str = "luna://com.webos.service.apiadapter/audio/getStatus";
    /// Foreground application updates.
    pub const FOREGROUND_APP_INFO: &str =
        "luna://com.webos.applicationManager/getForegroundAppInfo";
    /// Current live-TV channel updates.
    pub const CURRENT_CHANNEL: &str = "ssap://tv/getCurrentChannel";
    /// External input list updates.
    pub const EXTERNAL_INPUT_LIST: &str = "ssap://tv/getExternalInputList";
}

/// A single request/response call against the device API.
///
/// # Examples
///
/// ```
/// use lgtv_bridge::command::DeviceRequest;
/// use serde_json::json;
///
/// let req = DeviceRequest::new("ssap://system/turnOff", None);
/// assert_eq!(req.to_string(), "ssap://system/turnOff:null");
///
/// let req = DeviceRequest::new("ssap://foo/bar", Some(json!({"x": 1})));
/// assert_eq!(req.to_string(), r#"ssap://foo/bar:{"x":1}"#);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceRequest {
    uri: String,
    payload: Option<Value>,
}

impl DeviceRequest {
    /// Creates a request.
    #[must_use]
    pub fn new(uri: impl Into<String>, payload: Option<Value>) -> Self {
        Self {
            uri: uri.into(),
            payload,
        }
    }

    /// Returns the API identifier.
    #[must_use]
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Returns the request payload.
    #[must_use]
    pub fn payload(&self) -> Option<&Value> {
        self.payload.as_ref()
    }

    /// Splits the request into its parts.
    #[must_use]
    pub fn into_parts(self) -> (String, Option<Value>) {
        (self.uri, self.payload)
    }
}

impl fmt::Display for DeviceRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.payload {
            Some(payload) => write!(f, "{}:{payload}", self.uri),
            None => write!(f, "{}:null", self.uri),
        }
    }
}
