// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! SSAP wire messages.
//!
//! The television speaks JSON over WebSocket. Every frame carries a `type`
//! and an `id` chosen by the client; responses echo the id.
//!
//! ```text
//! → {"type":"register","id":"register_0","payload":{"client-key":"..", ..}}
//! ← {"type":"response","id":"register_0","payload":{"pairingType":"PROMPT"}}
//! ← {"type":"registered","id":"register_0","payload":{"client-key":".."}}
//! → {"type":"subscribe","id":"1","uri":"ssap://tv/getCurrentChannel"}
//! ← {"type":"response","id":"1","payload":{"channelNumber":"7", ..}}
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::error::ParseError;

/// Id used for the registration handshake.
pub const REGISTER_ID: &str = "register_0";

/// Permissions requested when pairing.
const PERMISSIONS: &[&str] = &[
    "LAUNCH",
    "LAUNCH_WEBAPP",
    "APP_TO_APP",
    "CLOSE",
    "TEST_OPEN",
    "TEST_PROTECTED",
    "CONTROL_AUDIO",
    "CONTROL_DISPLAY",
    "CONTROL_INPUT_JOYSTICK",
    "CONTROL_INPUT_MEDIA_RECORDING",
    "CONTROL_INPUT_MEDIA_PLAYBACK",
    "CONTROL_INPUT_TV",
    "CONTROL_POWER",
    "CONTROL_INPUT_TEXT",
    "CONTROL_MOUSE_AND_KEYBOARD",
    "READ_APP_STATUS",
    "READ_CURRENT_CHANNEL",
    "READ_INPUT_DEVICE_LIST",
    "READ_NETWORK_STATE",
    "READ_RUNNING_APPS",
    "READ_TV_CHANNEL_LIST",
    "READ_POWER_STATE",
    "READ_COUNTRY_INFO",
    "READ_INSTALLED_APPS",
    "READ_SETTINGS",
    "WRITE_NOTIFICATION_TOAST",
];

/// The `type` field of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    /// Client asks to pair.
    Register,
    /// Pairing accepted.
    Registered,
    /// One-shot call.
    Request,
    /// Call that keeps pushing updates.
    Subscribe,
    /// Reply to a request or subscription.
    Response,
    /// Failure reply.
    Error,
    /// Anything this client does not handle.
    #[serde(other)]
    Unknown,
}

/// A frame sent to the television.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Outbound {
    #[serde(rename = "type")]
    kind: MessageType,
    id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    uri: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    payload: Option<Value>,
}

impl Outbound {
    /// Builds the registration frame, carrying a stored client key if any.
    #[must_use]
    pub fn register(client_key: Option<&str>) -> Self {
        let mut payload = json!({
            "forcePairing": false,
            "pairingType": "PROMPT",
            "manifest": {
                "manifestVersion": 1,
                "appVersion": env!("CARGO_PKG_VERSION"),
                "permissions": PERMISSIONS,
            },
        });
        if let Some(key) = client_key {
            payload["client-key"] = Value::String(key.to_string());
        }

        Self {
            kind: MessageType::Register,
            id: REGISTER_ID.to_string(),
            uri: None,
            payload: Some(payload),
        }
    }

    /// Builds a one-shot request frame.
    #[must_use]
    pub fn request(id: impl Into<String>, uri: impl Into<String>, payload: Option<Value>) -> Self {
        Self {
            kind: MessageType::Request,
            id: id.into(),
            uri: Some(uri.into()),
            payload,
        }
    }

    /// Builds a subscription frame.
    #[must_use]
    pub fn subscribe(id: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            kind: MessageType::Subscribe,
            id: id.into(),
            uri: Some(uri.into()),
            payload: None,
        }
    }

    /// Returns the message id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Serializes the frame.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::Json`] if the payload cannot be serialized.
    pub fn to_json(&self) -> Result<String, ParseError> {
        Ok(serde_json::to_string(self)?)
    }
}

/// A frame received from the television.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Inbound {
    /// Message type.
    #[serde(rename = "type")]
    pub kind: MessageType,
    /// Echoed id, absent on unsolicited frames.
    #[serde(default)]
    pub id: Option<String>,
    /// Response body.
    #[serde(default)]
    pub payload: Value,
    /// Error description for [`MessageType::Error`].
    #[serde(default)]
    pub error: Option<String>,
}

impl Inbound {
    /// Parses a text frame.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::Json`] if the frame is not a valid message.
    pub fn parse(text: &str) -> Result<Self, ParseError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Returns the client key handed out on successful pairing.
    #[must_use]
    pub fn client_key(&self) -> Option<&str> {
        self.payload.get("client-key").and_then(Value::as_str)
    }

    /// Returns whether the television is waiting for the user to accept pairing.
    #[must_use]
    pub fn is_pairing_prompt(&self) -> bool {
        self.payload.get("pairingType").and_then(Value::as_str) == Some("PROMPT")
    }

    /// Returns the failure text if this frame reports an error.
    ///
    /// A `response` with `returnValue: false` is treated as a failure too.
    #[must_use]
    pub fn failure(&self) -> Option<String> {
        if self.kind == MessageType::Error {
            return Some(self.error.clone().unwrap_or_else(|| "unknown error".to_string()));
        }
        if self.payload.get("returnValue").and_then(Value::as_bool) == Some(false) {
            let text = self
                .payload
                .get("errorText")
                .and_then(Value::as_str)
                .unwrap_or("returnValue false");
            return Some(text.to_string());
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_without_key() {
        let msg = Outbound::register(None);
        let value: Value = serde_json::from_str(&msg.to_json().unwrap()).unwrap();
        assert_eq!(value["type"], "register");
        assert_eq!(value["id"], REGISTER_ID);
        assert_eq!(value["payload"]["pairingType"], "PROMPT");
        assert!(value["payload"].get("client-key").is_none());
        assert!(value.get("uri").is_none());
        assert!(
            value["payload"]["manifest"]["permissions"]
                .as_array()
                .unwrap()
                .contains(&json!("CONTROL_POWER"))
        );
    }

    #[test]
    fn register_with_key() {
        let msg = Outbound::register(Some("abc123"));
        let value: Value = serde_json::from_str(&msg.to_json().unwrap()).unwrap();
        assert_eq!(value["payload"]["client-key"], "abc123");
    }

    #[test]
    fn request_frame() {
        let msg = Outbound::request("7", "ssap://system/turnOff", None);
        assert_eq!(
            msg.to_json().unwrap(),
            r#"{"type":"request","id":"7","uri":"ssap://system/turnOff"}"#
        );
    }

    #[test]
    fn subscribe_frame() {
        let msg = Outbound::subscribe("3", "ssap://tv/getCurrentChannel");
        assert_eq!(msg.id(), "3");
        assert_eq!(
            msg.to_json().unwrap(),
            r#"{"type":"subscribe","id":"3","uri":"ssap://tv/getCurrentChannel"}"#
        );
    }

    #[test]
    fn parse_registered() {
        let msg =
            Inbound::parse(r#"{"type":"registered","id":"register_0","payload":{"client-key":"k1"}}"#)
                .unwrap();
        assert_eq!(msg.kind, MessageType::Registered);
        assert_eq!(msg.client_key(), Some("k1"));
    }

    #[test]
    fn parse_prompt() {
        let msg = Inbound::parse(
            r#"{"type":"response","id":"register_0","payload":{"pairingType":"PROMPT","returnValue":true}}"#,
        )
        .unwrap();
        assert!(msg.is_pairing_prompt());
        assert!(msg.failure().is_none());
    }

    #[test]
    fn parse_error_frame() {
        let msg = Inbound::parse(r#"{"type":"error","id":"4","error":"404 no such service"}"#)
            .unwrap();
        assert_eq!(msg.failure().as_deref(), Some("404 no such service"));
        assert_eq!(msg.payload, Value::Null);
    }

    #[test]
    fn return_value_false_is_failure() {
        let msg = Inbound::parse(
            r#"{"type":"response","id":"5","payload":{"returnValue":false,"errorText":"busy"}}"#,
        )
        .unwrap();
        assert_eq!(msg.failure().as_deref(), Some("busy"));
    }

    #[test]
    fn unknown_type_tolerated() {
        let msg = Inbound::parse(r#"{"type":"hello","payload":{}}"#).unwrap();
        assert_eq!(msg.kind, MessageType::Unknown);
        assert!(msg.id.is_none());
    }

    #[test]
    fn garbage_rejected() {
        assert!(matches!(Inbound::parse("not json"), Err(ParseError::Json(_))));
    }
}
