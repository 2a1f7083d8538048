// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Pointer input events.
//!
//! Pointer events travel over a dedicated WebSocket whose path the
//! television hands out on request. Each frame is a block of `key:value`
//! lines, the first being `type`, terminated by an empty line:
//!
//! ```text
//! type:move
//! dx:10
//! dy:-4
//! drag:0
//!
//! ```

use std::fmt::Write as _;

use serde::Deserialize;
use serde_json::Value;

use crate::error::ParseError;

/// Relative movement carried by `move`, `drag` and `scroll` payloads.
///
/// Values are kept as received, so numeric strings such as `"5"` pass
/// through to the television unchanged. A missing value is sent as `0`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PointerDelta {
    /// Horizontal delta.
    #[serde(default)]
    pub dx: Value,
    /// Vertical delta.
    #[serde(default)]
    pub dy: Value,
}

impl PointerDelta {
    /// Creates a delta from integers.
    #[must_use]
    pub fn new(dx: i64, dy: i64) -> Self {
        Self {
            dx: dx.into(),
            dy: dy.into(),
        }
    }

    /// Parses a `{"dx": .., "dy": ..}` payload.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::Json`] if the payload is not JSON, or
    /// [`ParseError::InvalidValue`] if it is not an object.
    pub fn from_json(payload: &str) -> Result<Self, ParseError> {
        let value: Value = serde_json::from_str(payload)?;
        if !value.is_object() {
            return Err(ParseError::InvalidValue {
                field: "pointer".to_string(),
                message: format!("expected a JSON object, got {payload}"),
            });
        }
        Ok(serde_json::from_value(value)?)
    }
}

/// Renders a delta component the way the pointer socket expects it.
fn scalar(value: &Value) -> String {
    match value {
        Value::Null => "0".to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// An event sent over the pointer input socket.
///
/// # Examples
///
/// ```
/// use lgtv_bridge::command::{PointerDelta, PointerEvent};
///
/// let click = PointerEvent::Click;
/// assert_eq!(click.encode(), "type:click\n\n");
///
/// let button = PointerEvent::button("home");
/// assert_eq!(button.encode(), "type:button\nname:HOME\n\n");
///
/// let drag = PointerEvent::Move { delta: PointerDelta::new(3, -2), drag: true };
/// assert_eq!(drag.encode(), "type:move\ndx:3\ndy:-2\ndrag:1\n\n");
///
/// let glide = PointerEvent::Glide(PointerDelta::new(11, -8));
/// assert_eq!(glide.encode(), "type:move\ndx:11\ndy:-8\ndown:0\n\n");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum PointerEvent {
    /// Relative pointer movement, optionally while holding the button.
    Move {
        /// Movement delta.
        delta: PointerDelta,
        /// Whether the button is held down.
        drag: bool,
    },
    /// Relative movement with the button reported as released (`down:0`).
    Glide(PointerDelta),
    /// Scroll by a delta.
    Scroll(PointerDelta),
    /// Click at the current pointer position.
    Click,
    /// Press a remote-control button, by upper-case name.
    Button(String),
}

impl PointerEvent {
    /// Creates a button press, upper-casing the name.
    #[must_use]
    pub fn button(name: &str) -> Self {
        Self::Button(name.to_uppercase())
    }

    /// Returns the event type as sent on the wire.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Move { .. } | Self::Glide(_) => "move",
            Self::Scroll(_) => "scroll",
            Self::Click => "click",
            Self::Button(_) => "button",
        }
    }

    /// Encodes the event as a pointer socket frame.
    #[must_use]
    pub fn encode(&self) -> String {
        let mut frame = format!("type:{}\n", self.kind());
        // Writing into a String cannot fail.
        let _ = match self {
            Self::Move { delta, drag } => writeln!(
                frame,
                "dx:{}\ndy:{}\ndrag:{}",
                scalar(&delta.dx),
                scalar(&delta.dy),
                u8::from(*drag)
            ),
            Self::Glide(delta) => writeln!(
                frame,
                "dx:{}\ndy:{}\ndown:0",
                scalar(&delta.dx),
                scalar(&delta.dy)
            ),
            Self::Scroll(delta) => {
                writeln!(frame, "dx:{}\ndy:{}", scalar(&delta.dx), scalar(&delta.dy))
            }
            Self::Button(name) => writeln!(frame, "name:{name}"),
            Self::Click => Ok(()),
        };
        frame.push('\n');
        frame
    }
}
