// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Commands received on the bus.
//!
//! Every message published to `<prefix>/set/<action>[/...]` is parsed into a
//! [`Command`]. The action segment selects the variant; the payload carries
//! its argument.
//!
//! # Available Actions
//!
//! | Action | Payload | Result |
//! |--------|---------|--------|
//! | `toast` | text | [`Command::Toast`] |
//! | `volume` | integer | [`Command::Volume`] |
//! | `mute` | `"false"` or anything | [`Command::Mute`] |
//! | `soundOutput` | output id | [`Command::SoundOutput`] |
//! | `launch` | app id | [`Command::Launch`] |
//! | `move` / `drag` / `scroll` | `{"dx":..,"dy":..}` | [`Command::Pointer`] |
//! | `click` | ignored | [`Command::Pointer`] |
//! | `button` | button name | [`Command::Pointer`] |
//! | `power` | `"0"`/`"false"` or anything | [`Command::Power`] |
//! | `open` / `open_max` | target | [`Command::Open`] |
//! | `netflix` | optional movie id | [`Command::Netflix`] |
//! | `youtube` | optional video id | [`Command::YouTube`] |
//! | anything else | optional JSON | [`Command::Raw`] |
//!
//! # Examples
//!
//! ```
//! use lgtv_bridge::command::Command;
//! use lgtv_bridge::topic::TopicPrefix;
//! use lgtv_bridge::types::Volume;
//!
//! let prefix = TopicPrefix::new("lgtv").unwrap();
//! let topic = prefix.parse_command("lgtv/set/volume").unwrap();
//!
//! let cmd = Command::parse(topic, "37").unwrap();
//! assert_eq!(cmd, Command::Volume(Volume::Level(37)));
//! ```

mod pointer;
mod request;

pub use pointer::{PointerDelta, PointerEvent};
pub use request::{DeviceRequest, uri};

use serde_json::{Value, json};

use crate::error::ParseError;
use crate::topic::CommandTopic;
use crate::types::{PowerState, Volume};

/// Application id of the Netflix app.
pub const NETFLIX_APP_ID: &str = "netflix";

/// Application id of the YouTube app.
pub const YOUTUBE_APP_ID: &str = "youtube.leanback.v4";

/// A parsed inbound command.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Show a toast notification.
    Toast(String),
    /// Set master volume.
    Volume(Volume),
    /// Set mute state.
    Mute(bool),
    /// Switch the audio output route.
    SoundOutput(String),
    /// Launch an application by id.
    Launch(String),
    /// Send a pointer input event.
    Pointer(PointerEvent),
    /// Switch power.
    Power(PowerState),
    /// Open a target through the system launcher.
    Open {
        /// URL or id to open.
        target: String,
        /// Whether to maximize the window afterwards.
        maximize: bool,
    },
    /// Launch Netflix, optionally deep-linking to a movie id.
    Netflix(Option<String>),
    /// Launch YouTube, optionally deep-linking to a video id.
    YouTube(Option<String>),
    /// Forward a payload verbatim to an arbitrary device API path.
    Raw {
        /// Path after `ssap://`.
        path: String,
        /// Parsed JSON payload, `None` for an empty payload.
        payload: Option<Value>,
    },
}

impl Command {
    /// Parses a command from its topic and raw payload.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::Json`] when a pointer payload or a non-empty
    /// fallback payload is not valid JSON.
    pub fn parse(topic: CommandTopic<'_>, payload: &str) -> Result<Self, ParseError> {
        let cmd = match topic.action() {
            "toast" => Self::Toast(payload.to_string()),
            "volume" => Self::Volume(Volume::parse(payload)),
            "mute" => Self::Mute(payload != "false"),
            "soundOutput" => Self::SoundOutput(payload.to_string()),
            "launch" => Self::Launch(payload.to_string()),
            action @ ("move" | "drag") => Self::Pointer(PointerEvent::Move {
                delta: PointerDelta::from_json(payload)?,
                drag: action == "drag",
            }),
            "scroll" => Self::Pointer(PointerEvent::Scroll(PointerDelta::from_json(payload)?)),
            "click" => Self::Pointer(PointerEvent::Click),
            "button" => Self::Pointer(PointerEvent::button(payload)),
            "power" => Self::Power(PowerState::from_payload(payload)),
            action @ ("open" | "open_max") => Self::Open {
                target: payload.to_string(),
                maximize: action == "open_max",
            },
            "netflix" => Self::Netflix(non_empty(payload)),
            "youtube" => Self::YouTube(non_empty(payload)),
            _ => Self::Raw {
                path: topic.path().to_string(),
                payload: if payload.is_empty() {
                    None
                } else {
                    Some(serde_json::from_str(payload)?)
                },
            },
        };
        Ok(cmd)
    }

    /// Returns the request this command maps to.
    ///
    /// Pointer events and power-on have no direct request: the former go
    /// over the pointer socket, the latter starts with a wake packet.
    #[must_use]
    pub fn to_request(&self) -> Option<DeviceRequest> {
        let request = match self {
            Self::Toast(message) => {
                DeviceRequest::new(uri::CREATE_TOAST, Some(json!({ "message": message })))
            }
            Self::Volume(volume) => {
                DeviceRequest::new(uri::SET_VOLUME, Some(json!({ "volume": volume })))
            }
            Self::Mute(mute) => DeviceRequest::new(uri::SET_MUTE, Some(json!({ "mute": mute }))),
            Self::SoundOutput(output) => DeviceRequest::new(
                uri::CHANGE_SOUND_OUTPUT,
                Some(json!({ "output": output })),
            ),
            Self::Launch(id) => DeviceRequest::new(uri::LAUNCH_APP, Some(json!({ "id": id }))),
            Self::Power(PowerState::Off) => DeviceRequest::new(uri::TURN_OFF, None),
            Self::Open { target, .. } => {
                DeviceRequest::new(uri::LAUNCHER_OPEN, Some(json!({ "target": target })))
            }
            Self::Netflix(movie) => {
                let payload = match movie {
                    Some(movie) => json!({
                        "id": NETFLIX_APP_ID,
                        "contentId": format!(
                            "m=http://api.netflix.com/catalog/titles/movies/{movie}&source_type=4"
                        ),
                    }),
                    None => json!({ "id": NETFLIX_APP_ID }),
                };
                DeviceRequest::new(uri::LAUNCHER_LAUNCH, Some(payload))
            }
            Self::YouTube(video) => {
                let payload = match video {
                    Some(video) => json!({
                        "id": YOUTUBE_APP_ID,
                        "params": { "contentTarget": format!("https://www.youtube.com/tv?v={video}") },
                    }),
                    None => json!({ "id": YOUTUBE_APP_ID }),
                };
                DeviceRequest::new(uri::LAUNCH_APP, Some(payload))
            }
            Self::Raw { path, payload } => {
                DeviceRequest::new(format!("ssap://{path}"), payload.clone())
            }
            Self::Pointer(_) | Self::Power(PowerState::On) => return None,
        };
        Some(request)
    }
}

fn non_empty(payload: &str) -> Option<String> {
    (!payload.is_empty()).then(|| payload.to_string())
}
