// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Bus topic layout.
//!
//! All topics for one television live under a fixed prefix:
//!
//! ```text
//! <prefix>/set/<action>[/...]      inbound commands
//! <prefix>/status/<field>          outbound status
//! <prefix>/connected               outbound aggregate connectivity ("0"/"1")
//! ```

use std::fmt;

use crate::error::ConfigError;

/// Status fields published under `<prefix>/status/`.
pub mod status {
    /// Master volume level.
    pub const VOLUME: &str = "volume";
    /// Mute flag.
    pub const MUTE: &str = "mute";
    /// Active audio output route.
    pub const SOUND_OUTPUT: &str = "soundOutput";
    /// Foreground application id.
    pub const FOREGROUND_APP: &str = "foregroundApp";
    /// Current live-TV channel.
    pub const CURRENT_CHANNEL: &str = "currentChannel";
}

/// The topic namespace root for one television.
///
/// The prefix is used verbatim when building outbound topics. Inbound topics
/// are matched with an optional leading `/` on either side ignored.
///
/// # Examples
///
/// ```
/// use lgtv_bridge::topic::TopicPrefix;
///
/// let prefix = TopicPrefix::new("lgtv").unwrap();
/// assert_eq!(prefix.connected(), "lgtv/connected");
/// assert_eq!(prefix.status("volume"), "lgtv/status/volume");
/// assert_eq!(prefix.command_filter(), "lgtv/set/#");
///
/// let cmd = prefix.parse_command("/lgtv/set/volume").unwrap();
/// assert_eq!(cmd.action(), "volume");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicPrefix(String);

impl TopicPrefix {
    /// Creates a prefix.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Missing`] if the prefix is empty.
    pub fn new(prefix: impl Into<String>) -> Result<Self, ConfigError> {
        let prefix = prefix.into();
        if prefix.trim_matches('/').is_empty() {
            return Err(ConfigError::Missing("TOPIC_PREFIX"));
        }
        Ok(Self(prefix))
    }

    /// Returns the prefix as configured.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Topic carrying the aggregate connectivity flag.
    #[must_use]
    pub fn connected(&self) -> String {
        format!("{}/connected", self.0)
    }

    /// Topic for a status field.
    #[must_use]
    pub fn status(&self, field: &str) -> String {
        format!("{}/status/{field}", self.0)
    }

    /// Wildcard filter covering every inbound command.
    #[must_use]
    pub fn command_filter(&self) -> String {
        format!("{}/set/#", self.0)
    }

    /// Matches an inbound topic against `<prefix>/set/<action>[/...]`.
    ///
    /// Returns `None` for anything else, including a bare `<prefix>/set/`.
    #[must_use]
    pub fn parse_command<'a>(&self, topic: &'a str) -> Option<CommandTopic<'a>> {
        let topic = topic.strip_prefix('/').unwrap_or(topic);
        let prefix = self.0.strip_prefix('/').unwrap_or(&self.0);

        let path = topic.strip_prefix(prefix)?.strip_prefix("/set/")?;
        let action = path.split('/').next().unwrap_or_default();
        if action.is_empty() {
            return None;
        }

        Some(CommandTopic { action, path })
    }
}

impl fmt::Display for TopicPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An inbound command topic, borrowed from the received topic string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandTopic<'a> {
    action: &'a str,
    path: &'a str,
}

impl<'a> CommandTopic<'a> {
    /// The segment right after `set`.
    #[must_use]
    pub fn action(&self) -> &'a str {
        self.action
    }

    /// Everything after `<prefix>/set/`, used verbatim as a device API path
    /// for unrecognized actions.
    #[must_use]
    pub fn path(&self) -> &'a str {
        self.path
    }
}
