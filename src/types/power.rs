// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Power state requested through the `power` action.

use std::fmt;

/// Represents the power state requested for the television.
///
/// Only `"false"` and `"0"` mean off. Every other payload, including an
/// empty one, means on.
///
/// # Examples
///
/// ```
/// use lgtv_bridge::types::PowerState;
///
/// assert_eq!(PowerState::from_payload("0"), PowerState::Off);
/// assert_eq!(PowerState::from_payload("false"), PowerState::Off);
/// assert_eq!(PowerState::from_payload("on"), PowerState::On);
/// assert_eq!(PowerState::from_payload(""), PowerState::On);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PowerState {
    /// Power is off.
    Off,
    /// Power is on.
    On,
}

impl PowerState {
    /// Interprets a raw bus payload.
    #[must_use]
    pub fn from_payload(payload: &str) -> Self {
        match payload {
            "false" | "0" => Self::Off,
            _ => Self::On,
        }
    }

    /// Returns the lowercase name used in log lines.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::On => "on",
        }
    }
}

impl fmt::Display for PowerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<bool> for PowerState {
    fn from(value: bool) -> Self {
        if value { Self::On } else { Self::Off }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn off_payloads() {
        assert_eq!(PowerState::from_payload("false"), PowerState::Off);
        assert_eq!(PowerState::from_payload("0"), PowerState::Off);
    }

    #[test]
    fn everything_else_is_on() {
        for payload in ["1", "on", "true", "", "OFF", "False", " 0"] {
            assert_eq!(PowerState::from_payload(payload), PowerState::On, "{payload:?}");
        }
    }

    #[test]
    fn from_bool() {
        assert_eq!(PowerState::from(true), PowerState::On);
        assert_eq!(PowerState::from(false), PowerState::Off);
    }

    #[test]
    fn display() {
        assert_eq!(PowerState::On.to_string(), "on");
        assert_eq!(PowerState::Off.to_string(), "off");
    }
}
