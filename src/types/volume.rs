// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Master volume parsed from a bus payload.

use std::fmt;

use serde::{Serialize, Serializer};

/// Volume level requested through the `volume` action.
///
/// Parsing takes the leading integer of the payload, ignoring leading
/// whitespace and any trailing garbage. A payload without a leading integer
/// is not rejected: it becomes [`Volume::Invalid`], which serializes to JSON
/// `null` and is still forwarded to the television.
///
/// # Examples
///
/// ```
/// use lgtv_bridge::types::Volume;
///
/// assert_eq!(Volume::parse("37"), Volume::Level(37));
/// assert_eq!(Volume::parse(" 12db"), Volume::Level(12));
/// assert_eq!(Volume::parse("abc"), Volume::Invalid);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Volume {
    /// A parsed integer level.
    Level(i64),
    /// The payload did not start with an integer.
    Invalid,
}

impl Volume {
    /// Parses the leading integer of a payload.
    #[must_use]
    pub fn parse(payload: &str) -> Self {
        let trimmed = payload.trim_start();
        let (negative, rest) = match trimmed.as_bytes().first() {
            Some(b'-') => (true, &trimmed[1..]),
            Some(b'+') => (false, &trimmed[1..]),
            _ => (false, trimmed),
        };

        let digits_len = rest.bytes().take_while(u8::is_ascii_digit).count();
        if digits_len == 0 {
            return Self::Invalid;
        }

        match rest[..digits_len].parse::<i64>() {
            Ok(level) if negative => Self::Level(-level),
            Ok(level) => Self::Level(level),
            Err(_) => Self::Invalid,
        }
    }

    /// Returns the level, if the payload contained one.
    #[must_use]
    pub const fn level(&self) -> Option<i64> {
        match self {
            Self::Level(level) => Some(*level),
            Self::Invalid => None,
        }
    }
}

impl fmt::Display for Volume {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Level(level) => write!(f, "{level}"),
            Self::Invalid => f.write_str("NaN"),
        }
    }
}

impl Serialize for Volume {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Level(level) => serializer.serialize_i64(*level),
            Self::Invalid => serializer.serialize_none(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_integer() {
        assert_eq!(Volume::parse("37"), Volume::Level(37));
        assert_eq!(Volume::parse("0"), Volume::Level(0));
    }

    #[test]
    fn parses_leading_integer() {
        assert_eq!(Volume::parse("  15"), Volume::Level(15));
        assert_eq!(Volume::parse("20.5"), Volume::Level(20));
        assert_eq!(Volume::parse("-3x"), Volume::Level(-3));
        assert_eq!(Volume::parse("+8"), Volume::Level(8));
    }

    #[test]
    fn garbage_is_invalid() {
        assert_eq!(Volume::parse("abc"), Volume::Invalid);
        assert_eq!(Volume::parse(""), Volume::Invalid);
        assert_eq!(Volume::parse("-"), Volume::Invalid);
        assert_eq!(Volume::parse("x12"), Volume::Invalid);
    }

    #[test]
    fn invalid_serializes_as_null() {
        assert_eq!(serde_json::to_value(Volume::Invalid).unwrap(), serde_json::Value::Null);
        assert_eq!(serde_json::to_value(Volume::Level(37)).unwrap(), serde_json::json!(37));
    }

    #[test]
    fn display() {
        assert_eq!(Volume::Level(5).to_string(), "5");
        assert_eq!(Volume::Invalid.to_string(), "NaN");
    }
}
