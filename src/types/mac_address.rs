// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Hardware address type.

use std::fmt;
use std::str::FromStr;

use crate::error::ParseError;

/// A 48-bit hardware address.
///
/// Accepts colon or dash separated octets, or twelve bare hex digits.
///
/// # Examples
///
/// ```
/// use lgtv_bridge::types::MacAddress;
///
/// let mac: MacAddress = "a8:23:fe:01:02:03".parse().unwrap();
/// assert_eq!(mac.octets(), [0xa8, 0x23, 0xfe, 0x01, 0x02, 0x03]);
/// assert_eq!(mac.to_string(), "a8:23:fe:01:02:03");
///
/// assert!("a8:23:fe".parse::<MacAddress>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MacAddress([u8; 6]);

impl MacAddress {
    /// Creates an address from raw octets.
    #[must_use]
    pub const fn new(octets: [u8; 6]) -> Self {
        Self(octets)
    }

    /// Returns the raw octets.
    #[must_use]
    pub const fn octets(&self) -> [u8; 6] {
        self.0
    }
}

impl FromStr for MacAddress {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |message: &str| ParseError::InvalidValue {
            field: "mac address".to_string(),
            message: format!("{message}: {s}"),
        };

        let hex: String = s.trim().chars().filter(|c| *c != ':' && *c != '-').collect();
        if hex.len() != 12 {
            return Err(invalid("expected 6 octets"));
        }

        let mut octets = [0u8; 6];
        for (i, octet) in octets.iter_mut().enumerate() {
            let pair = hex.get(i * 2..i * 2 + 2).ok_or_else(|| invalid("not ascii"))?;
            *octet = u8::from_str_radix(pair, 16).map_err(|_| invalid("not hex"))?;
        }

        Ok(Self(octets))
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{a:02x}:{b:02x}:{c:02x}:{d:02x}:{e:02x}:{g:02x}")
    }
}
