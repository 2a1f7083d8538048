// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Value types for television control.
//!
//! This module provides typed representations of the values carried by
//! inbound command payloads and by the wake signal.
//!
//! # Types
//!
//! - [`PowerState`] - On/Off as requested over the bus
//! - [`Volume`] - Master volume, possibly unparseable
//! - [`MacAddress`] - Hardware address used for wake packets

mod mac_address;
mod power;
mod volume;

pub use mac_address::MacAddress;
pub use power::PowerState;
pub use volume::Volume;
