// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Wake-on-LAN signaling.
//!
//! A television that is fully powered off does not accept WebSocket
//! connections. The only way to bring it back is a magic packet: six `0xFF`
//! bytes followed by the hardware address repeated sixteen times, broadcast
//! over UDP.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use tokio::net::UdpSocket;

use crate::error::{ConfigError, DeviceError, Error};
use crate::types::MacAddress;

/// UDP port conventionally used for magic packets.
pub const WAKE_PORT: u16 = 9;

/// Length of a magic packet in bytes.
pub const MAGIC_PACKET_LEN: usize = 6 + 16 * 6;

/// Builds the magic packet for a hardware address.
///
/// # Examples
///
/// ```
/// use lgtv_bridge::types::MacAddress;
/// use lgtv_bridge::wake::magic_packet;
///
/// let packet = magic_packet(MacAddress::new([1, 2, 3, 4, 5, 6]));
/// assert_eq!(&packet[..6], &[0xFF; 6]);
/// assert_eq!(&packet[6..12], &[1, 2, 3, 4, 5, 6]);
/// ```
#[must_use]
pub fn magic_packet(mac: MacAddress) -> [u8; MAGIC_PACKET_LEN] {
    let mut packet = [0xFF; MAGIC_PACKET_LEN];
    let octets = mac.octets();
    for chunk in packet[6..].chunks_exact_mut(6) {
        chunk.copy_from_slice(&octets);
    }
    packet
}

/// Sends wake packets for one television.
#[derive(Debug, Clone)]
pub struct WakeOnLan {
    mac: Option<MacAddress>,
    target: SocketAddr,
}

impl WakeOnLan {
    /// Creates a sender broadcasting to `broadcast` on [`WAKE_PORT`].
    ///
    /// A missing hardware address is accepted here and reported when a wake
    /// is attempted, so the rest of the bridge keeps working.
    #[must_use]
    pub fn new(mac: Option<MacAddress>, broadcast: IpAddr) -> Self {
        Self {
            mac,
            target: SocketAddr::new(broadcast, WAKE_PORT),
        }
    }

    /// Overrides the destination port.
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.target.set_port(port);
        self
    }

    /// Returns the configured hardware address.
    #[must_use]
    pub fn mac(&self) -> Option<MacAddress> {
        self.mac
    }

    /// Returns the destination of wake packets.
    #[must_use]
    pub fn target(&self) -> SocketAddr {
        self.target
    }

    /// Broadcasts one magic packet.
    ///
    /// Returns the number of bytes sent.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Missing`] when no hardware address is configured,
    /// or [`DeviceError::Wake`] when the socket cannot send.
    pub async fn wake(&self) -> Result<usize, Error> {
        let mac = self.mac.ok_or(ConfigError::Missing("TV_MAC"))?;
        let packet = magic_packet(mac);

        let bind_addr = match self.target {
            SocketAddr::V4(_) => SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 0),
            SocketAddr::V6(_) => SocketAddr::new(IpAddr::V6(std::net::Ipv6Addr::UNSPECIFIED), 0),
        };

        let wake_err = |e: std::io::Error| DeviceError::Wake(e.to_string());
        let socket = UdpSocket::bind(bind_addr).await.map_err(wake_err)?;
        socket.set_broadcast(true).map_err(wake_err)?;
        let sent = socket
            .send_to(&packet, self.target)
            .await
            .map_err(wake_err)?;

        tracing::debug!(mac = %mac, target = %self.target, bytes = sent, "Wake packet sent");
        Ok(sent)
    }
}

impl Default for WakeOnLan {
    fn default() -> Self {
        Self::new(None, IpAddr::V4(Ipv4Addr::BROADCAST))
    }
}
