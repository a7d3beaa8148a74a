//! Sample stream handoff primitives
//!
//! # Design
//! Samples travel from an interrupt, through a processing task, to a network
//! publisher. The domains never share a lock:
//!
//! * [Notification] counts events posted from interrupt context and wakes a
//!   single async waiter.
//! * [PayloadBuffer] accumulates decimated samples up to a fixed capacity.
//!   A completed [Payload] is moved into a single slot queue and the reader is
//!   notified. The reader owns what it dequeued, so the producer can never
//!   overwrite a payload that is being transmitted. If the slot is still
//!   occupied when the next payload completes, the new payload is dropped
//!   ([Push::Overrun]).
//!
//! Nothing here allocates or blocks.

#![cfg_attr(not(test), no_std)]

use core::{
    fmt::Write,
    net::{IpAddr, Ipv4Addr, SocketAddr},
};
use heapless::String;
use serde::Serialize;
use serde_with::DeserializeFromStr;

mod buffer;
mod notification;

pub use buffer::*;
pub use notification::Notification;

/// Represents the destination the payloads are published to.
///
/// # Miniconf
/// `<addr>:<port>`
///
/// * `<addr>` is an IPv4 or IPv6 address. E.g. `192.168.0.1`
/// * `<port>` is any unsigned 16-bit value.
///
/// The unspecified address or port zero disable publishing.
///
/// ## Example
/// `192.168.0.1:5000`
#[derive(Copy, Clone, Debug, DeserializeFromStr, PartialEq, Eq)]
pub struct Target(pub SocketAddr);

impl Default for Target {
    fn default() -> Self {
        Self(SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 0))
    }
}

impl Target {
    pub fn is_configured(&self) -> bool {
        !self.0.ip().is_unspecified() && self.0.port() != 0
    }
}

impl Serialize for Target {
    fn serialize<S: serde::Serializer>(
        &self,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let mut display: String<48> = String::new();
        write!(&mut display, "{}", self.0)
            .map_err(<S::Error as serde::ser::Error>::custom)?;
        serializer.serialize_str(&display)
    }
}

impl core::str::FromStr for Target {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let addr = SocketAddr::from_str(s)
            .map_err(|_| "Invalid socket address format")?;
        Ok(Self(addr))
    }
}
