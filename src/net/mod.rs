//! Payload publishing
//!
//! # Design
//! The [Publisher] waits for completed payloads, serializes them to JSON and
//! posts them through a [Transport]. Delivery is best effort: a payload that
//! cannot be delivered is logged, counted and dropped. There are no retries.
//!
//! The [HttpClient] transport issues one `POST` per payload over any
//! `embedded-nal` TCP stack. All socket operations of one request are bounded
//! by a single deadline.
use core::fmt::Debug;

pub mod http;
pub mod publisher;

pub use http::{HttpClient, HttpError};
pub use publisher::{PublishError, Publisher};

/// Millisecond timestamps for network timeouts.
pub type Instant = fugit::TimerInstantU32<1000>;

/// A monotonic millisecond clock.
pub trait Clock {
    fn now(&self) -> Instant;
}

impl<F: Fn() -> Instant> Clock for F {
    fn now(&self) -> Instant {
        self()
    }
}

pub const CONTENT_TYPE_JSON: &str = "application/json";

/// Request/response transport to the payload endpoint.
pub trait Transport {
    type Error: Debug;

    /// Whether the network path is currently usable.
    fn is_available(&mut self) -> bool;

    /// Deliver one request body.
    ///
    /// # Returns
    /// The response status code.
    fn post(&mut self, content_type: &str, body: &[u8]) -> Result<u16, Self::Error>;
}
