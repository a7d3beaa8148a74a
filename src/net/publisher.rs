use core::fmt::Debug;

use stream::{Payload, PayloadReader};

use super::{Transport, CONTENT_TYPE_JSON};
use crate::telemetry::{Counters, Event};

/// Size of the request body buffer.
pub const MAX_BODY: usize = 8192;

#[derive(Debug, thiserror::Error)]
pub enum PublishError<E: Debug> {
    #[error("Network unavailable")]
    Unavailable,
    #[error("Serialization failed: {0:?}")]
    Serialize(serde_json_core::ser::Error),
    #[error("Transport error: {0:?}")]
    Transport(E),
    #[error("Endpoint responded with status {0}")]
    Status(u16),
}

/// Consumer end of the payload handoff. Serializes and posts every payload
/// exactly once.
pub struct Publisher<'a, T, const N: usize> {
    transport: T,
    payloads: PayloadReader<'a, N>,
    counters: &'a Counters,
    body: [u8; MAX_BODY],
}

impl<'a, T: Transport, const N: usize> Publisher<'a, T, N> {
    pub fn new(
        transport: T,
        payloads: PayloadReader<'a, N>,
        counters: &'a Counters,
    ) -> Self {
        Self {
            transport,
            payloads,
            counters,
            body: [0; MAX_BODY],
        }
    }

    /// Publish payloads forever.
    pub async fn run(&mut self) -> ! {
        loop {
            let payload = self.payloads.next().await;
            self.handle(&payload);
        }
    }

    /// Publish a payload if one is pending.
    ///
    /// # Returns
    /// Whether a payload was taken.
    pub fn poll(&mut self) -> bool {
        match self.payloads.try_next() {
            Some(payload) => {
                self.handle(&payload);
                true
            }
            None => false,
        }
    }

    /// Serialize and post a payload.
    ///
    /// # Returns
    /// The success status code of the endpoint.
    pub fn publish(
        &mut self,
        payload: &Payload<N>,
    ) -> Result<u16, PublishError<T::Error>> {
        if !self.transport.is_available() {
            return Err(PublishError::Unavailable);
        }
        let len = serde_json_core::to_slice(payload, &mut self.body)
            .map_err(PublishError::Serialize)?;
        let status = self
            .transport
            .post(CONTENT_TYPE_JSON, &self.body[..len])
            .map_err(PublishError::Transport)?;
        if (200..300).contains(&status) {
            Ok(status)
        } else {
            Err(PublishError::Status(status))
        }
    }

    fn handle(&mut self, payload: &Payload<N>) {
        match self.publish(payload) {
            Ok(status) => {
                log::debug!("Payload {} published ({status})", payload.sequence);
                self.counters.record(Event::Published);
            }
            Err(PublishError::Unavailable) => {
                log::warn!("Network unavailable, payload {} dropped", payload.sequence);
                self.counters.record(Event::NetworkUnavailable);
            }
            Err(e) => {
                log::warn!("Payload {} not delivered: {e}", payload.sequence);
                self.counters.record(Event::SendFailure);
            }
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{string::String, vec::Vec};
    use stream::{split, Notification, PayloadQueue, Push};

    #[derive(Default)]
    struct MockTransport {
        available: bool,
        status: u16,
        fail: bool,
        posts: Vec<(String, String)>,
    }

    impl Transport for MockTransport {
        type Error = &'static str;

        fn is_available(&mut self) -> bool {
            self.available
        }

        fn post(&mut self, content_type: &str, body: &[u8]) -> Result<u16, Self::Error> {
            self.posts.push((
                content_type.into(),
                std::str::from_utf8(body).unwrap().into(),
            ));
            if self.fail {
                Err("reset")
            } else {
                Ok(self.status)
            }
        }
    }

    fn payload(samples: &[f32]) -> Payload<2> {
        Payload {
            samples: heapless::Vec::from_slice(samples).unwrap(),
            sequence: 0,
        }
    }

    #[test]
    fn posts_json() {
        let ready = Notification::new();
        let counters = Counters::new();
        let mut queue = PayloadQueue::<2>::new();
        let (mut buffer, reader) = split(&mut queue, &ready);
        let transport = MockTransport {
            available: true,
            status: 200,
            ..Default::default()
        };
        let mut publisher = Publisher::new(transport, reader, &counters);

        assert!(!publisher.poll());
        buffer.push(1.);
        assert_eq!(buffer.push(2.5), Push::Ready);
        assert!(publisher.poll());

        let posts = &publisher.transport().posts;
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].0, "application/json");
        assert_eq!(posts[0].1, r#"{"samples":[1.0,2.5]}"#);
        assert_eq!(counters.snapshot().published, 1);
    }

    #[test]
    fn error_status_is_failure() {
        let ready = Notification::new();
        let counters = Counters::new();
        let mut queue = PayloadQueue::<2>::new();
        let (_, reader) = split(&mut queue, &ready);
        let transport = MockTransport {
            available: true,
            status: 400,
            ..Default::default()
        };
        let mut publisher = Publisher::new(transport, reader, &counters);
        assert!(matches!(
            publisher.publish(&payload(&[1., 2.])),
            Err(PublishError::Status(400))
        ));

        publisher.transport_mut().fail = true;
        assert!(matches!(
            publisher.publish(&payload(&[1., 2.])),
            Err(PublishError::Transport("reset"))
        ));
        // No retries.
        assert_eq!(publisher.transport().posts.len(), 2);
    }

    #[test]
    fn unavailable_skips_send() {
        let ready = Notification::new();
        let counters = Counters::new();
        let mut queue = PayloadQueue::<2>::new();
        let (mut buffer, reader) = split(&mut queue, &ready);
        let mut publisher =
            Publisher::new(MockTransport::default(), reader, &counters);

        buffer.push(1.);
        buffer.push(2.);
        assert!(publisher.poll());
        assert!(publisher.transport().posts.is_empty());
        let t = counters.snapshot();
        assert_eq!(t.network_unavailable, 1);
        assert_eq!(t.published, 0);
        // The payload was consumed regardless.
        assert!(!publisher.poll());
    }

    #[test]
    fn failures_are_counted() {
        let ready = Notification::new();
        let counters = Counters::new();
        let mut queue = PayloadQueue::<2>::new();
        let (mut buffer, reader) = split(&mut queue, &ready);
        let transport = MockTransport {
            available: true,
            status: 500,
            ..Default::default()
        };
        let mut publisher = Publisher::new(transport, reader, &counters);
        buffer.push(1.);
        buffer.push(2.);
        assert!(publisher.poll());
        assert_eq!(counters.snapshot().send_failures, 1);
    }
}
