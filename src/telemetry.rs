//! Pipeline health counters
//!
//! Every datum the pipeline drops is counted here in addition to the log line
//! reporting it. The counters are plain atomics and may be updated from any
//! context.
use portable_atomic::{AtomicU32, Ordering};
use serde::Serialize;

/// Countable pipeline events.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// A DMA frame was read.
    Batch,
    /// Reading a frame failed, the batch was lost.
    ReadError,
    /// A frame held no sample of the selected channel.
    EmptyBatch,
    /// A payload was completed and handed off.
    Payload,
    /// A payload was completed while the previous one was still pending.
    Overrun,
    /// A payload was accepted by the endpoint.
    Published,
    /// A payload could not be delivered.
    SendFailure,
    /// A payload was dropped because the network was down.
    NetworkUnavailable,
}

#[derive(Default)]
pub struct Counters {
    batches: AtomicU32,
    read_errors: AtomicU32,
    empty_batches: AtomicU32,
    payloads: AtomicU32,
    overruns: AtomicU32,
    max_backlog: AtomicU32,
    published: AtomicU32,
    send_failures: AtomicU32,
    network_unavailable: AtomicU32,
}

impl Counters {
    pub const fn new() -> Self {
        Self {
            batches: AtomicU32::new(0),
            read_errors: AtomicU32::new(0),
            empty_batches: AtomicU32::new(0),
            payloads: AtomicU32::new(0),
            overruns: AtomicU32::new(0),
            max_backlog: AtomicU32::new(0),
            published: AtomicU32::new(0),
            send_failures: AtomicU32::new(0),
            network_unavailable: AtomicU32::new(0),
        }
    }

    pub fn record(&self, event: Event) {
        let counter = match event {
            Event::Batch => &self.batches,
            Event::ReadError => &self.read_errors,
            Event::EmptyBatch => &self.empty_batches,
            Event::Payload => &self.payloads,
            Event::Overrun => &self.overruns,
            Event::Published => &self.published,
            Event::SendFailure => &self.send_failures,
            Event::NetworkUnavailable => &self.network_unavailable,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Track the largest number of unprocessed conversion-done events.
    ///
    /// A backlog that keeps growing means the processing task does not keep
    /// pace with the sampling clock.
    pub fn backlog(&self, pending: u32) {
        self.max_backlog.fetch_max(pending, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> Telemetry {
        let get = |c: &AtomicU32| c.load(Ordering::Relaxed);
        Telemetry {
            batches: get(&self.batches),
            read_errors: get(&self.read_errors),
            empty_batches: get(&self.empty_batches),
            payloads: get(&self.payloads),
            overruns: get(&self.overruns),
            max_backlog: get(&self.max_backlog),
            published: get(&self.published),
            send_failures: get(&self.send_failures),
            network_unavailable: get(&self.network_unavailable),
        }
    }
}

/// Counter values at one instant.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Telemetry {
    pub batches: u32,
    pub read_errors: u32,
    pub empty_batches: u32,
    pub payloads: u32,
    pub overruns: u32,
    pub max_backlog: u32,
    pub published: u32,
    pub send_failures: u32,
    pub network_unavailable: u32,
}
