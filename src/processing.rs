//! The processing task
//!
//! # Design
//! The task is the single consumer of conversion-done events. For every event
//! it copies one DMA frame from the driver, pushes every sample of the
//! selected channel through the filter cascade, decimates the batch to one
//! value and appends that to the payload buffer. A completed payload is
//! handed to the publisher by the buffer.
//!
//! The only suspension point is the wait for `dataReady`. Filter state and the
//! payload write cursor are owned by the task and never touched elsewhere.
use dsp::{Decimation, FilterChain};
use stream::{Notification, PayloadBuffer, Push};

use crate::{
    hardware::adc::{AcquisitionDriver, Decoder},
    telemetry::{Counters, Event},
};

/// Largest DMA frame the driver hands out.
pub const MAX_FRAME_BYTES: usize = 4092;

/// Static processing configuration.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Config {
    pub decoder: Decoder,
    pub decimation: Decimation,
    /// Bytes requested from the driver per event. Clamped to
    /// [MAX_FRAME_BYTES].
    pub frame_bytes: usize,
}

/// Outcome of one processing cycle.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Cycle {
    /// The driver reported an error. Nothing was processed.
    ReadError,
    /// The frame held no sample of the selected channel.
    Empty,
    /// One value was buffered, the write cursor is now at the given index.
    Buffered(usize),
    /// The payload was completed and the publisher was signaled.
    PayloadReady,
    /// The payload was completed but dropped, the publisher is behind.
    Overrun,
}

pub struct ProcessingTask<'a, A, const N: usize> {
    adc: A,
    data_ready: &'a Notification,
    chain: FilterChain,
    decoder: Decoder,
    decimation: Decimation,
    payload: PayloadBuffer<'a, N>,
    counters: &'a Counters,
    frame: [u8; MAX_FRAME_BYTES],
    frame_bytes: usize,
}

impl<'a, A: AcquisitionDriver, const N: usize> ProcessingTask<'a, A, N> {
    /// Construct the processing task.
    ///
    /// # Args
    /// * `adc` - The acquisition driver.
    /// * `data_ready` - Posted by the conversion-done interrupt.
    /// * `chain` - The filter cascade. Its state persists for the task lifetime.
    /// * `payload` - The producer end of the payload handoff.
    /// * `counters` - Shared pipeline counters.
    /// * `config` - Frame decoding and decimation configuration.
    pub fn new(
        adc: A,
        data_ready: &'a Notification,
        chain: FilterChain,
        payload: PayloadBuffer<'a, N>,
        counters: &'a Counters,
        config: Config,
    ) -> Self {
        Self {
            adc,
            data_ready,
            chain,
            decoder: config.decoder,
            decimation: config.decimation,
            payload,
            counters,
            frame: [0; MAX_FRAME_BYTES],
            frame_bytes: config.frame_bytes.min(MAX_FRAME_BYTES),
        }
    }

    /// Start continuous conversion.
    pub fn start(&mut self) -> Result<(), A::Error> {
        self.adc.start()?;
        log::info!(
            "Acquisition started: {} bytes per frame, {:?} decimation",
            self.frame_bytes,
            self.decimation
        );
        Ok(())
    }

    /// Process batches forever.
    pub async fn run(&mut self) -> ! {
        loop {
            self.step().await;
        }
    }

    /// Wait for one conversion-done event and process the frame.
    pub async fn step(&mut self) -> Cycle {
        self.data_ready.wait().await;
        self.process()
    }

    /// Process one frame.
    ///
    /// # Note
    /// A read error skips the cycle. Filter state and the write cursor are
    /// left as they were, the next batch continues from them.
    pub fn process(&mut self) -> Cycle {
        let cycle = match self.adc.read(&mut self.frame[..self.frame_bytes]) {
            Err(e) => {
                log::warn!("ADC read failed, batch lost: {e:?}");
                self.counters.record(Event::ReadError);
                Cycle::ReadError
            }
            Ok(len) => {
                self.counters.record(Event::Batch);
                let frame = &self.frame[..len.min(self.frame_bytes)];
                let samples = self.decoder.samples(frame).map(f32::from);
                match self.decimation.process(&mut self.chain, samples) {
                    None => {
                        log::debug!("No samples in {len} byte frame");
                        self.counters.record(Event::EmptyBatch);
                        Cycle::Empty
                    }
                    Some(y) => self.buffer(y),
                }
            }
        };
        self.counters.backlog(self.data_ready.pending());
        cycle
    }

    fn buffer(&mut self, y: f32) -> Cycle {
        match self.payload.push(y) {
            Push::Buffered(cursor) => Cycle::Buffered(cursor),
            Push::Ready => {
                log::trace!("Payload complete");
                self.counters.record(Event::Payload);
                Cycle::PayloadReady
            }
            Push::Overrun => {
                log::warn!("Publisher behind, payload dropped");
                self.counters.record(Event::Overrun);
                Cycle::Overrun
            }
        }
    }

    pub fn chain(&self) -> &FilterChain {
        &self.chain
    }

    /// Payload write cursor.
    pub fn cursor(&self) -> usize {
        self.payload.cursor()
    }

    pub fn adc_mut(&mut self) -> &mut A {
        &mut self.adc
    }
}
