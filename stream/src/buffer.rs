use heapless::{
    spsc::{Consumer, Producer, Queue},
    Vec,
};
use serde::Serialize;

use crate::Notification;

/// One full payload of decimated samples.
///
/// # Wire format
/// `{"samples": [s0, s1, ...]}`
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Payload<const N: usize> {
    pub samples: Vec<f32, N>,
    /// Payload counter assigned by the producer. Gaps indicate overruns.
    #[serde(skip)]
    pub sequence: u32,
}

/// Handoff storage between producer and consumer.
///
/// A single slot: at most one completed payload waits for the consumer while
/// the producer fills the next one.
pub type PayloadQueue<const N: usize> = Queue<Payload<N>, 2>;

/// Outcome of adding a sample to the payload buffer.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Push {
    /// Stored, the write cursor now points at the given index.
    Buffered(usize),
    /// The payload was completed, handed off and `payloadReady` was posted.
    Ready,
    /// The payload was completed but the previous one is still pending.
    /// The new payload was dropped and nothing was posted.
    Overrun,
}

/// Create the producer and consumer ends of a payload handoff.
///
/// # Args
/// * `queue` - Handoff storage, usually a `static`.
/// * `ready` - The `payloadReady` notification.
pub fn split<'a, const N: usize>(
    queue: &'a mut PayloadQueue<N>,
    ready: &'a Notification,
) -> (PayloadBuffer<'a, N>, PayloadReader<'a, N>) {
    let (producer, consumer) = queue.split();
    (
        PayloadBuffer {
            samples: [0.; N],
            cursor: 0,
            sequence: 0,
            queue: producer,
            ready,
        },
        PayloadReader {
            queue: consumer,
            ready,
        },
    )
}

/// The writing end, owned by the processing task.
///
/// `N` must be nonzero.
pub struct PayloadBuffer<'a, const N: usize> {
    samples: [f32; N],
    cursor: usize,
    sequence: u32,
    queue: Producer<'a, Payload<N>, 2>,
    ready: &'a Notification,
}

impl<const N: usize> PayloadBuffer<'_, N> {
    /// Append a sample at the write cursor.
    ///
    /// When the cursor reaches capacity it wraps to zero and the completed
    /// payload is handed to the reader.
    pub fn push(&mut self, sample: f32) -> Push {
        self.samples[self.cursor] = sample;
        self.cursor += 1;
        if self.cursor < N {
            return Push::Buffered(self.cursor);
        }

        self.cursor = 0;
        let payload = Payload {
            samples: self.samples.iter().copied().collect(),
            sequence: self.sequence,
        };
        self.sequence = self.sequence.wrapping_add(1);

        match self.queue.enqueue(payload) {
            Ok(()) => {
                self.ready.notify();
                Push::Ready
            }
            Err(_) => Push::Overrun,
        }
    }

    /// Index of the next write, in `[0, N)`.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub const fn capacity(&self) -> usize {
        N
    }

    /// Sequence number of the payload currently being filled.
    pub fn sequence(&self) -> u32 {
        self.sequence
    }
}

/// The reading end, owned by the network publisher.
pub struct PayloadReader<'a, const N: usize> {
    queue: Consumer<'a, Payload<N>, 2>,
    ready: &'a Notification,
}

impl<const N: usize> PayloadReader<'_, N> {
    /// Wait for the next completed payload. There is no timeout.
    pub async fn next(&mut self) -> Payload<N> {
        loop {
            self.ready.wait().await;
            if let Some(payload) = self.queue.dequeue() {
                return payload;
            }
        }
    }

    /// Take a completed payload if one has been signaled.
    pub fn try_next(&mut self) -> Option<Payload<N>> {
        if self.ready.try_take() {
            self.queue.dequeue()
        } else {
            None
        }
    }
}
