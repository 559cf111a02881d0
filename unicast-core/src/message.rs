use crate::{ProcessId, ProcessIdentity};
use std::time::{Duration, Instant};

/// A send request held until its release time.
///
/// Created when a send is requested; owned by whoever drains the
/// [`TimeQueue`](crate::TimeQueue) until it is transmitted or dropped.
#[derive(Debug)]
pub struct OutboundMessage {
    enqueued_at: Instant,
    release_delay: Duration,
    sender: ProcessId,
    destination: ProcessIdentity,
    payload: Box<[u8]>,
}

impl OutboundMessage {
    pub fn new(
        sender: ProcessId,
        destination: ProcessIdentity,
        release_delay: Duration,
        payload: impl Into<Box<[u8]>>,
    ) -> Self {
        Self::with_enqueued_at(
            Instant::now(),
            sender,
            destination,
            release_delay,
            payload,
        )
    }

    pub fn with_enqueued_at(
        enqueued_at: Instant,
        sender: ProcessId,
        destination: ProcessIdentity,
        release_delay: Duration,
        payload: impl Into<Box<[u8]>>,
    ) -> Self {
        Self {
            enqueued_at,
            release_delay,
            sender,
            destination,
            payload: payload.into(),
        }
    }

    pub fn enqueued_at(&self) -> Instant {
        self.enqueued_at
    }

    pub fn release_delay(&self) -> Duration {
        self.release_delay
    }

    /// the earliest instant the message may be transmitted
    pub fn release_time(&self) -> Instant {
        self.enqueued_at + self.release_delay
    }

    pub fn is_ready(&self, now: Instant) -> bool {
        now >= self.release_time()
    }

    pub fn sender(&self) -> ProcessId {
        self.sender
    }

    pub fn destination(&self) -> &ProcessIdentity {
        &self.destination
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn into_payload(self) -> Box<[u8]> {
        self.payload
    }
}
