use crate::stats::DispatchCounters;
use rand_chacha::ChaChaRng;
use std::{
    sync::{Arc, Mutex, PoisonError},
    time::Duration,
};
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::debug;
use unicast_core::{OutboundMessage, ProcessId, Topology, UnknownDestination};

/// Handle to submit messages to the dispatcher.
///
/// Cheap to clone; every clone feeds the same dispatcher and draws delays
/// from the same random source.
#[derive(Clone)]
pub struct OutboundQueue {
    sender: ProcessId,
    topology: Arc<Topology>,
    rng: Arc<Mutex<ChaChaRng>>,
    max_frame_length: usize,
    bus: mpsc::UnboundedSender<OutboundMessage>,
    counters: Arc<DispatchCounters>,
}

#[derive(Debug, Error)]
pub enum EnqueueError {
    #[error(transparent)]
    UnknownDestination(#[from] UnknownDestination),
    #[error("Payload of {size} bytes exceeds the maximum frame length of {max} bytes")]
    PayloadTooLarge { size: usize, max: usize },
    #[error("Failed to enqueue message to process {to}: the dispatcher has stopped")]
    Closed { to: ProcessId },
}

impl OutboundQueue {
    pub(crate) fn new(
        sender: ProcessId,
        topology: Arc<Topology>,
        rng: ChaChaRng,
        max_frame_length: usize,
        bus: mpsc::UnboundedSender<OutboundMessage>,
        counters: Arc<DispatchCounters>,
    ) -> Self {
        Self {
            sender,
            topology,
            rng: Arc::new(Mutex::new(rng)),
            max_frame_length,
            bus,
            counters,
        }
    }

    /// Request `payload` to be sent to process `to`.
    ///
    /// Returns immediately with the sampled release delay: the message will
    /// not leave this process before that delay has elapsed. Nothing is
    /// queued when an error is returned.
    pub fn enqueue(
        &self,
        to: ProcessId,
        payload: impl Into<Box<[u8]>>,
    ) -> Result<Duration, EnqueueError> {
        let destination = self.topology.resolve(to)?;

        let payload = payload.into();
        if payload.len() > self.max_frame_length {
            return Err(EnqueueError::PayloadTooLarge {
                size: payload.len(),
                max: self.max_frame_length,
            });
        }

        let release_delay = {
            // a panic while sampling cannot leave the rng half-updated
            let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
            self.topology.delay_policy().sample(&mut *rng)
        };

        let msg = OutboundMessage::new(self.sender, destination.clone(), release_delay, payload);
        // counted first so a snapshot never shows the message delivered
        // before it was enqueued
        self.counters.enqueued();
        if self.bus.send(msg).is_err() {
            self.counters.enqueue_cancelled();
            return Err(EnqueueError::Closed { to });
        }

        debug!(%to, ?release_delay, "message enqueued");

        Ok(release_delay)
    }

    /// the process messages are sent on behalf of
    pub fn sender(&self) -> ProcessId {
        self.sender
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand_core::SeedableRng as _;
    use unicast_core::{Address, DelayPolicy};

    fn queue(
        delay_policy: DelayPolicy,
    ) -> (OutboundQueue, mpsc::UnboundedReceiver<OutboundMessage>) {
        let topology = Topology::builder(delay_policy)
            .add(ProcessId::new(1), Address::new("localhost", 9001))
            .add(ProcessId::new(2), Address::new("localhost", 9002))
            .build()
            .unwrap();
        let (bus, receiver) = mpsc::unbounded_channel();
        let queue = OutboundQueue::new(
            ProcessId::new(1),
            Arc::new(topology),
            ChaChaRng::seed_from_u64(0),
            16,
            bus,
            Arc::default(),
        );
        (queue, receiver)
    }

    #[test]
    fn enqueue() {
        let (queue, mut receiver) = queue(DelayPolicy::new(100, 200).unwrap());

        let delay = queue.enqueue(ProcessId::new(2), &b"hello"[..]).unwrap();
        assert!(delay >= Duration::from_millis(100) && delay < Duration::from_millis(200));

        let msg = receiver.try_recv().unwrap();
        assert_eq!(msg.sender(), ProcessId::new(1));
        assert_eq!(msg.destination().id(), ProcessId::new(2));
        assert_eq!(msg.destination().address().port(), 9002);
        assert_eq!(msg.release_delay(), delay);
        assert_eq!(msg.payload(), b"hello");
        assert_eq!(queue.counters.snapshot().enqueued, 1);
    }

    #[test]
    fn unknown_destination() {
        let (queue, mut receiver) = queue(DelayPolicy::ZERO);

        let err = queue.enqueue(ProcessId::new(3), &b"hello"[..]).unwrap_err();
        assert!(matches!(
            err,
            EnqueueError::UnknownDestination(UnknownDestination(id)) if id == ProcessId::new(3)
        ));
        assert!(receiver.try_recv().is_err());
        assert_eq!(queue.counters.snapshot().enqueued, 0);
    }

    #[test]
    fn payload_too_large() {
        let (queue, mut receiver) = queue(DelayPolicy::ZERO);

        let err = queue.enqueue(ProcessId::new(2), vec![0u8; 17]).unwrap_err();
        assert!(matches!(
            err,
            EnqueueError::PayloadTooLarge { size: 17, max: 16 }
        ));
        assert!(receiver.try_recv().is_err());
    }

    #[test]
    fn closed() {
        let (queue, receiver) = queue(DelayPolicy::ZERO);
        drop(receiver);

        let err = queue.enqueue(ProcessId::new(2), &b"hello"[..]).unwrap_err();
        assert!(matches!(err, EnqueueError::Closed { .. }));
        assert_eq!(queue.counters.snapshot().enqueued, 0);
    }

    #[test]
    fn enqueued_is_counted_before_the_dispatcher_sees_it() {
        let (queue, mut receiver) = queue(DelayPolicy::ZERO);

        queue.enqueue(ProcessId::new(2), &b"hello"[..]).unwrap();
        let _msg = receiver.try_recv().unwrap();
        queue.counters.delivered();

        let stats = queue.counters.snapshot();
        assert_eq!(stats.enqueued, 1);
        assert_eq!(stats.delivered, 1);
        assert_eq!(stats.pending(), 0);
    }

    #[test]
    fn clones_share_the_dispatcher() {
        let (queue, mut receiver) = queue(DelayPolicy::ZERO);
        let other = queue.clone();

        std::thread::scope(|s| {
            s.spawn(|| queue.enqueue(ProcessId::new(2), &b"a"[..]).unwrap());
            s.spawn(|| other.enqueue(ProcessId::new(1), &b"b"[..]).unwrap());
        });

        assert!(receiver.try_recv().is_ok());
        assert!(receiver.try_recv().is_ok());
        assert_eq!(queue.counters.snapshot().enqueued, 2);
    }
}
