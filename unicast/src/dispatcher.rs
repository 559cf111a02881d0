use crate::{codec::write_frame, shutdown::ShutdownReceiver, stats::DispatchCounters};
use anyhow::Result;
use std::{sync::Arc, time::Duration};
use thiserror::Error;
use tokio::{
    io::AsyncWriteExt as _,
    net::TcpStream,
    select,
    sync::mpsc,
    task::{JoinError, JoinSet},
    time::{Instant, Sleep, sleep, sleep_until, timeout},
};
use tracing::{debug, info, warn};
use unicast_core::{OutboundMessage, ProcessIdentity, TimeQueue};

/// Failure to hand one frame over to a peer. The message is dropped.
#[derive(Debug, Error)]
pub enum TransmitError {
    #[error("Failed to connect to {to}")]
    Connect {
        to: ProcessIdentity,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to write frame to {to}")]
    Write {
        to: ProcessIdentity,
        #[source]
        source: std::io::Error,
    },
    #[error("Timed out after {timeout:?} transmitting to {to}")]
    Timeout { to: ProcessIdentity, timeout: Duration },
}

/// Holds messages until their release time, then transmits them.
///
/// Sole consumer of the channel fed by the [`OutboundQueue`] handles.
///
/// [`OutboundQueue`]: crate::OutboundQueue
pub(crate) struct Dispatcher {
    bus: mpsc::UnboundedReceiver<OutboundMessage>,

    msgs: TimeQueue,

    /// one task per message being transmitted
    in_flight: JoinSet<()>,

    transmit_timeout: Duration,
    idle_duration: Duration,

    counters: Arc<DispatchCounters>,

    shutdown: ShutdownReceiver,
}

impl Dispatcher {
    pub(crate) fn new(
        shutdown: ShutdownReceiver,
        bus: mpsc::UnboundedReceiver<OutboundMessage>,
        counters: Arc<DispatchCounters>,
        transmit_timeout: Duration,
        idle_duration: Duration,
    ) -> Self {
        Self {
            bus,
            msgs: TimeQueue::new(),
            in_flight: JoinSet::new(),
            transmit_timeout,
            idle_duration,
            counters,
            shutdown,
        }
    }

    fn process_new_msg(&mut self, msg: OutboundMessage) {
        self.msgs.push(msg);
    }

    /// spawn the transmission of every message whose release time passed
    fn release_msgs(&mut self) {
        let now = std::time::Instant::now();
        while let Some(msg) = self.msgs.pop_ready(now) {
            debug!(
                to = %msg.destination().id(),
                waited = ?msg.enqueued_at().elapsed(),
                release_delay = ?msg.release_delay(),
                "message released"
            );

            let counters = Arc::clone(&self.counters);
            let transmit_timeout = self.transmit_timeout;
            self.in_flight.spawn(async move {
                match transmit(msg, transmit_timeout).await {
                    Ok(()) => counters.delivered(),
                    Err(error) => {
                        warn!(%error, source = ?std::error::Error::source(&error), "dropping message");
                        counters.failed();
                    }
                }
            });
        }
    }

    fn wait_next_msg(&self) -> Sleep {
        match self.msgs.time_to_next_msg() {
            // nothing pending, a new message will wake us up anyway
            None => sleep(self.idle_duration),
            Some(then) => sleep_until(Instant::from_std(then)),
        }
    }

    /// A transmission task that panicked or was cancelled loses its message
    /// only.
    fn reap(&self, joined: Result<(), JoinError>) {
        if let Err(error) = joined {
            warn!(%error, "transmission task did not complete, dropping message");
            self.counters.failed();
        }
    }

    async fn step(&mut self) -> Result<bool> {
        let mut shutdown = self.shutdown.clone();
        let is_shutting_down = shutdown.is_shutting_down();
        let due_msg = self.wait_next_msg();

        select! {
            biased;

            // instruct the `run` loop it's time to stop
            true = is_shutting_down => return Ok(false),
            // transmit all the messages that are due
            () = due_msg => self.release_msgs(),
            // receive a new message from the queue handles
            Some(msg) = self.bus.recv() => self.process_new_msg(msg),
            // reap finished transmissions
            Some(joined) = self.in_flight.join_next(), if !self.in_flight.is_empty() => self.reap(joined),
        };

        Ok(true)
    }

    /// Drop whatever was not released yet and wait for in-flight
    /// transmissions to complete.
    async fn close(mut self) -> Result<()> {
        self.bus.close();
        while let Ok(msg) = self.bus.try_recv() {
            self.msgs.push(msg);
        }

        let dropped = self.msgs.drain().count() as u64;
        if dropped > 0 {
            info!(dropped, "dropping messages not yet released");
            self.counters.dropped_on_shutdown(dropped);
        }

        while let Some(joined) = self.in_flight.join_next().await {
            self.reap(joined);
        }

        Ok(())
    }
}

pub(crate) async fn run_dispatcher(mut dispatcher: Dispatcher) -> Result<()> {
    while dispatcher.step().await? {}

    dispatcher.close().await
}

/// Open a connection to the destination, write one frame, close.
async fn transmit(msg: OutboundMessage, transmit_timeout: Duration) -> Result<(), TransmitError> {
    let to = msg.destination().clone();

    let attempt = async {
        let mut stream = TcpStream::connect(to.address().as_pair())
            .await
            .map_err(|source| TransmitError::Connect {
                to: to.clone(),
                source,
            })?;

        write_frame(&mut stream, msg.sender(), msg.payload())
            .await
            .map_err(|source| TransmitError::Write {
                to: to.clone(),
                source,
            })?;

        // signal the end of the frame, the receiver closes on its side
        stream
            .shutdown()
            .await
            .map_err(|source| TransmitError::Write {
                to: to.clone(),
                source,
            })
    };

    match timeout(transmit_timeout, attempt).await {
        Ok(result) => {
            if result.is_ok() {
                debug!(%to, bytes = msg.payload().len(), "message delivered");
            }
            result
        }
        Err(_elapsed) => Err(TransmitError::Timeout {
            to,
            timeout: transmit_timeout,
        }),
    }
}
