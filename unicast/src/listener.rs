use crate::{codec::read_frame, shutdown::ShutdownReceiver};
use anyhow::Result;
use std::{
    net::SocketAddr,
    sync::Arc,
    time::{Duration, SystemTime},
};
use tokio::{net::TcpListener, select, task::JoinSet};
use tracing::{debug, info, warn};
use unicast_core::{DecodeError, ProcessId};

/// A message received from a peer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub from: ProcessId,
    pub payload: Box<[u8]>,
    pub received_at: SystemTime,
    /// the remote end of the connection the frame came from
    pub peer: SocketAddr,
}

/// Receives every decoded inbound message.
///
/// Called from the connection's own task; implementations must not block
/// for long.
pub trait Deliver: Send + Sync + 'static {
    fn deliver(&self, delivery: Delivery);
}

impl<F> Deliver for F
where
    F: Fn(Delivery) + Send + Sync + 'static,
{
    fn deliver(&self, delivery: Delivery) {
        self(delivery)
    }
}

pub(crate) struct Listener {
    listener: TcpListener,
    deliver: Arc<dyn Deliver>,
    read_timeout: Duration,
    max_frame_length: usize,
    shutdown: ShutdownReceiver,

    /// one task per accepted connection
    connections: JoinSet<()>,
}

impl Listener {
    pub(crate) fn new(
        listener: TcpListener,
        deliver: Arc<dyn Deliver>,
        read_timeout: Duration,
        max_frame_length: usize,
        shutdown: ShutdownReceiver,
    ) -> Self {
        Self {
            listener,
            deliver,
            read_timeout,
            max_frame_length,
            shutdown,
            connections: JoinSet::new(),
        }
    }

    fn handle(&mut self, stream: tokio::net::TcpStream, peer: SocketAddr) {
        let deliver = Arc::clone(&self.deliver);
        let read_timeout = self.read_timeout;
        let max_frame_length = self.max_frame_length;

        self.connections.spawn(async move {
            let mut stream = stream;
            let frame = match tokio::time::timeout(
                read_timeout,
                read_frame(&mut stream, max_frame_length),
            )
            .await
            {
                Ok(Ok(frame)) => frame,
                Ok(Err(error)) => {
                    log_decode_error(peer, &error);
                    return;
                }
                Err(_elapsed) => {
                    warn!(%peer, ?read_timeout, "timed out waiting for a frame");
                    return;
                }
            };
            let received_at = SystemTime::now();
            // one frame per connection
            drop(stream);

            let (from, payload) = frame.into_parts();
            debug!(%peer, %from, bytes = payload.len(), "frame received");
            deliver.deliver(Delivery {
                from,
                payload,
                received_at,
                peer,
            });
        });
    }
}

fn log_decode_error(peer: SocketAddr, error: &DecodeError) {
    match error {
        DecodeError::Io(source) => warn!(%peer, %error, %source, "failed to decode frame"),
        _ => warn!(%peer, %error, "failed to decode frame"),
    }
}

pub(crate) async fn run_listener(mut listener: Listener) -> Result<()> {
    let address = listener.listener.local_addr()?;
    info!(%address, "listening for inbound frames");

    let mut shutdown = listener.shutdown.clone();
    loop {
        select! {
            biased;

            true = shutdown.is_shutting_down() => break,
            accepted = listener.listener.accept() => match accepted {
                Ok((stream, peer)) => listener.handle(stream, peer),
                // errors here are per connection (e.g. reset before accept
                // or out of file descriptors), keep accepting
                Err(error) => warn!(%error, "failed to accept connection"),
            },
            Some(joined) = listener.connections.join_next(), if !listener.connections.is_empty() => {
                if let Err(error) = joined {
                    warn!(%error, "connection handler did not complete");
                }
            }
        }
    }

    // frames still being read are abandoned, nothing is delivered once
    // this returns
    listener.connections.abort_all();
    while listener.connections.join_next().await.is_some() {}

    info!(%address, "listener stopped");
    Ok(())
}
