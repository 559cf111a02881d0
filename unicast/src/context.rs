use crate::{
    UnicastConfiguration,
    dispatcher::{Dispatcher, run_dispatcher},
    listener::{Deliver, Listener, run_listener},
    queue::OutboundQueue,
    shutdown::ShutdownController,
    stats::{DispatchCounters, DispatchStats},
};
use anyhow::{Context as _, Result, anyhow};
use rand_chacha::ChaChaRng;
use rand_core::SeedableRng as _;
use std::{
    net::SocketAddr,
    sync::Arc,
    time::{SystemTime, UNIX_EPOCH},
};
use tokio::{net::TcpListener, sync::mpsc, task::JoinHandle};
use tracing::info;
use unicast_core::{ProcessId, Topology};

/// Everything a running process owns: its place in the topology, the
/// inbound listener and the outbound dispatcher.
///
/// Creating the context starts both background tasks on the current tokio
/// runtime. Make sure to call [`UnicastContext::shutdown`] for a clean
/// shutdown of the background tasks.
pub struct UnicastContext {
    id: ProcessId,
    topology: Arc<Topology>,
    local_addr: SocketAddr,

    queue: OutboundQueue,
    counters: Arc<DispatchCounters>,

    shutdown: ShutdownController,
    dispatcher: JoinHandle<Result<()>>,
    listener: JoinHandle<Result<()>>,
}

impl UnicastContext {
    /// Start process `id` of `topology`, listening on the address the
    /// directory lists for it.
    pub async fn new<D>(
        topology: Topology,
        id: ProcessId,
        configuration: UnicastConfiguration,
        deliver: D,
    ) -> Result<Self>
    where
        D: Deliver,
    {
        let local = topology
            .resolve(id)
            .with_context(|| format!("Process {id} cannot start"))?;
        let listener = TcpListener::bind(local.address().as_pair())
            .await
            .with_context(|| format!("Failed to listen on {}", local.address()))?;

        Self::with_listener(topology, id, configuration, listener, deliver)
    }

    /// Same as [`UnicastContext::new`] but adopting an already bound
    /// listener.
    pub fn with_listener<D>(
        topology: Topology,
        id: ProcessId,
        configuration: UnicastConfiguration,
        listener: TcpListener,
        deliver: D,
    ) -> Result<Self>
    where
        D: Deliver,
    {
        if !topology.contains(id) {
            return Err(anyhow!(
                "Process {id} was supplied but does not exist in the topology directory"
            ));
        }
        let local_addr = listener
            .local_addr()
            .context("Failed to query the listener address")?;

        let topology = Arc::new(topology);
        let counters = Arc::new(DispatchCounters::default());
        let shutdown = ShutdownController::new();
        let (bus, receiver) = mpsc::unbounded_channel();

        let seed = configuration.seed.unwrap_or_else(|| clock_seed(id));
        let queue = OutboundQueue::new(
            id,
            Arc::clone(&topology),
            ChaChaRng::seed_from_u64(seed),
            configuration.max_frame_length,
            bus,
            Arc::clone(&counters),
        );

        let dispatcher = Dispatcher::new(
            shutdown.subscribe(),
            receiver,
            Arc::clone(&counters),
            configuration.transmit_timeout,
            configuration.idle_duration,
        );
        let dispatcher = tokio::spawn(run_dispatcher(dispatcher));

        let listener = Listener::new(
            listener,
            Arc::new(deliver),
            configuration.read_timeout,
            configuration.max_frame_length,
            shutdown.subscribe(),
        );
        let listener = tokio::spawn(run_listener(listener));

        info!(
            %id,
            %local_addr,
            delay_policy = %topology.delay_policy(),
            peers = topology.len(),
            "process started"
        );

        Ok(Self {
            id,
            topology,
            local_addr,
            queue,
            counters,
            shutdown,
            dispatcher,
            listener,
        })
    }

    pub fn id(&self) -> ProcessId {
        self.id
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    /// the address the listener is actually bound to
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// A handle to send messages from this process.
    pub fn queue(&self) -> OutboundQueue {
        self.queue.clone()
    }

    pub fn stats(&self) -> DispatchStats {
        self.counters.snapshot()
    }

    /// Stop accepting connections, drop messages not released yet and wait
    /// for in-flight transmissions.
    ///
    /// Returns the final statistics, including the messages dropped here
    /// and the transmissions that completed while shutting down.
    ///
    /// There is no timeout to this operation, for now this is left to the
    /// calling user to use the appropriate timeout as needed.
    pub async fn shutdown(self) -> Result<DispatchStats> {
        let Self {
            id,
            counters,
            shutdown,
            dispatcher,
            listener,
            ..
        } = self;

        shutdown.signal();

        let dispatched = join("Dispatcher", dispatcher).await;
        let listened = join("Listener", listener).await;
        let stats = counters.snapshot();
        info!(
            %id,
            delivered = stats.delivered,
            failed = stats.failed,
            dropped_on_shutdown = stats.dropped_on_shutdown,
            "process stopped"
        );

        dispatched.and(listened).map(|()| stats)
    }
}

async fn join(name: &str, handle: JoinHandle<Result<()>>) -> Result<()> {
    match handle.await {
        // all good
        Ok(Ok(())) => Ok(()),
        // task error
        Ok(Err(error)) => Err(error).with_context(|| format!("{name} error")),
        // join error
        Err(error) => Err(error).with_context(|| format!("Failed to await for the {name} to finish")),
    }
}

/// Seed for runs that do not ask for reproducibility.
fn clock_seed(id: ProcessId) -> u64 {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_nanos() as u64)
        .unwrap_or_default();
    nanos ^ (u64::from(std::process::id()) << 32) ^ id.into_inner() as u64
}
