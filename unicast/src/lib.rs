/*!
# Delayed unicast

Point-to-point messaging between the processes of a static topology, with
simulated network latency: every message sent is held for a delay drawn
from the topology's [`DelayPolicy`] before it is written to a fresh TCP
connection to its destination.

```no_run
# async fn run() -> anyhow::Result<()> {
use unicast::{ProcessId, Topology, UnicastConfiguration, UnicastContext};

let topology = Topology::load("config.txt")?;
let context = UnicastContext::new(
    topology,
    ProcessId::new(1),
    UnicastConfiguration::default(),
    |delivery: unicast::Delivery| {
        println!("{} sent {} bytes", delivery.from, delivery.payload.len());
    },
)
.await?;

let delay = context.queue().enqueue(ProcessId::new(2), &b"hello"[..])?;
println!("released in {delay:?}");

let stats = context.shutdown().await?;
println!("{} messages dropped on shutdown", stats.dropped_on_shutdown);
# Ok(())
# }
```

Delivery is best effort: there is no acknowledgement, no retry and no
ordering guarantee, not even between two messages to the same peer.
*/

pub mod codec;
pub mod command;
mod config;
mod context;
mod dispatcher;
mod listener;
mod queue;
mod shutdown;
pub mod stats;

// convenient re-export of `unicast_core` core objects
pub use unicast_core::{
    Address, ConfigError, DecodeError, DelayPolicy, Frame, ProcessId, ProcessIdentity, Topology,
    UnknownDestination, defaults, wire,
};

pub use self::{
    command::{Command, CommandError},
    config::UnicastConfiguration,
    context::UnicastContext,
    dispatcher::TransmitError,
    listener::{Deliver, Delivery},
    queue::{EnqueueError, OutboundQueue},
    stats::DispatchStats,
};
