/*!
# Delayed unicast primitives

Runtime-free building blocks of a delayed unicast process:

* [`Topology`]: the static directory of known processes and the local
  [`DelayPolicy`], loaded once at startup;
* [`wire`]: the binary framing of one message
  (`length: i32 BE | sender: i32 BE | payload`);
* [`OutboundMessage`] and [`TimeQueue`]: a send request and the min-heap
  holding it until its release time.

The `unicast` crate drives these with a tokio runtime and TCP sockets.

```
use std::time::{Duration, Instant};
use unicast_core::{OutboundMessage, ProcessId, TimeQueue, Topology};

let topology: Topology = "0 100\n1 localhost 9001\n2 localhost 9002\n"
    .parse()
    .unwrap();
let destination = topology.resolve(ProcessId::new(2)).unwrap().clone();

let mut queue = TimeQueue::new();
let now = Instant::now();
queue.push(OutboundMessage::with_enqueued_at(
    now,
    ProcessId::new(1),
    destination,
    Duration::from_millis(40),
    &b"hello"[..],
));

assert!(queue.pop_ready(now).is_none());
let msg = queue.pop_ready(now + Duration::from_millis(40)).unwrap();
let bytes = unicast_core::wire::encode(msg.sender(), msg.payload()).unwrap();
assert_eq!(bytes.len(), 8 + 5);
```
*/

pub mod defaults;
mod delay;
mod message;
mod process;
pub mod time;
mod time_queue;
pub mod topology;
pub mod wire;

pub use self::{
    delay::{DelayPolicy, DelayPolicyError, DelayPolicyParseError},
    message::OutboundMessage,
    process::{Address, ProcessId, ProcessIdentity},
    time_queue::TimeQueue,
    topology::{ConfigError, Topology, TopologyBuilder, UnknownDestination},
    wire::{DecodeError, EncodeError, Frame, FrameHeader},
};
