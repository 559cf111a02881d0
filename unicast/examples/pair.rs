//! Two processes of the same topology exchange a message over loopback.
//!
//! Run with:
//!   cargo run --example pair -p unicast

use anyhow::Result;
use std::time::Instant;
use tokio::{net::TcpListener, sync::mpsc};
use unicast::{
    Address, DelayPolicy, Delivery, ProcessId, Topology, UnicastConfiguration, UnicastContext,
};

#[tokio::main]
async fn main() -> Result<()> {
    let alice = TcpListener::bind("127.0.0.1:0").await?;
    let bob = TcpListener::bind("127.0.0.1:0").await?;

    // messages are held between 100ms and 500ms
    let topology = Topology::builder(DelayPolicy::new(100, 500)?)
        .add(ProcessId::new(1), Address::new("127.0.0.1", alice.local_addr()?.port()))
        .add(ProcessId::new(2), Address::new("127.0.0.1", bob.local_addr()?.port()))
        .build()?;

    let alice = UnicastContext::with_listener(
        topology.clone(),
        ProcessId::new(1),
        UnicastConfiguration::default(),
        alice,
        |_: Delivery| {},
    )?;

    let (inbox, mut bob_inbox) = mpsc::unbounded_channel();
    let bob = UnicastContext::with_listener(
        topology,
        ProcessId::new(2),
        UnicastConfiguration::default(),
        bob,
        move |delivery: Delivery| {
            let _ = inbox.send(delivery);
        },
    )?;

    println!("Alice ({}) -> Bob ({})", alice.local_addr(), bob.local_addr());

    let start = Instant::now();
    let delay = alice
        .queue()
        .enqueue(bob.id(), &b"Hello, Bob!"[..])?;
    println!("Sent message, release in {delay:?}");

    if let Some(delivery) = bob_inbox.recv().await {
        println!(
            "Bob received {:?} from process {} after {:?}",
            String::from_utf8_lossy(&delivery.payload),
            delivery.from,
            start.elapsed()
        );
    }

    println!("Alice: {:?}", alice.shutdown().await?);
    println!("Bob: {:?}", bob.shutdown().await?);

    Ok(())
}
