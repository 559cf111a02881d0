use std::time::Duration;

/// Default maximum payload length accepted by a decoder, and produced by
/// an encoder, in bytes.
///
/// A frame declaring more than this is rejected before any payload is
/// read.
///
/// ```
/// # use unicast_core::defaults::*;
/// assert_eq!(DEFAULT_MAX_FRAME_LENGTH, 16 * 1_024 * 1_024);
/// ```
pub const DEFAULT_MAX_FRAME_LENGTH: usize = 16 * 1_024 * 1_024;

/// Default bound on opening a connection and writing one frame to a peer.
pub const DEFAULT_TRANSMIT_TIMEOUT: Duration = Duration::from_secs(5);

/// Default bound on receiving one full frame from an accepted connection.
///
/// Without it a peer that connects and never writes would hold a handler
/// forever.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(30);

/// How long the dispatcher sleeps when it has nothing waiting for release.
///
/// New messages wake it up immediately, this only bounds how often an idle
/// dispatcher loops.
pub const DEFAULT_IDLE_DURATION: Duration = Duration::from_secs(5);

/// Default path of the topology directory file.
pub const DEFAULT_CONFIG_PATH: &str = "config.txt";
