use std::time::Duration;
use unicast_core::defaults::{
    DEFAULT_IDLE_DURATION, DEFAULT_MAX_FRAME_LENGTH, DEFAULT_READ_TIMEOUT,
    DEFAULT_TRANSMIT_TIMEOUT,
};

/// Runtime settings of a [`UnicastContext`].
///
/// The topology (peers and delay bounds) is not part of this: it comes
/// from the directory file.
///
/// [`UnicastContext`]: crate::UnicastContext
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UnicastConfiguration {
    /// seed of the delay sampling RNG, `None` derives one from the clock
    pub seed: Option<u64>,

    /// bound on connecting to a peer and writing one frame
    pub transmit_timeout: Duration,

    /// bound on reading one frame from an accepted connection
    pub read_timeout: Duration,

    /// largest payload accepted or sent, in bytes
    pub max_frame_length: usize,

    /// how long an empty dispatcher sleeps before looping
    pub idle_duration: Duration,
}

impl Default for UnicastConfiguration {
    fn default() -> Self {
        Self {
            seed: None,
            transmit_timeout: DEFAULT_TRANSMIT_TIMEOUT,
            read_timeout: DEFAULT_READ_TIMEOUT,
            max_frame_length: DEFAULT_MAX_FRAME_LENGTH,
            idle_duration: DEFAULT_IDLE_DURATION,
        }
    }
}
