use rand_core::Rng;
use std::{fmt, str::FromStr, time::Duration};

/// Bounds of the artificial latency added to every outbound message.
///
/// Both bounds are expressed in milliseconds. Sampling draws uniformly
/// from the half-open range `[min, max)`.
///
/// # Example
///
/// ```
/// use unicast_core::DelayPolicy;
///
/// let policy = DelayPolicy::new(100, 500).unwrap();
/// assert_eq!(policy.to_string(), "[100ms, 500ms)");
///
/// let parsed: DelayPolicy = "100 500".parse().unwrap();
/// assert_eq!(parsed, policy);
/// ```
///
/// # degenerate range
///
/// When `min == max` the range `[min, max)` would be empty. Rather than
/// refusing the configuration, such a policy always yields `min`: this is
/// how a fixed delay (and in particular "no delay", `0 0`) is expressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct DelayPolicy {
    min: u64,
    max: u64,
}

impl DelayPolicy {
    /// No added delay at all.
    pub const ZERO: Self = Self { min: 0, max: 0 };

    /// Create a new policy with bounds in milliseconds.
    ///
    /// # Errors
    ///
    /// Returns [`DelayPolicyError`] if `min` is greater than `max`.
    pub const fn new(min: u64, max: u64) -> Result<Self, DelayPolicyError> {
        if min > max {
            return Err(DelayPolicyError { min, max });
        }
        Ok(Self { min, max })
    }

    #[inline]
    pub fn min(&self) -> Duration {
        Duration::from_millis(self.min)
    }

    #[inline]
    pub fn max(&self) -> Duration {
        Duration::from_millis(self.max)
    }

    /// Draw a release delay from the policy.
    ///
    /// The caller provides `rng` so that every sample of a process comes from
    /// a single, seedable source.
    pub fn sample<R: Rng>(&self, rng: &mut R) -> Duration {
        let span = self.max - self.min;
        if span == 0 {
            return self.min();
        }

        // widening multiply maps the 64 random bits onto `[0, span)`
        let offset = ((rng.next_u64() as u128 * span as u128) >> 64) as u64;
        Duration::from_millis(self.min + offset)
    }
}

impl fmt::Display for DelayPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}ms, {}ms)", self.min, self.max)
    }
}

impl FromStr for DelayPolicy {
    type Err = DelayPolicyParseError;

    /// Parses the directory record `min_delay max_delay`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut fields = s.split_whitespace();
        let (Some(min), Some(max), None) = (fields.next(), fields.next(), fields.next()) else {
            return Err(DelayPolicyParseError::Arity);
        };

        let min = min
            .parse()
            .map_err(|_| DelayPolicyParseError::InvalidNumber(min.to_owned()))?;
        let max = max
            .parse()
            .map_err(|_| DelayPolicyParseError::InvalidNumber(max.to_owned()))?;

        Ok(Self::new(min, max)?)
    }
}

/// Error returned when constructing a [`DelayPolicy`] with `min > max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("minimum delay ({min}ms) is greater than maximum delay ({max}ms)")]
pub struct DelayPolicyError {
    min: u64,
    max: u64,
}

/// Error returned when parsing a [`DelayPolicy`] from a string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DelayPolicyParseError {
    #[error("expected exactly two values: `min_delay max_delay`")]
    Arity,
    #[error("invalid delay `{0}', expecting a non-negative number of milliseconds")]
    InvalidNumber(String),
    #[error("{0}")]
    OutOfOrder(#[from] DelayPolicyError),
}

#[cfg(test)]
mod tests {
    use rand_chacha::ChaChaRng;
    use rand_core::SeedableRng as _;

    use super::*;

    fn rng() -> ChaChaRng {
        ChaChaRng::seed_from_u64(42)
    }

    #[test]
    fn samples_within_half_open_range() {
        let policy = DelayPolicy::new(10, 20).unwrap();
        let mut rng = rng();
        for _ in 0..10_000 {
            let delay = policy.sample(&mut rng);
            assert!(delay >= Duration::from_millis(10), "{delay:?}");
            assert!(delay < Duration::from_millis(20), "{delay:?}");
        }
    }

    #[test]
    fn samples_cover_every_bucket_uniformly() {
        let policy = DelayPolicy::new(0, 10).unwrap();
        let mut rng = rng();
        let mut buckets = [0usize; 10];
        for _ in 0..100_000 {
            buckets[policy.sample(&mut rng).as_millis() as usize] += 1;
        }
        // expected 10_000 per bucket
        for (bucket, count) in buckets.iter().enumerate() {
            assert!(
                (9_400..10_600).contains(count),
                "bucket {bucket} got {count}/100000"
            );
        }
    }

    #[test]
    fn single_value_range() {
        let policy = DelayPolicy::new(0, 1).unwrap();
        let mut rng = rng();
        for _ in 0..1000 {
            assert_eq!(policy.sample(&mut rng), Duration::ZERO);
        }
    }

    #[test]
    fn degenerate_range_yields_min() {
        let policy = DelayPolicy::new(250, 250).unwrap();
        let mut rng = rng();
        for _ in 0..100 {
            assert_eq!(policy.sample(&mut rng), Duration::from_millis(250));
        }
        assert_eq!(DelayPolicy::ZERO.sample(&mut rng), Duration::ZERO);
    }

    #[test]
    fn reproducible_with_same_seed() {
        let policy = DelayPolicy::new(0, 1_000).unwrap();
        let a: Vec<Duration> = {
            let mut rng = ChaChaRng::seed_from_u64(7);
            (0..100).map(|_| policy.sample(&mut rng)).collect()
        };
        let b: Vec<Duration> = {
            let mut rng = ChaChaRng::seed_from_u64(7);
            (0..100).map(|_| policy.sample(&mut rng)).collect()
        };
        assert_eq!(a, b);
    }

    #[test]
    fn min_above_max_rejected() {
        let err = DelayPolicy::new(5, 4).unwrap_err();
        assert_eq!(
            err.to_string(),
            "minimum delay (5ms) is greater than maximum delay (4ms)"
        );
    }

    #[test]
    fn parse() {
        assert_eq!(
            "0 1000".parse::<DelayPolicy>().unwrap(),
            DelayPolicy::new(0, 1000).unwrap()
        );
        assert_eq!(
            "  3\t9 ".parse::<DelayPolicy>().unwrap(),
            DelayPolicy::new(3, 9).unwrap()
        );
    }

    #[test]
    fn parse_errors() {
        assert_eq!(
            "1".parse::<DelayPolicy>().unwrap_err(),
            DelayPolicyParseError::Arity
        );
        assert_eq!(
            "1 2 3".parse::<DelayPolicy>().unwrap_err(),
            DelayPolicyParseError::Arity
        );
        assert_eq!(
            "-1 2".parse::<DelayPolicy>().unwrap_err(),
            DelayPolicyParseError::InvalidNumber("-1".to_owned())
        );
        assert!(matches!(
            "9 2".parse::<DelayPolicy>().unwrap_err(),
            DelayPolicyParseError::OutOfOrder(_)
        ));
    }

    #[test]
    fn display() {
        assert_eq!(DelayPolicy::new(0, 1).unwrap().to_string(), "[0ms, 1ms)");
    }
}
