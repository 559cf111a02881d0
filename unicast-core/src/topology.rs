//! The topology directory: every known process and the local delay policy.
//!
//! The directory is built once at startup and never mutated afterwards, so
//! it can be shared between tasks behind a plain [`Arc`](std::sync::Arc).
//!
//! # Text format
//!
//! ```text
//! # min_delay max_delay (milliseconds)
//! 100 500
//! # pid host port
//! 1 127.0.0.1 9001
//! 2 127.0.0.1 9002
//! ```
//!
//! The first record is the delay policy, every following record describes
//! one process. Blank lines and lines starting with `#` are ignored.

use crate::{
    delay::{DelayPolicy, DelayPolicyParseError},
    process::{Address, ProcessId, ProcessIdentity},
};
use std::{
    collections::{BTreeMap, btree_map::Entry},
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};
use thiserror::Error;

/// Immutable mapping from [`ProcessId`] to [`ProcessIdentity`] plus the
/// process's [`DelayPolicy`].
///
/// ```
/// use unicast_core::{ProcessId, Topology};
///
/// let topology: Topology = "0 1\n1 localhost 9001\n2 localhost 9002\n"
///     .parse()
///     .unwrap();
///
/// let peer = topology.resolve(ProcessId::new(2)).unwrap();
/// assert_eq!(peer.address().to_string(), "localhost:9002");
/// assert!(topology.resolve(ProcessId::new(3)).is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topology {
    delay_policy: DelayPolicy,
    processes: BTreeMap<ProcessId, ProcessIdentity>,
}

/// Builder to assemble a [`Topology`] without going through the text format.
///
/// Obtained via [`Topology::builder`].
#[derive(Debug)]
pub struct TopologyBuilder {
    delay_policy: DelayPolicy,
    processes: BTreeMap<ProcessId, ProcessIdentity>,
    duplicate: Option<ProcessId>,
}

/// The requested process is not listed in the directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Process {0} has no entry in the topology directory")]
pub struct UnknownDestination(pub ProcessId);

/// Error returned when the topology directory cannot be built.
///
/// Any of these is fatal: a process cannot run with a corrupt directory.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read topology directory {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Missing delay record `min_delay max_delay'")]
    MissingDelayPolicy,
    #[error("Line {line}: invalid delay record")]
    DelayPolicy {
        line: usize,
        #[source]
        source: DelayPolicyParseError,
    },
    #[error("Line {line}: expected `pid host port', got `{record}'")]
    MalformedProcess { line: usize, record: String },
    #[error("Line {line}: invalid process id `{value}'")]
    InvalidProcessId { line: usize, value: String },
    #[error("Line {line}: invalid port `{value}'")]
    InvalidPort { line: usize, value: String },
    #[error("Process {id} is listed more than once")]
    DuplicateProcess { id: ProcessId },
}

impl Topology {
    /// Start a programmatic directory with the given delay policy.
    pub fn builder(delay_policy: DelayPolicy) -> TopologyBuilder {
        TopologyBuilder {
            delay_policy,
            processes: BTreeMap::new(),
            duplicate: None,
        }
    }

    /// Read and parse the directory file at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        content.parse()
    }

    /// Look up a process by its identifier.
    pub fn resolve(&self, id: ProcessId) -> Result<&ProcessIdentity, UnknownDestination> {
        self.processes.get(&id).ok_or(UnknownDestination(id))
    }

    #[inline]
    pub fn contains(&self, id: ProcessId) -> bool {
        self.processes.contains_key(&id)
    }

    #[inline]
    pub fn delay_policy(&self) -> DelayPolicy {
        self.delay_policy
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.processes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.processes.is_empty()
    }

    /// Every known process, ordered by identifier.
    pub fn iter(&self) -> impl Iterator<Item = &ProcessIdentity> {
        self.processes.values()
    }
}

impl TopologyBuilder {
    /// Register a process. Registering the same id twice makes
    /// [`build`](Self::build) fail.
    pub fn add(mut self, id: ProcessId, address: Address) -> Self {
        match self.processes.entry(id) {
            Entry::Vacant(entry) => {
                entry.insert(ProcessIdentity::new(id, address));
            }
            Entry::Occupied(_) => {
                self.duplicate.get_or_insert(id);
            }
        }
        self
    }

    pub fn build(self) -> Result<Topology, ConfigError> {
        let Self {
            delay_policy,
            processes,
            duplicate,
        } = self;

        if let Some(id) = duplicate {
            return Err(ConfigError::DuplicateProcess { id });
        }

        Ok(Topology {
            delay_policy,
            processes,
        })
    }
}

impl FromStr for Topology {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut records = s
            .lines()
            .enumerate()
            .map(|(index, line)| (index + 1, line.trim()))
            .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'));

        let Some((line, record)) = records.next() else {
            return Err(ConfigError::MissingDelayPolicy);
        };
        let delay_policy = record
            .parse()
            .map_err(|source| ConfigError::DelayPolicy { line, source })?;

        let mut builder = Topology::builder(delay_policy);
        for (line, record) in records {
            let (id, address) = parse_process(line, record)?;
            builder = builder.add(id, address);
        }

        builder.build()
    }
}

fn parse_process(line: usize, record: &str) -> Result<(ProcessId, Address), ConfigError> {
    let mut fields = record.split_whitespace();
    let (Some(id), Some(host), Some(port), None) =
        (fields.next(), fields.next(), fields.next(), fields.next())
    else {
        return Err(ConfigError::MalformedProcess {
            line,
            record: record.to_owned(),
        });
    };

    let id = id.parse().map_err(|_| ConfigError::InvalidProcessId {
        line,
        value: id.to_owned(),
    })?;
    let port = port.parse().map_err(|_| ConfigError::InvalidPort {
        line,
        value: port.to_owned(),
    })?;

    Ok((id, Address::new(host, port)))
}
