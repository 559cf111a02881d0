mod id;

use std::fmt;

pub use self::id::ProcessId;

/// Network address of a process as listed in the topology directory.
///
/// The host is kept as written (a hostname or an IP literal) and is only
/// resolved when a connection is actually opened.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Address {
    host: String,
    port: u16,
}

/// A process known to the topology directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProcessIdentity {
    id: ProcessId,
    address: Address,
}

impl Address {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// `(host, port)` pair, suitable for `ToSocketAddrs` style APIs
    pub fn as_pair(&self) -> (&str, u16) {
        (self.host.as_str(), self.port)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            // IPv6 literal
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

impl ProcessIdentity {
    pub fn new(id: ProcessId, address: Address) -> Self {
        Self { id, address }
    }

    pub fn id(&self) -> ProcessId {
        self.id
    }

    pub fn address(&self) -> &Address {
        &self.address
    }
}

impl fmt::Display for ProcessIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "process {} ({})", self.id, self.address)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_address() {
        assert_eq!(Address::new("localhost", 9001).to_string(), "localhost:9001");
        assert_eq!(Address::new("::1", 9001).to_string(), "[::1]:9001");
    }

    #[test]
    fn display_identity() {
        let identity = ProcessIdentity::new(ProcessId::new(2), Address::new("10.0.0.2", 80));
        assert_eq!(identity.to_string(), "process 2 (10.0.0.2:80)");
    }
}
