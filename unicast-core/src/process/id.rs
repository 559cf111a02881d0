use std::{fmt, num::ParseIntError, str};

/// The identifier of a process in the topology directory.
///
/// Identifiers travel on the wire as 4-byte signed big-endian integers,
/// hence the `i32` representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(C)]
pub struct ProcessId(i32);

impl ProcessId {
    pub const fn new(id: i32) -> Self {
        Self(id)
    }

    #[inline]
    pub const fn into_inner(self) -> i32 {
        self.0
    }

    /// the big-endian wire representation of the identifier
    #[inline]
    pub const fn to_be_bytes(self) -> [u8; 4] {
        self.0.to_be_bytes()
    }

    #[inline]
    pub const fn from_be_bytes(bytes: [u8; 4]) -> Self {
        Self(i32::from_be_bytes(bytes))
    }
}

impl From<i32> for ProcessId {
    fn from(value: i32) -> Self {
        Self::new(value)
    }
}

impl From<ProcessId> for i32 {
    fn from(value: ProcessId) -> Self {
        value.0
    }
}

impl str::FromStr for ProcessId {
    type Err = ParseIntError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(Self)
    }
}

impl fmt::Display for ProcessId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
impl fmt::Binary for ProcessId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
impl fmt::Octal for ProcessId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
impl fmt::LowerHex for ProcessId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
impl fmt::UpperHex for ProcessId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
