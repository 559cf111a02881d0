//! Binary framing of one unicast message.
//!
//! ```text
//! +----------------+----------------+------------------------+
//! | length: i32 BE | sender: i32 BE | payload: length bytes  |
//! +----------------+----------------+------------------------+
//! ```
//!
//! There is no checksum, no version byte and no terminator: framing relies
//! entirely on the declared length. One connection carries exactly one
//! frame.

use crate::ProcessId;
use std::io::{self, Read};
use thiserror::Error;

/// Size in bytes of the [`FrameHeader`] on the wire.
pub const HEADER_LEN: usize = 8;

/// A decoded message: who sent it and what it contains.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    sender: ProcessId,
    payload: Box<[u8]>,
}

/// The fixed-size part of a [`Frame`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    length: i32,
    sender: ProcessId,
}

#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("Payload of {0} bytes does not fit the 32-bit length field")]
    PayloadTooLarge(usize),
}

#[derive(Debug, Error)]
pub enum DecodeError {
    /// The stream closed before all the declared bytes arrived.
    ///
    /// `expected` and `received` count the header bytes too.
    #[error("Truncated frame: expected {expected} bytes, received {received}")]
    TruncatedFrame { expected: usize, received: usize },
    #[error("Invalid negative frame length ({0})")]
    NegativeLength(i32),
    /// The declared length is larger than what this process accepts.
    ///
    /// Rejected before any payload buffer is allocated.
    #[error("Frame length {length} exceeds the maximum of {max} bytes")]
    OversizedLength { length: usize, max: usize },
    #[error("Failed to read frame")]
    Io(#[from] io::Error),
}

impl FrameHeader {
    pub fn new(length: i32, sender: ProcessId) -> Self {
        Self { length, sender }
    }

    pub fn from_bytes(bytes: [u8; HEADER_LEN]) -> Self {
        let [l0, l1, l2, l3, s0, s1, s2, s3] = bytes;
        Self {
            length: i32::from_be_bytes([l0, l1, l2, l3]),
            sender: ProcessId::from_be_bytes([s0, s1, s2, s3]),
        }
    }

    pub fn to_bytes(&self) -> [u8; HEADER_LEN] {
        let mut bytes = [0; HEADER_LEN];
        bytes[..4].copy_from_slice(&self.length.to_be_bytes());
        bytes[4..].copy_from_slice(&self.sender.to_be_bytes());
        bytes
    }

    /// the raw declared length, as found on the wire
    pub fn length(&self) -> i32 {
        self.length
    }

    pub fn sender(&self) -> ProcessId {
        self.sender
    }

    /// Validate the declared length against `max_frame_length`.
    pub fn payload_len(&self, max_frame_length: usize) -> Result<usize, DecodeError> {
        let length =
            usize::try_from(self.length).map_err(|_| DecodeError::NegativeLength(self.length))?;
        if length > max_frame_length {
            return Err(DecodeError::OversizedLength {
                length,
                max: max_frame_length,
            });
        }
        Ok(length)
    }
}

impl Frame {
    pub fn new(sender: ProcessId, payload: impl Into<Box<[u8]>>) -> Self {
        Self {
            sender,
            payload: payload.into(),
        }
    }

    pub fn sender(&self) -> ProcessId {
        self.sender
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn into_parts(self) -> (ProcessId, Box<[u8]>) {
        (self.sender, self.payload)
    }

    pub fn encode(&self) -> Result<Vec<u8>, EncodeError> {
        encode(self.sender, &self.payload)
    }
}

/// Encode one frame: exactly `8 + payload.len()` bytes.
///
/// ```
/// use unicast_core::{wire, ProcessId};
///
/// let bytes = wire::encode(ProcessId::new(1), b"hi").unwrap();
/// assert_eq!(bytes, [0, 0, 0, 2, 0, 0, 0, 1, b'h', b'i']);
/// ```
pub fn encode(sender: ProcessId, payload: &[u8]) -> Result<Vec<u8>, EncodeError> {
    let length =
        i32::try_from(payload.len()).map_err(|_| EncodeError::PayloadTooLarge(payload.len()))?;

    let mut bytes = Vec::with_capacity(HEADER_LEN + payload.len());
    bytes.extend_from_slice(&FrameHeader::new(length, sender).to_bytes());
    bytes.extend_from_slice(payload);
    Ok(bytes)
}

/// Read exactly one frame from `reader`.
///
/// The payload buffer only grows with the bytes actually received, so a
/// garbled length below `max_frame_length` does not allocate up front.
pub fn decode<R: Read>(mut reader: R, max_frame_length: usize) -> Result<Frame, DecodeError> {
    let mut header = Vec::with_capacity(HEADER_LEN);
    (&mut reader)
        .take(HEADER_LEN as u64)
        .read_to_end(&mut header)?;
    let header = header_from_slice(&header)?;
    let length = header.payload_len(max_frame_length)?;

    let mut payload = Vec::new();
    reader.take(length as u64).read_to_end(&mut payload)?;
    check_payload(length, payload.len())?;

    Ok(Frame::new(header.sender(), payload))
}

/// Build a header from what could be read of it, reporting truncation.
pub fn header_from_slice(bytes: &[u8]) -> Result<FrameHeader, DecodeError> {
    let bytes: [u8; HEADER_LEN] =
        bytes
            .try_into()
            .map_err(|_| DecodeError::TruncatedFrame {
                expected: HEADER_LEN,
                received: bytes.len(),
            })?;
    Ok(FrameHeader::from_bytes(bytes))
}

/// Check that a payload of `length` declared bytes was fully received.
pub fn check_payload(length: usize, received: usize) -> Result<(), DecodeError> {
    if received < length {
        return Err(DecodeError::TruncatedFrame {
            expected: HEADER_LEN + length,
            received: HEADER_LEN + received,
        });
    }
    Ok(())
}
