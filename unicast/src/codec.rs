use tokio::io::{AsyncRead, AsyncReadExt as _, AsyncWrite, AsyncWriteExt as _};
use unicast_core::{
    DecodeError, Frame, ProcessId,
    wire::{self, HEADER_LEN},
};

/// Read exactly one [`Frame`] from `reader`.
///
/// Mirrors [`wire::decode`] for tokio streams: the declared length is
/// validated against `max_frame_length` before anything else is read, and
/// the payload buffer only grows with what actually arrives.
pub async fn read_frame<R>(reader: &mut R, max_frame_length: usize) -> Result<Frame, DecodeError>
where
    R: AsyncRead + Unpin,
{
    let mut header = Vec::with_capacity(HEADER_LEN);
    (&mut *reader)
        .take(HEADER_LEN as u64)
        .read_to_end(&mut header)
        .await?;
    let header = wire::header_from_slice(&header)?;
    let length = header.payload_len(max_frame_length)?;

    let mut payload = Vec::new();
    reader
        .take(length as u64)
        .read_to_end(&mut payload)
        .await?;
    wire::check_payload(length, payload.len())?;

    Ok(Frame::new(header.sender(), payload))
}

/// Write one frame and flush it.
pub async fn write_frame<W>(writer: &mut W, sender: ProcessId, payload: &[u8]) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let bytes = wire::encode(sender, payload)
        .map_err(|error| std::io::Error::new(std::io::ErrorKind::InvalidInput, error))?;
    writer.write_all(&bytes).await?;
    writer.flush().await
}
