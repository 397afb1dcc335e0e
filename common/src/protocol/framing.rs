use std::io;

use prost::Message;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use super::message::WireMessage;

pub const DEFAULT_MAX_FRAME_LEN: usize = 64 * 1024;

/// Reads one length-prefixed frame. `Ok(None)` is a clean close between
/// frames; a close in the middle of a frame is an error.
pub async fn read_frame<R>(reader: &mut R, max_frame_len: usize) -> io::Result<Option<WireMessage>>
where
    R: AsyncRead + Unpin,
{
    let mut length_bytes = [0u8; 4];
    let mut filled = 0;
    while filled < length_bytes.len() {
        let read = reader.read(&mut length_bytes[filled..]).await?;
        if read == 0 {
            if filled == 0 {
                return Ok(None);
            }
            return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "connection closed inside frame header"));
        }
        filled += read;
    }

    let length = u32::from_be_bytes(length_bytes) as usize;
    if length > max_frame_len {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("frame of {} bytes exceeds limit of {}", length, max_frame_len),
        ));
    }

    let mut body = vec![0u8; length];
    reader.read_exact(&mut body).await?;

    WireMessage::decode(body.as_slice())
        .map(Some)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, format!("malformed frame: {}", e)))
}

pub async fn write_frame<W>(writer: &mut W, message: &WireMessage) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let body = message.encode_to_vec();
    let length = u32::try_from(body.len())
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "frame too large to encode"))?;

    let mut frame = Vec::with_capacity(4 + body.len());
    frame.extend_from_slice(&length.to_be_bytes());
    frame.extend_from_slice(&body);
    writer.write_all(&frame).await?;
    writer.flush().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::MessageType;

    #[tokio::test]
    async fn test_frames_arrive_in_order() {
        let (mut client, mut server) = tokio::io::duplex(1024);
        write_frame(&mut client, &WireMessage::move_to(crate::engine::Point::new(2, 5)))
            .await
            .unwrap();
        write_frame(&mut client, &WireMessage::pass()).await.unwrap();
        drop(client);

        let first = read_frame(&mut server, DEFAULT_MAX_FRAME_LEN).await.unwrap().unwrap();
        assert_eq!(first.kind(), MessageType::Move);
        assert_eq!(first.payload, "2,5");
        let second = read_frame(&mut server, DEFAULT_MAX_FRAME_LEN).await.unwrap().unwrap();
        assert_eq!(second.kind(), MessageType::Pass);
        assert!(read_frame(&mut server, DEFAULT_MAX_FRAME_LEN).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_oversized_frame_is_rejected() {
        let (mut client, mut server) = tokio::io::duplex(1024);
        client.write_all(&(10_000u32).to_be_bytes()).await.unwrap();
        let err = read_frame(&mut server, 1024).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[tokio::test]
    async fn test_truncated_frame_is_an_error() {
        let (mut client, mut server) = tokio::io::duplex(1024);
        client.write_all(&(20u32).to_be_bytes()).await.unwrap();
        client.write_all(&[8, 2]).await.unwrap();
        drop(client);
        let err = read_frame(&mut server, DEFAULT_MAX_FRAME_LEN).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[tokio::test]
    async fn test_garbage_body_is_invalid_data() {
        let (mut client, mut server) = tokio::io::duplex(1024);
        client.write_all(&(3u32).to_be_bytes()).await.unwrap();
        client.write_all(&[0xFF, 0xFF, 0xFF]).await.unwrap();
        let err = read_frame(&mut server, DEFAULT_MAX_FRAME_LEN).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }
}
