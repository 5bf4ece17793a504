//! Length-prefixed framing.
//!
//! Every frame is a 4-byte big-endian unsigned payload length followed by
//! exactly that many payload bytes. A zero-length frame is legal.
//!
//! [`FrameCodec`] plugs into `tokio_util::codec` for long-lived connections.
//! [`read_frame`] and [`write_frame`] work directly on any async stream and
//! are what simple clients use.
//!
//! Declared lengths above the configured ceiling are rejected before any
//! payload is buffered.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio_util::codec::{Decoder, Encoder};

use crate::error::FrameError;

/// Size of the length prefix in bytes.
pub const LENGTH_PREFIX_LEN: usize = 4;

/// Default payload ceiling (1 MiB).
pub const DEFAULT_MAX_FRAME_LEN: usize = 1024 * 1024;

/// Codec for 4-byte big-endian length-prefixed frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameCodec {
    max_len: usize,
}

impl FrameCodec {
    /// Create a codec with the default ceiling.
    pub fn new() -> Self {
        Self::with_max_len(DEFAULT_MAX_FRAME_LEN)
    }

    /// Create a codec with a custom payload ceiling.
    ///
    /// Values above `u32::MAX` are clamped since the prefix cannot express them.
    pub fn with_max_len(max_len: usize) -> Self {
        Self {
            max_len: max_len.min(u32::MAX as usize),
        }
    }

    /// The payload ceiling.
    pub fn max_len(&self) -> usize {
        self.max_len
    }

    fn check_len(&self, len: usize) -> Result<u32, FrameError> {
        if len > self.max_len {
            return Err(FrameError::TooLarge {
                len,
                limit: self.max_len,
            });
        }
        u32::try_from(len).map_err(|_| FrameError::TooLarge {
            len,
            limit: self.max_len,
        })
    }
}

impl Default for FrameCodec {
    fn default() -> Self {
        Self::new()
    }
}

fn peek_len(src: &[u8]) -> usize {
    let mut prefix = [0u8; LENGTH_PREFIX_LEN];
    prefix.copy_from_slice(&src[..LENGTH_PREFIX_LEN]);
    u32::from_be_bytes(prefix) as usize
}

impl Decoder for FrameCodec {
    type Item = Bytes;
    type Error = FrameError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Bytes>, FrameError> {
        if src.len() < LENGTH_PREFIX_LEN {
            return Ok(None);
        }

        let len = peek_len(src);
        if len > self.max_len {
            return Err(FrameError::TooLarge {
                len,
                limit: self.max_len,
            });
        }

        let total = LENGTH_PREFIX_LEN + len;
        if src.len() < total {
            src.reserve(total - src.len());
            return Ok(None);
        }

        src.advance(LENGTH_PREFIX_LEN);
        Ok(Some(src.split_to(len).freeze()))
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Bytes>, FrameError> {
        if let Some(frame) = self.decode(src)? {
            return Ok(Some(frame));
        }
        if src.is_empty() {
            return Ok(None);
        }

        // Peer closed mid-frame.
        let err = if src.len() < LENGTH_PREFIX_LEN {
            FrameError::Truncated {
                expected: LENGTH_PREFIX_LEN,
                received: src.len(),
            }
        } else {
            FrameError::Truncated {
                expected: peek_len(src),
                received: src.len() - LENGTH_PREFIX_LEN,
            }
        };
        src.clear();
        Err(err)
    }
}

impl Encoder<Bytes> for FrameCodec {
    type Error = FrameError;

    fn encode(&mut self, item: Bytes, dst: &mut BytesMut) -> Result<(), FrameError> {
        <Self as Encoder<&[u8]>>::encode(self, &item[..], dst)
    }
}

impl Encoder<&[u8]> for FrameCodec {
    type Error = FrameError;

    fn encode(&mut self, item: &[u8], dst: &mut BytesMut) -> Result<(), FrameError> {
        let len = self.check_len(item.len())?;
        dst.reserve(LENGTH_PREFIX_LEN + item.len());
        dst.put_u32(len);
        dst.extend_from_slice(item);
        Ok(())
    }
}

/// Fill `buf` from `reader`, returning how many bytes arrived before EOF.
async fn read_full<R>(reader: &mut R, buf: &mut [u8]) -> std::io::Result<usize>
where
    R: AsyncRead + Unpin,
{
    let mut filled = 0;
    while filled < buf.len() {
        let n = reader.read(&mut buf[filled..]).await?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    Ok(filled)
}

/// Read one frame.
///
/// Returns `Ok(None)` if the stream ends cleanly before any prefix byte, and
/// [`FrameError::Truncated`] if it ends anywhere inside a frame.
pub async fn read_frame<R>(reader: &mut R, max_len: usize) -> Result<Option<Bytes>, FrameError>
where
    R: AsyncRead + Unpin,
{
    let mut prefix = [0u8; LENGTH_PREFIX_LEN];
    let got = read_full(reader, &mut prefix).await?;
    if got == 0 {
        return Ok(None);
    }
    if got < LENGTH_PREFIX_LEN {
        return Err(FrameError::Truncated {
            expected: LENGTH_PREFIX_LEN,
            received: got,
        });
    }

    let len = u32::from_be_bytes(prefix) as usize;
    if len > max_len {
        return Err(FrameError::TooLarge {
            len,
            limit: max_len,
        });
    }

    let mut payload = vec![0u8; len];
    let got = read_full(reader, &mut payload).await?;
    if got < len {
        return Err(FrameError::Truncated {
            expected: len,
            received: got,
        });
    }
    Ok(Some(Bytes::from(payload)))
}

/// Write one frame and flush.
///
/// Prefix and payload go out in a single buffered write; partial writes are
/// retried by `write_all`.
pub async fn write_frame<W>(writer: &mut W, payload: &[u8], max_len: usize) -> Result<(), FrameError>
where
    W: AsyncWrite + Unpin,
{
    let mut buf = BytesMut::new();
    FrameCodec::with_max_len(max_len).encode(payload, &mut buf)?;
    writer.write_all(&buf).await?;
    writer.flush().await?;
    Ok(())
}
