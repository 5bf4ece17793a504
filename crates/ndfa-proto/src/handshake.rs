//! Plaintext nickname exchange.
//!
//! On accept the server writes [`NICK_PROMPT`] unframed. The client answers
//! with a single line terminated by `\n` (a preceding `\r` is dropped).
//! Anything after the newline already belongs to the framed protocol and is
//! left in the read buffer.

use bytes::{Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::error::HandshakeError;

/// Bytes the server sends to request a nickname.
pub const NICK_PROMPT: &[u8] = b"NICK";

/// Line codec for the nickname reply.
///
/// Decodes one `\n`-terminated line without its terminator. Encodes raw
/// bytes unchanged, which is how the prompt goes out.
#[derive(Debug, Clone)]
pub struct NickCodec {
    /// Index of next byte to check for newline
    next_index: usize,
    /// Maximum line length, terminator included
    max_len: usize,
}

impl NickCodec {
    /// Create a codec accepting lines of up to `max_len` bytes.
    pub fn new(max_len: usize) -> Self {
        Self {
            next_index: 0,
            max_len,
        }
    }

    /// The line ceiling.
    pub fn max_len(&self) -> usize {
        self.max_len
    }
}

impl Decoder for NickCodec {
    type Item = Bytes;
    type Error = HandshakeError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Bytes>, HandshakeError> {
        if let Some(offset) = src[self.next_index..].iter().position(|b| *b == b'\n') {
            let end = self.next_index + offset + 1;
            self.next_index = 0;
            if end > self.max_len {
                return Err(HandshakeError::LineTooLong {
                    actual: end,
                    limit: self.max_len,
                });
            }

            let mut line = src.split_to(end);
            line.truncate(end - 1);
            if line.last() == Some(&b'\r') {
                line.truncate(line.len() - 1);
            }
            return Ok(Some(line.freeze()));
        }

        self.next_index = src.len();
        if src.len() > self.max_len {
            return Err(HandshakeError::LineTooLong {
                actual: src.len(),
                limit: self.max_len,
            });
        }
        Ok(None)
    }
}

impl Encoder<&[u8]> for NickCodec {
    type Error = HandshakeError;

    fn encode(&mut self, item: &[u8], dst: &mut BytesMut) -> Result<(), HandshakeError> {
        dst.extend_from_slice(item);
        Ok(())
    }
}

/// Clean up a raw nickname line.
///
/// Control characters are stripped, surrounding whitespace is trimmed and
/// the result is cut to `max_len` characters. Returns `None` for invalid
/// UTF-8 or when nothing usable remains.
pub fn sanitize_nickname(raw: &[u8], max_len: usize) -> Option<String> {
    let text = std::str::from_utf8(raw).ok()?;
    let cleaned: String = text.chars().filter(|c| !c.is_control()).collect();
    let truncated: String = cleaned.trim().chars().take(max_len).collect();
    let nick = truncated.trim_end();
    if nick.is_empty() {
        None
    } else {
        Some(nick.to_string())
    }
}

/// Generated name for a session that did not supply a usable nickname.
pub fn guest_nickname(n: u64) -> String {
    format!("Guest{n}")
}
