//! Line-based codec for tokio.
//!
//! This module provides a codec that reads newline-terminated lines from an
//! arbitrarily fragmented byte stream and writes newline-terminated lines
//! back out.

use bytes::{Buf, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::error;

/// Line-based codec that handles terminator-delimited messages.
///
/// Lines may end in `\r\n`, `\n`, or a bare `\r`; the terminator is stripped
/// from decoded lines and a `\n` is appended to encoded ones. Terminators
/// split across two reads are reassembled, so a `\r\n` arriving one byte per
/// read still yields a single line.
///
/// By default no length limit is imposed; see [`LineCodec::with_max_len`].
#[derive(Debug, Default)]
pub struct LineCodec {
    /// Index of next byte to check for a terminator
    next_index: usize,
    /// A `\r` ended the previous read; drop a `\n` that follows it
    pending_lf: bool,
    /// Maximum line length, if capped
    max_len: Option<usize>,
}

impl LineCodec {
    /// Create a new codec with no line-length limit.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new codec that fails once a line exceeds `max_len` bytes.
    pub fn with_max_len(max_len: usize) -> Self {
        Self {
            max_len: Some(max_len),
            ..Self::default()
        }
    }

    fn check_len(&self, len: usize) -> error::Result<()> {
        match self.max_len {
            Some(limit) if len > limit => Err(error::ProtocolError::LineTooLong {
                actual: len,
                limit,
            }),
            _ => Ok(()),
        }
    }
}

impl Decoder for LineCodec {
    type Item = String;
    type Error = error::ProtocolError;

    fn decode(&mut self, src: &mut BytesMut) -> error::Result<Option<String>> {
        // Swallow the second half of a \r\n that straddled two reads
        if self.pending_lf {
            match src.first() {
                Some(&b'\n') => {
                    src.advance(1);
                    self.pending_lf = false;
                }
                Some(_) => self.pending_lf = false,
                None => return Ok(None),
            }
        }

        // Look for a terminator starting from where we left off
        if let Some(offset) = src[self.next_index..]
            .iter()
            .position(|b| *b == b'\r' || *b == b'\n')
        {
            let pos = self.next_index + offset;
            let terminator = src[pos];
            let line = src.split_to(pos);
            src.advance(1);
            self.next_index = 0;

            if terminator == b'\r' {
                // \r\n counts as one terminator; the \n may not be here yet
                match src.first() {
                    Some(&b'\n') => src.advance(1),
                    Some(_) => {}
                    None => self.pending_lf = true,
                }
            }

            self.check_len(line.len())?;

            let data = String::from_utf8(line.to_vec())?;
            Ok(Some(data))
        } else {
            // No complete line yet - remember where we stopped
            self.next_index = src.len();
            self.check_len(src.len())?;
            Ok(None)
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> error::Result<Option<String>> {
        // A partial line left in the buffer when the stream closes is never
        // a complete protocol line; drop it.
        match self.decode(src)? {
            Some(line) => Ok(Some(line)),
            None => {
                src.clear();
                self.next_index = 0;
                Ok(None)
            }
        }
    }
}

impl Encoder<String> for LineCodec {
    type Error = error::ProtocolError;

    fn encode(&mut self, line: String, dst: &mut BytesMut) -> error::Result<()> {
        dst.reserve(line.len() + 1);
        dst.extend_from_slice(line.as_bytes());
        dst.extend_from_slice(b"\n");
        Ok(())
    }
}
