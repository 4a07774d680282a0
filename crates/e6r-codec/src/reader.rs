use std::fmt;

use bytes::Buf;

// ---------------------------------------------------------------------------
// DecodeError
// ---------------------------------------------------------------------------

/// Structural failure of the row-metadata stream. Row *values* degrade to
/// sentinels instead; this type is only produced where the stream itself
/// cannot be framed any further.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// The stream ended inside a fixed-width value or declared length.
    Underflow { wanted: usize, remaining: usize },
    /// A structurally impossible header value (e.g. negative field count).
    Malformed(String),
    /// A field descriptor names a type this connector cannot frame.
    UnknownType(String),
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::Underflow { wanted, remaining } => {
                write!(f, "stream underflow: wanted {wanted} bytes, {remaining} remain")
            }
            DecodeError::Malformed(msg) => write!(f, "malformed stream: {msg}"),
            DecodeError::UnknownType(name) => write!(f, "unknown field type: {name:?}"),
        }
    }
}

impl std::error::Error for DecodeError {}

// ---------------------------------------------------------------------------
// ByteReader
// ---------------------------------------------------------------------------

/// Checked big-endian cursor over a byte slice. Every read verifies the
/// remaining length first, so a truncated stream reports `Underflow`
/// instead of panicking.
pub struct ByteReader<'a> {
    buf: &'a [u8],
}

impl<'a> ByteReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        ByteReader { buf }
    }

    pub fn remaining(&self) -> usize {
        self.buf.remaining()
    }

    pub fn has_remaining(&self) -> bool {
        self.buf.has_remaining()
    }

    fn ensure(&self, wanted: usize) -> Result<(), DecodeError> {
        if self.buf.remaining() < wanted {
            return Err(DecodeError::Underflow {
                wanted,
                remaining: self.buf.remaining(),
            });
        }
        Ok(())
    }

    pub fn read_u8(&mut self) -> Result<u8, DecodeError> {
        self.ensure(1)?;
        Ok(self.buf.get_u8())
    }

    pub fn read_i8(&mut self) -> Result<i8, DecodeError> {
        self.ensure(1)?;
        Ok(self.buf.get_i8())
    }

    pub fn read_u16(&mut self) -> Result<u16, DecodeError> {
        self.ensure(2)?;
        Ok(self.buf.get_u16())
    }

    pub fn read_i16(&mut self) -> Result<i16, DecodeError> {
        self.ensure(2)?;
        Ok(self.buf.get_i16())
    }

    pub fn read_i32(&mut self) -> Result<i32, DecodeError> {
        self.ensure(4)?;
        Ok(self.buf.get_i32())
    }

    pub fn read_i64(&mut self) -> Result<i64, DecodeError> {
        self.ensure(8)?;
        Ok(self.buf.get_i64())
    }

    pub fn read_f32(&mut self) -> Result<f32, DecodeError> {
        self.ensure(4)?;
        Ok(self.buf.get_f32())
    }

    pub fn read_f64(&mut self) -> Result<f64, DecodeError> {
        self.ensure(8)?;
        Ok(self.buf.get_f64())
    }

    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8], DecodeError> {
        self.ensure(len)?;
        let (head, tail) = self.buf.split_at(len);
        self.buf = tail;
        Ok(head)
    }

    /// `uint16` length followed by that many raw bytes.
    pub fn read_len_bytes(&mut self) -> Result<&'a [u8], DecodeError> {
        let len = self.read_u16()? as usize;
        self.read_bytes(len)
    }

    /// `uint16` length followed by UTF-8 text. Invalid UTF-8 degrades
    /// lossily — string content is never a framing concern.
    pub fn read_utf(&mut self) -> Result<String, DecodeError> {
        let raw = self.read_len_bytes()?;
        Ok(String::from_utf8_lossy(raw).into_owned())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_are_big_endian() {
        let mut r = ByteReader::new(&[0x00, 0x00, 0x00, 0x2A]);
        assert_eq!(r.read_i32().unwrap(), 42);
        assert_eq!(r.remaining(), 0);
    }

    #[test]
    fn underflow_is_reported_not_panicked() {
        let mut r = ByteReader::new(&[0x01]);
        assert_eq!(
            r.read_i64(),
            Err(DecodeError::Underflow { wanted: 8, remaining: 1 })
        );
    }

    #[test]
    fn utf_reads_length_prefixed_text() {
        let mut r = ByteReader::new(&[0x00, 0x02, b'h', b'i', 0xFF]);
        assert_eq!(r.read_utf().unwrap(), "hi");
        assert_eq!(r.remaining(), 1);
    }

    #[test]
    fn invalid_utf8_degrades_lossily() {
        let mut r = ByteReader::new(&[0x00, 0x01, 0xFF]);
        assert_eq!(r.read_utf().unwrap(), "\u{FFFD}");
    }
}
