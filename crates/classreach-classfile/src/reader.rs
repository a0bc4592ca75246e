//! Big-endian byte cursor over class-file data
//!
//! Every multi-byte quantity in a class file is stored big-endian. The reader
//! borrows the input and hands out sub-slices without copying.

use thiserror::Error;

/// Errors raised by the byte cursor itself
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// Unexpected end of input
    #[error("Unexpected end of class data at offset {0}")]
    UnexpectedEnd(usize),

    /// Malformed modified UTF-8 in a constant
    #[error("Invalid modified UTF-8 at offset {0}")]
    InvalidUtf8(usize),
}

/// Class-file reader
///
/// Reads unsigned integers and raw byte runs from a borrowed buffer,
/// tracking the current position.
#[derive(Debug, Clone)]
pub struct ClassReader<'a> {
    buffer: &'a [u8],
    position: usize,
}

impl<'a> ClassReader<'a> {
    /// Create a new reader positioned at the start of `buffer`
    pub fn new(buffer: &'a [u8]) -> Self {
        Self {
            buffer,
            position: 0,
        }
    }

    /// Get the current position in the buffer
    pub fn position(&self) -> usize {
        self.position
    }

    /// Get the remaining bytes in the buffer
    pub fn remaining(&self) -> usize {
        self.buffer.len().saturating_sub(self.position)
    }

    /// Check if there are more bytes to read
    pub fn has_more(&self) -> bool {
        self.position < self.buffer.len()
    }

    /// Read a single byte
    pub fn read_u8(&mut self) -> Result<u8, DecodeError> {
        let value = *self
            .buffer
            .get(self.position)
            .ok_or(DecodeError::UnexpectedEnd(self.position))?;
        self.position += 1;
        Ok(value)
    }

    /// Read a 16-bit unsigned integer
    pub fn read_u16(&mut self) -> Result<u16, DecodeError> {
        let bytes = self.read_array::<2>()?;
        Ok(u16::from_be_bytes(bytes))
    }

    /// Read a 32-bit unsigned integer
    pub fn read_u32(&mut self) -> Result<u32, DecodeError> {
        let bytes = self.read_array::<4>()?;
        Ok(u32::from_be_bytes(bytes))
    }

    /// Read a 32-bit signed integer
    pub fn read_i32(&mut self) -> Result<i32, DecodeError> {
        let bytes = self.read_array::<4>()?;
        Ok(i32::from_be_bytes(bytes))
    }

    /// Read a fixed number of bytes, borrowing them from the input
    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8], DecodeError> {
        let end = self
            .position
            .checked_add(len)
            .filter(|end| *end <= self.buffer.len())
            .ok_or(DecodeError::UnexpectedEnd(self.position))?;
        let bytes = &self.buffer[self.position..end];
        self.position = end;
        Ok(bytes)
    }

    /// Skip `len` bytes
    pub fn skip(&mut self, len: usize) -> Result<(), DecodeError> {
        self.read_bytes(len).map(|_| ())
    }

    /// Read a u2-length-prefixed modified UTF-8 string (a `CONSTANT_Utf8` body)
    pub fn read_modified_utf8(&mut self) -> Result<String, DecodeError> {
        let len = self.read_u16()? as usize;
        let start = self.position;
        let bytes = self.read_bytes(len)?;
        decode_modified_utf8(bytes).ok_or(DecodeError::InvalidUtf8(start))
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N], DecodeError> {
        let bytes = self.read_bytes(N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(bytes);
        Ok(out)
    }
}

/// Decode the JVM's modified UTF-8
///
/// Differs from standard UTF-8 in two ways: NUL is encoded as `C0 80`, and
/// supplementary characters are stored as two 3-byte surrogate halves.
/// Unpaired surrogates are legal in a `CONSTANT_Utf8` (javac emits them for
/// literals such as `"\uD800"`) and decode to U+FFFD.
fn decode_modified_utf8(bytes: &[u8]) -> Option<String> {
    if !bytes.iter().any(|b| *b == 0 || *b >= 0x80) {
        return std::str::from_utf8(bytes).ok().map(str::to_owned);
    }

    let mut units: Vec<u16> = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        let b0 = bytes[i];
        match b0 {
            0x01..=0x7F => {
                units.push(b0 as u16);
                i += 1;
            }
            0xC0..=0xDF => {
                let b1 = continuation(bytes.get(i + 1))?;
                units.push((((b0 & 0x1F) as u16) << 6) | b1);
                i += 2;
            }
            0xE0..=0xEF => {
                let b1 = continuation(bytes.get(i + 1))?;
                let b2 = continuation(bytes.get(i + 2))?;
                units.push((((b0 & 0x0F) as u16) << 12) | (b1 << 6) | b2);
                i += 3;
            }
            _ => return None,
        }
    }
    Some(String::from_utf16_lossy(&units))
}

fn continuation(byte: Option<&u8>) -> Option<u16> {
    match byte {
        Some(b) if b & 0xC0 == 0x80 => Some((b & 0x3F) as u16),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_big_endian() {
        let data = [0xCA, 0xFE, 0xBA, 0xBE, 0x00, 0x34, 0xFF];
        let mut reader = ClassReader::new(&data);
        assert_eq!(reader.read_u32().unwrap(), 0xCAFE_BABE);
        assert_eq!(reader.read_u16().unwrap(), 52);
        assert_eq!(reader.read_u8().unwrap(), 0xFF);
        assert!(!reader.has_more());
    }

    #[test]
    fn test_unexpected_end_reports_offset() {
        let data = [0x00, 0x01, 0x02];
        let mut reader = ClassReader::new(&data);
        reader.read_u16().unwrap();
        assert_eq!(reader.read_u16(), Err(DecodeError::UnexpectedEnd(2)));
        // A failed read does not advance the cursor
        assert_eq!(reader.position(), 2);
    }

    #[test]
    fn test_read_bytes_overflow_is_an_error() {
        let data = [0u8; 4];
        let mut reader = ClassReader::new(&data);
        reader.read_u8().unwrap();
        assert!(reader.read_bytes(usize::MAX).is_err());
    }

    #[test]
    fn test_modified_utf8_ascii() {
        let data = [0x00, 0x03, b'a', b'/', b'B'];
        let mut reader = ClassReader::new(&data);
        assert_eq!(reader.read_modified_utf8().unwrap(), "a/B");
    }

    #[test]
    fn test_modified_utf8_embedded_nul_and_two_byte() {
        // "é" is C3 A9, NUL is C0 80
        let data = [0x00, 0x04, 0xC3, 0xA9, 0xC0, 0x80];
        let mut reader = ClassReader::new(&data);
        assert_eq!(reader.read_modified_utf8().unwrap(), "é\0");
    }

    #[test]
    fn test_modified_utf8_surrogate_pair() {
        // U+1F600 as surrogates D83D DE00, each encoded in three bytes
        let data = [0x00, 0x06, 0xED, 0xA0, 0xBD, 0xED, 0xB8, 0x80];
        let mut reader = ClassReader::new(&data);
        assert_eq!(reader.read_modified_utf8().unwrap(), "\u{1F600}");
    }

    #[test]
    fn test_modified_utf8_lone_surrogate() {
        // "a" U+D800 "b": a high surrogate with no low half
        let data = [0x00, 0x05, b'a', 0xED, 0xA0, 0x80, b'b'];
        let mut reader = ClassReader::new(&data);
        assert_eq!(reader.read_modified_utf8().unwrap(), "a\u{FFFD}b");
        assert!(!reader.has_more());
    }

    #[test]
    fn test_modified_utf8_rejects_raw_nul() {
        let data = [0x00, 0x01, 0x00];
        let mut reader = ClassReader::new(&data);
        assert_eq!(reader.read_modified_utf8(), Err(DecodeError::InvalidUtf8(2)));
    }
}
