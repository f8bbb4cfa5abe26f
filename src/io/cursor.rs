//! Position-aware typed reader
//!
//! [`BinaryCursor`] is the single read path used by the grid-shift parser and
//! the tagged directory decoder. Every read is bounds-checked against the
//! source length first, so a truncated source surfaces as
//! [`Error::UnexpectedEndOfData`] and the cursor position is left where it
//! was.

use std::io::SeekFrom;
use serde::Serialize;
use crate::error::{Error, Result};
use crate::io::{ByteOrder, ByteOrderHandler, SeekableReader, source_len};

/// Character encoding of fixed-length text fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    /// 7-bit ASCII; bytes above 0x7F become U+FFFD
    Ascii,
    /// ISO-8859-1, one byte per code point
    Latin1,
    /// UTF-8, invalid sequences replaced
    Utf8,
    /// UTF-16 code units in the cursor's byte order
    Utf16,
}

/// What to do with terminator/padding at the end of a fixed-length field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Terminator {
    /// Keep every decoded character, including trailing NULs
    #[default]
    Preserve,
    /// Strip trailing NUL characters
    TrimNul,
    /// Strip trailing NUL characters and spaces
    TrimPadding,
}

impl Terminator {
    /// Applies this policy to decoded text
    pub fn apply(self, text: String) -> String {
        let trimmed = match self {
            Terminator::Preserve => return text,
            Terminator::TrimNul => text.trim_end_matches('\0'),
            Terminator::TrimPadding => text.trim_end_matches(['\0', ' ']),
        };
        trimmed.to_string()
    }
}

/// Unsigned fraction as stored by TIFF RATIONAL fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Rational {
    pub numerator: u32,
    pub denominator: u32,
}

impl Rational {
    /// Value as `f64`, `None` for a zero denominator
    pub fn to_f64(&self) -> Option<f64> {
        (self.denominator != 0).then(|| self.numerator as f64 / self.denominator as f64)
    }
}

/// Signed fraction as stored by TIFF SRATIONAL fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SRational {
    pub numerator: i32,
    pub denominator: i32,
}

impl SRational {
    /// Value as `f64`, `None` for a zero denominator
    pub fn to_f64(&self) -> Option<f64> {
        (self.denominator != 0).then(|| self.numerator as f64 / self.denominator as f64)
    }
}

/// Sequential typed reader over a seekable byte source
pub struct BinaryCursor<R: SeekableReader> {
    inner: R,
    order: ByteOrder,
    handler: Box<dyn ByteOrderHandler>,
    pos: u64,
    len: u64,
}

macro_rules! typed_read {
    ($(#[$doc:meta])* $name:ident -> $ty:ty) => {
        $(#[$doc])*
        pub fn $name(&mut self) -> Result<$ty> {
            const WIDTH: u64 = std::mem::size_of::<$ty>() as u64;
            self.ensure(WIDTH)?;
            let value = self.handler.$name(&mut self.inner)?;
            self.pos += WIDTH;
            Ok(value)
        }
    };
}

impl<R: SeekableReader> BinaryCursor<R> {
    /// Wraps a reader; the cursor starts at the reader's current position
    pub fn new(mut inner: R, order: ByteOrder) -> Result<Self> {
        let len = source_len(&mut inner)?;
        let pos = inner.stream_position()?;
        Ok(Self {
            inner,
            order,
            handler: order.handler(),
            pos,
            len,
        })
    }

    /// Current byte order
    pub fn byte_order(&self) -> ByteOrder {
        self.order
    }

    /// Switches byte order for subsequent reads
    pub fn set_byte_order(&mut self, order: ByteOrder) {
        if order != self.order {
            self.order = order;
            self.handler = order.handler();
        }
    }

    /// Absolute position in the source
    pub fn position(&self) -> u64 {
        self.pos
    }

    /// Total length of the source
    pub fn len(&self) -> u64 {
        self.len
    }

    /// Whether the source is empty
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Bytes left between the position and the end of the source
    pub fn remaining(&self) -> u64 {
        self.len.saturating_sub(self.pos)
    }

    /// Consumes the cursor, returning the underlying reader
    pub fn into_inner(self) -> R {
        self.inner
    }

    fn ensure(&self, needed: u64) -> Result<()> {
        if needed > self.remaining() {
            return Err(Error::UnexpectedEndOfData {
                offset: self.pos,
                needed,
                available: self.remaining(),
            });
        }
        Ok(())
    }

    /// Checks that `needed` bytes exist at `offset` without moving
    pub fn ensure_range(&self, offset: u64, needed: u64) -> Result<()> {
        let available = self.len.saturating_sub(offset);
        if offset > self.len || needed > available {
            return Err(Error::UnexpectedEndOfData { offset, needed, available });
        }
        Ok(())
    }

    /// Moves to an absolute offset (the end of the source is a valid target)
    pub fn seek(&mut self, offset: u64) -> Result<()> {
        if offset > self.len {
            return Err(Error::InvalidOffset(offset));
        }
        self.inner.seek(SeekFrom::Start(offset))?;
        self.pos = offset;
        Ok(())
    }

    /// Advances by `count` bytes
    pub fn skip(&mut self, count: u64) -> Result<()> {
        self.ensure(count)?;
        self.seek(self.pos + count)
    }

    /// Runs `f` at `offset` and restores the current position afterwards
    pub fn at_offset<T>(&mut self, offset: u64, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        let saved = self.pos;
        self.seek(offset)?;
        let result = f(self);
        self.seek(saved)?;
        result
    }

    /// Fills `buf` completely
    pub fn read_into(&mut self, buf: &mut [u8]) -> Result<()> {
        self.ensure(buf.len() as u64)?;
        self.inner.read_exact(buf)?;
        self.pos += buf.len() as u64;
        Ok(())
    }

    /// Reads `count` raw bytes
    pub fn read_bytes(&mut self, count: usize) -> Result<Vec<u8>> {
        self.ensure(count as u64)?;
        let mut bytes = vec![0u8; count];
        self.read_into(&mut bytes)?;
        Ok(bytes)
    }

    /// Reads a fixed-size byte array
    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut bytes = [0u8; N];
        self.read_into(&mut bytes)?;
        Ok(bytes)
    }

    /// Returns the next `N` bytes without advancing
    pub fn peek_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let saved = self.pos;
        let bytes = self.read_array::<N>()?;
        self.seek(saved)?;
        Ok(bytes)
    }

    /// Reads an unsigned byte
    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.read_array::<1>()?[0])
    }

    /// Reads a signed byte
    pub fn read_i8(&mut self) -> Result<i8> {
        Ok(self.read_u8()? as i8)
    }

    typed_read!(/// Reads an unsigned 16-bit integer
        read_u16 -> u16);
    typed_read!(/// Reads an unsigned 32-bit integer
        read_u32 -> u32);
    typed_read!(/// Reads an unsigned 64-bit integer
        read_u64 -> u64);
    typed_read!(/// Reads a signed 16-bit integer
        read_i16 -> i16);
    typed_read!(/// Reads a signed 32-bit integer
        read_i32 -> i32);
    typed_read!(/// Reads a signed 64-bit integer
        read_i64 -> i64);
    typed_read!(/// Reads an IEEE-754 single
        read_f32 -> f32);
    typed_read!(/// Reads an IEEE-754 double
        read_f64 -> f64);

    /// Reads a TIFF RATIONAL (two u32)
    pub fn read_rational(&mut self) -> Result<Rational> {
        self.ensure(8)?;
        Ok(Rational {
            numerator: self.read_u32()?,
            denominator: self.read_u32()?,
        })
    }

    /// Reads a TIFF SRATIONAL (two i32)
    pub fn read_srational(&mut self) -> Result<SRational> {
        self.ensure(8)?;
        Ok(SRational {
            numerator: self.read_i32()?,
            denominator: self.read_i32()?,
        })
    }

    /// Reads a signed 16.16 fixed-point number
    pub fn read_fixed_16_16(&mut self) -> Result<f64> {
        Ok(self.read_i32()? as f64 / 65536.0)
    }

    /// Reads `len` bytes as text under `encoding`, applying `terminator`
    pub fn read_text(&mut self, len: usize, encoding: TextEncoding, terminator: Terminator) -> Result<String> {
        let bytes = self.read_bytes(len)?;
        let text = decode_text(&bytes, encoding, &*self.handler)?;
        Ok(terminator.apply(text))
    }
}

/// Decodes raw bytes as text
pub fn decode_text(bytes: &[u8], encoding: TextEncoding, handler: &dyn ByteOrderHandler) -> Result<String> {
    let text = match encoding {
        TextEncoding::Ascii => bytes
            .iter()
            .map(|&b| if b.is_ascii() { b as char } else { char::REPLACEMENT_CHARACTER })
            .collect(),
        TextEncoding::Latin1 => bytes.iter().map(|&b| b as char).collect(),
        TextEncoding::Utf8 => String::from_utf8_lossy(bytes).into_owned(),
        TextEncoding::Utf16 => {
            if bytes.len() % 2 != 0 {
                return Err(Error::InvalidFormat(format!(
                    "UTF-16 field has odd length {}",
                    bytes.len()
                )));
            }
            String::from_utf16_lossy(&handler.u16_units(bytes))
        }
    };
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn cursor(data: Vec<u8>, order: ByteOrder) -> BinaryCursor<Cursor<Vec<u8>>> {
        BinaryCursor::new(Cursor::new(data), order).unwrap()
    }

    #[test]
    fn test_reads_advance_by_width() {
        let mut data = vec![0x01u8];
        data.extend_from_slice(&0x0203u16.to_be_bytes());
        data.extend_from_slice(&0x04050607u32.to_be_bytes());
        data.extend_from_slice(&(-2i64).to_be_bytes());
        data.extend_from_slice(&1.5f32.to_be_bytes());

        let mut c = cursor(data, ByteOrder::BigEndian);
        assert_eq!(c.read_u8().unwrap(), 1);
        assert_eq!(c.position(), 1);
        assert_eq!(c.read_u16().unwrap(), 0x0203);
        assert_eq!(c.position(), 3);
        assert_eq!(c.read_u32().unwrap(), 0x04050607);
        assert_eq!(c.position(), 7);
        assert_eq!(c.read_i64().unwrap(), -2);
        assert_eq!(c.position(), 15);
        assert_eq!(c.read_f32().unwrap(), 1.5);
        assert_eq!(c.remaining(), 0);
    }

    #[test]
    fn test_read_past_end_is_unexpected_end_of_data() {
        let mut c = cursor(vec![1, 2, 3], ByteOrder::LittleEndian);
        c.read_u8().unwrap();

        let err = c.read_u32().unwrap_err();
        assert!(matches!(
            err,
            Error::UnexpectedEndOfData { offset: 1, needed: 4, available: 2 }
        ));
        assert_eq!(c.position(), 1);
        assert_eq!(c.read_u16().unwrap(), 0x0302);
    }

    #[test]
    fn test_switch_byte_order() {
        let mut c = cursor(vec![0x00, 0x0B, 0x0B, 0x00], ByteOrder::BigEndian);
        assert_eq!(c.read_u16().unwrap(), 11);
        c.set_byte_order(ByteOrder::LittleEndian);
        assert_eq!(c.read_u16().unwrap(), 11);
    }

    #[test]
    fn test_seek_skip_and_at_offset() {
        let mut c = cursor((0u8..16).collect(), ByteOrder::LittleEndian);
        c.skip(4).unwrap();
        assert_eq!(c.read_u8().unwrap(), 4);

        let value = c.at_offset(10, |c| c.read_u8()).unwrap();
        assert_eq!(value, 10);
        assert_eq!(c.position(), 5);

        assert!(matches!(c.seek(17), Err(Error::InvalidOffset(17))));
        c.seek(16).unwrap();
        assert!(c.read_u8().is_err());
        assert!(c.skip(1).is_err());
    }

    #[test]
    fn test_peek_does_not_advance() {
        let mut c = cursor(vec![9, 8, 7, 6, 5], ByteOrder::LittleEndian);
        assert_eq!(c.peek_array::<4>().unwrap(), [9, 8, 7, 6]);
        assert_eq!(c.position(), 0);
    }

    #[test]
    fn test_rationals_and_fixed_point() {
        let mut data = Vec::new();
        data.extend_from_slice(&72u32.to_le_bytes());
        data.extend_from_slice(&1u32.to_le_bytes());
        data.extend_from_slice(&(-3i32).to_le_bytes());
        data.extend_from_slice(&4i32.to_le_bytes());
        data.extend_from_slice(&(0x0001_8000i32).to_le_bytes());

        let mut c = cursor(data, ByteOrder::LittleEndian);
        let r = c.read_rational().unwrap();
        assert_eq!(r, Rational { numerator: 72, denominator: 1 });
        assert_eq!(r.to_f64(), Some(72.0));
        assert_eq!(c.read_srational().unwrap().to_f64(), Some(-0.75));
        assert_eq!(c.read_fixed_16_16().unwrap(), 1.5);
    }

    #[test]
    fn test_zero_denominator() {
        assert_eq!(Rational { numerator: 1, denominator: 0 }.to_f64(), None);
    }

    #[test]
    fn test_read_text_preserve_and_trim() {
        let mut c = cursor(b"ABCDE\0NONE    ".to_vec(), ByteOrder::LittleEndian);

        let preserved = c.read_text(6, TextEncoding::Ascii, Terminator::Preserve).unwrap();
        assert_eq!(preserved, "ABCDE\0");
        assert_eq!(preserved.len(), 6);

        let padded = c.read_text(8, TextEncoding::Ascii, Terminator::TrimPadding).unwrap();
        assert_eq!(padded, "NONE");

        c.seek(0).unwrap();
        let trimmed = c.read_text(6, TextEncoding::Ascii, Terminator::TrimNul).unwrap();
        assert_eq!(trimmed, "ABCDE");
    }

    #[test]
    fn test_read_text_encodings() {
        let mut c = cursor(vec![0x63, 0x61, 0x66, 0xE9], ByteOrder::BigEndian);
        assert_eq!(c.read_text(4, TextEncoding::Latin1, Terminator::Preserve).unwrap(), "café");

        c.seek(0).unwrap();
        assert_eq!(c.read_text(4, TextEncoding::Ascii, Terminator::Preserve).unwrap(), "caf\u{FFFD}");

        let mut c = cursor("café".as_bytes().to_vec(), ByteOrder::BigEndian);
        assert_eq!(c.read_text(5, TextEncoding::Utf8, Terminator::Preserve).unwrap(), "café");

        let mut c = cursor(vec![0x00, 0x4E, 0x00, 0x41, 0x00, 0x00], ByteOrder::BigEndian);
        assert_eq!(c.read_text(6, TextEncoding::Utf16, Terminator::TrimNul).unwrap(), "NA");
    }

    #[test]
    fn test_utf16_odd_length() {
        let mut c = cursor(vec![0x00, 0x41, 0x00], ByteOrder::BigEndian);
        assert!(matches!(
            c.read_text(3, TextEncoding::Utf16, Terminator::Preserve),
            Err(Error::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_text_past_end() {
        let mut c = cursor(b"AB".to_vec(), ByteOrder::LittleEndian);
        assert!(c.read_text(3, TextEncoding::Ascii, Terminator::Preserve).unwrap_err().is_end_of_data());
    }
}
