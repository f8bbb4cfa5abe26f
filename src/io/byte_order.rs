//! Byte order (endianness) handling
//!
//! Grid shift files and tagged directories both come in little- and
//! big-endian flavours. The order is detected once per resource and then a
//! [`ByteOrderHandler`] performs the typed reads.

use std::io::Result;
use crate::error::Error;
use crate::io::SeekableReader;

/// Represents the byte order (endianness) of binary data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
pub enum ByteOrder {
    /// Little-endian byte order (least significant byte first)
    LittleEndian,
    /// Big-endian byte order (most significant byte first)
    BigEndian,
}

impl ByteOrder {
    /// Byte order of the machine running this code
    pub const fn native() -> Self {
        if cfg!(target_endian = "little") {
            ByteOrder::LittleEndian
        } else {
            ByteOrder::BigEndian
        }
    }

    /// Detects byte order from TIFF magic bytes
    ///
    /// TIFF files start with either "II" (0x4949) for little-endian
    /// or "MM" (0x4D4D) for big-endian.
    pub fn from_tiff_magic(magic: [u8; 2]) -> Option<Self> {
        match &magic {
            b"II" => Some(ByteOrder::LittleEndian),
            b"MM" => Some(ByteOrder::BigEndian),
            _ => None,
        }
    }

    /// Detects byte order from a 4-byte integer whose value is known
    ///
    /// NTv2 files carry no marker; the first record holds the number of
    /// overview records, so whichever order decodes to `expected` wins.
    pub fn from_known_u32(bytes: [u8; 4], expected: u32) -> Option<Self> {
        if u32::from_le_bytes(bytes) == expected {
            Some(ByteOrder::LittleEndian)
        } else if u32::from_be_bytes(bytes) == expected {
            Some(ByteOrder::BigEndian)
        } else {
            None
        }
    }

    /// Reads and detects byte order from a reader positioned on a TIFF header
    pub fn detect<R: SeekableReader>(reader: &mut R) -> crate::Result<Self> {
        let mut magic = [0u8; 2];
        reader.read_exact(&mut magic)?;

        Self::from_tiff_magic(magic)
            .ok_or_else(|| Error::InvalidByteOrder(u16::from_be_bytes(magic)))
    }

    /// Creates a handler for this byte order
    pub fn handler(&self) -> Box<dyn ByteOrderHandler> {
        match self {
            ByteOrder::LittleEndian => Box::new(LittleEndian),
            ByteOrder::BigEndian => Box::new(BigEndian),
        }
    }

    /// Short label used in diagnostics ("II" / "MM")
    pub fn label(&self) -> &'static str {
        match self {
            ByteOrder::LittleEndian => "II",
            ByteOrder::BigEndian => "MM",
        }
    }
}

/// Trait for reading typed values with specific byte order
pub trait ByteOrderHandler: Send + Sync {
    /// Reads an unsigned 16-bit integer
    fn read_u16(&self, reader: &mut dyn SeekableReader) -> Result<u16>;

    /// Reads an unsigned 32-bit integer
    fn read_u32(&self, reader: &mut dyn SeekableReader) -> Result<u32>;

    /// Reads an unsigned 64-bit integer
    fn read_u64(&self, reader: &mut dyn SeekableReader) -> Result<u64>;

    /// Reads a signed 16-bit integer
    fn read_i16(&self, reader: &mut dyn SeekableReader) -> Result<i16>;

    /// Reads a signed 32-bit integer
    fn read_i32(&self, reader: &mut dyn SeekableReader) -> Result<i32>;

    /// Reads a signed 64-bit integer
    fn read_i64(&self, reader: &mut dyn SeekableReader) -> Result<i64>;

    /// Reads a 32-bit floating point number
    fn read_f32(&self, reader: &mut dyn SeekableReader) -> Result<f32>;

    /// Reads a 64-bit floating point number
    fn read_f64(&self, reader: &mut dyn SeekableReader) -> Result<f64>;

    /// Decodes UTF-16 code units from raw bytes in this order
    fn u16_units(&self, bytes: &[u8]) -> Vec<u16>;
}

macro_rules! read_as {
    ($reader:expr, $ty:ty, $from:ident) => {{
        let mut buf = [0u8; std::mem::size_of::<$ty>()];
        $reader.read_exact(&mut buf)?;
        Ok(<$ty>::$from(buf))
    }};
}

macro_rules! byte_order_handler {
    ($name:ident, $from:ident) => {
        struct $name;

        impl ByteOrderHandler for $name {
            fn read_u16(&self, reader: &mut dyn SeekableReader) -> Result<u16> {
                read_as!(reader, u16, $from)
            }

            fn read_u32(&self, reader: &mut dyn SeekableReader) -> Result<u32> {
                read_as!(reader, u32, $from)
            }

            fn read_u64(&self, reader: &mut dyn SeekableReader) -> Result<u64> {
                read_as!(reader, u64, $from)
            }

            fn read_i16(&self, reader: &mut dyn SeekableReader) -> Result<i16> {
                read_as!(reader, i16, $from)
            }

            fn read_i32(&self, reader: &mut dyn SeekableReader) -> Result<i32> {
                read_as!(reader, i32, $from)
            }

            fn read_i64(&self, reader: &mut dyn SeekableReader) -> Result<i64> {
                read_as!(reader, i64, $from)
            }

            fn read_f32(&self, reader: &mut dyn SeekableReader) -> Result<f32> {
                read_as!(reader, f32, $from)
            }

            fn read_f64(&self, reader: &mut dyn SeekableReader) -> Result<f64> {
                read_as!(reader, f64, $from)
            }

            fn u16_units(&self, bytes: &[u8]) -> Vec<u16> {
                bytes
                    .chunks_exact(2)
                    .map(|pair| u16::$from([pair[0], pair[1]]))
                    .collect()
            }
        }
    };
}

byte_order_handler!(LittleEndian, from_le_bytes);
byte_order_handler!(BigEndian, from_be_bytes);

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_from_tiff_magic() {
        assert_eq!(ByteOrder::from_tiff_magic(*b"II"), Some(ByteOrder::LittleEndian));
        assert_eq!(ByteOrder::from_tiff_magic(*b"MM"), Some(ByteOrder::BigEndian));
        assert_eq!(ByteOrder::from_tiff_magic(*b"XX"), None);
    }

    #[test]
    fn test_detect_invalid() {
        let mut cursor = Cursor::new(b"XX".to_vec());
        let err = ByteOrder::detect(&mut cursor).unwrap_err();
        assert!(matches!(err, Error::InvalidByteOrder(0x5858)));
    }

    #[test]
    fn test_from_known_u32() {
        assert_eq!(
            ByteOrder::from_known_u32(11u32.to_le_bytes(), 11),
            Some(ByteOrder::LittleEndian)
        );
        assert_eq!(
            ByteOrder::from_known_u32(11u32.to_be_bytes(), 11),
            Some(ByteOrder::BigEndian)
        );
        assert_eq!(ByteOrder::from_known_u32([1, 2, 3, 4], 11), None);
    }

    #[test]
    fn test_handlers_agree_on_mirrored_bytes() {
        let le = ByteOrder::LittleEndian.handler();
        let be = ByteOrder::BigEndian.handler();

        let mut le_cursor: Box<dyn SeekableReader> = Box::new(Cursor::new(vec![0x78u8, 0x56, 0x34, 0x12]));
        let mut be_cursor: Box<dyn SeekableReader> = Box::new(Cursor::new(vec![0x12u8, 0x34, 0x56, 0x78]));

        assert_eq!(le.read_u32(&mut le_cursor).unwrap(), 0x12345678);
        assert_eq!(be.read_u32(&mut be_cursor).unwrap(), 0x12345678);
    }

    #[test]
    fn test_signed_and_float_reads() {
        let handler = ByteOrder::LittleEndian.handler();
        let mut data = vec![0xFFu8, 0xFF];
        data.extend_from_slice(&std::f64::consts::PI.to_le_bytes());
        let mut cursor: Box<dyn SeekableReader> = Box::new(Cursor::new(data));

        assert_eq!(handler.read_i16(&mut cursor).unwrap(), -1);
        assert_eq!(handler.read_f64(&mut cursor).unwrap(), std::f64::consts::PI);
    }

    #[test]
    fn test_short_read_fails() {
        let handler = ByteOrder::BigEndian.handler();
        let mut cursor: Box<dyn SeekableReader> = Box::new(Cursor::new(vec![0x01u8]));
        assert!(handler.read_u16(&mut cursor).is_err());
    }

    #[test]
    fn test_u16_units() {
        let be = ByteOrder::BigEndian.handler();
        assert_eq!(be.u16_units(&[0x00, 0x41, 0x00, 0x42]), vec![0x41, 0x42]);
        let le = ByteOrder::LittleEndian.handler();
        assert_eq!(le.u16_units(&[0x41, 0x00, 0x42]), vec![0x41]);
    }
}
