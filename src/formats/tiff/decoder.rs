//! Tagged directory decoding
//!
//! Entries are read in on-disk order. Each declared field type selects a
//! value loader; values that fit the inline field are decoded from those
//! bytes, larger ones are read at their absolute offset after a bounds check
//! against the source length.

use std::io::Cursor;
use tracing::{debug, warn};
use crate::error::{Error, Result};
use crate::io::{BinaryCursor, SeekableReader, Terminator, TextEncoding};
use super::ifd::{DirectoryEntry, DirectoryWarning, FieldType, TagValue, TiffDirectory};

/// Upper bound on entries in one directory
pub const MAX_DIRECTORY_ENTRIES: u64 = 65_535;

/// Options controlling how a directory is decoded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeOptions {
    /// BigTIFF layout: u64 entry count, u64 value count, 8-byte inline field
    pub big_tiff: bool,
    /// Handling of the terminator of ASCII values
    pub ascii_terminator: Terminator,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            big_tiff: false,
            ascii_terminator: Terminator::Preserve,
        }
    }
}

impl DecodeOptions {
    pub fn big_tiff() -> Self {
        Self {
            big_tiff: true,
            ..Self::default()
        }
    }

    /// Width of the inline value-or-offset field
    pub fn inline_width(&self) -> usize {
        if self.big_tiff { 8 } else { 4 }
    }

    /// Size of one on-disk entry record
    pub fn entry_size(&self) -> u64 {
        if self.big_tiff { 20 } else { 12 }
    }
}

/// Entry header as stored on disk, before its value is loaded
struct RawEntry {
    tag: u16,
    type_code: u16,
    count: u64,
    inline: Vec<u8>,
}

/// Decodes the directory at the cursor position with default options
pub fn decode_directory<R: SeekableReader>(cursor: &mut BinaryCursor<R>) -> Result<TiffDirectory> {
    decode_directory_with(cursor, 0, &DecodeOptions::default())
}

/// Decodes the directory at the cursor position
///
/// On success the cursor sits just past the next-directory pointer (or past
/// the last entry when the source ends there).
pub fn decode_directory_with<R: SeekableReader>(
    cursor: &mut BinaryCursor<R>,
    number: usize,
    options: &DecodeOptions,
) -> Result<TiffDirectory> {
    let offset = cursor.position();
    let entry_count = if options.big_tiff {
        cursor.read_u64()?
    } else {
        cursor.read_u16()? as u64
    };

    if entry_count > MAX_DIRECTORY_ENTRIES {
        return Err(Error::InvalidFormat(format!(
            "directory at offset {} declares {} entries",
            offset, entry_count
        )));
    }
    cursor.ensure_range(cursor.position(), entry_count * options.entry_size())?;

    let mut raw_entries = Vec::with_capacity(entry_count as usize);
    for _ in 0..entry_count {
        raw_entries.push(read_raw_entry(cursor, options)?);
    }

    let width = options.inline_width() as u64;
    let next_offset = if cursor.remaining() >= width {
        read_offset(cursor, options)?
    } else {
        0
    };
    let end = cursor.position();

    let mut directory = TiffDirectory::new(number, offset);
    directory.next_offset = next_offset;

    for raw in raw_entries {
        let entry = load_entry(cursor, raw, options, &mut directory)?;
        let tag = entry.tag;
        if directory.insert(entry).is_some() {
            warn!(tag, directory = number, "duplicate tag, keeping the later value");
        }
    }

    cursor.seek(end)?;
    debug!(
        directory = number,
        offset,
        entries = directory.len(),
        next_offset,
        "decoded directory"
    );

    Ok(directory)
}

fn read_offset<R: SeekableReader>(cursor: &mut BinaryCursor<R>, options: &DecodeOptions) -> Result<u64> {
    if options.big_tiff {
        cursor.read_u64()
    } else {
        Ok(cursor.read_u32()? as u64)
    }
}

fn read_raw_entry<R: SeekableReader>(cursor: &mut BinaryCursor<R>, options: &DecodeOptions) -> Result<RawEntry> {
    let tag = cursor.read_u16()?;
    let type_code = cursor.read_u16()?;
    let count = if options.big_tiff {
        cursor.read_u64()?
    } else {
        cursor.read_u32()? as u64
    };
    let inline = cursor.read_bytes(options.inline_width())?;

    Ok(RawEntry { tag, type_code, count, inline })
}

fn load_entry<R: SeekableReader>(
    cursor: &mut BinaryCursor<R>,
    raw: RawEntry,
    options: &DecodeOptions,
    directory: &mut TiffDirectory,
) -> Result<DirectoryEntry> {
    let field_type = FieldType::from_code(raw.type_code);

    let Some(element_size) = field_type.element_size() else {
        warn!(tag = raw.tag, field_type = raw.type_code, "unsupported field type, keeping raw bytes");
        directory.push_warning(DirectoryWarning::UnsupportedFieldType {
            tag: raw.tag,
            field_type: raw.type_code,
        });
        let value = TagValue::Raw { field_type: raw.type_code, bytes: raw.inline };
        return Ok(DirectoryEntry::new(raw.tag, field_type, raw.count, value));
    };

    let total = (element_size as u64).checked_mul(raw.count).ok_or_else(|| {
        Error::InvalidFormat(format!("tag {} value size overflows", raw.tag))
    })?;
    let count = raw.count as usize;

    let entry = if total <= raw.inline.len() as u64 {
        let mut inline = BinaryCursor::new(Cursor::new(raw.inline), cursor.byte_order())?;
        let value = load_value(&mut inline, field_type, count, options.ascii_terminator)?;
        DirectoryEntry::new(raw.tag, field_type, raw.count, value)
    } else {
        let mut field = BinaryCursor::new(Cursor::new(raw.inline), cursor.byte_order())?;
        let value_offset = read_offset(&mut field, options)?;
        cursor.ensure_range(value_offset, total)?;
        let value = cursor.at_offset(value_offset, |c| {
            load_value(c, field_type, count, options.ascii_terminator)
        })?;
        let mut entry = DirectoryEntry::new(raw.tag, field_type, raw.count, value);
        entry.value_offset = Some(value_offset);
        entry
    };

    Ok(entry)
}

fn collect<R, T>(
    cursor: &mut BinaryCursor<R>,
    count: usize,
    mut read: impl FnMut(&mut BinaryCursor<R>) -> Result<T>,
) -> Result<Vec<T>>
where
    R: SeekableReader,
{
    (0..count).map(|_| read(cursor)).collect()
}

/// Loads `count` elements of a known field type at the cursor position
pub fn load_value<R: SeekableReader>(
    cursor: &mut BinaryCursor<R>,
    field_type: FieldType,
    count: usize,
    terminator: Terminator,
) -> Result<TagValue> {
    let value = match field_type {
        FieldType::Byte => TagValue::Bytes(cursor.read_bytes(count)?),
        FieldType::Undefined => TagValue::Undefined(cursor.read_bytes(count)?),
        // Latin-1 maps every byte to one character, so `count` bytes decode
        // to exactly `count` characters.
        FieldType::Ascii => TagValue::Ascii(cursor.read_text(count, TextEncoding::Latin1, terminator)?),
        FieldType::SByte => TagValue::SBytes(collect(cursor, count, |c| c.read_i8())?),
        FieldType::Short => TagValue::Shorts(collect(cursor, count, |c| c.read_u16())?),
        FieldType::SShort => TagValue::SShorts(collect(cursor, count, |c| c.read_i16())?),
        FieldType::Long => TagValue::Longs(collect(cursor, count, |c| c.read_u32())?),
        FieldType::SLong => TagValue::SLongs(collect(cursor, count, |c| c.read_i32())?),
        FieldType::Rational => TagValue::Rationals(collect(cursor, count, |c| c.read_rational())?),
        FieldType::SRational => TagValue::SRationals(collect(cursor, count, |c| c.read_srational())?),
        FieldType::Float => TagValue::Floats(collect(cursor, count, |c| c.read_f32())?),
        FieldType::Double => TagValue::Doubles(collect(cursor, count, |c| c.read_f64())?),
        FieldType::Ifd => TagValue::Offsets(collect(cursor, count, |c| Ok(c.read_u32()? as u64))?),
        FieldType::Ifd8 => TagValue::Offsets(collect(cursor, count, |c| c.read_u64())?),
        FieldType::Long8 => TagValue::Long8s(collect(cursor, count, |c| c.read_u64())?),
        FieldType::SLong8 => TagValue::SLong8s(collect(cursor, count, |c| c.read_i64())?),
        FieldType::Unknown(code) => {
            return Err(Error::Unsupported(format!("field type {}", code)));
        }
    };
    Ok(value)
}


#[cfg(test)]
mod tests {
    use super::*;
    use super::test_support::DirectoryBuilder;
    use crate::formats::tiff::tags;
    use crate::io::ByteOrder;

    fn cursor(data: Vec<u8>, order: ByteOrder) -> BinaryCursor<Cursor<Vec<u8>>> {
        BinaryCursor::new(Cursor::new(data), order).unwrap()
    }

    #[test]
    fn test_ascii_preserves_terminator_by_default() {
        let data = DirectoryBuilder::new(ByteOrder::LittleEndian)
            .ascii(tags::SOFTWARE, b"ABCDE\0")
            .build(0);

        let dir = decode_directory(&mut cursor(data, ByteOrder::LittleEndian)).unwrap();
        let value = dir.value(tags::SOFTWARE).unwrap();
        assert_eq!(value.as_str(), Some("ABCDE\0"));
        assert_eq!(value.len(), 6);
        assert_eq!(dir.get(tags::SOFTWARE).unwrap().count, 6);
    }

    #[test]
    fn test_ascii_trimmed_when_requested() {
        let data = DirectoryBuilder::new(ByteOrder::LittleEndian)
            .ascii(tags::SOFTWARE, b"ABCDE\0")
            .build(0);
        let options = DecodeOptions {
            ascii_terminator: Terminator::TrimNul,
            ..DecodeOptions::default()
        };

        let dir = decode_directory_with(&mut cursor(data, ByteOrder::LittleEndian), 0, &options).unwrap();
        assert_eq!(dir.value(tags::SOFTWARE).unwrap().as_str(), Some("ABCDE"));
    }

    #[test]
    fn test_inline_and_offset_values() {
        let data = DirectoryBuilder::new(ByteOrder::BigEndian)
            .shorts(tags::BITS_PER_SAMPLE, &[8, 8])
            .longs(tags::IMAGE_WIDTH, &[4096])
            .doubles(tags::MODEL_PIXEL_SCALE, &[0.5, 0.25, 0.0])
            .build(0);

        let dir = decode_directory(&mut cursor(data, ByteOrder::BigEndian)).unwrap();
        assert_eq!(dir.value(tags::BITS_PER_SAMPLE), Some(&TagValue::Shorts(vec![8, 8])));
        assert_eq!(dir.get_u64(tags::IMAGE_WIDTH), Some(4096));
        assert!(dir.get(tags::IMAGE_WIDTH).unwrap().value_offset.is_none());

        let scale = dir.get(tags::MODEL_PIXEL_SCALE).unwrap();
        assert_eq!(scale.value, TagValue::Doubles(vec![0.5, 0.25, 0.0]));
        assert_eq!(scale.value_offset, Some(2 + 3 * 12 + 4));
    }

    #[test]
    fn test_unknown_type_does_not_block_later_entries() {
        let data = DirectoryBuilder::new(ByteOrder::LittleEndian)
            .longs(tags::IMAGE_WIDTH, &[10])
            .entry(50000, 99, 3, vec![1, 2, 3, 4])
            .longs(tags::IMAGE_LENGTH, &[20])
            .build(0);

        let dir = decode_directory(&mut cursor(data, ByteOrder::LittleEndian)).unwrap();
        assert_eq!(dir.len(), 3);
        assert_eq!(dir.get_u64(tags::IMAGE_LENGTH), Some(20));

        let raw = dir.get(50000).unwrap();
        assert_eq!(raw.field_type, FieldType::Unknown(99));
        assert_eq!(raw.value, TagValue::Raw { field_type: 99, bytes: vec![1, 2, 3, 4] });
        assert_eq!(
            dir.warnings(),
            &[DirectoryWarning::UnsupportedFieldType { tag: 50000, field_type: 99 }]
        );
    }

    #[test]
    fn test_duplicate_tag_last_write_wins() {
        let data = DirectoryBuilder::new(ByteOrder::LittleEndian)
            .longs(tags::IMAGE_WIDTH, &[1])
            .longs(tags::IMAGE_LENGTH, &[2])
            .longs(tags::IMAGE_WIDTH, &[3])
            .build(0);

        let dir = decode_directory(&mut cursor(data, ByteOrder::LittleEndian)).unwrap();
        assert_eq!(dir.len(), 2);
        assert_eq!(dir.get_u64(tags::IMAGE_WIDTH), Some(3));
        assert_eq!(dir.entries()[0].tag, tags::IMAGE_WIDTH);
        assert_eq!(dir.warnings(), &[DirectoryWarning::DuplicateTag { tag: tags::IMAGE_WIDTH }]);
    }

    #[test]
    fn test_entries_keep_on_disk_order() {
        let data = DirectoryBuilder::new(ByteOrder::LittleEndian)
            .longs(tags::IMAGE_LENGTH, &[2])
            .longs(tags::IMAGE_WIDTH, &[1])
            .build(0);

        let dir = decode_directory(&mut cursor(data, ByteOrder::LittleEndian)).unwrap();
        let order: Vec<u16> = dir.iter().map(|e| e.tag).collect();
        assert_eq!(order, vec![tags::IMAGE_LENGTH, tags::IMAGE_WIDTH]);
    }

    #[test]
    fn test_out_of_bounds_value_offset() {
        let mut data = DirectoryBuilder::new(ByteOrder::LittleEndian)
            .doubles(tags::MODEL_PIXEL_SCALE, &[1.0, 1.0, 0.0])
            .build(0);
        data.truncate(data.len() - 8);

        let err = decode_directory(&mut cursor(data, ByteOrder::LittleEndian)).unwrap_err();
        assert!(err.is_end_of_data());
    }

    #[test]
    fn test_truncated_entry_table() {
        let mut data = DirectoryBuilder::new(ByteOrder::LittleEndian)
            .longs(tags::IMAGE_WIDTH, &[1])
            .longs(tags::IMAGE_LENGTH, &[2])
            .build(0);
        data.truncate(2 + 12 + 5);

        let mut c = cursor(data, ByteOrder::LittleEndian);
        assert!(decode_directory(&mut c).unwrap_err().is_end_of_data());
    }

    #[test]
    fn test_big_tiff_layout() {
        let data = DirectoryBuilder::new(ByteOrder::LittleEndian)
            .big_tiff()
            .longs(tags::IMAGE_WIDTH, &[7, 8])
            .ascii(tags::SOFTWARE, b"skyforest\0")
            .next_offset(4096)
            .build(16);

        let mut padded = vec![0u8; 16];
        padded.extend(data);
        let mut c = cursor(padded, ByteOrder::LittleEndian);
        c.seek(16).unwrap();

        let dir = decode_directory_with(&mut c, 0, &DecodeOptions::big_tiff()).unwrap();
        assert_eq!(dir.value(tags::IMAGE_WIDTH), Some(&TagValue::Longs(vec![7, 8])));
        assert!(dir.get(tags::IMAGE_WIDTH).unwrap().value_offset.is_none());
        assert_eq!(dir.value(tags::SOFTWARE).unwrap().as_trimmed_str(), Some("skyforest"));
        assert_eq!(dir.next_offset, 4096);
        assert_eq!(dir.offset, 16);
        assert_eq!(c.position(), 16 + 8 + 2 * 20 + 8);
    }

    #[test]
    fn test_missing_next_pointer_at_end_of_source() {
        let mut data = DirectoryBuilder::new(ByteOrder::LittleEndian)
            .longs(tags::IMAGE_WIDTH, &[1])
            .build(0);
        data.truncate(2 + 12);

        let dir = decode_directory(&mut cursor(data, ByteOrder::LittleEndian)).unwrap();
        assert_eq!(dir.next_offset, 0);
        assert_eq!(dir.get_u64(tags::IMAGE_WIDTH), Some(1));
    }

    #[test]
    fn test_load_value_signed_types() {
        let mut data = Vec::new();
        data.extend_from_slice(&(-5i16).to_le_bytes());
        data.extend_from_slice(&(-1i32).to_le_bytes());
        data.extend_from_slice(&3i32.to_le_bytes());

        let mut c = cursor(data, ByteOrder::LittleEndian);
        let shorts = load_value(&mut c, FieldType::SShort, 1, Terminator::Preserve).unwrap();
        assert_eq!(shorts, TagValue::SShorts(vec![-5]));
        let srational = load_value(&mut c, FieldType::SRational, 1, Terminator::Preserve).unwrap();
        assert_eq!(srational.as_f64s(), Some(vec![-1.0 / 3.0]));
    }
}
