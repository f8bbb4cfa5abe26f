//! Image File Directory (IFD) structures
//!
//! A [`TiffDirectory`] is the decoded form of one tagged directory: an
//! ordered list of [`DirectoryEntry`] values plus a tag index. Field types
//! and values are closed sum types; anything the decoder does not recognise
//! is kept as [`TagValue::Raw`].

use std::collections::HashMap;
use serde::Serialize;
use crate::io::{Rational, SRational};
use crate::types::{DataType, Dimensions};
use super::tags;

/// Declared field type of a directory entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum FieldType {
    Byte,
    Ascii,
    Short,
    Long,
    Rational,
    SByte,
    Undefined,
    SShort,
    SLong,
    SRational,
    Float,
    Double,
    Ifd,
    Long8,
    SLong8,
    Ifd8,
    /// A type code this decoder does not know
    Unknown(u16),
}

impl FieldType {
    /// Maps an on-disk type code
    pub fn from_code(code: u16) -> Self {
        match code {
            1 => FieldType::Byte,
            2 => FieldType::Ascii,
            3 => FieldType::Short,
            4 => FieldType::Long,
            5 => FieldType::Rational,
            6 => FieldType::SByte,
            7 => FieldType::Undefined,
            8 => FieldType::SShort,
            9 => FieldType::SLong,
            10 => FieldType::SRational,
            11 => FieldType::Float,
            12 => FieldType::Double,
            13 => FieldType::Ifd,
            16 => FieldType::Long8,
            17 => FieldType::SLong8,
            18 => FieldType::Ifd8,
            other => FieldType::Unknown(other),
        }
    }

    /// On-disk type code
    pub fn code(&self) -> u16 {
        match self {
            FieldType::Byte => 1,
            FieldType::Ascii => 2,
            FieldType::Short => 3,
            FieldType::Long => 4,
            FieldType::Rational => 5,
            FieldType::SByte => 6,
            FieldType::Undefined => 7,
            FieldType::SShort => 8,
            FieldType::SLong => 9,
            FieldType::SRational => 10,
            FieldType::Float => 11,
            FieldType::Double => 12,
            FieldType::Ifd => 13,
            FieldType::Long8 => 16,
            FieldType::SLong8 => 17,
            FieldType::Ifd8 => 18,
            FieldType::Unknown(code) => *code,
        }
    }

    /// Size in bytes of one element; `None` for unknown types
    pub fn element_size(&self) -> Option<usize> {
        match self {
            FieldType::Byte | FieldType::Ascii | FieldType::SByte | FieldType::Undefined => Some(1),
            FieldType::Short | FieldType::SShort => Some(2),
            FieldType::Long | FieldType::SLong | FieldType::Float | FieldType::Ifd => Some(4),
            FieldType::Rational
            | FieldType::SRational
            | FieldType::Double
            | FieldType::Long8
            | FieldType::SLong8
            | FieldType::Ifd8 => Some(8),
            FieldType::Unknown(_) => None,
        }
    }

    /// Upper-case TIFF name of the type
    pub fn name(&self) -> &'static str {
        match self {
            FieldType::Byte => "BYTE",
            FieldType::Ascii => "ASCII",
            FieldType::Short => "SHORT",
            FieldType::Long => "LONG",
            FieldType::Rational => "RATIONAL",
            FieldType::SByte => "SBYTE",
            FieldType::Undefined => "UNDEFINED",
            FieldType::SShort => "SSHORT",
            FieldType::SLong => "SLONG",
            FieldType::SRational => "SRATIONAL",
            FieldType::Float => "FLOAT",
            FieldType::Double => "DOUBLE",
            FieldType::Ifd => "IFD",
            FieldType::Long8 => "LONG8",
            FieldType::SLong8 => "SLONG8",
            FieldType::Ifd8 => "IFD8",
            FieldType::Unknown(_) => "UNKNOWN",
        }
    }
}

/// Decoded value of a directory entry
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "values", rename_all = "snake_case")]
pub enum TagValue {
    Bytes(Vec<u8>),
    /// Exactly `count` bytes of text, terminator handling per decode options
    Ascii(String),
    Shorts(Vec<u16>),
    Longs(Vec<u32>),
    Rationals(Vec<Rational>),
    SBytes(Vec<i8>),
    Undefined(Vec<u8>),
    SShorts(Vec<i16>),
    SLongs(Vec<i32>),
    SRationals(Vec<SRational>),
    Floats(Vec<f32>),
    Doubles(Vec<f64>),
    /// IFD and IFD8 sub-directory offsets
    Offsets(Vec<u64>),
    Long8s(Vec<u64>),
    SLong8s(Vec<i64>),
    /// Undecoded inline field bytes of an unknown type
    Raw { field_type: u16, bytes: Vec<u8> },
}

impl TagValue {
    /// Number of decoded elements (characters for ASCII, bytes for raw)
    pub fn len(&self) -> usize {
        match self {
            TagValue::Bytes(v) | TagValue::Undefined(v) => v.len(),
            TagValue::Ascii(s) => s.chars().count(),
            TagValue::Shorts(v) => v.len(),
            TagValue::Longs(v) => v.len(),
            TagValue::Rationals(v) => v.len(),
            TagValue::SBytes(v) => v.len(),
            TagValue::SShorts(v) => v.len(),
            TagValue::SLongs(v) => v.len(),
            TagValue::SRationals(v) => v.len(),
            TagValue::Floats(v) => v.len(),
            TagValue::Doubles(v) => v.len(),
            TagValue::Offsets(v) | TagValue::Long8s(v) => v.len(),
            TagValue::SLong8s(v) => v.len(),
            TagValue::Raw { bytes, .. } => bytes.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether this value came from an unrecognised field type
    pub fn is_raw(&self) -> bool {
        matches!(self, TagValue::Raw { .. })
    }

    /// Text of an ASCII value exactly as decoded
    pub fn as_str(&self) -> Option<&str> {
        match self {
            TagValue::Ascii(s) => Some(s),
            _ => None,
        }
    }

    /// Text of an ASCII value without trailing NULs
    pub fn as_trimmed_str(&self) -> Option<&str> {
        self.as_str().map(|s| s.trim_end_matches('\0'))
    }

    /// SHORT values
    pub fn as_shorts(&self) -> Option<&[u16]> {
        match self {
            TagValue::Shorts(v) => Some(v),
            _ => None,
        }
    }

    /// Any unsigned integer value widened to `u64`
    pub fn as_u64s(&self) -> Option<Vec<u64>> {
        match self {
            TagValue::Bytes(v) => Some(v.iter().map(|&x| x as u64).collect()),
            TagValue::Shorts(v) => Some(v.iter().map(|&x| x as u64).collect()),
            TagValue::Longs(v) => Some(v.iter().map(|&x| x as u64).collect()),
            TagValue::Offsets(v) | TagValue::Long8s(v) => Some(v.clone()),
            _ => None,
        }
    }

    /// First element of an unsigned integer value
    pub fn first_u64(&self) -> Option<u64> {
        match self {
            TagValue::Bytes(v) => v.first().map(|&x| x as u64),
            TagValue::Shorts(v) => v.first().map(|&x| x as u64),
            TagValue::Longs(v) => v.first().map(|&x| x as u64),
            TagValue::Offsets(v) | TagValue::Long8s(v) => v.first().copied(),
            _ => None,
        }
    }

    /// Any numeric value widened to `f64` (rationals with a zero denominator become NaN)
    pub fn as_f64s(&self) -> Option<Vec<f64>> {
        match self {
            TagValue::Doubles(v) => Some(v.clone()),
            TagValue::Floats(v) => Some(v.iter().map(|&x| x as f64).collect()),
            TagValue::Rationals(v) => Some(v.iter().map(|r| r.to_f64().unwrap_or(f64::NAN)).collect()),
            TagValue::SRationals(v) => Some(v.iter().map(|r| r.to_f64().unwrap_or(f64::NAN)).collect()),
            TagValue::SShorts(v) => Some(v.iter().map(|&x| x as f64).collect()),
            TagValue::SLongs(v) => Some(v.iter().map(|&x| x as f64).collect()),
            other => other.as_u64s().map(|v| v.into_iter().map(|x| x as f64).collect()),
        }
    }
}

/// One decoded directory entry
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DirectoryEntry {
    /// TIFF tag identifier
    pub tag: u16,
    /// Declared field type
    pub field_type: FieldType,
    /// Declared number of values
    pub count: u64,
    /// Absolute offset of the value, `None` when stored inline
    pub value_offset: Option<u64>,
    /// Decoded value
    pub value: TagValue,
}

impl DirectoryEntry {
    pub fn new(tag: u16, field_type: FieldType, count: u64, value: TagValue) -> Self {
        Self {
            tag,
            field_type,
            count,
            value_offset: None,
            value,
        }
    }

    /// Registered name of the tag
    pub fn name(&self) -> &'static str {
        tags::tag_name(self.tag)
    }
}

/// Anomalies absorbed while decoding a directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "warning", rename_all = "snake_case")]
pub enum DirectoryWarning {
    /// Entry kept as raw bytes because its type code is unknown
    UnsupportedFieldType { tag: u16, field_type: u16 },
    /// A later entry replaced an earlier one with the same tag
    DuplicateTag { tag: u16 },
}

/// Represents a decoded Image File Directory
#[derive(Debug, Clone, Serialize)]
pub struct TiffDirectory {
    /// Directory number within its file (0-based)
    pub number: usize,
    /// Offset of the directory in its source
    pub offset: u64,
    /// Offset of the next directory, 0 when this is the last
    pub next_offset: u64,
    entries: Vec<DirectoryEntry>,
    warnings: Vec<DirectoryWarning>,
    #[serde(skip)]
    tag_map: HashMap<u16, usize>,
}

impl TiffDirectory {
    /// Creates an empty directory
    pub fn new(number: usize, offset: u64) -> Self {
        Self {
            number,
            offset,
            next_offset: 0,
            entries: Vec::new(),
            warnings: Vec::new(),
            tag_map: HashMap::new(),
        }
    }

    /// Inserts an entry, replacing any earlier entry with the same tag
    ///
    /// The replaced entry keeps its position in iteration order. Returns the
    /// previous entry when one was replaced.
    pub fn insert(&mut self, entry: DirectoryEntry) -> Option<DirectoryEntry> {
        if let Some(&index) = self.tag_map.get(&entry.tag) {
            self.warnings.push(DirectoryWarning::DuplicateTag { tag: entry.tag });
            return Some(std::mem::replace(&mut self.entries[index], entry));
        }

        self.tag_map.insert(entry.tag, self.entries.len());
        self.entries.push(entry);
        None
    }

    /// Records an absorbed anomaly
    pub fn push_warning(&mut self, warning: DirectoryWarning) {
        self.warnings.push(warning);
    }

    /// Gets an entry by tag
    pub fn get(&self, tag: u16) -> Option<&DirectoryEntry> {
        self.tag_map.get(&tag).and_then(|&idx| self.entries.get(idx))
    }

    /// Gets a decoded value by tag
    pub fn value(&self, tag: u16) -> Option<&TagValue> {
        self.get(tag).map(|e| &e.value)
    }

    /// First unsigned value of a tag
    pub fn get_u64(&self, tag: u16) -> Option<u64> {
        self.value(tag).and_then(TagValue::first_u64)
    }

    pub fn contains(&self, tag: u16) -> bool {
        self.tag_map.contains_key(&tag)
    }

    /// Entries in insertion order
    pub fn entries(&self) -> &[DirectoryEntry] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &DirectoryEntry> {
        self.entries.iter()
    }

    /// Warnings in the order they were raised
    pub fn warnings(&self) -> &[DirectoryWarning] {
        &self.warnings
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns image dimensions if available
    pub fn dimensions(&self) -> Option<Dimensions> {
        let width = self.get_u64(tags::IMAGE_WIDTH)?;
        let height = self.get_u64(tags::IMAGE_LENGTH)?;
        Some(Dimensions::new(width, height))
    }

    /// Returns compression type
    pub fn compression(&self) -> Option<u64> {
        self.get_u64(tags::COMPRESSION)
    }

    /// Returns samples per pixel
    pub fn samples_per_pixel(&self) -> u64 {
        self.get_u64(tags::SAMPLES_PER_PIXEL).unwrap_or(1)
    }

    /// Returns bits per sample of the first channel
    pub fn bits_per_sample(&self) -> Option<u64> {
        self.get_u64(tags::BITS_PER_SAMPLE)
    }

    /// Returns sample format (1=unsigned, 2=signed, 3=float)
    pub fn sample_format(&self) -> u64 {
        self.get_u64(tags::SAMPLE_FORMAT).unwrap_or(1)
    }

    /// Sample type described by BitsPerSample and SampleFormat
    pub fn data_type(&self) -> Option<DataType> {
        DataType::from_tiff(self.sample_format(), self.bits_per_sample()?)
    }

    /// Returns whether this directory describes a tiled image
    pub fn is_tiled(&self) -> bool {
        self.contains(tags::TILE_WIDTH)
    }

    /// Returns tile dimensions if tiled
    pub fn tile_dimensions(&self) -> Option<Dimensions> {
        let width = self.get_u64(tags::TILE_WIDTH)?;
        let height = self.get_u64(tags::TILE_LENGTH)?;
        Some(Dimensions::new(width, height))
    }

    /// Returns all GeoTIFF related entries
    pub fn geotiff_tags(&self) -> Vec<&DirectoryEntry> {
        self.entries
            .iter()
            .filter(|e| tags::GEOREFERENCING_TAGS.contains(&e.tag))
            .collect()
    }

    /// Checks if this directory has GeoTIFF tags
    pub fn is_geotiff(&self) -> bool {
        self.entries.iter().any(|e| tags::GEOREFERENCING_TAGS.contains(&e.tag))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn long(tag: u16, value: u32) -> DirectoryEntry {
        DirectoryEntry::new(tag, FieldType::Long, 1, TagValue::Longs(vec![value]))
    }

    #[test]
    fn test_field_type_codes_round_trip() {
        for code in [1u16, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 16, 17, 18] {
            let ft = FieldType::from_code(code);
            assert!(!matches!(ft, FieldType::Unknown(_)), "code {code}");
            assert_eq!(ft.code(), code);
        }
        assert_eq!(FieldType::from_code(14), FieldType::Unknown(14));
        assert_eq!(FieldType::Unknown(99).code(), 99);
    }

    #[test]
    fn test_element_sizes() {
        assert_eq!(FieldType::Ascii.element_size(), Some(1));
        assert_eq!(FieldType::Short.element_size(), Some(2));
        assert_eq!(FieldType::Float.element_size(), Some(4));
        assert_eq!(FieldType::Rational.element_size(), Some(8));
        assert_eq!(FieldType::Ifd8.element_size(), Some(8));
        assert_eq!(FieldType::Unknown(42).element_size(), None);
    }

    #[test]
    fn test_insert_and_get() {
        let mut dir = TiffDirectory::new(0, 8);
        dir.insert(long(tags::IMAGE_WIDTH, 1024));
        dir.insert(long(tags::IMAGE_LENGTH, 768));

        assert_eq!(dir.len(), 2);
        assert_eq!(dir.get_u64(tags::IMAGE_WIDTH), Some(1024));
        let dims = dir.dimensions().unwrap();
        assert_eq!((dims.width, dims.height), (1024, 768));
        assert!(dir.warnings().is_empty());
    }

    #[test]
    fn test_duplicate_tag_last_write_wins_in_place() {
        let mut dir = TiffDirectory::new(0, 8);
        dir.insert(long(tags::IMAGE_WIDTH, 1));
        dir.insert(long(tags::IMAGE_LENGTH, 2));
        let previous = dir.insert(long(tags::IMAGE_WIDTH, 3));

        assert_eq!(previous.unwrap().value, TagValue::Longs(vec![1]));
        assert_eq!(dir.len(), 2);
        assert_eq!(dir.get_u64(tags::IMAGE_WIDTH), Some(3));
        assert_eq!(dir.entries()[0].tag, tags::IMAGE_WIDTH);
        assert_eq!(dir.warnings(), &[DirectoryWarning::DuplicateTag { tag: tags::IMAGE_WIDTH }]);
    }

    #[test]
    fn test_tag_value_accessors() {
        let ascii = TagValue::Ascii("ABCDE\0".to_string());
        assert_eq!(ascii.len(), 6);
        assert_eq!(ascii.as_str(), Some("ABCDE\0"));
        assert_eq!(ascii.as_trimmed_str(), Some("ABCDE"));

        let shorts = TagValue::Shorts(vec![3, 4]);
        assert_eq!(shorts.as_shorts(), Some(&[3u16, 4][..]));
        assert_eq!(shorts.as_u64s(), Some(vec![3, 4]));
        assert_eq!(shorts.first_u64(), Some(3));
        assert_eq!(shorts.as_f64s(), Some(vec![3.0, 4.0]));

        let rationals = TagValue::Rationals(vec![Rational { numerator: 1, denominator: 4 }]);
        assert_eq!(rationals.as_f64s(), Some(vec![0.25]));

        let raw = TagValue::Raw { field_type: 99, bytes: vec![1, 2, 3, 4] };
        assert!(raw.is_raw());
        assert_eq!(raw.first_u64(), None);
        assert_eq!(raw.as_f64s(), None);
    }

    #[test]
    fn test_sample_description() {
        let mut dir = TiffDirectory::new(0, 8);
        assert_eq!(dir.samples_per_pixel(), 1);
        dir.insert(DirectoryEntry::new(tags::BITS_PER_SAMPLE, FieldType::Short, 1, TagValue::Shorts(vec![32])));
        dir.insert(DirectoryEntry::new(tags::SAMPLE_FORMAT, FieldType::Short, 1, TagValue::Shorts(vec![3])));
        assert_eq!(dir.data_type(), Some(DataType::F32));
    }

    #[test]
    fn test_geotiff_detection() {
        let mut dir = TiffDirectory::new(0, 8);
        assert!(!dir.is_geotiff());
        assert!(!dir.is_tiled());

        dir.insert(DirectoryEntry::new(
            tags::MODEL_PIXEL_SCALE,
            FieldType::Double,
            3,
            TagValue::Doubles(vec![1.0, 1.0, 0.0]),
        ));
        dir.insert(long(tags::TILE_WIDTH, 256));
        assert!(dir.is_geotiff());
        assert!(dir.is_tiled());
        assert_eq!(dir.geotiff_tags().len(), 1);
    }
}
