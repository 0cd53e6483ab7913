//! The 16-byte directory record describing one lump

use byteorder::{ByteOrder, LittleEndian};
use std::fmt;

use crate::error::{Result, WadError};
use crate::name;
use crate::types::{DIR_RECORD_LEN, NAME_LEN};

/// A single entry in a WAD directory.
///
/// This is a descriptor only: the name of a lump plus the offset and size of
/// its bytes in the originating archive. It carries no data and is not tied
/// to the archive it came from; using an entry against a different archive
/// reads whatever happens to live at that range there.
///
/// Duplicate names across entries are legal (layered archives rely on them);
/// identity is positional.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WadEntry {
    name: String,
    offset: u32,
    size: u32,
}

impl WadEntry {
    /// Creates a validated entry.
    ///
    /// Fails with [`WadError::InvalidName`] if the name does not fit the
    /// entry-name rules, or [`WadError::ValueOutOfRange`] if `offset` or
    /// `size` cannot be represented as the wire's signed 32-bit field.
    pub fn new(name: impl Into<String>, offset: u32, size: u32) -> Result<Self> {
        let name = name.into();
        if !name::is_valid_entry_name(&name) {
            return Err(WadError::InvalidName(name));
        }
        if offset > i32::MAX as u32 {
            return Err(WadError::ValueOutOfRange {
                field: "entry offset",
                value: i64::from(offset),
            });
        }
        if size > i32::MAX as u32 {
            return Err(WadError::ValueOutOfRange {
                field: "entry size",
                value: i64::from(size),
            });
        }
        Ok(Self { name, offset, size })
    }

    /// Parses the first 16 bytes of `data` as a little-endian directory
    /// record: i32 offset, i32 size, 8-byte NUL-padded name.
    ///
    /// The name is normalized rather than rejected, so archives written by
    /// lenient tools still open; negative offset or size fails with
    /// [`WadError::ValueOutOfRange`].
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < DIR_RECORD_LEN {
            return Err(WadError::TruncatedRecord {
                expected: DIR_RECORD_LEN,
                actual: data.len(),
            });
        }

        let offset = LittleEndian::read_i32(&data[0..4]);
        if offset < 0 {
            return Err(WadError::ValueOutOfRange {
                field: "entry offset",
                value: i64::from(offset),
            });
        }
        let size = LittleEndian::read_i32(&data[4..8]);
        if size < 0 {
            return Err(WadError::ValueOutOfRange {
                field: "entry size",
                value: i64::from(size),
            });
        }

        let raw = String::from_utf8_lossy(&data[8..8 + NAME_LEN]);
        let entry_name = name::to_valid_entry_name(name::null_trim(&raw));

        Ok(Self {
            name: entry_name,
            offset: offset as u32,
            size: size as u32,
        })
    }

    /// Serializes this entry to its 16-byte wire form.
    pub fn to_bytes(&self) -> [u8; DIR_RECORD_LEN] {
        let mut out = [0u8; DIR_RECORD_LEN];
        LittleEndian::write_i32(&mut out[0..4], self.offset as i32);
        LittleEndian::write_i32(&mut out[4..8], self.size as i32);
        out[8..].copy_from_slice(&self.name_bytes());
        out
    }

    /// The entry's name as its 8-byte NUL-padded wire form.
    pub fn name_bytes(&self) -> [u8; NAME_LEN] {
        name::name_bytes(&self.name)
    }

    /// The name of the entry.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Byte offset of the entry's data in the originating archive.
    pub fn offset(&self) -> u32 {
        self.offset
    }

    /// Size of the entry's data in bytes.
    pub fn size(&self) -> u32 {
        self.size
    }

    /// Tests whether this is a marker entry: zero size, used as a positional
    /// sentinel rather than a data carrier.
    pub fn is_marker(&self) -> bool {
        self.size == 0
    }

    /// Name update for rename; callers validate first.
    pub(crate) fn set_name(&mut self, name: String) {
        self.name = name;
    }

    /// Offset adjustment used when content before this entry is removed.
    pub(crate) fn shift_down(&mut self, delta: u32) {
        self.offset -= delta;
    }
}

impl fmt::Display for WadEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:<8} offset: {}, size: {}",
            self.name, self.offset, self.size
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn construct_validates_name() {
        assert!(WadEntry::new("MAP01", 12, 0).is_ok());
        let err = WadEntry::new("lower", 12, 0).unwrap_err();
        assert!(matches!(err, WadError::InvalidName(_)));
        let err = WadEntry::new("NINECHARS", 12, 0).unwrap_err();
        assert!(matches!(err, WadError::InvalidName(_)));
    }

    #[test]
    fn construct_rejects_unencodable_fields() {
        let err = WadEntry::new("MAP01", u32::MAX, 0).unwrap_err();
        assert!(matches!(
            err,
            WadError::ValueOutOfRange {
                field: "entry offset",
                ..
            }
        ));
        let err = WadEntry::new("MAP01", 12, u32::MAX).unwrap_err();
        assert!(matches!(
            err,
            WadError::ValueOutOfRange {
                field: "entry size",
                ..
            }
        ));
    }

    #[test]
    fn parse_record() {
        let mut record = Vec::new();
        record.extend_from_slice(&100i32.to_le_bytes());
        record.extend_from_slice(&20i32.to_le_bytes());
        record.extend_from_slice(b"THINGS\0\0");

        let entry = WadEntry::parse(&record).unwrap();
        assert_eq!(entry.name(), "THINGS");
        assert_eq!(entry.offset(), 100);
        assert_eq!(entry.size(), 20);
        assert!(!entry.is_marker());
    }

    #[test]
    fn parse_normalizes_name() {
        let mut record = Vec::new();
        record.extend_from_slice(&12i32.to_le_bytes());
        record.extend_from_slice(&0i32.to_le_bytes());
        record.extend_from_slice(b"map.1\0\0\0");

        let entry = WadEntry::parse(&record).unwrap();
        assert_eq!(entry.name(), "MAP-1");
        assert!(entry.is_marker());
    }

    #[test]
    fn parse_truncated() {
        let err = WadEntry::parse(&[0u8; 15]).unwrap_err();
        assert!(matches!(
            err,
            WadError::TruncatedRecord {
                expected: 16,
                actual: 15,
            }
        ));
    }

    #[test]
    fn parse_negative_fields() {
        let mut record = Vec::new();
        record.extend_from_slice(&(-1i32).to_le_bytes());
        record.extend_from_slice(&0i32.to_le_bytes());
        record.extend_from_slice(b"MAP01\0\0\0");
        let err = WadEntry::parse(&record).unwrap_err();
        assert!(matches!(
            err,
            WadError::ValueOutOfRange {
                field: "entry offset",
                ..
            }
        ));

        let mut record = Vec::new();
        record.extend_from_slice(&12i32.to_le_bytes());
        record.extend_from_slice(&(-5i32).to_le_bytes());
        record.extend_from_slice(b"MAP01\0\0\0");
        let err = WadEntry::parse(&record).unwrap_err();
        assert!(matches!(
            err,
            WadError::ValueOutOfRange {
                field: "entry size",
                ..
            }
        ));
    }

    proptest! {
        #[test]
        fn serialize_parse_roundtrip(
            name in "[A-Z0-9\\[\\]\\-_\\\\]{1,8}",
            offset in 0u32..=i32::MAX as u32,
            size in 0u32..=i32::MAX as u32,
        ) {
            let entry = WadEntry::new(name, offset, size).unwrap();
            let parsed = WadEntry::parse(&entry.to_bytes()).unwrap();
            prop_assert_eq!(entry, parsed);
        }
    }
}
