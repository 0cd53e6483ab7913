//! Fully in-memory WAD backend

use byteorder::{ByteOrder, LittleEndian, WriteBytesExt};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::ops::Range;
use std::path::Path;
use tracing::debug;

use crate::entry::WadEntry;
use crate::error::{Result, WadError};
use crate::name;
use crate::types::{DIR_RECORD_LEN, HEADER_LEN, WadKind};
use crate::wad::Wad;

/// A WAD archive manipulated entirely in memory.
///
/// The directory and one growable content buffer hold the whole archive as
/// uninterpreted bytes; nothing touches a file until
/// [`write_to`](Self::write_to) serializes the lot in one shot. Suited to
/// bulk edits, where the file backend would rewrite its directory once per
/// mutation.
///
/// `replace_entry` here always moves the payload to the end of the content
/// buffer, so the entry's offset changes even when the new data has the old
/// length. Only [`crate::WadFile`] has an in-place path.
#[derive(Debug)]
pub struct WadBuffer {
    kind: WadKind,
    content: Vec<u8>,
    entries: Vec<WadEntry>,
}

impl WadBuffer {
    /// Creates an empty patch archive.
    pub fn new() -> Self {
        Self::with_kind(WadKind::Pwad)
    }

    /// Creates an empty archive of the given kind.
    pub fn with_kind(kind: WadKind) -> Self {
        Self {
            kind,
            content: Vec::new(),
            entries: Vec::new(),
        }
    }

    /// Reads an archive from a file on disk.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        Self::read_from(BufReader::new(file))
    }

    /// Reads an archive from a stream, materializing it fully.
    pub fn read_from<R: Read>(mut reader: R) -> Result<Self> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        Self::from_bytes(&data)
    }

    /// Parses an archive from a complete byte image.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() < HEADER_LEN {
            return Err(WadError::TruncatedRecord {
                expected: HEADER_LEN,
                actual: data.len(),
            });
        }

        let mut magic = [0u8; 4];
        magic.copy_from_slice(&data[0..4]);
        let kind = WadKind::from_magic(&magic).ok_or(WadError::InvalidMagic(magic))?;

        let count = LittleEndian::read_i32(&data[4..8]);
        if count < 0 {
            return Err(WadError::InvalidHeader {
                field: "entry count",
                value: i64::from(count),
            });
        }
        let dir_offset = LittleEndian::read_i32(&data[8..12]);
        if dir_offset < HEADER_LEN as i32 {
            return Err(WadError::InvalidHeader {
                field: "directory offset",
                value: i64::from(dir_offset),
            });
        }

        let content_end = dir_offset as usize;
        let dir_end = content_end + count as usize * DIR_RECORD_LEN;
        if dir_end > data.len() {
            return Err(WadError::TruncatedRecord {
                expected: dir_end,
                actual: data.len(),
            });
        }

        let content = data[HEADER_LEN..content_end].to_vec();
        let mut entries = Vec::with_capacity(count as usize);
        for record in data[content_end..dir_end].chunks_exact(DIR_RECORD_LEN) {
            entries.push(WadEntry::parse(record)?);
        }

        debug!(
            kind = %kind,
            entries = entries.len(),
            content_bytes = content.len(),
            "parsed WAD buffer"
        );

        Ok(Self {
            kind,
            content,
            entries,
        })
    }

    /// Sets the kind of archive this buffer serializes as.
    pub fn set_kind(&mut self, kind: WadKind) {
        self.kind = kind;
    }

    /// Total size of the content region in bytes.
    pub fn content_len(&self) -> usize {
        self.content.len()
    }

    /// Serializes the whole archive — header, content region, then the
    /// directory — to a stream. Does not close the stream.
    pub fn write_to<W: Write>(&self, mut writer: W) -> Result<()> {
        writer.write_all(self.kind.magic())?;
        writer.write_i32::<LittleEndian>(self.entries.len() as i32)?;
        writer.write_i32::<LittleEndian>((HEADER_LEN + self.content.len()) as i32)?;
        writer.write_all(&self.content)?;
        for entry in &self.entries {
            writer.write_all(&entry.to_bytes())?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Serializes the archive to a file, overwriting it.
    pub fn write_to_path(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = File::create(path)?;
        self.write_to(BufWriter::new(file))
    }

    /// Maps an entry's wire range into the content buffer, validating it
    /// against the current extent.
    fn content_range(&self, entry: &WadEntry) -> Result<Range<usize>> {
        let start = entry.offset() as usize;
        let end = start + entry.size() as usize;
        if start < HEADER_LEN || end > HEADER_LEN + self.content.len() {
            return Err(WadError::TruncatedData {
                offset: u64::from(entry.offset()),
                size: u64::from(entry.size()),
                extent: (HEADER_LEN + self.content.len()) as u64,
            });
        }
        Ok(start - HEADER_LEN..end - HEADER_LEN)
    }

    fn checked_size(data: &[u8]) -> Result<u32> {
        u32::try_from(data.len())
            .ok()
            .filter(|&n| n <= i32::MAX as u32)
            .ok_or(WadError::ValueOutOfRange {
                field: "entry size",
                value: data.len() as i64,
            })
    }
}

impl Default for WadBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl Wad for WadBuffer {
    fn kind(&self) -> WadKind {
        self.kind
    }

    fn entries(&self) -> &[WadEntry] {
        &self.entries
    }

    fn fetch(&mut self, entry: &WadEntry) -> Result<Vec<u8>> {
        if entry.size() == 0 {
            return Ok(Vec::new());
        }
        let range = self.content_range(entry)?;
        Ok(self.content[range].to_vec())
    }

    fn add_data_at(&mut self, index: usize, entry_name: &str, data: &[u8]) -> Result<WadEntry> {
        if index > self.entries.len() {
            return Err(WadError::IndexOutOfRange {
                index,
                len: self.entries.len(),
            });
        }
        let size = Self::checked_size(data)?;
        let offset =
            u32::try_from(HEADER_LEN + self.content.len()).map_err(|_| WadError::ValueOutOfRange {
                field: "entry offset",
                value: (HEADER_LEN + self.content.len()) as i64,
            })?;
        let entry = WadEntry::new(entry_name, offset, size)?;

        self.content.extend_from_slice(data);
        self.entries.insert(index, entry.clone());
        Ok(entry)
    }

    fn delete_entry(&mut self, index: usize) -> Result<WadEntry> {
        let entry = self.entry(index)?.clone();
        if entry.size() > 0 {
            let range = self.content_range(&entry)?;
            self.content.drain(range);
            for e in &mut self.entries {
                if e.offset() > entry.offset() {
                    e.shift_down(entry.size());
                }
            }
        }
        self.entries.remove(index);
        Ok(entry)
    }

    fn replace_entry(&mut self, index: usize, data: &[u8]) -> Result<WadEntry> {
        Self::checked_size(data)?;
        let entry_name = self.entry(index)?.name().to_owned();
        self.delete_entry(index)?;
        self.add_data_at(index, &entry_name, data)
    }

    fn rename_entry(&mut self, index: usize, new_name: &str) -> Result<()> {
        if !name::is_valid_entry_name(new_name) {
            return Err(WadError::InvalidName(new_name.to_owned()));
        }
        self.entry(index)?;
        self.entries[index].set_name(new_name.to_owned());
        Ok(())
    }

    fn set_entries(&mut self, entries: Vec<WadEntry>) -> Result<()> {
        self.entries = entries;
        Ok(())
    }
}

impl<'a> IntoIterator for &'a WadBuffer {
    type Item = &'a WadEntry;
    type IntoIter = std::slice::Iter<'a, WadEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
