//! Random-access on-disk WAD backend

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

use crate::entry::WadEntry;
use crate::error::{Result, WadError};
use crate::name;
use crate::types::{DIR_RECORD_LEN, HEADER_LEN, NAME_LEN, WadKind};
use crate::wad::Wad;

/// Shift buffer for streaming compaction on delete.
const COPY_BUF_LEN: usize = 64 * 1024;

/// A WAD archive backed by one open random-access file.
///
/// The directory is mirrored in memory and kept synchronized with the
/// on-disk layout after every structural change; content writes go straight
/// to the file. Good for reading and small additions — every mutation except
/// rename rewrites the header and the full directory, so bulk edits are
/// better staged in a [`crate::WadBuffer`].
///
/// Multi-step mutations (delete's shift, truncate and rewrite) are not
/// transactional: an I/O failure partway through surfaces as
/// [`WadError::Io`] and may leave the on-disk directory disagreeing with the
/// content layout. Treat the instance as desynchronized after such a
/// failure — drop it and reopen rather than continuing to mutate.
///
/// The file handle lives for the lifetime of the value; call
/// [`close`](Self::close) to sync and release it deterministically (dropping
/// releases the descriptor without reporting errors).
#[derive(Debug)]
pub struct WadFile {
    file: File,
    path: PathBuf,
    kind: WadKind,
    entries: Vec<WadEntry>,
    /// Where live content ends and the directory begins.
    dir_offset: u32,
}

impl WadFile {
    /// Opens an existing WAD file read-write.
    ///
    /// Directory records with an empty name and zero size are stale
    /// placeholders left by lenient writers and are dropped.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mut file = OpenOptions::new().read(true).write(true).open(&path)?;

        let mut magic = [0u8; 4];
        file.read_exact(&mut magic)?;
        let kind = WadKind::from_magic(&magic).ok_or(WadError::InvalidMagic(magic))?;

        let count = file.read_i32::<LittleEndian>()?;
        if count < 0 {
            return Err(WadError::InvalidHeader {
                field: "entry count",
                value: i64::from(count),
            });
        }
        let dir_offset = file.read_i32::<LittleEndian>()?;
        if dir_offset < HEADER_LEN as i32 {
            return Err(WadError::InvalidHeader {
                field: "directory offset",
                value: i64::from(dir_offset),
            });
        }

        let file_len = file.metadata()?.len();
        let dir_end = dir_offset as u64 + count as u64 * DIR_RECORD_LEN as u64;
        if dir_end > file_len {
            return Err(WadError::TruncatedRecord {
                expected: dir_end as usize,
                actual: file_len as usize,
            });
        }

        debug!(path = %path.display(), kind = %kind, count, dir_offset, "opening WAD file");

        file.seek(SeekFrom::Start(dir_offset as u64))?;
        let mut entries = Vec::with_capacity(count as usize);
        let mut record = [0u8; DIR_RECORD_LEN];
        for _ in 0..count {
            file.read_exact(&mut record)?;
            let entry = WadEntry::parse(&record)?;
            if entry.name().is_empty() && entry.size() == 0 {
                debug!("dropping stale placeholder directory record");
                continue;
            }
            trace!(%entry, "read directory record");
            entries.push(entry);
        }

        Ok(Self {
            file,
            path,
            kind,
            entries,
            dir_offset: dir_offset as u32,
        })
    }

    /// Creates a new, empty patch WAD on disk and opens it.
    ///
    /// An existing file at `path` is overwritten.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        {
            let mut file = File::create(&path)?;
            file.write_all(WadKind::Pwad.magic())?;
            file.write_i32::<LittleEndian>(0)?;
            file.write_i32::<LittleEndian>(HEADER_LEN as i32)?;
        }
        Self::open(path)
    }

    /// Path this archive was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File name component of the archive's path.
    pub fn file_name(&self) -> Option<&str> {
        self.path.file_name().and_then(|n| n.to_str())
    }

    /// Offset at which the directory currently starts; live content occupies
    /// the bytes between the header and this point.
    pub fn directory_offset(&self) -> u32 {
        self.dir_offset
    }

    /// Syncs the file and releases the descriptor.
    pub fn close(self) -> Result<()> {
        self.file.sync_all()?;
        Ok(())
    }

    fn write_header(&mut self) -> Result<()> {
        self.file.seek(SeekFrom::Start(4))?;
        self.file.write_i32::<LittleEndian>(self.entries.len() as i32)?;
        self.file.write_i32::<LittleEndian>(self.dir_offset as i32)?;
        Ok(())
    }

    fn write_directory(&mut self) -> Result<()> {
        self.file.seek(SeekFrom::Start(u64::from(self.dir_offset)))?;
        for entry in &self.entries {
            self.file.write_all(&entry.to_bytes())?;
        }
        let end = self.file.stream_position()?;
        if end < self.file.metadata()?.len() {
            self.file.set_len(end)?;
        }
        Ok(())
    }

    /// Rewrites the header and the full directory.
    ///
    /// Every structural mutation except rename calls this implicitly; after
    /// a run of [`append_no_flush`](Self::append_no_flush) calls it must be
    /// invoked explicitly before the archive on disk is coherent.
    pub fn flush_entries(&mut self) -> Result<()> {
        self.write_header()?;
        self.write_directory()
    }

    /// Appends data at the current content end and registers the entry in
    /// memory, deferring the header/directory rewrite.
    ///
    /// The on-disk archive is incoherent (its directory still sits under the
    /// newly written bytes) until [`flush_entries`](Self::flush_entries)
    /// runs.
    pub fn append_no_flush(&mut self, entry_name: &str, data: &[u8]) -> Result<WadEntry> {
        let at = self.entries.len();
        self.append_at_no_flush(at, entry_name, data)
    }

    fn append_at_no_flush(&mut self, index: usize, entry_name: &str, data: &[u8]) -> Result<WadEntry> {
        if index > self.entries.len() {
            return Err(WadError::IndexOutOfRange {
                index,
                len: self.entries.len(),
            });
        }
        let size = u32::try_from(data.len())
            .ok()
            .filter(|&n| n <= i32::MAX as u32)
            .ok_or(WadError::ValueOutOfRange {
                field: "entry size",
                value: data.len() as i64,
            })?;
        let new_end = u64::from(self.dir_offset) + u64::from(size);
        if new_end > i32::MAX as u64 {
            return Err(WadError::ValueOutOfRange {
                field: "content extent",
                value: new_end as i64,
            });
        }
        let entry = WadEntry::new(entry_name, self.dir_offset, size)?;

        self.file.seek(SeekFrom::Start(u64::from(self.dir_offset)))?;
        self.file.write_all(data)?;
        self.dir_offset += size;
        self.entries.insert(index, entry.clone());

        trace!(name = entry_name, size, offset = entry.offset(), "appended lump data");
        Ok(entry)
    }

    /// Validates an entry's range against the live content region.
    fn check_extent(&self, entry: &WadEntry) -> Result<()> {
        let offset = u64::from(entry.offset());
        let size = u64::from(entry.size());
        if offset < HEADER_LEN as u64 || offset + size > u64::from(self.dir_offset) {
            return Err(WadError::TruncatedData {
                offset,
                size,
                extent: u64::from(self.dir_offset),
            });
        }
        Ok(())
    }
}

impl Wad for WadFile {
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
        self.check_extent(entry)?;
        self.file.seek(SeekFrom::Start(u64::from(entry.offset())))?;
        let mut out = vec![0u8; entry.size() as usize];
        self.file.read_exact(&mut out)?;
        Ok(out)
    }

    fn add_data_at(&mut self, index: usize, entry_name: &str, data: &[u8]) -> Result<WadEntry> {
        let entry = self.append_at_no_flush(index, entry_name, data)?;
        self.flush_entries()?;
        Ok(entry)
    }

    /// Batched bulk insert: all content is written first, then the header
    /// and directory are rewritten once.
    fn add_all_data_at(
        &mut self,
        index: usize,
        entry_names: &[&str],
        data: &[&[u8]],
    ) -> Result<Vec<WadEntry>> {
        if entry_names.len() != data.len() {
            return Err(WadError::ArityMismatch {
                names: entry_names.len(),
                blobs: data.len(),
            });
        }
        for entry_name in entry_names {
            if !name::is_valid_entry_name(entry_name) {
                return Err(WadError::InvalidName((*entry_name).to_owned()));
            }
        }
        if index > self.entries.len() {
            return Err(WadError::IndexOutOfRange {
                index,
                len: self.entries.len(),
            });
        }

        let mut out = Vec::with_capacity(entry_names.len());
        for (i, (entry_name, blob)) in entry_names.iter().zip(data).enumerate() {
            out.push(self.append_at_no_flush(index + i, entry_name, blob)?);
        }
        self.flush_entries()?;
        Ok(out)
    }

    fn delete_entry(&mut self, index: usize) -> Result<WadEntry> {
        let entry = self.entry(index)?.clone();
        if entry.size() > 0 {
            self.check_extent(&entry)?;
        }
        self.entries.remove(index);

        if entry.size() > 0 {
            // Shift everything after the deleted range down, forward in
            // bounded chunks so overlapping source and destination stay safe.
            let mut write_pos = u64::from(entry.offset());
            let mut read_pos = write_pos + u64::from(entry.size());
            let content_end = u64::from(self.dir_offset);
            let mut buf = vec![0u8; COPY_BUF_LEN];

            while read_pos < content_end {
                let amount = usize::try_from(content_end - read_pos)
                    .unwrap_or(COPY_BUF_LEN)
                    .min(COPY_BUF_LEN);
                self.file.seek(SeekFrom::Start(read_pos))?;
                self.file.read_exact(&mut buf[..amount])?;
                self.file.seek(SeekFrom::Start(write_pos))?;
                self.file.write_all(&buf[..amount])?;
                read_pos += amount as u64;
                write_pos += amount as u64;
            }

            self.dir_offset -= entry.size();
            for e in &mut self.entries {
                if e.offset() > entry.offset() {
                    e.shift_down(entry.size());
                }
            }
        }

        debug!(name = entry.name(), size = entry.size(), "deleted entry");
        self.flush_entries()?;
        Ok(entry)
    }

    fn replace_entry(&mut self, index: usize, data: &[u8]) -> Result<WadEntry> {
        let entry = self.entry(index)?.clone();

        if data.len() == entry.size() as usize {
            // Same length: overwrite in place, no offset or directory change.
            if !data.is_empty() {
                self.check_extent(&entry)?;
                self.file.seek(SeekFrom::Start(u64::from(entry.offset())))?;
                self.file.write_all(data)?;
            }
            return Ok(entry);
        }

        // Length change: delete, then re-insert at the same index. The index
        // is stable; the offset is not.
        if data.len() > i32::MAX as usize {
            return Err(WadError::ValueOutOfRange {
                field: "entry size",
                value: data.len() as i64,
            });
        }
        self.delete_entry(index)?;
        self.add_data_at(index, entry.name(), data)
    }

    fn rename_entry(&mut self, index: usize, new_name: &str) -> Result<()> {
        if !name::is_valid_entry_name(new_name) {
            return Err(WadError::InvalidName(new_name.to_owned()));
        }
        self.entry(index)?;
        self.entries[index].set_name(new_name.to_owned());

        // Patch only the name bytes of the on-disk record; the rest of the
        // directory is unchanged.
        let record_pos =
            u64::from(self.dir_offset) + (index * DIR_RECORD_LEN) as u64 + (DIR_RECORD_LEN - NAME_LEN) as u64;
        self.file.seek(SeekFrom::Start(record_pos))?;
        self.file.write_all(&self.entries[index].name_bytes())?;
        Ok(())
    }

    fn set_entries(&mut self, entries: Vec<WadEntry>) -> Result<()> {
        self.entries = entries;
        self.flush_entries()
    }
}

impl<'a> IntoIterator for &'a WadFile {
    type Item = &'a WadEntry;
    type IntoIter = std::slice::Iter<'a, WadEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
