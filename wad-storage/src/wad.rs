//! The archive contract shared by both backends

use crate::entry::WadEntry;
use crate::error::{Result, WadError};
use crate::name;
use crate::reader::LumpReader;
use crate::types::WadKind;

/// Directory-level operations over a WAD archive.
///
/// Backends implement a small set of primitives — the entry sequence, raw
/// fetch, and the structural mutations — and everything else is derived from
/// them. Entry names are not unique; lookups are ordered first/last/nth
/// occurrence queries over the directory, and identity is positional.
///
/// Default operations preserve directory-order stability: an index `i`
/// referring to entry E before a mutation that only touches indices `>= i`
/// still refers to E afterwards. `replace_entry` keeps the entry at its
/// index in both backends; it does *not* promise a stable offset (the file
/// backend preserves the offset only for same-size data, the buffer backend
/// never does).
pub trait Wad {
    /// The kind of archive (IWAD or PWAD).
    fn kind(&self) -> WadKind;

    /// The directory, in logical order.
    fn entries(&self) -> &[WadEntry];

    /// Fetches the raw bytes described by `entry` from this archive's
    /// content region.
    ///
    /// Fails with [`WadError::TruncatedData`] if the entry's range exceeds
    /// the content extent. Entries are not tied to their source archive;
    /// passing an entry from another archive reads whatever lives at that
    /// range here.
    fn fetch(&mut self, entry: &WadEntry) -> Result<Vec<u8>>;

    /// Inserts `data` under `entryName` at directory position `index`,
    /// shifting later entries down one slot. The payload itself lands at the
    /// backend's current content end regardless of `index`.
    fn add_data_at(&mut self, index: usize, entry_name: &str, data: &[u8]) -> Result<WadEntry>;

    /// Deletes the entry at `index` and reclaims its bytes, returning the
    /// removed descriptor.
    fn delete_entry(&mut self, index: usize) -> Result<WadEntry>;

    /// Replaces the data of the entry at `index`, keeping its name and
    /// index. The offset may change; see the trait docs.
    fn replace_entry(&mut self, index: usize, data: &[u8]) -> Result<WadEntry>;

    /// Renames the entry at `index`.
    ///
    /// Fails with [`WadError::InvalidName`] before anything is touched if
    /// the new name does not fit the entry-name rules.
    fn rename_entry(&mut self, index: usize, new_name: &str) -> Result<()>;

    /// Replaces the whole directory with a different entry list.
    ///
    /// The content region is untouched; callers are responsible for handing
    /// in descriptors that still resolve.
    fn set_entries(&mut self, entries: Vec<WadEntry>) -> Result<()>;

    // ---- derived queries -------------------------------------------------

    /// Number of entries in the directory.
    fn len(&self) -> usize {
        self.entries().len()
    }

    /// Whether the directory is empty.
    fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    /// Whether this is a complete, standalone archive.
    fn is_iwad(&self) -> bool {
        self.kind() == WadKind::Iwad
    }

    /// Whether this is a supplemental archive.
    fn is_pwad(&self) -> bool {
        self.kind() == WadKind::Pwad
    }

    /// The entry at `index`, or [`WadError::IndexOutOfRange`].
    fn entry(&self, index: usize) -> Result<&WadEntry> {
        let len = self.len();
        self.entries()
            .get(index)
            .ok_or(WadError::IndexOutOfRange { index, len })
    }

    /// First index of an entry named `entry_name`.
    fn index_of(&self, entry_name: &str) -> Option<usize> {
        self.index_of_from(entry_name, 0)
    }

    /// First index of an entry named `entry_name`, at or after `start`.
    fn index_of_from(&self, entry_name: &str, start: usize) -> Option<usize> {
        self.entries()
            .iter()
            .enumerate()
            .skip(start)
            .find(|(_, e)| e.name() == entry_name)
            .map(|(i, _)| i)
    }

    /// Last index of an entry named `entry_name`.
    fn last_index_of(&self, entry_name: &str) -> Option<usize> {
        self.entries().iter().rposition(|e| e.name() == entry_name)
    }

    /// First entry named `entry_name`.
    fn entry_named(&self, entry_name: &str) -> Option<&WadEntry> {
        self.entry_named_from(entry_name, 0)
    }

    /// First entry named `entry_name`, at or after `start`.
    fn entry_named_from(&self, entry_name: &str, start: usize) -> Option<&WadEntry> {
        self.index_of_from(entry_name, start)
            .map(|i| &self.entries()[i])
    }

    /// The n-th (0-based) entry named `entry_name`.
    fn nth_entry_named(&self, entry_name: &str, n: usize) -> Option<&WadEntry> {
        self.entries()
            .iter()
            .filter(|e| e.name() == entry_name)
            .nth(n)
    }

    /// Last entry named `entry_name`.
    fn last_entry_named(&self, entry_name: &str) -> Option<&WadEntry> {
        self.entries().iter().rev().find(|e| e.name() == entry_name)
    }

    /// All entries named `entry_name`, in directory order.
    fn entries_named(&self, entry_name: &str) -> Vec<&WadEntry> {
        self.entries()
            .iter()
            .filter(|e| e.name() == entry_name)
            .collect()
    }

    /// Indices of all entries named `entry_name`, in directory order.
    fn indices_of(&self, entry_name: &str) -> Vec<usize> {
        self.entries()
            .iter()
            .enumerate()
            .filter(|(_, e)| e.name() == entry_name)
            .map(|(i, _)| i)
            .collect()
    }

    /// Whether any entry is named `entry_name`.
    fn contains(&self, entry_name: &str) -> bool {
        self.index_of(entry_name).is_some()
    }

    /// Whether any entry at or after `start` is named `entry_name`.
    fn contains_from(&self, entry_name: &str, start: usize) -> bool {
        self.index_of_from(entry_name, start).is_some()
    }

    // ---- derived reads ---------------------------------------------------

    /// Raw bytes of the entry at `index`.
    fn read_data(&mut self, index: usize) -> Result<Vec<u8>> {
        let entry = self.entry(index)?.clone();
        self.fetch(&entry)
    }

    /// Raw bytes of the first entry named `entry_name`, or `None` if there
    /// is no such entry.
    fn read_data_named(&mut self, entry_name: &str) -> Result<Option<Vec<u8>>> {
        self.read_data_named_from(entry_name, 0)
    }

    /// Raw bytes of the first entry named `entry_name` at or after `start`,
    /// or `None` if there is no such entry.
    fn read_data_named_from(&mut self, entry_name: &str, start: usize) -> Result<Option<Vec<u8>>> {
        match self.index_of_from(entry_name, start) {
            Some(i) => self.read_data(i).map(Some),
            None => Ok(None),
        }
    }

    /// A bounded, seekable view over the entry at `index`.
    ///
    /// The view snapshots the bytes at creation; structural mutation of the
    /// archive afterwards does not affect it.
    fn open_reader(&mut self, index: usize) -> Result<LumpReader> {
        self.read_data(index).map(LumpReader::new)
    }

    /// A bounded view over the first entry named `entry_name`, or `None`.
    fn open_reader_named(&mut self, entry_name: &str) -> Result<Option<LumpReader>> {
        match self.index_of(entry_name) {
            Some(i) => self.open_reader(i).map(Some),
            None => Ok(None),
        }
    }

    /// Reads the entry at `index` and decodes it with a caller-supplied
    /// function. The archive treats the payload as opaque bytes; this is the
    /// seam for external lump codecs.
    fn read_decoded<T, F>(&mut self, index: usize, decode: F) -> Result<T>
    where
        Self: Sized,
        F: FnOnce(&[u8]) -> Result<T>,
    {
        let data = self.read_data(index)?;
        decode(&data)
    }

    /// Reads the entry at `index` as a sequence of fixed-length records,
    /// decoding each with `decode`.
    ///
    /// Fails with [`WadError::TruncatedRecord`] if the payload is not a
    /// whole multiple of `record_len`.
    fn read_fixed_records<T, F>(
        &mut self,
        index: usize,
        record_len: usize,
        mut decode: F,
    ) -> Result<Vec<T>>
    where
        Self: Sized,
        F: FnMut(&[u8]) -> Result<T>,
    {
        if record_len == 0 {
            return Err(WadError::ValueOutOfRange {
                field: "record length",
                value: 0,
            });
        }
        let data = self.read_data(index)?;
        let trailing = data.len() % record_len;
        if trailing != 0 {
            return Err(WadError::TruncatedRecord {
                expected: record_len,
                actual: trailing,
            });
        }
        data.chunks_exact(record_len).map(|c| decode(c)).collect()
    }

    // ---- derived mutations -----------------------------------------------

    /// Appends `data` under `entry_name` at the logical end of the
    /// directory.
    fn add_data(&mut self, entry_name: &str, data: &[u8]) -> Result<WadEntry> {
        let at = self.len();
        self.add_data_at(at, entry_name, data)
    }

    /// Appends several entries from paired name/data slices.
    ///
    /// Fails with [`WadError::ArityMismatch`] if the slices differ in
    /// length; all names are validated before anything is written.
    fn add_all_data(&mut self, entry_names: &[&str], data: &[&[u8]]) -> Result<Vec<WadEntry>> {
        let at = self.len();
        self.add_all_data_at(at, entry_names, data)
    }

    /// Inserts several entries from paired name/data slices at `index`.
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
        if index > self.len() {
            return Err(WadError::IndexOutOfRange {
                index,
                len: self.len(),
            });
        }

        let mut out = Vec::with_capacity(entry_names.len());
        for (i, (entry_name, blob)) in entry_names.iter().zip(data).enumerate() {
            out.push(self.add_data_at(index + i, entry_name, blob)?);
        }
        Ok(out)
    }

    /// Appends a marker: a zero-length entry used as a positional sentinel.
    fn add_marker(&mut self, entry_name: &str) -> Result<WadEntry> {
        self.add_data(entry_name, &[])
    }

    /// Inserts a marker at `index`.
    fn add_marker_at(&mut self, index: usize, entry_name: &str) -> Result<WadEntry> {
        self.add_data_at(index, entry_name, &[])
    }

    /// Clones out up to `max_len` entries starting at `start`. Requests past
    /// the end of the directory return what exists.
    fn map_entries(&self, start: usize, max_len: usize) -> Vec<WadEntry> {
        let end = start.saturating_add(max_len).min(self.len());
        if start >= end {
            return Vec::new();
        }
        self.entries()[start..end].to_vec()
    }

    /// Replaces a contiguous run of descriptors starting at `start`. If the
    /// replacement runs past the end of the directory, the excess is
    /// appended.
    fn unmap_entries(&mut self, start: usize, replacement: &[WadEntry]) -> Result<()> {
        let mut list = self.entries().to_vec();
        for (i, entry) in replacement.iter().enumerate() {
            let at = start + i;
            if at < list.len() {
                list[at] = entry.clone();
            } else {
                list.push(entry.clone());
            }
        }
        self.set_entries(list)
    }
}
