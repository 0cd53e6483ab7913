//! Bounded, seekable read view over one lump's bytes

use bytes::Bytes;
use std::io::{self, Read, Seek, SeekFrom};

/// A cursor over a snapshot of a single entry's byte range.
///
/// The bytes are copied out of the owning archive when the view is created,
/// so structural mutation of the archive afterwards cannot move data under
/// an open view — the view simply keeps reading its snapshot.
///
/// Besides [`Read`] and [`Seek`], the view carries a single markable
/// position with an expiring read limit: [`mark`](Self::mark) remembers the
/// current position, and [`reset`](Self::reset) rewinds to it unless more
/// than `read_limit` bytes have been read since, which invalidates the mark.
pub struct LumpReader {
    data: Bytes,
    pos: usize,
    mark: Option<Mark>,
}

#[derive(Clone, Copy)]
struct Mark {
    pos: usize,
    read_limit: usize,
}

impl LumpReader {
    /// Creates a view over an owned byte snapshot.
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self {
            data: data.into(),
            pos: 0,
            mark: None,
        }
    }

    /// Total length of the underlying snapshot.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the snapshot is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Current read position.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Number of bytes left to read from the current position.
    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    /// Remembers the current position.
    ///
    /// The mark stays valid until more than `read_limit` bytes have been
    /// read past it; a later `mark` replaces any earlier one.
    pub fn mark(&mut self, read_limit: usize) {
        self.mark = Some(Mark {
            pos: self.pos,
            read_limit,
        });
    }

    /// Rewinds to the marked position.
    ///
    /// Fails if no mark is set or the mark expired through its read limit.
    pub fn reset(&mut self) -> io::Result<()> {
        match self.mark {
            Some(mark) => {
                self.pos = mark.pos;
                Ok(())
            }
            None => Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "mark unset or expired",
            )),
        }
    }

    /// Consumes the view, returning the underlying snapshot.
    pub fn into_inner(self) -> Bytes {
        self.data
    }
}

impl Read for LumpReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = buf.len().min(self.remaining());
        buf[..n].copy_from_slice(&self.data[self.pos..self.pos + n]);
        self.pos += n;

        if let Some(mark) = self.mark {
            if self.pos.saturating_sub(mark.pos) > mark.read_limit {
                self.mark = None;
            }
        }
        Ok(n)
    }
}

impl Seek for LumpReader {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let target = match pos {
            SeekFrom::Start(n) => i64::try_from(n)
                .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "seek out of range"))?,
            SeekFrom::End(n) => self.data.len() as i64 + n,
            SeekFrom::Current(n) => self.pos as i64 + n,
        };
        if target < 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "seek before start of lump",
            ));
        }
        self.pos = target as usize;
        Ok(self.pos as u64)
    }
}
