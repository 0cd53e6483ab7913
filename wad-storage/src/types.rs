//! Common types and wire constants for the WAD container format

/// Size of the archive header: 4-byte magic, i32 entry count, i32 directory offset.
pub const HEADER_LEN: usize = 12;

/// Size of one directory record: i32 offset, i32 size, 8-byte name.
pub const DIR_RECORD_LEN: usize = 16;

/// Maximum entry name length in bytes.
pub const NAME_LEN: usize = 8;

/// The kind of WAD archive, as encoded in the 4-byte header magic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WadKind {
    /// A complete, standalone archive (`"IWAD"`).
    Iwad,
    /// A supplemental archive layered over another (`"PWAD"`).
    Pwad,
}

impl WadKind {
    /// The header magic for this kind.
    pub const fn magic(self) -> &'static [u8; 4] {
        match self {
            Self::Iwad => b"IWAD",
            Self::Pwad => b"PWAD",
        }
    }

    /// Maps a header magic back to a kind.
    ///
    /// Returns `None` for anything other than the two recognized tags.
    pub fn from_magic(magic: &[u8; 4]) -> Option<Self> {
        match magic {
            b"IWAD" => Some(Self::Iwad),
            b"PWAD" => Some(Self::Pwad),
            _ => None,
        }
    }
}

impl std::fmt::Display for WadKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Iwad => f.write_str("IWAD"),
            Self::Pwad => f.write_str("PWAD"),
        }
    }
}
