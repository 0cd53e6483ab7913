//! WAD archive engine for classic game resource containers
//!
//! A WAD is a header, a region of named variable-length binary blobs
//! ("lumps"), and a trailing directory describing each blob's name, offset
//! and size. This crate opens, creates, reads and mutates such archives
//! through two backends sharing one contract:
//!
//! - [`WadBuffer`] holds the whole archive in memory and serializes it in
//!   one shot — suited to bulk edits.
//! - [`WadFile`] works against one open random-access file, keeping the
//!   on-disk header and directory synchronized after every structural
//!   change — suited to reads and small additions.
//!
//! Lump payloads are opaque byte ranges here; decoding map geometry,
//! textures or sounds belongs to external codecs plugged in through the
//! [`Wad::read_decoded`] seam.

pub mod buffer;
pub mod entry;
pub mod error;
pub mod file;
pub mod name;
pub mod reader;
pub mod types;
pub mod util;
pub mod wad;

pub use buffer::WadBuffer;
pub use entry::WadEntry;
pub use error::{Result, WadError};
pub use file::WadFile;
pub use reader::LumpReader;
pub use types::WadKind;
pub use wad::Wad;
