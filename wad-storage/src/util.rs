//! Helpers layered over the archive lookup API

use crate::entry::WadEntry;
use crate::wad::Wad;

/// Clones out all entries inside a marker-delimited namespace.
///
/// A namespace is the run of entries strictly between `{PREFIX}_START` and
/// `{PREFIX}_END` markers (e.g. `F_START`/`F_END` for flats,
/// `P_START`/`P_END` for patches). The prefix is uppercased before the
/// marker names are formed. Returns an empty vector when either marker is
/// missing.
pub fn entries_in_namespace<W>(wad: &W, prefix: &str) -> Vec<WadEntry>
where
    W: Wad + ?Sized,
{
    entries_in_namespace_filtered(wad, prefix, |_| true)
}

/// Like [`entries_in_namespace`], keeping only entries the filter accepts.
pub fn entries_in_namespace_filtered<W, F>(wad: &W, prefix: &str, mut keep: F) -> Vec<WadEntry>
where
    W: Wad + ?Sized,
    F: FnMut(&WadEntry) -> bool,
{
    let prefix = prefix.to_ascii_uppercase();
    let start_name = format!("{prefix}_START");
    let end_name = format!("{prefix}_END");

    let Some(start) = wad.index_of(&start_name) else {
        return Vec::new();
    };
    let Some(end) = wad.index_of_from(&end_name, start + 1) else {
        return Vec::new();
    };

    wad.entries()[start + 1..end]
        .iter()
        .filter(|e| keep(e))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::WadBuffer;

    fn namespace_fixture() -> WadBuffer {
        let mut wad = WadBuffer::new();
        wad.add_data("MAP01", &[1]).unwrap();
        wad.add_marker("F_START").unwrap();
        wad.add_data("FLOOR1", &[2, 2]).unwrap();
        wad.add_data("FLOOR2", &[3, 3]).unwrap();
        wad.add_marker("F_END").unwrap();
        wad.add_data("TRAILING", &[4]).unwrap();
        wad
    }

    #[test]
    fn collects_entries_between_markers() {
        let wad = namespace_fixture();
        let flats = entries_in_namespace(&wad, "f");
        let names: Vec<&str> = flats.iter().map(WadEntry::name).collect();
        assert_eq!(names, ["FLOOR1", "FLOOR2"]);
    }

    #[test]
    fn filter_applies() {
        let wad = namespace_fixture();
        let flats = entries_in_namespace_filtered(&wad, "F", |e| e.name() != "FLOOR1");
        let names: Vec<&str> = flats.iter().map(WadEntry::name).collect();
        assert_eq!(names, ["FLOOR2"]);
    }

    #[test]
    fn missing_markers_yield_nothing() {
        let wad = namespace_fixture();
        assert!(entries_in_namespace(&wad, "S").is_empty());

        let mut unterminated = WadBuffer::new();
        unterminated.add_marker("P_START").unwrap();
        unterminated.add_data("PATCH1", &[1]).unwrap();
        assert!(entries_in_namespace(&unterminated, "P").is_empty());
    }
}
