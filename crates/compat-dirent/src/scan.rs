use std::cmp::Ordering;
use std::ops::Deref;
use std::path::Path;

use compat_config::log_dirent_debug;

use crate::entry::DirEntry;
use crate::error::{DirentError, Result};
use crate::stream::DirStream;
use crate::unit::NameUnit;

/// Ordering used to sort a scan result.
pub type Compare<C> = fn(&DirEntry<C>, &DirEntry<C>) -> Ordering;

/// Entries collected by [`scandir`], stored inline in one fallibly grown
/// table.
#[derive(Debug, Default)]
pub struct EntryList<C: NameUnit> {
    entries: Vec<DirEntry<C>>,
}

impl<C: NameUnit> EntryList<C> {
    fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Append, growing the table to `2 * len + 16` slots when it is full.
    fn push(&mut self, entry: DirEntry<C>) -> Result<()> {
        let len = self.entries.len();
        if len >= self.entries.capacity() {
            let target = len * 2 + 16;
            self.entries
                .try_reserve_exact(target - len)
                .map_err(|_| DirentError::OutOfMemory.record())?;
        }
        self.entries.push(entry);
        Ok(())
    }

    pub fn into_vec(self) -> Vec<DirEntry<C>> {
        self.entries
    }
}

impl<C: NameUnit> Deref for EntryList<C> {
    type Target = [DirEntry<C>];

    fn deref(&self) -> &Self::Target {
        &self.entries
    }
}

impl<C: NameUnit> IntoIterator for EntryList<C> {
    type Item = DirEntry<C>;
    type IntoIter = std::vec::IntoIter<DirEntry<C>>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// Read every entry of `dirname`, keep those `filter` accepts and sort them
/// with `compare`.
///
/// Each entry is read into a reused buffer and copied into the table, so
/// table growth is the only allocation and a failed one is reported as
/// `OutOfMemory`. On any failure nothing is returned: entries collected so
/// far are freed and the stream is closed.
pub fn scandir<C: NameUnit>(
    dirname: impl AsRef<Path>,
    filter: Option<&dyn Fn(&DirEntry<C>) -> bool>,
    compare: Option<Compare<C>>,
) -> Result<EntryList<C>> {
    let mut dir = DirStream::<C>::open(dirname)?;
    let mut list = EntryList::new();
    let mut entry = DirEntry::<C>::default();

    while dir.read_into(&mut entry)? {
        if filter.map_or(true, |accept| accept(&entry)) {
            list.push(entry.clone())?;
        }
    }

    if let Some(compare) = compare {
        if list.entries.len() > 1 {
            list.entries.sort_by(|a, b| compare(a, b));
        }
    }

    log_dirent_debug!("Directory scanned", entries = list.entries.len());
    Ok(list)
}

/// `_wscandir`: [`scandir`] with a wide directory name.
pub fn wscandir(
    dirname: &[u16],
    filter: Option<&dyn Fn(&DirEntry<u16>) -> bool>,
    compare: Option<Compare<u16>>,
) -> Result<EntryList<u16>> {
    scandir(u16::to_path(dirname), filter, compare)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_growth_policy() {
        let mut list = EntryList::<u8>::new();
        list.push(DirEntry::default()).unwrap();
        assert_eq!(list.entries.capacity(), 16);
        for _ in 1..16 {
            list.push(DirEntry::default()).unwrap();
        }
        assert_eq!(list.entries.capacity(), 16);
        list.push(DirEntry::default()).unwrap();
        assert_eq!(list.entries.capacity(), 48);
    }

    #[test]
    fn test_buffer_reuse_keeps_entries_separate() {
        let temp = tempfile::tempdir().unwrap();
        std::fs::write(temp.path().join("a-much-longer-rejected-name"), b"").unwrap();
        std::fs::write(temp.path().join("s"), b"").unwrap();
        std::fs::write(temp.path().join("t"), b"").unwrap();

        let short = |entry: &DirEntry<u8>| entry.d_namlen == 1 && entry.name() != b".";
        let list = scandir(temp.path(), Some(&short), Some(crate::alphasort)).unwrap();
        let entries = list.into_vec();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].name(), b"s");
        assert_eq!(entries[1].name(), b"t");
        assert_eq!(entries[0].d_name[1], 0);
    }

    #[test]
    fn test_missing_directory_returns_error() {
        let temp = tempfile::tempdir().unwrap();
        let err = scandir::<u8>(temp.path().join("gone"), None, None).unwrap_err();
        assert_eq!(err, DirentError::NotFound);
    }
}
