use std::collections::VecDeque;
use std::ffi::OsString;
use std::fs::{self, ReadDir};
use std::io;

use super::{FindData, SearchPattern, FILE_ATTRIBUTE_DIRECTORY, FILE_ATTRIBUTE_NORMAL};

/// Enumeration over `std::fs::read_dir`, with `.` and `..` reported first
/// the way a native find-first/find-next sequence does.
#[derive(Debug)]
pub struct FindHandle {
    dots: VecDeque<FindData>,
    entries: ReadDir,
}

impl FindHandle {
    pub fn first(pattern: &SearchPattern) -> io::Result<(Self, FindData)> {
        let entries = fs::read_dir(pattern.directory())?;
        let dot = |name: &str| FindData {
            name: OsString::from(name),
            attributes: FILE_ATTRIBUTE_DIRECTORY,
        };
        let mut handle = Self {
            dots: VecDeque::from([dot("."), dot("..")]),
            entries,
        };
        match handle.next()? {
            Some(data) => Ok((handle, data)),
            None => Err(io::Error::from(io::ErrorKind::NotFound)),
        }
    }

    pub fn next(&mut self) -> io::Result<Option<FindData>> {
        if let Some(dot) = self.dots.pop_front() {
            return Ok(Some(dot));
        }
        let Some(entry) = self.entries.next().transpose()? else {
            return Ok(None);
        };
        let attributes = entry
            .metadata()
            .map(|meta| attributes_from_metadata(&meta))
            .unwrap_or(FILE_ATTRIBUTE_NORMAL);
        Ok(Some(FindData {
            name: entry.file_name(),
            attributes,
        }))
    }
}

#[cfg(windows)]
fn attributes_from_metadata(meta: &fs::Metadata) -> u32 {
    use std::os::windows::fs::MetadataExt;
    meta.file_attributes()
}

#[cfg(not(windows))]
fn attributes_from_metadata(meta: &fs::Metadata) -> u32 {
    use super::{FILE_ATTRIBUTE_DEVICE, FILE_ATTRIBUTE_REPARSE_POINT};

    let ft = meta.file_type();
    if ft.is_symlink() {
        FILE_ATTRIBUTE_REPARSE_POINT
    } else if ft.is_dir() {
        FILE_ATTRIBUTE_DIRECTORY
    } else if ft.is_file() {
        FILE_ATTRIBUTE_NORMAL
    } else {
        FILE_ATTRIBUTE_DEVICE
    }
}
