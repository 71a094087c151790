use std::fmt;

use crate::native::{FILE_ATTRIBUTE_DEVICE, FILE_ATTRIBUTE_DIRECTORY, FILE_ATTRIBUTE_REPARSE_POINT};
use crate::unit::NameUnit;

/// Longest name, in units, an entry can carry (excluding the terminator).
pub const PATH_MAX: usize = 260;

pub const DT_UNKNOWN: i32 = 0;
pub const DT_FIFO: i32 = 0x1000;
pub const DT_CHR: i32 = 0x2000;
pub const DT_DIR: i32 = 0x4000;
pub const DT_REG: i32 = 0x8000;
pub const DT_LNK: i32 = DT_DIR | DT_REG;
pub const DT_SOCK: i32 = 0;
pub const DT_BLK: i32 = 0;

/// Convert a `DT_*` value to the matching `S_IF*` mode bits.
pub const fn dt_to_if(dt: i32) -> i32 {
    dt
}

/// Convert `S_IF*` mode bits to the matching `DT_*` value.
pub const fn if_to_dt(mode: i32) -> i32 {
    mode & 0xF000
}

/// Classification of a directory entry as seen through the native
/// attribute bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    Unknown,
    CharDevice,
    Symlink,
    Directory,
    Regular,
}

impl FileType {
    /// Device beats reparse point beats directory; everything else is a
    /// regular file.
    pub fn from_attributes(attributes: u32) -> Self {
        if attributes & FILE_ATTRIBUTE_DEVICE != 0 {
            FileType::CharDevice
        } else if attributes & FILE_ATTRIBUTE_REPARSE_POINT != 0 {
            FileType::Symlink
        } else if attributes & FILE_ATTRIBUTE_DIRECTORY != 0 {
            FileType::Directory
        } else {
            FileType::Regular
        }
    }

    pub fn from_dt(dt: i32) -> Self {
        match dt {
            DT_CHR => FileType::CharDevice,
            DT_LNK => FileType::Symlink,
            DT_DIR => FileType::Directory,
            DT_REG => FileType::Regular,
            _ => FileType::Unknown,
        }
    }

    pub fn as_dt(self) -> i32 {
        match self {
            FileType::Unknown => DT_UNKNOWN,
            FileType::CharDevice => DT_CHR,
            FileType::Symlink => DT_LNK,
            FileType::Directory => DT_DIR,
            FileType::Regular => DT_REG,
        }
    }
}

/// One directory entry, laid out like POSIX `struct dirent`.
#[derive(Clone)]
pub struct DirEntry<C: NameUnit> {
    /// Always 0: the native API exposes no inode numbers.
    pub d_ino: i64,
    /// Position of the entry after this one, or [`crate::END_OF_STREAM`].
    pub d_off: i64,
    pub d_reclen: u16,
    /// Length of `d_name` in units, excluding the terminator.
    pub d_namlen: usize,
    pub d_type: i32,
    pub d_name: [C; PATH_MAX + 1],
}

impl<C: NameUnit> Default for DirEntry<C> {
    fn default() -> Self {
        Self {
            d_ino: 0,
            d_off: 0,
            d_reclen: 0,
            d_namlen: 0,
            d_type: DT_UNKNOWN,
            d_name: [C::NUL; PATH_MAX + 1],
        }
    }
}

impl<C: NameUnit> DirEntry<C> {
    /// Name without the terminator.
    pub fn name(&self) -> &[C] {
        &self.d_name[..self.d_namlen]
    }

    pub fn name_lossy(&self) -> String {
        C::to_string_lossy(self.name())
    }

    pub fn file_type(&self) -> FileType {
        FileType::from_dt(self.d_type)
    }

    /// Copy `name` in, truncated to `PATH_MAX` units, and terminate it.
    pub(crate) fn set_name(&mut self, name: &[C]) {
        let len = name.len().min(PATH_MAX);
        self.d_name[..len].copy_from_slice(&name[..len]);
        self.d_name[len] = C::NUL;
        self.d_namlen = len;
    }

    pub(crate) fn record_len() -> u16 {
        std::mem::size_of::<Self>().min(u16::MAX as usize) as u16
    }
}

impl<C: NameUnit> fmt::Debug for DirEntry<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DirEntry")
            .field("d_ino", &self.d_ino)
            .field("d_off", &self.d_off)
            .field("d_reclen", &self.d_reclen)
            .field("d_type", &self.file_type())
            .field("d_name", &self.name_lossy())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attribute_priority() {
        let all = FILE_ATTRIBUTE_DEVICE | FILE_ATTRIBUTE_REPARSE_POINT | FILE_ATTRIBUTE_DIRECTORY;
        assert_eq!(FileType::from_attributes(all), FileType::CharDevice);
        let link_dir = FILE_ATTRIBUTE_REPARSE_POINT | FILE_ATTRIBUTE_DIRECTORY;
        assert_eq!(FileType::from_attributes(link_dir), FileType::Symlink);
        assert_eq!(FileType::from_attributes(FILE_ATTRIBUTE_DIRECTORY), FileType::Directory);
        assert_eq!(FileType::from_attributes(0x20), FileType::Regular);
    }

    #[test]
    fn test_dt_constants() {
        assert_eq!(DT_LNK, 0xC000);
        assert_eq!(FileType::Symlink.as_dt(), DT_LNK);
        assert_eq!(FileType::from_dt(DT_DIR), FileType::Directory);
        assert_eq!(FileType::from_dt(DT_FIFO), FileType::Unknown);
        assert_eq!(if_to_dt(dt_to_if(DT_REG) | 0o644), DT_REG);
    }

    #[test]
    fn test_set_name_truncates() {
        let mut entry = DirEntry::<u8>::default();
        let long = vec![b'n'; PATH_MAX + 40];
        entry.set_name(&long);
        assert_eq!(entry.d_namlen, PATH_MAX);
        assert_eq!(entry.d_name[PATH_MAX], 0);

        entry.set_name(b"short");
        assert_eq!(entry.name(), b"short");
        assert_eq!(entry.d_name[5], 0);
    }
}
