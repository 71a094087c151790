//! # compat-dirent
//!
//! POSIX directory streams (`opendir`, `readdir`, `telldir`, `seekdir`,
//! `scandir`, ...) emulated on top of a handle-based, single-shot native
//! enumeration API of the `FindFirstFile`/`FindNextFile` shape.
//!
//! ## Positions
//!
//! The native API has no notion of a position, so a stream position is the
//! 31-bit DJB2 hash of the name that the next read would return. `seek`
//! restarts the enumeration and scans forward until a name with a matching
//! hash turns up. Two names may share a hash, in which case `seek` lands on
//! the first of them; a position whose entry has disappeared makes the
//! stream return end-of-stream until it is rewound.
//!
//! ## Narrow and wide streams
//!
//! [`Dir`]/[`Dirent`] carry byte names, [`WDir`]/[`WDirent`] carry UTF-16
//! names. Both are the same generic code over [`NameUnit`].

mod entry;
mod error;
mod hash;
pub mod native;
mod scan;
mod sort;
mod stream;
mod unit;

pub use entry::{dt_to_if, if_to_dt, DirEntry, FileType, DT_BLK, DT_CHR, DT_DIR, DT_FIFO};
pub use entry::{DT_LNK, DT_REG, DT_SOCK, DT_UNKNOWN, PATH_MAX};
pub use error::{DirentError, Result};
pub use hash::{dirent_hash, END_OF_STREAM};
pub use scan::{scandir, wscandir, Compare, EntryList};
pub use sort::{alphasort, strverscmp, versionsort, walphasort, wversionsort};
pub use stream::{closedir, opendir, readdir, readdir_r, rewinddir, seekdir, telldir, wopendir};
pub use stream::{DirStream, Position};
pub use unit::NameUnit;

/// Narrow directory stream.
pub type Dir = DirStream<u8>;
/// Wide directory stream.
pub type WDir = DirStream<u16>;
/// Narrow directory entry.
pub type Dirent = DirEntry<u8>;
/// Wide directory entry.
pub type WDirent = DirEntry<u16>;
