use std::iter::FusedIterator;
use std::path::Path;

use compat_config::{log_dirent_debug, log_dirent_warn};

use crate::entry::{DirEntry, FileType};
use crate::error::{DirentError, Result};
use crate::hash::{dirent_hash, END_OF_STREAM};
use crate::native::{FindData, FindHandle, SearchPattern};
use crate::unit::NameUnit;

/// Stream position as produced by [`DirStream::tell`].
pub type Position = i64;

/// A native entry converted to the stream's unit type.
struct Native<C> {
    name: Vec<C>,
    attributes: u32,
}

impl<C: NameUnit> From<FindData> for Native<C> {
    fn from(data: FindData) -> Self {
        Self {
            name: C::from_os_str(&data.name),
            attributes: data.attributes,
        }
    }
}

/// Enumeration state kept apart from the entry buffer so a read can fill
/// the buffer while advancing the cursor.
struct Cursor<C> {
    pattern: SearchPattern,
    handle: Option<FindHandle>,
    /// Entry fetched ahead of time and not yet handed out.
    lookahead: Option<Native<C>>,
    /// Set by a failed seek or restart; reads report end-of-stream.
    invalid: bool,
}

impl<C: NameUnit> Cursor<C> {
    /// (Re)start the native enumeration. The first entry becomes the
    /// lookahead.
    fn first(&mut self) -> Result<()> {
        self.handle = None;
        self.lookahead = None;
        match FindHandle::first(&self.pattern) {
            Ok((handle, data)) => {
                self.handle = Some(handle);
                self.lookahead = Some(data.into());
                Ok(())
            }
            Err(err) => {
                self.invalid = true;
                log_dirent_debug!(
                    "Native enumeration failed to start",
                    pattern = tracing::field::debug(self.pattern.as_os_str()),
                    error = tracing::field::display(&err),
                );
                Err(DirentError::from_open_failure(&err).record())
            }
        }
    }

    /// Hand out the lookahead, or pull the next native entry.
    fn next(&mut self) -> Option<Native<C>> {
        if self.invalid {
            return None;
        }
        if let Some(cached) = self.lookahead.take() {
            return Some(cached);
        }
        match self.handle.as_mut()?.next() {
            Ok(Some(data)) => Some(data.into()),
            Ok(None) => None,
            Err(err) => {
                // A failed find-next ends the enumeration
                log_dirent_debug!(
                    "Native enumeration stopped",
                    error = tracing::field::display(&err)
                );
                None
            }
        }
    }

    fn ensure_open(&self) -> Result<()> {
        if self.handle.is_none() {
            return Err(DirentError::BadHandle.record());
        }
        Ok(())
    }

    fn read_into(&mut self, entry: &mut DirEntry<C>) -> Result<bool> {
        self.ensure_open()?;
        let Some(current) = self.next() else {
            return Ok(false);
        };

        entry.set_name(&current.name);
        entry.d_type = FileType::from_attributes(current.attributes).as_dt();

        // Prefetch so d_off names the entry a later seek should land on
        entry.d_off = match self.next() {
            Some(following) => {
                let position = dirent_hash(&following.name);
                self.lookahead = Some(following);
                position
            }
            None => END_OF_STREAM,
        };
        entry.d_ino = 0;
        entry.d_reclen = DirEntry::<C>::record_len();
        Ok(true)
    }

    fn tell(&mut self) -> Result<Position> {
        self.ensure_open()?;
        Ok(match self.next() {
            Some(upcoming) => {
                let position = dirent_hash(&upcoming.name);
                self.lookahead = Some(upcoming);
                position
            }
            None => END_OF_STREAM,
        })
    }

    fn seek(&mut self, position: Position) -> Result<()> {
        if self.handle.is_none() {
            self.invalid = true;
            return Err(DirentError::BadHandle.record());
        }
        if position < 0 {
            self.invalid = true;
            return Err(DirentError::NotFound);
        }
        self.first()?;
        self.invalid = false;
        while let Some(candidate) = self.next() {
            if dirent_hash(&candidate.name) == position {
                self.lookahead = Some(candidate);
                return Ok(());
            }
        }
        log_dirent_warn!("Seek position not found", position = position);
        self.invalid = true;
        Err(DirentError::NotFound.record())
    }

    fn rewind(&mut self) {
        if self.handle.is_none() {
            return;
        }
        if self.first().is_ok() {
            self.invalid = false;
        }
    }
}

/// An open directory stream.
///
/// Emulates POSIX `DIR` over [`FindHandle`]. The stream owns the native
/// handle and closes it when dropped.
pub struct DirStream<C: NameUnit> {
    entry: Box<DirEntry<C>>,
    cursor: Cursor<C>,
    /// Set once iteration has yielded an error; the iterator ends there.
    exhausted: bool,
}

impl<C: NameUnit> std::fmt::Debug for DirStream<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirStream")
            .field("entry", &self.entry)
            .field("exhausted", &self.exhausted)
            .finish_non_exhaustive()
    }
}

impl<C: NameUnit> DirStream<C> {
    /// Open a stream on `dirname`, which is resolved against the current
    /// directory.
    ///
    /// # Errors
    ///
    /// `NotFound` for an empty or missing path, `AccessDenied` when the
    /// directory cannot be listed, `NotADirectory` when the path names a
    /// file. The matching errno is recorded as well.
    pub fn open(dirname: impl AsRef<Path>) -> Result<Self> {
        let dirname = dirname.as_ref();
        let pattern = SearchPattern::new(dirname)
            .map_err(|err| DirentError::from_open_failure(&err).record())?;

        let mut cursor = Cursor {
            pattern,
            handle: None,
            lookahead: None,
            invalid: false,
        };
        cursor.first()?;

        log_dirent_debug!(
            "Directory stream opened",
            path = tracing::field::debug(dirname)
        );
        Ok(Self {
            entry: Box::default(),
            cursor,
            exhausted: false,
        })
    }

    /// Open a stream on a name given in the stream's own unit type.
    pub fn open_units(dirname: &[C]) -> Result<Self> {
        Self::open(C::to_path(dirname))
    }

    /// Next entry, stored in the stream's own buffer.
    ///
    /// The returned entry stays valid until the next call on this stream.
    /// `Ok(None)` marks the end of the stream.
    pub fn read(&mut self) -> Result<Option<&DirEntry<C>>> {
        let Self { entry, cursor, .. } = self;
        if cursor.read_into(entry)? {
            Ok(Some(&**entry))
        } else {
            Ok(None)
        }
    }

    /// Next entry, stored in a caller-supplied buffer. Returns `false` at
    /// the end of the stream.
    pub fn read_into(&mut self, entry: &mut DirEntry<C>) -> Result<bool> {
        self.cursor.read_into(entry)
    }

    /// Restart from the first entry and clear a previous failed seek.
    pub fn rewind(&mut self) {
        self.cursor.rewind();
    }

    /// Position of the entry the next read returns, or
    /// [`END_OF_STREAM`] once nothing is left. Does not consume anything.
    pub fn tell(&mut self) -> Result<Position> {
        self.cursor.tell()
    }

    /// Move to a position obtained from [`tell`](Self::tell) or `d_off`.
    ///
    /// Restarts the enumeration and scans for the first name whose hash
    /// matches. If none does, or `position` is negative, the stream reports
    /// end-of-stream until rewound and an error is returned.
    pub fn seek(&mut self, position: Position) -> Result<()> {
        self.cursor.seek(position)
    }

    /// Whether a failed seek or restart has parked the stream at its end.
    pub fn is_invalid(&self) -> bool {
        self.cursor.invalid
    }

    /// Close the stream, releasing the native handle.
    pub fn close(self) {}
}

impl<C: NameUnit> Iterator for DirStream<C> {
    type Item = Result<DirEntry<C>>;

    /// A read error is yielded once; the iterator is done after it.
    fn next(&mut self) -> Option<Self::Item> {
        if self.exhausted {
            return None;
        }
        match self.read() {
            Ok(Some(entry)) => Some(Ok(entry.clone())),
            Ok(None) => None,
            Err(err) => {
                self.exhausted = true;
                Some(Err(err))
            }
        }
    }
}

impl<C: NameUnit> FusedIterator for DirStream<C> {}

/// `opendir`: errors are recorded on the errno channels and reported as
/// `None`.
pub fn opendir(dirname: impl AsRef<Path>) -> Option<DirStream<u8>> {
    DirStream::open(dirname).ok()
}

/// `_wopendir`.
pub fn wopendir(dirname: &[u16]) -> Option<DirStream<u16>> {
    DirStream::open_units(dirname).ok()
}

/// `readdir` / `_wreaddir`: `None` at end of stream or on error.
pub fn readdir<C: NameUnit>(dir: &mut DirStream<C>) -> Option<&DirEntry<C>> {
    dir.read().ok().flatten()
}

/// `readdir_r` / `_wreaddir_r`: 0 on success, an errno value otherwise.
/// `result` is set to the filled entry, or `None` at end of stream.
pub fn readdir_r<'a, C: NameUnit>(
    dir: &mut DirStream<C>,
    entry: &'a mut DirEntry<C>,
    result: &mut Option<&'a DirEntry<C>>,
) -> i32 {
    match dir.read_into(entry) {
        Ok(true) => {
            *result = Some(&*entry);
            0
        }
        Ok(false) => {
            *result = None;
            0
        }
        Err(err) => {
            *result = None;
            err.errno()
        }
    }
}

pub fn rewinddir<C: NameUnit>(dir: &mut DirStream<C>) {
    dir.rewind();
}

/// `telldir`: -1 on error.
pub fn telldir<C: NameUnit>(dir: &mut DirStream<C>) -> Position {
    dir.tell().unwrap_or(-1)
}

pub fn seekdir<C: NameUnit>(dir: &mut DirStream<C>, position: Position) {
    let _ = dir.seek(position);
}

pub fn closedir<C: NameUnit>(dir: DirStream<C>) -> i32 {
    dir.close();
    0
}
