//! # LogRotator
//!
//! LogRotator is a small library for writing to a size-bounded log file.
//! When an incoming write would push the live file past its configured
//! threshold, the file is retired into a numbered backup chain
//! (`app.log-1` for the most recent backup through `app.log-N` for the
//! oldest) and a fresh file is started. All writes and rotations are
//! serialized behind a single lock, so one `Rotator` can safely be
//! shared between threads. **LogRotator implements `std::io::Write`, so
//! it plugs in anywhere a byte sink is expected — in particular as an
//! appender for the tracing crate.**
//!
//! The underlying file is opened lazily on the first write, never at
//! construction. Reopening an existing file resumes size accounting
//! from the real on-disk size, so a restarted process keeps rotating at
//! the right boundary instead of starting its byte count from zero.
//!
//! ## Example
//!
//! ```rust
//! use {
//!     logrotator::{RotatorBuilder, SizeLimit},
//!     std::io::Write,
//! };
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut logger = RotatorBuilder::new()
//!         .path(std::env::temp_dir().join("logrotator-doc.log"))
//!         .max_size(SizeLimit::KB(256))
//!         .max_backups(3)
//!         .build()?;
//!
//!     writeln!(logger, "This is an info message")?;
//!     writeln!(logger, "This is a warning message")?;
//!
//!     Ok(())
//! }
//! ```
//!
//! As a tracing appender:
//!
//! ```rust,no_run
//! use {
//!     logrotator::{RotatorBuilder, SizeLimit},
//!     tracing_subscriber::util::SubscriberInitExt,
//! };
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let appender = RotatorBuilder::new()
//!         .path("./logs/tracing.log")
//!         .max_size(SizeLimit::MB(10))
//!         .max_backups(3)
//!         .build()?;
//!     let (non_blocking, _guard) = tracing_appender::non_blocking(appender);
//!     tracing_subscriber::fmt()
//!         .with_writer(non_blocking)
//!         .with_ansi(false)
//!         .finish()
//!         .try_init()?;
//!
//!     tracing::info!("This is an info message");
//!
//!     Ok(())
//! }
//! ```
use std::{
    ffi::OsString,
    fs::{self, File, OpenOptions},
    io::{self, Write as _},
    path::{Path, PathBuf},
    sync::{Mutex, PoisonError},
};

/// Default maximum size of the live file before rotation: 10 MiB.
pub const DEFAULT_MAX_SIZE: u64 = 10 * 1024 * 1024;

/// Default number of rotated backups to keep.
pub const DEFAULT_MAX_BACKUPS: usize = 1;

/// The default log path: a file named after the current executable in
/// the system temporary directory (e.g. `/tmp/myapp.log`). Falls back
/// to `rotator.log` when the executable name cannot be determined.
pub fn default_path() -> PathBuf {
    let mut name = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.file_stem().map(|stem| stem.to_os_string()))
        .unwrap_or_else(|| OsString::from("rotator"));
    name.push(".log");
    std::env::temp_dir().join(name)
}

/// Defines size thresholds for rotating log files in various units.
///
/// When the next write would push the live file past the specified
/// size, the file is rotated and a new one is started. This enum
/// provides multiple size units to make configuration more intuitive:
///
/// * `Bytes` - Direct byte count (e.g., 1048576 bytes)
/// * `KB` - Kilobytes (1 KB = 1024 bytes)
/// * `MB` - Megabytes (1 MB = 1024 KB)
/// * `GB` - Gigabytes (1 GB = 1024 MB)
///
/// # Examples
/// ```
/// use logrotator::{RotatorBuilder, SizeLimit};
///
/// // Rotate when the file would exceed 100 MB
/// let rotator = RotatorBuilder::new()
///     .path(std::env::temp_dir().join("large.log"))
///     .max_size(SizeLimit::MB(100))
///     .build()
///     .unwrap();
/// ```
#[derive(Debug, Clone)]
pub enum SizeLimit {
    /// Raw byte count
    Bytes(u64),
    /// Kilobytes (1 KB = 1024 bytes)
    KB(u64),
    /// Megabytes (1 MB = 1024 KB = 1,048,576 bytes)
    MB(u64),
    /// Gigabytes (1 GB = 1024 MB = 1,073,741,824 bytes)
    GB(u64),
}

impl SizeLimit {
    /// Get the threshold in bytes.
    fn bytes(&self) -> u64 {
        match self {
            SizeLimit::Bytes(b) => *b,
            SizeLimit::KB(kb) => kb.saturating_mul(1024),
            SizeLimit::MB(mb) => mb.saturating_mul(1024 * 1024),
            SizeLimit::GB(gb) => gb.saturating_mul(1024 * 1024 * 1024),
        }
    }
}

/// Mutable state for the rotator: the lazily-opened file handle and the
/// running byte count for the currently open file. Guarded by the
/// rotator's lock as a unit.
struct RotatorState {
    /// The open write handle, or `None` when unopened or closed.
    file: Option<File>,
    /// Bytes written to the currently open file. Seeded from the
    /// on-disk size when an existing file is reopened.
    size: u64,
}

/// A concurrency-safe writer that appends to a size-bounded file and
/// rotates it into a numbered backup chain on overflow.
///
/// Backups live next to the live file as `path-1` (newest) through
/// `path-max_backups` (oldest), gap-free. With `max_backups` of zero no
/// history is kept and rotation simply truncates.
pub struct Rotator {
    path: PathBuf,
    max_size: u64,
    max_backups: usize,
    state: Mutex<RotatorState>,
}

impl Rotator {
    /// The path of the live log file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The size threshold in bytes.
    pub fn max_size(&self) -> u64 {
        self.max_size
    }

    /// The number of rotated backups kept.
    pub fn max_backups(&self) -> usize {
        self.max_backups
    }

    /// Append `bytes` to the log, rotating first if the write would
    /// push the live file past the size threshold. A single payload is
    /// never split across a rotation boundary: it lands entirely in
    /// the pre-rotation file or entirely in the fresh one.
    ///
    /// The file is opened (or created, along with its parent
    /// directories) on the first call. Safe to call from multiple
    /// threads; calls are serialized internally.
    ///
    /// Returns the number of bytes actually written. If rotation
    /// fails, the payload is not written and the error is returned.
    pub fn write(&self, bytes: &[u8]) -> Result<usize, RotatorError> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if state.file.is_none() {
            self.open_current(&mut state)?;
        }
        if state.size + bytes.len() as u64 > self.max_size {
            self.rotate(&mut state)?;
        }
        let file = match state.file.as_mut() {
            Some(file) => file,
            None => return Err(RotatorError::Internal("no open log file after rotation".to_string())),
        };
        let written = file.write(bytes).map_err(|err| RotatorError::WriteFile {
            path: self.path.clone(),
            source: err,
        })?;
        state.size += written as u64;
        Ok(written)
    }

    /// Flush the live file if one is open.
    pub fn flush(&self) -> Result<(), RotatorError> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(file) = state.file.as_mut() {
            file.flush().map_err(|err| RotatorError::WriteFile {
                path: self.path.clone(),
                source: err,
            })?;
        }
        Ok(())
    }

    /// Release the open handle, if any. Calling close on an already
    /// closed (or never opened) rotator is a no-op. The on-disk files
    /// are left untouched, and a later write transparently reopens.
    pub fn close(&self) -> Result<(), RotatorError> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        self.close_current(&mut state)
    }

    /// Open the file at `path` for appending, creating it (and its
    /// parent directories) if it does not exist. The running size is
    /// seeded from the on-disk size so accounting resumes across
    /// restarts.
    fn open_current(&self, state: &mut RotatorState) -> Result<(), RotatorError> {
        match fs::metadata(&self.path) {
            Ok(metadata) => {
                let file = OpenOptions::new().append(true).open(&self.path).map_err(|err| {
                    RotatorError::OpenFile {
                        path: self.path.clone(),
                        source: err,
                    }
                })?;
                state.file = Some(file);
                state.size = metadata.len();
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                if let Some(parent) = self.path.parent() {
                    fs::create_dir_all(parent).map_err(|err| RotatorError::CreateDirectory {
                        path: parent.to_path_buf(),
                        source: err,
                    })?;
                }
                let file = File::create(&self.path).map_err(|err| RotatorError::CreateFile {
                    path: self.path.clone(),
                    source: err,
                })?;
                state.file = Some(file);
                state.size = 0;
            }
            Err(err) => {
                return Err(RotatorError::Stat {
                    path: self.path.clone(),
                    source: err,
                })
            }
        }
        Ok(())
    }

    /// Retire the live file into the backup chain and start a fresh
    /// one. Must be called with the lock held.
    ///
    /// The chain is shifted oldest-first: `path-max_backups` is
    /// deleted, then each survivor moves up one slot in strictly
    /// decreasing index order so no backup is overwritten before it has
    /// vacated its slot. Missing sources are tolerated; a young log may
    /// not have a full chain yet.
    ///
    /// On any failure the handle has already been released, so the next
    /// write re-derives state from whatever is on disk and retries from
    /// there.
    fn rotate(&self, state: &mut RotatorState) -> Result<(), RotatorError> {
        self.close_current(state)?;
        if self.max_backups < 1 {
            remove_if_exists(&self.path)?;
        } else {
            remove_if_exists(&backup_path(&self.path, self.max_backups))?;
            for index in (1..=self.max_backups).rev() {
                let source = if index == 1 {
                    self.path.clone()
                } else {
                    backup_path(&self.path, index - 1)
                };
                rename_if_exists(&source, &backup_path(&self.path, index))?;
            }
        }
        let file = File::create(&self.path).map_err(|err| RotatorError::CreateFile {
            path: self.path.clone(),
            source: err,
        })?;
        state.file = Some(file);
        state.size = 0;
        Ok(())
    }

    /// Take and close the open handle. The handle field is cleared
    /// before the close outcome is inspected, so a failed close still
    /// leaves the rotator in the no-file-open state.
    fn close_current(&self, state: &mut RotatorState) -> Result<(), RotatorError> {
        if let Some(file) = state.file.take() {
            file.sync_all().map_err(|err| RotatorError::CloseFile {
                path: self.path.clone(),
                source: err,
            })?;
        }
        Ok(())
    }
}

/// The backup slot `index` for `path`: `path-1`, `path-2`, ...
fn backup_path(path: &Path, index: usize) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(format!("-{index}"));
    PathBuf::from(name)
}

/// Remove `path`, treating "does not exist" as success.
fn remove_if_exists(path: &Path) -> Result<(), RotatorError> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(RotatorError::RemoveFile {
            path: path.to_path_buf(),
            source: err,
        }),
    }
}

/// Rename `from` to `to`, treating a missing source as success.
fn rename_if_exists(from: &Path, to: &Path) -> Result<(), RotatorError> {
    match fs::rename(from, to) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(RotatorError::RenameFile {
            from: from.to_path_buf(),
            to: to.to_path_buf(),
            source: err,
        }),
    }
}

/// Errors that can occur when building or using a rotator.
#[derive(Debug, thiserror::Error)]
pub enum RotatorError {
    #[error("maximum size must be at least one byte")]
    InvalidMaxSize,
    #[error("log path must not be empty")]
    InvalidPath,
    #[error("failed to stat '{path}': {source}")]
    Stat { path: PathBuf, source: io::Error },
    #[error("failed to create directory '{path}': {source}")]
    CreateDirectory { path: PathBuf, source: io::Error },
    #[error("failed to create file '{path}': {source}")]
    CreateFile { path: PathBuf, source: io::Error },
    #[error("failed to open file '{path}' for appending: {source}")]
    OpenFile { path: PathBuf, source: io::Error },
    #[error("failed to write to '{path}': {source}")]
    WriteFile { path: PathBuf, source: io::Error },
    #[error("failed to close '{path}': {source}")]
    CloseFile { path: PathBuf, source: io::Error },
    #[error("failed to remove '{path}': {source}")]
    RemoveFile { path: PathBuf, source: io::Error },
    #[error("failed to rename '{from}' to '{to}': {source}")]
    RenameFile {
        from: PathBuf,
        to: PathBuf,
        source: io::Error,
    },
    #[error("internal error: {0}")]
    Internal(String),
}

/// Provides a fluent interface for configuring Rotator instances.
///
/// Every knob has an explicit default, so a bare
/// `RotatorBuilder::new().build()` produces a working rotator:
///
/// * Path - a file named after the current executable in the system
///   temporary directory
/// * Maximum size - 10 MiB
/// * Backups kept - 1
///
/// Construction performs no file I/O; the log file is created on the
/// first write. Each knob is validated by [`build`](Self::build), which
/// aborts with a distinct error when a value is rejected.
///
/// # Examples
///
/// ```rust
/// use logrotator::{RotatorBuilder, SizeLimit};
///
/// let rotator = RotatorBuilder::new()
///     .path(std::env::temp_dir().join("app.log"))
///     .max_size(SizeLimit::MB(10))  // Rotate at 10MB
///     .max_backups(5)               // Keep app.log-1 ... app.log-5
///     .build()
///     .unwrap();
/// ```
pub struct RotatorBuilder {
    path: PathBuf,
    max_size: SizeLimit,
    max_backups: usize,
}

impl RotatorBuilder {
    /// Create a builder with the default configuration.
    pub fn new() -> Self {
        RotatorBuilder {
            path: default_path(),
            max_size: SizeLimit::Bytes(DEFAULT_MAX_SIZE),
            max_backups: DEFAULT_MAX_BACKUPS,
        }
    }

    /// Set the path of the live log file.
    pub fn path<P: AsRef<Path>>(self, path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            ..self
        }
    }

    /// Set the size threshold that triggers rotation.
    pub fn max_size(self, max_size: SizeLimit) -> Self {
        Self { max_size, ..self }
    }

    /// Set how many rotated backups to keep. Zero keeps no history:
    /// rotation just truncates the live file.
    pub fn max_backups(self, max_backups: usize) -> Self {
        Self { max_backups, ..self }
    }

    /// Build the rotator, validating the configuration.
    pub fn build(self) -> Result<Rotator, RotatorError> {
        if self.path.as_os_str().is_empty() {
            return Err(RotatorError::InvalidPath);
        }
        let max_size = self.max_size.bytes();
        if max_size == 0 {
            return Err(RotatorError::InvalidMaxSize);
        }
        Ok(Rotator {
            path: self.path,
            max_size,
            max_backups: self.max_backups,
            state: Mutex::new(RotatorState { file: None, size: 0 }),
        })
    }
}

impl Default for RotatorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[allow(clippy::io_other_error)]
impl io::Write for Rotator {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Rotator::write(self, buf).map_err(|err| io::Error::new(io::ErrorKind::Other, err.to_string()))
    }

    fn flush(&mut self) -> io::Result<()> {
        Rotator::flush(self).map_err(|err| io::Error::new(io::ErrorKind::Other, err.to_string()))
    }
}

#[allow(clippy::io_other_error)]
impl io::Write for &Rotator {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Rotator::write(self, buf).map_err(|err| io::Error::new(io::ErrorKind::Other, err.to_string()))
    }

    fn flush(&mut self) -> io::Result<()> {
        Rotator::flush(self).map_err(|err| io::Error::new(io::ErrorKind::Other, err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_limit_converts_to_bytes() {
        assert_eq!(SizeLimit::Bytes(123).bytes(), 123);
        assert_eq!(SizeLimit::KB(2).bytes(), 2048);
        assert_eq!(SizeLimit::MB(3).bytes(), 3 * 1024 * 1024);
        assert_eq!(SizeLimit::GB(1).bytes(), 1024 * 1024 * 1024);
    }

    #[test]
    fn size_limit_saturates_instead_of_wrapping() {
        assert_eq!(SizeLimit::GB(u64::MAX).bytes(), u64::MAX);
    }

    #[test]
    fn builder_applies_defaults() {
        let rotator = RotatorBuilder::new().build().unwrap();
        assert_eq!(rotator.max_size(), DEFAULT_MAX_SIZE);
        assert_eq!(rotator.max_backups(), DEFAULT_MAX_BACKUPS);
        assert_eq!(rotator.path(), default_path());
    }

    #[test]
    fn builder_rejects_zero_max_size() {
        let result = RotatorBuilder::new().max_size(SizeLimit::Bytes(0)).build();
        assert!(matches!(result, Err(RotatorError::InvalidMaxSize)));
    }

    #[test]
    fn builder_rejects_empty_path() {
        let result = RotatorBuilder::new().path("").build();
        assert!(matches!(result, Err(RotatorError::InvalidPath)));
    }

    #[test]
    fn backup_paths_append_the_slot_number() {
        let path = Path::new("/var/log/app.log");
        assert_eq!(backup_path(path, 1), PathBuf::from("/var/log/app.log-1"));
        assert_eq!(backup_path(path, 12), PathBuf::from("/var/log/app.log-12"));
    }
}
