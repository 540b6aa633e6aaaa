//! Audit log
//!
//! Per-run log with independent console and file routing for each message.
//! The file is created once when the log is built and kept open for the
//! whole run; file writes are best effort and fall back to the console.

use chrono::Local;
use std::fs::{self, File, OpenOptions};
use std::io::{self, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;
use tracing::warn;

/// Suffixed names tried when another run already owns the base name
const MAX_NAME_ATTEMPTS: u32 = 100;

#[derive(Error, Debug)]
#[error("Failed to write audit log {path}: {source}")]
pub struct LogWriteError {
    pub path: PathBuf,
    #[source]
    pub source: io::Error,
}

type Console = Box<dyn Write + Send>;

pub struct AuditLog {
    path: PathBuf,
    file: Mutex<Option<File>>,
    console: Mutex<Console>,
}

impl AuditLog {
    /// Create a log under `dir` that echoes to stdout
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self::with_console(dir, Box::new(io::stdout()))
    }

    /// Create a log under `dir` with a custom console sink
    pub fn with_console(dir: impl AsRef<Path>, console: Console) -> Self {
        let dir = dir.as_ref();
        if let Err(e) = fs::create_dir_all(dir) {
            warn!(dir = %dir.display(), error = %e, "Could not create log directory");
        }

        let stem = format!("recon_{}", Local::now().format("%Y%m%d_%H%M%S"));
        let (path, file) = match create_unique(dir, &stem) {
            Ok((path, file)) => (path, Some(file)),
            Err(e) => {
                let path = dir.join(format!("{}.log", stem));
                warn!(path = %path.display(), error = %e, "Could not create audit log file");
                (path, None)
            }
        };

        Self {
            path,
            file: Mutex::new(file),
            console: Mutex::new(console),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Record a message on the console and/or in the log file
    pub fn record(&self, message: &str, show_on_screen: bool, write_to_file: bool) {
        if show_on_screen {
            self.to_console(message);
        }

        if write_to_file {
            if let Err(e) = self.append(message) {
                warn!(error = %e, "Audit log write failed");
                self.to_console(&format!("[log write failed] {}", e));
                if !show_on_screen {
                    self.to_console(message);
                }
            }
        }
    }

    /// Record to both console and file
    pub fn info(&self, message: &str) {
        self.record(message, true, true);
    }

    fn to_console(&self, message: &str) {
        let mut console = self.console.lock().unwrap_or_else(|e| e.into_inner());
        // Nowhere left to report a broken console.
        let _ = writeln!(console, "{}", message).and_then(|_| console.flush());
    }

    fn append(&self, message: &str) -> Result<(), LogWriteError> {
        let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S%.3f");
        let wrap = |source| LogWriteError {
            path: self.path.clone(),
            source,
        };

        let mut guard = self.file.lock().unwrap_or_else(|e| e.into_inner());
        let file = guard
            .as_mut()
            .ok_or_else(|| wrap(io::Error::new(ErrorKind::NotFound, "log file was never created")))?;

        let mut buffer = String::new();
        if message.is_empty() {
            buffer.push_str(&format!("{}: \n", timestamp));
        }
        for line in message.lines() {
            buffer.push_str(&format!("{}: {}\n", timestamp, line));
        }

        file.write_all(buffer.as_bytes())
            .and_then(|_| file.flush())
            .map_err(wrap)
    }
}

/// Create `<stem>.log`, or `<stem>_<n>.log` when the name is taken
fn create_unique(dir: &Path, stem: &str) -> io::Result<(PathBuf, File)> {
    let mut last_err = None;
    for attempt in 0..MAX_NAME_ATTEMPTS {
        let name = match attempt {
            0 => format!("{}.log", stem),
            n => format!("{}_{}.log", stem, n),
        };
        let path = dir.join(name);
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => return Ok((path, file)),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => last_err = Some(e),
            Err(e) => return Err(e),
        }
    }
    Err(last_err.unwrap_or_else(|| io::Error::new(ErrorKind::AlreadyExists, "no free log file name")))
}
