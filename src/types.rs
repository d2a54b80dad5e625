use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::debug;

/// Connection and login parameters for an FTP session
#[derive(Clone, Serialize, Deserialize)]
pub struct SessionOptions {
    /// Hostname or IP address of the FTP server
    pub host: String,
    /// Control connection port, usually 21
    pub port: u16,
    pub username: String,
    pub password: String,
    /// Log every connection stage at `info` level instead of `debug`
    pub verbose: bool,
}

impl SessionOptions {
    /// Creates a new set of options, every field supplied by the caller
    pub fn new(
        host: impl Into<String>,
        port: u16,
        username: impl Into<String>,
        password: impl Into<String>,
        verbose: bool,
    ) -> Self {
        Self {
            host: host.into(),
            port,
            username: username.into(),
            password: password.into(),
            verbose,
        }
    }

    /// Socket address of the control connection, e.g. `ftp.example.com:21`
    pub fn address(&self) -> String {
        if self.host.contains(':') && !self.host.starts_with('[') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }
}

impl fmt::Debug for SessionOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionOptions")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("verbose", &self.verbose)
            .finish()
    }
}

/// Configuration for transfers performed on a session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferConfig {
    /// Buffer size for stream reads in bytes
    pub io_size: usize,
    /// Local directory downloads are written into
    pub local_dir: PathBuf,
    /// Deadline applied to each blocking transport call
    pub timeout: Option<Duration>,
}

impl Default for TransferConfig {
    /// - io_size: 65536 (64KB)
    /// - local_dir: the current working directory
    /// - timeout: none
    fn default() -> Self {
        Self {
            io_size: 65_536,
            local_dir: PathBuf::from("."),
            timeout: None,
        }
    }
}

impl TransferConfig {
    /// Creates a new configuration with custom values
    pub fn new(io_size: usize, local_dir: impl Into<PathBuf>, timeout: Option<Duration>) -> Self {
        Self {
            io_size,
            local_dir: local_dir.into(),
            timeout,
        }
    }
}

/// Lifecycle state of an `FtpSession`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    /// No connection has been established yet
    Uninitialized,
    /// Connected and logged in
    Authenticated,
    /// `quit` has been called
    Closed,
}

/// Kind of a remote directory entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryKind {
    File,
    Directory,
    /// Symlinks and anything the listing parser could not classify
    Other,
}

/// One entry of a remote directory listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    pub name: String,
    pub size: u64,
    pub kind: EntryKind,
}

impl FileEntry {
    /// Classifies a single raw `LIST` line (UNIX or DOS format).
    ///
    /// Lines the parser does not understand become `EntryKind::Other` entries
    /// named after the trimmed line, so one odd line never fails a listing.
    pub fn from_list_line(line: &str) -> Self {
        match suppaftp::list::File::from_str(line) {
            Ok(file) => {
                let kind = if file.is_directory() {
                    EntryKind::Directory
                } else if file.is_file() {
                    EntryKind::File
                } else {
                    EntryKind::Other
                };
                Self {
                    name: file.name().to_string(),
                    size: file.size() as u64,
                    kind,
                }
            }
            Err(err) => {
                debug!("Unrecognised listing line {:?}: {}", line, err);
                Self {
                    name: line.trim().to_string(),
                    size: 0,
                    kind: EntryKind::Other,
                }
            }
        }
    }

    pub fn is_file(&self) -> bool {
        self.kind == EntryKind::File
    }
}

/// Result of a completed single file transfer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferReport {
    /// Source file path
    pub src_file: String,
    /// Destination file path
    pub dest_file: String,
    /// Number of bytes transferred
    pub file_size: u64,
}

/// Aggregate outcome of a batch download
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchResult {
    pub success_count: usize,
    pub fail_count: usize,
    /// The batch stopped early because its cancellation token fired
    pub cancelled: bool,
}
