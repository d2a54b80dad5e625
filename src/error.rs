//! Error type returned by every session operation.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Boxed root cause carried by the variants that wrap a transport failure
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors returned by `FtpSession` operations.
///
/// Each variant names what was attempted and the paths involved. The
/// underlying cause stays reachable through `std::error::Error::source`.
#[derive(Debug, Error)]
pub enum FtpError {
    #[error("ftp session is not initialized, connect with FtpSession::connect first")]
    NotInitialized,

    #[error("unable to connect to ftp server {address}")]
    Connection {
        address: String,
        #[source]
        source: BoxError,
    },

    #[error("ftp server {address} did not acknowledge QUIT")]
    Disconnect {
        address: String,
        #[source]
        source: BoxError,
    },

    #[error("login rejected for user {username:?}")]
    Authentication {
        username: String,
        #[source]
        source: BoxError,
    },

    #[error("unable to change current dir to {requested:?}")]
    Navigation {
        requested: String,
        #[source]
        source: BoxError,
    },

    #[error("unable to list files in {dir:?}")]
    Listing {
        dir: String,
        #[source]
        source: BoxError,
    },

    #[error("transfer from {src:?} to {dest:?} failed")]
    Transfer {
        src: String,
        dest: String,
        #[source]
        source: BoxError,
    },

    #[error("local file operation on {path:?} failed")]
    LocalIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{operation} timed out after {after:?}")]
    Timeout { operation: String, after: Duration },

    #[error("{operation} was cancelled")]
    Cancelled { operation: String },
}

/// Coarse classification of an `FtpError`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FtpErrorKind {
    NotInitialized,
    /// TCP / DNS failure while opening the control connection
    Connection,
    /// `QUIT` failed; the session is closed regardless
    Disconnect,
    /// Wrong username/password
    Authentication,
    Navigation,
    Listing,
    /// Retrieve or store rejected, or the data stream failed mid-transfer
    Transfer,
    /// Local file open/read/write failure
    LocalIo,
    Timeout,
    Cancelled,
}

impl FtpError {
    pub fn kind(&self) -> FtpErrorKind {
        match self {
            FtpError::NotInitialized => FtpErrorKind::NotInitialized,
            FtpError::Connection { .. } => FtpErrorKind::Connection,
            FtpError::Disconnect { .. } => FtpErrorKind::Disconnect,
            FtpError::Authentication { .. } => FtpErrorKind::Authentication,
            FtpError::Navigation { .. } => FtpErrorKind::Navigation,
            FtpError::Listing { .. } => FtpErrorKind::Listing,
            FtpError::Transfer { .. } => FtpErrorKind::Transfer,
            FtpError::LocalIo { .. } => FtpErrorKind::LocalIo,
            FtpError::Timeout { .. } => FtpErrorKind::Timeout,
            FtpError::Cancelled { .. } => FtpErrorKind::Cancelled,
        }
    }

    /// Whether retrying the same call later (with backoff) may succeed
    pub fn is_transient(&self) -> bool {
        matches!(self.kind(), FtpErrorKind::Connection | FtpErrorKind::Timeout)
    }

    /// Renders the error followed by its chain of causes, `outer: inner: root`
    pub fn report(&self) -> String {
        let mut rendered = self.to_string();
        let mut source = std::error::Error::source(self);
        while let Some(cause) = source {
            rendered.push_str(": ");
            rendered.push_str(&cause.to_string());
            source = cause.source();
        }
        rendered
    }
}
