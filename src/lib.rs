// Module declarations
mod client;
mod error;
mod operations;
mod session;
mod transport;
mod types;
mod utils;

// Public API exports
pub use error::{BoxError, FtpError, FtpErrorKind};
pub use session::FtpSession;
pub use transport::{FtpTransport, SuppaDownload, SuppaFtpTransport};
pub use types::{
    BatchResult, EntryKind, FileEntry, SessionOptions, SessionState, TransferConfig,
    TransferReport,
};

// Re-export commonly used external types for convenience
pub use bytes::Bytes;
pub use tokio_util::sync::CancellationToken;
