use bytes::{Bytes, BytesMut};
use std::future::Future;
use std::time::Duration;
use tokio::io::{self, AsyncRead, AsyncReadExt};
use tokio_util::sync::CancellationToken;

use crate::error::FtpError;

/// Joins a remote directory and a file name with `/`, whatever the local OS.
pub(crate) fn remote_join(dir: &str, name: &str) -> String {
    if dir.is_empty() {
        return name.to_string();
    }
    format!("{}/{}", dir.trim_end_matches('/'), name)
}

/// Races a transport call against the cancellation token and the optional
/// deadline. Cancellation is checked first so an already-cancelled token
/// never starts the call.
pub(crate) async fn guarded<T, F>(
    operation: &str,
    cancel_token: &CancellationToken,
    timeout: Option<Duration>,
    call: F,
) -> Result<T, FtpError>
where
    F: Future<Output = Result<T, FtpError>>,
{
    let deadline = async {
        match timeout {
            Some(after) => tokio::time::timeout(after, call)
                .await
                .unwrap_or_else(|_| {
                    Err(FtpError::Timeout {
                        operation: operation.to_string(),
                        after,
                    })
                }),
            None => call.await,
        }
    };

    tokio::select! {
        biased;
        _ = cancel_token.cancelled() => Err(FtpError::Cancelled {
            operation: operation.to_string(),
        }),
        result = deadline => result,
    }
}

/// Reads a stream to its end in `io_size` chunks.
pub(crate) async fn read_to_bytes<R>(reader: &mut R, io_size: usize) -> io::Result<Bytes>
where
    R: AsyncRead + Unpin,
{
    let io_size = io_size.max(1);
    let mut buffer = BytesMut::with_capacity(io_size);
    loop {
        buffer.reserve(io_size);
        if reader.read_buf(&mut buffer).await? == 0 {
            break;
        }
    }
    Ok(buffer.freeze())
}
