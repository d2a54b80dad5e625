use std::io;
use std::path::Path;
use std::time::Instant;
use tokio::fs;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::error::FtpError;
use crate::session::FtpSession;
use crate::transport::FtpTransport;
use crate::types::TransferReport;
use crate::utils::{guarded, remote_join};

/// Uploads a local file into a remote directory
///
/// The remote path is `remote_dir` joined with `remote_name`, or with the
/// local file's base name when no name is given. The local file is opened
/// before anything is sent, so a missing file never reaches the server.
///
/// # Arguments
///
/// * `session` - The FTP session
/// * `local_path` - Path to the local file to upload
/// * `remote_dir` - Destination directory on the server
/// * `remote_name` - Optional remote file name override
/// * `cancel_token` - Token for cancelling the upload operation
///
/// # Errors
///
/// Returns an error if:
/// - The session has no live connection
/// - The local file cannot be opened (`FtpError::LocalIo`)
/// - The server rejects the store or the stream fails (`FtpError::Transfer`)
pub async fn put<T: FtpTransport>(
    session: &mut FtpSession<T>,
    local_path: &Path,
    remote_dir: &str,
    remote_name: Option<&str>,
    cancel_token: &CancellationToken,
) -> Result<TransferReport, FtpError> {
    let (conn, config) = session.parts()?;

    let name = match remote_name {
        Some(name) => name.to_string(),
        None => local_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or_else(|| FtpError::LocalIo {
                path: local_path.to_path_buf(),
                source: io::Error::new(io::ErrorKind::InvalidInput, "path has no file name"),
            })?,
    };
    let remote_path = remote_join(remote_dir, &name);

    let local_file = fs::File::open(local_path)
        .await
        .map_err(|source| FtpError::LocalIo {
            path: local_path.to_path_buf(),
            source,
        })
        .inspect_err(|err| error!("Unable to open file for upload: {}", err.report()))?;
    info!("Uploading {:?} to {:?}", local_path, remote_path);

    let upload_time = Instant::now();
    let src_file = local_path.display().to_string();
    // The file handle moves into the store call and is dropped on every path
    let file_size = guarded("upload", cancel_token, config.timeout, async {
        conn.store(&remote_path, local_file)
            .await
            .map_err(|err| FtpError::Transfer {
                src: src_file.clone(),
                dest: remote_path.clone(),
                source: err.into(),
            })
    })
    .await?;

    info!(
        "Upload of {:?} to {:?} completed: {} bytes in {:?}",
        local_path,
        remote_path,
        file_size,
        upload_time.elapsed()
    );
    Ok(TransferReport {
        src_file,
        dest_file: remote_path,
        file_size,
    })
}
