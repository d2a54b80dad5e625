use anyhow::Context;
use bytes::Bytes;
use std::io;
use std::path::Path;
use std::time::Instant;
use tokio::fs;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::error::FtpError;
use crate::session::FtpSession;
use crate::transport::FtpTransport;
use crate::types::TransferReport;
use crate::utils::{guarded, read_to_bytes, remote_join};

const BUFFER_DEST: &str = "<memory>";

/// Downloads a remote file into memory
///
/// The data stream is finished (and the server's closing reply checked) after
/// a complete read. On a read error, timeout or cancellation the stream is
/// dropped instead, which releases it in the transport.
///
/// # Errors
///
/// Returns an error if:
/// - The session has no live connection
/// - The retrieve cannot be initiated
/// - The stream fails before its end, or the server reports a failed transfer
pub async fn get_bytes<T: FtpTransport>(
    session: &mut FtpSession<T>,
    remote_path: &str,
    cancel_token: &CancellationToken,
) -> Result<Bytes, FtpError> {
    let (conn, config) = session.parts()?;
    let transfer_error = |err: anyhow::Error| FtpError::Transfer {
        src: remote_path.to_string(),
        dest: BUFFER_DEST.to_string(),
        source: err.into(),
    };

    info!("Downloading {:?} to buffer", remote_path);
    let download_time = Instant::now();
    let mut stream = guarded("retrieve", cancel_token, config.timeout, async {
        conn.retrieve(remote_path)
            .await
            .context("error downloading file from server")
            .map_err(transfer_error)
    })
    .await?;

    let read = guarded("retrieve stream read", cancel_token, config.timeout, async {
        read_to_bytes(&mut stream, config.io_size)
            .await
            .context("error reading file from server")
            .map_err(transfer_error)
    })
    .await;

    let data = match read {
        Ok(data) => data,
        Err(err) => {
            warn!("Dropping data stream of {:?}: {}", remote_path, err.report());
            drop(stream);
            return Err(err);
        }
    };

    guarded("retrieve finish", cancel_token, config.timeout, async {
        conn.finish_retrieve(stream).await.map_err(transfer_error)
    })
    .await?;

    info!(
        "{} bytes read from {:?} in {:?}",
        data.len(),
        remote_path,
        download_time.elapsed()
    );
    Ok(data)
}

/// Downloads `remote_dir/dest_name` and writes it into the local download directory
///
/// Only the final component of `dest_name` is used for the local file, so a
/// remote name cannot point outside `TransferConfig::local_dir`.
///
/// # Errors
///
/// Returns any error of `get_bytes`, or `FtpError::LocalIo` if the local
/// file cannot be written.
pub async fn get<T: FtpTransport>(
    session: &mut FtpSession<T>,
    remote_dir: &str,
    dest_name: &str,
    cancel_token: &CancellationToken,
) -> Result<TransferReport, FtpError> {
    session.parts()?;
    let local_name = Path::new(dest_name)
        .file_name()
        .ok_or_else(|| FtpError::LocalIo {
            path: dest_name.into(),
            source: io::Error::new(io::ErrorKind::InvalidInput, "no file name to write to"),
        })?;
    let local_path = session.config.local_dir.join(local_name);
    let remote_path = remote_join(remote_dir, dest_name);

    let data = get_bytes(session, &remote_path, cancel_token).await?;

    fs::write(&local_path, &data)
        .await
        .map_err(|source| FtpError::LocalIo {
            path: local_path.clone(),
            source,
        })?;
    info!("File {:?} written to {:?}", remote_path, local_path);

    Ok(TransferReport {
        src_file: remote_path,
        dest_file: local_path.display().to_string(),
        file_size: data.len() as u64,
    })
}
