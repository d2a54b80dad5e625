use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::error::FtpError;
use crate::operations::navigate;
use crate::session::FtpSession;
use crate::transport::FtpTransport;
use crate::types::FileEntry;
use crate::utils::guarded;

/// Lists the contents of a remote directory
///
/// # Arguments
///
/// * `session` - The FTP session
/// * `remote_dir` - Path to the remote directory, becomes the working directory
/// * `cancel_token` - Token for cancelling the operation
///
/// # Returns
///
/// Returns every entry in the server's listing order, directories and
/// unclassifiable entries included.
///
/// # Errors
///
/// Returns an error if:
/// - The session has no live connection
/// - The directory change fails (propagated unchanged)
/// - The `LIST` command fails
pub async fn ls<T: FtpTransport>(
    session: &mut FtpSession<T>,
    remote_dir: &str,
    cancel_token: &CancellationToken,
) -> Result<Vec<FileEntry>, FtpError> {
    let (_, entries) = ls_in(session, remote_dir, cancel_token).await?;
    Ok(entries)
}

/// Like `ls`, also returning the canonical directory the entries belong to
pub(crate) async fn ls_in<T: FtpTransport>(
    session: &mut FtpSession<T>,
    remote_dir: &str,
    cancel_token: &CancellationToken,
) -> Result<(String, Vec<FileEntry>), FtpError> {
    let current = navigate::change_dir(session, remote_dir, cancel_token)
        .await
        .inspect_err(|err| error!("Unable to change current dir: {}", err.report()))?;
    info!("Current path: {:?}", current);

    let (conn, config) = session.parts()?;
    let lines = guarded("list", cancel_token, config.timeout, async {
        conn.list().await.map_err(|err| FtpError::Listing {
            dir: current.clone(),
            source: err.into(),
        })
    })
    .await?;
    info!("{} item(s) found at {:?}", lines.len(), current);

    let entries = lines
        .iter()
        .map(|line| FileEntry::from_list_line(line))
        .collect();
    Ok((current, entries))
}
