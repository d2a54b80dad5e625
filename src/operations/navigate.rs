use anyhow::Context;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::FtpError;
use crate::session::FtpSession;
use crate::transport::FtpTransport;
use crate::utils::guarded;

/// Changes the remote working directory and returns the server's canonical path
///
/// The server is asked for its current directory after the change because it
/// may normalize, or silently accept, the requested path.
///
/// # Errors
///
/// Returns `FtpError::NotInitialized` without a live connection and
/// `FtpError::Navigation` if either `CWD` or `PWD` fails.
pub async fn change_dir<T: FtpTransport>(
    session: &mut FtpSession<T>,
    path: &str,
    cancel_token: &CancellationToken,
) -> Result<String, FtpError> {
    let (conn, config) = session.parts()?;
    let navigation_error = |err: anyhow::Error| FtpError::Navigation {
        requested: path.to_string(),
        source: err.into(),
    };

    let current = guarded("change directory", cancel_token, config.timeout, async {
        conn.change_dir(path)
            .await
            .context("server rejected the directory change")
            .map_err(navigation_error)?;
        conn.current_dir()
            .await
            .context("unable to obtain server's current directory after changing directory")
            .map_err(navigation_error)
    })
    .await?;

    debug!("Remote working directory is now {:?}", current);
    Ok(current)
}
