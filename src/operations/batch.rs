use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::error::FtpError;
use crate::operations::{download, list};
use crate::session::FtpSession;
use crate::transport::FtpTransport;
use crate::types::BatchResult;

/// Downloads the files of a remote directory into the local download directory
///
/// Entries are processed in listing order. Directories, other entries and the
/// `.`/`..` entries are skipped. A failed file is counted and logged and the
/// batch moves on to the next one.
///
/// # Arguments
///
/// * `session` - The FTP session
/// * `remote_dir` - Remote directory to download from
/// * `limit` - Maximum number of successful downloads; `None` or `Some(0)` means no cap
/// * `cancel_token` - Token for stopping the batch between or during files
///
/// # Errors
///
/// Only a failure to list `remote_dir` is returned as an error; no partial
/// counts are reported in that case.
pub async fn get_all<T: FtpTransport>(
    session: &mut FtpSession<T>,
    remote_dir: &str,
    limit: Option<usize>,
    cancel_token: &CancellationToken,
) -> Result<BatchResult, FtpError> {
    let (current_dir, entries) = list::ls_in(session, remote_dir, cancel_token)
        .await
        .inspect_err(|err| error!("Could not obtain dir entries: {}", err.report()))?;

    let limit = limit.filter(|&limit| limit > 0);
    info!("The download limit is {:?}", limit);

    let batch_time = Instant::now();
    let mut result = BatchResult::default();
    for entry in entries {
        // Limit counts successes, failed attempts do not use it up
        if limit.is_some_and(|limit| result.success_count + 1 > limit) {
            info!("Download limit reached after {} file(s)", result.success_count);
            break;
        }
        if cancel_token.is_cancelled() {
            info!("Batch download cancelled by user");
            result.cancelled = true;
            break;
        }
        if !entry.is_file() || entry.name == "." || entry.name == ".." {
            continue;
        }

        info!("Downloading {:?}", entry.name);
        match download::get(session, &current_dir, &entry.name, cancel_token).await {
            Ok(_) => result.success_count += 1,
            Err(FtpError::Cancelled { .. }) => {
                info!("Batch download cancelled during {:?}", entry.name);
                result.cancelled = true;
                break;
            }
            Err(err) => {
                result.fail_count += 1;
                warn!("Download of {:?} failed: {}", entry.name, err.report());
            }
        }
    }

    info!(
        "Batch download of {:?} finished: {} succeeded, {} failed in {:?}",
        current_dir,
        result.success_count,
        result.fail_count,
        batch_time.elapsed()
    );
    Ok(result)
}
