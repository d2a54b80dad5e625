use bytes::Bytes;
use std::path::Path;
use tokio_util::sync::CancellationToken;

use crate::error::FtpError;
use crate::operations::{batch, download, list, navigate, upload};
use crate::session::FtpSession;
use crate::transport::FtpTransport;
use crate::types::{BatchResult, FileEntry, TransferReport};

impl<T: FtpTransport> FtpSession<T> {
    /// Changes the remote working directory
    ///
    /// # Arguments
    ///
    /// * `path` - Absolute or relative remote path
    /// * `cancel_token` - Token for cancelling the operation
    ///
    /// # Returns
    ///
    /// Returns the server's canonical path for the new working directory
    ///
    /// # Example
    ///
    /// ```ignore
    /// let cwd = session.change_dir("pub/../incoming", CancellationToken::new()).await?;
    /// assert_eq!(cwd, "/incoming");
    /// ```
    pub async fn change_dir(
        &mut self,
        path: &str,
        cancel_token: CancellationToken,
    ) -> Result<String, FtpError> {
        navigate::change_dir(self, path, &cancel_token).await
    }

    /// Lists the contents of a remote directory
    ///
    /// The directory becomes the session's working directory.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let files = session.list_files("/pub", CancellationToken::new()).await?;
    /// for file in files {
    ///     println!("{:?} {}: {} bytes", file.kind, file.name, file.size);
    /// }
    /// ```
    pub async fn list_files(
        &mut self,
        remote_dir: &str,
        cancel_token: CancellationToken,
    ) -> Result<Vec<FileEntry>, FtpError> {
        list::ls(self, remote_dir, &cancel_token).await
    }

    /// Uploads a local file into a remote directory
    ///
    /// # Arguments
    ///
    /// * `local_path` - Path to the local file
    /// * `remote_dir` - Destination directory on the server
    /// * `remote_name` - Remote file name, defaults to the local file name
    /// * `cancel_token` - Token for cancelling the upload
    ///
    /// # Example
    ///
    /// ```ignore
    /// let report = session.upload(
    ///     Path::new("/local/report.pdf"),
    ///     "/incoming",
    ///     Some("report-2024.pdf"),
    ///     CancellationToken::new(),
    /// ).await?;
    /// ```
    pub async fn upload(
        &mut self,
        local_path: impl AsRef<Path>,
        remote_dir: &str,
        remote_name: Option<&str>,
        cancel_token: CancellationToken,
    ) -> Result<TransferReport, FtpError> {
        upload::put(self, local_path.as_ref(), remote_dir, remote_name, &cancel_token).await
    }

    /// Downloads a remote file, given by its full path, into memory
    pub async fn download_to_buffer(
        &mut self,
        remote_path: &str,
        cancel_token: CancellationToken,
    ) -> Result<Bytes, FtpError> {
        download::get_bytes(self, remote_path, &cancel_token).await
    }

    /// Downloads `remote_dir/dest_name` into the configured local directory
    ///
    /// # Example
    ///
    /// ```ignore
    /// let report = session.download("/pub", "config.json", CancellationToken::new()).await?;
    /// println!("{} bytes written to {}", report.file_size, report.dest_file);
    /// ```
    pub async fn download(
        &mut self,
        remote_dir: &str,
        dest_name: &str,
        cancel_token: CancellationToken,
    ) -> Result<TransferReport, FtpError> {
        download::get(self, remote_dir, dest_name, &cancel_token).await
    }

    /// Downloads every file of a remote directory, continuing past failed files
    ///
    /// # Arguments
    ///
    /// * `remote_dir` - Remote directory to download from
    /// * `limit` - Maximum number of successful downloads, `None` or `Some(0)` for all
    /// * `cancel_token` - Token for stopping the batch
    ///
    /// # Returns
    ///
    /// Returns the success and failure counts. Per-file failures never turn
    /// into an error; only a failed listing does.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let result = session.download_all("/pub", Some(10), CancellationToken::new()).await?;
    /// println!("{} ok, {} failed", result.success_count, result.fail_count);
    /// ```
    pub async fn download_all(
        &mut self,
        remote_dir: &str,
        limit: Option<usize>,
        cancel_token: CancellationToken,
    ) -> Result<BatchResult, FtpError> {
        batch::get_all(self, remote_dir, limit, &cancel_token).await
    }
}
