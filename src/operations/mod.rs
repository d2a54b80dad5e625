/// Module for downloading bulk contents of a remote directory
pub(crate) mod batch;

/// Module for downloading files from remote server
pub(crate) mod download;

/// Module for listing remote directory contents
pub(crate) mod list;

/// Module for changing the remote working directory
pub(crate) mod navigate;

/// Module for uploading files to remote server
pub(crate) mod upload;
