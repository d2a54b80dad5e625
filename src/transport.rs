use anyhow::{Context, anyhow};
use std::future::Future;
use std::io;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard};
use std::task::{Context as TaskContext, Poll};
use suppaftp::FtpStream;
use suppaftp::types::FileType;
use tokio::io::{AsyncRead, DuplexStream, ReadBuf};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio_util::io::SyncIoBridge;
use tracing::debug;

/// The FTP protocol operations a session relies on.
///
/// The session never speaks FTP itself; it drives an implementation of this
/// trait. Calls on one transport are issued strictly one after another.
pub trait FtpTransport: Send + Sized {
    /// Data stream returned by `retrieve`
    type Download: AsyncRead + Unpin + Send;

    /// Opens the control connection to `address` (`host:port`)
    fn connect(address: &str) -> impl Future<Output = anyhow::Result<Self>> + Send;

    fn login(
        &mut self,
        username: &str,
        password: &str,
    ) -> impl Future<Output = anyhow::Result<()>> + Send;

    /// `CWD`
    fn change_dir(&mut self, path: &str) -> impl Future<Output = anyhow::Result<()>> + Send;

    /// `PWD`
    fn current_dir(&mut self) -> impl Future<Output = anyhow::Result<String>> + Send;

    /// `LIST` of the current directory, one raw line per entry
    fn list(&mut self) -> impl Future<Output = anyhow::Result<Vec<String>>> + Send;

    /// `RETR`: opens the data stream for `path`
    fn retrieve(
        &mut self,
        path: &str,
    ) -> impl Future<Output = anyhow::Result<Self::Download>> + Send;

    /// Closes a fully read data stream and checks the server's closing reply
    fn finish_retrieve(
        &mut self,
        download: Self::Download,
    ) -> impl Future<Output = anyhow::Result<()>> + Send;

    /// `STOR`: streams `reader` to `path`, returning the number of bytes sent
    fn store<R>(
        &mut self,
        path: &str,
        reader: R,
    ) -> impl Future<Output = anyhow::Result<u64>> + Send
    where
        R: AsyncRead + Unpin + Send + 'static;

    /// `QUIT`
    fn quit(&mut self) -> impl Future<Output = anyhow::Result<()>> + Send;
}

/// Capacity of the pipe between the blocking data connection and the reader
const PIPE_SIZE: usize = 65_536;

/// `FtpTransport` backed by the blocking `suppaftp` client.
///
/// Every call runs on tokio's blocking pool and holds the control connection
/// lock for its whole duration, including the data pump of a download.
pub struct SuppaFtpTransport {
    stream: Arc<Mutex<FtpStream>>,
}

impl SuppaFtpTransport {
    /// Wraps an already connected `suppaftp` stream
    pub fn new(stream: FtpStream) -> Self {
        Self {
            stream: Arc::new(Mutex::new(stream)),
        }
    }

    async fn blocking<T, F>(&self, call: F) -> anyhow::Result<T>
    where
        F: FnOnce(&mut FtpStream) -> suppaftp::FtpResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let stream = Arc::clone(&self.stream);
        tokio::task::spawn_blocking(move || {
            let mut ftp = lock(&stream)?;
            call(&mut ftp).map_err(anyhow::Error::from)
        })
        .await?
    }
}

fn lock(stream: &Mutex<FtpStream>) -> anyhow::Result<MutexGuard<'_, FtpStream>> {
    stream
        .lock()
        .map_err(|_| anyhow!("ftp control connection lock poisoned"))
}

/// Data stream of an in-flight `RETR` on a `SuppaFtpTransport`
#[derive(Debug)]
pub struct SuppaDownload {
    reader: DuplexStream,
    pump: JoinHandle<anyhow::Result<()>>,
}

impl AsyncRead for SuppaDownload {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut TaskContext<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().reader).poll_read(cx, buf)
    }
}

impl FtpTransport for SuppaFtpTransport {
    type Download = SuppaDownload;

    async fn connect(address: &str) -> anyhow::Result<Self> {
        let address = address.to_string();
        let stream = tokio::task::spawn_blocking(move || FtpStream::connect(address.as_str()))
            .await??;
        Ok(Self::new(stream))
    }

    async fn login(&mut self, username: &str, password: &str) -> anyhow::Result<()> {
        let (username, password) = (username.to_string(), password.to_string());
        self.blocking(move |ftp| {
            ftp.login(username.as_str(), password.as_str())?;
            ftp.transfer_type(FileType::Binary)
        })
        .await
    }

    async fn change_dir(&mut self, path: &str) -> anyhow::Result<()> {
        let path = path.to_string();
        self.blocking(move |ftp| ftp.cwd(path.as_str())).await
    }

    async fn current_dir(&mut self) -> anyhow::Result<String> {
        self.blocking(|ftp| ftp.pwd()).await
    }

    async fn list(&mut self) -> anyhow::Result<Vec<String>> {
        self.blocking(|ftp| ftp.list(None)).await
    }

    async fn retrieve(&mut self, path: &str) -> anyhow::Result<SuppaDownload> {
        let (reader, writer) = tokio::io::duplex(PIPE_SIZE);
        let mut sink = SyncIoBridge::new(writer);
        let (started_tx, started_rx) = oneshot::channel::<suppaftp::FtpResult<()>>();
        let stream = Arc::clone(&self.stream);
        let remote_path = path.to_string();

        let pump = tokio::task::spawn_blocking(move || -> anyhow::Result<()> {
            let mut ftp = lock(&stream)?;
            let mut data = match ftp.retr_as_stream(remote_path.as_str()) {
                Ok(data) => data,
                Err(err) => {
                    let _ = started_tx.send(Err(err));
                    return Ok(());
                }
            };
            let _ = started_tx.send(Ok(()));

            let copied = io::copy(&mut data, &mut sink);
            // EOF for the reader side
            drop(sink);
            let finalized = ftp.finalize_retr_stream(data);
            let bytes = copied.context("data connection failed mid-transfer")?;
            finalized.context("server did not confirm the transfer")?;
            debug!("Pumped {} bytes of {:?}", bytes, remote_path);
            Ok(())
        });

        match started_rx.await {
            Ok(Ok(())) => Ok(SuppaDownload { reader, pump }),
            Ok(Err(err)) => Err(err.into()),
            Err(_) => match pump.await? {
                Err(err) => Err(err),
                Ok(()) => Err(anyhow!(
                    "retrieve of {:?} ended before the data connection opened",
                    path
                )),
            },
        }
    }

    async fn finish_retrieve(&mut self, download: SuppaDownload) -> anyhow::Result<()> {
        let SuppaDownload { reader, pump } = download;
        drop(reader);
        pump.await?
    }

    async fn store<R>(&mut self, path: &str, reader: R) -> anyhow::Result<u64>
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let path = path.to_string();
        let mut source = SyncIoBridge::new(reader);
        self.blocking(move |ftp| ftp.put_file(path.as_str(), &mut source))
            .await
    }

    async fn quit(&mut self) -> anyhow::Result<()> {
        self.blocking(|ftp| ftp.quit()).await
    }
}
