#![allow(dead_code)]

use anyhow::{anyhow, bail};
use rusty_ftp::{
    CancellationToken, FtpSession, FtpTransport, SessionOptions, TransferConfig,
};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::io::{self, Cursor};
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard};
use std::task::{Context, Poll};
use std::time::Duration;
use tempfile::TempDir;
use tokio::io::{AsyncRead, AsyncReadExt, ReadBuf};

pub const USERNAME: &str = "alice";
pub const PASSWORD: &str = "wonderland";

/// In-memory FTP server state shared by a `MockTransport` and the test
#[derive(Debug, Default)]
pub struct ServerState {
    /// Canonical directory -> raw LIST lines
    pub dirs: BTreeMap<String, Vec<String>>,
    /// Full remote path -> content
    pub files: HashMap<String, Vec<u8>>,
    pub cwd: String,
    /// Every transport call in order, e.g. `RETR /pub/a.txt`
    pub calls: Vec<String>,
    pub reject_login: bool,
    pub fail_list: bool,
    pub fail_quit: bool,
    /// Paths whose data stream breaks after the retrieve started
    pub broken_streams: HashSet<String>,
    /// Commands that never answer, e.g. `LIST`
    pub stalled: HashSet<&'static str>,
    /// Full paths whose `RETR` never answers
    pub stalled_retrieves: HashSet<String>,
    pub released_streams: usize,
}

#[derive(Debug, Clone, Default)]
pub struct MockServer {
    inner: Arc<Mutex<ServerState>>,
}

impl MockServer {
    pub fn new() -> Self {
        let server = Self::default();
        server.state().cwd = "/".to_string();
        server.add_dir("/");
        server
    }

    pub fn state(&self) -> MutexGuard<'_, ServerState> {
        self.inner.lock().expect("mock server lock")
    }

    pub fn add_dir(&self, dir: &str) {
        self.state().dirs.entry(dir.to_string()).or_default();
    }

    /// Adds a file to `dir` and its listing
    pub fn add_file(&self, dir: &str, name: &str, content: &[u8]) {
        let mut state = self.state();
        state
            .dirs
            .entry(dir.to_string())
            .or_default()
            .push(unix_line('-', content.len(), name));
        state.files.insert(join(dir, name), content.to_vec());
    }

    /// Adds a raw listing line to `dir` without any content behind it
    pub fn add_line(&self, dir: &str, line: String) {
        self.state().dirs.entry(dir.to_string()).or_default().push(line);
    }

    pub fn calls(&self) -> Vec<String> {
        self.state().calls.clone()
    }

    pub fn count_calls(&self, prefix: &str) -> usize {
        self.state()
            .calls
            .iter()
            .filter(|call| call.starts_with(prefix))
            .count()
    }

    pub fn transport(&self) -> MockTransport {
        MockTransport {
            server: self.clone(),
        }
    }

    fn record(&self, call: String) {
        self.state().calls.push(call);
    }

    fn is_stalled(&self, command: &str) -> bool {
        self.state().stalled.contains(command)
    }
}

pub fn unix_line(kind: char, size: usize, name: &str) -> String {
    let perms = if kind == 'd' { "rwxr-xr-x" } else { "rw-r--r--" };
    format!("{}{}    1 ftp      ftp      {:>8} Jan 10 12:00 {}", kind, perms, size, name)
}

fn join(dir: &str, name: &str) -> String {
    format!("{}/{}", dir.trim_end_matches('/'), name)
}

fn normalize(cwd: &str, path: &str) -> String {
    let joined = if path.starts_with('/') {
        path.to_string()
    } else {
        join(cwd, path)
    };
    let mut parts: Vec<&str> = Vec::new();
    for part in joined.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            part => parts.push(part),
        }
    }
    format!("/{}", parts.join("/"))
}

pub struct MockTransport {
    server: MockServer,
}

pub struct MockDownload {
    data: Cursor<Vec<u8>>,
    broken: bool,
    server: MockServer,
}

impl AsyncRead for MockDownload {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        if this.broken {
            return Poll::Ready(Err(io::Error::new(
                io::ErrorKind::ConnectionReset,
                "data connection reset by peer",
            )));
        }
        Pin::new(&mut this.data).poll_read(cx, buf)
    }
}

impl Drop for MockDownload {
    fn drop(&mut self) {
        self.server.state().released_streams += 1;
    }
}

impl FtpTransport for MockTransport {
    type Download = MockDownload;

    async fn connect(address: &str) -> anyhow::Result<Self> {
        bail!("mock transport cannot dial {}", address)
    }

    async fn login(&mut self, username: &str, password: &str) -> anyhow::Result<()> {
        self.server.record(format!("USER {}", username));
        let state = self.server.state();
        if state.reject_login || username != USERNAME || password != PASSWORD {
            bail!("530 Login incorrect");
        }
        Ok(())
    }

    async fn change_dir(&mut self, path: &str) -> anyhow::Result<()> {
        self.server.record(format!("CWD {}", path));
        let mut state = self.server.state();
        let target = normalize(&state.cwd, path);
        if !state.dirs.contains_key(&target) {
            bail!("550 {}: No such file or directory", path);
        }
        state.cwd = target;
        Ok(())
    }

    async fn current_dir(&mut self) -> anyhow::Result<String> {
        self.server.record("PWD".to_string());
        Ok(self.server.state().cwd.clone())
    }

    async fn list(&mut self) -> anyhow::Result<Vec<String>> {
        self.server.record("LIST".to_string());
        if self.server.is_stalled("LIST") {
            std::future::pending::<()>().await;
        }
        let state = self.server.state();
        if state.fail_list {
            bail!("425 Can't open data connection");
        }
        Ok(state.dirs.get(&state.cwd).cloned().unwrap_or_default())
    }

    async fn retrieve(&mut self, path: &str) -> anyhow::Result<MockDownload> {
        self.server.record(format!("RETR {}", path));
        let stalled = {
            let state = self.server.state();
            state.stalled_retrieves.contains(&normalize(&state.cwd, path))
        };
        if stalled {
            std::future::pending::<()>().await;
        }
        let (content, broken) = {
            let state = self.server.state();
            let full = normalize(&state.cwd, path);
            let content = state
                .files
                .get(&full)
                .cloned()
                .ok_or_else(|| anyhow!("550 {}: No such file", path))?;
            (content, state.broken_streams.contains(&full))
        };
        Ok(MockDownload {
            data: Cursor::new(content),
            broken,
            server: self.server.clone(),
        })
    }

    async fn finish_retrieve(&mut self, download: MockDownload) -> anyhow::Result<()> {
        self.server.record("226".to_string());
        drop(download);
        Ok(())
    }

    async fn store<R>(&mut self, path: &str, mut reader: R) -> anyhow::Result<u64>
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        self.server.record(format!("STOR {}", path));
        if self.server.is_stalled("STOR") {
            std::future::pending::<()>().await;
        }
        let mut content = Vec::new();
        reader.read_to_end(&mut content).await?;
        let size = content.len() as u64;
        let mut state = self.server.state();
        let full = normalize(&state.cwd, path);
        state.files.insert(full, content);
        Ok(size)
    }

    async fn quit(&mut self) -> anyhow::Result<()> {
        self.server.record("QUIT".to_string());
        if self.server.state().fail_quit {
            bail!("connection reset before 221");
        }
        Ok(())
    }
}

pub fn options() -> SessionOptions {
    SessionOptions::new("ftp.test", 21, USERNAME, PASSWORD, true)
}

pub fn setup_temp_dir() -> TempDir {
    TempDir::new().expect("Failed to create temp directory")
}

pub fn config_in(dir: &TempDir) -> TransferConfig {
    TransferConfig::new(1024, dir.path(), Some(Duration::from_secs(5)))
}

/// A logged in session over a fresh transport to `server`
pub async fn connected(server: &MockServer, config: TransferConfig) -> FtpSession<MockTransport> {
    connected_with(server, &options(), config).await
}

pub async fn connected_with(
    server: &MockServer,
    options: &SessionOptions,
    config: TransferConfig,
) -> FtpSession<MockTransport> {
    FtpSession::with_transport(server.transport(), options, config, CancellationToken::new())
        .await
        .expect("login should succeed")
}
