use std::fmt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::error::FtpError;
use crate::transport::{FtpTransport, SuppaFtpTransport};
use crate::types::{SessionOptions, SessionState, TransferConfig};
use crate::utils::guarded;

/// Logs a connection stage at `info` when the session is verbose, `debug` otherwise
macro_rules! stage {
    ($verbose:expr, $($arg:tt)+) => {
        if $verbose {
            info!($($arg)+);
        } else {
            debug!($($arg)+);
        }
    };
}

/// An authenticated FTP session owning a single control connection.
///
/// A `Default` session is `Uninitialized`: every data operation on it fails
/// with `FtpError::NotInitialized` without touching the network. The
/// connection is closed only by `quit`; dropping the session drops the TCP
/// connection without a `QUIT`.
pub struct FtpSession<T: FtpTransport = SuppaFtpTransport> {
    pub(crate) conn: Option<T>,
    pub(crate) state: SessionState,
    pub(crate) address: String,
    pub(crate) config: TransferConfig,
}

impl<T: FtpTransport> Default for FtpSession<T> {
    fn default() -> Self {
        Self {
            conn: None,
            state: SessionState::Uninitialized,
            address: String::new(),
            config: TransferConfig::default(),
        }
    }
}

impl<T: FtpTransport> fmt::Debug for FtpSession<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FtpSession")
            .field("address", &self.address)
            .field("state", &self.state)
            .field("config", &self.config)
            .finish()
    }
}

impl<T: FtpTransport> FtpSession<T> {
    /// Connects to the server and logs in
    ///
    /// # Arguments
    ///
    /// * `options` - Server address and credentials
    /// * `config` - Transfer settings (buffer size, download directory, deadline)
    /// * `cancel_token` - Token for cancelling the connection attempt
    ///
    /// # Errors
    ///
    /// Returns `FtpError::Connection` if the control connection cannot be
    /// opened and `FtpError::Authentication` if the server rejects the login.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let options = SessionOptions::new("ftp.example.com", 21, "user", "secret", false);
    /// let mut session = FtpSession::<SuppaFtpTransport>::connect(
    ///     &options,
    ///     TransferConfig::default(),
    ///     CancellationToken::new(),
    /// ).await?;
    /// ```
    pub async fn connect(
        options: &SessionOptions,
        config: TransferConfig,
        cancel_token: CancellationToken,
    ) -> Result<Self, FtpError> {
        let address = options.address();
        stage!(options.verbose, "Attempting ftp connection with {:?}", options);

        let transport = guarded("connect", &cancel_token, config.timeout, async {
            T::connect(&address)
                .await
                .map_err(|err| FtpError::Connection {
                    address: address.clone(),
                    source: err.into(),
                })
        })
        .await
        .inspect_err(|err| error!("Error connecting to FTP server: {}", err.report()))?;
        stage!(
            options.verbose,
            "FTP basic connection established to {}, login still required",
            address
        );

        Self::with_transport(transport, options, config, cancel_token).await
    }

    /// Logs in on a transport that is already connected
    ///
    /// Used for custom transports; `connect` ends up here as well.
    pub async fn with_transport(
        mut transport: T,
        options: &SessionOptions,
        config: TransferConfig,
        cancel_token: CancellationToken,
    ) -> Result<Self, FtpError> {
        let address = options.address();
        stage!(options.verbose, "Attempting to login as {:?}", options.username);

        guarded("login", &cancel_token, config.timeout, async {
            transport
                .login(&options.username, &options.password)
                .await
                .map_err(|err| FtpError::Authentication {
                    username: options.username.clone(),
                    source: err.into(),
                })
        })
        .await
        .inspect_err(|err| error!("Error logging in to FTP server: {}", err.report()))?;
        stage!(options.verbose, "Logged in to {} as {:?}", address, options.username);

        Ok(Self {
            conn: Some(transport),
            state: SessionState::Authenticated,
            address,
            config,
        })
    }

    /// Sends `QUIT` and closes the session
    ///
    /// The session is `Closed` afterwards even if the server did not answer.
    ///
    /// # Errors
    ///
    /// Returns `FtpError::NotInitialized` when there is no live connection,
    /// including on a second call. A failed `QUIT` is `FtpError::Disconnect`;
    /// there is nothing left to retry on the closed session.
    pub async fn quit(&mut self, cancel_token: CancellationToken) -> Result<(), FtpError> {
        let Some(mut conn) = self.conn.take() else {
            error!("Quit called on a session without a live connection");
            return Err(FtpError::NotInitialized);
        };
        self.state = SessionState::Closed;
        let address = self.address.clone();

        guarded("quit", &cancel_token, self.config.timeout, async {
            conn.quit().await.map_err(|err| FtpError::Disconnect {
                address: address.clone(),
                source: err.into(),
            })
        })
        .await?;
        info!("FTP session to {} closed", address);
        Ok(())
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.conn.is_some()
    }

    /// `host:port` of the server, empty before a successful connect
    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn config(&self) -> &TransferConfig {
        &self.config
    }

    /// The live connection and transfer config, or `NotInitialized`
    pub(crate) fn parts(&mut self) -> Result<(&mut T, &TransferConfig), FtpError> {
        match self.conn.as_mut() {
            Some(conn) => Ok((conn, &self.config)),
            None => Err(FtpError::NotInitialized),
        }
    }
}
