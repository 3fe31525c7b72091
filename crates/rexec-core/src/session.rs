//! Remote session lifecycle and command execution
//!
//! A [`RemoteSession`] is one logical connection to one host. It connects
//! as soon as it is created, runs commands one at a time, and releases its
//! transport on [`close`](RemoteSession::close) or when dropped. A closed
//! session cannot be reconnected; create a new one instead.

use std::io;
use std::path::PathBuf;

use bytes::Bytes;
use chrono::{Datelike, Local, Timelike};
use tracing::{Instrument, Span};

use crate::config::SessionConfig;
use crate::error::{ConnectError, CredentialError, ExecError, PersistError, TransportError};
use crate::persist;
use crate::traits::{Connector, Transport};
use crate::types::CommandResult;

/// A connection to a single remote host
pub struct RemoteSession<T: Transport> {
    /// Identity and connection settings, fixed at construction
    config: SessionConfig,
    /// Present exactly while the session is connected
    transport: Option<T>,
    /// Why the connection attempt failed, if it did
    connect_error: Option<ConnectError>,
    /// Logging context for everything this session does
    span: Span,
}

impl<T: Transport> RemoteSession<T> {
    /// Create a session and connect it.
    ///
    /// Never fails: a failed connection attempt is logged and leaves the
    /// session disconnected. Check [`is_connected`](Self::is_connected), or
    /// use [`try_connect`](Self::try_connect) to get the error directly.
    pub async fn connect<C>(config: SessionConfig, connector: &C) -> Self
    where
        C: Connector<Transport = T>,
    {
        let span = tracing::info_span!(
            "remote_session",
            host = %config.host,
            port = config.port,
            user = %config.username,
        );
        Self::connect_in(config, connector, span).await
    }

    /// Like [`connect`](Self::connect), logging inside a caller-supplied span
    pub async fn connect_in<C>(config: SessionConfig, connector: &C, span: Span) -> Self
    where
        C: Connector<Transport = T>,
    {
        let outcome = establish(&config, connector)
            .instrument(span.clone())
            .await;

        let (transport, connect_error) = match outcome {
            Ok(transport) => (Some(transport), None),
            Err(e) => (None, Some(e)),
        };

        let session = Self {
            config,
            transport,
            connect_error,
            span,
        };

        session.span.in_scope(|| {
            if !session.is_connected() {
                tracing::error!("Connection failed!");
            }
            tracing::debug!("New session created for {}", session.config.host);
        });

        session
    }

    /// Create a session, returning the classified error if it cannot connect
    pub async fn try_connect<C>(
        config: SessionConfig,
        connector: &C,
    ) -> Result<Self, ConnectError>
    where
        C: Connector<Transport = T>,
    {
        let mut session = Self::connect(config, connector).await;
        match session.connect_error.take() {
            Some(e) => Err(e),
            None => Ok(session),
        }
    }

    /// Last known connection state. Never touches the network.
    pub fn is_connected(&self) -> bool {
        self.transport.is_some()
    }

    /// Why the initial connection attempt failed
    pub fn connect_error(&self) -> Option<&ConnectError> {
        self.connect_error.as_ref()
    }

    /// Run `command` and capture its output.
    ///
    /// Any output on standard error marks the result as failed, whatever
    /// the exit status. See [`try_execute`](Self::try_execute) for the
    /// error-typed form.
    pub async fn execute(&mut self, command: &str) -> CommandResult {
        CommandResult::from(self.try_execute(command).await)
    }

    /// Run `command`, returning standard output or the reason it failed.
    ///
    /// Standard error is drained first; standard output is only read when
    /// standard error was empty. There is no timeout: a remote command that
    /// never finishes blocks this call.
    pub async fn try_execute(&mut self, command: &str) -> Result<Bytes, ExecError> {
        let span = self.span.clone();
        let host = self.config.host.clone();

        async move {
            let Some(transport) = self.transport.as_mut() else {
                tracing::error!("Cannot execute '{}': not connected", command);
                return Err(ExecError::NotConnected);
            };

            tracing::debug!("Executing command: {}", command);
            let mut channels = transport.exec(command).await.map_err(|e| {
                tracing::error!(
                    "Executing command {} on device {} failed: {}",
                    command,
                    host,
                    e
                );
                ExecError::CommandChannel(e)
            })?;

            let stderr = channels.stderr.drain().await.map_err(read_failed)?;
            if !stderr.is_empty() {
                tracing::error!(
                    "Executing command failed. Command output: {}",
                    String::from_utf8_lossy(&stderr)
                );
                return Err(ExecError::RemoteCommand(stderr));
            }

            let stdout = channels.stdout.drain().await.map_err(read_failed)?;
            if !stdout.is_empty() {
                tracing::debug!(
                    bytes = stdout.len(),
                    "Executing command successful. Command output: {}",
                    String::from_utf8_lossy(&stdout)
                );
            }
            Ok(stdout)
        }
        .instrument(span)
        .await
    }

    /// Disconnect and release the transport.
    ///
    /// Closing a session that is not connected does nothing. The transport
    /// is released even if the disconnect itself reports an error.
    pub async fn close(&mut self) -> Result<(), TransportError> {
        let Some(mut transport) = self.transport.take() else {
            return Ok(());
        };

        let result = transport.close().instrument(self.span.clone()).await;
        drop(transport);

        let _enter = self.span.enter();
        match &result {
            Ok(()) => tracing::info!("Disconnected from {}", self.config.host),
            Err(e) => tracing::warn!("Disconnect from {} was not clean: {}", self.config.host, e),
        }
        result
    }

    /// Save `data` to this session's output file in the configured directory.
    ///
    /// Returns `false` if the file could not be written; the reason is logged.
    pub fn write_output_to_file(&self, data: impl AsRef<[u8]>) -> bool {
        self.save_output(data, &Local::now()).is_ok()
    }

    /// Save `data` under the file name for time `at`, returning the path written
    pub fn save_output<D>(&self, data: impl AsRef<[u8]>, at: &D) -> Result<PathBuf, PersistError>
    where
        D: Datelike + Timelike,
    {
        let _enter = self.span.enter();
        let file_name = persist::output_file_name(&self.config.username, &self.config.host, at);

        match persist::write_output(&self.config.output_dir, &file_name, data.as_ref()) {
            Ok(path) => {
                tracing::debug!("Command output saved to {}", path.display());
                Ok(path)
            }
            Err(e) => {
                tracing::error!("{}. Data will not be saved to file.", e);
                Err(e)
            }
        }
    }

    pub fn host(&self) -> &str {
        &self.config.host
    }

    pub fn port(&self) -> u16 {
        self.config.port
    }

    pub fn username(&self) -> &str {
        &self.config.username
    }

    /// Firmware label given at construction. Not read from the device.
    pub fn firmware(&self) -> Option<&str> {
        self.config.firmware.as_deref()
    }

    /// Description given at construction
    pub fn description(&self) -> Option<&str> {
        self.config.description.as_deref()
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// The span this session logs into
    pub fn span(&self) -> &Span {
        &self.span
    }
}

impl<T: Transport> Drop for RemoteSession<T> {
    fn drop(&mut self) {
        let _enter = self.span.enter();
        if self.transport.take().is_some() {
            tracing::debug!("Releasing transport to {}", self.config.host);
        }
        tracing::debug!("Session dropped for {}", self.config.host);
    }
}

impl<T: Transport> std::fmt::Debug for RemoteSession<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteSession")
            .field("host", &self.config.host)
            .field("port", &self.config.port)
            .field("username", &self.config.username)
            .field("connected", &self.is_connected())
            .finish()
    }
}

fn read_failed(e: io::Error) -> ExecError {
    tracing::error!("Reading command output failed: {}", e);
    ExecError::CommandChannel(TransportError::Io(e))
}

/// Reject empty credentials before anything touches the network
fn validate_credentials(config: &SessionConfig) -> Result<(), CredentialError> {
    if config.username.is_empty() {
        return Err(CredentialError::MissingUsername);
    }
    if config.password.is_empty() {
        return Err(CredentialError::MissingPassword);
    }
    Ok(())
}

/// Validate, connect and authenticate within the configured timeout
async fn establish<C: Connector>(
    config: &SessionConfig,
    connector: &C,
) -> Result<C::Transport, ConnectError> {
    tracing::info!("Connecting to device at {}", config.address());

    let outcome = match validate_credentials(config) {
        Ok(()) => tokio::time::timeout(config.connect_timeout, connector.connect(config))
            .await
            .unwrap_or_else(|_| {
                Err(ConnectError::Network(io::Error::new(
                    io::ErrorKind::TimedOut,
                    format!("connection timed out after {:?}", config.connect_timeout),
                )))
            }),
        Err(e) => Err(e.into()),
    };

    match &outcome {
        Ok(_) => tracing::info!("Connected to the device at {}", config.address()),
        Err(e) => log_connect_error(e),
    }
    outcome
}

fn log_connect_error(err: &ConnectError) {
    match err {
        ConnectError::Credential(e) => tracing::error!("{}!", e),
        ConnectError::HostKeyMismatch { .. } => tracing::error!(
            "Host key given by the SSH server did not match what we were expecting: {}",
            err
        ),
        ConnectError::UnsupportedAuthMethod(_) => tracing::error!(
            "Bad authentication type, the server does not accept passwords: {}",
            err
        ),
        ConnectError::AuthenticationFailed { .. } => {
            tracing::error!("Unable to authenticate. Wrong username/password.")
        }
        ConnectError::Transport(_) => {
            tracing::error!("SSH error while establishing connection: {}", err)
        }
        ConnectError::Network(e) => tracing::error!("Socket error happened. Error: {}", e),
    }
}
