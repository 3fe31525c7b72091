//! SSH connector and transport
//!
//! Opens a password-authenticated SSH connection with `russh` and runs each
//! command on its own session channel.

use std::io;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::BytesMut;
use russh::client::{self, Config, Handle, Msg};
use russh::{Channel, ChannelMsg, Disconnect};
use russh_keys::key::PublicKey;

use rexec_core::error::{ConnectError, TransportError};
use rexec_core::{CommandChannels, Connector, Drain, HostKeyPolicy, SessionConfig, Transport};

use crate::known_hosts::{verify_host_key, HostKeyCheck, KnownHosts};

/// SSH extended data type code for standard error
const SSH_EXTENDED_DATA_STDERR: u32 = 1;

/// Opens authenticated SSH transports
///
/// Sessions created from the same connector share one [`KnownHosts`] store.
pub struct SshConnector {
    ssh_config: Arc<Config>,
    known_hosts: Arc<KnownHosts>,
}

impl Default for SshConnector {
    fn default() -> Self {
        Self::new()
    }
}

impl SshConnector {
    pub fn new() -> Self {
        Self::with_known_hosts(Arc::new(KnownHosts::new()))
    }

    /// Create a connector that trusts keys from an existing store
    pub fn with_known_hosts(known_hosts: Arc<KnownHosts>) -> Self {
        Self {
            ssh_config: Arc::new(Config::default()),
            known_hosts,
        }
    }

    pub fn known_hosts(&self) -> &Arc<KnownHosts> {
        &self.known_hosts
    }
}

#[async_trait]
impl Connector for SshConnector {
    type Transport = SshTransport;

    async fn connect(&self, config: &SessionConfig) -> Result<SshTransport, ConnectError> {
        let rejection = Arc::new(Mutex::new(None));
        let handler = ClientHandler {
            host: config.host.clone(),
            port: config.port,
            policy: config.host_key_policy.clone(),
            known_hosts: Arc::clone(&self.known_hosts),
            rejection: Arc::clone(&rejection),
        };

        tracing::debug!("Opening SSH connection to {}", config.address());
        let mut handle = client::connect(
            Arc::clone(&self.ssh_config),
            (config.host.as_str(), config.port),
            handler,
        )
        .await
        .map_err(|e| classify_handshake_error(e, &config.host, &rejection))?;

        tracing::debug!("Authenticating as user '{}'", config.username);
        let authenticated = match handle
            .authenticate_password(&config.username, &config.password)
            .await
        {
            Ok(authenticated) => authenticated,
            Err(e) => {
                hang_up(&handle).await;
                return Err(classify_auth_error(e));
            }
        };

        if !authenticated {
            hang_up(&handle).await;
            return Err(ConnectError::AuthenticationFailed {
                username: config.username.clone(),
            });
        }

        Ok(SshTransport {
            handle,
            host: config.host.clone(),
        })
    }
}

/// An authenticated SSH connection
pub struct SshTransport {
    handle: Handle<ClientHandler>,
    host: String,
}

/// Output collected from one command channel
#[derive(Debug, Default)]
struct CollectedOutput {
    stdout: BytesMut,
    stderr: BytesMut,
    exit_status: Option<u32>,
}

#[async_trait]
impl Transport for SshTransport {
    /// Stdout and stderr share one SSH channel, so both are buffered until
    /// the remote side closes it and handed back as ready drains.
    async fn exec(&mut self, command: &str) -> Result<CommandChannels, TransportError> {
        let mut channel = self
            .handle
            .channel_open_session()
            .await
            .map_err(|e| TransportError::ChannelOpen(e.to_string()))?;

        channel
            .exec(true, command)
            .await
            .map_err(|e| TransportError::ChannelOpen(e.to_string()))?;

        // Nothing is ever written to the command's stdin
        channel
            .eof()
            .await
            .map_err(|e| TransportError::ChannelOpen(e.to_string()))?;

        let output = collect_output(&mut channel).await?;
        tracing::debug!(
            host = %self.host,
            exit_status = ?output.exit_status,
            stdout = output.stdout.len(),
            stderr = output.stderr.len(),
            "Command channel closed"
        );

        Ok(CommandChannels {
            stdout: Drain::from_bytes(output.stdout.freeze()),
            stderr: Drain::from_bytes(output.stderr.freeze()),
        })
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        self.handle
            .disconnect(Disconnect::ByApplication, "closing", "en")
            .await
            .map_err(|e| TransportError::Disconnect(e.to_string()))
    }
}

/// Read channel messages until the remote side closes the channel
async fn collect_output(channel: &mut Channel<Msg>) -> Result<CollectedOutput, TransportError> {
    let mut output = CollectedOutput::default();

    while let Some(msg) = channel.wait().await {
        match msg {
            ChannelMsg::Data { ref data } => output.stdout.extend_from_slice(data),
            ChannelMsg::ExtendedData { ref data, ext } if ext == SSH_EXTENDED_DATA_STDERR => {
                output.stderr.extend_from_slice(data)
            }
            ChannelMsg::ExitStatus { exit_status } => output.exit_status = Some(exit_status),
            ChannelMsg::Failure => {
                return Err(TransportError::ChannelOpen(
                    "server refused to execute the command".to_string(),
                ))
            }
            _ => {}
        }
    }

    Ok(output)
}

/// Best-effort disconnect of a handshake that will not be used
async fn hang_up(handle: &Handle<ClientHandler>) {
    if let Err(e) = handle
        .disconnect(Disconnect::ByApplication, "authentication failed", "en")
        .await
    {
        tracing::debug!("Disconnect after failed authentication: {}", e);
    }
}

fn classify_handshake_error(
    err: russh::Error,
    host: &str,
    rejection: &Mutex<Option<String>>,
) -> ConnectError {
    match err {
        russh::Error::UnknownKey => ConnectError::HostKeyMismatch {
            host: host.to_string(),
            message: rejection
                .lock()
                .ok()
                .and_then(|mut reason| reason.take())
                .unwrap_or_else(|| "server key was rejected".to_string()),
        },
        russh::Error::IO(e) => ConnectError::Network(e),
        other => classify_auth_error(other),
    }
}

/// russh 0.45 reports a refused password as `Ok(false)` whatever methods the
/// server still offers, so a server without password auth surfaces as
/// [`ConnectError::AuthenticationFailed`], never `UnsupportedAuthMethod`.
fn classify_auth_error(err: russh::Error) -> ConnectError {
    match err {
        russh::Error::IO(e) => ConnectError::Network(e),
        russh::Error::Disconnect => ConnectError::Network(io::Error::new(
            io::ErrorKind::ConnectionAborted,
            "server closed the connection",
        )),
        other => ConnectError::Transport(other.to_string()),
    }
}

/// SSH client handler applying the configured host key policy
struct ClientHandler {
    host: String,
    port: u16,
    policy: HostKeyPolicy,
    known_hosts: Arc<KnownHosts>,
    /// Why the host key was refused, read back after the handshake fails
    rejection: Arc<Mutex<Option<String>>>,
}

#[async_trait]
impl client::Handler for ClientHandler {
    type Error = russh::Error;

    async fn check_server_key(
        &mut self,
        server_public_key: &PublicKey,
    ) -> Result<bool, Self::Error> {
        let fingerprint = server_public_key.fingerprint();
        tracing::debug!("Server host key: {}", fingerprint);

        match verify_host_key(
            &self.policy,
            &self.known_hosts,
            &self.host,
            self.port,
            &fingerprint,
        ) {
            Ok(HostKeyCheck::Learned) => {
                tracing::warn!(
                    "Trusting host key {} for {}:{} on first use",
                    fingerprint,
                    self.host,
                    self.port
                );
                Ok(true)
            }
            Ok(HostKeyCheck::Matched) => Ok(true),
            Err(rejection) => {
                tracing::error!("Host key verification failed: {}", rejection);
                if let Ok(mut slot) = self.rejection.lock() {
                    *slot = Some(rejection.to_string());
                }
                Ok(false)
            }
        }
    }
}
