//! Core error types for rexec

use std::path::PathBuf;

use bytes::Bytes;
use thiserror::Error;

/// Credentials rejected before any network attempt
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialError {
    #[error("No username provided")]
    MissingUsername,

    #[error("No password provided")]
    MissingPassword,
}

/// Classified connection failures
///
/// `RemoteSession::connect` absorbs these; they stay inspectable through
/// `RemoteSession::connect_error` or `RemoteSession::try_connect`.
#[derive(Error, Debug)]
pub enum ConnectError {
    /// Empty username or password
    #[error("Invalid credentials: {0}")]
    Credential(#[from] CredentialError),

    /// The server presented a host key that does not match the trusted one
    #[error("Host key for {host} did not match: {message}")]
    HostKeyMismatch { host: String, message: String },

    /// The server does not offer password authentication
    #[error("Unsupported authentication method: {0}")]
    UnsupportedAuthMethod(String),

    /// Wrong username or password
    #[error("Authentication failed for user '{username}'")]
    AuthenticationFailed { username: String },

    /// Protocol-level failure during the handshake
    #[error("Transport error: {0}")]
    Transport(String),

    /// Socket-level failure: resolution, refusal, reset or timeout
    #[error("Network error: {0}")]
    Network(#[from] std::io::Error),
}

/// Failures raised by a live transport
#[derive(Error, Debug)]
pub enum TransportError {
    /// A command channel could not be opened or the command not issued
    #[error("Failed to open command channel: {0}")]
    ChannelOpen(String),

    /// Reading or writing a channel failed
    #[error("Channel I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// Disconnect did not complete cleanly
    #[error("Disconnect failed: {0}")]
    Disconnect(String),
}

/// Execution phase errors, surfaced to callers as a failed `CommandResult`
#[derive(Error, Debug)]
pub enum ExecError {
    /// `execute` was called on a session that is not connected
    #[error("Session is not connected")]
    NotConnected,

    /// The command channel could not be used
    #[error("Command channel error: {0}")]
    CommandChannel(#[from] TransportError),

    /// The remote command wrote to its error channel
    #[error("Remote command failed: {}", String::from_utf8_lossy(.0))]
    RemoteCommand(Bytes),
}

/// Output could not be written to disk
#[derive(Error, Debug)]
pub enum PersistError {
    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file not found
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    /// Invalid configuration
    #[error("Invalid config: {0}")]
    Invalid(String),

    /// TOML parse error
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// TOML serialize error
    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_command_error_shows_stderr_text() {
        let err = ExecError::RemoteCommand(Bytes::from_static(b"command not found"));
        assert_eq!(err.to_string(), "Remote command failed: command not found");
    }

    #[test]
    fn test_credential_error_converts_into_connect_error() {
        let err: ConnectError = CredentialError::MissingPassword.into();
        assert!(matches!(
            err,
            ConnectError::Credential(CredentialError::MissingPassword)
        ));
    }
}
