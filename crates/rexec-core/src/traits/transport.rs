//! Transport traits
//!
//! The secure channel itself (key exchange, encryption, authentication,
//! channel multiplexing) is supplied by an implementation of these traits.
//! `rexec-ssh` provides one on top of `russh`.

use async_trait::async_trait;

use crate::config::SessionConfig;
use crate::drain::Drain;
use crate::error::{ConnectError, TransportError};

/// Output channels of one remote command invocation
///
/// Standard input has already been closed by the transport.
#[derive(Debug)]
pub struct CommandChannels {
    /// Standard output
    pub stdout: Drain,
    /// Standard error
    pub stderr: Drain,
}

/// An authenticated connection to a single host
#[async_trait]
pub trait Transport: Send {
    /// Issue `command` on a fresh channel and close its standard input.
    ///
    /// An `Err` means the command could not be issued at all; output from a
    /// command that ran (even unsuccessfully) comes back through the
    /// returned channels.
    async fn exec(&mut self, command: &str) -> Result<CommandChannels, TransportError>;

    /// Disconnect. Dropping a transport must also release it.
    async fn close(&mut self) -> Result<(), TransportError>;
}

/// Opens and authenticates transports
#[async_trait]
pub trait Connector: Send + Sync {
    /// The transport type produced by this connector
    type Transport: Transport;

    /// Connect to `config.host:config.port` and authenticate with the
    /// configured username and password.
    ///
    /// Failures must be classified into the [`ConnectError`] variants and
    /// must not leave a half-open connection behind. The caller bounds the
    /// whole call with `config.connect_timeout`.
    async fn connect(&self, config: &SessionConfig) -> Result<Self::Transport, ConnectError>;
}
