//! rexec-core: Remote session lifecycle and command execution
//!
//! This crate provides [`RemoteSession`], the transport traits it runs on,
//! configuration, error types and the output persistence helper used by
//! the SSH transport and the CLI.

pub mod config;
pub mod drain;
pub mod error;
pub mod persist;
pub mod session;
pub mod traits;
pub mod types;

pub use config::{HostKeyPolicy, SessionConfig};
pub use drain::Drain;
pub use error::{ConnectError, ExecError};
pub use session::RemoteSession;
pub use traits::{CommandChannels, Connector, Transport};
pub use types::CommandResult;
