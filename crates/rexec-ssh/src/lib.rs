//! rexec-ssh: SSH transport for rexec
//!
//! Implements the `rexec-core` transport traits on top of `russh`, with
//! password authentication and a trust-on-first-use host key store.

mod connector;
pub mod known_hosts;

pub use connector::{SshConnector, SshTransport};
pub use known_hosts::{HostKeyCheck, HostKeyRejection, KnownHosts};

/// A remote session over SSH
pub type SshSession = rexec_core::RemoteSession<SshTransport>;
