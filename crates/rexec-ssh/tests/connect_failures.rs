//! Connection failures that need no SSH server
//!
//! Each of these must leave the session disconnected without panicking.

use std::time::Duration;

use rexec_core::error::{ConnectError, CredentialError};
use rexec_core::SessionConfig;
use rexec_ssh::{SshConnector, SshSession};

#[tokio::test]
async fn test_refused_port_is_network_error() {
    let connector = SshConnector::new();
    // Nothing listens on port 1 of the loopback interface
    let config = SessionConfig::new("127.0.0.1", "pi", "raspberry")
        .with_port(1)
        .with_connect_timeout(Duration::from_secs(5));

    let session = SshSession::connect(config, &connector).await;

    assert!(!session.is_connected());
    assert!(matches!(
        session.connect_error(),
        Some(ConnectError::Network(_))
    ));
    assert!(connector.known_hosts().is_empty());
}

#[tokio::test]
async fn test_unresolvable_host_is_network_error() {
    let connector = SshConnector::new();
    let config = SessionConfig::new("no-such-device.invalid", "pi", "raspberry")
        .with_connect_timeout(Duration::from_secs(5));

    let err = SshSession::try_connect(config, &connector).await.unwrap_err();
    assert!(matches!(err, ConnectError::Network(_)), "got {:?}", err);
}

#[tokio::test]
async fn test_empty_password_skips_handshake() {
    let connector = SshConnector::new();
    let mut session =
        SshSession::connect(SessionConfig::new("127.0.0.1", "pi", ""), &connector).await;

    assert!(!session.is_connected());
    assert!(matches!(
        session.connect_error(),
        Some(ConnectError::Credential(CredentialError::MissingPassword))
    ));

    let result = session.execute("uptime").await;
    assert!(result.failed());
    session.close().await.unwrap();
}
