//! Remote session configuration

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use super::serde_utils::duration_secs;

/// Default SSH port
pub const DEFAULT_PORT: u16 = 22;

/// Bound on the connect and authenticate handshake
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// How the server's host key is trusted
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum HostKeyPolicy {
    /// Accept whatever key is presented on first contact and remember it.
    ///
    /// A later connection to the same host and port that presents a
    /// different key is rejected as a host key mismatch. This does not
    /// protect the first connection against an impostor.
    #[default]
    TrustOnFirstUse,

    /// Only accept a key with this fingerprint
    Pinned { fingerprint: String },
}

/// Everything needed to open one remote session
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Host name or IP address of the device
    pub host: String,

    /// SSH port
    pub port: u16,

    /// Username for password authentication
    pub username: String,

    /// Password for password authentication
    #[serde(skip_serializing_if = "String::is_empty")]
    pub password: String,

    /// Firmware version label. Informational only, never read from the device.
    pub firmware: Option<String>,

    /// Free-text description of the device
    pub description: Option<String>,

    /// Connection timeout
    #[serde(with = "duration_secs")]
    pub connect_timeout: Duration,

    /// Directory that saved command output is written to
    pub output_dir: PathBuf,

    /// Host key trust policy. Kept last: it serializes as a TOML table.
    pub host_key_policy: HostKeyPolicy,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: DEFAULT_PORT,
            username: whoami::username(),
            password: String::new(),
            firmware: None,
            description: None,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            host_key_policy: HostKeyPolicy::default(),
            output_dir: PathBuf::from("."),
        }
    }
}

impl SessionConfig {
    /// Create a configuration for `username@host` on the default port
    pub fn new(
        host: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            username: username.into(),
            password: password.into(),
            ..Self::default()
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_firmware(mut self, firmware: impl Into<String>) -> Self {
        self.firmware = Some(firmware.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_host_key_policy(mut self, policy: HostKeyPolicy) -> Self {
        self.host_key_policy = policy;
        self
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// `host:port`, bracketing IPv6 literals
    pub fn address(&self) -> String {
        if self.host.contains(':') && !self.host.starts_with('[') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }
}

// Hand-written so the password never reaches a log line.
impl fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("firmware", &self.firmware)
            .field("description", &self.description)
            .field("connect_timeout", &self.connect_timeout)
            .field("host_key_policy", &self.host_key_policy)
            .field("output_dir", &self.output_dir)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SessionConfig::new("10.0.0.5", "admin", "secret");
        assert_eq!(config.port, 22);
        assert_eq!(config.connect_timeout, Duration::from_secs(10));
        assert_eq!(config.host_key_policy, HostKeyPolicy::TrustOnFirstUse);
        assert!(config.firmware.is_none());
        assert!(config.description.is_none());
    }

    #[test]
    fn test_address_formats() {
        assert_eq!(
            SessionConfig::new("10.0.0.5", "u", "p").with_port(2222).address(),
            "10.0.0.5:2222"
        );
        assert_eq!(SessionConfig::new("::1", "u", "p").address(), "[::1]:22");
    }

    #[test]
    fn test_debug_redacts_password() {
        let config = SessionConfig::new("host", "user", "hunter2");
        let printed = format!("{:?}", config);
        assert!(!printed.contains("hunter2"));
        assert!(printed.contains("<redacted>"));
    }

    #[test]
    fn test_pinned_policy_from_toml() {
        let config: SessionConfig = toml::from_str(
            r#"
            host = "router.lan"
            username = "admin"

            [host_key_policy]
            mode = "pinned"
            fingerprint = "SHA256:abc"
            "#,
        )
        .unwrap();

        assert_eq!(
            config.host_key_policy,
            HostKeyPolicy::Pinned {
                fingerprint: "SHA256:abc".to_string()
            }
        );
        assert_eq!(config.port, DEFAULT_PORT);
        assert!(config.password.is_empty());
    }
}
