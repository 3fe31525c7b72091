//! Host key trust
//!
//! Keys are remembered in memory per `(host, port)` for the lifetime of a
//! [`KnownHosts`] store. Sessions created from the same connector share it,
//! so a host that changes its key between two sessions is caught.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use thiserror::Error;

use rexec_core::HostKeyPolicy;

/// Why a presented host key was refused
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HostKeyRejection {
    /// The host presented a different key than on first contact
    #[error("presented key {presented} differs from {trusted} trusted on first use")]
    Changed { trusted: String, presented: String },

    /// The key does not match the configured fingerprint
    #[error("presented key {presented} does not match pinned key {expected}")]
    NotPinned { expected: String, presented: String },
}

/// Result of a successful host key check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostKeyCheck {
    /// First contact, the key is now trusted
    Learned,
    /// The key matches the trusted or pinned one
    Matched,
}

/// In-memory store of trusted host key fingerprints
#[derive(Debug, Default)]
pub struct KnownHosts {
    keys: DashMap<(String, u16), String>,
}

impl KnownHosts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Trust `fingerprint` if the host is unknown, otherwise compare it
    pub fn check_or_learn(
        &self,
        host: &str,
        port: u16,
        fingerprint: &str,
    ) -> Result<HostKeyCheck, HostKeyRejection> {
        match self.keys.entry((host.to_string(), port)) {
            Entry::Occupied(trusted) if trusted.get() == fingerprint => Ok(HostKeyCheck::Matched),
            Entry::Occupied(trusted) => Err(HostKeyRejection::Changed {
                trusted: trusted.get().clone(),
                presented: fingerprint.to_string(),
            }),
            Entry::Vacant(slot) => {
                slot.insert(fingerprint.to_string());
                Ok(HostKeyCheck::Learned)
            }
        }
    }

    /// Fingerprint currently trusted for `host:port`
    pub fn trusted(&self, host: &str, port: u16) -> Option<String> {
        self.keys
            .get(&(host.to_string(), port))
            .map(|key| key.value().clone())
    }

    /// Stop trusting `host:port`, e.g. after a legitimate key rotation
    pub fn forget(&self, host: &str, port: u16) -> Option<String> {
        self.keys
            .remove(&(host.to_string(), port))
            .map(|(_, fingerprint)| fingerprint)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// Apply `policy` to the key `fingerprint` presented by `host:port`
pub fn verify_host_key(
    policy: &HostKeyPolicy,
    known_hosts: &KnownHosts,
    host: &str,
    port: u16,
    fingerprint: &str,
) -> Result<HostKeyCheck, HostKeyRejection> {
    match policy {
        HostKeyPolicy::TrustOnFirstUse => known_hosts.check_or_learn(host, port, fingerprint),
        HostKeyPolicy::Pinned { fingerprint: expected } if expected == fingerprint => {
            Ok(HostKeyCheck::Matched)
        }
        HostKeyPolicy::Pinned { fingerprint: expected } => Err(HostKeyRejection::NotPinned {
            expected: expected.clone(),
            presented: fingerprint.to_string(),
        }),
    }
}
