//! Core types for rexec

use std::borrow::Cow;
use std::fmt;

use bytes::Bytes;

use crate::error::ExecError;

/// Payload of a failed result when the command channel could not be used
pub const CHANNEL_FAILURE_MESSAGE: &str = "Failed executing command!";

/// Payload of a failed result when the session is not connected
pub const NOT_CONNECTED_MESSAGE: &str = "Not connected to the device!";

/// Outcome of one `execute` call
///
/// On success the payload is the command's standard output. On failure it
/// is either the remote standard error or a local diagnostic message.
#[derive(Clone, PartialEq, Eq)]
pub struct CommandResult {
    failed: bool,
    payload: Bytes,
}

impl CommandResult {
    /// A successful result carrying standard output
    pub fn success(stdout: impl Into<Bytes>) -> Self {
        Self {
            failed: false,
            payload: stdout.into(),
        }
    }

    /// A failed result carrying a diagnostic
    pub fn failure(diagnostic: impl Into<Bytes>) -> Self {
        Self {
            failed: true,
            payload: diagnostic.into(),
        }
    }

    pub fn failed(&self) -> bool {
        self.failed
    }

    pub fn payload(&self) -> &Bytes {
        &self.payload
    }

    pub fn into_payload(self) -> Bytes {
        self.payload
    }

    /// Payload decoded as UTF-8, replacing invalid sequences
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.payload)
    }

    /// `(failed, payload)`, the shape storage consumers expect
    pub fn into_parts(self) -> (bool, Bytes) {
        (self.failed, self.payload)
    }
}

impl From<Result<Bytes, ExecError>> for CommandResult {
    fn from(outcome: Result<Bytes, ExecError>) -> Self {
        match outcome {
            Ok(stdout) => Self::success(stdout),
            Err(ExecError::RemoteCommand(stderr)) => Self::failure(stderr),
            Err(ExecError::CommandChannel(_)) => Self::failure(CHANNEL_FAILURE_MESSAGE),
            Err(ExecError::NotConnected) => Self::failure(NOT_CONNECTED_MESSAGE),
        }
    }
}

impl fmt::Debug for CommandResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandResult")
            .field("failed", &self.failed)
            .field("payload", &self.text())
            .finish()
    }
}
