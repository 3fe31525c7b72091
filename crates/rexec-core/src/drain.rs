//! One-shot output channels
//!
//! A remote command's output streams can only be consumed once: after the
//! first full read the buffer is gone and any further read comes back
//! empty. [`Drain`] makes that explicit instead of leaving it to whatever
//! the underlying transport happens to do.

use std::fmt;
use std::io;

use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncReadExt};

type Source = Box<dyn AsyncRead + Send + Unpin>;

/// A channel that can be drained exactly once
pub struct Drain {
    source: Option<Source>,
}

impl Drain {
    /// Wrap a reader; the first [`drain`](Self::drain) consumes it to EOF
    pub fn new<R>(reader: R) -> Self
    where
        R: AsyncRead + Send + Unpin + 'static,
    {
        Self {
            source: Some(Box::new(reader)),
        }
    }

    /// A channel whose full contents are already buffered
    pub fn from_bytes(data: impl Into<Bytes>) -> Self {
        Self::new(io::Cursor::new(data.into()))
    }

    /// A channel that has nothing to give
    pub fn exhausted() -> Self {
        Self { source: None }
    }

    /// Whether the channel has already been drained
    pub fn is_exhausted(&self) -> bool {
        self.source.is_none()
    }

    /// Read everything the channel holds.
    ///
    /// Later calls return an empty buffer. The channel is spent even when
    /// the read fails part way.
    pub async fn drain(&mut self) -> io::Result<Bytes> {
        let Some(mut source) = self.source.take() else {
            return Ok(Bytes::new());
        };

        let mut buf = Vec::new();
        source.read_to_end(&mut buf).await?;
        Ok(Bytes::from(buf))
    }
}

impl fmt::Debug for Drain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Drain")
            .field("exhausted", &self.is_exhausted())
            .finish()
    }
}

impl From<Bytes> for Drain {
    fn from(data: Bytes) -> Self {
        Self::from_bytes(data)
    }
}
