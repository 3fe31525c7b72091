//! Core trait definitions

mod transport;

pub use transport::{CommandChannels, Connector, Transport};
