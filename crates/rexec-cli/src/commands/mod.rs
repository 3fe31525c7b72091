//! CLI command implementations

mod config;
mod exec;

pub use config::{config_init, config_path, config_show, resolve_config_path};
pub use exec::{exec_command, ExecArgs};
