//! Config command implementations

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::output::{print_info, print_success, print_warning};
use rexec_core::config::{self, SessionConfig};

/// Use the given path, or the default config file location
pub fn resolve_config_path(config_path: Option<&Path>) -> PathBuf {
    config_path
        .map(Path::to_path_buf)
        .unwrap_or_else(config::default_config_path)
}

/// Write a default configuration file
pub fn config_init(config_path: Option<&Path>, force: bool) -> Result<()> {
    let path = resolve_config_path(config_path);

    if path.exists() && !force {
        print_warning(&format!("Config file already exists: {}", path.display()));
        print_info("Use --force to overwrite it");
        return Ok(());
    }

    config::save_config(&path, &SessionConfig::default())
        .with_context(|| format!("Failed to write config file: {}", path.display()))?;

    print_success(&format!("Created config file: {}", path.display()));
    print_info("Passwords are best passed through REXEC_PASSWORD rather than stored here");
    Ok(())
}

/// Print the effective configuration as TOML
///
/// The password is never printed.
pub fn config_show(config_path: Option<&Path>) -> Result<()> {
    let path = resolve_config_path(config_path);

    let mut loaded: SessionConfig = if path.exists() {
        config::load_config(&path)
            .with_context(|| format!("Failed to load config file: {}", path.display()))?
    } else {
        print_info(&format!(
            "No config file at {}, showing defaults",
            path.display()
        ));
        SessionConfig::default()
    };
    loaded.password.clear();

    let text = toml::to_string_pretty(&loaded).context("Failed to render config")?;
    print!("{}", text);
    Ok(())
}

/// Print the config file location
pub fn config_path(config_path: Option<&Path>) -> Result<()> {
    println!("{}", resolve_config_path(config_path).display());
    Ok(())
}
