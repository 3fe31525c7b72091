//! Exec command implementation

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use chrono::Local;
use clap::Args;

use crate::output::{print_error, print_info, print_success, print_warning};
use rexec_core::{HostKeyPolicy, SessionConfig};
use rexec_ssh::{SshConnector, SshSession};

/// Arguments of `rexec exec`
#[derive(Debug, Args)]
pub struct ExecArgs {
    /// Device host name or IP address
    pub host: String,

    /// Commands to run, in order. Quote commands that contain spaces.
    #[arg(required = true)]
    pub commands: Vec<String>,

    /// SSH username (overrides config)
    #[arg(short, long)]
    pub user: Option<String>,

    /// SSH port (overrides config)
    #[arg(short = 'p', long)]
    pub port: Option<u16>,

    /// SSH password
    #[arg(long, env = "REXEC_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Firmware label recorded with the session
    #[arg(long)]
    pub firmware: Option<String>,

    /// Description recorded with the session
    #[arg(long)]
    pub description: Option<String>,

    /// Connection timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Only accept the host key with this fingerprint
    #[arg(long)]
    pub fingerprint: Option<String>,

    /// Save the transcript of all commands to a file
    #[arg(short, long)]
    pub save: bool,

    /// Directory for saved transcripts (overrides config)
    #[arg(long)]
    pub output_dir: Option<PathBuf>,
}

impl ExecArgs {
    /// Layer the command-line values over a loaded configuration
    pub fn apply(&self, mut config: SessionConfig) -> SessionConfig {
        config.host = self.host.clone();
        if let Some(user) = &self.user {
            config.username = user.clone();
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(password) = &self.password {
            config.password = password.clone();
        }
        if let Some(firmware) = &self.firmware {
            config.firmware = Some(firmware.clone());
        }
        if let Some(description) = &self.description {
            config.description = Some(description.clone());
        }
        if let Some(secs) = self.timeout {
            config.connect_timeout = Duration::from_secs(secs);
        }
        if let Some(fingerprint) = &self.fingerprint {
            config.host_key_policy = HostKeyPolicy::Pinned {
                fingerprint: fingerprint.clone(),
            };
        }
        if let Some(dir) = &self.output_dir {
            config.output_dir = dir.clone();
        }
        config
    }
}

/// Connect, run every command in order, print the results
///
/// Keeps going after a failed command. Fails if the device could not be
/// reached or if any command failed.
pub async fn exec_command(config: SessionConfig, commands: &[String], save: bool) -> Result<()> {
    let connector = SshConnector::new();
    let mut session = SshSession::connect(config, &connector).await;

    if !session.is_connected() {
        let reason = session
            .connect_error()
            .map(|e| e.to_string())
            .unwrap_or_else(|| "unknown error".to_string());
        print_error(&format!("Not connected to the device: {}", reason));
        anyhow::bail!("Could not connect to {}", session.host());
    }

    print_info(&format!("Executing commands on {}", session.host()));

    let mut transcript = Vec::new();
    let mut failures = 0usize;

    for command in commands {
        let result = session.execute(command).await;

        transcript.extend_from_slice(format!("$ {}\n", command).as_bytes());
        transcript.extend_from_slice(result.payload());
        if !result.payload().ends_with(b"\n") {
            transcript.push(b'\n');
        }

        if result.failed() {
            failures += 1;
            print_error(&format!("{}: {}", command, result.text().trim_end()));
        } else {
            print!("{}", result.text());
        }
    }

    if save {
        match session.save_output(&transcript, &Local::now()) {
            Ok(path) => print_success(&format!("Output saved to {}", path.display())),
            Err(_) => print_warning("Output could not be saved, see the log for details"),
        }
    }

    if let Err(e) = session.close().await {
        tracing::warn!("Closing session: {}", e);
    }

    if failures > 0 {
        anyhow::bail!("{} of {} command(s) failed", failures, commands.len());
    }

    Ok(())
}
