//! `rexec exec` against an in-process SSH server

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use assert_cmd::assert::{Assert, OutputAssertExt};
use assert_cmd::Command;
use async_trait::async_trait;
use predicates::prelude::*;
use russh::server::{self, Auth, Msg, Session};
use russh::{Channel, ChannelId, CryptoVec};
use russh_keys::key::KeyPair;
use tempfile::TempDir;
use tokio::net::TcpListener;

/// Accepts `U` / `P` and prints `ok` for every command
struct EchoDevice;

#[async_trait]
impl server::Handler for EchoDevice {
    type Error = russh::Error;

    async fn auth_password(&mut self, user: &str, password: &str) -> Result<Auth, Self::Error> {
        if user == "U" && password == "P" {
            Ok(Auth::Accept)
        } else {
            Ok(Auth::Reject {
                proceed_with_methods: None,
            })
        }
    }

    async fn channel_open_session(
        &mut self,
        _channel: Channel<Msg>,
        _session: &mut Session,
    ) -> Result<bool, Self::Error> {
        Ok(true)
    }

    async fn exec_request(
        &mut self,
        channel: ChannelId,
        _data: &[u8],
        session: &mut Session,
    ) -> Result<(), Self::Error> {
        session.channel_success(channel);
        session.data(channel, CryptoVec::from_slice(b"ok\n"));
        session.exit_status_request(channel, 0);
        session.eof(channel);
        session.close(channel);
        Ok(())
    }
}

async fn start_device() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    let mut config = server::Config::default();
    config
        .keys
        .push(KeyPair::generate_ed25519().expect("Failed to generate ed25519 host key"));
    config.auth_rejection_time = Duration::from_millis(10);
    config.auth_rejection_time_initial = Some(Duration::ZERO);
    let config = Arc::new(config);

    tokio::spawn(async move {
        while let Ok((socket, _)) = listener.accept().await {
            let config = Arc::clone(&config);
            tokio::spawn(async move {
                let _ = server::run_stream(config, socket, EchoDevice).await;
            });
        }
    });

    port
}

/// Run the binary off the runtime thread so the server keeps serving
async fn run_rexec(args: Vec<String>) -> Assert {
    let output = tokio::task::spawn_blocking(move || {
        Command::cargo_bin("rexec")
            .expect("Failed to locate rexec binary - ensure it's built before running tests")
            .env_remove("RUST_LOG")
            .env("REXEC_PASSWORD", "P")
            .args(args)
            .output()
            .unwrap()
    })
    .await
    .unwrap();
    output.assert()
}

fn saved_files(dir: &TempDir) -> Vec<PathBuf> {
    std::fs::read_dir(dir.path())
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .collect()
}

#[tokio::test]
async fn test_exec_saves_transcript_and_prints_its_path() {
    let port = start_device().await;
    let home = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    let config_file = home.path().join("config.toml");
    std::fs::write(&config_file, "username = \"U\"\n").unwrap();

    let assert = run_rexec(vec![
        "-c".to_string(),
        config_file.display().to_string(),
        "exec".to_string(),
        "127.0.0.1".to_string(),
        "echo ok".to_string(),
        "--port".to_string(),
        port.to_string(),
        "--save".to_string(),
        "--output-dir".to_string(),
        out.path().display().to_string(),
    ])
    .await;

    let files = saved_files(&out);
    assert_eq!(files.len(), 1, "{:?}", files);
    let saved = &files[0];
    let name = saved.file_name().unwrap().to_string_lossy().into_owned();
    assert!(name.starts_with("U@127.0.0.1-"), "{}", name);
    assert!(name.ends_with(".txt"), "{}", name);
    assert_eq!(std::fs::read_to_string(saved).unwrap(), "$ echo ok\nok\n");

    assert
        .success()
        .stdout(predicate::str::contains("ok\n"))
        .stdout(predicate::str::contains(format!(
            "Output saved to {}",
            saved.display()
        )));
}

#[tokio::test]
async fn test_exec_wrong_password_fails_without_saving() {
    let port = start_device().await;
    let out = TempDir::new().unwrap();
    let config_file = out.path().join("config.toml");
    std::fs::write(&config_file, "username = \"U\"\n").unwrap();

    let assert = run_rexec(vec![
        "-c".to_string(),
        config_file.display().to_string(),
        "exec".to_string(),
        "127.0.0.1".to_string(),
        "echo ok".to_string(),
        "--port".to_string(),
        port.to_string(),
        "--password".to_string(),
        "wrong".to_string(),
        "--save".to_string(),
        "--output-dir".to_string(),
        out.path().display().to_string(),
    ])
    .await;

    assert
        .failure()
        .stderr(predicate::str::contains("Not connected to the device"));
    assert_eq!(saved_files(&out), vec![config_file]);
}
