//! Test server management.
//!
//! Spawns and manages ndfad instances for integration testing.

#![allow(dead_code)]

use std::process::{Child, Command, Stdio};
use std::time::Duration;
use tempfile::TempDir;
use tokio::time::sleep;

/// A test server instance.
///
/// The process is killed and its config directory removed on drop.
pub struct TestServer {
    child: Child,
    port: u16,
    _data_dir: TempDir,
}

impl TestServer {
    /// Spawn a server with default settings on `port`.
    pub async fn spawn(port: u16) -> anyhow::Result<Self> {
        Self::spawn_with(port, "").await
    }

    /// Spawn a server, appending `extra` TOML sections to the base config.
    pub async fn spawn_with(port: u16, extra: &str) -> anyhow::Result<Self> {
        let data_dir = tempfile::tempdir()?;
        let config_path = data_dir.path().join("config.toml");
        let config_content = format!(
            r#"
[server]
name = "test.ndfad"
metrics_port = 0

[listen]
address = "127.0.0.1:{port}"

{extra}
"#
        );
        std::fs::write(&config_path, config_content)?;

        let child = Command::new(env!("CARGO_BIN_EXE_ndfad"))
            .arg(&config_path)
            .env("RUST_LOG", "warn")
            .stdout(Stdio::null())
            .spawn()?;

        let server = Self {
            child,
            port,
            _data_dir: data_dir,
        };
        server.wait_until_ready().await?;
        Ok(server)
    }

    /// Wait until the server is accepting connections.
    async fn wait_until_ready(&self) -> anyhow::Result<()> {
        for _ in 0..50 {
            if tokio::net::TcpStream::connect(("127.0.0.1", self.port))
                .await
                .is_ok()
            {
                return Ok(());
            }
            sleep(Duration::from_millis(100)).await;
        }
        anyhow::bail!("Server failed to start within 5 seconds")
    }

    /// Get the server address.
    pub fn address(&self) -> String {
        format!("127.0.0.1:{}", self.port)
    }

    /// Connect and complete the handshake as `nick`.
    ///
    /// The join event every client receives for itself is consumed.
    pub async fn connect(&self, nick: &str) -> anyhow::Result<super::client::TestClient> {
        let mut client = super::client::TestClient::connect(&self.address(), nick).await?;
        client.expect_join(nick).await?;
        Ok(client)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}
