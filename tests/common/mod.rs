#![allow(dead_code)]

use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::StatusCode;
use tempfile::TempDir;

const BINARY: &str = env!("CARGO_BIN_EXE_messages-api");

/// A server process with its own database file, killed on drop
pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    pub client: reqwest::Client,
    child: Child,
    _dir: TempDir,
}

impl TestServer {
    /// Start a server whose database holds only the sample message (id 1)
    pub async fn seeded() -> Result<Self> {
        Self::start(true).await
    }

    /// Start a server with an empty database
    pub async fn empty() -> Result<Self> {
        Self::start(false).await
    }

    async fn start(seed: bool) -> Result<Self> {
        let dir = tempfile::tempdir().context("failed to create temp dir")?;
        let database_url = database_url(dir.path().join("messages.db"));

        if seed {
            let status = Command::new(BINARY)
                .args(["--database-url", &database_url, "seed"])
                .stdin(Stdio::null())
                .status()
                .context("failed to run seed command")?;
            anyhow::ensure!(status.success(), "seed command failed: {}", status);
        }

        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let child = Command::new(BINARY)
            .args(["--database-url", &database_url, "serve"])
            .args(["--host", "127.0.0.1", "--port", &port.to_string()])
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .spawn()
            .context("failed to spawn server binary")?;

        let server = Self {
            port,
            base_url: format!("http://127.0.0.1:{}", port),
            client: reqwest::Client::new(),
            child,
            _dir: dir,
        };
        server.wait_ready(Duration::from_secs(10)).await?;
        Ok(server)
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if let Ok(resp) = self.client.get(self.url("/health")).send().await {
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

fn database_url(path: PathBuf) -> String {
    format!("sqlite://{}", path.display())
}
