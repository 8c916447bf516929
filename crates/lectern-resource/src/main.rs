//! Lectern resource server entry point.
//!
//! Serves one directory over HTTP for the output surface.  The control
//! surface normally runs the same server in-process; this binary exists for
//! running it on its own (previewing a media folder, debugging a renderer).
//!
//! # Usage
//!
//! ```text
//! lectern-resource --root <DIR> [OPTIONS]
//!
//! Options:
//!   --root <DIR>     Allowed root directory        [env: LECTERN_RESOURCE_ROOT]
//!   --bind <ADDR>    Bind address                  [default: 127.0.0.1]
//!   --port <PORT>    TCP port                      [default: 24901]
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use lectern_resource::domain::{ResourceServerConfig, DEFAULT_RESOURCE_PORT};
use lectern_resource::infrastructure::run_server;

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Lectern resource server.
#[derive(Debug, Parser)]
#[command(
    name = "lectern-resource",
    about = "Serves media files from one allowed root to the Lectern output surface",
    version
)]
struct Cli {
    /// Directory to serve.  Nothing outside it is ever returned.
    #[arg(long, env = "LECTERN_RESOURCE_ROOT")]
    root: PathBuf,

    /// IP address to bind to.  Keep it on loopback unless the output surface
    /// runs on another machine.
    #[arg(long, default_value = "127.0.0.1", env = "LECTERN_RESOURCE_BIND")]
    bind: String,

    #[arg(long, default_value_t = DEFAULT_RESOURCE_PORT, env = "LECTERN_RESOURCE_PORT")]
    port: u16,
}

impl Cli {
    /// # Errors
    ///
    /// Returns an error if `--bind` is not an IP address.
    fn into_config(self) -> anyhow::Result<ResourceServerConfig> {
        let bind_addr: SocketAddr = format!("{}:{}", self.bind, self.port)
            .parse()
            .with_context(|| format!("invalid bind address: '{}:{}'", self.bind, self.port))?;
        Ok(ResourceServerConfig::new(self.root).with_bind_addr(bind_addr))
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Cli::parse().into_config()?;
    info!(
        "Lectern resource server starting: root={}, bind={}",
        config.root.display(),
        config.bind_addr
    );

    let running = Arc::new(AtomicBool::new(true));
    let running_clone = Arc::clone(&running);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("received Ctrl+C; shutting down");
                running_clone.store(false, Ordering::Relaxed);
            }
            Err(e) => tracing::error!("failed to listen for Ctrl+C signal: {e}"),
        }
    });

    run_server(config, running).await
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults_bind_loopback_on_default_port() {
        // Arrange
        let cli = Cli::parse_from(["lectern-resource", "--root", "/srv/media"]);

        // Act
        let config = cli.into_config().unwrap();

        // Assert
        assert_eq!(config.bind_addr.to_string(), "127.0.0.1:24901");
        assert_eq!(config.root, PathBuf::from("/srv/media"));
    }

    #[test]
    fn test_cli_port_and_bind_override() {
        let cli = Cli::parse_from([
            "lectern-resource",
            "--root",
            "media",
            "--bind",
            "0.0.0.0",
            "--port",
            "8080",
        ]);

        let config = cli.into_config().unwrap();

        assert_eq!(config.bind_addr.to_string(), "0.0.0.0:8080");
    }

    #[test]
    fn test_invalid_bind_returns_error() {
        let cli = Cli {
            root: PathBuf::from("media"),
            bind: "not.an.ip".to_string(),
            port: 24901,
        };

        assert!(cli.into_config().is_err());
    }
}
