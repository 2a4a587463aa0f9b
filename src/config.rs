//! Runtime configuration.
//!
//! Everything is a CLI flag with an environment fallback, so the server can
//! be driven from a shell, a unit file, or a container without a config file.

use anyhow::{Context, Result};
use clap::Parser;
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::time::Duration;

/// CLI arguments and environment configuration for the server.
#[derive(Parser, Debug)]
#[command(name = "quillpad", version, about = "File-backed CMS server")]
pub struct Args {
    #[arg(
        long,
        env = "QUILL_HOST",
        default_value = "127.0.0.1",
        help = "Bind address"
    )]
    pub host: String,

    #[arg(long, env = "QUILL_PORT", default_value_t = 5800, help = "Bind port")]
    pub port: u16,

    #[arg(
        long,
        env = "QUILL_DATA_DIR",
        default_value = "./data",
        help = "Directory holding the document corpus"
    )]
    pub data_dir: PathBuf,

    #[arg(
        long,
        env = "QUILL_CREDENTIALS",
        default_value = "./users.conf",
        help = "Flat credentials file (username:salt:hash per line)"
    )]
    pub credentials: PathBuf,

    #[arg(
        long,
        env = "QUILL_SESSION_TTL_SECS",
        default_value_t = 86_400,
        help = "Session lifetime in seconds"
    )]
    pub session_ttl_secs: u64,
}

/// Resolved server configuration shared across the gateway.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub data_dir: PathBuf,
    pub credentials_path: PathBuf,
    pub session_ttl: Duration,
}

impl Config {
    pub fn from_args(args: Args) -> Self {
        Self {
            host: args.host,
            port: args.port,
            data_dir: args.data_dir,
            credentials_path: args.credentials,
            session_ttl: Duration::from_secs(args.session_ttl_secs.max(1)),
        }
    }

    /// Create the corpus directory and credentials file if they are missing.
    pub fn ensure_paths(&self) -> Result<()> {
        std::fs::create_dir_all(&self.data_dir).with_context(|| {
            format!("failed to create data directory {}", self.data_dir.display())
        })?;
        if let Some(parent) = self.credentials_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.credentials_path)
            .with_context(|| {
                format!(
                    "failed to open credentials file {}",
                    self.credentials_path.display()
                )
            })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn ensure_paths_creates_corpus_and_credentials() {
        let tmp = TempDir::new().unwrap();
        let config = Config {
            host: "127.0.0.1".into(),
            port: 0,
            data_dir: tmp.path().join("corpus"),
            credentials_path: tmp.path().join("state").join("users.conf"),
            session_ttl: Duration::from_secs(60),
        };

        config.ensure_paths().unwrap();
        assert!(config.data_dir.is_dir());
        assert!(config.credentials_path.is_file());
    }

    #[test]
    fn ensure_paths_is_idempotent() {
        let tmp = TempDir::new().unwrap();
        let config = Config {
            host: "127.0.0.1".into(),
            port: 0,
            data_dir: tmp.path().to_path_buf(),
            credentials_path: tmp.path().join("users.conf"),
            session_ttl: Duration::from_secs(60),
        };

        config.ensure_paths().unwrap();
        config.ensure_paths().unwrap();
    }
}
