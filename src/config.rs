//! Configuration loading from `.env` files.

use std::env;
use std::net::SocketAddr;
use std::path::Path;

use anyhow::{Context, Result};

pub const DEFAULT_BIND_WS: &str = "127.0.0.1:3000";
pub const DEFAULT_QUEUE_DEPTH: usize = 256;

/// Runtime settings derived from environment variables.
#[derive(Debug, Clone)]
pub struct Settings {
    /// WebSocket bind address, e.g. `127.0.0.1:3000`.
    pub bind_ws: SocketAddr,
    /// Per-client outbound queue capacity.
    pub queue_depth: usize,
}

impl Settings {
    /// Load settings from the specified `.env` file.
    ///
    /// A missing file is not an error; the process environment and the
    /// built-in defaults apply.
    pub fn from_env(path: &str) -> Result<Self> {
        if Path::new(path).exists() {
            dotenvy::from_filename(path).context("reading env file")?;
        }
        let bind_ws = env::var("BIND_WS")
            .unwrap_or_else(|_| DEFAULT_BIND_WS.into())
            .parse()
            .context("parsing BIND_WS")?;
        let queue_depth = match env::var("QUEUE_DEPTH") {
            Ok(v) => v.parse().context("parsing QUEUE_DEPTH")?,
            Err(_) => DEFAULT_QUEUE_DEPTH,
        };
        Ok(Self {
            bind_ws,
            queue_depth,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::sync::Mutex;
    use tempfile::tempdir;

    /// Serializes tests that mutate the process environment.
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    fn clear_vars() {
        for v in ["BIND_WS", "QUEUE_DEPTH"] {
            env::remove_var(v);
        }
    }

    #[test]
    fn loads_env_file() {
        let _g = ENV_MUTEX.lock().unwrap();
        clear_vars();
        let dir = tempdir().unwrap();
        let env_path = dir.path().join(".env");
        fs::write(&env_path, "BIND_WS=127.0.0.1:7000\nQUEUE_DEPTH=32\n").unwrap();
        let cfg = Settings::from_env(env_path.to_str().unwrap()).unwrap();
        assert_eq!(cfg.bind_ws, "127.0.0.1:7000".parse().unwrap());
        assert_eq!(cfg.queue_depth, 32);
        clear_vars();
    }

    #[test]
    fn defaults_apply_without_file_or_vars() {
        let _g = ENV_MUTEX.lock().unwrap();
        clear_vars();
        let cfg = Settings::from_env("/nonexistent/.env").unwrap();
        assert_eq!(cfg.bind_ws, DEFAULT_BIND_WS.parse().unwrap());
        assert_eq!(cfg.queue_depth, DEFAULT_QUEUE_DEPTH);
    }

    #[test]
    fn invalid_bind_address_errors() {
        let _g = ENV_MUTEX.lock().unwrap();
        clear_vars();
        let dir = tempdir().unwrap();
        let env_path = dir.path().join(".env");
        fs::write(&env_path, "BIND_WS=not-an-address\n").unwrap();
        assert!(Settings::from_env(env_path.to_str().unwrap()).is_err());
        clear_vars();
    }

    #[test]
    fn invalid_queue_depth_errors() {
        let _g = ENV_MUTEX.lock().unwrap();
        clear_vars();
        let dir = tempdir().unwrap();
        let env_path = dir.path().join(".env");
        fs::write(&env_path, "QUEUE_DEPTH=lots\n").unwrap();
        assert!(Settings::from_env(env_path.to_str().unwrap()).is_err());
        clear_vars();
    }
}
