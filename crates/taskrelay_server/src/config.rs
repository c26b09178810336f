//! Server configuration.

use rand::RngCore;
use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

/// Configuration for the API server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to.
    pub bind_addr: SocketAddr,
    /// Durable-store directory; `None` runs on the in-memory store.
    pub data_dir: Option<PathBuf>,
    /// Secret key for token signing.
    pub secret: Vec<u8>,
    /// Issued-token lifetime.
    pub token_expiry: Duration,
}

impl ServerConfig {
    /// Creates a configuration with defaults for everything but the
    /// bind address.
    pub fn new(bind_addr: SocketAddr) -> Self {
        Self {
            bind_addr,
            data_dir: Some(PathBuf::from("data")),
            secret: b"taskrelay-dev-secret-change-in-production".to_vec(),
            token_expiry: Duration::from_secs(7 * 24 * 60 * 60),
        }
    }

    /// Sets the durable-store directory.
    #[must_use]
    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = Some(dir.into());
        self
    }

    /// Switches to the ephemeral in-memory store.
    #[must_use]
    pub fn in_memory(mut self) -> Self {
        self.data_dir = None;
        self
    }

    /// Sets the token-signing secret.
    #[must_use]
    pub fn with_secret(mut self, secret: Vec<u8>) -> Self {
        self.secret = secret;
        self
    }

    /// Sets the issued-token lifetime.
    #[must_use]
    pub fn with_token_expiry(mut self, expiry: Duration) -> Self {
        self.token_expiry = expiry;
        self
    }

    /// Loads configuration from the environment.
    ///
    /// Recognized variables: `TASKRELAY_ADDR`, `TASKRELAY_DATA_DIR`,
    /// `TASKRELAY_IN_MEMORY`, `TASKRELAY_SECRET`,
    /// `TASKRELAY_TOKEN_EXPIRY_SECS`.
    pub fn from_env() -> Self {
        let bind_addr = env::var("TASKRELAY_ADDR")
            .ok()
            .and_then(|raw| raw.parse().ok())
            .unwrap_or_else(|| SocketAddr::from(([127, 0, 0, 1], 3000)));

        let mut config = Self::new(bind_addr);

        if env_bool("TASKRELAY_IN_MEMORY", false) {
            config.data_dir = None;
        } else if let Ok(dir) = env::var("TASKRELAY_DATA_DIR") {
            config.data_dir = Some(PathBuf::from(dir));
        }

        match env::var("TASKRELAY_SECRET") {
            Ok(secret) if !secret.is_empty() => config.secret = secret.into_bytes(),
            _ => {
                // A process-local random secret: tokens stop verifying
                // after a restart, which is safe but surprising.
                let mut secret = vec![0u8; 32];
                rand::thread_rng().fill_bytes(&mut secret);
                config.secret = secret;
                warn!("TASKRELAY_SECRET not set; issued tokens will not survive a restart");
            }
        }

        if let Some(secs) = env_u64("TASKRELAY_TOKEN_EXPIRY_SECS") {
            config.token_expiry = Duration::from_secs(secs);
        }

        config
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::new(SocketAddr::from(([127, 0, 0, 1], 3000)))
    }
}

fn env_bool(name: &str, default: bool) -> bool {
    env::var(name)
        .ok()
        .and_then(|value| match value.as_str() {
            "1" | "true" | "TRUE" | "yes" | "YES" => Some(true),
            "0" | "false" | "FALSE" | "no" | "NO" => Some(false),
            _ => None,
        })
        .unwrap_or(default)
}

fn env_u64(name: &str) -> Option<u64> {
    env::var(name).ok().and_then(|value| value.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.bind_addr.port(), 3000);
        assert!(config.data_dir.is_some());
    }

    #[test]
    fn config_builder() {
        let config = ServerConfig::new("0.0.0.0:9000".parse().unwrap())
            .in_memory()
            .with_secret(vec![1, 2, 3, 4])
            .with_token_expiry(Duration::from_secs(60));

        assert!(config.data_dir.is_none());
        assert_eq!(config.secret, vec![1, 2, 3, 4]);
        assert_eq!(config.token_expiry, Duration::from_secs(60));
    }
}
