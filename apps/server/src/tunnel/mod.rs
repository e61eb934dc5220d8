//! # Public Tunnel
//!
//! Makes the server reachable from customers' phones when it runs on the
//! restaurant's own machine.
//!
//! ```text
//!   tunnel.strategy = "local"        LocalTunnel       http://localhost:<port>
//!   tunnel.strategy = "cloudflare"   CloudflareTunnel  cloudflared child process
//!                                                      https://<domain> or the
//!                                                      *.trycloudflare.com URL
//!                                                      it prints
//! ```

pub mod cloudflare;
pub mod local;

use std::sync::Arc;

use async_trait::async_trait;

pub use cloudflare::CloudflareTunnel;
pub use local::LocalTunnel;

use crate::config::TunnelConfig;

#[derive(Debug, thiserror::Error)]
pub enum TunnelError {
    #[error("Unknown tunnel strategy: {0}")]
    UnknownStrategy(String),

    #[error("Failed to start tunnel process: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("Tunnel process exited during startup (status {0:?})")]
    ExitedEarly(Option<i32>),

    #[error("Invalid tunnel URL pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// A way of exposing the HTTP port.
#[async_trait]
pub trait TunnelStrategy: Send + Sync {
    /// Starts the tunnel. Succeeds immediately when already connected.
    async fn connect(&self) -> Result<(), TunnelError>;

    async fn disconnect(&self) -> Result<(), TunnelError>;

    async fn is_connected(&self) -> bool;

    /// Public URL, once known.
    async fn tunnel_url(&self) -> Option<String>;

    fn strategy_name(&self) -> &'static str;
}

/// Builds the strategy named by `tunnel.strategy` (case-insensitive).
pub fn create_strategy(config: &TunnelConfig) -> Result<Arc<dyn TunnelStrategy>, TunnelError> {
    match config.strategy.trim().to_lowercase().as_str() {
        "local" => Ok(Arc::new(LocalTunnel::new(config.local_port))),
        "cloudflare" => Ok(Arc::new(CloudflareTunnel::new(
            &config.name,
            config.config_file.clone(),
            config.domain.clone(),
        ))),
        other => Err(TunnelError::UnknownStrategy(other.to_string())),
    }
}
