use async_trait::async_trait;
use tracing::info;

use super::{TunnelError, TunnelStrategy};

/// No tunnel: the server is only reachable on the local network.
#[derive(Debug, Clone)]
pub struct LocalTunnel {
    port: u16,
}

impl LocalTunnel {
    pub fn new(port: u16) -> Self {
        LocalTunnel { port }
    }
}

#[async_trait]
impl TunnelStrategy for LocalTunnel {
    async fn connect(&self) -> Result<(), TunnelError> {
        info!(port = self.port, "Local mode active");
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), TunnelError> {
        info!("Leaving local mode");
        Ok(())
    }

    async fn is_connected(&self) -> bool {
        true
    }

    async fn tunnel_url(&self) -> Option<String> {
        Some(format!("http://localhost:{}", self.port))
    }

    fn strategy_name(&self) -> &'static str {
        "Local"
    }
}
