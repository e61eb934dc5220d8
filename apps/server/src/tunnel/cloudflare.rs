//! Cloudflare Tunnel through a `cloudflared` child process.
//!
//! ```text
//!   connect ──► forget old URL ──► spawn cloudflared (piped, killed on drop)
//!                  │                  stored at once, lock released
//!                  │
//!                  ├── reader tasks: log status lines, capture the
//!                  │   first https://*.trycloudflare.com URL
//!                  │
//!                  └── wait 2s ── exited? ──► taken back out, ExitedEarly
//! ```
//!
//! The child lock is never held across the startup wait, so status checks
//! and `disconnect` answer while a connect is in flight.

use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use super::{TunnelError, TunnelStrategy};

const CLOUDFLARED: &str = "cloudflared";

/// Quick tunnels print their address in this form.
const QUICK_TUNNEL_URL: &str = r"https://[\w\-\.]+\.trycloudflare\.com";

/// How long cloudflared gets to fail before the tunnel counts as up.
const STARTUP_GRACE: Duration = Duration::from_secs(2);

pub struct CloudflareTunnel {
    name: String,
    config_file: Option<PathBuf>,
    domain: Option<String>,
    program: String,
    child: Mutex<Option<Child>>,
    detected_url: Arc<RwLock<Option<String>>>,
}

impl CloudflareTunnel {
    pub fn new(name: impl Into<String>, config_file: Option<PathBuf>, domain: Option<String>) -> Self {
        CloudflareTunnel {
            name: name.into(),
            config_file,
            domain: domain.filter(|d| !d.trim().is_empty()),
            program: CLOUDFLARED.to_string(),
            child: Mutex::new(None),
            detected_url: Arc::new(RwLock::new(None)),
        }
    }

    /// Runs another executable instead of `cloudflared`.
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    /// `tunnel --config <file> run` when the file exists, else `tunnel run <name>`.
    fn command_args(&self) -> Vec<String> {
        match &self.config_file {
            Some(file) if file.exists() => vec![
                "tunnel".to_string(),
                "--config".to_string(),
                file.display().to_string(),
                "run".to_string(),
            ],
            _ => vec!["tunnel".to_string(), "run".to_string(), self.name.clone()],
        }
    }
}

fn url_pattern() -> Result<Regex, regex::Error> {
    Regex::new(QUICK_TUNNEL_URL)
}

fn detect_url(pattern: &Regex, line: &str) -> Option<String> {
    pattern.find(line).map(|m| m.as_str().to_string())
}

/// Follows one output stream of the child until it closes.
fn watch_output<R>(stream: R, pattern: Regex, detected_url: Arc<RwLock<Option<String>>>)
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut lines = BufReader::new(stream).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    if let Some(url) = detect_url(&pattern, &line) {
                        let mut current = detected_url.write().await;
                        if current.is_none() {
                            info!(%url, "Tunnel URL detected");
                            *current = Some(url);
                        }
                    }
                    if line.contains("Connection") || line.contains("Registered") {
                        info!("cloudflared: {line}");
                    } else {
                        debug!("cloudflared: {line}");
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    warn!(error = %e, "Lost tunnel output");
                    break;
                }
            }
        }
    });
}

#[async_trait]
impl TunnelStrategy for CloudflareTunnel {
    async fn connect(&self) -> Result<(), TunnelError> {
        {
            let mut slot = self.child.lock().await;

            if let Some(child) = slot.as_mut() {
                if matches!(child.try_wait(), Ok(None)) {
                    info!("Cloudflare tunnel already connected");
                    return Ok(());
                }
            }
            *self.detected_url.write().await = None;

            let pattern = url_pattern()?;
            let args = self.command_args();
            info!(tunnel = %self.name, ?args, "Starting Cloudflare tunnel");

            let mut child = Command::new(&self.program)
                .args(&args)
                .stdout(Stdio::piped())
                .stderr(Stdio::piped())
                .kill_on_drop(true)
                .spawn()?;

            if let Some(stdout) = child.stdout.take() {
                watch_output(stdout, pattern.clone(), self.detected_url.clone());
            }
            if let Some(stderr) = child.stderr.take() {
                watch_output(stderr, pattern, self.detected_url.clone());
            }

            *slot = Some(child);
        }

        tokio::time::sleep(STARTUP_GRACE).await;

        let mut slot = self.child.lock().await;
        let Some(child) = slot.as_mut() else {
            debug!("Tunnel stopped during startup");
            return Ok(());
        };
        if let Some(status) = child.try_wait()? {
            slot.take();
            warn!(?status, "cloudflared exited during startup");
            return Err(TunnelError::ExitedEarly(status.code()));
        }

        if let Some(domain) = &self.domain {
            info!(url = %format!("https://{domain}"), "Tunnel bound to domain");
        }

        info!("Cloudflare tunnel connected");
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), TunnelError> {
        let Some(mut child) = self.child.lock().await.take() else {
            return Ok(());
        };

        if child.try_wait()?.is_none() {
            info!("Stopping Cloudflare tunnel");
            child.kill().await?;
        }
        *self.detected_url.write().await = None;

        info!("Cloudflare tunnel disconnected");
        Ok(())
    }

    async fn is_connected(&self) -> bool {
        match self.child.lock().await.as_mut() {
            Some(child) => matches!(child.try_wait(), Ok(None)),
            None => false,
        }
    }

    async fn tunnel_url(&self) -> Option<String> {
        if let Some(domain) = &self.domain {
            return Some(format!("https://{domain}"));
        }
        self.detected_url.read().await.clone()
    }

    fn strategy_name(&self) -> &'static str {
        "Cloudflare"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_quick_tunnel_url() {
        let pattern = url_pattern().unwrap();
        let line = "2026-10-17T12:00:00Z INF |  https://brave-lime-cat.trycloudflare.com  |";
        assert_eq!(
            detect_url(&pattern, line).as_deref(),
            Some("https://brave-lime-cat.trycloudflare.com")
        );
        assert!(detect_url(&pattern, "INF Registered tunnel connection connIndex=0").is_none());
        assert!(detect_url(&pattern, "https://example.com").is_none());
    }

    #[test]
    fn test_command_args() {
        let named = CloudflareTunnel::new("talkfood-app", None, None);
        assert_eq!(named.command_args(), vec!["tunnel", "run", "talkfood-app"]);

        let missing = CloudflareTunnel::new(
            "talkfood-app",
            Some(PathBuf::from("/nonexistent/cloudflared.yml")),
            None,
        );
        assert_eq!(missing.command_args(), vec!["tunnel", "run", "talkfood-app"]);

        let manifest = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("Cargo.toml");
        let with_file = CloudflareTunnel::new("talkfood-app", Some(manifest.clone()), None);
        assert_eq!(
            with_file.command_args(),
            vec![
                "tunnel".to_string(),
                "--config".to_string(),
                manifest.display().to_string(),
                "run".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_not_connected() {
        let tunnel = CloudflareTunnel::new("talkfood-app", None, None);
        assert!(!tunnel.is_connected().await);
        assert!(tunnel.tunnel_url().await.is_none());
        tunnel.disconnect().await.unwrap();

        let with_domain =
            CloudflareTunnel::new("talkfood-app", None, Some("pedidos.bar.example".to_string()));
        assert_eq!(
            with_domain.tunnel_url().await.as_deref(),
            Some("https://pedidos.bar.example")
        );
    }

    #[tokio::test]
    async fn test_missing_binary_fails_to_spawn() {
        let tunnel = CloudflareTunnel::new("talkfood-app", None, None)
            .with_program("comanda-test-no-such-cloudflared");
        let err = tunnel.connect().await.unwrap_err();
        assert!(matches!(err, TunnelError::Spawn(_)));
        assert!(!tunnel.is_connected().await);
    }

    #[tokio::test]
    async fn test_reconnect_forgets_previous_url() {
        let tunnel = CloudflareTunnel::new("talkfood-app", None, None)
            .with_program("comanda-test-no-such-cloudflared");
        *tunnel.detected_url.write().await = Some("https://old-run.trycloudflare.com".to_string());

        assert!(tunnel.connect().await.is_err());
        assert!(tunnel.tunnel_url().await.is_none());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_startup_wait_does_not_hold_the_lock() {
        // `true` ignores its arguments and exits straight away
        let tunnel = Arc::new(CloudflareTunnel::new("talkfood-app", None, None).with_program("true"));

        let connecting = tokio::spawn({
            let tunnel = tunnel.clone();
            async move { tunnel.connect().await }
        });
        tokio::time::sleep(Duration::from_millis(200)).await;

        let answered = tokio::time::timeout(Duration::from_millis(500), tunnel.is_connected()).await;
        assert!(answered.is_ok());

        let err = connecting.await.unwrap().unwrap_err();
        assert!(matches!(err, TunnelError::ExitedEarly(Some(0))));
        assert!(!tunnel.is_connected().await);
    }
}
