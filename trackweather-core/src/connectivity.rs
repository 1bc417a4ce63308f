//! Connectivity check performed before any fetch attempt.

use async_trait::async_trait;
use std::{fmt::Debug, time::Duration};
use tokio::{net::TcpStream, time::timeout};

const PROBE_TIMEOUT: Duration = Duration::from_secs(2);

/// Answers "is the network reachable right now?".
///
/// Injected into the repository so tests can pin the answer.
#[async_trait]
pub trait NetworkMonitor: Send + Sync + Debug {
    async fn is_connected(&self) -> bool;
}

/// Connectivity probe that attempts a TCP connect to the weather API host.
///
/// Reachability of the host we are about to talk to stands in for "online";
/// any failure, including DNS resolution and the timeout, counts as offline.
#[derive(Debug, Clone)]
pub struct TcpProbe {
    host: String,
    port: u16,
}

impl TcpProbe {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Probe the host of an `http(s)://host[:port]/...` base URL.
    pub fn for_base_url(base_url: &str) -> Self {
        let stripped = base_url
            .strip_prefix("https://")
            .or_else(|| base_url.strip_prefix("http://"))
            .unwrap_or(base_url);
        let authority = stripped.split('/').next().unwrap_or("");

        match authority.rsplit_once(':') {
            Some((host, port)) => Self::new(host, port.parse().unwrap_or(443)),
            None => Self::new(authority, 443),
        }
    }
}

#[async_trait]
impl NetworkMonitor for TcpProbe {
    async fn is_connected(&self) -> bool {
        let address = (self.host.as_str(), self.port);
        match timeout(PROBE_TIMEOUT, TcpStream::connect(address)).await {
            Ok(Ok(_)) => true,
            Ok(Err(e)) => {
                tracing::debug!(host = %self.host, error = %e, "connectivity probe failed");
                false
            }
            Err(_) => {
                tracing::debug!(host = %self.host, "connectivity probe timed out");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    #[test]
    fn base_url_host_and_port_are_extracted() {
        let probe = TcpProbe::for_base_url("https://api.openweathermap.org/data/2.5");
        assert_eq!(probe.host, "api.openweathermap.org");
        assert_eq!(probe.port, 443);

        let probe = TcpProbe::for_base_url("http://127.0.0.1:8080/data/2.5");
        assert_eq!(probe.host, "127.0.0.1");
        assert_eq!(probe.port, 8080);
    }

    #[tokio::test]
    async fn reachable_host_reports_connected() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let probe = TcpProbe::new("127.0.0.1", port);
        assert!(probe.is_connected().await);
    }

    #[tokio::test]
    async fn closed_port_reports_offline() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let probe = TcpProbe::new("127.0.0.1", port);
        assert!(!probe.is_connected().await);
    }
}
