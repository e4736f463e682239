//! Connectivity checks for the network constraint.

use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

use reqwest::Url;

const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Answers whether the network is currently usable.
pub trait Connectivity: Send + Sync {
    fn is_available(&self) -> bool;
}

/// Checks reachability by opening a TCP connection to the generator host.
#[derive(Debug, Clone)]
pub struct TcpConnectivity {
    host: String,
    port: u16,
    timeout: Duration,
}

impl TcpConnectivity {
    #[must_use]
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self { host: host.into(), port, timeout: DEFAULT_CONNECT_TIMEOUT }
    }

    /// Derives host and port from an API base URL.
    ///
    /// Returns `None` if the URL cannot be parsed or has no host.
    #[must_use]
    pub fn from_base_url(base_url: &str) -> Option<Self> {
        let url = Url::parse(base_url).ok()?;
        let host = url.host_str()?.to_string();
        let port = url.port_or_known_default()?;
        Some(Self::new(host, port))
    }

    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn addresses(&self) -> Vec<SocketAddr> {
        match (self.host.as_str(), self.port).to_socket_addrs() {
            Ok(addrs) => addrs.collect(),
            Err(err) => {
                tracing::debug!(host = %self.host, error = %err, "name resolution failed");
                Vec::new()
            }
        }
    }
}

impl Connectivity for TcpConnectivity {
    fn is_available(&self) -> bool {
        self.addresses()
            .iter()
            .any(|addr| TcpStream::connect_timeout(addr, self.timeout).is_ok())
    }
}

/// Connectivity that always reports the network as available.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysOnline;

impl Connectivity for AlwaysOnline {
    fn is_available(&self) -> bool { true }
}
