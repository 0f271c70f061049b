//! TCP connectivity probing.

use std::fmt;
use std::future::Future;
use std::io;
use std::net::IpAddr;
use std::time::Duration;

use serde::Serialize;
use tokio::net::TcpStream;
use tokio::time;

/// Network address of a backing service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
}

impl Endpoint {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Host without IPv6 brackets, suitable for resolution.
    pub fn bare_host(&self) -> &str {
        let host = self.host.trim();
        host.strip_prefix('[')
            .and_then(|h| h.strip_suffix(']'))
            .unwrap_or(host)
    }

    /// Whether the endpoint refers to this container.
    pub fn is_loopback(&self) -> bool {
        let host = self.bare_host();
        host.is_empty()
            || host.eq_ignore_ascii_case("localhost")
            || host
                .parse::<IpAddr>()
                .map(|ip| ip.is_loopback())
                .unwrap_or(false)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.bare_host().contains(':') {
            write!(f, "[{}]:{}", self.bare_host(), self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

/// A single readiness check against an endpoint.
pub trait DependencyProbe {
    fn probe(&self, endpoint: &Endpoint) -> impl Future<Output = io::Result<()>> + Send;
}

/// Probe that succeeds once a TCP connection is accepted.
#[derive(Debug, Clone)]
pub struct TcpProbe {
    connect_timeout: Duration,
}

impl TcpProbe {
    pub fn new(connect_timeout: Duration) -> Self {
        Self { connect_timeout }
    }
}

impl Default for TcpProbe {
    fn default() -> Self {
        Self::new(Duration::from_secs(1))
    }
}

impl DependencyProbe for TcpProbe {
    async fn probe(&self, endpoint: &Endpoint) -> io::Result<()> {
        let connect = TcpStream::connect((endpoint.bare_host(), endpoint.port));
        match time::timeout(self.connect_timeout, connect).await {
            Ok(Ok(_stream)) => Ok(()),
            Ok(Err(e)) => Err(e),
            Err(_) => Err(io::Error::new(
                io::ErrorKind::TimedOut,
                format!("connect timed out after {:?}", self.connect_timeout),
            )),
        }
    }
}
