use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::time::Duration;

pub const DEFAULT_BIND: SocketAddr =
    SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::new(127, 0, 0, 1), 2053));

/// Upper bound on a single forwarded lookup.
pub const DEFAULT_LOOKUP_TIMEOUT: Duration = Duration::from_secs(10);

/// Process-wide settings, fixed at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Local UDP address to serve on.
    pub bind: SocketAddr,
    /// Upstream resolver to forward questions to. Without one every
    /// question gets the placeholder answer.
    pub resolver: Option<SocketAddr>,
    pub lookup_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            bind: DEFAULT_BIND,
            resolver: None,
            lookup_timeout: DEFAULT_LOOKUP_TIMEOUT,
        }
    }
}

impl ServerConfig {
    pub fn with_resolver(mut self, resolver: Option<SocketAddr>) -> Self {
        self.resolver = resolver;
        self
    }
}
