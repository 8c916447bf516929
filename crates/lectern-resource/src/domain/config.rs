//! Resource server configuration.
//!
//! [`ResourceServerConfig`] is a plain struct with no environment reads; the
//! binary fills it from CLI arguments and the control surface fills it from
//! its TOML file.

use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;

/// Default TCP port of the resource server.
pub const DEFAULT_RESOURCE_PORT: u16 = 24901;

/// All runtime configuration for the resource server.
///
/// # Example
///
/// ```rust
/// use lectern_resource::domain::ResourceServerConfig;
///
/// let cfg = ResourceServerConfig::new("/srv/lectern/media");
/// assert_eq!(cfg.bind_addr.port(), 24901);
/// assert!(cfg.bind_addr.ip().is_loopback());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceServerConfig {
    /// Loopback by default: only the local output surface should reach it.
    pub bind_addr: SocketAddr,
    /// The allowed root.  Nothing outside it is ever served.
    pub root: PathBuf,
}

impl ResourceServerConfig {
    /// Config for `root` on the default loopback address.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            bind_addr: SocketAddr::from((Ipv4Addr::LOCALHOST, DEFAULT_RESOURCE_PORT)),
            root: root.into(),
        }
    }

    pub fn with_bind_addr(mut self, bind_addr: SocketAddr) -> Self {
        self.bind_addr = bind_addr;
        self
    }
}
