//! Pool configuration options

use std::time::Duration;

/// Transport selection for the physical sockets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Transport {
    /// Plain TCP.
    #[default]
    Plain,

    /// Upgrade each socket with StartTLS immediately after connecting.
    StartTls,
}

/// Configuration for the connection pool, fixed at construction
///
/// # Examples
///
/// ```
/// use ldappool::{PoolConfig, Transport};
/// use std::time::Duration;
///
/// let config = PoolConfig::new("ldap.example.com", 389)
///     .with_max_conns(4)
///     .with_max_shared_conns(8)
///     .with_starttls()
///     .with_timeout(Duration::from_secs(10));
///
/// assert_eq!(config.max_conns, 4);
/// assert_eq!(config.max_shared_conns, 8);
/// assert_eq!(config.transport, Transport::StartTls);
/// ```
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Directory server host.
    pub host: String,

    /// Directory server port.
    pub port: u16,

    /// Number of physical sockets the pool opens.
    pub max_conns: usize,

    /// Logical handles multiplexed over each physical socket.
    pub max_shared_conns: usize,

    /// Transport variant for the physical sockets.
    pub transport: Transport,

    /// Timeout for the async acquisition methods.
    pub operation_timeout: Option<Duration>,
}

impl PoolConfig {
    /// Create a configuration for the given server with default sizing.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            max_conns: 5,
            max_shared_conns: 10,
            transport: Transport::Plain,
            operation_timeout: Some(Duration::from_secs(30)),
        }
    }

    /// Set the number of physical sockets.
    ///
    /// # Examples
    ///
    /// ```
    /// use ldappool::PoolConfig;
    ///
    /// let config = PoolConfig::new("localhost", 389).with_max_conns(2);
    /// assert_eq!(config.max_conns, 2);
    /// ```
    pub fn with_max_conns(mut self, count: usize) -> Self {
        self.max_conns = count;
        self
    }

    /// Set the handle fan-out per physical socket.
    pub fn with_max_shared_conns(mut self, count: usize) -> Self {
        self.max_shared_conns = count;
        self
    }

    /// Upgrade every socket with StartTLS after connecting.
    pub fn with_starttls(mut self) -> Self {
        self.transport = Transport::StartTls;
        self
    }

    /// Set the timeout used by the async acquisition methods.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.operation_timeout = Some(timeout);
        self
    }

    /// Total logical handle capacity of the pool.
    pub fn capacity(&self) -> usize {
        self.max_conns * self.max_shared_conns
    }
}
