//! # ldappool
//!
//! Thread-safe LDAP connection pool that bounds the number of physical
//! sockets to a directory server, multiplexes several logical handles over
//! each socket, and transparently rebinds sockets to new credentials when
//! demand requires it.
//!
//! ## Features
//!
//! - Fixed set of physical sessions opened once at construction
//! - Handle fan-out: many concurrent callers share one authenticated socket
//! - Credential-aware reuse: requests for an identity prefer sessions
//!   already bound to it, avoiding needless rebinds
//! - Blocking, non-blocking, and async acquisition
//! - Automatic return of handles via RAII (Drop trait)
//! - Lazy recovery of sessions that failed to connect or died while idle
//! - Deterministic shutdown that wakes every blocked caller
//! - Health monitoring and metrics with Prometheus export
//!
//! The pool never speaks the wire protocol itself; callers inject any
//! [`LdapConnection`] implementation, from an `ldap3`-backed session to a
//! test double.
//!
//! ## Quick Start
//!
//! ```rust
//! use ldappool::{BindIdentity, ConnectError, BindError, LdapConnection, LdapPool, PoolConfig};
//!
//! struct MemoryConn {
//!     alive: bool,
//! }
//!
//! impl LdapConnection for MemoryConn {
//!     fn connect(&mut self, _host: &str, _port: u16) -> Result<(), ConnectError> {
//!         self.alive = true;
//!         Ok(())
//!     }
//!     fn upgrade_transport(&mut self) -> Result<(), ConnectError> {
//!         Ok(())
//!     }
//!     fn bind(
//!         &mut self,
//!         _version: u8,
//!         _principal: Option<&str>,
//!         _secret: Option<&[u8]>,
//!     ) -> Result<(), BindError> {
//!         Ok(())
//!     }
//!     fn is_alive(&self) -> bool {
//!         self.alive
//!     }
//! }
//!
//! let config = PoolConfig::new("ldap.example.com", 389)
//!     .with_max_conns(2)
//!     .with_max_shared_conns(4);
//! let pool = LdapPool::new(config, || MemoryConn { alive: false }).unwrap();
//!
//! let admin = BindIdentity::new("cn=admin,dc=example,dc=com", b"secret");
//! {
//!     let handle = pool.acquire(&admin).unwrap().expect("pool is not shutting down");
//!     assert!(handle.identity().matches(&admin));
//!     // use handle.session() for traffic; the handle returns to the
//!     // pool when it goes out of scope
//! }
//! assert_eq!(pool.checked_out_handles(), 0);
//! pool.shutdown();
//! ```

mod config;
mod conn;
mod errors;
mod group;
mod health;
mod identity;
mod metrics;
mod pool;
mod registry;

pub use config::{PoolConfig, Transport};
pub use conn::{LDAP_VERSION3, LdapConnection};
pub use errors::{BindError, ConnectError, PoolError, PoolResult};
pub use health::HealthStatus;
pub use identity::BindIdentity;
pub use metrics::{MetricsExporter, PoolMetrics};
pub use pool::{LdapPool, PooledHandle};
