//! The connection primitive managed by the pool
//!
//! The pool never speaks the wire protocol itself. It drives an injected
//! connection object through connect, optional transport upgrade, and bind,
//! and consults its liveness. Anything implementing [`LdapConnection`] can
//! be pooled: a real `ldap3`-backed session, a proxy, or a test double.

use crate::errors::{BindError, ConnectError};

/// Protocol version passed to every bind the pool performs.
pub const LDAP_VERSION3: u8 = 3;

/// A single protocol session over one physical socket.
///
/// All methods take `&mut self`: the pool serializes access to a session
/// through a per-group lock, so implementations do not need their own
/// synchronization.
pub trait LdapConnection: Send {
    /// Establish the physical socket to the server.
    ///
    /// Called once per session during pool construction and again on first
    /// use whenever [`is_alive`](Self::is_alive) reports false.
    fn connect(&mut self, host: &str, port: u16) -> Result<(), ConnectError>;

    /// Upgrade the established socket to the secure transport.
    ///
    /// Only invoked when the pool is configured for StartTLS, immediately
    /// after a successful `connect`.
    fn upgrade_transport(&mut self) -> Result<(), ConnectError>;

    /// Authenticate the session. A later bind replaces the session's
    /// effective identity for every handle multiplexed over it.
    fn bind(
        &mut self,
        version: u8,
        principal: Option<&str>,
        secret: Option<&[u8]>,
    ) -> Result<(), BindError>;

    /// Whether the underlying socket is still usable.
    fn is_alive(&self) -> bool;
}
