//! Health monitoring for the connection pool

/// Health status of a connection pool
///
/// # Examples
///
/// ```
/// use ldappool::{LdapPool, PoolConfig};
/// # use ldappool::{LdapConnection, ConnectError, BindError};
/// # struct Stub(bool);
/// # impl LdapConnection for Stub {
/// #     fn connect(&mut self, _: &str, _: u16) -> Result<(), ConnectError> { self.0 = true; Ok(()) }
/// #     fn upgrade_transport(&mut self) -> Result<(), ConnectError> { Ok(()) }
/// #     fn bind(&mut self, _: u8, _: Option<&str>, _: Option<&[u8]>) -> Result<(), BindError> { Ok(()) }
/// #     fn is_alive(&self) -> bool { self.0 }
/// # }
///
/// let config = PoolConfig::new("localhost", 389).with_max_conns(2).with_max_shared_conns(2);
/// let pool = LdapPool::new(config, || Stub(false)).unwrap();
///
/// let health = pool.get_health_status();
/// assert!(health.is_healthy());
/// assert_eq!(health.available_groups, 2);
/// ```
#[derive(Debug, Clone)]
#[cfg_attr(feature = "metrics", derive(serde::Serialize))]
pub struct HealthStatus {
    /// Whether the pool is healthy.
    pub is_healthy: bool,

    /// Number of warnings detected.
    pub warning_count: usize,

    /// Current handle utilization (0.0 to 1.0).
    pub utilization: f64,

    /// Groups sitting in the available registry.
    pub available_groups: usize,

    /// Handles currently checked out.
    pub checked_out_handles: usize,

    /// Total logical handle capacity.
    pub total_capacity: usize,

    /// Warning messages.
    pub warnings: Vec<String>,
}

impl HealthStatus {
    /// Derive a status from live pool counts.
    pub(crate) fn new(available_groups: usize, checked_out: usize, capacity: usize) -> Self {
        let utilization = if capacity > 0 {
            checked_out as f64 / capacity as f64
        } else {
            0.0
        };

        let mut warnings = Vec::new();
        let mut is_healthy = true;

        if utilization > 0.9 {
            warnings.push(format!("High utilization: {:.1}%", utilization * 100.0));
            is_healthy = false;
        }

        if available_groups == 0 && capacity > 0 {
            warnings.push("No available groups; new identities will block".to_string());
        }

        Self {
            is_healthy,
            warning_count: warnings.len(),
            utilization,
            available_groups,
            checked_out_handles: checked_out,
            total_capacity: capacity,
            warnings,
        }
    }

    /// Check if the pool is healthy.
    pub fn is_healthy(&self) -> bool {
        self.is_healthy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn saturated_pool_is_flagged() {
        let health = HealthStatus::new(0, 4, 4);
        assert!(!health.is_healthy());
        assert_eq!(health.warning_count, 2);
        assert!((health.utilization - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn idle_pool_is_healthy() {
        let health = HealthStatus::new(2, 0, 4);
        assert!(health.is_healthy());
        assert!(health.warnings.is_empty());
    }
}
