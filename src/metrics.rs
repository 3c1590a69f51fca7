//! Metrics collection and export for the connection pool

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Point-in-time metrics snapshot for a pool
///
/// # Examples
///
/// ```
/// use ldappool::{BindIdentity, LdapPool, PoolConfig};
/// # use ldappool::{LdapConnection, ConnectError, BindError};
/// # struct Stub(bool);
/// # impl LdapConnection for Stub {
/// #     fn connect(&mut self, _: &str, _: u16) -> Result<(), ConnectError> { self.0 = true; Ok(()) }
/// #     fn upgrade_transport(&mut self) -> Result<(), ConnectError> { Ok(()) }
/// #     fn bind(&mut self, _: u8, _: Option<&str>, _: Option<&[u8]>) -> Result<(), BindError> { Ok(()) }
/// #     fn is_alive(&self) -> bool { self.0 }
/// # }
///
/// let config = PoolConfig::new("localhost", 389).with_max_conns(1).with_max_shared_conns(2);
/// let pool = LdapPool::new(config, || Stub(false)).unwrap();
///
/// let handle = pool.acquire(&BindIdentity::anonymous()).unwrap().unwrap();
/// let metrics = pool.get_metrics();
/// assert_eq!(metrics.total_acquired, 1);
/// assert_eq!(metrics.checked_out_handles, 1);
/// # drop(handle);
/// ```
#[derive(Debug, Clone)]
#[cfg_attr(feature = "metrics", derive(serde::Serialize))]
pub struct PoolMetrics {
    /// Handles returned to callers over the pool's lifetime.
    pub total_acquired: usize,

    /// Handles given back over the pool's lifetime.
    pub total_released: usize,

    /// Acquisitions served from an in-use group already bound correctly.
    pub fast_path_hits: usize,

    /// Acquisitions served from an available group already bound correctly.
    pub warm_path_hits: usize,

    /// Times a claimed session was re-authenticated under new credentials.
    pub rebinds: usize,

    /// Rebind attempts that failed, either reconnecting or binding.
    pub bind_failures: usize,

    /// Acquisitions that found no session bound to the requested identity
    /// and fell through to the cold path.
    pub cold_waits: usize,

    /// Handles currently checked out.
    pub checked_out_handles: usize,

    /// Groups currently sitting in the available registry.
    pub available_groups: usize,

    /// Handle utilization ratio (0.0 to 1.0).
    pub utilization: f64,

    /// Total logical handle capacity.
    pub capacity: usize,
}

impl PoolMetrics {
    /// Export metrics as a string map.
    pub fn export(&self) -> HashMap<String, String> {
        let mut metrics = HashMap::new();
        metrics.insert("total_acquired".to_string(), self.total_acquired.to_string());
        metrics.insert("total_released".to_string(), self.total_released.to_string());
        metrics.insert("fast_path_hits".to_string(), self.fast_path_hits.to_string());
        metrics.insert("warm_path_hits".to_string(), self.warm_path_hits.to_string());
        metrics.insert("rebinds".to_string(), self.rebinds.to_string());
        metrics.insert("bind_failures".to_string(), self.bind_failures.to_string());
        metrics.insert("cold_waits".to_string(), self.cold_waits.to_string());
        metrics.insert(
            "checked_out_handles".to_string(),
            self.checked_out_handles.to_string(),
        );
        metrics.insert(
            "available_groups".to_string(),
            self.available_groups.to_string(),
        );
        metrics.insert("utilization".to_string(), format!("{:.2}", self.utilization));
        metrics.insert("capacity".to_string(), self.capacity.to_string());
        metrics
    }
}

/// Metrics exporter for Prometheus format
pub struct MetricsExporter;

impl MetricsExporter {
    /// Export metrics in Prometheus exposition format.
    pub fn export_prometheus(
        metrics: &PoolMetrics,
        pool_name: &str,
        tags: Option<&HashMap<String, String>>,
    ) -> String {
        let mut output = String::new();
        let labels = Self::format_labels(pool_name, tags);

        // Gauge metrics
        output.push_str("# HELP ldappool_handles_checked_out Handles currently checked out\n");
        output.push_str("# TYPE ldappool_handles_checked_out gauge\n");
        output.push_str(&format!(
            "ldappool_handles_checked_out{{{}}} {}\n",
            labels, metrics.checked_out_handles
        ));

        output.push_str("# HELP ldappool_groups_available Groups currently available\n");
        output.push_str("# TYPE ldappool_groups_available gauge\n");
        output.push_str(&format!(
            "ldappool_groups_available{{{}}} {}\n",
            labels, metrics.available_groups
        ));

        output.push_str("# HELP ldappool_utilization Handle utilization ratio\n");
        output.push_str("# TYPE ldappool_utilization gauge\n");
        output.push_str(&format!(
            "ldappool_utilization{{{}}} {:.2}\n",
            labels, metrics.utilization
        ));

        // Counter metrics
        output.push_str("# HELP ldappool_handles_acquired_total Total handles acquired\n");
        output.push_str("# TYPE ldappool_handles_acquired_total counter\n");
        output.push_str(&format!(
            "ldappool_handles_acquired_total{{{}}} {}\n",
            labels, metrics.total_acquired
        ));

        output.push_str("# HELP ldappool_handles_released_total Total handles released\n");
        output.push_str("# TYPE ldappool_handles_released_total counter\n");
        output.push_str(&format!(
            "ldappool_handles_released_total{{{}}} {}\n",
            labels, metrics.total_released
        ));

        output.push_str("# HELP ldappool_rebinds_total Sessions re-authenticated\n");
        output.push_str("# TYPE ldappool_rebinds_total counter\n");
        output.push_str(&format!(
            "ldappool_rebinds_total{{{}}} {}\n",
            labels, metrics.rebinds
        ));

        output.push_str("# HELP ldappool_bind_failures_total Failed bind attempts\n");
        output.push_str("# TYPE ldappool_bind_failures_total counter\n");
        output.push_str(&format!(
            "ldappool_bind_failures_total{{{}}} {}\n",
            labels, metrics.bind_failures
        ));

        output.push_str("# HELP ldappool_cold_waits_total Acquisitions that blocked\n");
        output.push_str("# TYPE ldappool_cold_waits_total counter\n");
        output.push_str(&format!(
            "ldappool_cold_waits_total{{{}}} {}\n",
            labels, metrics.cold_waits
        ));

        output
    }

    /// Export metrics into a freshly built `prometheus::Registry`, for
    /// callers that scrape through the prometheus crate instead of the
    /// text format.
    #[cfg(feature = "metrics")]
    pub fn export_registry(
        metrics: &PoolMetrics,
        pool_name: &str,
    ) -> Result<prometheus::Registry, prometheus::Error> {
        use prometheus::{IntCounter, IntGauge, Opts, Registry};

        let registry = Registry::new();

        let gauges = [
            (
                "ldappool_handles_checked_out",
                "Handles currently checked out",
                metrics.checked_out_handles,
            ),
            (
                "ldappool_groups_available",
                "Groups currently available",
                metrics.available_groups,
            ),
        ];
        for (name, help, value) in gauges {
            let gauge =
                IntGauge::with_opts(Opts::new(name, help).const_label("pool", pool_name))?;
            gauge.set(value as i64);
            registry.register(Box::new(gauge))?;
        }

        let counters = [
            (
                "ldappool_handles_acquired_total",
                "Total handles acquired",
                metrics.total_acquired,
            ),
            (
                "ldappool_handles_released_total",
                "Total handles released",
                metrics.total_released,
            ),
            (
                "ldappool_rebinds_total",
                "Sessions re-authenticated",
                metrics.rebinds,
            ),
            (
                "ldappool_bind_failures_total",
                "Failed bind attempts",
                metrics.bind_failures,
            ),
            (
                "ldappool_cold_waits_total",
                "Acquisitions that blocked",
                metrics.cold_waits,
            ),
        ];
        for (name, help, value) in counters {
            let counter =
                IntCounter::with_opts(Opts::new(name, help).const_label("pool", pool_name))?;
            counter.inc_by(value as u64);
            registry.register(Box::new(counter))?;
        }

        Ok(registry)
    }

    fn format_labels(pool_name: &str, tags: Option<&HashMap<String, String>>) -> String {
        let mut labels = vec![format!("pool=\"{}\"", pool_name)];

        if let Some(tags) = tags {
            for (key, value) in tags {
                labels.push(format!("{}=\"{}\"", key, value));
            }
        }

        labels.join(",")
    }
}

/// Internal metrics tracker
pub(crate) struct MetricsTracker {
    pub total_acquired: AtomicUsize,
    pub total_released: AtomicUsize,
    pub fast_path_hits: AtomicUsize,
    pub warm_path_hits: AtomicUsize,
    pub rebinds: AtomicUsize,
    pub bind_failures: AtomicUsize,
    pub cold_waits: AtomicUsize,
}

impl MetricsTracker {
    pub fn new() -> Self {
        Self {
            total_acquired: AtomicUsize::new(0),
            total_released: AtomicUsize::new(0),
            fast_path_hits: AtomicUsize::new(0),
            warm_path_hits: AtomicUsize::new(0),
            rebinds: AtomicUsize::new(0),
            bind_failures: AtomicUsize::new(0),
            cold_waits: AtomicUsize::new(0),
        }
    }

    pub fn get_metrics(
        &self,
        checked_out: usize,
        available_groups: usize,
        capacity: usize,
    ) -> PoolMetrics {
        let utilization = if capacity > 0 {
            checked_out as f64 / capacity as f64
        } else {
            0.0
        };

        PoolMetrics {
            total_acquired: self.total_acquired.load(Ordering::Relaxed),
            total_released: self.total_released.load(Ordering::Relaxed),
            fast_path_hits: self.fast_path_hits.load(Ordering::Relaxed),
            warm_path_hits: self.warm_path_hits.load(Ordering::Relaxed),
            rebinds: self.rebinds.load(Ordering::Relaxed),
            bind_failures: self.bind_failures.load(Ordering::Relaxed),
            cold_waits: self.cold_waits.load(Ordering::Relaxed),
            checked_out_handles: checked_out,
            available_groups,
            utilization,
            capacity,
        }
    }
}

impl Default for MetricsTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> PoolMetrics {
        let tracker = MetricsTracker::new();
        tracker.total_acquired.store(7, Ordering::Relaxed);
        tracker.rebinds.store(2, Ordering::Relaxed);
        tracker.get_metrics(3, 1, 10)
    }

    #[test]
    fn snapshot_reflects_counters() {
        let metrics = sample();
        assert_eq!(metrics.total_acquired, 7);
        assert_eq!(metrics.rebinds, 2);
        assert_eq!(metrics.checked_out_handles, 3);
        assert!((metrics.utilization - 0.3).abs() < f64::EPSILON);
    }

    #[test]
    fn prometheus_text_carries_labels() {
        let metrics = sample();
        let mut tags = HashMap::new();
        tags.insert("service".to_string(), "directory".to_string());

        let output = MetricsExporter::export_prometheus(&metrics, "main", Some(&tags));
        assert!(output.contains("ldappool_handles_checked_out"));
        assert!(output.contains("pool=\"main\""));
        assert!(output.contains("service=\"directory\""));
        assert!(output.contains("ldappool_rebinds_total{pool=\"main\",service=\"directory\"} 2"));
    }

    #[cfg(feature = "metrics")]
    #[test]
    fn registry_export_registers_all_series() {
        let metrics = sample();
        let registry = MetricsExporter::export_registry(&metrics, "main").unwrap();
        let families = registry.gather();
        assert_eq!(families.len(), 7);
    }
}
