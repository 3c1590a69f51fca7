//! The connection pool: admission, rebinding, release, and shutdown

use crate::config::{PoolConfig, Transport};
use crate::conn::{LDAP_VERSION3, LdapConnection};
use crate::errors::{PoolError, PoolResult};
use crate::group::HandleGroup;
use crate::health::HealthStatus;
use crate::identity::BindIdentity;
use crate::metrics::{MetricsExporter, MetricsTracker, PoolMetrics};
use crate::registry::{GroupRegistry, Membership};

use dashmap::DashMap;
use parking_lot::MutexGuard;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{debug, error, warn};

/// A checked-out handle that automatically returns to the pool when dropped
///
/// While the guard lives, no other caller can check out the same handle;
/// the underlying session may still be shared with sibling handles bound
/// under the same identity.
pub struct PooledHandle<C: LdapConnection> {
    pool: Arc<PoolInner<C>>,
    group: Arc<HandleGroup<C>>,
    slot: usize,
}

impl<C: LdapConnection> PooledHandle<C> {
    /// Stable id of the logical handle backing this guard.
    pub fn id(&self) -> usize {
        self.group.handle(self.slot).id()
    }

    /// The identity the underlying session is currently bound as.
    pub fn identity(&self) -> BindIdentity {
        self.group.identity()
    }

    /// Lock the shared session for traffic. Siblings bound under the same
    /// identity contend on this lock per operation.
    pub fn session(&self) -> MutexGuard<'_, C> {
        self.group.lock_session()
    }

    /// Return the handle to the pool immediately (equivalent to dropping it).
    pub fn release(self) {}
}

impl<C: LdapConnection> std::fmt::Debug for PooledHandle<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PooledHandle")
            .field("id", &self.id())
            .field("slot", &self.slot)
            .finish()
    }
}

impl<C: LdapConnection> Drop for PooledHandle<C> {
    fn drop(&mut self) {
        self.pool.release_slot(&self.group, self.slot);
    }
}

/// Thread-safe LDAP connection pool
///
/// Opens a fixed set of physical sessions at construction, multiplexes a
/// fixed number of logical handles over each, serves concurrent callers
/// that request a handle bound under specific credentials, and rebinds
/// sessions across identities when demand requires it.
pub struct LdapPool<C: LdapConnection> {
    inner: Arc<PoolInner<C>>,
}

struct PoolInner<C: LdapConnection> {
    config: PoolConfig,
    in_use: GroupRegistry<C>,
    available: GroupRegistry<C>,
    checked_out: DashMap<usize, ()>,
    metrics: MetricsTracker,
    shutting_down: AtomicBool,
}

impl<C: LdapConnection + 'static> LdapPool<C> {
    /// Create a pool, opening `max_conns` sessions produced by `factory`.
    ///
    /// A session that fails to connect is logged and its group is still
    /// inserted; the first caller to claim it pays the reconnect cost.
    pub fn new<F>(config: PoolConfig, factory: F) -> PoolResult<Self>
    where
        F: Fn() -> C,
    {
        if config.max_conns == 0 || config.max_shared_conns == 0 {
            return Err(PoolError::Config(
                "max_conns and max_shared_conns must both be at least 1".to_string(),
            ));
        }

        let inner = PoolInner {
            in_use: GroupRegistry::new(),
            available: GroupRegistry::new(),
            checked_out: DashMap::new(),
            metrics: MetricsTracker::new(),
            shutting_down: AtomicBool::new(false),
            config,
        };

        for group_id in 0..inner.config.max_conns {
            let mut conn = factory();
            let established = inner.establish(&mut conn);
            match established {
                Ok(()) => {
                    debug!(group = group_id, host = %inner.config.host, "session established")
                }
                Err(error) => {
                    // Degraded group: inserted anyway, reconnected lazily on
                    // first use because is_alive reports false.
                    warn!(group = group_id, %error, "failed to establish session, deferring to first use")
                }
            }

            let first_handle_id = group_id * inner.config.max_shared_conns;
            inner.available.push(Arc::new(HandleGroup::new(
                group_id,
                conn,
                inner.config.max_shared_conns,
                first_handle_id,
            )));
        }

        Ok(Self {
            inner: Arc::new(inner),
        })
    }

    /// Acquire a handle whose session is bound as `identity`, blocking
    /// while every session is checked out under other identities.
    ///
    /// Returns `Ok(None)` once the pool is shutting down; callers must
    /// treat that as a normal outcome, not an error.
    pub fn acquire(&self, identity: &BindIdentity) -> PoolResult<Option<PooledHandle<C>>> {
        let admitted = self.inner.admit(identity, true)?;
        Ok(admitted.map(|(group, slot)| self.guard(group, slot)))
    }

    /// Non-blocking variant of [`acquire`](Self::acquire): `Ok(None)` when
    /// nothing is available right now or the pool is shutting down.
    pub fn try_acquire(&self, identity: &BindIdentity) -> PoolResult<Option<PooledHandle<C>>> {
        let admitted = self.inner.admit(identity, false)?;
        Ok(admitted.map(|(group, slot)| self.guard(group, slot)))
    }

    /// Acquire a handle asynchronously, bounded by the configured
    /// operation timeout.
    pub async fn acquire_async(
        &self,
        identity: &BindIdentity,
    ) -> PoolResult<Option<PooledHandle<C>>> {
        let timeout = self
            .inner
            .config
            .operation_timeout
            .unwrap_or(Duration::from_secs(30));

        tokio::time::timeout(timeout, async {
            loop {
                if self.inner.shutting_down.load(Ordering::Acquire) {
                    return Ok(None);
                }
                match self.try_acquire(identity)? {
                    Some(handle) => return Ok(Some(handle)),
                    None => tokio::time::sleep(Duration::from_millis(10)).await,
                }
            }
        })
        .await
        .map_err(|_| PoolError::Timeout(timeout))?
    }

    /// Stop admitting new acquisitions and wake every blocked caller; each
    /// observes the shutdown and receives `Ok(None)`. Sessions held by
    /// in-use groups are not force-closed.
    pub fn shutdown(&self) {
        self.inner.shutdown();
    }

    pub fn is_shutting_down(&self) -> bool {
        self.inner.shutting_down.load(Ordering::Acquire)
    }

    /// Groups currently sitting in the available registry.
    pub fn available_groups(&self) -> usize {
        self.inner.available.len()
    }

    /// Handles currently checked out across all groups.
    pub fn checked_out_handles(&self) -> usize {
        self.inner.checked_out.len()
    }

    /// Total logical handle capacity.
    pub fn capacity(&self) -> usize {
        self.inner.config.capacity()
    }

    /// Get health status.
    pub fn get_health_status(&self) -> HealthStatus {
        HealthStatus::new(
            self.inner.available.len(),
            self.inner.checked_out.len(),
            self.capacity(),
        )
    }

    /// Get pool metrics.
    pub fn get_metrics(&self) -> PoolMetrics {
        self.inner.metrics.get_metrics(
            self.inner.checked_out.len(),
            self.inner.available.len(),
            self.capacity(),
        )
    }

    /// Export metrics as a string map.
    pub fn export_metrics(&self) -> HashMap<String, String> {
        self.get_metrics().export()
    }

    /// Export metrics in Prometheus format.
    pub fn export_metrics_prometheus(
        &self,
        pool_name: &str,
        tags: Option<&HashMap<String, String>>,
    ) -> String {
        MetricsExporter::export_prometheus(&self.get_metrics(), pool_name, tags)
    }

    fn guard(&self, group: Arc<HandleGroup<C>>, slot: usize) -> PooledHandle<C> {
        PooledHandle {
            pool: Arc::clone(&self.inner),
            group,
            slot,
        }
    }
}

impl<C: LdapConnection> Drop for LdapPool<C> {
    fn drop(&mut self) {
        self.inner.shutdown();
    }
}

impl<C: LdapConnection> PoolInner<C> {
    fn establish(&self, conn: &mut C) -> PoolResult<()> {
        conn.connect(&self.config.host, self.config.port)?;
        if self.config.transport == Transport::StartTls {
            conn.upgrade_transport()?;
        }
        Ok(())
    }

    /// Admission: fast path (share an in-use group bound correctly), warm
    /// path (claim an available group bound correctly), cold path (take the
    /// oldest available group and rebind it). `blocking` selects whether
    /// the cold path waits or bails out with `Ok(None)`.
    fn admit(
        &self,
        wanted: &BindIdentity,
        blocking: bool,
    ) -> PoolResult<Option<(Arc<HandleGroup<C>>, usize)>> {
        if self.shutting_down.load(Ordering::Acquire) {
            return Ok(None);
        }

        if let Some((group, slot)) = self.in_use.claim_idle_matching(wanted) {
            debug!(group = group.id(), slot, "sharing in-use session");
            self.metrics.fast_path_hits.fetch_add(1, Ordering::Relaxed);
            return Ok(Some(self.hand_out(group, slot)));
        }

        let (group, rebind_required) = match self.available.take_matching(wanted) {
            Some(group) => {
                self.metrics.warm_path_hits.fetch_add(1, Ordering::Relaxed);
                (group, false)
            }
            None => {
                self.metrics.cold_waits.fetch_add(1, Ordering::Relaxed);
                let taken = if blocking {
                    self.available.take_front_blocking(&self.shutting_down)
                } else {
                    self.available.try_take_front()
                };
                match taken {
                    Some(group) => (group, true),
                    None => return Ok(None),
                }
            }
        };

        // The group came off the available registry, so every slot is idle.
        let slot = match group.claim_idle() {
            Some(slot) => slot,
            None => {
                error!(group = group.id(), "available group had no idle handle");
                self.available.push_and_wake_one(group);
                return Err(PoolError::Internal(
                    "available group had no idle handle".to_string(),
                ));
            }
        };

        // Outside any registry lock: the bind may block on network i/o.
        if rebind_required || !group.session_alive() {
            if let Err(error) = self.rebind(&group, wanted) {
                group.release_slot(slot);
                group.clear_identity();
                self.metrics.bind_failures.fetch_add(1, Ordering::Relaxed);
                self.available.push_and_wake_one(group);
                return Err(error);
            }
            self.metrics.rebinds.fetch_add(1, Ordering::Relaxed);
            group.set_identity(wanted.clone());
        }

        let out = self.hand_out(group, slot);
        self.in_use.push(Arc::clone(&out.0));
        Ok(Some(out))
    }

    /// Re-authenticate a claimed group's session, reconnecting first when
    /// the socket has died.
    fn rebind(&self, group: &HandleGroup<C>, wanted: &BindIdentity) -> PoolResult<()> {
        let mut session = group.lock_session();
        if !session.is_alive() {
            debug!(group = group.id(), "session not alive, reconnecting");
            session.connect(&self.config.host, self.config.port)?;
            if self.config.transport == Transport::StartTls {
                session.upgrade_transport()?;
            }
        }
        session.bind(LDAP_VERSION3, wanted.principal(), wanted.secret())?;
        debug!(group = group.id(), "session rebound");
        Ok(())
    }

    fn hand_out(&self, group: Arc<HandleGroup<C>>, slot: usize) -> (Arc<HandleGroup<C>>, usize) {
        self.checked_out.insert(group.handle(slot).id(), ());
        self.metrics.total_acquired.fetch_add(1, Ordering::Relaxed);
        (group, slot)
    }

    /// Idempotent release. Clears the slot's in-use flag and, once the
    /// whole group is idle, migrates it back to the available registry and
    /// wakes one waiter.
    fn release_slot(&self, group: &Arc<HandleGroup<C>>, slot: usize) {
        let was_checked_out = group.release_slot(slot);
        self.checked_out.remove(&group.handle(slot).id());
        if was_checked_out {
            self.metrics.total_released.fetch_add(1, Ordering::Relaxed);
        }

        match self.in_use.remove_when_idle(group) {
            Membership::Removed => {
                debug!(group = group.id(), "group idle, recycling to available");
                self.available.push_and_wake_one(Arc::clone(group));
            }
            Membership::Retained => {}
            Membership::Absent => {
                // A handle released twice may already be visible on the
                // available side; anything else is a bookkeeping fault.
                if !self.available.contains(group) {
                    error!(group = group.id(), "released handle belongs to no registry");
                }
            }
        }
    }

    fn shutdown(&self) {
        if !self.shutting_down.swap(true, Ordering::AcqRel) {
            debug!("pool shutting down, waking all waiters");
            self.available.wake_all();
        }
    }
}
