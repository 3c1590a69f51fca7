//! Logical handles and the groups that multiplex them over one session

use parking_lot::{Mutex, MutexGuard};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::conn::LdapConnection;
use crate::identity::BindIdentity;

/// One logical handle over a shared physical session.
///
/// Duplicates of a handle share the same session object, hence the same
/// socket and the same authentication state.
pub(crate) struct Handle<C> {
    session: Arc<Mutex<C>>,
    in_use: AtomicBool,
    id: usize,
}

impl<C> Handle<C> {
    fn new(session: Arc<Mutex<C>>, id: usize) -> Self {
        Self {
            session,
            in_use: AtomicBool::new(false),
            id,
        }
    }

    /// Another idle handle over the same session.
    fn duplicate(&self, id: usize) -> Self {
        Self::new(Arc::clone(&self.session), id)
    }

    pub(crate) fn id(&self) -> usize {
        self.id
    }

    pub(crate) fn is_in_use(&self) -> bool {
        self.in_use.load(Ordering::Acquire)
    }

    fn try_claim(&self) -> bool {
        self.in_use
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Clear the in-use flag. Returns the previous value, so a double
    /// release reports false and is not counted twice.
    fn release(&self) -> bool {
        self.in_use.swap(false, Ordering::AcqRel)
    }
}

/// All logical handles multiplexed over one physical session, together with
/// the identity the session is currently bound under.
pub(crate) struct HandleGroup<C> {
    handles: Vec<Handle<C>>,
    identity: Mutex<BindIdentity>,
    id: usize,
}

impl<C> HandleGroup<C> {
    /// Build a group of `fan_out` handles sharing `conn`. The first handle
    /// owns the fresh session; the rest are duplicates of it. Handle ids
    /// start at `first_handle_id` and are contiguous.
    pub(crate) fn new(id: usize, conn: C, fan_out: usize, first_handle_id: usize) -> Self {
        let session = Arc::new(Mutex::new(conn));
        let mut handles = Vec::with_capacity(fan_out);
        handles.push(Handle::new(session, first_handle_id));
        for offset in 1..fan_out {
            let dup = handles[0].duplicate(first_handle_id + offset);
            handles.push(dup);
        }
        Self {
            handles,
            identity: Mutex::new(BindIdentity::anonymous()),
            id,
        }
    }

    pub(crate) fn id(&self) -> usize {
        self.id
    }

    pub(crate) fn fan_out(&self) -> usize {
        self.handles.len()
    }

    pub(crate) fn handle(&self, slot: usize) -> &Handle<C> {
        &self.handles[slot]
    }

    /// True iff no member handle is checked out.
    pub(crate) fn all_available(&self) -> bool {
        self.handles.iter().all(|h| !h.is_in_use())
    }

    /// Claim the first idle handle, in fixed index order.
    pub(crate) fn claim_idle(&self) -> Option<usize> {
        self.handles.iter().position(|h| h.try_claim())
    }

    /// Release the handle in `slot`. Returns whether it was checked out.
    pub(crate) fn release_slot(&self, slot: usize) -> bool {
        self.handles[slot].release()
    }

    /// Lock the shared session for traffic or a (re)bind.
    pub(crate) fn lock_session(&self) -> MutexGuard<'_, C> {
        self.handles[0].session.lock()
    }

    pub(crate) fn identity(&self) -> BindIdentity {
        self.identity.lock().clone()
    }

    pub(crate) fn identity_matches(&self, wanted: &BindIdentity) -> bool {
        self.identity.lock().matches(wanted)
    }

    /// Record a successful bind: the whole group is now this identity.
    pub(crate) fn set_identity(&self, identity: BindIdentity) {
        *self.identity.lock() = identity;
    }

    /// Forget the recorded identity after a failed bind.
    pub(crate) fn clear_identity(&self) {
        *self.identity.lock() = BindIdentity::anonymous();
    }
}

impl<C: LdapConnection> HandleGroup<C> {
    pub(crate) fn session_alive(&self) -> bool {
        self.lock_session().is_alive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn claim_follows_index_order() {
        let group = HandleGroup::new(0, (), 3, 0);
        assert_eq!(group.claim_idle(), Some(0));
        assert_eq!(group.claim_idle(), Some(1));
        assert_eq!(group.claim_idle(), Some(2));
        assert_eq!(group.claim_idle(), None);
    }

    #[test]
    fn release_is_idempotent() {
        let group = HandleGroup::new(0, (), 2, 0);
        let slot = group.claim_idle().unwrap();
        assert!(!group.all_available());
        assert!(group.release_slot(slot));
        assert!(!group.release_slot(slot));
        assert!(group.all_available());
    }

    #[test]
    fn duplicates_share_one_session() {
        let group = HandleGroup::new(0, 7u32, 4, 0);
        assert_eq!(group.fan_out(), 4);
        for slot in 0..4 {
            assert!(Arc::ptr_eq(
                &group.handles[0].session,
                &group.handles[slot].session
            ));
        }
        assert_eq!(group.handle(3).id(), 3);
    }

    #[test]
    fn identity_is_group_scoped() {
        let group = HandleGroup::new(0, (), 2, 0);
        let alice = BindIdentity::new("cn=alice", b"pw");
        assert!(!group.identity_matches(&alice));

        group.set_identity(alice.clone());
        assert!(group.identity_matches(&alice));
        assert!(group.identity().matches(&alice));

        group.clear_identity();
        assert!(group.identity_matches(&BindIdentity::anonymous()));
    }
}
