//! The two registries that between them hold every handle group
//!
//! One instance tracks in-use groups, the other available groups. Each
//! wraps its own mutex; the available instance additionally uses the
//! condition variable for the blocking acquisition path. A group belongs to
//! exactly one registry at any instant, except while a claiming thread owns
//! it privately during a move or a rebind.

use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::group::HandleGroup;
use crate::identity::BindIdentity;

/// Outcome of a membership-sensitive removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Membership {
    /// The group is not a member of this registry.
    Absent,
    /// The group is a member and stays, other handles are still out.
    Retained,
    /// The group was a member and has been removed.
    Removed,
}

pub(crate) struct GroupRegistry<C> {
    groups: Mutex<VecDeque<Arc<HandleGroup<C>>>>,
    nonempty: Condvar,
}

impl<C> GroupRegistry<C> {
    pub(crate) fn new() -> Self {
        Self {
            groups: Mutex::new(VecDeque::new()),
            nonempty: Condvar::new(),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.groups.lock().len()
    }

    /// Append without waking anyone; used at construction and when moving a
    /// group to the in-use side, where no new capacity appears.
    pub(crate) fn push(&self, group: Arc<HandleGroup<C>>) {
        self.groups.lock().push_back(group);
    }

    /// Append and wake one blocked waiter.
    pub(crate) fn push_and_wake_one(&self, group: Arc<HandleGroup<C>>) {
        self.groups.lock().push_back(group);
        self.nonempty.notify_one();
    }

    /// Wake every blocked waiter, used on shutdown.
    pub(crate) fn wake_all(&self) {
        let _groups = self.groups.lock();
        self.nonempty.notify_all();
    }

    pub(crate) fn contains(&self, group: &Arc<HandleGroup<C>>) -> bool {
        self.groups.lock().iter().any(|g| Arc::ptr_eq(g, group))
    }

    /// Fast path: claim an idle handle from any member group bound to
    /// `wanted`, without moving the group. Claiming happens under this
    /// registry's lock, so it cannot race a concurrent membership change.
    pub(crate) fn claim_idle_matching(
        &self,
        wanted: &BindIdentity,
    ) -> Option<(Arc<HandleGroup<C>>, usize)> {
        let groups = self.groups.lock();
        for group in groups.iter() {
            if group.identity_matches(wanted)
                && let Some(slot) = group.claim_idle()
            {
                return Some((Arc::clone(group), slot));
            }
        }
        None
    }

    /// Warm path: remove the first member group bound to `wanted`. The
    /// caller owns the whole group afterwards.
    pub(crate) fn take_matching(&self, wanted: &BindIdentity) -> Option<Arc<HandleGroup<C>>> {
        let mut groups = self.groups.lock();
        let pos = groups.iter().position(|g| g.identity_matches(wanted))?;
        groups.remove(pos)
    }

    /// Remove the oldest member, if any.
    pub(crate) fn try_take_front(&self) -> Option<Arc<HandleGroup<C>>> {
        self.groups.lock().pop_front()
    }

    /// Cold path: block until a group is present or shutdown is observed.
    /// Returns `None` only on shutdown.
    pub(crate) fn take_front_blocking(
        &self,
        shutting_down: &AtomicBool,
    ) -> Option<Arc<HandleGroup<C>>> {
        let mut groups = self.groups.lock();
        loop {
            if shutting_down.load(Ordering::Acquire) {
                return None;
            }
            if let Some(group) = groups.pop_front() {
                return Some(group);
            }
            self.nonempty.wait(&mut groups);
        }
    }

    /// Remove `group` when every one of its handles has gone idle. Used by
    /// the release path against the in-use registry.
    pub(crate) fn remove_when_idle(&self, group: &Arc<HandleGroup<C>>) -> Membership {
        let mut groups = self.groups.lock();
        match groups.iter().position(|g| Arc::ptr_eq(g, group)) {
            None => Membership::Absent,
            Some(pos) if group.all_available() => {
                groups.remove(pos);
                Membership::Removed
            }
            Some(_) => Membership::Retained,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use std::thread;
    use std::time::Duration;

    fn group(id: usize) -> Arc<HandleGroup<()>> {
        Arc::new(HandleGroup::new(id, (), 2, id * 2))
    }

    #[test]
    fn front_is_oldest_member() {
        let registry = GroupRegistry::new();
        let (a, b) = (group(0), group(1));
        registry.push(Arc::clone(&a));
        registry.push(Arc::clone(&b));

        let taken = registry.try_take_front().unwrap();
        assert!(Arc::ptr_eq(&taken, &a));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn take_matching_ignores_position() {
        let registry = GroupRegistry::new();
        let (a, b) = (group(0), group(1));
        let bob = BindIdentity::new("cn=bob", b"pw");
        b.set_identity(bob.clone());
        registry.push(Arc::clone(&a));
        registry.push(Arc::clone(&b));

        let taken = registry.take_matching(&bob).unwrap();
        assert!(Arc::ptr_eq(&taken, &b));
        assert!(registry.take_matching(&bob).is_none());
    }

    #[test]
    fn remove_when_idle_distinguishes_outcomes() {
        let registry = GroupRegistry::new();
        let member = group(0);
        let stranger = group(1);
        registry.push(Arc::clone(&member));

        assert_eq!(registry.remove_when_idle(&stranger), Membership::Absent);

        let slot = member.claim_idle().unwrap();
        assert_eq!(registry.remove_when_idle(&member), Membership::Retained);

        member.release_slot(slot);
        assert_eq!(registry.remove_when_idle(&member), Membership::Removed);
        assert_eq!(registry.len(), 0);
    }

    #[test]
    fn blocking_take_wakes_on_push() {
        let registry = Arc::new(GroupRegistry::new());
        let shutting_down = Arc::new(AtomicBool::new(false));
        let (tx, rx) = mpsc::channel();

        let waiter = {
            let registry = Arc::clone(&registry);
            let shutting_down = Arc::clone(&shutting_down);
            thread::spawn(move || {
                let got = registry.take_front_blocking(&shutting_down);
                tx.send(got.is_some()).unwrap();
            })
        };

        // Still blocked while the registry is empty.
        assert!(rx.recv_timeout(Duration::from_millis(100)).is_err());

        registry.push_and_wake_one(group(0));
        assert!(rx.recv_timeout(Duration::from_secs(2)).unwrap());
        waiter.join().unwrap();
    }

    #[test]
    fn blocking_take_observes_shutdown() {
        let registry = Arc::new(GroupRegistry::<()>::new());
        let shutting_down = Arc::new(AtomicBool::new(false));

        let waiters: Vec<_> = (0..3)
            .map(|_| {
                let registry = Arc::clone(&registry);
                let shutting_down = Arc::clone(&shutting_down);
                thread::spawn(move || registry.take_front_blocking(&shutting_down))
            })
            .collect();

        thread::sleep(Duration::from_millis(50));
        shutting_down.store(true, Ordering::Release);
        registry.wake_all();

        for waiter in waiters {
            assert!(waiter.join().unwrap().is_none());
        }
    }
}
