//! Per-user critical sections
//!
//! At most one holder per user id at a time; different users never wait on
//! each other. A slot exists only while someone holds or waits for it, so the
//! map does not grow with the number of users ever seen.
//!
//! Holders are counted explicitly. A waiter registers its interest before it
//! starts waiting, and the interest is withdrawn when the waiter either leaves
//! the section or is dropped while still waiting. The slot is removed under the
//! map's entry lock once the count reaches zero.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::trace;

struct Slot {
    mutex: Arc<Mutex<()>>,
    holders: usize,
}

#[derive(Default)]
struct Inner {
    slots: DashMap<i64, Slot>,
    entered: AtomicU64,
    exited: AtomicU64,
}

/// Counters for tests and diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockStats {
    pub entered: u64,
    pub exited: u64,
    /// Users with a holder or a waiter right now
    pub active_users: usize,
}

#[derive(Clone, Default)]
pub struct UserLocks {
    inner: Arc<Inner>,
}

/// Registered interest in a user's slot
struct Interest {
    locks: UserLocks,
    user_id: i64,
    mutex: Arc<Mutex<()>>,
}

impl Drop for Interest {
    fn drop(&mut self) {
        if let Entry::Occupied(mut slot) = self.locks.inner.slots.entry(self.user_id) {
            slot.get_mut().holders -= 1;
            if slot.get().holders == 0 {
                slot.remove();
                trace!(user_id = self.user_id, "User slot reclaimed");
            }
        }
    }
}

/// Exclusive hold on one user's section, released on drop
pub struct UserTicket {
    user_id: i64,
    guard: Option<OwnedMutexGuard<()>>,
    interest: Option<Interest>,
}

impl UserTicket {
    pub fn user_id(&self) -> i64 {
        self.user_id
    }

    /// Leave the section
    pub fn exit(self) {}
}

impl Drop for UserTicket {
    fn drop(&mut self) {
        // Release the mutex before withdrawing interest, otherwise a fresh slot
        // could be created for this user while the old one is still held.
        drop(self.guard.take());
        if let Some(interest) = self.interest.take() {
            interest.locks.inner.exited.fetch_add(1, Ordering::Relaxed);
            drop(interest);
        }
    }
}

/// Sections of several users, entered in ascending id order
pub struct SectionGuard {
    tickets: Vec<UserTicket>,
}

impl SectionGuard {
    pub fn user_ids(&self) -> Vec<i64> {
        self.tickets.iter().map(UserTicket::user_id).collect()
    }

    /// Whether every id in `ids` is held
    pub fn covers(&self, ids: &[i64]) -> bool {
        ids.iter().all(|id| self.tickets.iter().any(|t| t.user_id == *id))
    }
}

impl UserLocks {
    pub fn new() -> Self {
        Self::default()
    }

    fn register(&self, user_id: i64) -> Interest {
        let mutex = {
            let mut slot = self.inner.slots.entry(user_id).or_insert_with(|| Slot {
                mutex: Arc::new(Mutex::new(())),
                holders: 0,
            });
            slot.holders += 1;
            slot.mutex.clone()
        };
        Interest { locks: self.clone(), user_id, mutex }
    }

    /// Wait for exclusive access to `user_id`'s section
    ///
    /// Dropping the returned future while it waits leaves no trace.
    pub async fn enter(&self, user_id: i64) -> UserTicket {
        let interest = self.register(user_id);
        let guard = interest.mutex.clone().lock_owned().await;
        self.inner.entered.fetch_add(1, Ordering::Relaxed);
        trace!(user_id = user_id, "Entered user section");
        UserTicket {
            user_id,
            guard: Some(guard),
            interest: Some(interest),
        }
    }

    /// Enter several sections; ids are sorted and deduplicated first so two
    /// callers can never wait on each other in opposite orders.
    pub async fn enter_many(&self, user_ids: &[i64]) -> SectionGuard {
        let mut ids = user_ids.to_vec();
        ids.sort_unstable();
        ids.dedup();

        let mut tickets = Vec::with_capacity(ids.len());
        for id in ids {
            tickets.push(self.enter(id).await);
        }
        SectionGuard { tickets }
    }

    pub fn active_users(&self) -> usize {
        self.inner.slots.len()
    }

    pub fn is_tracked(&self, user_id: i64) -> bool {
        self.inner.slots.contains_key(&user_id)
    }

    pub fn stats(&self) -> LockStats {
        LockStats {
            entered: self.inner.entered.load(Ordering::Relaxed),
            exited: self.inner.exited.load(Ordering::Relaxed),
            active_users: self.active_users(),
        }
    }
}
