//! Subscription handles for running observations.
//!
//! A subscription is connected to its commit source (a database listener or
//! a route of a `SharedObserver`) until it is cancelled. Delivery goes
//! through a gate shared with `cancel`, so once `cancel` returns no value is
//! delivered anymore, whichever thread is evaluating.

use parking_lot::{Mutex, ReentrantMutex};
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;
use vista_core::{Commit, ListenerId, ObservableDatabase, TableSet};

/// Unique identifier for a subscription.
pub type SubscriptionId = u64;

/// Global subscription ID counter.
static NEXT_SUBSCRIPTION_ID: AtomicU64 = AtomicU64::new(1);

/// Messages read by an evaluation loop. Commits and cancellation share one
/// channel, so the loop sees them in the order they happened.
pub(crate) enum Control<S> {
    Commit(Commit<S>),
    Cancel,
}

/// Where a subscription receives its commits from.
pub(crate) trait CommitSource: Send + Sync {
    /// Called once the dependent tables are known.
    fn track(&self, _tables: &TableSet) {}

    /// Stops sending commits to the subscription.
    fn detach(&self);
}

/// A commit listener registered directly on a database.
pub(crate) struct DatabaseListener<D> {
    db: D,
    listener: ListenerId,
}

impl<D> DatabaseListener<D> {
    pub(crate) fn new(db: D, listener: ListenerId) -> Self {
        Self { db, listener }
    }
}

impl<D: ObservableDatabase> CommitSource for DatabaseListener<D> {
    fn detach(&self) {
        self.db.remove_commit_listener(self.listener);
    }
}

/// State shared between a `Subscription` and its evaluation loop.
pub(crate) struct SubscriptionState {
    id: SubscriptionId,
    cancelled: AtomicBool,
    /// Held while delivering. Reentrant so a callback may cancel its own
    /// subscription.
    gate: ReentrantMutex<()>,
    source: Mutex<Option<Box<dyn CommitSource>>>,
}

impl SubscriptionState {
    pub(crate) fn new(source: Box<dyn CommitSource>) -> Self {
        Self {
            id: NEXT_SUBSCRIPTION_ID.fetch_add(1, Ordering::Relaxed),
            cancelled: AtomicBool::new(false),
            gate: ReentrantMutex::new(()),
            source: Mutex::new(Some(source)),
        }
    }

    pub(crate) fn id(&self) -> SubscriptionId {
        self.id
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Runs `deliver` unless the subscription is cancelled. Returns true if
    /// it ran.
    pub(crate) fn deliver(&self, deliver: impl FnOnce()) -> bool {
        let _gate = self.gate.lock();
        if self.is_cancelled() {
            return false;
        }
        deliver();
        true
    }

    /// Tells the commit source the dependent tables.
    pub(crate) fn track(&self, tables: &TableSet) {
        if let Some(source) = self.source.lock().as_ref() {
            source.track(tables);
        }
    }

    /// Disconnects from the commit source. Idempotent.
    pub(crate) fn detach(&self) {
        let source = self.source.lock().take();
        if let Some(source) = source {
            source.detach();
        }
    }

    /// Marks the subscription cancelled and detaches it. Waits for a
    /// delivery in progress on another thread. Returns false if it was
    /// already cancelled.
    pub(crate) fn cancel(&self) -> bool {
        {
            let _gate = self.gate.lock();
            if self.cancelled.swap(true, Ordering::SeqCst) {
                return false;
            }
        }
        self.detach();
        true
    }
}

/// Wakes the evaluation loop of a cancelled subscription.
pub(crate) type Wake = Box<dyn Fn() + Send + Sync>;

/// Handle to a running observation.
///
/// Dropping the handle cancels the observation.
pub struct Subscription {
    state: Arc<SubscriptionState>,
    dependent_tables: TableSet,
    wake: Option<Wake>,
}

impl Subscription {
    pub(crate) fn new(
        state: Arc<SubscriptionState>,
        dependent_tables: TableSet,
        wake: Option<Wake>,
    ) -> Self {
        Self {
            state,
            dependent_tables,
            wake,
        }
    }

    /// Returns the subscription ID.
    #[inline]
    pub fn id(&self) -> SubscriptionId {
        self.state.id()
    }

    /// Returns the tables whose writes re-run the fetch, as read by the
    /// first fetch. Empty if the fetch read no table, in which case the
    /// observation never updates.
    pub fn dependent_tables(&self) -> &TableSet {
        &self.dependent_tables
    }

    /// Returns true once the observation is cancelled, or stopped after a
    /// failed fetch.
    pub fn is_cancelled(&self) -> bool {
        self.state.is_cancelled()
    }

    /// Cancels the observation.
    ///
    /// After this returns nothing more is delivered. An evaluation already
    /// running completes, but its value is dropped. Calling it again has no
    /// effect.
    pub fn cancel(&self) {
        if self.state.cancel() {
            if let Some(wake) = &self.wake {
                wake();
            }
            debug!(subscription = self.id(), "cancelled observation");
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id())
            .field("dependent_tables", &self.dependent_tables)
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}
