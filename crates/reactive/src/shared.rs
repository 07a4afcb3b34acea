//! Many observations over one commit listener.
//!
//! `SharedObserver` registers a single commit listener on a database and
//! routes each commit, through an `ObservationRegistry`, to the evaluation
//! loops of the observations it affects. Each routed observation receives
//! its own fork of the post-commit snapshot.

use crate::observation::{launch, ObservationEvent, ValueObservation};
use crate::registry::{ObservationId, ObservationRegistry};
use crate::subscription::{CommitSource, Control, Subscription};
use crossbeam::channel::{unbounded, Sender};
use hashbrown::HashMap;
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace};
use vista_core::{Commit, Error, ListenerId, ObservableDatabase, ReadSnapshot, Result, TableSet};

struct Routes<S> {
    registry: ObservationRegistry,
    senders: HashMap<ObservationId, Sender<Control<S>>>,
    /// State after the last commit routed, or at registration.
    latest: Option<S>,
}

impl<S: Clone> Routes<S> {
    fn dispatch(&mut self, commit: Commit<S>) {
        let matched = self.registry.matching(&commit.write_set);
        trace!(
            write_set = ?commit.write_set,
            observations = matched.len(),
            "routing commit"
        );
        for id in matched {
            if let Some(sender) = self.senders.get(&id) {
                let _ = sender.send(Control::Commit(Commit {
                    write_set: commit.write_set.clone(),
                    snapshot: commit.snapshot.clone(),
                }));
            }
        }
        self.latest = Some(commit.snapshot);
    }
}

/// Runs many observations of one database over a single commit listener.
///
/// The database snapshot type must be cheap to clone; a clone reads the same
/// state and records its own reads.
pub struct SharedObserver<D: ObservableDatabase> {
    db: D,
    listener: ListenerId,
    routes: Arc<Mutex<Routes<D::Snapshot>>>,
}

impl<D> SharedObserver<D>
where
    D: ObservableDatabase,
    D::Snapshot: Clone,
{
    /// Registers the shared commit listener on `db`.
    pub fn new(db: D) -> Self {
        let routes = Arc::new(Mutex::new(Routes {
            registry: ObservationRegistry::new(),
            senders: HashMap::new(),
            latest: None,
        }));
        let listener_routes = Arc::clone(&routes);
        let (listener, snapshot) =
            db.add_commit_listener(Box::new(move |commit: Commit<D::Snapshot>| {
                listener_routes.lock().dispatch(commit);
            }));
        {
            let mut routes = routes.lock();
            if routes.latest.is_none() {
                routes.latest = Some(snapshot);
            }
        }
        debug!(listener, "registered shared commit listener");
        Self {
            db,
            listener,
            routes,
        }
    }

    /// Starts an observation routed through this observer.
    ///
    /// Behaves like `ValueObservation::start`: the first value is delivered
    /// before this returns, later values on the observation's own evaluation
    /// thread.
    pub fn observe<F, V, C>(
        &self,
        observation: ValueObservation<F>,
        on_event: C,
    ) -> Result<Subscription>
    where
        F: FnMut(&D::Snapshot) -> Result<V> + Send + 'static,
        V: Clone + PartialEq + Send + 'static,
        C: FnMut(ObservationEvent<V>) + Send + 'static,
    {
        let (sender, receiver) = unbounded();
        let (id, snapshot) = {
            let mut routes = self.routes.lock();
            let snapshot = routes
                .latest
                .clone()
                .ok_or_else(|| Error::invalid_operation("shared observer has no snapshot"))?;
            let id = routes.registry.register_pending();
            routes.senders.insert(id, sender.clone());
            (id, snapshot)
        };
        let route = Route {
            routes: Arc::clone(&self.routes),
            id,
        };
        let (fetch, options) = observation.into_parts();
        launch(
            fetch,
            &options,
            snapshot,
            (sender, receiver),
            Box::new(route),
            on_event,
        )
    }

    /// Returns the number of observations currently routed.
    pub fn observation_count(&self) -> usize {
        self.routes.lock().registry.observation_count()
    }

    /// Returns the number of routed observations depending on `table`.
    pub fn observations_for_table(&self, table: &str) -> usize {
        self.routes.lock().registry.observations_for_table(table)
    }

    /// Returns the observed database.
    pub fn database(&self) -> &D {
        &self.db
    }
}

impl<D: ObservableDatabase> Drop for SharedObserver<D> {
    fn drop(&mut self) {
        self.db.remove_commit_listener(self.listener);
        let mut routes = self.routes.lock();
        routes.registry.clear();
        routes.senders.clear();
        debug!(listener = self.listener, "removed shared commit listener");
    }
}

impl<D: ObservableDatabase> fmt::Debug for SharedObserver<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedObserver")
            .field("listener", &self.listener)
            .finish_non_exhaustive()
    }
}

/// One observation's entry in a `SharedObserver`.
struct Route<S> {
    routes: Arc<Mutex<Routes<S>>>,
    id: ObservationId,
}

impl<S: ReadSnapshot + Send> CommitSource for Route<S> {
    fn track(&self, tables: &TableSet) {
        self.routes.lock().registry.set_tables(self.id, tables.clone());
    }

    fn detach(&self) {
        let mut routes = self.routes.lock();
        routes.registry.unregister(self.id);
        routes.senders.remove(&self.id);
    }
}
