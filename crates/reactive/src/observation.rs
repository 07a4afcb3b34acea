//! Value observations.
//!
//! A `ValueObservation` wraps a fetch operation. Starting it fetches once on
//! the current state, learns the fetch's dependent tables from the tables it
//! read, then fetches again on the post-commit snapshot of every commit that
//! writes one of those tables.

use crate::evaluator::{Evaluator, Outcome};
use crate::subscription::{
    CommitSource, Control, DatabaseListener, Subscription, SubscriptionState,
};
use crossbeam::channel::{unbounded, Receiver, Sender};
use std::sync::Arc;
use std::thread;
use tracing::{debug, warn};
use vista_core::{Commit, Error, ObservableDatabase, ReadSnapshot, Result};

/// Default name of evaluation threads.
pub const DEFAULT_THREAD_NAME: &str = "vista-observation";

/// An event delivered by an observation.
#[derive(Clone, Debug, PartialEq)]
pub enum ObservationEvent<V> {
    /// A freshly fetched value.
    Value(V),
    /// A fetch failed. This is the last event of the observation.
    Failed(Error),
}

impl<V> ObservationEvent<V> {
    /// Returns the value, if this is a value event.
    pub fn value(self) -> Option<V> {
        match self {
            ObservationEvent::Value(value) => Some(value),
            ObservationEvent::Failed(_) => None,
        }
    }

    /// Returns true if this is the terminal failure event.
    pub fn is_failure(&self) -> bool {
        matches!(self, ObservationEvent::Failed(_))
    }
}

/// Options of an observation.
#[derive(Clone, Debug)]
pub struct ObservationOptions {
    /// Skip values equal to the previously fetched one.
    pub dedupe: bool,
    /// Name of the evaluation thread.
    pub thread_name: String,
}

impl Default for ObservationOptions {
    fn default() -> Self {
        Self {
            dedupe: false,
            thread_name: DEFAULT_THREAD_NAME.into(),
        }
    }
}

/// Observes the value returned by a fetch operation.
///
/// The fetch must read through the snapshot it is given: the tables it reads
/// on the first run become the observation's dependent tables, and they do
/// not change afterwards.
#[derive(Clone)]
pub struct ValueObservation<F> {
    fetch: F,
    options: ObservationOptions,
}

impl<F> ValueObservation<F> {
    /// Creates an observation of the value returned by `fetch`.
    pub fn tracking(fetch: F) -> Self {
        Self {
            fetch,
            options: ObservationOptions::default(),
        }
    }

    /// Only delivers values that differ from the previously fetched value.
    pub fn remove_duplicates(mut self) -> Self {
        self.options.dedupe = true;
        self
    }

    /// Replaces the options.
    pub fn with_options(mut self, options: ObservationOptions) -> Self {
        self.options = options;
        self
    }

    /// Returns the options.
    pub fn options(&self) -> &ObservationOptions {
        &self.options
    }

    pub(crate) fn into_parts(self) -> (F, ObservationOptions) {
        (self.fetch, self.options)
    }

    /// Starts observing `db`.
    ///
    /// The first value is passed to `on_event` before this returns; later
    /// events are passed from the evaluation thread. An error from the first
    /// fetch is returned instead of being delivered.
    pub fn start<D, V, C>(self, db: &D, on_event: C) -> Result<Subscription>
    where
        D: ObservableDatabase + Clone + 'static,
        F: FnMut(&D::Snapshot) -> Result<V> + Send + 'static,
        V: Clone + PartialEq + Send + 'static,
        C: FnMut(ObservationEvent<V>) + Send + 'static,
    {
        let (sender, receiver) = unbounded();
        let listener_sender = sender.clone();
        let (listener, snapshot) =
            db.add_commit_listener(Box::new(move |commit: Commit<D::Snapshot>| {
                let _ = listener_sender.send(Control::Commit(commit));
            }));
        let source = DatabaseListener::new(db.clone(), listener);
        launch(
            self.fetch,
            &self.options,
            snapshot,
            (sender, receiver),
            Box::new(source),
            on_event,
        )
    }

    /// Starts observing `db` and returns the events as a channel. The first
    /// value is already in the channel when this returns.
    pub fn values<D, V>(self, db: &D) -> Result<(Subscription, Receiver<ObservationEvent<V>>)>
    where
        D: ObservableDatabase + Clone + 'static,
        F: FnMut(&D::Snapshot) -> Result<V> + Send + 'static,
        V: Clone + PartialEq + Send + 'static,
    {
        let (sender, receiver) = unbounded();
        let subscription = self.start(db, move |event| {
            let _ = sender.send(event);
        })?;
        Ok((subscription, receiver))
    }
}

/// Runs the first fetch on `snapshot`, delivers it, and spawns the
/// evaluation loop reading `channel`.
///
/// `snapshot` must be the state right before the first commit `channel`
/// receives.
pub(crate) fn launch<S, V, F, C>(
    fetch: F,
    options: &ObservationOptions,
    snapshot: S,
    channel: (Sender<Control<S>>, Receiver<Control<S>>),
    source: Box<dyn CommitSource>,
    mut on_event: C,
) -> Result<Subscription>
where
    S: ReadSnapshot + Send + 'static,
    F: FnMut(&S) -> Result<V> + Send + 'static,
    V: Clone + PartialEq + Send + 'static,
    C: FnMut(ObservationEvent<V>) + Send + 'static,
{
    let (sender, receiver) = channel;
    let state = Arc::new(SubscriptionState::new(source));
    let id = state.id();

    let (evaluator, first) = match Evaluator::initial(fetch, options.dedupe, &snapshot) {
        Ok(initial) => initial,
        Err(err) => {
            debug!(subscription = id, error = %err, "initial fetch failed");
            state.detach();
            return Err(err);
        }
    };
    let dependent_tables = evaluator.dependent_tables().clone();
    on_event(ObservationEvent::Value(first));

    if dependent_tables.is_empty() {
        warn!(
            subscription = id,
            "fetch read no table, observation will never update"
        );
        state.detach();
        return Ok(Subscription::new(state, dependent_tables, None));
    }
    state.track(&dependent_tables);

    let loop_state = Arc::clone(&state);
    let spawned = thread::Builder::new()
        .name(options.thread_name.clone())
        .spawn(move || run(evaluator, receiver, loop_state, on_event));
    if let Err(err) = spawned {
        state.detach();
        return Err(Error::execution(format!(
            "failed to spawn evaluation thread: {err}"
        )));
    }

    debug!(
        subscription = id,
        dependent_tables = ?dependent_tables,
        dedupe = options.dedupe,
        "started observation"
    );
    let wake = Box::new(move || {
        let _ = sender.send(Control::Cancel);
    });
    Ok(Subscription::new(state, dependent_tables, Some(wake)))
}

/// Evaluation loop of one subscription.
fn run<S, V, F, C>(
    mut evaluator: Evaluator<F, V>,
    receiver: Receiver<Control<S>>,
    state: Arc<SubscriptionState>,
    mut on_event: C,
) where
    F: FnMut(&S) -> Result<V>,
    V: Clone + PartialEq,
    C: FnMut(ObservationEvent<V>),
{
    let id = state.id();
    while let Ok(control) = receiver.recv() {
        let commit = match control {
            Control::Commit(commit) => commit,
            Control::Cancel => break,
        };
        if state.is_cancelled() {
            break;
        }
        match evaluator.evaluate(&commit) {
            Outcome::Skipped => {
                debug!(subscription = id, write_set = ?commit.write_set, "skipped commit");
            }
            Outcome::Unchanged => {
                debug!(subscription = id, "evaluated commit, value unchanged");
            }
            Outcome::Changed(value) => {
                debug!(subscription = id, "evaluated commit");
                state.deliver(|| on_event(ObservationEvent::Value(value)));
            }
            Outcome::Failed(err) => {
                warn!(subscription = id, error = %err, "fetch failed, stopping observation");
                state.deliver(|| on_event(ObservationEvent::Failed(err)));
                state.cancel();
                break;
            }
        }
    }
    debug!(subscription = id, "evaluation loop finished");
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::time::Duration;
    use vista_core::{CommitHandler, ListenerId, TableSet};

    const TIMEOUT: Duration = Duration::from_secs(5);

    /// Snapshot of a single counter stored in table "counter".
    #[derive(Default)]
    struct CounterSnapshot {
        value: i64,
        accessed: Mutex<TableSet>,
    }

    impl CounterSnapshot {
        fn new(value: i64) -> Self {
            Self {
                value,
                accessed: Mutex::new(TableSet::new()),
            }
        }

        fn read(&self) -> Result<i64> {
            self.accessed.lock().insert("counter");
            Ok(self.value)
        }
    }

    impl ReadSnapshot for CounterSnapshot {
        fn accessed_tables(&self) -> TableSet {
            self.accessed.lock().clone()
        }
    }

    #[derive(Default)]
    struct CounterState {
        value: i64,
        listeners: Vec<(ListenerId, CommitHandler<CounterSnapshot>)>,
        next_listener: ListenerId,
    }

    /// Database holding one counter.
    #[derive(Clone, Default)]
    struct CounterDb {
        state: Arc<Mutex<CounterState>>,
    }

    impl CounterDb {
        fn set(&self, table: &str, value: i64) {
            let mut state = self.state.lock();
            if table == "counter" {
                state.value = value;
            }
            for (_, handler) in &state.listeners {
                handler(Commit {
                    write_set: [table].into_iter().collect(),
                    snapshot: CounterSnapshot::new(state.value),
                });
            }
        }

        fn listener_count(&self) -> usize {
            self.state.lock().listeners.len()
        }
    }

    impl ObservableDatabase for CounterDb {
        type Snapshot = CounterSnapshot;

        fn snapshot(&self) -> CounterSnapshot {
            CounterSnapshot::new(self.state.lock().value)
        }

        fn add_commit_listener(
            &self,
            handler: CommitHandler<CounterSnapshot>,
        ) -> (ListenerId, CounterSnapshot) {
            let mut state = self.state.lock();
            let id = state.next_listener;
            state.next_listener += 1;
            state.listeners.push((id, handler));
            (id, CounterSnapshot::new(state.value))
        }

        fn remove_commit_listener(&self, id: ListenerId) -> bool {
            let mut state = self.state.lock();
            let before = state.listeners.len();
            state.listeners.retain(|(listener, _)| *listener != id);
            state.listeners.len() != before
        }
    }

    fn next(receiver: &Receiver<ObservationEvent<i64>>) -> Option<i64> {
        receiver.recv_timeout(TIMEOUT).ok().and_then(ObservationEvent::value)
    }

    #[test]
    fn test_default_options() {
        let options = ObservationOptions::default();
        assert!(!options.dedupe);
        assert_eq!(options.thread_name, DEFAULT_THREAD_NAME);

        let observation = ValueObservation::tracking(CounterSnapshot::read).remove_duplicates();
        assert!(observation.options().dedupe);
    }

    #[test]
    fn test_first_value_is_synchronous() {
        let db = CounterDb::default();
        db.set("counter", 7);
        let (subscription, events) = ValueObservation::tracking(CounterSnapshot::read)
            .values(&db)
            .unwrap();
        assert_eq!(events.try_recv().ok().and_then(ObservationEvent::value), Some(7));
        assert!(subscription.dependent_tables().contains("counter"));
        assert_eq!(db.listener_count(), 1);
    }

    #[test]
    fn test_commits_are_evaluated_in_order() {
        let db = CounterDb::default();
        let (_subscription, events) = ValueObservation::tracking(CounterSnapshot::read)
            .values(&db)
            .unwrap();
        for value in 1..=20 {
            db.set("counter", value);
        }
        let values: Vec<i64> = (0..=20).filter_map(|_| next(&events)).collect();
        assert_eq!(values, (0..=20).collect::<Vec<_>>());
    }

    #[test]
    fn test_unrelated_tables_are_ignored() {
        let db = CounterDb::default();
        let (_subscription, events) = ValueObservation::tracking(CounterSnapshot::read)
            .values(&db)
            .unwrap();
        assert_eq!(next(&events), Some(0));
        db.set("other", 1);
        db.set("counter", 2);
        assert_eq!(next(&events), Some(2));
    }

    #[test]
    fn test_cancel_unregisters_listener() {
        let db = CounterDb::default();
        let (subscription, events) = ValueObservation::tracking(CounterSnapshot::read)
            .values(&db)
            .unwrap();
        assert_eq!(next(&events), Some(0));
        subscription.cancel();
        assert!(subscription.is_cancelled());
        assert_eq!(db.listener_count(), 0);

        db.set("counter", 1);
        assert!(events.recv_timeout(Duration::from_millis(50)).is_err());
    }

    #[test]
    fn test_initial_error_is_returned() {
        let db = CounterDb::default();
        let result = ValueObservation::tracking(|_: &CounterSnapshot| -> Result<i64> {
            Err(Error::execution("unavailable"))
        })
        .values(&db);
        assert_eq!(result.err(), Some(Error::execution("unavailable")));
        assert_eq!(db.listener_count(), 0);
    }

    #[test]
    fn test_fetch_without_reads_never_updates() {
        let db = CounterDb::default();
        let (subscription, events) =
            ValueObservation::tracking(|_: &CounterSnapshot| -> Result<i64> { Ok(42) })
                .values(&db)
                .unwrap();
        assert_eq!(next(&events), Some(42));
        assert!(subscription.dependent_tables().is_empty());
        assert!(!subscription.is_cancelled());
        assert_eq!(db.listener_count(), 0);

        db.set("counter", 1);
        assert!(events.recv_timeout(Duration::from_millis(50)).is_err());
    }

    #[test]
    fn test_thread_name() {
        let db = CounterDb::default();
        let (sender, receiver) = unbounded();
        let options = ObservationOptions {
            thread_name: "counter-observer".into(),
            ..ObservationOptions::default()
        };
        let _subscription = ValueObservation::tracking(CounterSnapshot::read)
            .with_options(options)
            .start(&db, move |_| {
                let _ = sender.send(thread::current().name().map(String::from));
            })
            .unwrap();
        db.set("counter", 1);

        let first = receiver.recv_timeout(TIMEOUT).unwrap();
        let second = receiver.recv_timeout(TIMEOUT).unwrap();
        assert_ne!(first.as_deref(), Some("counter-observer"));
        assert_eq!(second.as_deref(), Some("counter-observer"));
    }
}
