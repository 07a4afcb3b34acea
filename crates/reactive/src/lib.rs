//! Vista Reactive - Value observation for Vista databases.
//!
//! This crate keeps the result of a fetch operation up to date with the
//! committed state of a database. A fetch runs once when the observation
//! starts, and again after every commit whose write-set intersects the
//! tables the first fetch read.
//!
//! # Core Concepts
//!
//! - `ValueObservation`: A fetch operation plus its `ObservationOptions`
//! - `Subscription`: Handle to a running observation, cancelled on drop
//! - `ObservationEvent`: A fresh value, or the terminal fetch failure
//! - `ObservationRegistry`: Routes write-sets to the observations they affect
//! - `SharedObserver`: Runs many observations over one commit listener
//!
//! # Delivery
//!
//! The first value is delivered synchronously, from `start`. Later values are
//! delivered on the observation's own evaluation thread, in commit order.
//! Once `Subscription::cancel` returns, nothing more is delivered.
//!
//! # Example
//!
//! ```rust
//! use vista_core::Value;
//! use vista_reactive::{ObservationEvent, ValueObservation};
//! use vista_storage::{Database, Snapshot};
//!
//! let db = Database::new();
//! db.create_table("player", &["name"]).unwrap();
//!
//! let (subscription, events) = ValueObservation::tracking(|s: &Snapshot| s.count("player"))
//!     .remove_duplicates()
//!     .values(&db)
//!     .unwrap();
//! assert!(subscription.dependent_tables().contains("player"));
//!
//! db.write(|tx| tx.insert("player", vec![Value::from("Arthur")])).unwrap();
//!
//! let counts: Vec<usize> = events
//!     .iter()
//!     .take(2)
//!     .filter_map(|event| match event {
//!         ObservationEvent::Value(count) => Some(count),
//!         ObservationEvent::Failed(_) => None,
//!     })
//!     .collect();
//! assert_eq!(counts, vec![0, 1]);
//! ```

mod evaluator;
mod observation;
mod registry;
mod shared;
mod subscription;

pub use observation::{
    ObservationEvent, ObservationOptions, ValueObservation, DEFAULT_THREAD_NAME,
};
pub use registry::{ObservationId, ObservationRegistry};
pub use shared::SharedObserver;
pub use subscription::{Subscription, SubscriptionId};
