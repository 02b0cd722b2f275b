//! metricd-store: in-memory metric store with journal persistence.
//!
//! # Architecture
//!
//! ```text
//! MetricStore (Arc<Mutex<HashMap<id, Metric>>>)
//!   ├── update()  ← counters accumulate, gauges replace
//!   ├── get() / get_all()
//!   └── snapshot copies feed the journal
//!
//! Journal (append-only, newline-delimited records)
//!   ├── append()           ← write-through: one running total per update
//!   └── append_snapshot()  ← batched: full store every interval
//!
//! restore() → replays the journal, last record per id wins
//! ```
//!
//! The `MetricStore` is `Clone` + `Send` + `Sync` and can be shared across
//! async tasks. Every operation holds the lock only for the map access
//! itself; journal writes happen on copies taken under the lock.

pub mod error;
pub mod journal;
pub mod persist;
pub mod restore;
pub mod store;

pub use error::{StoreError, StoreResult};
pub use journal::Journal;
pub use persist::{PersistMode, Snapshotter};
pub use restore::{replay, restore};
pub use store::MetricStore;
