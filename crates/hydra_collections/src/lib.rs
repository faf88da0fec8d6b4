//! # HYDRA Collections
//!
//! Thread-safe generic containers for the engine runtime: pooled objects,
//! queued work items and render-graph nodes all live in these.
//!
//! Four independent containers share one concurrency recipe: every public
//! operation acquires the instance's [`SpinGate`](hydra_sync::SpinGate) for
//! its whole duration, so operations on the same instance are linearizable.
//! There is no reader/writer split and no lock-free cleverness - reads and
//! writes serialize identically, trading read parallelism for a model simple
//! enough to audit.
//!
//! ## Architecture Rules
//!
//! 1. **One gate per container instance** - containers never share gates and
//!    never nest critical sections
//! 2. **Faults release the gate** - every error path goes through RAII guard
//!    drop; a fault can never leave a container locked
//! 3. **Iteration is fail-fast** - iterators do not hold the gate across the
//!    traversal; they detect concurrent mutation via a generation counter and
//!    surface [`CollectionError::ConcurrentModification`]
//!
//! ## Example
//!
//! ```rust
//! use hydra_collections::ConcurrentQueue;
//!
//! let queue = ConcurrentQueue::new();
//! queue.enqueue("reload_chunk");
//! queue.enqueue("rebuild_mesh");
//! assert_eq!(queue.try_dequeue(), Some("reload_chunk"));
//! ```

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod error;
pub mod list;
pub mod map;
pub mod queue;
pub mod set;

pub use error::{CollectionError, CollectionResult};
pub use list::{ConcurrentList, ListIter};
pub use map::ConcurrentMap;
pub use queue::{ConcurrentQueue, QueueIter};
pub use set::ConcurrentSet;
