//! # HYDRA Sync
//!
//! The exclusive-access gate every HYDRA container serializes through.
//!
//! ## Architecture Rules
//!
//! 1. **No OS mutexes** - acquisition spins with adaptive backoff, it never
//!    parks the thread in a kernel wait queue
//! 2. **Whole-operation exclusion** - callers hold the gate for the entire
//!    duration of an operation, not per field access
//! 3. **Structural release** - the gate is released by RAII guard drop, so no
//!    fault path can leave it held
//!
//! ## Example
//!
//! ```rust
//! use hydra_sync::SpinGate;
//!
//! let gate = SpinGate::new(vec![1, 2, 3]);
//! {
//!     let mut guard = gate.lock();
//!     guard.push(4);
//! } // released here
//! assert_eq!(gate.lock().len(), 4);
//! ```

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod gate;

pub use gate::{GateGuard, SpinGate};
