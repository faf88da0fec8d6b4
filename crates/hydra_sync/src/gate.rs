//! # Spin Gate
//!
//! A spinlock-shaped mutex built from a single atomic state word.
//!
//! ## Safety Note
//!
//! This module requires unsafe code for interior mutability behind the gate.
//! All unsafe blocks are carefully reviewed and documented.

#![allow(unsafe_code)]
//!
//! ## Design
//!
//! The gate is one `AtomicBool`: `false` means free, `true` means held. The
//! only permitted acquisition is the atomic `false -> true` transition via
//! compare-exchange; release stores `false`. There is no ownership tracking,
//! no reentrancy and no fairness - the first thread to win the exchange wins,
//! and a contended acquirer spins with adaptive backoff (processor spin hints
//! escalating to `thread::yield_now`) until it succeeds.
//!
//! Intended for short critical sections only. A holder that blocks on I/O or
//! sleeps will starve every other thread touching the same gate.

use std::cell::UnsafeCell;
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicBool, Ordering};

use crossbeam_utils::Backoff;

/// A busy-wait mutual-exclusion gate protecting a value of type `T`.
///
/// Functionally a mutex, mechanically a spinlock: acquisition never enters
/// the kernel. Exactly one [`GateGuard`] can exist per gate at any moment,
/// and the guard's `Drop` impl is the only release path, which makes it
/// impossible for an early-return fault inside a critical section to leave
/// the gate permanently held.
///
/// # Example
///
/// ```rust
/// use hydra_sync::SpinGate;
///
/// let gate = SpinGate::new(0u64);
/// *gate.lock() += 1;
/// assert_eq!(*gate.lock(), 1);
/// ```
pub struct SpinGate<T> {
    /// The state word: `false` = free, `true` = held.
    held: AtomicBool,
    /// The protected value.
    /// Using `UnsafeCell` because we guarantee exclusive access through the
    /// guard.
    value: UnsafeCell<T>,
}

// SAFETY: SpinGate hands out access to T only through the guard, which
// requires winning the atomic exchange first; moving or sharing the gate
// across threads is safe whenever moving T itself is.
unsafe impl<T: Send> Send for SpinGate<T> {}
// SAFETY: &SpinGate only permits gated (exclusive) access to T, so sharing
// the gate never creates concurrent references to T.
unsafe impl<T: Send> Sync for SpinGate<T> {}

impl<T> SpinGate<T> {
    /// Creates a gate in the free state protecting `value`.
    #[must_use]
    pub const fn new(value: T) -> Self {
        Self {
            held: AtomicBool::new(false),
            value: UnsafeCell::new(value),
        }
    }

    /// Acquires the gate, spinning until it is free.
    ///
    /// Spins with adaptive backoff: tight `spin_loop` hints at first, then
    /// cooperative `yield_now` once contention persists. There is no timeout
    /// and no fairness guarantee - under sustained contention an unlucky
    /// thread can starve.
    #[must_use]
    pub fn lock(&self) -> GateGuard<'_, T> {
        let backoff = Backoff::new();
        while self
            .held
            .compare_exchange_weak(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            backoff.snooze();
        }
        GateGuard { gate: self }
    }

    /// Attempts a single acquisition without spinning.
    ///
    /// Returns `None` if the gate is currently held by someone else.
    #[must_use]
    pub fn try_lock(&self) -> Option<GateGuard<'_, T>> {
        if self
            .held
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_ok()
        {
            Some(GateGuard { gate: self })
        } else {
            None
        }
    }

    /// Returns whether the gate is currently held.
    ///
    /// Diagnostic only: the answer can be stale by the time the caller
    /// inspects it.
    #[inline]
    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.held.load(Ordering::Acquire)
    }

    /// Consumes the gate and returns the protected value.
    #[inline]
    #[must_use]
    pub fn into_inner(self) -> T {
        self.value.into_inner()
    }

    /// Returns a mutable reference to the protected value.
    ///
    /// Requires `&mut self`, so the borrow checker already proves exclusive
    /// access and no atomic exchange is needed.
    #[inline]
    pub fn get_mut(&mut self) -> &mut T {
        self.value.get_mut()
    }

    /// Returns a raw pointer to the protected value, bypassing the gate.
    ///
    /// This is the documented escape hatch for advanced callers that have
    /// external reasons to believe no other thread is touching the gate
    /// (startup, teardown, single-threaded phases). It is never the default
    /// way in.
    ///
    /// # Safety
    ///
    /// The caller forfeits every guarantee this type exists to provide. They
    /// must ensure no [`GateGuard`] is alive and no other thread accesses the
    /// value for as long as the pointer is dereferenced.
    #[inline]
    #[must_use]
    pub unsafe fn get_unguarded(&self) -> *mut T {
        self.value.get()
    }
}

impl<T: Default> Default for SpinGate<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: fmt::Debug> fmt::Debug for SpinGate<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.try_lock() {
            Some(guard) => f.debug_struct("SpinGate").field("value", &*guard).finish(),
            None => f.debug_struct("SpinGate").field("value", &"<held>").finish(),
        }
    }
}

/// RAII guard granting exclusive access to the value behind a [`SpinGate`].
///
/// The gate is released when the guard drops. Dropping is the *only* release
/// path; there is no manual unlock.
pub struct GateGuard<'a, T> {
    gate: &'a SpinGate<T>,
}

impl<T> Deref for GateGuard<'_, T> {
    type Target = T;

    #[inline]
    fn deref(&self) -> &T {
        // SAFETY: Constructing a guard requires winning the false -> true
        // exchange, so this guard holds exclusive access until drop.
        unsafe { &*self.gate.value.get() }
    }
}

impl<T> DerefMut for GateGuard<'_, T> {
    #[inline]
    fn deref_mut(&mut self) -> &mut T {
        // SAFETY: Same exclusivity argument as Deref.
        unsafe { &mut *self.gate.value.get() }
    }
}

impl<T> Drop for GateGuard<'_, T> {
    fn drop(&mut self) {
        // Release: the next acquirer's Acquire load pairs with this store.
        self.gate.held.store(false, Ordering::Release);
    }
}

impl<T: fmt::Debug> fmt::Debug for GateGuard<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&**self, f)
    }
}
