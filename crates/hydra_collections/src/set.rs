//! # Concurrent Set
//!
//! An exclusive-access wrapper over a hash set.
//!
//! Membership storage delegates to the inner [`HashSet`]; this type adds
//! atomicity, including for the bulk set-algebra operations. Each algebra
//! operation mutates the whole set inside one gated critical section, so to
//! any other thread it appears to have happened entirely before or entirely
//! after their own operation - never interleaved value by value.

use std::any::Any;
use std::collections::hash_map::RandomState;
use std::collections::HashSet;
use std::fmt;
use std::hash::{BuildHasher, Hash};

use hydra_sync::SpinGate;

use crate::error::{CollectionError, CollectionResult};

/// A thread-safe set of unique `T` values.
///
/// The hasher parameter `S` plays the role of a pluggable equality/hash
/// strategy; it defaults to the standard [`RandomState`].
///
/// # Example
///
/// ```rust
/// use hydra_collections::ConcurrentSet;
///
/// let live_chunks: ConcurrentSet<u32> = [1, 2, 3, 4].into_iter().collect();
/// live_chunks.except_with([2, 4]); // atomic as a whole
/// let mut rest = live_chunks.to_vec();
/// rest.sort_unstable();
/// assert_eq!(rest, vec![1, 3]);
/// ```
pub struct ConcurrentSet<T, S = RandomState> {
    inner: SpinGate<HashSet<T, S>>,
}

impl<T> ConcurrentSet<T, RandomState> {
    /// Creates an empty set with the default hasher.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: SpinGate::new(HashSet::new()),
        }
    }

    /// Creates an empty set pre-sized for `capacity` values.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: SpinGate::new(HashSet::with_capacity(capacity)),
        }
    }
}

impl<T, S> ConcurrentSet<T, S> {
    /// Creates an empty set with a caller-provided hash strategy.
    #[must_use]
    pub fn with_hasher(hasher: S) -> Self {
        Self {
            inner: SpinGate::new(HashSet::with_hasher(hasher)),
        }
    }

    /// Returns the number of values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    /// Returns whether the set holds no values.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    /// Removes all values.
    pub fn clear(&self) {
        self.inner.lock().clear();
    }
}

impl<T, S> ConcurrentSet<T, S>
where
    T: Eq + Hash,
    S: BuildHasher,
{
    /// Adds `value`. Returns whether it was newly inserted.
    pub fn insert(&self, value: T) -> bool {
        self.inner.lock().insert(value)
    }

    /// Removes `value`. Returns whether it was present.
    pub fn remove(&self, value: &T) -> bool {
        self.inner.lock().remove(value)
    }

    /// Returns whether `value` is a member.
    #[must_use]
    pub fn contains(&self, value: &T) -> bool {
        self.inner.lock().contains(value)
    }

    /// Adds every value of `values` in one gated critical section.
    pub fn extend<I>(&self, values: I)
    where
        I: IntoIterator<Item = T>,
    {
        self.inner.lock().extend(values);
    }

    /// Removes every member the predicate rejects, atomically as a whole.
    ///
    /// Returns the number of members removed.
    pub fn retain_where<F>(&self, predicate: F) -> usize
    where
        F: FnMut(&T) -> bool,
    {
        let mut set = self.inner.lock();
        let before = set.len();
        set.retain(predicate);
        before - set.len()
    }

    /// Set union: adds every value of `operand`, atomically as a whole.
    pub fn union_with<I>(&self, operand: I)
    where
        I: IntoIterator<Item = T>,
    {
        self.inner.lock().extend(operand);
    }

    /// Set intersection: retains only members present in `operand`,
    /// atomically as a whole.
    pub fn intersect_with(&self, operand: &[T]) {
        let mut set = self.inner.lock();
        set.retain(|value| operand.contains(value));
    }

    /// Set difference: removes every value of `operand`, atomically as a
    /// whole.
    pub fn except_with<I>(&self, operand: I)
    where
        I: IntoIterator<Item = T>,
    {
        let mut set = self.inner.lock();
        for value in operand {
            set.remove(&value);
        }
    }

    /// Symmetric difference: toggles membership of every value of
    /// `operand`, atomically as a whole. Values present in both sides are
    /// removed; operand values absent from the set are added.
    pub fn symmetric_except_with<I>(&self, operand: I)
    where
        I: IntoIterator<Item = T>,
    {
        let mut set = self.inner.lock();
        for value in operand {
            if !set.remove(&value) {
                set.insert(value);
            }
        }
    }

    /// Returns whether every member of the set appears in `operand`.
    #[must_use]
    pub fn is_subset_of(&self, operand: &[T]) -> bool {
        let set = self.inner.lock();
        set.iter().all(|value| operand.contains(value))
    }

    /// Returns whether the set contains every value of `operand`.
    #[must_use]
    pub fn is_superset_of(&self, operand: &[T]) -> bool {
        let set = self.inner.lock();
        operand.iter().all(|value| set.contains(value))
    }
}

impl<T, S> ConcurrentSet<T, S>
where
    T: Eq + Hash + Any,
    S: BuildHasher,
{
    /// Type-erased insertion, mirroring
    /// [`ConcurrentMap::insert_erased`](crate::ConcurrentMap::insert_erased).
    ///
    /// # Errors
    ///
    /// [`CollectionError::TypeMismatch`] when `value` is not a `T`. The set
    /// is untouched on failure.
    pub fn insert_erased(&self, value: Box<dyn Any>) -> CollectionResult<bool> {
        let value = value
            .downcast::<T>()
            .map_err(|_| CollectionError::TypeMismatch {
                expected: std::any::type_name::<T>(),
            })?;
        Ok(self.inner.lock().insert(*value))
    }
}

impl<T: Clone, S> ConcurrentSet<T, S> {
    /// Returns an atomic snapshot of all members. Order is unspecified.
    #[must_use]
    pub fn to_vec(&self) -> Vec<T> {
        self.inner.lock().iter().cloned().collect()
    }
}

impl<T> Default for ConcurrentSet<T, RandomState> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: fmt::Debug, S> fmt::Debug for ConcurrentSet<T, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let set = self.inner.lock();
        f.debug_set().entries(set.iter()).finish()
    }
}

impl<T, S> FromIterator<T> for ConcurrentSet<T, S>
where
    T: Eq + Hash,
    S: BuildHasher + Default,
{
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self {
            inner: SpinGate::new(iter.into_iter().collect()),
        }
    }
}
