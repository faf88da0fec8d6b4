//! # Concurrent List
//!
//! A growable array serialized through one spin gate per instance.
//!
//! ## Safety Note
//!
//! This module requires unsafe code for the one explicitly-labeled escape
//! hatch ([`ConcurrentList::unguarded_slice`]). Everything else is safe.

#![allow(unsafe_code)]
//!
//! ## Design
//!
//! The backing storage is contiguous with a logical length distinct from
//! physical capacity. Capacity grows by doubling (minimum 1) and shrinks only
//! on explicit trim. Every structural mutation - push, insert, remove, clear,
//! sort, reverse, capacity change - bumps a generation counter; iterators
//! capture the generation at creation and fail fast on mismatch instead of
//! holding the gate across the whole traversal.

use std::cmp::Ordering as CmpOrdering;
use std::fmt;

use hydra_sync::SpinGate;

use crate::error::{CollectionError, CollectionResult};

/// Backing state, only ever touched while the gate is held
/// (or through the labeled unsafe accessor).
struct RawList<T> {
    /// Contiguous element storage. Logical length is `data.len()`,
    /// physical capacity is `data.capacity()`.
    data: Vec<T>,
    /// Generation counter, bumped on every structural mutation.
    version: u64,
}

impl<T> RawList<T> {
    /// Grows the backing buffer so it can hold at least `required` elements.
    ///
    /// Doubling policy with a minimum capacity of 1. Never shrinks.
    fn ensure_capacity(&mut self, required: usize) {
        let old_cap = self.data.capacity();
        if required <= old_cap {
            return;
        }
        let new_cap = required.max(old_cap.saturating_mul(2)).max(1);
        self.data.reserve_exact(new_cap - self.data.len());
        self.version += 1;
        tracing::trace!(old_cap, new_cap, "list backing buffer grown");
    }
}

/// A thread-safe growable array.
///
/// All operations acquire the instance's gate for their full duration, so
/// concurrent operations on one list are linearizable. Iteration is the one
/// exception: see [`ConcurrentList::iter`].
///
/// # Example
///
/// ```rust
/// use hydra_collections::ConcurrentList;
///
/// let list = ConcurrentList::new();
/// list.push(3);
/// list.push(1);
/// list.insert(1, 2).unwrap();
/// assert_eq!(list.to_vec(), vec![3, 2, 1]);
/// ```
pub struct ConcurrentList<T> {
    inner: SpinGate<RawList<T>>,
}

impl<T> ConcurrentList<T> {
    /// Creates an empty list with no allocated capacity.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            inner: SpinGate::new(RawList {
                data: Vec::new(),
                version: 0,
            }),
        }
    }

    /// Creates an empty list pre-sized for `capacity` elements.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: SpinGate::new(RawList {
                data: Vec::with_capacity(capacity),
                version: 0,
            }),
        }
    }

    /// Appends an element. O(1) amortized; grows the backing buffer by
    /// doubling when full.
    pub fn push(&self, item: T) {
        let mut raw = self.inner.lock();
        let required = raw.data.len() + 1;
        raw.ensure_capacity(required);
        raw.data.push(item);
        raw.version += 1;
    }

    /// Inserts `item` at `index`, shifting trailing elements right by one.
    ///
    /// `index == len` degenerates to an append.
    ///
    /// # Errors
    ///
    /// [`CollectionError::IndexOutOfBounds`] when `index > len`. The check
    /// precedes any mutation.
    pub fn insert(&self, index: usize, item: T) -> CollectionResult<()> {
        let mut raw = self.inner.lock();
        let len = raw.data.len();
        if index > len {
            return Err(CollectionError::IndexOutOfBounds { index, len });
        }
        raw.ensure_capacity(len + 1);
        raw.data.insert(index, item);
        raw.version += 1;
        Ok(())
    }

    /// Removes and returns the element at `index`, shifting trailing
    /// elements left by one. The vacated slot retains no reference to the
    /// element - ownership moves to the caller.
    ///
    /// # Errors
    ///
    /// [`CollectionError::IndexOutOfBounds`] when `index >= len`. The check
    /// precedes any mutation.
    pub fn remove_at(&self, index: usize) -> CollectionResult<T> {
        let mut raw = self.inner.lock();
        let len = raw.data.len();
        if index >= len {
            return Err(CollectionError::IndexOutOfBounds { index, len });
        }
        let item = raw.data.remove(index);
        raw.version += 1;
        Ok(item)
    }

    /// Removes every element the predicate matches, in a single O(n)
    /// compaction pass. Survivors keep their relative order.
    ///
    /// Returns the number of elements removed. This is deliberately not
    /// repeated single-element removal - one pass copies survivors down to a
    /// write cursor and drops the dead tail.
    pub fn remove_where<F>(&self, mut predicate: F) -> usize
    where
        F: FnMut(&T) -> bool,
    {
        let mut raw = self.inner.lock();
        let len = raw.data.len();
        let mut write = 0;
        for read in 0..len {
            if !predicate(&raw.data[read]) {
                raw.data.swap(write, read);
                write += 1;
            }
        }
        let removed = len - write;
        if removed > 0 {
            // Drops everything past the write cursor.
            raw.data.truncate(write);
            raw.version += 1;
        }
        removed
    }

    /// Removes `[index, index + count)`, shifting trailing elements left.
    ///
    /// # Errors
    ///
    /// [`CollectionError::IndexOutOfBounds`] when the range does not lie
    /// within `[0, len)`; [`CollectionError::InvalidArgument`] when
    /// `index + count` overflows. The check precedes any mutation.
    pub fn remove_range(&self, index: usize, count: usize) -> CollectionResult<()> {
        let mut raw = self.inner.lock();
        let len = raw.data.len();
        let end = index
            .checked_add(count)
            .ok_or(CollectionError::InvalidArgument("range overflow"))?;
        if end > len {
            return Err(CollectionError::IndexOutOfBounds { index, len });
        }
        if count > 0 {
            raw.data.drain(index..end);
            raw.version += 1;
        }
        Ok(())
    }

    /// Inserts every element of `items` starting at `index`, shifting
    /// trailing elements right by the batch length. One gated critical
    /// section.
    ///
    /// # Errors
    ///
    /// [`CollectionError::IndexOutOfBounds`] when `index > len`. The check
    /// precedes any mutation.
    pub fn insert_all<I>(&self, index: usize, items: I) -> CollectionResult<()>
    where
        I: IntoIterator<Item = T>,
    {
        let mut raw = self.inner.lock();
        let len = raw.data.len();
        if index > len {
            return Err(CollectionError::IndexOutOfBounds { index, len });
        }
        let mut moved = raw.data.split_off(index);
        raw.data.extend(items);
        raw.data.append(&mut moved);
        raw.version += 1;
        Ok(())
    }

    /// Returns the index of the first element the predicate matches.
    /// Linear scan, O(n).
    #[must_use]
    pub fn find_index<F>(&self, mut predicate: F) -> Option<usize>
    where
        F: FnMut(&T) -> bool,
    {
        self.inner.lock().data.iter().position(|x| predicate(x))
    }

    /// Returns whether every element matches the predicate. Vacuously true
    /// when empty.
    #[must_use]
    pub fn all<F>(&self, mut predicate: F) -> bool
    where
        F: FnMut(&T) -> bool,
    {
        self.inner.lock().data.iter().all(|x| predicate(x))
    }

    /// Returns whether any element matches the predicate.
    #[must_use]
    pub fn any<F>(&self, mut predicate: F) -> bool
    where
        F: FnMut(&T) -> bool,
    {
        self.inner.lock().data.iter().any(|x| predicate(x))
    }

    /// Visits every element in order, under the gate for the whole visit.
    ///
    /// The serialized alternative to [`ConcurrentList::iter`]: mutation
    /// from other threads is blocked for the duration instead of detected.
    /// Keep the visitor short.
    pub fn for_each<F>(&self, visit: F)
    where
        F: FnMut(&T),
    {
        self.inner.lock().data.iter().for_each(visit);
    }

    /// Removes all elements. Capacity is retained; use
    /// [`ConcurrentList::shrink_to_fit`] to release it.
    pub fn clear(&self) {
        let mut raw = self.inner.lock();
        raw.data.clear();
        raw.version += 1;
    }

    /// Reserves capacity for at least `additional` more elements.
    ///
    /// # Errors
    ///
    /// [`CollectionError::InvalidArgument`] when `len + additional` would
    /// overflow `usize`.
    pub fn reserve(&self, additional: usize) -> CollectionResult<()> {
        let mut raw = self.inner.lock();
        let required = raw
            .data
            .len()
            .checked_add(additional)
            .ok_or(CollectionError::InvalidArgument("capacity overflow"))?;
        raw.ensure_capacity(required);
        Ok(())
    }

    /// Shrinks the backing buffer to the logical length. This is the only
    /// operation that reduces capacity.
    pub fn shrink_to_fit(&self) {
        let mut raw = self.inner.lock();
        if raw.data.capacity() > raw.data.len() {
            raw.data.shrink_to_fit();
            raw.version += 1;
        }
    }

    /// Returns the logical length.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().data.len()
    }

    /// Returns whether the list holds no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.lock().data.is_empty()
    }

    /// Returns the physical capacity of the backing buffer.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.inner.lock().data.capacity()
    }

    /// Returns the current generation counter.
    ///
    /// Diagnostic: bumped on every structural mutation, used by iterators
    /// for fail-fast detection.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.inner.lock().version
    }

    /// Sorts `[index, index + count)` in place with `comparator`.
    ///
    /// # Errors
    ///
    /// [`CollectionError::IndexOutOfBounds`] when the range does not lie
    /// within `[0, len)`; [`CollectionError::InvalidArgument`] when
    /// `index + count` overflows.
    pub fn sort_range<F>(&self, index: usize, count: usize, comparator: F) -> CollectionResult<()>
    where
        F: FnMut(&T, &T) -> CmpOrdering,
    {
        let mut raw = self.inner.lock();
        let len = raw.data.len();
        let end = index
            .checked_add(count)
            .ok_or(CollectionError::InvalidArgument("range overflow"))?;
        if end > len {
            return Err(CollectionError::IndexOutOfBounds { index, len });
        }
        raw.data[index..end].sort_unstable_by(comparator);
        raw.version += 1;
        Ok(())
    }

    /// Sorts the whole list with `comparator`.
    pub fn sort_by<F>(&self, comparator: F)
    where
        F: FnMut(&T, &T) -> CmpOrdering,
    {
        let mut raw = self.inner.lock();
        raw.data.sort_unstable_by(comparator);
        raw.version += 1;
    }

    /// Reverses `[index, index + count)` in place.
    ///
    /// # Errors
    ///
    /// Same range contract as [`ConcurrentList::sort_range`].
    pub fn reverse_range(&self, index: usize, count: usize) -> CollectionResult<()> {
        let mut raw = self.inner.lock();
        let len = raw.data.len();
        let end = index
            .checked_add(count)
            .ok_or(CollectionError::InvalidArgument("range overflow"))?;
        if end > len {
            return Err(CollectionError::IndexOutOfBounds { index, len });
        }
        raw.data[index..end].reverse();
        raw.version += 1;
        Ok(())
    }

    /// Reverses the whole list in place.
    pub fn reverse(&self) {
        let mut raw = self.inner.lock();
        raw.data.reverse();
        raw.version += 1;
    }

    /// Replaces the element at `index`, returning the displaced value.
    ///
    /// # Errors
    ///
    /// [`CollectionError::IndexOutOfBounds`] when `index >= len`.
    pub fn set(&self, index: usize, item: T) -> CollectionResult<T> {
        let mut raw = self.inner.lock();
        let len = raw.data.len();
        if index >= len {
            return Err(CollectionError::IndexOutOfBounds { index, len });
        }
        let displaced = std::mem::replace(&mut raw.data[index], item);
        raw.version += 1;
        Ok(displaced)
    }

    /// Appends every element of `items` in one gated critical section.
    pub fn push_all<I>(&self, items: I)
    where
        I: IntoIterator<Item = T>,
    {
        let iter = items.into_iter();
        let mut raw = self.inner.lock();
        let (lower, _) = iter.size_hint();
        let required = raw.data.len().saturating_add(lower);
        raw.ensure_capacity(required);
        raw.data.extend(iter);
        raw.version += 1;
    }

    /// Returns a view of the backing storage without acquiring the gate.
    ///
    /// This is the advanced escape hatch mirroring
    /// [`SpinGate::get_unguarded`]: zero synchronization, zero copies.
    ///
    /// # Safety
    ///
    /// The caller forfeits thread safety entirely. No other thread may
    /// mutate this list for as long as the returned slice is alive, and the
    /// slice may dangle after any growth if that contract is broken.
    #[must_use]
    pub unsafe fn unguarded_slice(&self) -> &[T] {
        // SAFETY: Deferred to the caller per the documented contract above.
        unsafe { &(*self.inner.get_unguarded()).data }
    }
}

impl<T: PartialEq> ConcurrentList<T> {
    /// Returns the index of the first element equal to `item`, if any.
    /// Linear scan, O(n).
    #[must_use]
    pub fn index_of(&self, item: &T) -> Option<usize> {
        self.inner.lock().data.iter().position(|x| x == item)
    }

    /// Returns whether any element equals `item`. Linear scan, O(n).
    #[must_use]
    pub fn contains(&self, item: &T) -> bool {
        self.inner.lock().data.iter().any(|x| x == item)
    }

    /// Returns the index of the last element equal to `item`, if any.
    /// Linear scan, O(n).
    #[must_use]
    pub fn last_index_of(&self, item: &T) -> Option<usize> {
        self.inner.lock().data.iter().rposition(|x| x == item)
    }

    /// Removes the first element equal to `item`.
    ///
    /// Returns whether a match was found and removed.
    pub fn remove(&self, item: &T) -> bool {
        let mut raw = self.inner.lock();
        match raw.data.iter().position(|x| x == item) {
            Some(index) => {
                raw.data.remove(index);
                raw.version += 1;
                true
            }
            None => false,
        }
    }
}

impl<T: Clone> ConcurrentList<T> {
    /// Returns a clone of the element at `index`.
    ///
    /// # Errors
    ///
    /// [`CollectionError::IndexOutOfBounds`] when `index >= len`.
    pub fn get(&self, index: usize) -> CollectionResult<T> {
        let raw = self.inner.lock();
        let len = raw.data.len();
        raw.data
            .get(index)
            .cloned()
            .ok_or(CollectionError::IndexOutOfBounds { index, len })
    }

    /// Returns a snapshot of the whole list, taken atomically.
    #[must_use]
    pub fn to_vec(&self) -> Vec<T> {
        self.inner.lock().data.clone()
    }

    /// Returns an atomic snapshot of `[index, index + count)`.
    ///
    /// # Errors
    ///
    /// Same range contract as [`ConcurrentList::sort_range`].
    pub fn get_range(&self, index: usize, count: usize) -> CollectionResult<Vec<T>> {
        let raw = self.inner.lock();
        let len = raw.data.len();
        let end = index
            .checked_add(count)
            .ok_or(CollectionError::InvalidArgument("range overflow"))?;
        if end > len {
            return Err(CollectionError::IndexOutOfBounds { index, len });
        }
        Ok(raw.data[index..end].to_vec())
    }

    /// Copies the whole list into `dest` starting at `offset`, atomically.
    ///
    /// # Errors
    ///
    /// [`CollectionError::CapacityExceeded`] when `offset` lies past the end
    /// of the destination or fewer than `len` slots remain past it. The
    /// check precedes any copying, even for an empty list.
    pub fn copy_into(&self, dest: &mut [T], offset: usize) -> CollectionResult<()> {
        let raw = self.inner.lock();
        let len = raw.data.len();
        let Some(available) = dest.len().checked_sub(offset) else {
            return Err(CollectionError::CapacityExceeded {
                required: len,
                available: 0,
            });
        };
        if available < len {
            return Err(CollectionError::CapacityExceeded {
                required: len,
                available,
            });
        }
        dest[offset..offset + len].clone_from_slice(&raw.data);
        Ok(())
    }

    /// Returns a fail-fast iterator over clones of the elements.
    ///
    /// The iterator does **not** hold the gate across the traversal. Each
    /// step briefly acquires the gate for one element and validates the
    /// generation captured at creation; any structural mutation in between
    /// surfaces as [`CollectionError::ConcurrentModification`] and fuses the
    /// iterator. Detection, not prevention: create a new iterator to start
    /// over.
    #[must_use]
    pub fn iter(&self) -> ListIter<'_, T> {
        let raw = self.inner.lock();
        ListIter {
            list: self,
            version: raw.version,
            cursor: 0,
            fused: false,
        }
    }
}

impl<T> Default for ConcurrentList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: fmt::Debug> fmt::Debug for ConcurrentList<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let raw = self.inner.lock();
        f.debug_list().entries(raw.data.iter()).finish()
    }
}

impl<T> FromIterator<T> for ConcurrentList<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let data: Vec<T> = iter.into_iter().collect();
        Self {
            inner: SpinGate::new(RawList { data, version: 0 }),
        }
    }
}

/// Fail-fast lazy iterator over a [`ConcurrentList`].
///
/// Single-pass and not restartable. Yields `Err` exactly once if the list is
/// structurally mutated mid-iteration, then fuses.
pub struct ListIter<'a, T> {
    list: &'a ConcurrentList<T>,
    /// Generation captured when the iterator was created.
    version: u64,
    cursor: usize,
    fused: bool,
}

impl<T: Clone> Iterator for ListIter<'_, T> {
    type Item = CollectionResult<T>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.fused {
            return None;
        }
        // Gate held for one element only, never across the whole traversal.
        let raw = self.list.inner.lock();
        if raw.version != self.version {
            self.fused = true;
            return Some(Err(CollectionError::ConcurrentModification));
        }
        if self.cursor >= raw.data.len() {
            self.fused = true;
            return None;
        }
        let item = raw.data[self.cursor].clone();
        self.cursor += 1;
        Some(Ok(item))
    }
}
