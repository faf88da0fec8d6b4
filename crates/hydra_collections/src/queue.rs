//! # Concurrent Queue
//!
//! A FIFO circular buffer serialized through one spin gate per instance.
//!
//! The live region of the backing array is classified as one of three
//! [`Region`] shapes computed from `(head, tail, len)` - `Empty`,
//! `Contiguous` or `Wrapped` - and every growth, scan and copy path
//! dispatches on that classification. Consulting `len` is what
//! disambiguates the `head == tail` boundary, which is shared by the
//! completely-empty and completely-full states.
//!
//! Growth is the delicate part: a wrapped live region is physically split
//! into two segments, and a naive buffer resize would scramble FIFO order.
//! Growing always linearizes the live region to the front of the fresh
//! buffer, segment by segment.

use std::fmt;

use hydra_sync::SpinGate;

use crate::error::{CollectionError, CollectionResult};

/// Shape of the live region, computed from `(head, tail, len)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Region {
    /// No live elements. `head` and `tail` coincide.
    Empty,
    /// One physical run: `[head, tail)`.
    Contiguous,
    /// Two physical runs: `[head, capacity)` then `[0, tail)`. Includes the
    /// completely-full `head == tail` state.
    Wrapped,
}

/// Backing state, only ever touched while the gate is held.
struct RawQueue<T> {
    /// Slot array. `None` marks a dead slot; live slots are always `Some`.
    slots: Box<[Option<T>]>,
    /// Index of the next dequeue.
    head: usize,
    /// Index of the next enqueue.
    tail: usize,
    /// Number of live elements.
    len: usize,
    /// Generation counter, bumped on every structural mutation.
    version: u64,
}

impl<T> RawQueue<T> {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: (0..capacity).map(|_| None).collect(),
            head: 0,
            tail: 0,
            len: 0,
            version: 0,
        }
    }

    #[inline]
    fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Classifies the live region. The `head == tail` ambiguity is resolved
    /// by `len`, never by index comparison alone.
    fn region(&self) -> Region {
        if self.len == 0 {
            Region::Empty
        } else if self.head < self.tail {
            Region::Contiguous
        } else {
            Region::Wrapped
        }
    }

    /// Index of the `offset`-th live element in FIFO order.
    #[inline]
    fn slot_index(&self, offset: usize) -> usize {
        (self.head + offset) % self.capacity()
    }

    /// Grows the backing array so `additional` more elements fit.
    ///
    /// Doubling policy with a minimum capacity of 1. The live region is
    /// linearized to the front of the fresh array - the two segments of a
    /// wrapped region are copied end-of-array first, start-of-array second,
    /// which is exactly FIFO order.
    fn ensure_capacity(&mut self, additional: usize) {
        let required = self.len.saturating_add(additional);
        let old_cap = self.capacity();
        if required <= old_cap {
            return;
        }
        let new_cap = required.max(old_cap.saturating_mul(2)).max(1);
        let mut fresh: Vec<Option<T>> = (0..new_cap).map(|_| None).collect();

        match self.region() {
            Region::Empty => {
                // Nothing to relocate.
            }
            Region::Contiguous => {
                // One run: [head, tail).
                let mut write = 0;
                for read in self.head..self.tail {
                    fresh[write] = self.slots[read].take();
                    write += 1;
                }
            }
            Region::Wrapped => {
                // Two runs: [head, old_cap) then [0, tail).
                let mut write = 0;
                for read in self.head..old_cap {
                    fresh[write] = self.slots[read].take();
                    write += 1;
                }
                for read in 0..self.tail {
                    fresh[write] = self.slots[read].take();
                    write += 1;
                }
            }
        }

        self.slots = fresh.into_boxed_slice();
        self.head = 0;
        self.tail = self.len;
        self.version += 1;
        tracing::trace!(old_cap, new_cap, "queue backing buffer grown");
    }

    fn push_back(&mut self, item: T) {
        self.ensure_capacity(1);
        let tail = self.tail;
        self.slots[tail] = Some(item);
        self.tail = (tail + 1) % self.capacity();
        self.len += 1;
        self.version += 1;
    }
}

/// A thread-safe FIFO queue over a circular buffer.
///
/// All operations acquire the instance's gate for their full duration.
/// Dequeuing from an empty queue is a normal outcome
/// ([`ConcurrentQueue::try_dequeue`] returns `None`), never a fault.
///
/// # Example
///
/// ```rust
/// use hydra_collections::ConcurrentQueue;
///
/// let queue = ConcurrentQueue::with_capacity(2);
/// queue.enqueue(1);
/// queue.enqueue(2);
/// queue.enqueue(3); // forces growth, FIFO order preserved
/// assert_eq!(queue.try_dequeue(), Some(1));
/// assert_eq!(queue.try_dequeue(), Some(2));
/// assert_eq!(queue.try_dequeue(), Some(3));
/// assert_eq!(queue.try_dequeue(), None);
/// ```
pub struct ConcurrentQueue<T> {
    inner: SpinGate<RawQueue<T>>,
}

impl<T> ConcurrentQueue<T> {
    /// Creates an empty queue with no allocated capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Creates an empty queue pre-sized for `capacity` elements.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: SpinGate::new(RawQueue::with_capacity(capacity)),
        }
    }

    /// Appends an element at the tail, growing the buffer if full.
    pub fn enqueue(&self, item: T) {
        self.inner.lock().push_back(item);
    }

    /// Appends every element of `items` in one gated critical section.
    ///
    /// Capacity for the whole batch is ensured up front, so at most one
    /// growth/relocation happens regardless of batch size.
    pub fn enqueue_all<I>(&self, items: I)
    where
        I: IntoIterator<Item = T>,
    {
        let items: Vec<T> = items.into_iter().collect();
        if items.is_empty() {
            return;
        }
        let mut raw = self.inner.lock();
        raw.ensure_capacity(items.len());
        for item in items {
            let tail = raw.tail;
            raw.slots[tail] = Some(item);
            raw.tail = (tail + 1) % raw.capacity();
            raw.len += 1;
        }
        raw.version += 1;
    }

    /// Removes and returns the element at the head.
    ///
    /// Returns `None` when the queue is empty - absence is a normal
    /// outcome, not a fault.
    pub fn try_dequeue(&self) -> Option<T> {
        let mut raw = self.inner.lock();
        if raw.len == 0 {
            return None;
        }
        let head = raw.head;
        let item = raw.slots[head].take();
        debug_assert!(item.is_some(), "live slot must be occupied");
        raw.head = (head + 1) % raw.capacity();
        raw.len -= 1;
        raw.version += 1;
        item
    }

    /// Removes all elements, dropping every live slot across whichever
    /// segment(s) are live, and resets the cursors to the empty state.
    pub fn clear(&self) {
        let mut raw = self.inner.lock();
        if raw.len > 0 {
            for offset in 0..raw.len {
                let index = raw.slot_index(offset);
                raw.slots[index] = None;
            }
            raw.head = 0;
            raw.tail = 0;
            raw.len = 0;
            raw.version += 1;
        }
    }

    /// Returns the number of live elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().len
    }

    /// Returns whether the queue holds no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.lock().len == 0
    }

    /// Returns the physical capacity of the backing array.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.inner.lock().capacity()
    }

    /// Returns the current generation counter.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.inner.lock().version
    }
}

impl<T: PartialEq> ConcurrentQueue<T> {
    /// Returns whether any live element equals `item`.
    ///
    /// Scans correctly across the wrap boundary: two passes when the live
    /// region is wrapped, one when it is contiguous.
    #[must_use]
    pub fn contains(&self, item: &T) -> bool {
        let raw = self.inner.lock();
        match raw.region() {
            Region::Empty => false,
            Region::Contiguous => raw.slots[raw.head..raw.tail]
                .iter()
                .any(|slot| slot.as_ref() == Some(item)),
            Region::Wrapped => {
                raw.slots[raw.head..]
                    .iter()
                    .any(|slot| slot.as_ref() == Some(item))
                    || raw.slots[..raw.tail]
                        .iter()
                        .any(|slot| slot.as_ref() == Some(item))
            }
        }
    }
}

impl<T: Clone> ConcurrentQueue<T> {
    /// Returns a clone of the head element without removing it.
    #[must_use]
    pub fn peek(&self) -> Option<T> {
        let raw = self.inner.lock();
        if raw.len == 0 {
            return None;
        }
        raw.slots[raw.head].clone()
    }

    /// Returns an atomic snapshot of the live region in FIFO order.
    #[must_use]
    pub fn to_vec(&self) -> Vec<T> {
        let raw = self.inner.lock();
        let mut out = Vec::with_capacity(raw.len);
        Self::linearize(&raw, |item| out.push(item.clone()));
        out
    }

    /// Copies the live region into `dest` starting at `offset`, in FIFO
    /// order, atomically.
    ///
    /// # Errors
    ///
    /// [`CollectionError::CapacityExceeded`] when `offset` lies past the end
    /// of the destination or fewer than `len` slots remain past it. The
    /// check precedes any copying, even for an empty queue.
    pub fn copy_into(&self, dest: &mut [T], offset: usize) -> CollectionResult<()> {
        let raw = self.inner.lock();
        let Some(available) = dest.len().checked_sub(offset) else {
            return Err(CollectionError::CapacityExceeded {
                required: raw.len,
                available: 0,
            });
        };
        if available < raw.len {
            return Err(CollectionError::CapacityExceeded {
                required: raw.len,
                available,
            });
        }
        let mut write = offset;
        Self::linearize(&raw, |item| {
            dest[write] = item.clone();
            write += 1;
        });
        Ok(())
    }

    /// Visits every live element in FIFO order, computing the two-segment
    /// split explicitly when the region is wrapped.
    fn linearize<F>(raw: &RawQueue<T>, mut visit: F)
    where
        F: FnMut(&T),
    {
        let mut visit_run = |run: &[Option<T>]| {
            for slot in run {
                if let Some(item) = slot.as_ref() {
                    visit(item);
                }
            }
        };
        match raw.region() {
            Region::Empty => {}
            Region::Contiguous => visit_run(&raw.slots[raw.head..raw.tail]),
            Region::Wrapped => {
                visit_run(&raw.slots[raw.head..]);
                visit_run(&raw.slots[..raw.tail]);
            }
        }
    }

    /// Returns a fail-fast iterator over clones of the live elements in
    /// FIFO order.
    ///
    /// Same contract as [`ConcurrentList::iter`](crate::ConcurrentList::iter):
    /// the gate is held per step, not across the traversal, and any
    /// structural mutation after creation surfaces as
    /// [`CollectionError::ConcurrentModification`] and fuses the iterator.
    #[must_use]
    pub fn iter(&self) -> QueueIter<'_, T> {
        let raw = self.inner.lock();
        QueueIter {
            queue: self,
            version: raw.version,
            cursor: 0,
            fused: false,
        }
    }
}

impl<T> Default for ConcurrentQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: fmt::Debug + Clone> fmt::Debug for ConcurrentQueue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.to_vec()).finish()
    }
}

impl<T> FromIterator<T> for ConcurrentQueue<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let queue = Self::new();
        queue.enqueue_all(iter);
        queue
    }
}

/// Fail-fast lazy iterator over a [`ConcurrentQueue`].
///
/// Single-pass and not restartable. Yields `Err` exactly once if the queue
/// is structurally mutated mid-iteration, then fuses.
pub struct QueueIter<'a, T> {
    queue: &'a ConcurrentQueue<T>,
    /// Generation captured when the iterator was created.
    version: u64,
    cursor: usize,
    fused: bool,
}

impl<T: Clone> Iterator for QueueIter<'_, T> {
    type Item = CollectionResult<T>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.fused {
            return None;
        }
        let raw = self.queue.inner.lock();
        if raw.version != self.version {
            self.fused = true;
            return Some(Err(CollectionError::ConcurrentModification));
        }
        if self.cursor >= raw.len {
            self.fused = true;
            return None;
        }
        let index = raw.slot_index(self.cursor);
        let item = raw.slots[index].clone();
        debug_assert!(item.is_some(), "live slot must be occupied");
        self.cursor += 1;
        item.map(Ok)
    }
}
