//! # Concurrent Map
//!
//! An exclusive-access wrapper over a hash map.
//!
//! Storage and lookup delegate entirely to the inner [`HashMap`]; what this
//! type adds is atomicity. Every public operation - including the composite
//! check-then-act conveniences - runs as one gated critical section, so no
//! caller can observe (or race) the gap between a check and its act.

use std::any::Any;
use std::collections::hash_map::RandomState;
use std::collections::HashMap;
use std::fmt;
use std::hash::{BuildHasher, Hash};

use hydra_sync::SpinGate;

use crate::error::{CollectionError, CollectionResult};

/// A thread-safe key-unique mapping from `K` to `V`.
///
/// The hasher parameter `S` plays the role of a pluggable equality/hash
/// strategy; it defaults to the standard [`RandomState`].
///
/// Composite operations like [`ConcurrentMap::try_insert`] exist precisely
/// because the caller must not express them as two separate calls - a
/// `contains_key` followed by an `insert` admits a race between the check
/// and the act.
///
/// # Example
///
/// ```rust
/// use hydra_collections::ConcurrentMap;
///
/// let map = ConcurrentMap::new();
/// assert!(map.try_insert("mesh_cache", 128));
/// assert!(!map.try_insert("mesh_cache", 999)); // present: no overwrite
/// assert_eq!(map.get(&"mesh_cache"), Some(128));
/// ```
pub struct ConcurrentMap<K, V, S = RandomState> {
    inner: SpinGate<HashMap<K, V, S>>,
}

impl<K, V> ConcurrentMap<K, V, RandomState> {
    /// Creates an empty map with the default hasher.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: SpinGate::new(HashMap::new()),
        }
    }

    /// Creates an empty map pre-sized for `capacity` entries.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: SpinGate::new(HashMap::with_capacity(capacity)),
        }
    }
}

impl<K, V, S> ConcurrentMap<K, V, S> {
    /// Creates an empty map with a caller-provided hash strategy.
    #[must_use]
    pub fn with_hasher(hasher: S) -> Self {
        Self {
            inner: SpinGate::new(HashMap::with_hasher(hasher)),
        }
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    /// Returns whether the map holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    /// Removes all entries.
    pub fn clear(&self) {
        self.inner.lock().clear();
    }
}

impl<K, V, S> ConcurrentMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    /// Inserts `value` under `key`, returning the displaced value if the
    /// key was already present. Indexer-set semantics: always wins.
    pub fn insert(&self, key: K, value: V) -> Option<V> {
        self.inner.lock().insert(key, value)
    }

    /// Inserts only if `key` is absent. One critical section: the presence
    /// check and the insertion cannot be interleaved by another thread.
    ///
    /// Returns whether the insertion happened. On `false` the stored value
    /// is untouched.
    pub fn try_insert(&self, key: K, value: V) -> bool {
        let mut map = self.inner.lock();
        if map.contains_key(&key) {
            return false;
        }
        map.insert(key, value);
        true
    }

    /// Removes the entry under `key`, returning its value if present.
    pub fn remove(&self, key: &K) -> Option<V> {
        self.inner.lock().remove(key)
    }

    /// Returns whether `key` has an entry.
    #[must_use]
    pub fn contains_key(&self, key: &K) -> bool {
        self.inner.lock().contains_key(key)
    }

    /// Applies `mutate` to the value under `key`, atomically.
    ///
    /// Returns whether the key was present (and therefore mutated).
    pub fn update<F>(&self, key: &K, mutate: F) -> bool
    where
        F: FnOnce(&mut V),
    {
        let mut map = self.inner.lock();
        match map.get_mut(key) {
            Some(value) => {
                mutate(value);
                true
            }
            None => false,
        }
    }

    /// Inserts every pair of `entries` in one gated critical section.
    pub fn extend<I>(&self, entries: I)
    where
        I: IntoIterator<Item = (K, V)>,
    {
        self.inner.lock().extend(entries);
    }

    /// Removes every entry the predicate rejects, atomically as a whole.
    ///
    /// Returns the number of entries removed.
    pub fn retain_where<F>(&self, predicate: F) -> usize
    where
        F: FnMut(&K, &mut V) -> bool,
    {
        let mut map = self.inner.lock();
        let before = map.len();
        map.retain(predicate);
        before - map.len()
    }
}

impl<K, V, S> ConcurrentMap<K, V, S>
where
    K: Eq + Hash,
    V: Clone,
    S: BuildHasher,
{
    /// Returns a clone of the value under `key`, if present.
    #[must_use]
    pub fn get(&self, key: &K) -> Option<V> {
        self.inner.lock().get(key).cloned()
    }

    /// Returns the value under `key`, inserting `make()` first if absent.
    /// Get-or-add as one critical section.
    pub fn get_or_insert_with<F>(&self, key: K, make: F) -> V
    where
        F: FnOnce() -> V,
    {
        let mut map = self.inner.lock();
        map.entry(key).or_insert_with(make).clone()
    }
}

impl<K, V, S> ConcurrentMap<K, V, S>
where
    K: Eq + Hash,
    V: PartialEq,
    S: BuildHasher,
{
    /// Removes the entry under `key` only when its stored value equals
    /// `expected`. Lookup and removal are one critical section.
    ///
    /// Returns whether the entry was removed.
    pub fn remove_if_value(&self, key: &K, expected: &V) -> bool {
        let mut map = self.inner.lock();
        if map.get(key) == Some(expected) {
            map.remove(key);
            true
        } else {
            false
        }
    }
}

impl<K, V, S> ConcurrentMap<K, V, S>
where
    K: Eq + Hash,
    V: Any,
    S: BuildHasher,
{
    /// Type-erased insertion for callers holding heterogeneous payloads.
    ///
    /// The engine's resource registries traffic in `Box<dyn Any>`; this is
    /// their entry point. A value of the wrong concrete type is a
    /// [`CollectionError::TypeMismatch`] naming the expected type - never a
    /// silent default.
    ///
    /// # Errors
    ///
    /// [`CollectionError::TypeMismatch`] when `value` is not a `V`. The map
    /// is untouched on failure.
    pub fn insert_erased(&self, key: K, value: Box<dyn Any>) -> CollectionResult<Option<V>> {
        let value = value
            .downcast::<V>()
            .map_err(|_| CollectionError::TypeMismatch {
                expected: std::any::type_name::<V>(),
            })?;
        Ok(self.inner.lock().insert(key, *value))
    }
}

impl<K, V, S> ConcurrentMap<K, V, S>
where
    K: Clone,
    V: Clone,
{
    /// Returns an atomic snapshot of all entries. Order is unspecified.
    #[must_use]
    pub fn to_vec(&self) -> Vec<(K, V)> {
        self.inner
            .lock()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Returns an atomic snapshot of all keys. Order is unspecified.
    #[must_use]
    pub fn keys(&self) -> Vec<K> {
        self.inner.lock().keys().cloned().collect()
    }

    /// Returns an atomic snapshot of all values. Order is unspecified.
    #[must_use]
    pub fn values(&self) -> Vec<V> {
        self.inner.lock().values().cloned().collect()
    }
}

impl<K, V> Default for ConcurrentMap<K, V, RandomState> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, S> fmt::Debug for ConcurrentMap<K, V, S>
where
    K: fmt::Debug,
    V: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let map = self.inner.lock();
        f.debug_map().entries(map.iter()).finish()
    }
}

impl<K, V, S> FromIterator<(K, V)> for ConcurrentMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher + Default,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            inner: SpinGate::new(iter.into_iter().collect()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_get_remove() {
        let map = ConcurrentMap::new();
        assert_eq!(map.insert("a", 1), None);
        assert_eq!(map.insert("a", 2), Some(1)); // indexer-set: always wins
        assert_eq!(map.get(&"a"), Some(2));
        assert_eq!(map.remove(&"a"), Some(2));
        assert_eq!(map.get(&"a"), None);
    }

    #[test]
    fn test_try_insert_is_insert_only_if_absent() {
        let map = ConcurrentMap::new();
        assert!(map.try_insert("k", 1));
        assert!(!map.try_insert("k", 2));
        // The losing call must not have overwritten.
        assert_eq!(map.get(&"k"), Some(1));
    }

    #[test]
    fn test_get_or_insert_with() {
        let map = ConcurrentMap::new();
        assert_eq!(map.get_or_insert_with("n", || 10), 10);
        // Second call sees the stored value, make() is not re-run.
        assert_eq!(map.get_or_insert_with("n", || 99), 10);
    }

    #[test]
    fn test_update_existing_only() {
        let map = ConcurrentMap::new();
        map.insert("hits", 1);
        assert!(map.update(&"hits", |v| *v += 10));
        assert_eq!(map.get(&"hits"), Some(11));
        assert!(!map.update(&"misses", |v| *v += 1));
    }

    #[test]
    fn test_remove_if_value() {
        let map = ConcurrentMap::new();
        map.insert("k", 5);
        assert!(!map.remove_if_value(&"k", &6)); // wrong value: kept
        assert!(map.contains_key(&"k"));
        assert!(map.remove_if_value(&"k", &5));
        assert!(!map.contains_key(&"k"));
        assert!(!map.remove_if_value(&"k", &5)); // already gone
    }

    #[test]
    fn test_extend_and_snapshots() {
        let map = ConcurrentMap::new();
        map.extend([(1, "a"), (2, "b"), (3, "c")]);
        assert_eq!(map.len(), 3);

        let mut pairs = map.to_vec();
        pairs.sort_unstable();
        assert_eq!(pairs, vec![(1, "a"), (2, "b"), (3, "c")]);

        let mut keys = map.keys();
        keys.sort_unstable();
        assert_eq!(keys, vec![1, 2, 3]);

        let mut values = map.values();
        values.sort_unstable();
        assert_eq!(values, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_retain_where() {
        let map = ConcurrentMap::new();
        map.extend((0..10).map(|i| (i, i * i)));
        let removed = map.retain_where(|key, _| key % 2 == 0);
        assert_eq!(removed, 5);
        assert_eq!(map.len(), 5);
        assert_eq!(map.get(&4), Some(16));
        assert_eq!(map.get(&5), None);
    }

    #[test]
    fn test_insert_erased() {
        let map: ConcurrentMap<&str, u32> = ConcurrentMap::new();
        assert_eq!(map.insert_erased("good", Box::new(7u32)), Ok(None));
        assert_eq!(map.get(&"good"), Some(7));

        // Wrong concrete type: TypeMismatch, map untouched.
        let err = map.insert_erased("bad", Box::new("not a u32")).unwrap_err();
        assert_eq!(err, CollectionError::TypeMismatch { expected: "u32" });
        assert!(!map.contains_key(&"bad"));
    }

    #[test]
    fn test_clear() {
        let map = ConcurrentMap::new();
        map.insert(1, 1);
        map.insert(2, 2);
        map.clear();
        assert!(map.is_empty());
    }

    #[test]
    fn test_custom_hasher() {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::BuildHasherDefault;

        let map: ConcurrentMap<u64, u64, BuildHasherDefault<DefaultHasher>> =
            ConcurrentMap::with_hasher(BuildHasherDefault::default());
        map.insert(1, 100);
        assert_eq!(map.get(&1), Some(100));
    }
}
