/// Fixed-capacity key/value store ordered most-recently-used first.
///
/// A hit moves the entry one slot toward the front (adjacent swap), not all the way. Insertion
/// always lands at the front and evicts from the back.
#[derive(Debug, Clone)]
pub struct BoundedCache<K, V> {
    entries: Vec<(K, V)>,
    capacity: usize,
}

impl<K: PartialEq, V> BoundedCache<K, V> {
    /// Create an empty cache holding at most `capacity` entries.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity.min(1024)),
            capacity,
        }
    }

    /// Maximum number of entries.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Current number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `true` when the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Return `true` when `key` is cached. Does not touch recency.
    pub fn contains(&self, key: &K) -> bool {
        self.position(key).is_some()
    }

    /// Return the cached value for `key`, or `V::default()` on a miss.
    ///
    /// A miss leaves the cache untouched.
    pub fn get(&mut self, key: &K) -> V
    where
        V: Default + Clone,
    {
        self.get_mut(key).map(|v| v.clone()).unwrap_or_default()
    }

    /// Mutable access to a cached value, promoting it one slot on a hit.
    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        let pos = self.position(key)?;
        let pos = if pos > 0 {
            self.entries.swap(pos, pos - 1);
            pos - 1
        } else {
            pos
        };
        Some(&mut self.entries[pos].1)
    }

    /// Insert `value` at the front, evicting the least-recently-used entry when full.
    ///
    /// Re-adding a cached key replaces the old entry.
    pub fn add(&mut self, key: K, value: V) {
        if self.capacity == 0 {
            return;
        }
        if let Some(pos) = self.position(&key) {
            self.entries.remove(pos);
        } else if self.entries.len() >= self.capacity {
            self.entries.pop();
        }
        self.entries.insert(0, (key, value));
    }

    /// Drop every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    fn position(&self, key: &K) -> Option<usize> {
        self.entries.iter().position(|(k, _)| k == key)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/cache.rs"]
mod tests;
