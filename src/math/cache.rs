//! Fixed-capacity least-recently-used map.
//!
//! Used to memoize expensive, pure numeric results keyed on exact argument
//! bit patterns. Eviction scans for the oldest access stamp, which is cheap at
//! the few-thousand-entry capacities used here.

use std::collections::HashMap;
use std::hash::Hash;

#[derive(Debug, Clone)]
pub struct BoundedCache<K, V> {
    capacity: usize,
    clock: u64,
    entries: HashMap<K, (V, u64)>,
}

impl<K, V> BoundedCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Creates an empty cache holding at most `capacity` entries (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            clock: 0,
            entries: HashMap::with_capacity(capacity),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns a clone of the cached value and marks it most recently used.
    pub fn get(&mut self, key: &K) -> Option<V> {
        self.clock += 1;
        let stamp = self.clock;
        self.entries.get_mut(key).map(|(value, last_used)| {
            *last_used = stamp;
            value.clone()
        })
    }

    /// Inserts `value`, evicting the least recently used entry when full.
    pub fn insert(&mut self, key: K, value: V) {
        self.clock += 1;
        if !self.entries.contains_key(&key) && self.entries.len() >= self.capacity {
            let oldest = self
                .entries
                .iter()
                .min_by_key(|(_, (_, last_used))| *last_used)
                .map(|(k, _)| k.clone());
            if let Some(oldest) = oldest {
                self.entries.remove(&oldest);
            }
        }
        self.entries.insert(key, (value, self.clock));
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Cache key for a tuple of floats, compared on exact bit patterns.
#[inline]
pub fn float_key<const N: usize>(values: [f64; N]) -> [u64; N] {
    values.map(f64::to_bits)
}
