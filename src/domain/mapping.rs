//! Bidirectional lookup tables
//!
//! Every translation between the policy model and native resource fields is
//! a static table of `(typed, native)` pairs. A key missing from the table is
//! a `None`, never a silently empty string.

/// A static table of `(K, V)` pairs that can be searched in either direction.
#[derive(Debug)]
pub struct LookupTable<K: 'static, V: 'static> {
    entries: &'static [(K, V)],
}

impl<K, V> LookupTable<K, V>
where
    K: Copy + PartialEq,
    V: Copy + PartialEq,
{
    pub const fn new(entries: &'static [(K, V)]) -> Self {
        Self { entries }
    }

    /// Typed key to native value
    pub fn forward(&self, key: K) -> Option<V> {
        self.entries
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| *v)
    }

    /// Native value to typed key, by equality
    pub fn reverse(&self, value: V) -> Option<K> {
        self.reverse_by(|v| v == value)
    }

    /// Native value to typed key, matching on part of the value
    pub fn reverse_by(&self, mut pred: impl FnMut(V) -> bool) -> Option<K> {
        self.entries
            .iter()
            .find(|(_, v)| pred(*v))
            .map(|(k, _)| *k)
    }

    pub fn keys(&self) -> impl Iterator<Item = K> + '_ {
        self.entries.iter().map(|(k, _)| *k)
    }
}
