//! Insertion-ordered identity table keyed by `(type, id)`.
//!
//! Most documents reference a handful of resources, so the table starts in a
//! frugal mode: a fixed inline array of [`Fingerprint`]s scanned linearly.
//! Past [`INLINE_CAPACITY`] entries it bursts into hash buckets over the full
//! identity. Entry indices are stable in both modes and follow first-seen
//! order, which is the order `included` is written in.

use std::borrow::Cow;
use std::collections::HashMap;
use std::hash::{DefaultHasher, Hash, Hasher};

use tracing::debug;

/// Entries kept in the linear-scan array before switching to hashed lookup
pub(crate) const INLINE_CAPACITY: usize = 64;

const HEAD_LEN: usize = 8;

/// Borrowed `(id, type)` identity of a resource
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ResourceKey<'a> {
    pub(crate) id: &'a str,
    pub(crate) resource_type: &'a str,
}

/// Packed prefix of an identity.
///
/// Holds the first eight bytes and the length of both strings. Two identities
/// whose strings are at most eight bytes long are equal exactly when their
/// fingerprints are; longer strings need a full comparison after a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) struct Fingerprint {
    id_head: u64,
    type_head: u64,
    id_len: usize,
    type_len: usize,
}

impl Fingerprint {
    pub(crate) fn of(id: &str, resource_type: &str) -> Self {
        Self {
            id_head: head(id.as_bytes()),
            type_head: head(resource_type.as_bytes()),
            id_len: id.len(),
            type_len: resource_type.len(),
        }
    }

    fn is_exact(&self) -> bool {
        self.id_len <= HEAD_LEN && self.type_len <= HEAD_LEN
    }
}

fn head(bytes: &[u8]) -> u64 {
    let mut buf = [0u8; HEAD_LEN];
    let n = bytes.len().min(HEAD_LEN);
    buf[..n].copy_from_slice(&bytes[..n]);
    u64::from_le_bytes(buf)
}

fn full_hash(id: &str, resource_type: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    resource_type.hash(&mut hasher);
    id.hash(&mut hasher);
    hasher.finish()
}

pub(crate) struct Entry<'k, V> {
    pub(crate) id: Cow<'k, str>,
    pub(crate) resource_type: Cow<'k, str>,
    pub(crate) value: V,
}

impl<V> Entry<'_, V> {
    fn matches(&self, id: &str, resource_type: &str) -> bool {
        self.id == id && self.resource_type == resource_type
    }
}

pub(crate) struct IdentityTable<'k, V> {
    entries: Vec<Entry<'k, V>>,
    inline: [Fingerprint; INLINE_CAPACITY],
    buckets: Option<HashMap<u64, Vec<usize>>>,
}

impl<'k, V> IdentityTable<'k, V> {
    pub(crate) fn new() -> Self {
        Self {
            entries: Vec::new(),
            inline: [Fingerprint::default(); INLINE_CAPACITY],
            buckets: None,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table has switched to hashed lookup
    #[cfg(test)]
    pub(crate) fn is_burst(&self) -> bool {
        self.buckets.is_some()
    }

    pub(crate) fn get(&self, index: usize) -> Option<&Entry<'k, V>> {
        self.entries.get(index)
    }

    pub(crate) fn get_mut(&mut self, index: usize) -> Option<&mut Entry<'k, V>> {
        self.entries.get_mut(index)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &Entry<'k, V>> {
        self.entries.iter()
    }

    /// Index of the entry for `(id, resource_type)`
    pub(crate) fn find(&self, id: &str, resource_type: &str) -> Option<usize> {
        match &self.buckets {
            Some(buckets) => buckets
                .get(&full_hash(id, resource_type))?
                .iter()
                .copied()
                .find(|&index| self.entries[index].matches(id, resource_type)),
            None => {
                let probe = Fingerprint::of(id, resource_type);
                let exact = probe.is_exact();
                self.inline[..self.entries.len()]
                    .iter()
                    .enumerate()
                    .find_map(|(index, fingerprint)| {
                        let hit = *fingerprint == probe
                            && (exact || self.entries[index].matches(id, resource_type));
                        hit.then_some(index)
                    })
            }
        }
    }

    /// Insert unless present; returns the entry index and whether it was added
    pub(crate) fn insert_if_absent(
        &mut self,
        id: Cow<'k, str>,
        resource_type: Cow<'k, str>,
        value: impl FnOnce() -> V,
    ) -> (usize, bool) {
        if let Some(index) = self.find(&id, &resource_type) {
            return (index, false);
        }

        let index = self.entries.len();
        if index < INLINE_CAPACITY {
            self.inline[index] = Fingerprint::of(&id, &resource_type);
        } else if self.buckets.is_none() {
            self.burst();
        }
        if let Some(buckets) = &mut self.buckets {
            buckets
                .entry(full_hash(&id, &resource_type))
                .or_default()
                .push(index);
        }

        self.entries.push(Entry {
            id,
            resource_type,
            value: value(),
        });
        (index, true)
    }

    fn burst(&mut self) {
        debug!(
            entries = self.entries.len(),
            "Identity table exceeded inline capacity, switching to hashed lookup"
        );
        let mut buckets: HashMap<u64, Vec<usize>> = HashMap::with_capacity(INLINE_CAPACITY * 2);
        for (index, entry) in self.entries.iter().enumerate() {
            buckets
                .entry(full_hash(&entry.id, &entry.resource_type))
                .or_default()
                .push(index);
        }
        self.buckets = Some(buckets);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fingerprint_exact_for_short_strings() {
        assert_eq!(Fingerprint::of("1", "people"), Fingerprint::of("1", "people"));
        assert_ne!(Fingerprint::of("1", "people"), Fingerprint::of("2", "people"));
        assert_ne!(Fingerprint::of("1", "people"), Fingerprint::of("1", "peoples"));
        assert!(Fingerprint::of("12345678", "articles").is_exact());
        assert!(!Fingerprint::of("123456789", "articles").is_exact());
    }

    #[test]
    fn test_long_strings_with_shared_prefix() {
        let mut table: IdentityTable<'_, ()> = IdentityTable::new();
        let (a, _) = table.insert_if_absent("00000000-aaaa".into(), "resources".into(), || ());
        let (b, added) = table.insert_if_absent("00000000-bbbb".into(), "resources".into(), || ());
        assert!(added);
        assert_ne!(a, b);
        assert_eq!(table.find("00000000-aaaa", "resources"), Some(a));
        assert_eq!(table.find("00000000-bbbb", "resources"), Some(b));
        assert_eq!(table.find("00000000-cccc", "resources"), None);
    }

    #[test]
    fn test_insert_is_idempotent() {
        let mut table = IdentityTable::new();
        assert_eq!(table.insert_if_absent("1".into(), "people".into(), || 10), (0, true));
        assert_eq!(table.insert_if_absent("1".into(), "people".into(), || 20), (0, false));
        assert_eq!(table.len(), 1);
        assert_eq!(table.get(0).map(|e| e.value), Some(10));
    }

    #[test]
    fn test_burst_preserves_order_and_lookup() {
        let mut table = IdentityTable::new();
        let count = INLINE_CAPACITY * 3;
        for i in 0..count {
            let id = format!("person-{i}");
            let (index, added) = table.insert_if_absent(Cow::Owned(id), "people".into(), || i);
            assert!(added);
            assert_eq!(index, i);
            assert_eq!(table.is_burst(), i >= INLINE_CAPACITY);
        }
        for i in 0..count {
            assert_eq!(table.find(&format!("person-{i}"), "people"), Some(i));
        }
        assert_eq!(table.find("person-0", "robots"), None);
        let values: Vec<usize> = table.iter().map(|e| e.value).collect();
        assert_eq!(values, (0..count).collect::<Vec<_>>());

        let (index, added) = table.insert_if_absent("person-5".into(), "people".into(), || 0);
        assert_eq!((index, added), (5, false));
    }
}
