use std::borrow::Cow;

use serde_json::{Map, Value};

use super::ErasedResource;
use super::identity::{IdentityTable, ResourceKey};

/// A resource waiting to be written into `included`
#[derive(Clone, Copy)]
pub(crate) enum Pending<'a> {
    /// A host resource with a type descriptor
    Typed(&'a dyn ErasedResource),
    /// A resource-shaped JSON object from a dynamically typed member
    Anonymous(&'a Map<String, Value>),
    /// Written as primary data, never as part of `included`
    Primary,
}

pub(crate) struct EncodeEntry<'a> {
    pending: Pending<'a>,
    emitted: bool,
}

/// Included-resource bookkeeping for one write.
///
/// Entries are appended in discovery order. Writing an entry can discover
/// more entries, so callers walk the tracker by index until [`take`] runs out
/// rather than iterating a snapshot.
///
/// [`take`]: EncodeTracker::take
pub(crate) struct EncodeTracker<'a> {
    table: IdentityTable<'a, EncodeEntry<'a>>,
}

impl<'a> EncodeTracker<'a> {
    pub(crate) fn new() -> Self {
        Self {
            table: IdentityTable::new(),
        }
    }

    /// Register a resource for `included`; returns `false` when already known
    pub(crate) fn set_included(&mut self, key: ResourceKey<'a>, pending: Pending<'a>) -> bool {
        let (_, added) = self.table.insert_if_absent(
            Cow::Borrowed(key.id),
            Cow::Borrowed(key.resource_type),
            || EncodeEntry {
                pending,
                emitted: false,
            },
        );
        added
    }

    /// Record a primary data resource so it is never repeated in `included`
    pub(crate) fn mark_emitted(&mut self, key: ResourceKey<'a>) {
        let (index, _) = self.table.insert_if_absent(
            Cow::Borrowed(key.id),
            Cow::Borrowed(key.resource_type),
            || EncodeEntry {
                pending: Pending::Primary,
                emitted: true,
            },
        );
        if let Some(entry) = self.table.get_mut(index) {
            entry.value.emitted = true;
        }
    }

    /// Whether the resource is known, and if so whether it has been written
    #[cfg(test)]
    pub(crate) fn try_get_included(&self, key: ResourceKey<'_>) -> Option<bool> {
        let index = self.table.find(key.id, key.resource_type)?;
        self.table.get(index).map(|entry| entry.value.emitted)
    }

    /// The entry at `index` in discovery order, with its emitted flag
    #[cfg(test)]
    pub(crate) fn get(&self, index: usize) -> Option<(Pending<'a>, bool)> {
        self.table
            .get(index)
            .map(|entry| (entry.value.pending, entry.value.emitted))
    }

    /// Claim the entry at `index` for writing.
    ///
    /// `None` past the end, `Some(None)` when the entry was already written.
    pub(crate) fn take(&mut self, index: usize) -> Option<Option<Pending<'a>>> {
        let entry = self.table.get_mut(index)?;
        if entry.value.emitted {
            return Some(None);
        }
        entry.value.emitted = true;
        Some(Some(entry.value.pending))
    }

    pub(crate) fn len(&self) -> usize {
        self.table.len()
    }
}
