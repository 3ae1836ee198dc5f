use std::borrow::Cow;

use tracing::trace;

use super::identity::IdentityTable;
use crate::codec::RawResource;
use crate::error::{FormatError, Scope};
use crate::model::ResourceIdentifier;

/// Where a resource body was read from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum EntrySource {
    Primary,
    Included,
    /// A full resource object written inline at a relationship site
    Embedded,
}

#[derive(Debug, Default)]
pub(crate) struct DecodeEntry {
    /// Index into the tracker's bodies; `None` while only referenced
    pub(crate) body: Option<usize>,
    /// Relationship that first referenced the resource
    pub(crate) origin: Option<String>,
    pub(crate) source: Option<EntrySource>,
}

/// Resource bodies and identity bookkeeping for one read.
///
/// Relationship identifiers may reference resources that appear later in the
/// document. A reference registers a placeholder; the body fills it in when it
/// arrives. Typed values are only built once the whole document is parsed.
pub(crate) struct DecodeTracker {
    table: IdentityTable<'static, DecodeEntry>,
    bodies: Vec<RawResource>,
}

impl DecodeTracker {
    pub(crate) fn new() -> Self {
        Self {
            table: IdentityTable::new(),
            bodies: Vec::new(),
        }
    }

    /// Register a placeholder for a referenced resource
    pub(crate) fn reference(&mut self, identifier: &ResourceIdentifier, origin: &str) {
        let table = &mut self.table;
        if table.find(&identifier.id, &identifier.resource_type).is_some() {
            return;
        }
        table.insert_if_absent(
            Cow::Owned(identifier.id.clone()),
            Cow::Owned(identifier.resource_type.clone()),
            || DecodeEntry {
                body: None,
                origin: Some(origin.to_string()),
                source: None,
            },
        );
    }

    pub(crate) fn register_primary(&mut self, raw: RawResource) -> Result<usize, FormatError> {
        self.register(raw, EntrySource::Primary)
    }

    pub(crate) fn register_included(&mut self, raw: RawResource) -> Result<usize, FormatError> {
        if raw.id.is_none() {
            return Err(FormatError::MissingId {
                scope: Scope::Resource,
            });
        }
        self.register(raw, EntrySource::Included)
    }

    /// Keep an inline body unless the resource already has one
    pub(crate) fn register_embedded(&mut self, raw: RawResource) {
        if let Some(id) = &raw.id
            && self.find_body(id, &raw.resource_type).is_some()
        {
            return;
        }
        // Cannot collide: a resource with a body returned above
        let _ = self.register(raw, EntrySource::Embedded);
    }

    fn register(&mut self, raw: RawResource, source: EntrySource) -> Result<usize, FormatError> {
        let body = self.bodies.len();
        let Some(id) = raw.id.clone() else {
            self.bodies.push(raw);
            return Ok(body);
        };

        let resource_type = raw.resource_type.clone();
        let table = &mut self.table;
        let (index, _) = table.insert_if_absent(
            Cow::Owned(id),
            Cow::Owned(resource_type),
            DecodeEntry::default,
        );
        if let Some(entry) = table.get_mut(index) {
            // An inline body only stands in until the resource's own object arrives
            let replaces_embedded =
                entry.value.source == Some(EntrySource::Embedded) && source != EntrySource::Embedded;
            if entry.value.body.is_some() && !replaces_embedded {
                return Err(FormatError::DuplicateResource {
                    resource_type: entry.resource_type.to_string(),
                    id: entry.id.to_string(),
                });
            }
            if let Some(origin) = &entry.value.origin {
                trace!(
                    relationship = %origin,
                    resource_type = %entry.resource_type,
                    id = %entry.id,
                    "Resolved forward reference"
                );
            }
            entry.value.body = Some(body);
            entry.value.source = Some(source);
        }
        self.bodies.push(raw);
        Ok(body)
    }

    pub(crate) fn body(&self, index: usize) -> &RawResource {
        &self.bodies[index]
    }

    /// Body index for a resource read anywhere in the document
    pub(crate) fn find_body(&self, id: &str, resource_type: &str) -> Option<usize> {
        self.try_get_included(id, resource_type)?.body
    }

    pub(crate) fn try_get_included(&self, id: &str, resource_type: &str) -> Option<&DecodeEntry> {
        let index = self.table.find(id, resource_type)?;
        self.table.get(index).map(|entry| &entry.value)
    }

    /// Referenced resources whose body never appeared
    pub(crate) fn unresolved(&self) -> usize {
        self.table
            .iter()
            .filter(|entry| entry.value.body.is_none())
            .count()
    }

    pub(crate) fn body_count(&self) -> usize {
        self.bodies.len()
    }
}
