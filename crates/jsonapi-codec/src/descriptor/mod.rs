//! # Type Descriptors
//!
//! A [`TypeDescriptor`] is the immutable, per-type table the codec consults
//! for every resource it reads or writes: the designated `id`/`type`/`meta`/
//! `links` members, the ordered attribute and relationship members with their
//! wire names and accessors, and the constructor used on read.
//!
//! Descriptors are registered through [`Resource::describe`], usually
//! generated by `#[derive(JsonApiResource)]`, and memoized process-wide by
//! [`descriptor`] keyed on the type and the active naming policy.
//!
//! Accessors are plain function pointers captured once per member, so reading
//! or writing a member is a direct call with no lookup beyond the member table.

mod access;
mod builder;
mod cache;

pub use builder::{DescriptorBuilder, MemberOptions};
pub use cache::{descriptor, descriptor_for_options};

pub(crate) use access::{AttributeAccess, Linkage, MemberAccess};

use std::collections::HashMap;

use crate::error::{FormatError, Scope};
use crate::model::{Links, Meta};
use crate::options::IgnoreCondition;
use crate::tracker::ResourceKey;

/// A host type that maps to JSON:API resource objects.
///
/// Implementations register the type's members with the builder. Prefer
/// `#[derive(JsonApiResource)]`; a hand-written implementation looks like:
///
/// ```rust
/// use jsonapi_codec::{DescriptorBuilder, IdValue, Resource};
///
/// #[derive(Default)]
/// struct Tag {
///     id: String,
///     label: String,
/// }
///
/// impl Resource for Tag {
///     fn describe(builder: &mut DescriptorBuilder<Self>) {
///         builder
///             .resource_type("tags")
///             .constructor(Tag::default)
///             .id(|t| t.id.as_id(), |t, id| t.id = id);
///         builder.attribute("label", |t| &t.label, |t, v| t.label = v);
///     }
/// }
/// ```
pub trait Resource: Sized + 'static {
    fn describe(builder: &mut DescriptorBuilder<Self>);
}

/// String-like members usable as a resource `id`
pub trait IdValue {
    fn as_id(&self) -> Option<&str>;
    fn from_id(id: String) -> Self;
}

impl IdValue for String {
    fn as_id(&self) -> Option<&str> {
        Some(self.as_str())
    }

    fn from_id(id: String) -> Self {
        id
    }
}

impl IdValue for Option<String> {
    fn as_id(&self) -> Option<&str> {
        self.as_deref()
    }

    fn from_id(id: String) -> Self {
        Some(id)
    }
}

/// Classification of a non-designated member
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberKind {
    /// Written under `attributes`
    Attribute,
    /// Statically typed relationship, written under `relationships`
    Relationship,
    /// Dynamically typed member: a relationship when its runtime value is
    /// resource-shaped, an attribute otherwise
    Potential,
}

/// How a relationship member is written
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RelationshipMode {
    /// Resource identifiers at the relationship site, full objects in `included`
    #[default]
    Included,
    /// Resource identifiers only; targets are never added to `included`
    IdentifierOnly,
}

pub(crate) enum ResourceTypeSource<T> {
    Fixed(&'static str),
    Member {
        get: fn(&T) -> &str,
        set: fn(&mut T, String),
    },
}

pub(crate) struct IdMember<T> {
    pub(crate) get: fn(&T) -> Option<&str>,
    pub(crate) set: fn(&mut T, String),
}

pub(crate) struct ValueMember<T, V> {
    pub(crate) get: fn(&T) -> Option<&V>,
    pub(crate) set: fn(&mut T, V),
}

/// One attribute, relationship, or potential relationship member
pub struct MemberDescriptor<T> {
    pub(crate) name: &'static str,
    pub(crate) wire_name: String,
    pub(crate) ignore: Option<IgnoreCondition>,
    pub(crate) mode: RelationshipMode,
    pub(crate) access: MemberAccess<T>,
}

impl<T> MemberDescriptor<T> {
    /// The Rust member name
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The encoded name used on the wire
    pub fn wire_name(&self) -> &str {
        &self.wire_name
    }

    pub fn kind(&self) -> MemberKind {
        match self.access {
            MemberAccess::Attribute(_) => MemberKind::Attribute,
            MemberAccess::Relationship(_) => MemberKind::Relationship,
            MemberAccess::Potential(_) => MemberKind::Potential,
        }
    }

    /// The member has a getter and can be written to a document
    pub fn can_read(&self) -> bool {
        match &self.access {
            MemberAccess::Attribute(access) => access.can_read(),
            MemberAccess::Relationship(access) => access.can_read(),
            MemberAccess::Potential(access) => access.get.is_some(),
        }
    }

    /// The member has a setter and can be populated from a document
    pub fn can_write(&self) -> bool {
        match &self.access {
            MemberAccess::Attribute(access) => access.can_write(),
            MemberAccess::Relationship(access) => access.can_write(),
            MemberAccess::Potential(access) => access.set.is_some(),
        }
    }

    /// Member-level ignore condition overriding the options default
    pub fn ignore(&self) -> Option<IgnoreCondition> {
        self.ignore
    }

    pub fn mode(&self) -> RelationshipMode {
        self.mode
    }
}

/// Immutable per-type member table
pub struct TypeDescriptor<T> {
    pub(crate) rust_type: &'static str,
    pub(crate) resource_type: ResourceTypeSource<T>,
    pub(crate) id: Option<IdMember<T>>,
    pub(crate) meta: Option<ValueMember<T, Meta>>,
    pub(crate) links: Option<ValueMember<T, Links>>,
    pub(crate) members: Vec<MemberDescriptor<T>>,
    pub(crate) exact: HashMap<String, usize>,
    pub(crate) folded: HashMap<String, usize>,
    pub(crate) constructor: fn() -> T,
}

impl<T> TypeDescriptor<T> {
    pub fn rust_type(&self) -> &'static str {
        self.rust_type
    }

    /// The resource type name when it is fixed for the Rust type
    pub fn fixed_resource_type(&self) -> Option<&'static str> {
        match self.resource_type {
            ResourceTypeSource::Fixed(name) => Some(name),
            ResourceTypeSource::Member { .. } => None,
        }
    }

    /// Attribute, relationship and potential members in declaration order
    pub fn members(&self) -> &[MemberDescriptor<T>] {
        &self.members
    }

    pub fn has_id(&self) -> bool {
        self.id.is_some()
    }

    /// Find a member by wire name
    pub fn member(&self, wire_name: &str, case_insensitive: bool) -> Option<&MemberDescriptor<T>> {
        let index = match self.exact.get(wire_name) {
            Some(index) => Some(*index),
            None if case_insensitive => self.folded.get(&wire_name.to_lowercase()).copied(),
            None => None,
        };
        index.map(|i| &self.members[i])
    }

    pub fn attribute_count(&self) -> usize {
        self.members
            .iter()
            .filter(|m| m.kind() == MemberKind::Attribute)
            .count()
    }

    pub fn relationship_count(&self) -> usize {
        self.members
            .iter()
            .filter(|m| m.kind() == MemberKind::Relationship)
            .count()
    }

    /// Create an empty instance with the registered constructor
    pub fn construct(&self) -> T {
        (self.constructor)()
    }

    pub fn id_of<'a>(&self, object: &'a T) -> Option<&'a str> {
        self.id.as_ref().and_then(|id| (id.get)(object))
    }

    pub fn type_of<'a>(&self, object: &'a T) -> &'a str {
        match &self.resource_type {
            ResourceTypeSource::Fixed(name) => name,
            ResourceTypeSource::Member { get, .. } => get(object),
        }
    }

    pub(crate) fn meta_of<'a>(&self, object: &'a T) -> Option<&'a Meta> {
        self.meta.as_ref().and_then(|meta| (meta.get)(object))
    }

    pub(crate) fn links_of<'a>(&self, object: &'a T) -> Option<&'a Links> {
        self.links.as_ref().and_then(|links| (links.get)(object))
    }

    pub(crate) fn assign_id(&self, object: &mut T, id: String) {
        if let Some(member) = &self.id {
            (member.set)(object, id);
        }
    }

    pub(crate) fn assign_type(&self, object: &mut T, resource_type: &str) {
        if let ResourceTypeSource::Member { set, .. } = &self.resource_type {
            set(object, resource_type.to_string());
        }
    }

    pub(crate) fn assign_meta(&self, object: &mut T, meta: Meta) {
        if let Some(member) = &self.meta {
            (member.set)(object, meta);
        }
    }

    pub(crate) fn assign_links(&self, object: &mut T, links: Links) {
        if let Some(member) = &self.links {
            (member.set)(object, links);
        }
    }

    /// Identity of an instance for the included-resource tracker
    pub(crate) fn key_of<'a>(&self, object: &'a T) -> Result<ResourceKey<'a>, FormatError> {
        let resource_type = self.type_of(object);
        if resource_type.is_empty() {
            return Err(FormatError::EmptyMember {
                scope: Scope::Resource,
                member: "type",
            });
        }
        Ok(ResourceKey {
            id: self.id_of(object).unwrap_or(""),
            resource_type,
        })
    }

    /// Reject a wire type that cannot populate this Rust type
    pub(crate) fn check_type(&self, resource_type: &str) -> Result<(), FormatError> {
        match self.fixed_resource_type() {
            Some(expected) if expected != resource_type => Err(FormatError::TypeMismatch {
                expected: expected.to_string(),
                found: resource_type.to_string(),
            }),
            _ => Ok(()),
        }
    }
}

impl<T> std::fmt::Debug for TypeDescriptor<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let members: Vec<(&str, MemberKind)> = self
            .members
            .iter()
            .map(|m| (m.wire_name.as_str(), m.kind()))
            .collect();
        f.debug_struct("TypeDescriptor")
            .field("rust_type", &self.rust_type)
            .field("resource_type", &self.fixed_resource_type())
            .field("members", &members)
            .finish()
    }
}
