use std::collections::HashMap;
use std::marker::PhantomData;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::access::{MemberAccess, PotentialAccess, TypedAttribute, TypedRelationship};
use super::{
    IdMember, MemberDescriptor, RelationshipMode, Resource, ResourceTypeSource, TypeDescriptor,
    ValueMember,
};
use crate::codec::RelationshipValue;
use crate::error::ShapeError;
use crate::model::{Links, Meta};
use crate::options::{IgnoreCondition, NamingPolicy};

const RESERVED_NAMES: [&str; 2] = ["id", "type"];

struct PendingMember<T> {
    name: &'static str,
    rename: Option<&'static str>,
    ignore: Option<IgnoreCondition>,
    mode: RelationshipMode,
    access: MemberAccess<T>,
}

/// Collects a type's member registrations for [`Resource::describe`]
pub struct DescriptorBuilder<T> {
    rust_type: &'static str,
    resource_type: Option<&'static str>,
    type_member: Option<(fn(&T) -> &str, fn(&mut T, String))>,
    id: Option<IdMember<T>>,
    meta: Option<ValueMember<T, Meta>>,
    links: Option<ValueMember<T, Links>>,
    constructors: Vec<fn() -> T>,
    members: Vec<PendingMember<T>>,
    duplicate_role: Option<&'static str>,
}

/// Per-member settings returned by the builder's member methods
pub struct MemberOptions<'b, T> {
    member: &'b mut PendingMember<T>,
}

impl<T> MemberOptions<'_, T> {
    /// Use `name` on the wire verbatim instead of the naming policy output
    pub fn rename(self, name: &'static str) -> Self {
        self.member.rename = Some(name);
        self
    }

    pub fn ignore(self, condition: IgnoreCondition) -> Self {
        self.member.ignore = Some(condition);
        self
    }

    /// Write only resource identifiers for this relationship
    pub fn identifier_only(self) -> Self {
        self.member.mode = RelationshipMode::IdentifierOnly;
        self
    }
}

impl<T: Resource> DescriptorBuilder<T> {
    pub(crate) fn new() -> Self {
        Self {
            rust_type: std::any::type_name::<T>(),
            resource_type: None,
            type_member: None,
            id: None,
            meta: None,
            links: None,
            constructors: Vec::new(),
            members: Vec::new(),
            duplicate_role: None,
        }
    }

    fn role_taken(&mut self, taken: bool, role: &'static str) {
        if taken && self.duplicate_role.is_none() {
            self.duplicate_role = Some(role);
        }
    }

    /// Fixed resource type name for every instance
    pub fn resource_type(&mut self, name: &'static str) -> &mut Self {
        let taken = self.resource_type.is_some();
        self.role_taken(taken, "type");
        self.resource_type = Some(name);
        self
    }

    /// Per-instance resource type name
    pub fn type_member(&mut self, get: fn(&T) -> &str, set: fn(&mut T, String)) -> &mut Self {
        let taken = self.type_member.is_some();
        self.role_taken(taken, "type");
        self.type_member = Some((get, set));
        self
    }

    pub fn id(&mut self, get: fn(&T) -> Option<&str>, set: fn(&mut T, String)) -> &mut Self {
        let taken = self.id.is_some();
        self.role_taken(taken, "id");
        self.id = Some(IdMember { get, set });
        self
    }

    pub fn meta(&mut self, get: fn(&T) -> Option<&Meta>, set: fn(&mut T, Meta)) -> &mut Self {
        let taken = self.meta.is_some();
        self.role_taken(taken, "meta");
        self.meta = Some(ValueMember { get, set });
        self
    }

    pub fn links(&mut self, get: fn(&T) -> Option<&Links>, set: fn(&mut T, Links)) -> &mut Self {
        let taken = self.links.is_some();
        self.role_taken(taken, "links");
        self.links = Some(ValueMember { get, set });
        self
    }

    /// Constructor used to create empty instances on read
    pub fn constructor(&mut self, constructor: fn() -> T) -> &mut Self {
        self.constructors.push(constructor);
        self
    }

    fn push(&mut self, name: &'static str, access: MemberAccess<T>) -> MemberOptions<'_, T> {
        self.members.push(PendingMember {
            name,
            rename: None,
            ignore: None,
            mode: RelationshipMode::default(),
            access,
        });
        let index = self.members.len() - 1;
        MemberOptions {
            member: &mut self.members[index],
        }
    }

    pub fn attribute<V>(
        &mut self,
        name: &'static str,
        get: fn(&T) -> &V,
        set: fn(&mut T, V),
    ) -> MemberOptions<'_, T>
    where
        V: Serialize + DeserializeOwned + 'static,
    {
        let access = TypedAttribute {
            get: Some(get),
            set: Some(set),
        };
        self.push(name, MemberAccess::Attribute(Box::new(access)))
    }

    /// Attribute that is written but never populated on read
    pub fn read_only_attribute<V>(&mut self, name: &'static str, get: fn(&T) -> &V) -> MemberOptions<'_, T>
    where
        V: Serialize + DeserializeOwned + 'static,
    {
        let access = TypedAttribute {
            get: Some(get),
            set: None::<fn(&mut T, V)>,
        };
        self.push(name, MemberAccess::Attribute(Box::new(access)))
    }

    /// Attribute that is populated on read but never written
    pub fn write_only_attribute<V>(&mut self, name: &'static str, set: fn(&mut T, V)) -> MemberOptions<'_, T>
    where
        V: Serialize + DeserializeOwned + 'static,
    {
        let access = TypedAttribute {
            get: None::<fn(&T) -> &V>,
            set: Some(set),
        };
        self.push(name, MemberAccess::Attribute(Box::new(access)))
    }

    pub fn relationship<V>(
        &mut self,
        name: &'static str,
        get: fn(&T) -> &V,
        set: fn(&mut T, V),
    ) -> MemberOptions<'_, T>
    where
        V: RelationshipValue,
    {
        let access = TypedRelationship {
            get: Some(get),
            set: Some(set),
            marker: PhantomData,
        };
        self.push(name, MemberAccess::Relationship(Box::new(access)))
    }

    /// Relationship that is written but never populated on read
    pub fn read_only_relationship<V>(&mut self, name: &'static str, get: fn(&T) -> &V) -> MemberOptions<'_, T>
    where
        V: RelationshipValue,
    {
        let access = TypedRelationship {
            get: Some(get),
            set: None::<fn(&mut T, V)>,
            marker: PhantomData,
        };
        self.push(name, MemberAccess::Relationship(Box::new(access)))
    }

    /// Dynamically typed member, classified by its runtime value
    pub fn potential(
        &mut self,
        name: &'static str,
        get: fn(&T) -> &Value,
        set: fn(&mut T, Value),
    ) -> MemberOptions<'_, T> {
        let access = PotentialAccess {
            get: Some(get),
            set: Some(set),
        };
        self.push(name, MemberAccess::Potential(access))
    }

    pub(crate) fn build(self, policy: NamingPolicy) -> Result<TypeDescriptor<T>, ShapeError> {
        let rust_type = self.rust_type;

        if let Some(role) = self.duplicate_role {
            return Err(ShapeError::DuplicateRole { rust_type, role });
        }

        let constructor = match self.constructors.as_slice() {
            [] => return Err(ShapeError::MissingConstructor { rust_type }),
            [constructor] => *constructor,
            _ => return Err(ShapeError::AmbiguousConstructor { rust_type }),
        };

        let resource_type = match (self.resource_type, self.type_member) {
            (Some(name), None) => ResourceTypeSource::Fixed(name),
            (None, Some((get, set))) => ResourceTypeSource::Member { get, set },
            (None, None) => return Err(ShapeError::MissingResourceType { rust_type }),
            (Some(_), Some(_)) => return Err(ShapeError::ConflictingResourceType { rust_type }),
        };

        let mut members = Vec::with_capacity(self.members.len());
        let mut exact = HashMap::with_capacity(self.members.len());
        let mut folded = HashMap::with_capacity(self.members.len());

        for (index, pending) in self.members.into_iter().enumerate() {
            let wire_name = match pending.rename {
                Some(name) => name.to_string(),
                None => policy.apply(pending.name),
            };
            if RESERVED_NAMES.contains(&wire_name.as_str()) {
                return Err(ShapeError::ReservedName {
                    rust_type,
                    wire_name,
                });
            }
            if exact.insert(wire_name.clone(), index).is_some() {
                return Err(ShapeError::DuplicateWireName {
                    rust_type,
                    wire_name,
                });
            }
            folded.entry(wire_name.to_lowercase()).or_insert(index);
            members.push(MemberDescriptor {
                name: pending.name,
                wire_name,
                ignore: pending.ignore,
                mode: pending.mode,
                access: pending.access,
            });
        }

        Ok(TypeDescriptor {
            rust_type,
            resource_type,
            id: self.id,
            meta: self.meta,
            links: self.links,
            members,
            exact,
            folded,
            constructor,
        })
    }
}
