//! Resource objects: streaming read into raw bodies, write from host values

use std::fmt;

use serde::de::{self, DeserializeSeed, Deserializer, IgnoredAny, MapAccess, SeqAccess, Visitor};
use serde_json::{Map, Value};
use tracing::trace;

use super::context::{DecodeContext, next_string, reject_scalars};
use super::relationship::{PotentialValue, RawRelationship, RelationshipsSeed};
use super::Encoder;
use crate::descriptor::{MemberAccess, Resource, descriptor};
use crate::error::{FormatError, Result, Scope};
use crate::model::{Links, Meta};
use crate::options::{IgnoreCondition, NumberHandling};
use crate::validation::{MemberName, ResourceState};

/// A resource object as read, before it is bound to a host type
#[derive(Debug, Clone)]
pub(crate) struct RawResource {
    pub(crate) id: Option<String>,
    pub(crate) resource_type: String,
    pub(crate) attributes: Map<String, Value>,
    pub(crate) relationships: Vec<RawRelationship>,
    pub(crate) links: Option<Links>,
    pub(crate) meta: Option<Meta>,
}

/// Reads one resource object; `position` names the enclosing member in errors
pub(crate) struct ResourceSeed<'c, 'o> {
    pub(crate) ctx: &'c mut DecodeContext<'o>,
    pub(crate) position: &'static str,
}

impl ResourceSeed<'_, '_> {
    fn unexpected<E: de::Error>(self) -> E {
        self.ctx.fail(FormatError::UnexpectedShape {
            position: self.position.to_string(),
            expected: "a resource object",
        })
    }
}

impl<'de> DeserializeSeed<'de> for ResourceSeed<'_, '_> {
    type Value = RawResource;

    fn deserialize<D: Deserializer<'de>>(self, deserializer: D) -> Result<Self::Value, D::Error> {
        deserializer.deserialize_any(self)
    }
}

impl<'de> Visitor<'de> for ResourceSeed<'_, '_> {
    type Value = RawResource;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a resource object")
    }

    fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
        Err(self.ctx.fail(FormatError::NullResource {
            position: self.position.to_string(),
        }))
    }

    fn visit_seq<A: SeqAccess<'de>>(self, _seq: A) -> Result<Self::Value, A::Error> {
        Err(self.unexpected())
    }

    reject_scalars!();

    fn visit_map<A: MapAccess<'de>>(self, map: A) -> Result<Self::Value, A::Error> {
        read_resource(self.ctx, map)
    }
}

/// Read the members of a resource object whose opening brace was consumed
pub(crate) fn read_resource<'de, A: MapAccess<'de>>(
    ctx: &mut DecodeContext<'_>,
    mut map: A,
) -> Result<RawResource, A::Error> {
    let mut state = ResourceState::new();
    let mut id = None;
    let mut resource_type = None;
    let mut attributes = Map::new();
    let mut relationships = Vec::new();
    let mut links = None;
    let mut meta = None;

    while let Some(name) = map.next_key::<MemberName<'de>>()? {
        state
            .observe(name.as_str())
            .map_err(|err| ctx.fail::<A::Error>(err))?;
        match name.as_str() {
            "id" => id = Some(next_string(&mut map, ctx, Scope::Resource, "id")?),
            "type" => resource_type = Some(next_string(&mut map, ctx, Scope::Resource, "type")?),
            "attributes" => attributes = map.next_value_seed(AttributesSeed { ctx: &mut *ctx })?,
            "relationships" => {
                relationships = map.next_value_seed(RelationshipsSeed { ctx: &mut *ctx })?
            }
            "links" => links = map.next_value()?,
            "meta" => meta = map.next_value()?,
            other => {
                trace!(member = other, "Skipping unknown resource object member");
                map.next_value::<IgnoredAny>()?;
            }
        }
    }

    state.validate().map_err(|err| ctx.fail::<A::Error>(err))?;
    let resource_type = resource_type.unwrap_or_default();
    if resource_type.is_empty() {
        return Err(ctx.fail(FormatError::EmptyMember {
            scope: Scope::Resource,
            member: "type",
        }));
    }

    Ok(RawResource {
        id,
        resource_type,
        attributes,
        relationships,
        links,
        meta,
    })
}

/// Reads an `attributes` object, rejecting repeated names
pub(crate) struct AttributesSeed<'c, 'o> {
    pub(crate) ctx: &'c mut DecodeContext<'o>,
}

impl AttributesSeed<'_, '_> {
    fn unexpected<E: de::Error>(self) -> E {
        self.ctx.fail(FormatError::UnexpectedShape {
            position: "attributes".to_string(),
            expected: "an object",
        })
    }
}

impl<'de> DeserializeSeed<'de> for AttributesSeed<'_, '_> {
    type Value = Map<String, Value>;

    fn deserialize<D: Deserializer<'de>>(self, deserializer: D) -> Result<Self::Value, D::Error> {
        deserializer.deserialize_any(self)
    }
}

impl<'de> Visitor<'de> for AttributesSeed<'_, '_> {
    type Value = Map<String, Value>;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an attributes object")
    }

    fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(Map::new())
    }

    fn visit_seq<A: SeqAccess<'de>>(self, _seq: A) -> Result<Self::Value, A::Error> {
        Err(self.unexpected())
    }

    reject_scalars!();

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
        let mut attributes = Map::new();
        while let Some(name) = map.next_key::<String>()? {
            if attributes.contains_key(&name) {
                return Err(self.ctx.fail(FormatError::DuplicateMember {
                    scope: Scope::Attributes,
                    member: name,
                }));
            }
            let value: Value = map.next_value()?;
            attributes.insert(name, value);
        }
        Ok(attributes)
    }
}

impl<'a> Encoder<'a> {
    /// Write the full resource object for a host value
    pub(crate) fn write_resource<T: Resource>(&mut self, resource: &'a T) -> Result<Value> {
        let descriptor = descriptor::<T>(self.options.naming_policy)?;
        let key = descriptor.key_of(resource)?;

        let mut object = Map::new();
        if !key.id.is_empty() {
            object.insert("id".to_string(), Value::String(key.id.to_string()));
        }
        object.insert(
            "type".to_string(),
            Value::String(key.resource_type.to_string()),
        );

        let mut attributes = Map::new();
        let mut relationships = Map::new();
        for member in descriptor.members() {
            let condition = member.ignore().unwrap_or(self.options.ignore_condition);
            if condition == IgnoreCondition::Always || !member.can_read() {
                continue;
            }
            if self.options.ignore_read_only_members && !member.can_write() {
                continue;
            }

            match &member.access {
                MemberAccess::Attribute(access) => {
                    let Some(value) = access.get_value(resource) else {
                        continue;
                    };
                    let value = value.map_err(|err| FormatError::InvalidAttribute {
                        member: member.wire_name().to_string(),
                        message: err.to_string(),
                    })?;
                    if !condition.skips(&value) {
                        attributes.insert(member.wire_name().to_string(), self.number_out(value));
                    }
                }
                MemberAccess::Relationship(access) => {
                    let Some(linkage) = access.linkage(resource) else {
                        continue;
                    };
                    let written =
                        self.write_relationship(member.wire_name(), linkage, member.mode(), condition)?;
                    if let Some(relationship) = written {
                        relationships.insert(member.wire_name().to_string(), relationship);
                    }
                }
                MemberAccess::Potential(access) => {
                    let Some(get) = access.get else {
                        continue;
                    };
                    match self.write_potential(member.wire_name(), get(resource), member.mode())? {
                        PotentialValue::Relationship(relationship) => {
                            relationships.insert(member.wire_name().to_string(), relationship);
                        }
                        PotentialValue::Attribute(value) if !condition.skips(value) => {
                            attributes
                                .insert(member.wire_name().to_string(), self.number_out(value.clone()));
                        }
                        PotentialValue::Attribute(_) => {}
                    }
                }
            }
        }

        if !attributes.is_empty() {
            object.insert("attributes".to_string(), Value::Object(attributes));
        }
        if !relationships.is_empty() {
            object.insert("relationships".to_string(), Value::Object(relationships));
        }
        if let Some(links) = descriptor.links_of(resource) {
            object.insert("links".to_string(), serde_json::to_value(links)?);
        }
        if let Some(meta) = descriptor.meta_of(resource) {
            object.insert("meta".to_string(), Value::Object(meta.clone()));
        }
        Ok(Value::Object(object))
    }

    /// Write a resource-shaped JSON object; members other than `id`, `type`,
    /// `links` and `meta` become attributes
    pub(crate) fn write_anonymous(&self, source: &'a Map<String, Value>) -> Value {
        let mut object = Map::new();
        for member in ["id", "type"] {
            if let Some(value) = source.get(member) {
                object.insert(member.to_string(), value.clone());
            }
        }
        let attributes: Map<String, Value> = source
            .iter()
            .filter(|(name, _)| !matches!(name.as_str(), "id" | "type" | "links" | "meta"))
            .map(|(name, value)| (name.clone(), self.number_out(value.clone())))
            .collect();
        if !attributes.is_empty() {
            object.insert("attributes".to_string(), Value::Object(attributes));
        }
        for member in ["links", "meta"] {
            if let Some(value) = source.get(member) {
                object.insert(member.to_string(), value.clone());
            }
        }
        Value::Object(object)
    }

    fn number_out(&self, value: Value) -> Value {
        match value {
            Value::Number(number) if self.options.number_handling == NumberHandling::WriteAsString => {
                Value::String(number.to_string())
            }
            other => other,
        }
    }
}
