//! Relationship objects and resource linkage

use std::fmt;

use serde::de::{self, DeserializeSeed, Deserializer, IgnoredAny, MapAccess, SeqAccess, Visitor};
use serde_json::{Map, Value};
use tracing::trace;

use super::context::{DecodeContext, next_string, reject_scalars};
use super::resource::{AttributesSeed, RawResource};
use super::{Encoder, WireData};
use crate::descriptor::{Linkage, RelationshipMode};
use crate::error::{FormatError, Result, Scope};
use crate::model::{Links, Meta, ResourceIdentifier};
use crate::options::IgnoreCondition;
use crate::tracker::{ErasedResource, Pending, ResourceKey};
use crate::validation::{IdentifierState, MemberName, RelationshipState};

/// A relationship object as read; linkage is resolved after the whole
/// document is parsed
#[derive(Debug, Clone)]
pub(crate) struct RawRelationship {
    pub(crate) name: String,
    /// `None` when the `data` member is absent
    pub(crate) data: Option<WireData<ResourceIdentifier>>,
    pub(crate) links: Option<Links>,
    pub(crate) meta: Option<Meta>,
}

/// Reads a `relationships` object, rejecting repeated names
pub(crate) struct RelationshipsSeed<'c, 'o> {
    pub(crate) ctx: &'c mut DecodeContext<'o>,
}

impl RelationshipsSeed<'_, '_> {
    fn unexpected<E: de::Error>(self) -> E {
        self.ctx.fail(FormatError::UnexpectedShape {
            position: "relationships".to_string(),
            expected: "an object",
        })
    }
}

impl<'de> DeserializeSeed<'de> for RelationshipsSeed<'_, '_> {
    type Value = Vec<RawRelationship>;

    fn deserialize<D: Deserializer<'de>>(self, deserializer: D) -> Result<Self::Value, D::Error> {
        deserializer.deserialize_any(self)
    }
}

impl<'de> Visitor<'de> for RelationshipsSeed<'_, '_> {
    type Value = Vec<RawRelationship>;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a relationships object")
    }

    fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(Vec::new())
    }

    fn visit_seq<A: SeqAccess<'de>>(self, _seq: A) -> Result<Self::Value, A::Error> {
        Err(self.unexpected())
    }

    reject_scalars!();

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
        let ctx = self.ctx;
        let mut relationships: Vec<RawRelationship> = Vec::new();
        while let Some(name) = map.next_key::<String>()? {
            if relationships.iter().any(|existing| existing.name == name) {
                return Err(ctx.fail(FormatError::DuplicateMember {
                    scope: Scope::Relationships,
                    member: name,
                }));
            }
            let relationship = map.next_value_seed(RelationshipSeed {
                ctx: &mut *ctx,
                name,
            })?;
            relationships.push(relationship);
        }
        Ok(relationships)
    }
}

struct RelationshipSeed<'c, 'o> {
    ctx: &'c mut DecodeContext<'o>,
    name: String,
}

impl RelationshipSeed<'_, '_> {
    fn unexpected<E: de::Error>(self) -> E {
        self.ctx.fail(FormatError::UnexpectedShape {
            position: format!("relationships.{}", self.name),
            expected: "a relationship object",
        })
    }
}

impl<'de> DeserializeSeed<'de> for RelationshipSeed<'_, '_> {
    type Value = RawRelationship;

    fn deserialize<D: Deserializer<'de>>(self, deserializer: D) -> Result<Self::Value, D::Error> {
        deserializer.deserialize_any(self)
    }
}

impl<'de> Visitor<'de> for RelationshipSeed<'_, '_> {
    type Value = RawRelationship;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a relationship object")
    }

    fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
        Err(self.unexpected())
    }

    fn visit_seq<A: SeqAccess<'de>>(self, _seq: A) -> Result<Self::Value, A::Error> {
        Err(self.unexpected())
    }

    reject_scalars!();

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
        let RelationshipSeed { ctx, name } = self;
        let mut state = RelationshipState::new();
        let mut data = None;
        let mut links = None;
        let mut meta = None;

        while let Some(member) = map.next_key::<MemberName<'de>>()? {
            state
                .observe(member.as_str())
                .map_err(|err| ctx.fail::<A::Error>(err))?;
            match member.as_str() {
                "data" => {
                    data = Some(map.next_value_seed(LinkageSeed {
                        ctx: &mut *ctx,
                        relationship: &name,
                    })?)
                }
                "links" => links = map.next_value()?,
                "meta" => meta = map.next_value()?,
                other => {
                    trace!(relationship = %name, member = other, "Skipping unknown relationship member");
                    map.next_value::<IgnoredAny>()?;
                }
            }
        }
        state
            .validate(&name)
            .map_err(|err| ctx.fail::<A::Error>(err))?;

        if let Some(data) = &data {
            for identifier in data.iter() {
                ctx.tracker.reference(identifier, &name);
            }
        }
        Ok(RawRelationship {
            name,
            data,
            links,
            meta,
        })
    }
}

/// Reads a relationship's `data` member
struct LinkageSeed<'c, 'o, 'n> {
    ctx: &'c mut DecodeContext<'o>,
    relationship: &'n str,
}

impl LinkageSeed<'_, '_, '_> {
    fn unexpected<E: de::Error>(self) -> E {
        self.ctx.fail(FormatError::UnexpectedShape {
            position: format!("relationships.{}.data", self.relationship),
            expected: "a resource identifier, an array of resource identifiers or null",
        })
    }
}

impl<'de> DeserializeSeed<'de> for LinkageSeed<'_, '_, '_> {
    type Value = WireData<ResourceIdentifier>;

    fn deserialize<D: Deserializer<'de>>(self, deserializer: D) -> Result<Self::Value, D::Error> {
        deserializer.deserialize_any(self)
    }
}

impl<'de> Visitor<'de> for LinkageSeed<'_, '_, '_> {
    type Value = WireData<ResourceIdentifier>;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("resource linkage")
    }

    fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(WireData::Null)
    }

    fn visit_map<A: MapAccess<'de>>(self, map: A) -> Result<Self::Value, A::Error> {
        read_identifier(self.ctx, map).map(WireData::Single)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
        let mut identifiers = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(identifier) = seq.next_element_seed(IdentifierSeed {
            ctx: &mut *self.ctx,
            relationship: self.relationship,
        })? {
            identifiers.push(identifier);
        }
        Ok(WireData::Array(identifiers))
    }

    reject_scalars!();
}

/// Reads one element of a to-many linkage array
struct IdentifierSeed<'c, 'o, 'n> {
    ctx: &'c mut DecodeContext<'o>,
    relationship: &'n str,
}

impl IdentifierSeed<'_, '_, '_> {
    fn unexpected<E: de::Error>(self) -> E {
        self.ctx.fail(FormatError::UnexpectedShape {
            position: format!("relationships.{}.data", self.relationship),
            expected: "an array of resource identifiers",
        })
    }
}

impl<'de> DeserializeSeed<'de> for IdentifierSeed<'_, '_, '_> {
    type Value = ResourceIdentifier;

    fn deserialize<D: Deserializer<'de>>(self, deserializer: D) -> Result<Self::Value, D::Error> {
        deserializer.deserialize_any(self)
    }
}

impl<'de> Visitor<'de> for IdentifierSeed<'_, '_, '_> {
    type Value = ResourceIdentifier;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a resource identifier object")
    }

    fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
        Err(self.ctx.fail(FormatError::NullResource {
            position: format!("relationships.{}.data", self.relationship),
        }))
    }

    fn visit_map<A: MapAccess<'de>>(self, map: A) -> Result<Self::Value, A::Error> {
        read_identifier(self.ctx, map)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, _seq: A) -> Result<Self::Value, A::Error> {
        Err(self.unexpected())
    }

    reject_scalars!();
}

/// Read a resource identifier object. A fully embedded resource (one carrying
/// `attributes` or `relationships`) also registers its body with the tracker.
fn read_identifier<'de, A: MapAccess<'de>>(
    ctx: &mut DecodeContext<'_>,
    mut map: A,
) -> Result<ResourceIdentifier, A::Error> {
    let mut state = IdentifierState::new();
    let mut id = None;
    let mut resource_type = None;
    let mut meta: Option<Meta> = None;
    let mut attributes = None;
    let mut relationships = None;
    let mut links = None;

    while let Some(name) = map.next_key::<MemberName<'de>>()? {
        state
            .observe(name.as_str())
            .map_err(|err| ctx.fail::<A::Error>(err))?;
        match name.as_str() {
            "id" => id = Some(next_string(&mut map, ctx, Scope::Identifier, "id")?),
            "type" => resource_type = Some(next_string(&mut map, ctx, Scope::Identifier, "type")?),
            "meta" => meta = map.next_value()?,
            "attributes" => attributes = Some(map.next_value_seed(AttributesSeed { ctx: &mut *ctx })?),
            "relationships" => {
                relationships = Some(map.next_value_seed(RelationshipsSeed { ctx: &mut *ctx })?)
            }
            "links" => links = map.next_value()?,
            other => {
                trace!(member = other, "Skipping unknown resource identifier member");
                map.next_value::<IgnoredAny>()?;
            }
        }
    }

    state.validate().map_err(|err| ctx.fail::<A::Error>(err))?;
    let (id, resource_type) = (id.unwrap_or_default(), resource_type.unwrap_or_default());
    for (member, value) in [("id", &id), ("type", &resource_type)] {
        if value.is_empty() {
            return Err(ctx.fail(FormatError::EmptyMember {
                scope: Scope::Identifier,
                member,
            }));
        }
    }

    if attributes.is_some() || relationships.is_some() {
        ctx.tracker.register_embedded(RawResource {
            id: Some(id.clone()),
            resource_type: resource_type.clone(),
            attributes: attributes.unwrap_or_default(),
            relationships: relationships.unwrap_or_default(),
            links,
            meta: meta.clone(),
        });
    }

    Ok(ResourceIdentifier {
        id,
        resource_type,
        meta,
    })
}

/// A dynamically typed member after classification
pub(crate) enum PotentialValue<'a> {
    /// Written under `relationships`
    Relationship(Value),
    /// Written under `attributes` as is
    Attribute(&'a Value),
}

/// Identity of a JSON object with string `id` and `type` members
fn anonymous_key(object: &Map<String, Value>) -> Option<ResourceKey<'_>> {
    Some(ResourceKey {
        id: object.get("id")?.as_str()?,
        resource_type: object.get("type")?.as_str()?,
    })
}

fn identifier_value(key: ResourceKey<'_>) -> Value {
    let mut object = Map::new();
    object.insert("id".to_string(), Value::String(key.id.to_string()));
    object.insert(
        "type".to_string(),
        Value::String(key.resource_type.to_string()),
    );
    Value::Object(object)
}

fn data_object(data: Value) -> Value {
    let mut object = Map::new();
    object.insert("data".to_string(), data);
    Value::Object(object)
}

impl<'a> Encoder<'a> {
    /// Write a relationship object; `None` when there is nothing to write
    pub(crate) fn write_relationship(
        &mut self,
        name: &str,
        linkage: Linkage<'a>,
        mode: RelationshipMode,
        condition: IgnoreCondition,
    ) -> Result<Option<Value>> {
        let mut object = Map::new();
        if let Some(data) = linkage.data {
            let data = match data {
                WireData::Null => Value::Null,
                WireData::Single(target) => self.write_linkage(target, mode)?,
                WireData::Array(targets) => Value::Array(
                    targets
                        .into_iter()
                        .map(|target| self.write_linkage(target, mode))
                        .collect::<Result<Vec<_>>>()?,
                ),
            };
            object.insert("data".to_string(), data);
        }
        if let Some(links) = linkage.links {
            object.insert("links".to_string(), serde_json::to_value(links)?);
        }
        if let Some(meta) = linkage.meta {
            object.insert("meta".to_string(), Value::Object(meta.clone()));
        }

        if object.is_empty() {
            trace!(relationship = name, "Relationship has no data, links or meta");
            return Ok(None);
        }
        if object.len() == 1
            && let Some(data) = object.get("data")
            && condition.skips(data)
        {
            return Ok(None);
        }
        Ok(Some(Value::Object(object)))
    }

    /// Write an identifier for a typed target and enqueue it for `included`
    fn write_linkage(&mut self, target: &'a dyn ErasedResource, mode: RelationshipMode) -> Result<Value> {
        let key = target.resource_key(self.options.naming_policy)?;
        if key.id.is_empty() {
            return Err(FormatError::EmptyMember {
                scope: Scope::Identifier,
                member: "id",
            }
            .into());
        }
        if mode == RelationshipMode::Included {
            self.tracker.set_included(key, Pending::Typed(target));
        }
        Ok(identifier_value(key))
    }

    fn write_anonymous_linkage(
        &mut self,
        object: &'a Map<String, Value>,
        key: ResourceKey<'a>,
        mode: RelationshipMode,
    ) -> Result<Value> {
        if key.id.is_empty() || key.resource_type.is_empty() {
            return Err(FormatError::EmptyMember {
                scope: Scope::Identifier,
                member: if key.id.is_empty() { "id" } else { "type" },
            }
            .into());
        }
        if mode == RelationshipMode::Included {
            self.tracker.set_included(key, Pending::Anonymous(object));
        }
        Ok(identifier_value(key))
    }

    /// Classify a dynamically typed member by its runtime value.
    ///
    /// An object with string `id` and `type` is a to-one relationship. An
    /// array is classified by its first element; every later element must
    /// match. Anything else is an attribute, unless the member is
    /// identifier-only, where only `null` and `[]` are accepted.
    pub(crate) fn write_potential(
        &mut self,
        name: &str,
        value: &'a Value,
        mode: RelationshipMode,
    ) -> Result<PotentialValue<'a>> {
        if let Value::Object(object) = value
            && let Some(key) = anonymous_key(object)
        {
            let data = self.write_anonymous_linkage(object, key, mode)?;
            return Ok(PotentialValue::Relationship(data_object(data)));
        }

        if let Value::Array(items) = value
            && items
                .first()
                .and_then(Value::as_object)
                .and_then(anonymous_key)
                .is_some()
        {
            let mut data = Vec::with_capacity(items.len());
            for item in items {
                let Some((object, key)) = item
                    .as_object()
                    .and_then(|object| anonymous_key(object).map(|key| (object, key)))
                else {
                    return Err(FormatError::MixedCollection {
                        relationship: name.to_string(),
                    }
                    .into());
                };
                data.push(self.write_anonymous_linkage(object, key, mode)?);
            }
            return Ok(PotentialValue::Relationship(data_object(Value::Array(data))));
        }

        if mode == RelationshipMode::IdentifierOnly {
            return match value {
                Value::Null => Ok(PotentialValue::Relationship(data_object(Value::Null))),
                Value::Array(items) if items.is_empty() => {
                    Ok(PotentialValue::Relationship(data_object(Value::Array(Vec::new()))))
                }
                _ => Err(FormatError::NotAResource {
                    relationship: name.to_string(),
                }
                .into()),
            };
        }
        Ok(PotentialValue::Attribute(value))
    }
}
