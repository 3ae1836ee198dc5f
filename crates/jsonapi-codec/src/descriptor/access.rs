use std::marker::PhantomData;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::codec::{Cardinality, Materializer, RawRelationship, RelationshipValue, WireData};
use crate::error::{FormatError, Result};
use crate::model::{Links, Meta};
use crate::tracker::ErasedResource;

/// Type-erased accessor pair for an attribute member
pub(crate) trait AttributeAccess<T>: Send + Sync {
    fn can_read(&self) -> bool;
    fn can_write(&self) -> bool;

    /// Serialize the member value, `None` without a getter
    fn get_value(&self, owner: &T) -> Option<serde_json::Result<Value>>;

    /// Deserialize `value` into the member; the owner is untouched on failure
    fn set_value(&self, owner: &mut T, value: Value) -> serde_json::Result<()>;
}

pub(crate) struct TypedAttribute<T, V> {
    pub(crate) get: Option<fn(&T) -> &V>,
    pub(crate) set: Option<fn(&mut T, V)>,
}

impl<T, V> AttributeAccess<T> for TypedAttribute<T, V>
where
    V: Serialize + DeserializeOwned + 'static,
{
    fn can_read(&self) -> bool {
        self.get.is_some()
    }

    fn can_write(&self) -> bool {
        self.set.is_some()
    }

    fn get_value(&self, owner: &T) -> Option<serde_json::Result<Value>> {
        self.get.map(|get| serde_json::to_value(get(owner)))
    }

    fn set_value(&self, owner: &mut T, value: Value) -> serde_json::Result<()> {
        if let Some(set) = self.set {
            let value: V = serde_json::from_value(value)?;
            set(owner, value);
        }
        Ok(())
    }
}

/// Relationship data borrowed from a host instance for writing
pub(crate) struct Linkage<'a> {
    pub(crate) data: Option<WireData<&'a dyn ErasedResource>>,
    pub(crate) links: Option<&'a Links>,
    pub(crate) meta: Option<&'a Meta>,
}

/// Type-erased accessor pair for a statically typed relationship member
pub(crate) trait RelationshipAccess<T>: Send + Sync {
    fn cardinality(&self) -> Cardinality;
    fn can_read(&self) -> bool;
    fn can_write(&self) -> bool;

    /// `None` without a getter
    fn linkage<'a>(&self, owner: &'a T) -> Option<Linkage<'a>>;

    /// Resolve the relationship's identifiers and store the result
    fn assign(
        &self,
        owner: &mut T,
        relationship: &RawRelationship,
        materializer: &mut Materializer<'_>,
    ) -> Result<()>;
}

pub(crate) struct TypedRelationship<T, V> {
    pub(crate) get: Option<fn(&T) -> &V>,
    pub(crate) set: Option<fn(&mut T, V)>,
    pub(crate) marker: PhantomData<fn() -> V>,
}

impl<T, V> RelationshipAccess<T> for TypedRelationship<T, V>
where
    V: RelationshipValue,
{
    fn cardinality(&self) -> Cardinality {
        V::CARDINALITY
    }

    fn can_read(&self) -> bool {
        self.get.is_some()
    }

    fn can_write(&self) -> bool {
        self.set.is_some()
    }

    fn linkage<'a>(&self, owner: &'a T) -> Option<Linkage<'a>> {
        let value = (self.get?)(owner);
        let data = value.to_wire().map(|wire| match wire {
            WireData::Null => WireData::Null,
            WireData::Single(target) => WireData::Single(target as &dyn ErasedResource),
            WireData::Array(targets) => WireData::Array(
                targets
                    .into_iter()
                    .map(|target| target as &dyn ErasedResource)
                    .collect(),
            ),
        });
        Some(Linkage {
            data,
            links: value.links(),
            meta: value.meta(),
        })
    }

    fn assign(
        &self,
        owner: &mut T,
        relationship: &RawRelationship,
        materializer: &mut Materializer<'_>,
    ) -> Result<()> {
        let Some(set) = self.set else {
            return Ok(());
        };
        let data = match &relationship.data {
            None => None,
            Some(WireData::Null) => Some(WireData::Null),
            Some(WireData::Single(identifier)) => Some(WireData::Single(
                materializer.resolve::<V::Target>(identifier)?,
            )),
            Some(WireData::Array(identifiers)) => {
                if V::CARDINALITY == Cardinality::ToOne {
                    return Err(FormatError::UnexpectedArray {
                        position: format!("relationships.{}", relationship.name),
                    }
                    .into());
                }
                let targets = identifiers
                    .iter()
                    .map(|identifier| materializer.resolve::<V::Target>(identifier))
                    .collect::<Result<Vec<_>>>()?;
                Some(WireData::Array(targets))
            }
        };
        set(
            owner,
            V::from_wire(data, relationship.links.clone(), relationship.meta.clone()),
        );
        Ok(())
    }
}

/// Accessor pair for a dynamically typed member
pub(crate) struct PotentialAccess<T> {
    pub(crate) get: Option<fn(&T) -> &Value>,
    pub(crate) set: Option<fn(&mut T, Value)>,
}

pub(crate) enum MemberAccess<T> {
    Attribute(Box<dyn AttributeAccess<T>>),
    Relationship(Box<dyn RelationshipAccess<T>>),
    Potential(PotentialAccess<T>),
}
