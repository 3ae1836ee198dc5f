//! Host shapes for primary data and relationship data

use std::collections::VecDeque;
use std::sync::Arc;

use crate::descriptor::Resource;
use crate::error::{JsonApiError, Result};
use crate::model::{Links, Meta, Relationship};

/// A `data` member as it appears on the wire
#[derive(Debug, Clone, PartialEq)]
pub enum WireData<T> {
    Null,
    Single(T),
    Array(Vec<T>),
}

impl<T> WireData<T> {
    pub fn len(&self) -> usize {
        match self {
            WireData::Null => 0,
            WireData::Single(_) => 1,
            WireData::Array(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        let items: &[T] = match self {
            WireData::Null => &[],
            WireData::Single(item) => std::slice::from_ref(item),
            WireData::Array(items) => items,
        };
        items.iter()
    }

    /// Convert every item, stopping at the first failure
    pub fn try_map<U, E>(self, mut f: impl FnMut(T) -> Result<U, E>) -> Result<WireData<U>, E> {
        Ok(match self {
            WireData::Null => WireData::Null,
            WireData::Single(item) => WireData::Single(f(item)?),
            WireData::Array(items) => {
                WireData::Array(items.into_iter().map(f).collect::<Result<Vec<_>, E>>()?)
            }
        })
    }

    /// All items as a list; a single item becomes a one-element list
    pub fn into_vec(self) -> Vec<T> {
        match self {
            WireData::Null => Vec::new(),
            WireData::Single(item) => vec![item],
            WireData::Array(items) => items,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    ToOne,
    ToMany,
}

/// Concrete collection family a to-many host shape is built from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionCategory {
    /// Fixed-size, built from a counted array
    Array,
    /// Growable sequence
    List,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataShape {
    /// Exactly one resource; `null` is rejected
    Single,
    /// One resource or `null`
    Optional,
    Collection(CollectionCategory),
}

/// Host types usable as a document's primary data
pub trait PrimaryData: Sized {
    type Item: Resource;
    const SHAPE: DataShape;

    fn to_wire(&self) -> WireData<&Self::Item>;

    /// Build the host value; arity has been checked against [`Self::SHAPE`]
    fn from_wire(wire: WireData<Self::Item>) -> Result<Self>;
}

impl<T: Resource> PrimaryData for T {
    type Item = T;
    const SHAPE: DataShape = DataShape::Single;

    fn to_wire(&self) -> WireData<&T> {
        WireData::Single(self)
    }

    fn from_wire(wire: WireData<T>) -> Result<Self> {
        match wire {
            WireData::Single(item) => Ok(item),
            WireData::Array(mut items) if items.len() == 1 => Ok(items.remove(0)),
            _ => Err(JsonApiError::NotSupported(
                "single resource built from null or many resources",
            )),
        }
    }
}

impl<T: Resource> PrimaryData for Option<T> {
    type Item = T;
    const SHAPE: DataShape = DataShape::Optional;

    fn to_wire(&self) -> WireData<&T> {
        match self {
            Some(item) => WireData::Single(item),
            None => WireData::Null,
        }
    }

    fn from_wire(wire: WireData<T>) -> Result<Self> {
        Ok(wire.into_vec().into_iter().next())
    }
}

impl<T: Resource> PrimaryData for Vec<T> {
    type Item = T;
    const SHAPE: DataShape = DataShape::Collection(CollectionCategory::List);

    fn to_wire(&self) -> WireData<&T> {
        WireData::Array(self.iter().collect())
    }

    fn from_wire(wire: WireData<T>) -> Result<Self> {
        Ok(wire.into_vec())
    }
}

impl<T: Resource> PrimaryData for VecDeque<T> {
    type Item = T;
    const SHAPE: DataShape = DataShape::Collection(CollectionCategory::List);

    fn to_wire(&self) -> WireData<&T> {
        WireData::Array(self.iter().collect())
    }

    fn from_wire(wire: WireData<T>) -> Result<Self> {
        Ok(wire.into_vec().into())
    }
}

impl<T: Resource> PrimaryData for Box<[T]> {
    type Item = T;
    const SHAPE: DataShape = DataShape::Collection(CollectionCategory::Array);

    fn to_wire(&self) -> WireData<&T> {
        WireData::Array(self.iter().collect())
    }

    fn from_wire(wire: WireData<T>) -> Result<Self> {
        Ok(wire.into_vec().into_boxed_slice())
    }
}

/// Borrowed slices can be written but have no owned form to read into
impl<T: Resource> PrimaryData for &[T] {
    type Item = T;
    const SHAPE: DataShape = DataShape::Collection(CollectionCategory::Array);

    fn to_wire(&self) -> WireData<&T> {
        WireData::Array(self.iter().collect())
    }

    fn from_wire(_wire: WireData<T>) -> Result<Self> {
        Err(JsonApiError::NotSupported(
            "reading primary data into a borrowed slice",
        ))
    }
}

/// Host types usable as a relationship member
pub trait RelationshipValue: Sized + 'static {
    type Target: Resource;
    const CARDINALITY: Cardinality;

    /// Linkage to write; `None` leaves the `data` member out
    fn to_wire(&self) -> Option<WireData<&Self::Target>>;

    /// Build from resolved linkage; `data` is `None` when the member was absent
    fn from_wire(data: Option<WireData<Self::Target>>, links: Option<Links>, meta: Option<Meta>) -> Self;

    fn links(&self) -> Option<&Links> {
        None
    }

    fn meta(&self) -> Option<&Meta> {
        None
    }
}

impl<R: Resource> RelationshipValue for Option<R> {
    type Target = R;
    const CARDINALITY: Cardinality = Cardinality::ToOne;

    fn to_wire(&self) -> Option<WireData<&R>> {
        Some(match self {
            Some(target) => WireData::Single(target),
            None => WireData::Null,
        })
    }

    fn from_wire(data: Option<WireData<R>>, _links: Option<Links>, _meta: Option<Meta>) -> Self {
        data.and_then(|data| data.into_vec().into_iter().next())
    }
}

/// Shared targets; also the way to express a self-referencing to-one
impl<R: Resource> RelationshipValue for Option<Arc<R>> {
    type Target = R;
    const CARDINALITY: Cardinality = Cardinality::ToOne;

    fn to_wire(&self) -> Option<WireData<&R>> {
        Some(match self {
            Some(target) => WireData::Single(target.as_ref()),
            None => WireData::Null,
        })
    }

    fn from_wire(data: Option<WireData<R>>, _links: Option<Links>, _meta: Option<Meta>) -> Self {
        data.and_then(|data| data.into_vec().into_iter().next()).map(Arc::new)
    }
}

impl<R: Resource> RelationshipValue for Vec<R> {
    type Target = R;
    const CARDINALITY: Cardinality = Cardinality::ToMany;

    fn to_wire(&self) -> Option<WireData<&R>> {
        Some(WireData::Array(self.iter().collect()))
    }

    fn from_wire(data: Option<WireData<R>>, _links: Option<Links>, _meta: Option<Meta>) -> Self {
        data.map(WireData::into_vec).unwrap_or_default()
    }
}

impl<R: Resource> RelationshipValue for Vec<Arc<R>> {
    type Target = R;
    const CARDINALITY: Cardinality = Cardinality::ToMany;

    fn to_wire(&self) -> Option<WireData<&R>> {
        Some(WireData::Array(self.iter().map(Arc::as_ref).collect()))
    }

    fn from_wire(data: Option<WireData<R>>, _links: Option<Links>, _meta: Option<Meta>) -> Self {
        data.map(WireData::into_vec)
            .unwrap_or_default()
            .into_iter()
            .map(Arc::new)
            .collect()
    }
}

impl<D: RelationshipValue> RelationshipValue for Relationship<D> {
    type Target = D::Target;
    const CARDINALITY: Cardinality = D::CARDINALITY;

    fn to_wire(&self) -> Option<WireData<&Self::Target>> {
        self.data.as_ref().and_then(|data| data.to_wire())
    }

    fn from_wire(data: Option<WireData<Self::Target>>, links: Option<Links>, meta: Option<Meta>) -> Self {
        Relationship {
            data: data.map(|data| D::from_wire(Some(data), None, None)),
            links,
            meta,
        }
    }

    fn links(&self) -> Option<&Links> {
        self.links.as_ref()
    }

    fn meta(&self) -> Option<&Meta> {
        self.meta.as_ref()
    }
}
