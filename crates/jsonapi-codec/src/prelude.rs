//! # JSON:API Codec Prelude
//!
//! ```rust
//! use jsonapi_codec::prelude::*;
//! ```

pub use crate::codec::{JsonApiCodec, PrimaryData, RelationshipValue};
pub use crate::descriptor::{DescriptorBuilder, IdValue, RelationshipMode, Resource};
pub use crate::error::{FormatError, JsonApiError, Result, ShapeError};
pub use crate::model::{
    Document, ErrorObject, ErrorSource, JsonApiObject, Links, Meta, Relationship, ResourceIdentifier,
};
pub use crate::options::{CodecOptions, IgnoreCondition, NamingPolicy, NumberHandling};

#[cfg(feature = "derive")]
pub use crate::JsonApiResource;
