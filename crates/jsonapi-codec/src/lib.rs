//! # JSON:API Codec
//!
//! Reads and writes JSON:API (`application/vnd.api+json`) documents to and
//! from strongly-typed resource graphs.
//!
//! ## Features
//! - Streaming read with member-presence validation as members arrive
//! - Compound documents: `included` is computed on write and folded back into
//!   the graph on read, including forward references and cycles
//! - Exactly-once emission of every included resource, in discovery order
//! - `#[derive(JsonApiResource)]` for host structs (`derive` feature)
//! - Naming policies, ignore conditions and number handling via [`CodecOptions`]
//!
//! ## Quick Start
//!
//! ```rust
//! use jsonapi_codec::prelude::*;
//!
//! #[derive(Debug, Default, JsonApiResource)]
//! #[jsonapi(type = "people")]
//! struct Person {
//!     #[jsonapi(id)]
//!     id: String,
//!     name: String,
//! }
//!
//! let person = Person { id: "9".into(), name: "Dan".into() };
//! let json = jsonapi_codec::to_string(&Document::new(person)).unwrap();
//! assert_eq!(json, r#"{"data":{"id":"9","type":"people","attributes":{"name":"Dan"}}}"#);
//!
//! let document: Document<Person> = jsonapi_codec::from_str(&json).unwrap();
//! assert_eq!(document.data.unwrap().name, "Dan");
//! ```
//!
//! ## Code Organization
//!
//! - **model**: wire types independent of the host graph
//! - **descriptor**: per-type member tables and the process-wide cache
//! - **codec**: document, resource and relationship reading and writing
//! - **options** / **error**: configuration and the error taxonomy

pub mod codec;
pub mod descriptor;
pub mod error;
pub mod model;
pub mod options;
pub mod prelude;

mod tracker;
mod validation;

use std::io;

use serde_json::Value;

pub use codec::{Cardinality, CollectionCategory, DataShape, JsonApiCodec, PrimaryData, RelationshipValue, WireData};
pub use descriptor::{
    DescriptorBuilder, IdValue, MemberDescriptor, MemberKind, MemberOptions, RelationshipMode, Resource,
    TypeDescriptor, descriptor, descriptor_for_options,
};
pub use error::{FormatError, JsonApiError, Result, Scope, ShapeError};
pub use model::{
    Document, ErrorObject, ErrorSource, JsonApiObject, JsonApiVersion, Link, LinkObject, Links, Meta,
    Relationship, ResourceIdentifier,
};
pub use options::{CodecOptions, IgnoreCondition, NamingPolicy, NumberHandling};

#[cfg(feature = "derive")]
pub use jsonapi_codec_derive::JsonApiResource;

/// The JSON:API media type
pub const MEDIA_TYPE: &str = "application/vnd.api+json";

/// Read a document from JSON text with default options
pub fn from_str<D: PrimaryData>(json: &str) -> Result<Document<D>> {
    JsonApiCodec::default().from_str(json)
}

pub fn from_slice<D: PrimaryData>(json: &[u8]) -> Result<Document<D>> {
    JsonApiCodec::default().from_slice(json)
}

pub fn from_reader<R: io::Read, D: PrimaryData>(reader: R) -> Result<Document<D>> {
    JsonApiCodec::default().from_reader(reader)
}

pub fn from_value<D: PrimaryData>(value: Value) -> Result<Document<D>> {
    JsonApiCodec::default().from_value(value)
}

/// Write a document with default options
pub fn to_value<D: PrimaryData>(document: &Document<D>) -> Result<Value> {
    JsonApiCodec::default().to_value(document)
}

pub fn to_string<D: PrimaryData>(document: &Document<D>) -> Result<String> {
    JsonApiCodec::default().to_string(document)
}

pub fn to_string_pretty<D: PrimaryData>(document: &Document<D>) -> Result<String> {
    JsonApiCodec::default().to_string_pretty(document)
}

pub fn to_vec<D: PrimaryData>(document: &Document<D>) -> Result<Vec<u8>> {
    JsonApiCodec::default().to_vec(document)
}

pub fn to_writer<W: io::Write, D: PrimaryData>(writer: W, document: &Document<D>) -> Result<()> {
    JsonApiCodec::default().to_writer(writer, document)
}
