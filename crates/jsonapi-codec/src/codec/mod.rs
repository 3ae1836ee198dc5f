//! Document reading and writing
//!
//! [`JsonApiCodec`] carries a [`CodecOptions`] and exposes the serde_json
//! style entry points. The crate-level free functions use default options.

mod collection;
mod context;
mod document;
mod errors;
mod materialize;
mod relationship;
mod resource;

use std::io;

use serde_json::Value;

use crate::error::Result;
use crate::model::Document;
use crate::options::CodecOptions;

pub use collection::{Cardinality, CollectionCategory, DataShape, PrimaryData, RelationshipValue, WireData};
pub(crate) use document::Encoder;
pub(crate) use materialize::Materializer;
pub(crate) use relationship::RawRelationship;
pub(crate) use resource::RawResource;

/// A JSON:API reader and writer bound to one set of options
#[derive(Debug, Clone, Default)]
pub struct JsonApiCodec {
    options: CodecOptions,
}

impl JsonApiCodec {
    pub fn new(options: CodecOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &CodecOptions {
        &self.options
    }

    /// Read a document from JSON text
    pub fn from_str<D: PrimaryData>(&self, json: &str) -> Result<Document<D>> {
        let mut deserializer = serde_json::Deserializer::from_str(json);
        let document = document::decode_document(&mut deserializer, &self.options)?;
        deserializer.end()?;
        Ok(document)
    }

    pub fn from_slice<D: PrimaryData>(&self, json: &[u8]) -> Result<Document<D>> {
        let mut deserializer = serde_json::Deserializer::from_slice(json);
        let document = document::decode_document(&mut deserializer, &self.options)?;
        deserializer.end()?;
        Ok(document)
    }

    pub fn from_reader<R: io::Read, D: PrimaryData>(&self, reader: R) -> Result<Document<D>> {
        let mut deserializer = serde_json::Deserializer::from_reader(reader);
        let document = document::decode_document(&mut deserializer, &self.options)?;
        deserializer.end()?;
        Ok(document)
    }

    /// Read a document from an already parsed JSON value
    pub fn from_value<D: PrimaryData>(&self, value: Value) -> Result<Document<D>> {
        document::decode_document(value, &self.options)
    }

    pub fn to_value<D: PrimaryData>(&self, document: &Document<D>) -> Result<Value> {
        document::encode_document(document, &self.options)
    }

    pub fn to_string<D: PrimaryData>(&self, document: &Document<D>) -> Result<String> {
        Ok(serde_json::to_string(&self.to_value(document)?)?)
    }

    pub fn to_string_pretty<D: PrimaryData>(&self, document: &Document<D>) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.to_value(document)?)?)
    }

    pub fn to_vec<D: PrimaryData>(&self, document: &Document<D>) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(&self.to_value(document)?)?)
    }

    pub fn to_writer<W: io::Write, D: PrimaryData>(&self, writer: W, document: &Document<D>) -> Result<()> {
        serde_json::to_writer(writer, &self.to_value(document)?)?;
        Ok(())
    }
}
