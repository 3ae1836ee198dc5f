//! JSON:API wire model
//!
//! Plain serde types for the parts of a document that do not depend on the
//! host resource graph: identifiers, links, meta, the `jsonapi` object,
//! error objects, and the generic document and relationship containers.

pub mod document;
pub mod error_object;
pub mod identifier;
pub mod jsonapi;
pub mod links;
pub mod relationship;

pub use document::Document;
pub use error_object::{ErrorObject, ErrorSource};
pub use identifier::ResourceIdentifier;
pub use jsonapi::{JsonApiObject, JsonApiVersion};
pub use links::{Link, LinkObject, Links};
pub use relationship::Relationship;

/// Non-standard meta-information: an arbitrary JSON object
pub type Meta = serde_json::Map<String, serde_json::Value>;
