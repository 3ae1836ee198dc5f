use std::fmt;
use thiserror::Error;

/// Convenience result alias used throughout the codec
pub type Result<T, E = JsonApiError> = std::result::Result<T, E>;

/// The JSON:API object level a member was observed at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Document,
    Resource,
    Identifier,
    Attributes,
    Relationships,
    Relationship,
    Error,
}

impl Scope {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scope::Document => "document",
            Scope::Resource => "resource object",
            Scope::Identifier => "resource identifier object",
            Scope::Attributes => "attributes object",
            Scope::Relationships => "relationships object",
            Scope::Relationship => "relationship object",
            Scope::Error => "error object",
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Malformed or specification-violating JSON:API structure.
///
/// Format errors abort the current document conversion. They are recoverable
/// at the document boundary: the caller may reject the payload and carry on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    #[error("JSON:API {scope} must not contain duplicate member '{member}'")]
    DuplicateMember { scope: Scope, member: String },

    #[error("JSON:API document must not contain both 'data' and 'errors' members")]
    DataAndErrors,

    #[error("JSON:API document must contain 'data', 'errors' or 'meta' members")]
    MissingTopLevelMember,

    #[error("JSON:API document must contain a 'data' member if 'included' is present")]
    IncludedWithoutData,

    #[error("JSON:API {scope} must contain a 'type' member")]
    MissingType { scope: Scope },

    #[error("JSON:API {scope} must contain an 'id' member")]
    MissingId { scope: Scope },

    #[error("JSON:API relationship '{relationship}' must contain 'links', 'data' or 'meta' members")]
    EmptyRelationship { relationship: String },

    #[error("JSON:API {scope} member '{member}' must be a string")]
    NotAString { scope: Scope, member: &'static str },

    #[error("JSON:API {scope} member '{member}' must not be empty")]
    EmptyMember { scope: Scope, member: &'static str },

    #[error("JSON:API version '{version}' is invalid, expected 'major.minor'")]
    InvalidVersion { version: String },

    #[error("JSON:API version '{version}' is below the minimum required version '1.0'")]
    UnsupportedVersion { version: String },

    #[error("JSON:API 'errors' member must contain at least one error object")]
    EmptyErrors,

    #[error("null resource is not allowed in '{position}'")]
    NullResource { position: String },

    #[error("'{position}' expects a single resource but the document contains an array")]
    UnexpectedArray { position: String },

    #[error("'{position}' must be {expected}")]
    UnexpectedShape {
        position: String,
        expected: &'static str,
    },

    #[error("resource of type '{found}' cannot be read as type '{expected}'")]
    TypeMismatch { expected: String, found: String },

    #[error("resource ('{resource_type}', '{id}') appears more than once in the document")]
    DuplicateResource { resource_type: String, id: String },

    #[error("relationship '{relationship}' value is not a resource with string 'id' and 'type'")]
    NotAResource { relationship: String },

    #[error("relationship '{relationship}' mixes resources and plain values in one collection")]
    MixedCollection { relationship: String },

    #[error("attribute '{member}' has an invalid value: {message}")]
    InvalidAttribute { member: String, message: String },
}

/// Host model misconfiguration detected while building a type descriptor.
///
/// Shape errors are fatal: they are reported for every use of the offending
/// type and indicate a programming error, not bad input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShapeError {
    #[error("type '{rust_type}' declares wire name '{wire_name}' more than once")]
    DuplicateWireName {
        rust_type: &'static str,
        wire_name: String,
    },

    #[error("type '{rust_type}' uses reserved member name '{wire_name}' for an attribute or relationship")]
    ReservedName {
        rust_type: &'static str,
        wire_name: String,
    },

    #[error("type '{rust_type}' declares more than one constructor")]
    AmbiguousConstructor { rust_type: &'static str },

    #[error("type '{rust_type}' does not declare a constructor")]
    MissingConstructor { rust_type: &'static str },

    #[error("type '{rust_type}' declares neither a resource type name nor a type member")]
    MissingResourceType { rust_type: &'static str },

    #[error("type '{rust_type}' declares both a fixed resource type name and a type member")]
    ConflictingResourceType { rust_type: &'static str },

    #[error("type '{rust_type}' declares more than one '{role}' member")]
    DuplicateRole {
        rust_type: &'static str,
        role: &'static str,
    },
}

/// Top-level error returned by every codec entry point
#[derive(Debug, Error)]
pub enum JsonApiError {
    #[error(transparent)]
    Format(#[from] FormatError),

    #[error(transparent)]
    Shape(#[from] ShapeError),

    #[error("operation not supported: {0}")]
    NotSupported(&'static str),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl JsonApiError {
    pub fn is_format(&self) -> bool {
        matches!(self, JsonApiError::Format(_))
    }

    pub fn is_shape(&self) -> bool {
        matches!(self, JsonApiError::Shape(_))
    }

    /// The format error carried by this error, if any
    pub fn as_format(&self) -> Option<&FormatError> {
        match self {
            JsonApiError::Format(err) => Some(err),
            _ => None,
        }
    }
}
