use serde::{Deserialize, Serialize};
use std::fmt;

use super::Meta;

/// The minimal `(id, type)` pair identifying a resource.
///
/// Two identifiers are equal when both `id` and `type` match byte-for-byte;
/// linkage `meta` takes no part in identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceIdentifier {
    pub id: String,
    #[serde(rename = "type")]
    pub resource_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,
}

impl ResourceIdentifier {
    pub fn new(id: impl Into<String>, resource_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            resource_type: resource_type.into(),
            meta: None,
        }
    }

    pub fn with_meta(mut self, meta: Meta) -> Self {
        self.meta = Some(meta);
        self
    }

    /// Both members are non-empty
    pub fn is_valid(&self) -> bool {
        !self.id.is_empty() && !self.resource_type.is_empty()
    }
}

impl PartialEq for ResourceIdentifier {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.resource_type == other.resource_type
    }
}

impl Eq for ResourceIdentifier {}

impl std::hash::Hash for ResourceIdentifier {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.resource_type.hash(state);
        self.id.hash(state);
    }
}

impl fmt::Display for ResourceIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.resource_type, self.id)
    }
}
