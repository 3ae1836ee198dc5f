use super::{ErrorObject, JsonApiObject, Links, Meta};
use crate::error::FormatError;

/// A JSON:API top-level document.
///
/// `D` is the primary data shape: a single resource `T`, `Option<T>` for
/// nullable data, or a collection such as `Vec<T>`. The `included` member is
/// not stored here: on write it is computed from the relationships reachable
/// from `data`, on read it is folded back into the resource graph.
#[derive(Debug, Clone, PartialEq)]
pub struct Document<D> {
    pub data: Option<D>,
    pub errors: Option<Vec<ErrorObject>>,
    pub meta: Option<Meta>,
    pub jsonapi: Option<JsonApiObject>,
    pub links: Option<Links>,
}

impl<D> Default for Document<D> {
    fn default() -> Self {
        Self {
            data: None,
            errors: None,
            meta: None,
            jsonapi: None,
            links: None,
        }
    }
}

impl<D> Document<D> {
    /// A document carrying primary data
    pub fn new(data: D) -> Self {
        Self {
            data: Some(data),
            ..Self::default()
        }
    }

    /// An error document
    pub fn from_errors(errors: Vec<ErrorObject>) -> Self {
        Self {
            errors: Some(errors),
            ..Self::default()
        }
    }

    /// A meta-only document
    pub fn from_meta(meta: Meta) -> Self {
        Self {
            meta: Some(meta),
            ..Self::default()
        }
    }

    pub fn with_meta(mut self, meta: Meta) -> Self {
        self.meta = Some(meta);
        self
    }

    pub fn with_links(mut self, links: Links) -> Self {
        self.links = Some(links);
        self
    }

    pub fn with_jsonapi(mut self, jsonapi: JsonApiObject) -> Self {
        self.jsonapi = Some(jsonapi);
        self
    }

    pub fn is_error(&self) -> bool {
        self.errors.is_some()
    }

    pub fn into_data(self) -> Option<D> {
        self.data
    }

    /// Top-level presence rules, as checked before writing
    pub fn validate(&self) -> Result<(), FormatError> {
        if self.data.is_some() && self.errors.is_some() {
            return Err(FormatError::DataAndErrors);
        }
        if self.data.is_none() && self.errors.is_none() && self.meta.is_none() {
            return Err(FormatError::MissingTopLevelMember);
        }
        if let Some(errors) = &self.errors
            && errors.is_empty()
        {
            return Err(FormatError::EmptyErrors);
        }
        if let Some(jsonapi) = &self.jsonapi {
            jsonapi.validate()?;
        }
        Ok(())
    }
}
