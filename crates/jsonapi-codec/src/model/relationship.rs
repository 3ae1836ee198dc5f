use super::{Links, Meta};

/// Host-side relationship wrapper carrying `links` and `meta` next to the data.
///
/// `D` is the relationship data itself (`Option<R>` for to-one, `Vec<R>` for
/// to-many). `data: None` means the `data` member is absent, which is distinct
/// from an empty to-one (`Some(None)`) or empty to-many (`Some(vec![])`).
#[derive(Debug, Clone, PartialEq)]
pub struct Relationship<D> {
    pub data: Option<D>,
    pub links: Option<Links>,
    pub meta: Option<Meta>,
}

impl<D> Default for Relationship<D> {
    fn default() -> Self {
        Self {
            data: None,
            links: None,
            meta: None,
        }
    }
}

impl<D> Relationship<D> {
    pub fn new(data: D) -> Self {
        Self {
            data: Some(data),
            links: None,
            meta: None,
        }
    }

    /// A relationship described only by its links
    pub fn from_links(links: Links) -> Self {
        Self {
            data: None,
            links: Some(links),
            meta: None,
        }
    }

    pub fn with_links(mut self, links: Links) -> Self {
        self.links = Some(links);
        self
    }

    pub fn with_meta(mut self, meta: Meta) -> Self {
        self.meta = Some(meta);
        self
    }

    pub fn data(&self) -> Option<&D> {
        self.data.as_ref()
    }
}
