//! Included-resource tracking.
//!
//! A write walks the resource graph from the primary data and collects every
//! distinct related resource exactly once, in discovery order. A read does the
//! reverse: it collects resource bodies by identity so relationship
//! identifiers can be resolved wherever in the document the body appears.

mod decode;
mod encode;
mod identity;

pub(crate) use decode::DecodeTracker;
pub(crate) use encode::{EncodeTracker, Pending};
pub(crate) use identity::ResourceKey;

use serde_json::Value;

use crate::codec::Encoder;
use crate::descriptor::{Resource, descriptor};
use crate::error::Result;
use crate::options::NamingPolicy;

/// Object-safe view of a host resource for the write path
pub(crate) trait ErasedResource {
    fn resource_key(&self, policy: NamingPolicy) -> Result<ResourceKey<'_>>;

    /// Write the full resource object
    fn encode<'a>(&'a self, encoder: &mut Encoder<'a>) -> Result<Value>;
}

impl<T: Resource> ErasedResource for T {
    fn resource_key(&self, policy: NamingPolicy) -> Result<ResourceKey<'_>> {
        let descriptor = descriptor::<T>(policy)?;
        Ok(descriptor.key_of(self)?)
    }

    fn encode<'a>(&'a self, encoder: &mut Encoder<'a>) -> Result<Value> {
        encoder.write_resource(self)
    }
}
