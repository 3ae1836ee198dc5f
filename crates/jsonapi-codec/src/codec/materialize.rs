use serde_json::{Map, Number, Value};
use tracing::{debug, trace};

use super::relationship::RawRelationship;
use super::resource::RawResource;
use super::WireData;
use crate::descriptor::{AttributeAccess, MemberAccess, Resource, TypeDescriptor, descriptor};
use crate::error::{FormatError, Result};
use crate::model::ResourceIdentifier;
use crate::options::{CodecOptions, NumberHandling};
use crate::tracker::DecodeTracker;

/// Full builds allowed per body in the document before repeat references
/// fall back to identifier-only instances
const EXPANSIONS_PER_BODY: usize = 64;

/// Builds host values from the bodies collected during a read.
///
/// Every reference to a resource with a body produces a fully populated
/// instance, except while that same body is being built further up the
/// stack: the cycle is cut there with an identifier-only instance.
///
/// Owned targets are copied per reference, so a graph of shared targets
/// (diamonds) can expand far beyond its input. The total number of builds is
/// capped at [`EXPANSIONS_PER_BODY`] per body. Past the cap, a body that was
/// already built once is linked by identifier; a first visit is always built.
pub(crate) struct Materializer<'t> {
    options: &'t CodecOptions,
    tracker: &'t DecodeTracker,
    in_progress: Vec<usize>,
    built: Vec<bool>,
    expansions: usize,
    budget: usize,
    capped: bool,
}

impl<'t> Materializer<'t> {
    pub(crate) fn new(options: &'t CodecOptions, tracker: &'t DecodeTracker) -> Self {
        let bodies = tracker.body_count();
        Self {
            options,
            tracker,
            in_progress: Vec::new(),
            built: vec![false; bodies],
            expansions: 0,
            budget: bodies.max(1).saturating_mul(EXPANSIONS_PER_BODY),
            capped: false,
        }
    }

    /// Build a host value from the body at `body`
    pub(crate) fn materialize<T: Resource>(&mut self, body: usize) -> Result<T> {
        let tracker = self.tracker;
        let raw = tracker.body(body);
        let descriptor = descriptor::<T>(self.options.naming_policy)?;
        descriptor.check_type(&raw.resource_type)?;

        let mut object = descriptor.construct();
        descriptor.assign_type(&mut object, &raw.resource_type);
        if let Some(id) = &raw.id {
            descriptor.assign_id(&mut object, id.clone());
        }
        if let Some(links) = &raw.links {
            descriptor.assign_links(&mut object, links.clone());
        }
        if let Some(meta) = &raw.meta {
            descriptor.assign_meta(&mut object, meta.clone());
        }

        self.expansions += 1;
        if let Some(built) = self.built.get_mut(body) {
            *built = true;
        }
        self.in_progress.push(body);
        let populated = self.populate(&descriptor, &mut object, raw);
        self.in_progress.pop();
        populated?;
        Ok(object)
    }

    /// Build the target of a relationship identifier
    pub(crate) fn resolve<T: Resource>(&mut self, identifier: &ResourceIdentifier) -> Result<T> {
        match self
            .tracker
            .find_body(&identifier.id, &identifier.resource_type)
        {
            Some(body) if self.in_progress.contains(&body) => {
                trace!(
                    resource_type = %identifier.resource_type,
                    id = %identifier.id,
                    "Cycle in resource graph, linking by identifier"
                );
                self.identifier_only(identifier)
            }
            Some(body) if self.expansions >= self.budget && self.built.get(body) == Some(&true) => {
                if !self.capped {
                    self.capped = true;
                    debug!(
                        budget = self.budget,
                        "Shared resources exceeded the expansion budget, linking repeats by identifier"
                    );
                }
                self.identifier_only(identifier)
            }
            Some(body) => self.materialize(body),
            None => self.identifier_only(identifier),
        }
    }

    fn identifier_only<T: Resource>(&self, identifier: &ResourceIdentifier) -> Result<T> {
        let descriptor = descriptor::<T>(self.options.naming_policy)?;
        descriptor.check_type(&identifier.resource_type)?;
        let mut object = descriptor.construct();
        descriptor.assign_type(&mut object, &identifier.resource_type);
        descriptor.assign_id(&mut object, identifier.id.clone());
        Ok(object)
    }

    fn populate<T: Resource>(
        &mut self,
        descriptor: &TypeDescriptor<T>,
        object: &mut T,
        raw: &RawResource,
    ) -> Result<()> {
        let case_insensitive = self.options.case_insensitive_members;
        let skip_write_only = self.options.ignore_write_only_members;

        for (name, value) in &raw.attributes {
            let Some(member) = descriptor.member(name, case_insensitive) else {
                trace!(
                    attribute = %name,
                    resource_type = %raw.resource_type,
                    "Skipping unknown attribute"
                );
                continue;
            };
            if !member.can_write() || (skip_write_only && !member.can_read()) {
                continue;
            }
            match &member.access {
                MemberAccess::Attribute(access) => {
                    self.set_attribute(access.as_ref(), object, member.wire_name(), value)?
                }
                MemberAccess::Potential(access) => {
                    if let Some(set) = access.set {
                        set(object, value.clone());
                    }
                }
                MemberAccess::Relationship(_) => {
                    trace!(attribute = %name, "Attribute names a relationship member, skipping");
                }
            }
        }

        for relationship in &raw.relationships {
            let Some(member) = descriptor.member(&relationship.name, case_insensitive) else {
                trace!(
                    relationship = %relationship.name,
                    resource_type = %raw.resource_type,
                    "Skipping unknown relationship"
                );
                continue;
            };
            if !member.can_write() || (skip_write_only && !member.can_read()) {
                continue;
            }
            match &member.access {
                MemberAccess::Relationship(access) => access.assign(object, relationship, self)?,
                MemberAccess::Potential(access) => {
                    if let (Some(set), Some(value)) = (access.set, self.potential_value(relationship)) {
                        set(object, value);
                    }
                }
                MemberAccess::Attribute(_) => {
                    trace!(
                        relationship = %relationship.name,
                        "Relationship names an attribute member, skipping"
                    );
                }
            }
        }
        Ok(())
    }

    fn set_attribute<T>(
        &self,
        access: &dyn AttributeAccess<T>,
        object: &mut T,
        wire_name: &str,
        value: &Value,
    ) -> Result<()> {
        let fallback = match (self.options.number_handling, value) {
            (NumberHandling::AllowReadingFromString, Value::String(text)) => parse_number(text),
            _ => None,
        };
        let Err(err) = access.set_value(object, value.clone()) else {
            return Ok(());
        };
        if let Some(number) = fallback
            && access.set_value(object, number).is_ok()
        {
            return Ok(());
        }
        Err(FormatError::InvalidAttribute {
            member: wire_name.to_string(),
            message: err.to_string(),
        }
        .into())
    }

    /// A relationship rebuilt as JSON for a dynamically typed member
    fn potential_value(&self, relationship: &RawRelationship) -> Option<Value> {
        Some(match relationship.data.as_ref()? {
            WireData::Null => Value::Null,
            WireData::Single(identifier) => self.anonymous_value(identifier),
            WireData::Array(identifiers) => Value::Array(
                identifiers
                    .iter()
                    .map(|identifier| self.anonymous_value(identifier))
                    .collect(),
            ),
        })
    }

    /// `id`, `type` and, when the body is known, its attributes flattened in
    /// alongside `links` and `meta`
    fn anonymous_value(&self, identifier: &ResourceIdentifier) -> Value {
        let mut object = Map::new();
        object.insert("id".to_string(), Value::String(identifier.id.clone()));
        object.insert(
            "type".to_string(),
            Value::String(identifier.resource_type.clone()),
        );
        if let Some(body) = self
            .tracker
            .find_body(&identifier.id, &identifier.resource_type)
        {
            let raw = self.tracker.body(body);
            for (name, value) in &raw.attributes {
                object.entry(name.clone()).or_insert_with(|| value.clone());
            }
            if let Some(links) = &raw.links
                && let Ok(links) = serde_json::to_value(links)
            {
                object.insert("links".to_string(), links);
            }
            if let Some(meta) = &raw.meta {
                object.insert("meta".to_string(), Value::Object(meta.clone()));
            }
        }
        Value::Object(object)
    }
}

fn parse_number(text: &str) -> Option<Value> {
    let text = text.trim();
    if let Ok(number) = text.parse::<i64>() {
        return Some(Value::from(number));
    }
    if let Ok(number) = text.parse::<u64>() {
        return Some(Value::from(number));
    }
    text.parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(Value::Number)
}
