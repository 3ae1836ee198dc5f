//! Top-level document orchestration
//!
//! Reading streams the document into raw bodies first and only binds host
//! values once the closing brace is seen, so `included` may appear before or
//! after `data` and relationships may point forward. Writing emits `data`
//! while collecting referenced resources, then drains them into `included`.

use std::fmt;

use serde::de::{self, DeserializeSeed, Deserializer, IgnoredAny, MapAccess, SeqAccess, Visitor};
use serde_json::{Map, Value};
use tracing::{debug, trace};

use super::context::{DecodeContext, reject_scalars};
use super::errors::ErrorsSeed;
use super::materialize::Materializer;
use super::resource::{ResourceSeed, read_resource};
use super::{DataShape, PrimaryData, WireData};
use crate::descriptor::Resource;
use crate::error::{FormatError, Result};
use crate::model::{Document, ErrorObject, JsonApiObject, Links, Meta};
use crate::options::CodecOptions;
use crate::tracker::{EncodeTracker, ErasedResource, Pending};
use crate::validation::{DocumentState, MemberName};

/// Write state for one document
pub(crate) struct Encoder<'a> {
    pub(crate) options: &'a CodecOptions,
    pub(crate) tracker: EncodeTracker<'a>,
}

impl<'a> Encoder<'a> {
    pub(crate) fn new(options: &'a CodecOptions) -> Self {
        Self {
            options,
            tracker: EncodeTracker::new(),
        }
    }

    /// Write primary data. Every primary resource is recorded before any is
    /// written so a relationship back to one never lands in `included`.
    fn write_primary<T: Resource>(&mut self, data: WireData<&'a T>) -> Result<Value> {
        for &resource in data.iter() {
            let key = resource.resource_key(self.options.naming_policy)?;
            if !key.id.is_empty() {
                self.tracker.mark_emitted(key);
            }
        }

        Ok(match data {
            WireData::Null => Value::Null,
            WireData::Single(resource) => self.write_resource(resource)?,
            WireData::Array(resources) => Value::Array(
                resources
                    .into_iter()
                    .map(|resource| self.write_resource(resource))
                    .collect::<Result<Vec<_>>>()?,
            ),
        })
    }

    /// Drain the tracker in discovery order; writing a resource may append more
    fn write_included(&mut self) -> Result<Vec<Value>> {
        let mut included = Vec::new();
        let mut index = 0;
        while let Some(pending) = self.tracker.take(index) {
            index += 1;
            match pending {
                Some(Pending::Typed(resource)) => included.push(resource.encode(self)?),
                Some(Pending::Anonymous(object)) => included.push(self.write_anonymous(object)),
                Some(Pending::Primary) | None => {}
            }
        }
        Ok(included)
    }
}

pub(crate) fn encode_document<'a, D: PrimaryData>(
    document: &'a Document<D>,
    options: &'a CodecOptions,
) -> Result<Value> {
    document.validate()?;
    let mut encoder = Encoder::new(options);
    let mut object = Map::new();

    if let Some(data) = &document.data {
        let data = encoder.write_primary(data.to_wire())?;
        object.insert("data".to_string(), data);
    }
    if let Some(errors) = &document.errors {
        object.insert("errors".to_string(), serde_json::to_value(errors)?);
    }
    let included = encoder.write_included()?;
    let included_count = included.len();
    if !included.is_empty() {
        object.insert("included".to_string(), Value::Array(included));
    }
    if let Some(meta) = &document.meta {
        object.insert("meta".to_string(), Value::Object(meta.clone()));
    }
    if let Some(links) = &document.links {
        object.insert("links".to_string(), serde_json::to_value(links)?);
    }
    if let Some(jsonapi) = &document.jsonapi {
        object.insert("jsonapi".to_string(), serde_json::to_value(jsonapi)?);
    }

    debug!(
        included = included_count,
        tracked = encoder.tracker.len(),
        "Encoded JSON:API document"
    );
    Ok(Value::Object(object))
}

/// A document after parsing, with primary data as body indices
struct ParsedDocument {
    data: Option<WireData<usize>>,
    errors: Option<Vec<ErrorObject>>,
    meta: Option<Meta>,
    jsonapi: Option<JsonApiObject>,
    links: Option<Links>,
}

struct DocumentSeed<'c, 'o> {
    ctx: &'c mut DecodeContext<'o>,
}

impl DocumentSeed<'_, '_> {
    fn unexpected<E: de::Error>(self) -> E {
        self.ctx.fail(FormatError::UnexpectedShape {
            position: "document".to_string(),
            expected: "a JSON object",
        })
    }
}

impl<'de> DeserializeSeed<'de> for DocumentSeed<'_, '_> {
    type Value = ParsedDocument;

    fn deserialize<D: Deserializer<'de>>(self, deserializer: D) -> Result<Self::Value, D::Error> {
        deserializer.deserialize_any(self)
    }
}

impl<'de> Visitor<'de> for DocumentSeed<'_, '_> {
    type Value = ParsedDocument;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a JSON:API document")
    }

    fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
        Err(self.unexpected())
    }

    fn visit_seq<A: SeqAccess<'de>>(self, _seq: A) -> Result<Self::Value, A::Error> {
        Err(self.unexpected())
    }

    reject_scalars!();

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
        let ctx = self.ctx;
        let mut state = DocumentState::new();
        let mut parsed = ParsedDocument {
            data: None,
            errors: None,
            meta: None,
            jsonapi: None,
            links: None,
        };

        while let Some(name) = map.next_key::<MemberName<'de>>()? {
            state
                .observe(name.as_str())
                .map_err(|err| ctx.fail::<A::Error>(err))?;
            match name.as_str() {
                "data" => parsed.data = Some(map.next_value_seed(PrimaryDataSeed { ctx: &mut *ctx })?),
                "included" => map.next_value_seed(IncludedSeed { ctx: &mut *ctx })?,
                "errors" => parsed.errors = Some(map.next_value_seed(ErrorsSeed { ctx: &mut *ctx })?),
                "meta" => parsed.meta = map.next_value()?,
                "links" => parsed.links = map.next_value()?,
                "jsonapi" => {
                    let jsonapi: JsonApiObject = map.next_value()?;
                    jsonapi.validate().map_err(|err| ctx.fail::<A::Error>(err))?;
                    parsed.jsonapi = Some(jsonapi);
                }
                other => {
                    trace!(member = other, "Skipping unknown top-level member");
                    map.next_value::<IgnoredAny>()?;
                }
            }
        }

        state.validate().map_err(|err| ctx.fail::<A::Error>(err))?;
        Ok(parsed)
    }
}

/// Reads `data` into registered bodies
struct PrimaryDataSeed<'c, 'o> {
    ctx: &'c mut DecodeContext<'o>,
}

impl PrimaryDataSeed<'_, '_> {
    fn unexpected<E: de::Error>(self) -> E {
        self.ctx.fail(FormatError::UnexpectedShape {
            position: "data".to_string(),
            expected: "a resource object, an array of resource objects or null",
        })
    }
}

impl<'de> DeserializeSeed<'de> for PrimaryDataSeed<'_, '_> {
    type Value = WireData<usize>;

    fn deserialize<D: Deserializer<'de>>(self, deserializer: D) -> Result<Self::Value, D::Error> {
        deserializer.deserialize_any(self)
    }
}

impl<'de> Visitor<'de> for PrimaryDataSeed<'_, '_> {
    type Value = WireData<usize>;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("primary data")
    }

    fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(WireData::Null)
    }

    reject_scalars!();

    fn visit_map<A: MapAccess<'de>>(self, map: A) -> Result<Self::Value, A::Error> {
        let ctx = self.ctx;
        let raw = read_resource(ctx, map)?;
        let body = ctx
            .tracker
            .register_primary(raw)
            .map_err(|err| ctx.fail::<A::Error>(err))?;
        Ok(WireData::Single(body))
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
        let ctx = self.ctx;
        let mut bodies = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(raw) = seq.next_element_seed(ResourceSeed {
            ctx: &mut *ctx,
            position: "data",
        })? {
            let body = ctx
                .tracker
                .register_primary(raw)
                .map_err(|err| ctx.fail::<A::Error>(err))?;
            bodies.push(body);
        }
        Ok(WireData::Array(bodies))
    }
}

/// Reads `included`, registering each body with the tracker
struct IncludedSeed<'c, 'o> {
    ctx: &'c mut DecodeContext<'o>,
}

impl IncludedSeed<'_, '_> {
    fn unexpected<E: de::Error>(self) -> E {
        self.ctx.fail(FormatError::UnexpectedShape {
            position: "included".to_string(),
            expected: "an array of resource objects",
        })
    }
}

impl<'de> DeserializeSeed<'de> for IncludedSeed<'_, '_> {
    type Value = ();

    fn deserialize<D: Deserializer<'de>>(self, deserializer: D) -> Result<Self::Value, D::Error> {
        deserializer.deserialize_any(self)
    }
}

impl<'de> Visitor<'de> for IncludedSeed<'_, '_> {
    type Value = ();

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an included array")
    }

    fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
        Err(self.unexpected())
    }

    fn visit_map<A: MapAccess<'de>>(self, _map: A) -> Result<Self::Value, A::Error> {
        Err(self.unexpected())
    }

    reject_scalars!();

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
        let ctx = self.ctx;
        while let Some(raw) = seq.next_element_seed(ResourceSeed {
            ctx: &mut *ctx,
            position: "included",
        })? {
            ctx.tracker
                .register_included(raw)
                .map_err(|err| ctx.fail::<A::Error>(err))?;
        }
        Ok(())
    }
}

pub(crate) fn decode_document<'de, R, D>(deserializer: R, options: &CodecOptions) -> Result<Document<D>>
where
    R: Deserializer<'de, Error = serde_json::Error>,
    D: PrimaryData,
{
    let mut ctx = DecodeContext::new(options);
    let parsed = match (DocumentSeed { ctx: &mut ctx }).deserialize(deserializer) {
        Ok(parsed) => parsed,
        Err(err) => return Err(ctx.take_error(err)),
    };

    let tracker = ctx.tracker;
    let mut materializer = Materializer::new(options, &tracker);
    let data = match parsed.data {
        Some(data) => read_primary::<D>(data, &mut materializer)?,
        None => None,
    };

    debug!(
        bodies = tracker.body_count(),
        unresolved = tracker.unresolved(),
        "Decoded JSON:API document"
    );
    Ok(Document {
        data,
        errors: parsed.errors,
        meta: parsed.meta,
        jsonapi: parsed.jsonapi,
        links: parsed.links,
    })
}

/// Check the wire arity against the host shape, then bind.
///
/// Null primary data leaves the document without data unless the host shape
/// can hold the null itself.
fn read_primary<D: PrimaryData>(
    data: WireData<usize>,
    materializer: &mut Materializer<'_>,
) -> Result<Option<D>> {
    match (D::SHAPE, &data) {
        (DataShape::Single | DataShape::Collection(_), WireData::Null) => return Ok(None),
        (DataShape::Single | DataShape::Optional, WireData::Array(_)) => {
            return Err(FormatError::UnexpectedArray {
                position: "data".to_string(),
            }
            .into());
        }
        _ => {}
    }
    let data = data.try_map(|body| materializer.materialize::<D::Item>(body))?;
    D::from_wire(data).map(Some)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;
    use tracing_test::traced_test;

    use super::*;
    use crate::codec::JsonApiCodec;
    use crate::descriptor::DescriptorBuilder;
    use crate::error::{JsonApiError, Scope};

    #[derive(Debug, Default, Clone, PartialEq)]
    struct Person {
        id: String,
        name: String,
    }

    impl Resource for Person {
        fn describe(builder: &mut DescriptorBuilder<Self>) {
            builder
                .resource_type("people")
                .constructor(Person::default)
                .id(|p| Some(p.id.as_str()), |p, id| p.id = id);
            builder.attribute("name", |p| &p.name, |p, v| p.name = v);
        }
    }

    #[derive(Debug, Default, Clone, PartialEq)]
    struct Comment {
        id: String,
        body: String,
        author: Option<Person>,
    }

    impl Resource for Comment {
        fn describe(builder: &mut DescriptorBuilder<Self>) {
            builder
                .resource_type("comments")
                .constructor(Comment::default)
                .id(|c| Some(c.id.as_str()), |c, id| c.id = id);
            builder.attribute("body", |c| &c.body, |c, v| c.body = v);
            builder.relationship("author", |c| &c.author, |c, v| c.author = v);
        }
    }

    #[derive(Debug, Default, Clone, PartialEq)]
    struct Article {
        id: String,
        title: String,
        author: Option<Person>,
        comments: Vec<Comment>,
    }

    impl Resource for Article {
        fn describe(builder: &mut DescriptorBuilder<Self>) {
            builder
                .resource_type("articles")
                .constructor(Article::default)
                .id(|a| Some(a.id.as_str()), |a, id| a.id = id);
            builder.attribute("title", |a| &a.title, |a, v| a.title = v);
            builder.relationship("author", |a| &a.author, |a, v| a.author = v);
            builder.relationship("comments", |a| &a.comments, |a, v| a.comments = v);
        }
    }

    #[derive(Debug, Default)]
    struct Friend {
        id: String,
        best_friend: Option<Arc<Friend>>,
    }

    impl Resource for Friend {
        fn describe(builder: &mut DescriptorBuilder<Self>) {
            builder
                .resource_type("friends")
                .constructor(Friend::default)
                .id(|f| Some(f.id.as_str()), |f, id| f.id = id);
            builder.relationship("bestFriend", |f| &f.best_friend, |f, v| f.best_friend = v);
        }
    }

    fn person(id: &str, name: &str) -> Person {
        Person {
            id: id.to_string(),
            name: name.to_string(),
        }
    }

    fn article() -> Article {
        Article {
            id: "1".to_string(),
            title: "JSON:API paints my bikeshed!".to_string(),
            author: Some(person("9", "Dan")),
            comments: vec![
                Comment {
                    id: "5".to_string(),
                    body: "First!".to_string(),
                    author: Some(person("2", "Ana")),
                },
                Comment {
                    id: "12".to_string(),
                    body: "I like XML better".to_string(),
                    author: Some(person("9", "Dan")),
                },
            ],
        }
    }

    fn format_error(err: &JsonApiError) -> &FormatError {
        err.as_format()
            .unwrap_or_else(|| panic!("expected a format error, got {err:?}"))
    }

    #[test]
    #[traced_test]
    fn test_encode_compound_document_in_discovery_order() {
        let value = JsonApiCodec::default()
            .to_value(&Document::new(article()))
            .unwrap();

        assert_eq!(
            value["data"]["relationships"]["author"],
            json!({"data": {"id": "9", "type": "people"}})
        );
        let included: Vec<(&str, &str)> = value["included"]
            .as_array()
            .unwrap()
            .iter()
            .map(|r| (r["type"].as_str().unwrap(), r["id"].as_str().unwrap()))
            .collect();
        assert_eq!(
            included,
            vec![
                ("people", "9"),
                ("comments", "5"),
                ("comments", "12"),
                ("people", "2")
            ]
        );
        assert!(logs_contain("Encoded JSON:API document"));
    }

    #[test]
    fn test_primary_resource_is_not_repeated_in_included() {
        let articles = vec![
            Article {
                id: "1".to_string(),
                ..Article::default()
            },
            Article {
                id: "2".to_string(),
                comments: vec![Comment {
                    id: "3".to_string(),
                    ..Comment::default()
                }],
                ..Article::default()
            },
        ];
        let value = JsonApiCodec::default()
            .to_value(&Document::new(articles))
            .unwrap();
        assert_eq!(value["data"].as_array().unwrap().len(), 2);
        assert_eq!(value["included"].as_array().unwrap().len(), 1);
        assert_eq!(value["included"][0]["type"], "comments");
    }

    #[test]
    fn test_collection_writes_array_for_single_element() {
        let value = JsonApiCodec::default()
            .to_value(&Document::new(vec![person("1", "Ana")]))
            .unwrap();
        assert!(value["data"].is_array());
        assert!(value.get("included").is_none());
    }

    #[test]
    fn test_write_rejects_data_with_errors() {
        let mut document = Document::new(person("1", "Ana"));
        document.errors = Some(vec![ErrorObject::new().with_status(500)]);
        let err = JsonApiCodec::default().to_value(&document).unwrap_err();
        assert_eq!(format_error(&err), &FormatError::DataAndErrors);
    }

    #[test]
    #[traced_test]
    fn test_decode_compound_document_with_forward_references() {
        let json = json!({
            "included": [
                {"type": "comments", "id": "5", "attributes": {"body": "First!"},
                 "relationships": {"author": {"data": {"type": "people", "id": "2"}}}},
                {"type": "people", "id": "2", "attributes": {"name": "Ana"}},
                {"type": "people", "id": "9", "attributes": {"name": "Dan"}}
            ],
            "data": {
                "type": "articles",
                "id": "1",
                "attributes": {"title": "JSON:API paints my bikeshed!"},
                "relationships": {
                    "author": {"data": {"type": "people", "id": "9"}},
                    "comments": {"data": [{"type": "comments", "id": "5"}]}
                }
            }
        });
        let document: Document<Article> = JsonApiCodec::default().from_value(json).unwrap();
        let article = document.data.unwrap();
        assert_eq!(article.author, Some(person("9", "Dan")));
        assert_eq!(article.comments.len(), 1);
        assert_eq!(article.comments[0].body, "First!");
        assert_eq!(article.comments[0].author, Some(person("2", "Ana")));
        assert!(logs_contain("Decoded JSON:API document"));
    }

    #[test]
    fn test_decode_missing_included_yields_identifier_only() {
        let json = r#"{"data":{"type":"comments","id":"5","relationships":{"author":{"data":{"type":"people","id":"7"}}}}}"#;
        let document: Document<Comment> = JsonApiCodec::default().from_str(json).unwrap();
        let author = document.data.unwrap().author.unwrap();
        assert_eq!(author.id, "7");
        assert!(author.name.is_empty());
    }

    #[test]
    fn test_decode_cycle_terminates() {
        let json = r#"{
            "data": {"type": "friends", "id": "a",
                     "relationships": {"bestFriend": {"data": {"type": "friends", "id": "b"}}}},
            "included": [
                {"type": "friends", "id": "b",
                 "relationships": {"bestFriend": {"data": {"type": "friends", "id": "a"}}}}
            ]
        }"#;
        let document: Document<Friend> = JsonApiCodec::default().from_str(json).unwrap();
        let a = document.data.unwrap();
        let b = a.best_friend.as_ref().unwrap();
        assert_eq!(b.id, "b");
        let back = b.best_friend.as_ref().unwrap();
        assert_eq!(back.id, "a");
        assert!(back.best_friend.is_none());
    }

    #[test]
    fn test_decode_arity_rules() {
        let codec = JsonApiCodec::default();

        let document = codec.from_str::<Person>(r#"{"data":null}"#).unwrap();
        assert!(document.data.is_none());

        let document: Document<Option<Person>> = codec.from_str(r#"{"data":null}"#).unwrap();
        assert_eq!(document.data, Some(None));

        let document: Document<Vec<Person>> = codec.from_str(r#"{"data":null}"#).unwrap();
        assert!(document.data.is_none());

        let err = codec
            .from_str::<Person>(r#"{"data":[{"type":"people","id":"1"}]}"#)
            .unwrap_err();
        assert!(matches!(format_error(&err), FormatError::UnexpectedArray { .. }));

        let document: Document<Vec<Person>> = codec
            .from_str(r#"{"data":{"type":"people","id":"1"}}"#)
            .unwrap();
        assert_eq!(document.data.unwrap().len(), 1);

        let document: Document<Vec<Person>> = codec.from_str(r#"{"data":[]}"#).unwrap();
        assert!(document.data.unwrap().is_empty());
    }

    #[test]
    fn test_decode_rejects_repeated_identity() {
        let json = r#"{
            "data": {"type": "people", "id": "1"},
            "included": [{"type": "people", "id": "1"}]
        }"#;
        let err = JsonApiCodec::default().from_str::<Person>(json).unwrap_err();
        assert!(matches!(
            format_error(&err),
            FormatError::DuplicateResource { .. }
        ));
    }

    #[test]
    fn test_decode_duplicate_top_level_member() {
        let json = r#"{"meta":{},"meta":{}}"#;
        let err = JsonApiCodec::default().from_str::<Person>(json).unwrap_err();
        assert_eq!(
            format_error(&err),
            &FormatError::DuplicateMember {
                scope: Scope::Document,
                member: "meta".to_string()
            }
        );
    }

    #[test]
    fn test_decode_type_mismatch() {
        let err = JsonApiCodec::default()
            .from_str::<Person>(r#"{"data":{"type":"robots","id":"1"}}"#)
            .unwrap_err();
        assert!(matches!(format_error(&err), FormatError::TypeMismatch { .. }));
    }

    #[test]
    fn test_decode_errors_document() {
        let json = r#"{"errors":[{"status":422,"title":"Invalid Attribute","source":{"pointer":"/data/attributes/name"}}]}"#;
        let document: Document<Option<Person>> = JsonApiCodec::default().from_str(json).unwrap();
        assert!(document.data.is_none());
        let errors = document.errors.unwrap();
        assert_eq!(errors[0].status.as_deref(), Some("422"));
        assert_eq!(
            errors[0].source.as_ref().unwrap().pointer.as_deref(),
            Some("/data/attributes/name")
        );

        let err = JsonApiCodec::default()
            .from_str::<Person>(r#"{"errors":[]}"#)
            .unwrap_err();
        assert_eq!(format_error(&err), &FormatError::EmptyErrors);
    }

    #[test]
    fn test_decode_checks_jsonapi_version() {
        let err = JsonApiCodec::default()
            .from_str::<Person>(r#"{"meta":{},"jsonapi":{"version":"0.9"}}"#)
            .unwrap_err();
        assert!(err.to_string().contains("minimum required"));

        let document: Document<Person> = JsonApiCodec::default()
            .from_str(r#"{"meta":{"total":0},"jsonapi":{"version":"1.1"}}"#)
            .unwrap();
        assert!(document.data.is_none());
        assert_eq!(document.meta.unwrap()["total"], 0);
    }

    #[test]
    fn test_malformed_json_is_a_json_error() {
        let err = JsonApiCodec::default()
            .from_str::<Person>(r#"{"data": "#)
            .unwrap_err();
        assert!(matches!(err, JsonApiError::Json(_)));
    }
}
