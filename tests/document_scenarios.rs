//! Document-level scenarios: presence rules, versions, and the reference
//! documents from the JSON:API specification

mod test_helpers;

use jsonapi_codec::{Document, FormatError, JsonApiError, Scope};
use serde_json::json;
use test_helpers::*;

fn decode_error<D: jsonapi_codec::PrimaryData + std::fmt::Debug>(json: &str) -> JsonApiError {
    jsonapi_codec::from_str::<D>(json).expect_err("document should be rejected")
}

mod scenarios {
    use super::*;

    #[test]
    fn test_simple_resource() {
        init_tracing();
        let json = r#"{"data":{"type":"articles","id":"1","attributes":{"title":"Jsonapi"}}}"#;
        let document: Document<Node> = jsonapi_codec::from_str(json).unwrap();
        let node = document.data.unwrap();
        assert_eq!(node.id.as_deref(), Some("1"));
        assert_eq!(node.kind, "articles");
        assert_eq!(node.title, "Jsonapi");
    }

    #[test]
    fn test_compound_document_populates_author() {
        let json = json!({
            "data": {
                "type": "articles",
                "id": "1",
                "attributes": {"title": "JSON:API paints my bikeshed!"},
                "relationships": {
                    "author": {
                        "links": {
                            "self": "http://example.com/articles/1/relationships/author",
                            "related": "http://example.com/articles/1/author"
                        },
                        "data": {"type": "people", "id": "9"}
                    },
                    "comments": {
                        "data": [
                            {"type": "comments", "id": "5"},
                            {"type": "comments", "id": "12"}
                        ]
                    }
                },
                "links": {"self": "http://example.com/articles/1"}
            },
            "included": [
                {
                    "type": "people",
                    "id": "9",
                    "attributes": {"first_name": "Dan", "last_name": "Gebhardt", "twitter": "dgeb"},
                    "links": {"self": "http://example.com/people/9"}
                },
                {
                    "type": "comments",
                    "id": "5",
                    "attributes": {"body": "First!"},
                    "relationships": {"author": {"data": {"type": "people", "id": "2"}}}
                },
                {
                    "type": "comments",
                    "id": "12",
                    "attributes": {"body": "I like XML better"},
                    "relationships": {"author": {"data": {"type": "people", "id": "9"}}}
                }
            ]
        });

        let document: Document<Article> = jsonapi_codec::from_value(json).unwrap();
        let article = document.data.unwrap();
        let author = article.author.as_ref().unwrap();
        assert_eq!(author.first_name, "Dan");
        assert_eq!(author.twitter.as_deref(), Some("dgeb"));
        assert_eq!(article.comments.len(), 2);
        assert_eq!(article.comments[1].author.as_ref(), Some(author));

        // people/2 is never included: only the identifier is known
        let ana = article.comments[0].author.as_ref().unwrap();
        assert_eq!(ana.id, "2");
        assert!(ana.first_name.is_empty());
        assert_eq!(
            article.links.unwrap().self_link().map(|link| link.href()),
            Some("http://example.com/articles/1")
        );
    }

    #[test]
    fn test_null_data() {
        let document: Document<Option<Article>> = jsonapi_codec::from_str(r#"{"data": null}"#).unwrap();
        assert_eq!(document.data, Some(None));

        let document: Document<Article> = jsonapi_codec::from_str(r#"{"data": null}"#).unwrap();
        assert!(document.data.is_none());
        assert!(document.errors.is_none());
    }

    #[test]
    fn test_empty_array_data() {
        let document: Document<Vec<Article>> = jsonapi_codec::from_str(r#"{"data": []}"#).unwrap();
        assert_eq!(document.data, Some(Vec::new()));
    }

    #[test]
    fn test_meta_only_document() {
        let document: Document<Option<Article>> =
            jsonapi_codec::from_str(r#"{"meta": {"copyright": "Copyright 2015 Example Corp."}}"#).unwrap();
        assert!(document.data.is_none());
        assert_eq!(
            document.meta.unwrap()["copyright"],
            "Copyright 2015 Example Corp."
        );
    }

    #[test]
    fn test_error_document_round_trip() {
        let json = r#"{"errors":[{"status":"422","source":{"pointer":"/data/attributes/firstName"},"title":"Invalid Attribute","detail":"First name must contain at least two characters."}],"jsonapi":{"version":"1.1"}}"#;
        let document: Document<Option<Person>> = jsonapi_codec::from_str(json).unwrap();
        assert!(document.is_error());
        let written = jsonapi_codec::to_value(&document).unwrap();
        assert_eq!(written["errors"][0]["title"], "Invalid Attribute");
        assert_eq!(written["errors"][0]["source"]["pointer"], "/data/attributes/firstName");
        assert_eq!(written["jsonapi"]["version"], "1.1");
        assert!(written.get("data").is_none());
    }
}

mod presence {
    use super::*;

    #[test]
    fn test_data_and_errors() {
        let err = decode_error::<Option<Article>>(
            r#"{"data": null, "errors": [{"title": "Boom"}]}"#,
        );
        assert!(
            err.to_string()
                .contains("must not contain both 'data' and 'errors'"),
            "{err}"
        );
    }

    #[test]
    fn test_no_top_level_member() {
        let err = decode_error::<Option<Article>>(r#"{"links": {"self": "/articles"}}"#);
        assert!(
            err.to_string().contains("must contain 'data', 'errors' or 'meta'"),
            "{err}"
        );
    }

    #[test]
    fn test_included_without_data() {
        let err = decode_error::<Option<Article>>(
            r#"{"meta": {}, "included": [{"type": "people", "id": "9"}]}"#,
        );
        assert!(
            err.to_string().contains("'data' member if 'included'"),
            "{err}"
        );
    }

    #[test]
    fn test_duplicate_type_in_resource() {
        let err = decode_error::<Node>(r#"{"data": {"type": "articles", "type": "people", "id": "1"}}"#);
        assert_eq!(
            err.as_format(),
            Some(&FormatError::DuplicateMember {
                scope: Scope::Resource,
                member: "type".to_string()
            })
        );
        assert!(err.to_string().contains("duplicate member 'type'"));
    }

    #[test]
    fn test_duplicate_attribute() {
        let err = decode_error::<Article>(
            r#"{"data": {"type": "articles", "id": "1", "attributes": {"title": "a", "title": "b"}}}"#,
        );
        assert!(matches!(
            err.as_format(),
            Some(FormatError::DuplicateMember {
                scope: Scope::Attributes,
                ..
            })
        ));
    }

    #[test]
    fn test_resource_requires_type() {
        let err = decode_error::<Article>(r#"{"data": {"id": "1"}}"#);
        assert!(err.to_string().contains("must contain a 'type' member"), "{err}");
    }

    #[test]
    fn test_identifier_requires_id() {
        let err = decode_error::<Article>(
            r#"{"data": {"type": "articles", "id": "1", "relationships": {"author": {"data": {"type": "people"}}}}}"#,
        );
        assert!(matches!(
            err.as_format(),
            Some(FormatError::MissingId {
                scope: Scope::Identifier
            })
        ));
    }

    #[test]
    fn test_empty_relationship_object() {
        let err = decode_error::<Article>(
            r#"{"data": {"type": "articles", "id": "1", "relationships": {"author": {}}}}"#,
        );
        assert!(
            err.to_string()
                .contains("must contain 'links', 'data' or 'meta'"),
            "{err}"
        );
    }

    #[test]
    fn test_write_side_presence() {
        let document: Document<Option<Article>> = Document::default();
        let err = jsonapi_codec::to_string(&document).unwrap_err();
        assert!(err.to_string().contains("must contain 'data', 'errors' or 'meta'"));
    }
}

mod versions {
    use super::*;

    #[test]
    fn test_version_below_minimum() {
        let err = decode_error::<Option<Article>>(r#"{"meta": {}, "jsonapi": {"version": "0.9"}}"#);
        assert!(err.to_string().contains("minimum required"), "{err}");
    }

    #[test]
    fn test_version_invalid() {
        let err = decode_error::<Option<Article>>(r#"{"meta": {}, "jsonapi": {"version": "1.#.0"}}"#);
        assert!(err.to_string().contains("invalid"), "{err}");
    }

    #[test]
    fn test_version_accepted() {
        let document: Document<Option<Article>> =
            jsonapi_codec::from_str(r#"{"meta": {}, "jsonapi": {"version": "1.0"}}"#).unwrap();
        assert_eq!(document.jsonapi.unwrap().version.as_deref(), Some("1.0"));
    }
}

mod malformed {
    use super::*;

    #[test]
    fn test_invalid_json_text() {
        let err = decode_error::<Article>(r#"{"data": {"type": "articles",}"#);
        assert!(matches!(err, JsonApiError::Json(_)));
    }

    #[test]
    fn test_trailing_characters() {
        let err = decode_error::<Option<Article>>(r#"{"meta": {}} extra"#);
        assert!(matches!(err, JsonApiError::Json(_)));
    }

    #[test]
    fn test_scalar_document() {
        let err = decode_error::<Article>("42");
        assert!(matches!(
            err.as_format(),
            Some(FormatError::UnexpectedShape { .. })
        ));
    }

    #[test]
    fn test_non_string_type() {
        let err = decode_error::<Article>(r#"{"data": {"type": 7, "id": "1"}}"#);
        assert!(matches!(
            err.as_format(),
            Some(FormatError::NotAString { member: "type", .. })
        ));
    }

    #[test]
    fn test_invalid_attribute_value() {
        let err = decode_error::<Article>(
            r#"{"data": {"type": "articles", "id": "1", "attributes": {"title": 12}}}"#,
        );
        assert!(matches!(
            err.as_format(),
            Some(FormatError::InvalidAttribute { member, .. }) if member == "title"
        ));
    }
}
