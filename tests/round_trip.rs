//! Write-then-read equality for resource graphs

mod test_helpers;

use jsonapi_codec::{Document, JsonApiResource, Links, Meta, Relationship};
use serde_json::{Value, json};
use test_helpers::*;

#[derive(Debug, Default, Clone, PartialEq, JsonApiResource)]
#[jsonapi(type = "reviews")]
struct Review {
    #[jsonapi(id)]
    id: String,
    rating: u8,
    #[jsonapi(relationship, identifier_only)]
    reviewer: Option<Person>,
}

fn meta(value: Value) -> Meta {
    match value {
        Value::Object(map) => map,
        _ => panic!("meta must be an object"),
    }
}

fn included_keys(value: &Value) -> Vec<(String, String)> {
    value["included"]
        .as_array()
        .map(|included| {
            included
                .iter()
                .map(|resource| {
                    (
                        resource["type"].as_str().unwrap().to_string(),
                        resource["id"].as_str().unwrap().to_string(),
                    )
                })
                .collect()
        })
        .unwrap_or_default()
}

#[test]
fn test_article_graph_round_trip() {
    init_tracing();
    let article = sample_article();
    let json = jsonapi_codec::to_string(&Document::new(article.clone())).unwrap();
    let decoded: Document<Article> = jsonapi_codec::from_str(&json).unwrap();
    assert_eq!(decoded.data, Some(article));
}

#[test]
fn test_included_is_deduplicated_and_ordered() {
    let value = jsonapi_codec::to_value(&Document::new(sample_article())).unwrap();
    assert_eq!(
        included_keys(&value),
        vec![
            ("people".to_string(), "9".to_string()),
            ("comments".to_string(), "5".to_string()),
            ("comments".to_string(), "12".to_string()),
            ("tags".to_string(), "t1".to_string()),
            ("people".to_string(), "2".to_string()),
        ]
    );
    assert_eq!(value["data"]["links"]["self"], "http://example.com/articles/1");
    assert_eq!(
        value["data"]["relationships"]["author"]["data"],
        json!({"id": "9", "type": "people"})
    );
}

#[test]
fn test_rewriting_a_read_document_is_stable() {
    let first = jsonapi_codec::to_value(&Document::new(sample_article())).unwrap();
    let decoded: Document<Article> = jsonapi_codec::from_value(first.clone()).unwrap();
    let second = jsonapi_codec::to_value(&decoded).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_collection_round_trip_shares_included() {
    let dan = person("9", "Dan", "Gebhardt");
    let articles = vec![
        Article {
            id: "1".into(),
            title: "One".into(),
            author: Some(dan.clone()),
            ..Article::default()
        },
        Article {
            id: "2".into(),
            title: "Two".into(),
            author: Some(dan),
            ..Article::default()
        },
    ];
    let value = jsonapi_codec::to_value(&Document::new(articles.clone())).unwrap();
    assert_eq!(value["data"].as_array().unwrap().len(), 2);
    assert_eq!(
        included_keys(&value),
        vec![("people".to_string(), "9".to_string())]
    );

    let decoded: Document<Vec<Article>> = jsonapi_codec::from_value(value).unwrap();
    assert_eq!(decoded.data, Some(articles));
}

#[test]
fn test_relationship_wrapper_keeps_links_and_meta() {
    let mut article = sample_article();
    article.tags = Relationship::new(vec![tag("t1", "api"), tag("t2", "rust")])
        .with_links(Links::new().with("related", "http://example.com/articles/1/tags"))
        .with_meta(meta(json!({"count": 2})));

    let value = jsonapi_codec::to_value(&Document::new(article.clone())).unwrap();
    let tags = &value["data"]["relationships"]["tags"];
    assert_eq!(tags["links"]["related"], "http://example.com/articles/1/tags");
    assert_eq!(tags["meta"]["count"], 2);
    assert_eq!(tags["data"].as_array().unwrap().len(), 2);

    let decoded: Document<Article> = jsonapi_codec::from_value(value).unwrap();
    assert_eq!(decoded.data.unwrap().tags, article.tags);
}

#[test]
fn test_links_only_relationship() {
    let mut article = sample_article();
    article.tags = Relationship::from_links(
        Links::new().with("related", "http://example.com/articles/1/tags"),
    );

    let value = jsonapi_codec::to_value(&Document::new(article.clone())).unwrap();
    let tags = &value["data"]["relationships"]["tags"];
    assert!(tags.get("data").is_none());
    assert!(
        !included_keys(&value)
            .iter()
            .any(|(resource_type, _)| resource_type == "tags")
    );

    let decoded: Document<Article> = jsonapi_codec::from_value(value).unwrap();
    let tags = decoded.data.unwrap().tags;
    assert!(tags.data.is_none());
    assert_eq!(tags.links, article.tags.links);
}

#[test]
fn test_identifier_only_relationship() {
    let review = Review {
        id: "r1".into(),
        rating: 4,
        reviewer: Some(person("9", "Dan", "Gebhardt")),
    };
    let value = jsonapi_codec::to_value(&Document::new(review)).unwrap();
    assert_eq!(
        value["data"]["relationships"]["reviewer"]["data"],
        json!({"id": "9", "type": "people"})
    );
    assert!(value.get("included").is_none());

    let decoded: Document<Review> = jsonapi_codec::from_value(value).unwrap();
    let reviewer = decoded.data.unwrap().reviewer.unwrap();
    assert_eq!(reviewer, Person {
        id: "9".into(),
        ..Person::default()
    });
}

#[test]
fn test_dynamic_members_round_trip() {
    let note = Note {
        id: "n1".into(),
        subject: json!("groceries"),
        payload: json!({"id": "3", "type": "people", "first_name": "Ana"}),
        owner: json!({"id": "9", "type": "people"}),
    };
    let value = jsonapi_codec::to_value(&Document::new(note.clone())).unwrap();
    assert_eq!(value["data"]["attributes"]["subject"], "groceries");
    assert_eq!(
        value["data"]["relationships"]["payload"]["data"],
        json!({"id": "3", "type": "people"})
    );
    assert_eq!(
        included_keys(&value),
        vec![("people".to_string(), "3".to_string())]
    );
    assert_eq!(value["included"][0]["attributes"]["first_name"], "Ana");

    let decoded: Document<Note> = jsonapi_codec::from_value(value).unwrap();
    assert_eq!(decoded.data, Some(note));
}

#[test]
fn test_document_members_round_trip() {
    let document = Document::new(vec![tag("t1", "api")])
        .with_meta(meta(json!({"total": 1})))
        .with_links(Links::new().with("self", "http://example.com/tags"));
    let json = jsonapi_codec::to_string_pretty(&document).unwrap();
    let decoded: Document<Vec<Tag>> = jsonapi_codec::from_str(&json).unwrap();
    assert_eq!(decoded, document);
}

#[test]
fn test_bytes_and_reader_entry_points() {
    let document = Document::new(person("9", "Dan", "Gebhardt"));
    let bytes = jsonapi_codec::to_vec(&document).unwrap();
    let from_slice: Document<Person> = jsonapi_codec::from_slice(&bytes).unwrap();
    let from_reader: Document<Person> = jsonapi_codec::from_reader(bytes.as_slice()).unwrap();
    assert_eq!(from_slice, document);
    assert_eq!(from_reader, document);

    let mut written = Vec::new();
    jsonapi_codec::to_writer(&mut written, &document).unwrap();
    assert_eq!(written, bytes);
}
