//! Shared resource model for the integration tests
//!
//! The classic JSON:API blog: articles with an author and comments, comments
//! with their own author, and tags reached through a `Relationship` wrapper.

#![allow(dead_code)]

use std::sync::Arc;

use jsonapi_codec::{JsonApiResource, Links, Meta, Relationship};
use serde_json::Value;
use tracing_subscriber::EnvFilter;

/// Install a test-writer subscriber honouring `RUST_LOG`; repeated calls are no-ops
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

#[derive(Debug, Default, Clone, PartialEq, JsonApiResource)]
#[jsonapi(type = "people")]
pub struct Person {
    #[jsonapi(id)]
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub twitter: Option<String>,
}

#[derive(Debug, Default, Clone, PartialEq, JsonApiResource)]
#[jsonapi(type = "comments")]
pub struct Comment {
    #[jsonapi(id)]
    pub id: String,
    pub body: String,
    #[jsonapi(relationship)]
    pub author: Option<Person>,
}

#[derive(Debug, Default, Clone, PartialEq, JsonApiResource)]
#[jsonapi(type = "tags")]
pub struct Tag {
    #[jsonapi(id)]
    pub id: String,
    pub label: String,
}

#[derive(Debug, Default, Clone, PartialEq, JsonApiResource)]
#[jsonapi(type = "articles")]
pub struct Article {
    #[jsonapi(id)]
    pub id: String,
    pub title: String,
    #[jsonapi(relationship)]
    pub author: Option<Person>,
    #[jsonapi(relationship)]
    pub comments: Vec<Comment>,
    pub tags: Relationship<Vec<Tag>>,
    #[jsonapi(meta)]
    pub meta: Option<Meta>,
    #[jsonapi(links)]
    pub links: Option<Links>,
}

/// A resource whose type is carried per instance
#[derive(Debug, Default, Clone, PartialEq, JsonApiResource)]
pub struct Node {
    #[jsonapi(id)]
    pub id: Option<String>,
    #[jsonapi(type)]
    pub kind: String,
    pub title: String,
}

/// Self-referencing graph through shared targets
#[derive(Debug, Default, JsonApiResource)]
#[jsonapi(type = "employees")]
pub struct Employee {
    #[jsonapi(id)]
    pub id: String,
    pub name: String,
    #[jsonapi(relationship)]
    pub manager: Option<Arc<Employee>>,
    #[jsonapi(relationship)]
    pub reports: Vec<Arc<Employee>>,
}

/// Dynamically typed members
#[derive(Debug, Default, Clone, PartialEq, JsonApiResource)]
#[jsonapi(type = "notes")]
pub struct Note {
    #[jsonapi(id)]
    pub id: String,
    pub subject: Value,
    pub payload: Value,
    #[jsonapi(identifier_only)]
    pub owner: Value,
}

pub fn person(id: &str, first_name: &str, last_name: &str) -> Person {
    Person {
        id: id.to_string(),
        first_name: first_name.to_string(),
        last_name: last_name.to_string(),
        twitter: None,
    }
}

pub fn comment(id: &str, body: &str, author: Person) -> Comment {
    Comment {
        id: id.to_string(),
        body: body.to_string(),
        author: Some(author),
    }
}

pub fn tag(id: &str, label: &str) -> Tag {
    Tag {
        id: id.to_string(),
        label: label.to_string(),
    }
}

/// The article from the JSON:API compound document example
pub fn sample_article() -> Article {
    let dan = person("9", "Dan", "Gebhardt");
    Article {
        id: "1".to_string(),
        title: "JSON:API paints my bikeshed!".to_string(),
        author: Some(dan.clone()),
        comments: vec![
            comment("5", "First!", person("2", "Ana", "Lee")),
            comment("12", "I like XML better", dan),
        ],
        tags: Relationship::new(vec![tag("t1", "api")]),
        meta: None,
        links: Some(Links::new().with("self", "http://example.com/articles/1")),
    }
}
