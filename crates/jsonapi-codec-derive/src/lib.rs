//! # JSON:API Derive Macros
//!
//! `#[derive(JsonApiResource)]` generates the `Resource` implementation that
//! registers a struct's members with the `jsonapi-codec` descriptor builder.
//!
//! ## Code Organization
//!
//! - **Derive Macro**: implemented in resource_derive
//! - **Utilities**: attribute parsing shared by the derive in utils

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

mod resource_derive;
mod utils;


/// Derive macro for implementing `jsonapi_codec::Resource`
///
/// # Struct attributes
///
/// - `#[jsonapi(type = "...")]` - Fixed resource type name
/// - `#[jsonapi(constructor = "path::to::fn")]` - Constructor used on read
///   (defaults to `Default::default`)
///
/// # Field attributes
///
/// - `#[jsonapi(id)]`, `#[jsonapi(type)]`, `#[jsonapi(meta)]`, `#[jsonapi(links)]` -
///   Designated members
/// - `#[jsonapi(relationship)]` - Statically typed relationship; fields of type
///   `Relationship<..>` are relationships without the attribute
/// - `#[jsonapi(identifier_only)]` - Write identifiers only, never `included`
/// - `#[jsonapi(rename = "...")]` - Wire name, bypassing the naming policy
/// - `#[jsonapi(ignore = "when_null")]` - Per-member ignore condition
/// - `#[jsonapi(read_only)]`, `#[jsonapi(write_only)]` - One-directional members
/// - `#[jsonapi(skip)]` - Not part of the resource
///
/// Fields of type `serde_json::Value` are classified at write time: a value
/// with string `id` and `type` members (or an array of them) is written as a
/// relationship, anything else as an attribute.
///
/// # Example
///
/// ```rust
/// use jsonapi_codec::{Document, JsonApiResource};
///
/// #[derive(Debug, Default, JsonApiResource)]
/// #[jsonapi(type = "people")]
/// struct Person {
///     #[jsonapi(id)]
///     id: String,
///     #[jsonapi(rename = "first-name")]
///     first_name: String,
/// }
///
/// #[derive(Debug, Default, JsonApiResource)]
/// #[jsonapi(type = "articles")]
/// struct Article {
///     #[jsonapi(id)]
///     id: String,
///     title: String,
///     #[jsonapi(relationship)]
///     author: Option<Person>,
/// }
///
/// let article = Article {
///     id: "1".into(),
///     title: "Rails is Omakase".into(),
///     author: Some(Person { id: "9".into(), first_name: "Dan".into() }),
/// };
/// let value = jsonapi_codec::to_value(&Document::new(article)).unwrap();
/// assert_eq!(value["included"][0]["attributes"]["first-name"], "Dan");
/// ```
#[proc_macro_derive(JsonApiResource, attributes(jsonapi))]
pub fn derive_jsonapi_resource(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    resource_derive::derive_jsonapi_resource_impl(input)
        .unwrap_or_else(|err| err.to_compile_error())
        .into()
}
