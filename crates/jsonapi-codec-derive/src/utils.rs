//! Attribute parsing for `#[jsonapi(...)]`

use proc_macro2::{Span, TokenStream};
use quote::quote;
use syn::{Attribute, Field, LitStr, Path, Result, Type};

/// Struct-level settings
#[derive(Debug, Default)]
pub struct ResourceMeta {
    /// Fixed resource type name
    pub resource_type: Option<String>,
    /// Constructor path; `Default::default` when absent
    pub constructor: Option<Path>,
}

pub fn extract_resource_meta(attrs: &[Attribute]) -> Result<ResourceMeta> {
    let mut meta = ResourceMeta::default();

    for attr in attrs {
        if !attr.path().is_ident("jsonapi") {
            continue;
        }
        attr.parse_nested_meta(|nested| {
            if nested.path.is_ident("type") || nested.path.is_ident("resource_type") {
                let value: LitStr = nested.value()?.parse()?;
                if value.value().is_empty() {
                    return Err(nested.error("resource type name must not be empty"));
                }
                meta.resource_type = Some(value.value());
            } else if nested.path.is_ident("constructor") {
                let value: LitStr = nested.value()?.parse()?;
                meta.constructor = Some(value.parse()?);
            } else {
                return Err(nested.error("unknown #[jsonapi] struct attribute"));
            }
            Ok(())
        })?;
    }

    Ok(meta)
}

/// Designated role of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FieldRole {
    /// Attribute, or a potential relationship for `serde_json::Value` fields
    #[default]
    Member,
    Id,
    Type,
    Meta,
    Links,
    Relationship,
}

/// Field-level settings
#[derive(Debug, Default)]
pub struct FieldMeta {
    pub role: FieldRole,
    pub rename: Option<String>,
    pub skip: bool,
    pub ignore: Option<String>,
    pub read_only: bool,
    pub write_only: bool,
    pub identifier_only: bool,
}

pub fn extract_field_meta(field: &Field) -> Result<FieldMeta> {
    let mut meta = FieldMeta::default();

    for attr in &field.attrs {
        if !attr.path().is_ident("jsonapi") {
            continue;
        }
        attr.parse_nested_meta(|nested| {
            let role = if nested.path.is_ident("id") {
                Some(FieldRole::Id)
            } else if nested.path.is_ident("type") {
                Some(FieldRole::Type)
            } else if nested.path.is_ident("meta") {
                Some(FieldRole::Meta)
            } else if nested.path.is_ident("links") {
                Some(FieldRole::Links)
            } else if nested.path.is_ident("relationship") {
                Some(FieldRole::Relationship)
            } else if nested.path.is_ident("attribute") {
                Some(FieldRole::Member)
            } else {
                None
            };
            if let Some(role) = role {
                if meta.role != FieldRole::Member && meta.role != role {
                    return Err(nested.error("field already has a #[jsonapi] role"));
                }
                meta.role = role;
                return Ok(());
            }

            if nested.path.is_ident("rename") {
                let value: LitStr = nested.value()?.parse()?;
                meta.rename = Some(value.value());
            } else if nested.path.is_ident("skip") {
                meta.skip = true;
            } else if nested.path.is_ident("ignore") {
                let value: LitStr = nested.value()?.parse()?;
                meta.ignore = Some(value.value());
            } else if nested.path.is_ident("read_only") {
                meta.read_only = true;
            } else if nested.path.is_ident("write_only") {
                meta.write_only = true;
            } else if nested.path.is_ident("identifier_only") {
                meta.identifier_only = true;
            } else {
                return Err(nested.error("unknown #[jsonapi] field attribute"));
            }
            Ok(())
        })?;
    }

    if meta.read_only && meta.write_only {
        return Err(syn::Error::new_spanned(
            field,
            "a field cannot be both read_only and write_only",
        ));
    }
    Ok(meta)
}

/// Map an `ignore = "..."` value to an `IgnoreCondition` expression
pub fn ignore_condition(value: &str, span: Span) -> Result<TokenStream> {
    let variant = match value {
        "never" => quote!(Never),
        "when_null" => quote!(WhenNull),
        "when_default" => quote!(WhenDefault),
        "always" => quote!(Always),
        other => {
            return Err(syn::Error::new(
                span,
                format!(
                    "unknown ignore condition '{}', expected never, when_null, when_default or always",
                    other
                ),
            ));
        }
    };
    Ok(quote!(::jsonapi_codec::IgnoreCondition::#variant))
}

/// Whether the type is `serde_json::Value` (or a bare `Value`)
pub fn is_json_value(ty: &Type) -> bool {
    let Type::Path(type_path) = ty else {
        return false;
    };
    if type_path.qself.is_some() {
        return false;
    }
    let mut idents = type_path
        .path
        .segments
        .iter()
        .map(|segment| segment.ident.to_string());
    match (idents.next(), idents.next(), idents.next()) {
        (Some(name), None, None) => name == "Value",
        (Some(krate), Some(name), None) => krate == "serde_json" && name == "Value",
        _ => false,
    }
}

/// Whether the type is the `Relationship<..>` wrapper
pub fn is_relationship_wrapper(ty: &Type) -> bool {
    let Type::Path(type_path) = ty else {
        return false;
    };
    type_path
        .path
        .segments
        .last()
        .is_some_and(|segment| segment.ident == "Relationship")
}
