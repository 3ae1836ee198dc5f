//! Implementation of #[derive(JsonApiResource)]

use proc_macro2::TokenStream;
use quote::{ToTokens, quote};
use syn::spanned::Spanned;
use syn::{Data, DeriveInput, Fields, Result};

use crate::utils::{
    FieldRole, extract_field_meta, extract_resource_meta, ignore_condition, is_json_value,
    is_relationship_wrapper,
};

pub fn derive_jsonapi_resource_impl(input: DeriveInput) -> Result<TokenStream> {
    let struct_name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();
    let resource_meta = extract_resource_meta(&input.attrs)?;

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    &input,
                    "JsonApiResource requires a struct with named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                &input,
                "JsonApiResource can only be derived for structs",
            ));
        }
    };

    let mut registrations = Vec::new();
    let mut has_type_member = false;

    if let Some(resource_type) = &resource_meta.resource_type {
        registrations.push(quote! {
            builder.resource_type(#resource_type);
        });
    }

    let constructor = match &resource_meta.constructor {
        Some(path) => path.to_token_stream(),
        None => quote!(<Self as ::core::default::Default>::default),
    };
    registrations.push(quote! {
        builder.constructor(#constructor);
    });

    for field in fields {
        let meta = extract_field_meta(field)?;
        if meta.skip {
            continue;
        }
        let Some(ident) = &field.ident else {
            continue;
        };
        let ty = &field.ty;

        match meta.role {
            FieldRole::Id => registrations.push(quote! {
                builder.id(
                    |r| ::jsonapi_codec::IdValue::as_id(&r.#ident),
                    |r, id| r.#ident = ::jsonapi_codec::IdValue::from_id(id),
                );
            }),
            FieldRole::Type => {
                has_type_member = true;
                registrations.push(quote! {
                    builder.type_member(|r| r.#ident.as_str(), |r, t| r.#ident = t);
                });
            }
            FieldRole::Meta => registrations.push(quote! {
                builder.meta(|r| r.#ident.as_ref(), |r, m| r.#ident = ::core::option::Option::Some(m));
            }),
            FieldRole::Links => registrations.push(quote! {
                builder.links(|r| r.#ident.as_ref(), |r, l| r.#ident = ::core::option::Option::Some(l));
            }),
            FieldRole::Relationship | FieldRole::Member => {
                let name = ident.to_string();
                let name = name.strip_prefix("r#").unwrap_or(&name);
                let relationship = meta.role == FieldRole::Relationship || is_relationship_wrapper(ty);

                let member = if relationship {
                    if meta.write_only {
                        return Err(syn::Error::new_spanned(
                            field,
                            "write_only is not supported on relationships",
                        ));
                    }
                    if meta.read_only {
                        quote!(builder.read_only_relationship::<#ty>(#name, |r| &r.#ident))
                    } else {
                        quote!(builder.relationship::<#ty>(#name, |r| &r.#ident, |r, v| r.#ident = v))
                    }
                } else if is_json_value(ty) {
                    if meta.read_only || meta.write_only {
                        return Err(syn::Error::new_spanned(
                            field,
                            "read_only and write_only are not supported on dynamically typed members",
                        ));
                    }
                    quote!(builder.potential(#name, |r| &r.#ident, |r, v| r.#ident = v))
                } else if meta.read_only {
                    quote!(builder.read_only_attribute::<#ty>(#name, |r| &r.#ident))
                } else if meta.write_only {
                    quote!(builder.write_only_attribute::<#ty>(#name, |r, v| r.#ident = v))
                } else {
                    quote!(builder.attribute::<#ty>(#name, |r| &r.#ident, |r, v| r.#ident = v))
                };

                let mut options = Vec::new();
                if let Some(rename) = &meta.rename {
                    options.push(quote!(.rename(#rename)));
                }
                if let Some(ignore) = &meta.ignore {
                    let condition = ignore_condition(ignore, field.span())?;
                    options.push(quote!(.ignore(#condition)));
                }
                if meta.identifier_only {
                    options.push(quote!(.identifier_only()));
                }
                registrations.push(quote! {
                    #member #(#options)*;
                });
            }
        }
    }

    if resource_meta.resource_type.is_none() && !has_type_member {
        return Err(syn::Error::new_spanned(
            struct_name,
            "JsonApiResource needs #[jsonapi(type = \"...\")] on the struct or a #[jsonapi(type)] field",
        ));
    }

    let expanded = quote! {
        #[automatically_derived]
        impl #impl_generics ::jsonapi_codec::Resource for #struct_name #ty_generics #where_clause {
            fn describe(builder: &mut ::jsonapi_codec::DescriptorBuilder<Self>) {
                #(#registrations)*
            }
        }
    };

    Ok(expanded)
}
