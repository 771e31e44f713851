use std::collections::HashMap;

use darling::{FromAttributes as _, util::SpannedValue};
use itertools::Itertools as _;
use lazy_format::lazy_format;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{DataEnum, Fields, Ident, Variant, spanned::Spanned as _};

use crate::{command::RawParsedTypeAttr, common::detect_collision};

fn choice_name(variant: &Variant) -> syn::Result<(String, &Ident)> {
    match variant.fields {
        Fields::Unit => RawParsedTypeAttr::from_attributes(&variant.attrs)?
            .command_name(&variant.ident)
            .map(|name| (name, &variant.ident)),
        _ => Err(syn::Error::new(
            variant.fields.span(),
            "`Choice` variants can't have fields",
        )),
    }
}

/// `#[derive(Choice)]`: a fieldless enum that parses from a fixed set of
/// kebab-case spellings.
pub fn derive_choice_enum(
    ident: &Ident,
    data: &DataEnum,
    generics: &syn::Generics,
) -> syn::Result<TokenStream2> {
    if !generics.params.is_empty() {
        return Err(syn::Error::new(
            generics.span(),
            "can't derive `Choice` on a generic type",
        ));
    }

    let variants: Vec<(String, &Ident)> = data
        .variants
        .iter()
        .map(choice_name)
        .try_collect()?;

    if variants.is_empty() {
        return Err(syn::Error::new(
            ident.span(),
            "a `Choice` enum needs at least one variant",
        ));
    }

    let mut known = HashMap::new();

    for (name, variant) in &variants {
        detect_collision(
            &mut known,
            Some(SpannedValue::new(name.as_str(), variant.span())),
            |name| lazy_format!("choice `{name}`"),
        )?;
    }

    let names: Vec<&str> = variants.iter().map(|(name, _)| name.as_str()).collect();
    let expected = format!(
        "must be one of {}",
        names.iter().map(|name| format!("`{name}`")).join(", ")
    );

    let arms = variants.iter().map(|(name, variant)| {
        quote! {
            #name => ::core::result::Result::Ok(Self::#variant),
        }
    });

    Ok(quote! {
        impl ::arbor::Parameter for #ident {
            const TYPE: ::arbor::ValueType = ::arbor::ValueType::String;

            fn choices() -> ::core::option::Option<&'static [&'static str]> {
                ::core::option::Option::Some(&[ #(#names,)* ])
            }

            fn from_arg(
                arg: &str,
            ) -> ::core::result::Result<Self, ::std::string::String> {
                match arg {
                    #(#arms)*
                    _ => ::core::result::Result::Err(::std::string::String::from(#expected)),
                }
            }
        }
    })
}
