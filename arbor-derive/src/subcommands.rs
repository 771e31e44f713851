use std::collections::HashMap;

use darling::{FromAttributes as _, util::SpannedValue};
use itertools::Itertools as _;
use lazy_format::lazy_format;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{DataEnum, Fields, Ident, Type, Variant, spanned::Spanned as _};

use crate::{
    command::RawParsedTypeAttr,
    common::{compute_docs, detect_collision},
};

/// One subcommand: either a `Variant(Command)` newtype, or a unit variant,
/// which is a subcommand that takes no arguments at all.
struct ParsedVariant<'a> {
    ident: &'a Ident,
    name: String,
    docs: String,
    command: Option<&'a Type>,
}

impl<'a> ParsedVariant<'a> {
    fn from_variant(variant: &'a Variant) -> syn::Result<Self> {
        let name = RawParsedTypeAttr::from_attributes(&variant.attrs)?.command_name(&variant.ident)?;
        let docs = compute_docs(&variant.attrs)?;

        let command = match variant.fields {
            Fields::Unit => None,
            Fields::Unnamed(ref fields) => Some(
                &fields
                    .unnamed
                    .iter()
                    .exactly_one()
                    .map_err(|_| {
                        syn::Error::new(
                            fields.span(),
                            "subcommand variants must have exactly one field",
                        )
                    })?
                    .ty,
            ),
            Fields::Named(ref fields) => {
                return Err(syn::Error::new(
                    fields.span(),
                    "subcommand variants must be newtypes around a `Command`; \
                     put the fields in their own struct",
                ));
            }
        };

        Ok(Self {
            ident: &variant.ident,
            name,
            docs,
            command,
        })
    }

    fn schema(&self) -> TokenStream2 {
        let name = self.name.as_str();

        let schema = match self.command {
            Some(ty) => quote! {
                <#ty as ::arbor::Command>::schema().named(#name)
            },
            None => quote! { ::arbor::schema::Schema::new(#name) },
        };

        let docs = self.docs.as_str();
        let docs = (!docs.is_empty()).then(|| quote! { .describe(#docs) });

        quote! { #schema #docs }
    }

    fn arm(&self, bound: &Ident) -> TokenStream2 {
        let name = self.name.as_str();
        let ident = self.ident;

        let body = match self.command {
            Some(ty) => quote! {
                <#ty as ::arbor::FromBound>::from_bound(#bound).map(Self::#ident)
            },
            None => quote! {
                ::core::result::Result::Ok(Self::#ident)
            },
        };

        quote! {
            if #bound.name() == #name {
                return #body;
            }
        }
    }
}

pub fn derive_subcommands_enum(
    ident: &Ident,
    data: &DataEnum,
    generics: &syn::Generics,
) -> syn::Result<TokenStream2> {
    if !generics.params.is_empty() {
        return Err(syn::Error::new(
            generics.span(),
            "can't derive `Subcommands` on a generic type",
        ));
    }

    let variants: Vec<ParsedVariant> = data
        .variants
        .iter()
        .map(ParsedVariant::from_variant)
        .try_collect()?;

    if variants.is_empty() {
        return Err(syn::Error::new(
            ident.span(),
            "a subcommand enum needs at least one variant",
        ));
    }

    let mut names = HashMap::new();

    for (variant, parsed) in data.variants.iter().zip(&variants) {
        detect_collision(
            &mut names,
            Some(SpannedValue::new(parsed.name.as_str(), variant.span())),
            |name| lazy_format!("subcommand name `{name}`"),
        )?;
    }

    let schemas = variants.iter().map(ParsedVariant::schema);
    let bound = Ident::new("bound", ident.span());
    let arms = variants.iter().map(|variant| variant.arm(&bound));

    Ok(quote! {
        impl ::arbor::Subcommands for #ident {
            fn variants() -> ::std::vec::Vec<::arbor::schema::Schema> {
                ::std::vec![ #(#schemas,)* ]
            }

            fn from_variant(
                #bound: &::arbor::Bound<'_>,
            ) -> ::core::result::Result<Self, ::arbor::ValueErrors> {
                #(#arms)*

                ::core::result::Result::Err(#bound.unknown_variant())
            }
        }
    })
}
