use std::{
    collections::{HashMap, hash_map::Entry},
    fmt::Display,
    hash::Hash,
};

use darling::util::SpannedValue;
use itertools::Itertools as _;
use lazy_format::lazy_format;
use proc_macro2::{Span, TokenStream as TokenStream2};
use quote::ToTokens;
use syn::{
    Attribute, Expr, GenericArgument, Ident, PathArguments, Type, TypePath,
    spanned::Spanned as _,
};

pub struct IdentString<'a> {
    raw: &'a Ident,
    string: String,
}

impl<'a> IdentString<'a> {
    pub fn new(ident: &'a Ident) -> Self {
        let string = ident.to_string();

        Self {
            string: match string.strip_prefix("r#") {
                Some(stripped) => stripped.to_owned(),
                None => string,
            },
            raw: ident,
        }
    }

    pub fn as_str(&self) -> &str {
        self.string.as_str()
    }

    pub fn raw(&self) -> &'a Ident {
        self.raw
    }

    pub fn span(&self) -> Span {
        self.raw.span()
    }
}

impl ToTokens for IdentString<'_> {
    fn to_tokens(&self, tokens: &mut TokenStream2) {
        self.raw.to_tokens(tokens);
    }
}

/// Collect the `///` doc comments on an item into a single description.
/// Leading whitespace on each line, left behind by the comment syntax, is
/// trimmed.
pub fn compute_docs(attrs: &[Attribute]) -> syn::Result<String> {
    let lines: Vec<String> = attrs
        .iter()
        .filter_map(|attr| match attr.meta {
            syn::Meta::NameValue(ref meta) => Some(meta),
            _ => None,
        })
        .filter(|meta| meta.path.is_ident("doc"))
        .map(|meta| match meta.value {
            Expr::Lit(ref lit) => match lit.lit {
                syn::Lit::Str(ref lit) => Ok(lit.value()),
                _ => Err(syn::Error::new(meta.span(), "malformed #[doc] attribute")),
            },
            Expr::Macro(ref expr) => Err(syn::Error::new(
                expr.span(),
                "macro #[doc] attributes aren't supported",
            )),
            _ => Err(syn::Error::new(meta.span(), "malformed #[doc] attribute")),
        })
        .map_ok(|line| line.trim().to_owned())
        .try_collect()?;

    Ok(lines.join("\n").trim().to_owned())
}

/// Check that a short alias can be typed as `-c`
pub fn compute_short(short: SpannedValue<char>) -> syn::Result<SpannedValue<char>> {
    if *short == '-' {
        Err(syn::Error::new(short.span(), "short alias must not be '-'"))
    } else if !short.is_ascii_graphic() {
        Err(syn::Error::new(
            short.span(),
            "short alias should be an ascii printable",
        ))
    } else {
        Ok(short)
    }
}

/// Record `new` in `known`, or report both uses if it's already there
pub fn detect_collision<T: Hash + Eq + Copy, M: Display>(
    known: &mut HashMap<T, Span>,
    new: Option<SpannedValue<T>>,
    message: impl Fn(T) -> M,
) -> syn::Result<()> {
    match new {
        Some(value) => match known.entry(*value) {
            Entry::Occupied(entry) => {
                let mut err1 = syn::Error::new(
                    value.span(),
                    lazy_format!("duplicate {value}", value = message(*value)),
                );
                let err2 = syn::Error::new(*entry.get(), "original use here");

                err1.combine(err2);
                Err(err1)
            }
            Entry::Vacant(entry) => {
                entry.insert(value.span());
                Ok(())
            }
        },
        None => Ok(()),
    }
}

/// If `ty` is `Wrapper<Inner>` for a wrapper with the given name (matched on
/// the last path segment, so `Vec` and `std::vec::Vec` both work), get
/// `Inner`.
pub fn unwrap_type<'a>(ty: &'a Type, wrapper: &str) -> Option<&'a Type> {
    let Type::Path(TypePath { qself: None, ref path }) = *ty else {
        return None;
    };

    let segment = path.segments.last()?;

    if segment.ident != wrapper {
        return None;
    }

    let PathArguments::AngleBracketed(ref arguments) = segment.arguments else {
        return None;
    };

    match arguments.args.iter().exactly_one() {
        Ok(GenericArgument::Type(inner)) => Some(inner),
        _ => None,
    }
}

pub fn is_bool(ty: &Type) -> bool {
    match *ty {
        Type::Path(TypePath {
            qself: None,
            ref path,
        }) => path.is_ident("bool"),
        _ => false,
    }
}
