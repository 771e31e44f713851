mod choice;
mod command;
mod common;
mod subcommands;

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use syn::{Data, DeriveInput, spanned::Spanned as _};

use crate::{
    choice::derive_choice_enum, command::derive_command_struct,
    subcommands::derive_subcommands_enum,
};

fn derive_command_result(item: TokenStream2) -> syn::Result<TokenStream2> {
    let input: DeriveInput = syn::parse2(item)?;

    match input.data {
        Data::Struct(ref data) => {
            derive_command_struct(&input.ident, data, &input.generics, &input.attrs)
        }
        Data::Enum(_) => Err(syn::Error::new(
            input.span(),
            "can't derive `Command` on an enum; use `#[derive(Subcommands)]` \
             and a `#[arbor(subcommand)]` field",
        )),
        Data::Union(_) => Err(syn::Error::new(
            input.span(),
            "can't derive `Command` on a union",
        )),
    }
}

fn derive_subcommands_result(item: TokenStream2) -> syn::Result<TokenStream2> {
    let input: DeriveInput = syn::parse2(item)?;

    match input.data {
        Data::Enum(ref data) => derive_subcommands_enum(&input.ident, data, &input.generics),
        _ => Err(syn::Error::new(
            input.span(),
            "`Subcommands` can only be derived on an enum",
        )),
    }
}

fn derive_choice_result(item: TokenStream2) -> syn::Result<TokenStream2> {
    let input: DeriveInput = syn::parse2(item)?;

    match input.data {
        Data::Enum(ref data) => derive_choice_enum(&input.ident, data, &input.generics),
        _ => Err(syn::Error::new(
            input.span(),
            "`Choice` can only be derived on an enum",
        )),
    }
}

/// Derive `arbor::Command` and `arbor::FromBound` for a struct with named
/// fields. Each field is classified by its type:
///
/// - `bool`: a flag; required unless `#[arbor(default)]` or
///   `#[arbor(default = true)]` is given
/// - `Vec<T>`: a repeatable `--key value` option
/// - `Option<T>`: an optional `--key value` option
/// - anything else: a positional, or a `--key value` option if it has an
///   `#[arbor(default)]`
///
/// One field may be `#[arbor(subcommand)]`, with a type that derives
/// `Subcommands`. `#[arbor(short)]` adds a short alias.
#[proc_macro_derive(Command, attributes(arbor))]
pub fn derive_command(item: TokenStream) -> TokenStream {
    match derive_command_result(item.into()) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

/// Derive `arbor::Subcommands` for an enum whose variants are either unit
/// variants or newtypes around a `Command`.
#[proc_macro_derive(Subcommands, attributes(arbor))]
pub fn derive_subcommands(item: TokenStream) -> TokenStream {
    match derive_subcommands_result(item.into()) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

/// Derive `arbor::Parameter` for a fieldless enum
#[proc_macro_derive(Choice, attributes(arbor))]
pub fn derive_choice(item: TokenStream) -> TokenStream {
    match derive_choice_result(item.into()) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}
