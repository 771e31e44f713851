use std::collections::HashMap;

use darling::{
    FromAttributes as _,
    util::{Override, SpannedValue},
};
use heck::ToKebabCase as _;
use lazy_format::lazy_format;
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};
use syn::{DataStruct, Expr, ExprLit, Field, Fields, Ident, Lit, Type, spanned::Spanned as _};

use crate::common::{IdentString, compute_docs, compute_short, detect_collision, is_bool, unwrap_type};

#[derive(darling::FromAttributes, Debug)]
#[darling(attributes(arbor))]
pub struct RawParsedTypeAttr {
    pub name: Option<SpannedValue<String>>,
}

impl RawParsedTypeAttr {
    /// The command name: the `name` attribute, or the kebab-case form of
    /// the type or variant
    pub fn command_name(self, ident: &Ident) -> syn::Result<String> {
        match self.name {
            Some(name) if name.is_empty() => {
                Err(syn::Error::new(name.span(), "command name can't be empty"))
            }
            Some(name) => Ok((*name).clone()),
            None => Ok(ident.to_string().to_kebab_case()),
        }
    }
}

/// `default` or `default = <expr>`. Any expression is accepted as is,
/// including literals like `10` or `true`.
#[derive(Debug)]
enum DefaultAttr {
    Inherit,
    Explicit(Expr),
}

impl darling::FromMeta for DefaultAttr {
    fn from_word() -> darling::Result<Self> {
        Ok(Self::Inherit)
    }

    fn from_expr(expr: &Expr) -> darling::Result<Self> {
        Ok(Self::Explicit(expr.clone()))
    }
}

#[derive(darling::FromAttributes, Debug)]
#[darling(attributes(arbor))]
struct RawParsedFieldAttr {
    short: Option<Override<SpannedValue<char>>>,
    default: Option<DefaultAttr>,
    subcommand: Option<()>,
}

/// Container types that become repeatable options
const COLLECTIONS: [&str; 3] = ["Vec", "BTreeSet", "HashSet"];

/// How a field is matched, decided from its type and attributes alone
enum FieldKind<'a> {
    /// A required value, given positionally
    Positional(&'a Type),

    /// `--key value`, falling back to an expression
    Keyword { ty: &'a Type, default: TokenStream2 },

    /// `Option<T>`: `--key value`, or `None`
    OptionalKeyword(&'a Type),

    /// `bool`: required unless it has a literal default
    Flag(Option<bool>),

    /// `Vec<T>`, `BTreeSet<T>` or `HashSet<T>`: `--key value`, any number
    /// of times
    Collection {
        collection: &'a Type,
        ty: &'a Type,
        default: TokenStream2,
    },

    /// `#[arbor(subcommand)]`
    Subcommand(&'a Type),
}

struct ParsedField<'a> {
    ident: IdentString<'a>,
    kind: FieldKind<'a>,
    short: Option<SpannedValue<char>>,
    docs: String,
}

fn default_expr(default: DefaultAttr) -> TokenStream2 {
    match default {
        DefaultAttr::Explicit(expr) => quote! { #expr },
        DefaultAttr::Inherit => quote! { ::core::default::Default::default() },
    }
}

fn flag_default(default: DefaultAttr) -> syn::Result<bool> {
    match default {
        DefaultAttr::Inherit => Ok(false),
        DefaultAttr::Explicit(Expr::Lit(ExprLit {
            lit: Lit::Bool(ref value),
            ..
        })) => Ok(value.value),
        DefaultAttr::Explicit(ref expr) => Err(syn::Error::new(
            expr.span(),
            "the default of a flag must be `true` or `false`",
        )),
    }
}

impl<'a> ParsedField<'a> {
    fn from_field(field: &'a Field) -> syn::Result<Self> {
        let parsed = RawParsedFieldAttr::from_attributes(&field.attrs)?;
        let docs = compute_docs(&field.attrs)?;

        let ident = field
            .ident
            .as_ref()
            .map(IdentString::new)
            .ok_or_else(|| syn::Error::new(field.span(), "command fields must be named"))?;

        let short = parsed
            .short
            .map(|short| {
                compute_short(short.explicit().unwrap_or_else(|| {
                    let first = ident.as_str().chars().next().unwrap_or('_');
                    SpannedValue::new(first, ident.span())
                }))
            })
            .transpose()?;

        let ty = &field.ty;

        let kind = if let Some(()) = parsed.subcommand {
            if parsed.default.is_some() || short.is_some() {
                return Err(syn::Error::new(
                    field.span(),
                    "a subcommand field can't have a default or a short alias",
                ));
            }

            FieldKind::Subcommand(ty)
        } else if is_bool(ty) {
            FieldKind::Flag(parsed.default.map(flag_default).transpose()?)
        } else if let Some(inner) = COLLECTIONS
            .iter()
            .find_map(|collection| unwrap_type(ty, collection))
        {
            FieldKind::Collection {
                collection: ty,
                ty: inner,
                default: default_expr(parsed.default.unwrap_or(DefaultAttr::Inherit)),
            }
        } else if let Some(inner) = unwrap_type(ty, "Option") {
            if parsed.default.is_some() {
                return Err(syn::Error::new(
                    field.span(),
                    "an `Option` field can't have a default; it's `None` when absent",
                ));
            }

            FieldKind::OptionalKeyword(inner)
        } else if let Some(default) = parsed.default {
            FieldKind::Keyword {
                ty,
                default: default_expr(default),
            }
        } else {
            if let Some(ref short) = short {
                return Err(syn::Error::new(
                    short.span(),
                    "positional fields can't have a short alias; give the field a default to make it an option",
                ));
            }

            FieldKind::Positional(ty)
        };

        Ok(Self {
            ident,
            kind,
            short,
            docs,
        })
    }

    /// The `Field` builder expression for this field's schema entry
    fn schema_entry(&self) -> TokenStream2 {
        let name = self.ident.as_str();

        let field = match self.kind {
            FieldKind::Positional(ty) => quote! {
                ::arbor::schema::Field::of::<#ty>(#name)
            },
            FieldKind::Keyword { ty, .. } => quote! {
                ::arbor::schema::Field::of::<#ty>(#name).optional()
            },
            FieldKind::OptionalKeyword(ty) => quote! {
                ::arbor::schema::Field::of::<#ty>(#name).optional()
            },
            FieldKind::Flag(None) => quote! {
                ::arbor::schema::Field::flag(#name)
            },
            FieldKind::Flag(Some(default)) => quote! {
                ::arbor::schema::Field::flag(#name).default(#default)
            },
            FieldKind::Collection { ty, .. } => quote! {
                ::arbor::schema::Field::collection_of::<#ty>(#name).optional()
            },
            FieldKind::Subcommand(ty) => quote! {
                ::arbor::schema::Field::subcommand(
                    #name,
                    <#ty as ::arbor::Subcommands>::variants(),
                )
            },
        };

        let short = self.short.as_ref().map(|short| {
            let short = **short;
            quote! { .short(#short) }
        });

        let docs = self.docs.as_str();
        let docs = (!docs.is_empty()).then(|| quote! { .describe(#docs) });

        quote! { #field #short #docs }
    }

    /// An expression of type `Result<FieldType, ValueErrors>` that builds
    /// this field from `bound`
    fn constructor(&self, bound: &Ident) -> TokenStream2 {
        let name = self.ident.as_str();

        match self.kind {
            FieldKind::Positional(ty) => quote! {
                #bound.required::<#ty>(#name)
            },
            FieldKind::Keyword { ty, ref default } => quote! {
                #bound.value::<#ty>(#name).map(|value| value.unwrap_or_else(|| #default))
            },
            FieldKind::OptionalKeyword(ty) => quote! {
                #bound.value::<#ty>(#name)
            },
            FieldKind::Flag(None) => quote! {
                #bound.required_flag(#name)
            },
            FieldKind::Flag(Some(default)) => quote! {
                ::core::result::Result::<bool, ::arbor::ValueErrors>::Ok(
                    #bound.flag(#name).unwrap_or(#default)
                )
            },
            FieldKind::Collection {
                collection,
                ty,
                ref default,
            } => quote! {
                #bound
                    .list::<#ty, #collection>(#name)
                    .map(|values| values.unwrap_or_else(|| #default))
            },
            FieldKind::Subcommand(ty) => quote! {
                #bound.subcommand_with(#name, <#ty as ::arbor::Subcommands>::from_variant)
            },
        }
    }
}

/// Build the body of a `from_bound` function for a struct with the given
/// fields: every field is constructed, every error is collected, and the
/// value is only assembled if nothing failed.
fn from_bound_body(fields: &[ParsedField<'_>], bound: &Ident) -> TokenStream2 {
    if fields.is_empty() {
        return quote! {
            let _ = #bound;
            ::core::result::Result::Ok(Self {})
        };
    }

    let errors = format_ident!("__arbor_errors");

    let locals: Vec<Ident> = (0..fields.len())
        .map(|index| format_ident!("__arbor_field_{index}"))
        .collect();

    let idents = fields.iter().map(|field| field.ident.raw());
    let constructors = fields.iter().map(|field| field.constructor(bound));

    quote! {
        let mut #errors = ::arbor::ValueErrors::new();

        #(
            let #locals = #errors.collect(#constructors);
        )*

        match (#(#locals,)*) {
            (#(::core::option::Option::Some(#locals),)*) => #errors.finish(Self {
                #(#idents: #locals,)*
            }),
            _ => ::core::result::Result::Err(#errors),
        }
    }
}

struct ParsedStruct<'a> {
    name: String,
    docs: String,
    fields: Vec<ParsedField<'a>>,
}

impl<'a> ParsedStruct<'a> {
    fn from_struct(
        ident: &Ident,
        data: &'a DataStruct,
        attrs: &[syn::Attribute],
    ) -> syn::Result<Self> {
        let name = RawParsedTypeAttr::from_attributes(attrs)?.command_name(ident)?;
        let docs = compute_docs(attrs)?;

        let fields = match data.fields {
            Fields::Named(ref fields) => fields
                .named
                .iter()
                .map(ParsedField::from_field)
                .collect::<syn::Result<Vec<_>>>()?,
            Fields::Unit => Vec::new(),
            Fields::Unnamed(ref fields) => {
                return Err(syn::Error::new(
                    fields.span(),
                    "can't derive `Command` on a tuple struct; fields must be named",
                ));
            }
        };

        let mut shorts = HashMap::new();
        let mut subcommand = None;

        for field in &fields {
            detect_collision(&mut shorts, field.short, |short| {
                lazy_format!("short alias -{short}")
            })?;

            if let FieldKind::Subcommand(_) = field.kind {
                if let Some(previous) = subcommand.replace(field.ident.span()) {
                    let mut err = syn::Error::new(
                        field.ident.span(),
                        "a command can have at most one subcommand field",
                    );
                    err.combine(syn::Error::new(previous, "previous subcommand field here"));
                    return Err(err);
                }
            }
        }

        Ok(Self { name, docs, fields })
    }

    /// The `Schema` builder expression for this struct
    fn schema(&self) -> TokenStream2 {
        let name = self.name.as_str();
        let docs = self.docs.as_str();
        let entries = self.fields.iter().map(ParsedField::schema_entry);

        quote! {
            ::arbor::schema::Schema::new(#name)
                .describe(#docs)
                #(.field(#entries))*
        }
    }
}

pub fn derive_command_struct(
    ident: &Ident,
    data: &DataStruct,
    generics: &syn::Generics,
    attrs: &[syn::Attribute],
) -> syn::Result<TokenStream2> {
    if !generics.params.is_empty() {
        return Err(syn::Error::new(
            generics.span(),
            "can't derive `Command` on a generic type",
        ));
    }

    let parsed = ParsedStruct::from_struct(ident, data, attrs)?;
    let schema = parsed.schema();
    let bound = format_ident!("bound");
    let body = from_bound_body(&parsed.fields, &bound);

    Ok(quote! {
        impl ::arbor::Command for #ident {
            fn schema() -> ::arbor::schema::Schema {
                #schema
            }
        }

        impl ::arbor::FromBound for #ident {
            fn from_bound(
                #bound: &::arbor::Bound<'_>,
            ) -> ::core::result::Result<Self, ::arbor::ValueErrors> {
                #body
            }
        }
    })
}
