/*!
A schema-driven command line argument matcher. arbor turns a declarative
description of a command (a tree of typed fields, some of which are groups of
mutually exclusive subcommands) into a parser for a flat list of argument
strings.

A parse happens in three steps:

- The [`compile`][compile::compile] step turns a [`Schema`] into an immutable
  tree of [`CommandNode`]s, rejecting malformed schemas up front.
- The [`matcher`] consumes the arguments against that tree, trying every
  candidate subcommand independently and insisting that exactly one fits.
- The [`bind`] step slices the matched arguments back into raw values per
  field and hands them to a [`FromBound`] constructor. Anything the
  constructor rejects is traced back to the key and text the user typed.

Schemas can be built by hand with the [`schema`] builders and parsed into a
dynamic [`Record`] with [`parse_record`], or derived from Rust types with
[`#[derive(Command)]`][derive@Command], [`#[derive(Subcommands)]`][derive@Subcommands]
and [`#[derive(Choice)]`][derive@Choice] and parsed with [`parse`].

arbor never prints anything and never exits the process; see [`printers`] for
a ready-made rendering of help requests and errors.
*/

pub mod arg;
pub mod bind;
pub mod build;
pub mod compile;
pub mod errors;
pub mod help;
pub mod matcher;
pub mod node;
pub mod parameter;
pub mod printers;
pub mod schema;
pub mod settings;
pub mod token;
pub mod value;

pub use arbor_derive::{Choice, Command, Subcommands};

pub use crate::{
    bind::{Bound, Raw},
    build::{Command, FromBound, Subcommands},
    errors::{Diagnostic, ParseError, SchemaError, ValueError, ValueErrors},
    help::HelpRequest,
    node::CommandNode,
    parameter::{Parameter, ParsedValue},
    schema::{Field, Schema, ValueType},
    settings::Settings,
    value::{Record, Value},
};

use crate::matcher::Outcome;

/// The result of a successful parse
#[derive(Debug, Clone, PartialEq)]
pub enum Parsed<T> {
    /// The arguments matched and the value was constructed
    Value(T),

    /// The user asked for help; nothing was constructed
    Help(HelpRequest),
}

impl<T> Parsed<T> {
    /// The parsed value, or `None` if help was requested
    #[must_use]
    pub fn into_value(self) -> Option<T> {
        match self {
            Parsed::Value(value) => Some(value),
            Parsed::Help(_) => None,
        }
    }
}

/// A compiled command tree, ready to parse any number of argument lists
#[derive(Debug, Clone)]
pub struct Parser {
    root: CommandNode,
    settings: Settings,
}

impl Parser {
    /// Compile a schema with the default [`Settings`]
    pub fn new(schema: &Schema) -> Result<Self, SchemaError> {
        Self::with_settings(schema, Settings::default())
    }

    pub fn with_settings(schema: &Schema, settings: Settings) -> Result<Self, SchemaError> {
        Ok(Self {
            root: compile::compile_with(schema, &settings)?,
            settings,
        })
    }

    /// Compile the schema of a [`Command`] type
    pub fn for_command<T: Command>() -> Result<Self, SchemaError> {
        Self::new(&T::schema())
    }

    #[must_use]
    pub fn root(&self) -> &CommandNode {
        &self.root
    }

    #[must_use]
    pub fn settings(&self) -> Settings {
        self.settings
    }

    /// Match `args` (not including the program name) against the command tree
    /// and construct a `T` from the result.
    pub fn parse<T, S>(&self, args: &[S]) -> Result<Parsed<T>, ParseError>
    where
        T: FromBound,
        S: AsRef<str>,
    {
        let args: Vec<&str> = args.iter().map(AsRef::as_ref).collect();

        let selection = match matcher::match_root(&self.root, &args, &self.settings)? {
            Outcome::Help(request) => return Ok(Parsed::Help(request)),
            Outcome::Matched(selection) => selection,
        };

        bind::construct(&selection, &args)
            .map(Parsed::Value)
            .map_err(ParseError::Values)
    }
}

/// Parse arguments (not including the program name) into a [`Command`] type
pub fn parse<T, S>(args: &[S]) -> Result<Parsed<T>, ParseError>
where
    T: Command,
    S: AsRef<str>,
{
    Parser::for_command::<T>()?.parse(args)
}

/// Parse arguments (not including the program name) against a hand-built
/// schema, producing a dynamic [`Record`]
pub fn parse_record<S: AsRef<str>>(schema: &Schema, args: &[S]) -> Result<Parsed<Record>, ParseError> {
    Parser::new(schema)?.parse(args)
}
