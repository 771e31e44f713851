/*!
The declarative description of a command: a [`Schema`] is an ordered list of
[`Field`]s, at most one of which is a subcommand group holding further
schemas. Schemas are usually produced by `#[derive(Command)]`, but they can be
built by hand with the builder methods here.

A schema is inert; it is turned into a tree of
[`CommandNode`][crate::node::CommandNode]s by [`compile`][crate::compile::compile].
*/

use core::fmt;

use crate::{parameter::Parameter, value::Value};

/// The type a field's raw text is expected to have. This is a hint: it's used
/// in usage messages and by the dynamic [`Record`][crate::value::Record]
/// constructor, while typed constructors use their own [`Parameter`] types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    String,
    Integer,
    NonNegativeInteger,
    Float,
    Boolean,
    Path,

    /// A path that must point to an existing file
    ExistingFile,
}

impl ValueType {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            ValueType::String => "str",
            ValueType::Integer => "int",
            ValueType::NonNegativeInteger => "non-negative int",
            ValueType::Float => "float",
            ValueType::Boolean => "bool",
            ValueType::Path => "path",
            ValueType::ExistingFile => "file",
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The shape of a field, as declared. The compiler combines this with the
/// field's [`Requirement`] to pick a token kind.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    /// A single value
    Value(ValueType),

    /// A boolean flag, spelled `--name` / `--no-name`
    Flag,

    /// A value that may be given any number of times
    Collection(ValueType),

    /// A group of mutually exclusive subcommands
    Subcommand(Vec<Schema>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Requirement {
    Required,

    /// The field may be omitted. If a default is given here, it is reported
    /// in usage messages and used by the dynamic constructor; otherwise the
    /// constructor is responsible for supplying one.
    Optional(Option<Value>),
}

/// A single declared field of a command
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    name: String,
    shape: Shape,
    requirement: Requirement,
    short: Option<char>,
    choices: Option<Vec<String>>,
    description: String,
}

impl Field {
    fn new(name: impl Into<String>, shape: Shape) -> Self {
        Self {
            name: name.into(),
            shape,
            requirement: Requirement::Required,
            short: None,
            choices: None,
            description: String::new(),
        }
    }

    /// A single-valued field. Required fields become positionals; fields
    /// with a default become `--keyword value` options.
    pub fn value(name: impl Into<String>, ty: ValueType) -> Self {
        Self::new(name, Shape::Value(ty))
    }

    /// A single-valued field typed by a [`Parameter`], including its choice
    /// set, if it has one.
    pub fn of<T: Parameter>(name: impl Into<String>) -> Self {
        Self::value(name, T::TYPE).with_choices(T::choices())
    }

    /// A boolean flag. Without a default, one of its spellings must appear.
    pub fn flag(name: impl Into<String>) -> Self {
        Self::new(name, Shape::Flag)
    }

    /// A repeatable `--keyword value` option. Collections are optional: one
    /// that never appears is empty. Use [`required`][Field::required] to
    /// insist on at least one occurrence.
    pub fn collection(name: impl Into<String>, ty: ValueType) -> Self {
        Self {
            requirement: Requirement::Optional(None),
            ..Self::new(name, Shape::Collection(ty))
        }
    }

    /// A collection typed by a [`Parameter`]
    pub fn collection_of<T: Parameter>(name: impl Into<String>) -> Self {
        Self::collection(name, T::TYPE).with_choices(T::choices())
    }

    /// A single string value restricted to a fixed set
    pub fn choice<I>(name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        Self::value(name, ValueType::String).choices(values)
    }

    /// A group of subcommands. Each schema is one variant, invoked by its
    /// name.
    pub fn subcommand(name: impl Into<String>, variants: impl IntoIterator<Item = Schema>) -> Self {
        Self::new(name, Shape::Subcommand(variants.into_iter().collect()))
    }

    /// Make this field optional, with the given default
    #[must_use]
    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.requirement = Requirement::Optional(Some(value.into()));
        self
    }

    /// Make this field optional, leaving the default to the constructor
    #[must_use]
    pub fn optional(mut self) -> Self {
        self.requirement = Requirement::Optional(None);
        self
    }

    /// Make this field required. For a collection, this means it must
    /// appear at least once.
    #[must_use]
    pub fn required(mut self) -> Self {
        self.requirement = Requirement::Required;
        self
    }

    #[must_use]
    pub fn short(mut self, short: char) -> Self {
        self.short = Some(short);
        self
    }

    #[must_use]
    pub fn choices<I>(mut self, values: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.choices = Some(values.into_iter().map(Into::into).collect());
        self
    }

    #[must_use]
    fn with_choices(self, values: Option<&[&str]>) -> Self {
        match values {
            Some(values) => self.choices(values.iter().copied()),
            None => self,
        }
    }

    #[must_use]
    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    #[must_use]
    pub fn requirement(&self) -> &Requirement {
        &self.requirement
    }

    #[must_use]
    pub fn short_alias(&self) -> Option<char> {
        self.short
    }

    #[must_use]
    pub fn allowed_values(&self) -> Option<&[String]> {
        self.choices.as_deref()
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }
}

/// The declaration of one command or subcommand variant
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    name: String,
    description: String,
    fields: Vec<Field>,
}

impl Schema {
    /// Create an empty schema. `name` is the spelling the user types to
    /// invoke it as a subcommand; for the root command it is only used in
    /// messages.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            fields: Vec::new(),
        }
    }

    #[must_use]
    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    #[must_use]
    pub fn field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    /// Rename this schema; used when a schema is reused as a subcommand
    /// variant.
    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    #[must_use]
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }
}
