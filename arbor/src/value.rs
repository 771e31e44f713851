/*!
Dynamically typed values. A [`Record`] is what a parse produces when there's
no Rust type describing the command: a map from field name to [`Value`], with
the adopted subcommand nested as a [`Value::Variant`].
*/

use core::fmt::{self, Display};
use std::{collections::BTreeMap, path::PathBuf};

use joinery::JoinableIterator as _;

use crate::{
    bind::{Bound, Raw},
    build::FromBound,
    errors::ValueErrors,
    parameter::Parameter,
    schema::ValueType,
    token::{FieldDescriptor, TokenKind},
};

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Path(PathBuf),
    List(Vec<Value>),

    /// The adopted subcommand, by name, with its own fields
    Variant { name: String, record: Record },
}

impl Value {
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(value) => Some(value),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match *self {
            Value::Int(value) => Some(value),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match *self {
            Value::Bool(value) => Some(value),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(values) => Some(values),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_variant(&self) -> Option<(&str, &Record)> {
        match self {
            Value::Variant { name, record } => Some((name, record)),
            _ => None,
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Str(value) => f.write_str(value),
            Value::Int(value) => Display::fmt(value, f),
            Value::Float(value) => Display::fmt(value, f),
            Value::Bool(value) => Display::fmt(value, f),
            Value::Path(value) => Display::fmt(&value.display(), f),
            Value::List(values) => write!(f, "[{}]", values.iter().join_with(", ")),
            Value::Variant { name, record } => write!(f, "{name} {record}"),
        }
    }
}

macro_rules! value_from {
    ($($type:ty => |$value:ident| $convert:expr;)*) => {
        $(
            impl From<$type> for Value {
                #[inline]
                fn from($value: $type) -> Self {
                    $convert
                }
            }
        )*
    };
}

value_from! {
    &str => |value| Value::Str(value.to_owned());
    String => |value| Value::Str(value);
    i64 => |value| Value::Int(value);
    i32 => |value| Value::Int(value.into());
    u32 => |value| Value::Int(value.into());
    f64 => |value| Value::Float(value);
    bool => |value| Value::Bool(value);
    PathBuf => |value| Value::Path(value);
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(values: Vec<T>) -> Self {
        Value::List(values.into_iter().map(Into::into).collect())
    }
}

/// Field values by field name
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: BTreeMap<String, Value>,
}

impl Record {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(field.into(), value.into());
    }

    /// Builder form of [`insert`][Record::insert]
    #[must_use]
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(field, value);
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields
            .iter()
            .map(|(field, value)| (field.as_str(), value))
    }
}

impl Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fields = self
            .fields
            .iter()
            .map(|(field, value)| lazy_format::lazy_format!("{field}: {value}"));

        write!(f, "{{{}}}", fields.join_with(", "))
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(field, value)| (field.into(), value.into()))
                .collect(),
        }
    }
}

fn coerce(bound: &Bound<'_>, descriptor: &FieldDescriptor, text: &str) -> Result<Value, ValueErrors> {
    let reject = |reason: String| bound.error(descriptor.name(), Some(text), reason);

    let value = match descriptor.value_type() {
        ValueType::String => Value::Str(text.to_owned()),
        ValueType::Integer => i64::from_arg(text).map(Value::Int).map_err(reject)?,
        ValueType::NonNegativeInteger => match i64::from_arg(text).map_err(reject)? {
            value if value < 0 => {
                return Err(bound.error(
                    descriptor.name(),
                    Some(text),
                    "should be greater than or equal to 0",
                ));
            }
            value => Value::Int(value),
        },
        ValueType::Float => f64::from_arg(text).map(Value::Float).map_err(reject)?,
        ValueType::Boolean => bool::from_arg(text).map(Value::Bool).map_err(reject)?,
        ValueType::Path => Value::Path(PathBuf::from(text)),
        ValueType::ExistingFile => match PathBuf::from(text) {
            path if path.is_file() => Value::Path(path),
            _ => {
                return Err(bound.error(
                    descriptor.name(),
                    Some(text),
                    "path does not point to a file",
                ));
            }
        },
    };

    Ok(value)
}

/// The built-in dynamic constructor: every field is coerced according to its
/// [`ValueType`]. Absent fields take their schema default, if they have one;
/// absent collections without a default are empty.
impl FromBound for Record {
    fn from_bound(bound: &Bound<'_>) -> Result<Self, ValueErrors> {
        let mut errors = ValueErrors::new();
        let mut record = Record::new();
        let node = bound.node();

        if let Some(group) = node.subcommands() {
            let child = bound.subcommand_with(group.field(), |child| {
                Record::from_bound(child).map(|record| Value::Variant {
                    name: child.name().to_owned(),
                    record,
                })
            });

            if let Some(child) = errors.collect(child) {
                record.insert(group.field(), child);
            }
        }

        for token in node.tokens() {
            let descriptor = token.descriptor();

            let value = match bound.raw(descriptor.name()) {
                Some(&Raw::Flag(value)) => Some(Value::Bool(value)),
                Some(&Raw::Single(text)) => errors.collect(coerce(bound, descriptor, text)),
                Some(Raw::Many(texts)) => {
                    let values: Vec<Option<Value>> = texts
                        .iter()
                        .map(|text| errors.collect(coerce(bound, descriptor, text)))
                        .collect();

                    values.into_iter().collect::<Option<Vec<Value>>>().map(Value::List)
                }
                None => match (descriptor.default(), token.kind()) {
                    (Some(default), _) => Some(default.clone()),
                    (None, TokenKind::Collection { .. }) => Some(Value::List(Vec::new())),
                    (None, _) => None,
                },
            };

            if let Some(value) = value {
                record.insert(descriptor.name(), value);
            }
        }

        errors.finish(record)
    }
}
