/*!
Error and diagnostic types. There are three classes of failure, each with its
own type:

- [`SchemaError`]: the schema itself is malformed. Detected by the compiler
  before any argument is examined.
- [`MatchError`]: the arguments don't fit the command tree.
- [`ValueError`]: a constructor rejected a value. These are re-associated with
  the key and text the user actually typed, becoming [`Diagnostic`]s.

[`ParseError`] wraps all three, and can flatten itself into a single list of
structured [`Diagnostic`]s for a presentation layer to render.
*/

use core::fmt::{self, Display};

use joinery::JoinableIterator as _;
use lazy_format::lazy_format;

pub(crate) fn quoted_list(items: &[String]) -> impl Display + '_ {
    items
        .iter()
        .map(|item| lazy_format!("`{item}`"))
        .join_with(", ")
}

fn duplicate_message<'a>(key: &'a str, previous: &'a str) -> impl Display + 'a {
    lazy_format!(match (key == previous) {
        true => "`{key}` was given more than once",
        false => "`{key}` conflicts with `{previous}`, which was given earlier",
    })
}

fn unmatched_subcommand<'a>(found: Option<&'a str>, expected: &'a [String]) -> impl Display + 'a {
    lazy_format!(
        match (found) {
            Some(found) => (
                "no matching subcommand for `{found}`; expected one of {expected}",
                expected = quoted_list(expected),
            ),
            None => (
                "no matching subcommand; expected one of {expected}",
                expected = quoted_list(expected),
            ),
        }
    )
}

/// The schema can't be turned into a command tree. These are definition
/// errors: they don't depend on user input and should never reach an end
/// user of a correctly written program.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum SchemaError {
    #[error(
        "command `{}` declares more than one subcommand group (`{first}` and `{second}`)",
        .path.join(" ")
    )]
    MultipleSubcommandGroups {
        path: Vec<String>,
        first: String,
        second: String,
    },

    #[error("subcommand group `{field}` in command `{}` has no variants", .path.join(" "))]
    EmptySubcommandGroup { path: Vec<String>, field: String },

    #[error("subcommand group `{field}` in command `{}` can't have a default", .path.join(" "))]
    SubcommandDefault { path: Vec<String>, field: String },

    #[error(
        "short alias `-{short}` is used by both `{first}` and `{second}` in command `{}`",
        .path.join(" ")
    )]
    DuplicateShort {
        path: Vec<String>,
        short: char,
        first: String,
        second: String,
    },

    #[error(
        "key `{key}` is used by both `{first}` and `{second}` in command `{}`",
        .path.join(" ")
    )]
    DuplicateKey {
        path: Vec<String>,
        key: String,
        first: String,
        second: String,
    },

    #[error("field `{field}` is declared more than once in command `{}`", .path.join(" "))]
    DuplicateField { path: Vec<String>, field: String },

    #[error("key `{key}` of field `{field}` is reserved for help requests")]
    ReservedKey {
        path: Vec<String>,
        key: String,
        field: String,
    },

    #[error("short alias {short:?} of field `{field}` must be a printable ascii character other than '-'")]
    InvalidShort {
        path: Vec<String>,
        field: String,
        short: char,
    },

    #[error("choice field `{field}` in command `{}` has no allowed values", .path.join(" "))]
    EmptyChoices { path: Vec<String>, field: String },

    /// A default that the field could never have produced itself: the wrong
    /// kind of value, or one outside its allowed choices
    #[error(
        "default `{default}` of field `{field}` in command `{}` {reason}",
        .path.join(" ")
    )]
    InvalidDefault {
        path: Vec<String>,
        field: String,
        default: String,
        reason: String,
    },

    /// Only keyed fields can have a short alias
    #[error(
        "field `{field}` in command `{}` can't have a short alias {short:?}; it isn't given by key",
        .path.join(" ")
    )]
    MisplacedShort {
        path: Vec<String>,
        field: String,
        short: char,
    },
}

impl SchemaError {
    /// The invocation path of the command that declared the broken field
    #[must_use]
    pub fn path(&self) -> &[String] {
        match self {
            Self::MultipleSubcommandGroups { path, .. }
            | Self::EmptySubcommandGroup { path, .. }
            | Self::SubcommandDefault { path, .. }
            | Self::DuplicateShort { path, .. }
            | Self::DuplicateKey { path, .. }
            | Self::DuplicateField { path, .. }
            | Self::ReservedKey { path, .. }
            | Self::InvalidShort { path, .. }
            | Self::EmptyChoices { path, .. }
            | Self::InvalidDefault { path, .. }
            | Self::MisplacedShort { path, .. } => path,
        }
    }
}

/// The arguments couldn't be matched against the command tree.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum MatchError {
    /// A positional was never reached. `consumed` holds the arguments that
    /// were consumed before matching stopped, for context.
    #[error("missing a value for positional argument `{key}`")]
    MissingPositional {
        path: Vec<String>,
        key: String,
        cursor: usize,
        consumed: Vec<String>,
    },

    /// A flag without a default was given in neither spelling
    #[error("missing required flag `{key}`")]
    MissingFlag { path: Vec<String>, key: String },

    /// A required collection never appeared
    #[error("missing required option `{key}`")]
    MissingOption { path: Vec<String>, key: String },

    /// A keyword was the last argument, with nothing after it
    #[error("`{key}` requires a value")]
    MissingValue { path: Vec<String>, key: String },

    /// A single-valued keyword or a flag appeared more than once, possibly in
    /// a different spelling
    #[error("{}", duplicate_message(.key, .previous))]
    Duplicate {
        path: Vec<String>,
        key: String,
        previous: String,
    },

    /// A flag was given as `--flag=value`
    #[error("flag `{key}` doesn't take a value")]
    UnexpectedValue { path: Vec<String>, key: String },

    #[error("{}", unmatched_subcommand(.found.as_deref(), .expected))]
    NoMatchingSubcommand {
        path: Vec<String>,
        expected: Vec<String>,
        found: Option<String>,
    },

    /// More than one variant matched the same input. This means the schema
    /// has overlapping variants.
    #[error(
        "ambiguous subcommand: the input matches more than one variant ({})",
        quoted_list(.candidates)
    )]
    AmbiguousSubcommand {
        path: Vec<String>,
        candidates: Vec<String>,
    },

    /// Matching succeeded but didn't consume every argument
    #[error("unexpected argument `{argument}`")]
    TrailingInput {
        path: Vec<String>,
        index: usize,
        argument: String,
    },
}

impl MatchError {
    /// The invocation path of the command where matching failed
    #[must_use]
    pub fn path(&self) -> &[String] {
        match self {
            Self::MissingPositional { path, .. }
            | Self::MissingFlag { path, .. }
            | Self::MissingOption { path, .. }
            | Self::MissingValue { path, .. }
            | Self::Duplicate { path, .. }
            | Self::UnexpectedValue { path, .. }
            | Self::NoMatchingSubcommand { path, .. }
            | Self::AmbiguousSubcommand { path, .. }
            | Self::TrailingInput { path, .. } => path,
        }
    }

    /// The user-facing key involved in this error, if any
    #[must_use]
    pub fn key(&self) -> Option<&str> {
        match self {
            Self::MissingPositional { key, .. }
            | Self::MissingFlag { key, .. }
            | Self::MissingOption { key, .. }
            | Self::MissingValue { key, .. }
            | Self::Duplicate { key, .. }
            | Self::UnexpectedValue { key, .. } => Some(key),
            Self::NoMatchingSubcommand { .. }
            | Self::AmbiguousSubcommand { .. }
            | Self::TrailingInput { .. } => None,
        }
    }

    /// The literal argument text involved in this error, if any
    #[must_use]
    pub fn literal(&self) -> Option<&str> {
        match self {
            Self::NoMatchingSubcommand { found, .. } => found.as_deref(),
            Self::TrailingInput { argument, .. } => Some(argument),
            _ => None,
        }
    }
}

/// A constructor rejected the value of a field. `path` is the invocation
/// path of the command that owns the field; `input` is the offending text,
/// when the constructor knows it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field}: {reason}")]
pub struct ValueError {
    pub path: Vec<String>,
    pub field: String,
    pub input: Option<String>,
    pub reason: String,
}

/// Every [`ValueError`] produced while constructing a value. Constructors
/// collect the errors of all of their fields rather than stopping at the
/// first.
#[derive(Debug, Clone, Default, PartialEq, Eq, thiserror::Error)]
#[error("{}", .errors.iter().join_with("; "))]
pub struct ValueErrors {
    errors: Vec<ValueError>,
}

impl ValueErrors {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, error: ValueError) {
        self.errors.push(error);
    }

    /// Record the errors from `result`, if any, and return its value
    /// otherwise.
    pub fn collect<T>(&mut self, result: Result<T, ValueErrors>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(errors) => {
                self.errors.extend(errors.errors);
                None
            }
        }
    }

    pub fn extend(&mut self, other: ValueErrors) {
        self.errors.extend(other.errors);
    }

    /// Add the errors from `other`, except those about a field that
    /// already has an error here
    pub fn merge(&mut self, other: ValueErrors) {
        let fresh: Vec<ValueError> = other
            .errors
            .into_iter()
            .filter(|error| {
                !self
                    .errors
                    .iter()
                    .any(|known| known.path == error.path && known.field == error.field)
            })
            .collect();

        self.errors.extend(fresh);
    }

    /// `Ok(value)` if no errors were collected
    pub fn finish<T>(self, value: T) -> Result<T, Self> {
        match self.errors.is_empty() {
            true => Ok(value),
            false => Err(self),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ValueError> {
        self.errors.iter()
    }
}

impl From<ValueError> for ValueErrors {
    fn from(error: ValueError) -> Self {
        Self {
            errors: Vec::from([error]),
        }
    }
}

impl IntoIterator for ValueErrors {
    type Item = ValueError;
    type IntoIter = std::vec::IntoIter<ValueError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.into_iter()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    Schema,
    Match,
    Value,
}

/// A structured, presentation-free description of one problem
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub message: String,

    /// The key as the user typed it (`-m`, `--my-value`), or the display
    /// name of a positional
    pub key: Option<String>,

    /// The argument text the user supplied
    pub literal: Option<String>,

    /// Invocation path of the command the problem belongs to
    pub path: Vec<String>,
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl From<&SchemaError> for Diagnostic {
    fn from(error: &SchemaError) -> Self {
        let key = match error {
            SchemaError::DuplicateShort { short, .. }
            | SchemaError::InvalidShort { short, .. }
            | SchemaError::MisplacedShort { short, .. } => Some(format!("-{short}")),
            SchemaError::DuplicateKey { key, .. } | SchemaError::ReservedKey { key, .. } => {
                Some(key.clone())
            }
            _ => None,
        };

        Self {
            kind: DiagnosticKind::Schema,
            message: error.to_string(),
            key,
            literal: None,
            path: error.path().to_vec(),
        }
    }
}

impl From<&MatchError> for Diagnostic {
    fn from(error: &MatchError) -> Self {
        Self {
            kind: DiagnosticKind::Match,
            message: error.to_string(),
            key: error.key().map(str::to_owned),
            literal: error.literal().map(str::to_owned),
            path: error.path().to_vec(),
        }
    }
}

/// Any failure of a parse. There is never a partial result.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Match(#[from] MatchError),

    /// One or more values were rejected, after matching succeeded
    #[error("{}", .0.iter().join_with("; "))]
    Values(Vec<Diagnostic>),
}

impl ParseError {
    /// The consolidated list of diagnostics for this error
    #[must_use]
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        match self {
            ParseError::Schema(error) => Vec::from([Diagnostic::from(error)]),
            ParseError::Match(error) => Vec::from([Diagnostic::from(error)]),
            ParseError::Values(diagnostics) => diagnostics.clone(),
        }
    }

    /// The exit status a process should report for this error
    #[must_use]
    pub const fn status(&self) -> u8 {
        1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn path() -> Vec<String> {
        Vec::from(["git".to_owned()])
    }

    #[rstest]
    #[case(
        MatchError::Duplicate { path: path(), key: "--repeat".into(), previous: "--repeat".into() },
        "`--repeat` was given more than once"
    )]
    #[case(
        MatchError::Duplicate { path: path(), key: "--no-verbose".into(), previous: "--verbose".into() },
        "`--no-verbose` conflicts with `--verbose`, which was given earlier"
    )]
    #[case(
        MatchError::NoMatchingSubcommand {
            path: path(),
            expected: Vec::from(["clone".into(), "merge".into()]),
            found: Some("deploy".into()),
        },
        "no matching subcommand for `deploy`; expected one of `clone`, `merge`"
    )]
    #[case(
        MatchError::NoMatchingSubcommand {
            path: path(),
            expected: Vec::from(["clone".into()]),
            found: None,
        },
        "no matching subcommand; expected one of `clone`"
    )]
    #[case(
        MatchError::TrailingInput { path: path(), index: 1, argument: "12".into() },
        "unexpected argument `12`"
    )]
    fn match_error_display(#[case] error: MatchError, #[case] expected: &str) {
        assert_eq!(error.to_string(), expected);
    }

    #[test]
    fn schema_error_names_the_command_path() {
        let error = SchemaError::DuplicateShort {
            path: Vec::from(["git".to_owned(), "clone".to_owned()]),
            short: 'v',
            first: "verbose".into(),
            second: "version".into(),
        };

        assert_eq!(
            error.to_string(),
            "short alias `-v` is used by both `verbose` and `version` in command `git clone`"
        );

        let diagnostic = Diagnostic::from(&error);
        assert_eq!(diagnostic.kind, DiagnosticKind::Schema);
        assert_eq!(diagnostic.key.as_deref(), Some("-v"));
    }

    #[test]
    fn collect_keeps_every_error() {
        let mut errors = ValueErrors::new();
        let error = |field: &str| ValueError {
            path: path(),
            field: field.into(),
            input: None,
            reason: "bad".into(),
        };

        assert_eq!(errors.collect::<i32>(Err(error("a").into())), None);
        assert_eq!(errors.collect(Ok(3)), Some(3));
        assert_eq!(errors.collect::<i32>(Err(error("b").into())), None);

        assert_eq!(errors.len(), 2);
        assert_eq!(errors.to_string(), "a: bad; b: bad");
        assert!(errors.finish(()).is_err());
    }

    #[test]
    fn merge_skips_fields_already_reported() {
        let error = |field: &str, reason: &str| ValueError {
            path: path(),
            field: field.into(),
            input: None,
            reason: reason.into(),
        };

        let mut errors = ValueErrors::from(error("style", "must be one of `a`, `b`"));
        let mut later = ValueErrors::from(error("style", "unknown style"));
        later.push(error("width", "invalid digit found in string"));
        errors.merge(later);

        assert_eq!(
            errors.to_string(),
            "style: must be one of `a`, `b`; width: invalid digit found in string"
        );
    }

    #[test]
    fn match_diagnostics_carry_key_and_literal() {
        let error = ParseError::Match(MatchError::TrailingInput {
            path: path(),
            index: 1,
            argument: "12".into(),
        });

        let diagnostics = error.diagnostics();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].kind, DiagnosticKind::Match);
        assert_eq!(diagnostics[0].literal.as_deref(), Some("12"));
        assert_eq!(error.status(), 1);
    }
}
