/*!
The binder. Once matching has succeeded, the binder walks the selected chain
of nodes from the bottom up, slices each token's match state back into raw
argument text, and hands it to a [`FromBound`] constructor. Constructor
failures come back as [`ValueError`]s naming a field; [`attribute`] maps
them back to the key and text the user actually typed.
*/

use core::fmt::Display;

use crate::{
    arg,
    build::FromBound,
    errors::{quoted_list, Diagnostic, DiagnosticKind, ValueError, ValueErrors},
    matcher::Selection,
    node::CommandNode,
    parameter::Parameter,
};

/// The raw value of a matched field, borrowed from the arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Raw<'a> {
    /// A positional or keyword value
    Single(&'a str),

    /// Which spelling of a flag was given
    Flag(bool),

    /// Every value of a collection, first to last
    Many(Vec<&'a str>),
}

/// One node of a successful match, with its fields' raw values and the bound
/// adopted subcommand. This is what a [`FromBound`] constructor works from.
#[derive(Debug, Clone, PartialEq)]
pub struct Bound<'a> {
    node: &'a CommandNode,
    fields: Vec<(&'a str, Raw<'a>)>,
    child: Option<Box<Bound<'a>>>,
}

impl<'a> Bound<'a> {
    /// The name of the bound command; for a subcommand, the variant name
    #[must_use]
    pub fn name(&self) -> &'a str {
        self.node.name()
    }

    #[must_use]
    pub fn path(&self) -> &'a [String] {
        self.node.path()
    }

    #[must_use]
    pub fn node(&self) -> &'a CommandNode {
        self.node
    }

    /// The raw value of a field, if it appeared in the arguments
    #[must_use]
    pub fn raw(&self, field: &str) -> Option<&Raw<'a>> {
        self.fields
            .iter()
            .find(|&&(name, _)| name == field)
            .map(|(_, raw)| raw)
    }

    /// The bound adopted subcommand, if this node has a subcommand group
    #[must_use]
    pub fn subcommand(&self) -> Option<&Bound<'a>> {
        self.child.as_deref()
    }

    /// Create an error for one of this node's fields
    pub fn error(&self, field: &str, input: Option<&str>, reason: impl Display) -> ValueErrors {
        ValueErrors::from(ValueError {
            path: self.path().to_vec(),
            field: field.to_owned(),
            input: input.map(str::to_owned),
            reason: reason.to_string(),
        })
    }

    fn parse<T: Parameter>(&self, field: &str, text: &str) -> Result<T, ValueErrors> {
        T::from_arg(text).map_err(|reason| self.error(field, Some(text), reason))
    }

    fn single(&self, field: &str) -> Result<Option<&'a str>, ValueErrors> {
        match self.raw(field) {
            None => Ok(None),
            Some(&Raw::Single(text)) => Ok(Some(text)),
            Some(&Raw::Flag(_)) => Err(self.error(field, None, "expected a value, not a flag")),
            Some(Raw::Many(_)) => Err(self.error(field, None, "expected a single value")),
        }
    }

    /// The parsed value of a field that must be present
    pub fn required<T: Parameter>(&self, field: &str) -> Result<T, ValueErrors> {
        match self.single(field)? {
            Some(text) => self.parse(field, text),
            None => Err(self.error(field, None, "a value is required")),
        }
    }

    /// The parsed value of an optional field
    pub fn value<T: Parameter>(&self, field: &str) -> Result<Option<T>, ValueErrors> {
        self.single(field)?
            .map(|text| self.parse(field, text))
            .transpose()
    }

    /// The value of a flag, if either spelling appeared
    #[must_use]
    pub fn flag(&self, field: &str) -> Option<bool> {
        match self.raw(field) {
            Some(&Raw::Flag(value)) => Some(value),
            _ => None,
        }
    }

    pub fn required_flag(&self, field: &str) -> Result<bool, ValueErrors> {
        self.flag(field)
            .ok_or_else(|| self.error(field, None, "one of the flag's spellings is required"))
    }

    /// Every parsed value of a collection, in order, gathered into any
    /// collection type; `None` if the field never appeared. Errors are
    /// collected for every value, not just the first.
    pub fn list<T: Parameter, C: FromIterator<T>>(
        &self,
        field: &str,
    ) -> Result<Option<C>, ValueErrors> {
        let texts: &[&'a str] = match self.raw(field) {
            None => return Ok(None),
            Some(Raw::Single(text)) => core::slice::from_ref(text),
            Some(Raw::Many(texts)) => texts,
            Some(&Raw::Flag(_)) => {
                return Err(self.error(field, None, "expected a list of values, not a flag"));
            }
        };

        let mut errors = ValueErrors::new();

        let values: Vec<Option<T>> = texts
            .iter()
            .map(|text| errors.collect(self.parse(field, text)))
            .collect();

        errors.finish(values.into_iter().flatten().collect()).map(Some)
    }

    /// Construct the adopted subcommand of the group stored in `field`
    pub fn subcommand_with<T>(
        &self,
        field: &str,
        construct: impl FnOnce(&Bound<'a>) -> Result<T, ValueErrors>,
    ) -> Result<T, ValueErrors> {
        match self.child.as_deref() {
            Some(child) => construct(child),
            None => Err(self.error(field, None, "a subcommand is required")),
        }
    }

    /// The error a [`Subcommands`][crate::Subcommands] constructor reports
    /// when it doesn't recognize the adopted variant
    #[must_use]
    pub fn unknown_variant(&self) -> ValueErrors {
        self.error(self.name(), Some(self.name()), "is not a known subcommand")
    }
}

/// Bind a successful match, bottom-up. Values of choice fields are checked
/// against their allowed set here; every violation in the whole chain is
/// returned alongside the bound chain, which is always complete.
pub fn bind<'a>(selection: &Selection<'a>, args: &[&'a str]) -> (Bound<'a>, ValueErrors) {
    let mut errors = ValueErrors::new();

    let child = selection.child().map(|child| {
        let (child, child_errors) = bind(child, args);
        errors.extend(child_errors);
        Box::new(child)
    });

    let node = selection.node();
    let mut fields = Vec::new();

    for (token, state) in selection.matches() {
        let Some(raw) = token.extract(state, args) else {
            continue;
        };

        if let Some(choices) = token.descriptor().choices() {
            let texts: &[&str] = match raw {
                Raw::Single(ref text) => core::slice::from_ref(text),
                Raw::Many(ref texts) => texts,
                Raw::Flag(_) => &[],
            };

            for &text in texts {
                if !choices.iter().any(|choice| choice == text) {
                    errors.push(ValueError {
                        path: node.path().to_vec(),
                        field: token.name().to_owned(),
                        input: Some(text.to_owned()),
                        reason: format!("must be one of {}", quoted_list(choices)),
                    });
                }
            }
        }

        fields.push((token.name(), raw));
    }

    tracing::debug!(command = %node.invocation(), fields = fields.len(), "bound command");

    (
        Bound {
            node,
            fields,
            child,
        },
        errors,
    )
}

/// Bind a successful match and construct `T` from it, attributing any
/// failure to the arguments. The constructor runs even when a choice check
/// failed, so that errors in other fields are reported too; a field that
/// already failed its choice check isn't reported a second time.
pub fn construct<'a, T: FromBound>(
    selection: &Selection<'a>,
    args: &[&'a str],
) -> Result<T, Vec<Diagnostic>> {
    let (bound, mut errors) = bind(selection, args);

    let value = T::from_bound(&bound).map_err(|constructed| errors.merge(constructed));

    match value {
        Ok(value) if errors.is_empty() => Ok(value),
        _ => Err(attribute(selection, args, errors)),
    }
}

/// Re-associate value errors with what the user typed: the key as it was
/// spelled (`-m` rather than `--message`), the command it was given to, and
/// the literal text of the offending occurrence.
#[must_use]
pub fn attribute(selection: &Selection<'_>, args: &[&str], errors: ValueErrors) -> Vec<Diagnostic> {
    errors
        .into_iter()
        .map(|error| describe(selection, args, error))
        .collect()
}

fn describe(selection: &Selection<'_>, args: &[&str], error: ValueError) -> Diagnostic {
    let located = selection
        .find(&error.path)
        .and_then(|node| node.state(&error.field));

    let (key, literal) = match located {
        None => (arg::display_name(&error.field), None),
        Some((token, state)) => {
            let ranges = state.ranges();

            let occurrence = ranges
                .iter()
                .find(|range| Some(token.value_text(range, args)) == error.input.as_deref())
                .or_else(|| ranges.first());

            match occurrence {
                Some(range) => (
                    token.typed_key(range, args),
                    Some(token.value_text(range, args).to_owned()),
                ),
                None => (token.label(), None),
            }
        }
    };

    let literal = literal.or_else(|| error.input.clone());

    let scope = match error.path.len() > 1 {
        true => format!(" in `{}`", error.path.join(" ")),
        false => String::new(),
    };

    let message = match literal {
        Some(ref literal) => format!(
            "incorrect value for `{key}`{scope}: {reason}, given `{literal}`",
            reason = error.reason,
        ),
        None => format!("incorrect value for `{key}`{scope}: {}", error.reason),
    };

    Diagnostic {
        kind: DiagnosticKind::Value,
        message,
        key: Some(key),
        literal,
        path: error.path,
    }
}
