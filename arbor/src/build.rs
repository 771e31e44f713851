use crate::{bind::Bound, errors::ValueErrors, schema::Schema};

/**
A type that can be constructed from one bound command node. This is the
value-construction step of a parse: by the time it runs, matching has
succeeded and every field's raw text has been sliced out of the arguments.

Implementations should collect the errors of all of their fields (see
[`ValueErrors::collect`]) rather than stopping at the first, and should
report each one against the field it came from so that it can be traced back
to what the user typed. [`Record`][crate::Record] implements this for
untyped results; `#[derive(Command)]` implements it for structs.
*/
pub trait FromBound: Sized {
    fn from_bound(bound: &Bound<'_>) -> Result<Self, ValueErrors>;
}

/// A type that describes a whole command: its [`Schema`] and how to build
/// itself from a successful match against that schema.
pub trait Command: FromBound {
    fn schema() -> Schema;
}

/**
A set of mutually exclusive subcommands, used as the type of a subcommand
field. Each variant corresponds to one [`Schema`], named by the spelling the
user types to select it.
*/
pub trait Subcommands: Sized {
    fn variants() -> Vec<Schema>;

    /// Build from the adopted variant. `bound.name()` is the variant's name.
    fn from_variant(bound: &Bound<'_>) -> Result<Self, ValueErrors>;
}
