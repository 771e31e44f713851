use std::collections::HashMap;

use crate::{arg, token::Token};

/// The alternatives hanging off one subcommand field
#[derive(Debug, Clone, PartialEq)]
pub struct SubcommandGroup {
    pub(crate) field: String,
    pub(crate) description: String,
    pub(crate) variants: Vec<CommandNode>,
}

impl SubcommandGroup {
    /// The parent field the adopted variant is stored under
    #[must_use]
    pub fn field(&self) -> &str {
        &self.field
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Variants in declaration order. Names are not required to be unique;
    /// two variants with the same name are reported as ambiguous if the
    /// input matches both.
    #[must_use]
    pub fn variants(&self) -> &[CommandNode] {
        &self.variants
    }
}

/**
One invocable unit: the root command, or one subcommand variant. Built by
[`compile`][crate::compile::compile], and never modified afterwards; which
variant was selected is recorded by the matcher in a separate
[`Selection`][crate::matcher::Selection].
*/
#[derive(Debug, Clone, PartialEq)]
pub struct CommandNode {
    pub(crate) name: String,
    pub(crate) path: Vec<String>,
    pub(crate) description: String,
    pub(crate) positionals: Vec<Token>,
    pub(crate) options: Vec<Token>,

    /// Every exposed key spelling, mapped to an index in `options`
    pub(crate) keys: HashMap<String, usize>,
    pub(crate) subcommands: Option<SubcommandGroup>,
}

impl CommandNode {
    /// The spelling used to invoke this node
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Names of this node and all of its ancestors, root first
    #[must_use]
    pub fn path(&self) -> &[String] {
        &self.path
    }

    /// The path as the user would type it: `git clone`
    #[must_use]
    pub fn invocation(&self) -> String {
        self.path.join(" ")
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Positional tokens, in the order they must appear
    #[must_use]
    pub fn positionals(&self) -> &[Token] {
        &self.positionals
    }

    /// Keyword, collection, and flag tokens, in declaration order
    #[must_use]
    pub fn options(&self) -> &[Token] {
        &self.options
    }

    #[must_use]
    pub fn subcommands(&self) -> Option<&SubcommandGroup> {
        self.subcommands.as_ref()
    }

    /// All of this node's own tokens, positionals first
    pub fn tokens(&self) -> impl Iterator<Item = &Token> {
        self.positionals.iter().chain(&self.options)
    }

    /// The token declared for a field
    #[must_use]
    pub fn token(&self, field: &str) -> Option<&Token> {
        self.tokens().find(|token| token.name() == field)
    }

    /// The index of the option an argument is addressed to, either as an
    /// exact key or in `--key=value` form.
    #[must_use]
    pub fn option_for(&self, argument: &str) -> Option<usize> {
        self.keys.get(argument).copied().or_else(|| {
            let (key, _) = arg::split_long(argument)?;
            self.keys.get(key).copied()
        })
    }
}
