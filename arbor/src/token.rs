/*!
Tokens: the runtime counterpart of a declared field. A [`Token`] knows which
argument spellings belong to it, how many arguments an occurrence consumes,
and how to slice its occurrences back out of the argument list.

Tokens are immutable. What a token matched during a particular attempt is
recorded separately, in a [`TokenMatch`] owned by that attempt, so that a
failed subcommand trial can simply be dropped.
*/

use core::ops::Range;

use crate::{
    arg,
    bind::Raw,
    schema::ValueType,
    value::Value,
};

/// The compiled, immutable metadata for one field
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    pub(crate) name: String,
    pub(crate) display: String,
    pub(crate) required: bool,
    pub(crate) default: Option<Value>,
    pub(crate) value_type: ValueType,
    pub(crate) choices: Option<Vec<String>>,
    pub(crate) short: Option<char>,
    pub(crate) description: String,
}

impl FieldDescriptor {
    /// The field name, as declared
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The kebab-case name used for positionals and in messages
    #[must_use]
    pub fn display(&self) -> &str {
        &self.display
    }

    #[must_use]
    pub fn required(&self) -> bool {
        self.required
    }

    #[must_use]
    pub fn default(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    #[must_use]
    pub fn value_type(&self) -> ValueType {
        self.value_type
    }

    #[must_use]
    pub fn choices(&self) -> Option<&[String]> {
        self.choices.as_deref()
    }

    #[must_use]
    pub fn short(&self) -> Option<char> {
        self.short
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    /// Consumes exactly one non-key argument
    Positional,

    /// `--key value` or `--key=value`, at most once
    Keyword { keys: Vec<String> },

    /// Like `Keyword`, but every occurrence appends a value
    Collection { keys: Vec<String> },

    /// `--flag` or `--no-flag`; which spelling appeared is the value. Only
    /// the spellings a user may meaningfully type are present: a flag with a
    /// default exposes only the spelling opposite to it.
    Flag { on: Vec<String>, off: Vec<String> },
}

/// What a token matched during one matching attempt. Ranges are half-open
/// ranges of argument indexes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TokenMatch {
    #[default]
    Unmatched,
    Once(Range<usize>),
    Many(Vec<Range<usize>>),
}

impl TokenMatch {
    #[must_use]
    pub fn is_matched(&self) -> bool {
        !matches!(*self, TokenMatch::Unmatched)
    }

    /// Every occurrence, first to last
    #[must_use]
    pub fn ranges(&self) -> &[Range<usize>] {
        match self {
            TokenMatch::Unmatched => &[],
            TokenMatch::Once(range) => core::slice::from_ref(range),
            TokenMatch::Many(ranges) => ranges,
        }
    }
}

/// The result of offering a token the argument at the cursor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// The token consumed arguments up to (excluding) this index
    Advanced(usize),
    NoMatch,
}

/// Reasons a token refuses an argument that is addressed to it. The matcher
/// attaches the command path and turns these into
/// [`MatchError`][crate::errors::MatchError]s.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Refusal {
    Duplicate { key: String, previous: String },
    MissingValue { key: String },
    UnexpectedValue { key: String },
}

/// A declared field, ready to match arguments
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    descriptor: FieldDescriptor,
    kind: TokenKind,
}

impl Token {
    pub(crate) fn new(descriptor: FieldDescriptor, kind: TokenKind) -> Self {
        Self { descriptor, kind }
    }

    #[must_use]
    pub fn descriptor(&self) -> &FieldDescriptor {
        &self.descriptor
    }

    #[must_use]
    pub fn kind(&self) -> &TokenKind {
        &self.kind
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.descriptor.name
    }

    /// Every spelling that selects this token. Empty for positionals.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        let (first, second): (&[String], &[String]) = match self.kind {
            TokenKind::Positional => (&[], &[]),
            TokenKind::Keyword { ref keys } | TokenKind::Collection { ref keys } => (keys, &[]),
            TokenKind::Flag { ref on, ref off } => (on, off),
        };

        first.iter().chain(second).map(String::as_str)
    }

    /// The spelling used to refer to this token in messages: the display
    /// name for positionals, the spellings joined by `/` otherwise.
    #[must_use]
    pub fn label(&self) -> String {
        match self.kind {
            TokenKind::Positional => self.descriptor.display.clone(),
            _ => self.keys().collect::<Vec<_>>().join("/"),
        }
    }

    #[must_use]
    pub fn has_key(&self, key: &str) -> bool {
        self.keys().any(|known| known == key)
    }

    /// Offer this token the argument at `cursor`. Positionals accept any
    /// argument the caller has judged to be positional; option tokens accept
    /// their own keys, with `--key=value` for keywords and collections.
    pub fn try_match(
        &self,
        cursor: usize,
        args: &[&str],
        state: &mut TokenMatch,
    ) -> Result<Step, Refusal> {
        let Some(&argument) = args.get(cursor) else {
            return Ok(Step::NoMatch);
        };

        if let TokenKind::Positional = self.kind {
            return Ok(match state.is_matched() {
                true => Step::NoMatch,
                false => {
                    *state = TokenMatch::Once(cursor..cursor + 1);
                    Step::Advanced(cursor + 1)
                }
            });
        }

        let (key, inline) = match self.has_key(argument) {
            true => (argument, false),
            false => match arg::split_long(argument) {
                Some((key, _)) if self.has_key(key) => (key, true),
                _ => return Ok(Step::NoMatch),
            },
        };

        let range = match self.kind {
            TokenKind::Flag { .. } if inline => {
                return Err(Refusal::UnexpectedValue { key: key.to_owned() });
            }
            TokenKind::Flag { .. } => cursor..cursor + 1,
            _ if inline => cursor..cursor + 1,
            _ if cursor + 1 < args.len() => cursor..cursor + 2,
            _ => return Err(Refusal::MissingValue { key: key.to_owned() }),
        };

        let end = range.end;

        match (&self.kind, &mut *state) {
            (TokenKind::Collection { .. }, TokenMatch::Many(ranges)) => ranges.push(range),
            (TokenKind::Collection { .. }, state) => *state = TokenMatch::Many(Vec::from([range])),
            (_, TokenMatch::Unmatched) => *state = TokenMatch::Once(range),
            (_, state) => {
                let previous = state.ranges().first().map_or_else(String::new, |previous| {
                    self.typed_key(previous, args)
                });

                return Err(Refusal::Duplicate {
                    key: key.to_owned(),
                    previous,
                });
            }
        }

        Ok(Step::Advanced(end))
    }

    /// The value text of one occurrence. For flags this is the key itself.
    #[must_use]
    pub fn value_text<'a>(&self, range: &Range<usize>, args: &[&'a str]) -> &'a str {
        let first = args[range.start];

        match self.kind {
            TokenKind::Positional | TokenKind::Flag { .. } => first,
            _ if range.len() == 2 => args[range.start + 1],
            _ => arg::split_long(first).map_or(first, |(_, value)| value),
        }
    }

    /// The key of one occurrence, exactly as the user typed it. Positionals
    /// report their display name.
    #[must_use]
    pub fn typed_key(&self, range: &Range<usize>, args: &[&str]) -> String {
        let first = args[range.start];

        match self.kind {
            TokenKind::Positional => self.descriptor.display.clone(),
            TokenKind::Flag { .. } => first.to_owned(),
            _ => arg::split_long(first).map_or(first, |(key, _)| key).to_owned(),
        }
    }

    /// Slice this token's match state into a raw value. Returns `None` if
    /// the token never matched.
    #[must_use]
    pub fn extract<'a>(&self, state: &TokenMatch, args: &[&'a str]) -> Option<Raw<'a>> {
        match (&self.kind, state) {
            (_, TokenMatch::Unmatched) => None,
            (TokenKind::Flag { on, .. }, TokenMatch::Once(range)) => {
                Some(Raw::Flag(on.iter().any(|key| key == args[range.start])))
            }
            (TokenKind::Collection { .. }, state) => Some(Raw::Many(
                state
                    .ranges()
                    .iter()
                    .map(|range| self.value_text(range, args))
                    .collect(),
            )),
            (_, state) => state
                .ranges()
                .first()
                .map(|range| Raw::Single(self.value_text(range, args))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(name: &str) -> FieldDescriptor {
        FieldDescriptor {
            name: name.to_owned(),
            display: arg::display_name(name),
            required: false,
            default: None,
            value_type: ValueType::String,
            choices: None,
            short: None,
            description: String::new(),
        }
    }

    fn keyword() -> Token {
        Token::new(
            descriptor("repeat"),
            TokenKind::Keyword {
                keys: Vec::from(["--repeat".to_owned(), "-r".to_owned()]),
            },
        )
    }

    fn flag() -> Token {
        Token::new(
            descriptor("verbose"),
            TokenKind::Flag {
                on: Vec::from(["--verbose".to_owned()]),
                off: Vec::from(["--no-verbose".to_owned()]),
            },
        )
    }

    #[test]
    fn keyword_consumes_key_and_value() {
        let args = ["-r", "3"];
        let mut state = TokenMatch::Unmatched;

        assert_eq!(keyword().try_match(0, &args, &mut state), Ok(Step::Advanced(2)));
        assert_eq!(state, TokenMatch::Once(0..2));
        assert_eq!(keyword().extract(&state, &args), Some(Raw::Single("3")));
        assert_eq!(keyword().typed_key(&(0..2), &args), "-r");
    }

    #[test]
    fn keyword_accepts_inline_value() {
        let args = ["--repeat=3"];
        let mut state = TokenMatch::Unmatched;

        assert_eq!(keyword().try_match(0, &args, &mut state), Ok(Step::Advanced(1)));
        assert_eq!(keyword().extract(&state, &args), Some(Raw::Single("3")));
        assert_eq!(keyword().typed_key(&(0..1), &args), "--repeat");
    }

    #[test]
    fn keyword_without_value_is_refused() {
        let args = ["--repeat"];
        let mut state = TokenMatch::Unmatched;

        assert_eq!(
            keyword().try_match(0, &args, &mut state),
            Err(Refusal::MissingValue {
                key: "--repeat".to_owned()
            })
        );
    }

    #[test]
    fn keyword_ignores_other_keys() {
        let args = ["--count", "3"];
        let mut state = TokenMatch::Unmatched;

        assert_eq!(keyword().try_match(0, &args, &mut state), Ok(Step::NoMatch));
        assert!(!state.is_matched());
    }

    #[test]
    fn second_flag_spelling_is_a_duplicate() {
        let args = ["--verbose", "--no-verbose"];
        let token = flag();
        let mut state = TokenMatch::Unmatched;

        assert_eq!(token.try_match(0, &args, &mut state), Ok(Step::Advanced(1)));
        assert_eq!(
            token.try_match(1, &args, &mut state),
            Err(Refusal::Duplicate {
                key: "--no-verbose".to_owned(),
                previous: "--verbose".to_owned(),
            })
        );
    }

    #[test]
    fn flag_value_comes_from_spelling() {
        let args = ["--no-verbose"];
        let token = flag();
        let mut state = TokenMatch::Unmatched;

        token.try_match(0, &args, &mut state).unwrap();
        assert_eq!(token.extract(&state, &args), Some(Raw::Flag(false)));
    }

    #[test]
    fn flag_refuses_inline_value() {
        let args = ["--verbose=yes"];
        let mut state = TokenMatch::Unmatched;

        assert_eq!(
            flag().try_match(0, &args, &mut state),
            Err(Refusal::UnexpectedValue {
                key: "--verbose".to_owned()
            })
        );
    }

    #[test]
    fn collection_appends_in_order() {
        let token = Token::new(
            descriptor("item"),
            TokenKind::Collection {
                keys: Vec::from(["--item".to_owned()]),
            },
        );
        let args = ["--item", "a", "--item=b", "--item", "c"];
        let mut state = TokenMatch::Unmatched;

        assert_eq!(token.try_match(0, &args, &mut state), Ok(Step::Advanced(2)));
        assert_eq!(token.try_match(2, &args, &mut state), Ok(Step::Advanced(3)));
        assert_eq!(token.try_match(3, &args, &mut state), Ok(Step::Advanced(5)));
        assert_eq!(
            token.extract(&state, &args),
            Some(Raw::Many(Vec::from(["a", "b", "c"])))
        );
    }

    #[test]
    fn positional_matches_once() {
        let token = Token::new(descriptor("my_name"), TokenKind::Positional);
        let args = ["Ada", "Grace"];
        let mut state = TokenMatch::Unmatched;

        assert_eq!(token.try_match(0, &args, &mut state), Ok(Step::Advanced(1)));
        assert_eq!(token.try_match(1, &args, &mut state), Ok(Step::NoMatch));
        assert_eq!(token.extract(&state, &args), Some(Raw::Single("Ada")));
        assert_eq!(token.label(), "my-name");
    }
}
