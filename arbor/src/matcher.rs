/*!
The matching engine. Consumes an argument list against a tree of
[`CommandNode`]s and reports which tokens matched which arguments, and which
subcommand variant (if any) was adopted at each level.

Matching never modifies the tree. Each attempt owns its own [`TokenMatch`]
state, so trying a subcommand variant and discarding it is just a matter of
dropping the trial. The result of a successful match is a [`Selection`]: a
chain of nodes from the root down to the deepest adopted variant, each with
the match state of its own tokens.
*/

use core::ops::Range;

use crate::{
    arg,
    errors::MatchError,
    help::HelpRequest,
    node::CommandNode,
    settings::Settings,
    token::{Refusal, Step, Token, TokenKind, TokenMatch},
};

/// What matched at one node, plus the adopted child, if any
#[derive(Debug, Clone, PartialEq)]
pub struct Selection<'n> {
    node: &'n CommandNode,
    positionals: Vec<TokenMatch>,
    options: Vec<TokenMatch>,
    span: Range<usize>,
    child: Option<Box<Selection<'n>>>,
}

impl<'n> Selection<'n> {
    #[must_use]
    pub fn node(&self) -> &'n CommandNode {
        self.node
    }

    /// The arguments this node and its descendants consumed. For a
    /// subcommand, this includes its name.
    #[must_use]
    pub fn span(&self) -> Range<usize> {
        self.span.clone()
    }

    #[must_use]
    pub fn child(&self) -> Option<&Selection<'n>> {
        self.child.as_deref()
    }

    /// Every token of this node with its match state
    pub fn matches(&self) -> impl Iterator<Item = (&'n Token, &TokenMatch)> {
        let node = self.node;
        let positionals = node.positionals.iter().zip(&self.positionals);
        let options = node.options.iter().zip(&self.options);

        positionals.chain(options)
    }

    /// The match state of one field's token
    #[must_use]
    pub fn state(&self, field: &str) -> Option<(&'n Token, &TokenMatch)> {
        self.matches().find(|(token, _)| token.name() == field)
    }

    /// This selection and every adopted descendant, root first
    pub fn chain(&self) -> impl Iterator<Item = &Selection<'n>> {
        core::iter::successors(Some(self), |selection| selection.child())
    }

    /// The selection in this chain for the node with the given path
    #[must_use]
    pub fn find(&self, path: &[String]) -> Option<&Selection<'n>> {
        self.chain().find(|selection| selection.node.path() == path)
    }

    /// The deepest adopted node
    #[must_use]
    pub fn leaf(&self) -> &Selection<'n> {
        self.chain().last().unwrap_or(self)
    }
}

/// A successful match: either a complete selection, or a request for help
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<'n> {
    Matched(Selection<'n>),
    Help(HelpRequest),
}

#[derive(Debug, Clone, Copy, Default)]
struct Cursor {
    index: usize,

    /// Set once a bare `--` has been consumed
    positional_only: bool,
}

struct Input<'a, 's> {
    args: &'a [&'a str],
    settings: &'s Settings,
}

fn refused(node: &CommandNode, refusal: Refusal) -> MatchError {
    let path = node.path().to_vec();

    match refusal {
        Refusal::Duplicate { key, previous } => MatchError::Duplicate {
            path,
            key,
            previous,
        },
        Refusal::MissingValue { key } => MatchError::MissingValue { path, key },
        Refusal::UnexpectedValue { key } => MatchError::UnexpectedValue { path, key },
    }
}

/// Match the whole argument list against the root of a command tree. Unlike
/// matching an individual node, this fails if any argument is left over.
pub fn match_root<'n>(
    root: &'n CommandNode,
    args: &[&str],
    settings: &Settings,
) -> Result<Outcome<'n>, MatchError> {
    let input = Input { args, settings };

    let selection = match match_node(root, &input, Cursor::default())? {
        Outcome::Help(request) => return Ok(Outcome::Help(request)),
        Outcome::Matched(selection) => selection,
    };

    let end = selection.span.end;

    match args.get(end) {
        None => Ok(Outcome::Matched(selection)),
        Some(argument) => {
            tracing::debug!(index = end, argument, "arguments left over after matching");

            Err(MatchError::TrailingInput {
                path: selection.leaf().node.path().to_vec(),
                index: end,
                argument: (*argument).to_owned(),
            })
        }
    }
}

/// Run this node's pass over the arguments starting at `cursor`: match its
/// own tokens until no more progress can be made, check that every required
/// token matched, then try its subcommand variants.
fn match_node<'n>(
    node: &'n CommandNode,
    input: &Input<'_, '_>,
    mut cursor: Cursor,
) -> Result<Outcome<'n>, MatchError> {
    tracing::debug!(command = %node.invocation(), cursor = cursor.index, "matching command");

    let args = input.args;
    let start = cursor.index;
    let mut positionals = vec![TokenMatch::Unmatched; node.positionals.len()];
    let mut options = vec![TokenMatch::Unmatched; node.options.len()];

    while let Some(&argument) = args.get(cursor.index) {
        if !cursor.positional_only {
            if argument == arg::SEPARATOR {
                cursor.positional_only = true;
                cursor.index += 1;
                continue;
            }

            if input.settings.help && arg::HELP_KEYS.contains(&argument) {
                tracing::debug!(command = %node.invocation(), "help requested");
                return Ok(Outcome::Help(HelpRequest::new(node)));
            }

            if let Some(index) = node.option_for(argument) {
                let token = &node.options[index];

                match token.try_match(cursor.index, args, &mut options[index]) {
                    Ok(Step::Advanced(next)) => {
                        tracing::trace!(field = token.name(), from = cursor.index, to = next, "matched option");
                        cursor.index = next;
                        continue;
                    }
                    Ok(Step::NoMatch) => break,
                    Err(refusal) => return Err(refused(node, refusal)),
                }
            }
        }

        let positional = cursor.positional_only
            || arg::looks_positional(argument, input.settings.negative_numbers);

        let Some(index) = positionals.iter().position(|state| !state.is_matched()) else {
            break;
        };

        if !positional {
            break;
        }

        let token = &node.positionals[index];

        match token.try_match(cursor.index, args, &mut positionals[index]) {
            Ok(Step::Advanced(next)) => {
                tracing::trace!(field = token.name(), index = cursor.index, "matched positional");
                cursor.index = next;
            }
            Ok(Step::NoMatch) => break,
            Err(refusal) => return Err(refused(node, refusal)),
        }
    }

    if let Some((token, _)) = node
        .positionals
        .iter()
        .zip(&positionals)
        .find(|(_, state)| !state.is_matched())
    {
        return Err(MatchError::MissingPositional {
            path: node.path().to_vec(),
            key: token.descriptor().display().to_owned(),
            cursor: cursor.index,
            consumed: args[..cursor.index].iter().map(|&argument| argument.to_owned()).collect(),
        });
    }

    let missing = node
        .options
        .iter()
        .zip(&options)
        .find(|(token, state)| token.descriptor().required() && !state.is_matched());

    if let Some((token, _)) = missing {
        let path = node.path().to_vec();
        let key = token.label();

        return Err(match *token.kind() {
            TokenKind::Flag { .. } => MatchError::MissingFlag { path, key },
            _ => MatchError::MissingOption { path, key },
        });
    }

    let child = match node.subcommands() {
        None => None,
        Some(group) => match match_variants(node, group.variants(), input, cursor)? {
            Outcome::Help(request) => return Ok(Outcome::Help(request)),
            Outcome::Matched(child) => {
                cursor.index = child.span.end;
                Some(Box::new(child))
            }
        },
    };

    Ok(Outcome::Matched(Selection {
        node,
        positionals,
        options,
        span: start..cursor.index,
        child,
    }))
}

/// Try every variant whose name is at the cursor, each independently, then
/// judge the results together.
fn match_variants<'n>(
    node: &'n CommandNode,
    variants: &'n [CommandNode],
    input: &Input<'_, '_>,
    cursor: Cursor,
) -> Result<Outcome<'n>, MatchError> {
    let found = input.args.get(cursor.index).copied();

    let mut successes: Vec<Selection<'n>> = Vec::new();
    let mut help = None;
    let mut failure = None;

    let trial_cursor = Cursor {
        index: cursor.index + 1,
        ..cursor
    };

    for variant in variants.iter().filter(|variant| Some(variant.name()) == found) {
        match match_node(variant, input, trial_cursor) {
            Ok(Outcome::Matched(mut selection)) => {
                selection.span.start = cursor.index;
                successes.push(selection);
            }
            Ok(Outcome::Help(request)) => {
                help.get_or_insert(request);
            }
            Err(error) => {
                tracing::debug!(command = %variant.invocation(), %error, "variant rejected");
                failure.get_or_insert(error);
            }
        }
    }

    if let Some(request) = help {
        return Ok(Outcome::Help(request));
    }

    match successes.len() {
        0 => Err(failure.unwrap_or_else(|| MatchError::NoMatchingSubcommand {
            path: node.path().to_vec(),
            expected: variants.iter().map(|variant| variant.name().to_owned()).collect(),
            found: found.map(str::to_owned),
        })),
        1 => {
            let selection = successes.remove(0);
            tracing::debug!(command = %selection.node.invocation(), "adopted subcommand");
            Ok(Outcome::Matched(selection))
        }
        _ => Err(MatchError::AmbiguousSubcommand {
            path: node.path().to_vec(),
            candidates: successes
                .iter()
                .map(|selection| selection.node.invocation())
                .collect(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        compile::compile,
        schema::{Field, Schema, ValueType},
    };

    fn args<'a>(args: &[&'a str]) -> Vec<&'a str> {
        args.to_vec()
    }

    fn git() -> CommandNode {
        let schema = Schema::new("git").field(Field::subcommand(
            "command",
            [
                Schema::new("clone").field(Field::value("repo", ValueType::String)),
                Schema::new("merge").field(Field::value("branch", ValueType::String)),
            ],
        ));

        compile(&schema).unwrap()
    }

    fn matched<'n>(outcome: Result<Outcome<'n>, MatchError>) -> Selection<'n> {
        match outcome {
            Ok(Outcome::Matched(selection)) => selection,
            other => panic!("expected a match, got {other:?}"),
        }
    }

    #[test]
    fn adopts_the_named_variant() {
        let root = git();
        let input = args(&["merge", "main"]);
        let selection = matched(match_root(&root, &input, &Settings::default()));

        let child = selection.child().unwrap();
        assert_eq!(child.node().name(), "merge");
        assert_eq!(child.span(), 0..2);
        assert_eq!(selection.span(), 0..2);
        assert_eq!(child.state("branch").unwrap().1, &TokenMatch::Once(1..2));
    }

    #[test]
    fn unknown_variant() {
        let root = git();
        let input = args(&["deploy"]);

        assert_eq!(
            match_root(&root, &input, &Settings::default()),
            Err(MatchError::NoMatchingSubcommand {
                path: Vec::from(["git".to_owned()]),
                expected: Vec::from(["clone".to_owned(), "merge".to_owned()]),
                found: Some("deploy".to_owned()),
            })
        );
    }

    #[test]
    fn failing_variant_reports_its_own_error() {
        let root = git();
        let input = args(&["clone"]);

        assert!(matches!(
            match_root(&root, &input, &Settings::default()),
            Err(MatchError::MissingPositional { ref key, ref path, .. })
                if key == "repo" && path == &["git", "clone"]
        ));
    }

    #[test]
    fn overlapping_variants_are_ambiguous() {
        let schema = Schema::new("tool").field(Field::subcommand(
            "command",
            [
                Schema::new("run").field(Field::value("target", ValueType::String)),
                Schema::new("run").field(Field::value("script", ValueType::String)),
            ],
        ));
        let root = compile(&schema).unwrap();
        let input = args(&["run", "build"]);

        assert!(matches!(
            match_root(&root, &input, &Settings::default()),
            Err(MatchError::AmbiguousSubcommand { ref candidates, .. }) if candidates.len() == 2
        ));
    }

    #[test]
    fn help_in_a_variant() {
        let root = git();
        let input = args(&["clone", "--help"]);

        match match_root(&root, &input, &Settings::default()) {
            Ok(Outcome::Help(request)) => assert_eq!(request.path(), ["git", "clone"]),
            other => panic!("expected help, got {other:?}"),
        }
    }

    #[test]
    fn separator_makes_everything_positional() {
        let schema = Schema::new("echo")
            .field(Field::value("text", ValueType::String))
            .field(Field::flag("loud").default(false));
        let root = compile(&schema).unwrap();
        let input = args(&["--", "--loud"]);
        let selection = matched(match_root(&root, &input, &Settings::default()));

        assert_eq!(selection.state("text").unwrap().1, &TokenMatch::Once(1..2));
        assert!(!selection.state("loud").unwrap().1.is_matched());
    }

    #[test]
    fn trailing_arguments() {
        let schema = Schema::new("echo").field(Field::value("text", ValueType::String));
        let root = compile(&schema).unwrap();
        let input = args(&["a", "b"]);

        assert_eq!(
            match_root(&root, &input, &Settings::default()),
            Err(MatchError::TrailingInput {
                path: Vec::from(["echo".to_owned()]),
                index: 1,
                argument: "b".to_owned(),
            })
        );
    }

    #[test]
    fn negative_numbers_can_be_disabled() {
        let schema = Schema::new("calc").field(Field::value("number", ValueType::Integer));
        let root = compile(&schema).unwrap();
        let input = args(&["-5"]);

        assert!(matched(match_root(&root, &input, &Settings::default())).state("number").is_some());
        assert!(matches!(
            match_root(&root, &input, &Settings::new().negative_numbers(false)),
            Err(MatchError::MissingPositional { .. })
        ));
    }

    #[test]
    fn collections_may_be_absent_unless_required() {
        let optional = compile(&Schema::new("tag").field(Field::collection("label", ValueType::String))).unwrap();
        let required = compile(
            &Schema::new("tag").field(Field::collection("label", ValueType::String).required()),
        )
        .unwrap();
        let input = args(&[]);

        let selection = matched(match_root(&optional, &input, &Settings::default()));
        assert!(!selection.state("label").unwrap().1.is_matched());

        assert_eq!(
            match_root(&required, &input, &Settings::default()),
            Err(MatchError::MissingOption {
                path: Vec::from(["tag".to_owned()]),
                key: "--label".to_owned(),
            })
        );
    }
}
