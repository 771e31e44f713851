/*!
Rendering for help requests and parse failures. The rest of the crate only
produces structured values ([`HelpRequest`],
[`Diagnostic`][crate::errors::Diagnostic]); everything about how those look in
a terminal lives here.
*/

use std::{
    fmt::Display,
    io::{self, Write as _},
};

use indent_write::io::IndentWriter;
use joinery::JoinableIterator as _;
use lazy_format::lazy_format;

use crate::{
    errors::{DiagnosticKind, ParseError},
    help::HelpRequest,
    node::CommandNode,
    settings::Settings,
    token::{Token, TokenKind},
};

/// Descriptions are wrapped to this many columns, before indentation
const WRAP_WIDTH: usize = 72;

/// Items shorter than this share a line with their description
const ITEM_COLUMN: usize = 24;

const DESCRIPTION_INDENT: &str = "                        ";

fn option_synopsis(token: &Token) -> String {
    let keys = token.keys().collect::<Vec<_>>().join(", ");
    let value_type = token.descriptor().value_type();

    match *token.kind() {
        TokenKind::Flag { .. } => keys,
        TokenKind::Keyword { .. } => format!("{keys} <{value_type}>"),
        TokenKind::Collection { .. } => format!("{keys} <{value_type}>..."),
        TokenKind::Positional => format!("<{}>", token.descriptor().display()),
    }
}

fn token_description(token: &Token) -> String {
    let descriptor = token.descriptor();
    let mut description = descriptor.description().to_owned();

    let mut append = |note: &dyn Display| {
        if !description.is_empty() {
            description.push(' ');
        }
        description.push_str(&note.to_string());
    };

    if let Some(choices) = descriptor.choices() {
        append(&lazy_format!(
            "[possible values: {}]",
            choices.iter().join_with(", ")
        ));
    }

    if let Some(default) = descriptor.default() {
        append(&lazy_format!("[default: {default}]"));
    }

    if descriptor.required() && !matches!(token.kind(), TokenKind::Positional) {
        append(&"[required]");
    }

    description
}

/*
Overall structure:

DESCRIPTION

Usage:
  command subcommand [OPTIONS] <ARG> <COMMAND>

Arguments:
  <ARG>

Options:
  -f, --foo <int>
  -h, --help

Subcommands:
  name
*/
pub fn write_help(out: &mut impl io::Write, request: &HelpRequest) -> io::Result<()> {
    let command = request.command();

    if !command.description().is_empty() {
        writeln!(out, "{}", textwrap::fill(command.description(), WRAP_WIDTH))?;
    }

    section(out, "Usage", |mut out| {
        write!(out, "{}", command.invocation())?;

        if !command.options().is_empty() {
            write!(out, " [OPTIONS]")?;
        }

        command
            .positionals()
            .iter()
            .try_for_each(|token| write!(out, " <{}>", token.descriptor().display()))?;

        if command.subcommands().is_some() {
            write!(out, " <COMMAND>")?;
        }

        writeln!(out)
    })?;

    maybe_section(out, "Arguments", command.positionals(), |out, token| {
        describe(out, option_synopsis(token), &token_description(token))
    })?;

    section(out, "Options", |mut out| {
        command.options().iter().try_for_each(|token| {
            describe(&mut out, option_synopsis(token), &token_description(token))
        })?;

        describe(&mut out, "-h, --help", "Print this help message")
    })?;

    write_subcommands(out, command)
}

fn write_subcommands(out: &mut impl io::Write, command: &CommandNode) -> io::Result<()> {
    let Some(group) = command.subcommands() else {
        return Ok(());
    };

    maybe_section(out, "Subcommands", group.variants(), |out, variant| {
        let summary = variant.description().lines().next().unwrap_or("");
        describe(out, variant.name(), summary)
    })
}

/// Write one `error:` line per diagnostic, followed by a pointer to the help
/// of the command where things went wrong if the parser recognizes help
/// requests.
pub fn write_diagnostics(
    out: &mut impl io::Write,
    error: &ParseError,
    settings: &Settings,
) -> io::Result<()> {
    let diagnostics = error.diagnostics();

    diagnostics
        .iter()
        .try_for_each(|diagnostic| writeln!(out, "error: {diagnostic}"))?;

    let invocation = diagnostics
        .iter()
        .find(|diagnostic| diagnostic.kind != DiagnosticKind::Schema)
        .map(|diagnostic| diagnostic.path.join(" "));

    match invocation {
        Some(invocation) if settings.help && !invocation.is_empty() => {
            writeln!(out, "\nFor more information, try `{invocation} --help`.")
        }
        _ => Ok(()),
    }
}

/// Write a section by writing a newline, then the `header`, then an
/// indented `body`.
fn section<O: io::Write + ?Sized, T>(
    out: &mut O,
    header: &str,
    body: impl FnOnce(IndentWriter<&mut O>) -> io::Result<T>,
) -> io::Result<T> {
    writeln!(out, "\n{header}:")?;
    body(IndentWriter::new("  ", out))
}

/// Write an optional section, only if the iterator is not empty.
/// Otherwise identical to `section`.
fn maybe_section<O: io::Write + ?Sized, I: IntoIterator>(
    out: &mut O,
    header: &str,
    items: I,
    body: impl Fn(&mut IndentWriter<&mut O>, I::Item) -> io::Result<()>,
) -> io::Result<()> {
    let mut items = items.into_iter();

    match items.next() {
        None => Ok(()),
        Some(first) => section(out, header, |mut out| {
            body(&mut out, first)?;
            items.try_for_each(|item| body(&mut out, item))
        }),
    }
}

/// Describe an item by printing the item, followed by its description. If
/// the item is short and the description is a single line, they share a
/// line; otherwise the description goes underneath, indented.
fn describe(
    out: &mut (impl io::Write + ?Sized),
    item: impl Display,
    description: &str,
) -> io::Result<()> {
    let item = item.to_string();

    if description.is_empty() {
        return writeln!(out, "{item}");
    }

    let description = textwrap::fill(description, WRAP_WIDTH - ITEM_COLUMN);

    match ITEM_COLUMN.checked_sub(item.len()) {
        Some(space) if space >= 2 && !description.contains('\n') => {
            writeln!(out, "{item}{:space$}{description}", "")
        }
        _ => {
            writeln!(out, "{item}")?;
            let mut out = IndentWriter::new(DESCRIPTION_INDENT, out);
            writeln!(out, "{description}")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        compile::compile,
        errors::MatchError,
        schema::{Field, Schema, ValueType},
    };

    fn render(write: impl FnOnce(&mut Vec<u8>) -> io::Result<()>) -> String {
        let mut out = Vec::new();
        write(&mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn help_lists_every_section() {
        let schema = Schema::new("greet")
            .describe("Greet someone.")
            .field(Field::value("name", ValueType::String).describe("Who to greet"))
            .field(Field::value("repeat", ValueType::Integer).default(10i64).short('r'))
            .field(Field::subcommand(
                "mode",
                [Schema::new("loud").describe("Shout it")],
            ));
        let root = compile(&schema).unwrap();
        let help = render(|out| write_help(out, &HelpRequest::new(&root)));

        assert!(help.starts_with("Greet someone.\n"));
        assert!(help.contains("greet [OPTIONS] <name> <COMMAND>\n"));
        assert!(help.contains("<name>"));
        assert!(help.contains("Who to greet"));
        assert!(help.contains("--repeat, -r <int>"));
        assert!(help.contains("[default: 10]"));
        assert!(help.contains("\nSubcommands:\n"));
        assert!(help.contains("Shout it"));
    }

    #[test]
    fn diagnostics_point_at_help() {
        let error = ParseError::Match(MatchError::MissingPositional {
            path: Vec::from(["git".to_owned(), "clone".to_owned()]),
            key: "repo".into(),
            cursor: 1,
            consumed: Vec::from(["clone".to_owned()]),
        });

        let output = render(|out| write_diagnostics(out, &error, &Settings::default()));

        assert_eq!(
            output,
            "error: missing a value for positional argument `repo`\n\n\
             For more information, try `git clone --help`.\n"
        );
    }

    #[test]
    fn no_help_pointer_without_help() {
        let error = ParseError::Match(MatchError::TrailingInput {
            path: Vec::from(["git".to_owned()]),
            index: 0,
            argument: "--help".to_owned(),
        });

        let output = render(|out| write_diagnostics(out, &error, &Settings::new().help(false)));

        assert_eq!(output, "error: unexpected argument `--help`\n");
    }
}
