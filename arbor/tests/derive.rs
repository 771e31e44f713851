use std::{collections::BTreeSet, path::PathBuf};

use arbor::{
    Choice, Command, ParseError, Parsed, Parser, Subcommands, ValueType,
    errors::MatchError,
    schema::{Requirement, Shape},
};
use rstest::rstest;

/// Greet someone
#[derive(Command, Debug, PartialEq)]
struct Greet {
    /// Who to greet
    name: String,

    #[arbor(short, default = 10)]
    repeat: u32,

    #[arbor(default)]
    shout: bool,
}

#[derive(Command, Debug, PartialEq)]
struct Render {
    #[arbor(default = true)]
    color: bool,

    #[arbor(default = 80)]
    width: u32,

    #[arbor(short)]
    level: BTreeSet<u32>,
}

#[derive(Command, Debug, PartialEq)]
#[arbor(name = "git")]
struct Git {
    #[arbor(short = 'C')]
    directory: Option<PathBuf>,

    #[arbor(subcommand)]
    command: GitCommand,
}

#[derive(Subcommands, Debug, PartialEq)]
enum GitCommand {
    /// Clone a repository
    Clone(CloneArgs),
    Merge(MergeArgs),
    Status,
}

#[derive(Command, Debug, PartialEq)]
struct CloneArgs {
    repo: String,

    #[arbor(short)]
    branch: Vec<String>,
}

#[derive(Command, Debug, PartialEq)]
struct MergeArgs {
    branch: String,

    #[arbor(short, default)]
    strategy: Strategy,

    #[arbor(short)]
    message: Option<String>,

    /// Whether to create a merge commit
    commit: bool,
}

#[derive(Choice, Debug, Default, PartialEq, Clone, Copy)]
enum Strategy {
    #[default]
    Ort,
    Recursive,
    #[arbor(name = "theirs")]
    TakeTheirs,
}

fn value<T: arbor::Command + std::fmt::Debug>(args: &[&str]) -> T {
    match arbor::parse::<T, _>(args) {
        Ok(Parsed::Value(value)) => value,
        other => panic!("expected a value from {args:?}, got {other:?}"),
    }
}

fn failure<T: arbor::Command + std::fmt::Debug>(args: &[&str]) -> ParseError {
    match arbor::parse::<T, _>(args) {
        Err(error) => error,
        Ok(parsed) => panic!("expected {args:?} to fail, got {parsed:?}"),
    }
}

#[test]
fn derived_schema() {
    let schema = Greet::schema();
    let fields = schema.fields();

    assert_eq!(schema.name(), "greet");
    assert_eq!(schema.description(), "Greet someone");

    assert_eq!(fields[0].name(), "name");
    assert_eq!(fields[0].shape(), &Shape::Value(ValueType::String));
    assert_eq!(fields[0].requirement(), &Requirement::Required);
    assert_eq!(fields[0].description(), "Who to greet");

    assert_eq!(fields[1].shape(), &Shape::Value(ValueType::NonNegativeInteger));
    assert_eq!(fields[1].short_alias(), Some('r'));
    assert_eq!(fields[1].requirement(), &Requirement::Optional(None));

    assert_eq!(fields[2].shape(), &Shape::Flag);
}

#[rstest]
#[case(&["Ada"], 10, false)]
#[case(&["Ada", "-r", "3"], 3, false)]
#[case(&["--shout", "--repeat=2", "Ada"], 2, true)]
fn greet(#[case] args: &[&str], #[case] repeat: u32, #[case] shout: bool) {
    assert_eq!(
        value::<Greet>(args),
        Greet {
            name: "Ada".to_owned(),
            repeat,
            shout,
        }
    );
}

#[test]
fn subcommand_variants() {
    assert_eq!(
        value::<Git>(&["clone", "my-repo", "-b", "main", "--branch", "dev"]),
        Git {
            directory: None,
            command: GitCommand::Clone(CloneArgs {
                repo: "my-repo".to_owned(),
                branch: Vec::from(["main".to_owned(), "dev".to_owned()]),
            }),
        }
    );

    assert_eq!(
        value::<Git>(&["-C", "/tmp", "status"]),
        Git {
            directory: Some(PathBuf::from("/tmp")),
            command: GitCommand::Status,
        }
    );
}

#[test]
fn subcommand_descriptions_come_from_variant_docs() {
    let variants = GitCommand::variants();
    let names: Vec<&str> = variants.iter().map(|variant| variant.name()).collect();

    assert_eq!(names, ["clone", "merge", "status"]);
    assert_eq!(variants[0].description(), "Clone a repository");
}

#[test]
fn choices() {
    assert_eq!(
        value::<Git>(&["merge", "topic", "--no-commit", "-s", "theirs", "-m", "done"]),
        Git {
            directory: None,
            command: GitCommand::Merge(MergeArgs {
                branch: "topic".to_owned(),
                strategy: Strategy::TakeTheirs,
                message: Some("done".to_owned()),
                commit: false,
            }),
        }
    );

    assert_eq!(
        <Strategy as arbor::Parameter>::choices(),
        Some(&["ort", "recursive", "theirs"][..])
    );
}

#[test]
fn invalid_choice_is_attributed() {
    let error = failure::<Git>(&["merge", "topic", "--commit", "-s", "octopus"]);

    assert_eq!(
        error.diagnostics()[0].message,
        "incorrect value for `-s` in `git merge`: must be one of `ort`, `recursive`, `theirs`, given `octopus`"
    );
}

#[test]
fn required_flag_in_a_subcommand() {
    match failure::<Git>(&["merge", "topic"]) {
        ParseError::Match(MatchError::MissingFlag { path, key }) => {
            assert_eq!(path, ["git", "merge"]);
            assert_eq!(key, "--commit/--no-commit");
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[rstest]
#[case(&[], true, 80, &[])]
#[case(&["--no-color"], false, 80, &[])]
#[case(&["--width", "100", "-l", "3", "-l", "1", "--level=3"], true, 100, &[1, 3])]
fn literal_defaults_and_sets(
    #[case] args: &[&str],
    #[case] color: bool,
    #[case] width: u32,
    #[case] level: &[u32],
) {
    assert_eq!(
        value::<Render>(args),
        Render {
            color,
            width,
            level: level.iter().copied().collect(),
        }
    );
}

#[test]
fn a_true_default_only_exposes_the_negative_spelling() {
    let schema = Render::schema();

    assert_eq!(schema.fields()[0].shape(), &Shape::Flag);
    assert_eq!(
        schema.fields()[0].requirement(),
        &Requirement::Optional(Some(arbor::Value::Bool(true)))
    );

    assert!(matches!(
        failure::<Render>(&["--color"]),
        ParseError::Match(MatchError::TrailingInput { ref argument, .. }) if argument == "--color"
    ));
}

#[test]
fn every_value_error_is_reported() {
    let error = failure::<Render>(&["--width", "-1", "-l", "2", "-l", "high"]);
    let diagnostics = error.diagnostics();

    assert_eq!(diagnostics.len(), 2);
    assert_eq!(diagnostics[0].key.as_deref(), Some("--width"));
    assert_eq!(diagnostics[0].literal.as_deref(), Some("-1"));
    assert_eq!(diagnostics[1].key.as_deref(), Some("-l"));
    assert_eq!(diagnostics[1].literal.as_deref(), Some("high"));
}

#[test]
fn help_for_a_derived_command() {
    let parser = Parser::for_command::<Git>().unwrap();

    match parser.parse::<Git, _>(&["merge", "-h"]) {
        Ok(Parsed::Help(request)) => {
            assert_eq!(request.path(), ["git", "merge"]);
            assert!(request.command().token("strategy").is_some());
        }
        other => panic!("expected help, got {other:?}"),
    }
}
