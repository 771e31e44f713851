mod error;

use std::{
    io::{self, Write as _},
    path::PathBuf,
    process::ExitCode,
    str::FromStr,
};

use anyhow::Context as _;
use arbor::{Choice, Command, Parsed, ParsedValue, Settings, Subcommands, printers};
use lazy_format::lazy_format;
use tracing_subscriber::EnvFilter;

use crate::error::DepthError;

/// A tiny version control front end
#[derive(Command, Debug)]
#[arbor(name = "git")]
struct Git {
    /// Print more about what's happening
    #[arbor(short, default)]
    verbose: bool,

    /// Run as if started in this directory
    #[arbor(short = 'C')]
    directory: Option<PathBuf>,

    #[arbor(subcommand)]
    command: GitCommand,
}

#[derive(Subcommands, Debug)]
enum GitCommand {
    /// Clone a repository into a new directory
    Clone(CloneArgs),

    /// Join two or more development histories together
    Merge(MergeArgs),

    /// Show the working tree status
    Status,
}

#[derive(Command, Debug)]
struct CloneArgs {
    /// The repository to clone from
    repo: String,

    /// Create a shallow clone with this many commits
    depth: Option<Depth>,

    /// Only clone these branches
    #[arbor(short)]
    branch: Vec<String>,
}

#[derive(Command, Debug)]
struct MergeArgs {
    /// The branch to merge into the current one
    branch: String,

    #[arbor(short, default)]
    strategy: Strategy,

    /// Use this as the commit message
    #[arbor(short)]
    message: Option<String>,
}

#[derive(Choice, Debug, Default, Clone, Copy)]
enum Strategy {
    #[default]
    Ort,
    Recursive,
    Resolve,
    Octopus,
    Ours,
}

#[derive(Debug, Clone, Copy)]
struct Depth(u32);

impl FromStr for Depth {
    type Err = DepthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.parse()? {
            0 => Err(DepthError::Zero),
            depth => Ok(Depth(depth)),
        }
    }
}

impl ParsedValue for Depth {
    const TYPE: arbor::ValueType = arbor::ValueType::NonNegativeInteger;
}

fn run(git: Git) -> anyhow::Result<()> {
    tracing::debug!(?git, "parsed arguments");

    let mut out = io::stdout().lock();

    if let Some(ref directory) = git.directory {
        writeln!(out, "in {}", directory.display())?;
    }

    match git.command {
        GitCommand::Clone(clone) => {
            writeln!(
                out,
                "cloning {}{}",
                clone.repo,
                lazy_format!(match (clone.depth) {
                    Some(Depth(depth)) => " ({depth} commits deep)",
                    None => "",
                })
            )?;

            for branch in &clone.branch {
                writeln!(out, "  tracking {branch}")?;
            }
        }
        GitCommand::Merge(merge) => {
            writeln!(
                out,
                "merging {} with the {:?} strategy",
                merge.branch, merge.strategy
            )?;

            if let Some(message) = merge.message {
                writeln!(out, "  message: {message}")?;
            }
        }
        GitCommand::Status => writeln!(out, "nothing to commit, working tree clean")?,
    }

    if git.verbose {
        writeln!(out, "done")?;
    }

    out.flush().context("failed to flush stdout")
}

fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();

    match arbor::parse::<Git, _>(&args) {
        Ok(Parsed::Value(git)) => run(git).map(|()| ExitCode::SUCCESS),
        Ok(Parsed::Help(request)) => {
            printers::write_help(&mut io::stdout().lock(), &request)
                .context("failed to write help")?;
            Ok(ExitCode::SUCCESS)
        }
        Err(error) => {
            printers::write_diagnostics(&mut io::stderr().lock(), &error, &Settings::default())
                .context("failed to write diagnostics")?;
            Ok(ExitCode::from(error.status()))
        }
    }
}
