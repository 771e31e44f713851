use crate::node::CommandNode;

/**
The user asked for help with `-h` or `--help`. This is a successful outcome
of a parse, not an error: it carries the command the request was made in, so
that a presentation layer (such as [`write_help`][crate::printers::write_help])
can describe that command.
*/
#[derive(Debug, Clone, PartialEq)]
pub struct HelpRequest {
    command: CommandNode,
}

impl HelpRequest {
    pub(crate) fn new(command: &CommandNode) -> Self {
        Self {
            command: command.clone(),
        }
    }

    /// The command whose help was requested
    #[must_use]
    pub fn command(&self) -> &CommandNode {
        &self.command
    }

    #[must_use]
    pub fn path(&self) -> &[String] {
        self.command.path()
    }
}
