//! Abstract syntax tree types for a command.

use std::path::PathBuf;

/// A parsed command line.
#[derive(Debug, PartialEq)]
pub struct Command {
    /// The first word of the line.
    pub name: String,

    /// Every remaining word, in order.
    pub args: Vec<String>,

    /// Where the output of the command goes, if not the default streams.
    pub redirection: Option<RedirectionSpec>,
}

/// A single output redirection attached to a command.
#[derive(Debug, PartialEq)]
pub struct RedirectionSpec {
    pub stream: TargetStream,
    pub mode: WriteMode,
    pub target: PathBuf,
}

/// The stream a redirection reroutes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TargetStream {
    Stdout,
    Stderr,
}

/// How a redirection target file is opened.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum WriteMode {
    /// Create or overwrite.
    Truncate,

    /// Create if absent, then append.
    Append,
}

/// A shell built-in command.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum BuiltIn {
    /// Changes the working directory to a given path.
    Cd,

    /// Echos back user input.
    Echo,

    /// Exits the shell with a return code.
    Exit,

    /// Prints the working directory.
    Pwd,

    /// Displays the type of command.
    Type,
}

impl BuiltIn {
    /// Every built-in, in alphabetical order.
    pub const ALL: [BuiltIn; 5] = [
        BuiltIn::Cd,
        BuiltIn::Echo,
        BuiltIn::Exit,
        BuiltIn::Pwd,
        BuiltIn::Type,
    ];

    /// Looks up a built-in by the name typed at the prompt.
    pub fn from_name(name: &str) -> Option<BuiltIn> {
        Self::ALL.into_iter().find(|built_in| built_in.name() == name)
    }

    pub fn name(self) -> &'static str {
        match self {
            BuiltIn::Cd => "cd",
            BuiltIn::Echo => "echo",
            BuiltIn::Exit => "exit",
            BuiltIn::Pwd => "pwd",
            BuiltIn::Type => "type",
        }
    }
}

/// What a command name refers to.
#[derive(Debug, PartialEq)]
pub enum ResolvedCommand {
    BuiltIn(BuiltIn),
    External(PathBuf),
    NotFound(String),
}
