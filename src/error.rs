//! Error types raised while parsing and evaluating a command.

use std::io;

use thiserror::Error;

/// A command line that cannot be turned into a command.
#[derive(Debug, Error, PartialEq)]
pub enum ParseError {
    #[error("unclosed single quote")]
    UnclosedSingleQuote,

    #[error("unclosed double quote")]
    UnclosedDoubleQuote,

    #[error("unrecognized file descriptor `{0}`")]
    UnrecognizedFileDescriptor(String),

    #[error("only one redirection per command is supported")]
    MultipleRedirections,

    #[error("missing command before redirection")]
    MissingCommand,
}

/// Bad arguments or a failed effect inside a built-in.
#[derive(Debug, Error)]
pub enum BuiltinError {
    #[error("cd: missing argument")]
    CdMissingArgument,

    #[error("cd: HOME not set")]
    CdHomeNotSet,

    #[error("cd: {0}: No such file or directory")]
    CdNoSuchFile(String),

    #[error("cd: {0}: Not a directory")]
    CdNotADirectory(String),

    #[error("cd: {0}: Permission denied")]
    CdPermissionDenied(String),

    #[error("cd: {path}: {source}")]
    Cd { path: String, source: io::Error },

    #[error("exit: {0}: numeric argument required")]
    ExitNumericArgument(String),

    #[error("Usage: type <command>")]
    TypeUsage,

    #[error("{0}: not found")]
    TypeNotFound(String),

    #[error("write error: {0}")]
    Io(#[from] io::Error),
}

/// Any failure while handling one command line. None of them stop the shell.
#[derive(Debug, Error)]
pub enum ShellError {
    #[error("syntax error: {0}")]
    Parse(#[from] ParseError),

    #[error("{0}: command not found")]
    CommandNotFound(String),

    #[error("Error opening file for redirection: {0}")]
    Redirection(#[source] io::Error),

    #[error("Error executing {command}: {source}")]
    Spawn { command: String, source: io::Error },

    #[error(transparent)]
    Builtin(#[from] BuiltinError),
}
