//! The commands implemented inside the shell.

use std::io::Write;

use crate::ast::{BuiltIn, ResolvedCommand};
use crate::error::BuiltinError;
use crate::eval_result::Flow;
use crate::system::{change_directory, resolve, Environment};

/// Evaluates a built in command, writing its output to `stdout`.
pub fn eval_built_in(
    env: &mut Environment,
    built_in: BuiltIn,
    args: &[String],
    stdout: &mut dyn Write,
) -> Result<Flow, BuiltinError> {
    match built_in {
        BuiltIn::Cd => {
            let path = args.first().ok_or(BuiltinError::CdMissingArgument)?;
            change_directory(env, path)?;
            Ok(Flow::Continue)
        }
        BuiltIn::Echo => {
            writeln!(stdout, "{}", args.join(" "))?;
            Ok(Flow::Continue)
        }
        BuiltIn::Exit => exit(args),
        BuiltIn::Pwd => {
            writeln!(stdout, "{}", env.current_dir.display())?;
            Ok(Flow::Continue)
        }
        BuiltIn::Type => {
            let command = args.first().ok_or(BuiltinError::TypeUsage)?;
            match resolve(env, command) {
                ResolvedCommand::BuiltIn(_) => writeln!(stdout, "{command} is a shell builtin")?,
                ResolvedCommand::External(path) => {
                    writeln!(stdout, "{command} is {}", path.display())?
                }
                ResolvedCommand::NotFound(name) => Err(BuiltinError::TypeNotFound(name))?,
            }
            Ok(Flow::Continue)
        }
    }
}

/// Parses the optional exit status. A status that is not a number is
/// reported and the shell keeps running.
fn exit(args: &[String]) -> Result<Flow, BuiltinError> {
    match args.first() {
        None => Ok(Flow::Exit(0)),
        Some(status) => status
            .parse()
            .map(Flow::Exit)
            .map_err(|_| BuiltinError::ExitNumericArgument(status.clone())),
    }
}
