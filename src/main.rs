mod ast;
mod builtin;
mod editing;
mod error;
mod eval;
mod eval_result;
mod parser;
mod scanner;
mod system;

use crate::editing::{create_editor, ShellHelper};
use crate::eval::Shell;
use crate::eval_result::Flow;
use crate::system::Environment;
use rustyline::error::ReadlineError;
use rustyline::history::FileHistory;
use rustyline::Editor;
use std::io::{self, Stderr, Stdout, Write};
use tracing::debug;
use tracing_subscriber::EnvFilter;

const PROMPT: &str = "$ ";

/// Log filter used when `RUST_LOG` is not set.
const DEFAULT_LOG_FILTER: &str = "warn";

fn main() -> anyhow::Result<()> {
    init_logging();

    let env = Environment::from_process()?;
    let mut editor = create_editor(&env.search_path)?;
    let mut shell = Shell::with_process_streams(env);

    let code = repl(&mut editor, &mut shell)?;
    debug!(code, "exiting");
    std::process::exit(code);
}

/// Sets up `tracing` output on stderr, filtered by `RUST_LOG`.
fn init_logging() {
    let env_filter =
        std::env::var("RUST_LOG").unwrap_or_else(|_| DEFAULT_LOG_FILTER.to_string());
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from(env_filter))
        .with_writer(io::stderr)
        .with_target(false)
        .compact()
        .init();
}

/// Read, eval, print loop. Returns the status the process exits with.
fn repl(
    editor: &mut Editor<ShellHelper, FileHistory>,
    shell: &mut Shell<Stdout, Stderr>,
) -> anyhow::Result<i32> {
    loop {
        let line = match editor.readline(PROMPT) {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) => continue,
            Err(ReadlineError::Eof) => return Ok(end_of_input(&mut io::stdout())?),
            Err(e) => return Err(e.into()),
        };

        let command_text = line.trim();
        if command_text.is_empty() {
            continue;
        }
        editor.add_history_entry(command_text)?;

        if let Flow::Exit(code) = shell.handle_command(command_text) {
            return Ok(code);
        }
    }
}

/// Ends the line the prompt is on and gives the exit status for end of input.
fn end_of_input(stdout: &mut impl Write) -> io::Result<i32> {
    writeln!(stdout)?;
    stdout.flush()?;
    Ok(0)
}
