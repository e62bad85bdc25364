//! Evaluates command lines: redirection, dispatch and external processes.

use std::fs::{File, OpenOptions};
use std::io::{self, Read, Stderr, Stdout, Write};
use std::path::Path;
use std::process::Stdio;
use std::thread;

use tracing::{debug, warn};

use crate::ast::{Command, RedirectionSpec, ResolvedCommand, TargetStream, WriteMode};
use crate::builtin::eval_built_in;
use crate::error::ShellError;
use crate::eval_result::{EvalResult, Flow};
use crate::parser::parse;
use crate::system::{resolve, Environment};

/// Where a command's output or errors end up.
enum Sink<'a> {
    /// The shell's own stream.
    Default(&'a mut dyn Write),

    /// A file opened for a redirection.
    File(&'a mut File),
}

impl Sink<'_> {
    /// Converts the sink into a child process stream. A default sink is
    /// either handed to the child as is or piped and copied back into the
    /// writer.
    fn stdio(&mut self, inherit: bool) -> io::Result<Stdio> {
        match self {
            Sink::Default(stream) if inherit => {
                // Anything buffered must land before the child writes.
                stream.flush()?;
                Ok(Stdio::inherit())
            }
            Sink::Default(_) => Ok(Stdio::piped()),
            Sink::File(file) => Ok(Stdio::from(file.try_clone()?)),
        }
    }
}

impl Write for Sink<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Sink::Default(stream) => stream.write(buf),
            Sink::File(file) => file.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Sink::Default(stream) => stream.flush(),
            Sink::File(file) => file.flush(),
        }
    }
}

/// The command interpreter. `stdout` and `stderr` are the default sinks,
/// used by built-ins and external commands whenever a command does not
/// redirect them.
pub struct Shell<O: Write, E: Write> {
    env: Environment,
    stdout: O,
    stderr: E,

    /// Set when the default sinks are the process's own streams, so children
    /// can write to them directly.
    inherit_streams: bool,
}

impl Shell<Stdout, Stderr> {
    /// A shell writing to the process's stdout and stderr. External commands
    /// inherit both streams, keeping terminal access.
    pub fn with_process_streams(env: Environment) -> Self {
        Self {
            env,
            stdout: io::stdout(),
            stderr: io::stderr(),
            inherit_streams: true,
        }
    }
}

impl<O: Write, E: Write> Shell<O, E> {
    /// A shell writing to arbitrary sinks. Output of external commands is
    /// piped through them.
    pub fn new(env: Environment, stdout: O, stderr: E) -> Self {
        Self {
            env,
            stdout,
            stderr,
            inherit_streams: false,
        }
    }

    /// Parses and evaluates one line of input. Every failure is reported and
    /// the shell continues; only `exit` asks to stop.
    pub fn handle_command(&mut self, command_text: &str) -> Flow {
        match self.eval(command_text) {
            Ok(flow) => flow,
            Err(e) => {
                if let Err(write_error) = writeln!(self.stderr, "{e}") {
                    warn!(%write_error, "failed to report error");
                }
                Flow::Continue
            }
        }
    }

    /// Parses and evaluates a command.
    fn eval(&mut self, command_text: &str) -> EvalResult {
        let Some(command) = parse(command_text)? else {
            return Ok(Flow::Continue);
        };
        self.eval_command(command)
    }

    /// Evaluates a command. The redirection file, if any, stays open only for
    /// the duration of this call.
    fn eval_command(&mut self, command: Command) -> EvalResult {
        let mut redirection = match &command.redirection {
            Some(spec) => Some((spec.stream, open_redirection(&self.env, spec)?)),
            None => None,
        };

        let resolved = resolve(&self.env, &command.name);
        debug!(name = %command.name, ?resolved, "dispatching command");

        let (mut stdout, mut stderr) = match redirection.as_mut() {
            None => (
                Sink::Default(&mut self.stdout),
                Sink::Default(&mut self.stderr),
            ),
            Some((TargetStream::Stdout, file)) => {
                (Sink::File(file), Sink::Default(&mut self.stderr))
            }
            Some((TargetStream::Stderr, file)) => {
                (Sink::Default(&mut self.stdout), Sink::File(file))
            }
        };

        let result = match resolved {
            ResolvedCommand::BuiltIn(built_in) => {
                eval_built_in(&mut self.env, built_in, &command.args, &mut stdout)
                    .map_err(ShellError::from)
            }
            ResolvedCommand::External(path) => eval_external(
                &self.env,
                &command.name,
                &path,
                &command.args,
                self.inherit_streams,
                &mut stdout,
                &mut stderr,
            ),
            ResolvedCommand::NotFound(name) => Err(ShellError::CommandNotFound(name)),
        };

        let flow = match result {
            Ok(flow) => flow,
            Err(e) => {
                if let Err(write_error) = writeln!(stderr, "{e}") {
                    warn!(%write_error, "failed to report error");
                }
                Flow::Continue
            }
        };

        for sink in [&mut stdout, &mut stderr] {
            if let Err(e) = sink.flush() {
                warn!(error = %e, "failed to flush output");
            }
        }

        Ok(flow)
    }
}

/// Opens the target of a redirection relative to the working directory.
fn open_redirection(env: &Environment, spec: &RedirectionSpec) -> Result<File, ShellError> {
    // Left empty so an operator without a filename fails instead of naming
    // the working directory.
    let path = if spec.target.as_os_str().is_empty() {
        spec.target.clone()
    } else {
        env.resolve_path(&spec.target)
    };

    let mut options = OpenOptions::new();
    options.create(true);
    match spec.mode {
        WriteMode::Truncate => options.write(true).truncate(true),
        WriteMode::Append => options.append(true),
    };

    options.open(&path).map_err(ShellError::Redirection)
}

/// Evaluates an external command, blocking until it exits.
fn eval_external(
    env: &Environment,
    name: &str,
    path: &Path,
    args: &[String],
    inherit: bool,
    stdout: &mut Sink,
    stderr: &mut Sink,
) -> EvalResult {
    let spawn_error = |source: io::Error| ShellError::Spawn {
        command: name.to_string(),
        source,
    };

    let mut child = std::process::Command::new(path)
        .args(args)
        .current_dir(&env.current_dir)
        .stdout(stdout.stdio(inherit).map_err(spawn_error)?)
        .stderr(stderr.stdio(inherit).map_err(spawn_error)?)
        .spawn()
        .map_err(spawn_error)?;

    if let Err(e) = copy_child_output(&mut child, stdout, stderr) {
        warn!(error = %e, "failed to copy child output");
    }
    let status = child.wait().map_err(spawn_error)?;

    debug!(path = %path.display(), %status, "external command finished");
    Ok(Flow::Continue)
}

/// Drains the piped streams of a child into the sinks. Stderr is collected on
/// a second thread so neither pipe can fill up and stall the child.
fn copy_child_output(
    child: &mut std::process::Child,
    stdout: &mut Sink,
    stderr: &mut Sink,
) -> io::Result<()> {
    let child_stdout = child.stdout.take();
    let child_stderr = child.stderr.take();

    thread::scope(|scope| {
        let errors = child_stderr.map(|mut pipe| {
            scope.spawn(move || {
                let mut buf = Vec::new();
                pipe.read_to_end(&mut buf).map(|_| buf)
            })
        });

        if let Some(mut pipe) = child_stdout {
            io::copy(&mut pipe, stdout)?;
        }

        if let Some(handle) = errors {
            let buf = handle
                .join()
                .map_err(|_| io::Error::other("stderr reader panicked"))??;
            stderr.write_all(&buf)?;
        }

        Ok(())
    })
}
