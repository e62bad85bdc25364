//! A command parser.

use std::path::PathBuf;

use crate::{
    ast::{Command, RedirectionSpec, TargetStream, WriteMode},
    error::ParseError,
    scanner::*,
};

/// Tracks and changes the state of the parser.
struct ParserState {
    /// The tokens after the current one.
    tokens: std::vec::IntoIter<Token>,

    /// The current token in the command.
    current: Token,
}

impl ParserState {
    /// Creates and initialize a parser for a given command.
    fn new(command: &str) -> Result<ParserState, ParseError> {
        let mut tokens = tokenize(command)?.into_iter();
        let current = tokens.next().unwrap_or_else(Token::end_of_command);
        Ok(ParserState { tokens, current })
    }

    /// Advances to the next token, returning the current token before the
    /// advance.
    fn advance_keep_current(&mut self) -> Token {
        let next = self.tokens.next().unwrap_or_else(Token::end_of_command);
        std::mem::replace(&mut self.current, next)
    }
}

/// Parses a given command text.
///
/// Returns `None` for a blank line. Words after a redirection target are
/// still arguments of the command, so `echo a > f b` echoes `a b`.
pub fn parse(command_text: &str) -> Result<Option<Command>, ParseError> {
    let mut state = ParserState::new(command_text)?;
    let mut words = Vec::new();
    let mut redirection = None;

    loop {
        match state.current.tag {
            TokenTag::EndOfCommand => break,
            TokenTag::Word => words.push(state.advance_keep_current().lexeme),
            TokenTag::RedirectOut { is_append } => {
                if redirection.is_some() {
                    return Err(ParseError::MultipleRedirections);
                }
                redirection = Some(redirection_spec(&mut state, is_append)?);
            }
        }
    }

    let mut words = words.into_iter();
    match (words.next(), redirection) {
        (Some(name), redirection) => Ok(Some(Command {
            name,
            args: words.collect(),
            redirection,
        })),
        (None, None) => Ok(None),
        (None, Some(_)) => Err(ParseError::MissingCommand),
    }
}

/// Parses a redirection operator and the filename following it.
fn redirection_spec(
    state: &mut ParserState,
    is_append: bool,
) -> Result<RedirectionSpec, ParseError> {
    let operator = state.advance_keep_current().lexeme;
    let stream = match operator.trim_end_matches('>') {
        "" | "1" => TargetStream::Stdout,
        "2" => TargetStream::Stderr,
        file_descriptor => {
            return Err(ParseError::UnrecognizedFileDescriptor(
                file_descriptor.to_string(),
            ))
        }
    };

    let mode = if is_append {
        WriteMode::Append
    } else {
        WriteMode::Truncate
    };

    // A missing filename is left empty and fails once the file is opened.
    let target = match state.current.tag {
        TokenTag::Word => state.advance_keep_current().lexeme,
        _ => String::new(),
    };

    Ok(RedirectionSpec {
        stream,
        mode,
        target: PathBuf::from(target),
    })
}
