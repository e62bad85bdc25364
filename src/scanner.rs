//! Scanner for the command line parser.

use std::str::Chars;

use crate::error::ParseError;

/// A token type.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TokenTag {
    /// The end of the command text.
    EndOfCommand,

    /// An unquoted output redirection operator, e.g. `>`, `2>>`. The lexeme
    /// holds the whole operator including any file descriptor digits.
    RedirectOut { is_append: bool },

    /// A string of non-whitespace characters with quotes removed.
    Word,
}

/// A token in a command text.
#[derive(Debug, PartialEq)]
pub struct Token {
    /// Tags what kind of token this is.
    pub tag: TokenTag,

    /// The token's text.
    pub lexeme: String,
}

impl Token {
    fn new(tag: TokenTag, lexeme: String) -> Token {
        Token { tag, lexeme }
    }

    pub fn end_of_command() -> Token {
        Token::new(TokenTag::EndOfCommand, String::new())
    }
}

/// Possible states when scanning a word token.
#[derive(Clone, Copy)]
enum WordState {
    /// Normal state.
    Normal,

    /// Inside single quoted text.
    InSingleQuote,

    /// Inside double quoted text.
    InDoubleQuote,
}

/// Converts a command's text into a stream of tokens.
pub struct Scanner<'a> {
    /// An iterator over the command text.
    chars: Chars<'a>,

    /// Current value from command text being considered.
    current: Option<char>,
}

impl<'a> Scanner<'a> {
    /// Creates a scanner for a give command text.
    pub fn new(command_text: &'a str) -> Scanner<'a> {
        let mut scanner = Scanner {
            chars: command_text.chars(),
            current: None,
        };
        scanner.advance();
        scanner
    }

    /// Returns the next token in the command text.
    pub fn next_token(&mut self) -> Result<Token, ParseError> {
        self.skip_whitespace();

        let token = match self.current {
            None => Token::end_of_command(),
            Some(_) if self.at_redirect() => self.redirect(),
            Some(_) => {
                let lexeme = self.word()?;
                Token::new(TokenTag::Word, lexeme)
            }
        };

        Ok(token)
    }

    /// Scans a quoted word.
    fn word(&mut self) -> Result<String, ParseError> {
        use WordState::*;

        let mut state = Normal;
        let mut s = String::new();

        loop {
            match (self.current, state) {
                (Some('\''), Normal) => {
                    state = InSingleQuote;
                    self.advance();
                }

                (Some('\''), InSingleQuote) => {
                    state = Normal;
                    self.advance();
                }

                (Some('"'), Normal) => {
                    state = InDoubleQuote;
                    self.advance();
                }

                (Some('"'), InDoubleQuote) => {
                    state = Normal;
                    self.advance();
                }

                // An unquoted operator ends the word in front of it.
                (Some('>'), Normal) => break,

                (Some(c), Normal) if is_whitespace(c) => break,

                (Some(c), _) => {
                    s.push(c);
                    self.advance();
                }

                (None, Normal) => break,

                (None, InSingleQuote) => return Err(ParseError::UnclosedSingleQuote),

                (None, InDoubleQuote) => return Err(ParseError::UnclosedDoubleQuote),
            }
        }

        Ok(s)
    }

    /// Scans a redirection operator: optional digits, `>`, optional second `>`.
    fn redirect(&mut self) -> Token {
        let mut lexeme = String::new();
        while let Some(c) = self.current.filter(|&c| is_digit(c)) {
            lexeme.push(c);
            self.advance();
        }

        // The `>` itself, guaranteed by `at_redirect`.
        lexeme.push('>');
        self.advance();

        let is_append = self.current == Some('>');
        if is_append {
            lexeme.push('>');
            self.advance();
        }

        Token::new(TokenTag::RedirectOut { is_append }, lexeme)
    }

    /// Determines if a redirection operator starts at the current character,
    /// i.e. a run of zero or more digits immediately followed by `>`.
    fn at_redirect(&self) -> bool {
        self.current
            .into_iter()
            .chain(self.chars.clone())
            .find(|&c| !is_digit(c))
            == Some('>')
    }

    /// Advances the scanner past any whitespace.
    fn skip_whitespace(&mut self) {
        while let Some(c) = self.current {
            if !is_whitespace(c) {
                break;
            }
            self.advance();
        }
    }

    /// Advances `current` to the next character in command text.
    fn advance(&mut self) {
        self.current = self.chars.next();
    }
}

/// Splits a command text into all of its tokens, not including the final
/// `EndOfCommand`.
pub fn tokenize(command_text: &str) -> Result<Vec<Token>, ParseError> {
    let mut scanner = Scanner::new(command_text);
    let mut tokens = Vec::new();
    loop {
        let token = scanner.next_token()?;
        if token.tag == TokenTag::EndOfCommand {
            return Ok(tokens);
        }
        tokens.push(token);
    }
}

/// Determines if the given character is a digit.
fn is_digit(c: char) -> bool {
    c.is_ascii_digit()
}

/// Determines if the given character is whitespace.
fn is_whitespace(c: char) -> bool {
    c == ' ' || c == '\t' || c == '\r' || c == '\n'
}
