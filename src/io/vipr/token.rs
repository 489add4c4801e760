//! # Tokenization of certificate text
//!
//! Certificate records are not line oriented; a single record may span lines and a line may hold
//! many records. The scanner therefore produces a plain token stream and only remembers line
//! numbers for error reporting.
use std::str::FromStr;

use crate::data::number_types::Rational;
use crate::io::error::Parse;

/// A pull scanner over certificate text.
///
/// Tokens are maximal runs of non-whitespace characters. A token starting with `%` is a comment
/// introducer: it is discarded together with the remainder of its line.
pub struct Scanner<'a> {
    input: &'a str,
    /// Byte offset of the next unread character.
    position: usize,
    /// One-based line number at `position`.
    line: u64,
}

impl<'a> Scanner<'a> {
    pub fn new(input: &'a str) -> Self {
        Self { input, position: 0, line: 1 }
    }

    /// The next token, or `None` at end of input.
    fn next_token(&mut self) -> Option<(&'a str, u64)> {
        let input = self.input;
        loop {
            self.skip_whitespace();
            if self.position == input.len() {
                return None;
            }

            if input[self.position..].starts_with('%') {
                self.skip_comment();
                continue;
            }

            let start = self.position;
            let rest = &input[start..];
            let length = rest.find(char::is_whitespace).unwrap_or(rest.len());
            self.position += length;
            return Some((&input[start..start + length], self.line));
        }
    }

    fn skip_whitespace(&mut self) {
        let rest = &self.input[self.position..];
        for (offset, character) in rest.char_indices() {
            if !character.is_whitespace() {
                self.position += offset;
                return;
            }
            if character == '\n' {
                self.line += 1;
            }
        }
        self.position = self.input.len();
    }

    fn skip_comment(&mut self) {
        let rest = &self.input[self.position..];
        match rest.find('\n') {
            // The newline itself is left for `skip_whitespace` to count.
            Some(offset) => self.position += offset,
            None => self.position = self.input.len(),
        }
    }

    /// The next token as a word.
    ///
    /// # Arguments
    ///
    /// * `expected`: Description of what should be read, for the error message at end of input.
    pub fn next_word(&mut self, expected: &str) -> Result<(&'a str, u64), Parse> {
        self.next_token().ok_or_else(|| {
            Parse::new(format!("unexpected end of file, expected {}", expected))
        })
    }

    /// The next token, which must equal `literal`.
    pub fn expect(&mut self, literal: &str) -> Result<(), Parse> {
        let (token, line) = self.next_word(&format!("\"{}\"", literal))?;
        if token == literal {
            Ok(())
        } else {
            Err(Parse::with_location(
                format!("expected \"{}\" but read \"{}\"", literal, token),
                (line, token),
            ))
        }
    }

    /// The next token as a nonnegative integer.
    pub fn next_usize(&mut self, expected: &str) -> Result<usize, Parse> {
        let (token, line) = self.next_word(expected)?;
        usize::from_str(token).map_err(|_| {
            Parse::with_location(
                format!("expected a nonnegative integer for {}, read \"{}\"", expected, token),
                (line, token),
            )
        })
    }

    /// The next token as a signed integer.
    pub fn next_i64(&mut self, expected: &str) -> Result<i64, Parse> {
        let (token, line) = self.next_word(expected)?;
        i64::from_str(token).map_err(|_| {
            Parse::with_location(
                format!("expected an integer for {}, read \"{}\"", expected, token),
                (line, token),
            )
        })
    }

    /// The next token as a rational number, `a/b` or a plain integer.
    pub fn next_rational(&mut self, expected: &str) -> Result<Rational, Parse> {
        let (token, line) = self.next_word(expected)?;
        Rational::from_str(token).map_err(|_| {
            Parse::with_location(
                format!("expected a rational number for {}, read \"{}\"", expected, token),
                (line, token),
            )
        })
    }
}
