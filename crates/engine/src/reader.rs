//! Cursor over command text.

use crate::error::{CommandError, CommandResult};

#[derive(Debug, Clone)]
pub struct StringReader<'a> {
    input: &'a str,
    cursor: usize,
}

impl<'a> StringReader<'a> {
    pub fn new(input: &'a str) -> Self {
        Self { input, cursor: 0 }
    }

    pub fn input(&self) -> &'a str {
        self.input
    }

    /// Byte offset into the input.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn set_cursor(&mut self, cursor: usize) {
        self.cursor = cursor.min(self.input.len());
    }

    pub fn remaining(&self) -> &'a str {
        &self.input[self.cursor..]
    }

    pub fn can_read(&self) -> bool {
        self.cursor < self.input.len()
    }

    pub fn peek(&self) -> Option<char> {
        self.remaining().chars().next()
    }

    /// Consume one character.
    pub fn skip(&mut self) {
        if let Some(c) = self.peek() {
            self.cursor += c.len_utf8();
        }
    }

    /// True at the end of input or in front of whitespace.
    pub fn at_boundary(&self) -> bool {
        self.peek().map_or(true, char::is_whitespace)
    }

    pub fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.skip();
        }
    }

    /// Require at least one whitespace character, then skip the run.
    pub fn expect_separator(&mut self) -> CommandResult<()> {
        if !self.peek().is_some_and(char::is_whitespace) {
            return Err(self.error("expected whitespace to end one argument"));
        }
        self.skip_whitespace();
        Ok(())
    }

    pub fn expect(&mut self, expected: char) -> CommandResult<()> {
        if self.peek() != Some(expected) {
            return Err(self.error(format!("expected '{expected}'")));
        }
        self.skip();
        Ok(())
    }

    fn read_while(&mut self, accept: impl Fn(char) -> bool) -> &'a str {
        let start = self.cursor;
        while self.peek().is_some_and(&accept) {
            self.skip();
        }
        &self.input[start..self.cursor]
    }

    /// Everything up to the next whitespace.
    pub fn read_token(&mut self) -> &'a str {
        self.read_while(|c| !c.is_whitespace())
    }

    /// Next whitespace-delimited token without consuming it.
    pub fn peek_token(&self) -> &'a str {
        let rest = self.remaining();
        let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
        &rest[..end]
    }

    /// Up to the next whitespace, but whitespace inside double quotes is kept.
    pub fn read_quoted_token(&mut self) -> CommandResult<&'a str> {
        let start = self.cursor;
        let mut quoted = false;
        while let Some(c) = self.peek() {
            if c.is_whitespace() && !quoted {
                break;
            }
            if c == '\\' && quoted {
                self.skip();
            } else if c == '"' {
                quoted = !quoted;
            }
            self.skip();
        }
        if quoted {
            return Err(CommandError::syntax("unclosed quoted string", start));
        }
        Ok(&self.input[start..self.cursor])
    }

    /// Characters allowed in unquoted strings: `0-9A-Za-z_-.+`.
    pub fn read_unquoted(&mut self) -> &'a str {
        self.read_while(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | '+'))
    }

    /// Characters allowed in resource keys.
    pub fn read_key_token(&mut self) -> &'a str {
        self.read_while(mdcommand_core::registry::is_key_char)
    }

    pub fn read_int(&mut self) -> CommandResult<i32> {
        let start = self.cursor;
        let text = self.read_while(|c| c.is_ascii_digit() || c == '-');
        text.parse::<i32>().map_err(|_| {
            self.cursor = start;
            CommandError::syntax(format!("invalid integer '{text}'"), start)
        })
    }

    pub fn read_double(&mut self) -> CommandResult<f64> {
        let start = self.cursor;
        let text = self.read_while(|c| c.is_ascii_digit() || matches!(c, '-' | '.'));
        match text.parse::<f64>() {
            Ok(value) if value.is_finite() => Ok(value),
            _ => {
                self.cursor = start;
                Err(CommandError::syntax(format!("invalid double '{text}'"), start))
            }
        }
    }

    /// Rest of the input.
    pub fn read_remaining(&mut self) -> &'a str {
        let rest = self.remaining();
        self.cursor = self.input.len();
        rest
    }

    pub fn error(&self, message: impl Into<String>) -> CommandError {
        CommandError::syntax(message, self.cursor)
    }
}
