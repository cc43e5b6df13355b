//! Opaque feedback messages: a translation key plus positional arguments.

use std::fmt;

/// A user-facing message; rendering and localization happen elsewhere.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Translation key, e.g. `commands.execute.conditional.pass`.
    pub key: &'static str,
    /// Already-formatted arguments.
    pub args: Vec<String>,
}

impl Message {
    /// Message without arguments.
    pub fn new(key: &'static str) -> Self {
        Self {
            key,
            args: Vec::new(),
        }
    }

    /// Append one argument.
    pub fn arg(mut self, value: impl fmt::Display) -> Self {
        self.args.push(value.to_string());
        self
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key)?;
        if !self.args.is_empty() {
            write!(f, " [{}]", self.args.join(", "))?;
        }
        Ok(())
    }
}
