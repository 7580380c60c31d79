use thiserror::Error;

use crate::span::Position;

/// A syntax error at a source position.
///
/// Fatal errors abort the parse; recoverable ones carry the same payload
/// and are collected while parsing continues.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message} ({loc})")]
pub struct SyntaxError {
    pub message: String,
    /// Byte offset the error refers to.
    pub pos: usize,
    pub loc: Position,
    /// Scanner position when the error was raised.
    pub raised_at: usize,
}

/// Parser error type.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error(transparent)]
    Syntax(#[from] SyntaxError),

    #[error("Unsupported syntax: {construct} ({loc})")]
    Unsupported {
        construct: &'static str,
        pos: usize,
        loc: Position,
    },

    #[error("Offset {offset} is not a character boundary of the {len}-byte input")]
    InvalidOffset { offset: usize, len: usize },
}

impl Error {
    /// Offset the error refers to.
    #[must_use]
    pub fn pos(&self) -> usize {
        match self {
            Error::Syntax(err) => err.pos,
            Error::Unsupported { pos, .. } => *pos,
            Error::InvalidOffset { offset, .. } => *offset,
        }
    }

    /// The error message without the location suffix.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Error::Syntax(err) => err.message.clone(),
            Error::Unsupported { construct, .. } => format!("Unsupported syntax: {construct}"),
            Error::InvalidOffset { .. } => self.to_string(),
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_location() {
        let err = Error::Syntax(SyntaxError {
            message: "Unexpected token".into(),
            pos: 4,
            loc: Position::new(1, 4),
            raised_at: 5,
        });
        assert_eq!(err.to_string(), "Unexpected token (1:4)");
        assert_eq!(err.pos(), 4);
        assert_eq!(err.message(), "Unexpected token");
    }

    #[test]
    fn test_invalid_offset_message() {
        let err = Error::InvalidOffset { offset: 1, len: 4 };
        assert_eq!(err.message(), "Offset 1 is not a character boundary of the 4-byte input");
        assert_eq!(err.pos(), 1);
    }
}
