//! Token-only scanning, without building a tree.

use std::iter::FusedIterator;

use crate::error::Result;
use crate::options::Options;
use crate::parser::Parser;
use crate::token::{Token, TokenType};

/// Lazy sequence of tokens.
///
/// Yields every token including the final EOF token, then ends. A scan
/// error is yielded once and also ends the sequence. Regex-versus-division
/// is decided by the token context stack alone, the same way the parser's
/// scanner decides it.
pub struct Tokenizer<'a> {
    options: Options,
    input: &'a str,
    parser: Parser<'a>,
    started: bool,
    done: bool,
}

impl<'a> Tokenizer<'a> {
    pub fn new(options: Options, input: &'a str) -> Self {
        Self {
            parser: Parser::new(options.clone(), input),
            options,
            input,
            started: false,
            done: false,
        }
    }

    /// Rewind to the start of the input.
    pub fn restart(&mut self) {
        self.parser = Parser::new(self.options.clone(), self.input);
        self.started = false;
        self.done = false;
    }

    fn advance(&mut self) -> Result<Token> {
        if self.started {
            self.parser.next()?;
        } else {
            self.started = true;
            self.parser.start_scanning()?;
        }
        Ok(self.parser.current_token())
    }
}

impl Iterator for Tokenizer<'_> {
    type Item = Result<Token>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let token = self.advance();
        self.done = token.as_ref().map_or(true, |t| t.ty == TokenType::Eof);
        Some(token)
    }
}

impl FusedIterator for Tokenizer<'_> {}

impl std::fmt::Debug for Tokenizer<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tokenizer")
            .field("pos", &self.parser.state.pos)
            .field("done", &self.done)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::TokenValue;

    fn types(src: &str) -> Vec<TokenType> {
        Tokenizer::new(Options::default(), src).map(|t| t.unwrap().ty).collect()
    }

    #[test]
    fn test_ends_after_eof() {
        let mut tokens = Tokenizer::new(Options::default(), "a");
        assert_eq!(tokens.next().unwrap().unwrap().ty, TokenType::Name);
        assert_eq!(tokens.next().unwrap().unwrap().ty, TokenType::Eof);
        assert!(tokens.next().is_none());
        assert!(tokens.next().is_none());
    }

    #[test]
    fn test_slash_follows_context() {
        use TokenType::*;
        assert_eq!(types("a / b"), [Name, Slash, Name, Eof]);
        assert_eq!(types("x = /re/g"), [Name, Eq, Regexp, Eof]);
        assert_eq!(types("if (a) /re/.test(b)"), [If, ParenL, Name, ParenR, Regexp, Dot, Name, ParenL, Name, ParenR, Eof]);
        assert_eq!(types("(a) / b"), [ParenL, Name, ParenR, Slash, Name, Eof]);
    }

    #[test]
    fn test_templates_tokenize() {
        use TokenType::*;
        assert_eq!(
            types("`a${b}c`"),
            [BackQuote, Template, DollarBraceL, Name, BraceR, Template, BackQuote, Eof]
        );
    }

    #[test]
    fn test_restart() {
        let mut tokens = Tokenizer::new(Options::default(), "x y");
        let first: Vec<_> = tokens.by_ref().map(|t| t.unwrap()).collect();
        tokens.restart();
        let second: Vec<_> = tokens.map(|t| t.unwrap()).collect();
        assert_eq!(first, second);
        assert_eq!(first[1].value, TokenValue::Str("y".into()));
    }

    #[test]
    fn test_error_ends_sequence() {
        let mut tokens = Tokenizer::new(Options::default(), "a 'unterminated");
        assert!(tokens.next().unwrap().is_ok());
        assert!(tokens.next().unwrap().is_err());
        assert!(tokens.next().is_none());
    }
}
