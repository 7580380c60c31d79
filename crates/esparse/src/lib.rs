//! esparse: an ECMAScript parser producing ESTree trees
//!
//! # Design
//!
//! 1. **Lexing on demand**
//!    - The scanner runs inside the parser and is asked for one token at a time
//!    - A stack of token contexts decides whether `/` starts a regex and
//!      whether `}` resumes a template, so the same stack drives the
//!      standalone [`Tokenizer`]
//!
//! 2. **Owned ESTree nodes**
//!    - Every [`Node`] carries `start`/`end` plus optional `loc` and `range`
//!    - [`NodeKind`] is a sum type over the ESTree node types and serializes
//!      to ESTree JSON with serde
//!
//! 3. **Errors**
//!    - Fatal syntax errors stop the parse with [`Error::Syntax`]
//!    - Recoverable ones are collected and reported through
//!      [`Callbacks::on_recoverable`]
//!    - Recognized but unimplemented syntax yields [`Error::Unsupported`]
//!
//! # Example
//!
//! ```
//! use esparse::{parse, NodeKind, Options};
//!
//! let program = parse("const x = 1 + 2;", Options::default()).unwrap();
//! let NodeKind::Program { body, .. } = &program.kind else { unreachable!() };
//! assert_eq!(body[0].type_name(), "VariableDeclaration");
//! ```

mod context;
mod error;
mod expression;
mod lexer;
mod lval;
mod node;
mod options;
mod parser;
mod regexp;
mod scope;
mod span;
mod statement;
mod token;
mod tokenizer;
mod unicode;
mod whitespace;

// Re-exports
pub use context::TokenContext;
pub use error::{Error, Result, SyntaxError};
pub use node::*;
pub use options::{AllowReserved, Callbacks, Comment, CommentKind, EcmaVersion, Options};
pub use parser::{Parser, MAX_NESTING};
pub use regexp::{validate_regexp, RegExpError, RegExpValidationState};
pub use span::{line_info, LineIndex, Position, SourceLocation, Span};
pub use token::{is_keyword, RegexValue, Token, TokenType, TokenTypeInfo, TokenValue};
pub use tokenizer::Tokenizer;

/// Parse a complete program.
pub fn parse(input: &str, options: Options) -> Result<Node> {
    Parser::new(options, input).parse()
}

/// Parse a single expression starting at byte offset `offset`.
///
/// Parsing stops at the end of the expression; the rest of the input is
/// left unread. An `offset` inside a UTF-8 sequence or past the end is
/// rejected with [`Error::InvalidOffset`].
pub fn parse_expression_at(input: &str, offset: usize, options: Options) -> Result<Node> {
    Parser::new_at(options, input, offset)?.parse_expression_only()
}

/// Scan `input` into tokens without parsing.
pub fn tokenizer(input: &str, options: Options) -> Tokenizer<'_> {
    Tokenizer::new(options, input)
}
