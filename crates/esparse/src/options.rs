//! Parser configuration.
//!
//! [`Options`] is plain data and can be loaded from JSON. Function-valued
//! hooks live separately in [`Callbacks`], which borrows for the lifetime of
//! one parse.

use std::cell::RefCell;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::error::SyntaxError;
use crate::node::SourceType;
use crate::span::{Position, SourceLocation};
use crate::token::Token;

/// ECMAScript version, normalized to the edition number (3, 5, 6..=11).
///
/// Years are accepted too: `2015` is version 6, `2020` is version 11.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct EcmaVersion(u32);

impl EcmaVersion {
    pub const ES3: Self = Self(3);
    pub const ES5: Self = Self(5);
    pub const ES2015: Self = Self(6);
    pub const ES2020: Self = Self(11);
    pub const LATEST: Self = Self::ES2020;

    /// Normalize a version or year.
    pub fn new(version: u32) -> Option<Self> {
        match version {
            3 | 5 | 6..=11 => Some(Self(version)),
            2015..=2020 => Some(Self(version - 2009)),
            _ => None,
        }
    }

    #[inline]
    pub fn get(self) -> u32 {
        self.0
    }
}

impl Default for EcmaVersion {
    fn default() -> Self {
        Self::LATEST
    }
}

impl TryFrom<u32> for EcmaVersion {
    type Error = String;

    fn try_from(version: u32) -> Result<Self, Self::Error> {
        Self::new(version).ok_or_else(|| format!("unsupported ecmaVersion {version}"))
    }
}

impl From<EcmaVersion> for u32 {
    fn from(version: EcmaVersion) -> Self {
        version.0
    }
}

/// Whether reserved words may be used as identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AllowReserved {
    /// Reserved words are accepted as identifiers.
    Allow,
    /// Reserved words are rejected as identifiers.
    Deny,
    /// Reserved words are rejected even as property names.
    Never,
}

/// Parser options.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Options {
    pub ecma_version: EcmaVersion,
    pub source_type: SourceType,
    /// Defaults to `allow` before ES5 and `deny` from ES5 on.
    pub allow_reserved: Option<AllowReserved>,
    pub allow_return_outside_function: bool,
    /// Accept `import`/`export` anywhere a statement may appear.
    pub allow_import_export_everywhere: bool,
    pub allow_await_outside_function: bool,
    /// Skip a leading `#!` line.
    pub allow_hash_bang: bool,
    /// Attach `loc` to nodes and tokens.
    pub locations: bool,
    /// Attach `range` to nodes and tokens.
    pub ranges: bool,
    /// Recorded as `loc.source` when `locations` is on.
    pub source_file: Option<String>,
    /// Recorded as `loc.source` in place of `source_file`.
    pub direct_source_file: Option<String>,
    /// Keep `ParenthesizedExpression` nodes.
    pub preserve_parens: bool,
}

impl Options {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_ecma_version(mut self, version: EcmaVersion) -> Self {
        self.ecma_version = version;
        self
    }

    #[must_use]
    pub fn with_source_type(mut self, source_type: SourceType) -> Self {
        self.source_type = source_type;
        self
    }

    /// Shorthand for `with_source_type(SourceType::Module)`.
    #[must_use]
    pub fn module(self) -> Self {
        self.with_source_type(SourceType::Module)
    }

    #[must_use]
    pub fn with_allow_reserved(mut self, allow: AllowReserved) -> Self {
        self.allow_reserved = Some(allow);
        self
    }

    #[must_use]
    pub fn with_allow_return_outside_function(mut self, allow: bool) -> Self {
        self.allow_return_outside_function = allow;
        self
    }

    #[must_use]
    pub fn with_allow_import_export_everywhere(mut self, allow: bool) -> Self {
        self.allow_import_export_everywhere = allow;
        self
    }

    #[must_use]
    pub fn with_allow_await_outside_function(mut self, allow: bool) -> Self {
        self.allow_await_outside_function = allow;
        self
    }

    #[must_use]
    pub fn with_allow_hash_bang(mut self, allow: bool) -> Self {
        self.allow_hash_bang = allow;
        self
    }

    #[must_use]
    pub fn with_locations(mut self, locations: bool) -> Self {
        self.locations = locations;
        self
    }

    #[must_use]
    pub fn with_ranges(mut self, ranges: bool) -> Self {
        self.ranges = ranges;
        self
    }

    #[must_use]
    pub fn with_source_file(mut self, name: impl Into<String>) -> Self {
        self.source_file = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_direct_source_file(mut self, name: impl Into<String>) -> Self {
        self.direct_source_file = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_preserve_parens(mut self, preserve: bool) -> Self {
        self.preserve_parens = preserve;
        self
    }

    /// The effective reserved-word policy.
    pub fn reserved_policy(&self) -> AllowReserved {
        self.allow_reserved.unwrap_or(if self.ecma_version.get() < 5 {
            AllowReserved::Allow
        } else {
            AllowReserved::Deny
        })
    }

    #[inline]
    pub fn is_module(&self) -> bool {
        self.source_type == SourceType::Module
    }
}

/// `Line` (`// ...`) or `Block` (`/* ... */`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CommentKind {
    Line,
    Block,
}

/// A comment reported through [`Callbacks::on_comment`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Comment {
    #[serde(rename = "type")]
    pub kind: CommentKind,
    /// Text between the delimiters.
    pub value: String,
    pub start: usize,
    pub end: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loc: Option<SourceLocation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range: Option<(usize, usize)>,
}

/// Function-valued hooks invoked during a parse.
#[derive(Default)]
pub struct Callbacks<'a> {
    /// Every token, in source order, including the final EOF token.
    pub on_token: Option<Box<dyn FnMut(&Token) + 'a>>,
    pub on_comment: Option<Box<dyn FnMut(&Comment) + 'a>>,
    /// Offset and position where a semicolon was inserted.
    pub on_inserted_semicolon: Option<Box<dyn FnMut(usize, Position) + 'a>>,
    /// Offset and position of an accepted trailing comma.
    pub on_trailing_comma: Option<Box<dyn FnMut(usize, Position) + 'a>>,
    pub on_recoverable: Option<Box<dyn FnMut(&SyntaxError) + 'a>>,
}

impl<'a> Callbacks<'a> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn on_token(mut self, f: impl FnMut(&Token) + 'a) -> Self {
        self.on_token = Some(Box::new(f));
        self
    }

    #[must_use]
    pub fn on_comment(mut self, f: impl FnMut(&Comment) + 'a) -> Self {
        self.on_comment = Some(Box::new(f));
        self
    }

    #[must_use]
    pub fn on_inserted_semicolon(mut self, f: impl FnMut(usize, Position) + 'a) -> Self {
        self.on_inserted_semicolon = Some(Box::new(f));
        self
    }

    #[must_use]
    pub fn on_trailing_comma(mut self, f: impl FnMut(usize, Position) + 'a) -> Self {
        self.on_trailing_comma = Some(Box::new(f));
        self
    }

    #[must_use]
    pub fn on_recoverable(mut self, f: impl FnMut(&SyntaxError) + 'a) -> Self {
        self.on_recoverable = Some(Box::new(f));
        self
    }

    /// Append every token to `sink`.
    #[must_use]
    pub fn collect_tokens(self, sink: Rc<RefCell<Vec<Token>>>) -> Self {
        self.on_token(move |token| sink.borrow_mut().push(token.clone()))
    }

    /// Append every comment to `sink`.
    #[must_use]
    pub fn collect_comments(self, sink: Rc<RefCell<Vec<Comment>>>) -> Self {
        self.on_comment(move |comment| sink.borrow_mut().push(comment.clone()))
    }
}

impl std::fmt::Debug for Callbacks<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Callbacks")
            .field("on_token", &self.on_token.is_some())
            .field("on_comment", &self.on_comment.is_some())
            .field("on_inserted_semicolon", &self.on_inserted_semicolon.is_some())
            .field("on_trailing_comma", &self.on_trailing_comma.is_some())
            .field("on_recoverable", &self.on_recoverable.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ecma_version_normalization() {
        assert_eq!(EcmaVersion::new(2015), Some(EcmaVersion::ES2015));
        assert_eq!(EcmaVersion::new(2020).map(EcmaVersion::get), Some(11));
        assert_eq!(EcmaVersion::new(4), None);
        assert_eq!(EcmaVersion::new(2021), None);
    }

    #[test]
    fn test_options_from_json() {
        let options: Options = serde_json::from_str(
            r#"{"ecmaVersion": 2017, "sourceType": "module", "allowReserved": "never", "locations": true}"#,
        )
        .unwrap();
        assert_eq!(options.ecma_version.get(), 8);
        assert!(options.is_module());
        assert_eq!(options.reserved_policy(), AllowReserved::Never);
        assert!(options.locations);
        assert!(!options.ranges);

        let err = serde_json::from_str::<Options>(r#"{"ecmaVersion": 4}"#).unwrap_err();
        assert!(err.to_string().contains("unsupported ecmaVersion 4"));
    }

    #[test]
    fn test_reserved_policy_default_depends_on_version() {
        let old = Options::new().with_ecma_version(EcmaVersion::ES3);
        assert_eq!(old.reserved_policy(), AllowReserved::Allow);
        assert_eq!(Options::new().reserved_policy(), AllowReserved::Deny);
    }

    #[test]
    fn test_collect_tokens_sink() {
        let sink = Rc::new(RefCell::new(Vec::new()));
        let mut callbacks = Callbacks::new().collect_tokens(Rc::clone(&sink));
        let token = Token {
            ty: crate::token::TokenType::Eof,
            value: crate::token::TokenValue::None,
            start: 0,
            end: 0,
            loc: None,
            range: None,
        };
        if let Some(hook) = callbacks.on_token.as_mut() {
            hook(&token);
        }
        assert_eq!(sink.borrow().len(), 1);
    }
}
