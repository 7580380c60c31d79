//! Parser driver.
//!
//! [`Parser`] owns all state of one parse: the scanner [`State`], the token
//! context stack, the scope stack, and the label set. Grammar productions
//! live in `statement.rs`, `expression.rs` and `lval.rs`; scanning lives in
//! `lexer.rs`. All of them are `impl Parser` blocks over this struct.

use std::cell::OnceCell;

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, trace};

use crate::context::TokenContext;
use crate::error::{Error, Result, SyntaxError};
use crate::node::{Node, NodeKind};
use crate::options::{AllowReserved, Callbacks, Comment, Options};
use crate::regexp::RegExpValidationState;
use crate::scope::ScopeStack;
use crate::span::{locate, utf16_len, LineIndex, Position, SourceLocation};
use crate::token::{ReservedWords, Token, TokenType, TokenValue};
use crate::whitespace::{has_line_break, skip_white_space};

/// Deepest nesting of statements, expressions, patterns and regex groups
/// that parses. Anything deeper is a syntax error.
pub const MAX_NESTING: u32 = 256;

/// Scanner state: cursor, current token, previous token, and context stack.
///
/// Cloned as a whole to snapshot the scanner before a speculative parse.
#[derive(Debug, Clone)]
pub(crate) struct State {
    pub pos: usize,
    pub line: u32,
    pub line_start: usize,
    /// A byte offset on the current line and its UTF-16 column.
    pub column_anchor: (usize, u32),

    pub ty: TokenType,
    pub value: TokenValue,
    pub start: usize,
    pub end: usize,
    pub start_loc: Position,
    pub end_loc: Position,

    pub last_tok_start: usize,
    pub last_tok_end: usize,
    pub last_tok_start_loc: Position,
    pub last_tok_end_loc: Position,

    pub context: Vec<TokenContext>,
    pub expr_allowed: bool,
    /// The current word contained a `\u` escape.
    pub contains_esc: bool,
}

/// Where a production starts.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Marker {
    pub start: usize,
    pub loc: Position,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LabelKind {
    Loop,
    Switch,
}

/// An entry of the label set: a named label, or the anonymous marker a
/// loop or `switch` pushes so that `break`/`continue` can find it.
#[derive(Debug, Clone)]
pub(crate) struct Label {
    pub name: Option<String>,
    pub kind: Option<LabelKind>,
    /// Start of the statement the label applies to.
    pub statement_start: Option<usize>,
}

/// Positions of constructs that are only valid if the surrounding
/// expression turns out to be a pattern (or only if it does not).
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct DestructuringErrors {
    pub shorthand_assign: Option<usize>,
    pub trailing_comma: Option<usize>,
    pub parenthesized_assign: Option<usize>,
    pub parenthesized_bind: Option<usize>,
    pub double_proto: Option<usize>,
}

/// Hook invocations, delayed while a speculative parse may still be undone.
#[derive(Debug)]
enum Event {
    Token(Token),
    Comment(Comment),
    InsertedSemicolon(usize, Position),
    TrailingComma(usize, Position),
    Recoverable(SyntaxError),
}

/// Parser state captured before a speculative parse.
pub(crate) struct Snapshot {
    state: State,
    strict: bool,
    scope_depth: usize,
    labels: Vec<Label>,
    potential_arrow_at: Option<usize>,
    yield_pos: Option<usize>,
    await_pos: Option<usize>,
    await_ident_pos: Option<usize>,
    pending: usize,
}

/// The parser.
pub struct Parser<'a> {
    pub(crate) options: Options,
    callbacks: Callbacks<'a>,
    pub(crate) input: &'a str,
    /// Normalized ECMAScript version.
    pub(crate) ecma: u32,
    pub(crate) source_file: Option<String>,
    pub(crate) reserved: ReservedWords,

    pub(crate) state: State,

    pub(crate) in_module: bool,
    pub(crate) strict: bool,
    /// Start of an expression that may turn out to be arrow parameters.
    pub(crate) potential_arrow_at: Option<usize>,
    /// First `yield` / `await` seen in the current parameter list.
    pub(crate) yield_pos: Option<usize>,
    pub(crate) await_pos: Option<usize>,
    pub(crate) await_ident_pos: Option<usize>,
    pub(crate) labels: Vec<Label>,
    /// Module exports that refer to names not (yet) declared at top level.
    pub(crate) undefined_exports: FxHashMap<String, usize>,
    pub(crate) exported: FxHashSet<String>,
    pub(crate) scopes: ScopeStack,
    pub(crate) in_template_element: bool,
    pub(crate) regexp_state: Option<RegExpValidationState>,
    /// `(` positions where arrow parameters were tried and rejected, with
    /// the error that rejected them.
    pub(crate) arrow_rejected: FxHashMap<usize, Option<Error>>,

    recoverable: Vec<SyntaxError>,
    /// Current statement and expression nesting, see [`MAX_NESTING`].
    nesting: u32,
    /// Built on the first error that needs a location.
    line_index: OnceCell<LineIndex<'a>>,
    speculating: u32,
    pending: Vec<Event>,
    started: bool,
}

impl<'a> Parser<'a> {
    /// Create a parser for the whole input.
    pub fn new(options: Options, input: &'a str) -> Self {
        Self::starting_at(options, input, 0)
    }

    /// Create a parser that starts scanning at byte offset `start`.
    ///
    /// Line numbers are recomputed from the text before `start`, and the
    /// context and scope stacks start fresh, as at the top of a program.
    /// Fails with [`Error::InvalidOffset`] when `start` is past the end of
    /// the input or inside a UTF-8 sequence.
    pub fn new_at(options: Options, input: &'a str, start: usize) -> Result<Self> {
        if !input.is_char_boundary(start) {
            return Err(Error::InvalidOffset { offset: start, len: input.len() });
        }
        Ok(Self::starting_at(options, input, start))
    }

    /// `start` must be a char boundary of `input`.
    fn starting_at(options: Options, input: &'a str, start: usize) -> Self {
        let ecma = options.ecma_version.get();
        let in_module = options.is_module();
        let reserved = ReservedWords::new(
            ecma,
            in_module,
            options.reserved_policy() != AllowReserved::Allow,
        );
        let source_file = options
            .direct_source_file
            .clone()
            .or_else(|| options.source_file.clone());

        let (line, line_start) = if start > 0 {
            let (line, line_start) = locate(input, start);
            trace!(start, line, "recomputed line for appended parse");
            (line, line_start.min(start))
        } else {
            (1, 0)
        };
        let loc = Position::new(line, utf16_len(&input[line_start..start]));

        let state = State {
            pos: start,
            line: loc.line,
            line_start,
            column_anchor: (start, loc.column),
            ty: TokenType::Eof,
            value: TokenValue::None,
            start,
            end: start,
            start_loc: loc,
            end_loc: loc,
            last_tok_start: start,
            last_tok_end: start,
            last_tok_start_loc: loc,
            last_tok_end_loc: loc,
            context: vec![TokenContext::B_STAT],
            expr_allowed: true,
            contains_esc: false,
        };

        let mut parser = Self {
            options,
            callbacks: Callbacks::default(),
            input,
            ecma,
            source_file,
            reserved,
            state,
            in_module,
            strict: in_module,
            potential_arrow_at: None,
            yield_pos: None,
            await_pos: None,
            await_ident_pos: None,
            labels: Vec::new(),
            undefined_exports: FxHashMap::default(),
            exported: FxHashSet::default(),
            scopes: if in_module { ScopeStack::module() } else { ScopeStack::new() },
            in_template_element: false,
            regexp_state: None,
            arrow_rejected: FxHashMap::default(),
            recoverable: Vec::new(),
            nesting: 0,
            line_index: OnceCell::new(),
            speculating: 0,
            pending: Vec::new(),
            started: false,
        };
        parser.strict = in_module || parser.strict_directive(start);
        parser
    }

    /// Attach hooks.
    #[must_use]
    pub fn with_callbacks(mut self, callbacks: Callbacks<'a>) -> Self {
        self.callbacks = callbacks;
        self
    }

    /// Parse a complete program.
    pub fn parse(&mut self) -> Result<Node> {
        let marker = Marker { start: self.state.start, loc: self.state.start_loc };
        self.parse_program(marker, Vec::new())
    }

    /// Parse top-level statements and append them to an existing `Program`.
    ///
    /// Anything other than a `Program` node is treated as an empty program
    /// starting at its position.
    pub fn parse_into(&mut self, program: Node) -> Result<Node> {
        let marker = Marker {
            start: program.start,
            loc: program.loc.as_ref().map(|loc| loc.start).unwrap_or_default(),
        };
        let body = match program.kind {
            NodeKind::Program { body, .. } => body,
            _ => Vec::new(),
        };
        self.parse_program(marker, body)
    }

    /// Recoverable errors reported so far.
    pub fn recoverable_errors(&self) -> &[SyntaxError] {
        &self.recoverable
    }

    /// Whether the parser is in strict mode at the current position.
    pub fn is_strict(&self) -> bool {
        self.strict
    }

    fn parse_program(&mut self, marker: Marker, body: Vec<Node>) -> Result<Node> {
        debug!(
            ecma_version = self.ecma,
            source_type = ?self.options.source_type,
            len = self.input.len(),
            "parse start"
        );
        self.start_scanning()?;
        let program = self.parse_top_level(marker, body)?;
        debug!(
            end = program.end,
            recoverable = self.recoverable.len(),
            "parse finished"
        );
        Ok(program)
    }

    /// Parse a single expression at the scanner position.
    pub(crate) fn parse_expression_only(&mut self) -> Result<Node> {
        debug!(ecma_version = self.ecma, pos = self.state.pos, "parse expression");
        self.start_scanning()?;
        self.parse_expression(false, None)
    }

    /// Skip a hashbang line and read the first token.
    pub(crate) fn start_scanning(&mut self) -> Result<()> {
        if self.started {
            return Ok(());
        }
        self.started = true;
        if self.state.pos == 0 && self.options.allow_hash_bang && self.input.starts_with("#!") {
            self.skip_line_comment(2);
        }
        self.next_token()
    }

    // =========================================================================
    // Token Handling
    // =========================================================================

    #[inline]
    pub(crate) fn check(&self, ty: TokenType) -> bool {
        self.state.ty == ty
    }

    /// Consume the current token if it has type `ty`.
    pub(crate) fn eat(&mut self, ty: TokenType) -> Result<bool> {
        if self.state.ty == ty {
            self.next()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    pub(crate) fn expect(&mut self, ty: TokenType) -> Result<()> {
        if self.eat(ty)? {
            Ok(())
        } else {
            self.unexpected()
        }
    }

    /// Current token is the unescaped contextual keyword `name`.
    #[inline]
    pub(crate) fn is_contextual(&self, name: &str) -> bool {
        self.state.ty == TokenType::Name && self.state.value.is(name) && !self.state.contains_esc
    }

    pub(crate) fn eat_contextual(&mut self, name: &str) -> Result<bool> {
        if !self.is_contextual(name) {
            return Ok(false);
        }
        self.next()?;
        Ok(true)
    }

    pub(crate) fn expect_contextual(&mut self, name: &str) -> Result<()> {
        if self.eat_contextual(name)? {
            Ok(())
        } else {
            self.unexpected()
        }
    }

    /// A line terminator separates the previous token from the current one.
    #[inline]
    pub(crate) fn line_break_before(&self) -> bool {
        has_line_break(&self.input[self.state.last_tok_end..self.state.start])
    }

    pub(crate) fn can_insert_semicolon(&self) -> bool {
        self.state.ty == TokenType::Eof || self.state.ty == TokenType::BraceR || self.line_break_before()
    }

    pub(crate) fn insert_semicolon(&mut self) -> bool {
        if self.can_insert_semicolon() {
            let event = Event::InsertedSemicolon(self.state.last_tok_end, self.state.last_tok_end_loc);
            self.emit(event);
            true
        } else {
            false
        }
    }

    /// Consume a semicolon, or insert one where ASI allows it.
    pub(crate) fn semicolon(&mut self) -> Result<()> {
        if !self.eat(TokenType::Semi)? && !self.insert_semicolon() {
            return self.unexpected();
        }
        Ok(())
    }

    /// If the current token is `ty` right after a comma, report the trailing
    /// comma and (unless `not_next`) consume the token.
    pub(crate) fn after_trailing_comma(&mut self, ty: TokenType, not_next: bool) -> Result<bool> {
        if self.state.ty != ty {
            return Ok(false);
        }
        let event = Event::TrailingComma(self.state.last_tok_start, self.state.last_tok_start_loc);
        self.emit(event);
        if !not_next {
            self.next()?;
        }
        Ok(true)
    }

    /// Run a recursive production one nesting level deeper.
    pub(crate) fn nested<T>(&mut self, parse: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        if self.nesting >= MAX_NESTING {
            return self.raise(self.state.start, "Nesting is too deep");
        }
        self.nesting += 1;
        let result = parse(self);
        self.nesting -= 1;
        result
    }

    // =========================================================================
    // Diagnostics
    // =========================================================================

    fn position_of(&self, pos: usize) -> Position {
        self.line_index.get_or_init(|| LineIndex::new(self.input)).position(pos)
    }

    pub(crate) fn syntax_error(&self, pos: usize, message: impl Into<String>) -> SyntaxError {
        SyntaxError {
            message: message.into(),
            pos,
            loc: self.position_of(pos),
            raised_at: self.state.pos,
        }
    }

    pub(crate) fn raise<T>(&self, pos: usize, message: impl Into<String>) -> Result<T> {
        Err(Error::Syntax(self.syntax_error(pos, message)))
    }

    /// Report an error without stopping the parse.
    pub(crate) fn raise_recoverable(&mut self, pos: usize, message: impl Into<String>) {
        let err = self.syntax_error(pos, message);
        self.emit(Event::Recoverable(err));
    }

    pub(crate) fn unexpected<T>(&self) -> Result<T> {
        self.unexpected_at(self.state.start)
    }

    pub(crate) fn unexpected_at<T>(&self, pos: usize) -> Result<T> {
        self.raise(pos, "Unexpected token")
    }

    pub(crate) fn unsupported<T>(&self, pos: usize, construct: &'static str) -> Result<T> {
        Err(Error::Unsupported { construct, pos, loc: self.position_of(pos) })
    }

    pub(crate) fn check_pattern_errors(&mut self, errors: &DestructuringErrors, is_assign: bool) {
        if let Some(pos) = errors.trailing_comma {
            self.raise_recoverable(pos, "Comma is not permitted after the rest element");
        }
        let parens = if is_assign { errors.parenthesized_assign } else { errors.parenthesized_bind };
        if let Some(pos) = parens {
            self.raise_recoverable(pos, "Parenthesized pattern");
        }
    }

    /// Raise errors for constructs only valid in patterns.
    pub(crate) fn check_expression_errors(&mut self, errors: &DestructuringErrors) -> Result<()> {
        if let Some(pos) = errors.shorthand_assign {
            return self.raise(pos, "Shorthand property assignments are valid only in destructuring patterns");
        }
        if let Some(pos) = errors.double_proto {
            self.raise_recoverable(pos, "Redefinition of __proto__ property");
        }
        Ok(())
    }

    pub(crate) fn check_yield_await_in_default_params(&self) -> Result<()> {
        if let Some(yield_pos) = self.yield_pos {
            if self.await_pos.map_or(true, |await_pos| yield_pos < await_pos) {
                return self.raise(yield_pos, "Yield expression cannot be a default value");
            }
        }
        if let Some(await_pos) = self.await_pos {
            return self.raise(await_pos, "Await expression cannot be a default value");
        }
        Ok(())
    }

    // =========================================================================
    // Hooks
    // =========================================================================

    fn emit(&mut self, event: Event) {
        if self.speculating > 0 {
            self.pending.push(event);
        } else {
            self.dispatch(event);
        }
    }

    fn dispatch(&mut self, event: Event) {
        match event {
            Event::Token(token) => {
                if let Some(hook) = self.callbacks.on_token.as_mut() {
                    hook(&token);
                }
            }
            Event::Comment(comment) => {
                if let Some(hook) = self.callbacks.on_comment.as_mut() {
                    hook(&comment);
                }
            }
            Event::InsertedSemicolon(pos, loc) => {
                if let Some(hook) = self.callbacks.on_inserted_semicolon.as_mut() {
                    hook(pos, loc);
                }
            }
            Event::TrailingComma(pos, loc) => {
                if let Some(hook) = self.callbacks.on_trailing_comma.as_mut() {
                    hook(pos, loc);
                }
            }
            Event::Recoverable(err) => {
                if let Some(hook) = self.callbacks.on_recoverable.as_mut() {
                    hook(&err);
                }
                self.recoverable.push(err);
            }
        }
    }

    pub(crate) fn wants_tokens(&self) -> bool {
        self.callbacks.on_token.is_some()
    }

    pub(crate) fn emit_token(&mut self, token: Token) {
        self.emit(Event::Token(token));
    }

    pub(crate) fn wants_comments(&self) -> bool {
        self.callbacks.on_comment.is_some()
    }

    pub(crate) fn emit_comment(&mut self, comment: Comment) {
        self.emit(Event::Comment(comment));
    }

    // =========================================================================
    // Speculation
    // =========================================================================

    /// Capture parser state before a parse that may be abandoned.
    ///
    /// Hook events are held back until the outermost speculation commits.
    pub(crate) fn begin_speculation(&mut self) -> Snapshot {
        self.speculating += 1;
        Snapshot {
            state: self.state.clone(),
            strict: self.strict,
            scope_depth: self.scopes.depth(),
            labels: self.labels.clone(),
            potential_arrow_at: self.potential_arrow_at,
            yield_pos: self.yield_pos,
            await_pos: self.await_pos,
            await_ident_pos: self.await_ident_pos,
            pending: self.pending.len(),
        }
    }

    pub(crate) fn commit_speculation(&mut self) {
        self.speculating = self.speculating.saturating_sub(1);
        if self.speculating == 0 {
            for event in std::mem::take(&mut self.pending) {
                self.dispatch(event);
            }
        }
    }

    /// Restore the state captured by [`Parser::begin_speculation`].
    pub(crate) fn rollback_speculation(&mut self, snapshot: Snapshot) {
        trace!(
            start = snapshot.state.start,
            reached = self.state.start,
            "arrow parameters rejected, reparsing as expression"
        );
        self.speculating = self.speculating.saturating_sub(1);
        self.state = snapshot.state;
        self.strict = snapshot.strict;
        self.scopes.truncate(snapshot.scope_depth);
        self.labels = snapshot.labels;
        self.potential_arrow_at = snapshot.potential_arrow_at;
        self.yield_pos = snapshot.yield_pos;
        self.await_pos = snapshot.await_pos;
        self.await_ident_pos = snapshot.await_ident_pos;
        self.pending.truncate(snapshot.pending);
        self.in_template_element = false;
    }

    // =========================================================================
    // Nodes
    // =========================================================================

    #[inline]
    pub(crate) fn start_node(&self) -> Marker {
        Marker { start: self.state.start, loc: self.state.start_loc }
    }

    /// Close a node at the end of the previous token.
    pub(crate) fn finish_node(&self, marker: Marker, kind: NodeKind) -> Node {
        self.finish_node_at(marker, kind, self.state.last_tok_end, self.state.last_tok_end_loc)
    }

    pub(crate) fn finish_node_at(&self, marker: Marker, kind: NodeKind, end: usize, end_loc: Position) -> Node {
        Node {
            kind,
            start: marker.start,
            end,
            loc: self
                .options
                .locations
                .then(|| SourceLocation::new(marker.loc, end_loc, self.source_file.clone())),
            range: self.options.ranges.then_some((marker.start, end)),
        }
    }

    // =========================================================================
    // Strict Mode
    // =========================================================================

    /// Whether the directive prologue starting at `start` contains a
    /// `'use strict'` directive.
    pub(crate) fn strict_directive(&self, mut start: usize) -> bool {
        let input = self.input;
        loop {
            start = skip_white_space(input, start).end;
            let Some(len) = string_literal_len(&input[start..]) else {
                return false;
            };
            let content = &input[start + 1..start + len - 1];
            if content == "use strict" {
                let after = skip_white_space(input, start + len);
                let mut rest = input[after.end..].chars();
                return match rest.next() {
                    None | Some(';' | '}') => true,
                    Some(next) => {
                        let continues_expression = matches!(
                            next,
                            '(' | '`' | '.' | '[' | '+' | '-' | '/' | '*' | '%' | '<' | '>' | '=' | ','
                                | '?' | '^' | '&'
                        ) || (next == '!' && rest.next() == Some('='));
                        after.line_break && !continues_expression
                    }
                };
            }
            start = skip_white_space(input, start + len).end;
            if input[start..].starts_with(';') {
                start += 1;
            }
        }
    }

    /// Mark leading string-literal statements as directives.
    pub(crate) fn adapt_directive_prologue(&self, statements: &mut [Node]) {
        if self.ecma < 5 {
            return;
        }
        for statement in statements {
            let NodeKind::ExpressionStatement { expression, directive } = &mut statement.kind else {
                break;
            };
            let is_string = matches!(
                &expression.kind,
                NodeKind::Literal { value: crate::node::LiteralValue::String(_), .. }
            );
            let quoted = self.input[statement.start..].starts_with(['"', '\'']);
            if !is_string || !quoted {
                break;
            }
            let raw = &self.input[expression.start..expression.end];
            *directive = Some(raw[1..raw.len() - 1].to_string());
        }
    }
}

/// Length of a string literal at the start of `text`, quotes included.
fn string_literal_len(text: &str) -> Option<usize> {
    let mut chars = text.char_indices();
    let (_, quote) = chars.next()?;
    if quote != '\'' && quote != '"' {
        return None;
    }
    while let Some((i, c)) = chars.next() {
        if c == '\\' {
            chars.next();
        } else if c == quote {
            return Some(i + 1);
        }
    }
    None
}
