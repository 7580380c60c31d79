//! Statement, declaration, and module item parsing.

use bitflags::bitflags;

use crate::error::Result;
use crate::node::{Class, Function, LiteralValue, MethodKind, Node, NodeKind, VarKind};
use crate::parser::{DestructuringErrors, Label, LabelKind, Marker, Parser};
use crate::scope::{BindingKind, ScopeFlags};
use crate::token::TokenType;
use crate::unicode::{full_char_at, is_identifier_char, is_identifier_start};
use crate::whitespace::skip_white_space;

bitflags! {
    /// How a `function` is being parsed.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub(crate) struct FunctionFlags: u8 {
        /// A declaration rather than an expression.
        const STATEMENT = 1;
        /// The body of an `if` or a label, where the name is not bound.
        const HANGING = 1 << 1;
        /// `export default function () {}`
        const NULLABLE_ID = 1 << 2;
    }
}

/// The construct a nested statement is the body of.
///
/// Declarations are not statements, so most of them are rejected here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StatementContext {
    Do,
    For,
    If,
    While,
    With,
    /// Labeled statement body, directly or through more labels.
    Label,
    /// Labeled statement inside one of the other contexts.
    NestedLabel,
}

impl<'a> Parser<'a> {
    // =========================================================================
    // Program
    // =========================================================================

    /// Parse statements up to the end of input and finish the `Program`.
    pub(crate) fn parse_top_level(&mut self, marker: Marker, mut body: Vec<Node>) -> Result<Node> {
        while !self.check(TokenType::Eof) {
            let stmt = self.parse_statement(None, true)?;
            body.push(stmt);
        }
        if self.in_module {
            if let Some((name, pos)) = self.undefined_exports.iter().min_by_key(|(_, pos)| **pos) {
                return self.raise(*pos, format!("Export '{name}' is not defined"));
            }
        }
        self.adapt_directive_prologue(&mut body);
        self.next()?;
        let source_type = self.options.source_type;
        Ok(self.finish_node(marker, NodeKind::Program { body, source_type }))
    }

    // =========================================================================
    // Lookahead
    // =========================================================================

    /// `let` starts a declaration rather than naming a variable.
    fn is_let(&self, context: Option<StatementContext>) -> bool {
        if self.ecma < 6 || !self.is_contextual("let") {
            return false;
        }
        let next = skip_white_space(self.input, self.state.pos).end;
        let Some(c) = full_char_at(self.input, next) else {
            return false;
        };
        if c == '[' {
            return true;
        }
        if context.is_some() {
            return false;
        }
        if c == '{' {
            return true;
        }
        if is_identifier_start(c as u32, true) {
            let rest = &self.input[next..];
            let len = rest
                .char_indices()
                .find(|&(_, c)| !is_identifier_char(c as u32, true))
                .map_or(rest.len(), |(i, _)| i);
            return !matches!(&rest[..len], "in" | "instanceof");
        }
        false
    }

    /// `async function` with no line break in between.
    fn is_async_function(&self) -> bool {
        if self.ecma < 8 || !self.is_contextual("async") {
            return false;
        }
        let skipped = skip_white_space(self.input, self.state.pos);
        if skipped.line_break {
            return false;
        }
        let rest = &self.input[skipped.end..];
        rest.strip_prefix("function")
            .is_some_and(|after| !after.chars().next().is_some_and(|c| is_identifier_char(c as u32, true)))
    }

    /// The character after the current token, past whitespace and comments.
    fn peek_char(&self) -> Option<char> {
        full_char_at(self.input, skip_white_space(self.input, self.state.pos).end)
    }

    // =========================================================================
    // Statements
    // =========================================================================

    /// Parse a single statement.
    ///
    /// `context` is set when the statement is the body of another statement,
    /// which rules out most declarations.
    pub(crate) fn parse_statement(&mut self, context: Option<StatementContext>, top_level: bool) -> Result<Node> {
        self.nested(|p| p.parse_statement_inner(context, top_level))
    }

    fn parse_statement_inner(&mut self, context: Option<StatementContext>, top_level: bool) -> Result<Node> {
        let marker = self.start_node();
        let mut start_type = self.state.ty;
        let mut let_kind = false;
        if self.is_let(context) {
            start_type = TokenType::Var;
            let_kind = true;
        }

        match start_type {
            TokenType::Break | TokenType::Continue => {
                self.parse_break_continue(marker, start_type == TokenType::Break)
            }
            TokenType::Debugger => {
                self.next()?;
                self.semicolon()?;
                Ok(self.finish_node(marker, NodeKind::DebuggerStatement))
            }
            TokenType::Do => self.parse_do_statement(marker),
            TokenType::For => self.parse_for_statement(marker),
            TokenType::Function => {
                if let Some(context) = context {
                    let allowed = matches!(context, StatementContext::If | StatementContext::Label);
                    if self.ecma >= 6 && (self.strict || !allowed) {
                        return self.unexpected();
                    }
                }
                self.parse_function_statement(marker, false, context.is_none())
            }
            TokenType::Class => {
                if context.is_some() {
                    return self.unexpected();
                }
                self.parse_class(marker, true, false)
            }
            TokenType::If => self.parse_if_statement(marker),
            TokenType::Return => self.parse_return_statement(marker),
            TokenType::Switch => self.parse_switch_statement(marker),
            TokenType::Throw => self.parse_throw_statement(marker),
            TokenType::Try => self.parse_try_statement(marker),
            TokenType::Const | TokenType::Var => {
                let kind = if let_kind {
                    VarKind::Let
                } else if start_type == TokenType::Const {
                    VarKind::Const
                } else {
                    VarKind::Var
                };
                if context.is_some() && kind != VarKind::Var {
                    return self.unexpected();
                }
                self.parse_var_statement(marker, kind)
            }
            TokenType::While => self.parse_while_statement(marker),
            TokenType::With => self.parse_with_statement(marker),
            TokenType::BraceL => self.parse_block(true, false),
            TokenType::Semi => {
                self.next()?;
                Ok(self.finish_node(marker, NodeKind::EmptyStatement))
            }
            TokenType::Export | TokenType::Import => {
                if start_type == TokenType::Import && matches!(self.peek_char(), Some('(' | '.')) {
                    let expr = self.parse_expression(false, None)?;
                    return self.parse_expression_statement(marker, expr);
                }
                if !self.options.allow_import_export_everywhere {
                    if !top_level {
                        return self.raise(self.state.start, "'import' and 'export' may only appear at the top level");
                    }
                    if !self.in_module {
                        return self.raise(
                            self.state.start,
                            "'import' and 'export' may appear only with 'sourceType: module'",
                        );
                    }
                }
                if start_type == TokenType::Import {
                    self.parse_import(marker)
                } else {
                    self.parse_export(marker, top_level)
                }
            }
            _ => {
                if self.is_async_function() {
                    if context.is_some() {
                        return self.unexpected();
                    }
                    self.next()?;
                    return self.parse_function_statement(marker, true, context.is_none());
                }
                let maybe_name = self.state.value.as_str().map(str::to_string);
                let expr = self.parse_expression(false, None)?;
                if start_type == TokenType::Name && matches!(expr.kind, NodeKind::Identifier { .. }) {
                    if let Some(name) = maybe_name {
                        if self.eat(TokenType::Colon)? {
                            return self.parse_labeled_statement(marker, name, expr, context);
                        }
                    }
                }
                self.parse_expression_statement(marker, expr)
            }
        }
    }

    fn parse_break_continue(&mut self, marker: Marker, is_break: bool) -> Result<Node> {
        let keyword = if is_break { "break" } else { "continue" };
        self.next()?;
        let label = if self.eat(TokenType::Semi)? || self.insert_semicolon() {
            None
        } else if !self.check(TokenType::Name) {
            return self.unexpected();
        } else {
            let label = self.parse_ident(false)?;
            self.semicolon()?;
            Some(label)
        };

        let label_name = label.as_ref().and_then(|l| l.ident_name());
        let found = self.labels.iter().any(|lab| {
            let name_matches = label_name.map_or(true, |name| lab.name.as_deref() == Some(name));
            name_matches
                && ((lab.kind.is_some() && (is_break || lab.kind == Some(LabelKind::Loop)))
                    || (label_name.is_some() && is_break))
        });
        if !found {
            return self.raise(marker.start, format!("Unsyntactic {keyword}"));
        }

        let label = label.map(Box::new);
        let kind = if is_break {
            NodeKind::BreakStatement { label }
        } else {
            NodeKind::ContinueStatement { label }
        };
        Ok(self.finish_node(marker, kind))
    }

    fn loop_label() -> Label {
        Label { name: None, kind: Some(LabelKind::Loop), statement_start: None }
    }

    fn parse_do_statement(&mut self, marker: Marker) -> Result<Node> {
        self.next()?;
        self.labels.push(Self::loop_label());
        let body = self.parse_statement(Some(StatementContext::Do), false)?;
        self.labels.pop();
        self.expect(TokenType::While)?;
        let test = self.parse_paren_expression()?;
        if self.ecma >= 6 {
            self.eat(TokenType::Semi)?;
        } else {
            self.semicolon()?;
        }
        Ok(self.finish_node(marker, NodeKind::DoWhileStatement { body: Box::new(body), test: Box::new(test) }))
    }

    /// `for`, `for-in`, `for-of`, and `for await`.
    ///
    /// The head gets its own scope, so `let` bindings there do not leak.
    fn parse_for_statement(&mut self, marker: Marker) -> Result<Node> {
        self.next()?;
        let await_allowed = self.ecma >= 9
            && (self.scopes.in_async()
                || (!self.scopes.in_function() && self.options.allow_await_outside_function));
        let await_at = if await_allowed && self.eat_contextual("await")? {
            Some(self.state.last_tok_start)
        } else {
            None
        };
        self.labels.push(Self::loop_label());
        self.scopes.enter(ScopeFlags::empty());
        self.expect(TokenType::ParenL)?;

        if self.check(TokenType::Semi) {
            if let Some(pos) = await_at {
                return self.unexpected_at(pos);
            }
            return self.parse_for(marker, None);
        }

        let is_let = self.is_let(None);
        if self.check(TokenType::Var) || self.check(TokenType::Const) || is_let {
            let init_marker = self.start_node();
            let kind = if is_let {
                VarKind::Let
            } else if self.check(TokenType::Const) {
                VarKind::Const
            } else {
                VarKind::Var
            };
            self.next()?;
            let declarations = self.parse_var(true, kind)?;
            let single = declarations.len() == 1;
            let init = self.finish_node(init_marker, NodeKind::VariableDeclaration { declarations, kind });
            if single && (self.check(TokenType::In) || (self.ecma >= 6 && self.is_contextual("of"))) {
                let is_await = self.for_in_await(await_at)?;
                return self.parse_for_in(marker, init, is_await);
            }
            if let Some(pos) = await_at {
                return self.unexpected_at(pos);
            }
            return self.parse_for(marker, Some(init));
        }

        let mut errors = DestructuringErrors::default();
        let mut init = self.parse_expression(true, Some(&mut errors))?;
        if self.check(TokenType::In) || (self.ecma >= 6 && self.is_contextual("of")) {
            let is_await = self.for_in_await(await_at)?;
            self.to_assignable(&mut init, Some(&errors))?;
            self.check_lval(&init, BindingKind::None, None)?;
            return self.parse_for_in(marker, init, is_await);
        }
        self.check_expression_errors(&errors)?;
        if let Some(pos) = await_at {
            return self.unexpected_at(pos);
        }
        self.parse_for(marker, Some(init))
    }

    /// `await` only goes with `of`.
    fn for_in_await(&self, await_at: Option<usize>) -> Result<bool> {
        if self.check(TokenType::In) {
            if let Some(pos) = await_at {
                return self.unexpected_at(pos);
            }
        }
        Ok(await_at.is_some())
    }

    fn parse_for(&mut self, marker: Marker, init: Option<Node>) -> Result<Node> {
        self.expect(TokenType::Semi)?;
        let test = if self.check(TokenType::Semi) { None } else { Some(self.parse_expression(false, None)?) };
        self.expect(TokenType::Semi)?;
        let update = if self.check(TokenType::ParenR) { None } else { Some(self.parse_expression(false, None)?) };
        self.expect(TokenType::ParenR)?;
        let body = self.parse_statement(Some(StatementContext::For), false)?;
        self.scopes.exit();
        self.labels.pop();
        Ok(self.finish_node(
            marker,
            NodeKind::ForStatement {
                init: init.map(Box::new),
                test: test.map(Box::new),
                update: update.map(Box::new),
                body: Box::new(body),
            },
        ))
    }

    fn parse_for_in(&mut self, marker: Marker, left: Node, is_await: bool) -> Result<Node> {
        let is_for_in = self.check(TokenType::In);
        self.next()?;

        let bad_initializer = match &left.kind {
            NodeKind::VariableDeclaration { declarations, kind } => declarations.first().is_some_and(|decl| {
                matches!(
                    &decl.kind,
                    NodeKind::VariableDeclarator { id, init: Some(_) }
                        if !is_for_in
                            || self.ecma < 8
                            || self.strict
                            || *kind != VarKind::Var
                            || !matches!(id.kind, NodeKind::Identifier { .. })
                )
            }),
            _ => false,
        };
        if bad_initializer {
            let what = if is_for_in { "for-in" } else { "for-of" };
            return self.raise(left.start, format!("{what} loop variable declaration may not have an initializer"));
        }
        if matches!(left.kind, NodeKind::AssignmentPattern { .. }) {
            return self.raise(left.start, "Invalid left-hand side in for-loop");
        }

        let right = if is_for_in {
            self.parse_expression(false, None)?
        } else {
            self.parse_maybe_assign(false, None)?
        };
        self.expect(TokenType::ParenR)?;
        let body = self.parse_statement(Some(StatementContext::For), false)?;
        self.scopes.exit();
        self.labels.pop();

        let (left, right, body) = (Box::new(left), Box::new(right), Box::new(body));
        let kind = if is_for_in {
            NodeKind::ForInStatement { left, right, body }
        } else {
            NodeKind::ForOfStatement { left, right, body, is_await }
        };
        Ok(self.finish_node(marker, kind))
    }

    fn parse_function_statement(&mut self, marker: Marker, is_async: bool, declaration_position: bool) -> Result<Node> {
        self.next()?;
        let mut flags = FunctionFlags::STATEMENT;
        if !declaration_position {
            flags |= FunctionFlags::HANGING;
        }
        self.parse_function(marker, flags, is_async)
    }

    fn parse_if_statement(&mut self, marker: Marker) -> Result<Node> {
        self.next()?;
        let test = self.parse_paren_expression()?;
        let consequent = self.parse_statement(Some(StatementContext::If), false)?;
        let alternate = if self.eat(TokenType::Else)? {
            Some(Box::new(self.parse_statement(Some(StatementContext::If), false)?))
        } else {
            None
        };
        Ok(self.finish_node(
            marker,
            NodeKind::IfStatement { test: Box::new(test), consequent: Box::new(consequent), alternate },
        ))
    }

    fn parse_return_statement(&mut self, marker: Marker) -> Result<Node> {
        if !self.scopes.in_function() && !self.options.allow_return_outside_function {
            return self.raise(self.state.start, "'return' outside of function");
        }
        self.next()?;
        let argument = if self.eat(TokenType::Semi)? || self.insert_semicolon() {
            None
        } else {
            let argument = self.parse_expression(false, None)?;
            self.semicolon()?;
            Some(Box::new(argument))
        };
        Ok(self.finish_node(marker, NodeKind::ReturnStatement { argument }))
    }

    fn parse_switch_statement(&mut self, marker: Marker) -> Result<Node> {
        self.next()?;
        let discriminant = self.parse_paren_expression()?;
        self.expect(TokenType::BraceL)?;
        self.labels.push(Label { name: None, kind: Some(LabelKind::Switch), statement_start: None });
        self.scopes.enter(ScopeFlags::empty());

        let mut cases = Vec::new();
        // Case under construction: start marker, test, consequent.
        let mut current: Option<(Marker, Option<Box<Node>>, Vec<Node>)> = None;
        let mut saw_default = false;
        while !self.check(TokenType::BraceR) {
            if self.check(TokenType::Case) || self.check(TokenType::Default) {
                let is_case = self.check(TokenType::Case);
                if let Some((case_marker, test, consequent)) = current.take() {
                    cases.push(self.finish_node(case_marker, NodeKind::SwitchCase { test, consequent }));
                }
                let case_marker = self.start_node();
                self.next()?;
                let test = if is_case {
                    Some(Box::new(self.parse_expression(false, None)?))
                } else {
                    if saw_default {
                        self.raise_recoverable(self.state.last_tok_start, "Multiple default clauses");
                    }
                    saw_default = true;
                    None
                };
                self.expect(TokenType::Colon)?;
                current = Some((case_marker, test, Vec::new()));
            } else {
                let Some((_, _, consequent)) = current.as_mut() else {
                    return self.unexpected();
                };
                let stmt = self.parse_statement(None, false)?;
                consequent.push(stmt);
            }
        }
        self.scopes.exit();
        if let Some((case_marker, test, consequent)) = current {
            cases.push(self.finish_node(case_marker, NodeKind::SwitchCase { test, consequent }));
        }
        self.next()?;
        self.labels.pop();
        Ok(self.finish_node(marker, NodeKind::SwitchStatement { discriminant: Box::new(discriminant), cases }))
    }

    fn parse_throw_statement(&mut self, marker: Marker) -> Result<Node> {
        self.next()?;
        if self.line_break_before() {
            return self.raise(self.state.last_tok_end, "Illegal newline after throw");
        }
        let argument = self.parse_expression(false, None)?;
        self.semicolon()?;
        Ok(self.finish_node(marker, NodeKind::ThrowStatement { argument: Box::new(argument) }))
    }

    fn parse_try_statement(&mut self, marker: Marker) -> Result<Node> {
        self.next()?;
        let block = self.parse_block(true, false)?;
        let mut handler = None;
        if self.check(TokenType::Catch) {
            let clause_marker = self.start_node();
            self.next()?;
            let param = if self.eat(TokenType::ParenL)? {
                let param = self.parse_binding_atom()?;
                let simple = matches!(param.kind, NodeKind::Identifier { .. });
                if simple {
                    self.scopes.enter(ScopeFlags::SIMPLE_CATCH);
                    self.check_lval(&param, BindingKind::SimpleCatch, None)?;
                } else {
                    self.scopes.enter(ScopeFlags::empty());
                    self.check_lval(&param, BindingKind::Lexical, None)?;
                }
                self.expect(TokenType::ParenR)?;
                Some(Box::new(param))
            } else {
                if self.ecma < 10 {
                    return self.unexpected();
                }
                self.scopes.enter(ScopeFlags::empty());
                None
            };
            let body = self.parse_block(false, false)?;
            self.scopes.exit();
            handler = Some(Box::new(self.finish_node(clause_marker, NodeKind::CatchClause { param, body: Box::new(body) })));
        }
        let finalizer = if self.eat(TokenType::Finally)? {
            Some(Box::new(self.parse_block(true, false)?))
        } else {
            None
        };
        if handler.is_none() && finalizer.is_none() {
            return self.raise(marker.start, "Missing catch or finally clause");
        }
        Ok(self.finish_node(marker, NodeKind::TryStatement { block: Box::new(block), handler, finalizer }))
    }

    fn parse_var_statement(&mut self, marker: Marker, kind: VarKind) -> Result<Node> {
        self.next()?;
        let declarations = self.parse_var(false, kind)?;
        self.semicolon()?;
        Ok(self.finish_node(marker, NodeKind::VariableDeclaration { declarations, kind }))
    }

    fn parse_while_statement(&mut self, marker: Marker) -> Result<Node> {
        self.next()?;
        let test = self.parse_paren_expression()?;
        self.labels.push(Self::loop_label());
        let body = self.parse_statement(Some(StatementContext::While), false)?;
        self.labels.pop();
        Ok(self.finish_node(marker, NodeKind::WhileStatement { test: Box::new(test), body: Box::new(body) }))
    }

    fn parse_with_statement(&mut self, marker: Marker) -> Result<Node> {
        if self.strict {
            return self.raise(self.state.start, "'with' in strict mode");
        }
        self.next()?;
        let object = self.parse_paren_expression()?;
        let body = self.parse_statement(Some(StatementContext::With), false)?;
        Ok(self.finish_node(marker, NodeKind::WithStatement { object: Box::new(object), body: Box::new(body) }))
    }

    fn parse_labeled_statement(
        &mut self,
        marker: Marker,
        name: String,
        label: Node,
        context: Option<StatementContext>,
    ) -> Result<Node> {
        if self.labels.iter().any(|l| l.name.as_deref() == Some(name.as_str())) {
            return self.raise(label.start, format!("Label '{name}' is already declared"));
        }
        let kind = if self.state.ty.info().is_loop {
            Some(LabelKind::Loop)
        } else if self.check(TokenType::Switch) {
            Some(LabelKind::Switch)
        } else {
            None
        };
        // Labels stacked on the same statement share its kind.
        let start = self.state.start;
        for outer in self.labels.iter_mut().rev() {
            if outer.statement_start == Some(marker.start) {
                outer.statement_start = Some(start);
                outer.kind = kind;
            } else {
                break;
            }
        }
        self.labels.push(Label { name: Some(name), kind, statement_start: Some(start) });
        let body_context = match context {
            None | Some(StatementContext::Label) => StatementContext::Label,
            Some(_) => StatementContext::NestedLabel,
        };
        let body = self.parse_statement(Some(body_context), false)?;
        self.labels.pop();
        Ok(self.finish_node(marker, NodeKind::LabeledStatement { label: Box::new(label), body: Box::new(body) }))
    }

    fn parse_expression_statement(&mut self, marker: Marker, expr: Node) -> Result<Node> {
        self.semicolon()?;
        Ok(self.finish_node(marker, NodeKind::ExpressionStatement { expression: Box::new(expr), directive: None }))
    }

    /// Parse `{ ... }`.
    ///
    /// With `exit_strict`, strict mode ends before the token after `}` is
    /// read, for function bodies that turned strict on themselves.
    pub(crate) fn parse_block(&mut self, create_scope: bool, exit_strict: bool) -> Result<Node> {
        let marker = self.start_node();
        self.expect(TokenType::BraceL)?;
        if create_scope {
            self.scopes.enter(ScopeFlags::empty());
        }
        let mut body = Vec::new();
        while !self.check(TokenType::BraceR) {
            let stmt = self.parse_statement(None, false)?;
            body.push(stmt);
        }
        if exit_strict {
            self.strict = false;
        }
        self.next()?;
        if create_scope {
            self.scopes.exit();
        }
        Ok(self.finish_node(marker, NodeKind::BlockStatement { body }))
    }

    fn parse_paren_expression(&mut self) -> Result<Node> {
        self.expect(TokenType::ParenL)?;
        let expr = self.parse_expression(false, None)?;
        self.expect(TokenType::ParenR)?;
        Ok(expr)
    }

    /// Parse the declarators of a `var`, `let`, or `const`.
    fn parse_var(&mut self, is_for: bool, kind: VarKind) -> Result<Vec<Node>> {
        let binding = if kind == VarKind::Var { BindingKind::Var } else { BindingKind::Lexical };
        let mut declarations = Vec::new();
        loop {
            let marker = self.start_node();
            let id = self.parse_binding_atom()?;
            self.check_lval(&id, binding, None)?;
            let in_or_of = self.check(TokenType::In) || (self.ecma >= 6 && self.is_contextual("of"));
            let init = if self.eat(TokenType::Eq)? {
                Some(Box::new(self.parse_maybe_assign(is_for, None)?))
            } else if kind == VarKind::Const && !in_or_of {
                return self.unexpected();
            } else if !matches!(id.kind, NodeKind::Identifier { .. }) && !(is_for && in_or_of) {
                return self.raise(self.state.last_tok_end, "Complex binding patterns require an initialization value");
            } else {
                None
            };
            declarations.push(self.finish_node(marker, NodeKind::VariableDeclarator { id: Box::new(id), init }));
            if !self.eat(TokenType::Comma)? {
                break;
            }
        }
        Ok(declarations)
    }

    // =========================================================================
    // Functions
    // =========================================================================

    /// Parse a function after the `function` keyword (and `async`).
    pub(crate) fn parse_function(&mut self, marker: Marker, flags: FunctionFlags, is_async: bool) -> Result<Node> {
        let is_statement = flags.contains(FunctionFlags::STATEMENT);
        let mut generator = false;
        if self.ecma >= 9 || (self.ecma >= 6 && !is_async) {
            if self.check(TokenType::Star) && flags.contains(FunctionFlags::HANGING) {
                return self.unexpected();
            }
            generator = self.eat(TokenType::Star)?;
        }
        let is_async = self.ecma >= 8 && is_async;

        let mut id = None;
        if is_statement && !(flags.contains(FunctionFlags::NULLABLE_ID) && !self.check(TokenType::Name)) {
            let ident = self.parse_ident(false)?;
            if !flags.contains(FunctionFlags::HANGING) {
                self.check_lval(&ident, BindingKind::Function, None)?;
            }
            id = Some(ident);
        }

        let saved = (self.yield_pos, self.await_pos, self.await_ident_pos);
        self.yield_pos = None;
        self.await_pos = None;
        self.await_ident_pos = None;
        self.scopes.enter(ScopeFlags::function(is_async, generator));

        // An expression's name is bound inside its own scope.
        if !is_statement && self.check(TokenType::Name) {
            id = Some(self.parse_ident(false)?);
        }

        self.expect(TokenType::ParenL)?;
        let params = self.parse_params()?;
        self.check_yield_await_in_default_params()?;
        let (body, expression) = self.parse_function_body(&params, id.as_ref(), false, false, marker.start)?;

        (self.yield_pos, self.await_pos, self.await_ident_pos) = saved;

        let function = Function {
            id: id.map(Box::new),
            params,
            body: Box::new(body),
            generator,
            is_async,
            expression,
        };
        let kind = if is_statement {
            NodeKind::FunctionDeclaration(function)
        } else {
            NodeKind::FunctionExpression(function)
        };
        Ok(self.finish_node(marker, kind))
    }

    // =========================================================================
    // Classes
    // =========================================================================

    /// Parse a class at the `class` keyword. Class code is always strict.
    pub(crate) fn parse_class(&mut self, marker: Marker, is_statement: bool, nullable_id: bool) -> Result<Node> {
        self.next()?;
        let old_strict = self.strict;
        self.strict = true;

        let id = if self.check(TokenType::Name) {
            let ident = self.parse_ident(false)?;
            if is_statement {
                self.check_lval(&ident, BindingKind::Lexical, None)?;
            }
            Some(Box::new(ident))
        } else {
            if is_statement && !nullable_id {
                return self.unexpected();
            }
            None
        };

        let super_class = if self.eat(TokenType::Extends)? {
            Some(Box::new(self.parse_expr_subscripts(None)?))
        } else {
            None
        };

        let body_marker = self.start_node();
        self.expect(TokenType::BraceL)?;
        let mut elements = Vec::new();
        let mut had_constructor = false;
        while !self.check(TokenType::BraceR) {
            if let Some(element) = self.parse_class_element(super_class.is_some())? {
                if matches!(element.kind, NodeKind::MethodDefinition { kind: MethodKind::Constructor, .. }) {
                    if had_constructor {
                        return self.raise(element.start, "Duplicate constructor in the same class");
                    }
                    had_constructor = true;
                }
                elements.push(element);
            }
        }
        self.strict = old_strict;
        self.next()?;
        let body = self.finish_node(body_marker, NodeKind::ClassBody { body: elements });

        let class = Class { id, super_class, body: Box::new(body) };
        let kind = if is_statement {
            NodeKind::ClassDeclaration(class)
        } else {
            NodeKind::ClassExpression(class)
        };
        Ok(self.finish_node(marker, kind))
    }

    /// Eat a method modifier (`static`, `async`, `get`, `set`).
    ///
    /// Returns false when the word turns out to be the method name itself,
    /// which is then stored in `key`.
    fn eat_modifier(&mut self, word: &'static str, no_line_break: bool, key: &mut Option<Node>) -> Result<bool> {
        let marker = self.start_node();
        if !self.eat_contextual(word)? {
            return Ok(false);
        }
        if !self.check(TokenType::ParenL) && (!no_line_break || !self.can_insert_semicolon()) {
            return Ok(true);
        }
        if key.is_some() {
            return self.unexpected();
        }
        *key = Some(self.finish_node(marker, NodeKind::Identifier { name: word.to_string() }));
        Ok(false)
    }

    fn parse_class_element(&mut self, constructor_allows_super: bool) -> Result<Option<Node>> {
        if self.eat(TokenType::Semi)? {
            return Ok(None);
        }
        let marker = self.start_node();
        let mut key = None;
        let mut kind = MethodKind::Method;
        let is_static = self.eat_modifier("static", false, &mut key)?;
        let mut generator = self.eat(TokenType::Star)?;
        let mut is_async = false;
        if !generator {
            if self.ecma >= 8 && self.eat_modifier("async", true, &mut key)? {
                is_async = true;
                generator = self.ecma >= 9 && self.eat(TokenType::Star)?;
            } else if self.eat_modifier("get", false, &mut key)? {
                kind = MethodKind::Get;
            } else if self.eat_modifier("set", false, &mut key)? {
                kind = MethodKind::Set;
            }
        }
        let (key, computed) = match key {
            Some(key) => (key, false),
            None => self.parse_property_name()?,
        };

        if !self.check(TokenType::ParenL) {
            return self.unsupported(key.start, "class fields");
        }

        let is_constructor_name = match &key.kind {
            NodeKind::Identifier { name } => name == "constructor",
            NodeKind::Literal { value: LiteralValue::String(value), .. } => value == "constructor",
            _ => false,
        };
        let mut allow_direct_super = false;
        if !computed && !is_static && is_constructor_name {
            if kind != MethodKind::Method {
                return self.raise(key.start, "Constructor can't have get/set modifier");
            }
            if generator {
                return self.raise(key.start, "Constructor can't be a generator");
            }
            if is_async {
                return self.raise(key.start, "Constructor can't be an async method");
            }
            kind = MethodKind::Constructor;
            allow_direct_super = constructor_allows_super;
        } else if is_static && !computed && key.ident_name() == Some("prototype") {
            return self.raise(key.start, "Classes may not have a static property named prototype");
        }

        let value = self.parse_method(generator, is_async, allow_direct_super)?;
        if matches!(kind, MethodKind::Get | MethodKind::Set) {
            self.check_accessor_params(kind == MethodKind::Get, &value);
        }
        Ok(Some(self.finish_node(
            marker,
            NodeKind::MethodDefinition { key: Box::new(key), value: Box::new(value), kind, computed, is_static },
        )))
    }

    // =========================================================================
    // Modules
    // =========================================================================

    /// Record an exported name. Only top-level exports are tracked.
    fn check_export(&mut self, track: bool, name: &str, pos: usize) -> Result<()> {
        if track && !self.exported.insert(name.to_string()) {
            return self.raise(pos, format!("Duplicate export '{name}'"));
        }
        Ok(())
    }

    fn check_pattern_export(&mut self, track: bool, pattern: &Node) -> Result<()> {
        match &pattern.kind {
            NodeKind::Identifier { name } => self.check_export(track, name, pattern.start),
            NodeKind::ObjectPattern { properties } => {
                for prop in properties {
                    self.check_pattern_export(track, prop)?;
                }
                Ok(())
            }
            NodeKind::ArrayPattern { elements } => {
                for element in elements.iter().flatten() {
                    self.check_pattern_export(track, element)?;
                }
                Ok(())
            }
            NodeKind::Property { value, .. } => self.check_pattern_export(track, value),
            NodeKind::AssignmentPattern { left, .. } => self.check_pattern_export(track, left),
            NodeKind::RestElement { argument } => self.check_pattern_export(track, argument),
            NodeKind::ParenthesizedExpression { expression } => self.check_pattern_export(track, expression),
            _ => Ok(()),
        }
    }

    /// A declaration follows `export`.
    fn should_parse_export_statement(&self) -> bool {
        matches!(
            self.state.ty,
            TokenType::Var | TokenType::Const | TokenType::Class | TokenType::Function
        ) || self.is_let(None)
            || self.is_async_function()
    }

    fn parse_export(&mut self, marker: Marker, track: bool) -> Result<Node> {
        self.next()?;

        if self.eat(TokenType::Star)? {
            let mut exported = None;
            if self.ecma >= 11 && self.eat_contextual("as")? {
                let name = self.parse_ident(true)?;
                if let Some(text) = name.ident_name() {
                    self.check_export(track, text, name.start)?;
                }
                exported = Some(Box::new(name));
            }
            self.expect_contextual("from")?;
            let source = self.parse_module_source()?;
            self.semicolon()?;
            return Ok(self.finish_node(marker, NodeKind::ExportAllDeclaration { exported, source: Box::new(source) }));
        }

        if self.eat(TokenType::Default)? {
            self.check_export(track, "default", self.state.last_tok_start)?;
            let is_async = !self.check(TokenType::Function) && self.is_async_function();
            let declaration = if self.check(TokenType::Function) || is_async {
                let fn_marker = self.start_node();
                self.next()?;
                if is_async {
                    self.next()?;
                }
                self.parse_function(fn_marker, FunctionFlags::STATEMENT | FunctionFlags::NULLABLE_ID, is_async)?
            } else if self.check(TokenType::Class) {
                let class_marker = self.start_node();
                self.parse_class(class_marker, true, true)?
            } else {
                let expr = self.parse_maybe_assign(false, None)?;
                self.semicolon()?;
                expr
            };
            return Ok(self.finish_node(marker, NodeKind::ExportDefaultDeclaration { declaration: Box::new(declaration) }));
        }

        if self.should_parse_export_statement() {
            let declaration = self.parse_statement(None, false)?;
            match &declaration.kind {
                NodeKind::VariableDeclaration { declarations, .. } => {
                    for decl in declarations {
                        if let NodeKind::VariableDeclarator { id, .. } = &decl.kind {
                            self.check_pattern_export(track, id)?;
                        }
                    }
                }
                NodeKind::FunctionDeclaration(Function { id: Some(id), .. })
                | NodeKind::ClassDeclaration(Class { id: Some(id), .. }) => {
                    if let Some(name) = id.ident_name() {
                        self.check_export(track, name, id.start)?;
                    }
                }
                _ => {}
            }
            return Ok(self.finish_node(
                marker,
                NodeKind::ExportNamedDeclaration {
                    declaration: Some(Box::new(declaration)),
                    specifiers: Vec::new(),
                    source: None,
                },
            ));
        }

        let specifiers = self.parse_export_specifiers(track)?;
        let source = if self.eat_contextual("from")? {
            Some(Box::new(self.parse_module_source()?))
        } else {
            for spec in &specifiers {
                if let NodeKind::ExportSpecifier { local, .. } = &spec.kind {
                    if let Some(name) = local.ident_name() {
                        self.check_unreserved(local.start, local.end, name)?;
                        self.check_local_export(name, local.start);
                    }
                }
            }
            None
        };
        self.semicolon()?;
        Ok(self.finish_node(marker, NodeKind::ExportNamedDeclaration { declaration: None, specifiers, source }))
    }

    /// Remember a locally exported name that is not declared yet.
    fn check_local_export(&mut self, name: &str, pos: usize) {
        if !self.scopes.is_declared_at_top(name) {
            self.undefined_exports.entry(name.to_string()).or_insert(pos);
        }
    }

    fn parse_export_specifiers(&mut self, track: bool) -> Result<Vec<Node>> {
        let mut specifiers = Vec::new();
        let mut first = true;
        self.expect(TokenType::BraceL)?;
        while !self.eat(TokenType::BraceR)? {
            if !first {
                self.expect(TokenType::Comma)?;
                if self.after_trailing_comma(TokenType::BraceR, false)? {
                    break;
                }
            } else {
                first = false;
            }
            let marker = self.start_node();
            let local = self.parse_ident(true)?;
            let exported = if self.eat_contextual("as")? { self.parse_ident(true)? } else { local.clone() };
            if let Some(name) = exported.ident_name() {
                self.check_export(track, name, exported.start)?;
            }
            specifiers.push(self.finish_node(
                marker,
                NodeKind::ExportSpecifier { local: Box::new(local), exported: Box::new(exported) },
            ));
        }
        Ok(specifiers)
    }

    /// The string literal after `from`.
    fn parse_module_source(&mut self) -> Result<Node> {
        if !self.check(TokenType::String) {
            return self.unexpected();
        }
        self.parse_expr_atom(None)
    }

    fn parse_import(&mut self, marker: Marker) -> Result<Node> {
        self.next()?;
        let (specifiers, source) = if self.check(TokenType::String) {
            (Vec::new(), self.parse_expr_atom(None)?)
        } else {
            let specifiers = self.parse_import_specifiers()?;
            self.expect_contextual("from")?;
            (specifiers, self.parse_module_source()?)
        };
        self.semicolon()?;
        Ok(self.finish_node(marker, NodeKind::ImportDeclaration { specifiers, source: Box::new(source) }))
    }

    fn parse_import_specifiers(&mut self) -> Result<Vec<Node>> {
        let mut specifiers = Vec::new();
        if self.check(TokenType::Name) {
            let marker = self.start_node();
            let local = self.parse_ident(false)?;
            self.check_lval(&local, BindingKind::Lexical, None)?;
            specifiers.push(self.finish_node(marker, NodeKind::ImportDefaultSpecifier { local: Box::new(local) }));
            if !self.eat(TokenType::Comma)? {
                return Ok(specifiers);
            }
        }
        if self.check(TokenType::Star) {
            let marker = self.start_node();
            self.next()?;
            self.expect_contextual("as")?;
            let local = self.parse_ident(false)?;
            self.check_lval(&local, BindingKind::Lexical, None)?;
            specifiers.push(self.finish_node(marker, NodeKind::ImportNamespaceSpecifier { local: Box::new(local) }));
            return Ok(specifiers);
        }

        self.expect(TokenType::BraceL)?;
        let mut first = true;
        while !self.eat(TokenType::BraceR)? {
            if !first {
                self.expect(TokenType::Comma)?;
                if self.after_trailing_comma(TokenType::BraceR, false)? {
                    break;
                }
            } else {
                first = false;
            }
            let marker = self.start_node();
            let imported = self.parse_ident(true)?;
            let local = if self.eat_contextual("as")? {
                self.parse_ident(false)?
            } else {
                if let Some(name) = imported.ident_name() {
                    self.check_unreserved(imported.start, imported.end, name)?;
                }
                imported.clone()
            };
            self.check_lval(&local, BindingKind::Lexical, None)?;
            specifiers.push(self.finish_node(
                marker,
                NodeKind::ImportSpecifier { imported: Box::new(imported), local: Box::new(local) },
            ));
        }
        Ok(specifiers)
    }
}
