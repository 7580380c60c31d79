//! Expression parsing.
//!
//! Binary operators are resolved by precedence climbing over the `binop`
//! levels of the token registry. Arrow functions are found by a bounded
//! speculative reparse: at a `(` that may start arrow parameters the parser
//! snapshots its state, tries a parameter list followed by `=>`, and rolls
//! back to parse a parenthesized expression when that fails. Failed starts
//! are remembered so nested parentheses are never retried.

use rustc_hash::FxHashMap;

use crate::error::Result;
use crate::node::{
    AssignmentOperator, BinaryOperator, Function, LiteralValue, LogicalOperator, Node, NodeKind,
    PropertyKind, TemplateValue, UnaryOperator, UpdateOperator,
};
use crate::options::AllowReserved;
use crate::parser::{DestructuringErrors, Marker, Parser};
use crate::scope::{BindingKind, ScopeFlags};
use crate::statement::FunctionFlags;
use crate::token::{is_keyword, TokenType, TokenValue};
use crate::whitespace::skip_white_space;

/// Which accessor kinds a plain property name has been defined with, for
/// the pre-ES2015 redefinition check.
#[derive(Debug, Clone, Copy, Default)]
struct DefinedKinds {
    init: bool,
    get: bool,
    set: bool,
}

/// Property names seen in one object literal.
#[derive(Debug, Default)]
struct PropHash {
    proto: bool,
    names: FxHashMap<String, DefinedKinds>,
}

fn has_expression_errors(errors: Option<&DestructuringErrors>) -> bool {
    errors.is_some_and(|e| e.shorthand_assign.is_some() || e.double_proto.is_some())
}

/// Property key as ECMAScript `ToString` would produce it for the clash check.
fn number_key(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e21 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

impl<'a> Parser<'a> {
    // =========================================================================
    // Expressions
    // =========================================================================

    /// Parse a comma-separated expression.
    pub(crate) fn parse_expression(&mut self, no_in: bool, mut errors: Option<&mut DestructuringErrors>) -> Result<Node> {
        let marker = self.start_node();
        let expr = self.parse_maybe_assign(no_in, errors.as_deref_mut())?;
        if !self.check(TokenType::Comma) {
            return Ok(expr);
        }
        let mut expressions = vec![expr];
        while self.eat(TokenType::Comma)? {
            expressions.push(self.parse_maybe_assign(no_in, errors.as_deref_mut())?);
        }
        Ok(self.finish_node(marker, NodeKind::SequenceExpression { expressions }))
    }

    /// Parse an assignment expression (or anything of higher precedence).
    pub(crate) fn parse_maybe_assign(&mut self, no_in: bool, errors: Option<&mut DestructuringErrors>) -> Result<Node> {
        self.nested(|p| p.parse_maybe_assign_inner(no_in, errors))
    }

    fn parse_maybe_assign_inner(&mut self, no_in: bool, errors: Option<&mut DestructuringErrors>) -> Result<Node> {
        if self.is_contextual("yield") {
            if self.scopes.in_generator() {
                return self.parse_yield(no_in);
            }
            // Outside generators `yield` is a plain name; `/` after it divides.
            self.state.expr_allowed = false;
        }

        let mut own = DestructuringErrors::default();
        let owned = errors.is_none();
        let errors = match errors {
            Some(errors) => errors,
            None => &mut own,
        };
        let saved = *errors;
        if !owned {
            errors.parenthesized_assign = None;
            errors.trailing_comma = None;
            errors.shorthand_assign = None;
        }

        let marker = self.start_node();
        if matches!(self.state.ty, TokenType::ParenL | TokenType::Name) {
            self.potential_arrow_at = Some(self.state.start);
        }
        let mut left = self.parse_maybe_conditional(no_in, Some(&mut *errors))?;

        if self.state.ty.is_assign() {
            let text = self.state.value.as_str().unwrap_or_default();
            let Some(operator) = AssignmentOperator::from_text(text) else {
                return self.unexpected();
            };
            if self.check(TokenType::Eq) {
                self.to_assignable(&mut left, Some(&*errors))?;
            }
            if !owned {
                errors.parenthesized_assign = None;
                errors.trailing_comma = None;
                errors.double_proto = None;
            }
            // A shorthand default inside the pattern was used correctly.
            if errors.shorthand_assign.is_some_and(|pos| pos >= left.start) {
                errors.shorthand_assign = None;
            }
            self.check_lval(&left, BindingKind::None, None)?;
            self.next()?;
            let right = self.parse_maybe_assign(no_in, None)?;
            return Ok(self.finish_node(
                marker,
                NodeKind::AssignmentExpression { operator, left: Box::new(left), right: Box::new(right) },
            ));
        }

        if owned {
            self.check_expression_errors(errors)?;
        }
        if saved.parenthesized_assign.is_some() {
            errors.parenthesized_assign = saved.parenthesized_assign;
        }
        if saved.trailing_comma.is_some() {
            errors.trailing_comma = saved.trailing_comma;
        }
        if saved.shorthand_assign.is_some() {
            errors.shorthand_assign = saved.shorthand_assign;
        }
        Ok(left)
    }

    fn parse_maybe_conditional(&mut self, no_in: bool, mut errors: Option<&mut DestructuringErrors>) -> Result<Node> {
        let marker = self.start_node();
        let expr = self.parse_expr_ops(no_in, errors.as_deref_mut())?;
        if has_expression_errors(errors.as_deref()) {
            return Ok(expr);
        }
        if !self.eat(TokenType::Question)? {
            return Ok(expr);
        }
        let consequent = self.parse_maybe_assign(false, None)?;
        self.expect(TokenType::Colon)?;
        let alternate = self.parse_maybe_assign(no_in, None)?;
        Ok(self.finish_node(
            marker,
            NodeKind::ConditionalExpression {
                test: Box::new(expr),
                consequent: Box::new(consequent),
                alternate: Box::new(alternate),
            },
        ))
    }

    fn parse_expr_ops(&mut self, no_in: bool, mut errors: Option<&mut DestructuringErrors>) -> Result<Node> {
        let marker = self.start_node();
        let expr = self.parse_maybe_unary(errors.as_deref_mut(), false)?;
        if has_expression_errors(errors.as_deref()) {
            return Ok(expr);
        }
        if expr.start == marker.start && matches!(expr.kind, NodeKind::ArrowFunctionExpression(_)) {
            return Ok(expr);
        }
        self.parse_expr_op(expr, marker, -1, no_in)
    }

    /// Precedence climbing: fold operators binding tighter than `min_prec`.
    fn parse_expr_op(&mut self, mut left: Node, marker: Marker, min_prec: i32, no_in: bool) -> Result<Node> {
        loop {
            let ty = self.state.ty;
            let Some(prec) = ty.binop() else {
                return Ok(left);
            };
            if (no_in && ty == TokenType::In) || i32::from(prec) <= min_prec {
                return Ok(left);
            }
            let logical = matches!(ty, TokenType::LogicalOr | TokenType::LogicalAnd);
            let coalesce = ty == TokenType::Coalesce;
            // `??` binds like `&&` on its right-hand side.
            let prec = if coalesce { TokenType::LogicalAnd.binop().unwrap_or(prec) } else { prec };
            let operator = self.state.value.as_str().unwrap_or_default().to_string();
            self.next()?;

            let right_marker = self.start_node();
            let operand = self.parse_maybe_unary(None, false)?;
            let right = self.parse_expr_op(operand, right_marker, i32::from(prec), no_in)?;
            left = self.build_binary(marker, left, right, &operator)?;

            let mixed = (logical && self.check(TokenType::Coalesce))
                || (coalesce && matches!(self.state.ty, TokenType::LogicalOr | TokenType::LogicalAnd));
            if mixed {
                self.raise_recoverable(
                    self.state.start,
                    "Logical expressions and coalesce expressions cannot be mixed. Wrap either by parentheses",
                );
            }
        }
    }

    fn build_binary(&self, marker: Marker, left: Node, right: Node, operator: &str) -> Result<Node> {
        let (left, right) = (Box::new(left), Box::new(right));
        let kind = if let Some(operator) = LogicalOperator::from_text(operator) {
            NodeKind::LogicalExpression { operator, left, right }
        } else if let Some(operator) = BinaryOperator::from_text(operator) {
            NodeKind::BinaryExpression { operator, left, right }
        } else {
            return self.unexpected_at(marker.start);
        };
        Ok(self.finish_node(marker, kind))
    }

    /// Parse unary operators, `await`, postfix updates, and `**`.
    fn parse_maybe_unary(&mut self, mut errors: Option<&mut DestructuringErrors>, mut saw_unary: bool) -> Result<Node> {
        let marker = self.start_node();
        let expr;
        let await_allowed = self.scopes.in_async()
            || (!self.scopes.in_function() && self.options.allow_await_outside_function);
        if self.is_contextual("await") && await_allowed {
            expr = self.parse_await()?;
            saw_unary = true;
        } else if self.state.ty.info().prefix {
            let update = self.check(TokenType::IncDec);
            let text = self.state.value.as_str().unwrap_or_default().to_string();
            self.next()?;
            let argument = self.nested(|p| p.parse_maybe_unary(None, true))?;
            if let Some(errors) = errors.as_deref() {
                self.check_expression_errors(errors)?;
            }
            if update {
                self.check_lval(&argument, BindingKind::None, None)?;
                let Some(operator) = UpdateOperator::from_text(&text) else {
                    return self.unexpected_at(marker.start);
                };
                expr = self.finish_node(
                    marker,
                    NodeKind::UpdateExpression { operator, prefix: true, argument: Box::new(argument) },
                );
            } else {
                let Some(operator) = UnaryOperator::from_text(&text) else {
                    return self.unexpected_at(marker.start);
                };
                if self.strict
                    && operator == UnaryOperator::Delete
                    && matches!(argument.kind, NodeKind::Identifier { .. })
                {
                    self.raise_recoverable(marker.start, "Deleting local variable in strict mode");
                } else {
                    saw_unary = true;
                }
                expr = self.finish_node(
                    marker,
                    NodeKind::UnaryExpression { operator, prefix: true, argument: Box::new(argument) },
                );
            }
        } else {
            let mut operand = self.parse_expr_subscripts(errors.as_deref_mut())?;
            if has_expression_errors(errors.as_deref()) {
                return Ok(operand);
            }
            while self.state.ty.info().postfix && !self.can_insert_semicolon() {
                let text = self.state.value.as_str().unwrap_or_default();
                let Some(operator) = UpdateOperator::from_text(text) else {
                    return self.unexpected();
                };
                self.check_lval(&operand, BindingKind::None, None)?;
                self.next()?;
                operand = self.finish_node(
                    marker,
                    NodeKind::UpdateExpression { operator, prefix: false, argument: Box::new(operand) },
                );
            }
            expr = operand;
        }

        if !saw_unary && self.eat(TokenType::StarStar)? {
            let right = self.nested(|p| p.parse_maybe_unary(None, false))?;
            return Ok(self.finish_node(
                marker,
                NodeKind::BinaryExpression {
                    operator: BinaryOperator::Pow,
                    left: Box::new(expr),
                    right: Box::new(right),
                },
            ));
        }
        Ok(expr)
    }

    pub(crate) fn parse_expr_subscripts(&mut self, mut errors: Option<&mut DestructuringErrors>) -> Result<Node> {
        let marker = self.start_node();
        let expr = self.parse_expr_atom(errors.as_deref_mut())?;
        if matches!(expr.kind, NodeKind::ArrowFunctionExpression(_)) {
            return Ok(expr);
        }
        let result = self.parse_subscripts(expr, marker, false)?;
        if let Some(errors) = errors {
            if matches!(result.kind, NodeKind::MemberExpression { .. }) {
                if errors.parenthesized_assign.is_some_and(|pos| pos >= result.start) {
                    errors.parenthesized_assign = None;
                }
                if errors.parenthesized_bind.is_some_and(|pos| pos >= result.start) {
                    errors.parenthesized_bind = None;
                }
            }
        }
        Ok(result)
    }

    /// Parse member accesses, calls, and tagged templates after `base`.
    pub(crate) fn parse_subscripts(&mut self, mut base: Node, marker: Marker, no_calls: bool) -> Result<Node> {
        loop {
            let computed = self.eat(TokenType::BracketL)?;
            if computed || self.eat(TokenType::Dot)? {
                let property = if computed {
                    let property = self.parse_expression(false, None)?;
                    self.expect(TokenType::BracketR)?;
                    property
                } else {
                    self.parse_ident(self.options.reserved_policy() != AllowReserved::Never)?
                };
                base = self.finish_node(
                    marker,
                    NodeKind::MemberExpression { object: Box::new(base), property: Box::new(property), computed },
                );
            } else if !no_calls && self.eat(TokenType::ParenL)? {
                let arguments = self.parse_expr_list(TokenType::ParenR, self.ecma >= 8, false, None)?;
                base = self.finish_node(
                    marker,
                    NodeKind::CallExpression { callee: Box::new(base), arguments: arguments.into_iter().flatten().collect() },
                );
            } else if self.check(TokenType::BackQuote) {
                let quasi = self.parse_template(true)?;
                base = self.finish_node(
                    marker,
                    NodeKind::TaggedTemplateExpression { tag: Box::new(base), quasi: Box::new(quasi) },
                );
            } else {
                return Ok(base);
            }
        }
    }

    // =========================================================================
    // Atoms
    // =========================================================================

    /// Parse an atomic expression: literals, names, parenthesized expressions,
    /// array and object literals, functions, classes, `new`, and templates.
    pub(crate) fn parse_expr_atom(&mut self, errors: Option<&mut DestructuringErrors>) -> Result<Node> {
        let can_be_arrow = self.potential_arrow_at == Some(self.state.start);
        match self.state.ty {
            TokenType::Super => {
                if !self.scopes.allow_super() {
                    return self.raise(self.state.start, "'super' keyword outside a method");
                }
                let marker = self.start_node();
                self.next()?;
                if self.check(TokenType::ParenL) && !self.scopes.allow_direct_super() {
                    return self.raise(marker.start, "super() call outside constructor of a subclass");
                }
                if !matches!(self.state.ty, TokenType::Dot | TokenType::BracketL | TokenType::ParenL) {
                    return self.unexpected();
                }
                Ok(self.finish_node(marker, NodeKind::Super))
            }
            TokenType::This => {
                let marker = self.start_node();
                self.next()?;
                Ok(self.finish_node(marker, NodeKind::ThisExpression))
            }
            TokenType::Name => self.parse_name_atom(can_be_arrow),
            TokenType::Regexp => {
                let TokenValue::Regex(regex) = self.state.value.clone() else {
                    return self.unexpected();
                };
                self.parse_literal(LiteralValue::RegExp, Some(regex), None)
            }
            TokenType::Num => {
                let TokenValue::Num(value) = self.state.value else {
                    return self.unexpected();
                };
                self.parse_literal(LiteralValue::Number(value), None, None)
            }
            TokenType::BigInt => {
                let digits = self.state.value.as_str().unwrap_or_default().to_string();
                self.parse_literal(LiteralValue::BigInt, None, Some(digits))
            }
            TokenType::String => {
                let value = self.state.value.as_str().unwrap_or_default().to_string();
                self.parse_literal(LiteralValue::String(value), None, None)
            }
            TokenType::Null | TokenType::True | TokenType::False => {
                let value = match self.state.ty {
                    TokenType::Null => LiteralValue::Null,
                    ty => LiteralValue::Boolean(ty == TokenType::True),
                };
                self.parse_literal(value, None, None)
            }
            TokenType::ParenL => {
                let start = self.state.start;
                let expr = self.parse_paren_and_distinguish(can_be_arrow)?;
                if let Some(errors) = errors {
                    if errors.parenthesized_assign.is_none() && !Self::is_simple_assign_target(&expr) {
                        errors.parenthesized_assign = Some(start);
                    }
                    if errors.parenthesized_bind.is_none() {
                        errors.parenthesized_bind = Some(start);
                    }
                }
                Ok(expr)
            }
            TokenType::BracketL => {
                let marker = self.start_node();
                self.next()?;
                let elements = self.parse_expr_list(TokenType::BracketR, true, true, errors)?;
                Ok(self.finish_node(marker, NodeKind::ArrayExpression { elements }))
            }
            TokenType::BraceL => self.parse_obj(false, errors),
            TokenType::Function => {
                let marker = self.start_node();
                self.next()?;
                self.parse_function(marker, FunctionFlags::empty(), false)
            }
            TokenType::Class => {
                let marker = self.start_node();
                self.parse_class(marker, false, false)
            }
            TokenType::New => self.parse_new(),
            TokenType::BackQuote => self.parse_template(false),
            TokenType::Import => {
                let after = skip_white_space(self.input, self.state.end).end;
                match self.input[after..].chars().next() {
                    Some('(') => self.unsupported(self.state.start, "dynamic import"),
                    Some('.') => self.unsupported(self.state.start, "import.meta"),
                    _ => self.unexpected(),
                }
            }
            _ => self.unexpected(),
        }
    }

    /// A name, possibly starting an arrow function or an async function.
    fn parse_name_atom(&mut self, can_be_arrow: bool) -> Result<Node> {
        let marker = self.start_node();
        let contains_esc = self.state.contains_esc;
        let id = self.parse_ident(false)?;
        let is_async = self.ecma >= 8 && !contains_esc && id.ident_name() == Some("async");

        if is_async && !self.can_insert_semicolon() && self.check(TokenType::Function) {
            self.next()?;
            return self.parse_function(marker, FunctionFlags::empty(), true);
        }
        if can_be_arrow && !self.can_insert_semicolon() {
            if self.eat(TokenType::Arrow)? {
                return self.parse_arrow_expression(marker, vec![id], false);
            }
            if is_async && self.check(TokenType::Name) {
                let param = self.parse_ident(false)?;
                if self.can_insert_semicolon() || !self.eat(TokenType::Arrow)? {
                    return self.unexpected();
                }
                return self.parse_arrow_expression(marker, vec![param], true);
            }
            if is_async && self.check(TokenType::ParenL) {
                if let Some(params) = self.try_arrow_params(true)? {
                    return self.parse_arrow_expression(marker, params, true);
                }
            }
        }
        Ok(id)
    }

    fn parse_literal(
        &mut self,
        value: LiteralValue,
        regex: Option<crate::token::RegexValue>,
        bigint: Option<String>,
    ) -> Result<Node> {
        let marker = self.start_node();
        let raw = self.input[self.state.start..self.state.end].to_string();
        self.next()?;
        Ok(self.finish_node(marker, NodeKind::Literal { value, raw, regex, bigint }))
    }

    /// Parse `( ... )`: arrow parameters when followed by `=>`, otherwise a
    /// parenthesized expression.
    fn parse_paren_and_distinguish(&mut self, can_be_arrow: bool) -> Result<Node> {
        let marker = self.start_node();
        let can_be_arrow = can_be_arrow && self.ecma >= 6;
        if can_be_arrow {
            if let Some(params) = self.try_arrow_params(false)? {
                return self.parse_arrow_expression(marker, params, false);
            }
        }

        self.next()?;
        let inner = self.start_node();
        let mut expressions = Vec::new();
        let mut errors = DestructuringErrors::default();
        let mut first = true;
        let mut trailing_comma = false;
        let mut spread_start = None;
        while !self.check(TokenType::ParenR) {
            if first {
                first = false;
            } else {
                self.expect(TokenType::Comma)?;
            }
            if self.ecma >= 8 && self.after_trailing_comma(TokenType::ParenR, true)? {
                trailing_comma = true;
                break;
            }
            if self.ecma >= 6 && self.check(TokenType::Ellipsis) {
                spread_start = Some(self.state.start);
                expressions.push(self.parse_rest_binding()?);
                if self.check(TokenType::Comma) {
                    return self.raise(self.state.start, "Comma is not permitted after the rest element");
                }
                break;
            }
            expressions.push(self.parse_maybe_assign(false, Some(&mut errors))?);
        }
        let (inner_end, inner_end_loc) = (self.state.last_tok_end, self.state.last_tok_end_loc);
        self.expect(TokenType::ParenR)?;

        if can_be_arrow && self.check(TokenType::Arrow) && !self.can_insert_semicolon() {
            // The parameter attempt failed; report why.
            if let Some(Some(err)) = self.arrow_rejected.get(&marker.start) {
                return Err(err.clone());
            }
            return self.unexpected();
        }
        if expressions.is_empty() || trailing_comma {
            return self.unexpected_at(self.state.last_tok_start);
        }
        if let Some(pos) = spread_start {
            return self.unexpected_at(pos);
        }
        self.check_expression_errors(&errors)?;

        let value = if expressions.len() == 1 {
            expressions.swap_remove(0)
        } else {
            self.finish_node_at(inner, NodeKind::SequenceExpression { expressions }, inner_end, inner_end_loc)
        };
        if self.options.preserve_parens {
            return Ok(self.finish_node(marker, NodeKind::ParenthesizedExpression { expression: Box::new(value) }));
        }
        Ok(value)
    }

    /// Try to read `( params ) =>` at the current `(`. On success the `=>`
    /// is consumed; on failure the parser is back at the `(`.
    fn try_arrow_params(&mut self, is_async: bool) -> Result<Option<Vec<Node>>> {
        let start = self.state.start;
        if self.arrow_rejected.contains_key(&start) {
            return Ok(None);
        }
        let snapshot = self.begin_speculation();
        let (yield_pos, await_pos, await_ident_pos) = (self.yield_pos, self.await_pos, self.await_ident_pos);
        self.yield_pos = None;
        self.await_pos = None;
        if is_async {
            self.await_ident_pos = None;
        }

        let attempt = self.expect(TokenType::ParenL).and_then(|()| self.parse_params());
        match attempt {
            Ok(params) if self.check(TokenType::Arrow) && !self.can_insert_semicolon() => {
                self.commit_speculation();
                self.check_yield_await_in_default_params()?;
                if is_async {
                    if let Some(pos) = self.await_ident_pos {
                        return self.raise(pos, "Cannot use 'await' as identifier inside an async function");
                    }
                    self.await_ident_pos = await_ident_pos;
                }
                self.yield_pos = yield_pos;
                self.await_pos = await_pos;
                self.next()?;
                Ok(Some(params))
            }
            outcome => {
                self.rollback_speculation(snapshot);
                self.arrow_rejected.insert(start, outcome.err());
                Ok(None)
            }
        }
    }

    fn parse_new(&mut self) -> Result<Node> {
        let marker = self.start_node();
        let meta = self.parse_ident(true)?;
        if self.ecma >= 6 && self.eat(TokenType::Dot)? {
            let contains_esc = self.state.contains_esc;
            let property = self.parse_ident(true)?;
            if property.ident_name() != Some("target") || contains_esc {
                self.raise_recoverable(property.start, "The only valid meta property for new is new.target");
            }
            if !self.scopes.in_non_arrow_function() {
                self.raise_recoverable(marker.start, "new.target can only be used in functions");
            }
            return Ok(self.finish_node(
                marker,
                NodeKind::MetaProperty { meta: Box::new(meta), property: Box::new(property) },
            ));
        }
        let callee_marker = self.start_node();
        let atom = self.nested(|p| p.parse_expr_atom(None))?;
        let callee = self.parse_subscripts(atom, callee_marker, true)?;
        let arguments = if self.eat(TokenType::ParenL)? {
            self.parse_expr_list(TokenType::ParenR, self.ecma >= 8, false, None)?.into_iter().flatten().collect()
        } else {
            Vec::new()
        };
        Ok(self.finish_node(marker, NodeKind::NewExpression { callee: Box::new(callee), arguments }))
    }

    // =========================================================================
    // Templates
    // =========================================================================

    fn parse_template_element(&mut self, is_tagged: bool) -> Result<Node> {
        let marker = self.start_node();
        let value = match self.state.ty {
            TokenType::InvalidTemplate => {
                if !is_tagged {
                    return self.raise(self.state.start, "Bad escape sequence in untagged template literal");
                }
                TemplateValue { raw: self.state.value.as_str().unwrap_or_default().to_string(), cooked: None }
            }
            TokenType::Template => {
                let raw = self.input[self.state.start..self.state.end].replace("\r\n", "\n").replace('\r', "\n");
                TemplateValue { raw, cooked: self.state.value.as_str().map(str::to_string) }
            }
            _ => return self.unexpected(),
        };
        self.next()?;
        let tail = self.check(TokenType::BackQuote);
        Ok(self.finish_node(marker, NodeKind::TemplateElement { value, tail }))
    }

    pub(crate) fn parse_template(&mut self, is_tagged: bool) -> Result<Node> {
        let marker = self.start_node();
        self.next()?;
        let mut expressions = Vec::new();
        let mut quasis = vec![self.parse_template_element(is_tagged)?];
        while !self.check(TokenType::BackQuote) {
            if self.check(TokenType::Eof) {
                return self.raise(self.state.pos, "Unterminated template literal");
            }
            self.expect(TokenType::DollarBraceL)?;
            expressions.push(self.parse_expression(false, None)?);
            self.expect(TokenType::BraceR)?;
            quasis.push(self.parse_template_element(is_tagged)?);
        }
        self.next()?;
        Ok(self.finish_node(marker, NodeKind::TemplateLiteral { quasis, expressions }))
    }

    // =========================================================================
    // Object Literals
    // =========================================================================

    /// Parse an object literal, or an object pattern when `is_pattern`.
    pub(crate) fn parse_obj(&mut self, is_pattern: bool, mut errors: Option<&mut DestructuringErrors>) -> Result<Node> {
        let marker = self.start_node();
        let mut hash = PropHash::default();
        let mut properties = Vec::new();
        let mut first = true;
        self.next()?;
        while !self.eat(TokenType::BraceR)? {
            if first {
                first = false;
            } else {
                self.expect(TokenType::Comma)?;
                if self.ecma >= 5 && self.after_trailing_comma(TokenType::BraceR, false)? {
                    break;
                }
            }
            let prop = self.parse_property(is_pattern, errors.as_deref_mut())?;
            if !is_pattern {
                self.check_prop_clash(&prop, &mut hash, errors.as_deref_mut());
            }
            properties.push(prop);
        }
        let kind = if is_pattern {
            NodeKind::ObjectPattern { properties }
        } else {
            NodeKind::ObjectExpression { properties }
        };
        Ok(self.finish_node(marker, kind))
    }

    fn parse_property(&mut self, is_pattern: bool, mut errors: Option<&mut DestructuringErrors>) -> Result<Node> {
        let marker = self.start_node();
        if self.ecma >= 9 && self.eat(TokenType::Ellipsis)? {
            if is_pattern {
                let argument = Box::new(self.parse_ident(false)?);
                if self.check(TokenType::Comma) {
                    return self.raise(self.state.start, "Comma is not permitted after the rest element");
                }
                return Ok(self.finish_node(marker, NodeKind::RestElement { argument }));
            }
            if let Some(errors) = errors.as_deref_mut() {
                if self.check(TokenType::ParenL) {
                    errors.parenthesized_assign.get_or_insert(self.state.start);
                    errors.parenthesized_bind.get_or_insert(self.state.start);
                }
            }
            let argument = Box::new(self.parse_maybe_assign(false, errors.as_deref_mut())?);
            if let Some(errors) = errors {
                if self.check(TokenType::Comma) && errors.trailing_comma.is_none() {
                    errors.trailing_comma = Some(self.state.start);
                }
            }
            return Ok(self.finish_node(marker, NodeKind::SpreadElement { argument }));
        }

        let mut is_generator = self.ecma >= 6 && !is_pattern && self.eat(TokenType::Star)?;
        let contains_esc = self.state.contains_esc;
        let (mut key, mut computed) = self.parse_property_name()?;
        let mut is_async = false;
        if !is_pattern && !contains_esc && self.ecma >= 8 && !is_generator && self.is_async_prop(&key, computed) {
            is_async = true;
            is_generator = self.ecma >= 9 && self.eat(TokenType::Star)?;
            (key, computed) = self.parse_property_name()?;
        }

        if (is_generator || is_async) && self.check(TokenType::Colon) {
            return self.unexpected();
        }
        let mut method = false;
        let mut shorthand = false;
        let mut kind = PropertyKind::Init;
        let value;
        if self.eat(TokenType::Colon)? {
            value = if is_pattern {
                let value_marker = self.start_node();
                let left = self.parse_binding_atom()?;
                self.parse_maybe_default(value_marker, left)?
            } else {
                self.parse_maybe_assign(false, errors)?
            };
        } else if self.ecma >= 6 && self.check(TokenType::ParenL) {
            if is_pattern {
                return self.unexpected();
            }
            method = true;
            value = self.parse_method(is_generator, is_async, false)?;
        } else if !is_pattern
            && !contains_esc
            && self.ecma >= 5
            && !computed
            && matches!(key.ident_name(), Some("get" | "set"))
            && !matches!(self.state.ty, TokenType::Comma | TokenType::BraceR | TokenType::Eq)
        {
            if is_generator || is_async {
                return self.unexpected();
            }
            kind = if key.ident_name() == Some("get") { PropertyKind::Get } else { PropertyKind::Set };
            (key, computed) = self.parse_property_name()?;
            value = self.parse_method(false, false, false)?;
            self.check_accessor_params(kind == PropertyKind::Get, &value);
        } else if self.ecma >= 6 && !computed && key.ident_name().is_some() {
            if is_generator || is_async {
                return self.unexpected();
            }
            let name = key.ident_name().unwrap_or_default().to_string();
            self.check_unreserved(key.start, key.end, &name)?;
            if name == "await" && self.await_ident_pos.is_none() {
                self.await_ident_pos = Some(marker.start);
            }
            shorthand = true;
            value = if is_pattern {
                self.parse_maybe_default(marker, key.clone())?
            } else if let (true, Some(errors)) = (self.check(TokenType::Eq), errors) {
                errors.shorthand_assign.get_or_insert(self.state.start);
                self.parse_maybe_default(marker, key.clone())?
            } else {
                key.clone()
            };
        } else {
            return self.unexpected();
        }

        Ok(self.finish_node(
            marker,
            NodeKind::Property { key: Box::new(key), value: Box::new(value), kind, method, shorthand, computed },
        ))
    }

    /// `async` followed on the same line by something that names a method.
    fn is_async_prop(&self, key: &Node, computed: bool) -> bool {
        let ty = self.state.ty;
        !computed
            && key.ident_name() == Some("async")
            && (matches!(
                ty,
                TokenType::Name | TokenType::Num | TokenType::BigInt | TokenType::String | TokenType::BracketL
            ) || ty.is_keyword()
                || (self.ecma >= 9 && ty == TokenType::Star))
            && !self.line_break_before()
    }

    /// Parse a property key. Returns the key and whether it was computed.
    pub(crate) fn parse_property_name(&mut self) -> Result<(Node, bool)> {
        if self.ecma >= 6 && self.eat(TokenType::BracketL)? {
            let key = self.parse_maybe_assign(false, None)?;
            self.expect(TokenType::BracketR)?;
            return Ok((key, true));
        }
        let key = match self.state.ty {
            TokenType::Num | TokenType::String | TokenType::BigInt => self.parse_expr_atom(None)?,
            _ => self.parse_ident(self.options.reserved_policy() != AllowReserved::Never)?,
        };
        Ok((key, false))
    }

    pub(crate) fn check_accessor_params(&mut self, is_getter: bool, method: &Node) {
        let NodeKind::FunctionExpression(function) = &method.kind else {
            return;
        };
        let expected = if is_getter { 0 } else { 1 };
        if function.params.len() != expected {
            let message = if is_getter { "getter should have no params" } else { "setter should have exactly one param" };
            self.raise_recoverable(method.start, message);
        } else if !is_getter && matches!(function.params[0].kind, NodeKind::RestElement { .. }) {
            self.raise_recoverable(function.params[0].start, "Setter cannot use rest params");
        }
    }

    fn check_prop_clash(&mut self, prop: &Node, hash: &mut PropHash, errors: Option<&mut DestructuringErrors>) {
        let NodeKind::Property { key, kind, method, shorthand, computed, .. } = &prop.kind else {
            return;
        };
        if self.ecma >= 6 && (*computed || *method || *shorthand) {
            return;
        }
        let name = match &key.kind {
            NodeKind::Identifier { name } => name.clone(),
            NodeKind::Literal { value: LiteralValue::String(value), .. } => value.clone(),
            NodeKind::Literal { value: LiteralValue::Number(value), .. } => number_key(*value),
            _ => return,
        };

        if self.ecma >= 6 {
            if name == "__proto__" && *kind == PropertyKind::Init {
                if hash.proto {
                    match errors {
                        Some(errors) => {
                            errors.double_proto.get_or_insert(key.start);
                        }
                        None => self.raise_recoverable(key.start, "Redefinition of __proto__ property"),
                    }
                }
                hash.proto = true;
            }
            return;
        }

        let strict = self.strict;
        let defined = hash.names.entry(name).or_default();
        let redefinition = match kind {
            PropertyKind::Init => (strict && defined.init) || defined.get || defined.set,
            PropertyKind::Get => defined.init || defined.get,
            PropertyKind::Set => defined.init || defined.set,
        };
        match kind {
            PropertyKind::Init => defined.init = true,
            PropertyKind::Get => defined.get = true,
            PropertyKind::Set => defined.set = true,
        }
        if redefinition {
            self.raise_recoverable(key.start, "Redefinition of property");
        }
    }

    // =========================================================================
    // Functions
    // =========================================================================

    /// Parse a method's parameters and body. Returns a `FunctionExpression`.
    pub(crate) fn parse_method(&mut self, generator: bool, is_async: bool, allow_direct_super: bool) -> Result<Node> {
        let marker = self.start_node();
        let saved = (self.yield_pos, self.await_pos, self.await_ident_pos);
        let generator = self.ecma >= 6 && generator;
        let is_async = self.ecma >= 8 && is_async;
        self.yield_pos = None;
        self.await_pos = None;
        self.await_ident_pos = None;

        let mut flags = ScopeFlags::function(is_async, generator) | ScopeFlags::SUPER;
        if allow_direct_super {
            flags |= ScopeFlags::DIRECT_SUPER;
        }
        self.scopes.enter(flags);
        self.expect(TokenType::ParenL)?;
        let params = self.parse_params()?;
        self.check_yield_await_in_default_params()?;
        let (body, expression) = self.parse_function_body(&params, None, false, true, marker.start)?;

        (self.yield_pos, self.await_pos, self.await_ident_pos) = saved;
        Ok(self.finish_node(
            marker,
            NodeKind::FunctionExpression(Function {
                id: None,
                params,
                body: Box::new(body),
                generator,
                is_async,
                expression,
            }),
        ))
    }

    fn parse_arrow_expression(&mut self, marker: Marker, mut params: Vec<Node>, is_async: bool) -> Result<Node> {
        let saved = (self.yield_pos, self.await_pos, self.await_ident_pos);
        self.scopes.enter(ScopeFlags::function(is_async, false) | ScopeFlags::ARROW);
        self.yield_pos = None;
        self.await_pos = None;
        self.await_ident_pos = None;
        for param in &mut params {
            self.to_assignable(param, None)?;
        }
        let (body, expression) = self.parse_function_body(&params, None, true, false, marker.start)?;
        (self.yield_pos, self.await_pos, self.await_ident_pos) = saved;
        Ok(self.finish_node(
            marker,
            NodeKind::ArrowFunctionExpression(Function {
                id: None,
                params,
                body: Box::new(body),
                generator: false,
                is_async: self.ecma >= 8 && is_async,
                expression,
            }),
        ))
    }

    /// Parse a function body in the already-entered function scope, declare
    /// the parameters, and leave the scope. Returns the body and whether it
    /// is an expression body.
    pub(crate) fn parse_function_body(
        &mut self,
        params: &[Node],
        id: Option<&Node>,
        is_arrow: bool,
        is_method: bool,
        function_start: usize,
    ) -> Result<(Node, bool)> {
        if is_arrow && !self.check(TokenType::BraceL) {
            self.check_params(params, false)?;
            let body = self.parse_maybe_assign(false, None)?;
            self.scopes.exit();
            return Ok((body, true));
        }

        let old_strict = self.strict;
        let simple = Self::is_simple_param_list(params);
        let non_simple = self.ecma >= 7 && !simple;
        let mut use_strict = false;
        if !old_strict || non_simple {
            use_strict = self.strict_directive(self.state.end);
            if use_strict && non_simple {
                return self.raise(
                    function_start,
                    "Illegal 'use strict' directive in function with non-simple parameter list",
                );
            }
        }
        let old_labels = std::mem::take(&mut self.labels);
        if use_strict {
            self.strict = true;
        }
        let allow_duplicates = !old_strict && !use_strict && !is_arrow && !is_method && simple;
        self.check_params(params, allow_duplicates)?;
        if self.strict {
            if let Some(id) = id {
                self.check_lval(id, BindingKind::Outside, None)?;
            }
        }
        let mut body = self.parse_block(false, use_strict && !old_strict)?;
        if let NodeKind::BlockStatement { body: statements } = &mut body.kind {
            self.adapt_directive_prologue(statements);
        }
        self.labels = old_labels;
        self.scopes.exit();
        Ok((body, false))
    }

    fn check_params(&mut self, params: &[Node], allow_duplicates: bool) -> Result<()> {
        let mut names = rustc_hash::FxHashSet::default();
        for param in params {
            let clashes = if allow_duplicates { None } else { Some(&mut names) };
            self.check_lval(param, BindingKind::Var, clashes)?;
        }
        Ok(())
    }

    // =========================================================================
    // Lists and Identifiers
    // =========================================================================

    /// Parse comma-separated expressions up to `close`. Holes (when
    /// `allow_empty`) are `None`.
    pub(crate) fn parse_expr_list(
        &mut self,
        close: TokenType,
        allow_trailing_comma: bool,
        allow_empty: bool,
        mut errors: Option<&mut DestructuringErrors>,
    ) -> Result<Vec<Option<Node>>> {
        let mut elements = Vec::new();
        let mut first = true;
        while !self.eat(close)? {
            if first {
                first = false;
            } else {
                self.expect(TokenType::Comma)?;
                if allow_trailing_comma && self.after_trailing_comma(close, false)? {
                    break;
                }
            }
            if allow_empty && self.check(TokenType::Comma) {
                elements.push(None);
            } else if self.check(TokenType::Ellipsis) {
                elements.push(Some(self.parse_spread(errors.as_deref_mut())?));
                if let Some(errors) = errors.as_deref_mut() {
                    if self.check(TokenType::Comma) && errors.trailing_comma.is_none() {
                        errors.trailing_comma = Some(self.state.start);
                    }
                }
            } else {
                elements.push(Some(self.parse_maybe_assign(false, errors.as_deref_mut())?));
            }
        }
        Ok(elements)
    }

    pub(crate) fn parse_spread(&mut self, errors: Option<&mut DestructuringErrors>) -> Result<Node> {
        let marker = self.start_node();
        self.next()?;
        let argument = Box::new(self.parse_maybe_assign(false, errors)?);
        Ok(self.finish_node(marker, NodeKind::SpreadElement { argument }))
    }

    /// Parse an identifier. With `liberal`, keywords and reserved words are
    /// accepted as names (property names, `new.target`).
    pub(crate) fn parse_ident(&mut self, liberal: bool) -> Result<Node> {
        let marker = self.start_node();
        let ty = self.state.ty;
        let name = if ty == TokenType::Name {
            self.state.value.as_str().unwrap_or_default().to_string()
        } else if let Some(keyword) = ty.keyword() {
            // `class`/`function` pushed a function context that a name never closes.
            let after_dot = self.state.last_tok_end == self.state.last_tok_start + 1
                && self.input.as_bytes().get(self.state.last_tok_start) == Some(&b'.');
            if matches!(ty, TokenType::Class | TokenType::Function) && !after_dot {
                self.state.context.pop();
            }
            keyword.to_string()
        } else {
            return self.unexpected();
        };
        self.next()?;
        let node = self.finish_node(marker, NodeKind::Identifier { name });
        if !liberal {
            let name = node.ident_name().unwrap_or_default();
            self.check_unreserved(node.start, node.end, name)?;
            if name == "await" && self.await_ident_pos.is_none() {
                self.await_ident_pos = Some(node.start);
            }
        }
        Ok(node)
    }

    /// Reject keywords and report reserved words used as identifiers.
    pub(crate) fn check_unreserved(&mut self, start: usize, end: usize, name: &str) -> Result<()> {
        if self.scopes.in_generator() && name == "yield" {
            self.raise_recoverable(start, "Cannot use 'yield' as identifier inside a generator");
        }
        if self.scopes.in_async() && name == "await" {
            self.raise_recoverable(start, "Cannot use 'await' as identifier inside an async function");
        }
        if is_keyword(name, self.ecma) {
            return self.raise(start, format!("Unexpected keyword '{name}'"));
        }
        if self.ecma < 6 && self.input[start..end].contains('\\') {
            return Ok(());
        }
        let reserved = if self.strict {
            self.reserved.is_reserved_strict(name)
        } else {
            self.reserved.is_reserved(name)
        };
        if reserved {
            if !self.scopes.in_async() && name == "await" {
                self.raise_recoverable(start, "Cannot use keyword 'await' outside an async function");
            }
            self.raise_recoverable(start, format!("The keyword '{name}' is reserved"));
        }
        Ok(())
    }

    // =========================================================================
    // Yield and Await
    // =========================================================================

    fn parse_yield(&mut self, no_in: bool) -> Result<Node> {
        if self.yield_pos.is_none() {
            self.yield_pos = Some(self.state.start);
        }
        let marker = self.start_node();
        self.next()?;
        let ty = self.state.ty;
        let (argument, delegate) =
            if ty == TokenType::Semi || self.can_insert_semicolon() || (ty != TokenType::Star && !ty.starts_expr()) {
                (None, false)
            } else {
                let delegate = self.eat(TokenType::Star)?;
                (Some(Box::new(self.parse_maybe_assign(no_in, None)?)), delegate)
            };
        Ok(self.finish_node(marker, NodeKind::YieldExpression { argument, delegate }))
    }

    fn parse_await(&mut self) -> Result<Node> {
        if self.await_pos.is_none() {
            self.await_pos = Some(self.state.start);
        }
        let marker = self.start_node();
        self.next()?;
        let argument = Box::new(self.parse_maybe_unary(None, true)?);
        Ok(self.finish_node(marker, NodeKind::AwaitExpression { argument }))
    }
}
