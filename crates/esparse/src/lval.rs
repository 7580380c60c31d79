//! Patterns and assignment targets.

use rustc_hash::FxHashSet;

use crate::error::Result;
use crate::node::{AssignmentOperator, Node, NodeKind, PropertyKind};
use crate::parser::{DestructuringErrors, Parser};
use crate::scope::BindingKind;
use crate::token::TokenType;

impl<'a> Parser<'a> {
    // =========================================================================
    // Conversion
    // =========================================================================

    /// Reinterpret an expression as an assignment target, in place.
    ///
    /// Object and array literals become patterns, `a = b` inside them becomes
    /// a default value, and spread becomes rest.
    pub(crate) fn to_assignable(&mut self, node: &mut Node, errors: Option<&DestructuringErrors>) -> Result<()> {
        let start = node.start;
        match &mut node.kind {
            NodeKind::Identifier { name } => {
                if self.scopes.in_async() && name == "await" {
                    return self.raise(start, "Cannot use 'await' as identifier inside an async function");
                }
            }
            NodeKind::ObjectPattern { .. }
            | NodeKind::ArrayPattern { .. }
            | NodeKind::AssignmentPattern { .. }
            | NodeKind::RestElement { .. }
            | NodeKind::MemberExpression { .. } => {}
            NodeKind::ObjectExpression { properties } => {
                if let Some(errors) = errors {
                    self.check_pattern_errors(errors, true);
                }
                let mut properties = std::mem::take(properties);
                for prop in &mut properties {
                    self.to_assignable(prop, None)?;
                    if let NodeKind::RestElement { argument } = &prop.kind {
                        if matches!(argument.kind, NodeKind::ArrayPattern { .. } | NodeKind::ObjectPattern { .. }) {
                            return self.unexpected_at(argument.start);
                        }
                    }
                }
                node.kind = NodeKind::ObjectPattern { properties };
            }
            NodeKind::Property { kind, key, value, .. } => {
                if *kind != PropertyKind::Init {
                    return self.raise(key.start, "Object pattern can't contain getter or setter");
                }
                self.to_assignable(value, None)?;
            }
            NodeKind::ArrayExpression { elements } => {
                if let Some(errors) = errors {
                    self.check_pattern_errors(errors, true);
                }
                let mut elements = std::mem::take(elements);
                for element in elements.iter_mut().flatten() {
                    self.to_assignable(element, None)?;
                }
                node.kind = NodeKind::ArrayPattern { elements };
            }
            NodeKind::SpreadElement { argument } => {
                self.to_assignable(argument, None)?;
                if matches!(argument.kind, NodeKind::AssignmentPattern { .. }) {
                    return self.raise(argument.start, "Rest elements cannot have a default value");
                }
                let argument = std::mem::replace(argument, Box::new(placeholder()));
                node.kind = NodeKind::RestElement { argument };
            }
            NodeKind::AssignmentExpression { operator, left, right } => {
                if *operator != AssignmentOperator::Assign {
                    return self.raise(left.end, "Only '=' operator can be used for specifying default value.");
                }
                self.to_assignable(left, None)?;
                let left = std::mem::replace(left, Box::new(placeholder()));
                let right = std::mem::replace(right, Box::new(placeholder()));
                node.kind = NodeKind::AssignmentPattern { left, right };
            }
            NodeKind::ParenthesizedExpression { expression } => {
                self.to_assignable(expression, errors)?;
            }
            _ => return self.raise(start, "Assigning to rvalue"),
        }
        Ok(())
    }

    // =========================================================================
    // Binding Patterns
    // =========================================================================

    /// Parse an identifier, array pattern, or object pattern.
    pub(crate) fn parse_binding_atom(&mut self) -> Result<Node> {
        if self.ecma >= 6 {
            match self.state.ty {
                TokenType::BracketL => {
                    let marker = self.start_node();
                    self.next()?;
                    let elements = self.nested(|p| p.parse_binding_list(TokenType::BracketR, true, true))?;
                    return Ok(self.finish_node(marker, NodeKind::ArrayPattern { elements }));
                }
                TokenType::BraceL => return self.nested(|p| p.parse_obj(true, None)),
                _ => {}
            }
        }
        self.parse_ident(false)
    }

    /// Parse binding elements up to `close`. Holes are `None`.
    pub(crate) fn parse_binding_list(
        &mut self,
        close: TokenType,
        allow_empty: bool,
        allow_trailing_comma: bool,
    ) -> Result<Vec<Option<Node>>> {
        let mut elements = Vec::new();
        let mut first = true;
        while !self.eat(close)? {
            if first {
                first = false;
            } else {
                self.expect(TokenType::Comma)?;
            }
            if allow_empty && self.check(TokenType::Comma) {
                elements.push(None);
            } else if allow_trailing_comma && self.after_trailing_comma(close, false)? {
                break;
            } else if self.check(TokenType::Ellipsis) {
                let rest = self.parse_rest_binding()?;
                elements.push(Some(rest));
                if self.check(TokenType::Comma) {
                    return self.raise(self.state.start, "Comma is not permitted after the rest element");
                }
                self.expect(close)?;
                break;
            } else {
                let marker = self.start_node();
                let left = self.parse_binding_atom()?;
                elements.push(Some(self.parse_maybe_default(marker, left)?));
            }
        }
        Ok(elements)
    }

    /// Parse function parameters after the opening parenthesis.
    pub(crate) fn parse_params(&mut self) -> Result<Vec<Node>> {
        let params = self.parse_binding_list(TokenType::ParenR, false, self.ecma >= 8)?;
        Ok(params.into_iter().flatten().collect())
    }

    pub(crate) fn parse_rest_binding(&mut self) -> Result<Node> {
        let marker = self.start_node();
        self.next()?;
        if self.ecma == 6 && !self.check(TokenType::Name) {
            return self.unexpected();
        }
        let argument = Box::new(self.parse_binding_atom()?);
        Ok(self.finish_node(marker, NodeKind::RestElement { argument }))
    }

    /// Wrap `left` in an `AssignmentPattern` if a default value follows.
    pub(crate) fn parse_maybe_default(&mut self, marker: crate::parser::Marker, left: Node) -> Result<Node> {
        if self.ecma < 6 || !self.eat(TokenType::Eq)? {
            return Ok(left);
        }
        let right = Box::new(self.parse_maybe_assign(false, None)?);
        Ok(self.finish_node(marker, NodeKind::AssignmentPattern { left: Box::new(left), right }))
    }

    // =========================================================================
    // Validation
    // =========================================================================

    /// Check that `expr` can be assigned to (or bound, when `binding` is not
    /// `None`) and declare the names it binds.
    ///
    /// With `clashes`, a name bound twice is reported.
    pub(crate) fn check_lval(
        &mut self,
        expr: &Node,
        binding: BindingKind,
        mut clashes: Option<&mut FxHashSet<String>>,
    ) -> Result<()> {
        let is_binding = binding != BindingKind::None;
        match &expr.kind {
            NodeKind::Identifier { name } => {
                if binding == BindingKind::Lexical && name == "let" {
                    self.raise_recoverable(expr.start, "let is disallowed as a lexically bound name");
                }
                if self.strict && self.reserved.is_reserved_strict_bind(name) {
                    let verb = if is_binding { "Binding" } else { "Assigning to" };
                    self.raise_recoverable(expr.start, format!("{verb} {name} in strict mode"));
                }
                if let Some(clashes) = clashes {
                    if !clashes.insert(name.clone()) {
                        self.raise_recoverable(expr.start, "Argument name clash");
                    }
                }
                if is_binding && binding != BindingKind::Outside {
                    self.declare_name(name, binding, expr.start)?;
                }
            }
            NodeKind::MemberExpression { .. } => {
                if is_binding {
                    self.raise_recoverable(expr.start, "Binding member expression");
                }
            }
            NodeKind::ObjectPattern { properties } => {
                for prop in properties {
                    self.check_lval(prop, binding, clashes.as_deref_mut())?;
                }
            }
            NodeKind::Property { value, .. } => self.check_lval(value, binding, clashes)?,
            NodeKind::ArrayPattern { elements } => {
                for element in elements.iter().flatten() {
                    self.check_lval(element, binding, clashes.as_deref_mut())?;
                }
            }
            NodeKind::AssignmentPattern { left, .. } => self.check_lval(left, binding, clashes)?,
            NodeKind::RestElement { argument } => self.check_lval(argument, binding, clashes)?,
            NodeKind::ParenthesizedExpression { expression } => self.check_lval(expression, binding, clashes)?,
            _ => {
                let what = if is_binding { "Binding rvalue" } else { "Assigning to rvalue" };
                return self.raise(expr.start, what);
            }
        }
        Ok(())
    }

    /// Register a binding in the scope stack.
    pub(crate) fn declare_name(&mut self, name: &str, binding: BindingKind, pos: usize) -> Result<()> {
        let declared = match binding {
            BindingKind::Function => self.scopes.declare_function(name, self.strict),
            other => self.scopes.declare(name, other),
        };
        if !declared {
            return self.raise(pos, format!("Identifier '{name}' has already been declared"));
        }
        if self.in_module && self.scopes.is_declared_at_top(name) {
            self.undefined_exports.remove(name);
        }
        Ok(())
    }

    /// Plain names and member accesses, optionally parenthesized.
    pub(crate) fn is_simple_assign_target(expr: &Node) -> bool {
        match &expr.kind {
            NodeKind::ParenthesizedExpression { expression } => Self::is_simple_assign_target(expression),
            NodeKind::Identifier { .. } | NodeKind::MemberExpression { .. } => true,
            _ => false,
        }
    }

    /// Parameter lists made only of plain identifiers.
    pub(crate) fn is_simple_param_list(params: &[Node]) -> bool {
        params.iter().all(|param| matches!(param.kind, NodeKind::Identifier { .. }))
    }
}

/// Stand-in left behind while a child is moved to a new parent.
fn placeholder() -> Node {
    Node { kind: NodeKind::EmptyStatement, start: 0, end: 0, loc: None, range: None }
}

#[cfg(test)]
mod tests {
    use crate::node::NodeKind;
    use crate::options::{EcmaVersion, Options};
    use crate::parser::Parser;

    fn parse(src: &str) -> crate::error::Result<crate::node::Node> {
        Parser::new(Options::default(), src).parse()
    }

    fn first_expression(src: &str) -> NodeKind {
        let program = parse(src).unwrap();
        let NodeKind::Program { mut body, .. } = program.kind else { panic!("not a program") };
        let NodeKind::ExpressionStatement { expression, .. } = body.remove(0).kind else {
            panic!("not an expression statement")
        };
        expression.kind
    }

    #[test]
    fn test_object_literal_becomes_pattern() {
        let NodeKind::AssignmentExpression { left, .. } = first_expression("({a, b: [c = 1, ...d]} = x)") else {
            panic!("expected assignment");
        };
        let NodeKind::ObjectPattern { properties } = left.kind else { panic!("expected object pattern") };
        assert_eq!(properties.len(), 2);
        let NodeKind::Property { value, .. } = &properties[1].kind else { panic!("expected property") };
        let NodeKind::ArrayPattern { elements } = &value.kind else { panic!("expected array pattern") };
        assert_eq!(elements[0].as_ref().map(|e| e.type_name()), Some("AssignmentPattern"));
        assert_eq!(elements[1].as_ref().map(|e| e.type_name()), Some("RestElement"));
    }

    #[test]
    fn test_shorthand_default_requires_pattern() {
        let err = parse("({a = 1})").unwrap_err();
        assert_eq!(err.message(), "Shorthand property assignments are valid only in destructuring patterns");
        assert!(parse("({a = 1} = {})").is_ok());
    }

    #[test]
    fn test_invalid_targets() {
        assert_eq!(parse("1 = 2").unwrap_err().message(), "Assigning to rvalue");
        assert_eq!(parse("a + b = c").unwrap_err().message(), "Assigning to rvalue");
        assert_eq!(parse("[...a = 1] = b").unwrap_err().message(), "Rest elements cannot have a default value");
        assert_eq!(parse("({get a(){}} = b)").unwrap_err().message(), "Object pattern can't contain getter or setter");
        assert_eq!(parse("++f()").unwrap_err().message(), "Assigning to rvalue");
    }

    #[test]
    fn test_strict_eval_assignment_is_recoverable() {
        let mut parser = Parser::new(Options::default(), "'use strict'; eval = 1; var arguments;");
        assert!(parser.parse().is_ok());
        let messages: Vec<_> = parser.recoverable_errors().iter().map(|e| e.message.as_str()).collect();
        assert_eq!(messages, vec!["Assigning to eval in strict mode", "Binding arguments in strict mode"]);
    }

    #[test]
    fn test_block_function_is_block_scoped() {
        assert!(parse("{ function f() {} } let f;").is_ok());
        assert!(parse("function f() {} var f;").is_ok());
        let module = Options::default().module();
        let err = Parser::new(module, "function f() {} var f;").parse().unwrap_err();
        assert_eq!(err.message(), "Identifier 'f' has already been declared");
    }

    #[test]
    fn test_es5_has_no_patterns() {
        let es5 = Options::default().with_ecma_version(EcmaVersion::ES5);
        assert!(Parser::new(es5, "var [a] = b;").parse().is_err());
    }
}
