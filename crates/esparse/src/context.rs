//! Token contexts.
//!
//! The JavaScript grammar is not regular: `/` may start a regex or divide,
//! `{` may open a block or an object, `}` may close a block or resume a
//! template. The scanner keeps a stack of [`TokenContext`]s describing the
//! constructs it is inside, and after every token [`update_context`] adjusts
//! that stack and decides whether an expression may start next.

use crate::token::{TokenType, TokenValue};

/// How the scanner reads the next token inside a context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextOverride {
    /// Read template characters up to the next `${` or backquote.
    ReadTemplate,
}

/// A syntactic construct enclosing the scanner position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenContext {
    pub token: &'static str,
    pub is_expr: bool,
    pub preserve_space: bool,
    pub override_: Option<ContextOverride>,
    pub generator: bool,
}

impl TokenContext {
    const fn new(token: &'static str, is_expr: bool) -> Self {
        Self { token, is_expr, preserve_space: false, override_: None, generator: false }
    }

    /// `{` opening a statement block.
    pub const B_STAT: Self = Self::new("{", false);
    /// `{` opening an object literal or pattern.
    pub const B_EXPR: Self = Self::new("{", true);
    /// `${` inside a template.
    pub const B_TMPL: Self = Self::new("${", false);
    /// `(` after `if`/`for`/`with`/`while`.
    pub const P_STAT: Self = Self::new("(", false);
    /// Any other `(`.
    pub const P_EXPR: Self = Self::new("(", true);
    /// Inside a template literal's characters.
    pub const Q_TMPL: Self = Self {
        token: "`",
        is_expr: true,
        preserve_space: true,
        override_: Some(ContextOverride::ReadTemplate),
        generator: false,
    };
    pub const F_STAT: Self = Self::new("function", false);
    pub const F_EXPR: Self = Self::new("function", true);
    pub const F_EXPR_GEN: Self = Self { generator: true, ..Self::F_EXPR };
    pub const F_GEN: Self = Self { generator: true, ..Self::F_STAT };
}

/// Parser state consulted by the context rules.
#[derive(Debug, Clone, Copy)]
pub struct ContextInput<'v> {
    pub ecma_version: u32,
    /// Whether an expression was allowed before the current token.
    pub expr_allowed: bool,
    /// The current token's value.
    pub value: &'v TokenValue,
    /// A line break separates the previous token from the current one.
    pub line_break_before: bool,
}

/// Whether a `{` following `prev` opens a block rather than an object.
pub fn brace_is_block(stack: &[TokenContext], prev: TokenType, input: &ContextInput<'_>) -> bool {
    let parent = current(stack);
    if parent == TokenContext::F_EXPR || parent == TokenContext::F_STAT {
        return true;
    }
    if prev == TokenType::Colon && (parent == TokenContext::B_STAT || parent == TokenContext::B_EXPR) {
        return !parent.is_expr;
    }
    // `return {` and `x\n{` depend on the line break: ASI turns them into blocks.
    if prev == TokenType::Return || (prev == TokenType::Name && input.expr_allowed) {
        return input.line_break_before;
    }
    match prev {
        TokenType::Else
        | TokenType::Semi
        | TokenType::Eof
        | TokenType::ParenR
        | TokenType::Arrow => true,
        TokenType::BraceL => parent == TokenContext::B_STAT,
        TokenType::Var | TokenType::Const | TokenType::Name => false,
        _ => !input.expr_allowed,
    }
}

/// Whether the innermost function context is a generator.
pub fn in_generator_context(stack: &[TokenContext]) -> bool {
    stack
        .iter()
        .rev()
        .find(|ctx| ctx.token == "function")
        .is_some_and(|ctx| ctx.generator)
}

#[inline]
fn current(stack: &[TokenContext]) -> TokenContext {
    stack.last().copied().unwrap_or(TokenContext::B_STAT)
}

/// Update the context stack after scanning a token of type `ty`.
///
/// Returns whether an expression may start at the next token.
pub fn update_context(
    stack: &mut Vec<TokenContext>,
    prev: TokenType,
    ty: TokenType,
    input: &ContextInput<'_>,
) -> bool {
    if ty.is_keyword() && prev == TokenType::Dot {
        return false;
    }
    match ty {
        TokenType::ParenR | TokenType::BraceR => {
            if stack.len() == 1 {
                return true;
            }
            let mut out = stack.pop().unwrap_or(TokenContext::B_STAT);
            if out == TokenContext::B_STAT && current(stack).token == "function" {
                out = stack.pop().unwrap_or(TokenContext::B_STAT);
            }
            !out.is_expr
        }
        TokenType::BraceL => {
            let ctx = if brace_is_block(stack, prev, input) {
                TokenContext::B_STAT
            } else {
                TokenContext::B_EXPR
            };
            stack.push(ctx);
            true
        }
        TokenType::DollarBraceL => {
            stack.push(TokenContext::B_TMPL);
            true
        }
        TokenType::ParenL => {
            let statement_parens = matches!(
                prev,
                TokenType::If | TokenType::For | TokenType::With | TokenType::While
            );
            stack.push(if statement_parens { TokenContext::P_STAT } else { TokenContext::P_EXPR });
            true
        }
        TokenType::IncDec => input.expr_allowed,
        TokenType::Function | TokenType::Class => {
            let parent = current(stack);
            let is_expr = prev.before_expr()
                && prev != TokenType::Semi
                && prev != TokenType::Else
                && !(prev == TokenType::Return && input.line_break_before)
                && !((prev == TokenType::Colon || prev == TokenType::BraceL)
                    && parent == TokenContext::B_STAT);
            stack.push(if is_expr { TokenContext::F_EXPR } else { TokenContext::F_STAT });
            false
        }
        TokenType::BackQuote => {
            if current(stack) == TokenContext::Q_TMPL {
                stack.pop();
            } else {
                stack.push(TokenContext::Q_TMPL);
            }
            false
        }
        TokenType::Star => {
            if prev == TokenType::Function {
                if let Some(top) = stack.last_mut() {
                    *top = if *top == TokenContext::F_EXPR {
                        TokenContext::F_EXPR_GEN
                    } else {
                        TokenContext::F_GEN
                    };
                }
            }
            true
        }
        TokenType::Name => {
            if input.ecma_version >= 6 && prev != TokenType::Dot {
                (input.value.is("of") && !input.expr_allowed)
                    || (input.value.is("yield") && in_generator_context(stack))
            } else {
                false
            }
        }
        _ => ty.before_expr(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(expr_allowed: bool, value: &TokenValue) -> ContextInput<'_> {
        ContextInput { ecma_version: 11, expr_allowed, value, line_break_before: false }
    }

    #[test]
    fn test_brace_after_paren_is_block() {
        let none = TokenValue::None;
        let mut stack = vec![TokenContext::B_STAT];
        let allowed = update_context(&mut stack, TokenType::ParenR, TokenType::BraceL, &input(false, &none));
        assert!(allowed);
        assert_eq!(stack.last(), Some(&TokenContext::B_STAT));
    }

    #[test]
    fn test_brace_after_operator_is_object() {
        let none = TokenValue::None;
        let mut stack = vec![TokenContext::B_STAT];
        update_context(&mut stack, TokenType::Eq, TokenType::BraceL, &input(true, &none));
        assert_eq!(stack.last(), Some(&TokenContext::B_EXPR));
        let allowed = update_context(&mut stack, TokenType::BraceL, TokenType::BraceR, &input(true, &none));
        assert!(!allowed);
        assert_eq!(stack.len(), 1);
    }

    #[test]
    fn test_top_level_close_allows_expression() {
        let none = TokenValue::None;
        let mut stack = vec![TokenContext::B_STAT];
        assert!(update_context(&mut stack, TokenType::Name, TokenType::ParenR, &input(false, &none)));
        assert_eq!(stack.len(), 1);
    }

    #[test]
    fn test_function_body_close_pops_function() {
        let none = TokenValue::None;
        let mut stack = vec![TokenContext::B_STAT];
        update_context(&mut stack, TokenType::Eq, TokenType::Function, &input(true, &none));
        assert_eq!(stack.last(), Some(&TokenContext::F_EXPR));
        update_context(&mut stack, TokenType::Function, TokenType::Star, &input(false, &none));
        assert_eq!(stack.last(), Some(&TokenContext::F_EXPR_GEN));
        update_context(&mut stack, TokenType::ParenR, TokenType::BraceL, &input(false, &none));
        assert_eq!(stack.len(), 3);
        assert!(in_generator_context(&stack));
        let allowed = update_context(&mut stack, TokenType::Semi, TokenType::BraceR, &input(true, &none));
        assert_eq!(stack.len(), 1);
        assert!(!allowed);
    }

    #[test]
    fn test_method_in_object_is_statement_form() {
        let none = TokenValue::None;
        let mut stack = vec![TokenContext::B_STAT, TokenContext::B_STAT];
        update_context(&mut stack, TokenType::BraceL, TokenType::Function, &input(true, &none));
        assert_eq!(stack.last(), Some(&TokenContext::F_STAT));
    }

    #[test]
    fn test_template_toggle() {
        let none = TokenValue::None;
        let mut stack = vec![TokenContext::B_STAT];
        update_context(&mut stack, TokenType::Eq, TokenType::BackQuote, &input(true, &none));
        assert_eq!(stack.last(), Some(&TokenContext::Q_TMPL));
        update_context(&mut stack, TokenType::Template, TokenType::BackQuote, &input(false, &none));
        assert_eq!(stack.len(), 1);
    }

    #[test]
    fn test_contextual_of_and_yield() {
        let of = TokenValue::Str("of".into());
        let mut stack = vec![TokenContext::B_STAT];
        assert!(update_context(&mut stack, TokenType::Name, TokenType::Name, &input(false, &of)));
        let yield_ = TokenValue::Str("yield".into());
        assert!(!update_context(&mut stack, TokenType::Semi, TokenType::Name, &input(true, &yield_)));
        stack.push(TokenContext::F_GEN);
        assert!(update_context(&mut stack, TokenType::Semi, TokenType::Name, &input(true, &yield_)));
    }

    #[test]
    fn test_statement_parens() {
        let none = TokenValue::None;
        let mut stack = vec![TokenContext::B_STAT];
        update_context(&mut stack, TokenType::If, TokenType::ParenL, &input(false, &none));
        assert_eq!(stack.last(), Some(&TokenContext::P_STAT));
        assert!(update_context(&mut stack, TokenType::Name, TokenType::ParenR, &input(false, &none)));
    }
}
