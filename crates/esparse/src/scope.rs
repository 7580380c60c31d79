//! Lexical scope tracking for binding validation.
//!
//! The parser keeps a stack of [`Scope`]s while it walks the source. Each
//! declaration registers its name according to its [`BindingKind`]; clashes
//! between lexical and var bindings are reported as redeclarations.

use bitflags::bitflags;
use rustc_hash::FxHashSet;

bitflags! {
    /// What kind of construct a scope belongs to.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ScopeFlags: u16 {
        const TOP = 1;
        const FUNCTION = 1 << 1;
        const ASYNC = 1 << 2;
        const GENERATOR = 1 << 3;
        const ARROW = 1 << 4;
        const SIMPLE_CATCH = 1 << 5;
        const SUPER = 1 << 6;
        const DIRECT_SUPER = 1 << 7;
        /// Scopes that receive `var` declarations.
        const VAR = Self::TOP.bits() | Self::FUNCTION.bits();
    }
}

impl ScopeFlags {
    /// Flags for a function body.
    pub fn function(is_async: bool, generator: bool) -> Self {
        let mut flags = ScopeFlags::FUNCTION;
        flags.set(ScopeFlags::ASYNC, is_async);
        flags.set(ScopeFlags::GENERATOR, generator);
        flags
    }
}

/// How a name is being bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingKind {
    /// Not a declaration (assignment target).
    None,
    /// `var` declarations and function parameters.
    Var,
    /// `let`, `const`, `class`.
    Lexical,
    /// Function declarations.
    Function,
    /// The parameter of `catch (e)`.
    SimpleCatch,
    /// A name bound outside the current function, like a function
    /// expression's own name. Validated but never recorded.
    Outside,
}

/// One entry of the scope stack.
#[derive(Debug, Clone)]
pub struct Scope {
    pub flags: ScopeFlags,
    pub var: FxHashSet<String>,
    pub lexical: FxHashSet<String>,
    /// Function declarations made directly in this scope.
    pub functions: FxHashSet<String>,
    /// Name bound by a simple catch clause, which `var` may redeclare.
    pub catch_param: Option<String>,
}

impl Scope {
    pub fn new(flags: ScopeFlags) -> Self {
        Self {
            flags,
            var: FxHashSet::default(),
            lexical: FxHashSet::default(),
            functions: FxHashSet::default(),
            catch_param: None,
        }
    }

    #[inline]
    pub fn is_var_scope(&self) -> bool {
        self.flags.intersects(ScopeFlags::VAR)
    }
}

/// The stack of scopes active during one parse.
#[derive(Debug, Clone)]
pub struct ScopeStack {
    scopes: Vec<Scope>,
    in_module: bool,
}

impl ScopeStack {
    /// A stack holding just the top-level scope of a script.
    pub fn new() -> Self {
        Self { scopes: vec![Scope::new(ScopeFlags::TOP)], in_module: false }
    }

    /// A stack holding just the top-level scope of a module.
    pub fn module() -> Self {
        Self { in_module: true, ..Self::new() }
    }

    /// Function declarations directly in a function body, or at the top of
    /// a script, behave like `var`.
    fn functions_as_var(flags: ScopeFlags, in_module: bool) -> bool {
        flags.contains(ScopeFlags::FUNCTION) || (!in_module && flags.contains(ScopeFlags::TOP))
    }

    pub fn enter(&mut self, flags: ScopeFlags) {
        self.scopes.push(Scope::new(flags));
    }

    /// Leave the innermost scope. The top-level scope is never removed.
    pub fn exit(&mut self) {
        if self.scopes.len() > 1 {
            self.scopes.pop();
        }
    }

    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    /// Drop scopes above `depth`, after an abandoned speculative parse.
    pub fn truncate(&mut self, depth: usize) {
        self.scopes.truncate(depth.max(1));
    }

    pub fn current(&self) -> &Scope {
        &self.scopes[self.scopes.len() - 1]
    }

    fn current_mut(&mut self) -> &mut Scope {
        let last = self.scopes.len() - 1;
        &mut self.scopes[last]
    }

    /// Nearest scope receiving `var` declarations.
    pub fn current_var_scope(&self) -> &Scope {
        self.scopes
            .iter()
            .rev()
            .find(|s| s.is_var_scope())
            .unwrap_or(&self.scopes[0])
    }

    /// Nearest scope that binds `this` (skips arrow functions).
    pub fn current_this_scope(&self) -> &Scope {
        self.scopes
            .iter()
            .rev()
            .find(|s| s.is_var_scope() && !s.flags.contains(ScopeFlags::ARROW))
            .unwrap_or(&self.scopes[0])
    }

    pub fn in_function(&self) -> bool {
        self.current_var_scope().flags.contains(ScopeFlags::FUNCTION)
    }

    pub fn in_generator(&self) -> bool {
        self.current_var_scope().flags.contains(ScopeFlags::GENERATOR)
    }

    pub fn in_async(&self) -> bool {
        self.current_var_scope().flags.contains(ScopeFlags::ASYNC)
    }

    pub fn allow_super(&self) -> bool {
        self.current_this_scope().flags.contains(ScopeFlags::SUPER)
    }

    pub fn allow_direct_super(&self) -> bool {
        self.current_this_scope().flags.contains(ScopeFlags::DIRECT_SUPER)
    }

    pub fn in_non_arrow_function(&self) -> bool {
        self.current_this_scope().flags.contains(ScopeFlags::FUNCTION)
    }

    /// Whether `name` is declared in the top-level scope.
    pub fn is_declared_at_top(&self, name: &str) -> bool {
        let top = &self.scopes[0];
        top.var.contains(name) || top.lexical.contains(name) || top.functions.contains(name)
    }

    /// Register `name`. Returns `false` when it clashes with an existing binding.
    ///
    /// Function declarations are treated as sloppy-mode ones; use
    /// [`ScopeStack::declare_function`] to apply strict-mode rules.
    pub fn declare(&mut self, name: &str, kind: BindingKind) -> bool {
        match kind {
            BindingKind::None | BindingKind::Outside => true,
            BindingKind::Lexical => {
                let scope = self.current_mut();
                let redeclared =
                    scope.lexical.contains(name) || scope.functions.contains(name) || scope.var.contains(name);
                scope.lexical.insert(name.to_string());
                !redeclared
            }
            BindingKind::SimpleCatch => {
                let scope = self.current_mut();
                scope.lexical.insert(name.to_string());
                scope.catch_param = Some(name.to_string());
                true
            }
            BindingKind::Function => self.declare_function(name, false),
            BindingKind::Var => {
                let in_module = self.in_module;
                let mut redeclared = false;
                for scope in self.scopes.iter_mut().rev() {
                    let simple_catch = scope.flags.contains(ScopeFlags::SIMPLE_CATCH)
                        && scope.catch_param.as_deref() == Some(name);
                    let block_function =
                        !Self::functions_as_var(scope.flags, in_module) && scope.functions.contains(name);
                    if (scope.lexical.contains(name) && !simple_catch) || block_function {
                        redeclared = true;
                        break;
                    }
                    scope.var.insert(name.to_string());
                    if scope.is_var_scope() {
                        break;
                    }
                }
                !redeclared
            }
        }
    }

    /// Register a function declaration in the current scope.
    ///
    /// In a block (or at the top of a module) it clashes with `var` and
    /// lexical names. Sloppy-mode code may repeat a block-level function
    /// declaration; strict code may not.
    pub fn declare_function(&mut self, name: &str, strict: bool) -> bool {
        let in_module = self.in_module;
        let scope = self.current_mut();
        let redeclared = if Self::functions_as_var(scope.flags, in_module) {
            scope.lexical.contains(name)
        } else {
            scope.lexical.contains(name)
                || scope.var.contains(name)
                || (strict && scope.functions.contains(name))
        };
        scope.functions.insert(name.to_string());
        !redeclared
    }
}

impl Default for ScopeStack {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lexical_redeclaration() {
        let mut scopes = ScopeStack::new();
        assert!(scopes.declare("x", BindingKind::Lexical));
        assert!(!scopes.declare("x", BindingKind::Lexical));
    }

    #[test]
    fn test_var_then_let_clashes() {
        let mut scopes = ScopeStack::new();
        assert!(scopes.declare("x", BindingKind::Var));
        assert!(!scopes.declare("x", BindingKind::Lexical));
    }

    #[test]
    fn test_var_redeclaration_is_allowed() {
        let mut scopes = ScopeStack::new();
        assert!(scopes.declare("x", BindingKind::Var));
        assert!(scopes.declare("x", BindingKind::Var));
        assert_eq!(scopes.current().var.len(), 1);
    }

    #[test]
    fn test_var_hoists_through_blocks() {
        let mut scopes = ScopeStack::new();
        scopes.enter(ScopeFlags::function(false, false));
        scopes.enter(ScopeFlags::empty());
        assert!(scopes.declare("y", BindingKind::Var));
        scopes.exit();
        assert!(scopes.current().var.contains("y"));
        assert!(!scopes.declare("y", BindingKind::Lexical));
    }

    #[test]
    fn test_var_clashes_with_enclosing_block_let() {
        let mut scopes = ScopeStack::new();
        scopes.enter(ScopeFlags::empty());
        assert!(scopes.declare("z", BindingKind::Lexical));
        scopes.enter(ScopeFlags::empty());
        assert!(!scopes.declare("z", BindingKind::Var));
    }

    #[test]
    fn test_simple_catch_allows_var() {
        let mut scopes = ScopeStack::new();
        scopes.enter(ScopeFlags::SIMPLE_CATCH);
        assert!(scopes.declare("e", BindingKind::SimpleCatch));
        assert!(scopes.declare("e", BindingKind::Var));
        assert!(!scopes.declare("e", BindingKind::Lexical));
    }

    #[test]
    fn test_block_functions() {
        let mut scopes = ScopeStack::new();
        scopes.enter(ScopeFlags::empty());
        assert!(scopes.declare_function("f", false));
        assert!(scopes.declare_function("f", false));
        assert!(!scopes.declare_function("f", true));
        assert!(!scopes.declare("f", BindingKind::Var));
        assert!(!scopes.declare("f", BindingKind::Lexical));
    }

    #[test]
    fn test_top_level_functions_depend_on_source_type() {
        let mut script = ScopeStack::new();
        assert!(script.declare_function("f", true));
        assert!(script.declare_function("f", true));
        assert!(script.declare("f", BindingKind::Var));
        assert!(!script.declare("f", BindingKind::Lexical));

        let mut module = ScopeStack::module();
        assert!(module.declare_function("f", true));
        assert!(!module.declare_function("f", true));
        assert!(!module.declare("f", BindingKind::Var));
        assert!(module.is_declared_at_top("f"));
    }

    #[test]
    fn test_function_flags() {
        let mut scopes = ScopeStack::new();
        assert!(!scopes.in_function());
        scopes.enter(ScopeFlags::function(true, true));
        assert!(scopes.in_async() && scopes.in_generator());
        scopes.enter(ScopeFlags::FUNCTION | ScopeFlags::ARROW);
        assert!(!scopes.in_generator());
        assert!(scopes.in_non_arrow_function());
        scopes.exit();
        scopes.exit();
        scopes.exit();
        assert_eq!(scopes.depth(), 1);
    }
}
