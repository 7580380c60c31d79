//! AST node types.
//!
//! Nodes follow the ESTree shape. Every node is a [`Node`] envelope holding
//! the shared position fields around a [`NodeKind`] that carries only the
//! fields meaningful for that node type. Serializing a tree with serde yields
//! ESTree JSON (`"type"`, `start`, `end`, optional `loc`/`range`).

use serde::{Deserialize, Serialize};

use crate::span::{SourceLocation, Span};
use crate::token::RegexValue;

/// A positioned AST node.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Node {
    #[serde(flatten)]
    pub kind: NodeKind,
    pub start: usize,
    pub end: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loc: Option<SourceLocation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range: Option<(usize, usize)>,
}

impl Node {
    pub fn span(&self) -> Span {
        Span::new(self.start, self.end)
    }
}

/// `script` or `module`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    #[default]
    Script,
    Module,
}

/// Node shapes.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all_fields = "camelCase")]
pub enum NodeKind {
    Program {
        body: Vec<Node>,
        source_type: SourceType,
    },
    Identifier {
        name: String,
    },
    Literal {
        value: LiteralValue,
        raw: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        regex: Option<RegexValue>,
        #[serde(skip_serializing_if = "Option::is_none")]
        bigint: Option<String>,
    },

    // === Statements ===
    ExpressionStatement {
        expression: Box<Node>,
        /// Raw text of a directive-prologue string, without quotes.
        #[serde(skip_serializing_if = "Option::is_none")]
        directive: Option<String>,
    },
    BlockStatement {
        body: Vec<Node>,
    },
    EmptyStatement,
    DebuggerStatement,
    WithStatement {
        object: Box<Node>,
        body: Box<Node>,
    },
    ReturnStatement {
        argument: Option<Box<Node>>,
    },
    LabeledStatement {
        label: Box<Node>,
        body: Box<Node>,
    },
    BreakStatement {
        label: Option<Box<Node>>,
    },
    ContinueStatement {
        label: Option<Box<Node>>,
    },
    IfStatement {
        test: Box<Node>,
        consequent: Box<Node>,
        alternate: Option<Box<Node>>,
    },
    SwitchStatement {
        discriminant: Box<Node>,
        cases: Vec<Node>,
    },
    SwitchCase {
        test: Option<Box<Node>>,
        consequent: Vec<Node>,
    },
    ThrowStatement {
        argument: Box<Node>,
    },
    TryStatement {
        block: Box<Node>,
        handler: Option<Box<Node>>,
        finalizer: Option<Box<Node>>,
    },
    CatchClause {
        param: Option<Box<Node>>,
        body: Box<Node>,
    },
    WhileStatement {
        test: Box<Node>,
        body: Box<Node>,
    },
    DoWhileStatement {
        body: Box<Node>,
        test: Box<Node>,
    },
    ForStatement {
        init: Option<Box<Node>>,
        test: Option<Box<Node>>,
        update: Option<Box<Node>>,
        body: Box<Node>,
    },
    ForInStatement {
        left: Box<Node>,
        right: Box<Node>,
        body: Box<Node>,
    },
    ForOfStatement {
        left: Box<Node>,
        right: Box<Node>,
        body: Box<Node>,
        #[serde(rename = "await")]
        is_await: bool,
    },

    // === Declarations ===
    FunctionDeclaration(Function),
    VariableDeclaration {
        declarations: Vec<Node>,
        kind: VarKind,
    },
    VariableDeclarator {
        id: Box<Node>,
        init: Option<Box<Node>>,
    },
    ClassDeclaration(Class),

    // === Expressions ===
    ThisExpression,
    Super,
    ArrayExpression {
        elements: Vec<Option<Node>>,
    },
    ObjectExpression {
        properties: Vec<Node>,
    },
    Property {
        key: Box<Node>,
        value: Box<Node>,
        kind: PropertyKind,
        method: bool,
        shorthand: bool,
        computed: bool,
    },
    FunctionExpression(Function),
    ArrowFunctionExpression(Function),
    ClassExpression(Class),
    UnaryExpression {
        operator: UnaryOperator,
        prefix: bool,
        argument: Box<Node>,
    },
    UpdateExpression {
        operator: UpdateOperator,
        prefix: bool,
        argument: Box<Node>,
    },
    BinaryExpression {
        operator: BinaryOperator,
        left: Box<Node>,
        right: Box<Node>,
    },
    LogicalExpression {
        operator: LogicalOperator,
        left: Box<Node>,
        right: Box<Node>,
    },
    AssignmentExpression {
        operator: AssignmentOperator,
        left: Box<Node>,
        right: Box<Node>,
    },
    ConditionalExpression {
        test: Box<Node>,
        consequent: Box<Node>,
        alternate: Box<Node>,
    },
    CallExpression {
        callee: Box<Node>,
        arguments: Vec<Node>,
    },
    NewExpression {
        callee: Box<Node>,
        arguments: Vec<Node>,
    },
    MemberExpression {
        object: Box<Node>,
        property: Box<Node>,
        computed: bool,
    },
    SequenceExpression {
        expressions: Vec<Node>,
    },
    YieldExpression {
        argument: Option<Box<Node>>,
        delegate: bool,
    },
    AwaitExpression {
        argument: Box<Node>,
    },
    TemplateLiteral {
        quasis: Vec<Node>,
        expressions: Vec<Node>,
    },
    TaggedTemplateExpression {
        tag: Box<Node>,
        quasi: Box<Node>,
    },
    TemplateElement {
        value: TemplateValue,
        tail: bool,
    },
    MetaProperty {
        meta: Box<Node>,
        property: Box<Node>,
    },
    SpreadElement {
        argument: Box<Node>,
    },
    ParenthesizedExpression {
        expression: Box<Node>,
    },

    // === Classes ===
    ClassBody {
        body: Vec<Node>,
    },
    MethodDefinition {
        key: Box<Node>,
        value: Box<Node>,
        kind: MethodKind,
        computed: bool,
        #[serde(rename = "static")]
        is_static: bool,
    },

    // === Patterns ===
    ObjectPattern {
        properties: Vec<Node>,
    },
    ArrayPattern {
        elements: Vec<Option<Node>>,
    },
    RestElement {
        argument: Box<Node>,
    },
    AssignmentPattern {
        left: Box<Node>,
        right: Box<Node>,
    },

    // === Modules ===
    ImportDeclaration {
        specifiers: Vec<Node>,
        source: Box<Node>,
    },
    ImportSpecifier {
        imported: Box<Node>,
        local: Box<Node>,
    },
    ImportDefaultSpecifier {
        local: Box<Node>,
    },
    ImportNamespaceSpecifier {
        local: Box<Node>,
    },
    ExportNamedDeclaration {
        declaration: Option<Box<Node>>,
        specifiers: Vec<Node>,
        source: Option<Box<Node>>,
    },
    ExportSpecifier {
        local: Box<Node>,
        exported: Box<Node>,
    },
    ExportDefaultDeclaration {
        declaration: Box<Node>,
    },
    ExportAllDeclaration {
        /// `export * as name from ...`
        exported: Option<Box<Node>>,
        source: Box<Node>,
    },
}

/// Shared shape of function declarations, expressions, and arrows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Function {
    pub id: Option<Box<Node>>,
    pub params: Vec<Node>,
    pub body: Box<Node>,
    pub generator: bool,
    #[serde(rename = "async")]
    pub is_async: bool,
    /// Arrow function with an expression body.
    pub expression: bool,
}

/// Shared shape of class declarations and expressions.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Class {
    pub id: Option<Box<Node>>,
    pub super_class: Option<Box<Node>>,
    pub body: Box<Node>,
}

/// Literal values. Regex and BigInt values are described by the sibling
/// `regex` / `bigint` fields and serialize as `null`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum LiteralValue {
    Null,
    Boolean(bool),
    Number(f64),
    String(String),
    RegExp,
    BigInt,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TemplateValue {
    pub raw: String,
    /// `None` for invalid escapes in tagged templates.
    pub cooked: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VarKind {
    Var,
    Let,
    Const,
}

impl VarKind {
    pub fn as_str(self) -> &'static str {
        match self {
            VarKind::Var => "var",
            VarKind::Let => "let",
            VarKind::Const => "const",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyKind {
    Init,
    Get,
    Set,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MethodKind {
    Constructor,
    Method,
    Get,
    Set,
}

macro_rules! operator_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
        pub enum $name {
            $(#[serde(rename = $text)] $variant,)+
        }

        impl $name {
            /// Operator source text.
            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $text,)+
                }
            }

            /// Look up an operator by its source text.
            pub fn from_text(text: &str) -> Option<Self> {
                match text {
                    $($text => Some($name::$variant),)+
                    _ => None,
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

operator_enum!(
    /// Binary operators.
    BinaryOperator {
        Eq => "==",
        NotEq => "!=",
        StrictEq => "===",
        StrictNotEq => "!==",
        Lt => "<",
        LtEq => "<=",
        Gt => ">",
        GtEq => ">=",
        Shl => "<<",
        Shr => ">>",
        UShr => ">>>",
        Add => "+",
        Sub => "-",
        Mul => "*",
        Div => "/",
        Mod => "%",
        Pow => "**",
        BitOr => "|",
        BitXor => "^",
        BitAnd => "&",
        In => "in",
        Instanceof => "instanceof",
    }
);

operator_enum!(
    /// Short-circuiting operators.
    LogicalOperator {
        Or => "||",
        And => "&&",
        Nullish => "??",
    }
);

operator_enum!(
    /// Assignment operators.
    AssignmentOperator {
        Assign => "=",
        AddAssign => "+=",
        SubAssign => "-=",
        MulAssign => "*=",
        DivAssign => "/=",
        ModAssign => "%=",
        PowAssign => "**=",
        ShlAssign => "<<=",
        ShrAssign => ">>=",
        UShrAssign => ">>>=",
        BitOrAssign => "|=",
        BitXorAssign => "^=",
        BitAndAssign => "&=",
    }
);

operator_enum!(
    /// Prefix unary operators.
    UnaryOperator {
        Minus => "-",
        Plus => "+",
        Not => "!",
        BitNot => "~",
        Typeof => "typeof",
        Void => "void",
        Delete => "delete",
    }
);

operator_enum!(
    /// `++` and `--`.
    UpdateOperator {
        Increment => "++",
        Decrement => "--",
    }
);

impl NodeKind {
    /// The ESTree `type` name.
    pub fn type_name(&self) -> &'static str {
        use NodeKind::*;
        match self {
            Program { .. } => "Program",
            Identifier { .. } => "Identifier",
            Literal { .. } => "Literal",
            ExpressionStatement { .. } => "ExpressionStatement",
            BlockStatement { .. } => "BlockStatement",
            EmptyStatement => "EmptyStatement",
            DebuggerStatement => "DebuggerStatement",
            WithStatement { .. } => "WithStatement",
            ReturnStatement { .. } => "ReturnStatement",
            LabeledStatement { .. } => "LabeledStatement",
            BreakStatement { .. } => "BreakStatement",
            ContinueStatement { .. } => "ContinueStatement",
            IfStatement { .. } => "IfStatement",
            SwitchStatement { .. } => "SwitchStatement",
            SwitchCase { .. } => "SwitchCase",
            ThrowStatement { .. } => "ThrowStatement",
            TryStatement { .. } => "TryStatement",
            CatchClause { .. } => "CatchClause",
            WhileStatement { .. } => "WhileStatement",
            DoWhileStatement { .. } => "DoWhileStatement",
            ForStatement { .. } => "ForStatement",
            ForInStatement { .. } => "ForInStatement",
            ForOfStatement { .. } => "ForOfStatement",
            FunctionDeclaration(_) => "FunctionDeclaration",
            VariableDeclaration { .. } => "VariableDeclaration",
            VariableDeclarator { .. } => "VariableDeclarator",
            ClassDeclaration(_) => "ClassDeclaration",
            ThisExpression => "ThisExpression",
            Super => "Super",
            ArrayExpression { .. } => "ArrayExpression",
            ObjectExpression { .. } => "ObjectExpression",
            Property { .. } => "Property",
            FunctionExpression(_) => "FunctionExpression",
            ArrowFunctionExpression(_) => "ArrowFunctionExpression",
            ClassExpression(_) => "ClassExpression",
            UnaryExpression { .. } => "UnaryExpression",
            UpdateExpression { .. } => "UpdateExpression",
            BinaryExpression { .. } => "BinaryExpression",
            LogicalExpression { .. } => "LogicalExpression",
            AssignmentExpression { .. } => "AssignmentExpression",
            ConditionalExpression { .. } => "ConditionalExpression",
            CallExpression { .. } => "CallExpression",
            NewExpression { .. } => "NewExpression",
            MemberExpression { .. } => "MemberExpression",
            SequenceExpression { .. } => "SequenceExpression",
            YieldExpression { .. } => "YieldExpression",
            AwaitExpression { .. } => "AwaitExpression",
            TemplateLiteral { .. } => "TemplateLiteral",
            TaggedTemplateExpression { .. } => "TaggedTemplateExpression",
            TemplateElement { .. } => "TemplateElement",
            MetaProperty { .. } => "MetaProperty",
            SpreadElement { .. } => "SpreadElement",
            ParenthesizedExpression { .. } => "ParenthesizedExpression",
            ClassBody { .. } => "ClassBody",
            MethodDefinition { .. } => "MethodDefinition",
            ObjectPattern { .. } => "ObjectPattern",
            ArrayPattern { .. } => "ArrayPattern",
            RestElement { .. } => "RestElement",
            AssignmentPattern { .. } => "AssignmentPattern",
            ImportDeclaration { .. } => "ImportDeclaration",
            ImportSpecifier { .. } => "ImportSpecifier",
            ImportDefaultSpecifier { .. } => "ImportDefaultSpecifier",
            ImportNamespaceSpecifier { .. } => "ImportNamespaceSpecifier",
            ExportNamedDeclaration { .. } => "ExportNamedDeclaration",
            ExportSpecifier { .. } => "ExportSpecifier",
            ExportDefaultDeclaration { .. } => "ExportDefaultDeclaration",
            ExportAllDeclaration { .. } => "ExportAllDeclaration",
        }
    }
}

impl Node {
    #[inline]
    pub fn type_name(&self) -> &'static str {
        self.kind.type_name()
    }

    /// Identifier name, if this is an `Identifier`.
    pub fn ident_name(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Identifier { name } => Some(name),
            _ => None,
        }
    }

    /// Direct children in source order.
    pub fn children(&self) -> Vec<&Node> {
        use NodeKind::*;
        let mut out: Vec<&Node> = Vec::new();
        match &self.kind {
            Program { body, .. } | BlockStatement { body } | ClassBody { body } => out.extend(body),
            Identifier { .. }
            | Literal { .. }
            | EmptyStatement
            | DebuggerStatement
            | ThisExpression
            | Super
            | TemplateElement { .. } => {}
            ExpressionStatement { expression, .. } | ParenthesizedExpression { expression } => {
                out.push(expression);
            }
            WithStatement { object, body } => {
                out.push(object);
                out.push(body);
            }
            ReturnStatement { argument } | YieldExpression { argument, .. } => {
                out.extend(argument.as_deref());
            }
            ThrowStatement { argument }
            | AwaitExpression { argument }
            | SpreadElement { argument }
            | RestElement { argument }
            | UnaryExpression { argument, .. }
            | UpdateExpression { argument, .. } => out.push(argument),
            LabeledStatement { label, body } => {
                out.push(label);
                out.push(body);
            }
            BreakStatement { label } | ContinueStatement { label } => out.extend(label.as_deref()),
            IfStatement { test, consequent, alternate } => {
                out.push(test);
                out.push(consequent);
                out.extend(alternate.as_deref());
            }
            SwitchStatement { discriminant, cases } => {
                out.push(discriminant);
                out.extend(cases);
            }
            SwitchCase { test, consequent } => {
                out.extend(test.as_deref());
                out.extend(consequent);
            }
            TryStatement { block, handler, finalizer } => {
                out.push(block);
                out.extend(handler.as_deref());
                out.extend(finalizer.as_deref());
            }
            CatchClause { param, body } => {
                out.extend(param.as_deref());
                out.push(body);
            }
            WhileStatement { test, body } => {
                out.push(test);
                out.push(body);
            }
            DoWhileStatement { body, test } => {
                out.push(body);
                out.push(test);
            }
            ForStatement { init, test, update, body } => {
                out.extend(init.as_deref());
                out.extend(test.as_deref());
                out.extend(update.as_deref());
                out.push(body);
            }
            ForInStatement { left, right, body } | ForOfStatement { left, right, body, .. } => {
                out.push(left);
                out.push(right);
                out.push(body);
            }
            FunctionDeclaration(func) | FunctionExpression(func) | ArrowFunctionExpression(func) => {
                out.extend(func.id.as_deref());
                out.extend(&func.params);
                out.push(&func.body);
            }
            ClassDeclaration(class) | ClassExpression(class) => {
                out.extend(class.id.as_deref());
                out.extend(class.super_class.as_deref());
                out.push(&class.body);
            }
            VariableDeclaration { declarations, .. } => out.extend(declarations),
            VariableDeclarator { id, init } => {
                out.push(id);
                out.extend(init.as_deref());
            }
            ArrayExpression { elements } | ArrayPattern { elements } => {
                out.extend(elements.iter().flatten());
            }
            ObjectExpression { properties } | ObjectPattern { properties } => out.extend(properties),
            Property { key, value, shorthand, .. } => {
                // Shorthand properties share one source range between key and value.
                if !*shorthand {
                    out.push(key);
                }
                out.push(value);
            }
            BinaryExpression { left, right, .. }
            | LogicalExpression { left, right, .. }
            | AssignmentExpression { left, right, .. }
            | AssignmentPattern { left, right } => {
                out.push(left);
                out.push(right);
            }
            ConditionalExpression { test, consequent, alternate } => {
                out.push(test);
                out.push(consequent);
                out.push(alternate);
            }
            CallExpression { callee, arguments } | NewExpression { callee, arguments } => {
                out.push(callee);
                out.extend(arguments);
            }
            MemberExpression { object, property, .. } => {
                out.push(object);
                out.push(property);
            }
            SequenceExpression { expressions } => out.extend(expressions),
            TemplateLiteral { quasis, expressions } => {
                let mut exprs = expressions.iter();
                for quasi in quasis {
                    out.push(quasi);
                    out.extend(exprs.next());
                }
            }
            TaggedTemplateExpression { tag, quasi } => {
                out.push(tag);
                out.push(quasi);
            }
            MetaProperty { meta, property } => {
                out.push(meta);
                out.push(property);
            }
            MethodDefinition { key, value, .. } => {
                out.push(key);
                out.push(value);
            }
            ImportDeclaration { specifiers, source } => {
                out.extend(specifiers);
                out.push(source);
            }
            ImportSpecifier { imported, local } => {
                if imported.span() != local.span() {
                    out.push(imported);
                }
                out.push(local);
            }
            ImportDefaultSpecifier { local } | ImportNamespaceSpecifier { local } => out.push(local),
            ExportNamedDeclaration { declaration, specifiers, source } => {
                out.extend(declaration.as_deref());
                out.extend(specifiers);
                out.extend(source.as_deref());
            }
            ExportSpecifier { local, exported } => {
                out.push(local);
                if exported.span() != local.span() {
                    out.push(exported);
                }
            }
            ExportDefaultDeclaration { declaration } => out.push(declaration),
            ExportAllDeclaration { exported, source } => {
                out.extend(exported.as_deref());
                out.push(source);
            }
        }
        out
    }

    /// Visit this node and all descendants, parents first.
    pub fn walk<'n>(&'n self, f: &mut impl FnMut(&'n Node)) {
        f(self);
        for child in self.children() {
            child.walk(f);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ident(name: &str, start: usize) -> Node {
        Node {
            kind: NodeKind::Identifier { name: name.to_string() },
            start,
            end: start + name.len(),
            loc: None,
            range: None,
        }
    }

    #[test]
    fn test_operator_text() {
        assert_eq!(BinaryOperator::from_text(">>>"), Some(BinaryOperator::UShr));
        assert_eq!(BinaryOperator::Instanceof.as_str(), "instanceof");
        assert_eq!(LogicalOperator::from_text("??"), Some(LogicalOperator::Nullish));
        assert_eq!(AssignmentOperator::from_text("**="), Some(AssignmentOperator::PowAssign));
        assert_eq!(UnaryOperator::from_text("+="), None);
    }

    #[test]
    fn test_serialize_estree_shape() {
        let node = Node {
            kind: NodeKind::BinaryExpression {
                operator: BinaryOperator::Add,
                left: Box::new(ident("a", 0)),
                right: Box::new(ident("b", 4)),
            },
            start: 0,
            end: 5,
            loc: None,
            range: Some((0, 5)),
        };
        let json = serde_json::to_value(&node).unwrap();
        assert_eq!(json["type"], "BinaryExpression");
        assert_eq!(json["operator"], "+");
        assert_eq!(json["left"]["name"], "a");
        assert_eq!(json["range"], serde_json::json!([0, 5]));
        assert!(json.get("loc").is_none());
    }

    #[test]
    fn test_children_in_source_order() {
        let node = Node {
            kind: NodeKind::CallExpression {
                callee: Box::new(ident("f", 0)),
                arguments: vec![ident("x", 2), ident("y", 5)],
            },
            start: 0,
            end: 7,
            loc: None,
            range: None,
        };
        let names: Vec<_> = node.children().iter().filter_map(|n| n.ident_name()).collect();
        assert_eq!(names, ["f", "x", "y"]);
        let mut count = 0;
        node.walk(&mut |_| count += 1);
        assert_eq!(count, 4);
        assert_eq!(node.type_name(), "CallExpression");
    }
}
