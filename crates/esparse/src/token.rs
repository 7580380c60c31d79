//! Token types for JavaScript.
//!
//! [`TokenType`] is a plain tag. Everything the grammar needs to know about a
//! tag (whether an expression may follow it, its binary precedence, ...) comes
//! from [`TokenType::info`], a fixed table that never changes at runtime.
//! Operators that share grammar behavior share a tag (`+` and `-` are both
//! [`TokenType::PlusMin`]); the token's value carries the exact operator.

use serde::Serialize;

use crate::span::{SourceLocation, Span};

/// Grammar metadata attached to a token type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenTypeInfo {
    pub label: &'static str,
    pub keyword: Option<&'static str>,
    /// An expression may start right after this token.
    pub before_expr: bool,
    /// This token can begin an expression.
    pub starts_expr: bool,
    pub is_loop: bool,
    pub is_assign: bool,
    pub prefix: bool,
    pub postfix: bool,
    /// Binary operator precedence, higher binds tighter.
    pub binop: Option<u8>,
}

const BASE: TokenTypeInfo = TokenTypeInfo {
    label: "",
    keyword: None,
    before_expr: false,
    starts_expr: false,
    is_loop: false,
    is_assign: false,
    prefix: false,
    postfix: false,
    binop: None,
};

const fn plain(label: &'static str) -> TokenTypeInfo {
    TokenTypeInfo { label, ..BASE }
}

const fn before(label: &'static str) -> TokenTypeInfo {
    TokenTypeInfo { label, before_expr: true, ..BASE }
}

const fn starts(label: &'static str) -> TokenTypeInfo {
    TokenTypeInfo { label, starts_expr: true, ..BASE }
}

const fn before_starts(label: &'static str) -> TokenTypeInfo {
    TokenTypeInfo { label, before_expr: true, starts_expr: true, ..BASE }
}

const fn binop(label: &'static str, prec: u8) -> TokenTypeInfo {
    TokenTypeInfo { label, before_expr: true, binop: Some(prec), ..BASE }
}

const fn kw(name: &'static str) -> TokenTypeInfo {
    TokenTypeInfo { label: name, keyword: Some(name), ..BASE }
}

const fn kw_before(name: &'static str) -> TokenTypeInfo {
    TokenTypeInfo { label: name, keyword: Some(name), before_expr: true, ..BASE }
}

const fn kw_starts(name: &'static str) -> TokenTypeInfo {
    TokenTypeInfo { label: name, keyword: Some(name), starts_expr: true, ..BASE }
}

const fn kw_prefix(name: &'static str) -> TokenTypeInfo {
    TokenTypeInfo {
        label: name,
        keyword: Some(name),
        before_expr: true,
        starts_expr: true,
        prefix: true,
        ..BASE
    }
}

/// The kind of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TokenType {
    // === Literals and names ===
    Num,
    BigInt,
    Regexp,
    String,
    Name,
    Eof,

    // === Punctuation ===
    BracketL,
    BracketR,
    BraceL,
    BraceR,
    ParenL,
    ParenR,
    Comma,
    Semi,
    Colon,
    Dot,
    Question,
    Arrow,
    Template,
    InvalidTemplate,
    Ellipsis,
    BackQuote,
    DollarBraceL,

    // === Operators ===
    /// `=`
    Eq,
    /// `+=`, `-=`, `>>>=`, ...
    Assign,
    /// `++`, `--`
    IncDec,
    /// `!`, `~`
    Prefix,
    LogicalOr,
    LogicalAnd,
    Coalesce,
    BitwiseOr,
    BitwiseXor,
    BitwiseAnd,
    /// `==`, `!=`, `===`, `!==`
    Equality,
    /// `<`, `>`, `<=`, `>=`
    Relational,
    /// `<<`, `>>`, `>>>`
    BitShift,
    /// `+`, `-`
    PlusMin,
    Modulo,
    Star,
    Slash,
    StarStar,

    // === Keywords ===
    Break,
    Case,
    Catch,
    Continue,
    Debugger,
    Default,
    Do,
    Else,
    Finally,
    For,
    Function,
    If,
    Return,
    Switch,
    Throw,
    Try,
    Var,
    Const,
    While,
    With,
    New,
    This,
    Super,
    Class,
    Extends,
    Export,
    Import,
    Null,
    True,
    False,
    In,
    Instanceof,
    Typeof,
    Void,
    Delete,
}

impl TokenType {
    /// Grammar metadata for this token type.
    pub const fn info(self) -> TokenTypeInfo {
        use TokenType::*;
        match self {
            Num | BigInt | Regexp | String | Name => starts(match self {
                Num => "num",
                BigInt => "bigint",
                Regexp => "regexp",
                String => "string",
                _ => "name",
            }),
            Eof => plain("eof"),

            BracketL => before_starts("["),
            BracketR => plain("]"),
            BraceL => before_starts("{"),
            BraceR => plain("}"),
            ParenL => before_starts("("),
            ParenR => plain(")"),
            Comma => before(","),
            Semi => before(";"),
            Colon => before(":"),
            Dot => plain("."),
            Question => before("?"),
            Arrow => before("=>"),
            Template => plain("template"),
            InvalidTemplate => plain("invalidTemplate"),
            Ellipsis => before("..."),
            BackQuote => starts("`"),
            DollarBraceL => before_starts("${"),

            Eq => TokenTypeInfo { label: "=", before_expr: true, is_assign: true, ..BASE },
            Assign => TokenTypeInfo { label: "_=", before_expr: true, is_assign: true, ..BASE },
            IncDec => TokenTypeInfo {
                label: "++/--",
                prefix: true,
                postfix: true,
                starts_expr: true,
                ..BASE
            },
            Prefix => TokenTypeInfo {
                label: "!/~",
                before_expr: true,
                prefix: true,
                starts_expr: true,
                ..BASE
            },
            LogicalOr => binop("||", 1),
            LogicalAnd => binop("&&", 2),
            Coalesce => binop("??", 1),
            BitwiseOr => binop("|", 3),
            BitwiseXor => binop("^", 4),
            BitwiseAnd => binop("&", 5),
            Equality => binop("==/!=/===/!==", 6),
            Relational => binop("</>/<=/>=", 7),
            BitShift => binop("<</>>/>>>", 8),
            PlusMin => TokenTypeInfo {
                label: "+/-",
                before_expr: true,
                binop: Some(9),
                prefix: true,
                starts_expr: true,
                ..BASE
            },
            Modulo => binop("%", 10),
            Star => binop("*", 10),
            Slash => binop("/", 10),
            StarStar => before("**"),

            Break => kw("break"),
            Case => kw_before("case"),
            Catch => kw("catch"),
            Continue => kw("continue"),
            Debugger => kw("debugger"),
            Default => kw_before("default"),
            Do => TokenTypeInfo { is_loop: true, ..kw_before("do") },
            Else => kw_before("else"),
            Finally => kw("finally"),
            For => TokenTypeInfo { is_loop: true, ..kw("for") },
            Function => kw_starts("function"),
            If => kw("if"),
            Return => kw_before("return"),
            Switch => kw("switch"),
            Throw => kw_before("throw"),
            Try => kw("try"),
            Var => kw("var"),
            Const => kw("const"),
            While => TokenTypeInfo { is_loop: true, ..kw("while") },
            With => kw("with"),
            New => TokenTypeInfo { before_expr: true, ..kw_starts("new") },
            This => kw_starts("this"),
            Super => kw_starts("super"),
            Class => kw_starts("class"),
            Extends => kw_before("extends"),
            Export => kw("export"),
            Import => kw_starts("import"),
            Null => kw_starts("null"),
            True => kw_starts("true"),
            False => kw_starts("false"),
            In => TokenTypeInfo { binop: Some(7), ..kw_before("in") },
            Instanceof => TokenTypeInfo { binop: Some(7), ..kw_before("instanceof") },
            Typeof => kw_prefix("typeof"),
            Void => kw_prefix("void"),
            Delete => kw_prefix("delete"),
        }
    }

    #[inline]
    pub const fn label(self) -> &'static str {
        self.info().label
    }

    #[inline]
    pub const fn keyword(self) -> Option<&'static str> {
        self.info().keyword
    }

    #[inline]
    pub const fn before_expr(self) -> bool {
        self.info().before_expr
    }

    #[inline]
    pub const fn starts_expr(self) -> bool {
        self.info().starts_expr
    }

    #[inline]
    pub const fn is_loop(self) -> bool {
        self.info().is_loop
    }

    #[inline]
    pub const fn is_assign(self) -> bool {
        self.info().is_assign
    }

    #[inline]
    pub const fn binop(self) -> Option<u8> {
        self.info().binop
    }

    #[inline]
    pub const fn is_keyword(self) -> bool {
        self.info().keyword.is_some()
    }
}

impl std::fmt::Display for TokenType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Look up the keyword token type for a word.
///
/// This ignores the ECMAScript version; [`is_keyword`] decides whether the
/// word is a keyword in the active grammar.
pub fn keyword_from_str(word: &str) -> Option<TokenType> {
    let ty = match word {
        "break" => TokenType::Break,
        "case" => TokenType::Case,
        "catch" => TokenType::Catch,
        "continue" => TokenType::Continue,
        "debugger" => TokenType::Debugger,
        "default" => TokenType::Default,
        "do" => TokenType::Do,
        "else" => TokenType::Else,
        "finally" => TokenType::Finally,
        "for" => TokenType::For,
        "function" => TokenType::Function,
        "if" => TokenType::If,
        "return" => TokenType::Return,
        "switch" => TokenType::Switch,
        "throw" => TokenType::Throw,
        "try" => TokenType::Try,
        "var" => TokenType::Var,
        "const" => TokenType::Const,
        "while" => TokenType::While,
        "with" => TokenType::With,
        "new" => TokenType::New,
        "this" => TokenType::This,
        "super" => TokenType::Super,
        "class" => TokenType::Class,
        "extends" => TokenType::Extends,
        "export" => TokenType::Export,
        "import" => TokenType::Import,
        "null" => TokenType::Null,
        "true" => TokenType::True,
        "false" => TokenType::False,
        "in" => TokenType::In,
        "instanceof" => TokenType::Instanceof,
        "typeof" => TokenType::Typeof,
        "void" => TokenType::Void,
        "delete" => TokenType::Delete,
        _ => return None,
    };
    Some(ty)
}

/// Whether `word` is a keyword for the given ECMAScript version.
pub fn is_keyword(word: &str, ecma_version: u32) -> bool {
    match word {
        "const" | "class" | "extends" | "export" | "import" | "super" => ecma_version >= 6,
        _ => keyword_from_str(word).is_some(),
    }
}

const RESERVED_3: &[&str] = &[
    "abstract", "boolean", "byte", "char", "class", "double", "enum", "export", "extends", "final",
    "float", "goto", "implements", "import", "int", "interface", "long", "native", "package",
    "private", "protected", "public", "short", "static", "super", "synchronized", "throws",
    "transient", "volatile",
];
const RESERVED_5: &[&str] = &["class", "enum", "extends", "super", "const", "export", "import"];
const RESERVED_6: &[&str] = &["enum"];
const RESERVED_STRICT: &[&str] = &[
    "implements", "interface", "let", "package", "private", "protected", "public", "static", "yield",
];
const RESERVED_STRICT_BIND: &[&str] = &["eval", "arguments"];

/// Reserved-word sets for one parse, fixed by version, source type, and
/// the `allowReserved` option.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ReservedWords {
    base: &'static [&'static str],
    module_await: bool,
}

impl ReservedWords {
    pub(crate) fn new(ecma_version: u32, module: bool, enforce: bool) -> Self {
        if !enforce {
            return Self { base: &[], module_await: module };
        }
        let base = if ecma_version >= 6 {
            RESERVED_6
        } else if ecma_version >= 5 {
            RESERVED_5
        } else {
            RESERVED_3
        };
        Self { base, module_await: module }
    }

    /// Reserved outside strict mode.
    pub(crate) fn is_reserved(&self, word: &str) -> bool {
        self.base.contains(&word) || (self.module_await && word == "await")
    }

    /// Reserved in strict mode.
    pub(crate) fn is_reserved_strict(&self, word: &str) -> bool {
        self.is_reserved(word) || RESERVED_STRICT.contains(&word)
    }

    /// May not be bound in strict mode (adds `eval` and `arguments`).
    pub(crate) fn is_reserved_strict_bind(&self, word: &str) -> bool {
        self.is_reserved_strict(word) || RESERVED_STRICT_BIND.contains(&word)
    }
}

/// A regular expression literal's source parts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegexValue {
    pub pattern: String,
    pub flags: String,
}

/// The value carried by a token.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TokenValue {
    None,
    /// Identifier name, string contents, operator text, or cooked template text.
    Str(String),
    Num(f64),
    /// BigInt digits without the `n` suffix.
    BigInt(String),
    Regex(RegexValue),
}

impl TokenValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            TokenValue::Str(s) | TokenValue::BigInt(s) => Some(s),
            _ => None,
        }
    }

    /// True when this is a string value equal to `s`.
    #[inline]
    pub fn is(&self, s: &str) -> bool {
        self.as_str() == Some(s)
    }
}

/// A scanned token.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Token {
    #[serde(rename = "type")]
    pub ty: TokenType,
    pub value: TokenValue,
    pub start: usize,
    pub end: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loc: Option<SourceLocation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range: Option<(usize, usize)>,
}

impl Token {
    pub fn span(&self) -> Span {
        Span::new(self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_metadata() {
        assert_eq!(TokenType::LogicalOr.binop(), Some(1));
        assert_eq!(TokenType::Star.binop(), Some(10));
        assert_eq!(TokenType::In.binop(), Some(7));
        assert!(TokenType::Eq.is_assign());
        assert!(TokenType::While.is_loop());
        assert!(TokenType::IncDec.info().postfix);
        assert!(TokenType::Return.before_expr());
        assert!(!TokenType::ParenR.before_expr());
        assert_eq!(TokenType::Typeof.keyword(), Some("typeof"));
        assert_eq!(TokenType::Name.keyword(), None);
    }

    #[test]
    fn test_keyword_lookup() {
        assert_eq!(keyword_from_str("instanceof"), Some(TokenType::Instanceof));
        assert_eq!(keyword_from_str("let"), None);
        assert!(is_keyword("class", 6));
        assert!(!is_keyword("class", 5));
        assert!(is_keyword("while", 3));
    }

    #[test]
    fn test_reserved_words() {
        let es5 = ReservedWords::new(5, false, true);
        assert!(es5.is_reserved("enum"));
        assert!(!es5.is_reserved("let"));
        assert!(es5.is_reserved_strict("let"));
        assert!(es5.is_reserved_strict_bind("eval"));

        let module = ReservedWords::new(11, true, true);
        assert!(module.is_reserved("await"));

        let relaxed = ReservedWords::new(11, false, false);
        assert!(!relaxed.is_reserved("enum"));
    }
}
