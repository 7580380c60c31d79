//! Token streams from the tokenizer and the parser hooks.

use std::cell::RefCell;
use std::rc::Rc;

use esparse::{
    tokenizer, Callbacks, CommentKind, Options, Parser, Position, RegexValue, Token, TokenType, TokenValue,
};

fn scan(src: &str) -> Vec<Token> {
    tokenizer(src, Options::default()).collect::<Result<_, _>>().unwrap()
}

fn types(src: &str) -> Vec<TokenType> {
    scan(src).into_iter().map(|t| t.ty).collect()
}

fn parser_tokens(options: Options, src: &str) -> Vec<Token> {
    let sink = Rc::new(RefCell::new(Vec::new()));
    Parser::new(options, src)
        .with_callbacks(Callbacks::new().collect_tokens(Rc::clone(&sink)))
        .parse()
        .unwrap();
    let tokens = sink.borrow().clone();
    tokens
}

#[test]
fn test_division_or_regex_by_previous_token() {
    use TokenType::*;
    assert_eq!(types("(a)/x/g"), [ParenL, Name, ParenR, Slash, Name, Slash, Name, Eof]);
    assert_eq!(types("(/x/g"), [ParenL, Regexp, Eof]);
    assert_eq!(types("x = y / 2 / z"), [Name, Eq, Name, Slash, Num, Slash, Name, Eof]);
    assert_eq!(types("return /x/"), [Return, Regexp, Eof]);
    assert_eq!(types("}\n/x/"), [BraceR, Regexp, Eof]);
}

#[test]
fn test_tokenizer_is_deterministic() {
    let src = "const f = (a) => a / 2; f(/re/g, `t${1}`);";
    assert_eq!(scan(src), scan(src));
}

#[test]
fn test_parser_reports_every_token_once() {
    let src = "const f = (a, b) => a / b; f(/re/g, (c));";
    let from_parser = parser_tokens(Options::default(), src);
    assert_eq!(from_parser, scan(src));
    assert_eq!(from_parser.last().map(|t| t.ty), Some(TokenType::Eof));
}

#[test]
fn test_token_values() {
    let tokens = scan(r#"foo "b\x61r" 0x10 10n /a+/gi"#);
    assert_eq!(tokens[0].value, TokenValue::Str("foo".into()));
    assert_eq!(tokens[1].value, TokenValue::Str("bar".into()));
    assert_eq!(tokens[2].value, TokenValue::Num(16.0));
    assert_eq!(tokens[3].value, TokenValue::BigInt("10".into()));
    assert_eq!(
        tokens[4].value,
        TokenValue::Regex(RegexValue { pattern: "a+".into(), flags: "gi".into() })
    );
}

#[test]
fn test_token_positions() {
    let options = Options::default().with_locations(true).with_ranges(true);
    let tokens: Vec<_> = tokenizer("a\n  bc", options).map(Result::unwrap).collect();
    let bc = &tokens[1];
    assert_eq!((bc.start, bc.end), (4, 6));
    assert_eq!(bc.range, Some((4, 6)));
    let loc = bc.loc.as_ref().unwrap();
    assert_eq!(loc.start, Position::new(2, 2));
    assert_eq!(loc.end, Position::new(2, 4));
}

#[test]
fn test_non_ascii_offsets_are_bytes() {
    let src = "'é' + ü";
    let tokens = scan(src);
    assert_eq!(&src[tokens[0].start..tokens[0].end], "'é'");
    assert_eq!(&src[tokens[2].start..tokens[2].end], "ü");
}

#[test]
fn test_comments_collected_during_parse() {
    let comments = Rc::new(RefCell::new(Vec::new()));
    let callbacks = Callbacks::new().collect_comments(Rc::clone(&comments));
    Parser::new(Options::default(), "/* lead */ x; // trail\n")
        .with_callbacks(callbacks)
        .parse()
        .unwrap();
    let comments = comments.borrow();
    assert_eq!(comments.len(), 2);
    assert_eq!((comments[0].kind, comments[0].value.as_str()), (CommentKind::Block, " lead "));
    assert_eq!((comments[0].start, comments[0].end), (0, 10));
    assert_eq!((comments[1].kind, comments[1].value.as_str()), (CommentKind::Line, " trail"));
}

#[test]
fn test_trailing_comma_hook() {
    let commas = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&commas);
    Parser::new(Options::default(), "f(a, b,); [1,]; ({x,});")
        .with_callbacks(Callbacks::new().on_trailing_comma(move |pos, _| sink.borrow_mut().push(pos)))
        .parse()
        .unwrap();
    assert_eq!(*commas.borrow(), [6, 12, 19]);
}

#[test]
fn test_rejected_arrow_parameters_report_tokens_once() {
    // `(a, b)` is first tried as arrow parameters, then reparsed.
    let src = "(a, b)\n(c)";
    assert_eq!(parser_tokens(Options::default(), src), scan(src));
}
