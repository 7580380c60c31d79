//! Fatal, recoverable, and unsupported-construct errors.

use std::cell::RefCell;
use std::rc::Rc;

use esparse::{
    parse, validate_regexp, AllowReserved, Callbacks, EcmaVersion, Error, Options, Parser, Position, RegExpError,
    MAX_NESTING,
};

fn fatal(src: &str) -> Error {
    parse(src, Options::default()).expect_err(src)
}

fn recoverable(options: Options, src: &str) -> Vec<String> {
    let mut parser = Parser::new(options, src);
    parser.parse().unwrap_or_else(|e| panic!("{src}: {e}"));
    parser.recoverable_errors().iter().map(|e| e.message.clone()).collect()
}

#[test]
fn test_fatal_error_carries_position() {
    let err = fatal("let a = 1;\nlet a = 2;");
    let Error::Syntax(syntax) = &err else { panic!("{err:?}") };
    assert_eq!(syntax.message, "Identifier 'a' has already been declared");
    assert_eq!(syntax.pos, 15);
    assert_eq!(syntax.loc, Position::new(2, 4));
    assert_eq!(err.to_string(), "Identifier 'a' has already been declared (2:4)");
    assert_eq!(err.pos(), 15);
}

#[test]
fn test_unexpected_token() {
    let err = fatal("a +");
    assert_eq!(err.message(), "Unexpected token");
    assert_eq!(err.pos(), 3);
}

#[test]
fn test_unsupported_constructs_are_distinct() {
    for (src, construct) in [
        ("a?.b", "optional chaining"),
        ("class A { #x() {} }", "private name"),
        ("class A { x = 1 }", "class fields"),
        ("@dec class A {}", "decorator"),
    ] {
        match fatal(src) {
            Error::Unsupported { construct: found, .. } => assert_eq!(found, construct, "{src}"),
            other => panic!("{src}: expected unsupported, got {other:?}"),
        }
    }
    assert!(matches!(fatal("import('m')"), Error::Unsupported { .. }));
    let err = fatal("a?.b");
    assert!(err.to_string().starts_with("Unsupported syntax: optional chaining"));
    // A ternary with a numeric consequent is still ordinary syntax.
    assert!(parse("a?.5:1", Options::default()).is_ok());
}

#[test]
fn test_recoverable_errors_reach_callback() {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    let callbacks = Callbacks::new().on_recoverable(move |err| sink.borrow_mut().push(err.message.clone()));
    let program = Parser::new(Options::default(), "'use strict'; eval = 1; 010;")
        .with_callbacks(callbacks)
        .parse();
    assert!(program.is_ok());
    assert_eq!(*seen.borrow(), ["Assigning to eval in strict mode", "Octal literal in strict mode"]);
}

#[test]
fn test_strict_mode_recoverable_checks() {
    assert_eq!(recoverable(Options::default(), "'use strict'; delete x;"), ["Deleting local variable in strict mode"]);
    assert_eq!(recoverable(Options::default(), "'use strict'; function f(a, a) {}"), ["Argument name clash"]);
    assert_eq!(recoverable(Options::default(), "function f(a, [a]) {}"), ["Argument name clash"]);
    assert!(recoverable(Options::default(), "function f(a, a) {}").is_empty());
    assert_eq!(recoverable(Options::default(), "({ __proto__: 1, __proto__: 2 })"), ["Redefinition of __proto__ property"]);
}

#[test]
fn test_regex_errors() {
    let err = fatal("/(/");
    assert!(err.message().starts_with("Invalid regular expression: /(/: "), "{err}");
    assert_eq!(recoverable(Options::default(), "/a/gg"), ["Duplicate regular expression flag"]);
    assert_eq!(recoverable(Options::default(), "/a/x"), ["Invalid regular expression flag"]);
    let es5 = Options::default().with_ecma_version(EcmaVersion::ES5);
    assert_eq!(recoverable(es5, "/a/u"), ["Invalid regular expression flag"]);
}

#[test]
fn test_validate_regexp_directly() {
    let state = validate_regexp(r"(?<n>a)\k<n>", "u", 9).unwrap();
    assert_eq!(state.num_capturing_parens, 1);
    assert!(state.group_names.contains("n"));

    assert_eq!(validate_regexp("a", "gg", 11).unwrap_err(), RegExpError::DuplicateFlag);
    assert_eq!(validate_regexp("(", "gg", 11).unwrap_err(), RegExpError::DuplicateFlag);
    assert!(matches!(validate_regexp(r"(?<n>a)(?<n>b)", "", 9), Err(RegExpError::Pattern { .. })));
    assert!(validate_regexp(r"\p{Letter}", "u", 9).is_ok());
}

#[test]
fn test_untagged_template_escape_is_fatal() {
    assert_eq!(fatal(r"`\unicode`").message(), "Bad escape sequence in untagged template literal");
    assert!(parse(r"tag`\unicode`", Options::default()).is_ok());
}

#[test]
fn test_module_errors() {
    let module = Options::default().module();
    let err = parse("export { missing };", module.clone()).unwrap_err();
    assert_eq!(err.message(), "Export 'missing' is not defined");
    assert_eq!(err.pos(), 9);
    let err = parse("export let a; export { a };", module).unwrap_err();
    assert_eq!(err.message(), "Duplicate export 'a'");
}

#[test]
fn test_allow_reserved_never_rejects_property_names() {
    let never = Options::default().with_allow_reserved(AllowReserved::Never);
    assert!(recoverable(Options::default(), "a.enum").is_empty());
    assert_eq!(recoverable(never, "a.enum"), ["The keyword 'enum' is reserved"]);
}

#[test]
fn test_await_at_top_level() {
    assert!(parse("await x", Options::default()).is_err());
    let options = Options::default().with_allow_await_outside_function(true);
    let program = parse("await x", options).unwrap();
    let json = serde_json::to_value(&program).unwrap();
    assert_eq!(json["body"][0]["expression"]["type"], "AwaitExpression");
}

fn with_stack<T: Send + 'static>(run: impl FnOnce() -> T + Send + 'static) -> T {
    std::thread::Builder::new()
        .stack_size(8 << 20)
        .spawn(run)
        .unwrap()
        .join()
        .unwrap()
}

#[test]
fn test_deep_nesting_fails_cleanly() {
    with_stack(|| {
        let depth = MAX_NESTING as usize + 10;
        for src in [
            format!("{}x{}", "(".repeat(3000), ")".repeat(3000)),
            format!("{}{}", "{".repeat(depth), "}".repeat(depth)),
            format!("{}x", "!".repeat(depth)),
            format!("{}x", "new ".repeat(depth)),
            format!("var {}x{} = y;", "[".repeat(depth), "]".repeat(depth)),
        ] {
            let err = parse(&src, Options::default()).unwrap_err();
            assert_eq!(err.message(), "Nesting is too deep", "{}", &src[..20]);
        }

        let shallow = format!("{}x{}", "(".repeat(100), ")".repeat(100));
        assert!(parse(&shallow, Options::default()).is_ok());
        let long_chain = vec!["a"; 10_000].join(" + ");
        assert!(parse(&long_chain, Options::default()).is_ok());
    });
}
