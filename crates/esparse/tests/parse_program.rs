//! Whole-program parses through the public API.

use esparse::{parse, parse_expression_at, EcmaVersion, Error, Node, NodeKind, Options, Parser, Position, SourceType};
use tracing_subscriber::EnvFilter;

const SAMPLE: &str = r#"
'use strict';
function fibonacci(n, memo = {}) {
    if (n <= 1) return n;
    return memo[n] || fibonacci(n - 1) + fibonacci(n - 2);
}

class Calculator extends Base {
    constructor(...args) {
        super(...args);
        this.result = 0;
    }
    static create() { return new.target ? null : new Calculator(); }
    get value() { return this.result ** 2; }
    set value(v) { this.result = v; }
    async *stream(url) {
        const response = await fetch(url);
        yield* response.chunks();
    }
}

const calc = new Calculator();
const numbers = [1, 2, 3, , 5].map((n, i) => n * i);
const { a, b: [c = 1, ...d], ...rest } = { a: 1, b: [], e: 3 };
const template = tag`Hello ${name}, you have ${count} messages`;
outer: for (const n of numbers) {
    for (let i = 0; i < n; i++) {
        if (i % 2) continue outer;
    }
}
try { JSON.parse("{") } catch ({ message }) { void message } finally {}
switch (typeof calc) { case "object": break; default: }
const re = /(?<year>\d{4})-\d{2}/u;
let x = a ?? b, y = async x => await x;
"#;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn body(program: &Node) -> &[Node] {
    match &program.kind {
        NodeKind::Program { body, .. } => body,
        _ => panic!("expected a Program"),
    }
}

fn assert_nested(node: &Node, len: usize) {
    assert!(node.start <= node.end && node.end <= len, "{} {}..{}", node.type_name(), node.start, node.end);
    for child in node.children() {
        assert!(
            node.start <= child.start && child.end <= node.end,
            "{} {}..{} escapes {} {}..{}",
            child.type_name(),
            child.start,
            child.end,
            node.type_name(),
            node.start,
            node.end
        );
        assert_nested(child, len);
    }
}

#[test]
fn test_sample_program_ranges_nest() {
    init_tracing();
    let source = SAMPLE;
    let program = parse(source, Options::default()).unwrap();
    assert_eq!(program.start, 0);
    assert_eq!(program.end, source.len());
    assert_nested(&program, source.len());

    let mut count = 0;
    program.walk(&mut |_| count += 1);
    assert!(count > 100, "only {count} nodes");
}

#[test]
fn test_parse_is_deterministic() {
    let first = parse(SAMPLE, Options::default().with_locations(true)).unwrap();
    let second = parse(SAMPLE, Options::default().with_locations(true)).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_asi_splits_statements() {
    let program = parse("a\nb", Options::default()).unwrap();
    let names: Vec<_> = body(&program)
        .iter()
        .map(|stmt| match &stmt.kind {
            NodeKind::ExpressionStatement { expression, .. } => expression.ident_name().unwrap(),
            _ => panic!(),
        })
        .collect();
    assert_eq!(names, ["a", "b"]);

    let options = Options::default().with_allow_return_outside_function(true);
    let program = parse("return\na", options).unwrap();
    let stmts = body(&program);
    assert!(matches!(stmts[0].kind, NodeKind::ReturnStatement { argument: None }));
    assert_eq!(stmts[1].type_name(), "ExpressionStatement");
}

#[test]
fn test_binding_rules() {
    assert!(parse("let x; let x;", Options::default()).is_err());
    assert!(parse("var x; let x;", Options::default()).is_err());
    let program = parse("var x; var x;", Options::default()).unwrap();
    assert_eq!(body(&program).len(), 2);
}

#[test]
fn test_repeated_block_function_in_sloppy_mode() {
    let program = parse("{ function f(){} function f(){} }", Options::default()).unwrap();
    let NodeKind::BlockStatement { body: stmts } = &body(&program)[0].kind else { panic!() };
    assert_eq!(stmts.len(), 2);

    let err = parse("'use strict'; { function f(){} function f(){} }", Options::default()).unwrap_err();
    assert_eq!(err.message(), "Identifier 'f' has already been declared");
    assert!(parse("{ function f(){} function f(){} }", Options::default().module()).is_err());
    assert!(parse("{ function f(){} let f; }", Options::default()).is_err());
}

#[test]
fn test_block_and_object_at_statement_start() {
    let program = parse("{}", Options::default()).unwrap();
    assert!(matches!(&body(&program)[0].kind, NodeKind::BlockStatement { body } if body.is_empty()));

    let program = parse("({})", Options::default()).unwrap();
    let NodeKind::ExpressionStatement { expression, .. } = &body(&program)[0].kind else { panic!() };
    assert!(matches!(&expression.kind, NodeKind::ObjectExpression { properties } if properties.is_empty()));
}

#[test]
fn test_strict_directive_detection() {
    assert!(Parser::new(Options::default(), "'use strict'; x = 1;").is_strict());
    assert!(Parser::new(Options::default(), "/* c */ 'use strict';").is_strict());
    assert!(!Parser::new(Options::default(), "x; 'use strict';").is_strict());
    assert!(Parser::new(Options::default().module(), "x").is_strict());

    let program = parse("'use strict'; x = 1;", Options::default()).unwrap();
    let NodeKind::ExpressionStatement { directive, .. } = &body(&program)[0].kind else { panic!() };
    assert_eq!(directive.as_deref(), Some("use strict"));
}

#[test]
fn test_module_program() {
    let source = "import { a } from './a.js';\nexport const b = a + 1;\nexport default class {}\n";
    let program = parse(source, Options::default().module()).unwrap();
    assert!(matches!(program.kind, NodeKind::Program { source_type: SourceType::Module, .. }));
    assert_eq!(body(&program).len(), 3);
    assert_nested(&program, source.len());
}

#[test]
fn test_locations_and_ranges() {
    let options = Options::default()
        .with_locations(true)
        .with_ranges(true)
        .with_source_file("input.js");
    let program = parse("a;\n  foo(bar);", options).unwrap();
    let call = &body(&program)[1];
    let loc = call.loc.as_ref().unwrap();
    assert_eq!(loc.start, Position::new(2, 2));
    assert_eq!(loc.end, Position::new(2, 11));
    assert_eq!(loc.source.as_deref(), Some("input.js"));
    assert_eq!(call.range, Some((5, 14)));
}

#[test]
fn test_columns_are_utf16_units() {
    let program = parse("'é😀'; x", Options::default().with_locations(true)).unwrap();
    let stmt = &body(&program)[1];
    assert_eq!(stmt.start, 10);
    assert_eq!(stmt.loc.as_ref().unwrap().start, Position::new(1, 7));
    assert_eq!(stmt.loc.as_ref().unwrap().end, Position::new(1, 8));

    let err = parse("'é😀'; )", Options::default()).unwrap_err();
    let Error::Syntax(syntax) = &err else { panic!("{err:?}") };
    assert_eq!((syntax.pos, syntax.loc), (10, Position::new(1, 7)));
}

#[test]
fn test_direct_source_file_wins() {
    let options = Options::default()
        .with_locations(true)
        .with_source_file("a.js")
        .with_direct_source_file("b.js");
    let program = parse("x", options).unwrap();
    assert_eq!(program.loc.unwrap().source.as_deref(), Some("b.js"));
}

#[test]
fn test_append_to_existing_program() {
    let input = "a;\nb;";
    let first = Parser::new(Options::default(), &input[..2]).parse().unwrap();
    let options = Options::default().with_locations(true);
    let combined = Parser::new_at(options, input, 3).unwrap().parse_into(first).unwrap();
    let stmts = body(&combined);
    assert_eq!(stmts.len(), 2);
    assert_eq!(stmts[1].start, 3);
    assert_eq!(stmts[1].loc.as_ref().unwrap().start, Position::new(2, 0));
    assert_eq!(combined.end, input.len());
}

#[test]
fn test_parse_expression_at_offset() {
    let input = "let x = a + b; rest";
    let expr = parse_expression_at(input, 8, Options::default()).unwrap();
    assert_eq!(expr.type_name(), "BinaryExpression");
    assert_eq!((expr.start, expr.end), (8, 13));
}

#[test]
fn test_offset_inside_a_character_is_rejected() {
    let err = parse_expression_at("é+1", 1, Options::default()).unwrap_err();
    assert!(matches!(err, Error::InvalidOffset { offset: 1, len: 4 }), "{err:?}");
    assert!(parse_expression_at("é+1", 9, Options::default()).is_err());
    assert!(Parser::new_at(Options::default(), "é+1", 1).is_err());

    let expr = parse_expression_at("é+1", 2, Options::default()).unwrap();
    assert_eq!(expr.type_name(), "UnaryExpression");
}

#[test]
fn test_preserve_parens() {
    let program = parse("(a)", Options::default().with_preserve_parens(true)).unwrap();
    let NodeKind::ExpressionStatement { expression, .. } = &body(&program)[0].kind else { panic!() };
    assert_eq!(expression.type_name(), "ParenthesizedExpression");

    let program = parse("(a)", Options::default()).unwrap();
    let NodeKind::ExpressionStatement { expression, .. } = &body(&program)[0].kind else { panic!() };
    assert_eq!(expression.type_name(), "Identifier");
    assert_eq!(expression.start, 1);
}

#[test]
fn test_hash_bang_line() {
    let options = Options::default().with_allow_hash_bang(true);
    let program = parse("#!/usr/bin/env node\nrun()", options).unwrap();
    assert_eq!(body(&program).len(), 1);
}

#[test]
fn test_ecma_version_gates_syntax() {
    let es5 = Options::default().with_ecma_version(EcmaVersion::ES5);
    assert!(parse("var f = function () {};", es5.clone()).is_ok());
    assert!(parse("const a = 1;", es5.clone()).is_err());
    assert!(parse("x => x", es5).is_err());

    let es2016 = Options::default().with_ecma_version(EcmaVersion::new(2016).unwrap());
    assert!(parse("2 ** 3", es2016.clone()).is_ok());
    assert!(parse("async function f() {}", es2016).is_err());
}

#[test]
fn test_estree_json_shape() {
    let program = parse("x = 1; /a/g;", Options::default()).unwrap();
    let json = serde_json::to_value(&program).unwrap();
    assert_eq!(json["type"], "Program");
    assert_eq!(json["sourceType"], "script");

    let assign = &json["body"][0]["expression"];
    assert_eq!(assign["type"], "AssignmentExpression");
    assert_eq!(assign["operator"], "=");
    assert_eq!(assign["left"]["name"], "x");
    assert_eq!(assign["right"]["value"], 1.0);
    assert_eq!(assign["right"]["raw"], "1");
    assert!(json["body"][0].get("directive").is_none());

    let regex = &json["body"][1]["expression"];
    assert!(regex["value"].is_null());
    assert_eq!(regex["regex"]["pattern"], "a");
    assert_eq!(regex["regex"]["flags"], "g");
}

#[test]
fn test_function_json_fields() {
    let program = parse("async function* f(a) {}", Options::default()).unwrap();
    let json = serde_json::to_value(&program).unwrap();
    let func = &json["body"][0];
    assert_eq!(func["type"], "FunctionDeclaration");
    assert_eq!(func["async"], true);
    assert_eq!(func["generator"], true);
    assert_eq!(func["id"]["name"], "f");
    assert_eq!(func["params"][0]["type"], "Identifier");
    assert_eq!(func["body"]["type"], "BlockStatement");
}
