// tests/parser_tests.rs

use fhirpath_lang::{
    Atom, BinOp, ParseError, Value,
    parser::{parse, unescape},
};

fn parse_atom(source: &str) -> Atom {
    parse(source)
        .unwrap_or_else(|e| panic!("Failed to parse {:?}: {}", source, e))
        .child
}

fn parse_err(source: &str) -> ParseError {
    match parse(source) {
        Ok(program) => panic!("Expected parse error for {:?}, got {}", source, program),
        Err(e) => e,
    }
}

/// Re-rendered source, which shows where the parser put the parentheses.
fn render(source: &str) -> String {
    parse_atom(source).to_string()
}

// ============================================================================
// Literals
// ============================================================================

#[test]
fn test_parse_literals() {
    assert!(matches!(parse_atom("'hello'"), Atom::Literal(Value::String(s)) if s == "hello"));
    assert!(matches!(parse_atom("42"), Atom::Literal(Value::Number(n)) if n == 42.0));
    assert!(matches!(parse_atom("true"), Atom::Literal(Value::Boolean(true))));
    assert!(matches!(parse_atom("false"), Atom::Literal(Value::Boolean(false))));
    assert!(matches!(parse_atom("{}"), Atom::EmptySet));
}

#[test]
fn test_parse_string_escapes() {
    assert!(matches!(parse_atom(r"'it\'s'"), Atom::Literal(Value::String(s)) if s == "it's"));
    assert!(matches!(parse_atom(r"'a\nb'"), Atom::Literal(Value::String(s)) if s == "a\nb"));
    assert!(matches!(parse_atom(r"'A'"), Atom::Literal(Value::String(s)) if s == "A"));
}

#[test]
fn test_unescape() {
    assert_eq!(unescape(r"tab\there"), "tab\there");
    assert_eq!(unescape(r"back\\slash"), r"back\slash");
    assert_eq!(unescape(r"\`tick\`"), "`tick`");
    assert_eq!(unescape("plain"), "plain");
}

#[test]
fn test_parse_quantities() {
    match parse_atom("5 'mg'") {
        Atom::Literal(Value::Quantity(q)) => {
            assert_eq!(q.value, 5.0);
            assert_eq!(q.unit, "mg");
        }
        other => panic!("Expected quantity literal, got {:?}", other),
    }

    match parse_atom("4 days") {
        Atom::Literal(Value::Quantity(q)) => {
            assert_eq!(q.value, 4.0);
            assert_eq!(q.unit, "{days}");
        }
        other => panic!("Expected quantity literal, got {:?}", other),
    }
}

#[test]
fn test_parse_date_literals() {
    assert!(matches!(parse_atom("@2024-01-15"), Atom::Literal(Value::String(s)) if s == "2024-01-15"));
    assert!(
        matches!(parse_atom("@2024-01-15T10:30:00Z"), Atom::Literal(Value::String(s)) if s == "2024-01-15T10:30:00.000Z")
    );
}

#[test]
fn test_parse_symbols() {
    assert!(matches!(parse_atom("Patient"), Atom::Symbol(s) if s == "Patient"));
    assert!(matches!(parse_atom("$this"), Atom::Symbol(s) if s == "$this"));
    assert!(matches!(parse_atom("%resource"), Atom::Symbol(s) if s == "%resource"));
    assert!(matches!(parse_atom("`given name`"), Atom::Symbol(s) if s == "given name"));
}

// ============================================================================
// Precedence and associativity
// ============================================================================

#[test]
fn test_multiplication_binds_tighter_than_addition() {
    match parse_atom("1 + 2 * 3") {
        Atom::Binary { op: BinOp::Add, right, .. } => {
            assert!(matches!(*right, Atom::Binary { op: BinOp::Multiply, .. }));
        }
        other => panic!("Expected addition at the root, got {:?}", other),
    }
}

#[test]
fn test_subtraction_is_left_associative() {
    match parse_atom("5 - 4 - 3") {
        Atom::Binary { op: BinOp::Subtract, left, right } => {
            assert!(matches!(*left, Atom::Binary { op: BinOp::Subtract, .. }));
            assert!(matches!(*right, Atom::Literal(Value::Number(n)) if n == 3.0));
        }
        other => panic!("Expected subtraction at the root, got {:?}", other),
    }
}

#[test]
fn test_navigation_is_left_associative() {
    match parse_atom("Patient.name.given") {
        Atom::Binary { op: BinOp::Dot, left, right } => {
            assert!(matches!(*left, Atom::Binary { op: BinOp::Dot, .. }));
            assert!(matches!(*right, Atom::Symbol(s) if s == "given"));
        }
        other => panic!("Expected navigation at the root, got {:?}", other),
    }
}

#[test]
fn test_rendering_adds_only_required_parentheses() {
    let test_cases = vec![
        ("1 + 2 * 3", "1 + 2 * 3"),
        ("(1 + 2) * 3", "(1 + 2) * 3"),
        ("1 - (2 - 3)", "1 - (2 - 3)"),
        ("(1 - 2) - 3", "1 - 2 - 3"),
        ("a and b or c", "a and b or c"),
        ("a and (b or c)", "a and (b or c)"),
        ("a implies b and c", "a implies b and c"),
        ("Patient.name.given", "Patient.name.given"),
        ("name.where(use = 'official')", "name.where(use = 'official')"),
        ("name[0].given", "name[0].given"),
        ("-(4 + 5)", "-(4 + 5)"),
        ("a | b = c", "a | b = c"),
    ];

    for (input, expected) in test_cases {
        assert_eq!(render(input), expected, "Failed for input: {}", input);
    }
}

#[test]
fn test_word_operators() {
    for (source, op) in [
        ("7 div 2", BinOp::Div),
        ("7 mod 2", BinOp::Mod),
        ("1 in a", BinOp::In),
        ("a contains 1", BinOp::Contains),
        ("a and b", BinOp::And),
        ("a or b", BinOp::Or),
        ("a xor b", BinOp::Xor),
        ("a implies b", BinOp::Implies),
    ] {
        match parse_atom(source) {
            Atom::Binary { op: parsed, .. } => assert_eq!(parsed, op, "Failed for: {}", source),
            other => panic!("Expected binary for {}, got {:?}", source, other),
        }
    }
}

// ============================================================================
// Calls, indexers and type operators
// ============================================================================

#[test]
fn test_parse_function_call() {
    match parse_atom("substring(1, 2)") {
        Atom::Function { name, args, .. } => {
            assert_eq!(name, "substring");
            assert_eq!(args.len(), 2);
        }
        other => panic!("Expected function call, got {:?}", other),
    }

    match parse_atom("exists()") {
        Atom::Function { args, .. } => assert!(args.is_empty()),
        other => panic!("Expected function call, got {:?}", other),
    }
}

#[test]
fn test_parse_indexer() {
    match parse_atom("name[1]") {
        Atom::Indexer { left, index } => {
            assert!(matches!(*left, Atom::Symbol(s) if s == "name"));
            assert!(matches!(*index, Atom::Literal(Value::Number(n)) if n == 1.0));
        }
        other => panic!("Expected indexer, got {:?}", other),
    }
}

#[test]
fn test_parse_is_and_as() {
    match parse_atom("value is Quantity") {
        Atom::Is { type_name, .. } => assert_eq!(type_name, "Quantity"),
        other => panic!("Expected is, got {:?}", other),
    }
    match parse_atom("value as FHIR.Quantity") {
        Atom::As { type_name, .. } => assert_eq!(type_name, "Quantity"),
        other => panic!("Expected as, got {:?}", other),
    }
    match parse_atom("true is System.Boolean") {
        Atom::Is { type_name, .. } => assert_eq!(type_name, "Boolean"),
        other => panic!("Expected is, got {:?}", other),
    }
}

#[test]
fn test_invalid_type_name() {
    assert!(matches!(parse_err("value is 'Quantity'"), ParseError::InvalidTypeName(_)));
}

// ============================================================================
// Errors
// ============================================================================

#[test]
fn test_unclosed_group() {
    let error = parse_err("(2 + 1");
    assert_eq!(error, ParseError::Expected(")".to_string()));
    assert_eq!(error.to_string(), "Parse error: expected `)`");
}

#[test]
fn test_no_prefix_parselet() {
    let error = parse_err("*");
    assert_eq!(
        error,
        ParseError::NoPrefixParselet {
            text: "*".to_string(),
            line: 1,
            column: 0
        }
    );
    assert_eq!(
        error.to_string(),
        "Parse error at \"*\" (line 1, column 0). No matching prefix parselet."
    );
}

#[test]
fn test_unexpected_end() {
    let error = parse_err("1 * ");
    assert_eq!(error, ParseError::UnexpectedEnd);
    assert_eq!(error.to_string(), "Cant consume unknown more tokens.");

    assert_eq!(parse_err(""), ParseError::UnexpectedEnd);
}

#[test]
fn test_unrecognized_function() {
    let error = parse_err("asdf()");
    assert_eq!(error, ParseError::UnrecognizedFunction("asdf".to_string()));
    assert_eq!(error.to_string(), "Unrecognized function: asdf");
}

#[test]
fn test_call_on_non_symbol() {
    let error = parse_err("1()");
    assert_eq!(error, ParseError::UnexpectedParentheses);
    assert_eq!(error.to_string(), "Unexpected parentheses");
}

#[test]
fn test_trailing_tokens_rejected() {
    assert!(matches!(
        parse_err("a b"),
        ParseError::UnexpectedToken { text, line: 1, column: 2 } if text == "b"
    ));
    assert!(matches!(parse_err("1 )"), ParseError::UnexpectedToken { .. }));
}

#[test]
fn test_unclosed_call_and_indexer() {
    assert_eq!(parse_err("first("), ParseError::UnexpectedEnd);
    assert_eq!(parse_err("name[0"), ParseError::Expected("]".to_string()));
    assert_eq!(parse_err("substring(1 2)"), ParseError::Expected(")".to_string()));
}

#[test]
fn test_other_token_has_no_prefix() {
    assert!(matches!(
        parse_err("#"),
        ParseError::NoPrefixParselet { text, .. } if text == "#"
    ));
}

// ============================================================================
// Programs
// ============================================================================

#[test]
fn test_program_keeps_source() {
    let program = parse("Patient.name  .given").expect("parse");
    assert_eq!(program.source, "Patient.name  .given");
    assert_eq!(program.to_string(), "Patient.name.given");
}

#[test]
fn test_rendered_source_reparses_to_same_rendering() {
    for source in [
        "Patient.name.where(use = 'official').given.first()",
        "(1 + 2) * -3",
        "iif(a > 1, 'big', 'small')",
        "value as Quantity > 5 'mg'",
        "a.b[2] | c.d",
        "5 'mg' + 4 days",
    ] {
        let rendered = render(source);
        assert_eq!(render(&rendered), rendered, "Failed for: {}", source);
    }
}
