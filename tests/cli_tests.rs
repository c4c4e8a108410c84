// tests/cli_tests.rs

use fhirpath_lang::{
    Quantity, Value,
    cli::{CliError, EvalOptions, EvalOutcome, execute_eval, json_to_value, parse_variable},
    output::{to_json, to_json_pretty},
};
use serde_json::json;

const PATIENT: &str = r#"{
    "resourceType": "Patient",
    "id": "example",
    "name": [{ "given": ["Alice", "Marie"], "family": "Smith" }],
    "deceasedBoolean": null
}"#;

fn options(expression: &str) -> EvalOptions {
    EvalOptions {
        expression: expression.to_string(),
        input: Some(PATIENT.to_string()),
        ..Default::default()
    }
}

fn success(outcome: EvalOutcome) -> Vec<Value> {
    match outcome {
        EvalOutcome::Success(values) => values,
        other => panic!("Expected success, got {:?}", other),
    }
}

// ============================================================================
// execute_eval
// ============================================================================

#[test]
fn test_eval_against_input() {
    let outcome = execute_eval(&options("Patient.name.given")).unwrap();
    assert_eq!(success(outcome), vec![Value::from("Alice"), Value::from("Marie")]);
}

#[test]
fn test_eval_without_input() {
    let outcome = execute_eval(&EvalOptions {
        expression: "1 + 2".to_string(),
        ..Default::default()
    })
    .unwrap();
    assert_eq!(success(outcome), vec![Value::Number(3.0)]);
}

#[test]
fn test_syntax_only_returns_canonical_form() {
    let outcome = execute_eval(&EvalOptions {
        expression: "Patient . name.given[ 0 ]".to_string(),
        syntax_only: true,
        ..Default::default()
    })
    .unwrap();
    assert_eq!(outcome, EvalOutcome::SyntaxValid("Patient.name.given[0]".to_string()));
}

#[test]
fn test_syntax_only_skips_input() {
    let outcome = execute_eval(&EvalOptions {
        expression: "name".to_string(),
        input: Some("not json".to_string()),
        syntax_only: true,
        ..Default::default()
    })
    .unwrap();
    assert!(matches!(outcome, EvalOutcome::SyntaxValid(_)));
}

#[test]
fn test_parse_error() {
    let error = execute_eval(&options("(2 + 1")).unwrap_err();
    assert!(matches!(error, CliError::Parse(_)));
    assert_eq!(error.to_string(), "Invalid expression: Parse error: expected `)`");
}

#[test]
fn test_eval_error() {
    let error = execute_eval(&options("name.given.single()")).unwrap_err();
    assert!(matches!(error, CliError::Eval(_)));
    assert!(error.to_string().starts_with("Evaluation failed: FhirPathError on"));
}

#[test]
fn test_invalid_json_input() {
    let mut opts = options("name");
    opts.input = Some("{ not json".to_string());
    assert!(matches!(execute_eval(&opts), Err(CliError::Json(_))));
}

#[test]
fn test_variables_are_bound() {
    let mut opts = options("name.given.where(length() > %min)");
    opts.variables = vec!["min=4".to_string()];
    assert_eq!(
        success(execute_eval(&opts).unwrap()),
        vec![Value::from("Alice"), Value::from("Marie")]
    );

    let mut opts = options("%greeting & ' ' & name.given.first()");
    opts.variables = vec!["%greeting=hello".to_string()];
    assert_eq!(success(execute_eval(&opts).unwrap()), vec![Value::from("hello Alice")]);
}

#[test]
fn test_strict_mode() {
    let mut opts = options("name.where(given)");
    assert_eq!(success(execute_eval(&opts).unwrap()).len(), 1);

    opts.strict = true;
    assert!(matches!(execute_eval(&opts), Err(CliError::Eval(_))));
}

#[test]
fn test_null_properties_are_absent() {
    let outcome = execute_eval(&options("deceased.exists()")).unwrap();
    assert_eq!(success(outcome), vec![Value::Boolean(false)]);
}

// ============================================================================
// parse_variable
// ============================================================================

#[test]
fn test_parse_variable() {
    assert_eq!(parse_variable("n=5").unwrap(), ("n".to_string(), Value::Number(5.0)));
    assert_eq!(
        parse_variable("%flag=true").unwrap(),
        ("flag".to_string(), Value::Boolean(true))
    );
    assert_eq!(
        parse_variable("s=plain text").unwrap(),
        ("s".to_string(), Value::from("plain text"))
    );
    assert_eq!(
        parse_variable("s=\"quoted\"").unwrap(),
        ("s".to_string(), Value::from("quoted"))
    );
    assert_eq!(
        parse_variable("xs=[1,2]").unwrap(),
        ("xs".to_string(), Value::from(json!([1, 2])))
    );
    assert_eq!(
        parse_variable("eq=a=b").unwrap(),
        ("eq".to_string(), Value::from("a=b"))
    );
}

#[test]
fn test_parse_variable_errors() {
    assert!(matches!(parse_variable("novalue"), Err(CliError::InvalidVariable(_))));
    assert!(matches!(parse_variable("=5"), Err(CliError::InvalidVariable(_))));
}

// ============================================================================
// JSON conversion and output
// ============================================================================

#[test]
fn test_json_to_value_drops_nulls() {
    let value = json_to_value(json!({ "a": null, "b": [1, null, 2], "c": "x" }));
    assert_eq!(to_json(&value), r#"{"b":[1,2],"c":"x"}"#);
    assert_eq!(json_to_value(json!(null)), Value::empty());
}

#[test]
fn test_object_keys_keep_document_order() {
    let value = json_to_value(json!({ "zeta": 1, "alpha": 2, "mid": 3 }));
    assert_eq!(to_json(&value), r#"{"zeta":1,"alpha":2,"mid":3}"#);
}

#[test]
fn test_to_json_numbers() {
    assert_eq!(to_json(&Value::Number(42.0)), "42");
    assert_eq!(to_json(&Value::Number(-0.5)), "-0.5");
    assert_eq!(
        to_json(&Value::Collection(vec![Value::Number(1.0), Value::from("a"), Value::Boolean(true)])),
        r#"[1,"a",true]"#
    );
}

#[test]
fn test_to_json_quantity() {
    let quantity = Value::Quantity(Quantity::new(5.0, "mg"));
    assert_eq!(to_json(&quantity), r#"{"value":5,"unit":"mg"}"#);
}

#[test]
fn test_to_json_pretty() {
    let value = Value::Collection(vec![Value::from("Alice")]);
    assert_eq!(to_json_pretty(&value), "[\n  \"Alice\"\n]");
}
