// tests/property_tests.rs
//
// Laws that should hold for every value in a sample set rather than for one
// hand-picked case.

use fhirpath_lang::{
    EvalError, Quantity, Value, evaluate, functions,
    output::{to_json, to_literal},
    parse,
    value::{equals, equivalent},
};
use serde_json::json;

fn sample_scalars() -> Vec<Value> {
    vec![
        Value::Boolean(true),
        Value::Boolean(false),
        Value::Number(0.0),
        Value::Number(42.0),
        Value::Number(-2.25),
        Value::Number(1e-3),
        Value::String(String::new()),
        Value::String("plain".to_string()),
        Value::String("it's".to_string()),
        Value::String("back\\slash\nnew line".to_string()),
        Value::String("ünïcødé".to_string()),
        Value::Quantity(Quantity::new(5.0, "mg")),
        Value::Quantity(Quantity::new(1.5, "kg/m2")),
        Value::Quantity(Quantity::new(4.0, "{days}")),
        Value::Quantity(Quantity::new(1.0, "{year}")),
    ]
}

fn sample_collections() -> Vec<Value> {
    vec![
        Value::empty(),
        Value::from(json!([1, 2, 3])),
        Value::from(json!([1, 1, 2, 1])),
        Value::from(json!(["a", "A", "a"])),
        Value::from(json!([true, false, true])),
        Value::from(json!([{ "a": 1 }, { "a": 1 }, { "a": 2 }])),
    ]
}

// ============================================================================
// Literals
// ============================================================================

#[test]
fn test_literal_round_trip() {
    for value in sample_scalars() {
        let literal = to_literal(&value).expect("scalars have a literal form");
        let result = evaluate(&literal, &Value::empty())
            .unwrap_or_else(|e| panic!("Failed to evaluate {:?}: {}", literal, e));
        assert_eq!(result, vec![value.clone()], "Failed for literal: {}", literal);
    }
}

#[test]
fn test_no_literal_for_structures() {
    assert_eq!(to_literal(&Value::from(json!({ "a": 1 }))), None);
    assert_eq!(to_literal(&Value::from(json!([1, 2]))), None);
}

#[test]
fn test_rendering_is_stable() {
    for source in [
        "Patient.name.where(use = 'official').given.first()",
        "(1 + 2) * 3 - -4",
        "a implies (b or c) and d",
        "telecom.where(system = 'phone' and use != 'old').value",
        "iif(x is Integer, x + 1, {})",
        "%resource.entry[0].resource as Patient",
        "'it\\'s' & `odd name`",
    ] {
        let once = parse(source).expect("parse").to_string();
        let twice = parse(&once).expect("reparse").to_string();
        assert_eq!(once, twice, "Failed for: {}", source);
    }
}

// ============================================================================
// Equality
// ============================================================================

#[test]
fn test_equality_is_reflexive() {
    for value in sample_scalars().into_iter().chain(sample_collections()) {
        assert!(equals(&value, &value), "equals failed for {:?}", value);
        assert!(equivalent(&value, &value), "equivalent failed for {:?}", value);
    }
}

#[test]
fn test_equality_implies_equivalence() {
    let scalars = sample_scalars();
    for a in &scalars {
        for b in &scalars {
            if equals(a, b) {
                assert!(equivalent(a, b), "{:?} = {:?} but not ~", a, b);
            }
        }
    }
}

// ============================================================================
// Collections
// ============================================================================

#[test]
fn test_distinct_is_idempotent() {
    for collection in sample_collections() {
        let once = evaluate("distinct()", &Value::Collection(vec![collection.clone()]))
            .expect("distinct");
        let twice = evaluate("distinct().distinct()", &Value::Collection(vec![collection.clone()]))
            .expect("distinct twice");
        assert_eq!(once, twice, "Failed for: {}", to_json(&collection));
    }
}

#[test]
fn test_distinct_result_is_distinct() {
    for collection in sample_collections() {
        let input = Value::Collection(vec![collection.clone()]);
        let result = evaluate("distinct().isDistinct()", &input).expect("isDistinct");
        assert_eq!(result, vec![Value::Boolean(true)], "Failed for: {}", to_json(&collection));
    }
}

#[test]
fn test_union_count_is_symmetric() {
    let input = Value::from(json!({ "a": [1, 2, 2, 5], "b": [2, 3, 5, 7] }));
    assert_eq!(
        evaluate("(a | b).count()", &input).expect("a | b"),
        evaluate("(b | a).count()", &input).expect("b | a")
    );
    assert_eq!(
        evaluate("a.combine(b).count() = a.count() + b.count()", &input).expect("combine"),
        vec![Value::Boolean(true)]
    );
}

// ============================================================================
// Function arity
// ============================================================================

const CONVERSIONS: &[&str] = &[
    "toBoolean",
    "convertsToBoolean",
    "toInteger",
    "convertsToInteger",
    "toDecimal",
    "convertsToDecimal",
    "toQuantity",
    "convertsToQuantity",
    "toString",
    "convertsToString",
    "toDate",
    "convertsToDate",
    "toDateTime",
    "convertsToDateTime",
    "toTime",
    "convertsToTime",
];

#[test]
fn test_conversions_of_empty_are_empty() {
    for name in CONVERSIONS {
        let result = evaluate(&format!("{{}}.{}()", name), &Value::empty())
            .unwrap_or_else(|e| panic!("{}() failed on empty input: {}", name, e));
        assert!(result.is_empty(), "{}() should be empty, got {:?}", name, result);
    }
}

#[test]
fn test_conversions_reject_two_elements() {
    let input = Value::from(json!({ "xs": ["1", "2"] }));
    for name in CONVERSIONS {
        let error = match parse(&format!("xs.{}()", name)).expect("parse").evaluate(&input) {
            Ok(result) => panic!("{}() should fail, got {:?}", name, result),
            Err(e) => e,
        };
        assert_eq!(
            error.root_cause(),
            &EvalError::Arity(format!("Expected input length one for {}()", name))
        );
    }
}

#[test]
fn test_every_registered_function_parses() {
    let names = functions::names();
    assert!(names.len() > 70);
    for name in names {
        let source = format!("{}()", name);
        assert!(parse(&source).is_ok(), "Failed to parse {}", source);
    }
}
