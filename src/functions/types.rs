use indexmap::IndexMap;

use super::{filtering::type_argument, string_arg};
use crate::{
    ast::Atom,
    evaluator::{EvalContext, EvalError},
    value::{Value, is_type},
};

const STRUCTURE_DEFINITION_PREFIX: &str = "http://hl7.org/fhir/StructureDefinition/";

/// is(type) - one boolean per element
pub fn is(_: &EvalContext, input: &[Value], args: &[Atom]) -> Result<Value, EvalError> {
    let type_name = type_argument("is", args)?;
    Ok(Value::Collection(
        input
            .iter()
            .map(|item| Value::Boolean(is_type(item, &type_name)))
            .collect(),
    ))
}

/// as(type) - the elements of the given type
pub fn as_(_: &EvalContext, input: &[Value], args: &[Atom]) -> Result<Value, EvalError> {
    let type_name = type_argument("as", args)?;
    Ok(Value::Collection(
        input
            .iter()
            .filter(|item| is_type(item, &type_name))
            .cloned()
            .collect(),
    ))
}

fn type_descriptor(namespace: &str, name: &str) -> Value {
    let mut map = IndexMap::new();
    map.insert("namespace".to_string(), Value::from(namespace));
    map.insert("name".to_string(), Value::from(name));
    Value::Object(map)
}

/// type() - `{namespace, name}` for each element that can be classified
pub fn type_(_: &EvalContext, input: &[Value], _: &[Atom]) -> Result<Value, EvalError> {
    Ok(Value::Collection(
        input
            .iter()
            .filter_map(|item| match item {
                Value::Boolean(_) => Some(type_descriptor("System", "Boolean")),
                Value::Number(_) => Some(type_descriptor("System", "Integer")),
                Value::Object(_) => item
                    .resource_type()
                    .map(|resource_type| type_descriptor("FHIR", resource_type)),
                _ => None,
            })
            .collect(),
    ))
}

/// conformsTo(url) - compares each resource with a core StructureDefinition URL
pub fn conforms_to(ctx: &EvalContext, input: &[Value], args: &[Atom]) -> Result<Value, EvalError> {
    let url = string_arg(ctx, args.first(), &Value::empty(), "conformsTo")?.unwrap_or_default();
    let Some(expected) = url.strip_prefix(STRUCTURE_DEFINITION_PREFIX) else {
        return Err(EvalError::Argument(
            "Expected a StructureDefinition URL".to_string(),
        ));
    };
    Ok(Value::Collection(
        input
            .iter()
            .map(|item| Value::Boolean(item.resource_type() == Some(expected)))
            .collect(),
    ))
}
