//! Parameter validation against a tool's declared schema.

use chatvault_core::{Error, FieldViolation, Result};
use chatvault_registry::{ParamField, ParameterSpec};
use serde_json::{Map, Value};

/// Validate `parameters` against `spec` and apply declared defaults for
/// absent optional fields.
///
/// Every violation is collected before failing, so a caller sees the full
/// list of problems at once. Fields the schema does not declare pass
/// through untouched.
pub fn validate_parameters(spec: &ParameterSpec, parameters: &Value) -> Result<Value> {
    let object = match parameters {
        Value::Null => Map::new(),
        Value::Object(map) => map.clone(),
        _ => {
            return Err(Error::SchemaValidation {
                violations: vec![FieldViolation::new("parameters", "expected an object")],
            })
        }
    };

    let mut violations = Vec::new();

    for name in &spec.required {
        match object.get(name) {
            None | Some(Value::Null) => {
                violations.push(FieldViolation::new(name, "missing required field"));
            }
            Some(_) => {}
        }
    }

    for (name, value) in &object {
        if let Some(field) = spec.properties.get(name) {
            check_field(name, field, value, &mut violations);
        }
    }

    if !violations.is_empty() {
        return Err(Error::SchemaValidation { violations });
    }

    let mut normalized = object;
    for (name, field) in &spec.properties {
        if let Some(default) = &field.default {
            normalized
                .entry(name.clone())
                .or_insert_with(|| default.clone());
        }
    }

    Ok(Value::Object(normalized))
}

fn check_field(name: &str, field: &ParamField, value: &Value, violations: &mut Vec<FieldViolation>) {
    if value.is_null() {
        // Absent-or-null required fields are reported by the caller.
        return;
    }

    if !field.param_type.matches(value) {
        violations.push(FieldViolation::new(
            name,
            format!("expected {}", field.param_type.name()),
        ));
        return;
    }

    if let Some(allowed) = &field.enum_values {
        if !allowed.contains(value) {
            let options: Vec<String> = allowed.iter().map(|v| v.to_string()).collect();
            violations.push(FieldViolation::new(
                name,
                format!("must be one of {}", options.join(", ")),
            ));
        }
    }

    if let (Some(props), Value::Object(map)) = (&field.properties, value) {
        for (child_name, child_value) in map {
            if let Some(child_field) = props.get(child_name) {
                check_field(
                    &format!("{}.{}", name, child_name),
                    child_field,
                    child_value,
                    violations,
                );
            }
        }
    }
}
