// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde_json::Value;

use crate::config::{DataType, ValueConstraints};

/// Check a computed value against its feature's declared constraints.
///
/// Returns a human-readable reason on violation.
pub fn check_value(constraints: &ValueConstraints, value: &Value) -> Result<(), String> {
    if value.is_null() {
        return if constraints.required {
            Err("a value is required but null was returned".to_string())
        } else {
            Ok(())
        };
    }

    if !matches_datatype(constraints.datatype, value) {
        return Err(format!(
            "expected {} but got {}",
            constraints.datatype,
            json_type_name(value)
        ));
    }

    match value {
        Value::Number(_) => check_range(constraints, value, None),
        Value::Array(items) => items
            .iter()
            .enumerate()
            .filter(|(_, item)| item.is_number())
            .try_for_each(|(i, item)| check_range(constraints, item, Some(i))),
        _ => Ok(()),
    }
}

fn matches_datatype(datatype: DataType, value: &Value) -> bool {
    match datatype {
        DataType::Any => true,
        DataType::Number => value.is_number(),
        DataType::Integer => {
            value.is_i64()
                || value.is_u64()
                || value.as_f64().map(|v| v.fract() == 0.0).unwrap_or(false)
        }
        DataType::String => value.is_string(),
        DataType::Boolean => value.is_boolean(),
        DataType::Array => value.is_array(),
        DataType::Object => value.is_object(),
    }
}

fn check_range(constraints: &ValueConstraints, value: &Value, index: Option<usize>) -> Result<(), String> {
    let Some(number) = value.as_f64() else {
        return Ok(());
    };
    let location = index.map(|i| format!(" at index {}", i)).unwrap_or_default();

    if let Some(min) = constraints.min {
        if number < min {
            return Err(format!("{}{} is below minimum {}", number, location, min));
        }
    }
    if let Some(max) = constraints.max {
        if number > max {
            return Err(format!("{}{} is above maximum {}", number, location, max));
        }
    }
    Ok(())
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn constraints(datatype: DataType, min: Option<f64>, max: Option<f64>) -> ValueConstraints {
        ValueConstraints {
            datatype,
            min,
            max,
            required: true,
        }
    }

    #[test]
    fn test_datatype_checks() {
        let cases = vec![
            (DataType::Any, json!("x"), true),
            (DataType::Number, json!(1.5), true),
            (DataType::Number, json!("1.5"), false),
            (DataType::Integer, json!(3), true),
            (DataType::Integer, json!(3.0), true),
            (DataType::Integer, json!(3.5), false),
            (DataType::String, json!("abc"), true),
            (DataType::Boolean, json!(false), true),
            (DataType::Array, json!([1, 2]), true),
            (DataType::Array, json!({"a": 1}), false),
            (DataType::Object, json!({"a": 1}), true),
        ];

        for (datatype, value, ok) in cases {
            assert_eq!(
                check_value(&constraints(datatype, None, None), &value).is_ok(),
                ok,
                "{} vs {}",
                datatype,
                value
            );
        }
    }

    #[test]
    fn test_range_on_number() {
        let c = constraints(DataType::Number, Some(0.0), Some(10.0));
        assert!(check_value(&c, &json!(10.0)).is_ok());
        assert_eq!(
            check_value(&c, &json!(-1.0)).unwrap_err(),
            "-1 is below minimum 0"
        );
        assert!(check_value(&c, &json!(11)).is_err());
    }

    #[test]
    fn test_range_applies_to_array_elements() {
        let c = constraints(DataType::Array, Some(0.0), None);
        assert!(check_value(&c, &json!([1.0, null, 3.0])).is_ok());
        assert_eq!(
            check_value(&c, &json!([1.0, -2.5])).unwrap_err(),
            "-2.5 at index 1 is below minimum 0"
        );
    }

    #[test]
    fn test_required_rejects_null() {
        let mut c = constraints(DataType::Number, None, None);
        assert!(check_value(&c, &Value::Null).is_err());
        c.required = false;
        assert!(check_value(&c, &Value::Null).is_ok());
    }
}
