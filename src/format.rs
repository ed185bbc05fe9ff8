use serde_json::{Map, Value};

/// A cell-ready value. Scalars keep their typing so the transpiler can apply
/// numeric display formats; composite values are rendered to a single string.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

/// Convert an arbitrary JSON value into a cell value.
///
/// Scalars pass through unchanged. Lists are rendered element-wise with null
/// elements dropped and the rest joined with `"; "`. Maps render as
/// `key=value` pairs joined with `";"`, except for the two-entry
/// `{"key": ..., "value": ...}` shape which renders as a single pair.
/// Total over any JSON input.
pub fn format_value(value: &Value) -> CellValue {
    match value {
        Value::Null => CellValue::Empty,
        Value::Bool(flag) => CellValue::Bool(*flag),
        Value::Number(number) => {
            if let Some(int) = number.as_i64() {
                CellValue::Int(int)
            } else {
                CellValue::Float(number.as_f64().unwrap_or_default())
            }
        }
        Value::String(text) => CellValue::Text(text.clone()),
        Value::Array(items) => CellValue::Text(render_list(items)),
        Value::Object(map) => CellValue::Text(render_map(map)),
    }
}

fn render(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::Bool(flag) => Some(flag.to_string()),
        Value::Number(number) => Some(number.to_string()),
        Value::String(text) => Some(text.clone()),
        Value::Array(items) => Some(render_list(items)),
        Value::Object(map) => Some(render_map(map)),
    }
}

fn render_list(items: &[Value]) -> String {
    items
        .iter()
        .filter_map(render)
        .collect::<Vec<_>>()
        .join("; ")
}

fn render_map(map: &Map<String, Value>) -> String {
    if map.len() == 2 && map.contains_key("key") && map.contains_key("value") {
        return format!(
            "{}={}",
            render(&map["key"]).unwrap_or_default(),
            render(&map["value"]).unwrap_or_default()
        );
    }
    map.iter()
        .map(|(key, value)| format!("{key}={}", render(value).unwrap_or_default()))
        .collect::<Vec<_>>()
        .join(";")
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn scalars_pass_through() {
        assert_eq!(format_value(&json!(null)), CellValue::Empty);
        assert_eq!(format_value(&json!(true)), CellValue::Bool(true));
        assert_eq!(format_value(&json!(42)), CellValue::Int(42));
        assert_eq!(format_value(&json!(1.5)), CellValue::Float(1.5));
        assert_eq!(
            format_value(&json!("text")),
            CellValue::Text("text".to_string())
        );
    }

    #[test]
    fn list_drops_nulls_and_joins() {
        assert_eq!(
            format_value(&json!(["a", null, "b"])),
            CellValue::Text("a; b".to_string())
        );
        assert_eq!(format_value(&json!([])), CellValue::Text(String::new()));
        assert_eq!(
            format_value(&json!([null, null])),
            CellValue::Text(String::new())
        );
    }

    #[test]
    fn key_value_map_renders_as_pair() {
        assert_eq!(
            format_value(&json!({"key": "x", "value": "y"})),
            CellValue::Text("x=y".to_string())
        );
    }

    #[test]
    fn generic_map_renders_entries() {
        assert_eq!(
            format_value(&json!({"k1": "v1", "k2": "v2"})),
            CellValue::Text("k1=v1;k2=v2".to_string())
        );
    }

    #[test]
    fn nested_values_render_recursively() {
        assert_eq!(
            format_value(&json!([{"key": "unit", "value": "mg"}, [1, 2]])),
            CellValue::Text("unit=mg; 1; 2".to_string())
        );
        assert_eq!(
            format_value(&json!({"tags": ["a", "b"], "flag": true})),
            CellValue::Text("tags=a; b;flag=true".to_string())
        );
    }
}
