//! JSON Schema for level documents, derived from the content types.

use jsonschema::JSONSchema;
use sandbox_core::{LevelPack, Violation};
use serde_json::Value;

use crate::LoadError;

/// Schema for one `level{n}.json` document.
pub fn level_schema() -> Result<Value, LoadError> {
    let root = schemars::schema_for!(LevelPack);
    let mut value =
        serde_json::to_value(&root).map_err(|e| LoadError::SchemaBuild(e.to_string()))?;
    strip_numeric_formats(&mut value);
    Ok(value)
}

/// Compile the level schema once for repeated validation.
pub fn compile_level_schema() -> Result<JSONSchema, LoadError> {
    let schema = level_schema()?;
    JSONSchema::compile(&schema).map_err(|e| LoadError::SchemaBuild(e.to_string()))
}

/// Every schema violation in `instance`, in validator order.
pub fn schema_violations(schema: &JSONSchema, instance: &Value) -> Vec<Violation> {
    match schema.validate(instance) {
        Ok(()) => Vec::new(),
        Err(errors) => errors
            .map(|e| Violation::new(e.instance_path.to_string(), &e))
            .collect(),
    }
}

// schemars annotates integer fields with Rust width formats ("uint32");
// they carry no validation meaning for content authors.
fn strip_numeric_formats(value: &mut Value) {
    match value {
        Value::Object(map) => {
            let numeric = map
                .get("format")
                .and_then(Value::as_str)
                .map(|f| {
                    f.starts_with("uint")
                        || f.starts_with("int")
                        || f == "float"
                        || f == "double"
                })
                .unwrap_or(false);
            if numeric {
                map.remove("format");
            }
            for v in map.values_mut() {
                strip_numeric_formats(v);
            }
        }
        Value::Array(items) => {
            for v in items {
                strip_numeric_formats(v);
            }
        }
        _ => {}
    }
}
