//! Tag flattening.
//!
//! Tags normally arrive as a JSON object. Some producers hand them over as a
//! serialized string instead; that string is parsed as JSON and never
//! evaluated.

use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::error::{PipelineError, Result};

/// Flatten an element's tag collection into string key/value pairs.
///
/// `None` and `null` yield an empty map.
pub fn flatten_tags(tags: Option<&Value>) -> Result<BTreeMap<String, String>> {
    match tags {
        None | Some(Value::Null) => Ok(BTreeMap::new()),
        Some(Value::Object(map)) => Ok(flatten_object(map)),
        Some(Value::String(raw)) => {
            let parsed: Value =
                serde_json::from_str(raw).map_err(|e| PipelineError::parse("tag string", e))?;
            match parsed {
                Value::Object(map) => Ok(flatten_object(&map)),
                Value::Null => Ok(BTreeMap::new()),
                other => Err(PipelineError::parse(
                    "tag string",
                    format!("expected an object, got {}", kind_of(&other)),
                )),
            }
        }
        Some(other) => Err(PipelineError::parse(
            "tags",
            format!("expected an object, got {}", kind_of(other)),
        )),
    }
}

fn flatten_object(map: &Map<String, Value>) -> BTreeMap<String, String> {
    map.iter()
        .map(|(k, v)| (k.clone(), value_to_string(v)))
        .collect()
}

fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        // Numbers, bools and nested values keep their JSON text
        other => other.to_string(),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
