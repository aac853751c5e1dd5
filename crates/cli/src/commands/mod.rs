//! Subcommand implementations

pub mod evaluation;
pub mod pipeline;
pub mod predictions;

use anyhow::{Context, Result};
use serde_json::Value;
use std::path::Path;

/// Read a JSON file holding either a bare array or an object wrapping one under `key`
///
/// Always returns the wrapped form, ready to post.
pub fn read_wrapped_array(path: &Path, key: &str) -> Result<Value> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let value: Value = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse {} as JSON", path.display()))?;

    match value {
        Value::Array(items) => Ok(serde_json::json!({ key: items })),
        Value::Object(ref map) if map.get(key).is_some_and(Value::is_array) => Ok(value),
        _ => anyhow::bail!(
            "{} must contain a JSON array or an object with a \"{}\" array",
            path.display(),
            key
        ),
    }
}
