//! Filtering JSON data by attribute globs

use super::glob::{AttributeGlob, NotationError};
use super::set::{is_allowed, parse_all};
use serde_json::{Map, Value};

/// Deep-clone `data`, keeping only the fields the globs allow.
///
/// Negations override wildcards (`["*", "!password"]` keeps everything but
/// `password`). Arrays met below the top level are walked element-wise with
/// the same path. An empty glob list, or data that is not an object, yields
/// an empty object.
pub fn filter<S: AsRef<str>>(data: &Value, globs: &[S]) -> Result<Value, NotationError> {
    if globs.is_empty() {
        return Ok(Value::Object(Map::new()));
    }
    let globs = parse_all(globs)?;
    Ok(filter_parsed(data, &globs))
}

/// Same as [`filter`], mapped over every element when `data` is an array
pub fn filter_all<S: AsRef<str>>(data: &Value, globs: &[S]) -> Result<Value, NotationError> {
    match data {
        Value::Array(items) => {
            if globs.is_empty() {
                return Ok(Value::Array(
                    items.iter().map(|_| Value::Object(Map::new())).collect(),
                ));
            }
            let globs = parse_all(globs)?;
            Ok(Value::Array(
                items.iter().map(|item| filter_parsed(item, &globs)).collect(),
            ))
        }
        other => filter(other, globs),
    }
}

fn filter_parsed(data: &Value, globs: &[AttributeGlob]) -> Value {
    match data {
        Value::Object(_) => {
            let mut path = Vec::new();
            filter_node(data, &mut path, globs).unwrap_or_else(|| Value::Object(Map::new()))
        }
        _ => Value::Object(Map::new()),
    }
}

fn filter_node(value: &Value, path: &mut Vec<String>, globs: &[AttributeGlob]) -> Option<Value> {
    let allowed = is_allowed(globs, path);
    let has_below = globs.iter().any(|g| g.reaches_below(path));

    if !has_below {
        return allowed.then(|| value.clone());
    }

    match value {
        Value::Object(fields) => {
            let mut kept = Map::new();
            for (key, child) in fields {
                path.push(key.clone());
                if let Some(filtered) = filter_node(child, path, globs) {
                    kept.insert(key.clone(), filtered);
                }
                path.pop();
            }
            (allowed || !kept.is_empty()).then_some(Value::Object(kept))
        }
        Value::Array(items) => {
            let kept: Vec<Value> = items
                .iter()
                .filter_map(|item| filter_node(item, path, globs))
                .collect();
            (allowed || !kept.is_empty()).then_some(Value::Array(kept))
        }
        _ => allowed.then(|| value.clone()),
    }
}
