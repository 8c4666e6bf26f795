//! Query-string flattening.
//!
//! `params` is flattened one level deep into ordered `key=value` pairs:
//!
//! | value              | pairs                        |
//! |--------------------|------------------------------|
//! | scalar             | `key=value`                  |
//! | array              | `key[]=item` per item        |
//! | object             | `key[sub]=value` per entry   |
//!
//! Strings are written as-is, other scalars as their JSON text (so `null`
//! becomes `null`). Anything nested deeper than one level is written as
//! compact JSON. Nothing is percent-encoded.

use serde_json::Value;

use crate::options::{Params, RequestOptions};

/// Flatten `params` into ordered key/value pairs.
pub fn flatten(params: &Params) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    for (key, value) in params {
        match value {
            Value::Array(items) => {
                let full_key = format!("{key}[]");
                for item in items {
                    pairs.push((full_key.clone(), render(item)));
                }
            }
            Value::Object(entries) => {
                for (sub, item) in entries {
                    pairs.push((format!("{key}[{sub}]"), render(item)));
                }
            }
            scalar => pairs.push((key.clone(), render(scalar))),
        }
    }
    pairs
}

fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Append the flattened `options.params` to `uri`.
///
/// Returns `uri` unchanged when there are no params or they flatten to
/// nothing. A `uri` that already carries a query string is extended with `&`.
pub fn build_query_string(uri: &str, options: &RequestOptions) -> String {
    let Some(params) = options.params.as_ref() else {
        return uri.to_string();
    };
    let pairs = flatten(params);
    if pairs.is_empty() {
        return uri.to_string();
    }
    let query = pairs
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");
    let separator = if uri.contains('?') { '&' } else { '?' };
    format!("{uri}{separator}{query}")
}
