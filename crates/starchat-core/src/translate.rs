//! Key translation between the v4 and v5 document dialects

use crate::dialect::Dialect;
use serde_json::{Map, Value};

/// Rewrite every mapping key of `value` into the `into` dialect
///
/// Keys listed in [`crate::dialect::DialectField::ALL`] are renamed at every nesting
/// depth, other keys and all values are kept. The input is not modified; a new
/// tree is returned. When a mapping holds both spellings of one field the
/// renamed entry overwrites the one already in the target spelling.
pub fn rename_keys(value: &Value, into: Dialect) -> Value {
    match value {
        Value::Object(map) => {
            let mut out = Map::with_capacity(map.len());
            for (key, child) in map {
                let key = into
                    .rename_into(key)
                    .map_or_else(|| key.clone(), str::to_string);
                out.insert(key, rename_keys(child, into));
            }
            Value::Object(out)
        }
        Value::Array(items) => Value::Array(items.iter().map(|item| rename_keys(item, into)).collect()),
        scalar => scalar.clone(),
    }
}
