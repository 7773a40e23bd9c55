//! Recursive key-case conversion for JSON bodies.
//!
//! Only object keys are rewritten; array elements are visited, scalar values are left
//! untouched. Keys split on `_`, lower→upper transitions, digit→upper transitions and
//! acronym ends (`HTTPServer` → `http_server`). camelCasing also splits on `-` and
//! spaces.

use convert_case::{Boundary, Case, Converter};
use serde_json::{Map, Value};

const CAMEL_BOUNDARIES: [Boundary; 6] = [
    Boundary::Underscore,
    Boundary::Hyphen,
    Boundary::Space,
    Boundary::LowerUpper,
    Boundary::DigitUpper,
    Boundary::Acronym,
];

// Hyphens and spaces are not word breaks on the way out: `content-type` stays as is.
const SNAKE_BOUNDARIES: [Boundary; 4] = [
    Boundary::Underscore,
    Boundary::LowerUpper,
    Boundary::DigitUpper,
    Boundary::Acronym,
];

fn converter(boundaries: &[Boundary], case: Case) -> Converter {
    Converter::new().set_boundaries(boundaries).to_case(case)
}

/// Convert every object key in `value` to camelCase (`item_id` → `itemId`).
#[must_use]
pub fn to_camel_keys(value: Value) -> Value {
    rewrite_keys(value, &converter(&CAMEL_BOUNDARIES, Case::Camel))
}

/// Convert every object key in `value` to snake_case (`itemName` → `item_name`).
#[must_use]
pub fn to_snake_keys(value: Value) -> Value {
    rewrite_keys(value, &converter(&SNAKE_BOUNDARIES, Case::Snake))
}

fn rewrite_keys(value: Value, conv: &Converter) -> Value {
    match value {
        Value::Object(map) => {
            let mut out = Map::with_capacity(map.len());
            for (key, inner) in map {
                out.insert(convert_key(&key, conv), rewrite_keys(inner, conv));
            }
            Value::Object(out)
        }
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(|item| rewrite_keys(item, conv))
                .collect(),
        ),
        other => other,
    }
}

fn convert_key(key: &str, conv: &Converter) -> String {
    // numeric keys (e.g. ids used as map keys) stay as they are
    if key.is_empty() || key.chars().all(|c| c.is_ascii_digit()) {
        return key.to_owned();
    }
    conv.convert(key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn camelizes_nested_objects_and_arrays() {
        let input = json!({
            "item_id": 5,
            "owner_info": { "first_name": "Ada", "last_login_at": null },
            "tag_list": [{ "tag_name": "x" }, "plain_string", 3],
        });
        let expected = json!({
            "itemId": 5,
            "ownerInfo": { "firstName": "Ada", "lastLoginAt": null },
            "tagList": [{ "tagName": "x" }, "plain_string", 3],
        });
        assert_eq!(to_camel_keys(input), expected);
    }

    #[test]
    fn snakes_camel_keys_only() {
        let input = json!({ "itemName": "someValue", "nested": { "HTTPServer": true } });
        let expected = json!({ "item_name": "someValue", "nested": { "http_server": true } });
        assert_eq!(to_snake_keys(input), expected);
    }

    #[test]
    fn snake_leaves_hyphenated_and_spaced_keys_alone() {
        let input = json!({ "content-type": "a", "display name": "b", "userId": 1 });
        let expected = json!({ "content-type": "a", "display name": "b", "user_id": 1 });
        assert_eq!(to_snake_keys(input), expected);
    }

    #[test]
    fn already_converted_keys_are_stable() {
        let camel = json!({ "itemId": 1, "name": "n" });
        assert_eq!(to_camel_keys(camel.clone()), camel);

        let snake = json!({ "item_id": 1, "name": "n" });
        assert_eq!(to_snake_keys(snake.clone()), snake);
    }

    #[test]
    fn numeric_keys_and_scalars_pass_through() {
        assert_eq!(to_camel_keys(json!({ "42": "a" })), json!({ "42": "a" }));
        assert_eq!(to_snake_keys(json!("itemName")), json!("itemName"));
        assert_eq!(to_camel_keys(json!([1, 2])), json!([1, 2]));
    }

    #[test]
    fn snake_then_camel_restores_camel_keys() {
        let original = json!({ "itemName": "x", "subItems": [{ "unitPrice": 2 }] });
        assert_eq!(to_camel_keys(to_snake_keys(original.clone())), original);
    }
}
