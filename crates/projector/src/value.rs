//! Helpers for working with declarative values

use serde_json::Value;

/// Sentinel meaning "explicitly absent" on the device, as opposed to a
/// property that was never specified at all
pub const NONE_TOKEN: &str = "none";

/// Scope prefix of objects shared out of the common partition
pub const SHARED_PREFIX: &str = "/Common/Shared/";

/// Common partition prefix
pub const COMMON_PREFIX: &str = "/Common/";

/// Convert a dash- or space-separated property id to the camelCase alias
/// declarations use for it
///
/// `idle-timeout` becomes `idleTimeout`; ids without separators come back
/// unchanged.
pub fn camel_case(id: &str) -> String {
    let mut out = String::with_capacity(id.len());
    let mut upper_next = false;
    for c in id.chars() {
        if c == '-' || c == ' ' {
            upper_next = true;
        } else if upper_next {
            out.extend(c.to_uppercase());
            upper_next = false;
        } else {
            out.push(c);
        }
    }
    out
}

/// Unwrap the reference convention: a value may be an object carrying a
/// `bigip` (absolute device path) or `use` (locally defined name) field
/// instead of a plain value
///
/// Returns the referenced path, `bigip` winning if both are present.
pub fn reference_path(value: &Value) -> Option<&str> {
    value.as_object().and_then(object_reference)
}

/// [`reference_path`] over a raw object map
pub fn object_reference(obj: &serde_json::Map<String, Value>) -> Option<&str> {
    obj.get("bigip").or_else(|| obj.get("use"))?.as_str()
}

/// Rewrite a path under the shared scope to its common form
///
/// `/Common/Shared/pool` becomes `/Common/pool`; anything else passes
/// through untouched.
pub fn to_common(path: &str) -> String {
    match path.strip_prefix(SHARED_PREFIX) {
        Some(rest) => format!("{COMMON_PREFIX}{rest}"),
        None => path.to_string(),
    }
}

/// Collect the dotted leaf paths of a projected value into `out`
///
/// Objects recurse per key, arrays per index, so a nested member comes out
/// as `monitors.0.interval`. Empty containers and scalars record the prefix
/// itself.
pub fn leaf_paths(prefix: &str, value: &Value, out: &mut Vec<String>) {
    match value {
        Value::Object(map) if !map.is_empty() => {
            for (key, member) in map {
                leaf_paths(&format!("{prefix}.{key}"), member, out);
            }
        }
        Value::Array(items) if !items.is_empty() => {
            for (index, member) in items.iter().enumerate() {
                leaf_paths(&format!("{prefix}.{index}"), member, out);
            }
        }
        _ => out.push(prefix.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_camel_case() {
        assert_eq!(camel_case("idle-timeout"), "idleTimeout");
        assert_eq!(camel_case("address-list port"), "addressListPort");
        assert_eq!(camel_case("interval"), "interval");
    }

    #[test]
    fn test_reference_path() {
        assert_eq!(
            reference_path(&json!({"bigip": "/Common/http"})),
            Some("/Common/http")
        );
        assert_eq!(reference_path(&json!({"use": "webPool"})), Some("webPool"));
        // bigip wins over use
        assert_eq!(
            reference_path(&json!({"use": "a", "bigip": "/Common/b"})),
            Some("/Common/b")
        );
        assert_eq!(reference_path(&json!("plain")), None);
        assert_eq!(reference_path(&json!({"other": 1})), None);
    }

    #[test]
    fn test_to_common() {
        assert_eq!(to_common("/Common/Shared/pool"), "/Common/pool");
        assert_eq!(to_common("/Common/pool"), "/Common/pool");
        assert_eq!(to_common("/Tenant/app/pool"), "/Tenant/app/pool");
    }

    #[test]
    fn test_leaf_paths_nested() {
        let mut out = Vec::new();
        leaf_paths(
            "monitors",
            &json!([{"interval": 5, "timeout": 16}, {"interval": 1}]),
            &mut out,
        );
        assert_eq!(
            out,
            vec!["monitors.0.interval", "monitors.0.timeout", "monitors.1.interval"]
        );
    }

    #[test]
    fn test_leaf_paths_empty_container_records_itself() {
        let mut out = Vec::new();
        leaf_paths("vlans./Common/v1", &json!({}), &mut out);
        assert_eq!(out, vec!["vlans./Common/v1"]);
    }
}
