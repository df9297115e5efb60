//! Entity projection
//!
//! One call per logical entity: every rule registered for the entity's
//! command is assigned against the declaration, and independently against
//! the declaration's `ignore` sub-object to collect the property paths the
//! caller wants left unmanaged.

use crate::error::Result;
use crate::property::{Defaults, Projector};
use crate::value::leaf_paths;
use serde::Serialize;
use serde_json::{Map, Value};

/// Flattened projection of one declarative entity
#[derive(Debug, Clone, Serialize)]
pub struct Projection {
    /// Caller-supplied path identifying the entity
    pub path: String,
    /// Command family the entity was projected against
    pub command: String,
    /// Target property id mapped to its resolved value, in rule order
    pub properties: Map<String, Value>,
    /// Dotted property paths the caller explicitly asked to ignore
    pub ignore: Vec<String>,
}

impl Projector<'_> {
    /// Project one declarative entity into its target properties
    ///
    /// `source` is cloned on entry; the caller's value is never mutated.
    /// A command with no rule entry projects to an empty property map --
    /// some commands are pure containers.
    pub fn project(&self, source: &Value, command: &str, path: &str) -> Result<Projection> {
        let mut working = match source {
            Value::Object(map) => map.clone(),
            _ => Map::new(),
        };

        let mut ignored = match working.remove("ignore") {
            Some(Value::Object(map)) => map,
            _ => Map::new(),
        };

        let mut properties = Map::new();
        let mut ignore = Vec::new();

        for rule in self.rules.lookup(command).unwrap_or_default() {
            if let Some(value) = self.assign(&mut working, command, rule)? {
                properties.insert(rule.property_id().to_string(), value);
            }

            // Ignore entries never default: only what the caller spelled
            // out may register as an ignore path
            if let Some(value) =
                self.assign_with(&mut ignored, command, rule, Defaults::Suppress)?
            {
                record_ignore(rule.property_id(), &value, &mut ignore);
            }
        }

        Ok(Projection {
            path: path.to_string(),
            command: command.to_string(),
            properties,
            ignore,
        })
    }
}

/// Record the ignore paths of one projected ignore value
///
/// Structured results flatten to their dotted leaf paths (array members by
/// index); scalars record the property id itself.
fn record_ignore(id: &str, value: &Value, out: &mut Vec<String>) {
    match value {
        Value::Object(map) => {
            for (key, member) in map {
                leaf_paths(&format!("{id}.{key}"), member, out);
            }
        }
        Value::Array(items) => {
            for (index, member) in items.iter().enumerate() {
                leaf_paths(&format!("{id}.{index}"), member, out);
            }
        }
        _ => out.push(id.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Context;
    use crate::rule::RuleTable;
    use serde_json::json;

    fn widget_table() -> RuleTable {
        RuleTable::from_value(json!({
            "widget": [
                {"id": "size", "default": 10},
                {"id": "color", "truth": "bright", "falsehood": "dim"}
            ]
        }))
        .unwrap()
    }

    #[test]
    fn test_end_to_end_projection() {
        let ctx = Context::new("15.1");
        let table = widget_table();
        let projector = Projector::new(&ctx, &table);

        let out = projector
            .project(&json!({"color": true}), "widget", "/tenant/app/w1")
            .unwrap();

        assert_eq!(out.path, "/tenant/app/w1");
        assert_eq!(out.command, "widget");
        assert_eq!(
            Value::Object(out.properties),
            json!({"size": 10, "color": "bright"})
        );
        assert!(out.ignore.is_empty());
    }

    #[test]
    fn test_end_to_end_ignore() {
        let ctx = Context::new("15.1");
        let table = widget_table();
        let projector = Projector::new(&ctx, &table);

        let out = projector
            .project(
                &json!({"color": false, "ignore": {"size": 10}}),
                "widget",
                "/tenant/app/w1",
            )
            .unwrap();

        assert_eq!(
            Value::Object(out.properties),
            json!({"size": 10, "color": "dim"})
        );
        // Only the explicitly present ignore entry counts; `color` had no
        // ignore entry and the suppressed default adds nothing
        assert_eq!(out.ignore, vec!["size"]);
    }

    #[test]
    fn test_properties_follow_rule_order() {
        let ctx = Context::new("15.1");
        let table = widget_table();
        let projector = Projector::new(&ctx, &table);

        let out = projector
            .project(&json!({"color": true, "size": 2}), "widget", "/w")
            .unwrap();

        let keys: Vec<&str> = out.properties.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["size", "color"]);
    }

    #[test]
    fn test_unknown_command_projects_to_nothing() {
        let ctx = Context::new("15.1");
        let table = RuleTable::default();
        let projector = Projector::new(&ctx, &table);

        let out = projector
            .project(&json!({"anything": 1}), "container", "/c")
            .unwrap();

        assert!(out.properties.is_empty());
        assert!(out.ignore.is_empty());
    }

    #[test]
    fn test_source_is_not_mutated() {
        let ctx = Context::new("15.1");
        let table = RuleTable::from_value(json!({
            "widget": [{"id": "idle-timeout"}]
        }))
        .unwrap();
        let projector = Projector::new(&ctx, &table);

        let source = json!({"idleTimeout": 300});
        let before = source.clone();
        let out = projector.project(&source, "widget", "/w").unwrap();

        assert_eq!(source, before);
        assert_eq!(
            Value::Object(out.properties),
            json!({"idle-timeout": 300})
        );
    }

    #[test]
    fn test_nested_ignore_paths_use_indices() {
        let ctx = Context::new("15.1");
        let table = RuleTable::from_value(json!({
            "ltm pool": [
                {"id": "monitors", "extend": "namedObject"}
            ],
            "ltm pool monitors": [
                {"id": "interval", "default": 5},
                {"id": "timeout"}
            ]
        }))
        .unwrap();
        let projector = Projector::new(&ctx, &table);

        let out = projector
            .project(
                &json!({
                    "monitors": {"web": {"interval": 1}},
                    "ignore": {"monitors": {"web": {"interval": 1}}}
                }),
                "ltm pool",
                "/pool",
            )
            .unwrap();

        // The suppressed walk still expands the named object, but only the
        // explicitly present member field surfaces as a path
        assert_eq!(out.ignore, vec!["monitors.0.interval"]);
    }

    #[test]
    fn test_ignore_scalar_records_property_id() {
        let ctx = Context::new("15.1");
        let table = RuleTable::from_value(json!({
            "widget": [{"id": "size"}, {"id": "color"}]
        }))
        .unwrap();
        let projector = Projector::new(&ctx, &table);

        let out = projector
            .project(
                &json!({"ignore": {"size": 1, "color": "red"}}),
                "widget",
                "/w",
            )
            .unwrap();

        assert_eq!(out.ignore, vec!["size", "color"]);
    }

    #[test]
    fn test_absent_array_rule_records_no_ignore_paths() {
        let ctx = Context::new("15.1");
        let table = RuleTable::from_value(json!({
            "ltm virtual": [{"id": "vlans", "extend": "array"}]
        }))
        .unwrap();
        let projector = Projector::new(&ctx, &table);

        let out = projector
            .project(&json!({"ignore": {}}), "ltm virtual", "/v")
            .unwrap();

        // The array rule still materializes (empty) in properties, but the
        // ignore walk records nothing for it
        assert_eq!(Value::Object(out.properties), json!({"vlans": {}}));
        assert!(out.ignore.is_empty());
    }

    #[test]
    fn test_ignore_array_member_paths() {
        let ctx = Context::new("15.1");
        let table = RuleTable::from_value(json!({
            "ltm virtual": [{"id": "vlans", "extend": "array"}]
        }))
        .unwrap();
        let projector = Projector::new(&ctx, &table);

        let out = projector
            .project(
                &json!({"ignore": {"vlans": ["/Common/internal"]}}),
                "ltm virtual",
                "/v",
            )
            .unwrap();

        assert_eq!(out.ignore, vec!["vlans./Common/internal"]);
    }

    #[test]
    fn test_fatal_errors_propagate() {
        let ctx = Context::new("15.1");
        let table = RuleTable::from_value(json!({
            "ltm pool": [{"id": "members", "extend": "objArray"}]
        }))
        .unwrap();
        let projector = Projector::new(&ctx, &table);

        let err = projector
            .project(&json!({"members": [{"name": "a"}]}), "ltm pool", "/p")
            .unwrap_err();
        assert!(err.to_string().contains("ltm pool members"));
    }
}
