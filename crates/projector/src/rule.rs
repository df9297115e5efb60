//! Rule model and rule table
//!
//! A rule table maps command names (space-joined identifiers such as
//! `ltm pool`, optionally nested like `ltm pool members`) to ordered rule
//! lists. Each rule describes how one target property derives its value
//! from a declarative entity. Tables are authored externally as JSON and
//! injected through the [`RuleLookup`] trait.

use crate::error::Result;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Prefix marking a rule id as an absolute table key
///
/// A rule whose id begins with this prefix borrows the rule list registered
/// under the remainder of its id instead of namespacing the lookup under
/// its parent command.
pub const ABSOLUTE_PREFIX: &str = "@";

/// How a rule's sub-rules are resolved in the table
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleKey {
    /// Property scoped under its parent command: `<command> <id>`
    Relative(String),
    /// Full table key borrowed from another command family
    Absolute(String),
}

impl<'de> Deserialize<'de> for RuleKey {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(match raw.strip_prefix(ABSOLUTE_PREFIX) {
            Some(full) => Self::Absolute(full.to_string()),
            None => Self::Relative(raw),
        })
    }
}

/// Recursion mode of a rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Extend {
    /// Plain scalar value, no recursion
    #[default]
    Leaf,
    /// Single nested object projected with a sub-command rule list
    Object,
    /// Map from name to object, expanded to an array in key order
    NamedObject,
    /// Array of scalars or objects, flattened into one shared result
    Array,
    /// Array whose entries become named sub-objects
    ObjArray,
}

/// Feature-module requirement of a rule
///
/// `anyOf` must be present whenever `requiredModules` is set; its absence is
/// a rule-table authoring error and fails the projection.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequiredModules {
    #[serde(default)]
    pub any_of: Option<Vec<String>>,
}

/// One row of a rule table: how a single target property derives its value
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rule {
    /// Canonical target property name, or an `@`-prefixed absolute key
    #[serde(rename = "id")]
    pub key: RuleKey,

    /// Alternate source key recognized in the declaration
    #[serde(default)]
    pub alt_id: Option<String>,

    /// Default value; an explicit JSON `null` means "omit when absent"
    #[serde(default, deserialize_with = "keep_null")]
    pub default: Option<Value>,

    /// Recursion mode
    #[serde(default)]
    pub extend: Extend,

    /// Token substituted for a boolean `true`
    #[serde(default)]
    pub truth: Option<String>,

    /// Token substituted for a boolean `false`
    #[serde(default)]
    pub falsehood: Option<String>,

    /// Quote the resolved scalar for the command grammar
    #[serde(default)]
    pub quoted_string: bool,

    /// Stringify a numeric value
    #[serde(default)]
    pub int_to_string: bool,

    /// Rewrite a resolved path out of the shared scope
    #[serde(default)]
    pub force_to_common: bool,

    /// Minimum target version this property applies to
    #[serde(default)]
    pub min_version: Option<String>,

    /// Feature modules at least one of which must be provisioned
    #[serde(default)]
    pub required_modules: Option<RequiredModules>,
}

impl Rule {
    /// The property name this rule assigns in the output map
    pub fn property_id(&self) -> &str {
        match &self.key {
            RuleKey::Relative(id) | RuleKey::Absolute(id) => id,
        }
    }

    /// The table key holding this rule's sub-rules
    ///
    /// Relative rules namespace under the parent command; absolute rules
    /// carry their full key themselves.
    pub fn lookup_key(&self, command: &str) -> String {
        match &self.key {
            RuleKey::Relative(id) => format!("{command} {id}"),
            RuleKey::Absolute(full) => full.clone(),
        }
    }
}

/// Deserialize a default value, keeping an explicit JSON `null` distinct
/// from an absent field
fn keep_null<'de, D>(deserializer: D) -> std::result::Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

/// Read-only rule-table lookup injected into the projector
pub trait RuleLookup: Sync {
    /// The rule list registered for a command, if any
    fn lookup(&self, command: &str) -> Option<&[Rule]>;
}

/// A rule table parsed from its external JSON form
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct RuleTable {
    commands: HashMap<String, Vec<Rule>>,
}

impl RuleTable {
    /// Load a rule table from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Build a rule table from an in-memory JSON value
    pub fn from_value(value: Value) -> Result<Self> {
        Ok(serde_json::from_value(value)?)
    }

    /// Number of commands in the table
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Check if the table has no commands
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Total number of rules across all commands
    pub fn rule_count(&self) -> usize {
        self.commands.values().map(Vec::len).sum()
    }

    /// Iterate over the command names in the table
    pub fn command_names(&self) -> impl Iterator<Item = &str> {
        self.commands.keys().map(String::as_str)
    }

    /// Check the table for authoring errors without running a projection
    ///
    /// Reports rules with `requiredModules` but no `anyOf`, and nested rules
    /// whose sub-command key has no table entry. `array` rules resolve their
    /// sub-rules lazily and are not checked here.
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();

        for (command, rules) in &self.commands {
            for rule in rules {
                let id = rule.property_id();

                if let Some(required) = &rule.required_modules
                    && required.any_of.is_none()
                {
                    issues.push(format!(
                        "{command}: rule `{id}` declares requiredModules without anyOf"
                    ));
                }

                if matches!(
                    rule.extend,
                    Extend::Object | Extend::NamedObject | Extend::ObjArray
                ) {
                    let key = rule.lookup_key(command);
                    if !self.commands.contains_key(&key) {
                        issues.push(format!(
                            "{command}: rule `{id}` references missing command `{key}`"
                        ));
                    }
                }
            }
        }

        issues.sort();
        issues
    }
}

impl RuleLookup for RuleTable {
    fn lookup(&self, command: &str) -> Option<&[Rule]> {
        self.commands.get(command).map(Vec::as_slice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rule(value: Value) -> Rule {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_rule_defaults() {
        let r = rule(json!({"id": "interval"}));
        assert_eq!(r.property_id(), "interval");
        assert_eq!(r.extend, Extend::Leaf);
        assert!(r.default.is_none());
        assert!(!r.quoted_string);
    }

    #[test]
    fn test_explicit_null_default_is_kept() {
        let r = rule(json!({"id": "description", "default": null}));
        assert_eq!(r.default, Some(Value::Null));

        let r = rule(json!({"id": "description"}));
        assert_eq!(r.default, None);
    }

    #[test]
    fn test_extend_spellings() {
        let r = rule(json!({"id": "members", "extend": "objArray"}));
        assert_eq!(r.extend, Extend::ObjArray);
        let r = rule(json!({"id": "monitors", "extend": "namedObject"}));
        assert_eq!(r.extend, Extend::NamedObject);
    }

    #[test]
    fn test_absolute_key() {
        let r = rule(json!({"id": "@net address-list", "extend": "object"}));
        assert_eq!(r.key, RuleKey::Absolute("net address-list".to_string()));
        assert_eq!(r.property_id(), "net address-list");
        assert_eq!(r.lookup_key("ltm virtual"), "net address-list");

        let r = rule(json!({"id": "members", "extend": "object"}));
        assert_eq!(r.lookup_key("ltm pool"), "ltm pool members");
    }

    #[test]
    fn test_camel_case_field_names() {
        let r = rule(json!({
            "id": "monitor",
            "altId": "monitors",
            "quotedString": true,
            "intToString": true,
            "minVersion": "14.1",
            "requiredModules": {"anyOf": ["afm"]}
        }));
        assert_eq!(r.alt_id.as_deref(), Some("monitors"));
        assert!(r.quoted_string);
        assert!(r.int_to_string);
        assert_eq!(r.min_version.as_deref(), Some("14.1"));
        assert_eq!(
            r.required_modules.unwrap().any_of,
            Some(vec!["afm".to_string()])
        );
    }

    #[test]
    fn test_validate_reports_missing_subcommand() {
        let table = RuleTable::from_value(json!({
            "ltm pool": [
                {"id": "members", "extend": "objArray"}
            ]
        }))
        .unwrap();

        let issues = table.validate();
        assert_eq!(issues.len(), 1);
        assert!(issues[0].contains("ltm pool members"));
    }

    #[test]
    fn test_validate_reports_missing_any_of() {
        let table = RuleTable::from_value(json!({
            "ltm pool": [
                {"id": "interval", "requiredModules": {}}
            ]
        }))
        .unwrap();

        let issues = table.validate();
        assert_eq!(issues.len(), 1);
        assert!(issues[0].contains("anyOf"));
    }

    #[test]
    fn test_validate_clean_table() {
        let table = RuleTable::from_value(json!({
            "ltm pool": [
                {"id": "members", "extend": "objArray"},
                {"id": "vlans", "extend": "array"}
            ],
            "ltm pool members": [
                {"id": "name"}
            ]
        }))
        .unwrap();

        assert!(table.validate().is_empty());
        assert_eq!(table.len(), 2);
        assert_eq!(table.rule_count(), 3);
    }
}
