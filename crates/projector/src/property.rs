//! Property projection
//!
//! The property projector derives the value of a single target property
//! from a declarative entity, following one rule: aliasing, defaulting,
//! version and module gates, then recursion according to the rule's
//! `extend` mode. Nested modes look their sub-rules up in the injected
//! rule table and recurse with the sub-command as the new lookup scope.

use crate::context::Context;
use crate::error::{Error, Result};
use crate::quote::quote;
use crate::rule::{Extend, Rule, RuleLookup};
use crate::value::{NONE_TOKEN, camel_case, object_reference, to_common};
use serde_json::{Map, Value};

/// Projection engine bound to one context and one rule table
///
/// Cheap to construct; borrows both collaborators. Safe to share across
/// threads for distinct source objects.
pub struct Projector<'a> {
    pub(crate) ctx: &'a Context,
    pub(crate) rules: &'a dyn RuleLookup,
}

/// Whether rule defaults participate in resolution
///
/// The ignore walk suppresses them at every depth: only values the caller
/// spelled out may produce ignore entries.
#[derive(Clone, Copy, PartialEq, Eq)]
pub(crate) enum Defaults {
    Apply,
    Suppress,
}

impl<'a> Projector<'a> {
    /// Create a projector over the given context and rule table
    pub fn new(ctx: &'a Context, rules: &'a dyn RuleLookup) -> Self {
        Self { ctx, rules }
    }

    /// Derive the value of one target property from `source`
    ///
    /// Returns `Ok(None)` when the property resolves to nothing: not
    /// present, defaulted to omission, or gated out by version or module.
    /// `source` is the working copy of the declarative object; key aliasing
    /// and array normalization rewrite it in place.
    pub fn assign(
        &self,
        source: &mut Map<String, Value>,
        command: &str,
        rule: &Rule,
    ) -> Result<Option<Value>> {
        self.assign_with(source, command, rule, Defaults::Apply)
    }

    pub(crate) fn assign_with(
        &self,
        source: &mut Map<String, Value>,
        command: &str,
        rule: &Rule,
        defaults: Defaults,
    ) -> Result<Option<Value>> {
        let id = rule.property_id();

        // Declarations may spell a property as its camelCase alias or as the
        // rule's altId. The canonical key wins when already present; altId
        // wins between the two aliases.
        if !source.contains_key(id) {
            let camel = camel_case(id);
            if camel != id
                && let Some(value) = source.get(&camel).cloned()
            {
                source.insert(id.to_string(), value);
            }
            if let Some(alt) = &rule.alt_id
                && let Some(value) = source.get(alt).cloned()
            {
                source.insert(id.to_string(), value);
            }
        }

        if !source.contains_key(id) {
            match &rule.default {
                // An explicit null default means: omit entirely when absent
                Some(Value::Null) => return Ok(None),
                Some(default) if defaults == Defaults::Apply => {
                    source.insert(id.to_string(), default.clone());
                }
                _ => {
                    if matches!(rule.extend, Extend::Array | Extend::ObjArray) {
                        source.insert(id.to_string(), Value::Array(Vec::new()));
                    } else {
                        return Ok(None);
                    }
                }
            }
        }

        if let Some(min) = &rule.min_version
            && self.ctx.version_before(min)
        {
            log::debug!(
                "dropping `{id}`: requires version {min}, target is {}",
                self.ctx.target_version()
            );
            source.remove(id);
            return Ok(None);
        }

        if let Some(required) = &rule.required_modules {
            let any_of = required
                .any_of
                .as_ref()
                .ok_or_else(|| Error::MissingAnyOf(id.to_string()))?;
            if !any_of.iter().any(|m| self.ctx.is_module_active(m)) {
                log::debug!("dropping `{id}`: none of {any_of:?} provisioned");
                source.remove(id);
                return Ok(None);
            }
        }

        match rule.extend {
            Extend::Leaf => Ok(Some(self.leaf(source, rule))),
            Extend::Object => self.object(source, command, rule, defaults),
            Extend::NamedObject => self.named_object(source, command, rule, defaults),
            Extend::Array => self.array(source, command, rule, defaults),
            Extend::ObjArray => self.obj_array(source, command, rule, defaults),
        }
    }

    /// Sub-rule list for a nested rule; a missing entry is an authoring
    /// error in the rule table
    fn subcommand(&self, key: &str) -> Result<&[Rule]> {
        self.rules
            .lookup(key)
            .ok_or_else(|| Error::UnknownCommand(key.to_string()))
    }

    /// Resolve a scalar value: boolean tokens, the empty-string sentinel,
    /// stringification, quoting, reference unwrapping, scope rewriting
    fn leaf(&self, source: &Map<String, Value>, rule: &Rule) -> Value {
        let id = rule.property_id();
        let mut value = source.get(id).cloned().unwrap_or(Value::Null);

        if let Value::Bool(flag) = value {
            let token = if flag { &rule.truth } else { &rule.falsehood };
            if let Some(token) = token {
                value = Value::String(token.clone());
            }
        }

        // An empty string is "explicitly absent" in the command grammar
        if value.as_str() == Some("") {
            value = Value::String(NONE_TOKEN.to_string());
        }

        if rule.int_to_string && value.is_number() {
            value = Value::String(value.to_string());
        }

        if rule.quoted_string {
            let quoted = match value.as_str() {
                Some(s) if rule.default.as_ref() != Some(&value) && !s.starts_with('"') => {
                    Some(quote(s))
                }
                _ => None,
            };
            if let Some(quoted) = quoted {
                value = Value::String(quoted);
            }
        }

        // A reference object resolves to the path it names
        let referenced = value
            .as_object()
            .and_then(object_reference)
            .map(str::to_string);
        if let Some(path) = referenced {
            value = Value::String(path);
        }

        if rule.force_to_common
            && let Some(path) = value.as_str()
        {
            return Value::String(to_common(path));
        }
        value
    }

    /// `object`: recurse into a single nested object with the sub-command
    /// rule list, collecting defined results per sub-rule id
    fn object(
        &self,
        source: &mut Map<String, Value>,
        command: &str,
        rule: &Rule,
        defaults: Defaults,
    ) -> Result<Option<Value>> {
        let id = rule.property_id();
        let key = rule.lookup_key(command);
        let sub_rules = self.subcommand(&key)?;

        let mut nested = match source.get(id) {
            Some(Value::Object(map)) => map.clone(),
            other => return Ok(other.cloned()),
        };

        let mut out = Map::new();
        for sub in sub_rules {
            if sub.property_id() == "name" {
                continue;
            }
            if let Some(value) = self.assign_with(&mut nested, &key, sub, defaults)? {
                out.insert(sub.property_id().to_string(), value);
            }
        }
        Ok(Some(Value::Object(out)))
    }

    /// `namedObject`: expand a name-to-object map into an array in key
    /// order, each element carrying its map key as `name`
    fn named_object(
        &self,
        source: &mut Map<String, Value>,
        command: &str,
        rule: &Rule,
        defaults: Defaults,
    ) -> Result<Option<Value>> {
        let id = rule.property_id();

        // "none" passes through: the caller is explicitly clearing the set
        if source.get(id).and_then(Value::as_str) == Some(NONE_TOKEN) {
            return Ok(Some(Value::String(NONE_TOKEN.to_string())));
        }

        let key = rule.lookup_key(command);
        let sub_rules = self.subcommand(&key)?;

        let entries = match source.get(id) {
            Some(Value::Object(map)) => map.clone(),
            other => return Ok(other.cloned()),
        };

        let mut items = Vec::with_capacity(entries.len());
        for (name, member) in entries {
            let mut member = match member {
                Value::Object(map) => map,
                _ => Map::new(),
            };

            let mut item = Map::new();
            if defaults == Defaults::Apply {
                member.insert("name".to_string(), Value::String(name.clone()));
                item.insert("name".to_string(), Value::String(name));
            }

            for sub in sub_rules {
                if let Some(value) = self.assign_with(&mut member, &key, sub, defaults)? {
                    item.insert(sub.property_id().to_string(), value);
                }
            }
            items.push(Value::Object(item));
        }

        // The working copy keeps the expanded array form
        let expanded = Value::Array(items);
        source.insert(id.to_string(), expanded.clone());
        Ok(Some(expanded))
    }

    /// `array`: normalize to an array, then flatten every element into one
    /// shared result object
    ///
    /// References and bare scalars become keys mapped to empty objects;
    /// structured elements merge their projected sub-properties directly
    /// into the shared result. This is deliberately flatter than
    /// `objArray`, which keeps one named sub-object per element.
    fn array(
        &self,
        source: &mut Map<String, Value>,
        command: &str,
        rule: &Rule,
        defaults: Defaults,
    ) -> Result<Option<Value>> {
        let id = rule.property_id();

        // Normalize: bare scalars wrap, plain objects list their keys
        let elements: Vec<Value> = match source.get(id).cloned() {
            Some(Value::Array(items)) => items,
            Some(Value::Object(map)) => map.keys().map(|k| Value::String(k.clone())).collect(),
            Some(other) => vec![other],
            None => Vec::new(),
        };
        source.insert(id.to_string(), Value::Array(elements.clone()));

        let mut out = Map::new();
        for element in elements {
            let element = match element {
                Value::String(s) if rule.quoted_string && !s.starts_with('"') => {
                    Value::String(quote(&s))
                }
                e => e,
            };

            match element {
                Value::Null => {
                    out.insert(String::new(), Value::Object(Map::new()));
                }
                Value::Object(mut member) => {
                    if let Some(path) = object_reference(&member) {
                        out.insert(path.to_string(), Value::Object(Map::new()));
                    } else {
                        let key = rule.lookup_key(command);
                        let sub_rules = self.subcommand(&key)?;
                        for sub in sub_rules {
                            if sub.property_id() == "name" {
                                continue;
                            }
                            if let Some(value) =
                                self.assign_with(&mut member, &key, sub, defaults)?
                            {
                                out.insert(sub.property_id().to_string(), value);
                            }
                        }
                    }
                }
                Value::String(s) => {
                    out.insert(s, Value::Object(Map::new()));
                }
                other => {
                    out.insert(other.to_string(), Value::Object(Map::new()));
                }
            }
        }
        Ok(Some(Value::Object(out)))
    }

    /// `objArray`: one named sub-object per array element, keyed by the
    /// element's resolved display name
    fn obj_array(
        &self,
        source: &mut Map<String, Value>,
        command: &str,
        rule: &Rule,
        defaults: Defaults,
    ) -> Result<Option<Value>> {
        let id = rule.property_id();

        let elements = match source.get(id) {
            Some(Value::Array(items)) => items.clone(),
            other => {
                // Already collapsed upstream; pass through untouched
                log::warn!("`{id}`: expected an array, passing value through");
                return Ok(other.cloned());
            }
        };

        let key = rule.lookup_key(command);
        let sub_rules = self.subcommand(&key)?;
        let name_rule = sub_rules.iter().find(|s| s.property_id() == "name");

        let mut out = Map::new();
        for element in elements {
            match element {
                Value::String(name) => {
                    // A bare name, unless it is the altId spelling of a
                    // member property
                    let canonical = sub_rules
                        .iter()
                        .find(|s| s.alt_id.as_deref() == Some(name.as_str()))
                        .map(|s| s.property_id().to_string())
                        .unwrap_or(name);
                    out.insert(canonical, Value::Object(Map::new()));
                }
                Value::Object(member) => {
                    let (name, entry) =
                        self.obj_array_member(member, &key, sub_rules, name_rule, defaults)?;
                    out.insert(name, Value::Object(entry));
                }
                other => {
                    out.insert(other.to_string(), Value::Object(Map::new()));
                }
            }
        }
        Ok(Some(Value::Object(out)))
    }

    /// Project one structured element of an `objArray` rule
    fn obj_array_member(
        &self,
        mut member: Map<String, Value>,
        key: &str,
        sub_rules: &[Rule],
        name_rule: Option<&Rule>,
        defaults: Defaults,
    ) -> Result<(String, Map<String, Value>)> {
        // Display name: explicit field, the name rule's altId spelling, or
        // the element's reference path
        let mut name = member
            .get("name")
            .and_then(Value::as_str)
            .map(str::to_string);

        if name.is_none()
            && let Some(alt) = name_rule.and_then(|r| r.alt_id.as_deref())
        {
            name = member.get(alt).and_then(Value::as_str).map(str::to_string);
        }
        if name.is_none() {
            name = object_reference(&member).map(str::to_string);
        }
        let mut resolved = name.unwrap_or_default();

        // The name rule may reshape the display name (quoting and the like)
        if let Some(name_rule) = name_rule {
            if defaults == Defaults::Apply {
                member.insert("name".to_string(), Value::String(resolved.clone()));
            }
            if let Some(Value::String(reshaped)) =
                self.assign_with(&mut member, key, name_rule, defaults)?
            {
                resolved = reshaped;
            }
        }

        let mut entry = Map::new();
        for sub in sub_rules {
            if sub.property_id() == "name" {
                continue;
            }
            if let Some(value) = self.assign_with(&mut member, key, sub, defaults)? {
                entry.insert(sub.property_id().to_string(), value);
            }
        }
        Ok((resolved, entry))
    }
}
