//! # Projector
//!
//! Schema-driven projection of declarative entities onto device command
//! properties.
//!
//! This crate converts a nested, user-facing declarative object into the
//! flat property assignments of a structured device command language. The
//! conversion is driven entirely by an external rule table: one rule per
//! target property, describing where the value comes from, how it defaults,
//! which target versions and feature modules it applies to, and how nested
//! structures recurse.
//!
//! ## Core Concepts
//!
//! - **Rule**: how one target property derives its value ([`Rule`])
//! - **Rule table**: command name to ordered rule list, injected through
//!   the [`RuleLookup`] trait ([`RuleTable`] is the JSON-backed default)
//! - **Context**: read-only environment facts -- target version and
//!   provisioned modules ([`Context`])
//! - **Projector**: binds a context and a table; projects one entity per
//!   call ([`Projector`])
//! - **Projection**: the flattened result -- properties plus the property
//!   paths the caller asked to ignore ([`Projection`])
//!
//! ## Example
//!
//! ```ignore
//! use projector::{Context, Projector, RuleTable};
//! use serde_json::json;
//!
//! let table = RuleTable::from_value(json!({
//!     "widget": [
//!         {"id": "size", "default": 10},
//!         {"id": "color", "truth": "bright", "falsehood": "dim"}
//!     ]
//! }))?;
//!
//! let ctx = Context::new("15.1").with_modules(["ltm"]);
//! let projector = Projector::new(&ctx, &table);
//!
//! let out = projector.project(&json!({"color": true}), "widget", "/app/w1")?;
//! assert_eq!(out.properties["size"], json!(10));
//! assert_eq!(out.properties["color"], json!("bright"));
//! ```
//!
//! The engine is purely synchronous and never mutates the caller's value:
//! each projection works on an owned copy of the declaration. Concurrent
//! projections over distinct entities are safe by construction.

pub mod context;
pub mod entity;
pub mod error;
pub mod property;
pub mod quote;
pub mod rule;
pub mod value;

// Re-export main types at crate root
pub use context::{Context, version_less_than};
pub use entity::Projection;
pub use error::{Error, Result};
pub use property::Projector;
pub use quote::{quote, strip_quotes};
pub use rule::{
    ABSOLUTE_PREFIX, Extend, RequiredModules, Rule, RuleKey, RuleLookup, RuleTable,
};
pub use value::NONE_TOKEN;
