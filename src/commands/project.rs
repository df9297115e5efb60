//! Project a declaration into device command properties
//!
//! Loads the rule table and the declaration, builds the processing context
//! from flags and config, and projects each entity in the declaration. A
//! declaration carrying multiple entities is projected in parallel.

use anyhow::{Context as AnyhowContext, Result};
use rayon::prelude::*;
use serde_json::Value;
use std::fs;

use crate::Context;
use crate::cli::ProjectArgs;
use crate::config::Config;
use crate::ui;
use projector::{Projection, Projector, RuleTable};

pub fn run(ctx: &Context, args: ProjectArgs) -> Result<()> {
    let config = Config::load()?;

    let table_path = args
        .table
        .clone()
        .or_else(|| config.table_path())
        .context("No rule table given (pass --table or set `table` in config.toml)")?;
    let table = RuleTable::load(&table_path)
        .with_context(|| format!("Could not load rule table {}", table_path.display()))?;

    let target_version = args
        .target_version
        .clone()
        .or_else(|| config.target_version.clone())
        .unwrap_or_else(|| "0.0.0".to_string());

    let modules: Vec<String> = match &args.modules {
        Some(list) => list
            .split(',')
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty())
            .collect(),
        None => config.modules.clone(),
    };

    if ctx.verbose > 0 && !ctx.quiet {
        ui::dim(&format!(
            "table: {} commands, {} rules; target {target_version}",
            table.len(),
            table.rule_count()
        ));
    }

    let content = fs::read_to_string(&args.declaration)
        .with_context(|| format!("Could not read {}", args.declaration.display()))?;
    let document: Value = serde_json::from_str(&content)
        .with_context(|| format!("Invalid JSON in {}", args.declaration.display()))?;

    let entities = split_entities(document);
    log::debug!(
        "projecting {} entities against `{}`",
        entities.len(),
        args.command
    );

    let proj_ctx = projector::Context::new(target_version).with_modules(modules);
    let engine = Projector::new(&proj_ctx, &table);
    let results = project_all(&engine, &entities, &args.command, args.jobs)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&results)?);
        return Ok(());
    }

    if !ctx.quiet {
        for projection in &results {
            print_projection(projection);
        }
        println!();
        ui::success(&format!("{} entities projected", results.len()));
    }
    Ok(())
}

/// Split a declaration document into (path, entity) pairs
///
/// A document is either a single entity, projected at `/`, or a wrapper
/// carrying an `entities` object keyed by entity path.
fn split_entities(document: Value) -> Vec<(String, Value)> {
    if let Value::Object(map) = &document
        && let Some(Value::Object(entities)) = map.get("entities")
    {
        return entities
            .iter()
            .map(|(path, entity)| (path.clone(), entity.clone()))
            .collect();
    }
    vec![("/".to_string(), document)]
}

/// Project every entity, in parallel when there is more than one
fn project_all(
    engine: &Projector<'_>,
    entities: &[(String, Value)],
    command: &str,
    jobs: usize,
) -> Result<Vec<Projection>> {
    if entities.len() <= 1 || jobs <= 1 {
        return entities
            .iter()
            .map(|(path, entity)| Ok(engine.project(entity, command, path)?))
            .collect();
    }

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(jobs)
        .build()
        .map_err(|e| anyhow::anyhow!("Failed to create thread pool: {}", e))?;

    pool.install(|| {
        entities
            .par_iter()
            .map(|(path, entity)| Ok(engine.project(entity, command, path)?))
            .collect()
    })
}

/// Print one projection in readable form
fn print_projection(projection: &Projection) {
    ui::header(&format!("{} ({})", projection.path, projection.command));

    if projection.properties.is_empty() {
        ui::dim("no properties");
    }
    for (id, value) in &projection.properties {
        ui::kv(id, &render_value(value));
    }

    if !projection.ignore.is_empty() {
        ui::dim(&format!("ignored: {}", projection.ignore.join(", ")));
    }
}

/// Render a property value without JSON string quoting noise
fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_split_single_entity() {
        let entities = split_entities(json!({"color": true}));
        assert_eq!(entities.len(), 1);
        assert_eq!(entities[0].0, "/");
    }

    #[test]
    fn test_split_entity_wrapper() {
        let entities = split_entities(json!({
            "entities": {
                "/tenant/app/web": {"color": true},
                "/tenant/app/api": {"size": 2}
            }
        }));
        assert_eq!(entities.len(), 2);
        assert_eq!(entities[0].0, "/tenant/app/web");
        assert_eq!(entities[1].0, "/tenant/app/api");
    }

    #[test]
    fn test_render_value() {
        assert_eq!(render_value(&json!("bright")), "bright");
        assert_eq!(render_value(&json!(10)), "10");
        assert_eq!(render_value(&json!({"a": 1})), "{\"a\":1}");
    }
}
