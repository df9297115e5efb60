//! Validate a rule table for internal consistency
//!
//! Reports the authoring errors a projection would otherwise hit at
//! runtime: `requiredModules` without `anyOf`, and nested rules whose
//! sub-command key has no table entry.

use anyhow::{Context as AnyhowContext, Result, bail};

use crate::Context;
use crate::cli::CheckArgs;
use crate::config::Config;
use crate::ui;
use projector::RuleTable;

pub fn run(ctx: &Context, args: CheckArgs) -> Result<()> {
    let config = Config::load()?;

    let table_path = args
        .table
        .clone()
        .or_else(|| config.table_path())
        .context("No rule table given (pass a path or set `table` in config.toml)")?;

    let table = RuleTable::load(&table_path)
        .with_context(|| format!("Could not load rule table {}", table_path.display()))?;

    let issues = table.validate();
    if issues.is_empty() {
        if !ctx.quiet {
            ui::success(&format!(
                "{}: {} commands, {} rules, no issues",
                table_path.display(),
                table.len(),
                table.rule_count()
            ));
        }
        return Ok(());
    }

    for issue in &issues {
        ui::error(issue);
    }
    bail!("{} issue(s) found in {}", issues.len(), table_path.display())
}

#[cfg(test)]
mod tests {
    use projector::RuleTable;
    use std::io::Write;

    #[test]
    fn test_load_table_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"widget": [{{"id": "size", "default": 10}}]}}"#
        )
        .unwrap();

        let table = RuleTable::load(file.path()).unwrap();
        assert_eq!(table.len(), 1);
        assert!(table.validate().is_empty());
    }

    #[test]
    fn test_load_rejects_invalid_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        assert!(RuleTable::load(file.path()).is_err());
    }
}
