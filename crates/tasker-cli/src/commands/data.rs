//! Data maintenance command handlers: purge, export, import, rollback

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::info;

use tasker_core::{tasks_to_xml, Database, Record, RecordId, TaskFilter};

use crate::output::Output;
use crate::prompt::confirm;

/// Delete completed tasks older than `days`
///
/// With `atomic`, the purge runs inside a transaction and is undone as a
/// whole if any single delete fails.
pub fn purge(db: &mut Database, days: u32, atomic: bool, output: &Output) -> Result<()> {
    let purged = if atomic {
        let mut tx = db.begin().context("Failed to start transaction")?;
        let purged = tx
            .delete_old_completed_tasks(days)
            .context("Purge failed; all deletions rolled back")?;
        tx.commit().context("Failed to commit purge")?;
        purged
    } else {
        db.delete_old_completed_tasks(days)
            .context("Purge failed; tasks deleted before the failure stay deleted")?
    };

    report_purge(&purged, days, output);
    Ok(())
}

fn report_purge(purged: &[Record], days: u32, output: &Output) {
    if output.is_json() {
        output.print_data(&purged);
        return;
    }
    output.success(&format!(
        "Purged {} completed task(s) older than {} day(s)",
        purged.len(),
        days
    ));
    for record in purged {
        let id = record.id().cloned().map(RecordId::from);
        let title = record.get("title").and_then(|t| t.as_str()).unwrap_or("");
        match id {
            Some(id) => output.message(&format!("  {} - {}", id, title)),
            None => output.message(&format!("  ? - {}", title)),
        }
    }
}

/// Export the database as JSON, to stdout or to a timestamped file
pub fn export(db: &Database, dir: Option<PathBuf>, output: &Output) -> Result<()> {
    match dir {
        Some(dir) => {
            let path = db
                .export_to_dir(&dir)
                .with_context(|| format!("Failed to export to {:?}", dir))?;
            if output.is_json() {
                output.print_data(&serde_json::json!({ "path": path }));
            } else if output.is_quiet() {
                println!("{}", path.display());
            } else {
                output.success(&format!("Exported database to {}", path.display()));
            }
        }
        None => {
            // Stdout export is the verbatim document regardless of format
            println!("{}", db.export_json()?);
        }
    }
    Ok(())
}

/// Replace the database with the contents of `file`
pub fn import(db: &mut Database, file: PathBuf, yes: bool, output: &Output) -> Result<()> {
    let payload =
        fs::read_to_string(&file).with_context(|| format!("Failed to read {:?}", file))?;

    if output.should_prompt() && !yes {
        println!("Importing replaces every task, user and category.");
        if !confirm("Continue?")? {
            println!("Cancelled.");
            return Ok(());
        }
    }

    let doc = db.import_json(&payload).context("Import failed")?;
    info!("Imported {:?}", file);

    if output.is_json() {
        output.print_data(&serde_json::json!({
            "tasks": doc.tasks.len(),
            "users": doc.users.len(),
            "categories": doc.categories.len(),
        }));
    } else {
        output.success(&format!(
            "Imported {} task(s), {} user(s), {} categor{}",
            doc.tasks.len(),
            doc.users.len(),
            doc.categories.len(),
            if doc.categories.len() == 1 { "y" } else { "ies" }
        ));
    }
    Ok(())
}

/// Export tasks as XML, to stdout or a file
pub fn xml(db: &Database, filter: TaskFilter, file: Option<PathBuf>, output: &Output) -> Result<()> {
    let xml = tasks_to_xml(&db.list_tasks(filter)?);

    match file {
        Some(path) => {
            fs::write(&path, xml).with_context(|| format!("Failed to write {:?}", path))?;
            if output.is_json() {
                output.print_data(&serde_json::json!({ "path": path }));
            } else {
                output.success(&format!("Wrote XML to {}", path.display()));
            }
        }
        None => print!("{}", xml),
    }
    Ok(())
}

/// Restore the snapshot left behind by an interrupted transaction
pub fn rollback(db: &mut Database, output: &Output) -> Result<()> {
    let restored = db.rollback_pending().context("Rollback failed")?;

    if output.is_json() {
        output.print_data(&serde_json::json!({ "restored": restored }));
    } else if restored {
        output.success("Restored database from pending snapshot");
    } else {
        output.message("No pending transaction to roll back.");
    }
    Ok(())
}
