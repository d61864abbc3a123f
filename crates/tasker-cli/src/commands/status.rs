//! Status command handlers: init and stats

use anyhow::{Context, Result};

use tasker_core::storage::open_backend;
use tasker_core::{Config, Database};

use crate::output::{Output, OutputFormat};

/// Create an empty database if none exists
pub fn init(config: &Config, output: &Output) -> Result<()> {
    let store = open_backend(config).context("Failed to open storage backend")?;
    let mut db = Database::new(store);
    let created = db.initialize().context("Failed to initialize database")?;

    match output.format {
        OutputFormat::Json => output.print_data(&serde_json::json!({
            "created": created,
            "backend": db.backend_name(),
            "data_dir": config.data_dir,
        })),
        OutputFormat::Quiet => {}
        OutputFormat::Human => {
            if created {
                output.success(&format!(
                    "Initialized empty database ({} backend)",
                    db.backend_name()
                ));
            } else {
                println!("Already initialized.");
            }
            println!("Data directory: {}", config.data_dir.display());
        }
    }

    Ok(())
}

/// Show database statistics
pub fn stats(db: &Database, config: &Config, output: &Output) -> Result<()> {
    let stats = db.get_database_stats()?;
    let pending_snapshot = db.has_pending_transaction()?;

    match output.format {
        OutputFormat::Json => output.print_data(&serde_json::json!({
            "backend": db.backend_name(),
            "data_dir": config.data_dir,
            "pending_transaction": pending_snapshot,
            "stats": stats,
        })),
        OutputFormat::Quiet => {
            println!("{}", stats.total_tasks);
        }
        OutputFormat::Human => {
            println!("Tasker Status");
            println!("=============");
            println!();
            println!("Storage:");
            println!("  Backend:  {}", db.backend_name());
            println!("  Location: {}", config.data_dir.display());
            println!("  Size:     {}", stats.database_size_human());
            if pending_snapshot {
                println!("  Snapshot: pending (run `tasker rollback` to restore it)");
            }
            println!();
            println!("Tasks:");
            println!("  Total:     {}", stats.total_tasks);
            println!("  Completed: {}", stats.completed_tasks);
            println!("  Pending:   {}", stats.pending_tasks);
            println!();
            println!("Priority:");
            println!("  High:   {}", stats.high_priority);
            println!("  Medium: {}", stats.medium_priority);
            println!("  Low:    {}", stats.low_priority);
        }
    }

    Ok(())
}
