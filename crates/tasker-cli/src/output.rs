//! Output formatting for CLI
//!
//! Provides consistent output formatting across all commands:
//! - Human-readable default output
//! - JSON output (--json flag), always in the `{success, data|error}` shape
//! - Quiet mode for scripting (--quiet flag)

use serde::Serialize;

use tasker_core::{DbError, Response, StorageError, Task, ValidationReport};

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable output (default)
    Human,
    /// JSON output
    Json,
    /// Quiet mode - minimal output
    Quiet,
}

impl OutputFormat {
    /// Create format from CLI flags
    pub fn from_flags(json: bool, quiet: bool) -> Self {
        if quiet {
            OutputFormat::Quiet
        } else if json {
            OutputFormat::Json
        } else {
            OutputFormat::Human
        }
    }
}

/// Output helper for consistent formatting
pub struct Output {
    /// The output format
    pub format: OutputFormat,
}

impl Output {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Check if output is in quiet mode
    pub fn is_quiet(&self) -> bool {
        matches!(self.format, OutputFormat::Quiet)
    }

    pub fn is_json(&self) -> bool {
        matches!(self.format, OutputFormat::Json)
    }

    /// Print `data` wrapped in a success response
    pub fn print_data<T: Serialize>(&self, data: &T) {
        print_json(&Response::ok(data));
    }

    /// Print a single task
    pub fn print_task(&self, task: &Task) {
        match self.format {
            OutputFormat::Human => {
                println!("ID:          {}", task.id);
                println!("Title:       {}", task.title);
                if let Some(ref desc) = task.description {
                    println!("Description: {}", desc);
                }
                println!("Priority:    {}", task.priority);
                if let Some(ref category) = task.category {
                    println!("Category:    {}", category);
                }
                if let Some(due) = task.due_date {
                    println!("Due:         {}", due.format("%Y-%m-%d"));
                }
                println!(
                    "Status:      {}",
                    if task.completed { "completed" } else { "pending" }
                );
                println!("Created:     {}", task.created_at.format("%Y-%m-%d %H:%M"));
                println!("Updated:     {}", task.updated_at.format("%Y-%m-%d %H:%M"));
            }
            OutputFormat::Json => self.print_data(task),
            OutputFormat::Quiet => {
                println!("{}", task.id);
            }
        }
    }

    /// Print a list of tasks
    pub fn print_tasks(&self, tasks: &[Task]) {
        match self.format {
            OutputFormat::Human => {
                if tasks.is_empty() {
                    println!("No tasks found.");
                    return;
                }
                for task in tasks {
                    println!("{}", task_line(task));
                }
                println!("\n{} task(s)", tasks.len());
            }
            OutputFormat::Json => self.print_data(&tasks),
            OutputFormat::Quiet => {
                for task in tasks {
                    println!("{}", task.id);
                }
            }
        }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        match self.format {
            OutputFormat::Human => println!("✓ {}", message),
            OutputFormat::Json => self.print_data(&serde_json::json!({ "message": message })),
            OutputFormat::Quiet => {}
        }
    }

    /// Check if we should prompt for confirmation
    pub fn should_prompt(&self) -> bool {
        self.format == OutputFormat::Human
    }

    /// Print an informational message
    pub fn message(&self, msg: &str) {
        if self.format == OutputFormat::Human {
            println!("{}", msg);
        }
    }

    /// Print a warning to stderr (suppressed in quiet mode)
    pub fn warn(&self, msg: &str) {
        if !self.is_quiet() {
            eprintln!("⚠ {}", msg);
        }
    }

    /// Report a failed command
    pub fn error(&self, error: &anyhow::Error) {
        match self.format {
            OutputFormat::Json => {
                print_json(&Response::<()>::failure(error_kind(error), format!("{:#}", error)));
            }
            OutputFormat::Human | OutputFormat::Quiet => {
                eprintln!("Error: {:#}", error);
                if let Some(hint) = recovery_hint(error) {
                    eprintln!("Hint: {}", hint);
                }
            }
        }
    }
}

/// Stable kind string for a command failure
pub fn error_kind(error: &anyhow::Error) -> &'static str {
    if let Some(db_error) = error.downcast_ref::<DbError>() {
        db_error.kind()
    } else if error.downcast_ref::<ValidationReport>().is_some() {
        "validation"
    } else {
        "error"
    }
}

/// Recovery suggestion for storage failures, wherever they sit in the chain
fn recovery_hint(error: &anyhow::Error) -> Option<&'static str> {
    error.chain().find_map(|cause| {
        let storage = match cause.downcast_ref::<DbError>() {
            Some(DbError::Storage(e)) => Some(e),
            _ => cause.downcast_ref::<StorageError>(),
        };
        storage.and_then(StorageError::recovery_suggestion)
    })
}

fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Error: failed to serialize output: {}", e),
    }
}

/// One-line summary used by task listings
fn task_line(task: &Task) -> String {
    let due = task
        .due_date
        .map(|d| format!(" | due {}", d.format("%Y-%m-%d")))
        .unwrap_or_default();
    let category = task
        .category
        .as_deref()
        .map(|c| format!(" | {}", truncate(c, 15)))
        .unwrap_or_default();

    format!(
        "{} | [{}] | {:<6} | {}{}{}",
        task.id,
        if task.completed { "x" } else { " " },
        task.priority.as_str(),
        truncate(&task.title, 40),
        category,
        due
    )
}

/// Truncate a string to max characters, adding "..." if truncated
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
