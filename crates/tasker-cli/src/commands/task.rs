//! Task command handlers

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use tracing::debug;

use tasker_core::{Database, RecordId, Task, TaskFilter, TaskForm};

use crate::output::Output;
use crate::prompt::{confirm, prompt_with_default};

/// Fields given on the command line for `add` and `edit`
#[derive(Debug, Default)]
pub struct TaskFields {
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<String>,
    pub category: Option<String>,
    pub due: Option<String>,
}

impl TaskFields {
    fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.priority.is_none()
            && self.category.is_none()
            && self.due.is_none()
    }

    fn into_form(self) -> TaskForm {
        TaskForm {
            title: self.title,
            description: self.description,
            priority: self.priority,
            category: self.category,
            due_date: self.due,
        }
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Create a new task
pub fn add(db: &mut Database, fields: TaskFields, output: &Output) -> Result<()> {
    let new_task = fields.into_form().parse(today())?;
    let task = db.add_new_task(new_task).context("Failed to create task")?;

    if !output.is_json() {
        output.success(&format!("Created task: {}", task.id));
    }
    output.print_task(&task);
    Ok(())
}

/// List tasks
pub fn list(db: &Database, filter: TaskFilter, output: &Output) -> Result<()> {
    let tasks = db.list_tasks(filter)?;
    output.print_tasks(&tasks);
    Ok(())
}

/// Show a single task
pub fn show(db: &Database, id: String, output: &Output) -> Result<()> {
    let task = db.get_task(RecordId::parse(&id))?;
    output.print_task(&task);
    Ok(())
}

/// Edit a task
///
/// With no field flags in human mode, prompts for each field.
pub fn edit(db: &mut Database, id: String, fields: TaskFields, output: &Output) -> Result<()> {
    let id = RecordId::parse(&id);
    let current = db.get_task(&id)?;

    let fields = if fields.is_empty() && output.should_prompt() {
        prompt_fields(&current)?
    } else {
        fields
    };

    let edit = fields.into_form().parse_edit(today())?;
    if edit.is_empty() {
        output.message("Nothing to change.");
        return Ok(());
    }

    let task = db.edit_task(&id, edit).context("Failed to update task")?;

    if !output.is_json() {
        output.success("Task updated");
    }
    output.print_task(&task);
    Ok(())
}

fn prompt_fields(task: &Task) -> Result<TaskFields> {
    println!("Editing task: {}", task.id);
    println!("Press Enter to keep current value, '-' to clear it.\n");

    let due = task
        .due_date
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default();

    Ok(TaskFields {
        title: prompt_with_default("Title", &task.title)?,
        description: prompt_with_default(
            "Description",
            task.description.as_deref().unwrap_or(""),
        )?,
        priority: prompt_with_default("Priority (low/medium/high)", task.priority.as_str())?,
        category: prompt_with_default("Category", task.category.as_deref().unwrap_or(""))?,
        due: prompt_with_default("Due date (YYYY-MM-DD)", &due)?,
    })
}

/// Mark a task completed or pending
pub fn set_status(db: &mut Database, id: String, completed: bool, output: &Output) -> Result<()> {
    let task = db
        .update_task_status(RecordId::parse(&id), completed)
        .context("Failed to update task status")?;
    report_status(&task, output);
    Ok(())
}

/// Flip a task between completed and pending
pub fn toggle(db: &mut Database, id: String, output: &Output) -> Result<()> {
    let task = db
        .toggle_task(RecordId::parse(&id))
        .context("Failed to toggle task")?;
    report_status(&task, output);
    Ok(())
}

fn report_status(task: &Task, output: &Output) {
    if output.is_json() {
        output.print_task(task);
        return;
    }
    let state = if task.completed { "completed" } else { "pending" };
    output.success(&format!("Task {} marked {}: {}", task.id, state, task.title));
}

/// Delete a task
pub fn delete(db: &mut Database, id: String, yes: bool, output: &Output) -> Result<()> {
    let id = RecordId::parse(&id);
    let task = db.get_task(&id)?;

    // Confirm deletion
    if output.should_prompt() && !yes {
        println!("Delete task: {} - {}", task.id, task.title);
        if !confirm("Are you sure?")? {
            println!("Cancelled.");
            return Ok(());
        }
    }

    let message = db.delete_task(&id).context("Failed to delete task")?;
    debug!("{} ({})", message, id);

    output.success(&format!("Deleted task: {}", task.id));
    Ok(())
}

/// Show the top high-priority pending tasks
pub fn top(db: &Database, output: &Output) -> Result<()> {
    let tasks = db.get_top_priority_tasks()?;
    output.print_tasks(&tasks);
    Ok(())
}
