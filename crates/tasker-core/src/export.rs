//! Export and import
//!
//! JSON export is the stored document exactly as serialized. Import takes
//! such a payload and replaces the whole document. XML export renders the
//! tasks table for other tools.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::clock::format_timestamp;
use crate::database::Database;
use crate::document::{Document, DB_KEY};
use crate::error::{DbError, DbResult};
use crate::models::Task;
use crate::storage::file::atomic_write;

/// File name for an export taken at `unix_ms`
pub fn export_file_name(unix_ms: i64) -> String {
    format!("task_database_{}.json", unix_ms)
}

impl Database {
    /// The stored document, verbatim
    pub fn export_json(&self) -> DbResult<String> {
        self.raw_document()
    }

    /// Write the stored document to `dir/task_database_<unix-ms>.json`
    pub fn export_to_dir(&self, dir: &Path) -> DbResult<PathBuf> {
        let json = self.export_json()?;
        let path = dir.join(export_file_name(self.now().timestamp_millis()));
        atomic_write(&path, json.as_bytes())?;
        info!("Exported database to {}", path.display());
        Ok(path)
    }

    /// Replace the whole document with `payload`
    ///
    /// The payload must parse as a complete document (all three tables and
    /// metadata). On failure nothing is written. The payload is stored as
    /// given, so importing an export reproduces it exactly.
    pub fn import_json(&mut self, payload: &str) -> DbResult<Document> {
        let doc =
            Document::from_json(payload).map_err(|e| DbError::MalformedPayload(e.to_string()))?;

        self.store_mut().set(DB_KEY, payload)?;
        info!(
            "Imported database: {} task(s), {} user(s), {} category record(s)",
            doc.tasks.len(),
            doc.users.len(),
            doc.categories.len()
        );
        Ok(doc)
    }
}

/// Render tasks as an XML document
pub fn tasks_to_xml(tasks: &[Task]) -> String {
    let mut xml = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<tasks>\n");

    for task in tasks {
        let due_date = task
            .due_date
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default();

        xml.push_str("  <task>\n");
        push_element(&mut xml, "id", &task.id.to_string());
        push_element(&mut xml, "title", &task.title);
        push_element(&mut xml, "description", task.description.as_deref().unwrap_or(""));
        push_element(&mut xml, "priority", task.priority.as_str());
        push_element(&mut xml, "category", task.category.as_deref().unwrap_or(""));
        push_element(&mut xml, "dueDate", &due_date);
        push_element(&mut xml, "completed", if task.completed { "true" } else { "false" });
        push_element(&mut xml, "createdAt", &format_timestamp(task.created_at));
        xml.push_str("  </task>\n");
    }

    xml.push_str("</tasks>\n");
    xml
}

fn push_element(xml: &mut String, name: &str, value: &str) {
    xml.push_str(&format!("    <{0}>{1}</{0}>\n", name, escape_xml(value)));
}

/// Escape the five XML special characters
pub fn escape_xml(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '&' => escaped.push_str("&amp;"),
            '\'' => escaped.push_str("&apos;"),
            '"' => escaped.push_str("&quot;"),
            other => escaped.push(other),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Record, Table};
    use crate::models::{NewTask, Priority, TaskFilter};
    use tempfile::TempDir;

    fn seeded() -> Database {
        let mut db = Database::in_memory().unwrap();
        db.add_new_task(NewTask::new("Write report").with_priority(Priority::High))
            .unwrap();
        db.insert(Table::Users, Record::new().with("id", "admin").with("name", "Ada"))
            .unwrap();
        db
    }

    #[test]
    fn test_export_then_import_reproduces_document() {
        let source = seeded();
        let exported = source.export_json().unwrap();

        let mut target = Database::in_memory().unwrap();
        target.import_json(&exported).unwrap();

        assert_eq!(target.export_json().unwrap(), exported);
        assert_eq!(target.load().unwrap(), source.load().unwrap());
    }

    #[test]
    fn test_malformed_import_leaves_state_untouched() {
        let mut db = seeded();
        let before = db.export_json().unwrap();

        for payload in [
            "{not json",
            "[]",
            r#"{"tasks":[],"users":[],"metadata":{"created":"x","version":1}}"#,
        ] {
            let err = db.import_json(payload).unwrap_err();
            assert!(matches!(err, DbError::MalformedPayload(_)), "{}", payload);
        }

        assert_eq!(db.export_json().unwrap(), before);
    }

    #[test]
    fn test_import_initializes_empty_store() {
        let payload = seeded().export_json().unwrap();
        let mut db = Database::new(Box::new(crate::storage::MemoryStore::new()));

        db.import_json(&payload).unwrap();
        assert_eq!(db.list_tasks(TaskFilter::All).unwrap().len(), 1);
    }

    #[test]
    fn test_export_to_dir() {
        let temp_dir = TempDir::new().unwrap();
        let db = seeded();

        let path = db.export_to_dir(temp_dir.path()).unwrap();
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("task_database_"));
        assert!(name.ends_with(".json"));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), db.export_json().unwrap());
    }

    #[test]
    fn test_escape_xml() {
        assert_eq!(
            escape_xml(r#"<a href="x">Tom & Jerry's</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; Jerry&apos;s&lt;/a&gt;"
        );
        assert_eq!(escape_xml("plain"), "plain");
    }

    #[test]
    fn test_tasks_to_xml() {
        let mut db = Database::in_memory().unwrap();
        let mut new_task = NewTask::new("Fix <b> & ship");
        new_task.category = Some("Work".into());
        db.add_new_task(new_task).unwrap();

        let xml = tasks_to_xml(&db.list_tasks(TaskFilter::All).unwrap());
        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<tasks>\n"));
        assert!(xml.contains("<title>Fix &lt;b&gt; &amp; ship</title>"));
        assert!(xml.contains("<description></description>"));
        assert!(xml.contains("<priority>medium</priority>"));
        assert!(xml.contains("<category>Work</category>"));
        assert!(xml.contains("<completed>false</completed>"));
        assert!(xml.trim_end().ends_with("</tasks>"));
        assert_eq!(tasks_to_xml(&[]), "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<tasks>\n</tasks>\n");
    }
}
