//! Task input validation
//!
//! Raw user input arrives as optional strings in a [`TaskForm`]. Every
//! field is checked and all problems are reported together, keyed by field
//! name.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{Months, NaiveDate};
use serde::Serialize;

use crate::models::{fields, NewTask, Priority, TaskEdit};

pub const TITLE_MIN_CHARS: usize = 3;
pub const TITLE_MAX_CHARS: usize = 100;
pub const DESCRIPTION_MAX_CHARS: usize = 500;
pub const CATEGORY_MAX_CHARS: usize = 50;
/// How far ahead a due date may be
pub const DUE_DATE_HORIZON_MONTHS: u32 = 24;

/// Unvalidated task fields
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskForm {
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<String>,
    pub category: Option<String>,
    pub due_date: Option<String>,
}

/// Validation failures by field
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub errors: BTreeMap<&'static str, Vec<String>>,
}

impl ValidationReport {
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    fn add(&mut self, field: &'static str, messages: Vec<String>) {
        if !messages.is_empty() {
            self.errors.entry(field).or_default().extend(messages);
        }
    }

    fn into_result<T>(self, value: T) -> Result<T, ValidationReport> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.errors {
            for message in messages {
                if !first {
                    f.write_str("; ")?;
                }
                write!(f, "{}: {}", field, message)?;
                first = false;
            }
        }
        Ok(())
    }
}

impl std::error::Error for ValidationReport {}

impl TaskForm {
    /// Validate input for a new task
    ///
    /// A missing priority defaults to medium. Blank optional fields are
    /// treated as absent.
    pub fn parse(&self, today: NaiveDate) -> Result<NewTask, ValidationReport> {
        let mut report = ValidationReport::default();

        let title = self.title.as_deref().unwrap_or("");
        report.add(fields::TITLE, validate_title(title));
        report.add(fields::DESCRIPTION, validate_description(self.description.as_deref()));
        report.add(fields::CATEGORY, validate_category(self.category.as_deref()));

        let priority = match self.priority.as_deref() {
            None => Ok(Priority::default()),
            Some(raw) => parse_priority(raw),
        };
        let due_date = parse_due_date(self.due_date.as_deref(), today);

        let priority = take(&mut report, fields::PRIORITY, priority);
        let due_date = take(&mut report, fields::DUE_DATE, due_date);

        report.into_result(NewTask {
            title: title.trim().to_string(),
            description: non_blank(self.description.as_deref()),
            priority: priority.unwrap_or_default(),
            category: non_blank(self.category.as_deref()),
            due_date: due_date.flatten(),
        })
    }

    /// Validate input for an edit
    ///
    /// Absent fields stay unchanged. A blank optional field clears it; a
    /// blank title is an error.
    pub fn parse_edit(&self, today: NaiveDate) -> Result<TaskEdit, ValidationReport> {
        let mut report = ValidationReport::default();

        if let Some(title) = self.title.as_deref() {
            report.add(fields::TITLE, validate_title(title));
        }
        report.add(fields::DESCRIPTION, validate_description(self.description.as_deref()));
        report.add(fields::CATEGORY, validate_category(self.category.as_deref()));

        let priority = self.priority.as_deref().map(parse_priority).transpose();
        let due_date = parse_due_date(self.due_date.as_deref(), today);

        let priority = take(&mut report, fields::PRIORITY, priority);
        let due_date = take(&mut report, fields::DUE_DATE, due_date);

        report.into_result(TaskEdit {
            title: self.title.as_deref().map(|t| t.trim().to_string()),
            description: self.description.as_deref().map(|d| non_blank(Some(d))),
            priority: priority.flatten(),
            category: self.category.as_deref().map(|c| non_blank(Some(c))),
            due_date: self.due_date.as_ref().and(due_date),
        })
    }
}

fn take<T>(
    report: &mut ValidationReport,
    field: &'static str,
    result: Result<T, Vec<String>>,
) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(messages) => {
            report.add(field, messages);
            None
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

pub fn validate_title(title: &str) -> Vec<String> {
    if title.trim().is_empty() {
        return vec!["Task title is required".to_string()];
    }
    let mut errors = Vec::new();
    if title.chars().count() > TITLE_MAX_CHARS {
        errors.push(format!("Title should not exceed {} characters", TITLE_MAX_CHARS));
    }
    if title.trim().chars().count() < TITLE_MIN_CHARS {
        errors.push(format!(
            "Title should be at least {} characters long",
            TITLE_MIN_CHARS
        ));
    }
    errors
}

pub fn validate_description(description: Option<&str>) -> Vec<String> {
    match description {
        Some(d) if d.chars().count() > DESCRIPTION_MAX_CHARS => vec![format!(
            "Description should not exceed {} characters",
            DESCRIPTION_MAX_CHARS
        )],
        _ => Vec::new(),
    }
}

pub fn validate_category(category: Option<&str>) -> Vec<String> {
    let category = match category {
        Some(c) if !c.trim().is_empty() => c,
        _ => return Vec::new(),
    };
    let mut errors = Vec::new();
    if category.chars().count() > CATEGORY_MAX_CHARS {
        errors.push(format!(
            "Category should not exceed {} characters",
            CATEGORY_MAX_CHARS
        ));
    }
    if !category
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c.is_whitespace())
    {
        errors.push("Category should contain only letters, numbers, and spaces".to_string());
    }
    errors
}

fn parse_priority(raw: &str) -> Result<Priority, Vec<String>> {
    raw.parse::<Priority>()
        .map_err(|_| vec!["Priority must be low, medium, or high".to_string()])
}

/// `Ok(None)` for a blank or missing date
fn parse_due_date(raw: Option<&str>, today: NaiveDate) -> Result<Option<NaiveDate>, Vec<String>> {
    let raw = match raw.map(str::trim) {
        Some(r) if !r.is_empty() => r,
        _ => return Ok(None),
    };
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| vec!["Invalid date format".to_string()])?;

    let mut errors = Vec::new();
    if date < today {
        errors.push("Due date cannot be in the past".to_string());
    }
    let horizon = today
        .checked_add_months(Months::new(DUE_DATE_HORIZON_MONTHS))
        .unwrap_or(NaiveDate::MAX);
    if date > horizon {
        errors.push("Due date should be within 2 years".to_string());
    }

    if errors.is_empty() {
        Ok(Some(date))
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
    }

    fn form(title: &str) -> TaskForm {
        TaskForm {
            title: Some(title.to_string()),
            ..TaskForm::default()
        }
    }

    #[test]
    fn test_minimal_form_is_valid() {
        let new_task = form("  Water plants ").parse(today()).unwrap();
        assert_eq!(new_task.title, "Water plants");
        assert_eq!(new_task.priority, Priority::Medium);
        assert!(new_task.description.is_none());
        assert!(new_task.due_date.is_none());
    }

    #[test]
    fn test_full_form_is_valid() {
        let new_task = TaskForm {
            title: Some("Renew passport".into()),
            description: Some("Photos first".into()),
            priority: Some("high".into()),
            category: Some("Admin 2024".into()),
            due_date: Some("2024-03-01".into()),
        }
        .parse(today())
        .unwrap();

        assert_eq!(new_task.priority, Priority::High);
        assert_eq!(new_task.category.as_deref(), Some("Admin 2024"));
        assert_eq!(new_task.due_date, Some(today()));
    }

    #[test]
    fn test_title_rules() {
        assert_eq!(validate_title("   "), vec!["Task title is required"]);
        assert_eq!(validate_title("ab"), vec!["Title should be at least 3 characters long"]);
        assert_eq!(
            validate_title(&"x".repeat(101)),
            vec!["Title should not exceed 100 characters"]
        );
        assert!(validate_title(&"x".repeat(100)).is_empty());

        let report = TaskForm::default().parse(today()).unwrap_err();
        assert_eq!(report.errors["title"], vec!["Task title is required"]);
    }

    #[test]
    fn test_errors_are_collected_per_field() {
        let report = TaskForm {
            title: Some("ok title".into()),
            description: Some("d".repeat(501)),
            priority: Some("urgent".into()),
            category: Some("work/home".into()),
            due_date: Some("2024-02-29".into()),
        }
        .parse(today())
        .unwrap_err();

        assert_eq!(
            report.errors.keys().copied().collect::<Vec<_>>(),
            vec!["category", "description", "dueDate", "priority"]
        );
        assert_eq!(report.errors["dueDate"], vec!["Due date cannot be in the past"]);
        assert!(report.to_string().contains("priority: Priority must be low, medium, or high"));
    }

    #[test]
    fn test_due_date_rules() {
        assert_eq!(parse_due_date(None, today()), Ok(None));
        assert_eq!(parse_due_date(Some(" "), today()), Ok(None));
        assert_eq!(
            parse_due_date(Some("03/15/2024"), today()),
            Err(vec!["Invalid date format".to_string()])
        );
        assert_eq!(
            parse_due_date(Some("2026-03-01"), today()),
            Ok(NaiveDate::from_ymd_opt(2026, 3, 1))
        );
        assert_eq!(
            parse_due_date(Some("2026-03-02"), today()),
            Err(vec!["Due date should be within 2 years".to_string()])
        );
    }

    #[test]
    fn test_category_rules() {
        assert!(validate_category(None).is_empty());
        assert!(validate_category(Some("")).is_empty());
        assert!(validate_category(Some("Home Office 2")).is_empty());
        assert_eq!(validate_category(Some(&"a".repeat(51))).len(), 1);
        assert_eq!(validate_category(Some("café")).len(), 1);
    }

    #[test]
    fn test_parse_edit() {
        let edit = TaskForm {
            title: None,
            description: Some("".into()),
            priority: Some("low".into()),
            category: None,
            due_date: Some("2024-04-01".into()),
        }
        .parse_edit(today())
        .unwrap();

        assert_eq!(
            edit,
            TaskEdit {
                title: None,
                description: Some(None),
                priority: Some(Priority::Low),
                category: None,
                due_date: Some(NaiveDate::from_ymd_opt(2024, 4, 1)),
            }
        );

        let cleared = TaskForm {
            due_date: Some("".into()),
            ..TaskForm::default()
        }
        .parse_edit(today())
        .unwrap();
        assert_eq!(cleared.due_date, Some(None));

        assert!(TaskForm::default().parse_edit(today()).unwrap().is_empty());
        assert!(form("no").parse_edit(today()).is_err());
    }
}
