//! Uniform result shape for collaborators
//!
//! Success: `{"success": true, "data": ...}`.
//! Failure: `{"success": false, "error": "...", "kind": "..."}`.

use serde::Serialize;

use crate::error::{DbError, DbResult};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Response<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

impl<T> Response<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            kind: None,
        }
    }

    pub fn failure(kind: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
            kind: Some(kind.into()),
        }
    }
}

impl<T> From<DbError> for Response<T> {
    fn from(error: DbError) -> Self {
        Response::failure(error.kind(), error.to_string())
    }
}

impl<T> From<DbResult<T>> for Response<T> {
    fn from(result: DbResult<T>) -> Self {
        match result {
            Ok(data) => Response::ok(data),
            Err(e) => e.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_success_shape() {
        let result: DbResult<Vec<u32>> = Ok(vec![1, 2]);
        let response = Response::from(result);
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({"success": true, "data": [1, 2]})
        );
    }

    #[test]
    fn test_failure_shape() {
        let result: DbResult<()> = Err(DbError::RecordNotFound {
            table: "tasks".into(),
            id: "7".into(),
        });
        let response = Response::from(result);

        assert!(!response.success);
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({
                "success": false,
                "error": "Record not found: 7 in table 'tasks'",
                "kind": "record_not_found"
            })
        );
    }
}
