use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

// Task as returned by GET /api/todos
#[derive(Clone, Deserialize, Serialize, Debug, PartialEq)]
pub struct Task {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub completed: bool,
    #[serde(rename = "createdAt", default)]
    pub created_at: String,
}

impl Task {
    /// Creation time in local time, or the server's text when it is not RFC 3339.
    pub fn created_display(&self) -> String {
        match DateTime::parse_from_rfc3339(&self.created_at) {
            Ok(ts) => ts
                .with_timezone(&Local)
                .format("%Y-%m-%d %H:%M:%S")
                .to_string(),
            Err(_) => self.created_at.clone(),
        }
    }
}

// Body of POST /api/todos
#[derive(Clone, Serialize, Debug, PartialEq)]
pub struct NewTask {
    pub title: String,
    pub description: String,
}

// Partial body of PUT /api/todos/{id}
#[derive(Clone, Serialize, Debug, Default, PartialEq)]
pub struct TaskPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
}

impl TaskPatch {
    pub fn completed(completed: bool) -> Self {
        TaskPatch {
            completed: Some(completed),
            ..Default::default()
        }
    }

    pub fn text(title: &str, description: &str) -> Self {
        TaskPatch {
            title: Some(title.to_string()),
            description: Some(description.to_string()),
            completed: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_task_from_server_json() {
        let raw = r#"[
            {"id": 1, "title": "Buy milk", "completed": false, "createdAt": "2024-05-01T10:00:00Z"},
            {"id": 2, "title": "Call mom", "description": "Sunday", "completed": true, "createdAt": "yesterday"}
        ]"#;
        let tasks: Vec<Task> = serde_json::from_str(raw).unwrap();

        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0].description, None);
        assert_eq!(tasks[1].description.as_deref(), Some("Sunday"));
        assert!(tasks[1].completed);
        assert_eq!(tasks[1].created_display(), "yesterday");
    }

    #[test]
    fn test_created_display_parses_rfc3339() {
        let task = Task {
            id: 1,
            title: "Buy milk".to_string(),
            description: None,
            completed: false,
            created_at: "2024-05-01T10:00:00Z".to_string(),
        };
        let shown = task.created_display();
        assert_ne!(shown, task.created_at);
        assert!(shown.starts_with("2024-05-0"));
    }

    #[test]
    fn test_toggle_patch_only_carries_completed() {
        let body = serde_json::to_value(TaskPatch::completed(true)).unwrap();
        assert_eq!(body, json!({"completed": true}));
    }

    #[test]
    fn test_edit_patch_carries_title_and_description() {
        let body = serde_json::to_value(TaskPatch::text("A", "")).unwrap();
        assert_eq!(body, json!({"title": "A", "description": ""}));
    }
}
