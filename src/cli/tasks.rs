//! Task file loading
//!
//! Reads the JSON a task source produced. Two shapes are accepted:
//! - The envelope `{"tasks": [ ... ]}`
//! - A bare array of task records
//!
//! The content must be JSON as a whole; surrounding prose is not stripped.

use crate::task::RawTask;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("File '{path}' not found")]
    NotFound { path: PathBuf },

    #[error("File '{path}' is not UTF-8 encoded")]
    NotUtf8 { path: PathBuf },

    #[error("IO error reading '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Task parsing error: {reason}")]
    Parse { reason: String },
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TaskDocument {
    Envelope { tasks: Vec<RawTask> },
    List(Vec<RawTask>),
}

/// Loads raw task records from files or strings
pub struct TaskLoader;

impl TaskLoader {
    /// Load and parse a task file
    pub fn load_file<P: AsRef<Path>>(path: P) -> Result<Vec<RawTask>, LoadError> {
        let path = path.as_ref().to_path_buf();
        debug!("Loading task file: {:?}", path);

        let content = fs::read_to_string(&path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => LoadError::NotFound { path: path.clone() },
            std::io::ErrorKind::InvalidData => LoadError::NotUtf8 { path: path.clone() },
            _ => LoadError::Io {
                path: path.clone(),
                source: e,
            },
        })?;

        let tasks = Self::parse_str(&content)?;
        debug!("Parsed {} tasks from {:?}", tasks.len(), path);
        Ok(tasks)
    }

    /// Parse task records from JSON text
    pub fn parse_str(content: &str) -> Result<Vec<RawTask>, LoadError> {
        let document: TaskDocument = serde_json::from_str(content).map_err(|e| LoadError::Parse {
            reason: Self::describe(content, &e),
        })?;

        Ok(match document {
            TaskDocument::Envelope { tasks } => tasks,
            TaskDocument::List(tasks) => tasks,
        })
    }

    /// Untagged enums swallow the inner error, so re-parse as the envelope
    /// to report a useful location when the input is at least valid JSON.
    fn describe(content: &str, error: &serde_json::Error) -> String {
        #[derive(Deserialize)]
        struct Envelope {
            #[allow(dead_code)]
            tasks: Vec<RawTask>,
        }

        match serde_json::from_str::<serde_json::Value>(content) {
            Err(syntax) => syntax.to_string(),
            Ok(serde_json::Value::Array(_)) => {
                match serde_json::from_str::<Vec<RawTask>>(content) {
                    Err(inner) => inner.to_string(),
                    Ok(_) => error.to_string(),
                }
            }
            Ok(_) => match serde_json::from_str::<Envelope>(content) {
                Err(inner) => inner.to_string(),
                Ok(_) => error.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::RawDuration;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_envelope() {
        let tasks = TaskLoader::parse_str(
            r#"{"tasks": [
                {"id": 1, "name": "Stand up", "duration": 2.5, "depends": [], "resources": ["legs"]},
                {"id": 2, "name": "Wave", "duration": "1.5", "depends": [1], "resources": ["arm"]}
            ]}"#,
        )
        .unwrap();

        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0].duration, Some(RawDuration::Seconds(2.5)));
        assert_eq!(tasks[1].duration, Some(RawDuration::Text("1.5".to_string())));
        assert_eq!(tasks[1].depends, Some(vec![1]));
    }

    #[test]
    fn test_parse_bare_array_with_missing_fields() {
        let tasks = TaskLoader::parse_str(r#"[{"id": 7, "name": "Blink"}]"#).unwrap();

        assert_eq!(tasks, vec![RawTask::new(7, "Blink")]);
        let task = tasks[0].clone().into_task().unwrap();
        assert_eq!(task.duration, 0.0);
        assert!(task.depends.is_empty());
    }

    #[test]
    fn test_parse_rejects_surrounding_prose() {
        let result = TaskLoader::parse_str("Here is your plan:\n{\"tasks\": []}");
        assert!(matches!(result, Err(LoadError::Parse { .. })));
    }

    #[test]
    fn test_parse_reports_missing_name() {
        let error = TaskLoader::parse_str(r#"{"tasks": [{"id": 1}]}"#).unwrap_err();
        assert!(error.to_string().contains("name"));
    }

    #[test]
    fn test_load_file() {
        let temp_file = NamedTempFile::new().unwrap();
        fs::write(&temp_file, r#"{"tasks": [{"id": 1, "name": "Walk", "duration": 5}]}"#)
            .unwrap();

        let tasks = TaskLoader::load_file(temp_file.path()).unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].name, "Walk");
    }

    #[test]
    fn test_load_missing_file() {
        let result = TaskLoader::load_file("/nonexistent/taskplan/tasks.json");
        assert!(matches!(result, Err(LoadError::NotFound { .. })));
    }

    #[test]
    fn test_load_binary_file() {
        let temp_file = NamedTempFile::new().unwrap();
        fs::write(&temp_file, [0xFF, 0xFE, 0x00, 0x01]).unwrap();

        let result = TaskLoader::load_file(temp_file.path());
        assert!(matches!(result, Err(LoadError::NotUtf8 { .. })));
    }
}
