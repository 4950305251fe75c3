use serde::{Deserialize, Serialize};

use crate::options::Visibility;

/// Coarse classification of a failed store call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    PermissionDenied,
    Transient,
    Unsupported,
    InvalidArgument,
    Unknown,
}

#[derive(Clone, Debug, thiserror::Error)]
#[error("{message}")]
pub struct FSError {
    pub kind: ErrorKind,
    pub message: String,
}

impl FSError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unsupported, message)
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidArgument, message)
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unknown, message)
    }

    pub fn is_not_found(&self) -> bool {
        self.kind == ErrorKind::NotFound
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    File,
    Dir,
}

/// One row of a directory listing. `size` is only known for files.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    #[serde(rename = "type")]
    pub kind: EntryType,
    pub path: String,
    pub timestamp: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

impl Entry {
    pub fn file(path: String, timestamp: i64, size: u64) -> Self {
        Self {
            kind: EntryType::File,
            path,
            timestamp,
            size: Some(size),
        }
    }

    pub fn dir(path: String, timestamp: i64) -> Self {
        Self {
            kind: EntryType::Dir,
            path,
            timestamp,
            size: None,
        }
    }

    pub fn is_dir(&self) -> bool {
        self.kind == EntryType::Dir
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectMetadata {
    #[serde(rename = "type")]
    pub kind: EntryType,
    pub dirname: String,
    pub path: String,
    pub timestamp: i64,
    pub mimetype: String,
    pub size: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct WriteResult {
    #[serde(rename = "type")]
    pub kind: EntryType,
    pub path: String,
    #[serde(skip)]
    pub contents: Vec<u8>,
    pub mimetype: String,
    pub size: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visibility: Option<Visibility>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReadResult {
    pub contents: Vec<u8>,
    pub path: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DirResult {
    pub path: String,
    #[serde(rename = "type")]
    pub kind: EntryType,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_json_shape() {
        let cases = vec![
            (
                Entry::file("a/1.txt".to_string(), 10, 3),
                r#"{"type":"file","path":"a/1.txt","timestamp":10,"size":3}"#,
            ),
            (
                Entry::dir("a/b".to_string(), 0),
                r#"{"type":"dir","path":"a/b","timestamp":0}"#,
            ),
        ];

        for (entry, expected) in cases {
            let result = serde_json::to_string(&entry).unwrap();
            assert_eq!(result, expected, "failed for case: {}", entry.path);
        }
    }

    #[test]
    fn test_error_kind() {
        assert!(FSError::not_found("gone").is_not_found());
        assert!(!FSError::unknown("boom").is_not_found());
        assert_eq!(FSError::unsupported("nope").to_string(), "nope");
    }
}
