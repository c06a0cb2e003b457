use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::{ApiError, ApiResult};

/// Message the server attaches to an upload whose content is already stored
pub const DUPLICATE_MESSAGE: &str = "File already exists";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    pub id: String,
    pub original_filename: String,
    pub file_type: String,
    pub size: u64,
    pub uploaded_at: String,
    /// Storage locator (usually a URL) of the stored content
    pub file: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_count: Option<u32>,

    // Only present on an upload response that hit an existing file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_saved: Option<u64>,
}

impl FileRecord {
    pub fn is_duplicate_notice(&self) -> bool {
        self.message.as_deref() == Some(DUPLICATE_MESSAGE)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    Created(FileRecord),
    Duplicate { record: FileRecord, storage_saved: u64 },
}

impl UploadOutcome {
    pub fn record(&self) -> &FileRecord {
        match self {
            UploadOutcome::Created(record) => record,
            UploadOutcome::Duplicate { record, .. } => record,
        }
    }

    /// Interpret an upload response body.
    ///
    /// A duplicate arrives either as a flat record carrying `message` and
    /// `storage_saved`, or as `{"message", "file": {record}, "storage_saved"}`.
    pub fn from_json(value: Value) -> ApiResult<Self> {
        let nested = value.get("file").map(Value::is_object).unwrap_or(false);

        let record: FileRecord = if nested {
            let message = value.get("message").and_then(Value::as_str).map(str::to_string);
            let storage_saved = value.get("storage_saved").and_then(Value::as_u64);
            let inner = value.get("file").cloned().unwrap_or(Value::Null);
            let mut record: FileRecord = serde_json::from_value(inner)
                .map_err(|e| ApiError::MalformedResponse(format!("upload response: {}", e)))?;
            record.message = message.or(record.message);
            record.storage_saved = storage_saved.or(record.storage_saved);
            record
        } else {
            serde_json::from_value(value)
                .map_err(|e| ApiError::MalformedResponse(format!("upload response: {}", e)))?
        };

        if record.is_duplicate_notice() {
            let storage_saved = record.storage_saved.unwrap_or(0);
            Ok(UploadOutcome::Duplicate { record, storage_saved })
        } else {
            Ok(UploadOutcome::Created(record))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record_json(id: &str) -> Value {
        json!({
            "id": id,
            "original_filename": "report.pdf",
            "file_type": "application/pdf",
            "size": 2048,
            "uploaded_at": "2024-01-05T15:07:00Z",
            "file": "http://localhost:8000/media/uploads/abc.pdf",
            "file_hash": "deadbeef",
            "reference_count": 1
        })
    }

    #[test]
    fn plain_record_is_created() {
        let outcome = UploadOutcome::from_json(record_json("1")).unwrap();
        assert!(matches!(outcome, UploadOutcome::Created(ref r) if r.id == "1"));
    }

    #[test]
    fn nested_duplicate_response_is_flattened() {
        let body = json!({
            "message": "File already exists",
            "file": record_json("7"),
            "storage_saved": 2048
        });

        match UploadOutcome::from_json(body).unwrap() {
            UploadOutcome::Duplicate { record, storage_saved } => {
                assert_eq!(record.id, "7");
                assert_eq!(storage_saved, 2048);
                assert_eq!(record.storage_saved, Some(2048));
            }
            other => panic!("expected duplicate, got {:?}", other),
        }
    }

    #[test]
    fn flat_duplicate_response_is_recognized() {
        let mut body = record_json("9");
        body["message"] = json!("File already exists");
        body["storage_saved"] = json!(10);

        let outcome = UploadOutcome::from_json(body).unwrap();
        assert_eq!(outcome.record().id, "9");
        assert!(matches!(outcome, UploadOutcome::Duplicate { storage_saved: 10, .. }));
    }

    #[test]
    fn negative_size_is_rejected() {
        let mut body = record_json("1");
        body["size"] = json!(-1);
        assert!(UploadOutcome::from_json(body).is_err());
    }
}
