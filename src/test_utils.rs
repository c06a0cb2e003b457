use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::models::FileRecord;
use crate::services::file_list::Prompt;

static RECORD_COUNTER: AtomicUsize = AtomicUsize::new(0);

/// Listing entry as the server would send it
pub fn sample_record_json(id: &str, name: &str) -> Value {
    let n = RECORD_COUNTER.fetch_add(1, Ordering::SeqCst);
    json!({
        "id": id,
        "original_filename": name,
        "file_type": mime_guess::from_path(name).first_or_octet_stream().essence_str(),
        "size": 1024 * (n as u64 + 1),
        "uploaded_at": "2024-01-05T15:07:00Z",
        "file": format!("/media/uploads/{}", name),
        "file_hash": format!("{:064x}", n),
        "reference_count": 1
    })
}

pub fn sample_record(id: &str, name: &str) -> FileRecord {
    serde_json::from_value(sample_record_json(id, name)).expect("sample record is valid")
}

/// Prompt with a fixed answer that records what it was asked
pub struct ScriptedPrompt {
    answer: bool,
    questions: Mutex<Vec<String>>,
    alerts: Mutex<Vec<String>>,
}

impl ScriptedPrompt {
    pub fn accepting() -> Self {
        Self::answering(true)
    }

    pub fn declining() -> Self {
        Self::answering(false)
    }

    fn answering(answer: bool) -> Self {
        Self { answer, questions: Mutex::new(Vec::new()), alerts: Mutex::new(Vec::new()) }
    }

    pub fn questions(&self) -> Vec<String> {
        self.questions.lock().map(|q| q.clone()).unwrap_or_default()
    }

    pub fn alerts(&self) -> Vec<String> {
        self.alerts.lock().map(|a| a.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Prompt for ScriptedPrompt {
    async fn confirm(&self, message: &str) -> bool {
        if let Ok(mut questions) = self.questions.lock() {
            questions.push(message.to_string());
        }
        self.answer
    }

    async fn alert(&self, message: &str) {
        if let Ok(mut alerts) = self.alerts.lock() {
            alerts.push(message.to_string());
        }
    }
}
