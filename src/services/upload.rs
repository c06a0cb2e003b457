use sha2::{Digest, Sha256};
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

use crate::format::format_kilobytes;
use crate::models::{FileRecord, UploadOutcome};
use crate::services::api::FileApiClient;

pub const NO_FILE_SELECTED: &str = "Please select a file";
pub const UPLOAD_FAILED: &str = "Failed to upload file. Please try again.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateInfo {
    pub record: FileRecord,
    pub storage_saved: u64,
}

impl DuplicateInfo {
    pub fn notice(&self) -> String {
        format!(
            "This file already exists in the system. Storage saved: {} KB",
            format_kilobytes(self.storage_saved)
        )
    }
}

/// File picker and upload feedback: the selected path, the last error and the
/// duplicate notice from the server.
pub struct UploadPanel {
    api: FileApiClient,
    selected: Option<PathBuf>,
    error: Option<String>,
    duplicate: Option<DuplicateInfo>,
    uploading: bool,
}

impl UploadPanel {
    pub fn new(api: FileApiClient) -> Self {
        Self { api, selected: None, error: None, duplicate: None, uploading: false }
    }

    pub fn selected(&self) -> Option<&Path> {
        self.selected.as_deref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn duplicate(&self) -> Option<&DuplicateInfo> {
        self.duplicate.as_ref()
    }

    pub fn is_uploading(&self) -> bool {
        self.uploading
    }

    pub fn select(&mut self, path: impl Into<PathBuf>) {
        self.selected = Some(path.into());
        self.error = None;
        self.duplicate = None;
    }

    /// Upload the selected file.
    ///
    /// Returns the stored record only for a newly created file, which is the
    /// caller's cue to reload the listing. A duplicate keeps the selection and
    /// leaves a notice instead.
    pub async fn upload(&mut self) -> Option<FileRecord> {
        let Some(path) = self.selected.clone() else {
            self.error = Some(NO_FILE_SELECTED.to_string());
            return None;
        };

        self.error = None;
        self.uploading = true;
        let result = self.api.upload_file(&path).await;
        self.uploading = false;

        match result {
            Ok(UploadOutcome::Created(record)) => {
                self.selected = None;
                Some(record)
            }
            Ok(UploadOutcome::Duplicate { record, storage_saved }) => {
                self.duplicate = Some(DuplicateInfo { record, storage_saved });
                None
            }
            Err(e) => {
                error!("Upload error for {}: {}", path.display(), e);
                self.error = Some(UPLOAD_FAILED.to_string());
                None
            }
        }
    }

    /// Look for a listed record with the same content as the selected file.
    ///
    /// Hashes locally with SHA-256, the digest the server keys its deduplication on.
    pub fn precheck<'a>(&mut self, listing: &'a [FileRecord]) -> Option<&'a FileRecord> {
        let path = self.selected.clone()?;
        let hash = match hash_file(&path) {
            Ok(hash) => hash,
            Err(e) => {
                error!("Could not hash {}: {}", path.display(), e);
                self.error = Some(format!("Could not read {}: {}", path.display(), e));
                return None;
            }
        };
        debug!("Local hash of {} is {}", path.display(), hash);

        let found = listing.iter().find(|r| r.file_hash.as_deref() == Some(hash.as_str()));
        if let Some(record) = found {
            info!("{} matches stored file {} ({})", path.display(), record.id, record.original_filename);
        }
        found
    }
}

/// Lowercase hex SHA-256 of a file's content
pub fn hash_file(path: &Path) -> std::io::Result<String> {
    let mut file = std::fs::File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 8192];

    loop {
        let read = file.read(&mut buffer)?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}
