use async_trait::async_trait;
use std::collections::HashSet;
use std::fmt::Write;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

use crate::format::{format_date, format_file_size};
use crate::models::{FileRecord, FilterState};
use crate::services::api::FileApiClient;

pub const DELETE_CONFIRMATION: &str = "Are you sure you want to delete this file?";
pub const DELETE_FAILED: &str = "Failed to delete file. Please try again.";
pub const DOWNLOAD_FAILED: &str = "Failed to download file. Please try again.";

/// User interaction the file list needs for destructive actions
#[async_trait]
pub trait Prompt: Send + Sync {
    /// Ask a yes/no question; `false` cancels the action
    async fn confirm(&self, message: &str) -> bool;

    /// Blocking notice the user has to acknowledge
    async fn alert(&self, message: &str);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Cancelled,
    Deleted,
    Failed,
}

/// Owns the listed files plus loading/error flags for display
pub struct FileList {
    api: FileApiClient,
    files: Vec<FileRecord>,
    loading: bool,
    error: Option<String>,
    filters: FilterState,
}

impl FileList {
    pub fn new(api: FileApiClient) -> Self {
        Self { api, files: Vec::new(), loading: false, error: None, filters: FilterState::default() }
    }

    pub fn files(&self) -> &[FileRecord] {
        &self.files
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Filters used by the most recent load
    pub fn filters(&self) -> &FilterState {
        &self.filters
    }

    pub fn find(&self, id: &str) -> Option<&FileRecord> {
        self.files.iter().find(|f| f.id == id)
    }

    /// Refetch the listing for `filters`, replacing the collection on success.
    ///
    /// On failure the previous collection stays and the error is kept for display.
    /// Overlapping calls are not ordered: whichever response lands last wins.
    pub async fn load(&mut self, filters: &FilterState) {
        self.loading = true;
        self.error = None;
        self.filters = filters.clone();

        match self.api.list_files(filters).await {
            Ok(files) => {
                self.files = dedupe_by_id(files);
                info!("Loaded {} files", self.files.len());
            }
            Err(e) => {
                error!("Failed to fetch files: {}", e);
                self.error = Some(e.to_string());
            }
        }

        self.loading = false;
    }

    /// Reload with the filters of the last load
    pub async fn reload(&mut self) {
        let filters = self.filters.clone();
        self.load(&filters).await;
    }

    pub async fn delete(&mut self, id: &str, prompt: &dyn Prompt) -> DeleteOutcome {
        if !prompt.confirm(DELETE_CONFIRMATION).await {
            info!("Delete of {} cancelled", id);
            return DeleteOutcome::Cancelled;
        }

        match self.api.delete_file(id).await {
            Ok(()) => {
                self.reload().await;
                DeleteOutcome::Deleted
            }
            Err(e) => {
                error!("Error deleting file {}: {}", id, e);
                prompt.alert(DELETE_FAILED).await;
                DeleteOutcome::Failed
            }
        }
    }

    /// Save `record` into `dest_dir` under its original filename
    pub async fn download(&mut self, record: &FileRecord, dest_dir: &Path) -> Option<PathBuf> {
        match self.api.download_record(record, dest_dir).await {
            Ok(path) => {
                info!("Downloaded {} to {}", record.original_filename, path.display());
                Some(path)
            }
            Err(e) => {
                error!("Error downloading file {}: {}", record.id, e);
                self.error = Some(DOWNLOAD_FAILED.to_string());
                None
            }
        }
    }

    /// Text table of the collection with loading and error lines
    pub fn render(&self) -> String {
        let mut out = String::new();

        if self.loading {
            out.push_str("Loading...\n");
        }
        if let Some(error) = &self.error {
            let _ = writeln!(out, "Error: {}", error);
        }

        if self.files.is_empty() {
            if !self.loading {
                out.push_str("No files found\n");
            }
            return out;
        }

        let rows: Vec<[String; 5]> = self
            .files
            .iter()
            .map(|f| {
                [
                    f.id.clone(),
                    f.original_filename.clone(),
                    f.file_type.clone(),
                    format_file_size(f.size),
                    format_date(&f.uploaded_at),
                ]
            })
            .collect();

        let headers = ["ID", "FILE NAME", "TYPE", "SIZE", "UPLOADED"];
        let mut widths = headers.map(|h| h.len());
        for row in &rows {
            for (width, cell) in widths.iter_mut().zip(row) {
                *width = (*width).max(cell.chars().count());
            }
        }

        let mut write_row = |cells: [&str; 5]| {
            let line = cells
                .iter()
                .zip(widths)
                .map(|(cell, width)| format!("{:<width$}", cell, width = width))
                .collect::<Vec<_>>()
                .join("  ");
            let _ = writeln!(out, "{}", line.trim_end());
        };

        write_row(headers);
        for row in &rows {
            write_row([&row[0], &row[1], &row[2], &row[3], &row[4]]);
        }

        out
    }
}

fn dedupe_by_id(files: Vec<FileRecord>) -> Vec<FileRecord> {
    let mut seen = HashSet::new();
    let total = files.len();
    let unique: Vec<FileRecord> = files.into_iter().filter(|f| seen.insert(f.id.clone())).collect();
    if unique.len() != total {
        warn!("Listing contained {} repeated ids, kept first occurrences", total - unique.len());
    }
    unique
}
