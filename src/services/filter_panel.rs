use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, warn};

use crate::models::{FilterState, SizeRange};
use crate::services::debounce::Debouncer;

/// Quiet period after the last search edit before the filter is emitted
pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(300);

/// Editable filter fields, emitting a normalized `FilterState` to its listener.
///
/// Search edits are debounced; `apply` and `reset` emit immediately. The panel
/// never talks to the network.
pub struct FilterPanel {
    search: String,
    file_type: String,
    size_range: String,
    date_range: String,
    listener: UnboundedSender<FilterState>,
    debouncer: Debouncer<FilterState>,
}

impl FilterPanel {
    pub fn new(listener: UnboundedSender<FilterState>) -> Self {
        Self::with_debounce(listener, SEARCH_DEBOUNCE)
    }

    pub fn with_debounce(listener: UnboundedSender<FilterState>, delay: Duration) -> Self {
        Self {
            search: String::new(),
            file_type: String::new(),
            size_range: String::new(),
            date_range: String::new(),
            debouncer: Debouncer::new(delay, listener.clone()),
            listener,
        }
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn file_type(&self) -> &str {
        &self.file_type
    }

    pub fn size_range(&self) -> &str {
        &self.size_range
    }

    pub fn date_range(&self) -> &str {
        &self.date_range
    }

    /// Record a search edit and schedule a debounced emit carrying exactly this value
    pub fn set_search(&mut self, value: &str) {
        self.search = value.to_string();
        let filters = self.compose(Some(value));
        debug!("Search edited, scheduling filter change: {:?}", filters);
        self.debouncer.call(filters);
    }

    pub fn set_file_type(&mut self, value: &str) {
        self.file_type = value.to_string();
    }

    /// Size bucket as `min,max`; an empty value means all sizes
    pub fn set_size_range(&mut self, value: &str) {
        self.size_range = value.trim().to_string();
    }

    /// Date bucket as a day count; an empty value means all time
    pub fn set_date_range(&mut self, value: &str) {
        self.date_range = value.trim().to_string();
    }

    /// Emit the current filter now, dropping any pending search emit
    pub fn apply(&mut self) {
        self.debouncer.cancel();
        let filters = self.compose(None);
        debug!("Applying filters: {:?}", filters);
        self.emit(filters);
    }

    /// Clear every field and emit an empty filter now
    pub fn reset(&mut self) {
        self.debouncer.cancel();
        self.search.clear();
        self.file_type.clear();
        self.size_range.clear();
        self.date_range.clear();
        debug!("Filters reset");
        self.emit(FilterState::default());
    }

    /// Build the filter object; `search_override` wins over the stored search text
    pub fn compose(&self, search_override: Option<&str>) -> FilterState {
        let mut filters = FilterState::default();

        match search_override {
            Some(search) => {
                if !search.is_empty() {
                    filters.search = Some(search.to_string());
                }
            }
            None => {
                if !self.search.is_empty() {
                    filters.search = Some(self.search.clone());
                }
            }
        }

        let file_type = self.file_type.trim();
        if !file_type.is_empty() {
            filters.file_type = Some(file_type.to_string());
        }

        if !self.size_range.is_empty() {
            match self.size_range.parse::<SizeRange>() {
                Ok(range) => filters.size_range = Some(range),
                Err(e) => warn!("Ignoring size filter: {}", e),
            }
        }

        if let Ok(days) = self.date_range.parse::<u32>() {
            if days > 0 {
                filters.date_range = Some(days);
            }
        }

        filters
    }

    fn emit(&self, filters: FilterState) {
        if self.listener.send(filters).is_err() {
            debug!("Filter listener is gone, change dropped");
        }
    }
}
