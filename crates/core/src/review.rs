//! Receipt review: pending receipts, parsed candidates, per-item storage
//! assignment, inline edits and the finalize submission.
//!
//! ```text
//! Idle -> Scanning -> Parsed <-> Editing
//!                       |
//!                    submit -> Idle
//! ```

use crate::pipeline::{IngestReport, ReceiptIngest};
use chrono::Duration;
use providers::gem::ReceiptItem;
use std::path::PathBuf;
use storage::models::{lenient_date, FinalizeAck, FinalizeItem, FinalizeRequest, ItemsJson, StorageLocation};
use storage::{ItemStore, StorageError};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum ReviewError {
    #[error("no receipts to process")]
    NoReceipts,
    #[error("no items to submit")]
    NoItems,
    #[error("cannot {action} while {state}")]
    InvalidState {
        action: &'static str,
        state: &'static str,
    },
    #[error("no item at index {0}")]
    NoSuchItem(usize),
    #[error("item name cannot be empty")]
    BlankName,
    #[error("invalid expiration date: {0}")]
    InvalidDate(String),
    #[error("submit failed: {0}")]
    Submit(#[from] StorageError),
}

/// A receipt-parsed item not yet confirmed by the user.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedCandidateItem {
    pub name: String,
    /// As returned by the parser; may be empty or loosely formatted.
    pub estimated_expiration: Option<String>,
    pub storage_option: Option<StorageLocation>,
    pub date_bought: Option<String>,
    pub price: Option<f64>,
    pub shelf_life_days: Option<i64>,
}

impl From<ReceiptItem> for ParsedCandidateItem {
    fn from(item: ReceiptItem) -> Self {
        Self {
            name: item.name,
            estimated_expiration: item.estimated_expiration,
            storage_option: None,
            date_bought: item.date_bought,
            price: item.price,
            shelf_life_days: item.shelf_life_days,
        }
    }
}

impl ParsedCandidateItem {
    /// Expiration as `YYYY-MM-DD`: the parser's value when it reads as a date,
    /// else purchase date plus shelf life.
    pub fn effective_expiration(&self) -> Option<String> {
        let explicit = self
            .estimated_expiration
            .as_deref()
            .and_then(lenient_date::parse);
        let date = match explicit {
            Some(date) => date,
            None => {
                let bought = self.date_bought.as_deref().and_then(lenient_date::parse)?;
                bought.checked_add_signed(Duration::days(self.shelf_life_days?))?
            }
        };
        Some(date.format("%Y-%m-%d").to_string())
    }

    /// Parser text that is present but does not read as a date.
    pub fn unreadable_expiration(&self) -> Option<&str> {
        let raw = self.estimated_expiration.as_deref()?.trim();
        (!raw.is_empty() && lenient_date::parse(raw).is_none()).then_some(raw)
    }

    fn to_finalize(&self) -> FinalizeItem {
        if let Some(raw) = self.unreadable_expiration() {
            warn!(item = %self.name, raw, "expiration is not a date, sending without it");
        }
        FinalizeItem {
            name: self.name.clone(),
            estimated_expiration: self.effective_expiration(),
            storage_location: self.storage_option,
            date_bought: self
                .date_bought
                .as_deref()
                .and_then(lenient_date::parse)
                .map(|d| d.format("%Y-%m-%d").to_string()),
            price: self.price,
        }
    }
}

/// In-progress inline edit of one candidate.
#[derive(Debug, Clone, PartialEq)]
pub struct EditDraft {
    pub name: String,
    pub expiration: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ReviewState {
    Idle,
    Scanning,
    Parsed,
    Editing { index: usize, draft: EditDraft },
}

impl ReviewState {
    fn name(&self) -> &'static str {
        match self {
            ReviewState::Idle => "idle",
            ReviewState::Scanning => "scanning",
            ReviewState::Parsed => "reviewing",
            ReviewState::Editing { .. } => "editing",
        }
    }
}

#[derive(Debug)]
pub struct ReceiptReview {
    state: ReviewState,
    pending: Vec<PathBuf>,
    candidates: Vec<ParsedCandidateItem>,
}

impl Default for ReceiptReview {
    fn default() -> Self {
        Self::new()
    }
}

impl ReceiptReview {
    pub fn new() -> Self {
        Self {
            state: ReviewState::Idle,
            pending: Vec::new(),
            candidates: Vec::new(),
        }
    }

    pub fn state(&self) -> &ReviewState {
        &self.state
    }

    pub fn pending(&self) -> &[PathBuf] {
        &self.pending
    }

    pub fn candidates(&self) -> &[ParsedCandidateItem] {
        &self.candidates
    }

    fn invalid(&self, action: &'static str) -> ReviewError {
        ReviewError::InvalidState {
            action,
            state: self.state.name(),
        }
    }

    pub fn add_receipt(&mut self, image: PathBuf) -> Result<(), ReviewError> {
        match self.state {
            ReviewState::Editing { .. } => return Err(self.invalid("add a receipt")),
            ReviewState::Idle => self.state = ReviewState::Scanning,
            _ => {}
        }
        self.pending.push(image);
        Ok(())
    }

    pub fn remove_receipt(&mut self, index: usize) -> Result<PathBuf, ReviewError> {
        if index >= self.pending.len() {
            return Err(ReviewError::NoSuchItem(index));
        }
        let removed = self.pending.remove(index);
        if self.pending.is_empty() && self.state == ReviewState::Scanning {
            self.state = ReviewState::Idle;
        }
        Ok(removed)
    }

    /// Parses every pending receipt and replaces the candidate list.
    pub async fn process(
        &mut self,
        ingest: &ReceiptIngest,
        user_id: &str,
    ) -> Result<IngestReport, ReviewError> {
        if matches!(self.state, ReviewState::Editing { .. }) {
            return Err(self.invalid("process receipts"));
        }
        if self.pending.is_empty() {
            return Err(ReviewError::NoReceipts);
        }
        let mut report = ingest.ingest(&self.pending, user_id).await;
        self.candidates = std::mem::take(&mut report.candidates);
        self.state = ReviewState::Parsed;
        debug!(candidates = self.candidates.len(), "receipts processed");
        Ok(report)
    }

    /// Loads candidates from another source, such as a food-photo analysis.
    pub fn load_candidates(&mut self, candidates: Vec<ParsedCandidateItem>) -> Result<(), ReviewError> {
        if matches!(self.state, ReviewState::Editing { .. }) {
            return Err(self.invalid("load items"));
        }
        self.candidates = candidates;
        self.state = ReviewState::Parsed;
        Ok(())
    }

    /// One selection per item; re-selecting the current option keeps it.
    pub fn set_storage(&mut self, index: usize, location: StorageLocation) -> Result<(), ReviewError> {
        if self.state != ReviewState::Parsed {
            return Err(self.invalid("assign storage"));
        }
        let item = self
            .candidates
            .get_mut(index)
            .ok_or(ReviewError::NoSuchItem(index))?;
        item.storage_option = Some(location);
        Ok(())
    }

    pub fn begin_edit(&mut self, index: usize) -> Result<(), ReviewError> {
        if self.state != ReviewState::Parsed {
            return Err(self.invalid("edit an item"));
        }
        let item = self.candidates.get(index).ok_or(ReviewError::NoSuchItem(index))?;
        let draft = EditDraft {
            name: item.name.clone(),
            expiration: item
                .effective_expiration()
                .or_else(|| item.unreadable_expiration().map(str::to_string))
                .unwrap_or_default(),
        };
        self.state = ReviewState::Editing { index, draft };
        Ok(())
    }

    pub fn draft_mut(&mut self) -> Option<&mut EditDraft> {
        match &mut self.state {
            ReviewState::Editing { draft, .. } => Some(draft),
            _ => None,
        }
    }

    /// Applies the draft to the edited item and returns to review.
    pub fn confirm_edit(&mut self) -> Result<(), ReviewError> {
        let (index, draft) = match &self.state {
            ReviewState::Editing { index, draft } => (*index, draft.clone()),
            _ => return Err(self.invalid("confirm an edit")),
        };
        let name = draft.name.trim();
        if name.is_empty() {
            return Err(ReviewError::BlankName);
        }
        let expiration = match draft.expiration.trim() {
            "" => None,
            raw => Some(
                lenient_date::parse(raw)
                    .ok_or_else(|| ReviewError::InvalidDate(raw.to_string()))?
                    .format("%Y-%m-%d")
                    .to_string(),
            ),
        };
        let item = self
            .candidates
            .get_mut(index)
            .ok_or(ReviewError::NoSuchItem(index))?;
        item.name = name.to_string();
        item.estimated_expiration = expiration;
        if item.estimated_expiration.is_none() {
            item.shelf_life_days = None;
        }
        self.state = ReviewState::Parsed;
        Ok(())
    }

    pub fn cancel_edit(&mut self) {
        if matches!(self.state, ReviewState::Editing { .. }) {
            self.state = ReviewState::Parsed;
        }
    }

    /// Sends every candidate in one finalize call. The lists are cleared only
    /// after the store accepts them; a rejection or an empty insert keeps them
    /// for another try.
    pub async fn submit(
        &mut self,
        store: &dyn ItemStore,
        user_uuid: &str,
    ) -> Result<FinalizeAck, ReviewError> {
        if self.state != ReviewState::Parsed {
            return Err(self.invalid("submit"));
        }
        if self.candidates.is_empty() {
            return Err(ReviewError::NoItems);
        }
        let request = FinalizeRequest {
            user_uuid: user_uuid.to_string(),
            items_json: ItemsJson {
                items: self.candidates.iter().map(ParsedCandidateItem::to_finalize).collect(),
            },
        };
        let ack = match store.finalize_items(&request).await.and_then(FinalizeAck::into_result) {
            Ok(ack) => ack,
            Err(e) => {
                warn!(error = %e, "finalize failed, keeping items for retry");
                return Err(e.into());
            }
        };
        if ack.inserted_nothing() {
            return Err(ReviewError::NoItems);
        }
        info!(
            items = request.items_json.items.len(),
            status = ack.status.as_deref().unwrap_or(""),
            "items finalized"
        );
        self.reset();
        Ok(ack)
    }

    /// Discards receipts and candidates.
    pub fn cancel(&mut self) {
        self.reset();
    }

    fn reset(&mut self) {
        self.pending.clear();
        self.candidates.clear();
        self.state = ReviewState::Idle;
    }
}
