use crate::queue::WorkQueue;
use crate::review::ParsedCandidateItem;
use providers::gem::{ImageAnalyzer, ReceiptParser};
use providers::ProviderError;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

/// A receipt image that could not be parsed.
#[derive(Debug, Clone)]
pub struct ReceiptFailure {
    pub index: usize,
    pub path: PathBuf,
    pub error: String,
}

#[derive(Debug, Default)]
pub struct IngestReport {
    pub candidates: Vec<ParsedCandidateItem>,
    pub failures: Vec<ReceiptFailure>,
}

impl IngestReport {
    pub fn parsed_receipts(&self, total: usize) -> usize {
        total - self.failures.len()
    }
}

/// Turns pending receipt images into one flat candidate list.
///
/// A receipt that fails to parse is logged and reported, and the rest of the
/// batch still runs.
pub struct ReceiptIngest {
    parser: Arc<dyn ReceiptParser>,
    queue: WorkQueue,
}

impl ReceiptIngest {
    pub fn new(parser: Arc<dyn ReceiptParser>, queue: WorkQueue) -> Self {
        Self { parser, queue }
    }

    pub async fn ingest(&self, receipts: &[PathBuf], user_id: &str) -> IngestReport {
        let parser = self.parser.clone();
        let user_id = user_id.to_string();
        let outcomes = self
            .queue
            .run(receipts.to_vec(), move |_, path| {
                let parser = parser.clone();
                let user_id = user_id.clone();
                async move {
                    let result = parser.parse_receipt(&path, &user_id).await;
                    (path, result)
                }
            })
            .await;

        let mut report = IngestReport::default();
        for (index, (path, result)) in outcomes {
            match result {
                Ok(parsed) => report
                    .candidates
                    .extend(parsed.items.into_iter().map(ParsedCandidateItem::from)),
                Err(e) => {
                    warn!(index, path = %path.display(), error = %e, "receipt parse failed, skipping");
                    report.failures.push(ReceiptFailure {
                        index,
                        path,
                        error: e.to_string(),
                    });
                }
            }
        }
        info!(
            receipts = receipts.len(),
            failed = report.failures.len(),
            candidates = report.candidates.len(),
            "receipt batch processed"
        );
        report
    }
}

#[derive(Debug, Error)]
pub enum AnalyzeError {
    #[error("no food items found")]
    NoFoodItems,
    #[error(transparent)]
    Provider(#[from] ProviderError),
}

/// Food-photo analysis as review candidates.
pub async fn analyze_photo(
    analyzer: &dyn ImageAnalyzer,
    image: &std::path::Path,
) -> Result<Vec<ParsedCandidateItem>, AnalyzeError> {
    let analysis = analyzer.analyze_image(image).await?;
    let items = analysis.items();
    if items.is_empty() {
        return Err(AnalyzeError::NoFoodItems);
    }
    Ok(items.iter().cloned().map(ParsedCandidateItem::from).collect())
}
