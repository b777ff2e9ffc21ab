//! Heuristic multi-document boundary detection
//!
//! Scanned batches frequently contain several logical documents in one
//! file (an invoice followed by its receipts, say). The detector
//! partitions a file's pages into contiguous document ranges using
//! per-page indicators, so the chunking stage never splits across a
//! logical document boundary.

use crate::error::ExtractorError;
use docflow_domain::{DetectedDocument, Page};
use regex::Regex;

/// Weight for a word-boundary domain keyword match
const KEYWORD_WEIGHT: f64 = 0.7;

/// Weight for a document-number pattern match
const NUMBER_WEIGHT: f64 = 0.6;

/// Weight for a date-shaped token match
const DATE_WEIGHT: f64 = 0.5;

/// Baseline new-page weight under the aggressive splitting policy;
/// serves as the confidence floor for pages without indicators
const BASELINE_WEIGHT: f64 = 0.3;

/// Only the leading characters of a page are scanned, to avoid false
/// positives deep inside a document body
const HEADER_SCAN_CHARS: usize = 200;

/// Heuristic classifier partitioning a file's pages into logical documents
pub struct DocumentDetector {
    keyword_re: Regex,
    number_re: Regex,
    date_re: Regex,
    split_threshold: f64,
}

impl DocumentDetector {
    /// Create a detector with the given split threshold
    pub fn new(split_threshold: f64) -> Result<Self, ExtractorError> {
        let keyword_re = Regex::new(
            r"(?i)\b(invoice|receipt|bill|statement|purchase\s+order|credit\s+note|remittance)\b",
        )
        .map_err(|e| ExtractorError::Config(format!("keyword pattern: {}", e)))?;

        // Short alphabetic/symbol prefix followed by three or more digits
        let number_re = Regex::new(r"(?:\b[A-Za-z]{1,4}|#)[-#/]?\d{3,}\b")
            .map_err(|e| ExtractorError::Config(format!("number pattern: {}", e)))?;

        let date_re = Regex::new(
            r"(?x)\b(?:
                \d{1,2}[/\-.]\d{1,2}[/\-.]\d{2,4}
              | \d{4}[/\-.]\d{1,2}[/\-.]\d{1,2}
              | (?i:jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)[a-z]*\.?\s+\d{1,2},?\s+\d{2,4}
            )\b",
        )
        .map_err(|e| ExtractorError::Config(format!("date pattern: {}", e)))?;

        Ok(Self {
            keyword_re,
            number_re,
            date_re,
            split_threshold,
        })
    }

    /// Create a detector with the default aggressive threshold
    pub fn aggressive() -> Result<Self, ExtractorError> {
        Self::new(BASELINE_WEIGHT)
    }

    /// Partition pages into an ordered, gapless list of detected documents
    ///
    /// A new document starts at every page whose indicator score meets the
    /// split threshold. If no page carries any indicator stronger than the
    /// baseline, the whole file is a single document with confidence 1.0.
    pub fn detect(&self, pages: &[Page]) -> Result<Vec<DetectedDocument>, ExtractorError> {
        self.validate(pages)?;

        let scores: Vec<Option<f64>> = pages.iter().map(|p| self.score_page(&p.text)).collect();

        // The explicit no-signal case: one document spanning everything
        if scores.iter().all(Option::is_none) {
            tracing::debug!("No document indicators found, treating file as one document");
            let last = pages[pages.len() - 1].page_number;
            return Ok(vec![DetectedDocument::new(pages[0].page_number, last, 1.0)]);
        }

        let mut documents = Vec::new();
        let mut start_idx = 0;

        for (i, score) in scores.iter().enumerate().skip(1) {
            let is_boundary = matches!(score, Some(s) if *s >= self.split_threshold);
            if is_boundary {
                documents.push(self.build_document(pages, &scores, start_idx, i - 1));
                start_idx = i;
            }
        }
        documents.push(self.build_document(pages, &scores, start_idx, pages.len() - 1));

        tracing::debug!(
            "Detected {} documents across {} pages",
            documents.len(),
            pages.len()
        );

        Ok(documents)
    }

    fn build_document(
        &self,
        pages: &[Page],
        scores: &[Option<f64>],
        start_idx: usize,
        end_idx: usize,
    ) -> DetectedDocument {
        let confidence = scores[start_idx].unwrap_or(BASELINE_WEIGHT);
        DetectedDocument::new(
            pages[start_idx].page_number,
            pages[end_idx].page_number,
            confidence,
        )
    }

    /// Score one page: the maximum matched indicator weight, never a sum
    fn score_page(&self, text: &str) -> Option<f64> {
        let header: String = text.chars().take(HEADER_SCAN_CHARS).collect();

        if self.keyword_re.is_match(&header) {
            Some(KEYWORD_WEIGHT)
        } else if self.number_re.is_match(&header) {
            Some(NUMBER_WEIGHT)
        } else if self.date_re.is_match(&header) {
            Some(DATE_WEIGHT)
        } else {
            None
        }
    }

    fn validate(&self, pages: &[Page]) -> Result<(), ExtractorError> {
        if pages.is_empty() {
            return Err(ExtractorError::InvalidInput(
                "page list is empty".to_string(),
            ));
        }
        for (i, page) in pages.iter().enumerate() {
            if page.page_number == 0 {
                return Err(ExtractorError::InvalidInput(format!(
                    "page at position {} has invalid page number 0",
                    i
                )));
            }
        }
        Ok(())
    }
}
