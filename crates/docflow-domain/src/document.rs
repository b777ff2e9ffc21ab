//! Page and detected-document types

use serde::{Deserialize, Serialize};

/// One page of extracted text from a parsed file
///
/// Page numbers are 1-indexed. The text may be empty (scanned pages with
/// no OCR layer, separator pages, and so on).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    /// 1-indexed page number within the file
    pub page_number: u32,

    /// Extracted text content, possibly empty
    pub text: String,
}

impl Page {
    /// Convenience constructor
    pub fn new(page_number: u32, text: impl Into<String>) -> Self {
        Self {
            page_number,
            text: text.into(),
        }
    }
}

/// A contiguous page range within one file believed to be one logical document
///
/// Lists of detected documents for a file are contiguous and gapless,
/// starting at page 1 and ending at the file's last page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedDocument {
    /// First page of the document (1-indexed, inclusive)
    pub start_page: u32,

    /// Last page of the document (1-indexed, inclusive)
    pub end_page: u32,

    /// Number of pages spanned
    pub page_count: u32,

    /// Detection confidence in [0, 1]
    pub confidence: f64,
}

impl DetectedDocument {
    /// Build a document spanning `[start_page, end_page]`
    pub fn new(start_page: u32, end_page: u32, confidence: f64) -> Self {
        Self {
            start_page,
            end_page,
            page_count: end_page - start_page + 1,
            confidence,
        }
    }
}
