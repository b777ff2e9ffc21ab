//! Plain-text Document Parser
//!
//! Splits UTF-8 text files into pages on form-feed characters, so the
//! pipeline can be exercised end to end without a PDF stack. Binary
//! formats are rejected as file-scoped, recoverable errors.

use async_trait::async_trait;
use docflow_domain::{DocumentParser, Page, ParserError};

/// Page separator recognized in plain-text inputs
const PAGE_SEPARATOR: char = '\u{0C}';

/// Document parser for plain-text files
///
/// Each form-feed starts a new page; a file without form-feeds is a
/// single page. Page numbers are 1-indexed.
#[derive(Debug, Clone, Default)]
pub struct PlainTextParser;

impl PlainTextParser {
    /// Create a new parser
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl DocumentParser for PlainTextParser {
    async fn parse(&self, file_name: &str, bytes: &[u8]) -> Result<Vec<Page>, ParserError> {
        if bytes.is_empty() {
            return Err(ParserError::Corrupt(format!("{}: empty file", file_name)));
        }

        let text = std::str::from_utf8(bytes)
            .map_err(|e| ParserError::Unsupported(format!("{}: not UTF-8 text ({})", file_name, e)))?;

        let pages = text
            .split(PAGE_SEPARATOR)
            .enumerate()
            .map(|(i, page_text)| Page::new(i as u32 + 1, page_text.trim_matches('\n')))
            .collect();

        Ok(pages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_single_page() {
        let parser = PlainTextParser::new();
        let pages = parser.parse("a.txt", b"Invoice #12345").await.unwrap();
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].page_number, 1);
        assert_eq!(pages[0].text, "Invoice #12345");
    }

    #[tokio::test]
    async fn test_form_feed_pages() {
        let parser = PlainTextParser::new();
        let bytes = b"page one\x0cpage two\x0cpage three";
        let pages = parser.parse("b.txt", bytes).await.unwrap();

        assert_eq!(pages.len(), 3);
        assert_eq!(pages[0].text, "page one");
        assert_eq!(pages[2].page_number, 3);
        assert_eq!(pages[2].text, "page three");
    }

    #[tokio::test]
    async fn test_empty_file_rejected() {
        let parser = PlainTextParser::new();
        let result = parser.parse("empty.txt", b"").await;
        assert!(matches!(result, Err(ParserError::Corrupt(_))));
    }

    #[tokio::test]
    async fn test_binary_rejected() {
        let parser = PlainTextParser::new();
        let result = parser.parse("img.png", &[0xFF, 0xFE, 0x00, 0x80]).await;
        assert!(matches!(result, Err(ParserError::Unsupported(_))));
    }

    #[tokio::test]
    async fn test_empty_pages_preserved() {
        // A separator page with no text still occupies a page slot
        let parser = PlainTextParser::new();
        let pages = parser.parse("c.txt", b"first\x0c\x0cthird").await.unwrap();
        assert_eq!(pages.len(), 3);
        assert_eq!(pages[1].text, "");
    }
}
