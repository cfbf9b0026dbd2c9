//! Slide file parser

use sha2::{Digest, Sha256};

use crate::error::{Error, Result};
use crate::types::SlideFileType;

/// Text extracted from an uploaded slide file
#[derive(Debug, Clone)]
pub struct ParsedSlides {
    /// File type
    pub file_type: SlideFileType,
    /// SHA-256 of the uploaded bytes, hex encoded
    pub content_hash: String,
    /// Page-level content; text files are a single page
    pub pages: Vec<SlidePage>,
}

/// Text of a single page
#[derive(Debug, Clone)]
pub struct SlidePage {
    /// Page number (1-indexed)
    pub page_number: u32,
    /// Text content of the page
    pub content: String,
}

impl ParsedSlides {
    /// Total extracted characters across all pages
    pub fn char_count(&self) -> usize {
        self.pages.iter().map(|p| p.content.chars().count()).sum()
    }
}

/// Slide file parser
pub struct SlideParser;

impl SlideParser {
    /// Parse a file based on its extension
    pub fn parse(filename: &str, data: &[u8]) -> Result<ParsedSlides> {
        let file_type = SlideFileType::from_filename(filename);

        let pages = match file_type {
            SlideFileType::Pdf => Self::parse_pdf(filename, data)?,
            SlideFileType::Txt | SlideFileType::Markdown => Self::parse_text(data),
            SlideFileType::Unknown => {
                return Err(Error::UnsupportedFileType(filename.to_string()));
            }
        };

        if pages.iter().all(|p| p.content.trim().is_empty()) {
            return Err(Error::file_parse(filename, "No text content could be extracted"));
        }

        Ok(ParsedSlides {
            file_type,
            content_hash: hash_bytes(data),
            pages,
        })
    }

    /// Parse PDF document, one page per form feed
    fn parse_pdf(filename: &str, data: &[u8]) -> Result<Vec<SlidePage>> {
        let text = pdf_extract::extract_text_from_mem(data)
            .map_err(|e| Error::file_parse(filename, e.to_string()))?;

        let pages = text
            .split('\x0c')
            .enumerate()
            .map(|(i, page)| SlidePage {
                page_number: i as u32 + 1,
                content: cleanup_pdf_text(page),
            })
            .filter(|p| !p.content.is_empty())
            .collect();

        Ok(pages)
    }

    /// Parse plain text or markdown
    fn parse_text(data: &[u8]) -> Vec<SlidePage> {
        vec![SlidePage {
            page_number: 1,
            content: String::from_utf8_lossy(data).to_string(),
        }]
    }
}

/// Normalize typographic characters and drop blank lines from PDF text
fn cleanup_pdf_text(text: &str) -> String {
    text.replace('\0', "")
        .replace(['\u{2010}', '\u{2011}', '\u{2013}'], "-")
        .replace(['\u{2018}', '\u{2019}'], "'")
        .replace(['\u{201C}', '\u{201D}'], "\"")
        .replace('\u{2022}', "* ")
        .replace('\u{00A0}', " ")
        .replace('\u{FB01}', "fi")
        .replace('\u{FB02}', "fl")
        .lines()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Hash uploaded bytes for deduplication
fn hash_bytes(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_markdown() {
        let parsed = SlideParser::parse("week1.md", b"# Casting\n\nSand casting basics.").unwrap();
        assert_eq!(parsed.file_type, SlideFileType::Markdown);
        assert_eq!(parsed.pages.len(), 1);
        assert_eq!(parsed.content_hash.len(), 64);

        let copy = SlideParser::parse("copy.txt", b"# Casting\n\nSand casting basics.").unwrap();
        assert_eq!(parsed.content_hash, copy.content_hash);
    }

    #[test]
    fn test_rejects_unsupported_and_empty() {
        assert!(matches!(
            SlideParser::parse("deck.pptx", b"PK"),
            Err(Error::UnsupportedFileType(_))
        ));
        assert!(matches!(
            SlideParser::parse("empty.txt", b"  \n "),
            Err(Error::FileParse { .. })
        ));
    }

    #[test]
    fn test_cleanup_pdf_text() {
        let cleaned = cleanup_pdf_text("  \u{2022}Die \u{2018}wear\u{2019}\n\n\0e\u{FB01}le ");
        assert_eq!(cleaned, "* Die 'wear'\nefile");
    }
}
