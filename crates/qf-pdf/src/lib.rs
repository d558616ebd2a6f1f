//! PDF text extraction for Quizforge
//!
//! Walks every page of a document held in memory and concatenates the text found on
//! each one. A document without any extractable text (a scanned image, for instance)
//! is not an error: the result carries a warning instead.

use lopdf::Document;
use serde::Serialize;
use thiserror::Error;

/// Warning attached to a result whose text is empty.
pub const EMPTY_TEXT_WARNING: &str =
    "No text could be extracted from this PDF. It may be a scanned image or contain only graphics.";

#[derive(Error, Debug)]
pub enum PdfError {
    #[error("The uploaded file is empty")]
    Empty,
    #[error("The file could not be read as a PDF: {0}")]
    Unreadable(String),
    #[error("The PDF is password protected")]
    Encrypted,
    #[error("Failed to extract text from page {page}: {message}")]
    Page { page: u32, message: String },
}

/// Text pulled out of a document
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractedText {
    /// Page texts joined by newlines, in page order
    pub text: String,
    /// Number of pages walked
    pub page_count: usize,
    /// Set when no text was found
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

impl ExtractedText {
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Extract the text of every page of a PDF held in memory.
pub fn extract_text(bytes: &[u8]) -> Result<ExtractedText, PdfError> {
    if bytes.is_empty() {
        return Err(PdfError::Empty);
    }

    let doc = Document::load_mem(bytes).map_err(|e| PdfError::Unreadable(e.to_string()))?;
    if doc.is_encrypted() {
        return Err(PdfError::Encrypted);
    }

    let pages = doc.get_pages();
    let mut page_texts = Vec::with_capacity(pages.len());
    for page_number in pages.keys().copied() {
        let text = doc
            .extract_text(&[page_number])
            .map_err(|e| PdfError::Page {
                page: page_number,
                message: e.to_string(),
            })?;
        page_texts.push(text.trim_end().to_string());
    }

    let text = page_texts.join("\n");
    let warning = if text.trim().is_empty() {
        tracing::warn!(pages = pages.len(), "PDF contains no extractable text");
        Some(EMPTY_TEXT_WARNING.to_string())
    } else {
        tracing::debug!(pages = pages.len(), chars = text.len(), "Extracted PDF text");
        None
    };

    Ok(ExtractedText {
        text,
        page_count: pages.len(),
        warning,
    })
}

/// Helpers for building small PDFs in tests.
#[cfg(any(test, feature = "test-util"))]
pub mod testing {
    use lopdf::{
        Object, Stream,
        content::{Content, Operation},
        dictionary,
    };

    use super::Document;

    /// Build a PDF whose pages each show one line of text. An empty string gives a page
    /// without any text operators.
    pub fn pdf_with_pages(pages: &[&str]) -> Vec<u8> {
        save(document_with_pages(pages))
    }

    /// Build a PDF that declares standard password encryption. The keys are not valid for
    /// any password, so it cannot be opened.
    pub fn encrypted_pdf() -> Vec<u8> {
        let mut doc = document_with_pages(&["Secret"]);
        let encrypt_id = doc.add_object(dictionary! {
            "Filter" => "Standard",
            "V" => 1,
            "R" => 2,
            "Length" => 40,
            "P" => -44,
            "O" => Object::string_literal(vec![0x4f_u8; 32]),
            "U" => Object::string_literal(vec![0x55_u8; 32]),
        });
        doc.trailer.set("Encrypt", encrypt_id);
        doc.trailer.set(
            "ID",
            vec![
                Object::string_literal(vec![1_u8; 16]),
                Object::string_literal(vec![1_u8; 16]),
            ],
        );
        save(doc)
    }

    fn save(mut doc: Document) -> Vec<u8> {
        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).expect("document saves");
        bytes
    }

    fn document_with_pages(pages: &[&str]) -> Document {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
            "Encoding" => "WinAnsiEncoding",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let mut kids: Vec<Object> = Vec::new();
        for line in pages {
            let operations = if line.is_empty() {
                Vec::new()
            } else {
                vec![
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec!["F1".into(), 12.into()]),
                    Operation::new("Td", vec![72.into(), 720.into()]),
                    Operation::new("Tj", vec![Object::string_literal(*line)]),
                    Operation::new("ET", vec![]),
                ]
            };
            let content = Content { operations };
            let content_id = doc.add_object(Stream::new(
                dictionary! {},
                content.encode().expect("content encodes"),
            ));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
                "Resources" => resources_id,
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            });
            kids.push(page_id.into());
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        doc
    }
}
