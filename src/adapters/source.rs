use crate::utils::error::{EtlError, Result};
use std::path::Path;

/// Page separator used by `pdftotext` text dumps.
const FORM_FEED: char = '\x0C';

/// Splits a transcript into page texts according to its extension.
pub fn read_pages(path: &str, bytes: &[u8]) -> Result<Vec<String>> {
    let extension = Path::new(path)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);

    let pages = match extension.as_deref() {
        Some("txt") => text_pages(bytes),
        Some("pdf") => pdf_pages(bytes)?,
        _ => {
            return Err(EtlError::UnsupportedInput {
                path: path.to_string(),
            })
        }
    };

    tracing::debug!("Read {} page(s) from {}", pages.len(), path);
    Ok(pages)
}

fn text_pages(bytes: &[u8]) -> Vec<String> {
    String::from_utf8_lossy(bytes)
        .split(FORM_FEED)
        .filter(|page| !page.trim().is_empty())
        .map(str::to_string)
        .collect()
}

/// Text items of a page come out line by line; they are joined with
/// spaces so a row split across lines still reads as one run of words.
#[cfg(feature = "pdf")]
fn pdf_pages(bytes: &[u8]) -> Result<Vec<String>> {
    let doc = lopdf::Document::load_mem(bytes).map_err(|e| EtlError::PdfError {
        message: e.to_string(),
    })?;

    let mut pages = Vec::new();
    for page_num in doc.get_pages().keys() {
        let text = doc
            .extract_text(&[*page_num])
            .map_err(|e| EtlError::PdfError {
                message: format!("page {}: {}", page_num, e),
            })?;
        pages.push(text.split_whitespace().collect::<Vec<_>>().join(" "));
    }

    Ok(pages)
}

#[cfg(not(feature = "pdf"))]
fn pdf_pages(_bytes: &[u8]) -> Result<Vec<String>> {
    Err(EtlError::PdfError {
        message: "built without the `pdf` feature".to_string(),
    })
}
