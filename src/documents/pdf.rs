//! PDF text extraction via `pdftotext` (poppler-utils).

use super::Page;
use crate::error::{ResolvError, Result};
use std::path::Path;

/// Page separator emitted by `pdftotext`.
const FORM_FEED: char = '\u{0c}';

/// Extract the text of every page of a PDF.
///
/// Pages with no extractable text are dropped but keep their numbering.
pub async fn extract_pdf_pages(path: &Path, source: &str) -> Result<Vec<Page>> {
    let output = tokio::process::Command::new("pdftotext")
        .arg("-layout")
        .arg("-enc")
        .arg("UTF-8")
        .arg(path)
        .arg("-")
        .output()
        .await
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ResolvError::ToolNotFound("pdftotext".to_string())
            } else {
                ResolvError::Document(format!("Failed to run pdftotext: {}", e))
            }
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(ResolvError::Document(format!(
            "pdftotext failed on {}: {}",
            path.display(),
            stderr.trim()
        )));
    }

    let text = String::from_utf8_lossy(&output.stdout);
    Ok(split_pages(source, &text))
}

/// Split `pdftotext` output into pages on form feeds.
pub fn split_pages(source: &str, text: &str) -> Vec<Page> {
    text.split(FORM_FEED)
        .enumerate()
        .filter(|(_, page)| !page.trim().is_empty())
        .map(|(i, page)| Page::new(source, i as u32 + 1, page))
        .collect()
}
