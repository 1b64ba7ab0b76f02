//! Knowledge corpus loading.
//!
//! Reads every supported file in the corpus directory and returns its text
//! page by page. PDFs are extracted with `pdftotext`; plain text and markdown
//! files are read as a single page.

mod pdf;

pub use pdf::{extract_pdf_pages, split_pages};

use crate::error::{ResolvError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument, warn};

/// Text file extensions read verbatim.
const TEXT_EXTENSIONS: &[&str] = &["txt", "md", "markdown"];

/// One page of source text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    /// File name the page came from.
    pub source: String,
    /// 1-based page number within the source.
    pub number: u32,
    /// Extracted text.
    pub text: String,
}

impl Page {
    pub fn new(source: impl Into<String>, number: u32, text: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            number,
            text: text.into(),
        }
    }
}

/// Kind of corpus file, decided by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DocumentKind {
    Pdf,
    Text,
}

fn document_kind(path: &Path) -> Option<DocumentKind> {
    let ext = path.extension()?.to_str()?.to_lowercase();
    if ext == "pdf" {
        Some(DocumentKind::Pdf)
    } else if TEXT_EXTENSIONS.contains(&ext.as_str()) {
        Some(DocumentKind::Text)
    } else {
        None
    }
}

/// List the supported files of a corpus directory, sorted by file name.
pub fn list_documents(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(ResolvError::Config(format!(
            "Knowledge base directory not found: {}. Create it and add your PDF files.",
            dir.display()
        )));
    }

    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file() && document_kind(path).is_some())
        .collect();
    files.sort();

    Ok(files)
}

/// Load every page of every supported file in `dir`, in file-name order.
///
/// An existing but empty directory yields no pages.
#[instrument(skip(dir), fields(dir = %dir.display()))]
pub async fn load_corpus(dir: &Path) -> Result<Vec<Page>> {
    let files = list_documents(dir)?;
    if files.is_empty() {
        warn!("No documents found in {}", dir.display());
        return Ok(Vec::new());
    }

    let mut pages = Vec::new();
    for path in &files {
        let loaded = load_document(path).await?;
        debug!("Loaded {} page(s) from {}", loaded.len(), path.display());
        pages.extend(loaded);
    }

    info!("Loaded {} pages from {} document(s)", pages.len(), files.len());
    Ok(pages)
}

/// Load the pages of a single file.
pub async fn load_document(path: &Path) -> Result<Vec<Page>> {
    let source = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string());

    match document_kind(path) {
        Some(DocumentKind::Pdf) => extract_pdf_pages(path, &source).await,
        Some(DocumentKind::Text) => {
            let text = tokio::fs::read_to_string(path).await?;
            if text.trim().is_empty() {
                Ok(Vec::new())
            } else {
                Ok(vec![Page::new(source, 1, text)])
            }
        }
        None => Err(ResolvError::Document(format!(
            "Unsupported document type: {}",
            path.display()
        ))),
    }
}
