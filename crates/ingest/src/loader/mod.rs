//! Document sources: local PDF directories and arXiv searches.

pub mod arxiv;
pub mod local;
mod pdf;

use std::path::PathBuf;

use thiserror::Error;

pub use arxiv::{ArxivClient, ArxivEntry};
pub use local::{combine_documents, load_pdf_directory, parse_metadata};
pub use pdf::{extract_pdf, PageContent};

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("PDF extraction failed: {0}")]
    Pdf(String),

    #[error("Not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("arXiv API error: {0}")]
    Api(String),

    #[error("Malformed arXiv feed: {0}")]
    Feed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
