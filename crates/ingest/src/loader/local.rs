use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use catbase_core::{
    Document, Metadata, AUTHORS, ENTRY_ID, FILE_NAME, PAGE_LABEL, PUBLISHED,
    SUMMARY, TITLE,
};

use super::pdf::extract_pdf;
use super::LoadError;

/// Lines after the title searched for the author block terminator.
const AUTHOR_SCAN_LINES: usize = 10;
const SUMMARY_LINES: usize = 10;
const UNKNOWN_DATE: &str = "unknown";

/// Load every `*.pdf` directly inside `dir` as one Document per file, with
/// metadata parsed from the text.
///
/// Files that cannot be read or yield no text are skipped with a warning.
pub fn load_pdf_directory(dir: &Path) -> Result<Vec<Document>, LoadError> {
    if !dir.is_dir() {
        return Err(LoadError::NotADirectory(dir.to_path_buf()));
    }

    let files = list_pdfs(dir)?;
    let mut pages = Vec::new();
    for path in &files {
        match load_pages(path) {
            Ok(file_pages) if file_pages.is_empty() => {
                warn!(path = %path.display(), "PDF has no extractable text, skipping");
            }
            Ok(file_pages) => pages.extend(file_pages),
            Err(e) => warn!(path = %path.display(), error = %e, "failed to load PDF, skipping"),
        }
    }

    info!("Loaded {} pages from {} PDF files.", pages.len(), files.len());

    let mut documents = combine_documents(pages);
    for doc in &mut documents {
        doc.metadata = parse_metadata(doc);
    }
    Ok(documents)
}

fn list_pdfs(dir: &Path) -> Result<Vec<PathBuf>, LoadError> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let is_pdf = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("pdf"));
        if is_pdf && path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// One Document per non-blank page. Every page carries the file's content
/// hash as `entry_id`, so ids are stable across runs.
fn load_pages(path: &Path) -> Result<Vec<Document>, LoadError> {
    let bytes = std::fs::read(path)?;
    let entry_id = format!("{:x}", Sha256::digest(&bytes));
    let published = modified_date(path);
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let pages = extract_pdf(&bytes)?;
    debug!(file = %file_name, pages = pages.len(), "extracted PDF");

    Ok(pages
        .into_iter()
        .map(|page| {
            Document::new(page.text)
                .with_metadata(PAGE_LABEL, page.page_number.to_string())
                .with_metadata(FILE_NAME, file_name.as_str())
                .with_metadata(ENTRY_ID, entry_id.as_str())
                .with_metadata(PUBLISHED, published.as_str())
        })
        .collect())
}

fn modified_date(path: &Path) -> String {
    std::fs::metadata(path)
        .and_then(|m| m.modified())
        .map(|t| DateTime::<Utc>::from(t).format("%Y-%m-%d").to_string())
        .unwrap_or_else(|_| UNKNOWN_DATE.to_string())
}

/// Merge page Documents into one Document per `file_name`, in first-seen
/// order. Page texts are joined with a blank line and the first page's
/// metadata is kept.
///
/// A file whose `entry_id` was already taken by an earlier file (a
/// byte-identical copy) is dropped, so parent ids stay unique.
pub fn combine_documents(pages: Vec<Document>) -> Vec<Document> {
    let mut by_file: IndexMap<String, Vec<Document>> = IndexMap::new();
    for page in pages {
        let key = page.get_str(FILE_NAME).unwrap_or_default().to_string();
        by_file.entry(key).or_default().push(page);
    }

    let mut seen: HashMap<String, String> = HashMap::new();
    let mut documents = Vec::with_capacity(by_file.len());
    for (file_name, file_pages) in by_file {
        let Some(first) = file_pages.first() else {
            continue;
        };
        if let Some(id) = first.entry_id() {
            if let Some(original) = seen.get(id) {
                warn!(
                    file = %file_name,
                    duplicate_of = %original,
                    "skipping PDF with identical content"
                );
                continue;
            }
            seen.insert(id.to_string(), file_name.clone());
        }

        let text = file_pages
            .iter()
            .map(|p| p.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");
        let metadata = first.metadata.clone();
        documents.push(Document { text, metadata });
    }
    documents
}

/// Derive bibliographic metadata from a paper's leading lines.
///
/// The title is the first non-empty line. Authors run up to and including
/// the first line containing `*` (an affiliation footnote marker) within
/// the next few lines; without a marker the author list is empty. The
/// summary is the ten lines after that.
pub fn parse_metadata(doc: &Document) -> Metadata {
    let lines: Vec<&str> = doc.text.lines().collect();
    let title_idx = lines.iter().position(|l| !l.trim().is_empty());
    let title = title_idx.map(|i| lines[i].trim()).unwrap_or_default();
    let after_title = title_idx.map_or(lines.len(), |i| i + 1);

    let marker = lines
        .iter()
        .enumerate()
        .skip(after_title)
        .take(AUTHOR_SCAN_LINES)
        .find(|(_, line)| line.contains('*'))
        .map(|(i, _)| i);

    let (authors, summary_start) = match marker {
        Some(end) => {
            let authors = lines[after_title..=end]
                .iter()
                .map(|l| l.trim())
                .filter(|l| !l.is_empty())
                .collect::<Vec<_>>()
                .join(", ");
            (authors, end + 1)
        }
        None => (String::new(), after_title),
    };

    let summary = lines
        .iter()
        .skip(summary_start)
        .take(SUMMARY_LINES)
        .copied()
        .collect::<Vec<_>>()
        .join("\n");

    let published = doc.get_str(PUBLISHED).unwrap_or(UNKNOWN_DATE);

    let mut metadata = Metadata::new();
    metadata.insert(PUBLISHED.to_string(), published.into());
    metadata.insert(TITLE.to_string(), title.into());
    metadata.insert(AUTHORS.to_string(), authors.into());
    metadata.insert(SUMMARY.to_string(), summary.into());
    for key in [ENTRY_ID, FILE_NAME] {
        if let Some(value) = doc.metadata.get(key) {
            metadata.insert(key.to_string(), value.clone());
        }
    }
    metadata
}
