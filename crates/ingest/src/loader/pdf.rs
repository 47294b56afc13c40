use super::LoadError;

/// A page of extracted text.
#[derive(Debug, Clone, PartialEq)]
pub struct PageContent {
    /// 1-based page number.
    pub page_number: usize,
    pub text: String,
}

/// Extract per-page text from PDF bytes. Blank pages are skipped; a PDF
/// with no extractable text yields an empty list.
pub fn extract_pdf(bytes: &[u8]) -> Result<Vec<PageContent>, LoadError> {
    let text = pdf_extract::extract_text_from_mem(bytes).map_err(|e| LoadError::Pdf(e.to_string()))?;
    Ok(split_pages(&text))
}

/// pdf-extract returns one string; form feeds (\x0C) separate pages.
fn split_pages(text: &str) -> Vec<PageContent> {
    if text.trim().is_empty() {
        tracing::debug!("PDF contains no extractable text");
        return Vec::new();
    }

    text.split('\x0C')
        .enumerate()
        .filter(|(_, page_text)| !page_text.trim().is_empty())
        .map(|(i, page_text)| PageContent {
            page_number: i + 1,
            text: page_text.trim().to_string(),
        })
        .collect()
}
