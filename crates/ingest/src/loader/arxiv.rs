//! arXiv search via the public Atom API.

use chrono::DateTime;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info, warn};

use catbase_core::config::ArxivConfig;
use catbase_core::{Document, AUTHORS, ENTRY_ID, PUBLISHED, SUMMARY, TITLE};

use super::pdf::extract_pdf;
use super::LoadError;

/// One search hit with the metadata kept for ingestion.
#[derive(Debug, Clone, PartialEq)]
pub struct ArxivEntry {
    /// Abstract page URL, e.g. `http://arxiv.org/abs/2101.00001v1`.
    pub entry_id: String,
    /// Date of the latest version, `YYYY-MM-DD`.
    pub published: String,
    pub title: String,
    pub authors: Vec<String>,
    pub summary: String,
    pub pdf_url: String,
}

impl ArxivEntry {
    pub fn into_document(self, text: String) -> Document {
        Document::new(text)
            .with_metadata(PUBLISHED, self.published)
            .with_metadata(TITLE, self.title)
            .with_metadata(AUTHORS, self.authors.join(", "))
            .with_metadata(SUMMARY, self.summary)
            .with_metadata(ENTRY_ID, self.entry_id)
    }
}

// ── Atom feed ───────────────────────────────────────────────────────

#[derive(Deserialize)]
struct Feed {
    #[serde(rename = "entry", default)]
    entries: Vec<RawEntry>,
}

#[derive(Deserialize)]
struct RawEntry {
    id: String,
    updated: String,
    title: String,
    #[serde(default)]
    summary: String,
    #[serde(rename = "author", default)]
    authors: Vec<RawAuthor>,
    #[serde(rename = "link", default)]
    links: Vec<RawLink>,
}

#[derive(Deserialize)]
struct RawAuthor {
    name: String,
}

#[derive(Deserialize)]
struct RawLink {
    #[serde(rename = "@href")]
    href: String,
    #[serde(rename = "@title", default)]
    title: Option<String>,
}

/// Parse an arXiv Atom response into entries, in feed order.
pub fn parse_feed(xml: &str) -> Result<Vec<ArxivEntry>, LoadError> {
    let feed: Feed = quick_xml::de::from_str(xml).map_err(|e| LoadError::Feed(e.to_string()))?;
    Ok(feed.entries.into_iter().map(ArxivEntry::from).collect())
}

impl From<RawEntry> for ArxivEntry {
    fn from(raw: RawEntry) -> Self {
        let entry_id = raw.id.trim().to_string();
        let pdf_url = raw
            .links
            .iter()
            .find(|l| l.title.as_deref() == Some("pdf"))
            .map(|l| l.href.clone())
            .unwrap_or_else(|| entry_id.replacen("/abs/", "/pdf/", 1));

        Self {
            published: date_only(&raw.updated),
            title: normalize_whitespace(&raw.title),
            authors: raw
                .authors
                .into_iter()
                .map(|a| normalize_whitespace(&a.name))
                .collect(),
            summary: raw.summary.trim().to_string(),
            pdf_url,
            entry_id,
        }
    }
}

fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn date_only(timestamp: &str) -> String {
    let timestamp = timestamp.trim();
    match DateTime::parse_from_rfc3339(timestamp) {
        Ok(dt) => dt.date_naive().format("%Y-%m-%d").to_string(),
        Err(_) => timestamp.chars().take(10).collect(),
    }
}

// ── Client ──────────────────────────────────────────────────────────

pub struct ArxivClient {
    client: Client,
    api_url: String,
}

impl ArxivClient {
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(120))
                .build()
                .unwrap_or_else(|_| Client::new()),
            api_url: api_url.into(),
        }
    }

    pub fn from_config(config: &ArxivConfig) -> Self {
        Self::new(config.api_url.clone())
    }

    /// Query `all:{keyword}` and return up to `max_results` entries.
    pub async fn search(&self, keyword: &str, max_results: usize) -> Result<Vec<ArxivEntry>, LoadError> {
        let query = format!("all:{keyword}");
        let max_results = max_results.to_string();
        let response = self
            .client
            .get(&self.api_url)
            .query(&[
                ("search_query", query.as_str()),
                ("start", "0"),
                ("max_results", max_results.as_str()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(LoadError::Api(format!("{status}: {body}")));
        }

        parse_feed(&response.text().await?)
    }

    /// Search every comma-separated keyword and load each hit's full text.
    ///
    /// Documents keep keyword order, then feed order. An entry whose PDF
    /// cannot be fetched or has no text falls back to its summary.
    pub async fn load_documents(&self, keywords: &str, max_docs: usize) -> Result<Vec<Document>, LoadError> {
        let mut documents = Vec::new();

        for keyword in keywords.split(',').map(str::trim).filter(|k| !k.is_empty()) {
            let entries = self.search(keyword, max_docs).await?;
            info!(
                keyword,
                count = entries.len(),
                "Loaded {} documents from arXiv with keyword '{}'.",
                entries.len(),
                keyword
            );

            for entry in entries {
                let text = match self.fetch_text(&entry.pdf_url).await {
                    Ok(text) if !text.trim().is_empty() => text,
                    Ok(_) => {
                        warn!(entry_id = %entry.entry_id, "PDF has no extractable text, using summary");
                        entry.summary.clone()
                    }
                    Err(e) => {
                        warn!(entry_id = %entry.entry_id, error = %e, "PDF download failed, using summary");
                        entry.summary.clone()
                    }
                };
                documents.push(entry.into_document(text));
            }
        }

        Ok(documents)
    }

    async fn fetch_text(&self, pdf_url: &str) -> Result<String, LoadError> {
        debug!(pdf_url, "downloading PDF");
        let response = self.client.get(pdf_url).send().await?.error_for_status()?;
        let bytes = response.bytes().await?;

        let pages = tokio::task::spawn_blocking(move || extract_pdf(&bytes))
            .await
            .map_err(|e| LoadError::Pdf(format!("extraction task failed: {e}")))??;

        Ok(pages
            .into_iter()
            .map(|p| p.text)
            .collect::<Vec<_>>()
            .join("\n\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom" xmlns:arxiv="http://arxiv.org/schemas/atom">
  <title type="html">ArXiv Query: search_query=all:catalysis</title>
  <id>http://arxiv.org/api/abc</id>
  <updated>2024-05-02T00:00:00-04:00</updated>
  <entry>
    <id>http://arxiv.org/abs/2101.00001v2</id>
    <updated>2021-03-04T17:59:59Z</updated>
    <published>2021-01-01T10:00:00Z</published>
    <title>Single-atom catalysts
      for CO2 reduction</title>
    <summary>  We review single-atom catalysts.
    </summary>
    <author><name>Ada Lovelace</name></author>
    <author><name>Alan  Turing</name></author>
    <arxiv:doi>10.1000/xyz</arxiv:doi>
    <link title="doi" href="http://dx.doi.org/10.1000/xyz" rel="related"/>
    <arxiv:comment>12 pages</arxiv:comment>
    <link href="http://arxiv.org/abs/2101.00001v2" rel="alternate" type="text/html"/>
    <link title="pdf" href="http://arxiv.org/pdf/2101.00001v2" rel="related" type="application/pdf"/>
    <arxiv:primary_category term="physics.chem-ph" scheme="http://arxiv.org/schemas/atom"/>
  </entry>
  <entry>
    <id>http://arxiv.org/abs/2202.00002v1</id>
    <updated>2022-02-02T00:00:00Z</updated>
    <title>Zeolites</title>
    <summary>Pores.</summary>
    <author><name>Grace Hopper</name></author>
    <link href="http://arxiv.org/abs/2202.00002v1" rel="alternate" type="text/html"/>
  </entry>
</feed>"#;

    #[test]
    fn parses_entries_in_feed_order() {
        let entries = parse_feed(FEED).unwrap();
        assert_eq!(entries.len(), 2);

        let first = &entries[0];
        assert_eq!(first.entry_id, "http://arxiv.org/abs/2101.00001v2");
        assert_eq!(first.published, "2021-03-04");
        assert_eq!(first.title, "Single-atom catalysts for CO2 reduction");
        assert_eq!(first.authors, vec!["Ada Lovelace", "Alan Turing"]);
        assert_eq!(first.summary, "We review single-atom catalysts.");
        assert_eq!(first.pdf_url, "http://arxiv.org/pdf/2101.00001v2");

        assert_eq!(entries[1].title, "Zeolites");
    }

    #[test]
    fn pdf_url_derived_from_id_when_link_missing() {
        let entries = parse_feed(FEED).unwrap();
        assert_eq!(entries[1].pdf_url, "http://arxiv.org/pdf/2202.00002v1");
    }

    #[test]
    fn empty_feed_has_no_entries() {
        let xml = r#"<feed xmlns="http://www.w3.org/2005/Atom"><title>empty</title></feed>"#;
        assert!(parse_feed(xml).unwrap().is_empty());
    }

    #[test]
    fn malformed_feed_is_an_error() {
        assert!(matches!(parse_feed("<feed><entry>"), Err(LoadError::Feed(_))));
    }

    #[test]
    fn document_metadata_is_filtered_and_ordered() {
        let entry = parse_feed(FEED).unwrap().remove(0);
        let doc = entry.into_document("full text".to_string());
        let keys: Vec<&str> = doc.metadata.keys().map(String::as_str).collect();
        assert_eq!(keys, vec![PUBLISHED, TITLE, AUTHORS, SUMMARY, ENTRY_ID]);
        assert_eq!(doc.get_str(AUTHORS), Some("Ada Lovelace, Alan Turing"));
        assert_eq!(doc.entry_id(), Some("http://arxiv.org/abs/2101.00001v2"));
        assert_eq!(doc.text, "full text");
    }

    #[test]
    fn dates_fall_back_to_prefix() {
        assert_eq!(date_only("2020-12-31T23:00:00-05:00"), "2020-12-31");
        assert_eq!(date_only("2020-12-31 garbage"), "2020-12-31");
    }

    #[tokio::test]
    async fn blank_keywords_issue_no_requests() {
        // Unroutable URL: any request would fail the test.
        let client = ArxivClient::new("http://127.0.0.1:9/api/query");
        let docs = client.load_documents(" , ,", 5).await.unwrap();
        assert!(docs.is_empty());
    }
}
