use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::traits::{check_embeddings, Embedder, EmbeddingError};

/// OpenAI-compatible embedding backend (`POST {base_url}/v1/embeddings`).
pub struct OpenAiEmbedder {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
    dimensions: usize,
}

impl OpenAiEmbedder {
    pub fn new(api_key: String, model: String, base_url: String, dimensions: usize) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(120))
                .build()
                .unwrap_or_else(|_| Client::new()),
            api_key,
            model,
            base_url: base_url.trim_end_matches('/').to_string(),
            dimensions,
        }
    }

    fn request<'a>(&'a self, texts: &[&'a str]) -> EmbedRequest<'a> {
        EmbedRequest {
            model: &self.model,
            input: texts.to_vec(),
            // Only the text-embedding-3 family accepts a shortened output.
            dimensions: self.model.starts_with("text-embedding-3").then_some(self.dimensions),
        }
    }
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: Vec<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    dimensions: Option<usize>,
}

#[derive(Deserialize)]
struct EmbedResponse {
    data: Vec<EmbedItem>,
}

#[derive(Deserialize)]
struct EmbedItem {
    embedding: Vec<f32>,
    index: usize,
}

impl EmbedResponse {
    /// Vectors in input order.
    fn into_ordered(mut self) -> Vec<Vec<f32>> {
        self.data.sort_by_key(|item| item.index);
        self.data.into_iter().map(|item| item.embedding).collect()
    }
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let response = self
            .client
            .post(format!("{}/v1/embeddings", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&self.request(texts))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::Api(format!("{status}: {body}")));
        }

        let resp: EmbedResponse = response.json().await?;
        let embeddings = resp.into_ordered();
        check_embeddings(texts.len(), self.dimensions, &embeddings)?;
        Ok(embeddings)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn model(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn embedder(model: &str) -> OpenAiEmbedder {
        OpenAiEmbedder::new("sk-test".into(), model.into(), "https://api.example.com/".into(), 256)
    }

    #[test]
    fn base_url_trailing_slash_is_dropped() {
        assert_eq!(embedder("m").base_url, "https://api.example.com");
    }

    #[test]
    fn dimensions_sent_only_for_v3_models() {
        let e = embedder("text-embedding-3-small");
        let body = serde_json::to_value(e.request(&["a", "b"])).unwrap();
        assert_eq!(body["dimensions"], 256);
        assert_eq!(body["input"], serde_json::json!(["a", "b"]));

        let e = embedder("text-embedding-ada-002");
        let body = serde_json::to_value(e.request(&["a"])).unwrap();
        assert!(body.get("dimensions").is_none());
    }

    #[test]
    fn response_is_reordered_by_index() {
        let resp: EmbedResponse = serde_json::from_str(
            r#"{"data":[{"embedding":[2.0],"index":1},{"embedding":[1.0],"index":0}],"model":"m"}"#,
        )
        .unwrap();
        assert_eq!(resp.into_ordered(), vec![vec![1.0], vec![2.0]]);
    }

    #[tokio::test]
    async fn empty_batch_skips_request() {
        let out = embedder("m").embed_batch(&[]).await.unwrap();
        assert!(out.is_empty());
    }
}
