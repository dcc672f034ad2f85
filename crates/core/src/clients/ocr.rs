use crate::error::IngestError;
use crate::traits::OcrClient;
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use url::Url;

/// HTTP adapter for a Textract-style OCR service: posts the document bytes
/// base64-encoded and receives ordered line blocks back.
pub struct HttpOcrClient {
    endpoint: Url,
    api_key: Option<String>,
    client: Client,
}

#[derive(Debug, Clone, Serialize)]
struct OcrRequest {
    document_base64: String,
}

#[derive(Debug, Clone, Deserialize)]
struct OcrResponse {
    #[serde(default)]
    blocks: Vec<OcrBlock>,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct OcrBlock {
    #[serde(default)]
    text: Option<String>,
}

impl HttpOcrClient {
    pub fn new(endpoint: &str, api_key: Option<String>) -> Result<Self, url::ParseError> {
        Ok(Self {
            endpoint: Url::parse(endpoint)?,
            api_key,
            client: Client::new(),
        })
    }
}

#[async_trait]
impl OcrClient for HttpOcrClient {
    async fn detect_text(&self, bytes: &[u8]) -> Result<Vec<String>, IngestError> {
        let payload = OcrRequest {
            document_base64: STANDARD.encode(bytes),
        };

        let mut request = self.client.post(self.endpoint.clone()).json(&payload);
        if let Some(api_key) = &self.api_key {
            request = request.bearer_auth(api_key);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(IngestError::OcrService(format!(
                "ocr endpoint {} returned {}",
                self.endpoint,
                response.status()
            )));
        }

        let payload: OcrResponse = response.json().await?;
        Ok(lines_from_payload(payload))
    }
}

/// Prefers the structured block list; falls back to splitting a raw text
/// field. Block order is kept exactly as the service returned it.
fn lines_from_payload(payload: OcrResponse) -> Vec<String> {
    let lines: Vec<String> = payload
        .blocks
        .into_iter()
        .filter_map(|block| block.text)
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
        .collect();

    if !lines.is_empty() {
        return lines;
    }

    payload
        .text
        .map(|text| {
            text.lines()
                .map(|line| line.trim().to_string())
                .filter(|line| !line.is_empty())
                .collect()
        })
        .unwrap_or_default()
}
