use crate::error::SynthesisError;
use crate::models::{Margins, PageOptions};
use crate::traits::{RenderArtifact, RenderEngine};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use url::Url;

/// HTTP adapter for the paginating render engine. The engine opens and
/// closes its own browser session per request, so each call here maps to
/// one scoped engine session on the service side.
pub struct HttpRenderClient {
    endpoint: Url,
    client: Client,
}

#[derive(Debug, Serialize)]
struct RenderRequest<'a> {
    html: &'a str,
    page_size: &'a str,
    orientation: &'a str,
    margins: &'a Margins,
    #[serde(skip_serializing_if = "Option::is_none")]
    header_template: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    footer_template: Option<&'a str>,
    page_numbers: bool,
}

impl HttpRenderClient {
    pub fn new(endpoint: &str) -> Result<Self, url::ParseError> {
        Ok(Self {
            endpoint: Url::parse(endpoint)?,
            client: Client::new(),
        })
    }
}

#[async_trait]
impl RenderEngine for HttpRenderClient {
    async fn render(
        &self,
        html: &str,
        page: &PageOptions,
    ) -> Result<RenderArtifact, SynthesisError> {
        let payload = RenderRequest {
            html,
            page_size: &page.page_size,
            orientation: page.orientation.as_str(),
            margins: &page.margins,
            header_template: page.header_template.as_deref(),
            footer_template: page.footer_template.as_deref(),
            page_numbers: page.page_numbers,
        };

        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(SynthesisError::Render(format!(
                "render endpoint {} returned {}",
                self.endpoint,
                response.status()
            )));
        }

        let page_count = response
            .headers()
            .get("x-page-count")
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.parse().ok());

        let bytes = response.bytes().await?.to_vec();
        if bytes.is_empty() {
            return Err(SynthesisError::Render(
                "render engine returned an empty document".to_string(),
            ));
        }

        Ok(RenderArtifact { bytes, page_count })
    }
}
