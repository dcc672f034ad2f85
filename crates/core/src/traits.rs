use crate::error::{IngestError, SynthesisError};
use crate::models::{Annotation, KnowledgeItem, Notebook, PageOptions};
use async_trait::async_trait;

/// Optical character recognition collaborator. Returns ordered line blocks;
/// line order is the service's responsibility and is never reordered here.
#[async_trait]
pub trait OcrClient {
    async fn detect_text(&self, bytes: &[u8]) -> Result<Vec<String>, IngestError>;
}

/// Document-oriented store of knowledge fragments, keyed by opaque id.
#[async_trait]
pub trait KnowledgeStore {
    async fn get_by_id(&self, element_id: &str) -> Result<Option<KnowledgeItem>, SynthesisError>;
}

/// Ownership-scoped annotation store: lookups require both the element id
/// and the owning user.
#[async_trait]
pub trait AnnotationStore {
    async fn get_by_id_and_owner(
        &self,
        element_id: &str,
        user_id: &str,
    ) -> Result<Option<Annotation>, SynthesisError>;
}

/// Relational notebook store; returns the notebook together with its
/// ordered composition references, or `None` when it does not exist.
#[async_trait]
pub trait NotebookStore {
    async fn get_with_composition(
        &self,
        notebook_id: &str,
        user_id: &str,
    ) -> Result<Option<Notebook>, SynthesisError>;
}

#[derive(Debug, Clone)]
pub struct RenderArtifact {
    pub bytes: Vec<u8>,
    /// Best-effort; engines that do not report a count return `None`.
    pub page_count: Option<u32>,
}

/// Paginating render engine. Implementations must scope any heavyweight
/// session (browser, subprocess) to a single call and release it on every
/// exit path, never sharing it across concurrent requests.
#[async_trait]
pub trait RenderEngine {
    async fn render(
        &self,
        html: &str,
        page: &PageOptions,
    ) -> Result<RenderArtifact, SynthesisError>;
}
