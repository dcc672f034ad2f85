use crate::compose::CompositionResolver;
use crate::error::SynthesisError;
use crate::models::{
    CompileMetadata, CompileOptions, CompiledContent, ExportOptions, RenderMetadata,
    RenderedDocument,
};
use crate::render::{build_document_html, export_filename};
use crate::traits::{AnnotationStore, KnowledgeStore, NotebookStore, RenderEngine};
use chrono::Utc;
use tracing::{info, warn};

/// Compiles a notebook's ordered composition references into
/// [`CompiledContent`] and, on request, a paginated document.
///
/// Stateless and request-scoped like the ingestion side: every call reads
/// the stores afresh and returns a pure value. Resolution is best-effort
/// per reference; only the notebook fetch itself can fail a compilation.
pub struct SynthesisPipeline<N, K, A> {
    notebooks: N,
    knowledge: K,
    annotations: A,
}

impl<N, K, A> SynthesisPipeline<N, K, A>
where
    N: NotebookStore + Send + Sync,
    K: KnowledgeStore + Send + Sync,
    A: AnnotationStore + Send + Sync,
{
    pub fn new(notebooks: N, knowledge: K, annotations: A) -> Self {
        Self {
            notebooks,
            knowledge,
            annotations,
        }
    }

    pub async fn compile(
        &self,
        notebook_id: &str,
        user_id: &str,
        options: &CompileOptions,
    ) -> Result<CompiledContent, SynthesisError> {
        let notebook = self
            .notebooks
            .get_with_composition(notebook_id, user_id)
            .await?
            .ok_or_else(|| SynthesisError::NotebookNotFound(notebook_id.to_string()))?;

        let resolver = CompositionResolver::new(&self.knowledge, &self.annotations);
        let mut sections = Vec::new();

        for reference in &notebook.references {
            match resolver.resolve(reference, user_id, options).await {
                Ok(Some(section)) => sections.push(section),
                Ok(None) => {}
                // One bad element never fails the whole compilation.
                Err(error) => warn!(
                    element_id = %reference.element_id,
                    %error,
                    "dropping unresolvable composition reference"
                ),
            }
        }

        // Resolution may complete out of order; order_index is the contract.
        sections.sort_by_key(|section| section.order_index);

        info!(
            notebook_id,
            resolved = sections.len(),
            referenced = notebook.references.len(),
            "notebook compiled"
        );

        Ok(CompiledContent {
            title: notebook.title,
            description: notebook.description,
            metadata: CompileMetadata {
                total_elements: sections.len(),
                compiled_at: Utc::now(),
                user_id: user_id.to_string(),
                notebook_id: notebook_id.to_string(),
            },
            sections,
        })
    }

    /// Compiles and renders to a paginated document. A notebook that
    /// compiles to zero sections is rejected rather than rendered as an
    /// empty document.
    pub async fn export<R>(
        &self,
        engine: &R,
        notebook_id: &str,
        user_id: &str,
        options: &CompileOptions,
        export: &ExportOptions,
    ) -> Result<RenderedDocument, SynthesisError>
    where
        R: RenderEngine + Send + Sync,
    {
        let compiled = self.compile(notebook_id, user_id, options).await?;
        if compiled.sections.is_empty() {
            return Err(SynthesisError::NoRenderableContent(notebook_id.to_string()));
        }

        let html = build_document_html(&compiled, export)?;
        let artifact = engine.render(&html, &export.page).await?;

        let generated_at = Utc::now();
        let file_size = artifact.bytes.len();
        let filename = export_filename(&compiled.title, generated_at.date_naive(), "pdf");

        info!(notebook_id, filename = %filename, file_size, "notebook exported");

        Ok(RenderedDocument {
            buffer: artifact.bytes,
            filename,
            metadata: RenderMetadata {
                title: compiled.title,
                page_count: artifact.page_count,
                generated_at,
                template: export.template,
                file_size,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        Annotation, AnnotationKind, CompositionReference, ElementType, KnowledgeItem, Notebook,
        PageOptions,
    };
    use crate::traits::RenderArtifact;
    use async_trait::async_trait;
    use std::collections::HashMap;

    struct FakeNotebooks {
        notebook: Option<Notebook>,
    }

    #[async_trait]
    impl NotebookStore for FakeNotebooks {
        async fn get_with_composition(
            &self,
            _notebook_id: &str,
            _user_id: &str,
        ) -> Result<Option<Notebook>, SynthesisError> {
            Ok(self.notebook.clone())
        }
    }

    struct FakeKnowledge {
        items: HashMap<String, KnowledgeItem>,
        fail_on: Option<String>,
    }

    #[async_trait]
    impl KnowledgeStore for FakeKnowledge {
        async fn get_by_id(
            &self,
            element_id: &str,
        ) -> Result<Option<KnowledgeItem>, SynthesisError> {
            if self.fail_on.as_deref() == Some(element_id) {
                return Err(SynthesisError::Store {
                    store: "knowledge".to_string(),
                    details: "backend unavailable".to_string(),
                });
            }
            Ok(self.items.get(element_id).cloned())
        }
    }

    struct FakeAnnotations;

    #[async_trait]
    impl AnnotationStore for FakeAnnotations {
        async fn get_by_id_and_owner(
            &self,
            _element_id: &str,
            _user_id: &str,
        ) -> Result<Option<Annotation>, SynthesisError> {
            Ok(None)
        }
    }

    struct FakeEngine {
        page_count: Option<u32>,
    }

    #[async_trait]
    impl RenderEngine for FakeEngine {
        async fn render(
            &self,
            html: &str,
            _page: &PageOptions,
        ) -> Result<RenderArtifact, SynthesisError> {
            Ok(RenderArtifact {
                bytes: html.as_bytes().to_vec(),
                page_count: self.page_count,
            })
        }
    }

    fn knowledge_reference(id: &str, order_index: i64) -> CompositionReference {
        CompositionReference {
            element_type: ElementType::KnowledgeElement,
            element_id: id.to_string(),
            order_index,
            section_title: None,
            custom_content: None,
        }
    }

    fn knowledge_item(id: &str, body: &str) -> KnowledgeItem {
        KnowledgeItem {
            id: id.to_string(),
            title: Some(format!("Item {id}")),
            body: body.to_string(),
            agent_type: None,
            subtype: None,
            tags: Vec::new(),
            source_location: None,
        }
    }

    fn pipeline(
        notebook: Option<Notebook>,
        items: Vec<KnowledgeItem>,
        fail_on: Option<&str>,
    ) -> SynthesisPipeline<FakeNotebooks, FakeKnowledge, FakeAnnotations> {
        SynthesisPipeline::new(
            FakeNotebooks { notebook },
            FakeKnowledge {
                items: items.into_iter().map(|i| (i.id.clone(), i)).collect(),
                fail_on: fail_on.map(str::to_string),
            },
            FakeAnnotations,
        )
    }

    fn notebook(references: Vec<CompositionReference>) -> Notebook {
        Notebook {
            id: "nb-1".to_string(),
            title: "My Notebook".to_string(),
            description: None,
            references,
        }
    }

    #[tokio::test]
    async fn missing_notebook_is_not_found() {
        let pipeline = pipeline(None, vec![], None);
        let result = pipeline
            .compile("nb-1", "user-1", &CompileOptions::default())
            .await;

        assert!(matches!(result, Err(SynthesisError::NotebookNotFound(_))));
    }

    #[tokio::test]
    async fn empty_notebook_compiles_to_zero_sections() {
        let pipeline = pipeline(Some(notebook(vec![])), vec![], None);
        let compiled = pipeline
            .compile("nb-1", "user-1", &CompileOptions::default())
            .await
            .unwrap();

        assert!(compiled.sections.is_empty());
        assert_eq!(compiled.metadata.total_elements, 0);
    }

    #[tokio::test]
    async fn missing_element_is_dropped_silently() {
        let references = vec![knowledge_reference("k1", 0), knowledge_reference("gone", 1)];
        let pipeline = pipeline(
            Some(notebook(references)),
            vec![knowledge_item("k1", "alpha")],
            None,
        );

        let compiled = pipeline
            .compile("nb-1", "user-1", &CompileOptions::default())
            .await
            .unwrap();

        assert_eq!(compiled.sections.len(), 1);
        assert_eq!(compiled.metadata.total_elements, 1);
    }

    #[tokio::test]
    async fn store_fault_on_one_reference_is_absorbed() {
        let references = vec![knowledge_reference("k1", 0), knowledge_reference("bad", 1)];
        let pipeline = pipeline(
            Some(notebook(references)),
            vec![knowledge_item("k1", "alpha")],
            Some("bad"),
        );

        let compiled = pipeline
            .compile("nb-1", "user-1", &CompileOptions::default())
            .await
            .unwrap();

        assert_eq!(compiled.sections.len(), 1);
    }

    #[tokio::test]
    async fn sections_are_sorted_by_order_index() {
        let references = vec![
            knowledge_reference("k3", 30),
            knowledge_reference("k1", 10),
            knowledge_reference("k2", 20),
        ];
        let pipeline = pipeline(
            Some(notebook(references)),
            vec![
                knowledge_item("k1", "alpha"),
                knowledge_item("k2", "beta"),
                knowledge_item("k3", "gamma"),
            ],
            None,
        );

        let compiled = pipeline
            .compile("nb-1", "user-1", &CompileOptions::default())
            .await
            .unwrap();

        let order: Vec<i64> = compiled
            .sections
            .iter()
            .map(|section| section.order_index)
            .collect();
        assert_eq!(order, vec![10, 20, 30]);
        assert_eq!(compiled.sections[0].title, "Item k1");
    }

    #[tokio::test]
    async fn export_of_empty_compilation_is_not_found() {
        let pipeline = pipeline(Some(notebook(vec![])), vec![], None);
        let engine = FakeEngine { page_count: Some(3) };

        let result = pipeline
            .export(
                &engine,
                "nb-1",
                "user-1",
                &CompileOptions::default(),
                &ExportOptions::default(),
            )
            .await;

        assert!(matches!(result, Err(SynthesisError::NoRenderableContent(_))));
    }

    #[tokio::test]
    async fn export_wraps_engine_output() {
        let references = vec![knowledge_reference("k1", 0)];
        let pipeline = pipeline(
            Some(notebook(references)),
            vec![knowledge_item("k1", "alpha body")],
            None,
        );
        let engine = FakeEngine { page_count: Some(5) };

        let document = pipeline
            .export(
                &engine,
                "nb-1",
                "user-1",
                &CompileOptions::default(),
                &ExportOptions::default(),
            )
            .await
            .unwrap();

        assert!(document.filename.starts_with("My_Notebook_"));
        assert!(document.filename.ends_with(".pdf"));
        assert_eq!(document.metadata.page_count, Some(5));
        assert_eq!(document.metadata.file_size, document.buffer.len());
        assert!(!document.buffer.is_empty());
    }
}
