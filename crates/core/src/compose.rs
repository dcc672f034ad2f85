use crate::error::SynthesisError;
use crate::format::{apply_style, format_annotation};
use crate::models::{
    AnnotationKind, CompileOptions, CompiledSection, CompositionReference, ElementType,
    KnowledgeItem,
};
use crate::traits::{AnnotationStore, KnowledgeStore};
use serde_json::json;
use tracing::debug;

/// Resolves one composition reference against its owning store.
///
/// A reference whose target cannot be found yields `Ok(None)` rather than
/// an error: a single stale reference must never fail a whole compilation.
pub struct CompositionResolver<'a, K, A> {
    knowledge: &'a K,
    annotations: &'a A,
}

impl<'a, K, A> CompositionResolver<'a, K, A>
where
    K: KnowledgeStore + Send + Sync,
    A: AnnotationStore + Send + Sync,
{
    pub fn new(knowledge: &'a K, annotations: &'a A) -> Self {
        Self {
            knowledge,
            annotations,
        }
    }

    pub async fn resolve(
        &self,
        reference: &CompositionReference,
        user_id: &str,
        options: &CompileOptions,
    ) -> Result<Option<CompiledSection>, SynthesisError> {
        match reference.element_type {
            ElementType::KnowledgeElement => self.resolve_knowledge(reference, options).await,
            ElementType::Annotation => self.resolve_annotation(reference, user_id, options).await,
        }
    }

    async fn resolve_knowledge(
        &self,
        reference: &CompositionReference,
        options: &CompileOptions,
    ) -> Result<Option<CompiledSection>, SynthesisError> {
        let Some(item) = self.knowledge.get_by_id(&reference.element_id).await? else {
            debug!(element_id = %reference.element_id, "knowledge element missing, dropping reference");
            return Ok(None);
        };

        let title = reference
            .section_title
            .clone()
            .filter(|title| !title.trim().is_empty())
            .or_else(|| {
                item.title
                    .clone()
                    .filter(|title| !title.trim().is_empty())
            })
            .unwrap_or_else(|| knowledge_default_title(item.subtype.as_deref()));

        let mut body = String::new();
        if let Some(custom) = &reference.custom_content {
            body.push_str(custom);
            body.push_str("\n\n");
        }
        body.push_str(&item.body);

        let mut content = apply_style(&body, item.subtype.as_deref(), options.format_style);

        if options.include_source_references {
            if let Some(line) = knowledge_source_line(&item) {
                content.push_str("\n\n");
                content.push_str(&line);
            }
        }

        Ok(Some(CompiledSection {
            title,
            content,
            element_type: ElementType::KnowledgeElement,
            source_id: item.id.clone(),
            order_index: reference.order_index,
            metadata: knowledge_metadata(&item),
        }))
    }

    async fn resolve_annotation(
        &self,
        reference: &CompositionReference,
        user_id: &str,
        options: &CompileOptions,
    ) -> Result<Option<CompiledSection>, SynthesisError> {
        let Some(annotation) = self
            .annotations
            .get_by_id_and_owner(&reference.element_id, user_id)
            .await?
        else {
            debug!(element_id = %reference.element_id, "annotation missing, dropping reference");
            return Ok(None);
        };

        let title = reference
            .section_title
            .clone()
            .filter(|title| !title.trim().is_empty())
            .unwrap_or_else(|| annotation_default_title(annotation.kind).to_string());

        let mut content =
            format_annotation(&annotation.content, annotation.kind, options.format_style);

        if options.include_source_references {
            content.push_str(&format!("\n\n*Source: {} annotation*", annotation.kind.label()));
        }

        Ok(Some(CompiledSection {
            title,
            content,
            element_type: ElementType::Annotation,
            source_id: annotation.id.clone(),
            order_index: reference.order_index,
            metadata: None,
        }))
    }
}

fn knowledge_default_title(subtype: Option<&str>) -> String {
    let title = match subtype {
        Some("summary") => "Summary",
        Some("definition") => "Definition",
        Some("formula") => "Formula",
        Some("example") => "Example",
        Some("concept") => "Concept",
        Some("question") => "Question",
        _ => "Knowledge Element",
    };
    title.to_string()
}

fn annotation_default_title(kind: AnnotationKind) -> &'static str {
    match kind {
        AnnotationKind::Highlight => "Highlighted Text",
        AnnotationKind::Note => "Personal Note",
        AnnotationKind::Bookmark => "Bookmark",
    }
}

/// Italic source attribution assembled only from the parts that exist;
/// returns `None` when the item carries no attribution at all.
fn knowledge_source_line(item: &KnowledgeItem) -> Option<String> {
    let mut parts = String::new();

    if let Some(agent) = item
        .agent_type
        .as_deref()
        .filter(|agent| !agent.trim().is_empty())
    {
        parts.push_str(&format!("{agent} agent"));
    }

    if let Some(location) = &item.source_location {
        if let Some(section) = location
            .section
            .as_deref()
            .filter(|section| !section.trim().is_empty())
        {
            if !parts.is_empty() {
                parts.push_str(" - ");
            }
            parts.push_str(section);
        }
        if let Some(page) = location.page {
            if !parts.is_empty() {
                parts.push(' ');
            }
            parts.push_str(&format!("(page {page})"));
        }
    }

    if parts.is_empty() {
        None
    } else {
        Some(format!("*Source: {parts}*"))
    }
}

fn knowledge_metadata(item: &KnowledgeItem) -> Option<serde_json::Value> {
    if item.tags.is_empty() && item.agent_type.is_none() && item.subtype.is_none() {
        return None;
    }
    Some(json!({
        "tags": item.tags,
        "agent_type": item.agent_type,
        "subtype": item.subtype,
    }))
}
