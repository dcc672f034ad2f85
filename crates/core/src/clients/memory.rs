//! HashMap-backed store implementations. These back the CLI's bundle mode
//! and tests; production deployments substitute real store adapters behind
//! the same traits.

use crate::error::SynthesisError;
use crate::models::{Annotation, KnowledgeItem, Notebook};
use crate::traits::{AnnotationStore, KnowledgeStore, NotebookStore};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use uuid::Uuid;

#[derive(Default)]
pub struct MemoryKnowledgeStore {
    items: Mutex<HashMap<String, KnowledgeItem>>,
}

impl MemoryKnowledgeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts an item, minting an id when the record carries none.
    pub fn insert(&self, mut item: KnowledgeItem) -> String {
        if item.id.is_empty() {
            item.id = Uuid::new_v4().to_string();
        }
        let id = item.id.clone();
        self.items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id.clone(), item);
        id
    }
}

#[async_trait]
impl KnowledgeStore for MemoryKnowledgeStore {
    async fn get_by_id(&self, element_id: &str) -> Result<Option<KnowledgeItem>, SynthesisError> {
        Ok(self
            .items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(element_id)
            .cloned())
    }
}

#[derive(Default)]
pub struct MemoryAnnotationStore {
    annotations: Mutex<HashMap<String, (String, Annotation)>>,
}

impl MemoryAnnotationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, owner_id: &str, mut annotation: Annotation) -> String {
        if annotation.id.is_empty() {
            annotation.id = Uuid::new_v4().to_string();
        }
        let id = annotation.id.clone();
        self.annotations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id.clone(), (owner_id.to_string(), annotation));
        id
    }
}

#[async_trait]
impl AnnotationStore for MemoryAnnotationStore {
    async fn get_by_id_and_owner(
        &self,
        element_id: &str,
        user_id: &str,
    ) -> Result<Option<Annotation>, SynthesisError> {
        Ok(self
            .annotations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(element_id)
            .filter(|(owner, _)| owner == user_id)
            .map(|(_, annotation)| annotation.clone()))
    }
}

#[derive(Default)]
pub struct MemoryNotebookStore {
    notebooks: Mutex<HashMap<String, (String, Notebook)>>,
}

impl MemoryNotebookStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, owner_id: &str, mut notebook: Notebook) -> String {
        if notebook.id.is_empty() {
            notebook.id = Uuid::new_v4().to_string();
        }
        let id = notebook.id.clone();
        self.notebooks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id.clone(), (owner_id.to_string(), notebook));
        id
    }
}

#[async_trait]
impl NotebookStore for MemoryNotebookStore {
    async fn get_with_composition(
        &self,
        notebook_id: &str,
        user_id: &str,
    ) -> Result<Option<Notebook>, SynthesisError> {
        let found = self
            .notebooks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(notebook_id)
            .filter(|(owner, _)| owner == user_id)
            .map(|(_, notebook)| notebook.clone());

        // Real stores return references ordered by index; mirror that here.
        Ok(found.map(|mut notebook| {
            notebook
                .references
                .sort_by_key(|reference| reference.order_index);
            notebook
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AnnotationKind, CompositionReference, ElementType};
    use chrono::Utc;

    #[tokio::test]
    async fn knowledge_store_roundtrips_and_mints_ids() {
        let store = MemoryKnowledgeStore::new();
        let id = store.insert(KnowledgeItem {
            id: String::new(),
            title: Some("T".to_string()),
            body: "b".to_string(),
            agent_type: None,
            subtype: None,
            tags: Vec::new(),
            source_location: None,
        });

        assert!(!id.is_empty());
        let fetched = store.get_by_id(&id).await.unwrap().unwrap();
        assert_eq!(fetched.title.as_deref(), Some("T"));
        assert!(store.get_by_id("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn annotations_are_owner_scoped() {
        let store = MemoryAnnotationStore::new();
        let id = store.insert(
            "owner",
            Annotation {
                id: String::new(),
                kind: AnnotationKind::Note,
                content: "text".to_string(),
                position_data: None,
                created_at: Utc::now(),
            },
        );

        assert!(store.get_by_id_and_owner(&id, "owner").await.unwrap().is_some());
        assert!(store.get_by_id_and_owner(&id, "other").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn notebook_references_come_back_ordered() {
        let store = MemoryNotebookStore::new();
        let reference = |order_index| CompositionReference {
            element_type: ElementType::KnowledgeElement,
            element_id: format!("e{order_index}"),
            order_index,
            section_title: None,
            custom_content: None,
        };

        let id = store.insert(
            "owner",
            Notebook {
                id: String::new(),
                title: "N".to_string(),
                description: None,
                references: vec![reference(2), reference(0), reference(1)],
            },
        );

        let notebook = store
            .get_with_composition(&id, "owner")
            .await
            .unwrap()
            .unwrap();
        let order: Vec<i64> = notebook
            .references
            .iter()
            .map(|reference| reference.order_index)
            .collect();
        assert_eq!(order, vec![0, 1, 2]);
    }
}
