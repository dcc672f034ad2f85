pub mod memory;
pub mod ocr;
pub mod render_engine;

pub use memory::{MemoryAnnotationStore, MemoryKnowledgeStore, MemoryNotebookStore};
pub use ocr::HttpOcrClient;
pub use render_engine::HttpRenderClient;
