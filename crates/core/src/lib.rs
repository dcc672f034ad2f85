pub mod clients;
pub mod compose;
pub mod error;
pub mod extractor;
pub mod format;
pub mod ingest;
pub mod models;
pub mod normalize;
pub mod render;
pub mod structure;
pub mod synthesis;
pub mod traits;

pub use clients::{
    HttpOcrClient, HttpRenderClient, MemoryAnnotationStore, MemoryKnowledgeStore,
    MemoryNotebookStore,
};
pub use compose::CompositionResolver;
pub use error::{IngestError, SynthesisError};
pub use extractor::{
    DocxDecoder, FileKind, LopdfDecoder, PdfDecoder, PdfText, PptxDecoder, Slide, SlideDecoder,
    WordDecoder,
};
pub use format::{apply_style, format_annotation};
pub use ingest::{digest_bytes, IngestionPipeline};
pub use models::{
    Annotation, AnnotationKind, CompileMetadata, CompileOptions, CompiledContent, CompiledSection,
    CompositionReference, ElementType, ExportOptions, FormatStyle, IngestOptions, KnowledgeItem,
    Margins, Notebook, Orientation, PageOptions, RenderMetadata, RenderedDocument, Section,
    SourceLocation, StructuredText, Template, TextMetadata, TextSource,
};
pub use normalize::{count_words, normalize_text};
pub use render::{build_document_html, export_filename, generate_formatted_text, markdown_to_html};
pub use structure::{extract_title, infer_structure, standardize_text, HeadingRules};
pub use synthesis::SynthesisPipeline;
pub use traits::{
    AnnotationStore, KnowledgeStore, NotebookStore, OcrClient, RenderArtifact, RenderEngine,
};
