use crate::error::SynthesisError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Where the plain text of an ingested document came from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum TextSource {
    #[serde(rename = "pdf-text-extraction")]
    PdfTextExtraction,
    #[serde(rename = "ocr-textract")]
    OcrTextract,
    #[serde(rename = "word-extraction")]
    WordExtraction,
    #[serde(rename = "powerpoint-extraction")]
    PowerPointExtraction,
    #[serde(rename = "image-ocr")]
    ImageOcr,
}

impl TextSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            TextSource::PdfTextExtraction => "pdf-text-extraction",
            TextSource::OcrTextract => "ocr-textract",
            TextSource::WordExtraction => "word-extraction",
            TextSource::PowerPointExtraction => "powerpoint-extraction",
            TextSource::ImageOcr => "image-ocr",
        }
    }
}

impl fmt::Display for TextSource {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// One inferred section of an ingested document.
///
/// `subsections` is carried in the shape but stays empty in practice: the
/// heading heuristic cannot infer nesting depth, so sections are emitted
/// as a flat ordered sequence.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Section {
    pub heading: String,
    pub content: String,
    pub subsections: Vec<Section>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TextMetadata {
    pub word_count: usize,
    pub language: String,
    pub page_count: Option<usize>,
    pub slide_count: Option<usize>,
    pub source: TextSource,
    /// SHA-256 of the raw input bytes.
    pub source_checksum: String,
}

/// Canonical output of ingestion. Invariant: `sections` is never empty;
/// a synthetic "Content" section is substituted when no structure is found.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StructuredText {
    pub title: String,
    pub sections: Vec<Section>,
    pub metadata: TextMetadata,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct IngestOptions {
    /// Force the OCR path even when the decoder extracted text.
    pub use_ocr: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ElementType {
    KnowledgeElement,
    Annotation,
}

/// An ordered pointer from a notebook into one of the content stores.
/// `order_index` is unique per notebook and is the sort key for rendering.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CompositionReference {
    pub element_type: ElementType,
    pub element_id: String,
    pub order_index: i64,
    #[serde(default)]
    pub section_title: Option<String>,
    #[serde(default)]
    pub custom_content: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct SourceLocation {
    #[serde(default)]
    pub section: Option<String>,
    #[serde(default)]
    pub page: Option<u32>,
}

/// A knowledge fragment as returned by the content-item store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct KnowledgeItem {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    pub body: String,
    #[serde(default)]
    pub agent_type: Option<String>,
    #[serde(default)]
    pub subtype: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub source_location: Option<SourceLocation>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AnnotationKind {
    Highlight,
    Note,
    Bookmark,
}

impl AnnotationKind {
    pub fn label(&self) -> &'static str {
        match self {
            AnnotationKind::Highlight => "highlight",
            AnnotationKind::Note => "note",
            AnnotationKind::Bookmark => "bookmark",
        }
    }
}

/// A user annotation as returned by the annotation store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Annotation {
    #[serde(default)]
    pub id: String,
    pub kind: AnnotationKind,
    pub content: String,
    #[serde(default)]
    pub position_data: Option<serde_json::Value>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

/// A notebook plus its ordered composition list, as returned by the
/// notebook store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Notebook {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub references: Vec<CompositionReference>,
}

/// Named rule-set controlling per-item text decoration during compilation.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FormatStyle {
    Academic,
    Casual,
    #[default]
    Structured,
    Minimal,
}

impl FromStr for FormatStyle {
    type Err = SynthesisError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "academic" => Ok(FormatStyle::Academic),
            "casual" => Ok(FormatStyle::Casual),
            "structured" => Ok(FormatStyle::Structured),
            "minimal" => Ok(FormatStyle::Minimal),
            other => Err(SynthesisError::InvalidOptions(format!(
                "unknown format style: {other}"
            ))),
        }
    }
}

impl fmt::Display for FormatStyle {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FormatStyle::Academic => "academic",
            FormatStyle::Casual => "casual",
            FormatStyle::Structured => "structured",
            FormatStyle::Minimal => "minimal",
        };
        formatter.write_str(name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompileOptions {
    pub include_source_references: bool,
    pub format_style: FormatStyle,
    pub section_separator: String,
    pub include_metadata: bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            include_source_references: true,
            format_style: FormatStyle::Structured,
            section_separator: "\n\n---\n\n".to_string(),
            include_metadata: true,
        }
    }
}

/// The rendered form of one resolved composition reference.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CompiledSection {
    pub title: String,
    pub content: String,
    pub element_type: ElementType,
    pub source_id: String,
    pub order_index: i64,
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CompileMetadata {
    pub total_elements: usize,
    pub compiled_at: DateTime<Utc>,
    pub user_id: String,
    pub notebook_id: String,
}

/// Result of compiling a notebook: sections sorted by `order_index`.
/// Recomputed fresh on every compilation call, never persisted here.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CompiledContent {
    pub title: String,
    pub description: Option<String>,
    pub sections: Vec<CompiledSection>,
    pub metadata: CompileMetadata,
}

/// Named visual styling variant for paginated rendering. Affects only
/// presentation constants, never content or ordering.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Template {
    #[default]
    Academic,
    Modern,
    Minimal,
    Report,
}

impl FromStr for Template {
    type Err = SynthesisError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "academic" => Ok(Template::Academic),
            "modern" => Ok(Template::Modern),
            "minimal" => Ok(Template::Minimal),
            "report" => Ok(Template::Report),
            other => Err(SynthesisError::InvalidOptions(format!(
                "unknown template: {other}"
            ))),
        }
    }
}

impl fmt::Display for Template {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Template::Academic => "academic",
            Template::Modern => "modern",
            Template::Minimal => "minimal",
            Template::Report => "report",
        };
        formatter.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    #[default]
    Portrait,
    Landscape,
}

impl Orientation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Orientation::Portrait => "portrait",
            Orientation::Landscape => "landscape",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Margins {
    pub top: String,
    pub right: String,
    pub bottom: String,
    pub left: String,
}

impl Default for Margins {
    fn default() -> Self {
        Self {
            top: "20mm".to_string(),
            right: "20mm".to_string(),
            bottom: "20mm".to_string(),
            left: "20mm".to_string(),
        }
    }
}

/// Pagination parameters passed to the external render engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PageOptions {
    pub page_size: String,
    pub orientation: Orientation,
    pub margins: Margins,
    #[serde(default)]
    pub header_template: Option<String>,
    #[serde(default)]
    pub footer_template: Option<String>,
    pub page_numbers: bool,
}

impl Default for PageOptions {
    fn default() -> Self {
        Self {
            page_size: "A4".to_string(),
            orientation: Orientation::Portrait,
            margins: Margins::default(),
            header_template: None,
            footer_template: None,
            page_numbers: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportOptions {
    pub template: Template,
    pub include_toc: bool,
    #[serde(default)]
    pub header_text: Option<String>,
    #[serde(default)]
    pub footer_text: Option<String>,
    pub page: PageOptions,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            template: Template::Academic,
            include_toc: true,
            header_text: None,
            footer_text: None,
            page: PageOptions::default(),
        }
    }
}

impl ExportOptions {
    pub fn with_template(template: Template) -> Self {
        Self {
            template,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RenderMetadata {
    pub title: String,
    /// Best-effort: stays `None` when the engine does not report it.
    pub page_count: Option<u32>,
    pub generated_at: DateTime<Utc>,
    pub template: Template,
    pub file_size: usize,
}

/// Paginated output artifact wrapped with a sanitized filename.
#[derive(Debug, Clone)]
pub struct RenderedDocument {
    pub buffer: Vec<u8>,
    pub filename: String,
    pub metadata: RenderMetadata,
}
