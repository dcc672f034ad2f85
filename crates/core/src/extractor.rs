use crate::error::IngestError;
use lopdf::Document;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::io::{Cursor, Read};
use tracing::warn;
use zip::ZipArchive;

/// Closed set of ingestible file types. Dispatch is an exhaustive match,
/// so adding a type is a compile-time-checked extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Pdf,
    Word,
    PowerPoint,
    Image,
}

impl FileKind {
    /// Case-insensitive mapping from a declared type or extension.
    pub fn from_declared(declared: &str) -> Option<Self> {
        let normalized = declared.trim().trim_start_matches('.').to_ascii_lowercase();
        match normalized.as_str() {
            "pdf" => Some(FileKind::Pdf),
            "docx" | "doc" => Some(FileKind::Word),
            "pptx" | "ppt" => Some(FileKind::PowerPoint),
            "jpg" | "jpeg" | "png" | "gif" | "bmp" | "tiff" => Some(FileKind::Image),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PdfText {
    pub text: String,
    pub page_count: usize,
}

pub trait PdfDecoder {
    fn extract(&self, bytes: &[u8]) -> Result<PdfText, IngestError>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct LopdfDecoder;

impl PdfDecoder for LopdfDecoder {
    fn extract(&self, bytes: &[u8]) -> Result<PdfText, IngestError> {
        let document = Document::load_mem(bytes)
            .map_err(|error| IngestError::DecodeFailure(format!("pdf parse error: {error}")))?;

        let pages = document.get_pages();
        let page_count = pages.len();
        let mut text = String::new();

        for (page_no, _object_id) in pages {
            match document.extract_text(&[page_no]) {
                Ok(page_text) => {
                    if !text.is_empty() {
                        text.push('\n');
                    }
                    text.push_str(&page_text);
                }
                // Image-only pages extract nothing; the caller decides
                // whether that means OCR.
                Err(error) => warn!(page = page_no, %error, "pdf page text unavailable"),
            }
        }

        Ok(PdfText { text, page_count })
    }
}

pub trait WordDecoder {
    fn extract(&self, bytes: &[u8]) -> Result<String, IngestError>;
}

/// DOCX is Office Open XML: a ZIP whose `word/document.xml` part carries
/// the body text as `w:p` paragraph elements.
#[derive(Debug, Default, Clone, Copy)]
pub struct DocxDecoder;

impl WordDecoder for DocxDecoder {
    fn extract(&self, bytes: &[u8]) -> Result<String, IngestError> {
        let mut archive = ZipArchive::new(Cursor::new(bytes))
            .map_err(|error| IngestError::DecodeFailure(format!("not a docx archive: {error}")))?;

        let mut xml = String::new();
        archive
            .by_name("word/document.xml")
            .map_err(|error| {
                IngestError::DecodeFailure(format!("docx missing document part: {error}"))
            })?
            .read_to_string(&mut xml)
            .map_err(|error| {
                IngestError::DecodeFailure(format!("docx document part unreadable: {error}"))
            })?;

        Ok(paragraphs_from_ooxml(&xml, b"w:p"))
    }
}

/// Collects text runs per paragraph element, one output line per paragraph.
/// Malformed runs are logged and skipped rather than failing the document.
pub(crate) fn paragraphs_from_ooxml(xml: &str, paragraph_tag: &[u8]) -> String {
    let mut reader = Reader::from_str(xml);
    let mut out = String::new();
    let mut paragraph = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::End(element)) if element.name().as_ref() == paragraph_tag => {
                let trimmed = paragraph.trim();
                if !trimmed.is_empty() {
                    out.push_str(trimmed);
                    out.push('\n');
                }
                paragraph.clear();
            }
            Ok(Event::Text(text)) => match text.unescape() {
                Ok(value) => paragraph.push_str(&value),
                Err(error) => warn!(%error, "skipping undecodable text run"),
            },
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(error) => {
                warn!(%error, "stopping extraction at malformed xml");
                break;
            }
        }
    }

    let trimmed = paragraph.trim();
    if !trimmed.is_empty() {
        out.push_str(trimmed);
        out.push('\n');
    }

    out
}

#[derive(Debug, Clone, Default)]
pub struct Slide {
    pub title: Option<String>,
    pub content: String,
}

pub trait SlideDecoder {
    fn extract(&self, bytes: &[u8]) -> Result<Vec<Slide>, IngestError>;
}

/// PPTX slides live under `ppt/slides/slideN.xml`; slide order is the
/// numeric suffix, not the archive entry order.
#[derive(Debug, Default, Clone, Copy)]
pub struct PptxDecoder;

impl SlideDecoder for PptxDecoder {
    fn extract(&self, bytes: &[u8]) -> Result<Vec<Slide>, IngestError> {
        let mut archive = ZipArchive::new(Cursor::new(bytes))
            .map_err(|error| IngestError::DecodeFailure(format!("not a pptx archive: {error}")))?;

        let mut slide_names: Vec<String> = archive
            .file_names()
            .filter(|name| name.starts_with("ppt/slides/slide") && name.ends_with(".xml"))
            .map(str::to_string)
            .collect();
        slide_names.sort_by_key(|name| slide_number(name));

        let mut slides = Vec::new();
        for name in slide_names {
            let mut xml = String::new();
            match archive.by_name(&name) {
                Ok(mut part) => {
                    if let Err(error) = part.read_to_string(&mut xml) {
                        warn!(slide = %name, %error, "skipping unreadable slide part");
                        continue;
                    }
                }
                Err(error) => {
                    warn!(slide = %name, %error, "skipping missing slide part");
                    continue;
                }
            }
            slides.push(slide_from_xml(&xml));
        }

        if slides.is_empty() {
            return Err(IngestError::DecodeFailure(
                "pptx archive has no slides".to_string(),
            ));
        }

        Ok(slides)
    }
}

fn slide_number(name: &str) -> u32 {
    name.trim_start_matches("ppt/slides/slide")
        .trim_end_matches(".xml")
        .parse()
        .unwrap_or(0)
}

/// Splits a slide into an optional title (text inside the `title` or
/// `ctrTitle` placeholder shape) and body text, one line per `a:p`.
pub(crate) fn slide_from_xml(xml: &str) -> Slide {
    let mut reader = Reader::from_str(xml);
    let mut title_lines: Vec<String> = Vec::new();
    let mut body_lines: Vec<String> = Vec::new();
    let mut paragraph = String::new();
    let mut in_title_shape = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(element) | Event::Empty(element))
                if element.name().as_ref() == b"p:ph" =>
            {
                let is_title = element.attributes().flatten().any(|attribute| {
                    attribute.key.as_ref() == b"type"
                        && (attribute.value.as_ref() == b"title"
                            || attribute.value.as_ref() == b"ctrTitle")
                });
                if is_title {
                    in_title_shape = true;
                }
            }
            Ok(Event::End(element)) if element.name().as_ref() == b"p:sp" => {
                in_title_shape = false;
            }
            Ok(Event::End(element)) if element.name().as_ref() == b"a:p" => {
                let trimmed = paragraph.trim().to_string();
                if !trimmed.is_empty() {
                    if in_title_shape {
                        title_lines.push(trimmed);
                    } else {
                        body_lines.push(trimmed);
                    }
                }
                paragraph.clear();
            }
            Ok(Event::Text(text)) => {
                if let Ok(value) = text.unescape() {
                    paragraph.push_str(&value);
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(error) => {
                warn!(%error, "stopping extraction at malformed slide xml");
                break;
            }
        }
    }

    Slide {
        title: title_lines.first().cloned(),
        content: body_lines.join("\n"),
    }
}
