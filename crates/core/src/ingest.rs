use crate::error::IngestError;
use crate::extractor::{
    DocxDecoder, FileKind, LopdfDecoder, PdfDecoder, PptxDecoder, SlideDecoder, WordDecoder,
};
use crate::models::{IngestOptions, StructuredText, TextSource};
use crate::structure::standardize_text;
use crate::traits::OcrClient;
use sha2::{Digest, Sha256};
use std::fmt::Write;
use tracing::{debug, info};

pub fn digest_bytes(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// Turns raw file bytes of a declared type into [`StructuredText`].
///
/// Stateless and request-scoped: every call owns its working data, makes no
/// externally visible writes, and performs no internal retries. Retry policy
/// for the OCR collaborator, if any, belongs to the caller.
pub struct IngestionPipeline<O, P = LopdfDecoder, W = DocxDecoder, S = PptxDecoder> {
    ocr: O,
    pdf: P,
    word: W,
    slides: S,
}

impl<O> IngestionPipeline<O>
where
    O: OcrClient + Send + Sync,
{
    pub fn new(ocr: O) -> Self {
        Self {
            ocr,
            pdf: LopdfDecoder,
            word: DocxDecoder,
            slides: PptxDecoder,
        }
    }
}

impl<O, P, W, S> IngestionPipeline<O, P, W, S>
where
    O: OcrClient + Send + Sync,
    P: PdfDecoder + Send + Sync,
    W: WordDecoder + Send + Sync,
    S: SlideDecoder + Send + Sync,
{
    pub fn with_decoders(ocr: O, pdf: P, word: W, slides: S) -> Self {
        Self {
            ocr,
            pdf,
            word,
            slides,
        }
    }

    /// Dispatches on the declared type (case-insensitive). Unknown types
    /// fail with [`IngestError::UnsupportedType`]; all other failures are
    /// terminal for the call.
    pub async fn process(
        &self,
        bytes: &[u8],
        declared_type: &str,
        options: &IngestOptions,
    ) -> Result<StructuredText, IngestError> {
        let kind = FileKind::from_declared(declared_type)
            .ok_or_else(|| IngestError::UnsupportedType(declared_type.to_string()))?;

        let checksum = digest_bytes(bytes);
        debug!(?kind, size = bytes.len(), "ingesting document");

        let result = match kind {
            FileKind::Pdf => self.process_pdf(bytes, options, checksum).await,
            FileKind::Word => self.process_word(bytes, checksum),
            FileKind::PowerPoint => self.process_power_point(bytes, checksum),
            FileKind::Image => self.process_image(bytes, checksum).await,
        }?;

        info!(
            source = %result.metadata.source,
            sections = result.sections.len(),
            words = result.metadata.word_count,
            "document ingested"
        );
        Ok(result)
    }

    async fn process_pdf(
        &self,
        bytes: &[u8],
        options: &IngestOptions,
        checksum: String,
    ) -> Result<StructuredText, IngestError> {
        let extracted = self.pdf.extract(bytes)?;

        // An explicit OCR request always wins over extracted text.
        if options.use_ocr || extracted.text.trim().is_empty() {
            return self.process_image_based_pdf(bytes, checksum).await;
        }

        standardize_text(
            &extracted.text,
            TextSource::PdfTextExtraction,
            Some(extracted.page_count),
            None,
            checksum,
        )
    }

    async fn process_image_based_pdf(
        &self,
        bytes: &[u8],
        checksum: String,
    ) -> Result<StructuredText, IngestError> {
        let text = self.ocr_text(bytes).await?;
        standardize_text(&text, TextSource::OcrTextract, None, None, checksum)
    }

    async fn process_image(
        &self,
        bytes: &[u8],
        checksum: String,
    ) -> Result<StructuredText, IngestError> {
        let text = self.ocr_text(bytes).await?;
        standardize_text(&text, TextSource::ImageOcr, None, None, checksum)
    }

    /// Joins the collaborator's line blocks with `\n` in the order returned.
    async fn ocr_text(&self, bytes: &[u8]) -> Result<String, IngestError> {
        let lines = self.ocr.detect_text(bytes).await?;
        let joined = lines.join("\n");
        if joined.trim().is_empty() {
            return Err(IngestError::NoTextFound);
        }
        Ok(joined)
    }

    fn process_word(&self, bytes: &[u8], checksum: String) -> Result<StructuredText, IngestError> {
        let text = self.word.extract(bytes)?;
        standardize_text(&text, TextSource::WordExtraction, None, None, checksum)
    }

    fn process_power_point(
        &self,
        bytes: &[u8],
        checksum: String,
    ) -> Result<StructuredText, IngestError> {
        let slides = self.slides.extract(bytes)?;
        let slide_count = slides.len();

        let mut stream = String::new();
        for (index, slide) in slides.iter().enumerate() {
            if index > 0 {
                stream.push('\n');
            }
            let _ = writeln!(stream, "--- Slide {} ---", index + 1);
            if let Some(title) = &slide.title {
                let _ = writeln!(stream, "Title: {title}");
            }
            stream.push_str(&slide.content);
            stream.push('\n');
        }

        standardize_text(
            &stream,
            TextSource::PowerPointExtraction,
            None,
            Some(slide_count),
            checksum,
        )
    }
}
