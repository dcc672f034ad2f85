use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("unsupported file type: {0}")]
    UnsupportedType(String),

    #[error("decode failure: {0}")]
    DecodeFailure(String),

    #[error("no text found in document")]
    NoTextFound,

    #[error("ocr service failure: {0}")]
    OcrService(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("regex error: {0}")]
    Regex(#[from] regex::Error),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
}

#[derive(Debug, Error)]
pub enum SynthesisError {
    #[error("notebook not found: {0}")]
    NotebookNotFound(String),

    #[error("notebook has no renderable content: {0}")]
    NoRenderableContent(String),

    #[error("invalid response from {store}: {details}")]
    Store { store: String, details: String },

    #[error("render engine failure: {0}")]
    Render(String),

    #[error("invalid options: {0}")]
    InvalidOptions(String),

    #[error("regex error: {0}")]
    Regex(#[from] regex::Error),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("url parse error: {0}")]
    Url(#[from] url::ParseError),

    #[error("serialize error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = IngestError> = std::result::Result<T, E>;
