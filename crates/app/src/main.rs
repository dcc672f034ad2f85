use anyhow::Context;
use async_trait::async_trait;
use clap::{Parser, Subcommand};
use content_pipeline_core::{
    Annotation, CompileOptions, ExportOptions, FileKind, HttpOcrClient, HttpRenderClient,
    IngestError, IngestOptions, IngestionPipeline, KnowledgeItem, MemoryAnnotationStore,
    MemoryKnowledgeStore, MemoryNotebookStore, Notebook, OcrClient, StructuredText,
    SynthesisPipeline,
};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use walkdir::WalkDir;

#[derive(Parser)]
#[command(name = "content-pipeline", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Ingest documents into structured text.
    Ingest {
        /// Single file to ingest.
        #[arg(long, conflicts_with = "folder")]
        file: Option<PathBuf>,
        /// Folder to ingest recursively (supported extensions only).
        #[arg(long)]
        folder: Option<PathBuf>,
        /// Force OCR even when the decoder extracted text.
        #[arg(long, default_value_t = false)]
        use_ocr: bool,
        /// OCR service endpoint.
        #[arg(long, env = "OCR_ENDPOINT")]
        ocr_endpoint: Option<String>,
        /// OCR service API key.
        #[arg(long, env = "OCR_API_KEY")]
        ocr_api_key: Option<String>,
        /// Emit the structured text as JSON instead of an outline.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Compile a notebook bundle into formatted text.
    Compile {
        /// JSON bundle with the notebook, knowledge items, and annotations.
        #[arg(long)]
        bundle: PathBuf,
        /// Notebook id (defaults to the bundle's notebook).
        #[arg(long)]
        notebook: Option<String>,
        /// Acting user id (defaults to the bundle's user).
        #[arg(long)]
        user: Option<String>,
        /// Formatting style: academic, casual, structured, or minimal.
        #[arg(long, default_value = "structured")]
        style: String,
        /// Separator placed between sections.
        #[arg(long)]
        separator: Option<String>,
        /// Omit per-section source attributions.
        #[arg(long, default_value_t = false)]
        no_sources: bool,
        /// Omit the compiled-on metadata line.
        #[arg(long, default_value_t = false)]
        no_metadata: bool,
    },
    /// Compile a notebook bundle and render it to a paginated document.
    Export {
        #[arg(long)]
        bundle: PathBuf,
        #[arg(long)]
        notebook: Option<String>,
        #[arg(long)]
        user: Option<String>,
        #[arg(long, default_value = "structured")]
        style: String,
        /// Visual template: academic, modern, minimal, or report.
        #[arg(long, default_value = "academic")]
        template: String,
        /// Render engine endpoint.
        #[arg(long, env = "RENDER_ENDPOINT")]
        render_endpoint: String,
        /// Skip the table of contents.
        #[arg(long, default_value_t = false)]
        no_toc: bool,
        /// Output path (defaults to the generated filename).
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

/// Notebook bundle format consumed by `compile` and `export`: the in-memory
/// stores are loaded from it, standing in for the real store services.
#[derive(Deserialize)]
struct Bundle {
    user_id: String,
    notebook: Notebook,
    #[serde(default)]
    knowledge: Vec<KnowledgeItem>,
    #[serde(default)]
    annotations: Vec<Annotation>,
}

enum AppOcr {
    Http(HttpOcrClient),
    Disabled,
}

#[async_trait]
impl OcrClient for AppOcr {
    async fn detect_text(&self, bytes: &[u8]) -> Result<Vec<String>, IngestError> {
        match self {
            AppOcr::Http(client) => client.detect_text(bytes).await,
            AppOcr::Disabled => Err(IngestError::OcrService(
                "no OCR endpoint configured (set --ocr-endpoint or OCR_ENDPOINT)".to_string(),
            )),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(fmt::layer())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Ingest {
            file,
            folder,
            use_ocr,
            ocr_endpoint,
            ocr_api_key,
            json,
        } => {
            let ocr = match ocr_endpoint {
                Some(endpoint) => AppOcr::Http(
                    HttpOcrClient::new(&endpoint, ocr_api_key)
                        .with_context(|| format!("invalid OCR endpoint: {endpoint}"))?,
                ),
                None => AppOcr::Disabled,
            };
            let pipeline = IngestionPipeline::new(ocr);
            let options = IngestOptions { use_ocr };

            let files = match (file, folder) {
                (Some(single), _) => vec![single],
                (None, Some(folder)) => {
                    let discovered = discover_supported_files(&folder);
                    if discovered.is_empty() {
                        anyhow::bail!("no supported documents found in {}", folder.display());
                    }
                    discovered
                }
                (None, None) => anyhow::bail!("pass --file or --folder"),
            };

            let mut failures = 0usize;
            for path in files {
                let bytes = tokio::fs::read(&path)
                    .await
                    .with_context(|| format!("cannot read {}", path.display()))?;
                let declared = path
                    .extension()
                    .and_then(|extension| extension.to_str())
                    .unwrap_or_default();

                match pipeline.process(&bytes, declared, &options).await {
                    Ok(document) => {
                        if json {
                            println!("{}", serde_json::to_string_pretty(&document)?);
                        } else {
                            print_outline(&path, &document);
                        }
                    }
                    Err(error) => {
                        failures += 1;
                        warn!(path = %path.display(), %error, "skipped document");
                    }
                }
            }

            if failures > 0 {
                println!("{failures} document(s) skipped, see warnings");
            }
        }
        Command::Compile {
            bundle,
            notebook,
            user,
            style,
            separator,
            no_sources,
            no_metadata,
        } => {
            let loaded = load_bundle(&bundle).await?;
            let notebook_id = notebook.unwrap_or_else(|| loaded.notebook_id.clone());
            let user_id = user.unwrap_or_else(|| loaded.user_id.clone());

            let mut options = CompileOptions {
                format_style: style.parse()?,
                include_source_references: !no_sources,
                include_metadata: !no_metadata,
                ..CompileOptions::default()
            };
            if let Some(separator) = separator {
                options.section_separator = separator;
            }

            let pipeline =
                SynthesisPipeline::new(loaded.notebooks, loaded.knowledge, loaded.annotations);
            let compiled = pipeline.compile(&notebook_id, &user_id, &options).await?;

            info!(
                notebook = %notebook_id,
                elements = compiled.metadata.total_elements,
                "compiled notebook"
            );
            println!(
                "{}",
                content_pipeline_core::generate_formatted_text(&compiled, &options)
            );
        }
        Command::Export {
            bundle,
            notebook,
            user,
            style,
            template,
            render_endpoint,
            no_toc,
            output,
        } => {
            let loaded = load_bundle(&bundle).await?;
            let notebook_id = notebook.unwrap_or_else(|| loaded.notebook_id.clone());
            let user_id = user.unwrap_or_else(|| loaded.user_id.clone());

            let options = CompileOptions {
                format_style: style.parse()?,
                ..CompileOptions::default()
            };
            let export = ExportOptions {
                template: template.parse()?,
                include_toc: !no_toc,
                ..ExportOptions::default()
            };

            let engine = HttpRenderClient::new(&render_endpoint)
                .with_context(|| format!("invalid render endpoint: {render_endpoint}"))?;
            let pipeline =
                SynthesisPipeline::new(loaded.notebooks, loaded.knowledge, loaded.annotations);

            let document = pipeline
                .export(&engine, &notebook_id, &user_id, &options, &export)
                .await?;

            let target = output.unwrap_or_else(|| PathBuf::from(&document.filename));
            tokio::fs::write(&target, &document.buffer)
                .await
                .with_context(|| format!("cannot write {}", target.display()))?;

            println!(
                "wrote {} ({} bytes, pages: {})",
                target.display(),
                document.metadata.file_size,
                document
                    .metadata
                    .page_count
                    .map(|count| count.to_string())
                    .unwrap_or_else(|| "unknown".to_string())
            );
        }
    }

    Ok(())
}

struct LoadedBundle {
    user_id: String,
    /// Id the notebook is stored under; minted when the bundle omits one.
    notebook_id: String,
    notebooks: MemoryNotebookStore,
    knowledge: MemoryKnowledgeStore,
    annotations: MemoryAnnotationStore,
}

async fn load_bundle(path: &Path) -> anyhow::Result<LoadedBundle> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("cannot read bundle {}", path.display()))?;
    let bundle: Bundle =
        serde_json::from_str(&raw).with_context(|| format!("malformed bundle {}", path.display()))?;

    let notebooks = MemoryNotebookStore::new();
    let notebook_id = notebooks.insert(&bundle.user_id, bundle.notebook);

    let knowledge = MemoryKnowledgeStore::new();
    for item in bundle.knowledge {
        knowledge.insert(item);
    }

    let annotations = MemoryAnnotationStore::new();
    for annotation in bundle.annotations {
        annotations.insert(&bundle.user_id, annotation);
    }

    Ok(LoadedBundle {
        user_id: bundle.user_id,
        notebook_id,
        notebooks,
        knowledge,
        annotations,
    })
}

fn discover_supported_files(folder: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();

    for entry in WalkDir::new(folder)
        .into_iter()
        .filter_map(|item| item.ok())
    {
        if !entry.file_type().is_file() {
            continue;
        }

        let supported = entry
            .path()
            .extension()
            .and_then(|extension| extension.to_str())
            .and_then(FileKind::from_declared)
            .is_some();

        if supported {
            files.push(entry.path().to_path_buf());
        }
    }

    files.sort_unstable();
    files
}

fn print_outline(path: &Path, document: &StructuredText) {
    println!("{}", path.display());
    println!("  title: {}", document.title);
    println!(
        "  source: {}  words: {}",
        document.metadata.source, document.metadata.word_count
    );
    if let Some(pages) = document.metadata.page_count {
        println!("  pages: {pages}");
    }
    if let Some(slides) = document.metadata.slide_count {
        println!("  slides: {slides}");
    }
    for section in &document.sections {
        let preview: String = section.content.chars().take(60).collect();
        println!("  [{}] {}", section.heading, preview);
    }
}

#[cfg(test)]
mod tests {
    use super::{discover_supported_files, load_bundle};
    use content_pipeline_core::NotebookStore;
    use std::fs::{self, File};
    use tempfile::tempdir;

    #[test]
    fn discovery_is_recursive_and_filters_by_extension() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let base = dir.path();
        let nested = base.join("nested");
        fs::create_dir(&nested)?;

        File::create(base.join("a.pdf"))?;
        File::create(nested.join("b.docx"))?;
        File::create(base.join("notes.txt"))?;

        let files = discover_supported_files(base);
        assert_eq!(files.len(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn bundle_with_empty_notebook_id_is_retrievable() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("bundle.json");
        fs::write(
            &path,
            r#"{"user_id":"user-1","notebook":{"id":"","title":"Notes","references":[]}}"#,
        )?;

        let loaded = load_bundle(&path).await?;
        assert!(!loaded.notebook_id.is_empty());

        let fetched = loaded
            .notebooks
            .get_with_composition(&loaded.notebook_id, "user-1")
            .await?;
        assert_eq!(fetched.map(|notebook| notebook.title).as_deref(), Some("Notes"));
        Ok(())
    }
}
