use crate::error::SynthesisError;
use crate::models::{CompileOptions, CompiledContent, ExportOptions, Template};
use chrono::NaiveDate;
use regex::Regex;
use std::fmt::Write;

/// Deterministic flat-text assembly of compiled content: a level-one title,
/// optional description and metadata line, then one `##` block per section
/// joined by the configured separator.
pub fn generate_formatted_text(content: &CompiledContent, options: &CompileOptions) -> String {
    let mut out = format!("# {}\n\n", content.title);

    if let Some(description) = &content.description {
        out.push_str(description);
        out.push_str("\n\n");
    }

    if options.include_metadata {
        let _ = write!(
            out,
            "*Compiled on {} \u{2022} {} elements*\n\n",
            content.metadata.compiled_at.format("%Y-%m-%d"),
            content.metadata.total_elements
        );
    }

    let blocks: Vec<String> = content
        .sections
        .iter()
        .map(|section| format!("## {}\n\n{}\n", section.title, section.content))
        .collect();
    out.push_str(&blocks.join(&options.section_separator));

    out
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Minimal markup conversion for section bodies: inline code, bold, italic,
/// and paragraph breaks on blank lines. Source text is HTML-escaped first.
pub fn markdown_to_html(text: &str) -> Result<String, regex::Error> {
    let escaped = escape_html(text);

    let code = Regex::new(r"`([^`]+)`")?;
    // bold runs before italic so `**` is not consumed as two `*` markers
    let bold = Regex::new(r"\*\*([^*]+)\*\*")?;
    let italic = Regex::new(r"\*([^*]+)\*")?;

    let paragraphs: Vec<String> = escaped
        .split("\n\n")
        .map(str::trim)
        .filter(|paragraph| !paragraph.is_empty())
        .map(|paragraph| {
            let with_code = code.replace_all(paragraph, "<code>$1</code>");
            let with_bold = bold.replace_all(&with_code, "<strong>$1</strong>");
            let with_italic = italic.replace_all(&with_bold, "<em>$1</em>");
            format!("<p>{}</p>", with_italic.replace('\n', "<br/>"))
        })
        .collect();

    Ok(paragraphs.join("\n"))
}

const BASE_STYLES: &str = r#"
@page { size: A4; }
body { margin: 0; line-height: 1.5; font-size: 11pt; }
.title-page { text-align: center; padding: 4em 2em; page-break-after: always; }
.title-page h1 { font-size: 24pt; margin-bottom: 0.5em; }
.title-page .description { font-style: italic; }
.toc { page-break-after: always; }
.toc ul { list-style: none; padding-left: 0; }
.toc li { margin: 0.4em 0; }
.content-section { margin-bottom: 1.5em; }
.content-section h2 { font-size: 14pt; margin-bottom: 0.5em; }
blockquote { border-left: 3px solid #ccc; margin-left: 0; padding-left: 1em; }
code { font-family: 'Courier New', monospace; background: #f5f5f5; padding: 0 0.2em; }
header, footer { font-size: 9pt; color: #666; text-align: center; }
"#;

impl Template {
    /// Per-template styling constants over the common base layout. Template
    /// choice affects presentation only, never content or ordering.
    pub fn stylesheet(&self) -> String {
        let (font_family, accent, heading_border) = match self {
            Template::Academic => (
                "Georgia, 'Times New Roman', serif",
                "#1a365d",
                "2px solid #1a365d",
            ),
            Template::Modern => ("'Helvetica Neue', Arial, sans-serif", "#2b6cb0", "none"),
            Template::Minimal => ("Arial, sans-serif", "#222222", "none"),
            Template::Report => (
                "'Segoe UI', Tahoma, sans-serif",
                "#234e52",
                "1px solid #cbd5e0",
            ),
        };

        format!(
            "{BASE_STYLES}\nbody {{ font-family: {font_family}; }}\nh1, h2 {{ color: {accent}; }}\n.content-section h2 {{ border-bottom: {heading_border}; }}"
        )
    }
}

/// Builds the full layout document handed to the render engine: title page,
/// optional table of contents (omitted when there are no sections), numbered
/// section blocks, and optional header/footer text.
pub fn build_document_html(
    content: &CompiledContent,
    options: &ExportOptions,
) -> Result<String, SynthesisError> {
    let mut body = String::new();

    if let Some(header) = &options.header_text {
        let _ = writeln!(body, "<header>{}</header>", escape_html(header));
    }

    body.push_str("<section class=\"title-page\">\n");
    let _ = writeln!(body, "<h1>{}</h1>", escape_html(&content.title));
    if let Some(description) = &content.description {
        let _ = writeln!(
            body,
            "<p class=\"description\">{}</p>",
            escape_html(description)
        );
    }
    let _ = writeln!(
        body,
        "<p class=\"generated\">Generated on {}</p>",
        content.metadata.compiled_at.format("%B %e, %Y")
    );
    let _ = writeln!(
        body,
        "<p class=\"count\">{} elements</p>",
        content.metadata.total_elements
    );
    body.push_str("</section>\n");

    if options.include_toc && !content.sections.is_empty() {
        body.push_str("<nav class=\"toc\">\n<h2>Table of Contents</h2>\n<ul>\n");
        for (index, section) in content.sections.iter().enumerate() {
            let _ = writeln!(
                body,
                "<li>{}. {}</li>",
                index + 1,
                escape_html(&section.title)
            );
        }
        body.push_str("</ul>\n</nav>\n");
    }

    for (index, section) in content.sections.iter().enumerate() {
        body.push_str("<section class=\"content-section\">\n");
        let _ = writeln!(
            body,
            "<h2>{}. {}</h2>",
            index + 1,
            escape_html(&section.title)
        );
        body.push_str(&markdown_to_html(&section.content)?);
        body.push_str("\n</section>\n");
    }

    if let Some(footer) = &options.footer_text {
        let _ = writeln!(body, "<footer>{}</footer>", escape_html(footer));
    }

    Ok(format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\"/>\n<title>{}</title>\n<style>{}</style>\n</head>\n<body>\n{}</body>\n</html>\n",
        escape_html(&content.title),
        options.template.stylesheet(),
        body
    ))
}

/// `<title with only alnum/space/hyphen, spaces -> underscores>_<ISO date>.<ext>`
pub fn export_filename(title: &str, date: NaiveDate, extension: &str) -> String {
    let sanitized: String = title
        .chars()
        .filter(|character| character.is_ascii_alphanumeric() || *character == ' ' || *character == '-')
        .collect();
    let stem = sanitized.trim().replace(' ', "_");

    if stem.is_empty() {
        format!("notebook_{date}.{extension}")
    } else {
        format!("{stem}_{date}.{extension}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        CompileMetadata, CompiledSection, ElementType, ExportOptions, Template,
    };
    use chrono::Utc;

    fn compiled(sections: Vec<CompiledSection>) -> CompiledContent {
        let total = sections.len();
        CompiledContent {
            title: "Study Notes".to_string(),
            description: Some("A short description".to_string()),
            sections,
            metadata: CompileMetadata {
                total_elements: total,
                compiled_at: Utc::now(),
                user_id: "user-1".to_string(),
                notebook_id: "nb-1".to_string(),
            },
        }
    }

    fn section(title: &str, content: &str, order_index: i64) -> CompiledSection {
        CompiledSection {
            title: title.to_string(),
            content: content.to_string(),
            element_type: ElementType::KnowledgeElement,
            source_id: "src".to_string(),
            order_index,
            metadata: None,
        }
    }

    #[test]
    fn formatted_text_starts_with_title_heading() {
        let content = compiled(vec![section("One", "alpha", 0), section("Two", "beta", 1)]);
        let text = generate_formatted_text(&content, &CompileOptions::default());

        assert!(text.starts_with("# Study Notes"));
        assert!(text.contains("## One"));
        assert!(text.contains("## Two"));
    }

    #[test]
    fn separator_appears_between_sections_only() {
        let content = compiled(vec![
            section("One", "alpha", 0),
            section("Two", "beta", 1),
            section("Three", "gamma", 2),
        ]);
        let options = CompileOptions {
            section_separator: "<<SEP>>".to_string(),
            ..CompileOptions::default()
        };

        let text = generate_formatted_text(&content, &options);
        assert_eq!(text.matches("<<SEP>>").count(), content.sections.len() - 1);
    }

    #[test]
    fn metadata_line_is_optional() {
        let content = compiled(vec![section("One", "alpha", 0)]);
        let without = CompileOptions {
            include_metadata: false,
            ..CompileOptions::default()
        };

        assert!(generate_formatted_text(&content, &CompileOptions::default())
            .contains("Compiled on"));
        assert!(!generate_formatted_text(&content, &without).contains("Compiled on"));
    }

    #[test]
    fn markdown_inline_markup_converts() {
        let html = markdown_to_html("**bold** and *italic* and `code`").unwrap();
        assert!(html.contains("<strong>bold</strong>"));
        assert!(html.contains("<em>italic</em>"));
        assert!(html.contains("<code>code</code>"));
    }

    #[test]
    fn blank_lines_split_paragraphs() {
        let html = markdown_to_html("first paragraph\n\nsecond paragraph").unwrap();
        assert_eq!(html.matches("<p>").count(), 2);
    }

    #[test]
    fn html_in_source_text_is_escaped() {
        let html = markdown_to_html("<script>alert(1)</script>").unwrap();
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn document_html_numbers_sections_and_lists_toc() {
        let content = compiled(vec![section("Alpha", "body a", 0), section("Beta", "body b", 1)]);
        let html = build_document_html(&content, &ExportOptions::default()).unwrap();

        assert!(html.contains("<h2>1. Alpha</h2>"));
        assert!(html.contains("<h2>2. Beta</h2>"));
        assert!(html.contains("Table of Contents"));
        assert!(html.contains("<li>1. Alpha</li>"));
    }

    #[test]
    fn toc_is_omitted_without_sections() {
        let content = compiled(vec![]);
        let html = build_document_html(&content, &ExportOptions::default()).unwrap();
        assert!(!html.contains("Table of Contents"));
    }

    #[test]
    fn toc_can_be_disabled() {
        let content = compiled(vec![section("Alpha", "body", 0)]);
        let options = ExportOptions {
            include_toc: false,
            ..ExportOptions::default()
        };
        let html = build_document_html(&content, &options).unwrap();
        assert!(!html.contains("Table of Contents"));
    }

    #[test]
    fn templates_differ_only_in_presentation() {
        let content = compiled(vec![section("Alpha", "body", 0)]);
        let academic =
            build_document_html(&content, &ExportOptions::with_template(Template::Academic))
                .unwrap();
        let modern =
            build_document_html(&content, &ExportOptions::with_template(Template::Modern))
                .unwrap();

        assert!(academic.contains("Georgia"));
        assert!(modern.contains("Helvetica"));
        assert!(academic.contains("<h2>1. Alpha</h2>"));
        assert!(modern.contains("<h2>1. Alpha</h2>"));
    }

    #[test]
    fn filenames_keep_only_safe_characters() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 14).unwrap();
        assert_eq!(
            export_filename("My Notes: Final? (v2)", date, "pdf"),
            "My_Notes_Final_v2_2026-03-14.pdf"
        );
        assert_eq!(export_filename("???", date, "pdf"), "notebook_2026-03-14.pdf");
    }
}
