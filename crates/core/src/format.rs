use crate::models::{AnnotationKind, FormatStyle};

/// Applies a formatting style to a knowledge-element body, keyed by the
/// element's subtype. Pure function: same inputs, same output.
///
/// `minimal` only trims (and is therefore idempotent); unknown subtypes
/// pass through unchanged in every style except `structured`, which still
/// applies its generic header.
pub fn apply_style(body: &str, subtype: Option<&str>, style: FormatStyle) -> String {
    let trimmed = body.trim();
    match style {
        FormatStyle::Minimal => trimmed.to_string(),
        FormatStyle::Academic => academic(trimmed, subtype),
        FormatStyle::Casual => casual(trimmed, subtype),
        FormatStyle::Structured => structured(trimmed, subtype),
    }
}

fn academic(body: &str, subtype: Option<&str>) -> String {
    match subtype {
        Some("definition") => format!("**Definition:** {body}"),
        Some("formula") => format!("$$\n{body}\n$$"),
        Some("theorem") => format!("**Theorem:** {body}"),
        Some("example") => format!("*Example:* {body}"),
        Some("summary") => format!("**Summary.** {body}"),
        _ => body.to_string(),
    }
}

fn casual(body: &str, subtype: Option<&str>) -> String {
    let emoji = match subtype {
        Some("definition") => "📖",
        Some("formula") => "🧮",
        Some("example") => "💡",
        Some("summary") => "📝",
        Some("concept") => "🧠",
        _ => "✨",
    };
    format!("{emoji} {body}")
}

fn structured(body: &str, subtype: Option<&str>) -> String {
    let header = subtype
        .map(capitalize)
        .filter(|header| !header.is_empty())
        .unwrap_or_else(|| "Content".to_string());
    format!("### {header}\n\n{body}")
}

/// Styles an annotation body by kind. Highlights render as a blockquote in
/// the academic style and a bold prefix elsewhere; `minimal` trims only.
pub fn format_annotation(content: &str, kind: AnnotationKind, style: FormatStyle) -> String {
    let trimmed = content.trim();
    match (kind, style) {
        (_, FormatStyle::Minimal) => trimmed.to_string(),
        (AnnotationKind::Highlight, FormatStyle::Academic) => format!("> {trimmed}"),
        (AnnotationKind::Highlight, _) => format!("**Highlight:** {trimmed}"),
        (AnnotationKind::Note, FormatStyle::Casual) => format!("💬 {trimmed}"),
        (AnnotationKind::Note, _) => trimmed.to_string(),
        (AnnotationKind::Bookmark, _) => format!("*Bookmarked:* {trimmed}"),
    }
}

pub(crate) fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_trims_and_is_idempotent() {
        let once = apply_style("  body text  ", Some("definition"), FormatStyle::Minimal);
        let twice = apply_style(&once, Some("definition"), FormatStyle::Minimal);
        assert_eq!(once, "body text");
        assert_eq!(once, twice);
    }

    #[test]
    fn academic_definition_is_bold_labeled() {
        let formatted = apply_style("a closed set", Some("definition"), FormatStyle::Academic);
        assert_eq!(formatted, "**Definition:** a closed set");
    }

    #[test]
    fn academic_formula_is_display_math() {
        let formatted = apply_style("e = mc^2", Some("formula"), FormatStyle::Academic);
        assert_eq!(formatted, "$$\ne = mc^2\n$$");
    }

    #[test]
    fn academic_unknown_subtype_passes_through() {
        let formatted = apply_style("plain body", Some("anecdote"), FormatStyle::Academic);
        assert_eq!(formatted, "plain body");
    }

    #[test]
    fn casual_unknown_subtype_gets_generic_emoji() {
        let formatted = apply_style("plain body", Some("anecdote"), FormatStyle::Casual);
        assert_eq!(formatted, "✨ plain body");
    }

    #[test]
    fn structured_applies_capitalized_header() {
        let formatted = apply_style("body", Some("definition"), FormatStyle::Structured);
        assert_eq!(formatted, "### Definition\n\nbody");
    }

    #[test]
    fn structured_without_subtype_uses_generic_header() {
        let formatted = apply_style("body", None, FormatStyle::Structured);
        assert_eq!(formatted, "### Content\n\nbody");
    }

    #[test]
    fn academic_highlight_is_blockquote() {
        let formatted =
            format_annotation("key passage", AnnotationKind::Highlight, FormatStyle::Academic);
        assert_eq!(formatted, "> key passage");
    }

    #[test]
    fn non_academic_highlight_is_bold_prefixed() {
        let formatted =
            format_annotation("key passage", AnnotationKind::Highlight, FormatStyle::Structured);
        assert_eq!(formatted, "**Highlight:** key passage");
    }

    #[test]
    fn minimal_annotation_only_trims() {
        let formatted =
            format_annotation("  note text  ", AnnotationKind::Note, FormatStyle::Minimal);
        assert_eq!(formatted, "note text");
    }
}
