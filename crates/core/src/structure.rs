use crate::error::IngestError;
use crate::models::{Section, StructuredText, TextMetadata, TextSource};
use crate::normalize::{count_words, normalize_text};
use regex::Regex;

const MAX_HEADING_CHARS: usize = 100;
const MAX_TITLE_CHARS: usize = 100;

/// Heading detection over normalized lines: an ordered set of independent
/// predicates combined with OR, behind a shared length cap. Custom pattern
/// sets can be supplied through [`HeadingRules::with_patterns`].
pub struct HeadingRules {
    patterns: Vec<Regex>,
    max_chars: usize,
}

impl HeadingRules {
    pub fn standard() -> Result<Self, regex::Error> {
        let patterns = vec![
            // capitalized line with no terminal sentence punctuation
            Regex::new(r"^[A-Z][^.!?]*$")?,
            // leading arabic number, e.g. "3. Results" or "3 Results"
            Regex::new(r"^\d+\.?\s")?,
            // leading roman numeral, e.g. "IV. Discussion"
            Regex::new(r"^[IVX]+\.?\s")?,
            // capitalized word followed by a colon, e.g. "Title: ..."
            Regex::new(r"^[A-Z][a-z]*:")?,
        ];

        Ok(Self {
            patterns,
            max_chars: MAX_HEADING_CHARS,
        })
    }

    pub fn with_patterns(patterns: Vec<Regex>, max_chars: usize) -> Self {
        Self { patterns, max_chars }
    }

    pub fn is_heading(&self, line: &str) -> bool {
        if line.chars().count() >= self.max_chars {
            return false;
        }

        self.patterns.iter().any(|pattern| pattern.is_match(line)) || equals_own_uppercase(line)
    }
}

fn equals_own_uppercase(line: &str) -> bool {
    line == line.to_uppercase()
}

/// Single pass over the normalized lines, segmenting on detected headings.
/// Lines before the first detected heading are discarded, not attached to
/// any section; documents with no heading at all fall through to the
/// single-"Content"-section path in [`standardize_text`].
pub fn infer_structure(rules: &HeadingRules, normalized: &str) -> Vec<Section> {
    let mut sections = Vec::new();
    let mut current: Option<(String, Vec<&str>)> = None;

    for raw_line in normalized.lines() {
        let line = raw_line.trim();
        if line.is_empty() {
            continue;
        }

        if rules.is_heading(line) {
            if let Some((heading, body)) = current.take() {
                sections.push(close_section(heading, &body));
            }
            current = Some((line.to_string(), Vec::new()));
        } else if let Some((_, body)) = current.as_mut() {
            // accumulate verbatim; the close joins and trims once
            body.push(raw_line);
        }
    }

    if let Some((heading, body)) = current.take() {
        sections.push(close_section(heading, &body));
    }

    sections
}

fn close_section(heading: String, body: &[&str]) -> Section {
    Section {
        heading,
        content: body.join("\n").trim().to_string(),
        subsections: Vec::new(),
    }
}

/// Title inference: first non-empty line, truncated to 100 characters with
/// a trailing `...` when longer.
pub fn extract_title(normalized: &str) -> String {
    let first_line = normalized
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or("Untitled Document");

    let chars: Vec<char> = first_line.chars().collect();
    if chars.len() <= MAX_TITLE_CHARS {
        return first_line.to_string();
    }

    let mut title: String = chars[..MAX_TITLE_CHARS - 3].iter().collect();
    title.push_str("...");
    title
}

/// Normalizes raw extracted text, infers sections and a title, and wraps
/// the result with metadata. Guarantees at least one section: when no
/// heading matched, the entire normalized text lands in a single section
/// titled "Content".
pub fn standardize_text(
    raw: &str,
    source: TextSource,
    page_count: Option<usize>,
    slide_count: Option<usize>,
    source_checksum: String,
) -> Result<StructuredText, IngestError> {
    let normalized = normalize_text(raw)?;
    let rules = HeadingRules::standard()?;

    let mut sections = infer_structure(&rules, &normalized);
    if sections.is_empty() {
        sections.push(Section {
            heading: "Content".to_string(),
            content: normalized.clone(),
            subsections: Vec::new(),
        });
    }

    Ok(StructuredText {
        title: extract_title(&normalized),
        sections,
        metadata: TextMetadata {
            word_count: count_words(&normalized),
            language: "en".to_string(),
            page_count,
            slide_count,
            source,
            source_checksum,
        },
    })
}
