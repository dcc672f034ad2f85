use regex::Regex;

/// Canonicalizes line endings and whitespace ahead of structure inference:
/// `\r\n` and `\r` become `\n`, runs of three or more newlines collapse to
/// exactly two, runs of spaces and tabs collapse to a single space, and the
/// result is trimmed.
pub fn normalize_text(raw: &str) -> Result<String, regex::Error> {
    let unified = raw.replace("\r\n", "\n").replace('\r', "\n");

    let newline_runs = Regex::new(r"\n{3,}")?;
    let collapsed = newline_runs.replace_all(&unified, "\n\n");

    let space_runs = Regex::new(r"[ \t]+")?;
    let spaced = space_runs.replace_all(&collapsed, " ");

    Ok(spaced.trim().to_string())
}

/// Word count over normalized text: non-empty whitespace-delimited tokens.
pub fn count_words(normalized: &str) -> usize {
    normalized.split_whitespace().count()
}
