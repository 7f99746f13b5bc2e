use crate::{Error, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;
use tracing::debug;

/// Chapter title line: `第<digits>章` followed by the rest of the line.
pub const DEFAULT_TITLE_PATTERN: &str = r"第\d+章.*\n";

static DEFAULT_TITLE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(DEFAULT_TITLE_PATTERN).expect("built-in title pattern compiles"));

/// What to do with non-blank text that precedes the first title line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LeadingFragment {
    /// Keep it as the first chapter
    #[default]
    Keep,
    /// Treat it as a malformed source
    Reject,
}

/// Split `text` at every title line matched by `title_pattern`.
///
/// Title lines are removed. Blank text before the first title is discarded; non-blank text
/// is kept as the first element. With no match at all the whole input is one element, and
/// blank input gives an empty sequence.
pub fn split_by_title(text: &str, title_pattern: Option<&Regex>) -> Vec<String> {
    let re = title_pattern.unwrap_or(&DEFAULT_TITLE_RE);
    let mut parts: Vec<String> = re.split(text).map(str::to_string).collect();
    if parts.first().map_or(false, |p| p.trim().is_empty()) {
        parts.remove(0);
    }
    parts
}

pub fn split_by_title_with(
    text: &str,
    title_pattern: Option<&Regex>,
    leading: LeadingFragment,
) -> Result<Vec<String>> {
    let re = title_pattern.unwrap_or(&DEFAULT_TITLE_RE);
    if leading == LeadingFragment::Reject {
        let leading_text = match re.find(text) {
            Some(m) => &text[..m.start()],
            None => text,
        };
        if !leading_text.trim().is_empty() {
            return Err(Error::MalformedSource {
                message: format!(
                    "text before the first title line does not match /{}/",
                    re.as_str()
                ),
            });
        }
    }
    Ok(split_by_title(text, Some(re)))
}

/// [`split_by_title_with`] using [`LeadingFragment::Reject`].
pub fn split_by_title_strict(text: &str, title_pattern: Option<&Regex>) -> Result<Vec<String>> {
    split_by_title_with(text, title_pattern, LeadingFragment::Reject)
}

/// Read a UTF-8 source file.
pub fn read_source(path: impl AsRef<Path>) -> Result<String> {
    let path = path.as_ref();
    std::fs::read_to_string(path).map_err(|e| Error::from_source_io(path, e))
}

pub fn read_chapters(
    path: impl AsRef<Path>,
    title_pattern: Option<&Regex>,
    leading: LeadingFragment,
) -> Result<Vec<String>> {
    let path = path.as_ref();
    let text = read_source(path)?;
    let chapters = split_by_title_with(&text, title_pattern, leading)?;
    debug!(path = %path.display(), chapters = chapters.len(), "split source into chapters");
    Ok(chapters)
}
