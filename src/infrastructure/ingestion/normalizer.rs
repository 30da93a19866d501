//! Text normalization ahead of chunking
//!
//! Removes the table of contents, strips recurring page furniture (page
//! numbers, initials blocks, date stamps) and collapses long blank runs.
//! Everything here is line-oriented and deterministic.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

static TOC_MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*(?:#{1,6}\s*)?(?:\*\*|__)?\s*(?:table\s+of\s+contents|contents|index)\s*:?\s*(?:\*\*|__)?\s*$")
        .unwrap()
});

static ARTICLE_ONE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*(?:#{1,6}\s*)?(?:\*\*)?\s*article\s+(?:1|i|one)\b").unwrap()
});

static ANY_ARTICLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*(?:#{1,6}\s*)?(?:\*\*)?\s*article\s+(?:\d+|[ivxlc]+|[a-z]+)\b").unwrap()
});

static TOC_ENTRY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:\.{3,}|…|\s\d{1,3}\s*$|\t\d{1,3}\s*$)").unwrap());

static PAGE_NUMBER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:page\s+\d{1,4}(?:\s+of\s+\d{1,4})?|\d{1,4}\s+of\s+\d{1,4}|-\s*\d{1,4}\s*-|page\s+\d{1,4}\s*/\s*\d{1,4})$")
        .unwrap()
});

/// A bare number; only page furniture when it stands alone between blank lines
static BARE_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{1,4}$").unwrap());

static INITIALS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:(?:landlord|tenant|indemnifier)(?:'s|s)?\s*)?initials?\s*:?[\s_]*$").unwrap()
});

static INITIALS_BLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:(?:landlord|tenant|indemnifier)(?:'s)?\s*(?:initials?)?\s*:?\s*_{2,}\s*)+$")
        .unwrap()
});

static DATE_ONLY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:\d{1,2}[/.-]\d{1,2}[/.-]\d{2,4}|\d{4}-\d{2}-\d{2}|(?:jan|feb|mar|apr|may|jun|jul|aug|sep|sept|oct|nov|dec)[a-z]*\.?\s+\d{1,2},?\s+\d{4}|\d{1,2}\s+(?:jan|feb|mar|apr|may|jun|jul|aug|sep|sept|oct|nov|dec)[a-z]*\.?,?\s+\d{4})$")
        .unwrap()
});

static DATE_STAMP: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:draft|revised|last\s+revised|printed|version|v\d+)\b.{0,60}\b(?:19|20)\d{2}\.?$")
        .unwrap()
});

/// Words a line needs to count as body text after an Article heading
const BODY_MIN_WORDS: usize = 6;

/// Non-blank lines inspected after a candidate Article-1 heading
const BODY_LOOKAHEAD_LINES: usize = 12;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizerConfig {
    /// Lines after a TOC marker searched for the first body heading
    pub toc_window_lines: usize,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            toc_window_lines: 400,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct TextNormalizer {
    config: NormalizerConfig,
}

impl TextNormalizer {
    pub fn new(config: NormalizerConfig) -> Self {
        Self { config }
    }

    pub fn normalize(&self, raw_text: &str) -> String {
        let without_toc = strip_table_of_contents(raw_text, self.config.toc_window_lines);
        let without_boilerplate = strip_boilerplate_lines(&without_toc);
        collapse_blank_lines(&without_boilerplate)
    }
}

/// Normalize with the default configuration
pub fn normalize(raw_text: &str) -> String {
    TextNormalizer::default().normalize(raw_text)
}

fn is_toc_entry(line: &str) -> bool {
    TOC_ENTRY.is_match(line)
}

fn is_body_line(line: &str) -> bool {
    let trimmed = line.trim();
    !trimmed.starts_with('#')
        && !is_toc_entry(trimmed)
        && trimmed.split_whitespace().count() >= BODY_MIN_WORDS
}

/// Whether the Article heading at `idx` is followed by real body text
/// before the next Article heading.
fn has_body_after(lines: &[&str], idx: usize) -> bool {
    lines[idx + 1..]
        .iter()
        .filter(|l| !l.trim().is_empty())
        .take(BODY_LOOKAHEAD_LINES)
        .take_while(|l| !ANY_ARTICLE.is_match(l))
        .any(|l| is_body_line(l))
}

/// Drop the region from a TOC marker up to the first Article-1 heading that
/// starts real body text. Unchanged when either end cannot be found.
pub fn strip_table_of_contents(text: &str, window_lines: usize) -> String {
    let lines: Vec<&str> = text.lines().collect();

    let Some(marker) = lines.iter().position(|l| TOC_MARKER.is_match(l)) else {
        return text.to_string();
    };

    let window_end = (marker + 1 + window_lines).min(lines.len());
    let body_start = (marker + 1..window_end).find(|&idx| {
        let line = lines[idx];
        ARTICLE_ONE.is_match(line) && !is_toc_entry(line) && has_body_after(&lines, idx)
    });

    match body_start {
        Some(start) => {
            debug!(
                toc_start = marker,
                toc_end = start,
                "Removed table of contents"
            );
            lines[..marker]
                .iter()
                .chain(lines[start..].iter())
                .copied()
                .collect::<Vec<_>>()
                .join("\n")
        }
        None => {
            debug!(toc_start = marker, "TOC marker without body heading in window");
            text.to_string()
        }
    }
}

/// Whether a line is page furniture rather than content
pub fn is_boilerplate_line(line: &str) -> bool {
    let trimmed = line.trim().trim_matches('*').trim();
    if trimmed.is_empty() {
        return false;
    }

    PAGE_NUMBER.is_match(trimmed)
        || INITIALS.is_match(trimmed)
        || INITIALS_BLOCK.is_match(trimmed)
        || DATE_ONLY.is_match(trimmed)
        || DATE_STAMP.is_match(trimmed)
}

fn is_blank_or_page_break(line: Option<&&str>) -> bool {
    line.is_none_or(|l| l.trim().is_empty() || l.contains('\x0c'))
}

/// A bare number with nothing but blank lines or page breaks around it.
/// Numbers inside tables or lists sit next to other content and are kept.
fn is_isolated_page_number(lines: &[&str], idx: usize) -> bool {
    let trimmed = lines[idx].trim().trim_matches(|c: char| c == '*' || c == '\x0c').trim();
    if !BARE_NUMBER.is_match(trimmed) {
        return false;
    }

    let previous = idx.checked_sub(1).and_then(|i| lines.get(i));
    is_blank_or_page_break(previous) && is_blank_or_page_break(lines.get(idx + 1))
}

pub fn strip_boilerplate_lines(text: &str) -> String {
    let lines: Vec<&str> = text.lines().collect();

    lines
        .iter()
        .enumerate()
        .filter(|&(idx, line)| !is_boilerplate_line(line) && !is_isolated_page_number(&lines, idx))
        .map(|(_, line)| *line)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Runs of three or more blank lines become exactly two blank lines.
/// Single and double blank lines are left as they are.
pub fn collapse_blank_lines(text: &str) -> String {
    let mut out: Vec<&str> = Vec::new();
    let mut blank_run = 0;

    for line in text.lines() {
        if line.trim().is_empty() {
            blank_run += 1;
            if blank_run <= 2 {
                out.push("");
            }
        } else {
            blank_run = 0;
            out.push(line);
        }
    }

    out.join("\n")
}
