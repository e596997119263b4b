//! Seed data loading: keyword CSVs and subject-heading navigation URLs.

use anyhow::{Context, Result};
use std::path::Path;
use url::form_urlencoded;

/// Searches that consistently hit pathological many-item records upstream;
/// skipped until the underlying bib bug is fixed.
const EXCLUDED_KEYWORDS: &[&str] = &[
    "new york times",
    "new yorker",
    "new york daily news",
    "san francisco chronicle",
    "Times-Picayune",
    "Times Picayune",
];

/// A subject-heading seed: identifier plus human-readable label, both
/// recovered from a precomputed navigation URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubjectHeading {
    /// Opaque heading identifier
    pub uuid: String,
    /// Display label (percent-decoded)
    pub label: String,
}

/// Load search keywords from the first column of a headerless CSV.
pub fn load_keywords(path: &Path) -> Result<Vec<String>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("failed to open keyword file {path:?}"))?;

    let mut keywords = Vec::new();
    for record in reader.records() {
        let record = record.with_context(|| format!("failed to read keyword file {path:?}"))?;
        let Some(keyword) = record.get(0).map(str::trim) else {
            continue;
        };
        if keyword.is_empty() || EXCLUDED_KEYWORDS.contains(&keyword) {
            continue;
        }
        keywords.push(keyword.to_string());
    }

    tracing::debug!("Loaded {} keywords from {:?}", keywords.len(), path);
    Ok(keywords)
}

/// Load subject headings from a headerless CSV of navigation URLs
/// (`.../subject_headings/{uuid}?label={label}`). Rows that do not match
/// that shape are skipped with a warning.
pub fn load_subject_headings(path: &Path) -> Result<Vec<SubjectHeading>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("failed to open subject-heading file {path:?}"))?;

    let mut headings = Vec::new();
    for record in reader.records() {
        let record =
            record.with_context(|| format!("failed to read subject-heading file {path:?}"))?;
        let Some(url) = record.get(0).map(str::trim) else {
            continue;
        };
        if url.is_empty() {
            continue;
        }
        match parse_heading_url(url) {
            Some(heading) => headings.push(heading),
            None => tracing::warn!("Skipping unparseable subject-heading URL: {}", url),
        }
    }

    tracing::debug!("Loaded {} subject headings from {:?}", headings.len(), path);
    Ok(headings)
}

/// Extract the identifier and percent-decoded label from a navigation URL.
pub fn parse_heading_url(url: &str) -> Option<SubjectHeading> {
    let rest = url.split_once("subject_headings/")?.1;
    let (uuid, query) = rest.split_once('?')?;
    if uuid.is_empty() {
        return None;
    }

    let label = form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == "label")
        .map(|(_, value)| value.into_owned())?;

    Some(SubjectHeading {
        uuid: uuid.to_string(),
        label,
    })
}
