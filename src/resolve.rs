//! Identifier resolution against the external record API.
//!
//! Resolution turns a category quota into concrete record identifiers: draw
//! a random date window, query the API for records updated in that window,
//! sample a handful of identifiers from the returned page, repeat until the
//! quota is covered. The loop is bounded so a source that keeps returning
//! empty pages surfaces an error instead of spinning.

use crate::error::PathGenError;
use crate::window::{sample_window, DateBounds, DateWindow};
use async_trait::async_trait;
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Which endpoint family a query targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Endpoint {
    /// Bearer-authenticated record API (`/iii/sierra-api/v6/...`)
    Sierra,
    /// Unauthenticated discovery API (`/api/v0.1/discovery/...`)
    Discovery,
}

/// Filter applied to one record API query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryFilter {
    /// Records updated within the window
    UpdatedWithin(DateWindow),
    /// Records deleted within the window (rendered at day granularity)
    DeletedWithin(DateWindow),
    /// Direct lookup of one identifier
    Id(String),
}

/// One record API query, ready to be rendered as a URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordQuery {
    /// Endpoint family
    pub endpoint: Endpoint,
    /// Record type path segment (`bibs`, `items`, `patrons`, ...)
    pub record_type: String,
    /// Query filter
    pub filter: QueryFilter,
    /// Page offset
    pub offset: u32,
    /// Page size
    pub limit: u32,
    /// `fields` selector, omitted when `None`
    pub fields: Option<String>,
    /// Add `deleted=false`
    pub exclude_deleted: bool,
}

/// How record identifiers appear in API response entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IdShape {
    /// Top-level `id` field (string or number)
    Plain,
    /// URI-style `@id` field carrying a strippable prefix
    PrefixedUri {
        /// Prefix to strip, e.g. `res:`
        prefix: String,
    },
}

/// What a renderer needs resolved: where to query and how to read ids back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionSpec {
    /// Endpoint family to query
    pub endpoint: Endpoint,
    /// Record type to query
    pub record_type: String,
    /// Identifier shape in response entries
    pub shape: IdShape,
    /// Restrict resolution queries to non-deleted records
    pub exclude_deleted: bool,
}

/// One page of record API results.
#[derive(Debug, Clone, Default)]
pub struct RecordPage {
    /// Raw response entries
    pub entries: Vec<Value>,
}

impl RecordPage {
    /// Read the entry list out of a response body.
    ///
    /// The record API uses `entries`, the discovery API `itemListElement`.
    /// A body with neither is treated as an empty page; the bounded
    /// resolution loop keeps such responses from hanging a run.
    pub fn from_json(body: &Value) -> Self {
        let entries = body
            .get("entries")
            .or_else(|| body.get("itemListElement"))
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        Self { entries }
    }

    /// Extract identifiers from every entry that carries one.
    pub fn extract_ids(&self, shape: &IdShape) -> Vec<String> {
        self.entries
            .iter()
            .filter_map(|entry| extract_id(entry, shape))
            .collect()
    }
}

fn extract_id(entry: &Value, shape: &IdShape) -> Option<String> {
    match shape {
        IdShape::Plain => match entry.get("id")? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        },
        IdShape::PrefixedUri { prefix } => {
            let uri = entry
                .pointer("/result/@id")
                .or_else(|| entry.get("@id"))?
                .as_str()?;
            Some(uri.strip_prefix(prefix.as_str()).unwrap_or(uri).to_string())
        }
    }
}

/// Record API seam. The HTTP client implements this; tests substitute
/// in-memory fakes.
#[async_trait]
pub trait RecordApi: Send + Sync {
    /// Issue one query and return the resulting page.
    async fn fetch_page(&self, query: &RecordQuery) -> Result<RecordPage, PathGenError>;
}

/// Resolves category quotas into concrete record identifiers.
pub struct IdentifierResolver<'a, A: RecordApi> {
    api: &'a A,
    bounds: DateBounds,
    page_size: u32,
    sample_per_page: usize,
    max_attempts: u32,
}

impl<'a, A: RecordApi> IdentifierResolver<'a, A> {
    /// Create a resolver.
    ///
    /// `sample_per_page` caps how many identifiers are kept from one page
    /// (sampled without replacement); `max_attempts` bounds the number of
    /// queries issued for one category.
    pub fn new(
        api: &'a A,
        bounds: DateBounds,
        page_size: u32,
        sample_per_page: usize,
        max_attempts: u32,
    ) -> Self {
        Self {
            api,
            bounds,
            page_size,
            sample_per_page,
            max_attempts,
        }
    }

    /// Accumulate at least `needed` identifiers, then trim to exactly
    /// `needed`.
    ///
    /// Empty pages are soft: they are logged and the loop moves on to a
    /// fresh window. API errors abort immediately. Hitting the attempt cap
    /// short of quota fails with
    /// [`PathGenError::ExternalQueryExhausted`].
    pub async fn resolve<R: Rng + Send>(
        &self,
        category: &str,
        spec: &ResolutionSpec,
        needed: usize,
        rng: &mut R,
    ) -> Result<Vec<String>, PathGenError> {
        let mut ids: Vec<String> = Vec::with_capacity(needed);
        let mut attempts = 0u32;

        while ids.len() < needed {
            if attempts >= self.max_attempts {
                return Err(PathGenError::ExternalQueryExhausted {
                    category: category.to_string(),
                    attempts,
                    collected: ids.len(),
                    needed,
                });
            }
            attempts += 1;

            let window = sample_window(&self.bounds, rng);
            let query = RecordQuery {
                endpoint: spec.endpoint,
                record_type: spec.record_type.clone(),
                filter: QueryFilter::UpdatedWithin(window),
                offset: 0,
                limit: self.page_size,
                fields: None,
                exclude_deleted: spec.exclude_deleted,
            };

            let page = self.api.fetch_page(&query).await?;
            let candidates = page.extract_ids(&spec.shape);
            if candidates.is_empty() {
                tracing::debug!(
                    "Empty page for '{}' (attempt {}/{})",
                    category,
                    attempts,
                    self.max_attempts
                );
                continue;
            }

            let keep = candidates.len().min(self.sample_per_page);
            let sampled = rand::seq::index::sample(rng, candidates.len(), keep);
            ids.extend(sampled.into_iter().map(|i| candidates[i].clone()));
        }

        ids.truncate(needed);
        Ok(ids)
    }
}
