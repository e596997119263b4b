//! Run coordination: drive every category to its quota, merge, shuffle,
//! truncate.
//!
//! Each category generates into its own accumulator with its own RNG and
//! pool cursors; nothing is shared between category tasks except the record
//! API client. Tasks run concurrently up to a configured bound (each
//! resolution-driven category issues many sequential queries, so the bound
//! keeps the target API from being swamped). The merge is the single
//! synchronization point: it waits for every category, then shuffles the
//! combined list and trims overshoot. The run fails fast: the first error
//! from any category aborts the whole run.

use crate::error::PathGenError;
use crate::mix::{Category, Mix, QueryKind, Renderer};
use crate::pool::CandidatePool;
use crate::quota;
use crate::render::PathSynthesizer;
use crate::resolve::{Endpoint, IdentifierResolver, QueryFilter, RecordApi, RecordQuery};
use crate::seeds::SubjectHeading;
use crate::window::{sample_window, DateBounds};
use futures::{stream, StreamExt, TryStreamExt};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

/// Settings for one generation run.
#[derive(Debug, Clone)]
pub struct RunSettings {
    /// Requested total path count
    pub total: u64,
    /// RNG seed; runs with the same seed, mix, and API responses repeat
    pub seed: u64,
    /// Interval date windows are drawn from
    pub bounds: DateBounds,
    /// Page size for record API queries (and the `limit` rendered into
    /// windowed query paths)
    pub page_size: u32,
    /// Identifiers kept per resolution page
    pub sample_per_page: usize,
    /// Query attempts allowed per category before giving up
    pub max_attempts: u32,
    /// Category tasks allowed to run (and query) concurrently
    pub concurrency: usize,
}

/// Seed values loaded from the static seed files.
#[derive(Debug, Clone, Default)]
pub struct SeedData {
    /// Free-text search keywords
    pub keywords: Vec<String>,
    /// Subject-heading identifiers and labels
    pub subject_headings: Vec<SubjectHeading>,
}

/// Compute the integer quota for every category in a mix.
pub fn allocate_quotas(mix: &Mix, total: u64) -> Result<Vec<(String, u64)>, PathGenError> {
    mix.validate()?;
    mix.categories
        .iter()
        .map(|category| {
            let quota = quota::allocate(total, category.proportion, category.renderer.rounding())?;
            Ok((category.name.clone(), quota))
        })
        .collect()
}

struct CategoryJob {
    category: Category,
    quota: usize,
    rng: StdRng,
    keyword_pool: Option<CandidatePool<String>>,
    heading_pool: Option<CandidatePool<SubjectHeading>>,
}

/// Drives generation for a whole mix and owns the merged output until it is
/// handed back to the caller.
pub struct RunCoordinator<A: RecordApi> {
    api: A,
    settings: RunSettings,
}

impl<A: RecordApi> RunCoordinator<A> {
    /// Create a coordinator over a record API client.
    pub fn new(api: A, settings: RunSettings) -> Self {
        Self { api, settings }
    }

    /// Generate the full path corpus for `mix`.
    ///
    /// Returns `min(generated, total)` paths: quota rounding may overshoot
    /// (trimmed after the shuffle) or undershoot (left as-is). Pool-size
    /// prechecks run before any network call.
    pub async fn run(&self, mix: &Mix, seeds: &SeedData) -> Result<Vec<String>, PathGenError> {
        let quotas = allocate_quotas(mix, self.settings.total)?;

        tracing::info!(
            "Generating {} paths across {} categories:",
            self.settings.total,
            quotas.len()
        );
        for (name, quota) in &quotas {
            tracing::info!("  {}: {}", name, quota);
        }

        // Build every job (including pool prechecks) before the first query.
        let mut jobs = Vec::with_capacity(mix.categories.len());
        for (i, category) in mix.categories.iter().enumerate() {
            let quota = quotas[i].1 as usize;
            let sub_seed = self.category_seed(i);

            let keyword_pool = if category.renderer.uses_keywords() {
                Some(CandidatePool::with_min_distinct(
                    "search-keywords",
                    seeds.keywords.clone(),
                    quota,
                    sub_seed,
                )?)
            } else {
                None
            };
            let heading_pool = if category.renderer.uses_subject_headings() {
                Some(CandidatePool::with_min_distinct(
                    "subject-headings",
                    seeds.subject_headings.clone(),
                    quota,
                    sub_seed,
                )?)
            } else {
                None
            };

            jobs.push(CategoryJob {
                category: category.clone(),
                quota,
                rng: StdRng::seed_from_u64(sub_seed),
                keyword_pool,
                heading_pool,
            });
        }

        let outputs: Vec<(String, Vec<String>)> = stream::iter(jobs)
            .map(|job| self.generate_category(job))
            .buffer_unordered(self.settings.concurrency.max(1))
            .try_collect()
            .await?;

        let mut merged = Vec::new();
        let mut breakdown = Vec::new();
        for (name, paths) in outputs {
            breakdown.push(format!("{} {}", paths.len(), name));
            merged.extend(paths);
        }
        tracing::info!("Built {} paths with {}", merged.len(), breakdown.join(", "));

        let mut rng = StdRng::seed_from_u64(self.settings.seed);
        merged.shuffle(&mut rng);

        let total = self.settings.total as usize;
        if merged.len() > total {
            merged.truncate(total);
        }
        Ok(merged)
    }

    /// Derive a per-category sub-seed so categories stay independent while
    /// the whole run remains reproducible from one seed.
    fn category_seed(&self, index: usize) -> u64 {
        self.settings
            .seed
            .wrapping_add((index as u64 + 1).wrapping_mul(0x9E3779B97F4A7C15))
    }

    fn resolver(&self) -> IdentifierResolver<'_, A> {
        IdentifierResolver::new(
            &self.api,
            self.settings.bounds,
            self.settings.page_size,
            self.settings.sample_per_page,
            self.settings.max_attempts,
        )
    }

    async fn generate_category(
        &self,
        mut job: CategoryJob,
    ) -> Result<(String, Vec<String>), PathGenError> {
        let synth = PathSynthesizer;
        let mut paths = Vec::with_capacity(job.quota);

        match &job.category.renderer {
            Renderer::Search { surface } => {
                let pool = job.keyword_pool.as_mut().ok_or_else(|| {
                    PathGenError::Configuration(format!(
                        "category '{}' requires keyword seeds",
                        job.category.name
                    ))
                })?;
                for _ in 0..job.quota {
                    let keyword = pool.next_value();
                    paths.extend(synth.search_paths(*surface, &keyword));
                }
            }

            Renderer::Homepage => {
                for _ in 0..job.quota {
                    paths.push(synth.homepage_path());
                }
            }

            Renderer::SubjectHeadings => {
                let pool = job.heading_pool.as_mut().ok_or_else(|| {
                    PathGenError::Configuration(format!(
                        "category '{}' requires subject-heading seeds",
                        job.category.name
                    ))
                })?;
                for _ in 0..job.quota {
                    let heading = pool.next_value();
                    paths.extend(synth.subject_heading_paths(&heading.uuid, &heading.label));
                }
            }

            Renderer::RecordQuery {
                record_type,
                fields,
                query: QueryKind::Updated,
                ..
            } => {
                for _ in 0..job.quota {
                    let window = sample_window(&self.settings.bounds, &mut job.rng);
                    let query = RecordQuery {
                        endpoint: Endpoint::Sierra,
                        record_type: record_type.clone(),
                        filter: QueryFilter::UpdatedWithin(window),
                        offset: job.rng.random_range(0..=30),
                        limit: self.settings.page_size,
                        fields: Some(fields.clone()),
                        exclude_deleted: false,
                    };
                    paths.push(synth.query_path(&query));
                }
            }

            Renderer::RecordQuery {
                record_type,
                fields,
                query: QueryKind::Deleted,
                ..
            } => {
                for _ in 0..job.quota {
                    let window = sample_window(&self.settings.bounds, &mut job.rng);
                    let query = RecordQuery {
                        endpoint: Endpoint::Sierra,
                        record_type: record_type.clone(),
                        filter: QueryFilter::DeletedWithin(window),
                        offset: job.rng.random_range(0..=4),
                        limit: self.settings.page_size,
                        fields: Some(fields.clone()),
                        exclude_deleted: false,
                    };
                    paths.push(synth.query_path(&query));
                }
            }

            Renderer::RecordQuery {
                record_type,
                fields,
                query: QueryKind::Identity,
                ..
            } => {
                let spec = self.resolution_spec(&job.category)?;
                let ids = self
                    .resolver()
                    .resolve(&job.category.name, &spec, job.quota, &mut job.rng)
                    .await?;
                for id in ids {
                    let query = RecordQuery {
                        endpoint: Endpoint::Sierra,
                        record_type: record_type.clone(),
                        filter: QueryFilter::Id(id),
                        offset: 0,
                        limit: self.settings.page_size,
                        fields: Some(fields.clone()),
                        exclude_deleted: false,
                    };
                    paths.push(synth.query_path(&query));
                }
            }

            Renderer::RecordPage { surface } => {
                let spec = self.resolution_spec(&job.category)?;
                let ids = self
                    .resolver()
                    .resolve(&job.category.name, &spec, job.quota, &mut job.rng)
                    .await?;
                for id in ids {
                    paths.push(synth.record_page_path(*surface, &id));
                }
            }

            Renderer::Holds => {
                let spec = self.resolution_spec(&job.category)?;
                let patron_ids = self
                    .resolver()
                    .resolve(&job.category.name, &spec, job.quota, &mut job.rng)
                    .await?;
                for patron_id in patron_ids {
                    paths.push(synth.holds_path(&patron_id));
                }
            }
        }

        tracing::info!(
            "Built {} paths for category '{}'",
            paths.len(),
            job.category.name
        );
        Ok((job.category.name.clone(), paths))
    }

    fn resolution_spec(
        &self,
        category: &Category,
    ) -> Result<crate::resolve::ResolutionSpec, PathGenError> {
        category.renderer.resolution_spec().ok_or_else(|| {
            PathGenError::Configuration(format!(
                "category '{}' does not resolve identifiers",
                category.name
            ))
        })
    }
}
