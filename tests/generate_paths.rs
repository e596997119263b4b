//! End-to-end generation runs against an in-memory record API.

use async_trait::async_trait;
use catalog_pathgen::resolve::{Endpoint, RecordApi, RecordPage, RecordQuery};
use catalog_pathgen::seeds::SubjectHeading;
use catalog_pathgen::{
    allocate_quotas, Category, DateBounds, Mix, PathGenError, Profile, Renderer, RunCoordinator,
    RunSettings, SeedData, Surface,
};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Serves synthetic pages and counts how often it is queried.
struct StubApi {
    entries_per_page: usize,
    calls: Arc<AtomicUsize>,
}

impl StubApi {
    fn new(entries_per_page: usize) -> (Self, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        (
            Self {
                entries_per_page,
                calls: calls.clone(),
            },
            calls,
        )
    }
}

#[async_trait]
impl RecordApi for StubApi {
    async fn fetch_page(&self, query: &RecordQuery) -> Result<RecordPage, PathGenError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        let entries = (0..self.entries_per_page)
            .map(|i| match query.endpoint {
                Endpoint::Discovery => json!({"result": {"@id": format!("res:b{call:04}{i:04}")}}),
                Endpoint::Sierra => json!({"id": call * 10_000 + i}),
            })
            .collect();
        Ok(RecordPage { entries })
    }
}

fn settings(total: u64, concurrency: usize) -> RunSettings {
    RunSettings {
        total,
        seed: 42,
        bounds: DateBounds::parse("2021-01-01T00:00:00-04:00", "2021-12-31T23:59:59-04:00")
            .unwrap(),
        page_size: 200,
        sample_per_page: 10,
        max_attempts: 100,
        concurrency,
    }
}

fn seed_data() -> SeedData {
    SeedData {
        keywords: (0..100).map(|i| format!("keyword {i}")).collect(),
        subject_headings: (0..20)
            .map(|i| SubjectHeading {
                uuid: format!("uuid-{i:04}"),
                label: format!("Heading {i}"),
            })
            .collect(),
    }
}

#[tokio::test]
async fn test_sierra_profile_hits_exact_total() {
    let (api, calls) = StubApi::new(50);
    let coordinator = RunCoordinator::new(api, settings(100, 4));

    let paths = coordinator
        .run(&Profile::Sierra.mix(), &SeedData::default())
        .await
        .unwrap();

    // Quotas sum to exactly 100 for this profile, so nothing is trimmed.
    assert_eq!(paths.len(), 100);
    assert!(paths.iter().all(|p| p.starts_with('/')));

    let updated = paths.iter().filter(|p| p.contains("updatedDate=")).count();
    let deleted = paths.iter().filter(|p| p.contains("deletedDate=")).count();
    let identity = paths.iter().filter(|p| p.contains("?id=")).count();
    let holds = paths.iter().filter(|p| p.contains("/holds?")).count();
    assert_eq!(updated, 42); // 18 + 18 + 6
    assert_eq!(deleted, 7); // 3 + 3 + 1
    assert_eq!(identity, 41); // 9 + 9 + 3 + 20
    assert_eq!(holds, 10);

    assert!(calls.load(Ordering::SeqCst) > 0);
}

#[tokio::test]
async fn test_discovery_profile_truncates_overshoot() {
    let (api, _calls) = StubApi::new(50);
    let coordinator = RunCoordinator::new(api, settings(100, 4));

    let paths = coordinator
        .run(&Profile::DiscoveryApi.mix(), &seed_data())
        .await
        .unwrap();

    // 61 searches render two paths each plus 39 lookups: 161 generated,
    // trimmed back to the requested total.
    let quotas: std::collections::HashMap<_, _> =
        allocate_quotas(&Profile::DiscoveryApi.mix(), 100)
            .unwrap()
            .into_iter()
            .collect();
    assert_eq!(quotas["search"], 61);
    assert_eq!(quotas["bib"], 39);
    assert_eq!(paths.len(), 100);
}

#[tokio::test]
async fn test_research_catalog_profile_undershoots() {
    let (api, _calls) = StubApi::new(50);
    let coordinator = RunCoordinator::new(api, settings(200, 4));

    let paths = coordinator
        .run(&Profile::ResearchCatalog.mix(), &seed_data())
        .await
        .unwrap();

    // search 72 + bib 46 + homepage 26 + headings 2x3 = 150; the mix sums
    // below 1 and the output is not padded.
    assert_eq!(paths.len(), 150);

    let homepage = paths
        .iter()
        .filter(|p| p.as_str() == "/research/collections/shared-collection-catalog/")
        .count();
    assert_eq!(homepage, 26);

    let bibs = paths.iter().filter(|p| p.contains("/bib/b")).count();
    assert_eq!(bibs, 46);
}

#[tokio::test]
async fn test_insufficient_keywords_fail_before_any_query() {
    let (api, calls) = StubApi::new(50);
    let coordinator = RunCoordinator::new(api, settings(100, 4));

    let seeds = SeedData {
        keywords: vec!["jazz age".to_string(), "suffrage".to_string()],
        subject_headings: Vec::new(),
    };
    let err = coordinator
        .run(&Profile::DiscoveryApi.mix(), &seeds)
        .await
        .unwrap_err();

    match err {
        PathGenError::InsufficientSeedData {
            available, needed, ..
        } => {
            assert_eq!(available, 2);
            assert_eq!(needed, 61);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(calls.load(Ordering::SeqCst), 0, "no network call expected");
}

#[tokio::test]
async fn test_empty_pages_bound_the_run() {
    let (api, _calls) = StubApi::new(0);
    let mut settings = settings(100, 1);
    settings.max_attempts = 3;
    let coordinator = RunCoordinator::new(api, settings);

    let err = coordinator
        .run(&Profile::Sierra.mix(), &SeedData::default())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        PathGenError::ExternalQueryExhausted { attempts: 3, .. }
    ));
}

#[tokio::test]
async fn test_pool_only_mix_never_queries() {
    let mix = Mix {
        categories: vec![
            Category {
                name: "search".to_string(),
                proportion: 0.5,
                renderer: Renderer::Search {
                    surface: Surface::Catalog,
                },
            },
            Category {
                name: "homepage".to_string(),
                proportion: 0.5,
                renderer: Renderer::Homepage,
            },
        ],
    };
    assert!(!mix.needs_record_api_auth());

    let (api, calls) = StubApi::new(50);
    let coordinator = RunCoordinator::new(api, settings(100, 4));

    let paths = coordinator.run(&mix, &seed_data()).await.unwrap();
    assert_eq!(paths.len(), 100);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_same_seed_reproduces_run() {
    // Sequential categories keep the stub's call counter deterministic.
    let (api_a, _) = StubApi::new(50);
    let (api_b, _) = StubApi::new(50);

    let first = RunCoordinator::new(api_a, settings(100, 1))
        .run(&Profile::Sierra.mix(), &SeedData::default())
        .await
        .unwrap();
    let second = RunCoordinator::new(api_b, settings(100, 1))
        .run(&Profile::Sierra.mix(), &SeedData::default())
        .await
        .unwrap();

    assert_eq!(first, second);
}
