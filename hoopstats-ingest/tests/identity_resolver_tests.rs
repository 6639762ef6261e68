//! Identity Resolver Integration Tests
//!
//! Name search over the player listing, and the name → record pipeline.

mod helpers;

use helpers::{listing_json, FakeDocumentSource, OfflineSource};
use hoopstats_ingest::error::{PipelineError, ResolveError, SourceError};
use hoopstats_ingest::identity_resolver::IdentityResolver;
use hoopstats_ingest::record_cache::RecordCache;
use hoopstats_ingest::record_fetcher::{CachePolicy, RecordFetcher};
use hoopstats_ingest::types::{Disambiguation, SourceKind};
use hoopstats_ingest::Ingest;
use serde_json::json;
use std::sync::Arc;

fn listing_source() -> Arc<FakeDocumentSource> {
    Arc::new(FakeDocumentSource::new().with_json("commonallplayers", listing_json()))
}

#[tokio::test]
async fn test_james_yields_two_candidates_in_listing_order() {
    let resolver = IdentityResolver::new(listing_source(), "2024-25");

    let identity = resolver.resolve("James").await.unwrap();

    let names: Vec<&str> = identity
        .candidates()
        .iter()
        .map(|c| c.display_name.as_str())
        .collect();
    assert_eq!(names, vec!["LeBron James", "James Harden"]);
    assert_eq!(identity.candidates()[0].identifier, "2544");
    assert_eq!(identity.candidates()[0].team.as_deref(), Some("LAL"));

    // Neither is picked without a policy
    assert!(matches!(
        identity.select(Disambiguation::RequireUnique),
        Err(ResolveError::AmbiguousCandidates { count: 2, .. })
    ));
}

#[tokio::test]
async fn test_match_is_case_insensitive() {
    let resolver = IdentityResolver::new(listing_source(), "2024-25");
    let identity = resolver.resolve("  kevin DUR ").await.unwrap();

    assert_eq!(identity.candidates().len(), 1);
    assert_eq!(identity.candidates()[0].identifier, "201142");
}

#[tokio::test]
async fn test_empty_query_returns_nothing_without_fetching() {
    let source = listing_source();
    let resolver = IdentityResolver::new(source.clone(), "2024-25");

    let identity = resolver.resolve("").await.unwrap();
    let blank = resolver.resolve("   ").await.unwrap();

    assert!(identity.is_empty());
    assert!(blank.is_empty());
    assert_eq!(source.call_count(), 0);
}

#[tokio::test]
async fn test_no_match_is_empty_not_error() {
    let resolver = IdentityResolver::new(listing_source(), "2024-25");
    let identity = resolver.resolve("Wembanyama").await.unwrap();
    assert!(identity.is_empty());
}

#[tokio::test]
async fn test_fetch_failure_distinct_from_zero_matches() {
    let failing = Arc::new(
        FakeDocumentSource::new().with_failure("commonallplayers", SourceError::BadStatus(503)),
    );
    let resolver = IdentityResolver::new(failing, "2024-25");

    let result = resolver.resolve("James").await;
    assert_eq!(result.unwrap_err(), SourceError::BadStatus(503));

    let offline = IdentityResolver::new(Arc::new(OfflineSource), "2024-25");
    assert!(matches!(
        offline.resolve("James").await,
        Err(SourceError::Network(_))
    ));
}

#[tokio::test]
async fn test_listing_without_result_sets_is_malformed() {
    let source = Arc::new(
        FakeDocumentSource::new().with_json("commonallplayers", json!({"message": "blocked"})),
    );
    let resolver = IdentityResolver::new(source, "2024-25");

    assert!(matches!(
        resolver.resolve("James").await,
        Err(SourceError::MalformedBody(_))
    ));
}

#[tokio::test]
async fn test_listing_request_parameters() {
    let source = listing_source();
    let resolver = IdentityResolver::new(source.clone(), "2023-24");

    resolver.resolve("Curry").await.unwrap();

    let calls = source.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].path, "commonallplayers");
    assert!(calls[0]
        .params
        .contains(&("Season".to_string(), "2023-24".to_string())));
    assert!(calls[0]
        .params
        .contains(&("IsOnlyCurrentSeason".to_string(), "1".to_string())));
}

// ============================================================================
// Name → record
// ============================================================================

fn offline_pipeline() -> Ingest {
    let source = listing_source();
    Ingest::with_parts(
        IdentityResolver::new(source.clone(), "2024-25"),
        RecordFetcher::with_default_tiers(source, Arc::new(RecordCache::in_memory()), false),
    )
}

#[tokio::test]
async fn test_unique_name_fetches_record() {
    let ingest = offline_pipeline();

    let record = ingest
        .fetch_by_name("Durant", Disambiguation::RequireUnique, CachePolicy::UseCache)
        .await
        .unwrap();

    assert_eq!(record.identifier(), "201142");
    assert_eq!(record.number("points_per_game"), Some(27.3));
    assert_eq!(record.source_of("points_per_game"), Some(SourceKind::FallbackTable));
}

#[tokio::test]
async fn test_ambiguous_name_requires_choice() {
    let ingest = offline_pipeline();

    let result = ingest
        .fetch_by_name("James", Disambiguation::RequireUnique, CachePolicy::UseCache)
        .await;
    assert!(matches!(
        result,
        Err(PipelineError::Resolve(ResolveError::AmbiguousCandidates { .. }))
    ));

    let second = ingest
        .fetch_by_name("James", Disambiguation::Index(2), CachePolicy::UseCache)
        .await
        .unwrap();
    assert_eq!(second.identifier(), "201935");
    assert_eq!(second.display_name(), Some("James Harden"));
}

#[tokio::test]
async fn test_unknown_name_reports_no_candidates() {
    let ingest = offline_pipeline();

    let result = ingest
        .fetch_by_name("Nobody", Disambiguation::FirstMatch, CachePolicy::UseCache)
        .await;
    assert!(matches!(
        result,
        Err(PipelineError::Resolve(ResolveError::NoCandidates(_)))
    ));
}
