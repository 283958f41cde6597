//! End-to-end checks of the Pipeline Orchestrator against the quantified
//! properties in spec.md §8. Crawl sources are restricted to
//! credential-gated adapters (reviews, maps_primary, maps_secondary,
//! signals_social) so that, with no API keys configured in this
//! environment, every adapter call fails immediately with
//! `CredentialsMissing` and no live network request is made. The resulting
//! empty crawl still drives the orchestrator into fallback mode, whose only
//! remaining network-optional step is a best-effort geocode that degrades
//! to a fixed coordinate on failure.

use okapiq::model::IntelligenceRequest;
use okapiq::{PipelineConfig, PipelineOrchestrator};

fn gated_request(location: &str, industry: Option<&str>) -> IntelligenceRequest {
    let mut request = IntelligenceRequest::new(location);
    request.industry = industry.map(|s| s.to_string());
    request.crawl_sources = Some(vec![
        "reviews".to_string(),
        "maps_primary".to_string(),
        "maps_secondary".to_string(),
        "signals_social".to_string(),
    ]);
    request
}

#[tokio::test]
async fn fallback_mode_produces_a_nonempty_well_formed_response() {
    let orchestrator = PipelineOrchestrator::new(PipelineConfig::default());
    let request = gated_request("Boston, MA", Some("hvac"));

    let response = orchestrator.process(request).await;

    // Scenario 1 + "non-empty fallback guarantee": a well-formed request
    // always returns at least one entity, even with every real source
    // unavailable.
    assert!(response.business_count >= 1);
    assert_eq!(response.businesses.len(), response.business_count);
    for scored in &response.businesses {
        assert!(okapiq::model::Category::all().contains(&scored.business.category));
    }

    // Scenario 2: all adapters failing (no credentials here) routes through
    // fallback mode, which clears provenance on every synthesized entity.
    assert!(response.businesses.iter().all(|s| s.business.data_sources.is_empty()));
    assert!(response.businesses.iter().all(|s| s.business.tags.contains("fallback_minimal")));
    assert!(response.data_sources_used.is_empty());
    assert!(!response.errors.is_empty());
}

#[tokio::test]
async fn max_businesses_cap_is_honored() {
    let orchestrator = PipelineOrchestrator::new(PipelineConfig::default());
    let mut request = gated_request("Austin, TX", Some("restaurant"));
    request.max_businesses = 2;

    let response = orchestrator.process(request).await;

    assert!(response.business_count <= 2);
}

#[tokio::test]
async fn repeated_request_within_ttl_is_a_deterministic_cache_hit() {
    let orchestrator = PipelineOrchestrator::new(PipelineConfig::default());
    let request = gated_request("Denver, CO", Some("plumbing"));

    let first = orchestrator.process(request.clone()).await;
    assert_eq!(first.cache_hit_rate, 0.0);

    let second = orchestrator.process(request).await;

    // Scenario 3: identical request within TTL hits the cache. Business
    // content and scores are identical; request id and timestamp are fresh.
    assert_eq!(second.cache_hit_rate, 1.0);
    assert_eq!(second.business_count, first.business_count);
    assert_eq!(
        second.businesses.iter().map(|s| s.business.business_id.clone()).collect::<Vec<_>>(),
        first.businesses.iter().map(|s| s.business.business_id.clone()).collect::<Vec<_>>(),
    );
    assert_ne!(second.request_id, first.request_id);
}

#[tokio::test]
async fn disabling_cache_bypasses_reuse() {
    let orchestrator = PipelineOrchestrator::new(PipelineConfig::default());
    let mut request = gated_request("Miami, FL", Some("landscaping"));
    request.use_cache = false;

    let first = orchestrator.process(request.clone()).await;
    let second = orchestrator.process(request).await;

    assert_eq!(first.cache_hit_rate, 0.0);
    assert_eq!(second.cache_hit_rate, 0.0);
}
