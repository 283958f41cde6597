//! Whole-response cache (spec §4.7): a deterministic key from the request
//! shape, guarded by a `parking_lot::RwLock` over a bounded map with a lazy
//! TTL sweep.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use parking_lot::RwLock;

use crate::model::{IntelligenceRequest, IntelligenceResponse};

struct CacheEntry {
    response: IntelligenceResponse,
    inserted_at: Instant,
    sequence: u64,
}

/// Deterministic cache key (spec §6.3): all components lowercased, spaces
/// replaced with underscores, list-valued components sorted first.
pub fn cache_key(request: &IntelligenceRequest) -> String {
    let location = request.location.to_lowercase().replace(' ', "_");
    let industry = request
        .industry
        .as_deref()
        .map(|i| i.to_lowercase().replace(' ', "_"))
        .unwrap_or_else(|| "general".to_string());

    let mut crawl_sources = request.crawl_sources.clone().unwrap_or_default();
    crawl_sources.sort();
    let mut enrichment_types = request.enrichment_types.clone().unwrap_or_default();
    enrichment_types.sort();
    let mut analysis_types = request.analysis_types.clone().unwrap_or_default();
    analysis_types.sort();

    format!(
        "intel_{location}_{industry}_{}_{}_{}_{}_{}",
        request.radius_miles,
        request.max_businesses,
        joined_lower(&crawl_sources),
        joined_lower(&enrichment_types),
        joined_lower(&analysis_types),
    )
}

fn joined_lower(items: &[String]) -> String {
    items.iter().map(|s| s.to_lowercase().replace(' ', "_")).collect::<Vec<_>>().join("_")
}

/// Whole-response cache, shared across requests to one `PipelineOrchestrator`.
pub struct ResponseCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
    ttl: Duration,
    capacity: usize,
    next_sequence: std::sync::atomic::AtomicU64,
}

impl ResponseCache {
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
            capacity,
            next_sequence: std::sync::atomic::AtomicU64::new(0),
        }
    }

    /// `Some(response)` when a live (non-expired) entry exists for `key`.
    pub fn get(&self, key: &str) -> Option<IntelligenceResponse> {
        let entries = self.entries.read();
        let entry = entries.get(key)?;
        if entry.inserted_at.elapsed() > self.ttl {
            return None;
        }
        Some(entry.response.clone())
    }

    /// Atomically replace (or insert) the entry for `key`, evicting the
    /// oldest entry first if this insert would exceed `capacity` (spec §9:
    /// "oldest-first eviction on overflow").
    pub fn put(&self, key: String, response: IntelligenceResponse) {
        let mut entries = self.entries.write();
        sweep_expired(&mut entries, self.ttl);

        if entries.len() >= self.capacity && !entries.contains_key(&key) {
            if let Some(oldest_key) =
                entries.iter().min_by_key(|(_, e)| e.sequence).map(|(k, _)| k.clone())
            {
                entries.remove(&oldest_key);
            }
        }

        let sequence = self.next_sequence.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        entries.insert(key, CacheEntry { response, inserted_at: Instant::now(), sequence });
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }
}

fn sweep_expired(entries: &mut HashMap<String, CacheEntry>, ttl: Duration) {
    entries.retain(|_, entry| entry.inserted_at.elapsed() <= ttl);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn req(location: &str) -> IntelligenceRequest {
        IntelligenceRequest::new(location)
    }

    #[test]
    fn cache_key_is_deterministic_and_order_independent_on_source_lists() {
        let mut a = req("Boston, MA");
        a.crawl_sources = Some(vec!["reviews".to_string(), "maps_secondary".to_string()]);
        let mut b = req("Boston, MA");
        b.crawl_sources = Some(vec!["maps_secondary".to_string(), "reviews".to_string()]);
        assert_eq!(cache_key(&a), cache_key(&b));
    }

    #[test]
    fn cache_key_lowercases_and_strips_spaces() {
        let key = cache_key(&req("Boston, MA"));
        assert!(!key.contains(' '));
        assert!(key.starts_with("intel_"));
        assert_eq!(key, key.to_lowercase());
    }

    #[test]
    fn get_returns_none_before_any_put() {
        let cache = ResponseCache::new(Duration::from_secs(3600), 10);
        assert!(cache.get("missing").is_none());
    }

    #[test]
    fn capacity_overflow_evicts_oldest_entry() {
        let cache = ResponseCache::new(Duration::from_secs(3600), 2);
        let resp = |id: &str| {
            let mut r = sample_response();
            r.request_id = id.to_string();
            r
        };
        cache.put("a".to_string(), resp("a"));
        cache.put("b".to_string(), resp("b"));
        cache.put("c".to_string(), resp("c"));
        assert_eq!(cache.len(), 2);
        assert!(cache.get("a").is_none());
        assert!(cache.get("c").is_some());
    }

    fn sample_response() -> IntelligenceResponse {
        use crate::model::{LeadDistribution, MarketMetrics, PipelinePerformance};
        IntelligenceResponse {
            request_id: "r".to_string(),
            location: "Boston, MA".to_string(),
            industry: None,
            processing_time_seconds: 0.0,
            timestamp: chrono::Utc::now(),
            businesses: Vec::new(),
            business_count: 0,
            market_metrics: MarketMetrics::default(),
            market_clusters: Vec::new(),
            fragmentation_analysis: None,
            top_leads: Vec::new(),
            lead_distribution: LeadDistribution::default(),
            data_sources_used: Vec::new(),
            data_quality_score: 0.0,
            cache_hit_rate: 0.0,
            acquisition_recommendations: Vec::new(),
            market_opportunities: Vec::new(),
            pipeline_performance: PipelinePerformance::default(),
            errors: Vec::new(),
        }
    }
}
