//! Pipeline Orchestrator (spec §4.6): the request-scoped controller that
//! runs Crawler → Normalizer → Enricher → Scorer → Aggregator, applies caps,
//! merges per-stage timings, and assembles the response bundle. Nothing
//! below this module raises to the caller; `process` always returns a fully
//! shaped `IntelligenceResponse`.

use std::sync::Arc;
use std::time::Instant;

use tracing::{info_span, Instrument};
use uuid::Uuid;

use crate::adapters::{seeded_unit_interval, AdapterRegistry};
use crate::aggregator;
use crate::cache::{cache_key, ResponseCache};
use crate::config::PipelineConfig;
use crate::enricher;
use crate::error::PipelineError;
use crate::hub::CrawlerHub;
use crate::model::{
    AcquisitionRecommendation, AnalysisKind, Business, Category, DataQuality, EnrichmentKind,
    IntelligenceRequest, IntelligenceResponse, LeadDistribution, LeadGrade, MarketOpportunity,
    PipelinePerformance, ScoredBusiness, SourceName,
};
use crate::normalizer;
use crate::scorer;

/// Top N leads carried in `IntelligenceResponse::top_leads` (spec §6.1).
const TOP_LEADS_COUNT: usize = 10;
/// Max acquisition recommendations surfaced per response.
const MAX_ACQUISITION_RECOMMENDATIONS: usize = 5;
/// Overall acquisition-attractiveness floor for a recommendation to surface.
const ACQUISITION_RECOMMENDATION_CUTOFF: f64 = 70.0;

pub struct PipelineOrchestrator {
    adapters: Arc<AdapterRegistry>,
    hub: CrawlerHub,
    cache: ResponseCache,
    config: PipelineConfig,
}

impl PipelineOrchestrator {
    pub fn new(config: PipelineConfig) -> Self {
        let adapters = Arc::new(AdapterRegistry::from_env());
        let hub = CrawlerHub::new(adapters.clone());
        let cache = ResponseCache::new(config.cache_ttl, config.cache_capacity);
        Self { adapters, hub, cache, config }
    }

    pub fn with_adapters(config: PipelineConfig, adapters: Arc<AdapterRegistry>) -> Self {
        let hub = CrawlerHub::new(adapters.clone());
        let cache = ResponseCache::new(config.cache_ttl, config.cache_capacity);
        Self { adapters, hub, cache, config }
    }

    /// Run the full pipeline for one request. Never raises: every internal
    /// failure is flattened into `response.errors` (spec §7).
    pub async fn process(&self, request: IntelligenceRequest) -> IntelligenceResponse {
        let request = request.validated();
        let request_id = Uuid::new_v4().to_string();
        let pipeline_start = Instant::now();

        let span = info_span!("pipeline_process", request_id = %request_id, location = %request.location);
        self.process_inner(request, request_id, pipeline_start).instrument(span).await
    }

    async fn process_inner(
        &self,
        request: IntelligenceRequest,
        request_id: String,
        pipeline_start: Instant,
    ) -> IntelligenceResponse {
        let key = cache_key(&request);

        if request.use_cache {
            if let Some(mut cached) = self.cache.get(&key) {
                cached.request_id = request_id;
                cached.timestamp = chrono::Utc::now();
                cached.cache_hit_rate = 1.0;
                cached.processing_time_seconds = pipeline_start.elapsed().as_secs_f64();
                return cached;
            }
        }

        let mut errors: Vec<String> = Vec::new();

        let crawl_sources = resolve_sources(&request, &self.config);
        let enrichment_types = resolve_enrichments(&request, &self.config);
        let analysis_types = resolve_analyses(&request, &self.config);

        // --- Crawl ---
        let crawl_start = Instant::now();
        let crawl_results = self
            .hub
            .crawl(
                &crawl_sources,
                &request.location,
                request.industry.as_deref(),
                request.radius_miles,
                &self.config,
            )
            .await;
        let crawling_seconds = crawl_start.elapsed().as_secs_f64();

        let any_source_succeeded = crawl_results.iter().any(|r| r.success);
        for result in &crawl_results {
            if !result.success {
                for e in &result.errors {
                    errors.push(format!("{}: {e}", result.source_name.as_str()));
                }
            }
        }

        // --- Normalize ---
        let normalize_start = Instant::now();
        let mut businesses = normalizer::normalize_crawl_results(&crawl_results);
        let normalization_seconds = normalize_start.elapsed().as_secs_f64();

        let is_fallback = businesses.is_empty();
        if is_fallback {
            errors.push(PipelineError::EmptyResult.to_string());
            let (lat, lng) = self.adapters.search_serp.geocode_or_fallback(&request.location).await;
            businesses = build_fallback_businesses(&request, lat, lng, &self.config);
        }

        // Cap (spec §6.1: max_businesses is a hard cap past normalization).
        businesses.truncate(request.max_businesses);

        // --- Enrich ---
        let enrich_start = Instant::now();
        let deadline = pipeline_start + self.config.request_soft_deadline;
        let businesses =
            enricher::enrich_businesses(&self.adapters, &self.config, businesses, &enrichment_types, Some(deadline))
                .await;
        let enrichment_seconds = enrich_start.elapsed().as_secs_f64();

        // --- Score ---
        let score_start = Instant::now();
        let market_clusters = scorer::cluster_market(&businesses, &self.config);
        let scored = scorer::score_businesses(businesses, &analysis_types);
        let scoring_seconds = score_start.elapsed().as_secs_f64();

        // --- Compile ---
        let compile_start = Instant::now();

        let market_metrics = aggregator::aggregate(&scored);
        let fragmentation_analysis = aggregator::market_fragmentation(&scored);

        let mut top_leads = scored.clone();
        top_leads.sort_by(|a, b| {
            lead_overall(b).partial_cmp(&lead_overall(a)).unwrap_or(std::cmp::Ordering::Equal)
        });
        top_leads.truncate(TOP_LEADS_COUNT);

        let lead_distribution = build_lead_distribution(&scored);
        let data_sources_used = build_data_sources_used(&crawl_results);
        let data_quality_score = compute_data_quality_score(is_fallback, any_source_succeeded, &scored);
        let acquisition_recommendations = build_acquisition_recommendations(&scored);
        let market_opportunities = build_market_opportunities(&scored, &market_metrics);

        let compilation_seconds = compile_start.elapsed().as_secs_f64();
        let total_seconds = pipeline_start.elapsed().as_secs_f64();

        let response = IntelligenceResponse {
            request_id,
            location: request.location.clone(),
            industry: request.industry.clone(),
            processing_time_seconds: total_seconds,
            timestamp: chrono::Utc::now(),
            business_count: scored.len(),
            businesses: scored,
            market_metrics,
            market_clusters,
            fragmentation_analysis: Some(fragmentation_analysis),
            top_leads,
            lead_distribution,
            data_sources_used,
            data_quality_score,
            cache_hit_rate: 0.0,
            acquisition_recommendations,
            market_opportunities,
            pipeline_performance: PipelinePerformance {
                crawling_seconds,
                normalization_seconds,
                enrichment_seconds,
                scoring_seconds,
                compilation_seconds,
                total_seconds,
            },
            errors,
        };

        if request.use_cache {
            self.cache.put(key, response.clone());
        }

        response
    }
}

fn lead_overall(scored: &ScoredBusiness) -> f64 {
    scored.analysis.lead_score.as_ref().map(|l| l.overall).unwrap_or(0.0)
}

/// Resolve the crawl-adapter set: unknown names ignored, empty/absent falls
/// back to the configured default (spec §6.2).
fn resolve_sources(request: &IntelligenceRequest, config: &PipelineConfig) -> Vec<SourceName> {
    match &request.crawl_sources {
        Some(names) if !names.is_empty() => {
            let resolved: Vec<SourceName> =
                names.iter().filter_map(|n| SourceName::from_str_loose(n)).collect();
            if resolved.is_empty() {
                config.default_crawl_sources.clone()
            } else {
                resolved
            }
        }
        _ => config.default_crawl_sources.clone(),
    }
}

fn resolve_enrichments(request: &IntelligenceRequest, config: &PipelineConfig) -> Vec<EnrichmentKind> {
    match &request.enrichment_types {
        Some(names) if !names.is_empty() => {
            let resolved: Vec<EnrichmentKind> =
                names.iter().filter_map(|n| EnrichmentKind::from_str_loose(n)).collect();
            if resolved.is_empty() {
                config.default_enrichment_types.clone()
            } else {
                resolved
            }
        }
        _ => config.default_enrichment_types.clone(),
    }
}

fn resolve_analyses(request: &IntelligenceRequest, config: &PipelineConfig) -> Vec<AnalysisKind> {
    match &request.analysis_types {
        Some(names) if !names.is_empty() => {
            let resolved: Vec<AnalysisKind> =
                names.iter().filter_map(|n| AnalysisKind::from_str_loose(n)).collect();
            if resolved.is_empty() {
                config.default_analysis_types.clone()
            } else {
                resolved
            }
        }
        _ => config.default_analysis_types.clone(),
    }
}

/// Fallback mode (spec §4.6.1): synthesize 3-5 minimal entities near the
/// geocoded query center, deterministic given the request. These entities
/// carry no provenance (spec §8: "data_sources is non-empty iff the entity
/// is not a fallback-synthesized one").
fn build_fallback_businesses(
    request: &IntelligenceRequest,
    lat: f64,
    lng: f64,
    config: &PipelineConfig,
) -> Vec<Business> {
    let seed = format!("{}|{}", request.location, request.industry.as_deref().unwrap_or(""));
    let span = (config.fallback_max_entities - config.fallback_min_entities + 1).max(1);
    let count = config.fallback_min_entities
        + (seeded_unit_interval(&seed, 99) * span as f64) as usize;
    let count = count.clamp(config.fallback_min_entities, config.fallback_max_entities);

    let raw = crate::adapters::synth::synthesize_businesses(
        &request.location,
        request.industry.as_deref(),
        lat,
        lng,
        count,
    );

    raw.iter()
        .filter_map(|r| normalizer::normalize_record(SourceName::Manual, r))
        .map(|mut business| {
            business.data_sources.clear();
            business.tags.insert("fallback_minimal".to_string());
            business.overall_quality = DataQuality::Poor;
            business
        })
        .collect()
}

fn build_lead_distribution(scored: &[ScoredBusiness]) -> LeadDistribution {
    let mut distribution = LeadDistribution::default();
    for s in scored {
        if let Some(lead) = &s.analysis.lead_score {
            match lead.grade {
                LeadGrade::A => distribution.a += 1,
                LeadGrade::B => distribution.b += 1,
                LeadGrade::C => distribution.c += 1,
                LeadGrade::D => distribution.d += 1,
            }
        }
    }
    distribution
}

/// Sources that actually contributed data to this response, in stable
/// source-name order (spec §5: "stable, sorted by source name").
fn build_data_sources_used(crawl_results: &[crate::model::SourceCrawlResult]) -> Vec<SourceName> {
    let mut names: Vec<SourceName> = crawl_results
        .iter()
        .filter(|r| r.success && !r.data.is_empty())
        .map(|r| r.source_name)
        .collect();
    names.sort_by_key(|s| s.as_str());
    names.dedup_by_key(|s| s.as_str());
    names
}

/// Trust signal communicated to the caller (spec §4.6.1, §7).
fn compute_data_quality_score(
    is_fallback: bool,
    any_source_succeeded: bool,
    scored: &[ScoredBusiness],
) -> f64 {
    if is_fallback {
        return if any_source_succeeded { 0.4 } else { 0.0 };
    }
    if scored.is_empty() {
        return 0.0;
    }
    let total: f64 = scored
        .iter()
        .map(|s| match s.business.overall_quality {
            DataQuality::Poor => 0.0,
            DataQuality::Low => 0.33,
            DataQuality::Medium => 0.66,
            DataQuality::High => 1.0,
        })
        .sum();
    (total / scored.len() as f64).clamp(0.0, 1.0)
}

fn build_acquisition_recommendations(scored: &[ScoredBusiness]) -> Vec<AcquisitionRecommendation> {
    let mut candidates: Vec<&ScoredBusiness> = scored
        .iter()
        .filter(|s| {
            s.analysis
                .acquisition_attractiveness
                .as_ref()
                .map(|a| a.overall >= ACQUISITION_RECOMMENDATION_CUTOFF)
                .unwrap_or(false)
        })
        .collect();

    candidates.sort_by(|a, b| {
        let a_score = a.analysis.acquisition_attractiveness.as_ref().map(|x| x.overall).unwrap_or(0.0);
        let b_score = b.analysis.acquisition_attractiveness.as_ref().map(|x| x.overall).unwrap_or(0.0);
        b_score.partial_cmp(&a_score).unwrap_or(std::cmp::Ordering::Equal)
    });

    candidates
        .into_iter()
        .take(MAX_ACQUISITION_RECOMMENDATIONS)
        .filter_map(|s| {
            let attractiveness = s.analysis.acquisition_attractiveness.as_ref()?;
            Some(AcquisitionRecommendation {
                business_id: s.business.business_id.clone(),
                business_name: s.business.name.clone(),
                recommendation: attractiveness.investment_recommendation.clone(),
                rationale: if attractiveness.key_strengths.is_empty() {
                    attractiveness.attractiveness_label.clone()
                } else {
                    attractiveness.key_strengths.join("; ")
                },
            })
        })
        .collect()
}

/// One opportunity summary per category present in the result set, scored
/// from the average roll-up potential and growth potential of its members.
fn build_market_opportunities(
    scored: &[ScoredBusiness],
    market_metrics: &crate::model::MarketMetrics,
) -> Vec<MarketOpportunity> {
    let mut by_category: std::collections::BTreeMap<&'static str, Vec<&ScoredBusiness>> =
        std::collections::BTreeMap::new();
    for s in scored {
        by_category.entry(s.business.category.as_str()).or_default().push(s);
    }

    by_category
        .into_iter()
        .map(|(category, members)| {
            let roll_up_avg = members
                .iter()
                .filter_map(|s| s.analysis.market_fragmentation.as_ref().map(|f| f.roll_up_potential))
                .sum::<f64>()
                / members.len().max(1) as f64;
            let growth_avg = members
                .iter()
                .filter_map(|s| s.analysis.growth_potential.as_ref().map(|g| g.market_expansion_score))
                .sum::<f64>()
                / members.len().max(1) as f64;

            let opportunity_score = ((roll_up_avg * 100.0) * 0.5 + growth_avg * 0.5).clamp(0.0, 100.0);
            let description = format!(
                "{} businesses in {category} with average revenue ${:.0}; roll-up potential {:.0}%",
                members.len(),
                market_metrics.average_estimated_revenue,
                roll_up_avg * 100.0
            );

            MarketOpportunity { category: category.to_string(), description, opportunity_score }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{IntelligenceRequest, SourceCrawlResult};

    #[test]
    fn resolve_sources_falls_back_to_default_on_unknown_names() {
        let mut request = IntelligenceRequest::new("Boston, MA");
        request.crawl_sources = Some(vec!["not_a_real_source".to_string()]);
        let config = PipelineConfig::default();
        let sources = resolve_sources(&request, &config);
        assert_eq!(sources, config.default_crawl_sources);
    }

    #[test]
    fn resolve_sources_filters_unknown_but_keeps_known() {
        let mut request = IntelligenceRequest::new("Boston, MA");
        request.crawl_sources = Some(vec!["reviews".to_string(), "bogus".to_string()]);
        let config = PipelineConfig::default();
        let sources = resolve_sources(&request, &config);
        assert_eq!(sources, vec![SourceName::Reviews]);
    }

    #[test]
    fn data_sources_used_excludes_failed_and_empty_results() {
        let results = vec![
            SourceCrawlResult {
                source_name: SourceName::Reviews,
                success: true,
                data: vec![serde_json::json!({"name": "x"})],
                metadata: Default::default(),
                timestamp: chrono::Utc::now(),
                errors: Vec::new(),
            },
            SourceCrawlResult {
                source_name: SourceName::MapsSecondary,
                success: false,
                data: Vec::new(),
                metadata: Default::default(),
                timestamp: chrono::Utc::now(),
                errors: vec!["boom".to_string()],
            },
        ];
        let used = build_data_sources_used(&results);
        assert_eq!(used, vec![SourceName::Reviews]);
    }

    #[test]
    fn fallback_data_quality_score_is_bounded_low() {
        assert_eq!(compute_data_quality_score(true, false, &[]), 0.0);
        assert!(compute_data_quality_score(true, true, &[]) <= 0.6);
    }
}
