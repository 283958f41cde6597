//! Response bundle assembled by the orchestrator (spec §3 MarketBundle, §6.1).

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::business::SourceName;
use crate::model::score::ScoredBusiness;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MarketMetrics {
    pub total_businesses: usize,
    pub total_estimated_revenue: f64,
    pub average_estimated_revenue: f64,
    pub average_rating: f64,
    pub average_succession_risk: f64,
    pub tam_rollup: f64,
    pub market_concentration_hhi: f64,
    pub average_digital_presence: f64,
    pub acquisition_readiness_average: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketCluster {
    pub name: String,
    pub size: usize,
    pub average_revenue: f64,
    pub average_rating: f64,
    pub competitive_intensity: f64,
    pub growth_opportunity: f64,
    pub consolidation_potential: f64,
    pub business_ids: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LeadDistribution {
    #[serde(rename = "A")]
    pub a: usize,
    #[serde(rename = "B")]
    pub b: usize,
    #[serde(rename = "C")]
    pub c: usize,
    #[serde(rename = "D")]
    pub d: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcquisitionRecommendation {
    pub business_id: String,
    pub business_name: String,
    pub recommendation: String,
    pub rationale: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketOpportunity {
    pub category: String,
    pub description: String,
    pub opportunity_score: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelinePerformance {
    pub crawling_seconds: f64,
    pub normalization_seconds: f64,
    pub enrichment_seconds: f64,
    pub scoring_seconds: f64,
    pub compilation_seconds: f64,
    pub total_seconds: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntelligenceResponse {
    pub request_id: String,
    pub location: String,
    pub industry: Option<String>,
    pub processing_time_seconds: f64,
    pub timestamp: DateTime<Utc>,

    pub businesses: Vec<ScoredBusiness>,
    pub business_count: usize,

    pub market_metrics: MarketMetrics,
    pub market_clusters: Vec<MarketCluster>,
    pub fragmentation_analysis: Option<crate::model::score::FragmentationAnalysis>,

    pub top_leads: Vec<ScoredBusiness>,
    pub lead_distribution: LeadDistribution,

    pub data_sources_used: Vec<SourceName>,
    /// In [0, 1].
    pub data_quality_score: f64,
    /// In [0, 1].
    pub cache_hit_rate: f64,

    pub acquisition_recommendations: Vec<AcquisitionRecommendation>,
    pub market_opportunities: Vec<MarketOpportunity>,

    pub pipeline_performance: PipelinePerformance,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

/// Per-source crawl result bundle, as returned by the Crawler Hub (spec §4.2).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceCrawlResult {
    pub source_name: SourceName,
    pub success: bool,
    pub data: Vec<serde_json::Value>,
    pub metadata: HashMap<String, serde_json::Value>,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}
