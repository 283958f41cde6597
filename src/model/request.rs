//! Request shape consumed by the orchestrator (spec §6.1).

use serde::{Deserialize, Serialize};

fn default_radius() -> u32 {
    25
}
fn default_max_businesses() -> usize {
    50
}
fn default_true() -> bool {
    true
}
fn default_priority() -> u8 {
    1
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntelligenceRequest {
    pub location: String,
    pub industry: Option<String>,

    #[serde(default = "default_radius")]
    pub radius_miles: u32,

    #[serde(default = "default_max_businesses")]
    pub max_businesses: usize,

    #[serde(default)]
    pub crawl_sources: Option<Vec<String>>,

    #[serde(default)]
    pub enrichment_types: Option<Vec<String>>,

    #[serde(default)]
    pub analysis_types: Option<Vec<String>>,

    #[serde(default = "default_true")]
    pub use_cache: bool,

    #[serde(default = "default_priority")]
    pub priority: u8,
}

impl IntelligenceRequest {
    pub fn new(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            industry: None,
            radius_miles: default_radius(),
            max_businesses: default_max_businesses(),
            crawl_sources: None,
            enrichment_types: None,
            analysis_types: None,
            use_cache: default_true(),
            priority: default_priority(),
        }
    }

    /// Clamp request fields to their documented valid ranges.
    pub fn validated(mut self) -> Self {
        self.radius_miles = self.radius_miles.clamp(1, 200);
        self.max_businesses = self.max_businesses.clamp(1, 500);
        self.priority = self.priority.clamp(1, 5);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnrichmentKind {
    Demographic,
    Registry,
    StateRegistry,
    TextAnalysis,
    MarketIntelligence,
}

impl EnrichmentKind {
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "demographic" => Some(Self::Demographic),
            "registry" => Some(Self::Registry),
            "state_registry" => Some(Self::StateRegistry),
            "text_analysis" => Some(Self::TextAnalysis),
            "market_intelligence" => Some(Self::MarketIntelligence),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Demographic => "demographic",
            Self::Registry => "registry",
            Self::StateRegistry => "state_registry",
            Self::TextAnalysis => "text_analysis",
            Self::MarketIntelligence => "market_intelligence",
        }
    }

    pub fn default_set() -> Vec<Self> {
        vec![
            Self::Demographic,
            Self::Registry,
            Self::StateRegistry,
            Self::TextAnalysis,
            Self::MarketIntelligence,
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisKind {
    SuccessionRisk,
    TamOpportunity,
    MarketFragmentation,
    GrowthPotential,
    AcquisitionAttractiveness,
    LeadScore,
}

impl AnalysisKind {
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "succession_risk" => Some(Self::SuccessionRisk),
            "tam_opportunity" => Some(Self::TamOpportunity),
            "market_fragmentation" => Some(Self::MarketFragmentation),
            "growth_potential" => Some(Self::GrowthPotential),
            "acquisition_attractiveness" => Some(Self::AcquisitionAttractiveness),
            "lead_score" => Some(Self::LeadScore),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SuccessionRisk => "succession_risk",
            Self::TamOpportunity => "tam_opportunity",
            Self::MarketFragmentation => "market_fragmentation",
            Self::GrowthPotential => "growth_potential",
            Self::AcquisitionAttractiveness => "acquisition_attractiveness",
            Self::LeadScore => "lead_score",
        }
    }

    pub fn all() -> Vec<Self> {
        vec![
            Self::SuccessionRisk,
            Self::TamOpportunity,
            Self::MarketFragmentation,
            Self::GrowthPotential,
            Self::AcquisitionAttractiveness,
            Self::LeadScore,
        ]
    }
}
