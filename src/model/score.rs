//! `ScoreBundle` pieces: one struct per per-entity analysis named in spec §3.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuccessionRiskFactors {
    pub owner_age: f64,
    pub business_age: f64,
    pub digital_presence: f64,
    pub financial_performance: f64,
    pub market_position: f64,
    pub family_involvement: f64,
    pub operational_independence: f64,
    pub succession_planning: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    VeryLow,
    Low,
    Medium,
    High,
    VeryHigh,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::VeryLow => "very_low",
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
            RiskLevel::VeryHigh => "very_high",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuccessionRiskAnalysis {
    /// Overall score in [0, 100].
    pub score: f64,
    pub risk_level: RiskLevel,
    pub factors: SuccessionRiskFactors,
    pub recommendations: Vec<String>,
    /// Confidence in [0, 1].
    pub confidence: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TamAnalysis {
    pub tam: f64,
    pub sam: f64,
    pub som: f64,
    pub maturity_label: String,
    pub competitive_density: f64,
    pub barriers_to_entry: Vec<String>,
    pub growth_rate_prior: f64,
    /// Confidence in [0, 1]: 0.8 if >=5 peers observed, else 0.6.
    pub confidence: f64,
    pub peer_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FragmentationLabel {
    HighlyFragmented,
    ModeratelyFragmented,
    Concentrated,
    InsufficientData,
}

impl FragmentationLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            FragmentationLabel::HighlyFragmented => "highly_fragmented",
            FragmentationLabel::ModeratelyFragmented => "moderately_fragmented",
            FragmentationLabel::Concentrated => "concentrated",
            FragmentationLabel::InsufficientData => "insufficient_data",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FragmentationAnalysis {
    /// HHI scaled to [0, 10000].
    pub hhi: f64,
    pub label: FragmentationLabel,
    pub top4_concentration_ratio: f64,
    pub top8_concentration_ratio: f64,
    pub leader_share_percent: f64,
    pub consolidation_opportunity: String,
    /// Roll-up potential in [0, 1].
    pub roll_up_potential: f64,
    pub peer_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GrowthPotentialAnalysis {
    pub organic_growth_score: f64,
    pub acquisition_growth_score: f64,
    pub market_expansion_score: f64,
    pub operational_efficiency_score: f64,
    pub exit_readiness_score: f64,
    pub years_to_exit_estimate: u32,
    pub exit_multiple_prior: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcquisitionAttractivenessAnalysis {
    pub financial_component: f64,
    pub strategic_component: f64,
    pub operational_component: f64,
    pub risk_adjusted_component: f64,
    /// Overall in [0, 100].
    pub overall: f64,
    pub attractiveness_label: String,
    pub key_strengths: Vec<String>,
    pub key_concerns: Vec<String>,
    pub investment_recommendation: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LeadGrade {
    A,
    B,
    C,
    D,
}

impl LeadGrade {
    pub fn as_str(&self) -> &'static str {
        match self {
            LeadGrade::A => "A",
            LeadGrade::B => "B",
            LeadGrade::C => "C",
            LeadGrade::D => "D",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeadScoreAnalysis {
    pub contact_quality: f64,
    pub business_quality: f64,
    pub financial_opportunity: f64,
    pub succession_opportunity: f64,
    pub data_completeness: f64,
    /// Overall in [0, 100].
    pub overall: f64,
    pub grade: LeadGrade,
    pub priority: String,
    pub follow_up_recommendations: Vec<String>,
    /// Close-probability estimate in [0.05, 0.95].
    pub close_probability: f64,
}

/// The full per-entity score bundle. Any field is `None` when its analysis
/// kind was excluded via `analysis_types`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScoreBundle {
    pub succession_risk: Option<SuccessionRiskAnalysis>,
    pub tam_opportunity: Option<TamAnalysis>,
    pub market_fragmentation: Option<FragmentationAnalysis>,
    pub growth_potential: Option<GrowthPotentialAnalysis>,
    pub acquisition_attractiveness: Option<AcquisitionAttractivenessAnalysis>,
    pub lead_score: Option<LeadScoreAnalysis>,
    /// L2-normalized numeric feature vector for similarity search.
    pub vector: Option<Vec<f64>>,
}

/// A scored business: the canonical entity plus its analyses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredBusiness {
    #[serde(flatten)]
    pub business: crate::model::business::Business,
    pub analysis: ScoreBundle,
}
