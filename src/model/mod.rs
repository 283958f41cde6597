pub mod business;
pub mod request;
pub mod response;
pub mod score;

pub use business::{
    AddressInfo, Business, BusinessMetrics, Category, ContactInfo, Coordinates, DataQuality,
    EnrichmentData, OwnerInfo, SourceName, SourceRecord,
};
pub use request::{AnalysisKind, EnrichmentKind, IntelligenceRequest};
pub use response::{
    AcquisitionRecommendation, IntelligenceResponse, LeadDistribution, MarketCluster,
    MarketMetrics, MarketOpportunity, PipelinePerformance, SourceCrawlResult,
};
pub use score::{
    AcquisitionAttractivenessAnalysis, FragmentationAnalysis, FragmentationLabel,
    GrowthPotentialAnalysis, LeadGrade, LeadScoreAnalysis, RiskLevel, ScoreBundle, ScoredBusiness,
    SuccessionRiskAnalysis, SuccessionRiskFactors, TamAnalysis,
};
