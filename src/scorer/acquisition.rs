//! Acquisition-attractiveness analysis (spec §4.5): four weighted components
//! blended into one overall score, plus label and recommendation text.

use crate::model::{AcquisitionAttractivenessAnalysis, Business, SuccessionRiskAnalysis};
use crate::priors::{
    ACQUISITION_WEIGHT_FINANCIAL, ACQUISITION_WEIGHT_OPERATIONAL, ACQUISITION_WEIGHT_RISK_ADJUSTED,
    ACQUISITION_WEIGHT_STRATEGIC,
};

use super::features::FeatureRow;

pub fn analyze(
    _business: &Business,
    row: &FeatureRow,
    succession: &SuccessionRiskAnalysis,
) -> AcquisitionAttractivenessAnalysis {
    let financial_component = financial_from_revenue(row.estimated_revenue);
    let strategic_component = strategic_from_rating_and_share(row.rating, row.market_share_percent);
    let operational_component = operational_from_headcount_and_tenure(row.employee_count, row.years_in_business);
    // Lower succession risk is better for an acquirer.
    let risk_adjusted_component = (100.0 - succession.score).clamp(0.0, 100.0);

    let overall = (financial_component * ACQUISITION_WEIGHT_FINANCIAL
        + strategic_component * ACQUISITION_WEIGHT_STRATEGIC
        + operational_component * ACQUISITION_WEIGHT_OPERATIONAL
        + risk_adjusted_component * ACQUISITION_WEIGHT_RISK_ADJUSTED)
        .clamp(0.0, 100.0);

    let attractiveness_label = match overall {
        o if o >= 75.0 => "highly_attractive",
        o if o >= 55.0 => "attractive",
        o if o >= 35.0 => "marginal",
        _ => "unattractive",
    }
    .to_string();

    let mut key_strengths = Vec::new();
    let mut key_concerns = Vec::new();
    for (label, value, strength_text, concern_text) in [
        ("financial", financial_component, "Strong revenue base", "Limited revenue scale"),
        ("strategic", strategic_component, "Strong market position and reputation", "Weak market position"),
        ("operational", operational_component, "Established operational footprint", "Thin operational footprint"),
        ("risk-adjusted", risk_adjusted_component, "Low succession risk", "Elevated succession risk"),
    ] {
        if value >= 65.0 {
            key_strengths.push(strength_text.to_string());
        } else if value < 40.0 {
            key_concerns.push(concern_text.to_string());
        }
        let _ = label;
    }
    if key_strengths.is_empty() {
        key_strengths.push("No standout strengths identified".to_string());
    }

    let investment_recommendation = match attractiveness_label.as_str() {
        "highly_attractive" => "Prioritize for near-term outreach and diligence",
        "attractive" => "Strong candidate; include in active pipeline",
        "marginal" => "Monitor; revisit after addressing key concerns",
        _ => "Deprioritize absent a material change in fundamentals",
    }
    .to_string();

    AcquisitionAttractivenessAnalysis {
        financial_component,
        strategic_component,
        operational_component,
        risk_adjusted_component,
        overall,
        attractiveness_label,
        key_strengths,
        key_concerns,
        investment_recommendation,
    }
}

fn financial_from_revenue(revenue: f64) -> f64 {
    match revenue {
        r if r >= 5_000_000.0 => 100.0,
        r if r >= 2_000_000.0 => 80.0,
        r if r >= 1_000_000.0 => 60.0,
        r if r >= 500_000.0 => 40.0,
        r if r > 0.0 => 20.0,
        _ => 0.0,
    }
}

fn strategic_from_rating_and_share(rating: f64, market_share_percent: f64) -> f64 {
    let rating_component = (rating / 5.0) * 60.0;
    let share_component = (market_share_percent / 20.0).min(1.0) * 40.0;
    (rating_component + share_component).clamp(0.0, 100.0)
}

fn operational_from_headcount_and_tenure(employee_count: f64, years_in_business: f64) -> f64 {
    let headcount_component = (employee_count / 30.0).min(1.0) * 50.0;
    let tenure_component = (years_in_business / 20.0).min(1.0) * 50.0;
    (headcount_component + tenure_component).clamp(0.0, 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{RiskLevel, SuccessionRiskFactors};

    fn succession(score: f64) -> SuccessionRiskAnalysis {
        SuccessionRiskAnalysis {
            score,
            risk_level: RiskLevel::Medium,
            factors: SuccessionRiskFactors {
                owner_age: 0.0,
                business_age: 0.0,
                digital_presence: 0.0,
                financial_performance: 0.0,
                market_position: 0.0,
                family_involvement: 0.0,
                operational_independence: 0.0,
                succession_planning: 0.0,
            },
            recommendations: Vec::new(),
            confidence: 0.5,
        }
    }

    #[test]
    fn low_succession_risk_raises_risk_adjusted_component() {
        let row = super::super::features::extract(&stub_business());
        let analysis = analyze(&stub_business(), &row, &succession(10.0));
        assert!(analysis.risk_adjusted_component > 80.0);
    }

    fn stub_business() -> Business {
        use crate::model::{AddressInfo, BusinessMetrics, Category, ContactInfo, DataQuality, EnrichmentData};
        use std::collections::{BTreeSet, HashMap};
        Business {
            business_id: "biz_1".to_string(),
            external_ids: HashMap::new(),
            name: "Stub".to_string(),
            category: Category::Retail,
            industry: None,
            naics_code: None,
            address: AddressInfo::default(),
            contact: ContactInfo::default(),
            metrics: BusinessMetrics::default(),
            owner: None,
            data_sources: Vec::new(),
            overall_quality: DataQuality::Low,
            last_updated: chrono::Utc::now(),
            enrichment: EnrichmentData::default(),
            tags: BTreeSet::new(),
            notes: Vec::new(),
        }
    }
}
