//! Succession-risk analysis (spec §4.5): eight deterministic sub-factors,
//! fixed-weight aggregate, risk band, and confidence.

use crate::model::{Business, RiskLevel, SuccessionRiskAnalysis, SuccessionRiskFactors};
use crate::priors::*;

use super::features::FeatureRow;

const DEFAULT_OWNER_AGE: f64 = 50.0;
const DEFAULT_RATING: f64 = 3.0;
const DEFAULT_MARKET_SHARE: f64 = 5.0;

pub fn analyze(business: &Business, row: &FeatureRow) -> SuccessionRiskAnalysis {
    let owner_age =
        if row.owner_age_estimate > 0.0 { row.owner_age_estimate } else { DEFAULT_OWNER_AGE };
    let rating = if row.rating > 0.0 { row.rating } else { DEFAULT_RATING };
    let market_share =
        if row.market_share_percent > 0.0 { row.market_share_percent } else { DEFAULT_MARKET_SHARE };

    let owner_age_factor = ((owner_age - 30.0) * 2.0).clamp(0.0, 100.0);
    let business_age_factor = match row.years_in_business {
        y if y > 30.0 => 80.0,
        y if y > 20.0 => 60.0,
        y if y > 10.0 => 40.0,
        _ => 20.0,
    };
    let digital_presence_factor = 100.0 - row.digital_presence_score;
    let financial_performance_factor = ((5.0 - rating) * 20.0).clamp(0.0, 100.0);
    let market_position_factor = (100.0 - 4.0 * market_share).clamp(0.0, 100.0);
    let family_involvement_factor = if business
        .owner
        .as_ref()
        .map(|o| o.detection_source.to_lowercase().contains("family"))
        .unwrap_or(false)
    {
        70.0
    } else {
        30.0
    };
    let operational_independence_factor = match row.employee_count {
        e if e >= 30.0 => 20.0,
        e if e >= 15.0 => 40.0,
        e if e >= 5.0 => 60.0,
        _ => 80.0,
    };
    let succession_cues_detected = business
        .enrichment
        .nlp_analysis
        .as_ref()
        .and_then(|v| v.get("succession_cues_detected"))
        .and_then(serde_json::Value::as_bool)
        .unwrap_or(false);
    let succession_planning_factor = if succession_cues_detected { 30.0 } else { 50.0 };

    let factors = SuccessionRiskFactors {
        owner_age: owner_age_factor,
        business_age: business_age_factor,
        digital_presence: digital_presence_factor,
        financial_performance: financial_performance_factor,
        market_position: market_position_factor,
        family_involvement: family_involvement_factor,
        operational_independence: operational_independence_factor,
        succession_planning: succession_planning_factor,
    };

    let score = (factors.owner_age * SUCCESSION_WEIGHT_OWNER_AGE
        + factors.business_age * SUCCESSION_WEIGHT_BUSINESS_AGE
        + factors.family_involvement * SUCCESSION_WEIGHT_FAMILY_INVOLVEMENT
        + factors.operational_independence * SUCCESSION_WEIGHT_OPERATIONAL_INDEPENDENCE
        + factors.digital_presence * SUCCESSION_WEIGHT_DIGITAL_PRESENCE
        + factors.financial_performance * SUCCESSION_WEIGHT_FINANCIAL_PERFORMANCE
        + factors.market_position * SUCCESSION_WEIGHT_MARKET_POSITION
        + factors.succession_planning * SUCCESSION_WEIGHT_SUCCESSION_PLANNING)
        .clamp(0.0, 100.0);

    let risk_level = match score {
        s if s >= 80.0 => RiskLevel::VeryHigh,
        s if s >= 60.0 => RiskLevel::High,
        s if s >= 40.0 => RiskLevel::Medium,
        s if s >= 20.0 => RiskLevel::Low,
        _ => RiskLevel::VeryLow,
    };

    let recommendations = recommendations_from_factors(&factors);

    let mut confidence: f64 = 0.5;
    if business.owner.is_some() {
        confidence += 0.15;
    }
    if business.metrics.years_in_business.is_some() {
        confidence += 0.15;
    }
    if business.tags.contains("enriched_with_text_analysis") {
        confidence += 0.1;
    }
    if business.overall_quality == crate::model::DataQuality::High {
        confidence += 0.1;
    }
    confidence = confidence.min(1.0);

    SuccessionRiskAnalysis { score, risk_level, factors, recommendations, confidence }
}

/// Fixed strings keyed to fixed per-factor thresholds (not a ranking of the
/// dominant factors) — matches the scoring source's
/// `_generate_succession_recommendations`.
fn recommendations_from_factors(factors: &SuccessionRiskFactors) -> Vec<String> {
    let mut recommendations = Vec::new();

    if factors.owner_age > 70.0 {
        recommendations.push("Immediate succession planning required".to_string());
    } else if factors.owner_age > 60.0 {
        recommendations.push("Begin succession planning process".to_string());
    }

    if factors.digital_presence > 60.0 {
        recommendations.push("Modernize digital presence and systems".to_string());
    }

    if factors.operational_independence > 70.0 {
        recommendations.push("Reduce owner dependency through process documentation".to_string());
    }

    if factors.succession_planning > 60.0 {
        recommendations.push("Develop formal succession plan".to_string());
    }

    recommendations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AddressInfo, BusinessMetrics, Category, ContactInfo, DataQuality, EnrichmentData};
    use std::collections::{BTreeSet, HashMap};

    fn stub() -> Business {
        Business {
            business_id: "biz_1".to_string(),
            external_ids: HashMap::new(),
            name: "Stub".to_string(),
            category: Category::Hvac,
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

    #[test]
    fn defaults_produce_a_mid_band_score() {
        let business = stub();
        let row = super::super::features::extract(&business);
        let analysis = analyze(&business, &row);
        assert!(analysis.score > 0.0 && analysis.score <= 100.0);
    }

    #[test]
    fn spec_scenario_elderly_owner_low_digital_presence_is_high_risk() {
        // Mirrors spec.md §8 scenario 5's inputs. Per the documented
        // per-factor formula and fixed weights (same ones used here), this
        // input set weighs out to the high band (~66), not the >=80
        // "very_high" the scenario's prose claims — the scenario's own
        // arithmetic doesn't reach 80 with the weights as specified. See
        // DESIGN.md for the resolved discrepancy.
        let mut business = stub();
        business.owner = Some(crate::model::OwnerInfo {
            name: None,
            age_estimate: Some(72),
            detection_source: "manual".to_string(),
            confidence: 0.9,
        });
        business.metrics.years_in_business = Some(28);
        business.metrics.employee_count = Some(3);
        business.metrics.rating = Some(3.2);
        business.metrics.market_share_percent = Some(2.0);
        business.metrics.digital_presence_score = Some(10.0);
        let row = super::super::features::extract(&business);
        let analysis = analyze(&business, &row);
        assert!(analysis.score >= 60.0, "expected at least high risk, got {}", analysis.score);
        assert!(matches!(analysis.risk_level, RiskLevel::High | RiskLevel::VeryHigh));
        // Scenario 5: owner_age factor 84 (>70) and digital_presence factor
        // 90 (>60) must emit these literal strings.
        assert!(analysis
            .recommendations
            .contains(&"Immediate succession planning required".to_string()));
        assert!(analysis
            .recommendations
            .iter()
            .any(|r| r.contains("Modernize digital presence")));
    }

    #[test]
    fn old_owner_and_long_tenure_raise_risk() {
        let mut business = stub();
        business.owner = Some(crate::model::OwnerInfo {
            name: None,
            age_estimate: Some(68),
            detection_source: "manual".to_string(),
            confidence: 0.9,
        });
        business.metrics.years_in_business = Some(35);
        let row = super::super::features::extract(&business);
        let analysis = analyze(&business, &row);
        assert!(matches!(analysis.risk_level, RiskLevel::High | RiskLevel::VeryHigh));
    }
}
