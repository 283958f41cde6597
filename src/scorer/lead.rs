//! Lead-score analysis (spec §4.5): five weighted components, letter grade,
//! priority label, and a close-probability estimate.

use crate::model::{Business, LeadGrade, LeadScoreAnalysis, SuccessionRiskAnalysis};
use crate::priors::{
    LEAD_GRADE_A_CUTOFF, LEAD_GRADE_B_CUTOFF, LEAD_GRADE_C_CUTOFF, LEAD_WEIGHT_BUSINESS_QUALITY,
    LEAD_WEIGHT_CONTACT_QUALITY, LEAD_WEIGHT_DATA_COMPLETENESS, LEAD_WEIGHT_FINANCIAL_OPPORTUNITY,
    LEAD_WEIGHT_SUCCESSION_OPPORTUNITY,
};

use super::features::FeatureRow;

pub fn analyze(
    business: &Business,
    row: &FeatureRow,
    succession: &SuccessionRiskAnalysis,
) -> LeadScoreAnalysis {
    let contact_quality =
        ((row.phone_valid + row.email_valid + row.website_valid) / 3.0 * 100.0).clamp(0.0, 100.0);
    let business_quality = business_quality_from(row.rating, row.review_count);
    let financial_opportunity = financial_opportunity_from(row.estimated_revenue);
    let succession_opportunity = succession.score;
    let data_completeness = data_completeness_from(business);

    let overall = (contact_quality * LEAD_WEIGHT_CONTACT_QUALITY
        + business_quality * LEAD_WEIGHT_BUSINESS_QUALITY
        + financial_opportunity * LEAD_WEIGHT_FINANCIAL_OPPORTUNITY
        + succession_opportunity * LEAD_WEIGHT_SUCCESSION_OPPORTUNITY
        + data_completeness * LEAD_WEIGHT_DATA_COMPLETENESS)
        .clamp(0.0, 100.0);

    let grade = match overall {
        o if o >= LEAD_GRADE_A_CUTOFF => LeadGrade::A,
        o if o >= LEAD_GRADE_B_CUTOFF => LeadGrade::B,
        o if o >= LEAD_GRADE_C_CUTOFF => LeadGrade::C,
        _ => LeadGrade::D,
    };

    // Priority labels per spec §8 scenario 6 ("lead_grade = A" -> "priority
    // = high"); B/C/D match the scoring source's
    // `_determine_lead_priority` mapping (medium/low/very_low).
    let priority = match grade {
        LeadGrade::A => "high",
        LeadGrade::B => "medium",
        LeadGrade::C => "low",
        LeadGrade::D => "very_low",
    }
    .to_string();

    let follow_up_recommendations = recommendations_for(grade, contact_quality, succession_opportunity);
    let close_probability = (overall / 100.0 * 0.6).clamp(0.05, 0.95);

    LeadScoreAnalysis {
        contact_quality,
        business_quality,
        financial_opportunity,
        succession_opportunity,
        data_completeness,
        overall,
        grade,
        priority,
        follow_up_recommendations,
        close_probability,
    }
}

fn business_quality_from(rating: f64, review_count: f64) -> f64 {
    let rating_component = (rating / 5.0) * 60.0;
    let review_component = (review_count / 100.0).min(1.0) * 40.0;
    (rating_component + review_component).clamp(0.0, 100.0)
}

fn financial_opportunity_from(revenue: f64) -> f64 {
    match revenue {
        r if r >= 3_000_000.0 => 100.0,
        r if r >= 1_000_000.0 => 75.0,
        r if r >= 300_000.0 => 50.0,
        r if r > 0.0 => 25.0,
        _ => 0.0,
    }
}

fn data_completeness_from(business: &Business) -> f64 {
    let checks = [
        business.contact.phone.is_some(),
        business.contact.email.is_some(),
        business.contact.website.is_some(),
        business.metrics.rating.is_some(),
        business.metrics.estimated_revenue.is_some(),
        business.address.formatted.is_some(),
    ];
    let present = checks.iter().filter(|&&c| c).count();
    (present as f64 / checks.len() as f64) * 100.0
}

fn recommendations_for(grade: LeadGrade, contact_quality: f64, succession_opportunity: f64) -> Vec<String> {
    let mut recs = Vec::new();
    match grade {
        LeadGrade::A => recs.push("Schedule outreach within the week".to_string()),
        LeadGrade::B => recs.push("Add to next outreach cycle".to_string()),
        LeadGrade::C => recs.push("Queue for nurture sequence".to_string()),
        LeadGrade::D => recs.push("Deprioritize until profile strengthens".to_string()),
    }
    if contact_quality < 50.0 {
        recs.push("Verify and supplement contact details before outreach".to_string());
    }
    if succession_opportunity >= 60.0 {
        recs.push("Lead with a succession/exit-planning angle".to_string());
    }
    recs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        AddressInfo, BusinessMetrics, Category, ContactInfo, DataQuality, EnrichmentData, RiskLevel,
        SuccessionRiskFactors,
    };
    use std::collections::{BTreeSet, HashMap};

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

    fn stub() -> Business {
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

    #[test]
    fn grade_a_requires_high_overall() {
        let mut business = stub();
        business.contact.phone_valid = true;
        business.contact.email_valid = true;
        business.contact.website_valid = true;
        business.metrics.rating = Some(4.9);
        business.metrics.review_count = Some(200);
        business.metrics.estimated_revenue = Some(4_000_000);
        let row = super::super::features::extract(&business);
        let analysis = analyze(&business, &row, &succession(70.0));
        assert_eq!(analysis.grade, LeadGrade::A);
    }

    #[test]
    fn spec_scenario_strong_profile_grades_a_with_high_priority() {
        // Mirrors spec.md §8 scenario 6's inputs: valid phone/email/website,
        // rating 4.6, review_count 120, estimated_revenue 2.5M, succession
        // risk 75, full field completeness. Hand-computed: contact=100,
        // business_quality=95.2, financial_opportunity=75,
        // succession_opportunity=75, data_completeness=100 -> overall ~87.8,
        // which clears the A cutoff as the scenario expects.
        let mut business = stub();
        business.contact.phone = Some("555-0100".to_string());
        business.contact.phone_valid = true;
        business.contact.email = Some("owner@example.com".to_string());
        business.contact.email_valid = true;
        business.contact.website = Some("https://example.com".to_string());
        business.contact.website_valid = true;
        business.address.formatted = Some("123 Main St".to_string());
        business.metrics.rating = Some(4.6);
        business.metrics.review_count = Some(120);
        business.metrics.estimated_revenue = Some(2_500_000);
        let row = super::super::features::extract(&business);
        let analysis = analyze(&business, &row, &succession(75.0));
        assert!(analysis.overall >= 80.0, "expected overall >= 80, got {}", analysis.overall);
        assert_eq!(analysis.grade, LeadGrade::A);
        assert_eq!(analysis.priority, "high");
    }

    #[test]
    fn close_probability_is_bounded() {
        let business = stub();
        let row = super::super::features::extract(&business);
        let analysis = analyze(&business, &row, &succession(0.0));
        assert!(analysis.close_probability >= 0.05 && analysis.close_probability <= 0.95);
    }
}
