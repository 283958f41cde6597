//! Growth-potential analysis (spec §4.5): five sub-scores from independent
//! factor groups, an exit-timeline estimate, and a quality-uplifted exit
//! multiple prior.

use crate::model::{Business, Category, GrowthPotentialAnalysis};
use crate::priors::{EXIT_MULTIPLE_PRIOR, EXIT_MULTIPLE_PRIOR_DEFAULT, GROWTH_RATE_PRIOR, GROWTH_RATE_PRIOR_DEFAULT};

use super::features::FeatureRow;

pub fn analyze(business: &Business, row: &FeatureRow) -> GrowthPotentialAnalysis {
    let organic_growth_score = organic_growth(row);
    let acquisition_growth_score = acquisition_growth(row);
    let market_expansion_score = market_expansion(business.category, row);
    let operational_efficiency_score = operational_efficiency(row);
    let exit_readiness_score = exit_readiness(row);

    let years_to_exit_estimate = match exit_readiness_score {
        s if s >= 75.0 => 1,
        s if s >= 55.0 => 2,
        s if s >= 35.0 => 3,
        _ => 5,
    };

    let base_multiple =
        EXIT_MULTIPLE_PRIOR.get(&business.category).copied().unwrap_or(EXIT_MULTIPLE_PRIOR_DEFAULT);
    let exit_multiple_prior = if row.rating > 4.5 {
        base_multiple * 1.3
    } else if row.rating > 4.0 {
        base_multiple * 1.1
    } else {
        base_multiple
    };

    GrowthPotentialAnalysis {
        organic_growth_score,
        acquisition_growth_score,
        market_expansion_score,
        operational_efficiency_score,
        exit_readiness_score,
        years_to_exit_estimate,
        exit_multiple_prior,
    }
}

fn organic_growth(row: &FeatureRow) -> f64 {
    let rating_component = (row.rating / 5.0) * 40.0;
    let digital_component = (row.digital_presence_score / 100.0) * 35.0;
    let share_component = (row.market_share_percent / 20.0).min(1.0) * 25.0;
    (rating_component + digital_component + share_component).clamp(0.0, 100.0)
}

fn acquisition_growth(row: &FeatureRow) -> f64 {
    let revenue_band = match row.estimated_revenue {
        r if r >= 2_000_000.0 => 40.0,
        r if r >= 500_000.0 => 25.0,
        _ => 10.0,
    };
    let headcount_band = match row.employee_count {
        e if e >= 30.0 => 40.0,
        e if e >= 10.0 => 25.0,
        _ => 10.0,
    };
    (revenue_band + headcount_band).clamp(0.0, 100.0)
}

fn market_expansion(category: Category, row: &FeatureRow) -> f64 {
    let growth_prior = GROWTH_RATE_PRIOR.get(&category).copied().unwrap_or(GROWTH_RATE_PRIOR_DEFAULT);
    let prior_component = (growth_prior / 0.10).min(1.0) * 70.0;
    let coordinate_component = row.has_coordinates * 30.0;
    (prior_component + coordinate_component).clamp(0.0, 100.0)
}

fn operational_efficiency(row: &FeatureRow) -> f64 {
    let revenue_per_employee = if row.employee_count > 0.0 {
        row.estimated_revenue / row.employee_count
    } else {
        0.0
    };
    let efficiency_component = (revenue_per_employee / 150_000.0).min(1.0) * 60.0;
    let tenure_component = (row.years_in_business / 20.0).min(1.0) * 40.0;
    (efficiency_component + tenure_component).clamp(0.0, 100.0)
}

fn exit_readiness(row: &FeatureRow) -> f64 {
    let independence_component = if row.employee_count >= 10.0 { 35.0 } else { 15.0 };
    let rating_component = (row.rating / 5.0) * 35.0;
    let share_component = (row.market_share_percent / 20.0).min(1.0) * 30.0;
    (independence_component + rating_component + share_component).clamp(0.0, 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AddressInfo, BusinessMetrics, ContactInfo, DataQuality, EnrichmentData};
    use std::collections::{BTreeSet, HashMap};

    fn stub() -> Business {
        Business {
            business_id: "biz_1".to_string(),
            external_ids: HashMap::new(),
            name: "Stub".to_string(),
            category: Category::Healthcare,
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
    fn high_rating_uplifts_exit_multiple() {
        let mut business = stub();
        business.metrics.rating = Some(4.8);
        let row = super::super::features::extract(&business);
        let analysis = analyze(&business, &row);
        let base = EXIT_MULTIPLE_PRIOR.get(&Category::Healthcare).copied().unwrap();
        assert!((analysis.exit_multiple_prior - base * 1.3).abs() < 1e-9);
    }

    #[test]
    fn sub_scores_stay_within_bounds() {
        let mut business = stub();
        business.metrics.rating = Some(5.0);
        business.metrics.estimated_revenue = Some(10_000_000);
        business.metrics.employee_count = Some(100);
        business.metrics.market_share_percent = Some(50.0);
        let row = super::super::features::extract(&business);
        let analysis = analyze(&business, &row);
        for score in [
            analysis.organic_growth_score,
            analysis.acquisition_growth_score,
            analysis.market_expansion_score,
            analysis.operational_efficiency_score,
            analysis.exit_readiness_score,
        ] {
            assert!((0.0..=100.0).contains(&score));
        }
    }
}
