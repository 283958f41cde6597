//! Aggregator (spec §4.8): a pure function from the scored entity list to a
//! market-level summary. No I/O, no shared state.

use crate::model::{FragmentationAnalysis, FragmentationLabel, MarketMetrics, ScoredBusiness};
use crate::priors::{
    HHI_HIGHLY_FRAGMENTED_CUTOFF, HHI_MODERATELY_FRAGMENTED_CUTOFF,
    ROLL_UP_POTENTIAL_CONCENTRATED, ROLL_UP_POTENTIAL_HIGHLY_FRAGMENTED,
    ROLL_UP_POTENTIAL_MODERATELY_FRAGMENTED,
};

pub fn aggregate(businesses: &[ScoredBusiness]) -> MarketMetrics {
    let total_businesses = businesses.len();
    if total_businesses == 0 {
        return MarketMetrics::default();
    }

    let revenues: Vec<f64> =
        businesses.iter().map(|s| s.business.metrics.estimated_revenue.unwrap_or(0) as f64).collect();
    let total_estimated_revenue: f64 = revenues.iter().sum();
    let average_estimated_revenue = total_estimated_revenue / total_businesses as f64;

    let average_rating = businesses
        .iter()
        .map(|s| s.business.metrics.rating.unwrap_or(0.0))
        .sum::<f64>()
        / total_businesses as f64;

    let succession_scores: Vec<f64> = businesses
        .iter()
        .filter_map(|s| s.analysis.succession_risk.as_ref().map(|a| a.score))
        .collect();
    let average_succession_risk = if succession_scores.is_empty() {
        0.0
    } else {
        succession_scores.iter().sum::<f64>() / succession_scores.len() as f64
    };

    let tam_rollup: f64 = businesses.iter().filter_map(|s| s.analysis.tam_opportunity.as_ref().map(|a| a.tam)).sum();

    let market_concentration_hhi = if total_estimated_revenue > 0.0 {
        revenues.iter().map(|r| (r / total_estimated_revenue * 100.0).powi(2)).sum::<f64>()
    } else {
        0.0
    };

    let average_digital_presence = businesses
        .iter()
        .map(|s| s.business.metrics.digital_presence_score.unwrap_or(0.0))
        .sum::<f64>()
        / total_businesses as f64;

    let acquisition_readiness_average = businesses
        .iter()
        .map(|s| acquisition_readiness_heuristic(&s.business))
        .sum::<f64>()
        / total_businesses as f64;

    MarketMetrics {
        total_businesses,
        total_estimated_revenue,
        average_estimated_revenue,
        average_rating,
        average_succession_risk,
        tam_rollup,
        market_concentration_hhi,
        average_digital_presence,
        acquisition_readiness_average,
    }
}

/// Market-wide fragmentation view (spec §3 MarketBundle): the same HHI math
/// as the per-entity view (`scorer::fragmentation`), but over the whole
/// scored set for this request rather than a category/zip-filtered peer
/// group — the request is already scoped to one location and industry, so
/// the full set *is* the relevant market.
pub fn market_fragmentation(businesses: &[ScoredBusiness]) -> FragmentationAnalysis {
    const MIN_PEERS_FOR_ANALYSIS: usize = 2;

    if businesses.len() < MIN_PEERS_FOR_ANALYSIS {
        return FragmentationAnalysis {
            hhi: 0.0,
            label: FragmentationLabel::InsufficientData,
            top4_concentration_ratio: 0.0,
            top8_concentration_ratio: 0.0,
            leader_share_percent: 0.0,
            consolidation_opportunity: "insufficient peer data".to_string(),
            roll_up_potential: 0.0,
            peer_count: businesses.len(),
        };
    }

    let revenues: Vec<f64> =
        businesses.iter().map(|s| s.business.metrics.estimated_revenue.unwrap_or(0) as f64).collect();
    let total_revenue: f64 = revenues.iter().sum();

    let shares: Vec<f64> = if total_revenue > 0.0 {
        revenues.iter().map(|r| r / total_revenue * 100.0).collect()
    } else {
        let even_share = 100.0 / businesses.len() as f64;
        vec![even_share; businesses.len()]
    };

    let mut sorted_shares = shares.clone();
    sorted_shares.sort_by(|a, b| b.partial_cmp(a).unwrap_or(std::cmp::Ordering::Equal));

    let hhi: f64 = shares.iter().map(|s| s * s).sum();
    let top4_concentration_ratio: f64 = sorted_shares.iter().take(4).sum();
    let top8_concentration_ratio: f64 = sorted_shares.iter().take(8).sum();
    let leader_share_percent = sorted_shares.first().copied().unwrap_or(0.0);

    let label = match hhi {
        h if h < HHI_HIGHLY_FRAGMENTED_CUTOFF => FragmentationLabel::HighlyFragmented,
        h if h < HHI_MODERATELY_FRAGMENTED_CUTOFF => FragmentationLabel::ModeratelyFragmented,
        _ => FragmentationLabel::Concentrated,
    };

    let consolidation_opportunity = match label {
        FragmentationLabel::HighlyFragmented => "strong roll-up candidate: many small competitors",
        FragmentationLabel::ModeratelyFragmented => "moderate consolidation opportunity",
        FragmentationLabel::Concentrated => "limited consolidation upside: market already concentrated",
        FragmentationLabel::InsufficientData => "insufficient peer data",
    }
    .to_string();

    let roll_up_potential = match label {
        FragmentationLabel::HighlyFragmented => ROLL_UP_POTENTIAL_HIGHLY_FRAGMENTED,
        FragmentationLabel::ModeratelyFragmented => ROLL_UP_POTENTIAL_MODERATELY_FRAGMENTED,
        FragmentationLabel::Concentrated => ROLL_UP_POTENTIAL_CONCENTRATED,
        FragmentationLabel::InsufficientData => 0.0,
    };

    FragmentationAnalysis {
        hhi,
        label,
        top4_concentration_ratio,
        top8_concentration_ratio,
        leader_share_percent,
        consolidation_opportunity,
        roll_up_potential,
        peer_count: businesses.len(),
    }
}

/// Per-entity contact-validity + revenue-band + tenure heuristic (spec
/// §4.8), in [0, 100].
fn acquisition_readiness_heuristic(business: &crate::model::Business) -> f64 {
    let contact_component = if business.contact.has_any() { 35.0 } else { 0.0 };
    let revenue_component = match business.metrics.estimated_revenue.unwrap_or(0) {
        r if r >= 2_000_000 => 40.0,
        r if r >= 500_000 => 25.0,
        r if r > 0 => 10.0,
        _ => 0.0,
    };
    let tenure_component = match business.metrics.years_in_business.unwrap_or(0) {
        y if y >= 10 => 25.0,
        y if y >= 3 => 15.0,
        _ => 0.0,
    };
    (contact_component + revenue_component + tenure_component).clamp(0.0, 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        AddressInfo, Business, BusinessMetrics, Category, ContactInfo, DataQuality, EnrichmentData,
        ScoreBundle,
    };
    use std::collections::{BTreeSet, HashMap};

    fn scored(revenue: u64, rating: f64) -> ScoredBusiness {
        let business = Business {
            business_id: "biz_1".to_string(),
            external_ids: HashMap::new(),
            name: "Stub".to_string(),
            category: Category::Hvac,
            industry: None,
            naics_code: None,
            address: AddressInfo::default(),
            contact: ContactInfo::default(),
            metrics: BusinessMetrics { estimated_revenue: Some(revenue), rating: Some(rating), ..Default::default() },
            owner: None,
            data_sources: Vec::new(),
            overall_quality: DataQuality::Low,
            last_updated: chrono::Utc::now(),
            enrichment: EnrichmentData::default(),
            tags: BTreeSet::new(),
            notes: Vec::new(),
        };
        ScoredBusiness { business, analysis: ScoreBundle::default() }
    }

    #[test]
    fn empty_input_returns_zeroed_metrics() {
        let metrics = aggregate(&[]);
        assert_eq!(metrics.total_businesses, 0);
        assert_eq!(metrics.total_estimated_revenue, 0.0);
    }

    #[test]
    fn averages_are_computed_across_all_entities() {
        let businesses = vec![scored(100_000, 4.0), scored(300_000, 5.0)];
        let metrics = aggregate(&businesses);
        assert_eq!(metrics.total_businesses, 2);
        assert_eq!(metrics.total_estimated_revenue, 400_000.0);
        assert_eq!(metrics.average_estimated_revenue, 200_000.0);
        assert!((metrics.average_rating - 4.5).abs() < 1e-9);
    }

    #[test]
    fn equal_shares_among_ten_peers_is_highly_fragmented() {
        let businesses: Vec<ScoredBusiness> = (0..10).map(|_| scored(100, 4.0)).collect();
        let analysis = market_fragmentation(&businesses);
        assert!((analysis.hhi - 1000.0).abs() < 1e-9);
        assert_eq!(analysis.label, FragmentationLabel::HighlyFragmented);
        assert!((analysis.leader_share_percent - 10.0).abs() < 1e-9);
        assert!((analysis.top4_concentration_ratio - 40.0).abs() < 1e-9);
        assert!((analysis.roll_up_potential - 0.9).abs() < 1e-6);
    }

    #[test]
    fn fewer_than_two_peers_is_insufficient_data() {
        let analysis = market_fragmentation(&[scored(100_000, 4.0)]);
        assert_eq!(analysis.label, FragmentationLabel::InsufficientData);
        assert_eq!(analysis.hhi, 0.0);
    }
}
