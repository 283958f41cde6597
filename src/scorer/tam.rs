//! TAM/SAM/SOM opportunity analysis (spec §4.5): peers are filtered to the
//! same category and zip within the same request's result set.

use crate::model::{Business, Category, TamAnalysis};
use crate::priors::{
    CATEGORY_BARRIERS, CATEGORY_BARRIER_DEFAULT, GROWTH_RATE_PRIOR, GROWTH_RATE_PRIOR_DEFAULT,
    SAM_OF_TAM, TAM_CATEGORY_MULTIPLIER, TAM_CATEGORY_MULTIPLIER_DEFAULT,
};

const HIGH_PEER_COUNT_THRESHOLD: usize = 5;
/// Used to express competitive density as "peers per $1M of TAM".
const TAM_PER_MILLION: f64 = 1_000_000.0;

pub fn analyze(business: &Business, peers: &[&Business]) -> TamAnalysis {
    let same_market: Vec<&&Business> = peers
        .iter()
        .filter(|p| {
            p.business_id != business.business_id
                && p.category == business.category
                && p.address.zip.is_some()
                && p.address.zip == business.address.zip
        })
        .collect();

    let peer_count = same_market.len();
    let total_peer_revenue: f64 =
        same_market.iter().map(|p| p.metrics.estimated_revenue.unwrap_or(0) as f64).sum();
    let average_peer_revenue =
        if peer_count > 0 { total_peer_revenue / peer_count as f64 } else { 0.0 };

    let category_multiplier = TAM_CATEGORY_MULTIPLIER
        .get(&business.category)
        .copied()
        .unwrap_or(TAM_CATEGORY_MULTIPLIER_DEFAULT);

    let tam = total_peer_revenue.max(average_peer_revenue) * category_multiplier;
    let sam = tam * SAM_OF_TAM;
    let market_share = business.metrics.market_share_percent.unwrap_or(0.0);
    let som = sam * (market_share / 100.0);

    let confidence = if peer_count >= HIGH_PEER_COUNT_THRESHOLD { 0.8 } else { 0.6 };
    let growth_rate_prior =
        GROWTH_RATE_PRIOR.get(&business.category).copied().unwrap_or(GROWTH_RATE_PRIOR_DEFAULT);

    let average_age: f64 = if peer_count > 0 {
        same_market.iter().map(|p| p.metrics.years_in_business.unwrap_or(0) as f64).sum::<f64>()
            / peer_count as f64
    } else {
        business.metrics.years_in_business.unwrap_or(0) as f64
    };
    let maturity_label = match average_age {
        a if a >= 20.0 => "mature_market",
        a if a >= 8.0 => "established_market",
        _ => "emerging_market",
    };

    let competitive_density = if tam > 0.0 { peer_count as f64 / (tam / TAM_PER_MILLION) } else { 0.0 };

    let barriers_to_entry = barriers_for(business.category, average_peer_revenue);

    TamAnalysis {
        tam,
        sam,
        som,
        maturity_label: maturity_label.to_string(),
        competitive_density,
        barriers_to_entry,
        growth_rate_prior,
        confidence,
        peer_count,
    }
}

fn barriers_for(category: Category, average_peer_revenue: f64) -> Vec<String> {
    let mut barriers: Vec<String> = CATEGORY_BARRIERS
        .get(&category)
        .map(|list| list.iter().map(|s| s.to_string()).collect())
        .unwrap_or_else(|| vec![CATEGORY_BARRIER_DEFAULT.to_string()]);

    if average_peer_revenue >= 2_000_000.0 {
        barriers.push("Significant incumbent scale".to_string());
    }
    barriers
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AddressInfo, BusinessMetrics, ContactInfo, DataQuality, EnrichmentData};
    use std::collections::{BTreeSet, HashMap};

    fn stub(id: &str, zip: &str, revenue: u64) -> Business {
        Business {
            business_id: id.to_string(),
            external_ids: HashMap::new(),
            name: id.to_string(),
            category: Category::Hvac,
            industry: None,
            naics_code: None,
            address: AddressInfo { zip: Some(zip.to_string()), ..Default::default() },
            contact: ContactInfo::default(),
            metrics: BusinessMetrics { estimated_revenue: Some(revenue), ..Default::default() },
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
    fn confidence_upgrades_with_enough_peers() {
        let target = stub("a", "30301", 500_000);
        let peers: Vec<Business> = (0..5).map(|i| stub(&format!("p{i}"), "30301", 400_000)).collect();
        let peer_refs: Vec<&Business> = peers.iter().collect();
        let analysis = analyze(&target, &peer_refs);
        assert_eq!(analysis.peer_count, 5);
        assert_eq!(analysis.confidence, 0.8);
        assert!(analysis.tam > 0.0);
    }

    #[test]
    fn peers_outside_zip_are_excluded() {
        let target = stub("a", "30301", 500_000);
        let peers = vec![stub("b", "99999", 400_000)];
        let peer_refs: Vec<&Business> = peers.iter().collect();
        let analysis = analyze(&target, &peer_refs);
        assert_eq!(analysis.peer_count, 0);
    }
}
