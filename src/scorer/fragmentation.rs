//! Per-entity market-fragmentation view (spec §4.5): peers share category and
//! a 3-digit zip prefix; HHI and concentration ratios are computed over
//! revenue shares.

use crate::model::{Business, FragmentationAnalysis, FragmentationLabel};
use crate::priors::{
    HHI_HIGHLY_FRAGMENTED_CUTOFF, HHI_MODERATELY_FRAGMENTED_CUTOFF,
    ROLL_UP_POTENTIAL_CONCENTRATED, ROLL_UP_POTENTIAL_HIGHLY_FRAGMENTED,
    ROLL_UP_POTENTIAL_MODERATELY_FRAGMENTED,
};

const MIN_PEERS_FOR_ANALYSIS: usize = 2;

pub fn analyze(business: &Business, peers: &[&Business]) -> FragmentationAnalysis {
    let Some(prefix) = zip_prefix(business) else {
        return insufficient_data();
    };

    let mut market: Vec<&Business> = peers
        .iter()
        .filter(|p| p.business_id != business.business_id && p.category == business.category)
        .filter(|p| zip_prefix(p).as_deref() == Some(prefix.as_str()))
        .copied()
        .collect();
    market.push(business);

    if market.len() < MIN_PEERS_FOR_ANALYSIS {
        return insufficient_data();
    }

    let revenues: Vec<f64> = market.iter().map(|b| b.metrics.estimated_revenue.unwrap_or(0) as f64).collect();
    let total_revenue: f64 = revenues.iter().sum();

    let shares: Vec<f64> = if total_revenue > 0.0 {
        revenues.iter().map(|r| r / total_revenue * 100.0).collect()
    } else {
        let even_share = 100.0 / market.len() as f64;
        vec![even_share; market.len()]
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

    // Fixed per-label prior, not a continuous function of HHI/peer count.
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
        peer_count: market.len() - 1,
    }
}

fn zip_prefix(business: &Business) -> Option<String> {
    business.address.zip.as_deref().and_then(|z| z.get(0..3)).map(str::to_string)
}

fn insufficient_data() -> FragmentationAnalysis {
    FragmentationAnalysis {
        hhi: 0.0,
        label: FragmentationLabel::InsufficientData,
        top4_concentration_ratio: 0.0,
        top8_concentration_ratio: 0.0,
        leader_share_percent: 0.0,
        consolidation_opportunity: "insufficient peer data".to_string(),
        roll_up_potential: 0.0,
        peer_count: 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AddressInfo, BusinessMetrics, Category, ContactInfo, DataQuality, EnrichmentData};
    use std::collections::{BTreeSet, HashMap};

    fn stub(id: &str, zip: &str, revenue: u64) -> Business {
        Business {
            business_id: id.to_string(),
            external_ids: HashMap::new(),
            name: id.to_string(),
            category: Category::Retail,
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
    fn fewer_than_two_peers_is_insufficient_data() {
        let target = stub("a", "30301", 100_000);
        let analysis = analyze(&target, &[]);
        assert_eq!(analysis.label, FragmentationLabel::InsufficientData);
    }

    #[test]
    fn even_shares_among_many_peers_are_highly_fragmented() {
        let target = stub("a", "30301", 100_000);
        let peers: Vec<Business> = (0..10).map(|i| stub(&format!("p{i}"), "30302", 100_000)).collect();
        let peer_refs: Vec<&Business> = peers.iter().collect();
        let analysis = analyze(&target, &peer_refs);
        assert_eq!(analysis.label, FragmentationLabel::HighlyFragmented);
        assert_eq!(analysis.peer_count, 10);
    }

    #[test]
    fn single_dominant_peer_is_concentrated() {
        let target = stub("a", "30301", 50_000);
        let peers = vec![stub("dominant", "30302", 5_000_000)];
        let peer_refs: Vec<&Business> = peers.iter().collect();
        let analysis = analyze(&target, &peer_refs);
        assert_eq!(analysis.label, FragmentationLabel::Concentrated);
    }
}
