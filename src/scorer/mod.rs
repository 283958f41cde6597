//! Scorer (spec §4.5): feature extraction, six per-entity analyses, a
//! business vector, and market-level k-means clustering.
//!
//! Each analysis is an independent pure function over a shared `FeatureRow`
//! rather than one monolithic scorer. CPU-bound per-entity analyses run in
//! parallel via `rayon`, batch-local and non-I/O (spec §5).

pub mod acquisition;
pub mod clustering;
pub mod features;
pub mod fragmentation;
pub mod growth;
pub mod lead;
pub mod succession;
pub mod tam;
pub mod vector;

use rayon::prelude::*;

use crate::config::PipelineConfig;
use crate::model::{AnalysisKind, Business, MarketCluster, ScoreBundle, ScoredBusiness};

/// Score every business against the full peer set in one request, running
/// the requested analyses in parallel across entities.
pub fn score_businesses(
    businesses: Vec<Business>,
    analyses: &[AnalysisKind],
) -> Vec<ScoredBusiness> {
    let peer_refs: Vec<&Business> = businesses.iter().collect();

    businesses
        .par_iter()
        .map(|business| {
            let row = features::extract(business);
            let bundle = score_one(business, &row, &peer_refs, analyses);
            ScoredBusiness { business: business.clone(), analysis: bundle }
        })
        .collect()
}

fn score_one(
    business: &Business,
    row: &features::FeatureRow,
    peers: &[&Business],
    analyses: &[AnalysisKind],
) -> ScoreBundle {
    let mut bundle = ScoreBundle::default();

    // Succession risk underlies both acquisition and lead scoring, so it is
    // computed whenever either of those (or itself) is requested.
    let succession_needed = analyses.contains(&AnalysisKind::SuccessionRisk)
        || analyses.contains(&AnalysisKind::AcquisitionAttractiveness)
        || analyses.contains(&AnalysisKind::LeadScore);
    let succession = if succession_needed { Some(succession::analyze(business, row)) } else { None };

    if analyses.contains(&AnalysisKind::SuccessionRisk) {
        bundle.succession_risk = succession.clone();
    }
    if analyses.contains(&AnalysisKind::TamOpportunity) {
        bundle.tam_opportunity = Some(tam::analyze(business, peers));
    }
    if analyses.contains(&AnalysisKind::MarketFragmentation) {
        bundle.market_fragmentation = Some(fragmentation::analyze(business, peers));
    }
    if analyses.contains(&AnalysisKind::GrowthPotential) {
        bundle.growth_potential = Some(growth::analyze(business, row));
    }
    if let Some(succession) = &succession {
        if analyses.contains(&AnalysisKind::AcquisitionAttractiveness) {
            bundle.acquisition_attractiveness = Some(acquisition::analyze(business, row, succession));
        }
        if analyses.contains(&AnalysisKind::LeadScore) {
            bundle.lead_score = Some(lead::analyze(business, row, succession));
        }
    }
    bundle.vector = Some(vector::build(row));

    bundle
}

/// Market-level clustering pass, run once over the final scored set.
pub fn cluster_market(businesses: &[Business], config: &PipelineConfig) -> Vec<MarketCluster> {
    clustering::cluster(businesses, config.clustering_seed).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AddressInfo, BusinessMetrics, Category, ContactInfo, DataQuality, EnrichmentData};
    use std::collections::{BTreeSet, HashMap};

    fn stub(id: &str) -> Business {
        Business {
            business_id: id.to_string(),
            external_ids: HashMap::new(),
            name: id.to_string(),
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
    fn score_businesses_populates_every_requested_analysis() {
        let businesses = vec![stub("a"), stub("b")];
        let scored = score_businesses(businesses, &AnalysisKind::all());
        for s in &scored {
            assert!(s.analysis.succession_risk.is_some());
            assert!(s.analysis.tam_opportunity.is_some());
            assert!(s.analysis.market_fragmentation.is_some());
            assert!(s.analysis.growth_potential.is_some());
            assert!(s.analysis.acquisition_attractiveness.is_some());
            assert!(s.analysis.lead_score.is_some());
            assert!(s.analysis.vector.is_some());
        }
    }

    #[test]
    fn excluded_analyses_are_left_none() {
        let businesses = vec![stub("a")];
        let scored = score_businesses(businesses, &[AnalysisKind::TamOpportunity]);
        let bundle = &scored[0].analysis;
        assert!(bundle.tam_opportunity.is_some());
        assert!(bundle.succession_risk.is_none());
        assert!(bundle.lead_score.is_none());
    }
}
