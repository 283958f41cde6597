//! Market-level k-means clustering (spec §4.5): runs once per request over
//! `{rating, estimated_revenue, employee_count, years_in_business,
//! market_share_percent}`, standard-scaled, with a fixed seed for
//! determinism. Not part of any single-entity analysis; consumed directly by
//! the orchestrator to populate `IntelligenceResponse::market_clusters`.

use nalgebra::DVector;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use statrs::statistics::Statistics;

use crate::model::{Business, MarketCluster};

const MIN_ENTITIES_FOR_CLUSTERING: usize = 5;
const MAX_CLUSTERS: usize = 5;
const MAX_ITERATIONS: usize = 100;
const DIMENSIONS: usize = 5;

/// `None` when there are fewer than 5 entities (spec §4.5: "if >= 5 entities").
pub fn cluster(businesses: &[Business], seed: u64) -> Option<Vec<MarketCluster>> {
    if businesses.len() < MIN_ENTITIES_FOR_CLUSTERING {
        return None;
    }

    let raw: Vec<[f64; DIMENSIONS]> = businesses
        .iter()
        .map(|b| {
            [
                b.metrics.rating.unwrap_or(0.0),
                b.metrics.estimated_revenue.unwrap_or(0) as f64,
                b.metrics.employee_count.unwrap_or(0) as f64,
                b.metrics.years_in_business.unwrap_or(0) as f64,
                b.metrics.market_share_percent.unwrap_or(0.0),
            ]
        })
        .collect();

    let scaled = standard_scale(&raw);
    let points: Vec<DVector<f64>> = scaled.iter().map(|row| DVector::from_row_slice(row)).collect();

    let k = (businesses.len() / 3).clamp(1, MAX_CLUSTERS);
    let assignments = k_means(&points, k, seed);

    let mut clusters = Vec::with_capacity(k);
    for cluster_idx in 0..k {
        let members: Vec<&Business> = businesses
            .iter()
            .zip(assignments.iter())
            .filter(|(_, &a)| a == cluster_idx)
            .map(|(b, _)| b)
            .collect();
        if members.is_empty() {
            continue;
        }
        clusters.push(summarize_cluster(&members));
    }
    Some(clusters)
}

fn standard_scale(raw: &[[f64; DIMENSIONS]]) -> Vec<[f64; DIMENSIONS]> {
    let n = raw.len() as f64;
    let mut means = [0.0; DIMENSIONS];
    let mut stds = [0.0; DIMENSIONS];

    for dim in 0..DIMENSIONS {
        let col: Vec<f64> = raw.iter().map(|r| r[dim]).collect();
        let mean = col.iter().sum::<f64>() / n;
        let variance = col.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        means[dim] = mean;
        stds[dim] = variance.sqrt();
    }

    raw.iter()
        .map(|row| {
            let mut scaled = [0.0; DIMENSIONS];
            for dim in 0..DIMENSIONS {
                scaled[dim] = if stds[dim] > 1e-9 { (row[dim] - means[dim]) / stds[dim] } else { 0.0 };
            }
            scaled
        })
        .collect()
}

/// Lloyd's algorithm with fixed-seed centroid initialization, for
/// reproducible cluster assignment across identical inputs.
fn k_means(points: &[DVector<f64>], k: usize, seed: u64) -> Vec<usize> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut centroids: Vec<DVector<f64>> = sample_initial_centroids(points, k, &mut rng);
    let mut assignments = vec![0usize; points.len()];

    for _ in 0..MAX_ITERATIONS {
        let mut changed = false;
        for (i, point) in points.iter().enumerate() {
            let nearest = centroids
                .iter()
                .enumerate()
                .min_by(|(_, a), (_, b)| {
                    (point - a).norm().partial_cmp(&(point - b).norm()).unwrap()
                })
                .map(|(idx, _)| idx)
                .unwrap_or(0);
            if assignments[i] != nearest {
                assignments[i] = nearest;
                changed = true;
            }
        }

        for cluster_idx in 0..k {
            let members: Vec<&DVector<f64>> = points
                .iter()
                .zip(assignments.iter())
                .filter(|(_, &a)| a == cluster_idx)
                .map(|(p, _)| p)
                .collect();
            if members.is_empty() {
                continue;
            }
            let dim = centroids[cluster_idx].len();
            let mut sum = DVector::from_element(dim, 0.0);
            for m in &members {
                sum += *m;
            }
            centroids[cluster_idx] = sum / members.len() as f64;
        }

        if !changed {
            break;
        }
    }
    assignments
}

fn sample_initial_centroids(points: &[DVector<f64>], k: usize, rng: &mut ChaCha8Rng) -> Vec<DVector<f64>> {
    let mut indices: Vec<usize> = (0..points.len()).collect();
    // Fisher-Yates with a seeded RNG for determinism.
    for i in (1..indices.len()).rev() {
        let j = rng.gen_range(0..=i);
        indices.swap(i, j);
    }
    indices.into_iter().take(k).map(|i| points[i].clone()).collect()
}

fn summarize_cluster(members: &[&Business]) -> MarketCluster {
    let size = members.len();
    let revenues: Vec<f64> = members.iter().map(|b| b.metrics.estimated_revenue.unwrap_or(0) as f64).collect();
    let ratings: Vec<f64> = members.iter().map(|b| b.metrics.rating.unwrap_or(0.0)).collect();
    let ages: Vec<f64> = members.iter().map(|b| b.metrics.years_in_business.unwrap_or(0) as f64).collect();
    let shares: Vec<f64> = members.iter().map(|b| b.metrics.market_share_percent.unwrap_or(0.0)).collect();

    let average_revenue = revenues.clone().mean();
    let average_rating = ratings.clone().mean();
    let mean_age = ages.clone().mean();
    let max_market_share = shares.iter().cloned().fold(0.0, f64::max);

    let competitive_intensity = revenues.clone().std_dev() / (average_revenue + 1.0);
    let growth_opportunity = (1.0 - mean_age / 30.0).max(0.0);
    let consolidation_potential = 1.0 - (max_market_share / 100.0);

    let name = heuristic_name(average_revenue, average_rating);
    let business_ids = members.iter().map(|b| b.business_id.clone()).collect();

    MarketCluster {
        name,
        size,
        average_revenue,
        average_rating,
        competitive_intensity,
        growth_opportunity,
        consolidation_potential,
        business_ids,
    }
}

fn heuristic_name(average_revenue: f64, average_rating: f64) -> String {
    let revenue_label = match average_revenue {
        r if r >= 2_000_000.0 => "High-Revenue",
        r if r >= 500_000.0 => "Mid-Revenue",
        _ => "Emerging",
    };
    let rating_label = if average_rating >= 4.3 { "Top-Rated" } else { "Standard" };
    format!("{revenue_label} {rating_label} Segment")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AddressInfo, BusinessMetrics, Category, ContactInfo, DataQuality, EnrichmentData};
    use std::collections::{BTreeSet, HashMap};

    fn stub(id: &str, revenue: u64, rating: f64) -> Business {
        Business {
            business_id: id.to_string(),
            external_ids: HashMap::new(),
            name: id.to_string(),
            category: Category::Retail,
            industry: None,
            naics_code: None,
            address: AddressInfo::default(),
            contact: ContactInfo::default(),
            metrics: BusinessMetrics {
                estimated_revenue: Some(revenue),
                rating: Some(rating),
                employee_count: Some(5),
                years_in_business: Some(10),
                market_share_percent: Some(5.0),
                ..Default::default()
            },
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
    fn fewer_than_five_entities_returns_none() {
        let businesses: Vec<Business> = (0..4).map(|i| stub(&format!("b{i}"), 100_000, 4.0)).collect();
        assert!(cluster(&businesses, 42).is_none());
    }

    #[test]
    fn clustering_is_deterministic_for_a_fixed_seed() {
        let businesses: Vec<Business> =
            (0..9).map(|i| stub(&format!("b{i}"), 100_000 * (i as u64 + 1), 3.0 + (i as f64 * 0.2))).collect();
        let first = cluster(&businesses, 42).unwrap();
        let second = cluster(&businesses, 42).unwrap();
        assert_eq!(first.len(), second.len());
        for (a, b) in first.iter().zip(second.iter()) {
            assert_eq!(a.business_ids, b.business_ids);
        }
    }

    #[test]
    fn cluster_count_is_bounded_by_n_over_three() {
        let businesses: Vec<Business> = (0..9).map(|i| stub(&format!("b{i}"), 100_000, 4.0)).collect();
        let clusters = cluster(&businesses, 42).unwrap();
        assert!(clusters.len() <= 3);
    }
}
