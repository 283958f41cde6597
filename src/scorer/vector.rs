//! Business-vector construction (spec §4.5): an L2-normalized numeric
//! feature vector for downstream similarity search. Not consumed by any
//! analysis in this crate beyond clustering's own separate feature set.

use crate::model::Category;

use super::features::FeatureRow;

/// 12 numeric metrics/flags + one-hot category (12 categories) + 1 coordinate
/// flag = 25 dimensions.
pub const VECTOR_DIM: usize = 25;

pub fn build(row: &FeatureRow) -> Vec<f64> {
    let mut v = Vec::with_capacity(VECTOR_DIM);

    v.push(row.rating / 5.0);
    v.push(row.review_count.ln_1p() / 10.0);
    v.push(row.estimated_revenue.ln_1p() / 20.0);
    v.push((row.employee_count / 100.0).min(1.0));
    v.push((row.years_in_business / 50.0).min(1.0));
    v.push((row.market_share_percent / 100.0).min(1.0));
    v.push(row.digital_presence_score / 100.0);
    v.push(row.phone_valid);
    v.push(row.email_valid);
    v.push(row.website_valid);
    v.push(row.has_coordinates);
    v.push(row.source_count / 12.0);

    for category in Category::all() {
        v.push(if *category == row.category { 1.0 } else { 0.0 });
    }

    debug_assert_eq!(v.len(), VECTOR_DIM);
    l2_normalize(v)
}

fn l2_normalize(mut v: Vec<f64>) -> Vec<f64> {
    let norm = v.iter().map(|x| x * x).sum::<f64>().sqrt();
    if norm > 0.0 {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
    v
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scorer::features::extract;
    use crate::model::{AddressInfo, Business, BusinessMetrics, ContactInfo, DataQuality, EnrichmentData};
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
            metrics: BusinessMetrics {
                rating: Some(4.5),
                review_count: Some(50),
                estimated_revenue: Some(700_000),
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
    fn vector_has_expected_dimension() {
        let row = extract(&stub());
        let v = build(&row);
        assert_eq!(v.len(), VECTOR_DIM);
    }

    #[test]
    fn vector_is_l2_normalized() {
        let row = extract(&stub());
        let v = build(&row);
        let norm: f64 = v.iter().map(|x| x * x).sum::<f64>().sqrt();
        assert!((norm - 1.0).abs() < 1e-9 || norm == 0.0);
    }
}
