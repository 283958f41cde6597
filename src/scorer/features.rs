//! Dense numeric feature extraction (spec §4.5): one row per business, keyed
//! by `business_id`, consumed by every other analysis in `scorer/` so none of
//! them re-derive the same defaults independently.

use std::collections::HashMap;

use crate::model::{Business, Category, DataQuality, EnrichmentKind};

/// A dense numeric view of one `Business`. Every field defaults to 0.0 when
/// the source metric is absent — analyses read this row rather than
/// `Option`-unwrapping the original entity themselves.
#[derive(Debug, Clone)]
pub struct FeatureRow {
    pub business_id: String,

    pub rating: f64,
    pub review_count: f64,
    pub estimated_revenue: f64,
    pub employee_count: f64,
    pub years_in_business: f64,
    pub market_share_percent: f64,
    pub digital_presence_score: f64,
    pub owner_age_estimate: f64,

    pub phone_valid: f64,
    pub email_valid: f64,
    pub website_valid: f64,

    pub category: Category,
    pub has_coordinates: f64,
    /// First 5 digits of the zip as an integer; 0 when absent/unparseable.
    pub zip_int: f64,
    pub data_quality: DataQuality,
    pub source_count: f64,

    pub enrichment_flags: HashMap<EnrichmentKind, f64>,
}

impl FeatureRow {
    pub fn category_one_hot(&self) -> HashMap<Category, f64> {
        Category::all().iter().map(|&c| (c, if c == self.category { 1.0 } else { 0.0 })).collect()
    }

    pub fn quality_one_hot(&self) -> [f64; 4] {
        let mut arr = [0.0; 4];
        let idx = match self.data_quality {
            DataQuality::Poor => 0,
            DataQuality::Low => 1,
            DataQuality::Medium => 2,
            DataQuality::High => 3,
        };
        arr[idx] = 1.0;
        arr
    }
}

pub fn extract(business: &Business) -> FeatureRow {
    let zip_int = business
        .address
        .zip
        .as_deref()
        .and_then(|z| z.get(0..5))
        .and_then(|z| z.parse::<f64>().ok())
        .unwrap_or(0.0);

    let mut enrichment_flags = HashMap::new();
    for kind in [
        EnrichmentKind::Demographic,
        EnrichmentKind::Registry,
        EnrichmentKind::StateRegistry,
        EnrichmentKind::TextAnalysis,
        EnrichmentKind::MarketIntelligence,
    ] {
        let tag = format!("enriched_with_{}", kind.as_str());
        enrichment_flags.insert(kind, if business.tags.contains(&tag) { 1.0 } else { 0.0 });
    }

    FeatureRow {
        business_id: business.business_id.clone(),
        rating: business.metrics.rating.unwrap_or(0.0),
        review_count: business.metrics.review_count.unwrap_or(0) as f64,
        estimated_revenue: business.metrics.estimated_revenue.unwrap_or(0) as f64,
        employee_count: business.metrics.employee_count.unwrap_or(0) as f64,
        years_in_business: business.metrics.years_in_business.unwrap_or(0) as f64,
        market_share_percent: business.metrics.market_share_percent.unwrap_or(0.0),
        digital_presence_score: business.metrics.digital_presence_score.unwrap_or(0.0),
        owner_age_estimate: business
            .owner
            .as_ref()
            .and_then(|o| o.age_estimate)
            .map(|a| a as f64)
            .unwrap_or(0.0),
        phone_valid: if business.contact.phone_valid { 1.0 } else { 0.0 },
        email_valid: if business.contact.email_valid { 1.0 } else { 0.0 },
        website_valid: if business.contact.website_valid { 1.0 } else { 0.0 },
        category: business.category,
        has_coordinates: if business.address.coordinates.is_some() { 1.0 } else { 0.0 },
        zip_int,
        data_quality: business.overall_quality,
        source_count: business.data_sources.len() as f64,
        enrichment_flags,
    }
}

pub fn extract_table(businesses: &[Business]) -> HashMap<String, FeatureRow> {
    businesses.iter().map(|b| (b.business_id.clone(), extract(b))).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AddressInfo, BusinessMetrics, ContactInfo, EnrichmentData};
    use std::collections::BTreeSet;

    fn stub(zip: Option<&str>) -> Business {
        Business {
            business_id: "biz_1".to_string(),
            external_ids: HashMap::new(),
            name: "Stub".to_string(),
            category: Category::Plumbing,
            industry: None,
            naics_code: None,
            address: AddressInfo { zip: zip.map(str::to_string), ..Default::default() },
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
    fn missing_numerics_default_to_zero() {
        let row = extract(&stub(None));
        assert_eq!(row.rating, 0.0);
        assert_eq!(row.zip_int, 0.0);
        assert_eq!(row.has_coordinates, 0.0);
    }

    #[test]
    fn zip_int_takes_first_five_digits() {
        let row = extract(&stub(Some("94103-1234")));
        assert_eq!(row.zip_int, 94103.0);
    }

    #[test]
    fn category_one_hot_marks_exactly_one_category() {
        let row = extract(&stub(None));
        let hot = row.category_one_hot();
        assert_eq!(hot.values().filter(|&&v| v == 1.0).count(), 1);
        assert_eq!(hot[&Category::Plumbing], 1.0);
    }
}
