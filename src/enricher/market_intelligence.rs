//! Market-intelligence synthesis pass (spec §4.4): derived solely from an
//! entity's existing fields, no adapter or network call. Always succeeds —
//! there is nothing external to fail on.

use serde_json::json;

use crate::error::PipelineError;
use crate::model::Business;

pub async fn enrich(business: &mut Business) -> Result<bool, PipelineError> {
    let rating = business.metrics.rating.unwrap_or(3.5);
    let review_count = business.metrics.review_count.unwrap_or(0);
    let revenue = business.metrics.estimated_revenue.unwrap_or(0);
    let employees = business.metrics.employee_count.unwrap_or(0);
    let years = business.metrics.years_in_business.unwrap_or(5);
    let market_share = business.metrics.market_share_percent.unwrap_or(5.0);
    let digital_presence = business.metrics.digital_presence_score.unwrap_or(0.0);

    let competitive_position = match market_share {
        s if s >= 20.0 => "leader",
        s if s >= 10.0 => "strong_challenger",
        s if s >= 3.0 => "established_player",
        _ => "niche_participant",
    };

    let mut advantages = Vec::new();
    if rating >= 4.5 {
        advantages.push("strong customer reputation");
    }
    if review_count >= 100 {
        advantages.push("established review base");
    }
    if years >= 15 {
        advantages.push("long operating history");
    }
    if digital_presence >= 60.0 {
        advantages.push("strong digital presence");
    }
    if business.contact.has_any() {
        advantages.push("reachable via direct contact channels");
    }
    if advantages.is_empty() {
        advantages.push("no standout advantages identified");
    }

    // Acquisition-attractiveness prior: a coarse blend ahead of the scorer's
    // full weighted model, bounded to [0, 100].
    let acquisition_attractiveness_prior = ((rating / 5.0) * 30.0
        + (revenue as f64 / 1_000_000.0).min(1.0) * 30.0
        + (years as f64 / 30.0).min(1.0) * 20.0
        + (market_share / 20.0).min(1.0) * 20.0)
        .clamp(0.0, 100.0);

    let succession_probability = if years >= 20 { 0.6 } else if years >= 10 { 0.35 } else { 0.15 };

    let strategic_value = if market_share >= 10.0 && rating >= 4.0 {
        "high"
    } else if market_share >= 3.0 || rating >= 4.0 {
        "medium"
    } else {
        "low"
    };

    let revenue_quality = match (revenue, review_count) {
        (r, rc) if r > 0 && rc >= 20 => "corroborated",
        (r, _) if r > 0 => "estimated",
        _ => "unknown",
    };

    let growth_potential = if digital_presence >= 50.0 && years < 15 {
        "high"
    } else if digital_presence >= 25.0 {
        "medium"
    } else {
        "low"
    };

    let financial_stability = match employees {
        e if e >= 15 => "stable",
        e if e >= 5 => "moderate",
        _ => "limited",
    };

    business.enrichment.market_intelligence = Some(json!({
        "competitive_position": competitive_position,
        "competitive_advantages": advantages,
        "acquisition_attractiveness_prior": acquisition_attractiveness_prior,
        "succession_probability": succession_probability,
        "strategic_value": strategic_value,
        "revenue_quality": revenue_quality,
        "growth_potential": growth_potential,
        "financial_stability": financial_stability,
    }));
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{BTreeSet, HashMap};

    use crate::model::{
        AddressInfo, Business, BusinessMetrics, Category, ContactInfo, DataQuality, EnrichmentData,
    };

    fn stub_business() -> Business {
        Business {
            business_id: "biz_test".to_string(),
            external_ids: HashMap::new(),
            name: "Test Co".to_string(),
            category: Category::Hvac,
            industry: None,
            naics_code: None,
            address: AddressInfo::default(),
            contact: ContactInfo::default(),
            metrics: BusinessMetrics::default(),
            owner: None,
            data_sources: Vec::new(),
            overall_quality: DataQuality::Medium,
            last_updated: chrono::Utc::now(),
            enrichment: EnrichmentData::default(),
            tags: BTreeSet::new(),
            notes: Vec::new(),
        }
    }

    #[tokio::test]
    async fn always_succeeds_and_attaches_block() {
        let mut business = stub_business();
        let ok = enrich(&mut business).await.unwrap();
        assert!(ok);
        assert!(business.enrichment.market_intelligence.is_some());
    }

    #[tokio::test]
    async fn leader_position_requires_high_market_share() {
        let mut business = stub_business();
        business.metrics.market_share_percent = Some(25.0);
        business.metrics.rating = Some(4.8);
        enrich(&mut business).await.unwrap();
        let block = business.enrichment.market_intelligence.unwrap();
        assert_eq!(block["competitive_position"], "leader");
        assert_eq!(block["strategic_value"], "high");
    }
}
