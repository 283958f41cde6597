//! Centralized priors: category multipliers, growth-rate priors, exit
//! multiples, risk-factor weights, and source-reliability base scores.
//! Every weighted-blend constant used by `scorer/` lives here, named, with
//! units documented, rather than inlined at each call site.

use once_cell::sync::Lazy;
use std::collections::HashMap;

use crate::model::{Category, SourceName};

/// TAM multiplier applied to total peer revenue within a category (spec §4.5).
/// Default for categories not in the table is 1.5, per spec.
pub static TAM_CATEGORY_MULTIPLIER: Lazy<HashMap<Category, f64>> = Lazy::new(|| {
    use Category::*;
    HashMap::from([
        (Hvac, 1.8),
        (Plumbing, 1.6),
        (Electrical, 1.7),
        (Restaurant, 2.0),
        (Retail, 1.5),
        (Healthcare, 2.2),
        (Automotive, 1.9),
        (Construction, 2.1),
        (Services, 1.4),
    ])
});
pub const TAM_CATEGORY_MULTIPLIER_DEFAULT: f64 = 1.5;

/// SAM as a fraction of TAM.
pub const SAM_OF_TAM: f64 = 0.6;

/// Annual market growth-rate prior by category (fraction, e.g. 0.06 = 6%/yr).
pub static GROWTH_RATE_PRIOR: Lazy<HashMap<Category, f64>> = Lazy::new(|| {
    use Category::*;
    HashMap::from([
        (Hvac, 0.06),
        (Healthcare, 0.08),
        (Retail, 0.03),
        (Restaurant, 0.04),
        (Construction, 0.05),
        (Services, 0.07),
    ])
});
pub const GROWTH_RATE_PRIOR_DEFAULT: f64 = 0.05;

/// Baseline exit multiple (x revenue) by category.
pub static EXIT_MULTIPLE_PRIOR: Lazy<HashMap<Category, f64>> = Lazy::new(|| {
    use Category::*;
    HashMap::from([
        (Hvac, 3.5),
        (Healthcare, 4.5),
        (Retail, 2.5),
        (Restaurant, 2.0),
        (Construction, 3.0),
        (Services, 3.2),
    ])
});
pub const EXIT_MULTIPLE_PRIOR_DEFAULT: f64 = 3.0;

/// Category-specific barriers to entry; categories absent default to a
/// single generic barrier.
pub static CATEGORY_BARRIERS: Lazy<HashMap<Category, Vec<&'static str>>> = Lazy::new(|| {
    use Category::*;
    HashMap::from([
        (Hvac, vec!["Licensing requirements", "Equipment investment", "Technical expertise"]),
        (
            Healthcare,
            vec!["Regulatory compliance", "Professional licensing", "Insurance requirements"],
        ),
        (
            Restaurant,
            vec!["Health permits", "Location requirements", "Food safety regulations"],
        ),
        (Construction, vec!["Licensing", "Bonding requirements", "Safety certifications"]),
    ])
});
pub const CATEGORY_BARRIER_DEFAULT: &str = "General business licensing";

/// Succession-risk sub-factor weights (spec §4.5); must sum to 1.0.
pub const SUCCESSION_WEIGHT_OWNER_AGE: f64 = 0.25;
pub const SUCCESSION_WEIGHT_BUSINESS_AGE: f64 = 0.15;
pub const SUCCESSION_WEIGHT_FAMILY_INVOLVEMENT: f64 = 0.15;
pub const SUCCESSION_WEIGHT_OPERATIONAL_INDEPENDENCE: f64 = 0.15;
pub const SUCCESSION_WEIGHT_DIGITAL_PRESENCE: f64 = 0.10;
pub const SUCCESSION_WEIGHT_FINANCIAL_PERFORMANCE: f64 = 0.10;
pub const SUCCESSION_WEIGHT_MARKET_POSITION: f64 = 0.05;
pub const SUCCESSION_WEIGHT_SUCCESSION_PLANNING: f64 = 0.05;

/// Acquisition-attractiveness component weights (spec §4.5); sum to 1.0.
pub const ACQUISITION_WEIGHT_FINANCIAL: f64 = 0.30;
pub const ACQUISITION_WEIGHT_STRATEGIC: f64 = 0.25;
pub const ACQUISITION_WEIGHT_OPERATIONAL: f64 = 0.25;
pub const ACQUISITION_WEIGHT_RISK_ADJUSTED: f64 = 0.20;

/// Lead-score component weights (spec §4.5); sum to 1.0.
pub const LEAD_WEIGHT_CONTACT_QUALITY: f64 = 0.25;
pub const LEAD_WEIGHT_BUSINESS_QUALITY: f64 = 0.20;
pub const LEAD_WEIGHT_FINANCIAL_OPPORTUNITY: f64 = 0.25;
pub const LEAD_WEIGHT_SUCCESSION_OPPORTUNITY: f64 = 0.20;
pub const LEAD_WEIGHT_DATA_COMPLETENESS: f64 = 0.10;

/// Lead-grade cutoffs (spec §4.5).
pub const LEAD_GRADE_A_CUTOFF: f64 = 80.0;
pub const LEAD_GRADE_B_CUTOFF: f64 = 65.0;
pub const LEAD_GRADE_C_CUTOFF: f64 = 50.0;

/// Fragmentation HHI label cutoffs (scaled 0-10000, spec §4.5).
pub const HHI_HIGHLY_FRAGMENTED_CUTOFF: f64 = 1500.0;
pub const HHI_MODERATELY_FRAGMENTED_CUTOFF: f64 = 2500.0;

/// Roll-up potential is a fixed prior per fragmentation label, not a
/// continuous function of HHI/peer count (spec §4.5, §8 scenario 4).
pub const ROLL_UP_POTENTIAL_HIGHLY_FRAGMENTED: f64 = 0.9;
pub const ROLL_UP_POTENTIAL_MODERATELY_FRAGMENTED: f64 = 0.7;
pub const ROLL_UP_POTENTIAL_CONCENTRATED: f64 = 0.3;

/// Source reliability priors (spec §4.3 table); used as base confidence and
/// as the merge tie-breaker.
pub static SOURCE_RELIABILITY: Lazy<HashMap<SourceName, f64>> = Lazy::new(|| {
    use SourceName::*;
    HashMap::from([
        (BizRegistry, 0.95),
        (Registry, 0.90),
        (Demographics, 0.90),
        (StateRegistry, 0.90),
        (MapsPrimary, 0.80),
        (MapsSecondary, 0.75),
        (Reviews, 0.75),
        (SearchSerp, 0.70),
        (PageCrawl, 0.60),
        (GenericWeb, 0.60),
        (SignalsSocial, 0.60),
        (Manual, 0.50),
    ])
});

/// Consolidated revenue-from-rating formula (spec §9 Open Questions): used
/// by the `REVIEWS` adapter when a source doesn't supply revenue directly,
/// and by the normalizer's metric-fill step. No other call site invents its
/// own constants for this estimate.
///
/// `revenue = base_per_review * review_count * rating_multiplier`, floored
/// at `MIN_ESTIMATED_REVENUE`.
pub const REVENUE_BASE_PER_REVIEW: f64 = 1_500.0;
pub const MIN_ESTIMATED_REVENUE: u64 = 50_000;

pub fn revenue_from_rating(rating: Option<f64>, review_count: Option<u64>) -> Option<u64> {
    let review_count = review_count?;
    if review_count == 0 {
        return None;
    }
    let rating = rating.unwrap_or(3.5).clamp(0.0, 5.0);
    // Rating multiplier: a 5-star shop converts review volume into revenue
    // at roughly double the rate of a 2.5-star shop.
    let rating_multiplier = 0.4 + (rating / 5.0) * 1.2;
    let estimate = REVENUE_BASE_PER_REVIEW * review_count as f64 * rating_multiplier;
    Some((estimate as u64).max(MIN_ESTIMATED_REVENUE))
}

/// Estimated employee count from review volume, used by the same fallback
/// path as `revenue_from_rating` when a source omits headcount.
pub fn employee_count_from_review_count(review_count: Option<u64>) -> Option<u64> {
    let review_count = review_count?;
    Some(((review_count / 20).max(1)).min(500))
}
