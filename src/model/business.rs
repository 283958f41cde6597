//! Canonical entity types: `Business`, its provenance, and the enums closed
//! over the source/category vocabulary.

use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Closed category vocabulary. Unmapped industries fall back to `Other`;
/// professional-services keywords (accounting, legal, consulting) map to
/// `Services` rather than growing this enum (see DESIGN.md).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Hvac,
    Plumbing,
    Electrical,
    Landscaping,
    Restaurant,
    Retail,
    Healthcare,
    Automotive,
    Construction,
    Manufacturing,
    Services,
    Other,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Hvac => "hvac",
            Category::Plumbing => "plumbing",
            Category::Electrical => "electrical",
            Category::Landscaping => "landscaping",
            Category::Restaurant => "restaurant",
            Category::Retail => "retail",
            Category::Healthcare => "healthcare",
            Category::Automotive => "automotive",
            Category::Construction => "construction",
            Category::Manufacturing => "manufacturing",
            Category::Services => "services",
            Category::Other => "other",
        }
    }

    pub fn all() -> &'static [Category] {
        &[
            Category::Hvac,
            Category::Plumbing,
            Category::Electrical,
            Category::Landscaping,
            Category::Restaurant,
            Category::Retail,
            Category::Healthcare,
            Category::Automotive,
            Category::Construction,
            Category::Manufacturing,
            Category::Services,
            Category::Other,
        ]
    }
}

/// Recognized external source names (capability-level, per spec §4.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceName {
    MapsPrimary,
    MapsSecondary,
    SearchSerp,
    Reviews,
    SignalsSocial,
    Registry,
    PageCrawl,
    GenericWeb,
    Demographics,
    BizRegistry,
    StateRegistry,
    Manual,
}

impl SourceName {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceName::MapsPrimary => "maps_primary",
            SourceName::MapsSecondary => "maps_secondary",
            SourceName::SearchSerp => "search_serp",
            SourceName::Reviews => "reviews",
            SourceName::SignalsSocial => "signals_social",
            SourceName::Registry => "registry",
            SourceName::PageCrawl => "page_crawl",
            SourceName::GenericWeb => "generic_web",
            SourceName::Demographics => "demographics",
            SourceName::BizRegistry => "biz_registry",
            SourceName::StateRegistry => "state_registry",
            SourceName::Manual => "manual",
        }
    }

    pub fn from_str_loose(s: &str) -> Option<SourceName> {
        match s.trim().to_lowercase().as_str() {
            "maps_primary" => Some(SourceName::MapsPrimary),
            "maps_secondary" => Some(SourceName::MapsSecondary),
            "search_serp" => Some(SourceName::SearchSerp),
            "reviews" => Some(SourceName::Reviews),
            "signals_social" => Some(SourceName::SignalsSocial),
            "registry" => Some(SourceName::Registry),
            "page_crawl" => Some(SourceName::PageCrawl),
            "generic_web" => Some(SourceName::GenericWeb),
            "demographics" => Some(SourceName::Demographics),
            "biz_registry" => Some(SourceName::BizRegistry),
            "state_registry" => Some(SourceName::StateRegistry),
            "manual" => Some(SourceName::Manual),
            _ => None,
        }
    }

    /// Default adapter set used when the request omits `crawl_sources`.
    pub fn default_crawl_set() -> Vec<SourceName> {
        vec![SourceName::MapsSecondary, SourceName::SearchSerp, SourceName::Reviews]
    }
}

/// Data quality banding, ordered worst-to-best for comparisons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataQuality {
    Poor,
    Low,
    Medium,
    High,
}

impl DataQuality {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataQuality::Poor => "poor",
            DataQuality::Low => "low",
            DataQuality::Medium => "medium",
            DataQuality::High => "high",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
    pub source: String,
    /// Confidence in [0, 1].
    pub accuracy: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AddressInfo {
    pub raw: Option<String>,
    pub street_number: Option<String>,
    pub street_name: Option<String>,
    pub city: Option<String>,
    /// Two-letter state code.
    pub state: Option<String>,
    /// 5 or 9 digit zip.
    pub zip: Option<String>,
    pub formatted: Option<String>,
    pub coordinates: Option<Coordinates>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContactInfo {
    pub phone: Option<String>,
    pub phone_national_format: Option<String>,
    pub phone_valid: bool,
    pub email: Option<String>,
    pub email_valid: bool,
    pub website: Option<String>,
    pub website_valid: bool,
}

impl ContactInfo {
    pub fn has_any(&self) -> bool {
        self.phone.is_some() || self.email.is_some() || self.website.is_some()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BusinessMetrics {
    pub rating: Option<f64>,
    pub review_count: Option<u64>,
    pub estimated_revenue: Option<u64>,
    pub employee_count: Option<u64>,
    pub years_in_business: Option<u64>,
    pub succession_risk: Option<f64>,
    pub owner_age_estimate: Option<u32>,
    pub market_share_percent: Option<f64>,
    pub lead_score: Option<f64>,
    pub digital_presence_score: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OwnerInfo {
    pub name: Option<String>,
    pub age_estimate: Option<u32>,
    pub detection_source: String,
    /// Confidence in [0, 1].
    pub confidence: f64,
}

/// Blocks attached by the Enricher's five passes (spec §4.4). Each starts
/// `None` and is filled independently; a failed pass simply leaves its slot
/// empty rather than poisoning the others.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EnrichmentData {
    pub demographic_data: Option<serde_json::Value>,
    pub market_context: Option<serde_json::Value>,
    pub registry_data: Option<serde_json::Value>,
    pub state_registry_data: Option<serde_json::Value>,
    pub nlp_analysis: Option<serde_json::Value>,
    pub market_intelligence: Option<serde_json::Value>,
}

/// An immutable per-source snapshot attached to a `Business` after fusion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceRecord {
    pub source: SourceName,
    pub extracted_at: DateTime<Utc>,
    /// Confidence in [0, 1]; base reliability × completeness factor.
    pub confidence: f64,
    pub quality: DataQuality,
    /// Opaque raw per-source payload, preserved only for provenance.
    pub raw: serde_json::Value,
}

/// The canonical, fused business entity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Business {
    pub business_id: String,
    pub external_ids: HashMap<String, String>,

    pub name: String,
    pub category: Category,
    pub industry: Option<String>,
    pub naics_code: Option<String>,

    pub address: AddressInfo,
    pub contact: ContactInfo,
    pub metrics: BusinessMetrics,
    pub owner: Option<OwnerInfo>,

    pub data_sources: Vec<SourceRecord>,
    pub overall_quality: DataQuality,
    pub last_updated: DateTime<Utc>,

    #[serde(default)]
    pub enrichment: EnrichmentData,

    pub tags: BTreeSet<String>,
    pub notes: Vec<String>,
}

impl Business {
    pub fn data_source_names(&self) -> Vec<SourceName> {
        let mut seen = BTreeSet::new();
        let mut out = Vec::new();
        for r in &self.data_sources {
            if seen.insert(r.source.as_str()) {
                out.push(r.source);
            }
        }
        out
    }

    pub fn is_fallback(&self) -> bool {
        self.tags.contains("fallback_minimal")
    }
}
