//! Normalizer (spec §4.3): converts heterogeneous raw per-source records into
//! canonical `Business` entities, then merges near-duplicates across
//! sources. Never panics; a malformed record is dropped with a `warn!`.
//!
//! Written in an idiomatic-Rust "parse, don't validate" style: each
//! sub-parser returns `Option`/bool rather than throwing and being caught.

use std::collections::{BTreeSet, HashMap};

use chrono::Utc;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use sha2::{Digest, Sha256};
use tracing::warn;

use crate::model::{
    AddressInfo, Business, BusinessMetrics, Category, ContactInfo, Coordinates, DataQuality,
    EnrichmentData, OwnerInfo, SourceName, SourceRecord,
};
use crate::priors::{revenue_from_rating, SOURCE_RELIABILITY};

/// Keyword -> category mapping (spec §4.3 step 3), checked in table order so
/// earlier keywords win on overlapping substrings, matching the original's
/// dict-iteration-order behavior.
const CATEGORY_KEYWORDS: &[(&str, Category)] = &[
    ("hvac", Category::Hvac),
    ("heating", Category::Hvac),
    ("cooling", Category::Hvac),
    ("air conditioning", Category::Hvac),
    ("plumbing", Category::Plumbing),
    ("plumber", Category::Plumbing),
    ("electrical", Category::Electrical),
    ("electrician", Category::Electrical),
    ("landscap", Category::Landscaping),
    ("lawn", Category::Landscaping),
    ("garden", Category::Landscaping),
    ("restaurant", Category::Restaurant),
    ("food", Category::Restaurant),
    ("dining", Category::Restaurant),
    ("retail", Category::Retail),
    ("store", Category::Retail),
    ("shop", Category::Retail),
    ("healthcare", Category::Healthcare),
    ("medical", Category::Healthcare),
    ("health", Category::Healthcare),
    ("automotive", Category::Automotive),
    ("auto", Category::Automotive),
    ("car", Category::Automotive),
    ("construction", Category::Construction),
    ("contractor", Category::Construction),
    ("builder", Category::Construction),
    ("manufacturing", Category::Manufacturing),
    ("factory", Category::Manufacturing),
    // Professional-services keywords folded into Services per DESIGN.md
    // rather than growing the closed enum (spec §9 open question).
    ("accounting", Category::Services),
    ("legal", Category::Services),
    ("law", Category::Services),
    ("consulting", Category::Services),
    ("tax", Category::Services),
    ("services", Category::Services),
];

static STREET_SUFFIX_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(Street|St|Avenue|Ave|Road|Rd|Boulevard|Blvd|Drive|Dr|Court|Ct|Lane|Ln|Way|Place|Pl|Parkway|Pkwy|Highway|Hwy)\b")
        .expect("static pattern")
});
static STREET_NUMBER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{1,6})\s+(.*)$").expect("static pattern"));
static ZIP_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(\d{5}(?:-\d{4})?)\b").expect("static pattern"));
static STATE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b([A-Z]{2})\b").expect("static pattern"));
static NON_WORD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\s]").expect("static pattern"));
static NON_ALNUM_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w]").expect("static pattern"));
static NAME_DISALLOWED_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\w\s&\-.,]").expect("static pattern"));
static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("static pattern"));
static NON_DIGIT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\d]").expect("static pattern"));
static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("static pattern"));
static URL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^https?://(?:(?:[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?\.)+[a-z]{2,6}\.?|localhost|\d{1,3}\.\d{1,3}\.\d{1,3}\.\d{1,3})(?::\d+)?(?:/?|[/?]\S+)$")
        .expect("static pattern")
});

fn str_field(raw: &Value, key: &str) -> Option<String> {
    raw.get(key).and_then(Value::as_str).map(str::to_string)
}

fn num_field(raw: &Value, key: &str) -> Option<f64> {
    raw.get(key).and_then(Value::as_f64)
}

/// Normalize one raw per-source record into a canonical `Business`, or
/// `None` if the record lacks a usable name (spec §4.3: "a per-record
/// normalization error never aborts the batch; the record is dropped").
pub fn normalize_record(source: SourceName, raw: &Value) -> Option<Business> {
    let raw_name = str_field(raw, "name").or_else(|| str_field(raw, "business_name"))?;
    let name = normalize_business_name(&raw_name);
    if name.is_empty() {
        warn!(source = source.as_str(), "dropping record with empty normalized name");
        return None;
    }

    let category_input = str_field(raw, "industry")
        .or_else(|| str_field(raw, "category"))
        .or_else(|| {
            raw.get("categories").map(|c| match c {
                Value::Array(arr) => arr.iter().filter_map(Value::as_str).collect::<Vec<_>>().join(" "),
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
        })
        .unwrap_or_default();
    let category = normalize_category(&category_input);

    let raw_address = str_field(raw, "address");
    let address = normalize_address(raw_address.as_deref(), raw.get("coordinates"));
    let contact = normalize_contact(raw);
    let metrics = normalize_metrics(raw);
    let owner = normalize_owner(raw);

    let business_id = generate_business_id(&raw_name, raw_address.as_deref().unwrap_or(""), contact.phone.as_deref().unwrap_or(""));

    let confidence = calculate_confidence_score(raw, source);
    let quality = assess_data_quality(raw);

    let mut external_ids = HashMap::new();
    let external_id = str_field(raw, "id").unwrap_or_else(|| business_id.clone());
    external_ids.insert(source.as_str().to_string(), external_id);

    let now = Utc::now();
    Some(Business {
        business_id,
        external_ids,
        name,
        category,
        industry: str_field(raw, "industry"),
        naics_code: str_field(raw, "naics_code").or_else(|| str_field(raw, "NAICS")),
        address,
        contact,
        metrics,
        owner,
        data_sources: vec![SourceRecord { source, extracted_at: now, confidence, quality, raw: raw.clone() }],
        overall_quality: quality,
        last_updated: now,
        tags: BTreeSet::new(),
        notes: Vec::new(),
    })
}

/// `business_id` generation (spec §4.3 step 1): deterministic sha256 of
/// normalized (name, address, digits-only phone), truncated to 12 hex chars
/// and prefixed `biz_`. sha256 rather than md5, since only a deterministic
/// and stable hash is required, not a specific algorithm.
pub fn generate_business_id(name: &str, address: &str, phone: &str) -> String {
    let clean_name = NON_WORD_RE.replace_all(&name.to_lowercase(), "").trim().to_string();
    let clean_address = NON_WORD_RE.replace_all(&address.to_lowercase(), "").trim().to_string();
    let clean_phone = NON_DIGIT_RE.replace_all(phone, "").to_string();

    let hash_input = format!("{clean_name}|{clean_address}|{clean_phone}");
    let mut hasher = Sha256::new();
    hasher.update(hash_input.as_bytes());
    let digest = hasher.finalize();
    let hex = hex::encode(digest);
    format!("biz_{}", &hex[..12])
}

fn normalize_business_name(name: &str) -> String {
    let collapsed = WHITESPACE_RE.replace_all(name.trim(), " ");
    NAME_DISALLOWED_RE.replace_all(&collapsed, "").to_string()
}

/// Category mapping (spec §4.3 step 3): case-insensitive keyword lookup over
/// the fixed vocabulary above, default `Other`.
pub fn normalize_category(input: &str) -> Category {
    if input.is_empty() {
        return Category::Other;
    }
    let lower = input.to_lowercase();
    for (keyword, category) in CATEGORY_KEYWORDS {
        if lower.contains(keyword) {
            return *category;
        }
    }
    Category::Other
}

/// Address parsing (spec §4.3 step 4): street line by leading number or
/// suffix token, city, 2-letter state, zip.
fn normalize_address(raw_address: Option<&str>, coordinates: Option<&Value>) -> AddressInfo {
    let mut address = AddressInfo { raw: raw_address.map(str::to_string), ..Default::default() };

    if let Some(raw) = raw_address {
        let trimmed = raw.trim();
        if let Some(first_seg) = trimmed.split(',').next() {
            let first_seg = first_seg.trim();
            let looks_like_street =
                STREET_NUMBER_RE.is_match(first_seg) || STREET_SUFFIX_RE.is_match(first_seg);
            if looks_like_street {
                if let Some(caps) = STREET_NUMBER_RE.captures(first_seg) {
                    address.street_number = Some(caps[1].to_string());
                    address.street_name = Some(caps[2].trim().to_string());
                } else {
                    address.street_name = Some(first_seg.to_string());
                }
            }
        }

        if let Some(caps) = ZIP_RE.captures(trimmed) {
            address.zip = Some(caps[1].to_string());
        }
        if let Some(caps) = STATE_RE.captures(trimmed) {
            let state = caps[1].to_string();
            let city_re = Regex::new(&format!(r"([^,]+),\s*{state}")).ok();
            if let Some(re) = city_re {
                if let Some(c) = re.captures(trimmed) {
                    address.city = Some(c[1].trim().to_string());
                }
            }
            address.state = Some(state);
        }
        address.formatted = Some(raw.to_string());
    }

    if let Some(coords) = coordinates.and_then(Value::as_array) {
        if coords.len() >= 2 {
            if let (Some(lat), Some(lng)) = (coords[0].as_f64(), coords[1].as_f64()) {
                address.coordinates = Some(Coordinates { lat, lng, source: "crawler_data".to_string(), accuracy: 0.8 });
            }
        }
    }

    address
}

/// Contact normalization (spec §4.3 step 5). Phone formatting is a
/// simplified `(NXX) NXX-XXXX` reformat of 10 US digits (see SPEC_FULL.md
/// §4.3: exact libphonenumber parsing is a documented scope cut).
fn normalize_contact(raw: &Value) -> ContactInfo {
    let mut contact = ContactInfo::default();

    if let Some(phone) = str_field(raw, "phone") {
        if !phone.trim().is_empty() {
            let (formatted, valid) = validate_phone(&phone);
            contact.phone = Some(phone);
            contact.phone_national_format = formatted;
            contact.phone_valid = valid;
        }
    }
    if let Some(email) = str_field(raw, "email") {
        if !email.trim().is_empty() {
            contact.email_valid = EMAIL_RE.is_match(&email);
            contact.email = Some(email);
        }
    }
    if let Some(website) = str_field(raw, "website") {
        if !website.trim().is_empty() {
            contact.website_valid = URL_RE.is_match(&website);
            contact.website = Some(website);
        }
    }

    contact
}

fn validate_phone(phone: &str) -> (Option<String>, bool) {
    let digits: String = phone.chars().filter(char::is_ascii_digit).collect();
    let ten = if digits.len() == 11 && digits.starts_with('1') {
        Some(digits[1..].to_string())
    } else if digits.len() == 10 {
        Some(digits)
    } else {
        None
    };
    match ten {
        Some(d) => {
            let formatted = format!("({}) {}-{}", &d[0..3], &d[3..6], &d[6..10]);
            (Some(formatted), true)
        }
        None => (None, false),
    }
}

/// Metric normalization + clamp (spec §4.3 step 6). Malformed values are
/// silently dropped; revenue falls back to the consolidated
/// `priors::revenue_from_rating` when the raw record omits it.
fn normalize_metrics(raw: &Value) -> BusinessMetrics {
    let rating = num_field(raw, "rating").or_else(|| num_field(raw, "avg_rating")).map(|r| r.clamp(0.0, 5.0));
    let review_count = num_field(raw, "review_count").map(|v| v.max(0.0) as u64);
    let estimated_revenue = num_field(raw, "estimated_revenue")
        .map(|v| v.max(0.0) as u64)
        .or_else(|| revenue_from_rating(rating, review_count));
    let employee_count = num_field(raw, "employee_count").map(|v| v.max(0.0) as u64);
    let years_in_business = num_field(raw, "years_in_business").map(|v| v.max(0.0) as u64);
    let owner_age_estimate =
        num_field(raw, "owner_age_estimate").map(|v| v.clamp(18.0, 100.0) as u32);
    let market_share_percent = num_field(raw, "market_share_percent").map(|v| v.clamp(0.0, 100.0));

    BusinessMetrics {
        rating,
        review_count,
        estimated_revenue,
        employee_count,
        years_in_business,
        succession_risk: None,
        owner_age_estimate,
        market_share_percent,
        lead_score: None,
        digital_presence_score: None,
    }
}

/// Owner derivation (spec §4.3 step 7): only attached when the raw record
/// names an owner.
fn normalize_owner(raw: &Value) -> Option<OwnerInfo> {
    let name = str_field(raw, "owner_name")?;
    if name.trim().is_empty() {
        return None;
    }
    Some(OwnerInfo {
        name: Some(name),
        age_estimate: num_field(raw, "owner_age_estimate").map(|v| v.clamp(18.0, 100.0) as u32),
        detection_source: "source_record".to_string(),
        confidence: 0.7,
    })
}

/// Confidence score (spec §4.3 source-reliability table): base reliability
/// * completeness factor, clamped to [0,1].
fn calculate_confidence_score(raw: &Value, source: SourceName) -> f64 {
    let base = *SOURCE_RELIABILITY.get(&source).unwrap_or(&0.5);
    let (present, total) = match raw.as_object() {
        Some(map) => {
            let total = map.len();
            let present = map.values().filter(|v| !v.is_null() && *v != &Value::String(String::new())).count();
            (present, total)
        }
        None => (0, 0),
    };
    let completeness = if total > 0 { present as f64 / total as f64 } else { 0.0 };
    (base * (0.5 + 0.5 * completeness)).clamp(0.0, 1.0)
}

/// Data-quality banding (spec §4.3 step 8): three field groups, each
/// weighted, mapped to high/medium/low/poor.
fn assess_data_quality(raw: &Value) -> DataQuality {
    let has = |key: &str| raw.get(key).map(|v| !v.is_null()).unwrap_or(false);

    let required = ["name", "address", "phone"];
    let required_score = required.iter().filter(|k| has(k)).count() as f64 / required.len() as f64;

    let metrics = ["rating", "review_count", "estimated_revenue"];
    let metrics_score = metrics.iter().filter(|k| has(k)).count() as f64 / metrics.len() as f64;

    let additional = ["website", "owner_name", "years_in_business"];
    let additional_score = additional.iter().filter(|k| has(k)).count() as f64 / additional.len() as f64;

    let quality_score = required_score * 0.4 + metrics_score * 0.3 + additional_score * 0.3;

    if quality_score >= 0.8 {
        DataQuality::High
    } else if quality_score >= 0.6 {
        DataQuality::Medium
    } else if quality_score >= 0.4 {
        DataQuality::Low
    } else {
        DataQuality::Poor
    }
}

/// Similarity key for duplicate merge (spec §4.3): normalized name + zip5 or
/// first-10-chars-of-city.
fn similarity_key(business: &Business) -> String {
    let name_clean = NON_ALNUM_RE.replace_all(&business.name.to_lowercase(), "").to_string();
    let location_key = if let Some(zip) = &business.address.zip {
        zip.chars().take(5).collect::<String>()
    } else if let Some(city) = &business.address.city {
        NON_ALNUM_RE.replace_all(&city.to_lowercase(), "").chars().take(10).collect()
    } else {
        String::new()
    };
    format!("{name_clean}_{location_key}")
}

fn quality_rank(q: DataQuality) -> u8 {
    match q {
        DataQuality::Poor => 0,
        DataQuality::Low => 1,
        DataQuality::Medium => 2,
        DataQuality::High => 3,
    }
}

/// Merge `incoming` into `existing` in place (spec §4.3 duplicate merge):
/// external_ids unioned, SourceRecords concatenated, missing contact/metric
/// fields filled from the incoming record when its quality is `>=` the
/// existing entity's, `last_updated` refreshed. Idempotent: merging an
/// already-merged entity with itself changes nothing but `last_updated`.
fn merge_into(existing: &mut Business, mut incoming: Business) {
    for (k, v) in incoming.external_ids.drain() {
        existing.external_ids.entry(k).or_insert(v);
    }
    existing.data_sources.append(&mut incoming.data_sources);

    let incoming_at_least_as_good = quality_rank(incoming.overall_quality) >= quality_rank(existing.overall_quality);
    if incoming_at_least_as_good {
        if existing.contact.phone.is_none() && incoming.contact.phone.is_some() {
            existing.contact.phone = incoming.contact.phone;
            existing.contact.phone_national_format = incoming.contact.phone_national_format;
            existing.contact.phone_valid = incoming.contact.phone_valid;
        }
        if existing.contact.email.is_none() && incoming.contact.email.is_some() {
            existing.contact.email = incoming.contact.email;
            existing.contact.email_valid = incoming.contact.email_valid;
        }
        if existing.contact.website.is_none() && incoming.contact.website.is_some() {
            existing.contact.website = incoming.contact.website;
            existing.contact.website_valid = incoming.contact.website_valid;
        }
        if existing.metrics.estimated_revenue.is_none() {
            existing.metrics.estimated_revenue = incoming.metrics.estimated_revenue;
        }
        if existing.metrics.rating.is_none() {
            existing.metrics.rating = incoming.metrics.rating;
        }
        if existing.metrics.review_count.is_none() {
            existing.metrics.review_count = incoming.metrics.review_count;
        }
        if existing.metrics.employee_count.is_none() {
            existing.metrics.employee_count = incoming.metrics.employee_count;
        }
        if existing.metrics.years_in_business.is_none() {
            existing.metrics.years_in_business = incoming.metrics.years_in_business;
        }
        if existing.address.zip.is_none() {
            existing.address.zip = incoming.address.zip;
        }
        if existing.address.coordinates.is_none() {
            existing.address.coordinates = incoming.address.coordinates;
        }
        if existing.owner.is_none() && incoming.owner.is_some() {
            existing.owner = incoming.owner;
        }
        if quality_rank(incoming.overall_quality) > quality_rank(existing.overall_quality) {
            existing.overall_quality = incoming.overall_quality;
        }
    }

    existing.last_updated = Utc::now();
}

/// Full normalization pipeline entry point (spec §4.3): flatten every
/// successful source bundle's raw records into canonical businesses, merge
/// duplicates, and sort by (overall_quality desc, lead_score desc).
pub fn normalize_crawl_results(results: &[crate::model::SourceCrawlResult]) -> Vec<Business> {
    let mut normalized = Vec::new();
    for result in results {
        if !result.success {
            continue;
        }
        for raw in &result.data {
            match normalize_record(result.source_name, raw) {
                Some(business) => normalized.push(business),
                None => warn!(source = result.source_name.as_str(), "dropping unnormalizable record"),
            }
        }
    }

    merge_duplicates(normalized)
}

fn merge_duplicates(businesses: Vec<Business>) -> Vec<Business> {
    let mut merged: Vec<Business> = Vec::new();
    let mut index_by_key: HashMap<String, usize> = HashMap::new();

    for business in businesses {
        let key = similarity_key(&business);
        if let Some(&idx) = index_by_key.get(&key) {
            let existing = std::mem::replace(
                &mut merged[idx],
                // Placeholder swapped back in immediately below; avoids a clone.
                Business {
                    business_id: String::new(),
                    external_ids: HashMap::new(),
                    name: String::new(),
                    category: Category::Other,
                    industry: None,
                    naics_code: None,
                    address: AddressInfo::default(),
                    contact: ContactInfo::default(),
                    metrics: BusinessMetrics::default(),
                    owner: None,
                    data_sources: Vec::new(),
                    overall_quality: DataQuality::Poor,
                    last_updated: Utc::now(),
                    enrichment: EnrichmentData::default(),
                    tags: BTreeSet::new(),
                    notes: Vec::new(),
                },
            );
            let mut existing = existing;
            merge_into(&mut existing, business);
            merged[idx] = existing;
        } else {
            index_by_key.insert(key, merged.len());
            merged.push(business);
        }
    }

    merged.sort_by(|a, b| {
        quality_rank(b.overall_quality)
            .cmp(&quality_rank(a.overall_quality))
            .then_with(|| {
                b.metrics
                    .lead_score
                    .unwrap_or(0.0)
                    .partial_cmp(&a.metrics.lead_score.unwrap_or(0.0))
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
    });
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn business_id_is_deterministic() {
        let a = generate_business_id("Joe's HVAC!", "123 Main St, Boston, MA 02118", "(617) 555-0100");
        let b = generate_business_id("Joe's HVAC!", "123 Main St, Boston, MA 02118", "(617) 555-0100");
        assert_eq!(a, b);
        assert!(a.starts_with("biz_"));
        assert_eq!(a.len(), 16);
    }

    #[test]
    fn category_maps_known_keywords_and_defaults_to_other() {
        assert_eq!(normalize_category("HVAC repair"), Category::Hvac);
        assert_eq!(normalize_category("Accounting Firm"), Category::Services);
        assert_eq!(normalize_category("something unrelated"), Category::Other);
        assert_eq!(normalize_category(""), Category::Other);
    }

    #[test]
    fn address_parse_round_trips_components() {
        let addr = normalize_address(Some("123 Main St, Boston, MA 02118"), None);
        assert_eq!(addr.street_number.as_deref(), Some("123"));
        assert_eq!(addr.city.as_deref(), Some("Boston"));
        assert_eq!(addr.state.as_deref(), Some("MA"));
        assert_eq!(addr.zip.as_deref(), Some("02118"));
    }

    #[test]
    fn quality_monotonic_in_field_coverage() {
        let sparse = json!({"name": "Joe's", "address": "123 Main St"});
        let rich = json!({
            "name": "Joe's", "address": "123 Main St", "phone": "6175550100",
            "rating": 4.5, "review_count": 100, "estimated_revenue": 500000,
            "website": "https://joes.example", "owner_name": "Joe", "years_in_business": 12
        });
        assert!(quality_rank(assess_data_quality(&rich)) >= quality_rank(assess_data_quality(&sparse)));
    }

    #[test]
    fn normalize_record_drops_nameless_records() {
        let raw = json!({"address": "123 Main St"});
        assert!(normalize_record(SourceName::MapsSecondary, &raw).is_none());
    }

    #[test]
    fn merge_is_idempotent_for_identical_records() {
        let raw = json!({
            "name": "Joe's HVAC", "address": "123 Main St, Boston, MA 02118",
            "phone": "6175550100", "rating": 4.5, "review_count": 50,
        });
        let a = normalize_record(SourceName::MapsSecondary, &raw).unwrap();
        let b = normalize_record(SourceName::MapsSecondary, &raw).unwrap();
        let merged = merge_duplicates(vec![a, b]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].data_sources.len(), 2);
    }

    #[test]
    fn phone_validation_formats_ten_us_digits() {
        let (formatted, valid) = validate_phone("617-555-0100");
        assert!(valid);
        assert_eq!(formatted.as_deref(), Some("(617) 555-0100"));
        let (formatted2, valid2) = validate_phone("not a phone");
        assert!(!valid2);
        assert!(formatted2.is_none());
    }
}
