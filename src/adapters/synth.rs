//! Deterministic stand-in business generation, used by `SEARCH_SERP` as a
//! last resort (spec §4.1) and by the orchestrator's fallback mode
//! (spec §4.6.1). Both need the same "small deterministic set seeded from
//! the query" behavior, so it lives in one place.

use serde_json::{json, Value};

use crate::adapters::seeded_unit_interval;

/// A short industry-name vocabulary used to build deterministic business
/// names. Not the category enum — just naming flavor.
fn industry_noun(industry: &str) -> &'static str {
    let industry = industry.to_lowercase();
    if industry.contains("hvac") || industry.contains("air") || industry.contains("heat") {
        "HVAC"
    } else if industry.contains("plumb") {
        "Plumbing"
    } else if industry.contains("electric") {
        "Electric"
    } else if industry.contains("landscap") || industry.contains("lawn") {
        "Landscaping"
    } else if industry.contains("restaurant") || industry.contains("food") {
        "Kitchen"
    } else if industry.contains("auto") || industry.contains("car") {
        "Auto"
    } else if industry.contains("construct") || industry.contains("contract") {
        "Builders"
    } else {
        "Services"
    }
}

/// Synthesize `count` minimal business dictionaries near `(lat, lng)`,
/// deterministic given `(location, industry, count)`.
pub fn synthesize_businesses(
    location: &str,
    industry: Option<&str>,
    lat: f64,
    lng: f64,
    count: usize,
) -> Vec<Value> {
    let industry = industry.unwrap_or("business");
    let noun = industry_noun(industry);
    let mut out = Vec::with_capacity(count);

    for i in 0..count {
        let seed = format!("{location}|{industry}|{i}");
        let r1 = seeded_unit_interval(&seed, 1);
        let r2 = seeded_unit_interval(&seed, 2);
        let r3 = seeded_unit_interval(&seed, 3);

        let name = format!("{} {} #{}", capitalize_words(location), noun, i + 1);
        let lat_off = (r1 - 0.5) * 0.08;
        let lng_off = (r2 - 0.5) * 0.08;
        let rating = 3.2 + r3 * 1.6;
        let review_count = 10 + (r1 * 200.0) as u64;
        let revenue = 300_000.0 + r2 * 1_800_000.0;

        out.push(json!({
            "name": name,
            "address": format!("{} area", location),
            "phone": null,
            "website": null,
            "rating": rating,
            "review_count": review_count,
            "estimated_revenue": revenue as u64,
            "employee_count": 3 + (r3 * 20.0) as u64,
            "years_in_business": 2 + (r1 * 25.0) as u64,
            "coordinates": [lat + lat_off, lng + lng_off],
            "source": "synthetic_stand_in",
        }));
    }
    out
}

fn capitalize_words(s: &str) -> String {
    s.split_whitespace()
        .map(|w| {
            let mut c = w.chars();
            match c.next() {
                Some(f) => f.to_uppercase().collect::<String>() + c.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Deterministic fallback coordinate used when geocoding is unavailable —
/// centered on the continental US (spec §4.6.1: "≥1 fallback default
/// coordinate").
pub const FALLBACK_COORDINATE: (f64, f64) = (39.8283, -98.5795);
