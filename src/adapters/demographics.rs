//! `DEMOGRAPHICS` adapter (spec §4.1): median income, population, median age,
//! education share, unemployment, per-capita income, and an estimated
//! business count for a zip/area.
//!
//! Backed by a real call to the Census Bureau's ACS 5-year API
//! (`api.census.gov`), which needs no key for low-volume lookups.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use crate::adapters::{fail_result, get_with_retry, ok_result, seeded_unit_interval, AdapterRequest, SourceAdapter};
use crate::error::AdapterError;
use crate::model::{SourceCrawlResult, SourceName};

const ACS_BASE: &str = "https://api.census.gov/data/2021/acs/acs5";

pub struct DemographicsAdapter {
    client: Client,
    api_key: Option<String>,
}

impl DemographicsAdapter {
    pub fn new(client: Client) -> Self {
        Self { client, api_key: std::env::var("CENSUS_API_KEY").ok() }
    }

    /// Look up demographic data for a 5-digit zip. Used directly by the
    /// enricher (spec §4.4) as well as by `fetch` when a crawl request
    /// carries a `zip` extra.
    pub async fn lookup_zip(&self, zip: &str) -> Result<Value, AdapterError> {
        let zip = &zip[..zip.len().min(5)];
        let fields = "B19013_001E,B01003_001E,B01002_001E,B15003_022E,B15003_001E,B23025_005E,B23025_003E,B19301_001E";
        let mut query: Vec<(&str, String)> = vec![
            ("get", fields.to_string()),
            ("for", format!("zip code tabulation area:{zip}")),
        ];
        if let Some(key) = &self.api_key {
            query.push(("key", key.clone()));
        }

        let rows = get_with_retry(
            &self.client,
            SourceName::Demographics,
            ACS_BASE,
            &query,
            2,
            Duration::from_secs(15),
        )
        .await?;

        parse_acs_response(&rows, zip)
    }
}

/// The ACS API returns `[[header...], [values...]]`; pull out the row we
/// asked for and shape it into the common demographic record.
fn parse_acs_response(rows: &Value, zip: &str) -> Result<Value, AdapterError> {
    let arr = rows.as_array().ok_or_else(|| AdapterError::PayloadMalformed {
        source_name: SourceName::Demographics.as_str().to_string(),
        detail: "expected a 2D array response".to_string(),
    })?;
    let data_row = arr.get(1).and_then(|r| r.as_array()).ok_or_else(|| AdapterError::PayloadMalformed {
        source_name: SourceName::Demographics.as_str().to_string(),
        detail: "no data row returned".to_string(),
    })?;

    let get_f64 = |idx: usize| -> Option<f64> { data_row.get(idx)?.as_str()?.parse::<f64>().ok() };

    let median_income = get_f64(0);
    let population = get_f64(1);
    let median_age = get_f64(2);
    let bachelor_plus = get_f64(3);
    let education_total = get_f64(4);
    let unemployed = get_f64(5);
    let labor_force = get_f64(6);
    let per_capita_income = get_f64(7);

    let education_share = match (bachelor_plus, education_total) {
        (Some(b), Some(t)) if t > 0.0 => Some((b / t) * 100.0),
        _ => None,
    };
    let unemployment_rate = match (unemployed, labor_force) {
        (Some(u), Some(l)) if l > 0.0 => Some((u / l) * 100.0),
        _ => None,
    };
    // Census doesn't give a direct business-count figure in this ACS table;
    // approximate from population using a fixed businesses-per-capita prior.
    let business_count_estimate = population.map(|p| (p / 29.0).round());

    Ok(json!({
        "zip_code": zip,
        "median_household_income": median_income,
        "population": population,
        "median_age": median_age,
        "education_bachelor_plus_pct": education_share,
        "unemployment_rate": unemployment_rate,
        "per_capita_income": per_capita_income,
        "business_count_estimate": business_count_estimate,
        "source": "US_Census_Bureau",
    }))
}

/// Deterministic stand-in used when the live ACS call fails (e.g. offline
/// test runs) — keeps the enricher's downstream math exercised without
/// requiring network access, the same "synthesize a stand-in" pattern used
/// elsewhere for adapters.
pub fn synthesize(zip: &str) -> Value {
    let r = |salt: u64| seeded_unit_interval(zip, salt);
    json!({
        "zip_code": zip,
        "median_household_income": 45000.0 + r(1) * 60000.0,
        "population": 5000.0 + r(2) * 80000.0,
        "median_age": 28.0 + r(3) * 25.0,
        "education_bachelor_plus_pct": 10.0 + r(4) * 50.0,
        "unemployment_rate": 2.0 + r(5) * 8.0,
        "per_capita_income": 20000.0 + r(6) * 40000.0,
        "business_count_estimate": (200.0 + r(7) * 2000.0).round(),
        "source": "synthetic_demographics",
    })
}

#[async_trait]
impl SourceAdapter for DemographicsAdapter {
    fn source_name(&self) -> SourceName {
        SourceName::Demographics
    }

    async fn fetch(&self, request: &AdapterRequest) -> SourceCrawlResult {
        let zip = request.params.extra.get("zip").cloned();
        let Some(zip) = zip else {
            return fail_result(
                SourceName::Demographics,
                vec![AdapterError::PayloadMalformed {
                    source_name: SourceName::Demographics.as_str().to_string(),
                    detail: "no zip code supplied for demographic lookup".to_string(),
                }],
            );
        };

        match self.lookup_zip(&zip).await {
            Ok(record) => {
                let mut metadata = HashMap::new();
                metadata.insert("zip".to_string(), json!(zip));
                ok_result(SourceName::Demographics, vec![record], metadata)
            }
            Err(e) => fail_result(SourceName::Demographics, vec![e]),
        }
    }
}
