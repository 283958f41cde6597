//! Demographic enrichment pass (spec §4.4): zip → `DEMOGRAPHICS` lookup,
//! attaching `demographic_data` and a derived `market_context` block (income
//! band, maturity label from median age, a one-line composite profile).

use serde_json::{json, Value};

use crate::adapters::AdapterRegistry;
use crate::error::PipelineError;
use crate::model::Business;

const LOW_INCOME_CUTOFF: f64 = 45_000.0;
const HIGH_INCOME_CUTOFF: f64 = 85_000.0;
const YOUNG_MEDIAN_AGE_CUTOFF: f64 = 35.0;
const MATURE_MEDIAN_AGE_CUTOFF: f64 = 48.0;

/// `Ok(false)` when the business has no zip to look up (spec: "missing zip →
/// demographic enrichment returns empty block; downstream consumers tolerate
/// its absence"). A live lookup failure degrades to the adapter's own
/// deterministic stand-in rather than failing the pass outright, mirroring
/// the ACS-unreachable behavior already documented on `DemographicsAdapter`.
pub async fn enrich(adapters: &AdapterRegistry, business: &mut Business) -> Result<bool, PipelineError> {
    let Some(zip) = business.address.zip.clone() else {
        return Ok(false);
    };

    let record = match adapters.demographics.lookup_zip(&zip).await {
        Ok(record) => record,
        Err(_) => crate::adapters::demographics::synthesize(&zip),
    };

    business.enrichment.market_context = Some(build_market_context(&record));
    business.enrichment.demographic_data = Some(record);
    Ok(true)
}

fn build_market_context(record: &Value) -> Value {
    let income = record.get("median_household_income").and_then(Value::as_f64);
    let median_age = record.get("median_age").and_then(Value::as_f64);

    let income_level = match income {
        Some(i) if i >= HIGH_INCOME_CUTOFF => "high",
        Some(i) if i >= LOW_INCOME_CUTOFF => "middle",
        Some(_) => "low",
        None => "unknown",
    };
    let maturity_label = match median_age {
        Some(a) if a <= YOUNG_MEDIAN_AGE_CUTOFF => "young_market",
        Some(a) if a <= MATURE_MEDIAN_AGE_CUTOFF => "balanced_market",
        Some(_) => "mature_market",
        None => "unknown",
    };
    let profile = format!(
        "{income_level}-income, {maturity_label} (median age {})",
        median_age.map(|a| format!("{a:.0}")).unwrap_or_else(|| "n/a".to_string())
    );

    json!({
        "income_level": income_level,
        "maturity_label": maturity_label,
        "demographic_profile": profile,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn market_context_bands_income_and_age() {
        let ctx = build_market_context(&json!({ "median_household_income": 95000.0, "median_age": 30.0 }));
        assert_eq!(ctx["income_level"], "high");
        assert_eq!(ctx["maturity_label"], "young_market");
    }

    #[test]
    fn market_context_tolerates_missing_fields() {
        let ctx = build_market_context(&json!({}));
        assert_eq!(ctx["income_level"], "unknown");
        assert_eq!(ctx["maturity_label"], "unknown");
    }
}
