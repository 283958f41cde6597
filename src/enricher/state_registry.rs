//! State-registry enrichment pass (spec §4.4): `business_type`, registration
//! status, years-since-registration, and a compliance label from the
//! `STATE_REGISTRY` adapter; fills `years_in_business` when absent.

use chrono::{Datelike, Utc};
use serde_json::json;

use crate::adapters::AdapterRegistry;
use crate::error::PipelineError;
use crate::model::Business;

pub async fn enrich(adapters: &AdapterRegistry, business: &mut Business) -> Result<bool, PipelineError> {
    let Some(state) = business.address.state.clone() else {
        return Ok(false);
    };

    let record = adapters.state_registry.lookup(&business.name, &state).await;

    let years_since_registration = record
        .get("registration_date")
        .and_then(|v| v.as_str())
        .and_then(|d| d.get(0..4))
        .and_then(|y| y.parse::<i32>().ok())
        .map(|year| (Utc::now().year() - year).max(0) as u64);

    if business.metrics.years_in_business.is_none() {
        business.metrics.years_in_business = years_since_registration;
    }

    let status = record.get("status").and_then(|v| v.as_str()).unwrap_or("Unknown");
    let compliance_label = if status == "Active" { "compliant" } else { "needs_review" };

    business.enrichment.state_registry_data = Some(json!({
        "business_type": record.get("business_type"),
        "registration_status": status,
        "years_since_registration": years_since_registration,
        "compliance_label": compliance_label,
        "registration_number": record.get("registration_number"),
    }));
    Ok(true)
}
