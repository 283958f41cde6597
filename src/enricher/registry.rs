//! Registry enrichment pass (spec §4.4): tax-registration and legitimacy
//! flags from the `REGISTRY` adapter, filling `naics_code` when absent.
//! Unlike [[demographic]], a live lookup failure here propagates as a real
//! `PipelineError::EnrichmentError` rather than degrading to a stand-in — the
//! OpenCorporates call can fail for reasons (missing token, rate limit) worth
//! surfacing in the response's `errors` list.

use serde_json::{json, Value};

use crate::adapters::AdapterRegistry;
use crate::error::PipelineError;
use crate::model::Business;

pub async fn enrich(adapters: &AdapterRegistry, business: &mut Business) -> Result<bool, PipelineError> {
    let location_hint = business
        .address
        .zip
        .clone()
        .or_else(|| business.address.city.clone())
        .unwrap_or_else(|| "unknown".to_string());

    let record =
        adapters.registry.lookup_name(&business.name, &location_hint).await.map_err(|e| {
            PipelineError::EnrichmentError {
                kind: "registry".to_string(),
                business_id: business.business_id.clone(),
                detail: e.to_string(),
            }
        })?;

    if business.naics_code.is_none() {
        if let Some(naics) = record.get("naics_code").and_then(Value::as_str) {
            business.naics_code = Some(naics.to_string());
        }
    }

    let legitimacy = json!({
        "licensing_status": record.get("licensing_status").cloned().unwrap_or(Value::Null),
        "tax_registration_active": record.get("licensing_status").and_then(Value::as_str) == Some("Active"),
        "has_sba_loan_record": record.get("has_sba_loan_record").cloned().unwrap_or(Value::Bool(false)),
    });

    business.enrichment.registry_data = Some(json!({ "lookup": record, "legitimacy": legitimacy }));
    Ok(true)
}
