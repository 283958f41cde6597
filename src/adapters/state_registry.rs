//! `STATE_REGISTRY` adapter (spec §4.1): registration number, registration
//! date, entity type, status, registered agent.
//!
//! Secretary-of-state registries vary by state and mostly require paid
//! bulk-data contracts, so this is deterministic synthesis seeded from
//! `(name, state)`, same treatment as [[biz_registry]].

use std::collections::HashMap;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use crate::adapters::{fail_result, ok_result, seeded_unit_interval, AdapterRequest, SourceAdapter};
use crate::error::AdapterError;
use crate::model::{SourceCrawlResult, SourceName};

pub struct StateRegistryAdapter {
    #[allow(dead_code)]
    client: Client,
}

impl StateRegistryAdapter {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Direct lookup used by the enricher (spec §4.4) with an already
    /// normalized business name and state abbreviation.
    pub async fn lookup(&self, name: &str, state: &str) -> Value {
        synthesize(name, state)
    }
}

fn synthesize(name: &str, state: &str) -> Value {
    let seed = format!("{name}|{state}|state_registry");
    let r1 = seeded_unit_interval(&seed, 1);
    let r2 = seeded_unit_interval(&seed, 2);
    let r3 = seeded_unit_interval(&seed, 3);

    let entity_types = ["LLC", "Corporation", "Sole Proprietorship", "Partnership"];
    let entity_idx = ((r1 * entity_types.len() as f64) as usize).min(entity_types.len() - 1);
    let reg_year = 1995 + (r2 * 29.0) as i32;
    let reg_month = 1 + (r3 * 11.0) as u32;

    json!({
        "registration_number": format!("{}{:09}", entity_types[entity_idx].chars().next().unwrap_or('R'), (r1 * 999_999_999.0) as u64),
        "registration_date": format!("{reg_year:04}-{reg_month:02}-01"),
        "business_type": entity_types[entity_idx],
        "status": "Active",
        "registered_agent": format!("{state} Registered Agent Services"),
        "principal_address": null,
        "source": "synthetic_state_registry",
    })
}

#[async_trait]
impl SourceAdapter for StateRegistryAdapter {
    fn source_name(&self) -> SourceName {
        SourceName::StateRegistry
    }

    async fn fetch(&self, request: &AdapterRequest) -> SourceCrawlResult {
        let name = request.params.extra.get("name").cloned();
        let state = request.params.extra.get("state").cloned();
        let (Some(name), Some(state)) = (name, state) else {
            return fail_result(
                SourceName::StateRegistry,
                vec![AdapterError::PayloadMalformed {
                    source_name: SourceName::StateRegistry.as_str().to_string(),
                    detail: "name and state both required for state_registry lookup".to_string(),
                }],
            );
        };

        let record = self.lookup(&name, &state).await;
        let mut metadata = HashMap::new();
        metadata.insert("name".to_string(), json!(name));
        ok_result(SourceName::StateRegistry, vec![record], metadata)
    }
}
