//! Enricher (spec §4.4): attaches demographic, registry, state-registry,
//! text-analysis, and market-intelligence context to canonical `Business`
//! entities, in bounded concurrent batches with per-entity fallback over a
//! shared adapter registry.

pub mod demographic;
pub mod market_intelligence;
pub mod registry;
pub mod state_registry;
pub mod text;

use std::time::Instant;

use futures_util::stream::{FuturesUnordered, StreamExt};
use tracing::{info_span, warn, Instrument};

use crate::adapters::AdapterRegistry;
use crate::config::PipelineConfig;
use crate::model::{Business, DataQuality, EnrichmentKind};

/// Run the requested enrichment passes over every business,
/// `config.enrichment_batch_size` entities at a time; within one batch the
/// per-entity tasks run concurrently (spec §4.4). A per-entity pass failure
/// degrades only that pass for that entity and never poisons its batch-mates.
pub async fn enrich_businesses(
    adapters: &AdapterRegistry,
    config: &PipelineConfig,
    businesses: Vec<Business>,
    kinds: &[EnrichmentKind],
    deadline: Option<Instant>,
) -> Vec<Business> {
    let batch_size = config.enrichment_batch_size.max(1);
    let mut out = Vec::with_capacity(businesses.len());
    for batch in businesses.chunks(batch_size) {
        out.extend(enrich_batch(adapters, kinds, batch.to_vec(), deadline).await);
    }
    out
}

async fn enrich_batch(
    adapters: &AdapterRegistry,
    kinds: &[EnrichmentKind],
    batch: Vec<Business>,
    deadline: Option<Instant>,
) -> Vec<Business> {
    let mut tasks: FuturesUnordered<_> = batch
        .into_iter()
        .enumerate()
        .map(|(idx, business)| {
            let business_id = business.business_id.clone();
            async move { (idx, enrich_one(adapters, kinds, business, deadline).await) }
                .instrument(info_span!("enrich_business", business_id = %business_id))
        })
        .collect();

    let mut results = Vec::with_capacity(tasks.len());
    while let Some(pair) = tasks.next().await {
        results.push(pair);
    }
    results.sort_by_key(|(idx, _)| *idx);
    results.into_iter().map(|(_, b)| b).collect()
}

async fn enrich_one(
    adapters: &AdapterRegistry,
    kinds: &[EnrichmentKind],
    mut business: Business,
    deadline: Option<Instant>,
) -> Business {
    let mut successes = 0usize;

    for &kind in kinds {
        if let Some(deadline) = deadline {
            if Instant::now() >= deadline {
                business.tags.insert("enrichment_timeout".to_string());
                break;
            }
        }

        let outcome = match kind {
            EnrichmentKind::Demographic => demographic::enrich(adapters, &mut business).await,
            EnrichmentKind::Registry => registry::enrich(adapters, &mut business).await,
            EnrichmentKind::StateRegistry => state_registry::enrich(adapters, &mut business).await,
            EnrichmentKind::TextAnalysis => text::enrich(&mut business).await,
            EnrichmentKind::MarketIntelligence => market_intelligence::enrich(&mut business).await,
        };

        match outcome {
            Ok(true) => {
                business.tags.insert(format!("enriched_with_{}", kind.as_str()));
                successes += 1;
            }
            Ok(false) => {}
            Err(e) => {
                warn!(
                    business_id = %business.business_id,
                    kind = kind.as_str(),
                    error = %e,
                    "enrichment pass failed"
                );
            }
        }
    }

    // Post-condition (spec §4.4): >=3 successful enrichments upgrades to
    // high quality, 2 upgrades to at least medium. Never downgrades.
    if successes >= 3 {
        business.overall_quality = business.overall_quality.max(DataQuality::High);
    } else if successes == 2 {
        business.overall_quality = business.overall_quality.max(DataQuality::Medium);
    }
    business.last_updated = chrono::Utc::now();
    business
}
