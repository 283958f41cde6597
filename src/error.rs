//! Error taxonomy (spec §7). Nothing below the orchestrator panics or raises
//! past its boundary; these types exist so internal stage code can use `?`
//! while the orchestrator flattens whatever it observes into `response.errors`.

use thiserror::Error;

/// Errors an adapter can report. Adapters never panic; a failed call returns
/// `Err(AdapterError)` inside a `success: false` result, never propagates.
#[derive(Debug, Clone, Error)]
pub enum AdapterError {
    #[error("{source_name}: missing credentials ({detail})")]
    CredentialsMissing { source_name: String, detail: String },

    #[error("{source_name}: network error after {attempts} attempt(s): {detail}")]
    Network { source_name: String, attempts: u32, detail: String },

    #[error("{source_name}: rate limited")]
    RateLimited { source_name: String },

    #[error("{source_name}: malformed payload: {detail}")]
    PayloadMalformed { source_name: String, detail: String },

    #[error("{source_name}: request timed out after {timeout_secs}s")]
    Timeout { source_name: String, timeout_secs: u64 },
}

impl AdapterError {
    pub fn source_name(&self) -> &str {
        match self {
            AdapterError::CredentialsMissing { source_name, .. }
            | AdapterError::Network { source_name, .. }
            | AdapterError::RateLimited { source_name }
            | AdapterError::PayloadMalformed { source_name, .. }
            | AdapterError::Timeout { source_name, .. } => source_name,
        }
    }

    /// Credential and malformed-payload failures are never worth retrying.
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self,
            AdapterError::CredentialsMissing { .. } | AdapterError::PayloadMalformed { .. }
        )
    }
}

/// Errors a pipeline stage can report internally. The orchestrator is the
/// only place these get turned into user-visible strings.
#[derive(Debug, Clone, Error)]
pub enum PipelineError {
    #[error("normalization: record invalid: {0}")]
    NormalizationRecordInvalid(String),

    #[error("enrichment: {kind} timed out for business {business_id}")]
    EnrichmentTimeout { kind: String, business_id: String },

    #[error("enrichment: {kind} failed for business {business_id}: {detail}")]
    EnrichmentError { kind: String, business_id: String, detail: String },

    #[error("scoring: feature missing: {0}")]
    ScoringFeatureMissing(String),

    #[error("pipeline: empty result after normalization")]
    EmptyResult,

    #[error("pipeline: unexpected error: {0}")]
    Unexpected(String),
}
