//! Okapiq: an SMB market-intelligence pipeline. Given a geographic query and
//! an industry, procures raw business records from heterogeneous external
//! sources, fuses them into canonical entities, enriches them with
//! demographic/regulatory/text-derived signals, and scores them into a
//! ranked, market-level intelligence bundle.
//!
//! The pipeline is the [`pipeline::PipelineOrchestrator`]; everything else
//! in this crate is a stage it coordinates. See `DESIGN.md` for the
//! grounding ledger.

pub mod adapters;
pub mod aggregator;
pub mod cache;
pub mod config;
pub mod enricher;
pub mod error;
pub mod hub;
pub mod model;
pub mod normalizer;
pub mod pipeline;
pub mod priors;
pub mod scorer;

pub use config::PipelineConfig;
pub use pipeline::PipelineOrchestrator;
