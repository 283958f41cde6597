//! Okapiq demo CLI.
//!
//! Drives one `IntelligenceRequest` end-to-end against the default adapter
//! set and prints the resulting `IntelligenceResponse` as JSON. Ambient
//! scaffolding (config loading + pretty-printing) around the library, not
//! part of the core pipeline contract (spec.md §1, §9 Design Notes).
//!
//! Usage:
//!   okapiq --location "Boston, MA" --industry hvac --max-businesses 10

use anyhow::Result;
use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;

use okapiq::model::IntelligenceRequest;
use okapiq::{PipelineConfig, PipelineOrchestrator};

#[derive(Parser, Debug)]
#[command(name = "okapiq")]
#[command(about = "Okapiq SMB market-intelligence pipeline demo")]
struct Args {
    /// Geographic query, e.g. "Boston, MA"
    #[arg(long, env = "OKAPIQ_LOCATION")]
    location: String,

    /// Free-text industry, mapped into the closed category vocabulary
    #[arg(long, env = "OKAPIQ_INDUSTRY")]
    industry: Option<String>,

    /// Search radius in miles
    #[arg(long, env = "OKAPIQ_RADIUS_MILES", default_value = "25")]
    radius_miles: u32,

    /// Hard cap on entities carried past normalization
    #[arg(long, env = "OKAPIQ_MAX_BUSINESSES", default_value = "50")]
    max_businesses: usize,

    /// Comma-separated crawl sources (default set used when omitted)
    #[arg(long, env = "OKAPIQ_CRAWL_SOURCES")]
    crawl_sources: Option<String>,

    /// Disable the whole-response cache for this run
    #[arg(long, default_value = "false")]
    no_cache: bool,

    /// Pretty-print the JSON response
    #[arg(long, default_value = "true")]
    pretty: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .init();

    let args = Args::parse();

    info!("Starting Okapiq intelligence pipeline");
    info!("  Location: {}", args.location);
    info!("  Industry: {:?}", args.industry);
    info!("  Radius: {} miles", args.radius_miles);
    info!("  Max businesses: {}", args.max_businesses);

    let mut request = IntelligenceRequest::new(args.location);
    request.industry = args.industry;
    request.radius_miles = args.radius_miles;
    request.max_businesses = args.max_businesses;
    request.use_cache = !args.no_cache;
    request.crawl_sources =
        args.crawl_sources.map(|s| s.split(',').map(|p| p.trim().to_string()).collect());

    let orchestrator = PipelineOrchestrator::new(PipelineConfig::from_env());
    let response = orchestrator.process(request).await;

    info!(
        "Pipeline complete: {} businesses, data_quality_score={:.2}, total={:.2}s",
        response.business_count,
        response.data_quality_score,
        response.pipeline_performance.total_seconds
    );

    let json = if args.pretty {
        serde_json::to_string_pretty(&response)?
    } else {
        serde_json::to_string(&response)?
    };
    println!("{json}");

    Ok(())
}
