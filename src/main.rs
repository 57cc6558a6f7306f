use anyhow::{bail, Context};
use clap::Parser;
use ranklens::{
    api_key_from_env, AnalysisConfig, AnalysisRun, BasicHtmlRenderer, ProviderConfig, SerpClient,
};
use std::path::PathBuf;
use tracing::info;

/// Local-search competitive intelligence: one SERP snapshot per keyword,
/// aggregated per keyword group, rendered as an HTML report.
#[derive(Parser, Debug)]
#[command(name = "ranklens", version)]
struct Args {
    /// Path to the analysis configuration file
    #[arg(short, long, default_value = "config.json")]
    config: PathBuf,

    /// Directory for generated reports
    #[arg(short, long, default_value = "output")]
    output_dir: PathBuf,

    /// Log the summary stats without writing an HTML report
    #[arg(long)]
    summary_only: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    info!("Starting analysis (config: {})", args.config.display());

    let config = AnalysisConfig::load(&args.config).context("failed to load configuration")?;
    let api_key = api_key_from_env()?;

    let client = SerpClient::new(api_key, ProviderConfig::default());
    if !client.validate_api_key().await {
        bail!("invalid API key; aborting before issuing any queries");
    }

    let run = AnalysisRun::new(
        config,
        Box::new(client),
        Box::new(BasicHtmlRenderer),
        args.output_dir,
    );

    if args.summary_only {
        let (aggregated, model) = run.analyze().await;
        info!(
            "Summary-only run {}: {} keywords, {} successful",
            model.run_id,
            aggregated.summary.total_keywords,
            aggregated.summary.successful_searches
        );
        return Ok(());
    }

    let outcome = run.run().await?;

    println!();
    println!("{}", "=".repeat(60));
    println!("Analysis Complete!");
    println!("{}", "=".repeat(60));
    println!("Report generated: {}", outcome.report_path.display());
    println!("Open the file in your browser to view the results");
    println!("{}", "=".repeat(60));

    Ok(())
}
