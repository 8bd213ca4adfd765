use anyhow::{Context, Result};
use clap::Parser;
use optimizer_service::{cli::OptimizeCli, metrics_server, observability, optimizer};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = OptimizeCli::parse();
    observability::init_tracing(cli.common.log_level);

    // Load configuration, flags win over the file
    let cfg = cli.load_config()?;

    // Start metrics server if configured
    if let Some(metrics_cfg) = &cfg.metrics {
        metrics_server::init(&metrics_cfg.bind_addr).context("starting metrics server")?;
    }

    let report = optimizer::run(&cfg).await?;

    for e in &report.rejected {
        tracing::warn!(error = %e, "row skipped");
    }
    println!(
        "Saved {} recommendations to {}",
        report.written,
        cfg.output.path.display()
    );
    if !report.rejected.is_empty() {
        println!("{} rows were skipped, see log for details", report.rejected.len());
    }

    Ok(())
}
