use anyhow::{Context, Result};
use clap::Parser;
use energy_core::{analytics, Label};
use optimizer_service::{cli::ReportCli, observability, optimizer};
use time::macros::format_description;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = ReportCli::parse();
    observability::init_tracing(cli.common.log_level);

    let cfg = cli.common.load_config()?;
    let engine = optimizer::engine(&cfg)?;
    let source = optimizer::source(&cfg)?;

    let loaded = optimizer::load_readings(&source, cfg.pipeline.error_policy)
        .await
        .with_context(|| format!("loading {}", cfg.input.path.display()))?;
    let readings = loaded.readings;
    tracing::info!(
        readings = readings.len(),
        rejected = loaded.rejected.len(),
        "readings loaded"
    );

    let outcome = optimizer::annotate_readings(&engine, &readings, cfg.pipeline.error_policy)?;
    for e in &outcome.errors {
        tracing::warn!(error = %e, "reading not classified");
    }
    let annotated = outcome.annotated;
    let clock = format_description!("[year]-[month]-[day] [hour]:[minute]");

    println!("Energy usage report for {}", cfg.input.path.display());
    println!("  readings: {}", readings.len());

    if let Some(avg) = analytics::appliance_averages(&readings) {
        println!();
        println!("Average appliance usage (W)");
        println!("  kitchen  {:>10.1}", avg.kitchen);
        println!("  ac       {:>10.1}", avg.ac);
        println!("  heater   {:>10.1}", avg.heater);
    }

    let series = analytics::total_usage_series(&readings);
    if !series.is_empty() {
        println!();
        println!("Total usage over time (W)");
        for point in &series {
            let at = point.ts.format(clock).context("formatting reading time")?;
            println!("  {at}  {:>10.0}", point.total_usage);
        }
    }

    let split = analytics::day_night_split(&readings);
    println!();
    println!("Day vs night usage");
    println!("  day      {:>10.0} W", split.day_watts);
    println!("  night    {:>10.0} W", split.night_watts);
    if let Some(share) = split.day_share() {
        println!("  day share {:.1}% / night share {:.1}%", share * 100.0, (1.0 - share) * 100.0);
    }
    if split.unlabelled > 0 {
        println!("  {} readings without a day/night tag", split.unlabelled);
    }

    println!();
    match analytics::temperature_correlation(&readings) {
        Some(r) => println!("Temperature vs total usage correlation: {r:+.2}"),
        None => println!("Temperature vs total usage correlation: n/a"),
    }

    if let Some(peak) = analytics::peak_usage(&readings) {
        let at = peak
            .ts
            .format(format_description!("[hour]:[minute]"))
            .context("formatting peak time")?;
        println!();
        println!(
            "Highest energy usage was {} Watts at {}. Try reducing appliance load during this time to save energy.",
            peak.total_usage as i64, at
        );
        println!("  (row {} of the input)", peak.row);
    }

    let counts = analytics::label_counts(&annotated);
    println!();
    println!("Recommendations");
    for label in Label::ALL {
        println!("  {:<42} {:>6}", cli.labels.render(label), counts.get(label));
    }

    Ok(())
}
