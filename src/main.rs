// Emergency Department Queueing Network Simulator - Main Entry Point
//
// You can run it via Cargo:
//
// ```console
// $ cargo build --release
// $ ./target/release/ed-sim ed.txt
// ```
//
// Or with overrides:
//
// ```console
// $ ./target/release/ed-sim ed.txt --end-time 5000 --seed 42 --output-format json --verbose
// ```

use anyhow::{Context, Result};
use clap::Parser;
use ed_queue_sim::simulation::{LoggingConfig, NetworkSimulator};
use ed_queue_sim::types::{CliArgs, NetworkConfig, OutputFormat, Stage};
use std::process;
use std::str::FromStr;
use std::time::Instant;
use tracing::{error, info};

fn main() {
    // Parse CLI arguments first to check for special flags
    let args = CliArgs::parse();

    if args.print_config {
        match NetworkConfig::default().print_json() {
            Ok(json) => {
                println!("{}", json);
                return;
            }
            Err(e) => {
                eprintln!("Failed to serialize default configuration: {}", e);
                process::exit(1);
            }
        }
    }

    let logging = match LoggingConfig::from_cli_args(&args) {
        Ok(logging) => logging,
        Err(e) => {
            eprintln!("Invalid logging options: {}", e);
            process::exit(1);
        }
    };
    // Held until exit so buffered file logs are flushed
    let _log_guard = match logging.init() {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {}", e);
            process::exit(1);
        }
    };

    if let Err(e) = run(args) {
        error!("{:#}", e);
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

fn run(args: CliArgs) -> Result<()> {
    info!("Starting emergency department simulator");

    let output_format = match args.output_format.as_deref() {
        Some(value) => OutputFormat::from_str(value).map_err(anyhow::Error::msg)?,
        None => OutputFormat::Text,
    };
    let dry_run = args.dry_run;

    let config = NetworkConfig::from_cli_args(args).context("Failed to load configuration")?;
    config.validate().context("Configuration validation failed")?;
    info!("Configuration loaded and validated successfully");

    if dry_run {
        eprintln!("Configuration validation successful!");
        eprintln!("Dry run mode - simulation will not be executed.");
        print_configuration_summary(&config);
        return Ok(());
    }

    if output_format == OutputFormat::Text {
        print_configuration_summary(&config);
    }

    let started = Instant::now();
    let mut simulator = NetworkSimulator::new(config).context("Failed to initialize simulator")?;
    let report = simulator.run().context("Simulation failed")?;

    info!(
        elapsed_ms = started.elapsed().as_millis() as u64,
        events = report.events_processed,
        clock = report.clock,
        "Simulation completed"
    );

    match output_format {
        OutputFormat::Text => print!("{}", report),
        OutputFormat::Json => {
            println!("{}", report.to_json().context("Failed to serialize report")?)
        }
    }
    Ok(())
}

/// Print configuration summary to stderr
fn print_configuration_summary(config: &NetworkConfig) {
    eprintln!("Configuration:");
    eprintln!("  End Time: {}", config.end_time);
    eprintln!("  Termination: {}", config.termination);
    eprintln!("  Random Seed: {}", config.seed);
    eprintln!("  Mean Inter-arrival Time: {}", config.mean_inter_arrival);
    for stage in Stage::ALL {
        let stage_config = config.stage(stage);
        eprintln!(
            "  {}: {} server(s), mean service {}",
            stage, stage_config.servers, stage_config.mean_service
        );
    }
    eprintln!("  Discharge at Triage: {:.1}%", config.triage_discharge_prob * 100.0);
    eprintln!(
        "  Routing: trauma {:.1}%, acute {:.1}%, prompt {:.1}%",
        config.trauma_prob * 100.0,
        config.acute_prob * 100.0,
        config.prompt_prob() * 100.0
    );
    eprintln!();
}
