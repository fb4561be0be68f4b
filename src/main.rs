use std::path::PathBuf;

use clap::Parser;
use srm_simulation::*;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Solid rocket motor and vertical flight simulator")]
struct Cli {
    /// TOML file describing the motor, rocket and simulation parameters
    #[arg(long, default_value = "configs/scenario_a.toml")]
    config: PathBuf,

    /// Print every n-th sample of the flight (0 prints the summary only)
    #[arg(long, default_value_t = 0)]
    sample_interval: usize,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();
    let simulation = SimulationConfig::load(&cli.config)?.build()?;

    let result = match simulation.run() {
        Ok(result) => result,
        Err(e) => {
            println!("Error in {} during simulation: {}", e.subsystem(), e);
            return Err(e.into());
        }
    };

    let telemetry = Telemetry::collect_data(&result, &simulation.motor, cli.sample_interval);
    telemetry.display_data();

    Ok(())
}
