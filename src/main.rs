//! Runs the closed-loop complementary filter simulation at a fixed rate,
//! printing every cycle and logging it to CSV.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use complementary_fusion::{
    clock::{NoDelay, Sleeper, ThreadSleeper, TimeBase},
    logger::{ConsoleSink, CsvSink},
    mark_process_start,
    runner::{closed_loop_from_config, Runner},
    SimulationConfig,
};

#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// TOML configuration file. Command line flags take precedence.
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Weight of the gyro-integrated estimate, in [0, 1].
    #[arg(short, long)]
    alpha: Option<f32>,
    /// Length of the simulation in seconds.
    #[arg(short, long)]
    duration: Option<u64>,
    /// Cycle period in milliseconds.
    #[arg(long)]
    delay_ms: Option<u64>,
    /// CSV output file.
    #[arg(short, long, conflicts_with = "no_csv")]
    output: Option<PathBuf>,
    /// Do not write a CSV file.
    #[arg(long)]
    no_csv: bool,
    /// Seed the noise generator for a reproducible run.
    #[arg(long)]
    seed: Option<u64>,
    /// Drive the ground truth from accumulated cycle periods instead of the
    /// wall clock.
    #[arg(long)]
    simulated_time: bool,
    /// Do not wait between cycles.
    #[arg(long)]
    no_delay: bool,
    /// Disable ANSI colours in the console output.
    #[arg(long)]
    no_color: bool,
}

impl Args {
    /// Load the configuration file, if any, and apply the flags on top.
    fn into_config(self) -> Result<(SimulationConfig, bool)> {
        let config = match &self.config {
            Some(path) => SimulationConfig::from_toml_file(path)
                .with_context(|| format!("failed to load {}", path.display()))?,
            None => SimulationConfig::default(),
        };
        Ok(self.apply(config))
    }

    /// Override `config` with every flag that was given. Returns the merged
    /// configuration and whether to skip the delay between cycles.
    fn apply(self, mut config: SimulationConfig) -> (SimulationConfig, bool) {
        if let Some(alpha) = self.alpha {
            config.alpha = alpha;
        }
        if let Some(duration) = self.duration {
            config.duration_secs = duration;
        }
        if let Some(delay_ms) = self.delay_ms {
            config.loop_delay_ms = delay_ms;
        }
        if let Some(output) = self.output {
            config.csv_path = Some(output);
        }
        if self.no_csv {
            config.csv_path = None;
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        if self.simulated_time {
            config.time_base = TimeBase::Simulated;
        }
        if self.no_color {
            config.color = false;
        }
        (config, self.no_delay)
    }
}

fn run(config: &SimulationConfig, sleeper: impl Sleeper) -> Result<()> {
    let closed_loop = closed_loop_from_config(config).context("invalid configuration")?;
    let mut runner = Runner::new(closed_loop, config.period(), sleeper)
        .with_sink(ConsoleSink::stdout(config.color));

    if let Some(path) = &config.csv_path {
        let csv = CsvSink::create(path)
            .with_context(|| format!("could not open log file {}", path.display()))?;
        runner = runner.with_sink(csv);
    }

    println!("Starting Sensor Fusion Simulation...");
    println!(
        "Alpha: {:.2} | Loop Delay: {}ms | Duration: {}s\n",
        config.alpha, config.loop_delay_ms, config.duration_secs
    );

    runner.run(config.total_cycles())?;

    match &config.csv_path {
        Some(path) => println!(
            "\nSimulation finished. Data logged to {}",
            path.display()
        ),
        None => println!("\nSimulation finished."),
    }
    Ok(())
}

fn main() -> Result<()> {
    mark_process_start();
    env_logger::init();

    let (config, no_delay) = Args::parse().into_config()?;
    if no_delay {
        run(&config, NoDelay)
    } else {
        run(&config, ThreadSleeper)
    }
}
