use std::{process::ExitCode, thread, time::Duration};

use clap::{Args, Parser, Subcommand};
use dotenvy::dotenv;
use indicatif::{ProgressBar, ProgressStyle};
use oralcom_sim::{LogTrace, SimConfig, TraceRow, TraceSink, run_ensemble, run_session};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "oralcom-sim")]
#[command(about = "Stochastic source/noise/feedback channel simulation")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play the reference dialogue once and print the integration table
    Run {
        #[command(flatten)]
        params: ParamArgs,

        /// Pause between dialogue lines, in seconds
        #[arg(long, default_value_t = 1)]
        delay_secs: u64,
    },

    /// Repeat the session with consecutive seeds and summarise the outcomes
    Ensemble {
        #[command(flatten)]
        params: ParamArgs,

        /// Number of sessions
        #[arg(long, default_value_t = 1000)]
        runs: usize,
    },
}

/// Overrides applied on top of the environment configuration.
#[derive(Args)]
struct ParamArgs {
    /// Generator seed (random when omitted)
    #[arg(long)]
    seed: Option<u64>,
    /// Initial source level
    #[arg(long, allow_negative_numbers = true)]
    source: Option<f64>,
    /// Initial noise level
    #[arg(long, allow_negative_numbers = true)]
    noise: Option<f64>,
    /// Source growth rate
    #[arg(long, allow_negative_numbers = true)]
    alpha: Option<f64>,
    /// Source self-limitation
    #[arg(long, allow_negative_numbers = true)]
    beta: Option<f64>,
    /// Noise growth rate
    #[arg(long, allow_negative_numbers = true)]
    gamma: Option<f64>,
    /// Noise self-limitation
    #[arg(long, allow_negative_numbers = true)]
    delta: Option<f64>,
    /// Source volatility
    #[arg(long)]
    sigma_x: Option<f64>,
    /// Noise volatility
    #[arg(long)]
    sigma_y: Option<f64>,
    /// Words sent by the source
    #[arg(long, allow_negative_numbers = true)]
    word_count: Option<i64>,
    /// Words decoded by the receiver
    #[arg(long, allow_negative_numbers = true)]
    receiver_word_count: Option<i64>,
    /// Integration time step
    #[arg(long)]
    dt: Option<f64>,
}

impl ParamArgs {
    fn apply(&self, mut config: SimConfig) -> SimConfig {
        let p = &mut config.params;

        macro_rules! set {
            ($target:expr, $value:expr) => {
                if let Some(v) = $value {
                    $target = v;
                }
            };
        }

        set!(p.alpha, self.alpha);
        set!(p.beta, self.beta);
        set!(p.gamma, self.gamma);
        set!(p.delta, self.delta);
        set!(p.sigma_x, self.sigma_x);
        set!(p.sigma_y, self.sigma_y);
        set!(p.word_count, self.word_count);
        set!(p.receiver_word_count, self.receiver_word_count);
        set!(p.dt, self.dt);
        set!(config.source, self.source);
        set!(config.noise, self.noise);

        if self.seed.is_some() {
            config.seed = self.seed;
        }

        config
    }
}

/// Prints the integration table and mirrors every row to the log.
struct TableTrace;

impl TraceSink for TableTrace {
    fn record(&mut self, row: TraceRow) {
        println!("{}\t {:.5}\t {:.5}", row.step, row.source, row.noise);
        LogTrace.record(row);
    }
}

fn pause(secs: u64) {
    if secs > 0 {
        thread::sleep(Duration::from_secs(secs));
    }
}

fn run(config: &SimConfig, seed: u64, delay_secs: u64) -> oralcom_sim::Result<()> {
    println!(
        "source({:.6}): \"How do we solve this quadratic equation?\"",
        config.source
    );
    pause(delay_secs);

    println!("noise({:.6}): psychological noise", config.noise);
    pause(delay_secs);

    println!("epoch\t source(t)\t noise(t)");
    let report = run_session(config, seed, TableTrace)?;

    println!("receiver({:.6}): decoded", report.state.receiver);
    pause(delay_secs);

    println!(
        "feedback({:.6}): \"The solution involves using the quadratic formula.\"",
        report.state.feedback
    );

    Ok(())
}

fn ensemble(config: &SimConfig, runs: usize, seed: u64) -> oralcom_sim::Result<()> {
    let progress = ProgressBar::new(runs as u64);
    if let Ok(style) = ProgressStyle::with_template("{bar:40} {pos}/{len} sessions ({eta})") {
        progress.set_style(style);
    }

    let summary = run_ensemble(config, runs, seed, Some(&progress))?;
    progress.finish_and_clear();

    println!("sessions: {} (seeds {}..)", summary.runs, summary.base_seed);
    for (name, stats) in [("feedback", summary.feedback), ("receiver", summary.receiver)] {
        println!(
            "{name}: mean {:.6}  std {:.6}  min {:.6}  max {:.6}",
            stats.mean, stats.std_dev, stats.min, stats.max
        );
    }

    Ok(())
}

fn main() -> ExitCode {
    dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("{}=info", env!("CARGO_CRATE_NAME")).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let base = match SimConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Invalid configuration");
            return ExitCode::FAILURE;
        }
    };

    let params = match &cli.command {
        Commands::Run { params, .. } | Commands::Ensemble { params, .. } => params,
    };

    let config = params.apply(base);
    let seed = config.seed.unwrap_or_else(rand::random);
    info!(seed, "Using generator seed");

    let outcome = match &cli.command {
        Commands::Run { delay_secs, .. } => run(&config, seed, *delay_secs),
        Commands::Ensemble { runs, .. } => ensemble(&config, *runs, seed),
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Simulation failed");
            ExitCode::FAILURE
        }
    }
}
