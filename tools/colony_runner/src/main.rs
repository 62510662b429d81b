use std::{
    fs::File,
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use phage_core::{
    build_headless_app, lattice_digest, run_simulation, CsvMetricsWriter, Lattice,
    SimulationConfig, Tournament,
};
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(author, version, about = "Two-phage colony lattice runner", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run one simulation and write the per-tick CSV
    Run(RunArgs),
    /// Pit two lysogeny tables against each other over repeated games
    Tournament(TournamentArgs),
}

#[derive(Args, Debug)]
struct ConfigArgs {
    /// Path to a colony config JSON file (defaults to the builtin config)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the RNG seed
    #[arg(long)]
    seed: Option<u64>,

    /// Override the tick budget
    #[arg(long)]
    ticks: Option<u64>,
}

#[derive(Args, Debug)]
struct RunArgs {
    #[command(flatten)]
    config: ConfigArgs,

    /// Write the CSV here instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,

    /// Stop after the first tick that fills the lattice
    #[arg(long)]
    stop_when_full: bool,

    /// Stop after the first tick with no occupied site
    #[arg(long)]
    stop_when_extinct: bool,
}

#[derive(Args, Debug)]
struct TournamentArgs {
    #[command(flatten)]
    config: ConfigArgs,

    /// Number of games to play
    #[arg(long)]
    iterations: u64,

    /// Write one JSON line per round here instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Run(args) => run(args),
        Command::Tournament(args) => tournament(args),
    }
}

fn load_config(args: &ConfigArgs) -> Result<SimulationConfig> {
    let mut config = match &args.config {
        Some(path) => SimulationConfig::from_file(path)
            .with_context(|| format!("Failed to load colony config from {}", path.display()))?,
        None => SimulationConfig::builtin().context("Builtin colony config is invalid")?,
    };
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    if let Some(ticks) = args.ticks {
        config.termination.tick_budget = ticks;
    }
    Ok(config)
}

fn open_output(path: Option<&Path>) -> Result<Box<dyn Write>> {
    Ok(match path {
        Some(path) => Box::new(BufWriter::new(
            File::create(path)
                .with_context(|| format!("Failed to create output file {}", path.display()))?,
        )),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    })
}

fn run(args: RunArgs) -> Result<()> {
    let mut config = load_config(&args.config)?;
    config.termination.stop_when_full |= args.stop_when_full;
    config.termination.stop_when_extinct |= args.stop_when_extinct;
    if config.termination.tick_budget == 0 {
        warn!(target: "phage::runner", "tick budget is zero; only the header will be written");
    }

    let mut app = build_headless_app(config).context("Failed to set up the simulation")?;
    let out = open_output(args.output.as_deref())?;
    let mut writer = CsvMetricsWriter::new(out).context("Failed to write CSV header")?;
    let summary = run_simulation(&mut app, &mut writer).context("Failed to write metrics")?;
    writer.into_inner().context("Failed to flush metrics")?;

    info!(
        target: "phage::runner",
        ticks = summary.ticks_run,
        stop_reason = ?summary.stop_reason,
        deaths = summary.deaths,
        digest = %format!("{:016x}", lattice_digest(app.world.resource::<Lattice>())),
        "run.finished"
    );
    Ok(())
}

fn tournament(args: TournamentArgs) -> Result<()> {
    let config = load_config(&args.config)?;
    let mut tournament = Tournament::new(config);
    let mut out = open_output(args.output.as_deref())?;

    for _ in 0..args.iterations {
        let round = tournament
            .play_round()
            .context("Tournament round failed")?;
        serde_json::to_writer(&mut out, &round).context("Failed to encode round report")?;
        writeln!(out).context("Failed to write round report")?;
    }
    out.flush().context("Failed to flush round reports")?;

    let (table_a, table_b) = tournament.tables();
    info!(
        target: "phage::runner",
        rounds = args.iterations,
        ?table_a,
        ?table_b,
        "tournament.finished"
    );
    Ok(())
}
