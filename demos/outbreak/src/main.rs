//! outbreak — household epidemic with testing, tracing and isolation.
//!
//! Agents live in small homes, spend working hours in a shared commons and
//! go home in the evening.  A few seed infections spread through the
//! commons; symptomatic agents get tested, positives are isolated with their
//! household, and contact tracing (app and manual) isolates their peers.
//!
//! ```text
//! cargo run -p outbreak --release -- --homes 50 --days 60 --output ./out
//! RUST_LOG=epi_isolation=debug cargo run -p outbreak -- --scenario scenario.json
//! ```

mod commute;
mod town;

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result, bail};
use clap::Parser;
use serde::Deserialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use epi_contact::{ContactDetector, DetectorConfig};
use epi_core::{AgentId, SimConfig, SimRng};
use epi_isolation::{Isolation, IsolationConfig};
use epi_output::{CsvReportWriter, CsvWriter};
use epi_pathogen::{AsymptomaticShare, InfectionState, Pathogen, PathogenConfig, columns as pathogen_columns};
use epi_sim::{PopulationId, SimBuilder, WorldMotion};
use epi_testing::{Testing, TestingConfig};
use epi_tracing::{AppTracing, AppTracingConfig, ManualTracing, ManualTracingConfig};

use commute::Commute;
use town::build_town;

// ── CLI ───────────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(version, about = "Household outbreak with testing, tracing and isolation")]
struct Args {
    /// Number of homes.
    #[arg(long, default_value_t = 40)]
    homes: usize,

    /// Agents per home.
    #[arg(long, default_value_t = 4)]
    household_size: usize,

    /// Simulated days (one tick per hour unless the scenario says otherwise).
    #[arg(long, default_value_t = 30)]
    days: u64,

    /// Initially infected agents.
    #[arg(long, default_value_t = 3)]
    initial: usize,

    /// Master seed; overrides the scenario's.
    #[arg(long)]
    seed: Option<u64>,

    /// JSON scenario with per-model configs; missing sections use defaults.
    #[arg(long)]
    scenario: Option<PathBuf>,

    /// Directory for `metrics.csv`.
    #[arg(long, default_value = "output")]
    output: PathBuf,
}

// ── Scenario ──────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Scenario {
    sim:       SimConfig,
    detector:  DetectorConfig,
    pathogen:  PathogenConfig,
    testing:   TestingConfig,
    isolation: IsolationConfig,
    app:       AppTracingConfig,
    manual:    ManualTracingConfig,
}

fn load_scenario(path: Option<&PathBuf>) -> Result<Scenario> {
    let Some(path) = path else {
        return Ok(Scenario {
            testing: TestingConfig { test_symptomatic: true, ..Default::default() },
            ..Default::default()
        });
    };
    let text = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))
}

// ── main ──────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    if args.homes == 0 || args.household_size == 0 {
        bail!("--homes and --household-size must be positive");
    }
    let mut scenario = load_scenario(args.scenario.as_ref())?;
    if let Some(seed) = args.seed {
        scenario.sim.seed = seed;
    }
    let ticks = args.days * scenario.sim.make_clock().ticks_per_day();
    scenario.sim.total_ticks = Some(ticks);

    // 1. Town and population.
    let mut rng = SimRng::new(scenario.sim.seed);
    let (mut population, world, landmarks) = build_town(args.homes, args.household_size, &mut rng)?;
    let n = population.len();
    if args.initial > n {
        bail!("--initial {} exceeds the population of {n}", args.initial);
    }
    info!(agents = n, homes = args.homes, ticks, seed = scenario.sim.seed, "town built");

    // 2. Models, in step order.  Requester codes follow construction order.
    let detector = ContactDetector::new(scenario.detector, &mut population, &mut rng)?;
    let mut pathogen = Pathogen::new(scenario.pathogen, &mut population)?;
    let mut isolation = Isolation::new(scenario.isolation, &mut population)?;
    let testing = Testing::new(scenario.testing, &mut population, isolation.registry_mut())?;
    let app = AppTracing::new(scenario.app, &mut population, isolation.registry_mut())?;
    let manual = ManualTracing::new(scenario.manual, &mut population, isolation.registry_mut())?;

    // Seeds spread evenly over the homes.
    let seeds: Vec<AgentId> = (0..args.initial).map(|k| AgentId((k * n / args.initial) as u32)).collect();
    pathogen.seed_infections(&mut population, &seeds, AsymptomaticShare::Count(0), &mut rng)?;

    let mut sim = SimBuilder::new(scenario.sim)
        .population(population, Some(Box::new(world)))
        .model(detector)
        .model(pathogen)
        .model(testing)
        .model(app)
        .model(manual)
        .model(isolation)
        .model(Commute::new(landmarks.commons))
        .model(WorldMotion)
        .build()?;

    // 3. Run with CSV output.
    let mut report = CsvReportWriter::new(CsvWriter::new(&args.output)?);
    let started = Instant::now();
    let completed = sim.run_observed(None, &mut report)?;
    sim.finalize()?;
    if let Some(e) = report.take_error() {
        return Err(e).context("writing metrics");
    }
    info!(ticks = completed, elapsed_ms = started.elapsed().as_millis() as u64, "run complete");

    // 4. Summary.
    let population = sim.population(PopulationId(0)).context("population 0 missing")?;
    let states = population.get::<InfectionState>(pathogen_columns::STATE)?;
    let count = |s: InfectionState| states.iter().filter(|&&x| x == s).count();
    println!("=== outbreak: {n} agents, {completed} ticks ===");
    for state in [
        InfectionState::Susceptible,
        InfectionState::Exposed,
        InfectionState::Infectious,
        InfectionState::Infected,
        InfectionState::Immune,
        InfectionState::Deceased,
    ] {
        println!("  {:<12} {}", format!("{state:?}"), count(state));
    }
    if let Some(pathogen) = sim.model::<Pathogen>() {
        println!("  infections   {}", pathogen.total_infections());
        println!("  waves        {}", pathogen.waves().len());
    }
    println!("  R            {:.2}", epi_pathogen::r(population)?);
    if let Some(testing) = sim.model::<Testing>() {
        println!("  tests        {} ({} positive)", testing.completed(), testing.positives());
    }
    if let Some(isolation) = sim.model::<Isolation>() {
        let t = isolation.totals();
        println!("  isolations   {} direct, {} household, {} released", t.direct, t.household, t.released);
    }
    if let Some(manual) = sim.model::<ManualTracing>() {
        let t = manual.totals();
        println!("  traced       {} named, {} reached, {} abandoned", t.named, t.reached, t.abandoned);
    }
    println!("  metrics      {} rows in {}", report.writer().rows_written(), report.writer().path().display());
    Ok(())
}
