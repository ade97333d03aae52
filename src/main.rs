//! EV fleet simulator entry point: CLI wiring and config-driven run construction.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use chrono::TimeDelta;
use clap::Parser;

use ev_fleet_sim::config::ScenarioConfig;
use ev_fleet_sim::diagnostics::Diagnostics;
use ev_fleet_sim::io::export::{export_energy_csv, export_load_csv, export_samples_csv};
use ev_fleet_sim::sim::controller::Controller;
use ev_fleet_sim::sim::kpi::FleetKpi;
use ev_fleet_sim::sim::load::LoadProfile;
use ev_fleet_sim::sim::population::build_population;
use ev_fleet_sim::sim::simulator::Simulator;

#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Load scenario from a TOML config file
    #[arg(long, conflicts_with = "preset")]
    scenario: Option<PathBuf>,

    /// Use a built-in preset (baseline, overnight, rapid)
    #[arg(long)]
    preset: Option<String>,

    /// Override the fleet size
    #[arg(long)]
    population: Option<usize>,

    /// Export SOC samples to CSV
    #[arg(long)]
    soc_out: Option<PathBuf>,

    /// Export power-draw samples to CSV
    #[arg(long)]
    power_out: Option<PathBuf>,

    /// Export the aggregate fleet load to CSV
    #[arg(long)]
    load_out: Option<PathBuf>,

    /// Export hourly fleet energy to CSV
    #[arg(long)]
    energy_out: Option<PathBuf>,

    /// Start REST API server after simulation
    #[cfg(feature = "api")]
    #[arg(long)]
    serve: bool,

    /// API server port
    #[cfg(feature = "api")]
    #[arg(long, default_value_t = 3000)]
    port: u16,
}

fn main() {
    env_logger::Builder::new()
        .format_timestamp_millis()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    if let Err(error) = run_cli() {
        log::error!("{error:#}");
        std::process::exit(1);
    }
}

fn load_scenario(args: &Cli) -> Result<ScenarioConfig> {
    let scenario = match (&args.scenario, &args.preset) {
        (Some(path), _) => ScenarioConfig::from_toml_file(path)
            .with_context(|| format!("failed to load scenario {}", path.display()))?,
        (None, Some(name)) => ScenarioConfig::from_preset(name)?,
        (None, None) => ScenarioConfig::baseline(),
    };
    Ok(scenario)
}

fn run_cli() -> Result<()> {
    let args = Cli::parse();
    log::debug!("{args:#?}");

    let mut scenario = load_scenario(&args)?;
    if let Some(population) = args.population {
        scenario.simulation.population = population;
    }

    let errors = scenario.validate();
    if !errors.is_empty() {
        for e in &errors {
            log::error!("{e}");
        }
        bail!("scenario has {} configuration error(s)", errors.len());
    }

    let diagnostics = Diagnostics::global("ev_fleet_sim");
    let sim_config = scenario.sim_config()?;
    let archetypes = scenario
        .archetypes(&diagnostics.scoped("ev_fleet_sim::archetype"))
        .context("failed to resolve archetypes")?;
    let agents = build_population(
        archetypes,
        scenario.simulation.population,
        sim_config.start,
        &diagnostics.scoped("ev_fleet_sim::population"),
    )
    .context("failed to build population")?;

    let controller = Controller::new(agents, diagnostics.scoped("ev_fleet_sim::controller"))
        .with_parallel(scenario.simulation.parallel);
    let mut sim = Simulator::new(
        sim_config.clone(),
        controller,
        diagnostics.scoped("ev_fleet_sim::simulator"),
    );
    let summary = sim.run();
    let kpi = FleetKpi::from_run(sim.controller(), &summary, sim_config.tick_hours());
    println!("{kpi}");

    let controller = sim.controller();
    if let Some(path) = &args.soc_out {
        export_samples_csv(&controller.soc_samples(), path)
            .with_context(|| format!("failed to write {}", path.display()))?;
        log::info!("SOC samples written to {}", path.display());
    }
    let power = controller.power_samples();
    if let Some(path) = &args.power_out {
        export_samples_csv(&power, path)
            .with_context(|| format!("failed to write {}", path.display()))?;
        log::info!("power samples written to {}", path.display());
    }
    let profile = LoadProfile::from_samples(&power);
    if let Some(path) = &args.load_out {
        export_load_csv(profile.points(), path)
            .with_context(|| format!("failed to write {}", path.display()))?;
        log::info!("fleet load written to {}", path.display());
    }
    if let Some(path) = &args.energy_out {
        let buckets = profile.bucketed_energy(sim_config.start, sim_config.tick, TimeDelta::hours(1));
        export_energy_csv(&buckets, path)
            .with_context(|| format!("failed to write {}", path.display()))?;
        log::info!("hourly energy written to {}", path.display());
    }

    #[cfg(feature = "api")]
    if args.serve {
        use std::net::SocketAddr;
        use std::sync::Arc;

        let state = Arc::new(ev_fleet_sim::api::AppState::new(
            sim.run_info(),
            kpi,
            sim.controller(),
            sim_config.tick,
        ));
        let addr = SocketAddr::from(([0, 0, 0, 0], args.port));
        let rt = tokio::runtime::Runtime::new().context("failed to create tokio runtime")?;
        rt.block_on(ev_fleet_sim::api::serve(
            state,
            addr,
            diagnostics.scoped("ev_fleet_sim::api"),
        ))
            .with_context(|| format!("API server on {addr} failed"))?;
    }

    Ok(())
}
