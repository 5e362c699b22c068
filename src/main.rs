//! repbudget - CLI entry point

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use repbudget::{
    budget::{calendar, BudgetEngine},
    cli::{Args, Commands, ReasonArg, Verbosity},
    config::Config,
    host::{CurrencyEventBus, CurrencyModified},
    session::{BudgetSession, SaveGame, SaveStore},
    sim::{SimulatedHost, Simulation},
    telemetry::{TelemetryCollector, TelemetryDisplay},
};

fn main() -> Result<()> {
    let args = Args::parse();
    let verbosity = args.verbosity();

    let config = match &args.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    init_logging(verbosity, &config);

    match args.command {
        Commands::Simulate {
            years,
            save,
            contract_rep,
            contract_every,
        } => run_simulate(&config, verbosity, years, save, contract_rep, contract_every),
        Commands::Status { save } => run_status(&config, &save),
        Commands::Accrue { save, delta, reason } => run_accrue(&config, verbosity, &save, delta, reason),
        Commands::Tick { save, at } => run_tick(&config, verbosity, &save, &at),
        Commands::Schedule { periods, start } => run_schedule(periods, start.as_deref()),
        Commands::Saves { delete } => run_saves(&config, verbosity, delete.as_deref()),
        Commands::Config => {
            println!("{}", toml::to_string_pretty(&config).context("Failed to render config")?);
            Ok(())
        }
    }
}

fn init_logging(verbosity: Verbosity, config: &Config) {
    let filter = match verbosity.log_filter() {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run_simulate(
    config: &Config,
    verbosity: Verbosity,
    years: u32,
    save_name: Option<String>,
    contract_rep: Option<f64>,
    contract_every: Option<f64>,
) -> Result<()> {
    let mut sim_config = config.simulation.clone();
    if let Some(rep) = contract_rep {
        sim_config.contract_reputation = rep;
    }
    if let Some(days) = contract_every {
        sim_config.contract_interval_days = days;
    }

    let store = SaveStore::new(&config.storage.save_dir)?;
    let existing = match &save_name {
        Some(name) => store.load(name)?,
        None => None,
    };

    let telemetry = TelemetryCollector::new();
    let simulation = match &existing {
        Some(save) => {
            info!(save = %save.name, "Resuming simulation from save");
            Simulation::resume(
                sim_config,
                save.universal_time,
                Some((save.funds, save.reputation)),
                Some(&save.budget),
            )?
        }
        None => Simulation::new(sim_config)?,
    }
    .with_telemetry(telemetry.clone());

    let report = simulation.run_years(years)?;

    let display = TelemetryDisplay::new(telemetry, verbosity);
    for (at, payout) in &report.payouts {
        display.display_payout(payout, *at);
    }
    display.display_summary();

    if verbosity.show_progress() {
        println!(
            "Finished at {} with {:.2} funds, {:.2} reputation ({:.2} banked)",
            calendar::format_time(report.final_time),
            report.final_funds,
            report.final_reputation,
            report.budget.banked_reputation.unwrap_or_default()
        );
    }

    if let Some(name) = save_name {
        let mut save = existing.unwrap_or_else(|| SaveGame::new(&name, 0.0, 0.0, 0.0));
        save.universal_time = report.final_time;
        save.funds = report.final_funds;
        save.reputation = report.final_reputation;
        save.budget = report.budget;
        let path = store.save(&mut save)?;
        if verbosity.show_progress() {
            println!("{} {}", "Saved".green(), path.display());
        }
    }

    Ok(())
}

fn run_status(config: &Config, name: &str) -> Result<()> {
    let store = SaveStore::new(&config.storage.save_dir)?;
    let save = store.load_required(name)?;

    let state = save.budget.restore(save.universal_time, save.reputation);
    let engine = BudgetEngine::restore(state);
    let next = engine.preview_payout();

    println!("{} {}", "Save:".bold(), save.name);
    println!("Clock:              {}", calendar::format_time(save.universal_time));
    println!("Funds:              {:.2}", save.funds);
    println!("Reputation:         {:.2}", save.reputation);
    println!("Periods paid:       {}", engine.period_counter());
    println!("Banked reputation:  {:.2}", engine.banked_reputation());
    println!(
        "Next payout:        {} ({})",
        calendar::format_time(engine.next_due_time()),
        if engine.is_payout_due(save.universal_time) {
            "due".yellow()
        } else {
            "scheduled".normal()
        }
    );
    println!(
        "  estimate:         {:.2} (base {:.2}, rep {:.2})",
        next.total, next.base_budget, next.reputation_budget
    );
    if save.budget.is_empty() {
        println!("{}", "No budget state stored yet; showing fresh defaults".dimmed());
    }
    Ok(())
}

fn run_saves(config: &Config, verbosity: Verbosity, delete: Option<&str>) -> Result<()> {
    let store = SaveStore::new(&config.storage.save_dir)?;

    if let Some(name) = delete {
        store.delete(name)?;
        info!(save = name, "Save deleted");
        if verbosity.show_progress() {
            println!("{} {}", "Deleted".red(), name);
        }
        return Ok(());
    }

    let names = store.list()?;
    if names.is_empty() {
        println!("{} {}", "No saves in".dimmed(), store.storage_dir().display());
        return Ok(());
    }
    for name in names {
        match store.load(&name)? {
            Some(save) => {
                println!(
                    "{:<20} {}  funds {:>12.2}  periods {}",
                    name,
                    calendar::format_time(save.universal_time),
                    save.funds,
                    save.budget.period_counter.unwrap_or_default()
                );
                if verbosity.show_events() {
                    let state = save.budget.restore(save.universal_time, save.reputation);
                    println!(
                        "{:<20} banked {:.2}, next due {}",
                        "",
                        state.banked_reputation,
                        calendar::format_time(state.next_due_time)
                    );
                }
            }
            None => println!("{}", name),
        }
    }
    Ok(())
}

fn run_accrue(config: &Config, verbosity: Verbosity, name: &str, delta: f64, reason: ReasonArg) -> Result<()> {
    let store = SaveStore::new(&config.storage.save_dir)?;
    let mut save = store
        .load(name)?
        .unwrap_or_else(|| SaveGame::new(name, 0.0, config.simulation.starting_funds, config.simulation.starting_reputation));

    let mut bus = CurrencyEventBus::new();
    let mut host = SimulatedHost::new(save.universal_time, save.funds, save.reputation);
    let session = BudgetSession::start(&mut bus, Some(&save.budget), save.universal_time, save.reputation);

    host.apply(&mut bus, CurrencyModified::reputation(reason.reasons(), delta));
    let budget = session.end(&mut bus);

    save.reputation = host.reputation;
    save.budget = budget;
    store.save(&mut save)?;

    if verbosity.show_progress() {
        println!(
            "Reputation {:+.2} ({}); banked now {:.2}",
            delta,
            reason.reasons(),
            save.budget.banked_reputation.unwrap_or_default()
        );
    }
    Ok(())
}

fn run_tick(config: &Config, verbosity: Verbosity, name: &str, at: &str) -> Result<()> {
    let target = calendar::parse_date(at)?;
    let store = SaveStore::new(&config.storage.save_dir)?;
    let mut save = store.load_required(name)?;

    let mut bus = CurrencyEventBus::new();
    let mut host = SimulatedHost::new(save.universal_time, save.funds, save.reputation);
    let telemetry = TelemetryCollector::new();
    let mut session = BudgetSession::start(&mut bus, Some(&save.budget), save.universal_time, save.reputation)
        .with_telemetry(telemetry.clone());

    host.advance_to(target);
    let now = host.universal_time;
    let payouts = session.update(now, &mut host)?;
    save.budget = session.end(&mut bus);

    save.universal_time = host.universal_time;
    save.funds = host.funds;
    store.save(&mut save)?;

    let display = TelemetryDisplay::new(telemetry, verbosity);
    for payout in &payouts {
        display.display_payout(payout, now);
    }
    if verbosity.show_progress() && payouts.is_empty() {
        println!("Nothing due before {}", calendar::format_time(now));
    }
    Ok(())
}

fn run_schedule(periods: u32, start: Option<&str>) -> Result<()> {
    let start = match start {
        Some(date) => calendar::parse_date(date)?,
        None => 0.0,
    };

    let mut engine = BudgetEngine::new(start, 0.0);
    println!("{:<12} {:>6} {:>12}", "Due".bold(), "Period".bold(), "Base".bold());
    for _ in 0..periods {
        let due = engine.next_due_time();
        let payout = engine.advance_period(due)?;
        println!(
            "{:<12} {:>6} {:>12.2}",
            calendar::format_time(due),
            payout.period,
            payout.base_budget
        );
    }
    Ok(())
}
