//! `fleet-run`: run one charging session and write its dispatch log.
//!
//! ```text
//! fleet-run --config fleet.toml --generate --output ./out
//! fleet-run --static --seed 7 --target 90
//! ```
//!
//! Verbosity is controlled by `RUST_LOG` (e.g. `RUST_LOG=fc_dispatch=debug`).

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use fc_core::FleetConfig;
use fc_output::{CsvWriter, OutputWriter, SessionOutputObserver};
use fc_sim::{NoopObserver, RunSummary, Session, SessionBuilder, TopologyParams, TopologySource};
use fc_store::MemoryStore;

#[derive(Parser, Debug)]
#[command(author, version, long_about = None)]
struct CliArgs {
    /// TOML configuration; defaults apply to anything it omits.
    #[arg(short = 'c', long, value_name = "CONFIG_FILE")]
    config: Option<PathBuf>,

    /// Use the fixed demo topology.
    #[arg(long = "static", conflicts_with = "generate")]
    static_layout: bool,

    /// Generate a random topology from the config's `[topology]` table.
    #[arg(short = 'g', long)]
    generate: bool,

    /// Directory for output files.  Nothing is written when omitted.
    #[arg(short = 'o', long, value_name = "DIR")]
    output: Option<PathBuf>,

    /// Write SQLite instead of CSV.
    #[cfg(feature = "sqlite")]
    #[arg(long, requires = "output")]
    sqlite: bool,

    /// Record parking-site snapshots every N cycles (0 disables).
    #[arg(long, default_value_t = 1)]
    site_interval: u64,

    /// Override the configured seed.
    #[arg(short = 's', long)]
    seed: Option<u64>,

    /// Override the configured target fleet charge.
    #[arg(short = 't', long)]
    target: Option<f64>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = CliArgs::parse();
    let start = Instant::now();

    let mut config = match &args.config {
        Some(path) => FleetConfig::load(path).with_context(|| format!("loading {}", path.display()))?,
        None => FleetConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    if let Some(target) = args.target {
        config.dispatch.target_charge = target;
    }

    // Without a persistent store the session needs a topology to start from.
    let source = if args.generate {
        TopologySource::Generated(TopologyParams::from(&config.topology))
    } else if args.static_layout {
        TopologySource::Static
    } else {
        info!("no topology option given; using the static layout");
        TopologySource::Static
    };

    let mut session = SessionBuilder::new(config, MemoryStore::new())
        .topology(source)
        .build()
        .context("building session")?;

    let summary = match &args.output {
        None => session.run(&mut NoopObserver)?,
        Some(dir) => {
            std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
            run_with_output(&mut session, &args, dir)?
        }
    };

    print_summary(&summary, &session);
    println!("Session finished in {} ms.", start.elapsed().as_millis());
    Ok(())
}

fn run_with_output(session: &mut Session<MemoryStore>, args: &CliArgs, dir: &Path) -> Result<RunSummary> {
    #[cfg(feature = "sqlite")]
    if args.sqlite {
        let writer = fc_output::SqliteWriter::new(dir).context("opening SQLite output")?;
        return observe(session, writer, args.site_interval);
    }
    let writer = CsvWriter::new(dir).context("opening CSV output")?;
    observe(session, writer, args.site_interval)
}

fn observe<W: OutputWriter>(session: &mut Session<MemoryStore>, writer: W, site_interval: u64) -> Result<RunSummary> {
    let mut observer = SessionOutputObserver::new(writer, site_interval);
    let summary = session.run(&mut observer)?;
    if let Some(e) = observer.take_error() {
        return Err(e).context("writing output");
    }
    Ok(summary)
}

fn print_summary(summary: &RunSummary, session: &Session<MemoryStore>) {
    let graph = session.graph();
    println!("Stopped:         {:?}", summary.stop);
    println!("Cycles:          {}", summary.cycles);
    println!("Total travel:    {:.2}", summary.total_travel);
    println!("Average charge:  {:.2}", summary.final_average);
    println!("Vehicles:        {}", graph.vehicle_count());
    println!("Agent inventory: {}", summary.inventory);
    println!("Agent location:  {}", session.agent().location);
}
