//! Run the realm simulation from the command line.
//!
//! Reports go to stdout as one JSON object per day; logs go to stderr and
//! follow `RUST_LOG`.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use realm_sim::flush::flush_to_jsonl;
use realm_sim::model::Trait;
use realm_sim::scenario::Scenario;
use realm_sim::{SimConfig, Simulation, World};

#[derive(Parser, Debug)]
#[command(name = "realm-sim")]
#[command(about = "Advance a three-kingdoms realm one day at a time")]
struct Args {
    /// Random seed for a fresh demo world
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Number of days to simulate
    #[arg(long, default_value_t = 90)]
    days: u64,

    /// Tuning overrides as a (partial) JSON config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Resume from a snapshot instead of seeding a demo world
    #[arg(long)]
    load: Option<PathBuf>,

    /// Write a snapshot after the run
    #[arg(long)]
    save: Option<PathBuf>,

    /// Export the event log and entities as JSONL into this directory
    #[arg(long)]
    jsonl: Option<PathBuf>,

    /// Hand the first kingdom to the player
    #[arg(long)]
    player: bool,

    /// Print only each day's narrative summary
    #[arg(long)]
    summary: bool,
}

fn demo_world(player: bool) -> World {
    let mut s = Scenario::new();
    let shu = s.add_kingdom("Shu");
    let wei = s.add_kingdom("Wei");
    let wu = s.add_kingdom("Wu");

    s.character("Guan Yu")
        .military(16)
        .traits(vec![Trait::Brave, Trait::Loyal])
        .member_of(shu.faction)
        .at(shu.city);
    s.character("Zhuge Liang")
        .intelligence(18)
        .charm(12)
        .traits(vec![Trait::Wise, Trait::Cautious])
        .member_of(shu.faction)
        .at(shu.city);
    s.character("Xiahou Dun")
        .military(14)
        .traits(vec![Trait::Impulsive])
        .member_of(wei.faction)
        .at(wei.city);
    s.character("Sima Yi")
        .intelligence(17)
        .traits(vec![Trait::Ambitious, Trait::Treacherous])
        .member_of(wei.faction)
        .at(wei.city);
    s.character("Lu Meng")
        .military(12)
        .intelligence(12)
        .member_of(wu.faction)
        .at(wu.city);

    let jing = s.city("Jingzhou").minor().garrison(4).gold(40).id();
    let xu = s.city("Xuzhou").minor().garrison(3).gold(30).id();
    let han = s.city("Hanzhong").garrison(6).gold(50).id();
    s.character("Ma Chao").military(15).at(han);

    s.connect(shu.city, jing);
    s.connect(shu.city, han);
    s.connect(wei.city, han);
    s.connect(wei.city, xu);
    s.connect(wu.city, jing);
    s.connect(wu.city, xu);
    s.connect(jing, xu);

    if player {
        s.player(shu.faction);
    }
    s.build()
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let mut sim = match &args.load {
        Some(path) => Simulation::load(path)?,
        None => {
            let config = match &args.config {
                Some(path) => SimConfig::from_path(path)?,
                None => SimConfig::default(),
            };
            Simulation::new(demo_world(args.player), config, args.seed)
        }
    };
    info!(tick = sim.world().tick, seed = sim.seed(), days = args.days, "starting run");

    for report in sim.run(args.days) {
        if args.summary {
            if !report.narrative.is_empty() {
                println!("Day {} ({}):\n{}", report.tick, report.season, report.narrative);
            }
        } else {
            println!("{}", serde_json::to_string(&report)?);
        }
    }

    let state = sim.world().game_state;
    info!(tick = sim.world().tick, status = %state.status, winner = ?state.winner, "run finished");

    if let Some(path) = &args.save {
        sim.save(path)?;
    }
    if let Some(dir) = &args.jsonl {
        flush_to_jsonl(sim.world(), dir)?;
    }
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("realm_sim=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "realm-sim failed");
            ExitCode::FAILURE
        }
    }
}
