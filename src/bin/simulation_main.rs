// simulation_main.rs
use clap::Parser;
use intersection_sim::simulation_engine::vehicles::Axis;
use intersection_sim::{Direction, Engine, SimConfig, Snapshot};
use log::info;
use std::path::PathBuf;
use std::time::Duration;
use tokio::time::{interval, Instant};

/// Headless driver: runs the engine for a while and reports what it sees.
#[derive(Parser)]
#[command(name = "simulation_main")]
#[command(about = "Four-way intersection simulation without a display")]
struct Cli {
    /// JSON file overriding the default simulation settings
    #[arg(long)]
    config: Option<PathBuf>,

    /// How long to run before stopping the engine
    #[arg(long, default_value = "30")]
    seconds: u64,

    /// Print every received snapshot as a JSON line instead of a summary
    #[arg(long)]
    json: bool,

    /// Snapshot polling period in milliseconds
    #[arg(long, default_value = "250")]
    poll_ms: u64,

    /// Extra vehicles to request from the north at startup
    #[arg(long, default_value = "0")]
    burst: usize,
}

#[tokio::main]
async fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => match SimConfig::from_json_file(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Config error: {}", e);
                std::process::exit(1);
            }
        },
        None => SimConfig::default(),
    };

    let mut engine = match Engine::new(config) {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("Engine error: {}", e);
            std::process::exit(1);
        }
    };
    if let Err(e) = engine.start() {
        eprintln!("Engine error: {}", e);
        std::process::exit(1);
    }

    info!(
        "Running for {} seconds at {:?} per tick",
        cli.seconds,
        engine.config().tick_interval()
    );
    let requests = engine.spawn_requests();
    for _ in 0..cli.burst {
        requests.request(Direction::North);
    }

    let deadline = Instant::now() + Duration::from_secs(cli.seconds);
    let mut poll = interval(Duration::from_millis(cli.poll_ms.max(1)));
    while Instant::now() < deadline {
        poll.tick().await;
        let Some(snapshot) = engine.poll_snapshot() else {
            continue;
        };
        if cli.json {
            match serde_json::to_string(&snapshot) {
                Ok(line) => println!("{}", line),
                Err(e) => eprintln!("ERROR serializing snapshot: {}", e),
            }
        } else {
            println!("{}", summary_line(&snapshot));
        }
    }

    info!("Stopping engine after {} seconds", cli.seconds);
    if let Err(e) = engine.stop().await {
        eprintln!("Engine error: {}", e);
        std::process::exit(1);
    }
}

fn summary_line(snapshot: &Snapshot) -> String {
    let lights: Vec<String> = [Axis::NorthSouth, Axis::EastWest]
        .into_iter()
        .map(|axis| {
            let signal = snapshot.lights.signal(axis);
            format!("{} {:?} {:>3}", axis.label(), signal.state, signal.remaining_ticks)
        })
        .collect();
    format!(
        "tick {:>6} | {:?} | {} | vehicles {:>3} waiting {:>3} in box {}",
        snapshot.tick,
        snapshot.phase,
        lights.join(" "),
        snapshot.vehicles.len(),
        snapshot.waiting_count(),
        snapshot.occupying_count()
    )
}
