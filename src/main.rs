use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use log::info;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use ring_traffic_sim::{
    config::{IntegrationScheme, SimulationConfig, UpdatePolicy},
    Command, Scheduler,
};

#[derive(Parser)]
#[command(name = "ring-traffic-sim")]
#[command(about = "Single-lane ring road traffic simulation (Intelligent Driver Model)")]
struct Args {
    /// Simulation configuration file
    #[arg(short, long, default_value = "ring.toml")]
    config: PathBuf,

    /// Random seed for reproducible simulations
    #[arg(short, long)]
    seed: Option<u64>,

    /// Simulated seconds to run for
    #[arg(short, long, default_value_t = 600.0)]
    duration: f64,

    /// Number of vehicles on the ring
    #[arg(long)]
    vehicles: Option<usize>,

    /// Number of vehicles driving with the autonomous profile
    #[arg(long)]
    autonomous: Option<usize>,

    /// Integration scheme
    #[arg(long, value_enum)]
    scheme: Option<Scheme>,

    /// How leader state is read within a step
    #[arg(long, value_enum)]
    policy: Option<Policy>,

    /// Drop an obstacle ahead of the leader at this simulated time (seconds)
    #[arg(long)]
    obstacle_at: Option<f64>,

    /// Slow the leader down at this simulated time (seconds)
    #[arg(long)]
    slow_leader_at: Option<f64>,

    /// Write speed.csv, acc.csv, pos.csv and avs.csv into this directory
    #[arg(short, long)]
    export: Option<PathBuf>,

    /// Pace frames at 60 FPS instead of running as fast as possible
    #[arg(long)]
    realtime: bool,

    /// Enable verbose logging for detailed simulation progress
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum Scheme {
    /// Forward Euler
    Euler,
    /// Fourth-order Runge-Kutta
    Rk4,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum Policy {
    /// In-place updates in ring order
    Sequential,
    /// Compute from the pre-step snapshot, then commit
    Synchronous,
}

const FPS: f64 = 60.0;

fn load_config(args: &Args) -> Result<SimulationConfig> {
    let mut config = if args.config.exists() {
        info!("Loading configuration from: {}", args.config.display());
        SimulationConfig::load_from_file(&args.config)
            .with_context(|| format!("loading {}", args.config.display()))?
    } else {
        info!("{} not found, using built-in defaults", args.config.display());
        SimulationConfig::default()
    };

    if let Some(seed) = args.seed {
        config.random.seed = Some(seed);
    }
    if let Some(count) = args.vehicles {
        config.vehicles.count = count;
    }
    if let Some(count) = args.autonomous {
        config.vehicles.autonomous_count = count;
    }
    if let Some(scheme) = args.scheme {
        config.solver.scheme = match scheme {
            Scheme::Euler => IntegrationScheme::Euler,
            Scheme::Rk4 => IntegrationScheme::Rk4,
        };
    }
    if let Some(policy) = args.policy {
        config.solver.update_policy = match policy {
            Policy::Sequential => UpdatePolicy::Sequential,
            Policy::Synchronous => UpdatePolicy::Synchronous,
        };
    }

    ring_traffic_sim::config::Validate::validate(&config)?;
    Ok(config)
}

fn log_status(scheduler: &Scheduler) {
    let baseline = scheduler.baseline();
    let metres = scheduler.config().export.pixels_per_meter;
    info!(
        "t={:.2}s | flow: {} | vehicles: {} | desired speed {:.2} m/s | headway {} s | max accel {:.2} m/s² | x{} | AVs: {}",
        scheduler.time(),
        scheduler.traffic_flow(),
        scheduler.state().vehicles.len(),
        baseline.desired_speed / metres,
        baseline.time_headway,
        baseline.max_accel / metres,
        scheduler.step_multiplier(),
        scheduler.autonomous_count(),
    );
}

fn main() -> Result<()> {
    let args = Args::parse();

    env_logger::Builder::from_default_env()
        .filter_level(if args.verbose { log::LevelFilter::Debug } else { log::LevelFilter::Info })
        .init();
    info!("Starting Ring Traffic Simulator (Console Mode)");

    let config = load_config(&args)?;
    let mut scheduler = Scheduler::new(config)?;
    info!("Using {} integration", scheduler.backend_name());
    if args.export.is_some() {
        scheduler.recorder_mut().set_enabled(true);
    }

    let mut obstacle_at = args.obstacle_at;
    let mut slow_leader_at = args.slow_leader_at;
    let frame_time = Duration::from_secs_f64(1.0 / FPS);
    let start_time = Instant::now();
    let mut next_report = 1.0;
    let mut frame_count: u64 = 0;

    info!("Running simulation for {:.0} simulated seconds...", args.duration);

    while scheduler.is_running() {
        let frame_start = Instant::now();

        if obstacle_at.is_some_and(|t| scheduler.time() >= t) {
            scheduler.push(Command::ToggleObstacle);
            obstacle_at = None;
        }
        if slow_leader_at.is_some_and(|t| scheduler.time() >= t) {
            scheduler.push(Command::SlowDownLeader);
            slow_leader_at = None;
        }

        scheduler.frame();
        frame_count += 1;

        if scheduler.time() >= next_report {
            log_status(&scheduler);
            next_report = scheduler.time().floor() + 1.0;
        }

        if scheduler.time() >= args.duration {
            scheduler.push(Command::Stop);
            scheduler.frame();
        }

        if args.realtime {
            let elapsed = frame_start.elapsed();
            if elapsed < frame_time {
                std::thread::sleep(frame_time - elapsed);
            }
        }
    }

    let total_time = start_time.elapsed();
    info!("Simulation completed!");
    info!("Simulated time: {:.2}s", scheduler.time());
    info!("Wall time: {:.2}s", total_time.as_secs_f64());
    info!("Total frames: {}", frame_count);
    info!("Final traffic flow: {}", scheduler.traffic_flow());

    if let Some(dir) = &args.export {
        scheduler.recorder().write_csv(dir, scheduler.state())?;
    }

    Ok(())
}
