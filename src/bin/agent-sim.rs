//! Agent Sim CLI - terminal front end for the simulator
//!
//! Provides subcommands for writing a config, listing the roster and script,
//! playing the scripted run, and running ad-hoc tasks.

use std::path::{Path, PathBuf};

use agent_sim::runtime::control::{Dispatch, SimView};
use agent_sim::runtime::types::AgentId;
use agent_sim::runtime::{SimConfig, Simulator, check_time_scale, driver, storage};
use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tokio::sync::watch;

#[derive(Parser)]
#[command(name = "agent-sim")]
#[command(about = "Timed multi-agent wedding-planning simulator", long_about = None)]
struct Cli {
    /// Directory holding config.json (built-in defaults if absent)
    #[arg(short, long, default_value = ".agent-sim")]
    root: PathBuf,

    /// Playback speed factor (overrides the config; 0 plays instantly)
    #[arg(long)]
    speed: Option<f64>,

    /// Print the final state as JSON
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default config file
    Init {
        /// Entries retained per agent log
        #[arg(long, default_value = "5")]
        log_capacity: usize,

        /// Playback speed factor
        #[arg(long, default_value = "1.0")]
        time_scale: f64,
    },

    /// List agents and their sample tasks
    Roster,

    /// List the script steps
    Script,

    /// Play the scripted run
    Run,

    /// Run one ad-hoc task
    Task {
        /// Agent ID
        #[arg(long)]
        agent: String,

        /// Task label (defaults to the agent's first sample task)
        #[arg(long)]
        label: Option<String>,
    },

    /// Run one sample task on every agent at once
    Demo,
}

fn open(root: &Path) -> Result<Simulator> {
    if root.join(storage::CONFIG_FILE).exists() {
        Ok(Simulator::load(root.to_path_buf())?)
    } else {
        Ok(Simulator::with_defaults(SimConfig::default())?)
    }
}

/// The `--speed` override, or the configured time scale
fn playback_speed(speed: Option<f64>, sim: &Simulator) -> Result<f64> {
    let speed = speed.unwrap_or(sim.config().time_scale);
    check_time_scale(speed).context("invalid --speed")
}

fn print_entries(view: &SimView, from: usize) -> usize {
    for entry in view.snapshot.global_log.iter().skip(from) {
        println!(
            "[{}] {:<24} {}",
            entry.timestamp.format("%H:%M:%S%.3f"),
            entry.agent_name,
            entry.message
        );
    }
    view.snapshot.global_log.len()
}

fn print_summary(view: &SimView) {
    println!();
    for agent in &view.snapshot.agents {
        println!("{:<24} {:<10} {}", agent.name, agent.status, agent.latest_activity());
    }
}

/// Echo new global log entries as views are published
fn spawn_printer(mut rx: watch::Receiver<SimView>, mut printed: usize) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while rx.changed().await.is_ok() {
            let view = rx.borrow_and_update().clone();
            printed = print_entries(&view, printed);
        }
        let view = rx.borrow().clone();
        print_entries(&view, printed);
    })
}

/// Play pending timers, echoing the log, until the run is over or Ctrl-C
async fn play(mut sim: Simulator, speed: f64, json: bool) -> Result<()> {
    let mut rx = sim.subscribe();
    let printed = print_entries(&rx.borrow_and_update(), 0);
    let printer = spawn_printer(rx, printed);

    let interrupted = tokio::select! {
        _ = driver::play(&mut sim, speed) => false,
        _ = tokio::signal::ctrl_c() => true,
    };
    if interrupted {
        tracing::info!("interrupted; resetting");
        sim.reset();
    }

    let view = sim.view();
    drop(sim);
    printer.await.context("log printer failed")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&view)?);
    } else {
        print_summary(&view);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init {
            log_capacity,
            time_scale,
        } => {
            let config = SimConfig {
                log_capacity,
                time_scale,
                ..SimConfig::default()
            };
            config.validate()?;
            storage::write_config(&cli.root, &config)?;
            println!("Wrote {:?}", cli.root.join(storage::CONFIG_FILE));
        }

        Commands::Roster => {
            let sim = open(&cli.root)?;
            for agent in sim.store().agents() {
                println!("{} ({})", agent.name, agent.id);
                println!("    {}", agent.description);
                for task in &agent.sample_tasks {
                    println!("    - {}", task);
                }
            }
        }

        Commands::Script => {
            let sim = open(&cli.root)?;
            let script = sim.script();
            for (i, step) in script.steps().iter().enumerate() {
                let status = step.status.map(|s| s.to_string()).unwrap_or_default();
                let target = step
                    .target_status
                    .map(|s| format!(" -> {}", s))
                    .unwrap_or_default();
                println!(
                    "{:>3}. {:<24} {:<10}{} +{}ms  {}",
                    i, step.agent, status, target, step.delay_ms, step.message
                );
            }
            println!("{} steps, {}ms total", script.len(), script.duration_ms());
        }

        Commands::Run => {
            let mut sim = open(&cli.root)?;
            let speed = playback_speed(cli.speed, &sim)?;
            if let Dispatch::Ignored(reason) = sim.start() {
                bail!("run not started: {:?}", reason);
            }
            play(sim, speed, cli.json).await?;
        }

        Commands::Task { agent, label } => {
            let mut sim = open(&cli.root)?;
            let speed = playback_speed(cli.speed, &sim)?;
            let id = AgentId::new(agent);
            let label = match label {
                Some(label) => label,
                None => sim
                    .store()
                    .agent(&id)
                    .and_then(|a| a.sample_tasks.first().cloned())
                    .with_context(|| format!("no agent '{}' with sample tasks", id))?,
            };
            if let Dispatch::Ignored(reason) = sim.run_task(&id, &label) {
                bail!("task not started: {:?}", reason);
            }
            play(sim, speed, cli.json).await?;
        }

        Commands::Demo => {
            let mut sim = open(&cli.root)?;
            let speed = playback_speed(cli.speed, &sim)?;
            let jobs: Vec<_> = sim
                .store()
                .agents()
                .iter()
                .filter_map(|a| a.sample_tasks.first().map(|t| (a.id.clone(), t.clone())))
                .collect();
            for (id, label) in jobs {
                let _ = sim.run_task(&id, &label);
            }
            play(sim, speed, cli.json).await?;
        }
    }

    Ok(())
}
