use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use log::info;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

use drivesched::api::{ApiStatus, GetContentCallback, SimulatedRemote};
use drivesched::domain::{PriorityClass, QueueType};
use drivesched::network::{ConnectionType, SimulatedNetwork, StaticPreferences};
use drivesched::scheduler::{Collaborators, Scheduler, SchedulerHandle, SchedulerStats};

mod cli;
mod config;

use cli::Cli;
use cli::commands::{Commands, SimulateArgs};
use config::{Config, SimulationConfig};

const DEFAULT_TIMEOUT_SECS: u64 = 60;

fn setup_logging(config: &Config) -> Result<()> {
    // Create log directory
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("drivesched")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let log_file = log_dir.join("drivesched.log");

    // Setup env_logger with file output
    let target = Box::new(
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .context("Failed to open log file")?,
    );

    let level = config.log_level.as_deref().unwrap_or("info");
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .target(env_logger::Target::Pipe(target))
        .init();

    info!("Logging initialized, writing to: {}", log_file.display());
    Ok(())
}

fn run_application(cli: &Cli, config: &Config) -> Result<()> {
    info!("Starting application");

    if cli.is_verbose() {
        println!("{}", "Verbose mode enabled".yellow());
    }

    match &cli.command {
        None => handle_simulate_command(&SimulateArgs::default(), cli.is_verbose(), config),
        Some(Commands::Simulate(args)) => handle_simulate_command(args, cli.is_verbose(), config),
        Some(Commands::Config) => handle_config_command(config),
    }
}

fn handle_config_command(config: &Config) -> Result<()> {
    print!("{}", config.to_yaml()?);
    Ok(())
}

fn handle_simulate_command(args: &SimulateArgs, verbose: bool, config: &Config) -> Result<()> {
    let runtime = tokio::runtime::Runtime::new().context("Failed to start tokio runtime")?;
    runtime.block_on(simulate(args, verbose, config))
}

/// Result of one workload job as reported by its callback
#[derive(Debug)]
struct JobResult {
    label: String,
    queue: QueueType,
    priority: PriorityClass,
    status: ApiStatus,
    elapsed: Duration,
}

/// Hands out callbacks that report into one results channel
#[derive(Clone)]
struct Reporter {
    tx: mpsc::UnboundedSender<JobResult>,
    started: Instant,
}

impl Reporter {
    fn report(&self, label: String, queue: QueueType, priority: PriorityClass, status: ApiStatus) {
        let _ = self.tx.send(JobResult {
            label,
            queue,
            priority,
            status,
            elapsed: self.started.elapsed(),
        });
    }
}

fn effective_simulation(args: &SimulateArgs, config: &Config) -> SimulationConfig {
    let mut sim = config.simulation.clone();
    if let Some(n) = args.metadata {
        sim.metadata_jobs = n;
    }
    if let Some(n) = args.files {
        sim.file_jobs = n;
    }
    if let Some(rate) = args.throttle_rate {
        sim.throttle_rate = rate;
    }
    if let Some(ms) = args.latency_ms {
        sim.latency_ms = ms;
    }
    sim
}

fn priority_for(i: usize) -> PriorityClass {
    PriorityClass::ALL[i % PriorityClass::ALL.len()]
}

/// Submit the metadata half of the workload. Returns the number of jobs.
fn submit_metadata_jobs(handle: &SchedulerHandle, count: usize, reporter: &Reporter) -> usize {
    let q = QueueType::Metadata;
    for i in 0..count {
        let r = reporter.clone();
        match i % 6 {
            0 => {
                let label = format!("search doc{}", i);
                handle.search(format!("title contains 'doc{}'", i), move |status, _| {
                    r.report(label, q, PriorityClass::UserInitiated, status)
                });
            }
            1 => {
                let priority = priority_for(i);
                let label = format!("entry file:{}", i);
                handle.get_resource_entry(format!("file:{}", i), priority, move |status, _| {
                    r.report(label, q, priority, status)
                });
            }
            2 => {
                let label = format!("changes since {}", i * 100);
                handle.get_change_list((i * 100) as i64, move |status, _| {
                    r.report(label, q, PriorityClass::UserInitiated, status)
                });
            }
            3 => {
                let label = format!("list folder:{}", i);
                handle.get_resource_list_in_directory(format!("folder:{}", i), move |status, _| {
                    r.report(label, q, PriorityClass::UserInitiated, status)
                });
            }
            4 => {
                let label = format!("mkdir dir-{}", i);
                handle.add_new_directory("folder:root", format!("dir-{}", i), move |status, _| {
                    r.report(label, q, PriorityClass::UserInitiated, status)
                });
            }
            _ => {
                let label = format!("rename file:{}", i);
                handle.rename_resource(format!("file:{}", i), format!("renamed-{}.txt", i), move |status| {
                    r.report(label, q, PriorityClass::UserInitiated, status)
                });
            }
        }
    }
    count
}

/// Submit the file half of the workload. Returns how many jobs the metered
/// policy will hold back.
fn submit_file_jobs(
    handle: &SchedulerHandle,
    count: usize,
    metered: bool,
    reporter: &Reporter,
    streamed: &Arc<AtomicUsize>,
) -> usize {
    let q = QueueType::File;
    let mut held_back = 0;
    for i in 0..count {
        let priority = priority_for(i);
        if metered && priority.is_deferrable() {
            held_back += 1;
        }

        let r = reporter.clone();
        if i % 2 == 0 {
            let label = format!("download doc{}.txt", i);
            let bytes = streamed.clone();
            let content: GetContentCallback = Arc::new(move |_status, chunk: &[u8]| {
                bytes.fetch_add(chunk.len(), Ordering::Relaxed);
            });
            handle.download_file(
                format!("/drive/root/doc{}.txt", i),
                format!("/tmp/drivesched/cache/doc{}", i),
                format!("https://drive.example.test/download/{}", i),
                priority,
                Some(content),
                move |status, _| r.report(label, q, priority, status),
            );
        } else {
            let label = format!("upload new{}.txt", i);
            handle.upload_new_file(
                "folder:root",
                format!("/drive/root/new{}.txt", i),
                format!("/tmp/drivesched/new{}.txt", i),
                format!("new{}.txt", i),
                "text/plain",
                priority,
                move |outcome| r.report(label, q, priority, outcome.status),
            );
        }
    }
    held_back
}

fn print_result(result: &JobResult) {
    let status = if result.status.is_success() {
        result.status.to_string().green()
    } else {
        result.status.to_string().red()
    };
    println!(
        "{:>7}ms  {:<8} {:<14} {:<28} {}",
        result.elapsed.as_millis(),
        result.queue.to_string().cyan(),
        result.priority.to_string(),
        result.label,
        status
    );
}

fn print_stats(stats: &SchedulerStats, remote: &SimulatedRemote, streamed: usize) {
    println!();
    println!("{}", "Scheduler statistics".bold());
    println!("  submitted:        {}", stats.total_submitted);
    println!("  completed:        {}", stats.total_completed);
    println!("  throttled:        {}", stats.total_throttled.to_string().yellow());
    println!("  throttle streak:  {}", stats.throttle_count);
    for queue in QueueType::ALL {
        let q = stats.queue(queue);
        println!(
            "  {:<8} queued {:>3}  running {}/{}  peak {}",
            queue.to_string().cyan(),
            q.queued,
            q.running,
            q.max_jobs,
            q.peak_running
        );
    }
    println!("  remote calls:     {} ({} throttled)", remote.calls(), remote.throttled());
    println!("  bytes streamed:   {}", streamed);
}

async fn simulate(args: &SimulateArgs, verbose: bool, config: &Config) -> Result<()> {
    let sim = effective_simulation(args, config);
    info!("Simulating with {:?}", sim);

    let remote = Arc::new(SimulatedRemote::new(
        Duration::from_millis(sim.latency_ms),
        sim.throttle_rate,
    ));
    let online = if args.metered {
        ConnectionType::Cellular
    } else {
        ConnectionType::Wifi
    };
    let initial = if args.offline_ms.is_some() {
        ConnectionType::None
    } else {
        online
    };
    let network = Arc::new(SimulatedNetwork::new(initial));
    let preferences = Arc::new(StaticPreferences::new(false, args.metered));

    let handle = Scheduler::spawn(
        config.scheduler.clone(),
        Collaborators {
            service: remote.clone(),
            uploader: remote.clone(),
            network: network.clone(),
            preferences,
        },
    )
    .context("Failed to start scheduler")?;

    let (tx, mut results) = mpsc::unbounded_channel();
    let reporter = Reporter {
        tx,
        started: Instant::now(),
    };
    let streamed = Arc::new(AtomicUsize::new(0));

    let submitted = submit_metadata_jobs(&handle, sim.metadata_jobs, &reporter) + sim.file_jobs;
    let held_back = submit_file_jobs(&handle, sim.file_jobs, args.metered, &reporter, &streamed);
    drop(reporter);
    let expected = submitted - held_back;

    println!(
        "{} {} jobs ({} metadata, {} file), connection {}",
        "Submitted".green(),
        submitted,
        sim.metadata_jobs,
        sim.file_jobs,
        format!("{:?}", initial).cyan()
    );

    if verbose {
        for job in handle.jobs().await? {
            println!("  {} {:?} {} {:?}", job.id, job.job_type, job.priority, job.state);
        }
    }

    if let Some(ms) = args.offline_ms {
        let network = network.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(ms)).await;
            info!("Simulated network coming online: {:?}", online);
            network.set_connection(online);
        });
    }

    let timeout = Duration::from_secs(args.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS));
    let deadline = tokio::time::sleep(timeout);
    tokio::pin!(deadline);

    let mut received = 0;
    while received < expected {
        tokio::select! {
            result = results.recv() => match result {
                Some(result) => {
                    print_result(&result);
                    received += 1;
                }
                None => break,
            },
            _ = &mut deadline => {
                println!(
                    "{} after {}s with {} jobs outstanding",
                    "Timed out".red(),
                    timeout.as_secs(),
                    expected - received
                );
                break;
            }
        }
    }

    if held_back > 0 {
        println!(
            "{} {} background transfers held back on the metered connection",
            "Deferred".yellow(),
            held_back
        );
    }

    let stats = handle.stats().await?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&stats).context("Failed to serialize stats")?);
    } else {
        print_stats(&stats, &remote, streamed.load(Ordering::Relaxed));
    }

    handle.shutdown();
    Ok(())
}

fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    // Setup logging at the configured level
    setup_logging(&config).context("Failed to setup logging")?;

    info!("Starting with config from: {:?}", cli.config);

    // Run the main application logic
    run_application(&cli, &config).context("Application failed")?;

    Ok(())
}
