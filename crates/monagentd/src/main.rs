//! monagentd - monitoring agent daemon.
//!
//! Registers the built-in plugins, builds the pipeline described by the
//! configuration file and runs it at a fixed interval until interrupted.

mod pipeline;

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use chrono::Utc;
use clap::Parser;
use monagent_core::config::AgentConfig;
use monagent_core::plugins::{PluginKind, PluginManagers, process_managers, register_builtin_plugins};
use tracing::level_filters::LevelFilter;
use tracing::{Level, error, info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::Directive;

use crate::pipeline::Pipeline;

/// Monitoring agent daemon.
#[derive(Parser, Debug)]
#[command(name = "monagentd", about = "Monitoring agent daemon", version)]
struct Args {
    /// Pipeline configuration file (JSON). Without it, local inputs are
    /// printed to stdout.
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Collection interval in seconds.
    #[arg(short, long, default_value = "15")]
    interval: u64,

    /// Run a single cycle, print the response envelope and exit.
    #[arg(long)]
    once: bool,

    /// List registered plugins and exit.
    #[arg(long)]
    list_plugins: bool,

    /// Increase logging verbosity (-v for debug, -vv for trace). Default is info level.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Quiet mode - only show errors.
    #[arg(short, long)]
    quiet: bool,
}

/// Initializes the tracing subscriber with the appropriate log level.
/// Default level is INFO. Use -q for quiet mode (errors only).
fn init_logging(verbose: u8, quiet: bool) {
    let level = if quiet {
        Level::ERROR
    } else {
        match verbose {
            0 => Level::INFO,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        }
    };

    let directive = |target: &str| {
        format!("{}={}", target, level)
            .parse::<Directive>()
            .unwrap_or_else(|_| LevelFilter::from_level(level).into())
    };
    let filter = EnvFilter::from_default_env()
        .add_directive(directive("monagentd"))
        .add_directive(directive("monagent_core"))
        .add_directive(directive("pgstat_exporter"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// One line per registered plugin: kind, name, description.
fn describe_plugins(managers: &PluginManagers) -> Vec<String> {
    let mut lines = Vec::new();
    for kind in PluginKind::ALL {
        for name in managers.names(kind) {
            let description = match kind {
                PluginKind::Input => managers.input().get_plugin(&name).map(|p| p.description()),
                PluginKind::Processor => managers.processor().get_plugin(&name).map(|p| p.description()),
                PluginKind::Output => managers.output().get_plugin(&name).map(|p| p.description()),
                PluginKind::Exporter => managers.exporter().get_plugin(&name).map(|p| p.description()),
            }
            .unwrap_or("");
            lines.push(format!("{:<10} {:<10} {}", kind, name, description));
        }
    }
    lines
}

fn hostname() -> String {
    std::fs::read_to_string("/proc/sys/kernel/hostname")
        .map(|h| h.trim().to_string())
        .unwrap_or_else(|_| "unknown".to_string())
}

fn trace_id() -> String {
    format!("{:x}-{:x}", Utc::now().timestamp_micros(), std::process::id())
}

fn main() {
    let args = Args::parse();

    init_logging(args.verbose, args.quiet);

    let managers = process_managers();
    if let Err(e) = register_builtin_plugins(managers) {
        error!("Plugin registration failed: {}", e);
        std::process::exit(1);
    }

    if args.list_plugins {
        for line in describe_plugins(managers) {
            println!("{}", line);
        }
        return;
    }

    info!("monagentd {} starting", env!("CARGO_PKG_VERSION"));

    let config = match &args.config {
        Some(path) => AgentConfig::load(path),
        None => Ok(AgentConfig::local_defaults()),
    };
    let config = match config {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    let mut pipeline = match Pipeline::build(managers, &config) {
        Ok(pipeline) => pipeline,
        Err(e) => {
            error!("Failed to build pipeline: {}", e);
            std::process::exit(1);
        }
    };
    info!("Pipeline ready: {} plugins, interval={}s", pipeline.len(), args.interval);

    if args.once {
        let started = Instant::now();
        let report = pipeline.run_cycle();
        pipeline.close();

        let response = report
            .into_response()
            .with_duration(started.elapsed())
            .with_server(hostname())
            .with_trace_id(trace_id());
        match serde_json::to_string_pretty(&response) {
            Ok(json) => println!("{}", json),
            Err(e) => error!("Failed to encode response: {}", e),
        }
        if !response.successful {
            std::process::exit(2);
        }
        return;
    }

    let interval = Duration::from_secs(args.interval.max(1));

    // Setup graceful shutdown
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();

    if let Err(e) = ctrlc::set_handler(move || {
        info!("Received shutdown signal");
        r.store(false, Ordering::SeqCst);
    }) {
        warn!("Failed to set Ctrl-C handler: {}", e);
    }

    info!("Starting collection loop");

    let mut cycle: u64 = 0;
    while running.load(Ordering::SeqCst) {
        cycle += 1;
        let report = pipeline.run_cycle();
        if report.errors.is_empty() {
            info!("Cycle #{}: {} metrics", cycle, report.metrics.len());
        } else {
            warn!(
                "Cycle #{}: {} metrics, {} plugin errors",
                cycle,
                report.metrics.len(),
                report.errors.len()
            );
        }

        // Sleep with periodic checks for shutdown signal
        let sleep_interval = Duration::from_millis(100);
        let mut remaining = interval;
        while remaining > Duration::ZERO && running.load(Ordering::SeqCst) {
            let sleep_time = remaining.min(sleep_interval);
            std::thread::sleep(sleep_time);
            remaining = remaining.saturating_sub(sleep_time);
        }
    }

    info!("Shutting down...");
    pipeline.close();
    info!("Shutdown complete");
}
