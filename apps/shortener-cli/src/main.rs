//! shortener-cli: terminal front end for the URL Shortener batch form.
//!
//! Presents the five-row form as a line-oriented session: edit rows with
//! `set`, shorten them with `submit`, review links with `list`. Records live
//! only for the session. Each row outcome is reported to the remote log
//! collector in the background.
//!
//! Run:
//! ```bash
//! # pretty logs (default) on stderr
//! cargo run -p shortener-cli
//!
//! # json logs, no telemetry, reject reused shortcodes
//! LOG_FORMAT=json TELEMETRY_ENABLED=false SHORTCODE_POLICY=unique \
//!   cargo run -p shortener-cli
//! ```
//!
//! Configuration: See `config.rs` for all environment variables.

mod config;
mod session;

use std::io::Write;

use domain::adapters::recording_sink::NoopSink;
use domain::processor::RecordProcessor;
use domain::shortcode::NanoidGenerator;
use domain::{SystemClock, TelemetrySink};
use log_collector::{spawn_worker, CollectorClient, WorkerStats};
use session::{Command, Session, HELP};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task::JoinHandle;
use tracing::{error, info, trace, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() {
    if std::env::args().skip(1).any(|a| a == "-h" || a == "--help") {
        println!("{}\n\n{}", domain::about(), HELP);
        return;
    }

    // Load and validate config first (fail fast on misconfiguration)
    let cfg = match config::Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    init_tracing(&cfg);
    cfg.log_summary();

    let (sink, worker) = build_sink(&cfg);
    let processor = RecordProcessor::new(NanoidGenerator::default(), SystemClock, sink)
        .with_policy(cfg.shortcode_policy);
    let mut session = Session::new(processor, cfg.shortlink_domain.clone());

    println!("{}", domain::about());
    println!("Type 'help' for commands.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        if let Err(e) = std::io::stdout().flush() {
            trace!(error = %e, "prompt flush failed");
        }

        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                error!(error = %e, "failed to read input");
                break;
            }
        };

        match Command::parse(&line) {
            Ok(None) => {}
            Ok(Some(Command::Quit)) => break,
            Ok(Some(cmd)) => {
                for out in session.handle(cmd) {
                    println!("{}", out);
                }
            }
            Err(msg) => println!("error: {}", msg),
        }
    }

    info!(records = session.store().len(), "session ended");

    // Dropping the session drops the last emitter handle, which lets the
    // worker finish in-flight deliveries and stop.
    drop(session);
    if let Some(worker) = worker {
        match worker.await {
            Ok(stats) => info!(
                delivered = stats.delivered,
                failed = stats.failed,
                "telemetry flushed"
            ),
            Err(e) => warn!(error = %e, "telemetry worker did not finish cleanly"),
        }
    }
}

// Pick the telemetry sink based on config.
fn build_sink(cfg: &config::Config) -> (Box<dyn TelemetrySink>, Option<JoinHandle<WorkerStats>>) {
    if !cfg.telemetry_enabled {
        return (Box::new(NoopSink), None);
    }
    let (emitter, worker) = spawn_worker(CollectorClient::new(cfg.collector_url.clone()));
    info!(endpoint = %cfg.collector_url, "telemetry enabled");
    (Box::new(emitter), Some(worker))
}

fn init_tracing(cfg: &config::Config) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(env_filter);
    // Logs go to stderr; stdout is the form's output.
    match cfg.log_format {
        config::LogFormat::Json => {
            registry
                .with(
                    fmt::layer()
                        .json()
                        .with_target(true)
                        .with_timer(fmt::time::SystemTime)
                        .with_writer(std::io::stderr),
                )
                .init();
        }
        config::LogFormat::Pretty => {
            registry
                .with(
                    fmt::layer()
                        .pretty()
                        .with_target(true)
                        .with_writer(std::io::stderr),
                )
                .init();
        }
    }
}
