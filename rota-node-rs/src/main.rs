//! ROTA Node
//!
//! Console front end for the duty roster scheduler. Each input line stands
//! in for a chat interaction; roster panels are printed as they change.

mod access;
mod console;
mod directory;
mod presenter;

use access::AccessPolicy;
use clap::Parser;
use console::{Command, USAGE};
use directory::OperatorDirectory;
use presenter::TextPresenter;
use rota_core::{
    AnchorId, RandomSelector, RosterError, RotationScheduler, SchedulerConfig, SeededSelector,
    UniformSelector,
};
use std::io::{self, BufRead};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info};
use tracing_subscriber::{fmt, EnvFilter};

/// ROTA duty roster node
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Staff channel in which sessions may be opened
    #[arg(short, long, env = "ROTA_STAFF_SCOPE", default_value = "0", allow_hyphen_values = true)]
    staff_scope: i64,

    /// Operators allowed to open sessions (comma-separated ids)
    #[arg(short, long, env = "ROTA_OPERATORS", value_delimiter = ',')]
    operators: Vec<i64>,

    /// Enrollment window in seconds
    #[arg(long, default_value = "120", value_parser = clap::value_parser!(u64).range(1..))]
    enrollment_secs: u64,

    /// Shift length in seconds
    #[arg(long, default_value = "1800", value_parser = clap::value_parser!(u64).range(1..))]
    rotation_secs: u64,

    /// Seed for reproducible shift draws
    #[arg(long)]
    seed: Option<u64>,

    /// Log level (trace, debug, info, warn, error); RUST_LOG takes precedence
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Setup logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    fmt().with_env_filter(filter).with_target(false).init();

    let config = SchedulerConfig::default()
        .with_enrollment_window(Duration::from_secs(args.enrollment_secs))
        .with_rotation_period(Duration::from_secs(args.rotation_secs));

    let access = AccessPolicy::new(args.staff_scope, args.operators.iter().copied());
    let directory = Arc::new(OperatorDirectory::new());
    let presenter = Arc::new(TextPresenter::new(
        directory.clone(),
        config.enrollment_window,
        config.rotation_period,
    ));
    let selector: Arc<dyn RandomSelector> = match args.seed {
        Some(seed) => Arc::new(SeededSelector::new(seed)),
        None => Arc::new(UniformSelector),
    };
    let scheduler = RotationScheduler::new(config, selector, presenter);

    info!(
        "ROTA node starting: staff scope {}, {} operators",
        args.staff_scope,
        access.operator_count()
    );

    // Spawn stdin reader
    let (command_tx, mut command_rx) = mpsc::channel::<Command>(16);
    std::thread::spawn(move || {
        println!("\n{}\n", USAGE);

        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else {
                break;
            };
            match Command::parse(&line) {
                Ok(Some(command)) => {
                    if command_tx.blocking_send(command).is_err() {
                        break;
                    }
                }
                Ok(None) => {}
                Err(e) => println!("{}", e),
            }
        }
    });

    // Anchors stand in for the ids of the messages a chat would post
    let mut next_anchor: AnchorId = 1;

    while let Some(command) = command_rx.recv().await {
        match command {
            Command::Start { operator, scope } => {
                let scope = scope.unwrap_or(args.staff_scope);
                if !access.may_start(scope, operator) {
                    debug!("Ignoring start from {} in scope {}", operator, scope);
                    continue;
                }

                let anchor = next_anchor;
                match scheduler.request_session_start(scope, anchor).await {
                    Ok(_) => {
                        next_anchor += 1;
                        info!("Operator {} opened session {}", operator, anchor);
                    }
                    Err(RosterError::AlreadyActive { anchor }) => {
                        println!(
                            "A roster session is already active (anchor {}).\nAnother one cannot start until it ends.",
                            anchor
                        );
                    }
                    Err(e) => println!("{}", e),
                }
            }

            Command::Join { anchor, operator } => {
                match scheduler.request_join(anchor, operator).await {
                    Ok(_) => println!("{} joined the session.", directory.display(operator)),
                    Err(_) => println!("This session is no longer active."),
                }
            }

            Command::Leave { anchor, operator } => {
                match scheduler.request_leave(anchor, operator).await {
                    Ok(_) => println!("{} left the session.", directory.display(operator)),
                    Err(_) => println!("This session is no longer active."),
                }
            }

            Command::Name { operator, name } => {
                directory.upsert(operator, &name);
                println!("Operator {} is now shown as {}", operator, directory.display(operator));
            }

            Command::Status => match scheduler.active_snapshot().await {
                Some(snapshot) => println!("{}", serde_json::to_string_pretty(&snapshot)?),
                None => println!("No active session."),
            },

            Command::Help => println!("{}", USAGE),

            Command::Quit => break,
        }
    }

    info!("ROTA node stopped");
    Ok(())
}
