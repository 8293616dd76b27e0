//! `dispo`: replays material events into an in-memory dispo.
//!
//! Reads one JSON-encoded material event per line from stdin, dispatches
//! them to the stock handler and exits once all of them are handled.

use std::io::{self, BufRead};
use std::process::ExitCode;

use tracing::{error, info, warn};

use dispo_events::MaterialEvent;
use dispo_infra::{DispoConfig, build_service};

fn main() -> ExitCode {
    let config = match DispoConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("dispo: {err}");
            return ExitCode::FAILURE;
        }
    };
    dispo_observability::init_with(&config.observability());

    let service = match build_service(&config) {
        Ok(service) => service,
        Err(err) => {
            error!(error = %err, "failed to start dispo service");
            return ExitCode::FAILURE;
        }
    };

    let mut published = 0usize;
    for (index, line) in io::stdin().lock().lines().enumerate() {
        let line = match line {
            Ok(line) => line,
            Err(err) => {
                error!(error = %err, "failed to read stdin");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        match serde_json::from_str::<MaterialEvent>(&line) {
            Ok(event) => {
                if let Err(err) = service.publish(event) {
                    error!(error = %err, "failed to publish material event");
                    break;
                }
                published += 1;
            }
            Err(err) => warn!(line = index + 1, error = %err, "skipping undecodable material event"),
        }
    }

    let store = service.shutdown();
    info!(published, candidates = store.len(), "dispo service stopped");
    ExitCode::SUCCESS
}
