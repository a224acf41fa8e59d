//! Headless Riposte Runner
//!
//! Replays a scenario of host payloads through the riposte rules and prints
//! what happened to each contest.

use riposte::core::error::Result;
use riposte::core::types::Round;
use riposte::core::RiposteConfig;
use riposte::host::{select_resolver, HostCapabilities};
use riposte::rules::{HandlerOutcome, RiposteHandler};

use clap::Parser;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Replay opposed-test payloads through the riposte rules
#[derive(Parser, Debug)]
#[command(name = "riposte")]
#[command(about = "Replay opposed-test payloads through the riposte rules")]
struct Args {
    /// Scenario file (JSON)
    #[arg(long)]
    scenario: PathBuf,

    /// Rule config (TOML); built-in defaults when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output format: json or text
    #[arg(long, default_value = "json")]
    format: String,
}

/// Scenario file layout
#[derive(Deserialize)]
struct Scenario {
    #[serde(default)]
    host: HostCapabilities,
    events: Vec<ScenarioEvent>,
}

#[derive(Deserialize)]
struct ScenarioEvent {
    /// Encounter round, absent outside combat
    #[serde(default)]
    round: Option<Round>,
    payload: Value,
}

#[derive(Serialize)]
struct EventReport {
    index: usize,
    round: Option<Round>,
    #[serde(flatten)]
    result: Option<HandlerOutcome>,
    /// Why the event could not be handled
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// Run every event through `handler`; a failing event is reported, not fatal
fn replay(handler: &mut RiposteHandler, events: &[ScenarioEvent]) -> Vec<EventReport> {
    events
        .iter()
        .enumerate()
        .map(|(index, event)| {
            let (result, error) = match handler.handle(&event.payload, event.round) {
                Ok(outcome) => (Some(outcome), None),
                Err(e) => {
                    tracing::error!(index, round = ?event.round, "event failed: {}", e);
                    (None, Some(e.to_string()))
                }
            };
            EventReport {
                index,
                round: event.round,
                result,
                error,
            }
        })
        .collect()
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("riposte=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => RiposteConfig::load(path)?,
        None => RiposteConfig::default(),
    };

    let scenario: Scenario = serde_json::from_str(&fs::read_to_string(&args.scenario)?)?;

    let Some(resolver) = select_resolver(scenario.host) else {
        eprintln!("Scenario host exposes no opposed-test results; nothing to do");
        return Ok(());
    };
    let mut handler = RiposteHandler::new(&config, resolver);

    let reports = replay(&mut handler, &scenario.events);

    match args.format.as_str() {
        "text" => {
            for report in &reports {
                println!("{}", describe(report));
            }
        }
        _ => println!("{}", serde_json::to_string_pretty(&reports)?),
    }

    Ok(())
}

fn describe(report: &EventReport) -> String {
    let round = report
        .round
        .map(|r| format!("round {}", r))
        .unwrap_or_else(|| "no encounter".to_string());

    let detail = match (&report.result, &report.error) {
        (Some(HandlerOutcome::Skipped { reason }), _) => format!("skipped ({:?})", reason),
        (Some(HandlerOutcome::Suppressed { reason, .. }), _) => {
            format!("defender damage suppressed ({})", reason)
        }
        (
            Some(HandlerOutcome::Retaliated {
                outcome,
                effect,
                rank,
                used,
            }),
            _,
        ) => match used {
            Some(used) => format!(
                "{} for {} damage ({}/{} this round)",
                effect,
                outcome.damage_from_defender(),
                used,
                rank
            ),
            None => format!("{} for {} damage", effect, outcome.damage_from_defender()),
        },
        (None, error) => format!("failed: {}", error.as_deref().unwrap_or("unknown error")),
    };

    format!("#{} [{}] {}", report.index, round, detail)
}
