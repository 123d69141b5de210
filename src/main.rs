use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use frontier_dialogs::dialogs::DialogPolicy;
use frontier_dialogs::replay::{Scenario, ScenarioRunner};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let subscriber_result = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
    if subscriber_result.is_err() {
        // tracing was already initialised; continue silently
    }

    let scenario_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .context("usage: frontier-dialogs <scenario.yaml>")?;

    let scenario = Scenario::load(&scenario_path)
        .with_context(|| format!("failed to load scenario {}", scenario_path.display()))?;

    let policy = match scenario.policy {
        Some(policy) => policy,
        None => DialogPolicy::load(DialogPolicy::default_path())
            .context("failed to load dialog policy")?,
    };
    info!(
        scenario = %scenario_path.display(),
        pages = scenario.pages.len(),
        steps = scenario.steps.len(),
        ?policy,
        "replaying dialog scenario"
    );

    let events = ScenarioRunner::new(policy).run(&scenario)?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    for event in &events {
        serde_json::to_writer(&mut out, event)?;
        writeln!(out)?;
    }

    info!(events = events.len(), "scenario complete");
    Ok(())
}
