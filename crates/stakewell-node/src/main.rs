//! stakewell-node: deploys a staking pool and replays a command script.
//!
//! Usage: `stakewell-node [SCRIPT.json]`
//!
//! Outcomes and ledger events are written to stdout as JSON lines, followed
//! by the final pool snapshot. Without a script the node reports the
//! deployed pool's rate parameters and exits.

use std::path::PathBuf;

use anyhow::Context;
use stakewell_node::events::DEFAULT_CAPACITY;
use stakewell_node::{script, Clock, EventBus, LedgerService, ManualClock, NodeConfig, SystemClock};
use tokio::sync::broadcast::error::TryRecvError;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Load config
    let config = NodeConfig::load()?;

    // 2. Initialize tracing
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(format!("stakewell={}", config.logging.level).parse()?),
        )
        .init();

    info!(data_dir = %NodeConfig::data_dir().display(), "stakewell node starting");

    // 3. Deploy the pool
    let start = config.clock.manual_start.unwrap_or_else(|| SystemClock.now());
    let clock = ManualClock::new(start);
    let bus = EventBus::new(DEFAULT_CAPACITY);
    // Subscribe first so events recorded during deployment are printed too.
    let mut events = bus.subscribe();
    let service = LedgerService::deploy(&config.pool, clock, bus)
        .await
        .context("deploying pool")?;

    // 4. Replay the script, if any
    let Some(path) = std::env::args().nth(1).map(PathBuf::from) else {
        let info = service.rate_info().await?;
        println!("{}", serde_json::to_string(&info)?);
        return Ok(());
    };
    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("reading script {}", path.display()))?;
    let commands = script::parse(&content)
        .with_context(|| format!("parsing script {}", path.display()))?;
    info!(steps = commands.len(), script = %path.display(), "replaying script");

    let outcomes = script::run(&service, &commands).await;
    for outcome in &outcomes {
        println!("{}", serde_json::to_string(outcome)?);
    }
    loop {
        match events.try_recv() {
            Ok(event) => println!("{}", serde_json::to_string(&event)?),
            Err(TryRecvError::Lagged(skipped)) => warn!(skipped, "event output lagged"),
            Err(_) => break,
        }
    }
    println!("{}", serde_json::to_string(&service.snapshot().await)?);

    let failed = outcomes.iter().filter(|o| !o.is_ok()).count();
    if failed > 0 {
        warn!(failed, "some script steps were rejected");
    }
    info!(steps = outcomes.len(), "script finished");
    Ok(())
}
