mod demo;

use std::sync::Arc;

use anyhow::Context;

use stockpilot_events::InMemoryEventBus;
use stockpilot_infra::{InMemoryLedgerStore, LedgerService, StockpilotConfig};

fn main() -> anyhow::Result<()> {
    let config = StockpilotConfig::load().context("failed to load configuration")?;
    stockpilot_observability::init(config.logging.format, &config.logging.level);

    tracing::info!(
        cost_policy = ?config.ledger.cost_policy,
        max_attempts = config.ledger.max_attempts,
        "starting demo session"
    );

    let bus = Arc::new(InMemoryEventBus::new());
    let service = LedgerService::from_config(InMemoryLedgerStore::new(), bus.clone(), &config);

    let summary = demo::run(&service, &bus)?;
    println!("{}", serde_json::to_string_pretty(&summary)?);

    if !summary.ledger_balanced || !summary.projection_consistent {
        anyhow::bail!("ledger audit failed");
    }
    Ok(())
}
