//! Event orchestrators.
//!
//! Each business event (sale, purchase receipt, manual adjustment, and the
//! catalog/purchase bookkeeping around them) runs as one unit of work through
//! the retry policy. Events are published only after the commit succeeded.
//!
//! ```text
//! request ──▶ LedgerService ──▶ RetryPolicy::run ──▶ UnitOfWork ──commit──▶ EventBus
//!                                      │
//!                                      └──▶ apply_movement (per line)
//! ```

mod adjustment;
mod catalog;
mod receipt;
mod sale;

pub use adjustment::{AdjustStock, StockAdjustment};

use tracing::warn;

use stockpilot_events::{EventBus, EventEnvelope};
use stockpilot_inventory::{CostPolicy, LedgerEvent};

use crate::config::StockpilotConfig;
use crate::retry::RetryPolicy;
use crate::store::{CommitReceipt, LedgerStore};

/// Default row cap of [`LedgerService::low_stock`].
pub const DEFAULT_LOW_STOCK_LIMIT: usize = 100;

/// Row cap of the invoice and purchase listings.
pub const LISTING_LIMIT: usize = 50;

/// Published message type.
pub type LedgerEnvelope = EventEnvelope<LedgerEvent>;

/// Entry point of the stock ledger: orchestrators plus read queries.
#[derive(Debug)]
pub struct LedgerService<S, B> {
    store: S,
    bus: B,
    retry: RetryPolicy,
    cost_policy: CostPolicy,
    low_stock_limit: usize,
}

impl<S, B> LedgerService<S, B>
where
    S: LedgerStore,
    B: EventBus<LedgerEnvelope>,
{
    pub fn new(store: S, bus: B) -> Self {
        Self {
            store,
            bus,
            retry: RetryPolicy::default(),
            cost_policy: CostPolicy::default(),
            low_stock_limit: DEFAULT_LOW_STOCK_LIMIT,
        }
    }

    pub fn from_config(store: S, bus: B, config: &StockpilotConfig) -> Self {
        Self {
            store,
            bus,
            retry: config.ledger.retry_policy(),
            cost_policy: config.ledger.cost_policy,
            low_stock_limit: config.reports.low_stock_limit,
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_cost_policy(mut self, cost_policy: CostPolicy) -> Self {
        self.cost_policy = cost_policy;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn bus(&self) -> &B {
        &self.bus
    }

    pub fn cost_policy(&self) -> CostPolicy {
        self.cost_policy
    }

    /// Publish what a commit wrote: one `StockMoved` per ledger row, then the
    /// event's summary at the commit's ledger head.
    ///
    /// The commit already happened; a failing bus is logged and otherwise
    /// ignored. Consumers catch up from the transaction log.
    fn publish(&self, receipt: &CommitReceipt, summary: LedgerEvent) {
        let moved = receipt
            .transactions
            .iter()
            .map(|t| EventEnvelope::wrap(t.sequence, LedgerEvent::StockMoved(t.into())));
        let summary = EventEnvelope::wrap(receipt.ledger_head, summary);

        for envelope in moved.chain(std::iter::once(summary)) {
            let event_type = envelope.event_type().to_string();
            let sequence = envelope.sequence_number();
            if let Err(err) = self.bus.publish(envelope) {
                warn!(%event_type, sequence, error = %err, "publish failed after commit");
            }
        }
    }
}
