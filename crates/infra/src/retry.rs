//! Bounded re-execution of a unit of work that lost an optimistic race.

use tracing::{debug, warn};

use crate::error::LedgerError;
use crate::store::{CommitReceipt, LedgerStore, StoreError, UnitOfWork};

pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// How many times a business event may be re-run after a version conflict.
///
/// Each attempt opens a fresh unit of work and re-reads everything, so a retry
/// never builds on stale data. Non-conflict errors are returned immediately.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

impl RetryPolicy {
    /// At least one attempt is always made.
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Run `body` inside a unit of work and commit it, retrying on conflict.
    ///
    /// `body` may be called more than once and must not have side effects outside
    /// the scope it is given.
    pub fn run<S, T, F>(&self, store: &S, operation: &'static str, mut body: F) -> Result<(T, CommitReceipt), LedgerError>
    where
        S: LedgerStore + ?Sized,
        F: FnMut(&mut S::Scope) -> Result<T, LedgerError>,
    {
        for attempt in 1..=self.max_attempts {
            let mut scope = store.begin()?;

            let value = match body(&mut scope) {
                Ok(value) => value,
                Err(err) if err.is_transient() => {
                    scope.abort();
                    warn!(operation, attempt, error = %err, "conflict while staging; retrying");
                    continue;
                }
                Err(err) => {
                    scope.abort();
                    return Err(err);
                }
            };

            match scope.commit() {
                Ok(receipt) => {
                    debug!(operation, attempt, ledger_head = receipt.ledger_head, "committed");
                    return Ok((value, receipt));
                }
                Err(StoreError::Conflict(reason)) => {
                    warn!(operation, attempt, %reason, "conflict at commit; retrying");
                }
                Err(other) => return Err(other.into()),
            }
        }

        warn!(operation, attempts = self.max_attempts, "retry budget exhausted");
        Err(LedgerError::ConflictRetryExhausted {
            attempts: self.max_attempts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryLedgerStore;

    #[test]
    fn zero_attempts_still_runs_once() {
        assert_eq!(RetryPolicy::new(0).max_attempts(), 1);
    }

    #[test]
    fn transient_body_errors_are_retried_until_exhausted() {
        let store = InMemoryLedgerStore::new();
        let mut calls = 0;
        let err = RetryPolicy::new(3)
            .run(&store, "test", |_| -> Result<(), LedgerError> {
                calls += 1;
                Err(StoreError::Conflict("busy".into()).into())
            })
            .unwrap_err();

        assert_eq!(calls, 3);
        assert_eq!(err, LedgerError::ConflictRetryExhausted { attempts: 3 });
    }

    #[test]
    fn permanent_errors_are_not_retried() {
        let store = InMemoryLedgerStore::new();
        let mut calls = 0;
        let err = RetryPolicy::default()
            .run(&store, "test", |_| -> Result<(), LedgerError> {
                calls += 1;
                Err(LedgerError::InvalidInput("nope".into()))
            })
            .unwrap_err();

        assert_eq!(calls, 1);
        assert_eq!(err.code(), "invalid_input");
    }

    #[test]
    fn success_returns_value_and_receipt() {
        let store = InMemoryLedgerStore::new();
        let (value, receipt) = RetryPolicy::default().run(&store, "test", |_| Ok(42)).unwrap();
        assert_eq!(value, 42);
        assert!(receipt.transactions.is_empty());
    }
}
