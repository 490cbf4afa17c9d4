// ============================================================================
// Unit-of-Work State Management
// ============================================================================
//
// A unit of work moves through:
//
//   NotStarted ──begin──> Active ──commit────> Committed ──┐
//                            │                             ├──close──> Closed
//                            └────rollback──> RolledBack ──┘
//
// close() is accepted from every state and is idempotent.
//
// ============================================================================

use super::Change;
use crate::core::{DbError, Result};
use std::time::{Duration, Instant};

/// Identifier of one transaction within a session factory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TransactionId(pub u64);

impl std::fmt::Display for TransactionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "txn_{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionState {
    NotStarted,
    Active,
    Committed,
    RolledBack,
    Closed,
}

impl TransactionState {
    /// Check if the unit of work accepts writes
    pub fn is_active(&self) -> bool {
        matches!(self, TransactionState::Active)
    }
}

impl std::fmt::Display for TransactionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransactionState::NotStarted => write!(f, "NOT_STARTED"),
            TransactionState::Active => write!(f, "ACTIVE"),
            TransactionState::Committed => write!(f, "COMMITTED"),
            TransactionState::RolledBack => write!(f, "ROLLED_BACK"),
            TransactionState::Closed => write!(f, "CLOSED"),
        }
    }
}

/// Bookkeeping for one unit of work: its state and the writes it recorded.
#[derive(Debug)]
pub struct Transaction {
    id: TransactionId,
    state: TransactionState,
    changes: Vec<Change>,
    start_time: Option<Instant>,
}

impl Transaction {
    pub fn new(id: TransactionId) -> Self {
        Self {
            id,
            state: TransactionState::NotStarted,
            changes: Vec::new(),
            start_time: None,
        }
    }

    pub fn id(&self) -> TransactionId {
        self.id
    }

    pub fn state(&self) -> TransactionState {
        self.state
    }

    pub fn changes(&self) -> &[Change] {
        &self.changes
    }

    pub fn change_count(&self) -> usize {
        self.changes.len()
    }

    /// Time since `begin`, zero if the transaction never started
    pub fn duration(&self) -> Duration {
        self.start_time.map(|t| t.elapsed()).unwrap_or_default()
    }

    pub fn begin(&mut self) -> Result<()> {
        if self.state != TransactionState::NotStarted {
            return Err(DbError::ExecutionError(format!(
                "Cannot begin: transaction {} is {}",
                self.id, self.state
            )));
        }
        self.state = TransactionState::Active;
        self.start_time = Some(Instant::now());
        Ok(())
    }

    /// Fails unless the transaction is active
    pub fn ensure_active(&self, operation: &str) -> Result<()> {
        if !self.state.is_active() {
            return Err(DbError::ExecutionError(format!(
                "Cannot {}: transaction {} is {}",
                operation, self.id, self.state
            )));
        }
        Ok(())
    }

    pub fn record_change(&mut self, change: Change) -> Result<()> {
        self.ensure_active("record change")?;
        self.changes.push(change);
        Ok(())
    }

    /// Mark as committed. The caller applies `changes()` to the store first.
    pub fn commit(&mut self) -> Result<()> {
        self.ensure_active("commit")?;
        self.changes.clear();
        self.state = TransactionState::Committed;
        Ok(())
    }

    /// Mark as rolled back and discard recorded changes
    pub fn rollback(&mut self) -> Result<()> {
        self.ensure_active("rollback")?;
        self.changes.clear();
        self.state = TransactionState::RolledBack;
        Ok(())
    }

    /// Close from any state. Returns the state it was closed from, or
    /// `None` when it was already closed.
    pub fn close(&mut self) -> Option<TransactionState> {
        if self.state == TransactionState::Closed {
            return None;
        }
        let previous = self.state;
        self.changes.clear();
        self.state = TransactionState::Closed;
        Some(previous)
    }
}
