// ============================================================================
// Unit-of-Work Transactions
// ============================================================================
//
// Writes are buffered per transaction (Command Pattern) and handed to the
// storage engine as one batch on commit. Rollback and close discard them.
//
// ============================================================================

pub mod change;
pub mod state;

pub use change::Change;
pub use state::{Transaction, TransactionId, TransactionState};
