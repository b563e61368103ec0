// ============================================================================
// Transaction Management Module
// ============================================================================
//
// Write transactions are explicit: beginning one yields a guard whose token
// must be passed to every mutating list operation. Changes are applied to
// the store immediately and journaled so that rollback can reverse them.
//
// ============================================================================

pub mod change;
pub mod handle;
pub mod state;

pub use change::Change;
pub use handle::WriteTransaction;
pub use state::{Transaction, TransactionId, TransactionState, TxToken};
