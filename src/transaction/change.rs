// ============================================================================
// Transaction Change Tracking
// ============================================================================
//
// Each Change records enough of the prior state to reverse one primitive
// store operation during rollback.
//
// ============================================================================

use crate::core::{ObjectId, Value};
use crate::storage::ListId;

#[derive(Debug, Clone, PartialEq)]
pub enum Change {
    /// A list was created
    ListCreate { list: ListId },

    /// A value was inserted at `index`
    ListInsert { list: ListId, index: usize },

    /// The value at `index` was removed
    ListRemove {
        list: ListId,
        index: usize,
        old_value: Value,
    },

    /// The value at `index` was overwritten
    ListSet {
        list: ListId,
        index: usize,
        old_value: Value,
    },

    /// An object was created
    ObjectCreate { id: ObjectId },
}

impl Change {
    /// The list affected by this change, if any
    pub fn list_id(&self) -> Option<ListId> {
        match self {
            Change::ListCreate { list }
            | Change::ListInsert { list, .. }
            | Change::ListRemove { list, .. }
            | Change::ListSet { list, .. } => Some(*list),
            Change::ObjectCreate { .. } => None,
        }
    }
}
