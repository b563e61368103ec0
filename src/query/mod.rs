pub mod pattern;
pub mod predicate;

pub use predicate::{CompareOp, Operand, Predicate, PropertySource, SELF_PROPERTY};

use crate::storage::ListId;

/// Ordering of a view by one property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortDescriptor {
    pub property: String,
    pub ascending: bool,
}

impl SortDescriptor {
    pub fn new(property: impl Into<String>, ascending: bool) -> Self {
        Self {
            property: property.into(),
            ascending,
        }
    }
}

/// Query describing a list's logical contents.
///
/// Starts as "every element of the list, in stored order"; filters narrow it
/// and a sort descriptor reorders it. Queries are plain values, so a view
/// built from one is unaffected by later changes to the query it was copied
/// from.
#[derive(Debug, Clone, PartialEq)]
pub struct LogicalQuery {
    source: ListId,
    filters: Vec<Predicate>,
    sort: Option<SortDescriptor>,
}

impl LogicalQuery {
    pub fn for_list(source: ListId) -> Self {
        Self {
            source,
            filters: Vec::new(),
            sort: None,
        }
    }

    pub fn source(&self) -> ListId {
        self.source
    }

    pub fn filters(&self) -> &[Predicate] {
        &self.filters
    }

    pub fn sort(&self) -> Option<&SortDescriptor> {
        self.sort.as_ref()
    }

    /// Adds a predicate; all filters must hold for an element to match.
    pub fn and_where(mut self, predicate: Predicate) -> Self {
        self.filters.push(predicate);
        self
    }

    /// Replaces any previous ordering.
    pub fn sorted_by(mut self, sort: SortDescriptor) -> Self {
        self.sort = Some(sort);
        self
    }
}
