//! Array-shaped mutations built on the store's insert/remove primitives.
//!
//! Every operation verifies the transaction token before looking at the
//! list, so misuse outside a write transaction is reported even when the
//! call would otherwise change nothing.

use super::ManagedList;
use crate::core::{Arity, Result, Value};
use crate::storage::StoreBackend;
use crate::transaction::TxToken;
use tracing::debug;

impl<B: StoreBackend> ManagedList<B> {
    /// Appends `values` in order and returns the new length.
    pub fn push(&self, tx: TxToken, values: &[Value]) -> Result<usize> {
        Arity::AtLeast(1).check("push", values.len())?;
        let store = self.writable(tx)?;
        let values = self.convert_all(values)?;

        let mut size = store.list_size(self.id)?;
        for value in values {
            store.list_insert(tx, self.id, size, value)?;
            size += 1;
        }
        debug!(list = %self.id, size, "push");
        Ok(size)
    }

    /// Removes and returns the last element, or `None` if the list is empty.
    pub fn pop(&self, tx: TxToken) -> Result<Option<Value>> {
        let store = self.writable(tx)?;
        let size = store.list_size(self.id)?;
        if size == 0 {
            return Ok(None);
        }
        let value = store.list_remove(tx, self.id, size - 1)?;
        debug!(list = %self.id, size = size - 1, "pop");
        Ok(Some(value))
    }

    /// Removes and returns the first element, or `None` if the list is empty.
    pub fn shift(&self, tx: TxToken) -> Result<Option<Value>> {
        let store = self.writable(tx)?;
        let size = store.list_size(self.id)?;
        if size == 0 {
            return Ok(None);
        }
        let value = store.list_remove(tx, self.id, 0)?;
        debug!(list = %self.id, size = size - 1, "shift");
        Ok(Some(value))
    }

    /// Inserts `values` at the front, keeping their order, and returns the
    /// new length.
    pub fn unshift(&self, tx: TxToken, values: &[Value]) -> Result<usize> {
        Arity::AtLeast(1).check("unshift", values.len())?;
        let store = self.writable(tx)?;
        let values = self.convert_all(values)?;

        for (index, value) in values.into_iter().enumerate() {
            store.list_insert(tx, self.id, index, value)?;
        }
        let size = store.list_size(self.id)?;
        debug!(list = %self.id, size, "unshift");
        Ok(size)
    }

    /// Removes `delete_count` elements at `start`, inserts `items` in their
    /// place and returns the removed elements.
    ///
    /// A negative `start` counts from the end. A missing `delete_count`
    /// removes everything from `start` on; otherwise it is clamped to the
    /// elements available.
    pub fn splice(
        &self,
        tx: TxToken,
        start: i64,
        delete_count: Option<i64>,
        items: &[Value],
    ) -> Result<Vec<Value>> {
        let store = self.writable(tx)?;
        let items = self.convert_all(items)?;
        let size = store.list_size(self.id)?;
        let (start, delete_count) = normalize_splice(size, start, delete_count);

        let mut removed = Vec::with_capacity(delete_count);
        for _ in 0..delete_count {
            removed.push(store.list_remove(tx, self.id, start)?);
        }
        let inserted = items.len();
        for (offset, item) in items.into_iter().enumerate() {
            store.list_insert(tx, self.id, start + offset, item)?;
        }

        debug!(
            list = %self.id,
            start,
            removed = removed.len(),
            inserted,
            "splice"
        );
        Ok(removed)
    }

    fn convert_all(&self, values: &[Value]) -> Result<Vec<Value>> {
        values
            .iter()
            .map(|value| self.schema.coerce(value.clone()))
            .collect()
    }
}

/// Resolves splice arguments against a list of `size` elements into an
/// in-bounds start position and removal count.
pub(crate) fn normalize_splice(size: usize, start: i64, delete_count: Option<i64>) -> (usize, usize) {
    let len = i64::try_from(size).unwrap_or(i64::MAX);
    let mut start = start.min(len);
    if start < 0 {
        start = len.saturating_add(start).max(0);
    }
    let available = len - start;
    let delete_count = match delete_count {
        None => available,
        Some(count) => count.clamp(0, available),
    };
    (start as usize, delete_count as usize)
}
