pub mod dispatch;
pub mod mutation;
pub mod property;
pub mod views;

pub use dispatch::{ListMethod, MethodResult};
pub use property::{HostObject, PropertyValue, SetOutcome};

use crate::core::{ElementSchema, ListError, Result, Value};
use crate::query::LogicalQuery;
use crate::storage::{ListId, MemoryStore, StoreBackend};
use crate::transaction::TxToken;
use std::fmt;
use std::sync::{Arc, Weak};
use tracing::debug;

/// Array-like adapter over a list owned by a store.
///
/// The adapter only holds a weak reference to its store: once the store is
/// closed or dropped every operation fails with [`ListError::Invalidated`].
/// Any number of adapters may wrap the same list.
pub struct ManagedList<B: StoreBackend = MemoryStore> {
    store: Weak<B>,
    id: ListId,
    schema: ElementSchema,
}

impl<B: StoreBackend> ManagedList<B> {
    pub fn new(store: Weak<B>, id: ListId, schema: ElementSchema) -> Self {
        Self { store, id, schema }
    }

    pub fn id(&self) -> ListId {
        self.id
    }

    pub fn schema(&self) -> &ElementSchema {
        &self.schema
    }

    /// Whether the owning store session is still open
    pub fn is_valid(&self) -> bool {
        self.store.upgrade().is_some_and(|store| store.is_open())
    }

    pub(crate) fn store(&self) -> Result<Arc<B>> {
        match self.store.upgrade() {
            Some(store) if store.is_open() => Ok(store),
            _ => Err(ListError::Invalidated),
        }
    }

    pub(crate) fn weak_store(&self) -> Weak<B> {
        self.store.clone()
    }

    /// Resolves the store for a mutation, checking the token first.
    pub(crate) fn writable(&self, tx: TxToken) -> Result<Arc<B>> {
        let store = self.store()?;
        store.verify_in_transaction(tx)?;
        Ok(store)
    }

    pub fn len(&self) -> Result<usize> {
        self.store()?.list_size(self.id)
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    pub fn get(&self, index: usize) -> Result<Value> {
        self.store()?.list_get(self.id, index)
    }

    pub fn set(&self, tx: TxToken, index: usize, value: Value) -> Result<()> {
        let store = self.writable(tx)?;
        store.list_set(tx, self.id, index, value)?;
        debug!(list = %self.id, index, "list element set");
        Ok(())
    }

    /// The query this list answers: every element, in stored order
    pub fn current_query(&self) -> LogicalQuery {
        LogicalQuery::for_list(self.id)
    }

    pub fn to_vec(&self) -> Result<Vec<Value>> {
        let store = self.store()?;
        let size = store.list_size(self.id)?;
        (0..size).map(|index| store.list_get(self.id, index)).collect()
    }
}

impl<B: StoreBackend> Clone for ManagedList<B> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            id: self.id,
            schema: self.schema.clone(),
        }
    }
}

impl<B: StoreBackend> fmt::Debug for ManagedList<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManagedList")
            .field("id", &self.id)
            .field("schema", &self.schema)
            .field("valid", &self.is_valid())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StoreConfig;
    use crate::core::DataType;

    #[test]
    fn test_get_and_set() {
        let store = MemoryStore::open(StoreConfig::default());
        let tx = store.begin_write().unwrap();
        let list = store
            .create_list(tx.token(), ElementSchema::primitive(DataType::Text))
            .unwrap();
        list.push(tx.token(), &["a".into(), "b".into()]).unwrap();
        list.set(tx.token(), 1, "c".into()).unwrap();
        tx.commit().unwrap();

        assert_eq!(list.len().unwrap(), 2);
        assert_eq!(list.get(1).unwrap(), Value::from("c"));
        assert_eq!(
            list.get(2),
            Err(ListError::OutOfRange { index: 2, size: 2 })
        );
    }

    #[test]
    fn test_set_requires_transaction_before_range() {
        let store = MemoryStore::open(StoreConfig::default());
        let tx = store.begin_write().unwrap();
        let token = tx.token();
        let list = store
            .create_list(token, ElementSchema::primitive(DataType::Integer))
            .unwrap();
        tx.commit().unwrap();

        assert_eq!(
            list.set(token, 5, Value::Integer(1)),
            Err(ListError::WriteOutsideTransaction)
        );
    }

    #[test]
    fn test_set_rejects_wrong_type() {
        let store = MemoryStore::open(StoreConfig::default());
        let tx = store.begin_write().unwrap();
        let list = store
            .create_list(tx.token(), ElementSchema::primitive(DataType::Integer))
            .unwrap();
        list.push(tx.token(), &[Value::Integer(1)]).unwrap();

        let err = list.set(tx.token(), 0, "one".into()).unwrap_err();
        assert!(matches!(err, ListError::TypeMismatch(_)));
        assert_eq!(list.get(0).unwrap(), Value::Integer(1));
    }

    #[test]
    fn test_invalidated_after_store_dropped() {
        let store = MemoryStore::open(StoreConfig::default());
        let tx = store.begin_write().unwrap();
        let list = store
            .create_list(tx.token(), ElementSchema::primitive(DataType::Integer))
            .unwrap();
        tx.commit().unwrap();
        assert!(list.is_valid());

        drop(store);
        assert!(!list.is_valid());
        assert_eq!(list.len(), Err(ListError::Invalidated));
    }
}
