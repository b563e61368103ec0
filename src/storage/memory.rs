use super::{Catalog, ListId, StoreBackend, StoreId};
use crate::config::StoreConfig;
use crate::core::{
    ElementSchema, ListError, ObjectId, ObjectRef, ObjectSchema, Result, Row, Value,
};
use crate::list::ManagedList;
use crate::query::{LogicalQuery, PropertySource, SELF_PROPERTY};
use crate::transaction::{Change, Transaction, TransactionId, TxToken, WriteTransaction};
use im::Vector;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::{debug, info, trace};

#[derive(Debug)]
struct StoredList {
    schema: ElementSchema,
    items: Vector<Value>,
}

#[derive(Debug)]
struct StoredObject {
    class: String,
    row: Row,
}

#[derive(Debug, Default)]
struct StoreState {
    open: bool,
    catalog: Catalog,
    active: Option<Transaction>,
    objects: HashMap<ObjectId, StoredObject>,
    lists: HashMap<ListId, StoredList>,
    next_list_id: u64,
}

/// In-memory transactional store holding object classes, objects and lists.
///
/// Writes apply immediately and are journaled in the active write
/// transaction; rollback (explicit, on drop of the transaction guard, or on
/// [`close`](Self::close)) undoes them in reverse order.
#[derive(Debug)]
pub struct MemoryStore {
    id: StoreId,
    config: StoreConfig,
    state: RwLock<StoreState>,
}

impl MemoryStore {
    pub fn open(config: StoreConfig) -> Arc<Self> {
        info!(store = %config.name, "store opened");
        Arc::new(Self {
            id: StoreId::new(),
            config,
            state: RwLock::new(StoreState {
                open: true,
                ..StoreState::default()
            }),
        })
    }

    pub fn id(&self) -> StoreId {
        self.id
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn register_class(&self, schema: ObjectSchema) -> Result<()> {
        let mut state = self.state.write()?;
        state.ensure_open()?;
        debug!(store = %self.config.name, class = schema.name(), "class registered");
        state.catalog = state.catalog.clone().with_class(schema)?;
        Ok(())
    }

    pub fn begin_write(self: &Arc<Self>) -> Result<WriteTransaction> {
        let mut state = self.state.write()?;
        state.ensure_open()?;
        if let Some(active) = &state.active {
            return Err(ListError::StoreFailure(format!(
                "The store is already in write transaction {}",
                active.id()
            )));
        }

        let id = TransactionId::new();
        state.active = Some(Transaction::new(id));
        debug!(store = %self.config.name, transaction = %id, "write transaction started");
        Ok(WriteTransaction::new(Arc::clone(self), TxToken::new(self.id, id)))
    }

    pub fn is_in_write_transaction(&self) -> bool {
        self.state
            .read()
            .map(|state| state.open && state.active.is_some())
            .unwrap_or(false)
    }

    pub(crate) fn commit_transaction(&self, tx: TxToken) -> Result<()> {
        let mut state = self.state.write()?;
        state.verify_tx(self.id, tx)?;
        if let Some(mut txn) = state.active.take() {
            let changes = txn.change_count();
            txn.commit()?;
            debug!(
                store = %self.config.name,
                transaction = %txn.id(),
                changes,
                elapsed_us = txn.duration().as_micros() as u64,
                "write transaction committed"
            );
        }
        Ok(())
    }

    pub(crate) fn rollback_transaction(&self, tx: TxToken) -> Result<()> {
        let mut state = self.state.write()?;
        state.verify_tx(self.id, tx)?;
        state.abort_active()?;
        debug!(store = %self.config.name, transaction = %tx.transaction(), "write transaction rolled back");
        Ok(())
    }

    /// Closes the session. An open write transaction is rolled back and every
    /// adapter or view on this store becomes invalid.
    pub fn close(&self) -> Result<()> {
        let mut state = self.state.write()?;
        if !state.open {
            return Ok(());
        }
        state.abort_active()?;
        state.open = false;
        info!(store = %self.config.name, "store closed");
        Ok(())
    }

    pub fn is_closed(&self) -> bool {
        !self.is_open()
    }

    /// Creates an object of a registered class from a full row of values.
    pub fn create_object(&self, tx: TxToken, class: &str, values: Row) -> Result<ObjectRef> {
        let mut state = self.state.write()?;
        state.verify_tx(self.id, tx)?;
        let schema = state.catalog.get_class(class)?.clone();
        let row = schema.validate_row(values)?;
        for value in &row {
            if let Value::Object(link) = value {
                state.ensure_object(link)?;
            }
        }

        let id = ObjectId::new();
        state.objects.insert(
            id,
            StoredObject {
                class: class.to_string(),
                row,
            },
        );
        state.record(Change::ObjectCreate { id })?;
        trace!(class, object = %id, "object created");
        Ok(ObjectRef::new(id, class))
    }

    /// Creates an empty list and returns an adapter over it.
    pub fn create_list(self: &Arc<Self>, tx: TxToken, schema: ElementSchema) -> Result<ManagedList> {
        let mut state = self.state.write()?;
        state.verify_tx(self.id, tx)?;
        if let Some(class) = schema.object_class() {
            state.catalog.get_class(class)?;
        }

        state.next_list_id += 1;
        let id = ListId(state.next_list_id);
        state.lists.insert(
            id,
            StoredList {
                schema: schema.clone(),
                items: Vector::new(),
            },
        );
        state.record(Change::ListCreate { list: id })?;
        debug!(store = %self.config.name, list = %id, element = %schema, "list created");
        Ok(ManagedList::new(Arc::downgrade(self), id, schema))
    }

    /// Opens another adapter over an existing list.
    pub fn list(self: &Arc<Self>, id: ListId) -> Result<ManagedList> {
        let state = self.state.read()?;
        state.ensure_open()?;
        let schema = state.list(id)?.schema.clone();
        Ok(ManagedList::new(Arc::downgrade(self), id, schema))
    }
}

impl StoreBackend for MemoryStore {
    fn is_open(&self) -> bool {
        self.state.read().map(|state| state.open).unwrap_or(false)
    }

    fn verify_in_transaction(&self, tx: TxToken) -> Result<()> {
        self.state.read()?.verify_tx(self.id, tx)
    }

    fn list_schema(&self, list: ListId) -> Result<ElementSchema> {
        let state = self.state.read()?;
        state.ensure_open()?;
        Ok(state.list(list)?.schema.clone())
    }

    fn list_size(&self, list: ListId) -> Result<usize> {
        let state = self.state.read()?;
        state.ensure_open()?;
        Ok(state.list(list)?.items.len())
    }

    fn list_get(&self, list: ListId, index: usize) -> Result<Value> {
        let state = self.state.read()?;
        state.ensure_open()?;
        let items = &state.list(list)?.items;
        items.get(index).cloned().ok_or(ListError::OutOfRange {
            index,
            size: items.len(),
        })
    }

    fn list_set(&self, tx: TxToken, list: ListId, index: usize, value: Value) -> Result<()> {
        let mut state = self.state.write()?;
        state.verify_tx(self.id, tx)?;
        let value = state.check_element(list, value)?;
        let items = &mut state.list_mut(list)?.items;
        if index >= items.len() {
            return Err(ListError::OutOfRange {
                index,
                size: items.len(),
            });
        }
        let old_value = items.set(index, value);
        state.record(Change::ListSet {
            list,
            index,
            old_value,
        })
    }

    fn list_insert(&self, tx: TxToken, list: ListId, index: usize, value: Value) -> Result<()> {
        let mut state = self.state.write()?;
        state.verify_tx(self.id, tx)?;
        let value = state.check_element(list, value)?;
        let items = &mut state.list_mut(list)?.items;
        if index > items.len() {
            return Err(ListError::OutOfRange {
                index,
                size: items.len(),
            });
        }
        items.insert(index, value);
        state.record(Change::ListInsert { list, index })
    }

    fn list_remove(&self, tx: TxToken, list: ListId, index: usize) -> Result<Value> {
        let mut state = self.state.write()?;
        state.verify_tx(self.id, tx)?;
        let items = &mut state.list_mut(list)?.items;
        if index >= items.len() {
            return Err(ListError::OutOfRange {
                index,
                size: items.len(),
            });
        }
        let old_value = items.remove(index);
        state.record(Change::ListRemove {
            list,
            index,
            old_value: old_value.clone(),
        })?;
        Ok(old_value)
    }

    fn object_schema(&self, class: &str) -> Result<ObjectSchema> {
        let state = self.state.read()?;
        state.ensure_open()?;
        state.catalog.get_class(class).cloned()
    }

    fn evaluate(&self, query: &LogicalQuery) -> Result<Vector<Value>> {
        let state = self.state.read()?;
        state.ensure_open()?;
        state.evaluate(query)
    }

    fn refine(&self, elements: &Vector<Value>, query: &LogicalQuery) -> Result<Vector<Value>> {
        let state = self.state.read()?;
        state.ensure_open()?;
        state.refine(elements, query)
    }

    fn object_property(&self, object: &ObjectRef, property: &str) -> Result<Value> {
        let state = self.state.read()?;
        state.ensure_open()?;
        state.property_of(&Value::Object(object.clone()), property)
    }

    fn live_views_by_default(&self) -> bool {
        self.config.live_views
    }
}

impl StoreState {
    fn ensure_open(&self) -> Result<()> {
        if self.open {
            Ok(())
        } else {
            Err(ListError::Invalidated)
        }
    }

    fn verify_tx(&self, store: StoreId, tx: TxToken) -> Result<()> {
        self.ensure_open()?;
        let active = self.active.as_ref().map(Transaction::id);
        if tx.store() == store && active == Some(tx.transaction()) {
            Ok(())
        } else {
            Err(ListError::WriteOutsideTransaction)
        }
    }

    fn record(&mut self, change: Change) -> Result<()> {
        match self.active.as_mut() {
            Some(txn) => txn.record_change(change),
            None => Err(ListError::WriteOutsideTransaction),
        }
    }

    fn abort_active(&mut self) -> Result<()> {
        if let Some(mut txn) = self.active.take() {
            for change in txn.rollback()? {
                self.undo(change);
            }
        }
        Ok(())
    }

    fn undo(&mut self, change: Change) {
        trace!(list = ?change.list_id(), "undo {:?}", change);
        match change {
            Change::ListCreate { list } => {
                self.lists.remove(&list);
            }
            Change::ListInsert { list, index } => {
                if let Some(stored) = self.lists.get_mut(&list) {
                    stored.items.remove(index);
                }
            }
            Change::ListRemove {
                list,
                index,
                old_value,
            } => {
                if let Some(stored) = self.lists.get_mut(&list) {
                    stored.items.insert(index, old_value);
                }
            }
            Change::ListSet {
                list,
                index,
                old_value,
            } => {
                if let Some(stored) = self.lists.get_mut(&list) {
                    stored.items.set(index, old_value);
                }
            }
            Change::ObjectCreate { id } => {
                self.objects.remove(&id);
            }
        }
    }

    fn list(&self, id: ListId) -> Result<&StoredList> {
        self.lists
            .get(&id)
            .ok_or_else(|| ListError::StoreFailure(format!("List {} not found", id)))
    }

    fn list_mut(&mut self, id: ListId) -> Result<&mut StoredList> {
        self.lists
            .get_mut(&id)
            .ok_or_else(|| ListError::StoreFailure(format!("List {} not found", id)))
    }

    fn ensure_object(&self, object: &ObjectRef) -> Result<()> {
        match self.objects.get(&object.id) {
            Some(stored) if stored.class == object.class => Ok(()),
            _ => Err(ListError::TypeMismatch(format!(
                "Object {} of type '{}' is not managed by this store",
                object.id, object.class
            ))),
        }
    }

    /// Converts a value for storage in `list`, rejecting foreign objects.
    fn check_element(&self, list: ListId, value: Value) -> Result<Value> {
        let value = self.list(list)?.schema.coerce(value)?;
        if let Value::Object(object) = &value {
            self.ensure_object(object)?;
        }
        Ok(value)
    }

    fn property_of(&self, value: &Value, property: &str) -> Result<Value> {
        let Value::Object(object) = value else {
            return Err(ListError::Query(format!(
                "Cannot read property '{}' of a {} value",
                property,
                value.type_name()
            )));
        };
        let stored = self.objects.get(&object.id).ok_or_else(|| {
            ListError::StoreFailure(format!("Object {} no longer exists", object.id))
        })?;
        let schema = self.catalog.get_class(&stored.class)?;
        let index = schema.find_column_index(property).ok_or_else(|| {
            ListError::Query(format!(
                "Property '{}' not found in object of type '{}'",
                property, stored.class
            ))
        })?;
        Ok(stored.row[index].clone())
    }

    fn resolve(&self, element: &Value, path: &[String]) -> Result<Value> {
        let (first, rest) = path
            .split_first()
            .ok_or_else(|| ListError::Query("Empty key path".into()))?;
        let mut current = if first == SELF_PROPERTY {
            element.clone()
        } else {
            self.property_of(element, first)?
        };
        for segment in rest {
            if current.is_null() {
                return Ok(Value::Null);
            }
            current = self.property_of(&current, segment)?;
        }
        Ok(current)
    }

    fn evaluate(&self, query: &LogicalQuery) -> Result<Vector<Value>> {
        let list = self.list(query.source())?;
        self.refine(&list.items, query)
    }

    /// Filters and orders `elements` by the query, ignoring its source list.
    fn refine(&self, elements: &Vector<Value>, query: &LogicalQuery) -> Result<Vector<Value>> {
        let mut matched = Vector::new();
        'elements: for element in elements.iter() {
            let row = ElementRow {
                state: self,
                element,
            };
            for filter in query.filters() {
                if !filter.evaluate(&row)? {
                    continue 'elements;
                }
            }
            matched.push_back(element.clone());
        }

        let Some(sort) = query.sort() else {
            return Ok(matched);
        };

        let path: Vec<String> = sort.property.split('.').map(str::to_string).collect();
        let mut keyed = matched
            .into_iter()
            .map(|element| Ok((self.resolve(&element, &path)?, element)))
            .collect::<Result<Vec<_>>>()?;
        // Stable: equal keys keep stored order
        keyed.sort_by(|(a, _), (b, _)| {
            let ordering = a.compare(b).unwrap_or(Ordering::Equal);
            if sort.ascending {
                ordering
            } else {
                ordering.reverse()
            }
        });
        Ok(keyed.into_iter().map(|(_, element)| element).collect())
    }
}

struct ElementRow<'a> {
    state: &'a StoreState,
    element: &'a Value,
}

impl PropertySource for ElementRow<'_> {
    fn resolve(&self, path: &[String]) -> Result<Value> {
        self.state.resolve(self.element, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Column, DataType};

    fn store_with_dogs() -> Arc<MemoryStore> {
        let store = MemoryStore::open(StoreConfig::default());
        store
            .register_class(ObjectSchema::new(
                "Dog",
                vec![
                    Column::new("name", DataType::Text).not_null(),
                    Column::new("age", DataType::Integer),
                ],
            ))
            .unwrap();
        store
    }

    #[test]
    fn test_single_write_transaction() {
        let store = store_with_dogs();
        let tx = store.begin_write().unwrap();
        assert!(store.is_in_write_transaction());
        assert!(matches!(
            store.begin_write(),
            Err(ListError::StoreFailure(_))
        ));
        tx.commit().unwrap();
        assert!(!store.is_in_write_transaction());
    }

    #[test]
    fn test_rollback_undoes_list_and_object_changes() {
        let store = store_with_dogs();
        let tx = store.begin_write().unwrap();
        let list = store
            .create_list(tx.token(), ElementSchema::primitive(DataType::Integer))
            .unwrap();
        tx.commit().unwrap();

        let tx = store.begin_write().unwrap();
        let token = tx.token();
        store.list_insert(token, list.id(), 0, Value::Integer(1)).unwrap();
        store.list_insert(token, list.id(), 1, Value::Integer(2)).unwrap();
        store.list_set(token, list.id(), 0, Value::Integer(10)).unwrap();
        store.list_remove(token, list.id(), 1).unwrap();
        let rex = store
            .create_object(token, "Dog", vec!["Rex".into(), Value::Integer(3)])
            .unwrap();
        tx.rollback().unwrap();

        assert_eq!(store.list_size(list.id()).unwrap(), 0);
        assert!(store.object_property(&rex, "name").is_err());
    }

    #[test]
    fn test_dropped_transaction_rolls_back() {
        let store = store_with_dogs();
        let list_id = {
            let tx = store.begin_write().unwrap();
            store
                .create_list(tx.token(), ElementSchema::object("Dog"))
                .unwrap()
                .id()
        };
        assert!(!store.is_in_write_transaction());
        assert!(matches!(
            store.list(list_id),
            Err(ListError::StoreFailure(_))
        ));
    }

    #[test]
    fn test_foreign_objects_rejected() {
        let store = store_with_dogs();
        let other = store_with_dogs();

        let tx = other.begin_write().unwrap();
        let stranger = other
            .create_object(tx.token(), "Dog", vec!["Fido".into(), Value::Null])
            .unwrap();
        tx.commit().unwrap();

        let tx = store.begin_write().unwrap();
        let list = store
            .create_list(tx.token(), ElementSchema::object("Dog"))
            .unwrap();
        let err = store
            .list_insert(tx.token(), list.id(), 0, Value::Object(stranger))
            .unwrap_err();
        assert!(matches!(err, ListError::TypeMismatch(_)));
    }

    #[test]
    fn test_evaluate_sorts_with_nulls_last() {
        let store = store_with_dogs();
        let tx = store.begin_write().unwrap();
        let token = tx.token();
        let list = store
            .create_list(token, ElementSchema::object("Dog"))
            .unwrap();
        for (name, age) in [("a", Value::Integer(5)), ("b", Value::Null), ("c", Value::Integer(1))] {
            let dog = store
                .create_object(token, "Dog", vec![name.into(), age])
                .unwrap();
            let size = store.list_size(list.id()).unwrap();
            store.list_insert(token, list.id(), size, dog.into()).unwrap();
        }
        tx.commit().unwrap();

        let query = LogicalQuery::for_list(list.id())
            .sorted_by(crate::query::SortDescriptor::new("age", true));
        let names: Vec<Value> = store
            .evaluate(&query)
            .unwrap()
            .iter()
            .map(|dog| store.object_property(dog.as_object().unwrap(), "name").unwrap())
            .collect();
        assert_eq!(names, vec![Value::from("c"), "a".into(), "b".into()]);
    }

    #[test]
    fn test_close_rolls_back_and_invalidates() {
        let store = store_with_dogs();
        let tx = store.begin_write().unwrap();
        let token = tx.token();
        store.close().unwrap();

        assert!(store.is_closed());
        assert!(matches!(
            store.verify_in_transaction(token),
            Err(ListError::Invalidated)
        ));
        drop(tx);
    }
}
