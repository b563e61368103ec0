//! Host property protocol: keyed reads and writes, enumeration.

use super::{ManagedList, MethodResult};
use crate::core::{ListError, Result, Value};
use crate::index::{LENGTH_KEY, PropertyKey};
use crate::storage::StoreBackend;
use crate::transaction::TxToken;
use tracing::trace;

/// Result of a keyed read.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Value(Value),
    /// A slot past the end of the list
    Undefined,
    /// The key is not ours; the host should continue its own lookup
    NotHandled,
}

impl PropertyValue {
    pub fn into_value(self) -> Option<Value> {
        match self {
            Self::Value(value) => Some(value),
            Self::Undefined | Self::NotHandled => None,
        }
    }
}

/// Result of a keyed write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetOutcome {
    Handled,
    NotHandled,
}

/// Object surface exposed to a dynamic host runtime.
pub trait HostObject {
    type MethodOutput;

    fn get_property(&self, key: &str) -> Result<PropertyValue>;

    fn set_property(&self, key: &str, value: Value, tx: Option<TxToken>) -> Result<SetOutcome>;

    /// Keys the host should report when enumerating the object
    fn enumerate(&self) -> Result<Vec<String>>;

    /// Invokes a named method; `Ok(None)` if no such method exists
    fn call_method(
        &self,
        name: &str,
        args: &[Value],
        tx: Option<TxToken>,
    ) -> Result<Option<Self::MethodOutput>>;
}

impl<B: StoreBackend> ManagedList<B> {
    pub fn get_property(&self, key: &str) -> Result<PropertyValue> {
        match PropertyKey::classify(key) {
            PropertyKey::Length => Ok(PropertyValue::Value(Value::Integer(self.len()? as i64))),
            PropertyKey::Index(index) => match self.get(index) {
                Ok(value) => Ok(PropertyValue::Value(value)),
                Err(ListError::OutOfRange { size, .. }) => {
                    trace!(list = %self.id, index, size, "read past end");
                    Ok(PropertyValue::Undefined)
                }
                Err(err) => Err(err),
            },
            PropertyKey::NotAnIndex => {
                trace!(list = %self.id, key, "property not handled");
                Ok(PropertyValue::NotHandled)
            }
        }
    }

    pub fn set_property(&self, key: &str, value: Value, tx: Option<TxToken>) -> Result<SetOutcome> {
        match PropertyKey::classify(key) {
            PropertyKey::Length => Err(ListError::ReadOnlyProperty(LENGTH_KEY.to_string())),
            PropertyKey::Index(index) => {
                let tx = tx.ok_or(ListError::WriteOutsideTransaction)?;
                self.set(tx, index, value)?;
                Ok(SetOutcome::Handled)
            }
            PropertyKey::NotAnIndex => {
                trace!(list = %self.id, key, "property not handled");
                Ok(SetOutcome::NotHandled)
            }
        }
    }

    /// Index keys `"0"` to `len - 1`, in ascending order.
    pub fn keys(&self) -> Result<Vec<String>> {
        Ok((0..self.len()?).map(PropertyKey::index_key).collect())
    }
}

impl<B: StoreBackend> HostObject for ManagedList<B> {
    type MethodOutput = MethodResult<B>;

    fn get_property(&self, key: &str) -> Result<PropertyValue> {
        ManagedList::get_property(self, key)
    }

    fn set_property(&self, key: &str, value: Value, tx: Option<TxToken>) -> Result<SetOutcome> {
        ManagedList::set_property(self, key, value, tx)
    }

    fn enumerate(&self) -> Result<Vec<String>> {
        self.keys()
    }

    fn call_method(
        &self,
        name: &str,
        args: &[Value],
        tx: Option<TxToken>,
    ) -> Result<Option<MethodResult<B>>> {
        ManagedList::call_method(self, name, args, tx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StoreConfig;
    use crate::core::{DataType, ElementSchema};
    use crate::storage::MemoryStore;

    #[test]
    fn test_absorbed_reads() {
        let store = MemoryStore::open(StoreConfig::default());
        let tx = store.begin_write().unwrap();
        let list = store
            .create_list(tx.token(), ElementSchema::primitive(DataType::Integer))
            .unwrap();
        list.push(tx.token(), &[Value::Integer(4)]).unwrap();
        tx.commit().unwrap();

        assert_eq!(
            list.get_property("0").unwrap(),
            PropertyValue::Value(Value::Integer(4))
        );
        assert_eq!(list.get_property("1").unwrap(), PropertyValue::Undefined);
        assert_eq!(list.get_property("01").unwrap(), PropertyValue::NotHandled);
        assert_eq!(
            list.get_property("length").unwrap().into_value(),
            Some(Value::Integer(1))
        );
    }

    #[test]
    fn test_length_is_readonly() {
        let store = MemoryStore::open(StoreConfig::default());
        let tx = store.begin_write().unwrap();
        let list = store
            .create_list(tx.token(), ElementSchema::primitive(DataType::Integer))
            .unwrap();

        assert_eq!(
            list.set_property("length", Value::Integer(0), Some(tx.token())),
            Err(ListError::ReadOnlyProperty("length".into()))
        );
        assert_eq!(
            list.set_property("name", Value::Integer(0), None),
            Ok(SetOutcome::NotHandled)
        );
        assert_eq!(
            list.set_property("0", Value::Integer(0), None),
            Err(ListError::WriteOutsideTransaction)
        );
    }
}
