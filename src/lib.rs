// ============================================================================
// memolist Library
// ============================================================================

//! Array-like adapters over transactional, query-backed lists.
//!
//! A [`ManagedList`] exposes a list owned by a store as an indexable
//! collection: keyed property access, index enumeration, the usual
//! mutation methods and derived query views.
//!
//! # Examples
//!
//! ```
//! use memolist::{DataType, ElementSchema, MemoryStore, StoreConfig, Value};
//!
//! # fn main() -> memolist::Result<()> {
//! let store = MemoryStore::open(StoreConfig::default());
//!
//! let tx = store.begin_write()?;
//! let list = store.create_list(tx.token(), ElementSchema::primitive(DataType::Integer))?;
//! list.push(tx.token(), &[Value::Integer(3), Value::Integer(1), Value::Integer(2)])?;
//! tx.commit()?;
//!
//! let sorted = list.sorted("self", true)?;
//! assert_eq!(sorted.to_vec()?, vec![Value::Integer(1), Value::Integer(2), Value::Integer(3)]);
//! assert_eq!(list.keys()?, vec!["0", "1", "2"]);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod core;
pub mod index;
pub mod list;
pub mod query;
pub mod results;
pub mod storage;
pub mod transaction;

// Re-export main types for convenience
pub use config::StoreConfig;
pub use crate::core::{
    Arity, Column, DataType, ElementSchema, ErrorKind, ListError, ObjectId, ObjectRef,
    ObjectSchema, Result, Row, Value,
};
pub use index::PropertyKey;
pub use list::{HostObject, ListMethod, ManagedList, MethodResult, PropertyValue, SetOutcome};
pub use query::{LogicalQuery, Predicate, SortDescriptor};
pub use results::Results;
pub use storage::{ListId, MemoryStore, StoreBackend, StoreId};
pub use transaction::{TxToken, WriteTransaction};
