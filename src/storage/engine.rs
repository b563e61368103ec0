use super::ListId;
use crate::core::{ElementSchema, ObjectRef, ObjectSchema, Result, Value};
use crate::query::LogicalQuery;
use crate::transaction::TxToken;

/// Store backend trait - the primitives a managed list is built on.
///
/// The backend owns list contents and objects; adapters only hold weak
/// references to it. Every mutating primitive must verify the transaction
/// token before touching state.
pub trait StoreBackend: Send + Sync + 'static {
    /// Whether the session is still usable
    fn is_open(&self) -> bool;

    /// Fails with `WriteOutsideTransaction` unless `tx` is the active write
    /// transaction of this store
    fn verify_in_transaction(&self, tx: TxToken) -> Result<()>;

    fn list_schema(&self, list: ListId) -> Result<ElementSchema>;

    fn list_size(&self, list: ListId) -> Result<usize>;

    fn list_get(&self, list: ListId, index: usize) -> Result<Value>;

    fn list_set(&self, tx: TxToken, list: ListId, index: usize, value: Value) -> Result<()>;

    /// Inserts before `index`; `index == size` appends
    fn list_insert(&self, tx: TxToken, list: ListId, index: usize, value: Value) -> Result<()>;

    /// Removes and returns the element at `index`
    fn list_remove(&self, tx: TxToken, list: ListId, index: usize) -> Result<Value>;

    fn object_schema(&self, class: &str) -> Result<ObjectSchema>;

    /// Runs a query, returning matching elements in view order
    fn evaluate(&self, query: &LogicalQuery) -> Result<im::Vector<Value>>;

    /// Applies the query's filters and sort to a fixed set of elements
    /// instead of the query's source list
    fn refine(&self, elements: &im::Vector<Value>, query: &LogicalQuery) -> Result<im::Vector<Value>>;

    /// Looks up one property of an object element
    fn object_property(&self, object: &ObjectRef, property: &str) -> Result<Value>;

    /// Whether filtered and sorted views track later changes
    fn live_views_by_default(&self) -> bool;
}
