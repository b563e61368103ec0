use super::ManagedList;
use crate::core::{Result, Value};
use crate::results::{Results, derive_filtered, derive_sorted};
use crate::storage::StoreBackend;

impl<B: StoreBackend> ManagedList<B> {
    /// Static view of the list as it is now.
    pub fn snapshot(&self) -> Result<Results<B>> {
        Results::new(self.weak_store(), self.schema.clone(), self.current_query(), false)
    }

    /// View of the elements matching `predicate`, e.g. `"age > $0"`.
    pub fn filtered(&self, predicate: &str, args: &[Value]) -> Result<Results<B>> {
        derive_filtered(self.weak_store(), &self.schema, self.current_query(), predicate, args)
    }

    /// View ordered by `property`. Primitive lists sort by `"self"`.
    pub fn sorted(&self, property: &str, ascending: bool) -> Result<Results<B>> {
        derive_sorted(self.weak_store(), &self.schema, self.current_query(), property, ascending)
    }
}
