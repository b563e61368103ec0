//! Read-only views derived from a list's query.

use crate::core::{DataType, ElementSchema, ListError, Result, Value};
use crate::query::{LogicalQuery, Predicate, SELF_PROPERTY, SortDescriptor};
use crate::storage::{MemoryStore, StoreBackend};
use im::Vector;
use serde_json::{Map, Value as JsonValue, json};
use std::fmt;
use std::sync::{Arc, Weak};
use tracing::debug;

/// A query bound to a store.
///
/// A live view re-runs its query on every access. A static view captures
/// its membership and order when created and never changes afterwards.
pub struct Results<B: StoreBackend = MemoryStore> {
    store: Weak<B>,
    schema: ElementSchema,
    query: LogicalQuery,
    live: bool,
    frozen: Option<Vector<Value>>,
}

impl<B: StoreBackend> Results<B> {
    pub fn new(store: Weak<B>, schema: ElementSchema, query: LogicalQuery, live: bool) -> Result<Self> {
        let frozen = if live {
            None
        } else {
            Some(upgrade(&store)?.evaluate(&query)?)
        };
        debug!(list = %query.source(), live, "view created");
        Ok(Self {
            store,
            schema,
            query,
            live,
            frozen,
        })
    }

    pub fn is_live(&self) -> bool {
        self.live
    }

    pub fn query(&self) -> &LogicalQuery {
        &self.query
    }

    pub fn schema(&self) -> &ElementSchema {
        &self.schema
    }

    /// Whether the owning store session is still open
    pub fn is_valid(&self) -> bool {
        self.store.upgrade().is_some_and(|store| store.is_open())
    }

    fn store(&self) -> Result<Arc<B>> {
        upgrade(&self.store)
    }

    fn elements(&self) -> Result<Vector<Value>> {
        let store = self.store()?;
        match &self.frozen {
            Some(elements) => Ok(elements.clone()),
            None => store.evaluate(&self.query),
        }
    }

    pub fn len(&self) -> Result<usize> {
        Ok(self.elements()?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Element at `index`, or `None` past the end
    pub fn get(&self, index: usize) -> Result<Option<Value>> {
        Ok(self.elements()?.get(index).cloned())
    }

    pub fn to_vec(&self) -> Result<Vec<Value>> {
        Ok(self.elements()?.into_iter().collect())
    }

    /// Static copy of this view's current contents.
    pub fn snapshot(&self) -> Result<Results<B>> {
        let store = self.store()?;
        let frozen = self.elements()?;
        debug!(list = %self.query.source(), size = frozen.len(), "view snapshot");
        Ok(Results {
            store: Arc::downgrade(&store),
            schema: self.schema.clone(),
            query: self.query.clone(),
            live: false,
            frozen: Some(frozen),
        })
    }

    /// Narrows this view by a predicate. `$0`, `$1`, ... in the predicate
    /// bind to `args`. A static view is narrowed to a static subset of its
    /// captured elements.
    pub fn filtered(&self, predicate: &str, args: &[Value]) -> Result<Results<B>> {
        let Some(frozen) = &self.frozen else {
            return derive_filtered(self.store.clone(), &self.schema, self.query.clone(), predicate, args);
        };
        let store = self.store()?;
        let predicate = parse_filter(store.as_ref(), &self.schema, predicate, args)?;
        let refinement = LogicalQuery::for_list(self.query.source()).and_where(predicate.clone());
        self.narrowed(store.as_ref(), frozen, &refinement, self.query.clone().and_where(predicate))
    }

    /// Reorders this view by a property, or by `self` for primitive lists.
    /// A static view reorders its captured elements.
    pub fn sorted(&self, property: &str, ascending: bool) -> Result<Results<B>> {
        let Some(frozen) = &self.frozen else {
            return derive_sorted(self.store.clone(), &self.schema, self.query.clone(), property, ascending);
        };
        let store = self.store()?;
        let sort = parse_sort(store.as_ref(), &self.schema, property, ascending)?;
        let refinement = LogicalQuery::for_list(self.query.source()).sorted_by(sort.clone());
        self.narrowed(store.as_ref(), frozen, &refinement, self.query.clone().sorted_by(sort))
    }

    fn narrowed(
        &self,
        store: &B,
        frozen: &Vector<Value>,
        refinement: &LogicalQuery,
        query: LogicalQuery,
    ) -> Result<Results<B>> {
        let elements = store.refine(frozen, refinement)?;
        debug!(list = %query.source(), size = elements.len(), "static view refined");
        Ok(Results {
            store: self.store.clone(),
            schema: self.schema.clone(),
            query,
            live: false,
            frozen: Some(elements),
        })
    }

    /// Exports the view as a JSON array. Object elements become maps of
    /// their properties; linked objects are exported as references.
    pub fn to_json(&self) -> Result<JsonValue> {
        let store = self.store()?;
        let items = self
            .elements()?
            .iter()
            .map(|value| element_to_json(store.as_ref(), value))
            .collect::<Result<Vec<_>>>()?;
        Ok(JsonValue::Array(items))
    }
}

impl<B: StoreBackend> Clone for Results<B> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            schema: self.schema.clone(),
            query: self.query.clone(),
            live: self.live,
            frozen: self.frozen.clone(),
        }
    }
}

impl<B: StoreBackend> fmt::Debug for Results<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Results")
            .field("query", &self.query)
            .field("schema", &self.schema)
            .field("live", &self.live)
            .field("frozen", &self.frozen.as_ref().map(Vector::len))
            .finish()
    }
}

fn upgrade<B: StoreBackend>(store: &Weak<B>) -> Result<Arc<B>> {
    match store.upgrade() {
        Some(store) if store.is_open() => Ok(store),
        _ => Err(ListError::Invalidated),
    }
}

pub(crate) fn derive_filtered<B: StoreBackend>(
    store: Weak<B>,
    schema: &ElementSchema,
    query: LogicalQuery,
    predicate: &str,
    args: &[Value],
) -> Result<Results<B>> {
    let backend = upgrade(&store)?;
    let predicate = parse_filter(backend.as_ref(), schema, predicate, args)?;
    let live = backend.live_views_by_default();
    Results::new(store, schema.clone(), query.and_where(predicate), live)
}

pub(crate) fn derive_sorted<B: StoreBackend>(
    store: Weak<B>,
    schema: &ElementSchema,
    query: LogicalQuery,
    property: &str,
    ascending: bool,
) -> Result<Results<B>> {
    let backend = upgrade(&store)?;
    let sort = parse_sort(backend.as_ref(), schema, property, ascending)?;
    let live = backend.live_views_by_default();
    Results::new(store, schema.clone(), query.sorted_by(sort), live)
}

fn parse_filter<B: StoreBackend>(
    store: &B,
    schema: &ElementSchema,
    predicate: &str,
    args: &[Value],
) -> Result<Predicate> {
    let predicate = Predicate::parse(predicate, args)?;
    for path in predicate.referenced_paths() {
        validate_key_path(store, schema, path)?;
    }
    Ok(predicate)
}

fn parse_sort<B: StoreBackend>(
    store: &B,
    schema: &ElementSchema,
    property: &str,
    ascending: bool,
) -> Result<SortDescriptor> {
    let path: Vec<String> = property.split('.').map(str::to_string).collect();
    validate_key_path(store, schema, &path)?;
    Ok(SortDescriptor::new(property, ascending))
}

/// Checks that `path` names a property reachable from the list's elements.
pub(crate) fn validate_key_path<B: StoreBackend>(
    store: &B,
    schema: &ElementSchema,
    path: &[String],
) -> Result<()> {
    let (first, rest) = path
        .split_first()
        .ok_or_else(|| ListError::Query("Empty key path".into()))?;

    let mut class = match schema {
        ElementSchema::Primitive { .. } => {
            if first == SELF_PROPERTY && rest.is_empty() {
                return Ok(());
            }
            return Err(ListError::Query(format!(
                "Lists of primitive values only support the '{}' key path, got '{}'",
                SELF_PROPERTY,
                path.join(".")
            )));
        }
        ElementSchema::Object { class } => class.clone(),
    };

    let segments = if first == SELF_PROPERTY { rest } else { path };
    for (position, segment) in segments.iter().enumerate() {
        let object = store.object_schema(&class)?;
        let column = object.get_column(segment).ok_or_else(|| {
            ListError::Query(format!(
                "Property '{}' not found in object of type '{}'",
                segment, class
            ))
        })?;
        match &column.data_type {
            DataType::Object(target) => class = target.clone(),
            _ if position + 1 < segments.len() => {
                return Err(ListError::Query(format!(
                    "Property '{}' of type '{}' is not a link",
                    segment, class
                )));
            }
            _ => {}
        }
    }
    Ok(())
}

fn element_to_json<B: StoreBackend>(store: &B, value: &Value) -> Result<JsonValue> {
    let Value::Object(object) = value else {
        return Ok(scalar_to_json(value));
    };
    let schema = store.object_schema(&object.class)?;
    let mut map = Map::new();
    for column in schema.columns() {
        let property = store.object_property(object, &column.name)?;
        let exported = match &property {
            Value::Object(link) => serde_json::to_value(link)
                .map_err(|e| ListError::StoreFailure(e.to_string()))?,
            other => scalar_to_json(other),
        };
        map.insert(column.name.clone(), exported);
    }
    Ok(JsonValue::Object(map))
}

fn scalar_to_json(value: &Value) -> JsonValue {
    match value {
        Value::Null => JsonValue::Null,
        Value::Integer(i) => json!(i),
        Value::Float(f) => json!(f),
        Value::Text(s) => json!(s),
        Value::Boolean(b) => json!(b),
        Value::Object(object) => json!({ "id": object.id.to_string(), "class": object.class }),
    }
}
