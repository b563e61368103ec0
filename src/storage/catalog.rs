use crate::core::{ListError, ObjectSchema, Result};
use std::collections::HashMap;
use std::sync::Arc;

/// Registry of object classes known to a store.
///
/// Immutable once built: registering a class produces a new catalog, so
/// readers can clone it without holding the store lock.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    classes: Arc<HashMap<String, ObjectSchema>>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a class, returning the new catalog
    pub fn with_class(self, schema: ObjectSchema) -> Result<Self> {
        let name = schema.name().to_string();
        if self.classes.contains_key(&name) {
            return Err(ListError::StoreFailure(format!(
                "Class '{}' already exists",
                name
            )));
        }

        let mut classes = (*self.classes).clone();
        classes.insert(name, schema);
        Ok(Self {
            classes: Arc::new(classes),
        })
    }

    pub fn get_class(&self, name: &str) -> Result<&ObjectSchema> {
        self.classes
            .get(name)
            .ok_or_else(|| ListError::StoreFailure(format!("Class '{}' not found", name)))
    }

    pub fn class_exists(&self, name: &str) -> bool {
        self.classes.contains_key(name)
    }

    pub fn class_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.classes.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}
