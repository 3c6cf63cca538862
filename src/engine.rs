use crate::collection::Collection;
use crate::types::ModelName;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Registry of record collections keyed by model name.
///
/// Populated at startup (seed import or programmatic registration) and then only
/// read while serving exports.
#[derive(Default)]
pub struct Engine {
    pub(crate) collections: RwLock<HashMap<ModelName, Arc<Collection>>>,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine").field("collections", &self.list_collection_names()).finish()
    }
}

impl Engine {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the collection registered under `name`, creating an empty one if absent.
    pub fn create_collection(&self, name: ModelName) -> Arc<Collection> {
        let mut guard = self.collections.write();
        guard.entry(name.clone()).or_insert_with(|| Arc::new(Collection::new(name))).clone()
    }

    /// Registers an existing collection, replacing any previous one with the same name.
    pub fn register(&self, collection: Arc<Collection>) {
        let name = collection.name_str().to_string();
        log::debug!("engine: register collection={name}");
        self.collections.write().insert(name, collection);
    }

    pub fn get_collection(&self, name: &str) -> Option<Arc<Collection>> {
        self.collections.read().get(name).cloned()
    }

    /// Sorted list of registered model names.
    pub fn list_collection_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.collections.read().keys().cloned().collect();
        names.sort();
        names
    }
}
