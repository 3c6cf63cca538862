use crate::document::{Document, field_union};
use parking_lot::RwLock;

/// An insertion-ordered, in-memory set of documents belonging to one model.
pub struct Collection {
    name: String,
    docs: RwLock<Vec<Document>>,
}

impl std::fmt::Debug for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collection").field("name", &self.name).field("len", &self.len()).finish()
    }
}

impl Collection {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), docs: RwLock::new(Vec::new()) }
    }

    pub fn insert_document(&self, document: Document) {
        self.docs.write().push(document);
    }

    /// Clones every document matching `pred`, in insertion order. The read lock is
    /// held only for the duration of the scan.
    pub fn scan<F>(&self, mut pred: F) -> Vec<Document>
    where
        F: FnMut(&Document) -> bool,
    {
        self.docs.read().iter().filter(|d| pred(d)).cloned().collect()
    }

    pub fn get_all_documents(&self) -> Vec<Document> {
        self.docs.read().clone()
    }

    /// Top-level fields of every stored document, in first-seen order. These
    /// are the model's columns regardless of what a query matches.
    pub fn field_names(&self) -> Vec<String> {
        field_union(self.docs.read().iter())
    }

    pub fn len(&self) -> usize {
        self.docs.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.read().is_empty()
    }

    /// Returns the collection's name.
    pub fn name_str(&self) -> &str {
        &self.name
    }
}
