//! Seed data for demo mode

use crate::docstore::{DocumentData, DocumentPath, InMemoryDocumentStore, document_data};
use crate::system::{InMemoryPreferenceStore, MemoryFileSystem};
use serde_json::{Value, json};

/// Counter value the demo preference store starts with
pub const DEMO_COUNTER: i64 = 41;

pub const DEMO_NOTE_PATH: &str = "/home/demo/notes/welcome.txt";

pub fn demo_preferences() -> InMemoryPreferenceStore {
    InMemoryPreferenceStore::with_initial_values([
        ("counter", Value::from(DEMO_COUNTER)),
        ("username", json!("demo")),
    ])
}

pub fn demo_filesystem() -> MemoryFileSystem {
    MemoryFileSystem::new().with_file(DEMO_NOTE_PATH, "Welcome to demo mode")
}

/// Documents used by the walkthrough's grouped-write scenario
pub fn demo_documents() -> Vec<(DocumentPath, DocumentData)> {
    [
        ("collection", "doc1", json!({"data": "42"})),
        ("collection", "doc3", json!({"data": "to delete"})),
        ("messages", "welcome", json!({"text": "hello", "read": false})),
    ]
    .into_iter()
    .filter_map(|(collection, id, value)| {
        Some((DocumentPath::new(collection, id).ok()?, document_data(value).ok()?))
    })
    .collect()
}

pub fn demo_document_store() -> InMemoryDocumentStore {
    InMemoryDocumentStore::with_documents(demo_documents())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::system::{FileSystem, PreferenceStore};

    #[test]
    fn test_demo_seed_is_complete() {
        assert_eq!(demo_documents().len(), 3);
        assert_eq!(demo_document_store().document_count(), 3);
        assert_eq!(
            demo_preferences().get_int("counter").unwrap(),
            Some(DEMO_COUNTER)
        );
        assert!(demo_filesystem().exists(DEMO_NOTE_PATH));
    }
}
