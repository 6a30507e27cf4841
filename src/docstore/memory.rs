//! In-memory document store for tests and demo mode.

use super::error::{DocResult, DocStoreError};
use super::store::{DocumentStore, SnapshotStream};
use super::types::{
    DocumentData, DocumentPath, DocumentSnapshot, Precondition, QuerySnapshot, Write, merge_data,
    validate_segment,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::mpsc;
use tracing::debug;

type Collections = BTreeMap<String, BTreeMap<String, StoredDocument>>;

#[derive(Debug, Clone)]
struct StoredDocument {
    data: DocumentData,
    version: u64,
    update_time: DateTime<Utc>,
}

#[derive(Debug)]
struct Subscriber {
    collection: String,
    sender: mpsc::UnboundedSender<QuerySnapshot>,
}

#[derive(Debug, Default)]
struct State {
    collections: Collections,
    version: u64,
    subscribers: Vec<Subscriber>,
}

impl State {
    fn snapshot_of(&self, path: &DocumentPath) -> DocumentSnapshot {
        self.collections
            .get(path.collection())
            .and_then(|docs| docs.get(path.id()))
            .map(|doc| {
                DocumentSnapshot::existing(
                    path.clone(),
                    doc.data.clone(),
                    doc.version,
                    doc.update_time,
                )
            })
            .unwrap_or_else(|| DocumentSnapshot::missing(path.clone()))
    }

    fn query(&self, collection: &str) -> QuerySnapshot {
        let docs = self
            .collections
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .map(|(id, doc)| {
                        DocumentSnapshot::existing(
                            DocumentPath::from_stored(collection, id),
                            doc.data.clone(),
                            doc.version,
                            doc.update_time,
                        )
                    })
                    .collect()
            })
            .unwrap_or_default();
        QuerySnapshot::new(collection, docs)
    }

    fn check(&self, precondition: &Precondition) -> DocResult<()> {
        let current = self.snapshot_of(&precondition.path).version();
        if current == precondition.expected_version {
            Ok(())
        } else {
            Err(DocStoreError::contention(&precondition.path))
        }
    }

    /// Push a fresh snapshot to subscribers of touched collections, dropping closed ones
    fn notify(&mut self, touched: &BTreeSet<String>) {
        let snapshots: BTreeMap<&String, QuerySnapshot> = touched
            .iter()
            .map(|collection| (collection, self.query(collection)))
            .collect();

        self.subscribers.retain(|subscriber| {
            match snapshots.get(&subscriber.collection) {
                Some(snapshot) => subscriber.sender.send(snapshot.clone()).is_ok(),
                None => !subscriber.sender.is_closed(),
            }
        });
    }
}

/// Store `data` at `path`, replacing whatever was there
fn insert_document(
    collections: &mut Collections,
    path: &DocumentPath,
    data: DocumentData,
    version: u64,
    now: DateTime<Utc>,
) {
    collections.entry(path.collection().to_string()).or_default().insert(
        path.id().to_string(),
        StoredDocument {
            data,
            version,
            update_time: now,
        },
    );
}

fn apply_write(
    collections: &mut Collections,
    write: Write,
    version: u64,
    now: DateTime<Utc>,
) -> DocResult<()> {
    let stored = |data| StoredDocument {
        data,
        version,
        update_time: now,
    };

    match write {
        Write::Set { path, data, merge } => {
            let data = match collections
                .get(path.collection())
                .and_then(|docs| docs.get(path.id()))
            {
                Some(existing) if merge => merge_data(&existing.data, &data),
                _ => data,
            };
            insert_document(collections, &path, data, version, now);
        }
        Write::Update { path, data } => {
            let existing = collections
                .get_mut(path.collection())
                .and_then(|docs| docs.get_mut(path.id()))
                .ok_or_else(|| DocStoreError::not_found(&path))?;
            *existing = stored(merge_data(&existing.data, &data));
        }
        Write::Delete { path } => {
            if let Some(docs) = collections.get_mut(path.collection()) {
                docs.remove(path.id());
                if docs.is_empty() {
                    collections.remove(path.collection());
                }
            }
        }
    }
    Ok(())
}

/// Document store kept entirely in process memory.
///
/// Commits are applied to a staged copy of the data and swapped in only when
/// every write succeeded, so a failing write leaves the store untouched.
#[derive(Debug, Default)]
pub struct InMemoryDocumentStore {
    state: Mutex<State>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with documents, each written as its own commit
    pub fn with_documents<I>(documents: I) -> Self
    where
        I: IntoIterator<Item = (DocumentPath, DocumentData)>,
    {
        let store = Self::new();
        {
            let mut state = store.lock();
            let now = Utc::now();
            for (path, data) in documents {
                state.version += 1;
                let version = state.version;
                insert_document(&mut state.collections, &path, data, version, now);
            }
        }
        store
    }

    /// Data of one document, read without going through the trait
    pub fn document(&self, path: &DocumentPath) -> Option<DocumentData> {
        self.lock().snapshot_of(path).into_data()
    }

    pub fn document_count(&self) -> usize {
        self.lock().collections.values().map(BTreeMap::len).sum()
    }

    /// Version of the most recent commit
    pub fn version(&self) -> u64 {
        self.lock().version
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn get(&self, path: &DocumentPath) -> DocResult<DocumentSnapshot> {
        Ok(self.lock().snapshot_of(path))
    }

    async fn list(&self, collection: &str) -> DocResult<QuerySnapshot> {
        validate_segment(collection, collection)?;
        Ok(self.lock().query(collection))
    }

    async fn commit(
        &self,
        writes: Vec<Write>,
        preconditions: Vec<Precondition>,
    ) -> DocResult<u64> {
        let mut state = self.lock();
        for precondition in &preconditions {
            state.check(precondition)?;
        }
        if writes.is_empty() {
            return Ok(state.version);
        }

        let version = state.version + 1;
        let now = Utc::now();
        let write_count = writes.len();
        let touched: BTreeSet<String> = writes
            .iter()
            .map(|write| write.path().collection().to_string())
            .collect();

        let mut staged = state.collections.clone();
        for write in writes {
            apply_write(&mut staged, write, version, now)?;
        }

        state.collections = staged;
        state.version = version;
        state.notify(&touched);
        debug!(version, write_count, "committed documents");
        Ok(version)
    }

    async fn snapshots(&self, collection: &str) -> DocResult<SnapshotStream> {
        validate_segment(collection, collection)?;
        let (sender, receiver) = mpsc::unbounded_channel();
        let mut state = self.lock();
        // The receiver is alive, so the initial send cannot fail
        let _ = sender.send(state.query(collection));
        state.subscribers.push(Subscriber {
            collection: collection.to_string(),
            sender,
        });
        Ok(SnapshotStream::new(receiver))
    }
}
