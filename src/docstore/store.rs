use super::error::DocResult;
use super::types::{DocumentData, DocumentPath, DocumentSnapshot, Precondition, QuerySnapshot, Write};
use async_trait::async_trait;
use tokio::sync::mpsc;

/// Length of ids generated by [`DocumentStore::add`]
pub const GENERATED_ID_LEN: usize = 20;

/// Abstraction for a document database to enable testing without a real backend
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Read one document; an absent document yields a non-existing snapshot
    async fn get(&self, path: &DocumentPath) -> DocResult<DocumentSnapshot>;

    async fn list(&self, collection: &str) -> DocResult<QuerySnapshot>;

    /// Apply every write atomically if all preconditions hold.
    ///
    /// Returns the store version assigned to the commit.
    async fn commit(
        &self,
        writes: Vec<Write>,
        preconditions: Vec<Precondition>,
    ) -> DocResult<u64>;

    /// Subscribe to a collection. The first element is the current state,
    /// then one element follows every commit touching the collection.
    async fn snapshots(&self, collection: &str) -> DocResult<SnapshotStream>;

    /// Create or overwrite a document
    async fn set(&self, path: &DocumentPath, data: DocumentData) -> DocResult<()> {
        let write = Write::Set {
            path: path.clone(),
            data,
            merge: false,
        };
        self.commit(vec![write], Vec::new()).await.map(|_| ())
    }

    /// Create a document or merge into the existing one
    async fn set_merge(&self, path: &DocumentPath, data: DocumentData) -> DocResult<()> {
        let write = Write::Set {
            path: path.clone(),
            data,
            merge: true,
        };
        self.commit(vec![write], Vec::new()).await.map(|_| ())
    }

    /// Merge into an existing document
    async fn update(&self, path: &DocumentPath, data: DocumentData) -> DocResult<()> {
        let write = Write::Update {
            path: path.clone(),
            data,
        };
        self.commit(vec![write], Vec::new()).await.map(|_| ())
    }

    async fn delete(&self, path: &DocumentPath) -> DocResult<()> {
        let write = Write::Delete { path: path.clone() };
        self.commit(vec![write], Vec::new()).await.map(|_| ())
    }

    /// Store a document under a generated id
    async fn add(&self, collection: &str, data: DocumentData) -> DocResult<DocumentPath> {
        let path = DocumentPath::new(collection, generate_id())?;
        self.set(&path, data).await?;
        Ok(path)
    }
}

/// Random document id in the style of hosted document databases
pub fn generate_id() -> String {
    let mut id = uuid::Uuid::new_v4().simple().to_string();
    id.truncate(GENERATED_ID_LEN);
    id
}

/// Stream of collection snapshots
#[derive(Debug)]
pub struct SnapshotStream {
    receiver: mpsc::UnboundedReceiver<QuerySnapshot>,
}

impl SnapshotStream {
    pub fn new(receiver: mpsc::UnboundedReceiver<QuerySnapshot>) -> Self {
        Self { receiver }
    }

    /// Wait for the next snapshot; `None` once the store is gone
    pub async fn next(&mut self) -> Option<QuerySnapshot> {
        self.receiver.recv().await
    }

    /// Next snapshot if one is already queued
    pub fn try_next(&mut self) -> Option<QuerySnapshot> {
        self.receiver.try_recv().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_ids_are_unique_and_sized() {
        let a = generate_id();
        let b = generate_id();

        assert_eq!(a.len(), GENERATED_ID_LEN);
        assert_ne!(a, b);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric()));
    }
}
