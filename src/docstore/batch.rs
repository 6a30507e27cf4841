use super::error::{DocResult, DocStoreError};
use super::store::DocumentStore;
use super::types::{DocumentData, DocumentPath, Write};
use tracing::debug;

/// Maximum number of writes a single batch may carry
pub const MAX_BATCH_WRITES: usize = 500;

/// Write-only group of changes applied atomically, in issue order, on commit
#[derive(Debug, Clone, Default)]
pub struct WriteBatch {
    writes: Vec<Write>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, path: &DocumentPath, data: DocumentData) -> &mut Self {
        self.writes.push(Write::Set {
            path: path.clone(),
            data,
            merge: false,
        });
        self
    }

    pub fn set_merge(&mut self, path: &DocumentPath, data: DocumentData) -> &mut Self {
        self.writes.push(Write::Set {
            path: path.clone(),
            data,
            merge: true,
        });
        self
    }

    pub fn update(&mut self, path: &DocumentPath, data: DocumentData) -> &mut Self {
        self.writes.push(Write::Update {
            path: path.clone(),
            data,
        });
        self
    }

    pub fn delete(&mut self, path: &DocumentPath) -> &mut Self {
        self.writes.push(Write::Delete { path: path.clone() });
        self
    }

    pub fn len(&self) -> usize {
        self.writes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    /// Apply every write or none. Consumes the batch so it cannot be committed twice.
    pub async fn commit<S: DocumentStore + ?Sized>(self, store: &S) -> DocResult<u64> {
        if self.writes.len() > MAX_BATCH_WRITES {
            return Err(DocStoreError::BatchTooLarge {
                len: self.writes.len(),
                limit: MAX_BATCH_WRITES,
            });
        }
        debug!(writes = self.writes.len(), "committing batch");
        store.commit(self.writes, Vec::new()).await
    }
}
