use crate::docstore::{
    DocResult, DocumentData, DocumentPath, DocumentStore, QuerySnapshot, WriteBatch,
    merge_data, run_transaction_with, TransactionOptions,
};
use tracing::info;

/// Three-document grouped write: merge into one, overwrite another, delete a third
#[derive(Debug, Clone)]
pub struct GroupedWrite {
    pub merge_target: DocumentPath,
    pub partial: DocumentData,
    pub set_target: DocumentPath,
    pub set_data: DocumentData,
    pub delete_target: DocumentPath,
}

/// Thin service over a document store
pub struct DocumentService<S: DocumentStore> {
    store: S,
    transaction_options: TransactionOptions,
}

impl<S: DocumentStore> DocumentService<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            transaction_options: TransactionOptions::default(),
        }
    }

    pub fn with_transaction_options(mut self, options: TransactionOptions) -> Self {
        self.transaction_options = options;
        self
    }

    /// Document data, `None` when absent
    pub async fn read(&self, path: &DocumentPath) -> DocResult<Option<DocumentData>> {
        Ok(self.store.get(path).await?.into_data())
    }

    pub async fn write(&self, path: &DocumentPath, data: DocumentData) -> DocResult<()> {
        self.store.set(path, data).await
    }

    pub async fn update(&self, path: &DocumentPath, partial: DocumentData) -> DocResult<()> {
        self.store.update(path, partial).await
    }

    pub async fn delete(&self, path: &DocumentPath) -> DocResult<()> {
        self.store.delete(path).await
    }

    pub async fn add(&self, collection: &str, data: DocumentData) -> DocResult<DocumentPath> {
        let path = self.store.add(collection, data).await?;
        info!(%path, "document added");
        Ok(path)
    }

    /// Data of every document in a collection
    pub async fn list_data(&self, collection: &str) -> DocResult<Vec<DocumentData>> {
        let snapshot = self.store.list(collection).await?;
        Ok(snapshot.data().cloned().collect())
    }

    /// First element of the collection's snapshot stream
    pub async fn first_snapshot(&self, collection: &str) -> DocResult<Option<QuerySnapshot>> {
        let mut stream = self.store.snapshots(collection).await?;
        Ok(stream.next().await)
    }

    /// Read the merge target, merge `partial` over it and apply all three
    /// writes in one transaction. A missing merge target is created from
    /// `partial` alone.
    pub async fn merge_in_transaction(&self, plan: &GroupedWrite) -> DocResult<DocumentData> {
        let merged = run_transaction_with(&self.store, self.transaction_options, async |tx| {
            let existing = tx.get(&plan.merge_target).await?;
            let merged = match existing.data() {
                Some(data) => merge_data(data, &plan.partial),
                None => plan.partial.clone(),
            };
            tx.set(&plan.merge_target, merged.clone())
                .set(&plan.set_target, plan.set_data.clone())
                .delete(&plan.delete_target);
            Ok(merged)
        })
        .await?;

        info!(
            merge_target = %plan.merge_target,
            set_target = %plan.set_target,
            delete_target = %plan.delete_target,
            "grouped write committed in transaction"
        );
        Ok(merged)
    }

    /// Issue the same three writes as a batch, without reading first
    pub async fn merge_in_batch(&self, plan: &GroupedWrite) -> DocResult<u64> {
        let mut batch = WriteBatch::new();
        batch
            .update(&plan.merge_target, plan.partial.clone())
            .set(&plan.set_target, plan.set_data.clone())
            .delete(&plan.delete_target);
        let version = batch.commit(&self.store).await?;

        info!(version, "grouped write committed in batch");
        Ok(version)
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}
