use super::error::{DocResult, DocStoreError};
use super::store::DocumentStore;
use super::types::{DocumentData, DocumentPath, DocumentSnapshot, Precondition, Write};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Default number of attempts before a contended transaction gives up
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

#[derive(Debug, Clone, Copy)]
pub struct TransactionOptions {
    pub max_attempts: u32,
}

impl Default for TransactionOptions {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

/// Read-then-write unit of work.
///
/// Reads record the version they observed; on commit every recorded version
/// becomes a precondition, so a concurrent change rejects the whole commit.
pub struct Transaction<'s, S: DocumentStore + ?Sized> {
    store: &'s S,
    reads: BTreeMap<DocumentPath, Option<u64>>,
    writes: Vec<Write>,
}

impl<'s, S: DocumentStore + ?Sized> Transaction<'s, S> {
    pub fn new(store: &'s S) -> Self {
        Self {
            store,
            reads: BTreeMap::new(),
            writes: Vec::new(),
        }
    }

    pub async fn get(&mut self, path: &DocumentPath) -> DocResult<DocumentSnapshot> {
        if !self.writes.is_empty() {
            return Err(DocStoreError::read_after_write(path));
        }
        let snapshot = self.store.get(path).await?;
        // First observation wins, a later differing read fails at commit
        self.reads
            .entry(path.clone())
            .or_insert_with(|| snapshot.version());
        Ok(snapshot)
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

    /// Send buffered writes guarded by every recorded read
    pub async fn commit(self) -> DocResult<u64> {
        let preconditions = self
            .reads
            .into_iter()
            .map(|(path, expected_version)| Precondition {
                path,
                expected_version,
            })
            .collect();
        self.store.commit(self.writes, preconditions).await
    }
}

/// Run `body` in a transaction with the default options
pub async fn run_transaction<'s, S, T, F>(store: &'s S, body: F) -> DocResult<T>
where
    S: DocumentStore + ?Sized,
    F: AsyncFnMut(&mut Transaction<'s, S>) -> DocResult<T>,
{
    run_transaction_with(store, TransactionOptions::default(), body).await
}

/// Run `body` in a transaction, rerunning it with a fresh transaction on
/// contention. Errors returned by `body` abort immediately and nothing is
/// written.
pub async fn run_transaction_with<'s, S, T, F>(
    store: &'s S,
    options: TransactionOptions,
    mut body: F,
) -> DocResult<T>
where
    S: DocumentStore + ?Sized,
    F: AsyncFnMut(&mut Transaction<'s, S>) -> DocResult<T>,
{
    if options.max_attempts == 0 {
        return Err(DocStoreError::InvalidArgument(
            "max_attempts must be at least 1".to_string(),
        ));
    }

    for attempt in 1..=options.max_attempts {
        let mut transaction = Transaction::new(store);
        let value = body(&mut transaction).await?;
        match transaction.commit().await {
            Ok(version) => {
                debug!(attempt, version, "transaction committed");
                return Ok(value);
            }
            Err(e) if e.is_retryable() => {
                warn!(attempt, error = %e, "transaction contention, retrying");
            }
            Err(e) => return Err(e),
        }
    }

    Err(DocStoreError::TransactionAborted {
        attempts: options.max_attempts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docstore::memory::InMemoryDocumentStore;
    use crate::docstore::types::document_data;
    use serde_json::{Value, json};

    fn data(value: Value) -> DocumentData {
        document_data(value).unwrap()
    }

    fn path(raw: &str) -> DocumentPath {
        raw.parse().unwrap()
    }

    #[tokio::test]
    async fn test_transaction_reads_then_writes() {
        let store = InMemoryDocumentStore::with_documents([(
            path("counters/visits"),
            data(json!({"count": 1})),
        )]);
        let doc = path("counters/visits");

        let previous = run_transaction(&store, async |tx| {
            let snapshot = tx.get(&doc).await?;
            let count = snapshot.get("count").and_then(Value::as_i64).unwrap_or(0);
            tx.set(&doc, data(json!({"count": count + 1})));
            Ok(count)
        })
        .await
        .unwrap();

        assert_eq!(previous, 1);
        assert_eq!(store.document(&doc), Some(data(json!({"count": 2}))));
    }

    #[tokio::test]
    async fn test_read_after_write_is_rejected() {
        let store = InMemoryDocumentStore::new();
        let doc = path("items/a");

        let mut tx = Transaction::new(&store);
        tx.set(&doc, data(json!({})));
        let err = tx.get(&doc).await.unwrap_err();

        assert!(matches!(err, DocStoreError::ReadAfterWrite { .. }));
    }

    #[tokio::test]
    async fn test_contention_retries_with_fresh_transaction() {
        let store = InMemoryDocumentStore::with_documents([(
            path("counters/visits"),
            data(json!({"count": 10})),
        )]);
        let doc = path("counters/visits");
        let mut attempts = 0;

        run_transaction(&store, async |tx| {
            attempts += 1;
            let snapshot = tx.get(&doc).await?;
            let count = snapshot.get("count").and_then(Value::as_i64).unwrap_or(0);
            if attempts == 1 {
                // A competing writer lands between the read and the commit
                store.set(&doc, data(json!({"count": 100}))).await?;
            }
            tx.set(&doc, data(json!({"count": count + 1})));
            Ok(())
        })
        .await
        .unwrap();

        assert_eq!(attempts, 2);
        assert_eq!(store.document(&doc), Some(data(json!({"count": 101}))));
    }

    #[tokio::test]
    async fn test_persistent_contention_aborts() {
        let store = InMemoryDocumentStore::with_documents([(
            path("counters/visits"),
            data(json!({"count": 0})),
        )]);
        let doc = path("counters/visits");
        let mut attempts = 0;

        let result = run_transaction_with(
            &store,
            TransactionOptions { max_attempts: 3 },
            async |tx| {
                attempts += 1;
                tx.get(&doc).await?;
                store.set(&doc, data(json!({"count": attempts}))).await?;
                tx.delete(&doc);
                Ok(())
            },
        )
        .await;

        assert!(matches!(
            result,
            Err(DocStoreError::TransactionAborted { attempts: 3 })
        ));
        assert_eq!(attempts, 3);
        assert!(store.document(&doc).is_some());
    }

    #[tokio::test]
    async fn test_body_error_aborts_without_writes() {
        let store = InMemoryDocumentStore::new();
        let doc = path("items/a");

        let result: DocResult<()> = run_transaction(&store, async |tx| {
            tx.set(&doc, data(json!({"v": 1})));
            Err(DocStoreError::InvalidArgument("stop".to_string()))
        })
        .await;

        assert!(matches!(result, Err(DocStoreError::InvalidArgument(_))));
        assert_eq!(store.document_count(), 0);
    }

    #[tokio::test]
    async fn test_zero_attempts_is_rejected() {
        let store = InMemoryDocumentStore::new();

        let result = run_transaction_with(
            &store,
            TransactionOptions { max_attempts: 0 },
            async |_tx| Ok(()),
        )
        .await;

        assert!(matches!(result, Err(DocStoreError::InvalidArgument(_))));
    }

    #[tokio::test]
    async fn test_read_of_absent_document_guards_creation() {
        let store = InMemoryDocumentStore::new();
        let doc = path("items/a");

        let mut tx = Transaction::new(&store);
        assert!(!tx.get(&doc).await.unwrap().exists());
        store.set(&doc, data(json!({"v": "other"}))).await.unwrap();
        tx.set(&doc, data(json!({"v": "mine"})));

        assert!(tx.commit().await.unwrap_err().is_retryable());
        assert_eq!(store.document(&doc), Some(data(json!({"v": "other"}))));
    }
}
