//! Document database abstraction, its in-memory implementation and grouped writes

pub mod batch;
pub mod error;
pub mod memory;
pub mod store;
pub mod transaction;
pub mod types;

// Re-export commonly used items
pub use batch::WriteBatch;
pub use error::{DocResult, DocStoreError};
pub use memory::InMemoryDocumentStore;
pub use store::{DocumentStore, SnapshotStream};
pub use transaction::{Transaction, TransactionOptions, run_transaction, run_transaction_with};
pub use types::{DocumentData, DocumentPath, DocumentSnapshot, QuerySnapshot, document_data, merge_data};
