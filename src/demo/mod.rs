//! In-memory collaborators pre-populated for demo mode

pub mod data;

pub use data::{demo_document_store, demo_filesystem, demo_preferences};
