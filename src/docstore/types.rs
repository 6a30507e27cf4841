use super::error::{DocResult, DocStoreError};
use crate::system::preferences::value_kind;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// Flat key-value payload of a document
pub type DocumentData = Map<String, Value>;

/// Convert a JSON value into document data, rejecting non-objects
pub fn document_data(value: Value) -> DocResult<DocumentData> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(DocStoreError::InvalidData {
            found: value_kind(&other),
        }),
    }
}

/// Shallow merge: keys of `partial` overwrite, every other key of `existing` is kept
pub fn merge_data(existing: &DocumentData, partial: &DocumentData) -> DocumentData {
    let mut merged = existing.clone();
    for (key, value) in partial {
        merged.insert(key.clone(), value.clone());
    }
    merged
}

pub(crate) fn validate_segment(segment: &str, full: &str) -> DocResult<()> {
    if segment.is_empty() {
        return Err(DocStoreError::invalid_path(full, "empty segment"));
    }
    if segment.contains('/') {
        return Err(DocStoreError::invalid_path(full, "segment contains '/'"));
    }
    Ok(())
}

/// Address of a document: `collection/id`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentPath {
    collection: String,
    id: String,
}

impl DocumentPath {
    pub fn new(collection: impl Into<String>, id: impl Into<String>) -> DocResult<Self> {
        let collection = collection.into();
        let id = id.into();
        let full = format!("{}/{}", collection, id);
        validate_segment(&collection, &full)?;
        validate_segment(&id, &full)?;
        Ok(Self { collection, id })
    }

    /// Rebuild a path from segments that were validated when first written
    pub(crate) fn from_stored(collection: &str, id: &str) -> Self {
        Self {
            collection: collection.to_string(),
            id: id.to_string(),
        }
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

impl fmt::Display for DocumentPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.collection, self.id)
    }
}

impl FromStr for DocumentPath {
    type Err = DocStoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('/') {
            Some((collection, id)) => DocumentPath::new(collection, id),
            None => Err(DocStoreError::invalid_path(s, "expected collection/id")),
        }
    }
}

/// Point-in-time view of one document
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentSnapshot {
    path: DocumentPath,
    data: Option<DocumentData>,
    version: Option<u64>,
    update_time: Option<DateTime<Utc>>,
}

impl DocumentSnapshot {
    pub fn existing(
        path: DocumentPath,
        data: DocumentData,
        version: u64,
        update_time: DateTime<Utc>,
    ) -> Self {
        Self {
            path,
            data: Some(data),
            version: Some(version),
            update_time: Some(update_time),
        }
    }

    pub fn missing(path: DocumentPath) -> Self {
        Self {
            path,
            data: None,
            version: None,
            update_time: None,
        }
    }

    pub fn path(&self) -> &DocumentPath {
        &self.path
    }

    pub fn id(&self) -> &str {
        self.path.id()
    }

    pub fn exists(&self) -> bool {
        self.data.is_some()
    }

    pub fn data(&self) -> Option<&DocumentData> {
        self.data.as_ref()
    }

    pub fn into_data(self) -> Option<DocumentData> {
        self.data
    }

    /// Field value; missing document or missing field reads as `None`
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.data.as_ref().and_then(|data| data.get(field))
    }

    /// Store version that last wrote this document
    pub fn version(&self) -> Option<u64> {
        self.version
    }

    pub fn update_time(&self) -> Option<DateTime<Utc>> {
        self.update_time
    }
}

/// Point-in-time view of a collection, documents ordered by id
#[derive(Debug, Clone, PartialEq)]
pub struct QuerySnapshot {
    collection: String,
    docs: Vec<DocumentSnapshot>,
}

impl QuerySnapshot {
    pub fn new(collection: impl Into<String>, docs: Vec<DocumentSnapshot>) -> Self {
        Self {
            collection: collection.into(),
            docs,
        }
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn docs(&self) -> &[DocumentSnapshot] {
        &self.docs
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    /// Data of every document in the snapshot
    pub fn data(&self) -> impl Iterator<Item = &DocumentData> {
        self.docs.iter().filter_map(DocumentSnapshot::data)
    }

    pub fn ids(&self) -> Vec<&str> {
        self.docs.iter().map(DocumentSnapshot::id).collect()
    }
}

/// One write inside a commit
#[derive(Debug, Clone, PartialEq)]
pub enum Write {
    /// Create or overwrite; with `merge` the data is merged into the existing document
    Set {
        path: DocumentPath,
        data: DocumentData,
        merge: bool,
    },
    /// Merge into an existing document, failing if it is absent
    Update {
        path: DocumentPath,
        data: DocumentData,
    },
    /// Remove the document; absent documents are ignored
    Delete { path: DocumentPath },
}

impl Write {
    pub fn path(&self) -> &DocumentPath {
        match self {
            Write::Set { path, .. } | Write::Update { path, .. } | Write::Delete { path } => path,
        }
    }
}

/// Commit guard: the document must still be at the version a transaction read
#[derive(Debug, Clone, PartialEq)]
pub struct Precondition {
    pub path: DocumentPath,
    /// `None` means the document must not exist
    pub expected_version: Option<u64>,
}
