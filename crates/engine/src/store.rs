//! Document store abstraction.
//!
//! The engine treats persistence as an opaque key-value store of JSON
//! documents grouped in collections. Each document carries a store-managed
//! revision that is bumped on every write, which is what conditional updates
//! are keyed on.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::{LedgerError, ResultLedger};

pub use sqlite::SqliteStore;

mod sqlite;

/// Top-level fields of a stored document.
pub type Fields = Map<String, Value>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Collection {
    Wallets,
    Transactions,
}

impl Collection {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Wallets => "wallets",
            Self::Transactions => "transactions",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Document {
    pub key: String,
    pub revision: i64,
    pub fields: Fields,
}

/// Point reads, writes and partial updates by key.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Returns the document stored under `key`, if any.
    async fn get(&self, collection: Collection, key: &str) -> ResultLedger<Option<Document>>;

    /// Writes `fields` under `key`, creating the document if needed.
    ///
    /// With `merge` the fields are laid over the stored ones and untouched
    /// fields survive; without it the document is replaced.
    async fn set(
        &self,
        collection: Collection,
        key: &str,
        fields: Fields,
        merge: bool,
    ) -> ResultLedger<Document>;

    /// Merges `fields` into an existing document.
    ///
    /// Fails with `NotFound` when the document is absent and with `Conflict`
    /// when `expected_revision` is given and no longer matches.
    async fn update(
        &self,
        collection: Collection,
        key: &str,
        fields: Fields,
        expected_revision: Option<i64>,
    ) -> ResultLedger<Document>;

    /// Returns every document of `collection` whose top-level string field
    /// `field` equals `value`.
    async fn query(
        &self,
        collection: Collection,
        field: &str,
        value: &str,
    ) -> ResultLedger<Vec<Document>>;

    /// Generates a fresh key for a document that is about to be created.
    fn new_key(&self, _collection: Collection) -> String {
        Uuid::new_v4().to_string()
    }
}

/// Lays `patch` over `base`, returning the merged field set.
pub(crate) fn merge_fields(mut base: Fields, patch: Fields) -> Fields {
    for (name, value) in patch {
        base.insert(name, value);
    }
    base
}

/// Serializes `value` into the top-level fields of a document.
pub(crate) fn to_fields<T: Serialize>(value: &T) -> ResultLedger<Fields> {
    match serde_json::to_value(value)? {
        Value::Object(fields) => Ok(fields),
        other => Err(LedgerError::Validation(format!(
            "documents must be objects, got {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn fields(value: Value) -> Fields {
        match value {
            Value::Object(map) => map,
            _ => Fields::new(),
        }
    }

    #[test]
    fn merge_keeps_untouched_fields() {
        let base = fields(json!({"amount": 100, "name": "Cash"}));
        let patch = fields(json!({"amount": 50}));

        let merged = merge_fields(base, patch);
        assert_eq!(merged.get("amount"), Some(&json!(50)));
        assert_eq!(merged.get("name"), Some(&json!("Cash")));
    }
}
