//! Explicit save/load of the session record.
//!
//! Called directly after every state transition; nothing here watches the
//! in-memory record.

use super::SessionRecord;
use crate::storage::{
    KeyValueStore,
    StorageError,
};

/// Writes `record` under `key`, or removes the entry when it is anonymous.
pub fn save(
    store: &dyn KeyValueStore,
    key: &str,
    record: &SessionRecord,
) -> Result<(), StorageError> {
    if record.is_anonymous() {
        return store.remove(key);
    }
    let serialized = serde_json::to_string(record)?;
    store.set(key, &serialized)
}

/// Reads the record under `key`.
///
/// Never fails: a missing entry, a storage error, unparsable JSON or a
/// record with only one of token/user all come back as anonymous (the last
/// three are logged).
#[must_use]
pub fn load(store: &dyn KeyValueStore, key: &str) -> SessionRecord {
    let raw = match store.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return SessionRecord::anonymous(),
        Err(e) => {
            tracing::warn!(key, error = %e, "Could not read persisted session");
            return SessionRecord::anonymous();
        }
    };

    match serde_json::from_str::<SessionRecord>(&raw) {
        Ok(record) if record.is_consistent() => record,
        Ok(_) => {
            tracing::warn!(key, "Persisted session is incomplete, ignoring it");
            SessionRecord::anonymous()
        }
        Err(e) => {
            tracing::warn!(key, error = %e, "Persisted session is unreadable, ignoring it");
            SessionRecord::anonymous()
        }
    }
}
