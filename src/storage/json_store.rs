//! Durable key/value storage for whole JSON documents.
//!
//! Each key maps to one file, `<dir>/<key>.json`. Loading never fails:
//! a missing, unreadable or wrong-shaped document comes back as an empty
//! object. Saving is checked against a byte quota covering every document
//! in the directory.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::error::{Result, TripbookError};

/// A top-level persisted document. Always a JSON object.
pub type Document = Map<String, Value>;

const DOCUMENT_EXT: &str = "json";
const TEMP_EXT: &str = "json.tmp";

pub struct JsonStore {
    dir: PathBuf,
    quota_bytes: u64,
}

impl JsonStore {
    /// Open (creating if needed) a store rooted at `dir`.
    pub fn open(dir: &Path, quota_bytes: u64) -> Result<Self> {
        fs::create_dir_all(dir)?;
        Ok(Self {
            dir: dir.to_path_buf(),
            quota_bytes,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn quota_bytes(&self) -> u64 {
        self.quota_bytes
    }

    /// Load the document saved under `key`, or an empty document.
    pub fn load(&self, key: &str) -> Document {
        match self.read_document(key) {
            Ok(Some(document)) => {
                debug!(key, entries = document.len(), "loaded document");
                document
            }
            Ok(None) => {
                debug!(key, "no saved document, starting empty");
                Document::new()
            }
            Err(e) => {
                warn!(key, error = %e, "discarding unreadable document");
                Document::new()
            }
        }
    }

    /// Strict variant of [`load`](Self::load): reports why a stored payload
    /// was rejected instead of substituting an empty document.
    pub fn read_document(&self, key: &str) -> Result<Option<Document>> {
        let path = self.document_path(key)?;

        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(corrupt(key, e.to_string())),
        };

        let value: Value =
            serde_json::from_slice(&bytes).map_err(|e| corrupt(key, e.to_string()))?;

        match value {
            Value::Object(map) => Ok(Some(map)),
            other => Err(corrupt(
                key,
                format!("expected an object, found {}", json_kind(&other)),
            )),
        }
    }

    /// Serialize and write `document` under `key`.
    ///
    /// Fails with `StorageQuotaExceeded` if the new payload plus every other
    /// stored document would exceed the quota. The previous document is left
    /// intact on any failure.
    pub fn save<T: Serialize + ?Sized>(&self, key: &str, document: &T) -> Result<()> {
        let path = self.document_path(key)?;
        let payload = serde_json::to_vec(document)?;

        let needed = self.usage(Some(key))? + payload.len() as u64;
        if needed > self.quota_bytes {
            return Err(TripbookError::StorageQuotaExceeded {
                key: key.to_string(),
                needed,
                quota: self.quota_bytes,
            });
        }

        let temp = self.dir.join(format!("{}.{}", key, TEMP_EXT));
        if let Err(e) = write_atomically(&temp, &path, &payload) {
            let _ = fs::remove_file(&temp);
            if e.kind() == io::ErrorKind::StorageFull {
                return Err(TripbookError::StorageQuotaExceeded {
                    key: key.to_string(),
                    needed,
                    quota: self.quota_bytes,
                });
            }
            return Err(e.into());
        }

        debug!(key, bytes = payload.len(), "saved document");
        Ok(())
    }

    /// Remove the document entirely. Removing a missing key is not an error.
    pub fn remove(&self, key: &str) -> Result<()> {
        let path = self.document_path(key)?;
        match fs::remove_file(&path) {
            Ok(()) => {
                debug!(key, "removed document");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    pub fn contains(&self, key: &str) -> Result<bool> {
        Ok(self.document_path(key)?.exists())
    }

    /// Total bytes of all stored documents.
    pub fn usage_bytes(&self) -> Result<u64> {
        self.usage(None)
    }

    fn usage(&self, skip_key: Option<&str>) -> Result<u64> {
        let mut total = 0;
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(DOCUMENT_EXT) {
                continue;
            }
            let stem = path.file_stem().and_then(|s| s.to_str());
            if skip_key.is_some() && stem == skip_key {
                continue;
            }
            total += entry.metadata()?.len();
        }
        Ok(total)
    }

    fn document_path(&self, key: &str) -> Result<PathBuf> {
        validate_key(key)?;
        Ok(self.dir.join(format!("{}.{}", key, DOCUMENT_EXT)))
    }
}

/// Keys become file names, so only a conservative character set is allowed.
pub fn validate_key(key: &str) -> Result<()> {
    let valid = !key.is_empty()
        && !key.starts_with('.')
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'));
    if valid {
        Ok(())
    } else {
        Err(TripbookError::Storage(format!("invalid storage key: '{}'", key)))
    }
}

fn write_atomically(temp: &Path, target: &Path, payload: &[u8]) -> io::Result<()> {
    let mut file = File::create(temp)?;
    file.write_all(payload)?;
    file.sync_all()?;
    fs::rename(temp, target)
}

fn corrupt(key: &str, reason: String) -> TripbookError {
    TripbookError::CorruptPersistedData {
        key: key.to_string(),
        reason,
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    const QUOTA: u64 = 64 * 1024;

    fn setup() -> (JsonStore, TempDir) {
        let tmp = TempDir::new().unwrap();
        let store = JsonStore::open(&tmp.path().join("store"), QUOTA).unwrap();
        (store, tmp)
    }

    #[test]
    fn test_load_missing_key_is_empty() {
        let (store, _tmp) = setup();
        assert!(store.load("notes_v1").is_empty());
        assert!(store.read_document("notes_v1").unwrap().is_none());
    }

    #[test]
    fn test_save_then_load_round_trip() {
        let (store, _tmp) = setup();
        let document = json!({
            "0": [{"id": 1, "text": "hello", "image": null}],
            "3": []
        });

        store.save("notes_v1", &document).unwrap();
        let loaded = store.load("notes_v1");

        assert_eq!(Value::Object(loaded), document);
    }

    #[test]
    fn test_corrupt_payloads_load_as_empty() {
        let (store, _tmp) = setup();
        let payloads: [&[u8]; 7] = [
            b"{not json",
            b"",
            b"[1, 2, 3]",
            b"42",
            b"\"text\"",
            b"null",
            &[0xff, 0xfe, 0x00],
        ];

        for payload in payloads {
            fs::write(store.dir().join("notes_v1.json"), payload).unwrap();
            assert!(store.load("notes_v1").is_empty());
            assert!(matches!(
                store.read_document("notes_v1"),
                Err(TripbookError::CorruptPersistedData { .. })
            ));
        }
    }

    #[test]
    fn test_quota_exceeded_keeps_previous_document() {
        let tmp = TempDir::new().unwrap();
        let store = JsonStore::open(tmp.path(), 64).unwrap();

        let small = json!({"0": []});
        store.save("notes_v1", &small).unwrap();

        let large = json!({"0": [{"id": 1, "text": "x".repeat(200)}]});
        let err = store.save("notes_v1", &large).unwrap_err();
        match err {
            TripbookError::StorageQuotaExceeded { key, needed, quota } => {
                assert_eq!(key, "notes_v1");
                assert!(needed > quota);
                assert_eq!(quota, 64);
            }
            other => panic!("Expected StorageQuotaExceeded, got {:?}", other),
        }

        assert_eq!(Value::Object(store.load("notes_v1")), small);
    }

    #[test]
    fn test_quota_counts_other_documents() {
        let tmp = TempDir::new().unwrap();
        let store = JsonStore::open(tmp.path(), 100).unwrap();

        store
            .save("expenses_v1", &json!({"0": ["y".repeat(70)]}))
            .unwrap();
        let result = store.save("notes_v1", &json!({"0": ["z".repeat(40)]}));

        assert!(matches!(
            result,
            Err(TripbookError::StorageQuotaExceeded { .. })
        ));
    }

    #[test]
    fn test_overwrite_does_not_count_own_previous_size() {
        let tmp = TempDir::new().unwrap();
        let store = JsonStore::open(tmp.path(), 100).unwrap();

        store.save("notes_v1", &json!({"0": ["a".repeat(60)]})).unwrap();
        store.save("notes_v1", &json!({"0": ["b".repeat(60)]})).unwrap();
    }

    #[test]
    fn test_remove_deletes_document() {
        let (store, _tmp) = setup();
        store.save("notes_v1", &json!({"0": []})).unwrap();
        assert!(store.contains("notes_v1").unwrap());

        store.remove("notes_v1").unwrap();
        assert!(!store.contains("notes_v1").unwrap());

        // Removing again is fine
        store.remove("notes_v1").unwrap();
    }

    #[test]
    fn test_usage_bytes_sums_documents() {
        let (store, _tmp) = setup();
        assert_eq!(store.usage_bytes().unwrap(), 0);

        store.save("a", &json!({})).unwrap();
        store.save("b", &json!({"k": 1})).unwrap();
        assert_eq!(store.usage_bytes().unwrap(), 2 + 7);
    }

    #[test]
    fn test_invalid_keys_rejected() {
        let (store, _tmp) = setup();
        for key in ["", "../escape", ".hidden", "a/b", "sp ace"] {
            assert!(store.save(key, &json!({})).is_err(), "key {:?}", key);
        }
        assert!(validate_key("kyushu_trip_notes_v1").is_ok());
    }
}
