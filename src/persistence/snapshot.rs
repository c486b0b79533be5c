use crate::engine::{Engine, SharedEngine};
use crate::error::SnapshotError;
use crate::expire::ExpiryIndex;
use crate::store::Keyspace;
use crate::types::{ListValue, SetValue, StrValue, Value};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;

/// A byte string as stored in JSON: text when it is valid UTF-8, otherwise
/// an array of byte values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
enum Blob {
    Text(String),
    Raw(Vec<u8>),
}

impl Blob {
    fn from_bytes(bytes: &[u8]) -> Self {
        match std::str::from_utf8(bytes) {
            Ok(text) => Blob::Text(text.to_string()),
            Err(_) => Blob::Raw(bytes.to_vec()),
        }
    }

    fn into_bytes(self) -> Vec<u8> {
        match self {
            Blob::Text(text) => text.into_bytes(),
            Blob::Raw(bytes) => bytes,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
enum StoredValue {
    String(Blob),
    List(Vec<Blob>),
    Set(Vec<Blob>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Entry {
    value: StoredValue,
    /// Absolute deadline in unix milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    expires_at: Option<u64>,
}

/// Older files map keys straight to a string or an array of strings.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum StoredEntry {
    Full(Entry),
    Plain(String),
    PlainList(Vec<String>),
}

impl From<StoredEntry> for Entry {
    fn from(stored: StoredEntry) -> Self {
        let value = match stored {
            StoredEntry::Full(entry) => return entry,
            StoredEntry::Plain(text) => StoredValue::String(Blob::Text(text)),
            StoredEntry::PlainList(items) => {
                StoredValue::List(items.into_iter().map(Blob::Text).collect())
            }
        };
        Entry {
            value,
            expires_at: None,
        }
    }
}

/// Point-in-time copy of the keyspace, detached from the engine so it can be
/// written without holding the engine lock.
#[derive(Debug, Default, Serialize)]
#[serde(transparent)]
pub struct Snapshot {
    entries: BTreeMap<String, Entry>,
}

impl Snapshot {
    /// Copy every live key and its deadline. Keys already past their
    /// deadline are left out.
    pub fn capture(engine: &Engine) -> Self {
        let now = engine.now();
        let entries = engine
            .keyspace()
            .iter()
            .filter_map(|(key, value)| {
                let expires_at = engine.expiry().deadline(key);
                if expires_at.is_some_and(|deadline| deadline <= now) {
                    return None;
                }
                let value = match value {
                    Value::String(s) => StoredValue::String(Blob::from_bytes(s.as_bytes())),
                    Value::List(list) => {
                        StoredValue::List(list.iter().map(|v| Blob::from_bytes(v)).collect())
                    }
                    Value::Set(set) => {
                        StoredValue::Set(set.iter().map(|m| Blob::from_bytes(m)).collect())
                    }
                };
                Some((key.clone(), Entry { value, expires_at }))
            })
            .collect();
        Snapshot { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Write the snapshot to `path` (atomic via temp file + rename).
    pub fn save(&self, path: &Path) -> Result<(), SnapshotError> {
        let tmp_path = tmp_path_for(path);
        let mut writer = BufWriter::new(File::create(&tmp_path)?);
        self.save_to_writer(&mut writer)?;
        writer.flush()?;
        drop(writer);
        std::fs::rename(&tmp_path, path)?;
        Ok(())
    }

    pub fn save_to_writer(&self, w: &mut impl Write) -> Result<(), SnapshotError> {
        serde_json::to_writer_pretty(w, self)?;
        Ok(())
    }
}

/// Writes snapshots of a shared engine to one file, one save at a time.
///
/// Every save goes through the same `<path>.tmp`, so the periodic task and
/// the shutdown save must not overlap. Holding the gate from capture to
/// rename also means a later save always writes a newer copy.
#[derive(Clone)]
pub struct SnapshotWriter {
    path: PathBuf,
    gate: Arc<Mutex<()>>,
}

impl SnapshotWriter {
    pub fn new(path: PathBuf) -> Self {
        SnapshotWriter {
            path,
            gate: Arc::new(Mutex::new(())),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Capture under the engine lock, then write off the async workers.
    /// Returns the number of keys written.
    pub async fn save(&self, engine: &SharedEngine) -> Result<usize, SnapshotError> {
        let _turn = self.gate.lock().await;
        let snapshot = {
            let mut engine = engine.lock().await;
            engine.refresh_clock();
            Snapshot::capture(&engine)
        };
        let keys = snapshot.len();
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || snapshot.save(&path))
            .await
            .map_err(|e| SnapshotError::Io(std::io::Error::other(e)))??;
        Ok(keys)
    }
}

fn tmp_path_for(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".tmp");
    PathBuf::from(name)
}

/// Load a snapshot file, dropping entries whose deadline is at or before `now`.
pub fn load(path: &Path, now: u64) -> Result<(Keyspace, ExpiryIndex), SnapshotError> {
    let file = File::open(path)?;
    load_from_reader(BufReader::new(file), now)
}

pub fn load_from_reader(
    r: impl Read,
    now: u64,
) -> Result<(Keyspace, ExpiryIndex), SnapshotError> {
    let stored: BTreeMap<String, StoredEntry> = serde_json::from_reader(r)?;

    let mut keyspace = Keyspace::new();
    let mut expiry = ExpiryIndex::new();
    for (key, stored) in stored {
        let entry = Entry::from(stored);
        if entry.expires_at.is_some_and(|deadline| deadline <= now) {
            continue;
        }
        let value = match entry.value {
            StoredValue::String(blob) => Value::String(StrValue::new(blob.into_bytes())),
            StoredValue::List(items) => {
                Value::List(items.into_iter().map(Blob::into_bytes).collect::<ListValue>())
            }
            StoredValue::Set(members) => {
                Value::Set(members.into_iter().map(Blob::into_bytes).collect::<SetValue>())
            }
        };
        // An empty list or set is the same as a missing key
        if value.is_empty_collection() {
            continue;
        }
        if let Some(deadline) = entry.expires_at {
            expiry.set(&key, deadline);
        }
        keyspace.insert(key, value);
    }
    Ok((keyspace, expiry))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::test_support::*;
    use crate::resp::RespValue;

    fn populated() -> Harness {
        let mut h = Harness::new();
        h.run(&["SET", "greeting", "hello"]);
        h.run(&["SET", "session", "abc", "EXPIRE", "30"]);
        h.run(&["RPUSH", "jobs", "a", "b", "c"]);
        h.run(&["SADD", "tags", "x", "y"]);
        h
    }

    fn restore(snapshot: &Snapshot, now: u64) -> Harness {
        let mut buf = Vec::new();
        snapshot.save_to_writer(&mut buf).unwrap();
        let (keyspace, expiry) = load_from_reader(buf.as_slice(), now).unwrap();
        let mut h = Harness::new();
        h.engine = Engine::with_data(keyspace, expiry);
        h.engine.set_clock(now);
        h
    }

    #[test]
    fn test_restores_every_kind_with_deadlines() {
        let source = populated();
        let snapshot = Snapshot::capture(&source.engine);
        assert_eq!(snapshot.len(), 4);

        let mut h = restore(&snapshot, source.engine.now() + 10_000);
        assert_eq!(h.run(&["GET", "greeting"]), bulk("hello"));
        assert_eq!(h.run(&["TTL", "session"]), RespValue::integer(20));
        assert_eq!(h.run(&["TTL", "greeting"]), RespValue::integer(-1));
        assert_eq!(
            h.run(&["LRANGE", "jobs", "0", "-1"]),
            RespValue::bulk_array(["a", "b", "c"])
        );
        assert_eq!(h.run(&["SISMEMBER", "tags", "y"]), RespValue::integer(1));
    }

    #[test]
    fn test_expired_entries_are_skipped_on_load() {
        let source = populated();
        let snapshot = Snapshot::capture(&source.engine);
        let mut h = restore(&snapshot, source.engine.now() + 30_000);
        assert_eq!(h.run(&["GET", "session"]), RespValue::nil());
        assert!(h.engine.expiry().is_empty());
        assert_eq!(h.engine.keyspace().len(), 3);
    }

    #[test]
    fn test_capture_leaves_out_due_keys() {
        let mut h = populated();
        h.advance(30_000);
        assert_eq!(Snapshot::capture(&h.engine).len(), 3);
    }

    #[test]
    fn test_plain_json_is_accepted() {
        let json = r#"{"name": "ramkv", "queue": ["a", "b"]}"#;
        let (keyspace, expiry) = load_from_reader(json.as_bytes(), 0).unwrap();
        assert!(expiry.is_empty());
        assert_eq!(
            keyspace.get("name"),
            Some(&Value::String(StrValue::new(b"ramkv".to_vec())))
        );
        assert!(matches!(keyspace.get("queue"), Some(Value::List(l)) if l.len() == 2));
    }

    #[test]
    fn test_empty_collections_are_skipped_on_load() {
        let json = r#"{
            "queue": [],
            "tags": {"value": {"set": []}, "expires_at": 99999999},
            "jobs": {"value": {"list": []}},
            "name": "ramkv"
        }"#;
        let (keyspace, expiry) = load_from_reader(json.as_bytes(), 0).unwrap();
        assert_eq!(keyspace.len(), 1);
        assert!(keyspace.get("name").is_some());
        assert!(expiry.is_empty());
    }

    #[test]
    fn test_binary_values_survive() {
        let mut engine = Engine::new();
        engine.set("bin", Value::String(StrValue::new(vec![0xff, 0x00, 0x80])));
        let mut buf = Vec::new();
        Snapshot::capture(&engine).save_to_writer(&mut buf).unwrap();
        let (keyspace, _) = load_from_reader(buf.as_slice(), 0).unwrap();
        assert_eq!(
            keyspace.get("bin"),
            Some(&Value::String(StrValue::new(vec![0xff, 0x00, 0x80])))
        );
    }

    #[test]
    fn test_save_and_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.json");
        let source = populated();
        Snapshot::capture(&source.engine).save(&path).unwrap();
        assert!(!tmp_path_for(&path).exists());

        let (keyspace, expiry) = load(&path, source.engine.now()).unwrap();
        assert_eq!(keyspace.len(), 4);
        assert_eq!(expiry.len(), 1);
    }

    #[tokio::test]
    async fn test_writer_saves_one_at_a_time() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.json");
        let writer = SnapshotWriter::new(path.clone());
        let mut h = Harness::new();
        h.run(&["SET", "greeting", "hello"]);
        h.run(&["RPUSH", "jobs", "a", "b"]);
        h.run(&["SADD", "tags", "x"]);
        let engine = crate::engine::shared(h.engine);

        let turn = writer.gate.lock().await;
        let pending = tokio::spawn({
            let writer = writer.clone();
            let engine = engine.clone();
            async move { writer.save(&engine).await }
        });
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        assert!(!path.exists());
        assert!(!tmp_path_for(&path).exists());
        drop(turn);
        assert_eq!(pending.await.unwrap().unwrap(), 3);

        let saves: Vec<_> = (0..8)
            .map(|_| {
                let writer = writer.clone();
                let engine = engine.clone();
                tokio::spawn(async move { writer.save(&engine).await })
            })
            .collect();
        for save in saves {
            assert_eq!(save.await.unwrap().unwrap(), 3);
        }
        assert!(!tmp_path_for(&path).exists());
        let (keyspace, _) = load(&path, 0).unwrap();
        assert_eq!(keyspace.len(), 3);
    }

    #[test]
    fn test_load_errors() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.json");
        assert!(matches!(load(&missing, 0), Err(SnapshotError::Io(_))));

        let garbage = dir.path().join("garbage.json");
        std::fs::write(&garbage, "not json").unwrap();
        assert!(matches!(load(&garbage, 0), Err(SnapshotError::Json(_))));
    }
}
