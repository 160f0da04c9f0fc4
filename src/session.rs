//! Opaque key-value stores for the two client identifiers: `session_id`
//! survives restarts (file-backed), `survey_user_id` lives for one run
//! (in-memory), minted on first use.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use log::warn;
use parking_lot::Mutex;
use rand::Rng;
use serde::{Deserialize, Serialize};

pub const SESSION_ID_KEY: &str = "session_id";
pub const USER_ID_KEY: &str = "survey_user_id";

pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
}

/// Per-run store; gone when the process exits.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.lock().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.values.lock().insert(key.to_string(), value.to_string());
    }
}

#[derive(Serialize, Deserialize, Default)]
struct StoreFile {
    #[serde(default)]
    values: HashMap<String, String>,
    #[serde(default)]
    updated_at: Option<DateTime<Utc>>,
}

/// JSON-file-backed store. Reads once on open; every `set` writes through.
/// Storage trouble is logged and otherwise ignored - identifiers are
/// conveniences, not critical state.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    values: Mutex<HashMap<String, String>>,
}

impl FileStore {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let values = match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<StoreFile>(&contents) {
                Ok(file) => file.values,
                Err(e) => {
                    warn!("会话文件无法解析，按空存储处理: {} ({})", e, path.display());
                    HashMap::new()
                }
            },
            Err(_) => HashMap::new(),
        };
        Self {
            path,
            values: Mutex::new(values),
        }
    }

    fn persist(&self, values: &HashMap<String, String>) {
        let file = StoreFile {
            values: values.clone(),
            updated_at: Some(Utc::now()),
        };
        match serde_json::to_string_pretty(&file) {
            Ok(json) => {
                if let Err(e) = fs::write(&self.path, json) {
                    warn!("会话文件写入失败: {} ({})", e, self.path.display());
                }
            }
            Err(e) => warn!("会话数据序列化失败: {}", e),
        }
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.lock().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        let mut values = self.values.lock();
        values.insert(key.to_string(), value.to_string());
        self.persist(&values);
    }
}

pub fn session_id(store: &dyn KeyValueStore) -> Option<String> {
    store.get(SESSION_ID_KEY).filter(|id| !id.is_empty())
}

pub fn remember_session_id(store: &dyn KeyValueStore, id: &str) {
    store.set(SESSION_ID_KEY, id);
}

/// The respondent identifier sent with submissions; minted once per store.
pub fn ensure_user_id(store: &dyn KeyValueStore) -> String {
    if let Some(existing) = store.get(USER_ID_KEY) {
        if !existing.is_empty() {
            return existing;
        }
    }
    let id = mint_user_id();
    store.set(USER_ID_KEY, &id);
    id
}

fn mint_user_id() -> String {
    const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    let mut rng = rand::thread_rng();
    let suffix: String = (0..9)
        .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
        .collect();
    format!("user_{}", suffix)
}
