//! Device-local key/value state: session, active tenant, per-course caches and
//! the quiz hand-over between screens. Writes are last-writer-wins.
//!
//! Every value is wrapped in an [`Envelope`] carrying the schema version.
//! Bare values written before versioning are upgraded on read; values from a
//! newer schema are reported as malformed.

#[cfg(not(target_arch = "wasm32"))]
use rusqlite::{params, Connection};
#[cfg(target_arch = "wasm32")]
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
#[cfg(target_arch = "wasm32")]
use web_sys::Storage;

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::{debug, warn};

use crate::backend::error::AppError;
use crate::backend::models::{Explanation, Session};
use crate::backend::quiz::{QuizDraft, QuizRecord};

pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StoreKey {
    Session,
    ActiveTenant,
    MaterialUrl(String),
    Explanations(String),
    QuizQuestions,
    QuizResults,
}

impl StoreKey {
    pub fn as_key(&self) -> String {
        match self {
            StoreKey::Session => "session".to_string(),
            StoreKey::ActiveTenant => "active_tenant".to_string(),
            StoreKey::MaterialUrl(course_id) => format!("material_url:{course_id}"),
            StoreKey::Explanations(course_id) => format!("explanations:{course_id}"),
            StoreKey::QuizQuestions => "quiz_questions".to_string(),
            StoreKey::QuizResults => "quiz_results".to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Envelope<T> {
    version: u32,
    written_at: DateTime<Utc>,
    data: T,
}

/// Browser-side backing: `localStorage` under a namespace, or a memory map
/// when the page has no storage (e.g. some private windows).
#[cfg(target_arch = "wasm32")]
#[derive(Clone)]
enum WebEntries {
    Local { storage: Storage, namespace: String },
    Memory(Arc<Mutex<HashMap<String, String>>>),
}

#[derive(Clone)]
pub struct Store {
    #[cfg(not(target_arch = "wasm32"))]
    conn: Arc<Mutex<Connection>>,
    #[cfg(target_arch = "wasm32")]
    entries: WebEntries,
}

/// `localStorage` is shared by every app on the origin.
#[cfg(any(target_arch = "wasm32", test))]
fn namespaced_key(namespace: &str, key: &str) -> String {
    format!("{namespace}:{key}")
}

#[cfg(target_arch = "wasm32")]
fn js_error(e: wasm_bindgen::JsValue) -> AppError {
    AppError::Storage(format!("localStorage: {e:?}"))
}

impl Store {
    #[cfg(not(target_arch = "wasm32"))]
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, AppError> {
        Self::from_connection(Connection::open(path)?)
    }

    /// On the web the path only namespaces keys inside `localStorage`.
    #[cfg(target_arch = "wasm32")]
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, AppError> {
        let storage = web_sys::window()
            .ok_or_else(|| AppError::Storage("no window".into()))?
            .local_storage()
            .map_err(js_error)?
            .ok_or_else(|| AppError::Storage("localStorage unavailable".into()))?;
        Ok(Self {
            entries: WebEntries::Local {
                storage,
                namespace: path.as_ref().display().to_string(),
            },
        })
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn new_in_memory() -> Result<Self, AppError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    #[cfg(target_arch = "wasm32")]
    pub fn new_in_memory() -> Result<Self, AppError> {
        Ok(Self {
            entries: WebEntries::Memory(Arc::new(Mutex::new(HashMap::new()))),
        })
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn from_connection(conn: Connection) -> Result<Self, AppError> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )",
            [],
        )?;
        Ok(Self { conn: Arc::new(Mutex::new(conn)) })
    }

    fn put_raw(&self, key: &str, value: String) -> Result<(), AppError> {
        #[cfg(not(target_arch = "wasm32"))]
        {
            let conn = self.conn.lock().map_err(|_| AppError::Storage("store lock poisoned".into()))?;
            conn.execute(
                "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
                params![key, value],
            )?;
        }

        #[cfg(target_arch = "wasm32")]
        match &self.entries {
            WebEntries::Local { storage, namespace } => {
                storage.set_item(&namespaced_key(namespace, key), &value).map_err(js_error)?;
            }
            WebEntries::Memory(entries) => {
                let mut entries = entries.lock().map_err(|_| AppError::Storage("store lock poisoned".into()))?;
                entries.insert(key.to_string(), value);
            }
        }

        Ok(())
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn get_raw(&self, key: &str) -> Result<Option<String>, AppError> {
        let conn = self.conn.lock().map_err(|_| AppError::Storage("store lock poisoned".into()))?;
        let mut stmt = conn.prepare("SELECT value FROM kv WHERE key = ?1")?;
        let mut rows = stmt.query(params![key])?;
        if let Some(row) = rows.next()? {
            Ok(Some(row.get(0)?))
        } else {
            Ok(None)
        }
    }

    #[cfg(target_arch = "wasm32")]
    fn get_raw(&self, key: &str) -> Result<Option<String>, AppError> {
        match &self.entries {
            WebEntries::Local { storage, namespace } => {
                storage.get_item(&namespaced_key(namespace, key)).map_err(js_error)
            }
            WebEntries::Memory(entries) => {
                let entries = entries.lock().map_err(|_| AppError::Storage("store lock poisoned".into()))?;
                Ok(entries.get(key).cloned())
            }
        }
    }

    pub fn remove(&self, key: &StoreKey) -> Result<(), AppError> {
        let key = key.as_key();

        #[cfg(not(target_arch = "wasm32"))]
        {
            let conn = self.conn.lock().map_err(|_| AppError::Storage("store lock poisoned".into()))?;
            conn.execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        }

        #[cfg(target_arch = "wasm32")]
        match &self.entries {
            WebEntries::Local { storage, namespace } => {
                storage.remove_item(&namespaced_key(namespace, key)).map_err(js_error)?;
            }
            WebEntries::Memory(entries) => {
                let mut entries = entries.lock().map_err(|_| AppError::Storage("store lock poisoned".into()))?;
                entries.remove(&key);
            }
        }

        Ok(())
    }

    pub fn put<T: Serialize>(&self, key: &StoreKey, data: &T) -> Result<(), AppError> {
        let envelope = Envelope {
            version: SCHEMA_VERSION,
            written_at: Utc::now(),
            data,
        };
        let value = serde_json::to_string(&envelope).map_err(|e| AppError::Storage(e.to_string()))?;
        self.put_raw(&key.as_key(), value)
    }

    pub fn get<T: Serialize + DeserializeOwned>(&self, key: &StoreKey) -> Result<Option<T>, AppError> {
        let raw_key = key.as_key();
        let Some(raw) = self.get_raw(&raw_key)? else {
            return Ok(None);
        };

        if let Ok(envelope) = serde_json::from_str::<Envelope<serde_json::Value>>(&raw) {
            if envelope.version > SCHEMA_VERSION {
                warn!("{raw_key} was written by schema v{}, this build reads v{SCHEMA_VERSION}", envelope.version);
                return Err(AppError::MalformedCache(raw_key));
            }
            let data = serde_json::from_value(envelope.data)
                .map_err(|_| AppError::MalformedCache(raw_key))?;
            return Ok(Some(data));
        }

        // v0: the value was stored bare
        let data: T = serde_json::from_str(&raw).map_err(|_| AppError::MalformedCache(raw_key.clone()))?;
        debug!("Migrating {raw_key} to schema v{SCHEMA_VERSION}");
        self.put(key, &data)?;
        Ok(Some(data))
    }

    pub fn session(&self) -> Result<Option<Session>, AppError> {
        self.get(&StoreKey::Session)
    }

    /// Persists the session and mirrors its tenant into `active_tenant`.
    pub fn save_session(&self, session: &Session) -> Result<(), AppError> {
        self.put(&StoreKey::Session, session)?;
        match &session.tenant_id {
            Some(tenant_id) => self.put(&StoreKey::ActiveTenant, tenant_id),
            None => self.remove(&StoreKey::ActiveTenant),
        }
    }

    pub fn clear_session(&self) -> Result<(), AppError> {
        self.remove(&StoreKey::Session)?;
        self.remove(&StoreKey::ActiveTenant)
    }

    pub fn active_tenant(&self) -> Result<Option<String>, AppError> {
        self.get(&StoreKey::ActiveTenant)
    }

    pub fn material_url(&self, course_id: &str) -> Result<Option<String>, AppError> {
        self.get(&StoreKey::MaterialUrl(course_id.to_string()))
    }

    pub fn cache_material_url(&self, course_id: &str, url: &str) -> Result<(), AppError> {
        self.put(&StoreKey::MaterialUrl(course_id.to_string()), &url)
    }

    pub fn explanations(&self, course_id: &str) -> Result<Option<Vec<Explanation>>, AppError> {
        self.get(&StoreKey::Explanations(course_id.to_string()))
    }

    pub fn cache_explanations(&self, course_id: &str, explanations: &[Explanation]) -> Result<(), AppError> {
        self.put(&StoreKey::Explanations(course_id.to_string()), &explanations)
    }

    pub fn quiz_draft(&self) -> Result<Option<QuizDraft>, AppError> {
        self.get(&StoreKey::QuizQuestions)
    }

    pub fn save_quiz_draft(&self, draft: &QuizDraft) -> Result<(), AppError> {
        self.put(&StoreKey::QuizQuestions, draft)
    }

    /// Stores the attempt and consumes the question set it was taken from.
    pub fn record_quiz_attempt(&self, record: &QuizRecord) -> Result<(), AppError> {
        self.put(&StoreKey::QuizResults, record)?;
        self.remove(&StoreKey::QuizQuestions)
    }

    pub fn quiz_record(&self) -> Result<Option<QuizRecord>, AppError> {
        self.get(&StoreKey::QuizResults)
    }
}
