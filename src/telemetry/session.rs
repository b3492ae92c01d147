//! Session identity: one compute-once hex digest per process.

use chrono::{SecondsFormat, Utc};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

static SESSION_COUNTER: AtomicU64 = AtomicU64::new(1);
static GLOBAL_SESSION: OnceLock<Arc<SessionIdentity>> = OnceLock::new();

/// Login name of the current OS user, or `"unknown"`.
pub fn current_user() -> String {
    ["USER", "USERNAME", "LOGNAME"]
        .iter()
        .find_map(|key| std::env::var(key).ok().filter(|v| !v.is_empty()))
        .unwrap_or_else(|| "unknown".to_string())
}

/// Lazily computed session id. The first call to [`value`](Self::value)
/// computes it; every later call returns the same string.
#[derive(Debug, Default)]
pub struct SessionIdentity {
    value: OnceLock<String>,
}

impl SessionIdentity {
    pub const fn new() -> Self {
        Self {
            value: OnceLock::new(),
        }
    }

    /// The process-wide identity shared by every handler built without an
    /// explicit one.
    pub fn global() -> Arc<SessionIdentity> {
        Arc::clone(GLOBAL_SESSION.get_or_init(|| Arc::new(SessionIdentity::new())))
    }

    pub fn value(&self) -> &str {
        self.value.get_or_init(Self::create)
    }

    pub fn is_computed(&self) -> bool {
        self.value.get().is_some()
    }

    /// Compute a fresh id without touching any cache.
    ///
    /// BLAKE3 over `{user}_{timestamp}_{pid}_{seq}`, hex encoded (64 chars).
    pub fn create() -> String {
        let login = current_user();
        let timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Nanos, true);
        let pid = std::process::id();
        let seq = SESSION_COUNTER.fetch_add(1, Ordering::Relaxed);
        let session_str = format!("{login}_{timestamp}_{pid}_{seq}");
        hex::encode(blake3::hash(session_str.as_bytes()).as_bytes())
    }
}
