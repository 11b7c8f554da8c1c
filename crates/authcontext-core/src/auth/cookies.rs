use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

/// Cookie holding the access token
pub const TOKEN_COOKIE: &str = "nextauth.token";

/// Cookie holding the refresh token
pub const REFRESH_TOKEN_COOKIE: &str = "nextauth.refreshToken";

/// Session cookies live for 30 days
pub const SESSION_MAX_AGE_SECS: i64 = 60 * 60 * 24 * 30;

/// Cookies are scoped to the whole site
pub const ROOT_PATH: &str = "/";

/// Cookie jar file name in cache directory
const COOKIE_FILE: &str = "cookies.json";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to access token storage: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid token storage data: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Keychain error: {0}")]
    Keyring(#[from] keyring::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieOptions {
    pub max_age_secs: i64,
    pub path: String,
}

impl Default for CookieOptions {
    fn default() -> Self {
        Self {
            max_age_secs: SESSION_MAX_AGE_SECS,
            path: ROOT_PATH.to_string(),
        }
    }
}

/// Storage for session tokens that survives restarts.
pub trait TokenStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    fn set(&self, key: &str, value: &str, options: &CookieOptions) -> Result<(), StoreError>;

    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredCookie {
    pub value: String,
    pub path: String,
    pub expires_at: DateTime<Utc>,
}

impl StoredCookie {
    pub fn new(value: &str, options: &CookieOptions) -> Self {
        Self {
            value: value.to_string(),
            path: options.path.clone(),
            expires_at: Self::expiry(Utc::now(), options.max_age_secs),
        }
    }

    /// `now + max_age`, saturating at the representable bounds
    fn expiry(now: DateTime<Utc>, max_age_secs: i64) -> DateTime<Utc> {
        let saturated = if max_age_secs < 0 {
            DateTime::<Utc>::MIN_UTC
        } else {
            DateTime::<Utc>::MAX_UTC
        };
        Duration::try_seconds(max_age_secs)
            .and_then(|max_age| now.checked_add_signed(max_age))
            .unwrap_or(saturated)
    }

    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }
}

// ============================================================================
// In-memory jar
// ============================================================================

/// Process-local cookie jar. Entries vanish when the process ends.
#[derive(Debug, Default)]
pub struct MemoryCookieJar {
    cookies: Mutex<HashMap<String, StoredCookie>>,
}

impl MemoryCookieJar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw entry lookup, including its options
    pub fn entry(&self, key: &str) -> Option<StoredCookie> {
        self.cookies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }
}

impl TokenStore for MemoryCookieJar {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut cookies = self.cookies.lock().unwrap_or_else(PoisonError::into_inner);
        match cookies.get(key) {
            Some(cookie) if cookie.is_expired() => {
                cookies.remove(key);
                Ok(None)
            }
            Some(cookie) => Ok(Some(cookie.value.clone())),
            None => Ok(None),
        }
    }

    fn set(&self, key: &str, value: &str, options: &CookieOptions) -> Result<(), StoreError> {
        self.cookies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), StoredCookie::new(value, options));
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.cookies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
        Ok(())
    }
}

// ============================================================================
// File-backed jar
// ============================================================================

/// Cookie jar persisted as JSON in the cache directory.
pub struct FileCookieJar {
    cache_dir: PathBuf,
    // Serializes read-modify-write cycles within this process
    lock: Mutex<()>,
}

impl FileCookieJar {
    pub fn new(cache_dir: PathBuf) -> Self {
        Self {
            cache_dir,
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> PathBuf {
        self.cache_dir.join(COOKIE_FILE)
    }

    fn load(&self) -> Result<HashMap<String, StoredCookie>, StoreError> {
        let path = self.path();
        if !path.exists() {
            return Ok(HashMap::new());
        }
        let contents = std::fs::read_to_string(&path)?;
        let mut cookies: HashMap<String, StoredCookie> = serde_json::from_str(&contents)?;
        cookies.retain(|_, cookie| !cookie.is_expired());
        Ok(cookies)
    }

    /// Load for a read-modify-write cycle. An unreadable jar is discarded
    /// so the following write replaces it; the flag reports the discard.
    fn load_for_update(&self) -> Result<(HashMap<String, StoredCookie>, bool), StoreError> {
        match self.load() {
            Ok(cookies) => Ok((cookies, false)),
            Err(StoreError::Serialize(e)) => {
                warn!(path = %self.path().display(), error = %e, "Discarding corrupt cookie jar");
                Ok((HashMap::new(), true))
            }
            Err(e) => Err(e),
        }
    }

    fn save(&self, cookies: &HashMap<String, StoredCookie>) -> Result<(), StoreError> {
        let path = self.path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(cookies)?;
        std::fs::write(path, contents)?;
        Ok(())
    }
}

impl TokenStore for FileCookieJar {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(self.load()?.remove(key).map(|cookie| cookie.value))
    }

    fn set(&self, key: &str, value: &str, options: &CookieOptions) -> Result<(), StoreError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let (mut cookies, _) = self.load_for_update()?;
        cookies.insert(key.to_string(), StoredCookie::new(value, options));
        self.save(&cookies)?;
        debug!(key, path = %self.path().display(), "Cookie written");
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let (mut cookies, discarded) = self.load_for_update()?;
        if cookies.remove(key).is_some() || discarded {
            self.save(&cookies)?;
        }
        Ok(())
    }
}
