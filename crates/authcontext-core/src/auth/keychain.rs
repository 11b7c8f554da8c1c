use keyring::Entry;

use super::cookies::{CookieOptions, StoreError, StoredCookie, TokenStore};

const SERVICE_NAME: &str = "authcontext";

/// Token storage in the OS keychain, one entry per cookie name.
///
/// Entries hold the same JSON record as the file jar, so expiry still applies.
pub struct KeyringTokenStore {
    service: String,
}

impl KeyringTokenStore {
    pub fn new() -> Self {
        Self::with_service(SERVICE_NAME)
    }

    pub fn with_service(service: &str) -> Self {
        Self {
            service: service.to_string(),
        }
    }

    fn entry(&self, key: &str) -> Result<Entry, StoreError> {
        Ok(Entry::new(&self.service, key)?)
    }
}

impl Default for KeyringTokenStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenStore for KeyringTokenStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let secret = match self.entry(key)?.get_password() {
            Ok(secret) => secret,
            Err(keyring::Error::NoEntry) => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let cookie: StoredCookie = serde_json::from_str(&secret)?;
        if cookie.is_expired() {
            self.remove(key)?;
            return Ok(None);
        }
        Ok(Some(cookie.value))
    }

    fn set(&self, key: &str, value: &str, options: &CookieOptions) -> Result<(), StoreError> {
        let cookie = StoredCookie::new(value, options);
        self.entry(key)?.set_password(&serde_json::to_string(&cookie)?)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        match self.entry(key)?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
