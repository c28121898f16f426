//! Notebook secret vault access.
//!
//! Querying a vault may prompt the user, so the outcome of the first query
//! is cached for the life of the process (or until [`VaultCache::reset`])
//! and failures are reported once as warnings instead of errors.

use std::sync::{Arc, LazyLock, Mutex, PoisonError};

use thiserror::Error;
use tracing::warn;

use crate::token::clean_token;

/// Name of the secret holding the Hub token.
pub const TOKEN_SECRET: &str = "HF_TOKEN";

/// Ways a vault lookup can fail.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VaultError {
    /// The user declined to grant access to the secret.
    #[error("access to the secret was not granted")]
    AccessDenied,
    /// The secret is not defined in the vault.
    #[error("the secret does not exist")]
    NotConfigured,
    /// Anything else the vault reported.
    #[error("{0}")]
    Unexpected(String),
}

/// A secret store attached to the current session.
pub trait SecretVault: Send + Sync {
    /// Fetch a secret by name. `Ok(None)` means the vault holds no value.
    fn get_secret(&self, name: &str) -> Result<Option<String>, VaultError>;
}

/// Caches the outcome of the first token query against a vault.
///
/// The lock is held across the whole check-fetch-store sequence so
/// concurrent callers never query the vault twice.
#[derive(Debug, Default)]
pub struct VaultCache {
    slot: Mutex<Option<Option<String>>>,
}

impl VaultCache {
    pub const fn new() -> Self {
        Self {
            slot: Mutex::new(None),
        }
    }

    /// The cleaned token from `vault`, querying it only if no outcome has
    /// been cached yet. Failures are logged and cached as `None`.
    pub fn get_or_fetch(&self, vault: &dyn SecretVault) -> Option<String> {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(cached) = slot.as_ref() {
            return cached.clone();
        }
        let token = match vault.get_secret(TOKEN_SECRET) {
            Ok(value) => clean_token(value.as_deref()),
            Err(error) => {
                report(&error);
                None
            }
        };
        *slot = Some(token.clone());
        token
    }

    /// Forget the cached outcome so the next lookup queries the vault again.
    pub fn reset(&self) {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// True once an outcome has been cached.
    pub fn is_checked(&self) -> bool {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}

/// The process-wide cache used by default.
pub fn global_cache() -> Arc<VaultCache> {
    static CACHE: LazyLock<Arc<VaultCache>> = LazyLock::new(|| Arc::new(VaultCache::new()));
    Arc::clone(&CACHE)
}

fn report(error: &VaultError) {
    match error {
        VaultError::AccessDenied => warn!(
            "Access to the secret `{TOKEN_SECRET}` has not been granted on this notebook. \
             You will not be requested again. \
             Please restart the session if you want to be prompted again."
        ),
        VaultError::NotConfigured => warn!(
            "The secret `{TOKEN_SECRET}` does not exist in your secrets vault. \
             To authenticate with the Hugging Face Hub, create a token in your settings tab \
             (https://huggingface.co/settings/tokens), set it as a secret and restart your session. \
             Please note that authentication is recommended but still optional to access public \
             models or datasets."
        ),
        VaultError::Unexpected(message) => warn!(
            "Error while fetching `{TOKEN_SECRET}` secret value from your vault: '{message}'. \
             You are not authenticated with the Hugging Face Hub in this notebook. \
             If the error persists, please let us know by opening an issue on GitHub \
             (https://github.com/huggingface/huggingface_hub/issues/new)."
        ),
    }
}
