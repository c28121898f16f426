//! Token lookup across the vault, the environment and the token file.

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use crate::paths::{process_env, AuthPaths, EnvLookup};
use crate::vault::{global_cache, SecretVault, VaultCache};

/// Primary token variable.
pub const HF_TOKEN: &str = "HF_TOKEN";
/// Deprecated alias of [`HF_TOKEN`].
pub const HUGGING_FACE_HUB_TOKEN: &str = "HUGGING_FACE_HUB_TOKEN";

/// Errors from token resolution.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The token file exists but could not be read.
    #[error("failed to read token file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Remove every `\r` and `\n`, trim surrounding whitespace, and map an empty
/// result to `None`.
///
/// ```
/// use hubkit_auth::clean_token;
///
/// assert_eq!(clean_token(Some(" abc\n")).as_deref(), Some("abc"));
/// assert_eq!(clean_token(Some("\r\n")), None);
/// assert_eq!(clean_token(None), None);
/// ```
pub fn clean_token(token: Option<&str>) -> Option<String> {
    let token = token?.replace(['\r', '\n'], "");
    let token = token.trim();
    (!token.is_empty()).then(|| token.to_string())
}

/// Resolves the Hub token from the configured sources.
pub struct TokenResolver {
    env: EnvLookup,
    paths: AuthPaths,
    vault: Option<Arc<dyn SecretVault>>,
    cache: Arc<VaultCache>,
}

impl TokenResolver {
    pub fn new(env: EnvLookup, paths: AuthPaths) -> Self {
        Self {
            env,
            paths,
            vault: None,
            cache: global_cache(),
        }
    }

    /// Resolver over the process environment, without a vault.
    pub fn from_env() -> Self {
        let env = process_env();
        let paths = AuthPaths::from_lookup(env.as_ref());
        Self::new(env, paths)
    }

    /// Consult `vault` first. Its outcome is cached in the process-wide
    /// [`VaultCache`] unless [`TokenResolver::with_cache`] supplies another.
    pub fn with_vault(mut self, vault: Arc<dyn SecretVault>) -> Self {
        self.vault = Some(vault);
        self
    }

    pub fn with_cache(mut self, cache: Arc<VaultCache>) -> Self {
        self.cache = cache;
        self
    }

    pub fn paths(&self) -> &AuthPaths {
        &self.paths
    }

    /// The first token found in the vault, the environment or the token
    /// file, in that order.
    ///
    /// Vault failures never propagate. Only an unreadable token file is an
    /// error; a missing one is not.
    pub fn get_token(&self) -> Result<Option<String>, AuthError> {
        if let Some(token) = self.token_from_vault() {
            debug!("token resolved from the secret vault");
            return Ok(Some(token));
        }
        if let Some(token) = self.token_from_environment() {
            debug!("token resolved from the environment");
            return Ok(Some(token));
        }
        let token = self.token_from_file()?;
        if token.is_some() {
            debug!(path = %self.paths.token_path.display(), "token resolved from file");
        }
        Ok(token)
    }

    fn token_from_vault(&self) -> Option<String> {
        let vault = self.vault.as_deref()?;
        self.cache.get_or_fetch(vault)
    }

    fn token_from_environment(&self) -> Option<String> {
        let primary = (self.env)(HF_TOKEN).filter(|v| !v.is_empty());
        let value = primary.or_else(|| (self.env)(HUGGING_FACE_HUB_TOKEN));
        clean_token(value.as_deref())
    }

    fn token_from_file(&self) -> Result<Option<String>, AuthError> {
        match std::fs::read_to_string(&self.paths.token_path) {
            Ok(content) => Ok(clean_token(Some(&content))),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(AuthError::Io {
                path: self.paths.token_path.clone(),
                source,
            }),
        }
    }
}
