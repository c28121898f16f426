//! Locations of the token file and the profile store.

use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Environment lookup, injected so callers and tests control what the
/// resolver sees.
pub type EnvLookup = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Lookup backed by the process environment.
pub fn process_env() -> EnvLookup {
    Arc::new(|name: &str| std::env::var(name).ok())
}

/// Resolved auth file locations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthPaths {
    /// `HF_HOME`, default `$XDG_CACHE_HOME/huggingface` or
    /// `~/.cache/huggingface`.
    pub hf_home: PathBuf,
    /// `HF_TOKEN_PATH`, default `$HF_HOME/token`.
    pub token_path: PathBuf,
    /// `HF_PROFILES_PATH`, default `$HF_HOME/profiles`.
    pub profiles_path: PathBuf,
}

impl AuthPaths {
    pub fn from_env() -> Self {
        Self::from_lookup(process_env().as_ref())
    }

    /// Derive the paths from an arbitrary environment.
    ///
    /// A leading `~` is expanded to the home directory. Empty variables
    /// count as unset.
    pub fn from_lookup(env: &dyn Fn(&str) -> Option<String>) -> Self {
        let var = |name: &str| env(name).filter(|v| !v.is_empty());

        let hf_home = match var("HF_HOME") {
            Some(home) => expand_home(&home),
            None => {
                let cache = var("XDG_CACHE_HOME")
                    .map(|c| expand_home(&c))
                    .unwrap_or_else(|| expand_home("~/.cache"));
                cache.join("huggingface")
            }
        };
        let token_path = var("HF_TOKEN_PATH")
            .map(|p| expand_home(&p))
            .unwrap_or_else(|| hf_home.join("token"));
        let profiles_path = var("HF_PROFILES_PATH")
            .map(|p| expand_home(&p))
            .unwrap_or_else(|| hf_home.join("profiles"));

        Self {
            hf_home,
            token_path,
            profiles_path,
        }
    }
}

/// Expand a leading `~` or `~/`. Without a home directory the remainder is
/// kept relative.
fn expand_home(path: &str) -> PathBuf {
    let rest = match path.strip_prefix('~') {
        Some("") => "",
        Some(rest) if rest.starts_with(['/', '\\']) => &rest[1..],
        _ => return PathBuf::from(path),
    };
    let home = dirs::home_dir().unwrap_or_default();
    if rest.is_empty() {
        home
    } else {
        home.join(Path::new(rest))
    }
}
