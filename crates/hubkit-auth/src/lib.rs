//! Authentication token resolution for the Hub client.
//!
//! A token is looked up, in order, in:
//! 1. a notebook secret vault, when one is attached ([`SecretVault`])
//! 2. the `HF_TOKEN` environment variable, then the deprecated
//!    `HUGGING_FACE_HUB_TOKEN`
//! 3. the token file under the Hub home directory
//!
//! Named tokens can also be kept in an INI profile store ([`ProfileStore`]).
//!
//! ```
//! use std::sync::Arc;
//! use hubkit_auth::{AuthPaths, TokenResolver};
//!
//! let env = Arc::new(|name: &str| match name {
//!     "HF_TOKEN" => Some(" hf_abc\n".to_string()),
//!     "HF_HOME" => Some("/nonexistent/hub".to_string()),
//!     _ => None,
//! });
//! let paths = AuthPaths::from_lookup(env.as_ref());
//! let resolver = TokenResolver::new(env, paths);
//! assert_eq!(resolver.get_token().unwrap().as_deref(), Some("hf_abc"));
//! ```

pub mod paths;
pub mod profiles;
pub mod token;
pub mod vault;

pub use paths::{process_env, AuthPaths, EnvLookup};
pub use profiles::{ProfileError, ProfileStore};
pub use token::{clean_token, AuthError, TokenResolver};
pub use vault::{global_cache, SecretVault, VaultCache, VaultError, TOKEN_SECRET};
