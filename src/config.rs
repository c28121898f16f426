//! Repository layout for the signature sync.
//!
//! All paths default to the `huggingface_hub` layout and are resolved
//! against the repository root. Absolute overrides are used as-is.

use std::path::{Path, PathBuf};

use serde::Serialize;

/// Client source file, relative to the repository root.
pub const DEFAULT_CLIENT_FILE: &str = "src/huggingface_hub/inference/_client.py";
/// Directory holding one declarations file per task.
pub const DEFAULT_TYPES_DIR: &str = "src/huggingface_hub/inference/_generated/types";
pub const DEFAULT_CLIENT_CLASS: &str = "InferenceClient";
/// Package containing the client module.
pub const DEFAULT_CLIENT_PACKAGE: &str = "huggingface_hub.inference";
/// Module that re-exports every declaration.
pub const DEFAULT_DECLARATIONS_MODULE: &str = "huggingface_hub.inference._generated.types";

/// Tasks without a usable parameters declaration.
pub const TASKS_TO_SKIP: &[&str] = &[
    "chat_completion",
    "depth_estimation",
    "audio_to_audio",
    "feature_extraction",
    "sentence_similarity",
    "table_question_answering",
    "automatic_speech_recognition",
    "image_to_text",
    "image_to_image",
];

/// Where the client and the declarations live, and how they are named.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncConfig {
    pub repo_root: PathBuf,
    /// Client source file, relative to `repo_root` unless absolute.
    pub client_file: PathBuf,
    /// Declarations directory, relative to `repo_root` unless absolute.
    pub types_dir: PathBuf,
    pub client_class: String,
    /// Package used to resolve relative imports in the client.
    pub client_package: String,
    /// Default origin for declared types, and the package used to resolve
    /// relative imports in declaration files.
    pub declarations_module: String,
    pub skip_tasks: Vec<String>,
}

impl SyncConfig {
    /// Defaults for a checkout rooted at `root`.
    pub fn for_repo(root: impl Into<PathBuf>) -> Self {
        Self {
            repo_root: root.into(),
            client_file: PathBuf::from(DEFAULT_CLIENT_FILE),
            types_dir: PathBuf::from(DEFAULT_TYPES_DIR),
            client_class: DEFAULT_CLIENT_CLASS.to_string(),
            client_package: DEFAULT_CLIENT_PACKAGE.to_string(),
            declarations_module: DEFAULT_DECLARATIONS_MODULE.to_string(),
            skip_tasks: TASKS_TO_SKIP.iter().map(|t| t.to_string()).collect(),
        }
    }

    pub fn client_path(&self) -> PathBuf {
        self.repo_root.join(&self.client_file)
    }

    pub fn types_path(&self) -> PathBuf {
        self.repo_root.join(&self.types_dir)
    }

    /// Declarations file for `task`.
    pub fn schema_path(&self, task: &str) -> PathBuf {
        self.types_path().join(format!("{task}.py"))
    }

    pub fn is_skipped(&self, task: &str) -> bool {
        self.skip_tasks.iter().any(|t| t == task)
    }

    /// `path` relative to the repository root, for messages.
    pub fn display_path<'p>(&self, path: &'p Path) -> &'p Path {
        path.strip_prefix(&self.repo_root).unwrap_or(path)
    }
}
