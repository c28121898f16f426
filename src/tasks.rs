//! Task discovery and matching.
//!
//! A task is a declarations file in the types directory. It is bound to a
//! client method of the same name when the file declares a
//! `<Task>Parameters` record.

use std::collections::BTreeSet;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use hubkit_core::error::HubError;
use hubkit_cst::{ClassMethodCollector, Module};
use regex::Regex;
use serde::Serialize;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::config::SyncConfig;
use crate::error_bridges::read_error;

static PARAMETERS_DECLARATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^@dataclass(?:_with_extra)?\nclass\s(\w+Parameters)\(BaseInferenceType\):")
        .unwrap()
});

/// A client method paired with its parameters declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskBinding {
    pub method: String,
    pub parameters_type: String,
    pub schema_path: PathBuf,
}

/// Stems of the `*.py` files directly inside `types_dir`, minus `skip`.
///
/// A missing directory yields no tasks.
pub fn discover_tasks(types_dir: &Path, skip: &[String]) -> Result<BTreeSet<String>, HubError> {
    if !types_dir.is_dir() {
        warn!("Types directory not found: {}", types_dir.display());
        return Ok(BTreeSet::new());
    }

    let mut tasks = BTreeSet::new();
    for entry in WalkDir::new(types_dir).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(types_dir).to_path_buf();
            read_error(&path, io::Error::other(e.to_string()))
        })?;
        let path = entry.path();
        if !entry.file_type().is_file() || path.extension().is_none_or(|ext| ext != "py") {
            continue;
        }
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        if skip.iter().any(|s| s == stem) {
            continue;
        }
        tasks.insert(stem.to_string());
    }
    Ok(tasks)
}

/// Name of the parameters record declared in `source`, if any.
///
/// ```
/// use hubkit::tasks::parameters_type_name;
///
/// let source = "@dataclass_with_extra\nclass FillMaskParameters(BaseInferenceType):\n    top_k: Optional[int] = None\n";
/// assert_eq!(parameters_type_name(source).as_deref(), Some("FillMaskParameters"));
/// assert_eq!(parameters_type_name("class FillMaskInput:\n    pass\n"), None);
/// ```
pub fn parameters_type_name(source: &str) -> Option<String> {
    PARAMETERS_DECLARATION
        .captures(source)
        .map(|caps| caps[1].to_string())
}

/// Bind the client's public methods to discovered tasks, sorted by method
/// name.
///
/// Methods with no task, or whose task declares no parameters record, are
/// skipped.
pub fn match_tasks(
    client: &Module<'_>,
    config: &SyncConfig,
    tasks: &BTreeSet<String>,
) -> Result<Vec<TaskBinding>, HubError> {
    let mut methods = ClassMethodCollector::collect(client, &config.client_class);
    methods.retain(|m| !m.starts_with('_') && tasks.contains(m));
    methods.sort();

    let mut bindings = Vec::new();
    for method in methods {
        let schema_path = config.schema_path(&method);
        let source = match std::fs::read_to_string(&schema_path) {
            Ok(source) => source,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                warn!("File not found: {}", schema_path.display());
                continue;
            }
            Err(e) => return Err(read_error(&schema_path, e)),
        };
        let Some(parameters_type) = parameters_type_name(&source) else {
            debug!(task = %method, "no parameters declaration");
            continue;
        };
        bindings.push(TaskBinding {
            method,
            parameters_type,
            schema_path,
        });
    }
    Ok(bindings)
}
