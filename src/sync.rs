//! Check or update the client against the task declarations.
//!
//! One run goes through these steps:
//!
//! 1. Discover the tasks in the types directory, minus the skip list.
//! 2. Bind public client methods to tasks with a parameters record.
//! 3. Per binding, compute the missing parameters and the imports they need.
//! 4. In update mode, rewrite each method's signature and docstring in turn,
//!    re-parsing after every rewrite, then insert the merged imports.
//! 5. Format the result and write it back if it differs from the original.
//!
//! Check mode never writes the client file.

use std::path::{Path, PathBuf};

use hubkit_core::error::HubError;
use hubkit_cst::visitor::transform_module;
use hubkit_cst::{parse_module, AddImportsTransformer, AddParametersTransformer, Module};
use serde::Serialize;
use tracing::{debug, info};

use crate::config::SyncConfig;
use crate::error_bridges::{edit_error, parse_error, read_error, write_error};
use crate::format::SourceFormatter;
use crate::ops::{check_missing_parameters, plan_imports, ImportContext, ImportPlan};
use crate::tasks::{discover_tasks, match_tasks, TaskBinding};

/// Whether the client may be rewritten.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncMode {
    Check,
    Update,
}

/// A task whose method lacks declared parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskReport {
    pub method: String,
    pub parameters_type: String,
    /// Missing parameter names, in declaration order.
    pub missing: Vec<String>,
    /// Import lines the new annotations need.
    pub imports: Vec<String>,
}

/// Outcome of a run.
#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    pub mode: SyncMode,
    pub client_file: PathBuf,
    pub skipped: Vec<String>,
    /// Tasks with missing parameters, sorted by method name.
    pub tasks: Vec<TaskReport>,
    /// Import lines inserted (update) or needed (check), merged across tasks.
    pub imports: Vec<String>,
    /// True if the client file was rewritten.
    pub updated: bool,
}

impl SyncReport {
    /// True when every bound method already declares its parameters.
    pub fn is_in_sync(&self) -> bool {
        self.tasks.is_empty()
    }

    /// One line per out-of-date method.
    pub fn failures(&self) -> Vec<String> {
        self.tasks
            .iter()
            .map(|task| format!("❌ Missing parameters found in `{}`.", task.method))
            .collect()
    }
}

/// Runs the sync for one repository.
pub struct Synchronizer<'f> {
    config: SyncConfig,
    formatter: &'f dyn SourceFormatter,
}

impl<'f> Synchronizer<'f> {
    pub fn new(config: SyncConfig, formatter: &'f dyn SourceFormatter) -> Self {
        Self { config, formatter }
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    pub fn run(&self, mode: SyncMode) -> Result<SyncReport, HubError> {
        let config = &self.config;
        let client_path = config.client_path();

        let tasks = discover_tasks(&config.types_path(), &config.skip_tasks)?;
        debug!(count = tasks.len(), "discovered tasks");

        let original = std::fs::read_to_string(&client_path)
            .map_err(|e| read_error(&client_path, e))?;
        let bindings = {
            let client = parse(&client_path, &original)?;
            match_tasks(&client, config, &tasks)?
        };

        let mut current = original.clone();
        let mut plan = ImportPlan::new();
        let mut reports = Vec::new();

        for binding in &bindings {
            let Some(outcome) = self.sync_task(binding, &current, &client_path, mode)? else {
                continue;
            };
            plan.merge(&outcome.plan);
            reports.push(TaskReport {
                method: binding.method.clone(),
                parameters_type: binding.parameters_type.clone(),
                missing: outcome.missing,
                imports: outcome.plan.render_lines(),
            });
            if let Some(rewritten) = outcome.rewritten {
                current = rewritten;
            }
        }

        let mut updated = false;
        if mode == SyncMode::Update && !reports.is_empty() {
            if !plan.is_empty() {
                current = insert_imports(&client_path, &current, plan.render_lines())?;
            }
            let formatted = self.formatter.format(&current)?;
            if formatted != original {
                std::fs::write(&client_path, &formatted)
                    .map_err(|e| write_error(&client_path, e))?;
                info!(path = %client_path.display(), tasks = reports.len(), "client updated");
                updated = true;
            }
        }

        Ok(SyncReport {
            mode,
            client_file: config.display_path(&client_path).to_path_buf(),
            skipped: config.skip_tasks.clone(),
            tasks: reports,
            imports: plan.render_lines(),
            updated,
        })
    }

    fn sync_task(
        &self,
        binding: &TaskBinding,
        current: &str,
        client_path: &Path,
        mode: SyncMode,
    ) -> Result<Option<TaskOutcome>, HubError> {
        let declarations_source = std::fs::read_to_string(&binding.schema_path)
            .map_err(|e| read_error(&binding.schema_path, e))?;
        let declarations = parse(&binding.schema_path, &declarations_source)?;
        let client = parse(client_path, current)?;

        let missing = check_missing_parameters(
            &client,
            &declarations,
            &binding.method,
            &binding.parameters_type,
        );
        if missing.is_empty() {
            debug!(task = %binding.method, "in sync");
            return Ok(None);
        }
        let names: Vec<String> = missing.iter().map(|f| f.name.clone()).collect();
        debug!(task = %binding.method, missing = ?names, "missing parameters");

        let plan = plan_imports(
            &missing,
            &ImportContext {
                declarations: &declarations,
                declarations_module: &self.config.declarations_module,
                client: &client,
                client_package: &self.config.client_package,
            },
        );

        let rewritten = match mode {
            SyncMode::Check => None,
            SyncMode::Update => {
                let mut transformer = AddParametersTransformer::new(&binding.method, missing);
                let source = transform_module(&mut transformer, &client)
                    .map_err(|e| edit_error(client_path, e))?;
                debug!(task = %binding.method, definitions = transformer.rewritten(), "rewrote method");
                Some(source)
            }
        };

        Ok(Some(TaskOutcome {
            missing: names,
            plan,
            rewritten,
        }))
    }
}

struct TaskOutcome {
    missing: Vec<String>,
    plan: ImportPlan,
    rewritten: Option<String>,
}

fn parse<'a>(path: &Path, source: &'a str) -> Result<Module<'a>, HubError> {
    parse_module(source).map_err(|e| parse_error(path, &e))
}

fn insert_imports(path: &Path, source: &str, lines: Vec<String>) -> Result<String, HubError> {
    let module = parse(path, source)?;
    let mut transformer = AddImportsTransformer::new(lines);
    transform_module(&mut transformer, &module).map_err(|e| edit_error(path, e))
}
