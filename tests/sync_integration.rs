//! End-to-end runs of the synchronizer against a temporary repository.

use std::cell::Cell;
use std::fs;
use std::path::{Path, PathBuf};

use hubkit::error::{HubError, OutputErrorCode};
use hubkit::{FormatError, PassThrough, SourceFormatter, SyncConfig, SyncMode, Synchronizer};
use tempfile::TempDir;

const CLIENT: &str = r#"from typing import List, Optional

from huggingface_hub.inference._generated.types import TextClassificationOutputElement


class InferenceClient:
    def __init__(self, model: Optional[str] = None):
        self.model = model

    def fill_mask(self, text: str, *, model: Optional[str] = None, top_k: Optional[int] = None) -> List[str]:
        """Fill the mask."""
        return self._post(text, model)

    def text_classification(
        self,
        text: str,
        *,
        model: Optional[str] = None,
    ) -> List[TextClassificationOutputElement]:
        """
        Perform text classification on the given text.

        Args:
            text (`str`):
                A string to be classified.
            model (`str`, *optional*):
                The model to use.

        Returns:
            `List[TextClassificationOutputElement]`: the predictions.
        """
        return self._post(text, model)
"#;

const TEXT_CLASSIFICATION: &str = r#"from typing import Literal, Optional

from .base import BaseInferenceType, dataclass_with_extra


TextClassificationOutputTransform = Literal["sigmoid", "softmax", "none"]


@dataclass_with_extra
class TextClassificationParameters(BaseInferenceType):
    """Additional inference parameters for Text Classification"""

    function_to_apply: Optional["TextClassificationOutputTransform"] = None
    """The function to apply to the model outputs in order to retrieve the scores."""
    top_k: Optional[int] = None
    """When specified, limits the output to the top K most probable classes."""
"#;

const FILL_MASK: &str = r#"from typing import Optional

from .base import BaseInferenceType, dataclass_with_extra


@dataclass_with_extra
class FillMaskParameters(BaseInferenceType):
    top_k: Optional[int] = None
    """When passed, overrides the number of predictions to return."""
"#;

const CHAT_COMPLETION: &str = r#"@dataclass_with_extra
class ChatCompletionParameters(BaseInferenceType):
    seed: Optional[int] = None
"#;

struct Repo {
    dir: TempDir,
    config: SyncConfig,
}

impl Repo {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let config = SyncConfig::for_repo(dir.path());
        fs::create_dir_all(config.types_path()).unwrap();
        fs::create_dir_all(config.client_path().parent().unwrap()).unwrap();

        let repo = Repo { dir, config };
        repo.write_client(CLIENT);
        repo.write_task("base", "class BaseInferenceType:\n    pass\n");
        repo.write_task("text_classification", TEXT_CLASSIFICATION);
        repo.write_task("fill_mask", FILL_MASK);
        repo.write_task("chat_completion", CHAT_COMPLETION);
        repo
    }

    fn write_client(&self, source: &str) {
        fs::write(self.config.client_path(), source).unwrap();
    }

    fn write_task(&self, task: &str, source: &str) {
        fs::write(self.config.schema_path(task), source).unwrap();
    }

    fn client(&self) -> String {
        fs::read_to_string(self.config.client_path()).unwrap()
    }

    fn root(&self) -> &Path {
        self.dir.path()
    }

    fn run(&self, mode: SyncMode, formatter: &dyn SourceFormatter) -> Result<hubkit::SyncReport, HubError> {
        Synchronizer::new(self.config.clone(), formatter).run(mode)
    }
}

const IMPORT_LINE: &str =
    "from huggingface_hub.inference._generated.types import TextClassificationOutputTransform";

#[test]
fn check_reports_missing_parameters_without_writing() {
    let repo = Repo::new();
    let report = repo.run(SyncMode::Check, &PassThrough).unwrap();

    assert!(!report.is_in_sync());
    assert!(!report.updated);
    assert_eq!(report.tasks.len(), 1);
    let task = &report.tasks[0];
    assert_eq!(task.method, "text_classification");
    assert_eq!(task.parameters_type, "TextClassificationParameters");
    assert_eq!(task.missing, vec!["function_to_apply", "top_k"]);
    assert_eq!(task.imports, vec![IMPORT_LINE]);
    assert_eq!(report.imports, vec![IMPORT_LINE]);
    assert_eq!(
        report.client_file,
        PathBuf::from("src/huggingface_hub/inference/_client.py")
    );
    assert_eq!(
        report.failures(),
        vec!["❌ Missing parameters found in `text_classification`."]
    );

    assert_eq!(repo.client(), CLIENT);
}

#[test]
fn update_rewrites_signature_docstring_and_imports() {
    let repo = Repo::new();
    let report = repo.run(SyncMode::Update, &PassThrough).unwrap();
    assert!(report.updated);

    let client = repo.client();
    assert!(client.contains(&format!(
        "import TextClassificationOutputElement\n{IMPORT_LINE}\n"
    )));
    assert!(client.contains(
        "        model: Optional[str] = None,
        function_to_apply: Optional[\"TextClassificationOutputTransform\"] = None,
        top_k: Optional[int] = None,
    ) -> List[TextClassificationOutputElement]:"
    ));
    assert!(client.contains(
        "            model (`str`, *optional*):
                The model to use.
            function_to_apply (`\"TextClassificationOutputTransform\"`, *optional*):
                The function to apply to the model outputs in order to retrieve the scores.
            top_k (`int`, *optional*):
                When specified, limits the output to the top K most probable classes.

        Returns:"
    ));
    // fill_mask was already in sync.
    assert!(client.contains(
        "    def fill_mask(self, text: str, *, model: Optional[str] = None, top_k: Optional[int] = None) -> List[str]:"
    ));
    assert!(hubkit_cst::parse_module(&client).is_ok());
}

#[test]
fn second_run_is_a_no_op() {
    let repo = Repo::new();
    repo.run(SyncMode::Update, &PassThrough).unwrap();
    let after_update = repo.client();

    let check = repo.run(SyncMode::Check, &PassThrough).unwrap();
    assert!(check.is_in_sync());
    assert!(check.imports.is_empty());

    let update = repo.run(SyncMode::Update, &PassThrough).unwrap();
    assert!(!update.updated);
    assert_eq!(repo.client(), after_update);
}

struct CountingFormatter {
    calls: Cell<usize>,
}

impl SourceFormatter for CountingFormatter {
    fn format(&self, source: &str) -> Result<String, FormatError> {
        self.calls.set(self.calls.get() + 1);
        Ok(source.replace("\n\n\nclass InferenceClient", "\n\nclass InferenceClient"))
    }
}

#[test]
fn formatter_output_is_what_gets_written() {
    let repo = Repo::new();
    let formatter = CountingFormatter {
        calls: Cell::new(0),
    };
    repo.run(SyncMode::Update, &formatter).unwrap();
    assert_eq!(formatter.calls.get(), 1);
    assert!(repo.client().contains(&format!("{IMPORT_LINE}\n\nclass InferenceClient")));

    // Nothing missing: the formatter is not consulted.
    repo.run(SyncMode::Update, &formatter).unwrap();
    assert_eq!(formatter.calls.get(), 1);
}

struct FailingFormatter;

impl SourceFormatter for FailingFormatter {
    fn format(&self, _source: &str) -> Result<String, FormatError> {
        Err(FormatError::Failed {
            command: "ruff check --fix --quiet".to_string(),
            exit_code: 1,
            stderr: "E999 SyntaxError".to_string(),
        })
    }
}

#[test]
fn formatter_failure_is_fatal_and_leaves_client_untouched() {
    let repo = Repo::new();
    let err = repo.run(SyncMode::Update, &FailingFormatter).unwrap_err();
    assert!(matches!(err, HubError::FormatterFailed { exit_code: 1, .. }));
    assert_eq!(err.error_code(), OutputErrorCode::ApplyError);
    assert_eq!(repo.client(), CLIENT);
}

#[test]
fn skipped_tasks_are_not_checked() {
    let mut repo = Repo::new();
    repo.config.skip_tasks.push("text_classification".to_string());
    let report = repo.run(SyncMode::Check, &PassThrough).unwrap();
    assert!(report.is_in_sync());
    assert!(report.skipped.contains(&"text_classification".to_string()));
}

#[test]
fn task_without_parameters_record_is_ignored() {
    let repo = Repo::new();
    repo.write_task(
        "text_classification",
        "class TextClassificationInput(BaseInferenceType):\n    inputs: str\n",
    );
    let report = repo.run(SyncMode::Check, &PassThrough).unwrap();
    assert!(report.is_in_sync());
}

#[test]
fn missing_client_is_a_resolution_error() {
    let repo = Repo::new();
    fs::remove_file(repo.config.client_path()).unwrap();
    let err = repo.run(SyncMode::Check, &PassThrough).unwrap_err();
    assert!(matches!(err, HubError::FileNotFound { .. }));
    assert_eq!(err.error_code().code(), 3);
}

#[test]
fn missing_types_directory_binds_no_tasks() {
    let repo = Repo::new();
    fs::remove_dir_all(repo.config.types_path()).unwrap();
    let report = repo.run(SyncMode::Update, &PassThrough).unwrap();
    assert!(report.is_in_sync());
    assert!(!report.updated);
    assert_eq!(repo.client(), CLIENT);
}

#[test]
fn unparseable_declarations_report_the_file() {
    let repo = Repo::new();
    repo.write_task(
        "fill_mask",
        "@dataclass_with_extra\nclass FillMaskParameters(BaseInferenceType):\n    top_k: Optional[int = None\n",
    );
    let err = repo.run(SyncMode::Check, &PassThrough).unwrap_err();
    match err {
        HubError::ParseError { ref file, .. } => assert!(file.ends_with("fill_mask.py")),
        ref other => panic!("unexpected {other:?}"),
    }
    assert_eq!(err.error_code(), OutputErrorCode::ResolutionError);
}

#[test]
fn custom_layout_via_config() {
    let repo = Repo::new();
    let mut config = SyncConfig::for_repo(repo.root());
    config.client_file = PathBuf::from("client.py");
    config.types_dir = PathBuf::from("types");
    fs::create_dir_all(repo.root().join("types")).unwrap();
    fs::write(repo.root().join("client.py"), CLIENT.replace("InferenceClient", "AsyncInferenceClient")).unwrap();
    fs::write(repo.root().join("types").join("text_classification.py"), TEXT_CLASSIFICATION).unwrap();
    config.client_class = "AsyncInferenceClient".to_string();

    let report = Synchronizer::new(config, &PassThrough)
        .run(SyncMode::Check)
        .unwrap();
    assert_eq!(report.tasks.len(), 1);
    assert_eq!(report.client_file, PathBuf::from("client.py"));
}
