//! Patch orchestration over the file system
//!
//!     The only module that touches disk. A [`Patcher`] reads a template
//!     and a target, runs the tokenizer and executor, and writes the result
//!     back to the target only when both stages succeed; any failure aborts
//!     the pair without writing.
//!
//!     Tree application covers scaffolding flows that patch a whole
//!     project at once: every file under the template directory carrying
//!     the configured template suffix patches the target file at the same
//!     relative path with the suffix stripped. Pairs share no state, so a
//!     failing pair only stops the walk when the configuration says to
//!     halt.

use crate::tagpatch::config::{load_defaults, TagpatchConfig};
use crate::tagpatch::error::PatchError;
use crate::tagpatch::executor;
use crate::tagpatch::tokenizer;
use std::fs;
use std::path::{Path, PathBuf};

/// Applies marker-tag templates to target files.
pub struct Patcher {
    config: TagpatchConfig,
}

impl Patcher {
    pub fn new(config: TagpatchConfig) -> Self {
        Patcher { config }
    }

    /// Construct a patcher from the embedded default configuration.
    pub fn with_defaults() -> Result<Self, PatchError> {
        let config = load_defaults().map_err(|err| PatchError::Config(err.to_string()))?;
        Ok(Patcher::new(config))
    }

    /// Patch `target` in place with the tags found in `template`.
    ///
    /// The target file is rewritten only if tokenization and execution
    /// both succeed; a failed patch leaves it byte-for-byte unmodified.
    pub fn apply(&self, template: &Path, target: &Path) -> Result<(), PatchError> {
        let patched = self.render(template, target)?;
        fs::write(target, patched)
            .map_err(|err| PatchError::Io(format!("{}: {}", target.display(), err)))?;
        Ok(())
    }

    /// Run the pipeline and return the patched text without writing it.
    pub fn render(&self, template: &Path, target: &Path) -> Result<String, PatchError> {
        let template_text = read(template)?;
        let target_text = read(target)?;
        let tags = tokenizer::tokenize(&template_text)?;
        let operations = executor::plan(&tags)?;
        executor::execute(&target_text, &operations)
    }

    /// Patch a target directory with every template under `template_dir`.
    ///
    /// Returns one outcome per attempted pair, in sorted path order. When
    /// `apply.halt_on_error` is set the walk stops after the first failing
    /// pair; otherwise every pair is attempted.
    pub fn apply_tree(
        &self,
        template_dir: &Path,
        target_dir: &Path,
    ) -> Result<TreeReport, PatchError> {
        let suffix = format!(".{}", self.config.templates.extension);
        let mut templates = Vec::new();
        collect_templates(template_dir, template_dir, &suffix, &mut templates)?;
        templates.sort();

        let mut outcomes = Vec::new();
        for relative in templates {
            let template = template_dir.join(&relative);
            let target = target_dir.join(strip_template_suffix(&relative, &suffix));
            let result = self.apply(&template, &target);
            let failed = result.is_err();
            outcomes.push(PairOutcome {
                template,
                target,
                result,
            });
            if failed && self.config.apply.halt_on_error {
                break;
            }
        }
        Ok(TreeReport { outcomes })
    }
}

/// Result of one template/target pair inside a tree application.
#[derive(Debug)]
pub struct PairOutcome {
    pub template: PathBuf,
    pub target: PathBuf,
    pub result: Result<(), PatchError>,
}

/// All outcomes of a tree application.
#[derive(Debug)]
pub struct TreeReport {
    pub outcomes: Vec<PairOutcome>,
}

impl TreeReport {
    pub fn is_success(&self) -> bool {
        self.outcomes.iter().all(|outcome| outcome.result.is_ok())
    }

    pub fn failures(&self) -> impl Iterator<Item = &PairOutcome> {
        self.outcomes.iter().filter(|outcome| outcome.result.is_err())
    }
}

fn read(path: &Path) -> Result<String, PatchError> {
    fs::read_to_string(path).map_err(|err| PatchError::Io(format!("{}: {}", path.display(), err)))
}

fn collect_templates(
    root: &Path,
    dir: &Path,
    suffix: &str,
    out: &mut Vec<PathBuf>,
) -> Result<(), PatchError> {
    let entries =
        fs::read_dir(dir).map_err(|err| PatchError::Io(format!("{}: {}", dir.display(), err)))?;
    for entry in entries {
        let entry =
            entry.map_err(|err| PatchError::Io(format!("{}: {}", dir.display(), err)))?;
        let path = entry.path();
        if path.is_dir() {
            collect_templates(root, &path, suffix, out)?;
        } else if path
            .file_name()
            .and_then(|name| name.to_str())
            .map(|name| name.ends_with(suffix))
            .unwrap_or(false)
        {
            if let Ok(relative) = path.strip_prefix(root) {
                out.push(relative.to_path_buf());
            }
        }
    }
    Ok(())
}

fn strip_template_suffix(relative: &Path, suffix: &str) -> PathBuf {
    match relative.file_name().and_then(|name| name.to_str()) {
        Some(name) if name.ends_with(suffix) && name.len() > suffix.len() => {
            relative.with_file_name(&name[..name.len() - suffix.len()])
        }
        _ => relative.to_path_buf(),
    }
}
