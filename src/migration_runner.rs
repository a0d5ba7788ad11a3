//! Run driver: applies one rule per target file, continuing past per-file
//! failures. A single file's failure never aborts the batch; each file's
//! outcome is recorded for the final summary.

use anyhow::{Context, Result};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::info;

use crate::change_detector::{classify, TransformVerdict};
use crate::error_helpers;
use crate::report_formatter::ReportFormatter;
use crate::rules::{RuleSet, TransformationRule};
use crate::transformer::{StepKind, TextTransformer, TransformReport};

/// One `path=rule-key` pair from the command line
#[derive(Debug, Clone)]
pub struct MigrationTarget {
    pub path: PathBuf,
    pub rule_key: String,
}

impl MigrationTarget {
    pub fn parse(spec: &str) -> Result<Self> {
        let (path, key) = spec
            .rsplit_once('=')
            .with_context(|| format!("Invalid target '{}': expected 'path=rule-key'", spec))?;

        if path.is_empty() || key.is_empty() {
            anyhow::bail!("Invalid target '{}': expected 'path=rule-key'", spec);
        }

        Ok(Self {
            path: PathBuf::from(path),
            rule_key: key.to_string(),
        })
    }
}

#[derive(Debug, Clone)]
pub enum FileStatus {
    /// Content changed; every step found its anchor
    Migrated(TransformReport),
    /// Content changed but the listed steps found nothing to do
    MigratedWithDrift(TransformReport, Vec<StepKind>),
    /// Every step ran, content came out byte-identical
    NoOp(TransformReport),
    /// Target path does not exist
    MissingFile,
    /// Rule key not present in the rule table
    UnknownRule,
    /// I/O or rule error; message carried for the summary
    Failed(String),
}

impl FileStatus {
    pub fn is_success(&self) -> bool {
        matches!(
            self,
            FileStatus::Migrated(_) | FileStatus::MigratedWithDrift(_, _)
        )
    }
}

#[derive(Debug, Clone)]
pub struct FileOutcome {
    pub target: MigrationTarget,
    pub status: FileStatus,
}

pub struct MigrationRunner<'a> {
    rules: &'a RuleSet,
    dry_run: bool,
    context: usize,
}

impl<'a> MigrationRunner<'a> {
    pub fn new(rules: &'a RuleSet, dry_run: bool, context: usize) -> Self {
        Self {
            rules,
            dry_run,
            context,
        }
    }

    /// Process every target in order. Fully sequential: each file is read,
    /// transformed, and written to completion before the next begins.
    pub fn run(&self, targets: Vec<MigrationTarget>) -> Vec<FileOutcome> {
        let mut outcomes = Vec::with_capacity(targets.len());

        for target in targets {
            let status = self.process_target(&target);
            outcomes.push(FileOutcome { target, status });
        }

        outcomes
    }

    fn process_target(&self, target: &MigrationTarget) -> FileStatus {
        let Some(rule) = self.rules.get(&target.rule_key) else {
            eprintln!(
                "Unknown rule key '{}' for {}",
                target.rule_key,
                target.path.display()
            );
            return FileStatus::UnknownRule;
        };

        // File absence is checked before any step runs
        if !target.path.exists() {
            eprintln!(
                "{}",
                error_helpers::missing_target_error(&target.path, &target.rule_key)
            );
            return FileStatus::MissingFile;
        }

        print!("{}", ReportFormatter::format_file_header(&target.path, rule));

        match self.transform_target(target, rule) {
            Ok(status) => status,
            Err(e) => {
                eprintln!("Error processing {}: {:#}", target.path.display(), e);
                FileStatus::Failed(format!("{:#}", e))
            }
        }
    }

    fn transform_target(
        &self,
        target: &MigrationTarget,
        rule: &TransformationRule,
    ) -> Result<FileStatus> {
        let original = fs::read_to_string(&target.path)
            .with_context(|| format!("Failed to read file: {}", target.path.display()))?;

        let transformer = TextTransformer::new(rule);
        let (transformed, report) = transformer.transform(&original)?;

        print!("{}", ReportFormatter::format_step_report(&report));

        match classify(&original, &transformed, &report) {
            TransformVerdict::NoOp => {
                println!("No changes made.");
                Ok(FileStatus::NoOp(report))
            }
            TransformVerdict::Clean => {
                self.commit(target, &original, &transformed)?;
                Ok(FileStatus::Migrated(report))
            }
            TransformVerdict::PartialDrift(skipped) => {
                self.commit(target, &original, &transformed)?;
                Ok(FileStatus::MigratedWithDrift(report, skipped))
            }
        }
    }

    fn commit(&self, target: &MigrationTarget, original: &str, transformed: &str) -> Result<()> {
        if self.dry_run {
            print!(
                "{}",
                ReportFormatter::format_diff(&target.path, original, transformed, self.context)
            );
            return Ok(());
        }

        write_atomic(&target.path, transformed)?;
        info!(path = %target.path.display(), "file rewritten");
        Ok(())
    }
}

/// Write through a temp file in the target's directory so the document is
/// never observable half-written.
fn write_atomic(path: &Path, content: &str) -> Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let mut temp_file = NamedTempFile::new_in(parent)
        .with_context(|| format!("Failed to create temp file in {}", parent.display()))?;

    temp_file
        .write_all(content.as_bytes())
        .with_context(|| format!("Failed to write temp file for {}", path.display()))?;

    temp_file
        .persist(path)
        .with_context(|| format!("Failed to persist temp file to {}", path.display()))?;

    Ok(())
}
