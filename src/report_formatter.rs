use crate::excision::{ExcisionReport, LineRange};
use crate::migration_runner::{FileOutcome, FileStatus};
use crate::rules::{RuleSet, TransformationRule};
use crate::transformer::TransformReport;
use colored::*;
use similar::{ChangeTag, TextDiff};
use std::io::IsTerminal;
use std::path::Path;

const BANNER_WIDTH: usize = 60;

pub struct ReportFormatter;

impl ReportFormatter {
    /// Auto-detect if we should use colors
    fn should_use_color() -> bool {
        // Check NO_COLOR env var (https://no-color.org/)
        if std::env::var("NO_COLOR").is_ok() {
            return false;
        }

        std::io::stdout().is_terminal()
    }

    fn banner() -> String {
        "=".repeat(BANNER_WIDTH)
    }

    pub fn format_run_header(target_count: usize) -> String {
        format!(
            "\n{}\nHEADLESS CONTROLLER MIGRATION\n{} target file{}\n{}\n",
            Self::banner(),
            target_count,
            if target_count == 1 { "" } else { "s" },
            Self::banner()
        )
    }

    pub fn format_file_header(path: &Path, rule: &TransformationRule) -> String {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());

        if Self::should_use_color() {
            format!(
                "\n{}\nMigrating: {}\nRule: {} ({})\n{}\n",
                Self::banner(),
                name.bold().cyan(),
                rule.display_name.bold(),
                rule.key,
                Self::banner()
            )
        } else {
            format!(
                "\n{}\nMigrating: {}\nRule: {} ({})\n{}\n",
                Self::banner(),
                name,
                rule.display_name,
                rule.key,
                Self::banner()
            )
        }
    }

    /// One line per step: number, label, applied/skipped, match count
    pub fn format_step_report(report: &TransformReport) -> String {
        let use_color = Self::should_use_color();
        let mut output = String::new();

        for (index, step) in report.steps.iter().enumerate() {
            let label = step.step.label();
            let dots = ".".repeat(24usize.saturating_sub(label.len()));

            let status = if step.applied {
                let count = if step.matches == 1 {
                    "1 match".to_string()
                } else {
                    format!("{} matches", step.matches)
                };
                if use_color {
                    format!("{} ({})", "applied".green().bold(), count)
                } else {
                    format!("applied ({})", count)
                }
            } else if use_color {
                "skipped".yellow().to_string()
            } else {
                "skipped".to_string()
            };

            output.push_str(&format!("  {}. {} {} {}\n", index + 1, label, dots, status));
        }

        output
    }

    /// Unified diff of a would-be change (dry-run preview)
    pub fn format_diff(path: &Path, original: &str, transformed: &str, context: usize) -> String {
        let use_color = Self::should_use_color();
        let mut output = String::new();

        output.push_str(&format!("--- {}\n+++ {} (migrated)\n", path.display(), path.display()));

        let diff = TextDiff::from_lines(original, transformed);
        for (group_index, group) in diff.grouped_ops(context).iter().enumerate() {
            if group_index > 0 {
                if use_color {
                    output.push_str(&format!("{}\n", "...".dimmed()));
                } else {
                    output.push_str("...\n");
                }
            }

            for op in group {
                for change in diff.iter_changes(op) {
                    let value = change.value();
                    let line = match change.tag() {
                        ChangeTag::Delete => {
                            if use_color {
                                format!("-{}", value).red().to_string()
                            } else {
                                format!("-{}", value)
                            }
                        }
                        ChangeTag::Insert => {
                            if use_color {
                                format!("+{}", value).green().to_string()
                            } else {
                                format!("+{}", value)
                            }
                        }
                        ChangeTag::Equal => format!(" {}", value),
                    };
                    output.push_str(&line);
                    if !value.ends_with('\n') {
                        output.push('\n');
                    }
                }
            }
        }

        output
    }

    /// Final per-file success/failure table
    pub fn format_summary(outcomes: &[FileOutcome]) -> String {
        let use_color = Self::should_use_color();
        let mut output = String::new();

        output.push_str(&format!("\n{}\nSUMMARY\n{}\n", Self::banner(), Self::banner()));

        for outcome in outcomes {
            let name = outcome
                .target
                .path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| outcome.target.path.display().to_string());

            let line = match &outcome.status {
                FileStatus::Migrated(_) => {
                    let tag = if use_color {
                        "✅ MIGRATED".green().bold().to_string()
                    } else {
                        "✅ MIGRATED".to_string()
                    };
                    format!("{}: {}", tag, name)
                }
                FileStatus::MigratedWithDrift(_, skipped) => {
                    let steps: Vec<&str> = skipped.iter().map(|s| s.label()).collect();
                    let tag = if use_color {
                        "⚠️ PARTIAL".yellow().bold().to_string()
                    } else {
                        "⚠️ PARTIAL".to_string()
                    };
                    format!("{}: {} (skipped: {})", tag, name, steps.join(", "))
                }
                FileStatus::NoOp(_) => {
                    let tag = if use_color {
                        "⚠️ NO-OP".yellow().to_string()
                    } else {
                        "⚠️ NO-OP".to_string()
                    };
                    format!("{}: {} (content unchanged)", tag, name)
                }
                FileStatus::MissingFile => {
                    let tag = if use_color {
                        "❌ MISSING".red().bold().to_string()
                    } else {
                        "❌ MISSING".to_string()
                    };
                    format!("{}: {}", tag, name)
                }
                FileStatus::UnknownRule => {
                    let tag = if use_color {
                        "❌ UNKNOWN RULE".red().bold().to_string()
                    } else {
                        "❌ UNKNOWN RULE".to_string()
                    };
                    format!("{}: {} (rule '{}')", tag, name, outcome.target.rule_key)
                }
                FileStatus::Failed(message) => {
                    let tag = if use_color {
                        "❌ FAILED".red().bold().to_string()
                    } else {
                        "❌ FAILED".to_string()
                    };
                    format!("{}: {} ({})", tag, name, message)
                }
            };

            output.push_str(&line);
            output.push('\n');
        }

        let succeeded = outcomes.iter().filter(|o| o.status.is_success()).count();
        output.push_str(&format!(
            "{}\n{} of {} file{} migrated\n",
            Self::banner(),
            succeeded,
            outcomes.len(),
            if outcomes.len() == 1 { "" } else { "s" }
        ));

        output
    }

    /// Echo of the deletion plan before the excision runs
    pub fn format_excision_plan(ranges: &[LineRange]) -> String {
        let mut output = String::new();
        for range in ranges {
            output.push_str(&format!(
                "Marking for deletion: lines {}-{} ({})\n",
                range.start, range.end, range.description
            ));
        }
        output
    }

    pub fn format_excision_report(report: &ExcisionReport) -> String {
        format!(
            "\nOriginal lines: {}\nLines deleted: {}\nRemaining lines: {}\n\n\
             Cleaned file written to: {}\n\
             Review the file, then copy it over the original if it looks good.\n",
            report.original_lines,
            report.deleted_lines,
            report.remaining_lines,
            report.output_path.display()
        )
    }

    pub fn format_rules_listing(rules: &RuleSet) -> String {
        let use_color = Self::should_use_color();
        let mut output = String::new();

        output.push_str(&format!(
            "{} migration rule{} defined:\n\n",
            rules.len(),
            if rules.len() == 1 { "" } else { "s" }
        ));

        for rule in rules.rules() {
            if use_color {
                output.push_str(&format!(
                    "  {}  {} (ref: {}, handle: {})\n",
                    rule.key.bold().cyan(),
                    rule.display_name,
                    rule.ref_name,
                    rule.handle_type
                ));
            } else {
                output.push_str(&format!(
                    "  {}  {} (ref: {}, handle: {})\n",
                    rule.key, rule.display_name, rule.ref_name, rule.handle_type
                ));
            }
        }

        output
    }
}
