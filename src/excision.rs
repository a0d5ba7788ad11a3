//! Line-range excision engine
//!
//! Removes manually-audited 1-indexed inclusive line ranges from a single
//! document and writes the survivors to a sibling path. The engine trusts
//! the caller's line-number audit completely: ranges are valid only
//! against the exact snapshot they were audited on, so the source file is
//! never overwritten and the output is meant for diff review before
//! promotion.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error_helpers;

/// Suffix appended to the input path for the output artifact
pub const DEFAULT_OUTPUT_SUFFIX: &str = ".cleaned";

/// One inclusive, 1-indexed range of lines to delete. Ranges may overlap
/// or extend past the end of the document; bounds are never checked
/// against the document's actual length.
#[derive(Debug, Clone, Deserialize)]
pub struct LineRange {
    pub start: usize,
    pub end: usize,
    #[serde(default)]
    pub description: String,
}

impl LineRange {
    fn validate(&self) -> Result<()> {
        if self.start == 0 {
            anyhow::bail!("Line ranges are 1-indexed; range starts at 0 ({})", self.description);
        }
        if self.start > self.end {
            anyhow::bail!(
                "Range start {} is after end {} ({})",
                self.start,
                self.end,
                self.description
            );
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
struct RangesFile {
    #[serde(rename = "range", default)]
    ranges: Vec<LineRange>,
}

/// Load and validate a TOML ranges file (`[[range]]` entries with
/// `start`, `end`, and an optional `description`).
pub fn load_ranges(path: &Path) -> Result<Vec<LineRange>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read ranges file: {}", path.display()))?;
    let parsed: RangesFile = toml::from_str(&raw)
        .with_context(|| format!("Invalid ranges file: {}", path.display()))?;

    if parsed.ranges.is_empty() {
        anyhow::bail!("Ranges file defines no [[range]] entries: {}", path.display());
    }
    for range in &parsed.ranges {
        range.validate()?;
    }

    Ok(parsed.ranges)
}

/// De-duplicated union of 0-indexed line positions marked for deletion.
/// Derived per run against one fixed snapshot; never persisted.
#[derive(Debug, Clone)]
pub struct DeletionPlan {
    indices: HashSet<usize>,
}

impl DeletionPlan {
    pub fn from_ranges(ranges: &[LineRange]) -> Self {
        let mut indices = HashSet::new();
        for range in ranges {
            debug!(
                start = range.start,
                end = range.end,
                description = %range.description,
                "marking range for deletion"
            );
            // 1-indexed inclusive -> 0-indexed inclusive
            for index in range.start.saturating_sub(1)..range.end {
                indices.insert(index);
            }
        }
        Self { indices }
    }

    pub fn contains(&self, index: usize) -> bool {
        self.indices.contains(&index)
    }

    /// Marked positions, including any past the end of the document
    pub fn marked(&self) -> usize {
        self.indices.len()
    }
}

#[derive(Debug, Clone)]
pub struct ExcisionReport {
    pub original_lines: usize,
    pub deleted_lines: usize,
    pub remaining_lines: usize,
    pub output_path: PathBuf,
}

/// Retain every line whose 0-indexed position is not in the plan,
/// preserving original order and each kept line's exact bytes (line
/// terminators included). Marked positions past the last line are clipped
/// by the iteration itself.
pub fn excise_content(content: &str, plan: &DeletionPlan) -> String {
    content
        .split_inclusive('\n')
        .enumerate()
        .filter(|(index, _)| !plan.contains(*index))
        .map(|(_, line)| line)
        .collect()
}

/// Excise `ranges` from `input`, writing survivors to `<input><suffix>`.
/// The input file is never modified.
pub fn excise_file(input: &Path, ranges: &[LineRange], suffix: &str) -> Result<ExcisionReport> {
    if suffix.is_empty() {
        anyhow::bail!("Output suffix must not be empty: refusing to overwrite the source file");
    }
    for range in ranges {
        range.validate()?;
    }

    let content = fs::read_to_string(input)
        .with_context(|| format!("Failed to read input file: {}", input.display()))?;
    let original_lines = content.split_inclusive('\n').count();

    let plan = DeletionPlan::from_ranges(ranges);
    if plan.marked() > original_lines {
        warn!(
            marked = plan.marked(),
            lines = original_lines,
            "plan marks more positions than the document has lines; were the ranges audited against an older snapshot?"
        );
    }

    let kept = excise_content(&content, &plan);
    let remaining_lines = kept.split_inclusive('\n').count();

    let output_path = sibling_path(input, suffix);
    if output_path == input {
        anyhow::bail!(
            "Output path resolves to the input path: {}",
            input.display()
        );
    }

    fs::write(&output_path, &kept).map_err(|e| {
        if error_helpers::is_permission_denied(&e) {
            anyhow::anyhow!(error_helpers::permission_error(&output_path, "writing cleaned output to"))
        } else {
            anyhow::Error::new(e)
                .context(format!("Failed to write output: {}", output_path.display()))
        }
    })?;

    Ok(ExcisionReport {
        original_lines,
        deleted_lines: original_lines - remaining_lines,
        remaining_lines,
        output_path,
    })
}

fn sibling_path(input: &Path, suffix: &str) -> PathBuf {
    let mut name = input.as_os_str().to_os_string();
    name.push(suffix);
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn range(start: usize, end: usize) -> LineRange {
        LineRange {
            start,
            end,
            description: String::new(),
        }
    }

    fn hundred_lines() -> String {
        (1..=100).map(|n| format!("line {}\n", n)).collect()
    }

    #[test]
    fn test_overlapping_ranges_deduplicate() {
        let content = hundred_lines();
        let plan = DeletionPlan::from_ranges(&[range(10, 12), range(12, 15)]);
        let kept = excise_content(&content, &plan);

        let lines: Vec<&str> = kept.lines().collect();
        assert_eq!(lines.len(), 94);
        // Old line 9 is now immediately followed by old line 16
        let at = lines.iter().position(|l| *l == "line 9").unwrap();
        assert_eq!(lines[at + 1], "line 16");
    }

    #[test]
    fn test_out_of_bounds_range_is_clipped() {
        let content = hundred_lines();
        let plan = DeletionPlan::from_ranges(&[range(95, 200)]);
        let kept = excise_content(&content, &plan);

        let lines: Vec<&str> = kept.lines().collect();
        assert_eq!(lines.len(), 94);
        assert_eq!(*lines.last().unwrap(), "line 94");
    }

    #[test]
    fn test_order_preserved() {
        let content = "a\nb\nc\nd\ne\n";
        let plan = DeletionPlan::from_ranges(&[range(2, 2), range(4, 4)]);
        assert_eq!(excise_content(content, &plan), "a\nc\ne\n");
    }

    #[test]
    fn test_kept_line_bytes_preserved() {
        // CRLF terminators and a missing final newline survive untouched
        let content = "keep\r\ndrop\r\nlast without newline";
        let plan = DeletionPlan::from_ranges(&[range(2, 2)]);
        assert_eq!(excise_content(content, &plan), "keep\r\nlast without newline");
    }

    #[test]
    fn test_excise_file_writes_sibling_and_preserves_source() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("big.tsx");
        let content = hundred_lines();
        fs::write(&input, &content).unwrap();

        let report =
            excise_file(&input, &[range(10, 12), range(12, 15)], DEFAULT_OUTPUT_SUFFIX).unwrap();

        assert_eq!(report.original_lines, 100);
        assert_eq!(report.deleted_lines, 6);
        assert_eq!(report.remaining_lines, 94);
        assert_eq!(report.output_path, dir.path().join("big.tsx.cleaned"));

        // Source untouched, output filtered
        assert_eq!(fs::read_to_string(&input).unwrap(), content);
        let cleaned = fs::read_to_string(&report.output_path).unwrap();
        assert_eq!(cleaned.lines().count(), 94);
    }

    #[test]
    fn test_empty_suffix_rejected() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("f.txt");
        fs::write(&input, "x\n").unwrap();

        let err = excise_file(&input, &[range(1, 1)], "").unwrap_err();
        assert!(err.to_string().contains("refusing to overwrite"));
        assert_eq!(fs::read_to_string(&input).unwrap(), "x\n");
    }

    #[test]
    fn test_invalid_range_rejected() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("f.txt");
        fs::write(&input, "x\n").unwrap();

        assert!(excise_file(&input, &[range(5, 2)], ".cleaned").is_err());
        assert!(excise_file(&input, &[range(0, 2)], ".cleaned").is_err());
    }

    #[test]
    fn test_ranges_file_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ranges.toml");
        fs::write(
            &path,
            r#"
[[range]]
start = 14
end = 14
description = "getMovieById import"

[[range]]
start = 20
end = 30
description = "Movie Mode imports block"
"#,
        )
        .unwrap();

        let ranges = load_ranges(&path).unwrap();
        assert_eq!(ranges.len(), 2);
        assert_eq!(ranges[0].start, 14);
        assert_eq!(ranges[1].description, "Movie Mode imports block");
    }

    #[test]
    fn test_empty_ranges_file_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ranges.toml");
        fs::write(&path, "").unwrap();
        assert!(load_ranges(&path).is_err());
    }
}
