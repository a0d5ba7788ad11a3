//! Byte-exact change detection and outcome classification
//!
//! Every step of the pipeline is a silent no-op on a missing anchor, so
//! "ran without error" says nothing by itself. The verdict combines a byte
//! comparison of the whole document with the per-step report: identical
//! bytes are a no-op regardless of what the steps reported, and a changed
//! document with skipped steps is partial drift, not full success.

use crate::transformer::{StepKind, TransformReport};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransformVerdict {
    /// Content changed and every step found its anchor
    Clean,
    /// Content changed but the named steps found nothing to do.
    /// Ambiguous between "not applicable" and anchor drift.
    PartialDrift(Vec<StepKind>),
    /// Output is byte-identical to the input
    NoOp,
}

/// Byte-for-byte comparison of pre- and post-transform content
pub fn content_changed(original: &str, transformed: &str) -> bool {
    original != transformed
}

pub fn classify(original: &str, transformed: &str, report: &TransformReport) -> TransformVerdict {
    if !content_changed(original, transformed) {
        return TransformVerdict::NoOp;
    }

    let skipped = report.skipped_steps();
    if skipped.is_empty() {
        TransformVerdict::Clean
    } else {
        TransformVerdict::PartialDrift(skipped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transformer::StepReport;

    fn report(applied: &[bool]) -> TransformReport {
        let kinds = [
            StepKind::ImportSwap,
            StepKind::StateDeclaration,
            StepKind::ReferenceRewrite,
            StepKind::BlockRemoval,
            StepKind::ConfigInsertion,
            StepKind::ControllerInsertion,
        ];
        TransformReport {
            steps: kinds
                .iter()
                .zip(applied)
                .map(|(step, &applied)| StepReport {
                    step: *step,
                    applied,
                    matches: usize::from(applied),
                })
                .collect(),
        }
    }

    #[test]
    fn test_identical_content_is_noop() {
        let r = report(&[true; 6]);
        assert_eq!(classify("same", "same", &r), TransformVerdict::NoOp);
    }

    #[test]
    fn test_all_steps_applied_is_clean() {
        let r = report(&[true; 6]);
        assert_eq!(classify("old", "new", &r), TransformVerdict::Clean);
    }

    #[test]
    fn test_skipped_steps_surface_as_drift() {
        let r = report(&[true, false, true, true, false, true]);
        match classify("old", "new", &r) {
            TransformVerdict::PartialDrift(skipped) => {
                assert_eq!(
                    skipped,
                    vec![StepKind::StateDeclaration, StepKind::ConfigInsertion]
                );
            }
            other => panic!("expected PartialDrift, got {:?}", other),
        }
    }

    #[test]
    fn test_noop_wins_over_drift() {
        // Byte equality governs even when steps claim they applied
        let r = report(&[true, false, false, false, false, false]);
        assert_eq!(classify("same", "same", &r), TransformVerdict::NoOp);
    }
}
