//! Property-based tests for RefMig
//!
//! This module uses proptest to verify core invariants of the migration
//! and excision engines. Property-based testing generates hundreds of
//! random inputs to verify that certain properties always hold true.

use refmig::excision::{excise_content, DeletionPlan, LineRange};
use refmig::rules::RuleSet;
use refmig::transformer::{TextTransformer, LEGACY_STATE_DECLARATION};

// Import proptest macro
use proptest::prelude::*;

fn range(start: usize, end: usize) -> LineRange {
    LineRange {
        start,
        end,
        description: String::new(),
    }
}

// ============================================================================
// Property 1: Excision safety
// ============================================================================
// Deletion never invents content and never reorders what survives

proptest! {
    /// Excision output is a subsequence of the input lines
    #[test]
    fn prop_excision_output_is_subsequence(
        lines in prop::collection::vec("[a-z]{1,12}", 1..80),
        start in 1usize..120,
        len in 0usize..40,
    ) {
        let content: String = lines.iter().map(|l| format!("{}\n", l)).collect();
        let plan = DeletionPlan::from_ranges(&[range(start, start + len)]);
        let kept = excise_content(&content, &plan);
        let kept_lines: Vec<&str> = kept.lines().collect();

        prop_assert!(kept_lines.len() <= lines.len());

        // Every kept line is consumed from the input in order
        let mut input = lines.iter().map(|s| s.as_str());
        for kept_line in &kept_lines {
            prop_assert!(
                input.any(|original| original == *kept_line),
                "kept line '{}' out of order or absent",
                kept_line
            );
        }
    }

    /// Overlapping ranges delete exactly the union of their lines
    #[test]
    fn prop_overlapping_ranges_deduplicate(
        lines in prop::collection::vec("[a-z]{1,8}", 1..60),
        a_start in 1usize..50,
        a_len in 0usize..20,
        b_start in 1usize..50,
        b_len in 0usize..20,
    ) {
        let content: String = lines.iter().map(|l| format!("{}\n", l)).collect();
        let plan = DeletionPlan::from_ranges(&[
            range(a_start, a_start + a_len),
            range(b_start, b_start + b_len),
        ]);

        let marked = |index: usize| {
            let line_no = index + 1;
            (line_no >= a_start && line_no <= a_start + a_len)
                || (line_no >= b_start && line_no <= b_start + b_len)
        };
        let expected: String = lines
            .iter()
            .enumerate()
            .filter(|(index, _)| !marked(*index))
            .map(|(_, l)| format!("{}\n", l))
            .collect();

        prop_assert_eq!(excise_content(&content, &plan), expected);
    }

    /// Ranges entirely past the end of the document delete nothing
    #[test]
    fn prop_out_of_bounds_range_is_harmless(
        lines in prop::collection::vec("[a-z]{1,8}", 1..40),
        overshoot in 1usize..100,
    ) {
        let content: String = lines.iter().map(|l| format!("{}\n", l)).collect();
        let start = lines.len() + overshoot;
        let plan = DeletionPlan::from_ranges(&[range(start, start + 10)]);

        prop_assert_eq!(excise_content(&content, &plan), content);
    }
}

// ============================================================================
// Property 2: Transformer totality and idempotence
// ============================================================================

proptest! {
    /// A document with none of the rule's anchors comes out byte-identical
    #[test]
    fn prop_transform_is_noop_without_anchors(
        text in "[a-z0-9 \n]{0,400}",
    ) {
        let rules = RuleSet::builtin().unwrap();
        let rule = rules.get("turntable").unwrap();
        let transformer = TextTransformer::new(rule);

        let (output, report) = transformer.transform(&text).unwrap();

        prop_assert_eq!(output, text);
        prop_assert!(!report.any_applied());
    }

    /// Migrating an already-migrated document changes nothing
    #[test]
    fn prop_transform_is_idempotent(
        body in "[a-z \n]{0,200}",
    ) {
        let rules = RuleSet::builtin().unwrap();
        let rule = rules.get("turntable").unwrap();
        let transformer = TextTransformer::new(rule);

        let doc = format!(
            "{}\n{}\n{}",
            rule.old_import_line, LEGACY_STATE_DECLARATION, body
        );

        let (once, _) = transformer.transform(&doc).unwrap();
        let (twice, report) = transformer.transform(&once).unwrap();

        prop_assert_eq!(&once, &twice);
        prop_assert!(!report.any_applied());
    }
}
