//! Step pipeline that migrates one document from direct effect management
//! to the headless-controller pattern.
//!
//! Six steps run in fixed order. Every step is total: a missing anchor or
//! marker is recorded as a skip, never an error. The caller classifies the
//! overall outcome from the per-step report plus a byte comparison of the
//! result (see `change_detector`).

use crate::block_scanner::{remove_first_block, BlockPattern};
use crate::rules::TransformationRule;
use anyhow::{Context, Result};
use regex::{NoExpand, Regex};
use tracing::{debug, warn};

/// Legacy state declaration replaced by the reference declaration (step b)
pub const LEGACY_STATE_DECLARATION: &str =
    "  const [activeEffectInstance, setActiveEffectInstance] = useState<any>(null);";

/// Marker after which the config memo and completion handler land (step e)
pub const CONFIG_INSERTION_MARKER: &str = "  }, [solution, movie, from, mode]);";

/// Rendering boundary before which the controller markup lands (step f)
pub const RENDER_BOUNDARY_MARKER: &str = "        {/* Reveal / Explosion Sliders";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepKind {
    ImportSwap,
    StateDeclaration,
    ReferenceRewrite,
    BlockRemoval,
    ConfigInsertion,
    ControllerInsertion,
}

impl StepKind {
    pub fn label(&self) -> &'static str {
        match self {
            StepKind::ImportSwap => "import swap",
            StepKind::StateDeclaration => "state declaration",
            StepKind::ReferenceRewrite => "reference rewrite",
            StepKind::BlockRemoval => "block removal",
            StepKind::ConfigInsertion => "config insertion",
            StepKind::ControllerInsertion => "controller insertion",
        }
    }
}

/// Applied/skipped record for one step. `matches` counts replaced
/// occurrences (step c), removed blocks (step d), or is 1 for an applied
/// single-site step.
#[derive(Debug, Clone)]
pub struct StepReport {
    pub step: StepKind,
    pub applied: bool,
    pub matches: usize,
}

#[derive(Debug, Clone)]
pub struct TransformReport {
    pub steps: Vec<StepReport>,
}

impl TransformReport {
    pub fn applied_count(&self) -> usize {
        self.steps.iter().filter(|s| s.applied).count()
    }

    pub fn skipped_steps(&self) -> Vec<StepKind> {
        self.steps
            .iter()
            .filter(|s| !s.applied)
            .map(|s| s.step)
            .collect()
    }

    pub fn any_applied(&self) -> bool {
        self.steps.iter().any(|s| s.applied)
    }
}

/// Applies one rule's steps to one document's content. The rule is an
/// explicit borrow: there is no process-wide rule state.
pub struct TextTransformer<'a> {
    rule: &'a TransformationRule,
}

impl<'a> TextTransformer<'a> {
    pub fn new(rule: &'a TransformationRule) -> Self {
        Self { rule }
    }

    /// `(content) -> (new content, per-step report)`
    pub fn transform(&self, content: &str) -> Result<(String, TransformReport)> {
        let mut content = content.to_string();
        let mut steps = Vec::with_capacity(6);

        steps.push(self.swap_import(&mut content));
        steps.push(self.swap_state_declaration(&mut content));
        steps.push(self.rewrite_references(&mut content)?);
        steps.push(self.remove_legacy_blocks(&mut content)?);
        steps.push(self.insert_completion_fragment(&mut content));
        steps.push(self.insert_controller_markup(&mut content));

        Ok((content, TransformReport { steps }))
    }

    /// Step a: exact-match swap of the legacy import line. Literal-string
    /// anchoring: any formatting drift in the document means a silent skip.
    /// The new block embeds the old line in a comment, so a migrated
    /// document would re-match without the presence guard.
    fn swap_import(&self, content: &mut String) -> StepReport {
        if content.contains(&self.rule.new_import_block) {
            debug!(rule = %self.rule.key, "new import block already present, skipping");
            return StepReport {
                step: StepKind::ImportSwap,
                applied: false,
                matches: 0,
            };
        }

        let matches = content.matches(&self.rule.old_import_line).count();
        if matches > 0 {
            *content = content.replace(&self.rule.old_import_line, &self.rule.new_import_block);
        }
        debug!(rule = %self.rule.key, matches, "import swap");
        StepReport {
            step: StepKind::ImportSwap,
            applied: matches > 0,
            matches,
        }
    }

    /// Step b: exact-match swap of the legacy state declaration for the
    /// reference declaration.
    fn swap_state_declaration(&self, content: &mut String) -> StepReport {
        let matches = content.matches(LEGACY_STATE_DECLARATION).count();
        if matches > 0 {
            *content = content.replace(LEGACY_STATE_DECLARATION, &self.rule.state_declaration());
        }
        debug!(rule = %self.rule.key, matches, "state declaration swap");
        StepReport {
            step: StepKind::StateDeclaration,
            applied: matches > 0,
            matches,
        }
    }

    /// Step c: rewrite every legacy instance access into the reference's
    /// current-value indirection. Patterns apply independently and
    /// unconditionally, each replacing all of its occurrences.
    fn rewrite_references(&self, content: &mut String) -> Result<StepReport> {
        let mut total = 0usize;

        for (pattern, replacement) in self.reference_rewrites() {
            let re = Regex::new(pattern)
                .with_context(|| format!("Invalid rewrite pattern: {}", pattern))?;
            let matches = re.find_iter(content).count();
            if matches > 0 {
                // Rule data is literal text, not a capture template
                *content = re.replace_all(content, NoExpand(&replacement)).to_string();
                total += matches;
            }
        }

        debug!(rule = %self.rule.key, total, "reference rewrite");
        Ok(StepReport {
            step: StepKind::ReferenceRewrite,
            applied: total > 0,
            matches: total,
        })
    }

    /// The ordered rewrite table: method invocations first, then guards,
    /// then the generic optional-chaining access.
    fn reference_rewrites(&self) -> Vec<(&'static str, String)> {
        let r = &self.rule.ref_name;
        vec![
            (r"activeEffectInstance\.play\(\)", format!("{r}.current?.play()")),
            (r"activeEffectInstance\.pause\(\)", format!("{r}.current?.pause()")),
            (r"activeEffectInstance\.stop\(\)", format!("{r}.current?.stop()")),
            (r"activeEffectInstance\.dispose\(\)", format!("{r}.current?.dispose()")),
            (
                r"activeEffectInstance\.getConfig\(\)",
                format!("{r}.current?.getConfig()"),
            ),
            (
                r"activeEffectInstance\.setRecording\(",
                format!("{r}.current?.setRecording("),
            ),
            (
                r"activeEffectInstance\.setConfig\(",
                format!("{r}.current?.setConfig("),
            ),
            (
                r"if \(activeEffectInstance\)",
                format!("if ({r}.current)"),
            ),
            (
                r"if \(!activeEffectInstance\)",
                format!("if (!{r}.current)"),
            ),
            (
                r"activeEffectInstance && \(",
                format!("{r}.current && ("),
            ),
            (
                r"\{activeEffectInstance &&",
                format!("{{{r}.current &&"),
            ),
            (r"activeEffectInstance\?\.", format!("{r}.current?.")),
        ]
    }

    /// Step d: remove the four legacy management blocks. Each pattern
    /// removes at most the first block bounded by its own delimiters.
    fn remove_legacy_blocks(&self, content: &mut String) -> Result<StepReport> {
        let mut removed = 0usize;

        for pattern in Self::block_patterns()? {
            match remove_first_block(content, &pattern) {
                Some(next) => {
                    *content = next;
                    removed += 1;
                }
                None => {
                    debug!(rule = %self.rule.key, block = pattern.name, "block not found");
                }
            }
        }

        Ok(StepReport {
            step: StepKind::BlockRemoval,
            applied: removed > 0,
            matches: removed,
        })
    }

    fn block_patterns() -> Result<Vec<BlockPattern>> {
        let activation_anchor = Regex::new(r"^  // Handle .* activation$")
            .context("Invalid activation-handler anchor pattern")?;

        Ok(vec![
            BlockPattern::literal(
                "auto-activate effect",
                "  // Auto-activate effect when context is ready",
            ),
            BlockPattern::pattern("activation handler", activation_anchor),
            BlockPattern::literal(
                "animation loop",
                "  // Animation loop - tick the active effect on every frame",
            ),
            BlockPattern::literal(
                "auto-play effect",
                "  // Auto-play effect when autoplay parameter is present",
            ),
        ])
    }

    /// Step e: insert the config memo + completion handler after the first
    /// insertion marker. Skips when the fragment is already present, so a
    /// second run over a migrated document stays byte-identical.
    fn insert_completion_fragment(&self, content: &mut String) -> StepReport {
        self.insert_at_marker(
            content,
            StepKind::ConfigInsertion,
            CONFIG_INSERTION_MARKER,
            &self.rule.config_sentinel(),
            &self.rule.completion_fragment(),
            InsertSide::After,
        )
    }

    /// Step f: insert the headless controller markup before the rendering
    /// boundary, leaving the marker itself unchanged.
    fn insert_controller_markup(&self, content: &mut String) -> StepReport {
        self.insert_at_marker(
            content,
            StepKind::ControllerInsertion,
            RENDER_BOUNDARY_MARKER,
            &self.rule.controller_sentinel(),
            &self.rule.controller_markup(),
            InsertSide::Before,
        )
    }

    fn insert_at_marker(
        &self,
        content: &mut String,
        step: StepKind,
        marker: &str,
        sentinel: &str,
        fragment: &str,
        side: InsertSide,
    ) -> StepReport {
        if content.contains(sentinel) {
            debug!(rule = %self.rule.key, step = step.label(), "fragment already present, skipping");
            return StepReport {
                step,
                applied: false,
                matches: 0,
            };
        }

        let occurrences = content.matches(marker).count();
        if occurrences > 1 {
            // Marker ambiguity: the first occurrence wins
            warn!(
                rule = %self.rule.key,
                step = step.label(),
                occurrences,
                "insertion marker appears more than once, using the first occurrence"
            );
        }

        match content.find(marker) {
            Some(idx) => {
                let at = match side {
                    InsertSide::After => idx + marker.len(),
                    InsertSide::Before => idx,
                };
                content.insert_str(at, fragment);
                StepReport {
                    step,
                    applied: true,
                    matches: occurrences,
                }
            }
            None => {
                debug!(rule = %self.rule.key, step = step.label(), "marker not found");
                StepReport {
                    step,
                    applied: false,
                    matches: 0,
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum InsertSide {
    Before,
    After,
}
