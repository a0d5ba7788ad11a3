//! Anchored multi-line block removal
//!
//! Each removable block is identified by a leading comment line (the
//! anchor). The span to delete runs from the anchor through the line on
//! which the block's delimiters balance back to zero. This replaces a
//! greedy start-comment-to-terminator regex: a document containing two
//! structurally similar blocks loses exactly the first one, bounded by its
//! own delimiters, never a span that swallows the second.

use regex::Regex;
use tracing::debug;

/// How the anchor line is recognized. Literal anchors compare the whole
/// line (terminator stripped); pattern anchors are anchored regexes.
#[derive(Debug, Clone)]
pub enum AnchorMatcher {
    Literal(String),
    Pattern(Regex),
}

impl AnchorMatcher {
    fn matches(&self, line: &str) -> bool {
        match self {
            AnchorMatcher::Literal(text) => line == text,
            AnchorMatcher::Pattern(re) => re.is_match(line),
        }
    }
}

#[derive(Debug, Clone)]
pub struct BlockPattern {
    /// Short name used in log output
    pub name: &'static str,
    pub anchor: AnchorMatcher,
}

impl BlockPattern {
    pub fn literal(name: &'static str, anchor: &str) -> Self {
        Self {
            name,
            anchor: AnchorMatcher::Literal(anchor.to_string()),
        }
    }

    pub fn pattern(name: &'static str, anchor: Regex) -> Self {
        Self {
            name,
            anchor: AnchorMatcher::Pattern(anchor),
        }
    }
}

/// Strip the line terminator for anchor comparison
fn line_text(raw: &str) -> &str {
    raw.strip_suffix('\n')
        .map(|s| s.strip_suffix('\r').unwrap_or(s))
        .unwrap_or(raw)
}

fn depth_delta(line: &str) -> (i64, bool) {
    let mut delta = 0i64;
    let mut saw_open = false;
    for c in line.chars() {
        match c {
            '(' | '{' | '[' => {
                delta += 1;
                saw_open = true;
            }
            ')' | '}' | ']' => delta -= 1,
            _ => {}
        }
    }
    (delta, saw_open)
}

/// Remove the first block matching `pattern` from `content`.
///
/// Returns `Some(new content)` when a block was found and removed, `None`
/// when the anchor is absent or the block never balances (in which case
/// the document is left alone and the caller records a skip).
pub fn remove_first_block(content: &str, pattern: &BlockPattern) -> Option<String> {
    let mut offset = 0usize;
    let mut anchor_start: Option<usize> = None;
    let mut depth = 0i64;
    let mut opened = false;

    for raw_line in content.split_inclusive('\n') {
        let line_start = offset;
        offset += raw_line.len();

        match anchor_start {
            None => {
                if pattern.anchor.matches(line_text(raw_line)) {
                    anchor_start = Some(line_start);
                }
            }
            Some(start) => {
                let (delta, saw_open) = depth_delta(raw_line);
                depth += delta;
                opened = opened || saw_open;

                if opened && depth <= 0 {
                    debug!(
                        block = pattern.name,
                        bytes = offset - start,
                        "removing block"
                    );
                    let mut result = String::with_capacity(content.len() - (offset - start));
                    result.push_str(&content[..start]);
                    result.push_str(&content[offset..]);
                    return Some(result);
                }
            }
        }
    }

    if anchor_start.is_some() {
        debug!(
            block = pattern.name,
            "anchor found but block never balances, skipping"
        );
    }
    None
}
