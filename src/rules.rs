/// Rule table for headless-controller migrations
///
/// Rules are declarative: one record per migration target, loaded from a
/// TOML file. The table is read-only configuration for the lifetime of a
/// run and is passed explicitly into the transformer.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// Built-in rule table covering the four effect pages this migration was
/// written for. An external rules file replaces it wholesale.
const DEFAULT_RULES: &str = r#"# refmig rules file
# One [[rule]] block per migration target. The key is matched against the
# rule-key half of each `path=key` target on the command line.

[[rule]]
key = "turntable"
old_import_line = "import { TurntableEffect } from '../../effects/turntable/TurnTableEffect';"
new_import_block = """
// import { TurnTableEffect } from '../../effects/turntable/TurnTableEffect'; // OLD: direct management
import MovieTurntablePlayer, { type TurntableMovieHandle } from '../../effects/turntable/MovieTurntablePlayer'; // NEW: headless controller"""
config_type = "TurnTableConfig"
default_config = "DEFAULT_CONFIG"
display_name = "Turntable"
ref_name = "turntablePlayerRef"
handle_type = "TurntableMovieHandle"

[[rule]]
key = "reveal"
old_import_line = "import { RevealEffect } from '../../effects/reveal/RevealEffect';"
new_import_block = """
// import { RevealEffect } from '../../effects/reveal/RevealEffect'; // OLD: direct management
import MovieRevealPlayer, { type RevealMovieHandle } from '../../effects/reveal/MovieRevealPlayer'; // NEW: headless controller"""
config_type = "RevealConfig"
default_config = "DEFAULT_CONFIG"
display_name = "Reveal"
ref_name = "revealPlayerRef"
handle_type = "RevealMovieHandle"

[[rule]]
key = "orbit"
old_import_line = "import { OrbitEffect } from '../../effects/orbit/OrbitEffect';"
new_import_block = """
// import { OrbitEffect } from '../../effects/orbit/OrbitEffect'; // OLD: direct management
import MovieOrbitPlayer, { type OrbitMovieHandle } from '../../effects/orbit/MovieOrbitPlayer'; // NEW: headless controller"""
config_type = "OrbitConfig"
default_config = "DEFAULT_CONFIG"
display_name = "Orbit"
ref_name = "orbitPlayerRef"
handle_type = "OrbitMovieHandle"

[[rule]]
key = "explosion"
old_import_line = "import { ExplosionEffect } from '../../effects/explosion/ExplosionEffect';"
new_import_block = """
// import { ExplosionEffect } from '../../effects/explosion/ExplosionEffect'; // OLD: direct management
import MovieExplosionPlayer, { type ExplosionMovieHandle } from '../../effects/explosion/MovieExplosionPlayer'; // NEW: headless controller"""
config_type = "ExplosionConfig"
default_config = "DEFAULT_CONFIG"
display_name = "Explosion"
ref_name = "explosionPlayerRef"
handle_type = "ExplosionMovieHandle"
"#;

/// One migration target: every substitution and insertion needed to move a
/// document from direct instance management to the headless-controller
/// pattern.
#[derive(Debug, Clone, Deserialize)]
pub struct TransformationRule {
    /// Unique identifier, matched against the rule-key half of a target
    pub key: String,

    /// Literal legacy import line to replace
    pub old_import_line: String,

    /// Replacement block: commented-out old import plus the new import
    pub new_import_block: String,

    /// Config type name substituted into generated code
    pub config_type: String,

    /// Default-config identifier substituted into generated code
    pub default_config: String,

    /// Human-readable name used in generated comments and component names
    pub display_name: String,

    /// Name of the reference variable introduced by the migration.
    /// Must be unique within a document to avoid self-collision.
    pub ref_name: String,

    /// Type of the handle reachable through `ref_name`
    pub handle_type: String,
}

impl TransformationRule {
    /// Declaration that replaces the legacy state declaration (step b)
    pub fn state_declaration(&self) -> String {
        format!(
            "  const {} = useRef<{} | null>(null);",
            self.ref_name, self.handle_type
        )
    }

    /// Sentinel that marks the config memo as already inserted.
    /// Present in a migrated document, absent in a legacy one.
    pub fn config_sentinel(&self) -> String {
        format!("const initial{}Config", self.display_name)
    }

    /// Sentinel that marks the controller markup as already inserted
    pub fn controller_sentinel(&self) -> String {
        format!("<Movie{}Player", self.display_name)
    }

    /// Generated fragment inserted after the post-marker (step e): a
    /// memoized initial config plus the completion handler that replaces
    /// the legacy setOnComplete wiring.
    pub fn completion_fragment(&self) -> String {
        format!(
            "\n  \n  // Compute initial {key} config (used by Movie{name}Player)\n\
             \x20 const initial{name}Config: {cfg} = useMemo(() => {{\n\
             \x20   const baseConfig = movie?.effect_config || {default};\n\
             \x20   return {{\n\
             \x20     ...baseConfig,\n\
             \x20     preserveControls: true,\n\
             \x20   }};\n\
             \x20 }}, [movie]);\n\
             \n\
             \x20 // Handle {name}Effect completion (replaces setOnComplete)\n\
             \x20 const handleEffectComplete = () => {{\n\
             \x20   const currentRecordingState = recordingStatusRef.current.state;\n\
             \x20   console.log('🎬 {name} effect completed. Recording state:', currentRecordingState);\n\
             \x20   setIsPlaying(false);\n\
             \x20   \n\
             \x20   // Capture thumbnail when effect completes (if not already captured)\n\
             \x20   if (!thumbnailBlob && canvas && mode !== 'view') {{\n\
             \x20     requestAnimationFrame(() => requestAnimationFrame(() => {{\n\
             \x20       import('../../services/thumbnailService').then(({{ captureCanvasScreenshot }}) => {{\n\
             \x20         captureCanvasScreenshot(canvas).then(blob => {{\n\
             \x20           setThumbnailBlob(blob);\n\
             \x20         }}).catch(err => {{\n\
             \x20           console.error('❌ Failed to capture thumbnail:', err);\n\
             \x20         }});\n\
             \x20       }});\n\
             \x20     }}));\n\
             \x20   }}\n\
             \x20   \n\
             \x20   // If recording, stop it and trigger download\n\
             \x20   if (currentRecordingState === 'recording') {{\n\
             \x20     console.log('🎬 Effect complete during recording - stopping recording...');\n\
             \x20     handleStopRecordingAndDownload();\n\
             \x20   }} else {{\n\
             \x20     // Show appropriate post-playback modal after 3 second delay\n\
             \x20     setTimeout(() => {{\n\
             \x20       if (from === 'gallery') {{\n\
             \x20         setShowWhatsNext(true);\n\
             \x20       }} else if (from === 'share') {{\n\
             \x20         setShowShareWelcome(true);\n\
             \x20       }} else if (movie) {{\n\
             \x20         // Viewing a saved movie directly - show What's Next\n\
             \x20         setShowWhatsNext(true);\n\
             \x20       }} else if (mode === 'create') {{\n\
             \x20         // Creating a new movie from manual solver - go directly to What's Next\n\
             \x20         setShowWhatsNext(true);\n\
             \x20       }}\n\
             \x20     }}, 3000);\n\
             \x20   }}\n\
             \x20 }};\n",
            key = self.key,
            name = self.display_name,
            cfg = self.config_type,
            default = self.default_config,
        )
    }

    /// Generated markup inserted before the rendering-boundary marker
    /// (step f): the headless controller element itself.
    pub fn controller_markup(&self) -> String {
        format!(
            "        {{/* Headless {key} controller (no visual) */}}\n\
             \x20       {{effectContext && (\n\
             \x20         <Movie{name}Player\n\
             \x20           ref={{{ref_name}}}\n\
             \x20           effectContext={{effectContext}}\n\
             \x20           baseConfig={{initial{name}Config}}\n\
             \x20           autoplay={{autoplay}}\n\
             \x20           loop={{false}}\n\
             \x20           onComplete={{handleEffectComplete}}\n\
             \x20         />\n\
             \x20       )}}\n\n",
            key = self.key,
            name = self.display_name,
            ref_name = self.ref_name,
        )
    }
}

#[derive(Debug, Clone, Deserialize)]
struct RulesFile {
    #[serde(rename = "rule", default)]
    rules: Vec<TransformationRule>,
}

/// The full rule table for one run
#[derive(Debug, Clone)]
pub struct RuleSet {
    rules: Vec<TransformationRule>,
}

impl RuleSet {
    /// Load the built-in rule table
    pub fn builtin() -> Result<Self> {
        Self::from_toml_str(DEFAULT_RULES).context("Built-in rule table is invalid")
    }

    /// Load a rule table from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read rules file: {}", path.display()))?;
        Self::from_toml_str(&raw)
            .with_context(|| format!("Invalid rules file: {}", path.display()))
    }

    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let parsed: RulesFile = toml::from_str(raw).context("Failed to parse rules TOML")?;
        let set = Self { rules: parsed.rules };
        set.validate()?;
        Ok(set)
    }

    /// Reject empty tables, duplicate keys, and blank fields up front so
    /// that a bad rules file fails before any document is touched.
    fn validate(&self) -> Result<()> {
        if self.rules.is_empty() {
            anyhow::bail!("Rules file defines no [[rule]] entries");
        }

        let mut seen: HashSet<&str> = HashSet::new();
        for rule in &self.rules {
            if !seen.insert(rule.key.as_str()) {
                anyhow::bail!("Duplicate rule key: '{}'", rule.key);
            }

            let fields = [
                ("key", &rule.key),
                ("old_import_line", &rule.old_import_line),
                ("new_import_block", &rule.new_import_block),
                ("config_type", &rule.config_type),
                ("default_config", &rule.default_config),
                ("display_name", &rule.display_name),
                ("ref_name", &rule.ref_name),
                ("handle_type", &rule.handle_type),
            ];
            for (name, value) in fields {
                if value.trim().is_empty() {
                    anyhow::bail!("Rule '{}' has an empty '{}' field", rule.key, name);
                }
            }
        }

        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&TransformationRule> {
        self.rules.iter().find(|r| r.key == key)
    }

    pub fn rules(&self) -> &[TransformationRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_table_parses() {
        let set = RuleSet::builtin().unwrap();
        assert_eq!(set.len(), 4);
        for key in ["turntable", "reveal", "orbit", "explosion"] {
            assert!(set.get(key).is_some(), "Missing built-in rule: {}", key);
        }
    }

    #[test]
    fn test_unknown_key_is_none() {
        let set = RuleSet::builtin().unwrap();
        assert!(set.get("confetti").is_none());
    }

    #[test]
    fn test_new_import_block_is_two_lines() {
        let set = RuleSet::builtin().unwrap();
        let rule = set.get("turntable").unwrap();
        let lines: Vec<&str> = rule.new_import_block.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("// import"));
        assert!(lines[1].starts_with("import MovieTurntablePlayer"));
    }

    #[test]
    fn test_state_declaration_uses_ref_and_handle() {
        let set = RuleSet::builtin().unwrap();
        let rule = set.get("reveal").unwrap();
        assert_eq!(
            rule.state_declaration(),
            "  const revealPlayerRef = useRef<RevealMovieHandle | null>(null);"
        );
    }

    #[test]
    fn test_completion_fragment_substitutes_identifiers() {
        let set = RuleSet::builtin().unwrap();
        let rule = set.get("orbit").unwrap();
        let fragment = rule.completion_fragment();
        assert!(fragment.contains("const initialOrbitConfig: OrbitConfig = useMemo(() => {"));
        assert!(fragment.contains("movie?.effect_config || DEFAULT_CONFIG"));
        assert!(fragment.contains("const handleEffectComplete = () => {"));
        // Generated JS braces must come out single, not doubled
        assert!(!fragment.contains("{{"));
        assert!(!fragment.contains("}}"));
    }

    #[test]
    fn test_controller_markup_wires_ref_and_config() {
        let set = RuleSet::builtin().unwrap();
        let rule = set.get("explosion").unwrap();
        let markup = rule.controller_markup();
        assert!(markup.contains("<MovieExplosionPlayer"));
        assert!(markup.contains("ref={explosionPlayerRef}"));
        assert!(markup.contains("baseConfig={initialExplosionConfig}"));
        assert!(markup.contains("onComplete={handleEffectComplete}"));
    }

    #[test]
    fn test_duplicate_keys_rejected() {
        let raw = r#"
[[rule]]
key = "dup"
old_import_line = "a"
new_import_block = "b"
config_type = "c"
default_config = "d"
display_name = "e"
ref_name = "f"
handle_type = "g"

[[rule]]
key = "dup"
old_import_line = "a"
new_import_block = "b"
config_type = "c"
default_config = "d"
display_name = "e"
ref_name = "f"
handle_type = "g"
"#;
        let err = RuleSet::from_toml_str(raw).unwrap_err();
        assert!(err.to_string().contains("Duplicate rule key"));
    }

    #[test]
    fn test_empty_field_rejected() {
        let raw = r#"
[[rule]]
key = "x"
old_import_line = ""
new_import_block = "b"
config_type = "c"
default_config = "d"
display_name = "e"
ref_name = "f"
handle_type = "g"
"#;
        let err = RuleSet::from_toml_str(raw).unwrap_err();
        assert!(err.to_string().contains("empty 'old_import_line'"));
    }

    #[test]
    fn test_empty_table_rejected() {
        assert!(RuleSet::from_toml_str("").is_err());
    }
}
