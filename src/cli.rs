use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::excision::DEFAULT_OUTPUT_SUFFIX;
use crate::migration_runner::MigrationTarget;

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    "

Copyright (c) 2025 InkyQuill
License: MIT
Source: https://github.com/InkyQuill/refmig
Rust Edition: 2024"
);

#[derive(Parser)]
#[command(name = "refmig")]
#[command(about = "Rule-driven migration to headless controllers, with safe line-range excision")]
#[command(long_about = "RefMig performs mechanical, rule-driven rewriting of source files.

It migrates pages from direct, inline effect-instance management to access
through a ref to a headless controller component, and separately excises
manually-audited line ranges from a large file.

FEATURES:
  • Declarative rule table (TOML) - one rule per migration target
  • Fixed six-step pipeline: import swap, state declaration, reference
    rewrite, block removal, config insertion, controller insertion
  • Per-step applied/skipped reporting - anchor drift is visible, not silent
  • Dry-run mode with a colored unified diff
  • Atomic in-place writes - a file is never observable half-written
  • Excision writes to a sibling file for diff review; the source is
    never modified

A batch never aborts on a single file: each file's outcome is recorded and
the run continues. The summary table is the place to look for failures.

EXAMPLES:
  refmig migrate src/pages/TurntableMoviePage.tsx=turntable
  refmig migrate --dry-run --rules rules.toml 'src/pages/OrbitMoviePage.tsx=orbit'
  refmig excise --ranges ranges.toml src/pages/SolvePage.tsx
  refmig rules")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(long_version = LONG_VERSION)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable debug logging
    #[arg(long, global = true)]
    #[arg(help = "Write debug logs to /var/log/refmig.log (or ~/.refmig/refmig.log)\nSet REFMIG_LOG to adjust the filter")]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Migrate target files to the headless-controller pattern
    #[command(long_about = "Apply a migration rule to each target file.

Each TARGET is a 'path=rule-key' pair. The file is rewritten in place if
and only if its content changed; an unchanged file is left untouched and
reported as a no-op. Missing files and unknown rule keys are recorded and
the batch continues with the next target.

EXAMPLES:
  refmig migrate src/pages/TurntableMoviePage.tsx=turntable
  refmig migrate a.tsx=reveal b.tsx=orbit c.tsx=explosion
  refmig migrate --dry-run --context 4 page.tsx=turntable")]
    Migrate {
        /// Target files as 'path=rule-key' pairs
        #[arg(value_name = "TARGET", required = true)]
        targets: Vec<String>,

        /// Rules file (TOML); defaults to the built-in rule table
        #[arg(short, long, value_name = "FILE")]
        rules: Option<PathBuf>,

        /// Preview changes as a unified diff without modifying files
        #[arg(short = 'd', long, alias = "dry-run")]
        dry_run: bool,

        /// Number of context lines in the dry-run diff (default: 2)
        #[arg(short = 'n', long, value_name = "NUM")]
        context: Option<usize>,
    },

    /// Excise audited line ranges from a file into a sibling copy
    #[command(long_about = "Remove 1-indexed, inclusive line ranges from INPUT.

The surviving lines are written to a sibling file (INPUT plus a suffix,
'.cleaned' by default); the source file is never modified. Review the
output, then copy it over the original if it looks good.

Overlapping ranges are deduplicated and ranges past the end of the file
are clipped silently.

⚠️  Line numbers are trusted completely. They are valid only against the
exact snapshot of the file they were audited on - do not re-run against
the cleaned output or after any other edit.

EXAMPLES:
  refmig excise --ranges ranges.toml src/pages/SolvePage.tsx
  refmig excise --ranges ranges.toml --suffix .stripped big.tsx")]
    Excise {
        /// File to excise line ranges from
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Ranges file (TOML, [[range]] entries with start/end/description)
        #[arg(short, long, value_name = "FILE")]
        ranges: PathBuf,

        /// Suffix appended to INPUT for the output file
        #[arg(long, value_name = "SUFFIX")]
        suffix: Option<String>,
    },

    /// List the rule table
    #[command(long_about = "List every rule the table defines.

Shows the key (as used in 'path=rule-key' targets), the display name, and
the generated reference/handle identifiers.

EXAMPLES:
  refmig rules                    List built-in rules
  refmig rules --rules my.toml    List rules from a file")]
    Rules {
        /// Rules file (TOML); defaults to the built-in rule table
        #[arg(short, long, value_name = "FILE")]
        rules: Option<PathBuf>,
    },
}

pub fn parse_args() -> Result<Args> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Migrate {
            targets,
            rules,
            dry_run,
            context,
        } => {
            let targets = targets
                .iter()
                .map(|spec| MigrationTarget::parse(spec))
                .collect::<Result<Vec<_>>>()
                .context("Invalid migration target")?;

            Ok(Args::Migrate {
                targets,
                rules,
                dry_run,
                context: context.unwrap_or(2),
                debug: cli.debug,
            })
        }
        Commands::Excise {
            input,
            ranges,
            suffix,
        } => Ok(Args::Excise {
            input,
            ranges,
            suffix: suffix.unwrap_or_else(|| DEFAULT_OUTPUT_SUFFIX.to_string()),
            debug: cli.debug,
        }),
        Commands::Rules { rules } => Ok(Args::Rules { rules }),
    }
}

#[derive(Debug)]
pub enum Args {
    Migrate {
        targets: Vec<MigrationTarget>,
        rules: Option<PathBuf>,
        dry_run: bool,
        context: usize,
        debug: bool,
    },
    Excise {
        input: PathBuf,
        ranges: PathBuf,
        suffix: String,
        debug: bool,
    },
    Rules {
        rules: Option<PathBuf>,
    },
}
