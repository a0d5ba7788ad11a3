use anyhow::Result;
use std::path::PathBuf;

use refmig::cli::{parse_args, Args};
use refmig::excision;
use refmig::logger;
use refmig::migration_runner::{MigrationRunner, MigrationTarget};
use refmig::report_formatter::ReportFormatter;
use refmig::rules::RuleSet;

fn main() -> Result<()> {
    let args = parse_args()?;

    match args {
        Args::Migrate {
            targets,
            rules,
            dry_run,
            context,
            debug,
        } => {
            migrate(targets, rules, dry_run, context, debug)?;
        }
        Args::Excise {
            input,
            ranges,
            suffix,
            debug,
        } => {
            excise(input, ranges, suffix, debug)?;
        }
        Args::Rules { rules } => {
            list_rules(rules)?;
        }
    }

    Ok(())
}

fn load_rule_set(path: Option<&PathBuf>) -> Result<RuleSet> {
    match path {
        Some(p) => RuleSet::load(p),
        None => RuleSet::builtin(),
    }
}

fn migrate(
    targets: Vec<MigrationTarget>,
    rules_path: Option<PathBuf>,
    dry_run: bool,
    context: usize,
    debug: bool,
) -> Result<()> {
    init_logging(debug)?;

    let rules = load_rule_set(rules_path.as_ref())?;

    print!("{}", ReportFormatter::format_run_header(targets.len()));
    if dry_run {
        println!("Dry run: no files will be modified.");
    }

    let runner = MigrationRunner::new(&rules, dry_run, context);
    let outcomes = runner.run(targets);

    // The summary is the only failure signal: the run always completes
    // and exits 0, however many individual files failed.
    print!("{}", ReportFormatter::format_summary(&outcomes));

    Ok(())
}

fn excise(input: PathBuf, ranges_path: PathBuf, suffix: String, debug: bool) -> Result<()> {
    init_logging(debug)?;

    let ranges = excision::load_ranges(&ranges_path)?;
    print!("{}", ReportFormatter::format_excision_plan(&ranges));

    let report = excision::excise_file(&input, &ranges, &suffix)?;
    print!("{}", ReportFormatter::format_excision_report(&report));

    Ok(())
}

fn list_rules(rules_path: Option<PathBuf>) -> Result<()> {
    let rules = load_rule_set(rules_path.as_ref())?;
    print!("{}", ReportFormatter::format_rules_listing(&rules));
    Ok(())
}

fn init_logging(debug: bool) -> Result<()> {
    if let Some(log_path) = logger::init_debug_logging(debug)? {
        eprintln!("Debug log: {}", log_path.display());
    }
    Ok(())
}
