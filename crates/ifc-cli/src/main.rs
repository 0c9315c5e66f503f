use clap::{Parser, Subcommand};
use colored::Colorize;
use ifc_core::manifest::{ClassOutcome, Evaluation};
use ifc_core::{shape_digest, ClassType, Error, Manifest, Member, PropertyMap};
use std::path::{Path, PathBuf};
use std::process;

/// IFC: Interface Composition CLI
///
/// Evaluate declaration manifests: declare interfaces, mix them into
/// classes, and report conformance.
#[derive(Parser)]
#[command(name = "ifc", version, about, long_about = None)]
struct Cli {
    /// Suppress normal output (exit code only)
    #[arg(long, global = true)]
    quiet: bool,

    /// Log declaration and mixin steps to stderr
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Declare every interface and apply every class's implements list
    Check {
        /// Path to manifest .json file
        file: PathBuf,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show every class's static and prototype members after mixins
    Describe {
        /// Path to manifest .json file
        file: PathBuf,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the shape digest (SHA-256) of every interface
    Hash {
        /// Path to manifest .json file
        file: PathBuf,
    },

    /// Show version information
    Version,
}

/// Exit code for declaration or conformance failures
const EXIT_INVALID: i32 = 1;
/// Exit code for unreadable or unresolvable manifests
const EXIT_ERROR: i32 = 2;

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(if cli.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::WARN
        })
        .with_writer(std::io::stderr)
        .init();

    let exit_code = match cli.command {
        Commands::Check { file, json } => run_check(&file, json, cli.quiet),
        Commands::Describe { file, json } => run_describe(&file, json, cli.quiet),
        Commands::Hash { file } => run_hash(&file, cli.quiet),
        Commands::Version => {
            if !cli.quiet {
                println!("ifc {}", env!("CARGO_PKG_VERSION"));
            }
            0
        }
    };

    process::exit(exit_code);
}

// ── Commands ──────────────────────────────────────────────

fn run_check(file: &Path, json: bool, quiet: bool) -> i32 {
    let evaluation = match evaluate(file) {
        Ok(evaluation) => evaluation,
        Err(code) => return code,
    };
    let ok = evaluation.is_success();

    if json {
        let classes: Vec<serde_json::Value> = evaluation.classes.iter().map(outcome_json).collect();
        let out = serde_json::json!({
            "valid": ok,
            "contracts": evaluation.contracts.len(),
            "classes": classes,
        });
        print_json(&out, quiet);
    } else {
        for outcome in &evaluation.classes {
            match &outcome.result {
                Ok(reports) if !quiet => {
                    let installed: usize = reports.iter().map(|r| r.installed.len()).sum();
                    println!(
                        "{} {} ({} contract(s), {} member(s) installed)",
                        "✓".green(),
                        outcome.class.name().bold(),
                        reports.len(),
                        installed
                    );
                }
                Ok(_) => {}
                Err(e) => eprintln!("{} {}: {}", "error".red().bold(), outcome.class.name(), e),
            }
        }
        if ok && !quiet {
            println!(
                "{} {} interface(s), {} class(es) valid",
                "✓".green(),
                evaluation.contracts.len(),
                evaluation.classes.len()
            );
        }
    }

    if ok {
        0
    } else {
        EXIT_INVALID
    }
}

fn run_describe(file: &Path, json: bool, quiet: bool) -> i32 {
    let evaluation = match evaluate(file) {
        Ok(evaluation) => evaluation,
        Err(code) => return code,
    };

    if json {
        let classes: Vec<serde_json::Value> = evaluation
            .classes
            .iter()
            .map(|o| class_json(&o.class))
            .collect();
        print_json(&serde_json::json!({ "classes": classes }), quiet);
    } else if !quiet {
        for outcome in &evaluation.classes {
            let class = &outcome.class;
            match class.superclass() {
                Some(parent) => println!("class {} extends {}", class.name().bold(), parent.name()),
                None => println!("class {}", class.name().bold()),
            }
            print_site("static", class.statics());
            print_site("prototype", class.prototype());
        }
    }
    0
}

fn run_hash(file: &Path, quiet: bool) -> i32 {
    let evaluation = match evaluate(file) {
        Ok(evaluation) => evaluation,
        Err(code) => return code,
    };
    if !quiet {
        for contract in &evaluation.contracts {
            println!("{}  {}", shape_digest(contract), contract.name());
        }
    }
    0
}

// ── Helpers ───────────────────────────────────────────────

/// Load and evaluate a manifest, mapping failures to exit codes
fn evaluate(file: &Path) -> Result<Evaluation, i32> {
    let text = match std::fs::read_to_string(file) {
        Ok(text) => text,
        Err(e) => {
            eprintln!("{} cannot read {}: {}", "error".red().bold(), file.display(), e);
            return Err(EXIT_ERROR);
        }
    };
    Manifest::from_json(&text)
        .and_then(|manifest| manifest.evaluate())
        .map_err(|e| {
            eprintln!("{} {}", "error".red().bold(), e);
            match e {
                Error::Declaration(_) | Error::Conformance(_) => EXIT_INVALID,
                _ => EXIT_ERROR,
            }
        })
}

fn outcome_json(outcome: &ClassOutcome) -> serde_json::Value {
    match &outcome.result {
        Ok(reports) => serde_json::json!({
            "name": outcome.class.name(),
            "ok": true,
            "mixins": reports,
        }),
        Err(e) => {
            let missing: Vec<String> = match e {
                Error::Conformance(c) => c.missing().iter().map(|m| m.field.to_string()).collect(),
                _ => Vec::new(),
            };
            serde_json::json!({
                "name": outcome.class.name(),
                "ok": false,
                "error": e.to_string(),
                "missing": missing,
            })
        }
    }
}

fn class_json(class: &ClassType) -> serde_json::Value {
    serde_json::json!({
        "name": class.name(),
        "extends": class.superclass().map(|p| p.name().to_string()),
        "static": site_json(class.statics()),
        "prototype": site_json(class.prototype()),
    })
}

fn site_json(site: &PropertyMap) -> Vec<serde_json::Value> {
    site.iter()
        .map(|(key, property)| {
            let mut entry = serde_json::json!({
                "key": key.to_string(),
                "kind": member_kind(&property.member),
                "enumerable": property.enumerable,
            });
            if let Some(value) = property.as_value() {
                entry["value"] = value.to_json();
            }
            entry
        })
        .collect()
}

fn print_site(label: &str, site: &PropertyMap) {
    for (key, property) in site.iter() {
        let kind = member_kind(&property.member);
        let flag = if property.enumerable { "" } else { " (non-enumerable)" };
        match property.as_value() {
            Some(value) => println!("  {} {} {} = {}{}", label.dimmed(), kind, key, value, flag),
            None => println!("  {} {} {}{}", label.dimmed(), kind, key, flag),
        }
    }
}

fn member_kind(member: &Member) -> &'static str {
    match member {
        Member::Data(_) => "data",
        Member::Method(_) => "method",
    }
}

fn print_json(value: &serde_json::Value, quiet: bool) {
    if quiet {
        return;
    }
    match serde_json::to_string_pretty(value) {
        Ok(text) => println!("{}", text),
        Err(e) => eprintln!("{} {}", "error".red().bold(), e),
    }
}
