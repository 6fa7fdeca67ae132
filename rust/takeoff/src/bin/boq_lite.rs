// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! CLI tool: run a quantity takeoff over a JSON element snapshot
//!
//! Prints category/family aggregates, BOQ code totals and lump-sum pricing.
//! With `--compare`, a second snapshot is taken off the same way and the two
//! aggregate tables are cross-validated; the process exits with status 2 when
//! they disagree.
//!
//! Usage:
//!   boq-lite <snapshot.json> [options]

use std::env;
use std::process::ExitCode;

use anyhow::{bail, Context};
use boq_lite_core::RawMeasurementSource;
use boq_lite_takeoff::{
    ElementSnapshot, Takeoff, TakeoffConfig, TakeoffRun, ValidationReport, UNCODED,
};
use serde::Serialize;

/// Log filter used when `RUST_LOG` is unset.
const DEFAULT_LOG_FILTER: &str = "info,boq_lite_takeoff=debug";

/// Exit status when cross-validation finds discrepancies.
const EXIT_DISCREPANCIES: u8 = 2;

struct Options {
    snapshot: String,
    compare: Option<String>,
    config: Option<String>,
    json: bool,
}

#[derive(Serialize)]
struct JsonOutput<'a> {
    run: &'a TakeoffRun,
    #[serde(skip_serializing_if = "Option::is_none")]
    validation: Option<&'a ValidationReport>,
}

fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG").unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 || args[1] == "--help" || args[1] == "-h" {
        print_usage();
        return Ok(ExitCode::SUCCESS);
    }
    let options = parse_args(&args)?;

    let config = match &options.config {
        Some(path) => TakeoffConfig::from_path(path)
            .with_context(|| format!("Cannot load config '{}'", path))?,
        None => TakeoffConfig::default(),
    }
    .with_env_overrides();
    let takeoff = Takeoff::new(config).context("Invalid takeoff configuration")?;

    let run = take_off(&takeoff, &options.snapshot)?;
    let validation = match &options.compare {
        Some(path) => {
            let other = take_off(&takeoff, path)?;
            Some(takeoff.cross_validate(&run, &other))
        }
        None => None,
    };

    if options.json {
        let output = JsonOutput {
            run: &run,
            validation: validation.as_ref(),
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        print_run(&run);
        if let Some(report) = &validation {
            println!();
            print!("{}", report.render_text());
        }
    }

    match validation {
        Some(report) if !report.is_clean() => Ok(ExitCode::from(EXIT_DISCREPANCIES)),
        _ => Ok(ExitCode::SUCCESS),
    }
}

fn parse_args(args: &[String]) -> anyhow::Result<Options> {
    let mut options = Options {
        snapshot: args[1].clone(),
        compare: None,
        config: None,
        json: false,
    };

    let mut i = 2;
    while i < args.len() {
        match args[i].as_str() {
            "--compare" => {
                i += 1;
                options.compare = Some(value_of(args, i, "--compare")?);
            }
            "--config" => {
                i += 1;
                options.config = Some(value_of(args, i, "--config")?);
            }
            "--json" => {
                options.json = true;
            }
            other => {
                print_usage();
                bail!("Unknown option: {}", other);
            }
        }
        i += 1;
    }
    Ok(options)
}

fn value_of(args: &[String], i: usize, flag: &str) -> anyhow::Result<String> {
    match args.get(i) {
        Some(value) => Ok(value.clone()),
        None => bail!("{} needs a value", flag),
    }
}

fn take_off(takeoff: &Takeoff, path: &str) -> anyhow::Result<TakeoffRun> {
    let snapshot = ElementSnapshot::from_path(path)
        .with_context(|| format!("Cannot read snapshot '{}'", path))?;
    let run = takeoff
        .run(&snapshot.elements, &RawMeasurementSource)
        .with_context(|| format!("Takeoff failed for '{}'", path))?;
    Ok(run)
}

fn print_run(run: &TakeoffRun) {
    let s = &run.summary;
    println!(
        "Elements: {} ({} resolved cleanly, {} with warnings), pay items: {}",
        s.elements, s.succeeded, s.failed, s.pay_items
    );

    println!();
    print_header("Category / Family");
    for (key, agg) in &run.table.categories {
        println!(
            "{:<40} {:>6} {:>12.2} {:>12.2} {:>12.2}",
            key.to_string(),
            agg.count,
            agg.volume,
            agg.area,
            agg.length
        );
        for (family, agg) in run.table.families_of(&key.category) {
            let label = family.family.as_deref().unwrap_or_default();
            println!(
                "  {:<38} {:>6} {:>12.2} {:>12.2} {:>12.2}",
                if label.is_empty() { "(no family)" } else { label },
                agg.count,
                agg.volume,
                agg.area,
                agg.length
            );
        }
    }

    if !run.by_boq_code.is_empty() {
        println!();
        print_header("BOQ code");
        for (code, agg) in &run.by_boq_code {
            println!(
                "{:<40} {:>6} {:>12.2} {:>12.2} {:>12.2}",
                if code == UNCODED { "(no code)" } else { code.as_str() },
                agg.count,
                agg.volume,
                agg.area,
                agg.length
            );
        }
    }

    if run.pricing.succeeded() + run.pricing.failed() > 0 {
        println!();
        println!(
            "Lump-sum pricing: {} priced, {} skipped",
            run.pricing.succeeded(),
            run.pricing.failed()
        );
        for line in &run.pricing.lines {
            println!(
                "  {} {}: {:.2} over {:.2} {} = {:.4}",
                line.element_id,
                line.boq_code,
                line.contract_value,
                line.sum_qty,
                line.analysis_basis,
                line.effective_unit_price
            );
        }
        for error in &run.pricing.errors {
            println!("  {} skipped: {}", error.element_id, error.issue);
        }
    }
}

fn print_header(label: &str) {
    println!(
        "{:<40} {:>6} {:>12} {:>12} {:>12}",
        label, "Count", "Volume m³", "Area m²", "Length m"
    );
}

fn print_usage() {
    eprintln!("Usage: boq-lite <snapshot.json> [options]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --compare <schedule.json>  Cross-validate against a second snapshot (exit 2 on discrepancies)");
    eprintln!("  --config <config.json>     Takeoff configuration (BOQ_* environment variables override it)");
    eprintln!("  --json                     Print the full run as JSON");
    eprintln!();
    eprintln!("Logging is controlled with RUST_LOG (default: {}).", DEFAULT_LOG_FILTER);
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_subscriber::EnvFilter;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn default_log_filter_parses() {
        assert!(EnvFilter::try_new(DEFAULT_LOG_FILTER).is_ok());
        assert!(DEFAULT_LOG_FILTER.starts_with("info,"));
        assert!(DEFAULT_LOG_FILTER.contains("boq_lite_takeoff=debug"));
    }

    #[test]
    fn parses_options() {
        let options = parse_args(&args(&[
            "boq-lite", "export.json", "--compare", "schedule.json", "--json",
        ]))
        .unwrap();
        assert_eq!(options.snapshot, "export.json");
        assert_eq!(options.compare.as_deref(), Some("schedule.json"));
        assert_eq!(options.config, None);
        assert!(options.json);
    }

    #[test]
    fn rejects_missing_values_and_unknown_flags() {
        assert!(parse_args(&args(&["boq-lite", "a.json", "--config"])).is_err());
        assert!(parse_args(&args(&["boq-lite", "a.json", "--verbose"])).is_err());
    }
}
