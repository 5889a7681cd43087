use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, ValueEnum};

use crate::config::{MODULATION_SHEET, RuntimePaths};
use crate::export::{self, REPORT_SCHEMA_VERSION, ReincidenceReportArtifact};
use crate::report::{ReincidenceEntry, ReincidenceScope, ReincidenceWindow, rank_reincidence};
use crate::{classify, sheet};

#[derive(Debug, Clone, Args)]
pub struct ReincidenceArgs {
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    #[arg(long, value_enum, default_value = "client")]
    pub scope: ScopeArg,

    #[arg(long, value_enum, default_value = "rolling")]
    pub window: WindowArg,

    /// Window length for `--window rolling`.
    #[arg(long, default_value_t = 7)]
    pub days: u32,

    /// Ranking cut-off.
    #[arg(long, default_value_t = 10)]
    pub top: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ScopeArg {
    Client,
    Vehicle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum WindowArg {
    Rolling,
    Month,
    Year,
}

pub fn run(args: &ReincidenceArgs, runtime_paths: &RuntimePaths) -> Result<()> {
    let schema = &MODULATION_SHEET;
    println!(
        "reincidence: start input={} scope={} window={} days={} top={} out_dir={}",
        args.input.display(),
        scope_key(args.scope),
        window_key(args.window),
        args.days,
        args.top,
        runtime_paths.out_dir.display()
    );

    let outcome = sheet::load_records(&args.input, schema)?;
    let records = classify::filter_business(outcome.records, schema.business_code);
    let scope = match args.scope {
        ScopeArg::Client => ReincidenceScope::Client,
        ScopeArg::Vehicle => ReincidenceScope::Vehicle,
    };
    let window = match args.window {
        WindowArg::Rolling => ReincidenceWindow::RollingDays(args.days),
        WindowArg::Month => ReincidenceWindow::CurrentMonth,
        WindowArg::Year => ReincidenceWindow::TrailingYear,
    };
    let ranking = rank_reincidence(&records, scope, window, args.top);

    println!(
        "reincidence: ranked rows_read={} rows_dropped={} entries={}",
        outcome.rows_read,
        outcome.rows_dropped,
        ranking.len()
    );
    render_table(&ranking);

    let csv_path = export::reincidence_csv_path(&runtime_paths.out_dir);
    export::write_reincidence_csv(&csv_path, &ranking)?;
    let report_path = export::reincidence_report_path(&runtime_paths.out_dir);
    export::write_json_artifact(
        &report_path,
        &ReincidenceReportArtifact {
            schema_version: REPORT_SCHEMA_VERSION.to_string(),
            input: args.input.display().to_string(),
            scope: scope_key(args.scope).to_string(),
            window: window_key(args.window).to_string(),
            top_k: args.top,
            entries: ranking,
        },
    )?;
    println!(
        "reincidence: complete export={} report={}",
        csv_path.display(),
        report_path.display()
    );

    Ok(())
}

fn render_table(ranking: &[ReincidenceEntry]) {
    println!("{:<6} {:<20} {:>13}", "rank", "entity", "error_days");
    for (position, entry) in ranking.iter().enumerate() {
        println!(
            "{:<6} {:<20} {:>13}",
            position + 1,
            entry.entity_id,
            entry.distinct_days
        );
    }
}

pub(crate) const fn scope_key(scope: ScopeArg) -> &'static str {
    match scope {
        ScopeArg::Client => "client",
        ScopeArg::Vehicle => "vehicle",
    }
}

pub(crate) const fn window_key(window: WindowArg) -> &'static str {
    match window {
        WindowArg::Rolling => "rolling",
        WindowArg::Month => "month",
        WindowArg::Year => "year",
    }
}
