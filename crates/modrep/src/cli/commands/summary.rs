use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, ValueEnum};

use crate::config::{MODULATION_SHEET, RuntimePaths};
use crate::export::{self, REPORT_SCHEMA_VERSION, SummaryReportArtifact};
use crate::report::{PeriodMode, PeriodSummary, SortOrder, aggregate_by_period};
use crate::{classify, sheet};

#[derive(Debug, Clone, Args)]
pub struct SummaryArgs {
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    #[arg(long, value_enum, default_value = "rolling")]
    pub period: PeriodArg,

    /// Window length for `--period rolling`.
    #[arg(long, default_value_t = 7)]
    pub days: u32,

    #[arg(long, value_enum, default_value = "asc")]
    pub order: OrderArg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PeriodArg {
    Rolling,
    Month,
    History,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OrderArg {
    Asc,
    Desc,
}

pub fn run(args: &SummaryArgs, runtime_paths: &RuntimePaths) -> Result<()> {
    let schema = &MODULATION_SHEET;
    println!(
        "summary: start input={} sheet={} period={} days={} out_dir={}",
        args.input.display(),
        schema.sheet_name,
        period_key(args.period),
        args.days,
        runtime_paths.out_dir.display()
    );

    let outcome = sheet::load_records(&args.input, schema)?;
    let records = classify::filter_business(outcome.records, schema.business_code);
    let mode = match args.period {
        PeriodArg::Rolling => PeriodMode::RollingDays(args.days),
        PeriodArg::Month => PeriodMode::CurrentMonth,
        PeriodArg::History => PeriodMode::HistoricalMonthly,
    };
    let order = match args.order {
        OrderArg::Asc => SortOrder::Ascending,
        OrderArg::Desc => SortOrder::Descending,
    };
    let summaries = aggregate_by_period(&records, mode, order);

    println!(
        "summary: aggregated rows_read={} rows_dropped={} business_rows={} buckets={}",
        outcome.rows_read,
        outcome.rows_dropped,
        records.len(),
        summaries.len()
    );
    render_table(&summaries);

    let csv_path = export::summary_csv_path(&runtime_paths.out_dir);
    export::write_summary_csv(&csv_path, &summaries)?;
    let report_path = export::summary_report_path(&runtime_paths.out_dir);
    export::write_json_artifact(
        &report_path,
        &SummaryReportArtifact {
            schema_version: REPORT_SCHEMA_VERSION.to_string(),
            input: args.input.display().to_string(),
            period: period_key(args.period).to_string(),
            rows_read: outcome.rows_read,
            rows_dropped: outcome.rows_dropped,
            buckets: summaries,
        },
    )?;
    println!(
        "summary: complete export={} report={}",
        csv_path.display(),
        report_path.display()
    );

    Ok(())
}

fn render_table(summaries: &[PeriodSummary]) {
    println!(
        "{:<12} {:>8} {:>10} {:>8}",
        "bucket", "total", "modulated", "pct"
    );
    for summary in summaries {
        println!(
            "{:<12} {:>8} {:>10} {:>7.1}%",
            summary.bucket, summary.total, summary.modulated, summary.percentage
        );
    }
}

pub(crate) const fn period_key(period: PeriodArg) -> &'static str {
    match period {
        PeriodArg::Rolling => "rolling",
        PeriodArg::Month => "month",
        PeriodArg::History => "history",
    }
}
