use std::collections::BTreeSet;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;

use crate::classify::{self, Modulation};
use crate::config::MODULATION_SHEET;
use crate::record::iso_date;
use crate::report::available_dates;
use crate::sheet;

#[derive(Debug, Clone, Args)]
pub struct InspectArgs {
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Emit the summary as JSON instead of text.
    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InspectSummary {
    pub sheet_name: String,
    pub rows_read: usize,
    pub rows_dropped: usize,
    pub business_rows: usize,
    pub distinct_entities: usize,
    pub modulated_rows: usize,
    pub error_rows: usize,
    /// Distinct delivery dates, most recent first.
    pub available_dates: Vec<String>,
}

pub fn run(args: &InspectArgs) -> Result<()> {
    let schema = &MODULATION_SHEET;
    let outcome = sheet::load_records(&args.input, schema)?;
    let records = classify::filter_business(outcome.records, schema.business_code);

    let distinct_entities = records
        .iter()
        .map(|record| record.entity_key.as_str())
        .collect::<BTreeSet<_>>()
        .len();
    let modulated_rows = records
        .iter()
        .filter(|record| classify::classify(record) == Modulation::Modulated)
        .count();
    let summary = InspectSummary {
        sheet_name: schema.sheet_name.to_string(),
        rows_read: outcome.rows_read,
        rows_dropped: outcome.rows_dropped,
        business_rows: records.len(),
        distinct_entities,
        modulated_rows,
        error_rows: records.len() - modulated_rows,
        available_dates: available_dates(&records).into_iter().map(iso_date).collect(),
    };

    if args.json {
        let encoded = serde_json::to_string_pretty(&summary)
            .context("failed to encode inspect summary")?;
        println!("{encoded}");
        return Ok(());
    }

    println!("inspect: sheet={}", summary.sheet_name);
    println!(
        "inspect: rows_read={} rows_dropped={} business_rows={}",
        summary.rows_read, summary.rows_dropped, summary.business_rows
    );
    println!(
        "inspect: distinct_entities={} modulated_rows={} error_rows={}",
        summary.distinct_entities, summary.modulated_rows, summary.error_rows
    );
    match (summary.available_dates.last(), summary.available_dates.first()) {
        (Some(oldest), Some(newest)) => {
            println!("inspect: date_range={oldest}..{newest}");
        }
        _ => println!("inspect: date_range=empty"),
    }
    for date in &summary.available_dates {
        println!("inspect: date {date}");
    }

    Ok(())
}
