use std::path::PathBuf;

use anyhow::{Result, bail};
use clap::Args;

use crate::config::{MODULATION_SHEET, RuntimePaths};
use crate::export::{self, ErrorDetailArtifact, REPORT_SCHEMA_VERSION};
use crate::record::{iso_date, parse_delivery_date};
use crate::report::{ErrorDetailRow, error_detail};
use crate::{classify, sheet};

#[derive(Debug, Clone, Args)]
pub struct ErrorsArgs {
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Delivery date to report on, e.g. `2024-01-10` or `10/01/2024`.
    #[arg(long, value_name = "DATE")]
    pub date: String,
}

pub fn run(args: &ErrorsArgs, runtime_paths: &RuntimePaths) -> Result<()> {
    let schema = &MODULATION_SHEET;
    let Some(date) = parse_delivery_date(&args.date) else {
        bail!("unsupported --date value: {}", args.date);
    };
    println!(
        "errors: start input={} sheet={} date={} out_dir={}",
        args.input.display(),
        schema.sheet_name,
        iso_date(date),
        runtime_paths.out_dir.display()
    );

    let outcome = sheet::load_records(&args.input, schema)?;
    let records = classify::filter_business(outcome.records, schema.business_code);
    let rows = error_detail(&records, date);

    println!(
        "errors: collected rows_read={} rows_dropped={} clients={}",
        outcome.rows_read,
        outcome.rows_dropped,
        rows.len()
    );
    if rows.is_empty() {
        println!("errors: no error rows for date={}", iso_date(date));
    } else {
        render_table(&rows);
    }

    let csv_path = export::error_detail_csv_path(&runtime_paths.out_dir);
    export::write_error_detail_csv(&csv_path, &rows)?;
    let report_path = export::error_detail_report_path(&runtime_paths.out_dir);
    export::write_json_artifact(
        &report_path,
        &ErrorDetailArtifact {
            schema_version: REPORT_SCHEMA_VERSION.to_string(),
            input: args.input.display().to_string(),
            date: iso_date(date),
            rows,
        },
    )?;
    println!(
        "errors: complete export={} report={}",
        csv_path.display(),
        report_path.display()
    );

    Ok(())
}

fn render_table(rows: &[ErrorDetailRow]) {
    println!("{:<16} {:<20} {}", "client", "order", "reason");
    for row in rows {
        println!("{:<16} {:<20} {}", row.client_id, row.order_ref, row.reason);
    }
}
