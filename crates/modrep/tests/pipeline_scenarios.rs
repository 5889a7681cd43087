use std::fs::File;
use std::io::Write;
use std::path::PathBuf;

use modrep::classify::filter_business;
use modrep::config::MODULATION_SHEET;
use modrep::report::{PeriodMode, SortOrder, aggregate_by_period};
use modrep::sheet::{SchemaError, load_records};
use time::macros::date;
use zip::write::SimpleFileOptions;

fn unique_temp_dir(prefix: &str) -> PathBuf {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map_or(0, |duration| duration.as_nanos());
    std::env::temp_dir().join(format!("{prefix}-{nanos}"))
}

fn write_sheet_csv(dir: &PathBuf, name: &str, content: &str) -> PathBuf {
    std::fs::create_dir_all(dir).expect("temp dir should be creatable");
    let path = dir.join(name);
    std::fs::write(&path, content).expect("fixture sheet should write");
    path
}

fn write_workbook_zip(dir: &PathBuf, name: &str, entries: &[(&str, &str)]) -> PathBuf {
    std::fs::create_dir_all(dir).expect("temp dir should be creatable");
    let path = dir.join(name);
    let file = File::create(&path).expect("workbook file should create");
    let mut writer = zip::ZipWriter::new(file);
    for (entry_name, content) in entries {
        writer
            .start_file(entry_name.to_string(), SimpleFileOptions::default())
            .expect("workbook entry should start");
        writer
            .write_all(content.as_bytes())
            .expect("workbook entry should write");
    }
    writer.finish().expect("workbook should finalize");
    path
}

const SCENARIO_SHEET: &str = "Entrega,DPS,CONCATENADO,MODULACION\n\
                              2024-01-10,88,E1,5.2\n\
                              2024-01-10,88,E2,#N/A\n\
                              2024-01-10,77,E3,9\n";

#[test]
fn business_filter_then_daily_summary_matches_expected_counts() {
    let temp = unique_temp_dir("modrep-scenario");
    let sheet_path = write_sheet_csv(&temp, "export.csv", SCENARIO_SHEET);

    let outcome = load_records(&sheet_path, &MODULATION_SHEET).expect("sheet should load");
    assert_eq!(outcome.rows_read, 3);
    assert_eq!(outcome.rows_dropped, 0);

    let records = filter_business(outcome.records, MODULATION_SHEET.business_code);
    assert_eq!(records.len(), 2);

    let summaries = aggregate_by_period(&records, PeriodMode::RollingDays(7), SortOrder::Ascending);
    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].bucket, "2024-01-10");
    assert_eq!(summaries[0].total, 2);
    assert_eq!(summaries[0].modulated, 1);
    assert_eq!(summaries[0].percentage, 50.0);

    std::fs::remove_dir_all(&temp).ok();
}

#[test]
fn unparseable_dates_are_dropped_silently() {
    let temp = unique_temp_dir("modrep-bad-dates");
    let sheet_path = write_sheet_csv(
        &temp,
        "export.csv",
        "Entrega,DPS,CONCATENADO,MODULACION\n\
         2024-01-10,88,E1,5.2\n\
         ,88,E2,7\n\
         no es fecha,88,E3,7\n",
    );

    let outcome = load_records(&sheet_path, &MODULATION_SHEET).expect("sheet should load");
    assert_eq!(outcome.rows_read, 3);
    assert_eq!(outcome.rows_dropped, 2);
    assert_eq!(outcome.records.len(), 1);
    assert_eq!(outcome.records[0].delivery_date, date!(2024 - 01 - 10));

    std::fs::remove_dir_all(&temp).ok();
}

#[test]
fn missing_required_column_is_a_schema_error() {
    let temp = unique_temp_dir("modrep-missing-column");
    let sheet_path = write_sheet_csv(
        &temp,
        "export.csv",
        "Entrega,DPS,CONCATENADO\n2024-01-10,88,E1\n",
    );

    let error =
        load_records(&sheet_path, &MODULATION_SHEET).expect_err("missing column must fail");
    let schema_error = error
        .downcast_ref::<SchemaError>()
        .expect("failure should downcast to SchemaError");
    assert_eq!(
        schema_error,
        &SchemaError::MissingColumns {
            sheet_name: "3.30.8".to_string(),
            columns: vec!["MODULACION".to_string()],
        }
    );

    std::fs::remove_dir_all(&temp).ok();
}

#[test]
fn workbook_zip_selects_the_configured_sheet_entry() {
    let temp = unique_temp_dir("modrep-workbook");
    let workbook_path = write_workbook_zip(
        &temp,
        "export.zip",
        &[
            ("resumen.csv", "col\nvalue\n"),
            ("3.30.8.csv", SCENARIO_SHEET),
        ],
    );

    let outcome = load_records(&workbook_path, &MODULATION_SHEET).expect("workbook should load");
    assert_eq!(outcome.rows_read, 3);
    let records = filter_business(outcome.records, MODULATION_SHEET.business_code);
    assert_eq!(records.len(), 2);

    std::fs::remove_dir_all(&temp).ok();
}

#[test]
fn workbook_zip_without_the_sheet_is_a_schema_error() {
    let temp = unique_temp_dir("modrep-workbook-missing");
    let workbook_path =
        write_workbook_zip(&temp, "export.zip", &[("resumen.csv", "col\nvalue\n")]);

    let error =
        load_records(&workbook_path, &MODULATION_SHEET).expect_err("missing sheet must fail");
    let schema_error = error
        .downcast_ref::<SchemaError>()
        .expect("failure should downcast to SchemaError");
    assert_eq!(
        schema_error,
        &SchemaError::MissingSheet {
            sheet_name: "3.30.8".to_string(),
        }
    );

    std::fs::remove_dir_all(&temp).ok();
}

#[test]
fn nested_workbook_entries_match_on_file_name() {
    let temp = unique_temp_dir("modrep-workbook-nested");
    let workbook_path = write_workbook_zip(
        &temp,
        "export.zip",
        &[("sheets/3.30.8.csv", SCENARIO_SHEET)],
    );

    let outcome = load_records(&workbook_path, &MODULATION_SHEET).expect("workbook should load");
    assert_eq!(outcome.records.len(), 3);

    std::fs::remove_dir_all(&temp).ok();
}
