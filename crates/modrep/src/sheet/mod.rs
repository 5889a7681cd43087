use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use csv::ReaderBuilder;
use zip::ZipArchive;

use crate::config::SheetSchema;
use crate::record::{Record, TargetValue, parse_delivery_date};

/// Structural input failure: the named sheet or a required column is
/// missing. Unlike row-level parse issues, this aborts the whole run and
/// maps to its own process exit code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    MissingSheet { sheet_name: String },
    MissingColumns { sheet_name: String, columns: Vec<String> },
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingSheet { sheet_name } => {
                write!(f, "workbook does not contain sheet `{sheet_name}`")
            }
            Self::MissingColumns {
                sheet_name,
                columns,
            } => {
                write!(
                    f,
                    "sheet `{sheet_name}` is missing required column(s): {}",
                    columns.join(", ")
                )
            }
        }
    }
}

impl std::error::Error for SchemaError {}

/// Raw sheet content: trimmed headers plus string rows, no typing yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Result of the typed coercion pass. Rows with unparseable delivery
/// dates are dropped without surfacing an error; only the count is kept
/// for progress reporting.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadOutcome {
    pub records: Vec<Record>,
    pub rows_read: usize,
    pub rows_dropped: usize,
}

/// Loads the configured sheet from `path` and coerces it into records.
pub fn load_records(path: &Path, schema: &SheetSchema) -> Result<LoadOutcome> {
    let table = load_sheet(path, schema)?;
    table.into_records(schema)
}

/// Reads the raw sheet. A `.zip` workbook selects the `<sheet>.csv`
/// entry matching the configured sheet name; anything else is read as a
/// single CSV sheet directly.
pub fn load_sheet(path: &Path, schema: &SheetSchema) -> Result<SheetTable> {
    match path.extension().and_then(|extension| extension.to_str()) {
        Some("zip") => load_from_workbook(path, schema),
        _ => {
            let file = File::open(path)
                .with_context(|| format!("failed to open sheet file: {}", path.display()))?;
            read_table(file)
        }
    }
}

fn load_from_workbook(path: &Path, schema: &SheetSchema) -> Result<SheetTable> {
    let file = File::open(path)
        .with_context(|| format!("failed to open workbook: {}", path.display()))?;
    let mut archive = ZipArchive::new(file)
        .with_context(|| format!("failed to read workbook archive: {}", path.display()))?;

    let wanted = format!("{}.csv", schema.sheet_name);
    let entry_name = archive
        .file_names()
        .find(|name| {
            name.rsplit('/')
                .next()
                .is_some_and(|file_name| file_name == wanted)
        })
        .map(str::to_string);
    let Some(entry_name) = entry_name else {
        return Err(SchemaError::MissingSheet {
            sheet_name: schema.sheet_name.to_string(),
        }
        .into());
    };

    let entry = archive
        .by_name(&entry_name)
        .with_context(|| format!("failed to open workbook entry: {entry_name}"))?;
    read_table(entry)
}

fn read_table<R: Read>(reader: R) -> Result<SheetTable> {
    let mut csv_reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    let mut headers = Vec::new();
    let mut rows = Vec::new();
    for (index, result) in csv_reader.records().enumerate() {
        let row = result.with_context(|| format!("failed to read sheet row {}", index + 1))?;
        let cells: Vec<String> = row.iter().map(str::to_string).collect();
        if index == 0 {
            // Source exports are known to carry stray header whitespace.
            headers = cells.iter().map(|header| header.trim().to_string()).collect();
        } else {
            rows.push(cells);
        }
    }

    Ok(SheetTable { headers, rows })
}

impl SheetTable {
    #[must_use]
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|header| header == name)
    }

    /// One-time typed coercion of every field. After this point nothing
    /// downstream touches raw cell text.
    pub fn into_records(self, schema: &SheetSchema) -> Result<LoadOutcome> {
        let missing: Vec<String> = schema
            .required_columns()
            .iter()
            .filter(|column| self.column_index(column).is_none())
            .map(|column| (*column).to_string())
            .collect();
        if !missing.is_empty() {
            return Err(SchemaError::MissingColumns {
                sheet_name: schema.sheet_name.to_string(),
                columns: missing,
            }
            .into());
        }

        let required = |name: &str| -> Result<usize> {
            self.column_index(name)
                .ok_or_else(|| anyhow!("column vanished after schema check: {name}"))
        };
        let date_index = required(schema.delivery_date_column)?;
        let code_index = required(schema.business_code_column)?;
        let entity_index = required(schema.entity_key_column)?;
        let target_index = required(schema.target_column)?;
        let client_index = self.column_index(schema.client_column);
        let vehicle_index = self.column_index(schema.vehicle_column);
        let order_index = self.column_index(schema.order_ref_column);
        let reason_index = self.column_index(schema.reason_column);

        let rows_read = self.rows.len();
        let mut rows_dropped = 0usize;
        let mut records = Vec::with_capacity(rows_read);
        for row in &self.rows {
            let cell = |index: usize| row.get(index).map_or("", |value| value.trim());
            let optional = |index: Option<usize>| {
                index
                    .map(cell)
                    .filter(|value| !value.is_empty())
                    .map(str::to_string)
            };

            let Some(delivery_date) = parse_delivery_date(cell(date_index)) else {
                rows_dropped += 1;
                continue;
            };

            records.push(Record {
                delivery_date,
                business_code: cell(code_index).to_string(),
                entity_key: cell(entity_index).to_string(),
                target: TargetValue::from_cell(cell(target_index)),
                client_id: optional(client_index),
                vehicle_id: optional(vehicle_index),
                order_ref: optional(order_index),
                reason: optional(reason_index),
            });
        }

        Ok(LoadOutcome {
            records,
            rows_read,
            rows_dropped,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{SchemaError, SheetTable, read_table};
    use crate::config::MODULATION_SHEET;
    use crate::record::TargetValue;
    use time::macros::date;

    fn table(csv: &str) -> SheetTable {
        read_table(csv.as_bytes()).expect("csv fixture should read")
    }

    #[test]
    fn trims_header_whitespace() {
        let sheet = table("  Entrega , DPS ,CONCATENADO, MODULACION \n2024-01-10,88,E1,5.2\n");
        assert_eq!(
            sheet.headers,
            vec!["Entrega", "DPS", "CONCATENADO", "MODULACION"]
        );
    }

    #[test]
    fn coerces_rows_and_drops_unparseable_dates() {
        let sheet = table(
            "Entrega,DPS,CONCATENADO,MODULACION\n\
             2024-01-10,88,E1,\"5,2\"\n\
             sin fecha,88,E2,7\n\
             10/01/2024,88,E3,#N/A\n",
        );

        let outcome = sheet
            .into_records(&MODULATION_SHEET)
            .expect("coercion should succeed");
        assert_eq!(outcome.rows_read, 3);
        assert_eq!(outcome.rows_dropped, 1);
        assert_eq!(outcome.records.len(), 2);
        assert_eq!(outcome.records[0].delivery_date, date!(2024 - 01 - 10));
        assert_eq!(outcome.records[0].target, TargetValue::Number(5.2));
        assert_eq!(outcome.records[1].entity_key, "E3");
        assert_eq!(outcome.records[1].target, TargetValue::ErrorMarker);
    }

    #[test]
    fn optional_columns_become_none_when_absent_or_empty() {
        let sheet = table(
            "Entrega,DPS,CONCATENADO,MODULACION,CLIENTE,MOTIVO\n\
             2024-01-10,88,E1,#N/A,C1,\n\
             2024-01-10,88,E2,#N/A,,camion lleno\n",
        );

        let outcome = sheet
            .into_records(&MODULATION_SHEET)
            .expect("coercion should succeed");
        assert_eq!(outcome.records[0].client_id.as_deref(), Some("C1"));
        assert_eq!(outcome.records[0].reason, None);
        assert_eq!(outcome.records[0].vehicle_id, None);
        assert_eq!(outcome.records[1].client_id, None);
        assert_eq!(outcome.records[1].reason.as_deref(), Some("camion lleno"));
    }

    #[test]
    fn missing_required_columns_surface_as_schema_error() {
        let sheet = table("Entrega,CONCATENADO\n2024-01-10,E1\n");

        let error = sheet
            .into_records(&MODULATION_SHEET)
            .expect_err("missing columns must fail");
        let schema_error = error
            .downcast_ref::<SchemaError>()
            .expect("error should be a SchemaError");
        assert_eq!(
            schema_error,
            &SchemaError::MissingColumns {
                sheet_name: "3.30.8".to_string(),
                columns: vec!["DPS".to_string(), "MODULACION".to_string()],
            }
        );
        assert!(
            schema_error
                .to_string()
                .contains("missing required column(s): DPS, MODULACION")
        );
    }

    #[test]
    fn short_rows_read_as_empty_cells() {
        let sheet = table(
            "Entrega,DPS,CONCATENADO,MODULACION\n\
             2024-01-10,88,E1\n",
        );

        let outcome = sheet
            .into_records(&MODULATION_SHEET)
            .expect("short rows should still coerce");
        assert_eq!(outcome.records[0].target, TargetValue::Blank);
    }
}
