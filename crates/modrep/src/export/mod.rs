use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;

use crate::report::{ErrorDetailRow, PeriodSummary, ReincidenceEntry};

pub const REPORT_SCHEMA_VERSION: &str = "modrep.report.v1";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryReportArtifact {
    pub schema_version: String,
    pub input: String,
    pub period: String,
    pub rows_read: usize,
    pub rows_dropped: usize,
    pub buckets: Vec<PeriodSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReincidenceReportArtifact {
    pub schema_version: String,
    pub input: String,
    pub scope: String,
    pub window: String,
    pub top_k: usize,
    pub entries: Vec<ReincidenceEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorDetailArtifact {
    pub schema_version: String,
    pub input: String,
    pub date: String,
    pub rows: Vec<ErrorDetailRow>,
}

#[must_use]
pub fn summary_csv_path(out_dir: &Path) -> PathBuf {
    out_dir.join("summary.csv")
}

#[must_use]
pub fn summary_report_path(out_dir: &Path) -> PathBuf {
    out_dir.join("summary-report.json")
}

#[must_use]
pub fn reincidence_csv_path(out_dir: &Path) -> PathBuf {
    out_dir.join("reincidence.csv")
}

#[must_use]
pub fn reincidence_report_path(out_dir: &Path) -> PathBuf {
    out_dir.join("reincidence-report.json")
}

#[must_use]
pub fn error_detail_csv_path(out_dir: &Path) -> PathBuf {
    out_dir.join("errors.csv")
}

#[must_use]
pub fn error_detail_report_path(out_dir: &Path) -> PathBuf {
    out_dir.join("errors-report.json")
}

pub fn write_summary_csv(path: &Path, summaries: &[PeriodSummary]) -> Result<()> {
    ensure_parent(path)?;
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("failed to create export file: {}", path.display()))?;
    writer.write_record(["bucket", "total", "modulated", "percentage"])?;
    for summary in summaries {
        writer.write_record(&[
            summary.bucket.clone(),
            summary.total.to_string(),
            summary.modulated.to_string(),
            format!("{:.1}", summary.percentage),
        ])?;
    }
    writer
        .flush()
        .with_context(|| format!("failed to flush export file: {}", path.display()))
}

pub fn write_reincidence_csv(path: &Path, entries: &[ReincidenceEntry]) -> Result<()> {
    ensure_parent(path)?;
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("failed to create export file: {}", path.display()))?;
    writer.write_record(["entity_id", "distinct_days"])?;
    for entry in entries {
        writer.write_record(&[entry.entity_id.clone(), entry.distinct_days.to_string()])?;
    }
    writer
        .flush()
        .with_context(|| format!("failed to flush export file: {}", path.display()))
}

pub fn write_error_detail_csv(path: &Path, rows: &[ErrorDetailRow]) -> Result<()> {
    ensure_parent(path)?;
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("failed to create export file: {}", path.display()))?;
    writer.write_record(["client_id", "order_ref", "reason"])?;
    for row in rows {
        writer.write_record(&[row.client_id.clone(), row.order_ref.clone(), row.reason.clone()])?;
    }
    writer
        .flush()
        .with_context(|| format!("failed to flush export file: {}", path.display()))
}

pub fn write_json_artifact<T: Serialize>(path: &Path, artifact: &T) -> Result<()> {
    ensure_parent(path)?;
    let encoded =
        serde_json::to_vec_pretty(artifact).context("failed to encode report artifact")?;
    std::fs::write(path, encoded)
        .with_context(|| format!("failed to write report artifact: {}", path.display()))
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).with_context(|| {
            format!("failed to create export directory: {}", parent.display())
        })?;
    }
    Ok(())
}
