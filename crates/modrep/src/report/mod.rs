use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::Serialize;
use time::{Date, Duration};

use crate::classify::{Modulation, classify};
use crate::record::{Record, iso_date, month_key, same_month};

pub const MISSING_REASON_PLACEHOLDER: &str = "sin motivo registrado";

const TRAILING_YEAR_DAYS: i64 = 365;

/// Time bucketing selected by the caller. The reference date for windows
/// is always the freshest delivery date in the record set, not the wall
/// clock: the workbook is a historical batch export.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeriodMode {
    /// Daily buckets, records strictly newer than `max_date - N days`.
    RollingDays(u32),
    /// Daily buckets, records in the month/year of the freshest date.
    CurrentMonth,
    /// `YYYY-MM` buckets over the full record set.
    HistoricalMonthly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    /// Chronological, for evolution charts.
    Ascending,
    /// Most recent first, for tables.
    Descending,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodSummary {
    pub bucket: String,
    /// Distinct entity keys in the bucket, before the validity split.
    pub total: usize,
    /// Distinct entity keys among rows classified as modulated.
    pub modulated: usize,
    /// `100 * modulated / total`. A zero total reports 0.0 rather than
    /// NaN; buckets are never omitted.
    pub percentage: f64,
}

#[must_use]
pub fn percentage(modulated: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    100.0 * modulated as f64 / total as f64
}

/// Groups records into time buckets and computes distinct-entity totals,
/// modulated counts and percentages per bucket.
///
/// Counts are over distinct `entity_key` values, never raw rows: one
/// shipment updated several times in a day still counts once. Callers
/// must apply the business-code filter first.
#[must_use]
pub fn aggregate_by_period(
    records: &[Record],
    mode: PeriodMode,
    order: SortOrder,
) -> Vec<PeriodSummary> {
    let Some(max_date) = records.iter().map(|record| record.delivery_date).max() else {
        return Vec::new();
    };

    let mut totals: BTreeMap<String, BTreeSet<&str>> = BTreeMap::new();
    let mut modulated: BTreeMap<String, BTreeSet<&str>> = BTreeMap::new();

    for record in records {
        let bucket = match mode {
            PeriodMode::RollingDays(days) => {
                let cutoff = max_date - Duration::days(i64::from(days));
                // Strict comparison: a record dated exactly on the cutoff
                // falls outside the window.
                if record.delivery_date <= cutoff {
                    continue;
                }
                iso_date(record.delivery_date)
            }
            PeriodMode::CurrentMonth => {
                if !same_month(record.delivery_date, max_date) {
                    continue;
                }
                iso_date(record.delivery_date)
            }
            PeriodMode::HistoricalMonthly => month_key(record.delivery_date),
        };

        if classify(record) == Modulation::Modulated {
            modulated
                .entry(bucket.clone())
                .or_default()
                .insert(record.entity_key.as_str());
        }
        totals
            .entry(bucket)
            .or_default()
            .insert(record.entity_key.as_str());
    }

    let mut summaries: Vec<PeriodSummary> = totals
        .into_iter()
        .map(|(bucket, entities)| {
            let modulated_count = modulated.get(&bucket).map_or(0, BTreeSet::len);
            let total = entities.len();
            PeriodSummary {
                bucket,
                total,
                modulated: modulated_count,
                percentage: percentage(modulated_count, total),
            }
        })
        .collect();

    if order == SortOrder::Descending {
        summaries.reverse();
    }
    summaries
}

/// Which identifier the reincidence ranking counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReincidenceScope {
    Client,
    Vehicle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReincidenceWindow {
    RollingDays(u32),
    CurrentMonth,
    TrailingYear,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReincidenceEntry {
    pub entity_id: String,
    /// Distinct days with at least one error row for this entity. Row
    /// multiplicity within a day does not inflate the count.
    pub distinct_days: usize,
}

/// Ranks entities by distinct-day error frequency inside a window,
/// descending, truncated to `top_k`. Ties keep first-seen order (stable
/// sort over the counting order).
#[must_use]
pub fn rank_reincidence(
    records: &[Record],
    scope: ReincidenceScope,
    window: ReincidenceWindow,
    top_k: usize,
) -> Vec<ReincidenceEntry> {
    let Some(max_date) = records.iter().map(|record| record.delivery_date).max() else {
        return Vec::new();
    };

    let mut seen_entity_days: BTreeSet<(String, Date)> = BTreeSet::new();
    let mut entries: Vec<ReincidenceEntry> = Vec::new();
    let mut index_by_entity: HashMap<String, usize> = HashMap::new();

    for record in records {
        if classify(record) != Modulation::NotModulated {
            continue;
        }
        if !window_contains(window, max_date, record.delivery_date) {
            continue;
        }
        let entity_id = match scope {
            ReincidenceScope::Client => record.client_id.as_deref(),
            ReincidenceScope::Vehicle => record.vehicle_id.as_deref(),
        };
        let Some(entity_id) = entity_id.map(str::trim).filter(|id| !id.is_empty()) else {
            continue;
        };
        if !seen_entity_days.insert((entity_id.to_string(), record.delivery_date)) {
            continue;
        }

        match index_by_entity.get(entity_id) {
            Some(&index) => entries[index].distinct_days += 1,
            None => {
                index_by_entity.insert(entity_id.to_string(), entries.len());
                entries.push(ReincidenceEntry {
                    entity_id: entity_id.to_string(),
                    distinct_days: 1,
                });
            }
        }
    }

    entries.sort_by(|left, right| right.distinct_days.cmp(&left.distinct_days));
    entries.truncate(top_k);
    entries
}

fn window_contains(window: ReincidenceWindow, max_date: Date, date: Date) -> bool {
    match window {
        ReincidenceWindow::RollingDays(days) => date > max_date - Duration::days(i64::from(days)),
        ReincidenceWindow::CurrentMonth => same_month(date, max_date),
        ReincidenceWindow::TrailingYear => date > max_date - Duration::days(TRAILING_YEAR_DAYS),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorDetailRow {
    pub client_id: String,
    pub order_ref: String,
    pub reason: String,
}

/// Error rows for one delivery date, one row per client. When a client
/// errors more than once that day, the first occurrence in original row
/// order wins; later rows are discarded, not merged.
#[must_use]
pub fn error_detail(records: &[Record], date: Date) -> Vec<ErrorDetailRow> {
    let mut seen_clients: BTreeSet<String> = BTreeSet::new();
    let mut rows = Vec::new();

    for record in records {
        if record.delivery_date != date || classify(record) != Modulation::NotModulated {
            continue;
        }
        let Some(client_id) = record
            .client_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
        else {
            continue;
        };
        if !seen_clients.insert(client_id.to_string()) {
            continue;
        }

        let reason = record
            .reason
            .as_deref()
            .map(str::trim)
            .filter(|reason| !reason.is_empty())
            .unwrap_or(MISSING_REASON_PLACEHOLDER);
        rows.push(ErrorDetailRow {
            client_id: client_id.to_string(),
            order_ref: record
                .order_ref
                .clone()
                .unwrap_or_else(|| record.entity_key.clone()),
            reason: reason.to_string(),
        });
    }

    rows
}

/// Distinct delivery dates, most recent first. This is the date selector
/// the reporting front end offers.
#[must_use]
pub fn available_dates(records: &[Record]) -> Vec<Date> {
    let dates: BTreeSet<Date> = records.iter().map(|record| record.delivery_date).collect();
    dates.into_iter().rev().collect()
}
