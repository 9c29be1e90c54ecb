use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::models::{Dataset, Field, Period, Record};

/// Label for records whose group column is blank.
pub const UNASSIGNED: &str = "(not set)";

/// Row limit of the consolidated-task ranking.
pub const TOP_TASKS: usize = 15;

// ---------------------------------------------------------------------------
// Summary metrics
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Summary {
    pub total: f64,
    pub count: usize,
    pub average: f64,
    pub largest: Option<f64>,
}

pub fn get_summary(dataset: &Dataset) -> Summary {
    let total = dataset.total();
    let count = dataset.len();
    let largest = dataset
        .records
        .iter()
        .map(|r| r.amount)
        .max_by(f64::total_cmp);
    Summary {
        total,
        count,
        average: if count > 0 { total / count as f64 } else { 0.0 },
        largest,
    }
}

// ---------------------------------------------------------------------------
// Grouped totals
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GroupTotal {
    pub name: String,
    pub total: f64,
    pub count: usize,
}

/// Value order first, then label ascending so equal totals sort the same way
/// no matter how the input was ordered.
fn by_value_then_name(order: SortOrder) -> impl Fn(&GroupTotal, &GroupTotal) -> Ordering {
    move |a, b| {
        let by_value = match order {
            SortOrder::Ascending => a.total.total_cmp(&b.total),
            SortOrder::Descending => b.total.total_cmp(&a.total),
        };
        by_value.then_with(|| a.name.cmp(&b.name))
    }
}

/// Sum amounts per value of a text column. Empty when the column is absent.
pub fn group_totals(dataset: &Dataset, field: Field, order: SortOrder) -> Vec<GroupTotal> {
    if !dataset.has(field) {
        return Vec::new();
    }
    let mut groups: BTreeMap<&str, (f64, usize)> = BTreeMap::new();
    for r in &dataset.records {
        let entry = groups.entry(r.text(field).unwrap_or(UNASSIGNED)).or_default();
        entry.0 += r.amount;
        entry.1 += 1;
    }
    let mut out: Vec<GroupTotal> = groups
        .into_iter()
        .map(|(name, (total, count))| GroupTotal {
            name: name.to_string(),
            total,
            count,
        })
        .collect();
    out.sort_by(by_value_then_name(order));
    out
}

/// Cost per category, largest first.
pub fn get_categories(dataset: &Dataset) -> Vec<GroupTotal> {
    group_totals(dataset, Field::Category, SortOrder::Descending)
}

/// Dealer ranking, largest first, optionally cut to the top `limit`.
pub fn get_dealer_ranking(dataset: &Dataset, limit: Option<usize>) -> Vec<GroupTotal> {
    let mut out = group_totals(dataset, Field::DealerCategory, SortOrder::Descending);
    if let Some(n) = limit {
        out.truncate(n);
    }
    out
}

/// Dealer bars for a horizontal chart: the same top `limit` as the ranking,
/// ordered ascending so the largest bar is drawn last.
pub fn get_dealer_chart(dataset: &Dataset, limit: Option<usize>) -> Vec<GroupTotal> {
    let mut out = get_dealer_ranking(dataset, limit);
    out.sort_by(by_value_then_name(SortOrder::Ascending));
    out
}

/// Top consolidated tasks, largest first, at most [`TOP_TASKS`] rows.
pub fn get_top_tasks(dataset: &Dataset) -> Vec<GroupTotal> {
    let mut out = group_totals(dataset, Field::ConsolidatedTask, SortOrder::Descending);
    out.truncate(TOP_TASKS);
    out
}

// ---------------------------------------------------------------------------
// Monthly
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct MonthTotal {
    pub period: Period,
    pub total: f64,
    pub count: usize,
}

/// Cost per due-date month in calendar order. Undated records are left out.
pub fn get_monthly(dataset: &Dataset) -> Vec<MonthTotal> {
    let mut months: BTreeMap<Period, (f64, usize)> = BTreeMap::new();
    for r in &dataset.records {
        let Some(period) = r.period else { continue };
        let entry = months.entry(period).or_default();
        entry.0 += r.amount;
        entry.1 += 1;
    }
    months
        .into_iter()
        .map(|(period, (total, count))| MonthTotal {
            period,
            total,
            count,
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Suppliers
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct SupplierTotal {
    pub name: String,
    pub total: f64,
    /// Records carrying a document number.
    pub documents: usize,
}

/// Supplier ranking, largest total first.
pub fn get_suppliers(dataset: &Dataset) -> Vec<SupplierTotal> {
    if !dataset.has(Field::SupplierName) {
        return Vec::new();
    }
    let mut groups: BTreeMap<&str, (f64, usize)> = BTreeMap::new();
    for r in &dataset.records {
        let entry = groups
            .entry(r.supplier_name.as_deref().unwrap_or(UNASSIGNED))
            .or_default();
        entry.0 += r.amount;
        if r.document_number.is_some() {
            entry.1 += 1;
        }
    }
    let mut out: Vec<SupplierTotal> = groups
        .into_iter()
        .map(|(name, (total, documents))| SupplierTotal {
            name: name.to_string(),
            total,
            documents,
        })
        .collect();
    out.sort_by(|a, b| b.total.total_cmp(&a.total).then_with(|| a.name.cmp(&b.name)));
    out
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// Records newest due date first; undated records last, ties in source order.
pub fn get_records_by_due_date(dataset: &Dataset) -> Vec<&Record> {
    let mut rows: Vec<&Record> = dataset.records.iter().collect();
    rows.sort_by(|a, b| match (a.due_date, b.due_date) {
        (Some(x), Some(y)) => y.cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
    rows
}
