use std::collections::BTreeSet;

use chrono::NaiveDate;

use crate::models::{Dataset, Field, Record};
use crate::reports::UNASSIGNED;

/// Multi-select state for one text column.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Selection {
    /// Every record passes, including those with no value in the column.
    #[default]
    All,
    /// Only records whose value is in the set; a blank value matches
    /// [`UNASSIGNED`]. An empty set admits nothing.
    Only(BTreeSet<String>),
}

impl Selection {
    pub fn only<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Only(values.into_iter().map(Into::into).collect())
    }

    pub fn none() -> Self {
        Self::Only(BTreeSet::new())
    }

    pub fn admits(&self, value: Option<&str>) -> bool {
        match self {
            Self::All => true,
            Self::Only(set) => set.contains(value.unwrap_or(UNASSIGNED)),
        }
    }

    pub fn is_selected(&self, value: &str) -> bool {
        self.admits(Some(value))
    }

    /// Flip one value. `universe` is the full option list, used to expand
    /// `All` into an explicit set on the first toggle.
    pub fn toggle(&mut self, value: &str, universe: &[String]) {
        let mut set = match std::mem::take(self) {
            Self::All => universe.iter().cloned().collect(),
            Self::Only(set) => set,
        };
        if !set.remove(value) {
            set.insert(value.to_string());
        }
        *self = if !universe.is_empty() && universe.iter().all(|u| set.contains(u)) {
            Self::All
        } else {
            Self::Only(set)
        };
    }

    /// Count of selected options out of `universe`, for picker titles.
    pub fn selected_count(&self, universe: &[String]) -> usize {
        match self {
            Self::All => universe.len(),
            Self::Only(set) => universe.iter().filter(|u| set.contains(*u)).count(),
        }
    }
}

/// The user's predicate set. Lives in the session and is passed explicitly to
/// [`apply`]; nothing here is global.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FilterSet {
    /// Inclusive due-date bounds.
    pub date_range: Option<(NaiveDate, NaiveDate)>,
    pub year: Option<i32>,
    pub dealers: Selection,
    pub categories: Selection,
    pub document_types: Selection,
    pub task_names: Selection,
    pub consolidated_tasks: Selection,
}

impl FilterSet {
    /// Multi-select columns and their selections, in display order.
    pub fn selections(&self) -> [(Field, &Selection); 5] {
        [
            (Field::DealerCategory, &self.dealers),
            (Field::Category, &self.categories),
            (Field::DocumentType, &self.document_types),
            (Field::TaskName, &self.task_names),
            (Field::ConsolidatedTask, &self.consolidated_tasks),
        ]
    }

    pub fn selection_mut(&mut self, field: Field) -> Option<&mut Selection> {
        match field {
            Field::DealerCategory => Some(&mut self.dealers),
            Field::Category => Some(&mut self.categories),
            Field::DocumentType => Some(&mut self.document_types),
            Field::TaskName => Some(&mut self.task_names),
            Field::ConsolidatedTask => Some(&mut self.consolidated_tasks),
            _ => None,
        }
    }

    pub fn selection(&self, field: Field) -> Option<&Selection> {
        self.selections()
            .into_iter()
            .find(|(f, _)| *f == field)
            .map(|(_, s)| s)
    }

    /// The active date range for display, with open bounds
    /// (`NaiveDate::MIN`/`MAX`) and an unset range shown as the data's span.
    pub fn effective_range(&self, options: &FilterOptions) -> (NaiveDate, NaiveDate) {
        let (start, end) = self
            .date_range
            .unwrap_or((options.min_date, options.max_date));
        let start = if start == NaiveDate::MIN { options.min_date } else { start };
        let end = if end == NaiveDate::MAX { options.max_date } else { end };
        (start, end)
    }
}

// ---------------------------------------------------------------------------
// Masks
// ---------------------------------------------------------------------------

fn column_mask(dataset: &Dataset, keep: impl Fn(&Record) -> bool) -> Vec<bool> {
    dataset.records.iter().map(keep).collect()
}

/// One boolean mask per active predicate. Predicates whose column is missing
/// from the dataset are skipped.
pub fn masks(dataset: &Dataset, filters: &FilterSet) -> Vec<Vec<bool>> {
    let mut out = Vec::new();
    if dataset.is_empty() {
        return out;
    }

    if dataset.has(Field::DueDate) {
        if let Some((start, end)) = filters.date_range {
            out.push(column_mask(dataset, |r| {
                r.due_date.is_some_and(|d| d >= start && d <= end)
            }));
        }
        if let Some(year) = filters.year {
            out.push(column_mask(dataset, |r| {
                r.period.is_some_and(|p| p.year == year)
            }));
        }
    }

    for (field, selection) in filters.selections() {
        if matches!(selection, Selection::All) || !dataset.has(field) {
            continue;
        }
        out.push(column_mask(dataset, |r| selection.admits(r.text(field))));
    }
    out
}

/// Apply the predicate set, returning the matching records in source order.
pub fn apply(dataset: &Dataset, filters: &FilterSet) -> Dataset {
    let masks = masks(dataset, filters);
    let records = dataset
        .records
        .iter()
        .enumerate()
        .filter(|(i, _)| masks.iter().all(|m| m[*i]))
        .map(|(_, r)| r.clone())
        .collect();
    Dataset::new(records, dataset.columns.clone())
}

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// What the filter widgets can offer for a dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterOptions {
    pub min_date: NaiveDate,
    pub max_date: NaiveDate,
    /// Most recent first.
    pub years: Vec<i32>,
    pub dealers: Vec<String>,
    pub categories: Vec<String>,
    pub document_types: Vec<String>,
    pub task_names: Vec<String>,
    pub consolidated_tasks: Vec<String>,
}

/// Sorted values of a column. Blank cells are offered as [`UNASSIGNED`].
fn distinct(dataset: &Dataset, field: Field) -> Vec<String> {
    if !dataset.has(field) {
        return Vec::new();
    }
    dataset
        .records
        .iter()
        .map(|r| r.text(field).unwrap_or(UNASSIGNED).to_string())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

impl FilterOptions {
    pub fn from_dataset(dataset: &Dataset, today: NaiveDate) -> Self {
        let dates: Vec<NaiveDate> = dataset.records.iter().filter_map(|r| r.due_date).collect();
        let (min_date, max_date) = match (dates.iter().min(), dates.iter().max()) {
            (Some(min), Some(max)) => (*min, *max),
            _ => (
                NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or(today),
                today,
            ),
        };
        let years: BTreeSet<i32> = dataset
            .records
            .iter()
            .filter_map(|r| r.period.map(|p| p.year))
            .collect();

        Self {
            min_date,
            max_date,
            years: years.into_iter().rev().collect(),
            dealers: distinct(dataset, Field::DealerCategory),
            categories: distinct(dataset, Field::Category),
            document_types: distinct(dataset, Field::DocumentType),
            task_names: distinct(dataset, Field::TaskName),
            consolidated_tasks: distinct(dataset, Field::ConsolidatedTask),
        }
    }

    pub fn values(&self, field: Field) -> &[String] {
        match field {
            Field::DealerCategory => &self.dealers,
            Field::Category => &self.categories,
            Field::DocumentType => &self.document_types,
            Field::TaskName => &self.task_names,
            Field::ConsolidatedTask => &self.consolidated_tasks,
            _ => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Period;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn record(due: NaiveDate, amount: f64, dealer: &str, doc_type: &str) -> Record {
        Record {
            due_date: Some(due),
            period: Some(Period::of(due)),
            amount,
            dealer_category: Some(dealer.to_string()),
            document_type: Some(doc_type.to_string()),
            ..Record::default()
        }
    }

    fn sample() -> Dataset {
        let records = vec![
            record(date(2023, 1, 10), 100.0, "Dealer A", "NF"),
            record(date(2023, 2, 15), 200.0, "Dealer B", "BOLETO"),
            record(date(2024, 1, 5), 50.0, "Dealer A", "NF"),
        ];
        let columns = [Field::DueDate, Field::Amount, Field::DealerCategory, Field::DocumentType]
            .into_iter()
            .collect();
        Dataset::new(records, columns)
    }

    #[test]
    fn test_year_filter() {
        let ds = sample();
        let filters = FilterSet {
            year: Some(2023),
            ..FilterSet::default()
        };
        assert_eq!(apply(&ds, &filters).total(), 300.0);
    }

    #[test]
    fn test_date_range_is_inclusive() {
        let ds = sample();
        let filters = FilterSet {
            date_range: Some((date(2023, 2, 1), date(2023, 2, 15))),
            ..FilterSet::default()
        };
        let out = apply(&ds, &filters);
        assert_eq!(out.len(), 1);
        assert_eq!(out.total(), 200.0);
    }

    #[test]
    fn test_inverted_range_yields_nothing() {
        let ds = sample();
        let filters = FilterSet {
            date_range: Some((date(2024, 1, 1), date(2023, 1, 1))),
            ..FilterSet::default()
        };
        assert!(apply(&ds, &filters).is_empty());
    }

    #[test]
    fn test_identity_with_full_range_and_all_selected() {
        let ds = sample();
        let options = FilterOptions::from_dataset(&ds, date(2025, 6, 1));
        let filters = FilterSet {
            date_range: Some((options.min_date, options.max_date)),
            dealers: Selection::only(options.dealers.clone()),
            document_types: Selection::only(options.document_types.clone()),
            ..FilterSet::default()
        };
        assert_eq!(apply(&ds, &filters), ds);
        assert_eq!(apply(&ds, &FilterSet::default()), ds);
    }

    #[test]
    fn test_open_bounds_filter_and_display() {
        let ds = sample();
        let options = FilterOptions::from_dataset(&ds, date(2025, 6, 1));
        let before_data = FilterSet {
            date_range: Some((NaiveDate::MIN, date(2022, 12, 31))),
            ..FilterSet::default()
        };
        assert!(apply(&ds, &before_data).is_empty());

        let from_feb = FilterSet {
            date_range: Some((date(2023, 2, 1), NaiveDate::MAX)),
            ..FilterSet::default()
        };
        assert_eq!(apply(&ds, &from_feb).total(), 250.0);
        assert_eq!(from_feb.effective_range(&options), (date(2023, 2, 1), date(2024, 1, 5)));
    }

    #[test]
    fn test_result_is_ordered_subsequence() {
        let ds = sample();
        let filters = FilterSet {
            dealers: Selection::only(["Dealer A"]),
            ..FilterSet::default()
        };
        let out = apply(&ds, &filters);
        assert_eq!(out.records, vec![ds.records[0].clone(), ds.records[2].clone()]);
    }

    #[test]
    fn test_predicates_combine_with_and() {
        let ds = sample();
        let filters = FilterSet {
            dealers: Selection::only(["Dealer A"]),
            year: Some(2024),
            ..FilterSet::default()
        };
        let out = apply(&ds, &filters);
        assert_eq!(out.total(), 50.0);
    }

    #[test]
    fn test_empty_selection_excludes_all() {
        let ds = sample();
        let filters = FilterSet {
            document_types: Selection::none(),
            ..FilterSet::default()
        };
        assert!(apply(&ds, &filters).is_empty());
    }

    #[test]
    fn test_absent_column_skips_predicate() {
        let ds = sample();
        let filters = FilterSet {
            task_names: Selection::none(),
            categories: Selection::only(["SINISTRO"]),
            ..FilterSet::default()
        };
        assert_eq!(apply(&ds, &filters).len(), 3);
    }

    #[test]
    fn test_blank_value_is_selectable_as_unassigned() {
        let mut ds = sample();
        ds.records[1].dealer_category = None;
        assert_eq!(apply(&ds, &FilterSet::default()).len(), 3);

        let named = apply(
            &ds,
            &FilterSet {
                dealers: Selection::only(["Dealer A", "Dealer B"]),
                ..FilterSet::default()
            },
        );
        assert_eq!(named.len(), 2);

        let blank = apply(
            &ds,
            &FilterSet {
                dealers: Selection::only([UNASSIGNED]),
                ..FilterSet::default()
            },
        );
        assert_eq!(blank.records, vec![ds.records[1].clone()]);
    }

    #[test]
    fn test_identity_holds_with_blank_values() {
        let mut ds = sample();
        ds.records[0].dealer_category = None;
        let options = FilterOptions::from_dataset(&ds, date(2025, 6, 1));
        assert_eq!(options.dealers, vec![UNASSIGNED, "Dealer A", "Dealer B"]);

        let filters = FilterSet {
            date_range: Some((options.min_date, options.max_date)),
            dealers: Selection::only(options.dealers.clone()),
            ..FilterSet::default()
        };
        assert_eq!(apply(&ds, &filters), ds);

        // Toggling a value off and on again restores the full set.
        let mut dealers = Selection::All;
        dealers.toggle(UNASSIGNED, &options.dealers);
        assert_eq!(apply(&ds, &FilterSet { dealers: dealers.clone(), ..FilterSet::default() }).len(), 2);
        dealers.toggle(UNASSIGNED, &options.dealers);
        assert_eq!(dealers, Selection::All);
    }

    #[test]
    fn test_apply_does_not_mutate_source() {
        let ds = sample();
        let before = ds.clone();
        let _ = apply(
            &ds,
            &FilterSet {
                year: Some(1999),
                ..FilterSet::default()
            },
        );
        assert_eq!(ds, before);
    }

    #[test]
    fn test_toggle_expands_and_collapses_all() {
        let universe = vec!["A".to_string(), "B".to_string()];
        let mut s = Selection::All;
        s.toggle("A", &universe);
        assert_eq!(s, Selection::only(["B"]));
        assert_eq!(s.selected_count(&universe), 1);
        s.toggle("A", &universe);
        assert_eq!(s, Selection::All);
    }

    #[test]
    fn test_options_from_dataset() {
        let ds = sample();
        let options = FilterOptions::from_dataset(&ds, date(2025, 6, 1));
        assert_eq!(options.min_date, date(2023, 1, 10));
        assert_eq!(options.max_date, date(2024, 1, 5));
        assert_eq!(options.years, vec![2024, 2023]);
        assert_eq!(options.dealers, vec!["Dealer A", "Dealer B"]);
        assert_eq!(options.document_types, vec!["BOLETO", "NF"]);
        assert!(options.task_names.is_empty());
    }

    #[test]
    fn test_options_fallback_range_when_empty() {
        let options = FilterOptions::from_dataset(&Dataset::default(), date(2025, 6, 1));
        assert_eq!(options.min_date, date(2024, 1, 1));
        assert_eq!(options.max_date, date(2025, 6, 1));
        assert!(options.years.is_empty());
    }
}
