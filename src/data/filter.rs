use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;

use super::error::{PipelineError, Result};
use super::model::{Field, Record, Table};

// ---------------------------------------------------------------------------
// Filter criteria: selected values per column plus a date window
// ---------------------------------------------------------------------------

/// User selections for one render.
///
/// `categories` maps a source column name to its selected values:
/// * column absent → no constraint
/// * column present with an empty set → nothing selected → every row fails
/// * otherwise the row's value must be in the set
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterCriteria {
    pub categories: BTreeMap<String, BTreeSet<String>>,
    /// Inclusive `[start, end]`. `start > end` selects nothing.
    pub date_range: Option<(NaiveDate, NaiveDate)>,
}

impl FilterCriteria {
    /// Criteria with every categorical value selected and the full date
    /// span, i.e. the initial state of the selection widgets.
    pub fn select_all(table: &Table) -> Self {
        let categories = Field::ALL
            .into_iter()
            .filter(|f| f.is_categorical())
            .map(|f| (table.columns().name(f).to_string(), table.unique_values(f)))
            .collect();
        Self {
            categories,
            date_range: table.date_span(),
        }
    }

    pub fn with_values<I, S>(mut self, column: &str, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.categories
            .insert(column.to_string(), values.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_date_range(mut self, start: NaiveDate, end: NaiveDate) -> Self {
        self.date_range = Some((start, end));
        self
    }
}

// ---------------------------------------------------------------------------
// TableView – the filtered rows, borrowed from the table
// ---------------------------------------------------------------------------

/// Rows of a [`Table`] that passed a filter, in source order.
#[derive(Debug, Clone)]
pub struct TableView<'a> {
    table: &'a Table,
    indices: Vec<usize>,
}

impl<'a> TableView<'a> {
    /// A view over every row.
    pub fn all(table: &'a Table) -> Self {
        Self {
            table,
            indices: (0..table.len()).collect(),
        }
    }

    pub fn table(&self) -> &'a Table {
        self.table
    }

    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a Record> + '_ {
        let records = self.table.records();
        self.indices.iter().map(move |&i| &records[i])
    }
}

// ---------------------------------------------------------------------------
// Filtering
// ---------------------------------------------------------------------------

/// Return the rows of `table` that pass every active criterion.
///
/// Fails only when `criteria` names a column the table does not have.
pub fn filter<'a>(table: &'a Table, criteria: &FilterCriteria) -> Result<TableView<'a>> {
    let mut active: Vec<(Field, &BTreeSet<String>)> = Vec::with_capacity(criteria.categories.len());
    for (col, selected) in &criteria.categories {
        let field = Field::resolve(col, table.columns())?;
        if !field.is_categorical() {
            return Err(PipelineError::unknown_column(
                col,
                &categorical_names(table),
            ));
        }
        active.push((field, selected));
    }

    let indices = table
        .records()
        .iter()
        .enumerate()
        .filter(|(_, rec)| {
            if let Some((start, end)) = criteria.date_range {
                if rec.date < start || rec.date > end {
                    return false;
                }
            }
            active.iter().all(|(field, selected)| {
                rec.category(*field)
                    .is_some_and(|val| selected.contains(val))
            })
        })
        .map(|(i, _)| i)
        .collect();

    Ok(TableView { table, indices })
}

fn categorical_names(table: &Table) -> Vec<String> {
    Field::ALL
        .into_iter()
        .filter(|f| f.is_categorical())
        .map(|f| table.columns().name(f).to_string())
        .collect()
}
