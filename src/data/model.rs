use std::collections::BTreeSet;
use std::fmt;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use super::error::{PipelineError, Result};

// ---------------------------------------------------------------------------
// ColumnMap – source header names for each logical field
// ---------------------------------------------------------------------------

/// Maps the logical fields of a sales record to header names in the source.
///
/// Both naming variants seen in the wild are available as presets; anything
/// else can be configured explicitly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMap {
    pub country: String,
    pub product: String,
    pub date: String,
    pub amount: String,
    pub units: String,
}

impl ColumnMap {
    /// `Country, Product, Date, Amount, Boxes Shipped`.
    pub fn amount_boxes() -> Self {
        Self {
            country: "Country".into(),
            product: "Product".into(),
            date: "Date".into(),
            amount: "Amount".into(),
            units: "Boxes Shipped".into(),
        }
    }

    /// `Country, Product, Date, Revenue, Units Sold`.
    pub fn revenue_units() -> Self {
        Self {
            country: "Country".into(),
            product: "Product".into(),
            date: "Date".into(),
            amount: "Revenue".into(),
            units: "Units Sold".into(),
        }
    }

    pub fn presets() -> [ColumnMap; 2] {
        [Self::amount_boxes(), Self::revenue_units()]
    }

    /// Pick the first preset whose columns all appear in `headers`.
    pub fn detect(headers: &[String]) -> Option<ColumnMap> {
        Self::presets().into_iter().find(|preset| {
            Field::ALL
                .iter()
                .all(|f| headers.iter().any(|h| h == preset.name(*f)))
        })
    }

    /// Header name configured for a field.
    pub fn name(&self, field: Field) -> &str {
        match field {
            Field::Country => &self.country,
            Field::Product => &self.product,
            Field::Date => &self.date,
            Field::Amount => &self.amount,
            Field::Units => &self.units,
        }
    }

    /// All configured header names, in field order.
    pub fn names(&self) -> Vec<String> {
        Field::ALL.iter().map(|f| self.name(*f).to_string()).collect()
    }
}

impl Default for ColumnMap {
    fn default() -> Self {
        Self::amount_boxes()
    }
}

// ---------------------------------------------------------------------------
// Field – logical record attribute
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Field {
    Country,
    Product,
    Date,
    Amount,
    Units,
}

impl Field {
    pub const ALL: [Field; 5] = [
        Field::Country,
        Field::Product,
        Field::Date,
        Field::Amount,
        Field::Units,
    ];

    /// Resolve a source column name to a field through `columns`.
    pub fn resolve(name: &str, columns: &ColumnMap) -> Result<Field> {
        let name = name.trim();
        Field::ALL
            .into_iter()
            .find(|f| columns.name(*f) == name)
            .ok_or_else(|| PipelineError::unknown_column(name, &columns.names()))
    }

    /// Whether the field holds free-text categories (country, product).
    pub fn is_categorical(self) -> bool {
        matches!(self, Field::Country | Field::Product)
    }
}

// ---------------------------------------------------------------------------
// Record – one sales transaction
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub country: String,
    pub product: String,
    pub date: NaiveDate,
    pub amount: f64,
    pub units: u64,
}

impl Record {
    /// Text value of a categorical field; `None` for numeric/date fields.
    pub fn category(&self, field: Field) -> Option<&str> {
        match field {
            Field::Country => Some(&self.country),
            Field::Product => Some(&self.product),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// YearMonth – monthly bucket key
// ---------------------------------------------------------------------------

/// Calendar month, ordered chronologically and displayed as `YYYY-MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Self {
        Self { year, month }
    }

    /// The month enclosing `date`.
    pub fn of(date: NaiveDate) -> Self {
        Self::new(date.year(), date.month())
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

// ---------------------------------------------------------------------------
// RawTable – loader output, all cells still text
// ---------------------------------------------------------------------------

/// Loaded but not yet type-coerced data.
///
/// `positions` holds the index of each logical field inside a row, in
/// [`Field::ALL`] order.
#[derive(Debug, Clone, PartialEq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub columns: ColumnMap,
    pub positions: [usize; 5],
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    /// Build a raw table, checking that every field of `columns` is present.
    ///
    /// Header names are trimmed; when a name repeats the first occurrence wins.
    pub fn new(headers: Vec<String>, columns: ColumnMap, rows: Vec<Vec<String>>) -> Result<Self> {
        let headers: Vec<String> = headers.iter().map(|h| h.trim().to_string()).collect();
        let mut positions = [0usize; 5];
        for (slot, field) in positions.iter_mut().zip(Field::ALL) {
            let wanted = columns.name(field);
            *slot = headers
                .iter()
                .position(|h| h == wanted)
                .ok_or_else(|| PipelineError::unknown_column(wanted, &headers))?;
        }
        Ok(Self {
            headers,
            columns,
            positions,
            rows,
        })
    }

    /// Cell for `field` in row `row`; short rows read as empty.
    pub fn cell(&self, row: usize, field: Field) -> &str {
        let idx = self.positions[field as usize];
        self.rows
            .get(row)
            .and_then(|r| r.get(idx))
            .map(String::as_str)
            .unwrap_or("")
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Table – the normalized, immutable dataset
// ---------------------------------------------------------------------------

/// Typed sales records. Never mutated after normalization; share it behind
/// an `Arc` and derive views with [`crate::data::filter::filter`].
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    columns: ColumnMap,
    records: Vec<Record>,
    skipped: Vec<SkippedRow>,
}

/// A row dropped under [`crate::data::RowErrorPolicy::Skip`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRow {
    pub row: usize,
    pub message: String,
}

impl Table {
    pub fn new(columns: ColumnMap, records: Vec<Record>, skipped: Vec<SkippedRow>) -> Self {
        Self {
            columns,
            records,
            skipped,
        }
    }

    pub fn columns(&self) -> &ColumnMap {
        &self.columns
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn skipped(&self) -> &[SkippedRow] {
        &self.skipped
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Sorted distinct values of a categorical column, for selection widgets.
    pub fn unique_values(&self, field: Field) -> BTreeSet<String> {
        self.records
            .iter()
            .filter_map(|r| r.category(field))
            .map(str::to_string)
            .collect()
    }

    /// Earliest and latest record date, or `None` for an empty table.
    pub fn date_span(&self) -> Option<(NaiveDate, NaiveDate)> {
        let first = self.records.first()?.date;
        Some(self.records.iter().fold((first, first), |(lo, hi), r| {
            (lo.min(r.date), hi.max(r.date))
        }))
    }

    /// Render back to text cells. Feeding the result to
    /// [`crate::data::normalize::normalize`] reproduces this table.
    pub fn to_raw(&self) -> RawTable {
        let rows = self
            .records
            .iter()
            .map(|r| {
                vec![
                    r.country.clone(),
                    r.product.clone(),
                    r.date.format("%d/%m/%Y").to_string(),
                    r.amount.to_string(),
                    r.units.to_string(),
                ]
            })
            .collect();
        RawTable {
            headers: self.columns.names(),
            columns: self.columns.clone(),
            positions: [0, 1, 2, 3, 4],
            rows,
        }
    }
}
