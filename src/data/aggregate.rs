use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::NaiveDate;
use serde::Serialize;

use super::error::{PipelineError, Result};
use super::filter::TableView;
use super::model::{Field, Record, YearMonth};

// ---------------------------------------------------------------------------
// Grouping and metrics
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupBy {
    /// One group holding every record.
    None,
    /// Country or product.
    Category(Field),
    Date,
    /// Dates truncated to their enclosing month.
    Month,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Metric {
    SumAmount,
    SumUnits,
    MeanAmount,
    Count,
    DistinctCount(Field),
}

/// Key of one output group. The derived ordering puts dates and months in
/// chronological order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum GroupKey {
    All,
    Category(String),
    Date(NaiveDate),
    Month(YearMonth),
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupKey::All => write!(f, "all"),
            GroupKey::Category(s) => write!(f, "{s}"),
            GroupKey::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            GroupKey::Month(m) => write!(f, "{m}"),
        }
    }
}

// ---------------------------------------------------------------------------
// AggregateResult
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateRow {
    pub key: GroupKey,
    /// One value per requested metric, in request order.
    pub values: Vec<f64>,
}

/// Ordered group → values mapping. Contains only groups with at least one
/// record; an empty input yields no rows at all.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateResult {
    /// Labels for the columns of every row's `values`.
    pub metrics: Vec<Metric>,
    pub rows: Vec<AggregateRow>,
}

impl AggregateResult {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Value of `metric` for `key`, if both exist in this result.
    pub fn get(&self, key: &GroupKey, metric: Metric) -> Option<f64> {
        let col = self.metrics.iter().position(|m| *m == metric)?;
        self.rows
            .iter()
            .find(|r| &r.key == key)
            .map(|r| r.values[col])
    }

    /// `(key, value)` pairs for one metric, in row order.
    pub fn series(&self, metric: Metric) -> Vec<(GroupKey, f64)> {
        let Some(col) = self.metrics.iter().position(|m| *m == metric) else {
            return Vec::new();
        };
        self.rows
            .iter()
            .map(|r| (r.key.clone(), r.values[col]))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

#[derive(Default)]
struct Accumulator<'a> {
    count: usize,
    amount: f64,
    // wide enough that no number of u64 counts can overflow
    units: u128,
    distinct: BTreeMap<Field, BTreeSet<DistinctValue<'a>>>,
}

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
enum DistinctValue<'a> {
    Text(&'a str),
    Date(NaiveDate),
    Bits(u64),
}

fn distinct_value(rec: &Record, field: Field) -> DistinctValue<'_> {
    match field {
        Field::Country => DistinctValue::Text(&rec.country),
        Field::Product => DistinctValue::Text(&rec.product),
        Field::Date => DistinctValue::Date(rec.date),
        // -0.0 and 0.0 count as one value
        Field::Amount => DistinctValue::Bits((rec.amount + 0.0).to_bits()),
        Field::Units => DistinctValue::Bits(rec.units),
    }
}

/// Reduce the records of `view` into one row per group.
///
/// Category and time keys come out sorted ascending, so repeated calls over
/// the same view yield identical key sequences.
pub fn aggregate(view: &TableView<'_>, group_by: GroupBy, metrics: &[Metric]) -> Result<AggregateResult> {
    if let GroupBy::Category(field) = group_by {
        if !field.is_categorical() {
            let columns = view.table().columns();
            return Err(PipelineError::unknown_column(
                columns.name(field),
                &[
                    columns.name(Field::Country).to_string(),
                    columns.name(Field::Product).to_string(),
                ],
            ));
        }
    }

    let distinct_fields: Vec<Field> = metrics
        .iter()
        .filter_map(|m| match m {
            Metric::DistinctCount(f) => Some(*f),
            _ => None,
        })
        .collect();

    let mut groups: BTreeMap<GroupKey, Accumulator<'_>> = BTreeMap::new();
    for rec in view.iter() {
        let key = match group_by {
            GroupBy::None => GroupKey::All,
            GroupBy::Category(field) => {
                GroupKey::Category(rec.category(field).unwrap_or_default().to_string())
            }
            GroupBy::Date => GroupKey::Date(rec.date),
            GroupBy::Month => GroupKey::Month(YearMonth::of(rec.date)),
        };
        let acc = groups.entry(key).or_default();
        acc.count += 1;
        acc.amount += rec.amount;
        acc.units += u128::from(rec.units);
        for &field in &distinct_fields {
            acc.distinct
                .entry(field)
                .or_default()
                .insert(distinct_value(rec, field));
        }
    }

    let rows = groups
        .into_iter()
        .map(|(key, acc)| AggregateRow {
            key,
            values: metrics
                .iter()
                .map(|m| match m {
                    Metric::SumAmount => acc.amount,
                    Metric::SumUnits => acc.units as f64,
                    Metric::MeanAmount => acc.amount / acc.count as f64,
                    Metric::Count => acc.count as f64,
                    Metric::DistinctCount(f) => {
                        acc.distinct.get(f).map_or(0, BTreeSet::len) as f64
                    }
                })
                .collect(),
        })
        .collect();

    Ok(AggregateResult {
        metrics: metrics.to_vec(),
        rows,
    })
}

// ---------------------------------------------------------------------------
// Histogram
// ---------------------------------------------------------------------------

/// One equal-width amount bucket, `[lower, upper)` except the last, which is
/// closed on both ends.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistogramBin {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

/// Bucket the amounts of `view` into `bins` equal-width bins over
/// `[min, max]`. All-equal amounts, or a spread too wide to represent as an
/// `f64`, produce a single bin; no records (or zero bins) produce none.
pub fn histogram(view: &TableView<'_>, bins: usize) -> Vec<HistogramBin> {
    let mut amounts = view.iter().map(|r| r.amount).peekable();
    if bins == 0 || amounts.peek().is_none() {
        return Vec::new();
    }
    let (min, max) = view
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), r| {
            (lo.min(r.amount), hi.max(r.amount))
        });

    let span = max - min;
    if !(span > 0.0 && span.is_finite()) {
        return vec![HistogramBin {
            lower: min,
            upper: max,
            count: view.len(),
        }];
    }

    let width = span / bins as f64;
    let mut out: Vec<HistogramBin> = (0..bins)
        .map(|i| HistogramBin {
            lower: min + width * i as f64,
            upper: if i + 1 == bins { max } else { min + width * (i + 1) as f64 },
            count: 0,
        })
        .collect();
    for amount in amounts {
        let idx = (((amount - min) / width) as usize).min(bins - 1);
        out[idx].count += 1;
    }
    out
}
