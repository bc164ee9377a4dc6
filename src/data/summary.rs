use std::collections::BTreeSet;

use serde::Serialize;

use super::aggregate::{aggregate, histogram, GroupBy, GroupKey, HistogramBin, Metric};
use super::error::Result;
use super::filter::TableView;
use super::model::Field;

/// Number of histogram buckets on the dashboard.
pub const HISTOGRAM_BINS: usize = 20;

/// Headline numbers for the current selection.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Kpis {
    pub total_amount: f64,
    pub total_units: u128,
    pub distinct_countries: usize,
    pub records: usize,
}

impl Kpis {
    pub fn compute(view: &TableView<'_>) -> Self {
        let mut kpis = Kpis::default();
        let mut countries = BTreeSet::new();
        for rec in view.iter() {
            kpis.total_amount += rec.amount;
            kpis.total_units += u128::from(rec.units);
            countries.insert(rec.country.as_str());
        }
        kpis.distinct_countries = countries.len();
        kpis.records = view.len();
        kpis
    }
}

/// One dot on the units-vs-amount scatter plot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScatterPoint {
    pub units: u64,
    pub amount: f64,
    pub country: String,
    pub product: String,
}

pub fn scatter(view: &TableView<'_>) -> Vec<ScatterPoint> {
    view.iter()
        .map(|r| ScatterPoint {
            units: r.units,
            amount: r.amount,
            country: r.country.clone(),
            product: r.product.clone(),
        })
        .collect()
}

/// Everything the dashboard draws, recomputed on every selection change.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSummary {
    pub kpis: Kpis,
    pub by_country: Vec<(GroupKey, f64)>,
    pub by_product: Vec<(GroupKey, f64)>,
    pub daily: Vec<(GroupKey, f64)>,
    pub monthly: Vec<(GroupKey, f64)>,
    pub histogram: Vec<HistogramBin>,
    pub scatter: Vec<ScatterPoint>,
}

impl DashboardSummary {
    pub fn compute(view: &TableView<'_>) -> Result<Self> {
        let amount_by = |group_by| -> Result<Vec<(GroupKey, f64)>> {
            Ok(aggregate(view, group_by, &[Metric::SumAmount])?.series(Metric::SumAmount))
        };
        Ok(Self {
            kpis: Kpis::compute(view),
            by_country: amount_by(GroupBy::Category(Field::Country))?,
            by_product: amount_by(GroupBy::Category(Field::Product))?,
            daily: amount_by(GroupBy::Date)?,
            monthly: amount_by(GroupBy::Month)?,
            histogram: histogram(view, HISTOGRAM_BINS),
            scatter: scatter(view),
        })
    }
}
