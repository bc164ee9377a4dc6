use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use choco_dash::data::{
    filter, DashboardSummary, DatasetCache, Field, FilterCriteria, PipelineConfig, Table,
};

use crate::color::ColorMap;

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
#[derive(Default)]
pub struct AppState {
    /// Loaded tables, reused until the file changes on disk.
    pub cache: DatasetCache,

    pub config: PipelineConfig,

    /// File the current dataset came from.
    pub source: Option<PathBuf>,

    /// Loaded dataset (None until user loads a file).
    pub dataset: Option<Arc<Table>>,

    /// Current country / product / date selections.
    pub criteria: FilterCriteria,

    /// Charts and KPIs for the current selection.
    pub summary: Option<DashboardSummary>,

    /// Country colours, shared by every chart.
    pub color_map: Option<ColorMap>,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl AppState {
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    /// Load (or fetch from cache) the file at `path` and make it current.
    pub fn open(&mut self, path: &Path) -> Result<()> {
        let lookup = self
            .cache
            .get_or_load(path, &self.config)
            .with_context(|| format!("loading {}", path.display()))?;

        if lookup.loaded {
            log::info!(
                "Loaded {} records from {}",
                lookup.table.len(),
                path.display()
            );
        } else {
            log::debug!("Using cached table for {}", path.display());
        }
        for skipped in lookup.table.skipped() {
            log::warn!("Skipped row {}: {}", skipped.row, skipped.message);
        }

        self.source = Some(path.to_path_buf());
        self.set_dataset(lookup.table);
        Ok(())
    }

    /// Re-run [`AppState::open`] on the current source; picks up edits.
    pub fn reload(&mut self) -> Result<()> {
        let path = self.source.clone().context("no file loaded")?;
        self.open(&path)
    }

    /// Ingest a newly loaded dataset, select everything, rebuild colours.
    pub fn set_dataset(&mut self, dataset: Arc<Table>) {
        self.criteria = FilterCriteria::select_all(&dataset);
        self.color_map = Some(ColorMap::new(&dataset.unique_values(Field::Country)));
        self.status_message = match dataset.skipped().len() {
            0 => None,
            n => Some(format!("{n} rows skipped while loading")),
        };
        self.dataset = Some(dataset);
        self.refilter();
    }

    /// Recompute the summary for the current selection.
    pub fn refilter(&mut self) {
        let Some(ds) = &self.dataset else {
            self.summary = None;
            return;
        };
        let result = filter(ds, &self.criteria).and_then(|view| DashboardSummary::compute(&view));
        match result {
            Ok(summary) => self.summary = Some(summary),
            Err(e) => {
                log::error!("Failed to summarise selection: {e}");
                self.status_message = Some(format!("Error: {e}"));
                self.summary = None;
            }
        }
    }

    /// Source column name used for `field` in the current dataset.
    pub fn column_name(&self, field: Field) -> Option<String> {
        self.dataset
            .as_ref()
            .map(|ds| ds.columns().name(field).to_string())
    }

    /// Toggle a single value in a column's selection.
    pub fn toggle_value(&mut self, field: Field, value: &str) {
        let Some(column) = self.column_name(field) else {
            return;
        };
        let selected = self.criteria.categories.entry(column).or_default();
        if !selected.remove(value) {
            selected.insert(value.to_string());
        }
        self.refilter();
    }

    /// Select all values in a column.
    pub fn select_all(&mut self, field: Field) {
        if let (Some(ds), Some(column)) = (&self.dataset, self.column_name(field)) {
            self.criteria
                .categories
                .insert(column, ds.unique_values(field));
            self.refilter();
        }
    }

    /// Deselect all values in a column.
    pub fn select_none(&mut self, field: Field) {
        if let Some(column) = self.column_name(field) {
            self.criteria.categories.insert(column, BTreeSet::new());
            self.refilter();
        }
    }

    pub fn set_date_range(&mut self, start: NaiveDate, end: NaiveDate) {
        self.criteria.date_range = Some((start, end));
        self.refilter();
    }
}
