//! Data layer: loading, normalization, filtering and aggregation.
//!
//! Architecture:
//! ```text
//!  .csv / .tsv / .json / .parquet
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  loader   │  read cells, match headers → RawTable
//!   └──────────┘
//!        │
//!        ▼
//!   ┌───────────┐
//!   │ normalize  │  dates, currency, counts → Table (cached by path)
//!   └───────────┘
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  filter   │  country / product sets, date window → TableView
//!   └──────────┘
//!        │
//!        ▼
//!   ┌───────────┐
//!   │ aggregate  │  group + reduce → AggregateResult, DashboardSummary
//!   └───────────┘
//! ```

pub mod aggregate;
pub mod cache;
pub mod config;
pub mod error;
pub mod filter;
pub mod loader;
pub mod model;
pub mod normalize;
pub mod summary;

pub use aggregate::{aggregate, histogram, AggregateResult, AggregateRow, GroupBy, GroupKey, HistogramBin, Metric};
pub use cache::{DatasetCache, Lookup, SourceSignature};
pub use config::{NegativeAmounts, PipelineConfig, RowErrorPolicy};
pub use error::{PipelineError, Result};
pub use filter::{filter, FilterCriteria, TableView};
pub use loader::{load, load_dataset, Format, Source};
pub use model::{ColumnMap, Field, RawTable, Record, SkippedRow, Table, YearMonth};
pub use normalize::normalize;
pub use summary::{scatter, DashboardSummary, Kpis, ScatterPoint};
