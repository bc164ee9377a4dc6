use std::io::Read;
use std::path::Path;

use arrow::util::display::{ArrayFormatter, FormatOptions};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::config::PipelineConfig;
use super::error::{PipelineError, Result};
use super::model::{ColumnMap, RawTable, Table};
use super::normalize::normalize;

// ---------------------------------------------------------------------------
// Sources
// ---------------------------------------------------------------------------

/// On-disk or in-memory encoding of the sales data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// Delimited text with one header row; the byte is the field delimiter.
    Delimited(u8),
    /// `[{ "Country": "UK", "Amount": "$5,320", ... }, ...]`
    Json,
    Parquet,
}

impl Format {
    /// Guess the format from a file extension.
    pub fn from_path(path: &Path) -> Result<Format> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();

        match ext.as_str() {
            "csv" | "txt" => Ok(Format::Delimited(b',')),
            "tsv" | "tab" => Ok(Format::Delimited(b'\t')),
            "json" => Ok(Format::Json),
            "parquet" | "pq" => Ok(Format::Parquet),
            other => Err(PipelineError::UnsupportedFormat(format!(".{other}"))),
        }
    }
}

/// Where a dataset comes from.
#[derive(Debug, Clone, Copy)]
pub enum Source<'a> {
    Path(&'a Path),
    Buffer { bytes: &'a [u8], format: Format },
}

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Read `source` into a [`RawTable`].
///
/// With `columns == None` the header row is matched against the built-in
/// presets; a source matching none of them fails with a schema error naming
/// the first column of the default preset it lacks.
pub fn load(source: Source<'_>, columns: Option<&ColumnMap>) -> Result<RawTable> {
    let (headers, rows) = match source {
        Source::Path(path) => match Format::from_path(path)? {
            Format::Delimited(delim) => read_delimited(std::fs::File::open(path)?, delim)?,
            Format::Json => read_json(&std::fs::read(path)?)?,
            Format::Parquet => read_parquet(std::fs::File::open(path)?)?,
        },
        Source::Buffer { bytes, format } => match format {
            Format::Delimited(delim) => read_delimited(bytes, delim)?,
            Format::Json => read_json(bytes)?,
            Format::Parquet => {
                return Err(PipelineError::UnsupportedFormat(
                    "parquet from an in-memory buffer".into(),
                ))
            }
        },
    };

    let trimmed: Vec<String> = headers.iter().map(|h| h.trim().to_string()).collect();
    let columns = match columns {
        Some(c) => c.clone(),
        None => ColumnMap::detect(&trimmed).unwrap_or_default(),
    };
    RawTable::new(trimmed, columns, rows)
}

/// Load and normalize in one step.
pub fn load_dataset(source: Source<'_>, config: &PipelineConfig) -> Result<Table> {
    let raw = load(source, config.columns.as_ref())?;
    normalize(&raw, config)
}

// ---------------------------------------------------------------------------
// Delimited text
// ---------------------------------------------------------------------------

type Cells = (Vec<String>, Vec<Vec<String>>);

fn read_delimited<R: Read>(input: R, delimiter: u8) -> Result<Cells> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_reader(input);

    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    if headers.iter().all(|h| h.trim().is_empty()) {
        return Err(PipelineError::Malformed("missing header row".into()));
    }

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result?;
        rows.push(record.iter().map(str::to_string).collect());
    }
    Ok((headers, rows))
}

// ---------------------------------------------------------------------------
// JSON (records-oriented, as written by `df.to_json(orient='records')`)
// ---------------------------------------------------------------------------

fn read_json(bytes: &[u8]) -> Result<Cells> {
    let root: JsonValue = serde_json::from_slice(bytes)?;
    let records = root
        .as_array()
        .ok_or_else(|| PipelineError::Malformed("expected top-level JSON array".into()))?;

    let mut headers: Vec<String> = Vec::new();
    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .ok_or_else(|| PipelineError::Malformed(format!("row {i} is not a JSON object")))?;
        for key in obj.keys() {
            if !headers.contains(key) {
                headers.push(key.clone());
            }
        }
    }

    let rows = records
        .iter()
        .filter_map(JsonValue::as_object)
        .map(|obj| {
            headers
                .iter()
                .map(|h| obj.get(h).map(json_to_cell).unwrap_or_default())
                .collect()
        })
        .collect();

    Ok((headers, rows))
}

fn json_to_cell(val: &JsonValue) -> String {
    match val {
        JsonValue::String(s) => s.clone(),
        JsonValue::Null => String::new(),
        other => other.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Parquet
// ---------------------------------------------------------------------------

/// Every column is rendered to text with Arrow's display formatter, so string,
/// integer, float and `Date32` columns all flow through the same normalizer.
fn read_parquet(file: std::fs::File) -> Result<Cells> {
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;
    let headers: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let reader = builder.build()?;

    let options = FormatOptions::default();
    let mut rows = Vec::new();
    for batch in reader {
        let batch = batch?;
        let formatters = batch
            .columns()
            .iter()
            .map(|col| ArrayFormatter::try_new(col.as_ref(), &options))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        for row in 0..batch.num_rows() {
            rows.push(
                formatters
                    .iter()
                    .map(|f| f.value(row).to_string())
                    .collect(),
            );
        }
    }
    Ok((headers, rows))
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "Sales Person,Country,Product,Date,Amount,Boxes Shipped\n\
        Jehu Rudeforth,UK,Mint Chip Choco,04/01/2022,\"$5,320 \",180\n\
        Van Tuxwell,India,85% Dark Bars,01/08/2022,\"$7,896 \",94\n";

    #[test]
    fn loads_csv_buffer_with_detected_columns() {
        let raw = load(
            Source::Buffer {
                bytes: CSV.as_bytes(),
                format: Format::Delimited(b','),
            },
            None,
        )
        .unwrap();
        assert_eq!(raw.columns, ColumnMap::amount_boxes());
        assert_eq!(raw.len(), 2);
        assert_eq!(raw.cell(0, crate::data::Field::Amount), "$5,320 ");
        assert_eq!(raw.cell(1, crate::data::Field::Country), "India");
    }

    #[test]
    fn missing_required_column_is_a_schema_error() {
        let csv = "Country,Product,Date,Boxes Shipped\nUK,Dark,01/01/2022,3\n";
        let err = load(
            Source::Buffer {
                bytes: csv.as_bytes(),
                format: Format::Delimited(b','),
            },
            None,
        )
        .unwrap_err();
        assert!(matches!(err, PipelineError::Schema { ref column, .. } if column == "Amount"));
    }

    #[test]
    fn tab_delimited_with_padded_headers() {
        let tsv = " Country \tProduct\tDate\tRevenue\tUnits Sold \nUS\tMilk\t06/01/2023\t200\t5\n";
        let raw = load(
            Source::Buffer {
                bytes: tsv.as_bytes(),
                format: Format::Delimited(b'\t'),
            },
            None,
        )
        .unwrap();
        assert_eq!(raw.columns, ColumnMap::revenue_units());
        assert_eq!(raw.headers[0], "Country");
        assert_eq!(raw.cell(0, crate::data::Field::Units), "5");
    }

    #[test]
    fn json_records_become_text_cells() {
        let json = r#"[
            {"Country": "US", "Product": "Dark", "Date": "05/01/2023", "Amount": 100.5, "Boxes Shipped": 10},
            {"Country": "UK", "Product": "Milk", "Date": "06/01/2023", "Amount": "$200", "Boxes Shipped": null}
        ]"#;
        let raw = load(
            Source::Buffer {
                bytes: json.as_bytes(),
                format: Format::Json,
            },
            None,
        )
        .unwrap();
        assert_eq!(raw.cell(0, crate::data::Field::Amount), "100.5");
        assert_eq!(raw.cell(0, crate::data::Field::Units), "10");
        assert_eq!(raw.cell(1, crate::data::Field::Units), "");
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let err = Format::from_path(Path::new("sales.xlsx")).unwrap_err();
        assert!(matches!(err, PipelineError::UnsupportedFormat(_)));
        assert_eq!(
            Format::from_path(Path::new("Sales.CSV")).unwrap(),
            Format::Delimited(b',')
        );
    }
}
