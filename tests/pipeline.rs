use std::sync::Arc;

use arrow::array::{Date32Array, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field as ArrowField, Schema};
use arrow::record_batch::RecordBatch;
use chrono::NaiveDate;
use parquet::arrow::ArrowWriter;

use choco_dash::data::{
    aggregate, filter, load_dataset, ColumnMap, DashboardSummary, Field, FilterCriteria, Format,
    GroupBy, GroupKey, Metric, PipelineConfig, PipelineError, RowErrorPolicy, Source, Table,
    TableView, YearMonth,
};

const THREE_SALES: &str = "Country,Product,Date,Amount,Boxes Shipped\n\
    US,Dark,05/01/2023,$100,10\n\
    US,Milk,06/01/2023,$200,5\n\
    UK,Dark,01/02/2023,$50,2\n";

fn csv_table(text: &str, config: &PipelineConfig) -> Result<Table, PipelineError> {
    load_dataset(
        Source::Buffer {
            bytes: text.as_bytes(),
            format: Format::Delimited(b','),
        },
        config,
    )
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn us_sales_by_month() {
    let table = csv_table(THREE_SALES, &PipelineConfig::default()).unwrap();
    let criteria = FilterCriteria::default().with_values("Country", ["US"]);
    let view = filter(&table, &criteria).unwrap();
    let monthly = aggregate(&view, GroupBy::Month, &[Metric::SumAmount]).unwrap();

    assert_eq!(
        monthly.series(Metric::SumAmount),
        vec![(GroupKey::Month(YearMonth::new(2023, 1)), 300.0)]
    );
}

#[test]
fn dates_are_read_day_first() {
    let table = csv_table(THREE_SALES, &PipelineConfig::default()).unwrap();
    assert_eq!(table.records()[0].date, date(2023, 1, 5));
    assert_eq!(table.date_span(), Some((date(2023, 1, 5), date(2023, 2, 1))));
}

#[test]
fn widgets_can_enumerate_choices() {
    let table = csv_table(THREE_SALES, &PipelineConfig::default()).unwrap();
    let countries: Vec<String> = table.unique_values(Field::Country).into_iter().collect();
    assert_eq!(countries, ["UK", "US"]);
    let products: Vec<String> = table.unique_values(Field::Product).into_iter().collect();
    assert_eq!(products, ["Dark", "Milk"]);
}

#[test]
fn filtered_rows_are_an_ordered_subset() {
    let table = csv_table(THREE_SALES, &PipelineConfig::default()).unwrap();
    let criteria = FilterCriteria::default()
        .with_values("Product", ["Dark"])
        .with_date_range(date(2023, 1, 1), date(2023, 12, 31));
    let view = filter(&table, &criteria).unwrap();

    let picked: Vec<_> = view.iter().cloned().collect();
    let expected: Vec<_> = table
        .records()
        .iter()
        .filter(|r| r.product == "Dark")
        .cloned()
        .collect();
    assert_eq!(picked, expected);
    assert!(view.indices().windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn full_selection_is_identity_and_empty_selection_is_empty() {
    let table = csv_table(THREE_SALES, &PipelineConfig::default()).unwrap();
    let all = filter(&table, &FilterCriteria::select_all(&table)).unwrap();
    assert_eq!(all.iter().cloned().collect::<Vec<_>>(), table.records());

    let none = FilterCriteria::select_all(&table).with_values("Country", Vec::<String>::new());
    assert!(filter(&table, &none).unwrap().is_empty());

    let reversed = FilterCriteria::default().with_date_range(date(2023, 2, 1), date(2023, 1, 1));
    assert!(filter(&table, &reversed).unwrap().is_empty());
}

#[test]
fn grouping_conserves_the_total() {
    let table = csv_table(THREE_SALES, &PipelineConfig::default()).unwrap();
    let view = TableView::all(&table);
    let total: f64 = table.records().iter().map(|r| r.amount).sum();
    let by_product = aggregate(&view, GroupBy::Category(Field::Product), &[Metric::SumAmount]).unwrap();
    let grouped: f64 = by_product.rows.iter().map(|r| r.values[0]).sum();
    assert_eq!(grouped, total);

    let summary = DashboardSummary::compute(&view).unwrap();
    assert_eq!(summary.kpis.total_amount, total);
    assert_eq!(summary.kpis.total_units, 17);
    assert_eq!(summary.kpis.distinct_countries, 2);
}

#[test]
fn revenue_units_variant_is_detected() {
    let text = "Country , Product,Date,Revenue,Units Sold\n\
        Canada,Milk Bars,\"31/12/2022\",\"$1,234.50\",\"1,200\"\n";
    let table = csv_table(text, &PipelineConfig::default()).unwrap();
    assert_eq!(table.columns(), &ColumnMap::revenue_units());
    let rec = &table.records()[0];
    assert_eq!(rec.amount, 1234.50);
    assert_eq!(rec.units, 1200);
    assert_eq!(rec.date, date(2022, 12, 31));

    let criteria = FilterCriteria::default().with_values("Country", ["Canada"]);
    assert_eq!(filter(&table, &criteria).unwrap().len(), 1);
}

#[test]
fn bad_rows_fail_fast_unless_skipped() {
    let text = format!("{THREE_SALES}UK,Milk,02/02/2023,lots,3\n");
    let err = csv_table(&text, &PipelineConfig::default()).unwrap_err();
    assert_eq!(err.row(), Some(3));
    assert!(err.to_string().contains("lots"));

    let cfg = PipelineConfig {
        row_errors: RowErrorPolicy::Skip,
        ..Default::default()
    };
    let table = csv_table(&text, &cfg).unwrap();
    assert_eq!(table.len(), 3);
    assert_eq!(table.skipped().len(), 1);
    assert_eq!(table.skipped()[0].row, 3);
}

#[test]
fn parquet_files_load_through_the_same_pipeline() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sales.parquet");

    let schema = Arc::new(Schema::new(vec![
        ArrowField::new("Country", DataType::Utf8, false),
        ArrowField::new("Product", DataType::Utf8, false),
        ArrowField::new("Date", DataType::Date32, false),
        ArrowField::new("Revenue", DataType::Float64, false),
        ArrowField::new("Units Sold", DataType::Int64, false),
    ]));
    // 19362 = 2023-01-05, 19394 = 2023-02-06
    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(StringArray::from(vec!["US", "UK"])),
            Arc::new(StringArray::from(vec!["Dark", "Milk"])),
            Arc::new(Date32Array::from(vec![19362, 19394])),
            Arc::new(Float64Array::from(vec![100.25, 50.0])),
            Arc::new(Int64Array::from(vec![10, 2])),
        ],
    )
    .unwrap();
    let file = std::fs::File::create(&path).unwrap();
    let mut writer = ArrowWriter::try_new(file, schema, None).unwrap();
    writer.write(&batch).unwrap();
    writer.close().unwrap();

    let table = load_dataset(Source::Path(&path), &PipelineConfig::default()).unwrap();
    assert_eq!(table.len(), 2);
    assert_eq!(table.records()[0].date, date(2023, 1, 5));
    assert_eq!(table.records()[0].amount, 100.25);
    assert_eq!(table.records()[1].units, 2);
}

#[test]
fn csv_file_missing_amount_is_a_schema_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sales.csv");
    std::fs::write(&path, "Country,Product,Date,Boxes Shipped\nUK,Dark,01/01/2023,4\n").unwrap();

    let err = load_dataset(Source::Path(&path), &PipelineConfig::default()).unwrap_err();
    assert!(matches!(err, PipelineError::Schema { ref column, .. } if column == "Amount"));
}
