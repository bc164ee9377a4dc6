use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{Date32Array, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use chrono::{Datelike, Duration, NaiveDate};
use parquet::arrow::ArrowWriter;

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    fn pick<'a>(&mut self, items: &[&'a str]) -> &'a str {
        items[(self.next_u64() % items.len() as u64) as usize]
    }
}

struct Sale {
    person: &'static str,
    country: &'static str,
    product: &'static str,
    date: NaiveDate,
    amount: f64,
    boxes: i64,
}

/// `5320.0` → `$5,320 `, the way the source spreadsheet exports amounts.
fn dollars(amount: f64) -> String {
    let whole = amount.round() as u64;
    let digits = whole.to_string();
    let mut out = String::from("$");
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out.push(' ');
    out
}

fn main() -> Result<()> {
    env_logger::init();
    let mut rng = SimpleRng::new(42);

    let people = ["Jehu Rudeforth", "Van Tuxwell", "Gigi Bohling", "Jan Morforth", "Oby Sorrel"];
    let countries = ["UK", "India", "Australia", "New Zealand", "USA", "Canada"];
    let products = [
        "Mint Chip Choco",
        "85% Dark Bars",
        "Peanut Butter Cubes",
        "Smooth Sliky Salty",
        "99% Dark & Pure",
        "Milk Bars",
    ];

    let start = NaiveDate::from_ymd_opt(2022, 1, 3).context("invalid start date")?;
    let sales: Vec<Sale> = (0..1094)
        .map(|_| {
            let boxes = 1 + (rng.next_u64() % 400) as i64;
            let price = 5.0 + rng.next_f64() * 30.0;
            Sale {
                person: rng.pick(&people),
                country: rng.pick(&countries),
                product: rng.pick(&products),
                date: start + Duration::days((rng.next_u64() % 240) as i64),
                amount: (boxes as f64 * price).round(),
                boxes,
            }
        })
        .collect();

    // CSV, in the day-first / dollar-formatted layout of the original export
    let csv_path = "Chocolatesales.csv";
    let mut writer = csv::Writer::from_path(csv_path).context("creating CSV")?;
    writer.write_record(["Sales Person", "Country", "Product", "Date", "Amount", "Boxes Shipped"])?;
    for s in &sales {
        writer.write_record([
            s.person.to_string(),
            s.country.to_string(),
            s.product.to_string(),
            s.date.format("%d/%m/%Y").to_string(),
            dollars(s.amount),
            s.boxes.to_string(),
        ])?;
    }
    writer.flush().context("flushing CSV")?;

    // Parquet, with typed columns and the Revenue / Units Sold naming
    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).context("invalid epoch")?;
    let schema = Arc::new(Schema::new(vec![
        Field::new("Country", DataType::Utf8, false),
        Field::new("Product", DataType::Utf8, false),
        Field::new("Date", DataType::Date32, false),
        Field::new("Revenue", DataType::Float64, false),
        Field::new("Units Sold", DataType::Int64, false),
    ]));
    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(StringArray::from_iter_values(sales.iter().map(|s| s.country))),
            Arc::new(StringArray::from_iter_values(sales.iter().map(|s| s.product))),
            Arc::new(Date32Array::from_iter_values(
                sales
                    .iter()
                    .map(|s| s.date.num_days_from_ce() - epoch.num_days_from_ce()),
            )),
            Arc::new(Float64Array::from_iter_values(sales.iter().map(|s| s.amount))),
            Arc::new(Int64Array::from_iter_values(sales.iter().map(|s| s.boxes))),
        ],
    )
    .context("building record batch")?;

    let parquet_path = "Chocolatesales.parquet";
    let file = std::fs::File::create(parquet_path).context("creating parquet file")?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
    writer.write(&batch).context("writing record batch")?;
    writer.close().context("closing parquet writer")?;

    log::info!("Wrote {} sales to {csv_path} and {parquet_path}", sales.len());
    println!("Wrote {} sales to {csv_path} and {parquet_path}", sales.len());
    Ok(())
}
