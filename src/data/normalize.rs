use chrono::NaiveDate;

use super::config::{NegativeAmounts, PipelineConfig, RowErrorPolicy};
use super::error::{PipelineError, Result};
use super::model::{Field, RawTable, Record, SkippedRow, Table};

// ---------------------------------------------------------------------------
// Table-level entry-point
// ---------------------------------------------------------------------------

/// Type-coerce every row of `raw` into a [`Table`].
///
/// Under [`RowErrorPolicy::FailFast`] the first bad cell aborts; under
/// [`RowErrorPolicy::Skip`] the row is dropped and listed in
/// [`Table::skipped`].
pub fn normalize(raw: &RawTable, config: &PipelineConfig) -> Result<Table> {
    let mut records = Vec::with_capacity(raw.len());
    let mut skipped = Vec::new();

    for row in 0..raw.len() {
        match normalize_row(raw, row, config.negative_amounts) {
            Ok(record) => records.push(record),
            Err(e) => match config.row_errors {
                RowErrorPolicy::FailFast => return Err(e),
                RowErrorPolicy::Skip => skipped.push(SkippedRow {
                    row,
                    message: e.to_string(),
                }),
            },
        }
    }

    Ok(Table::new(raw.columns.clone(), records, skipped))
}

fn normalize_row(raw: &RawTable, row: usize, negatives: NegativeAmounts) -> Result<Record> {
    let column = |field: Field| raw.columns.name(field).to_string();

    let date_cell = raw.cell(row, Field::Date);
    let date = parse_day_first_date(date_cell).ok_or_else(|| PipelineError::DateParse {
        row,
        column: column(Field::Date),
        value: date_cell.to_string(),
    })?;

    let amount_cell = raw.cell(row, Field::Amount);
    let amount = parse_amount(amount_cell).map_err(|reason| PipelineError::AmountParse {
        row,
        column: column(Field::Amount),
        value: amount_cell.to_string(),
        reason,
    })?;
    if amount < 0.0 && negatives == NegativeAmounts::Reject {
        return Err(PipelineError::AmountParse {
            row,
            column: column(Field::Amount),
            value: amount_cell.to_string(),
            reason: "negative amounts are rejected",
        });
    }

    let units_cell = raw.cell(row, Field::Units);
    let units = parse_count(units_cell).ok_or_else(|| PipelineError::CountParse {
        row,
        column: column(Field::Units),
        value: units_cell.to_string(),
    })?;

    Ok(Record {
        country: raw.cell(row, Field::Country).trim().to_string(),
        product: raw.cell(row, Field::Product).trim().to_string(),
        date,
        amount,
        units,
    })
}

// ---------------------------------------------------------------------------
// Cell parsers
// ---------------------------------------------------------------------------

/// Parse a day-first date such as `31/01/2023`, `31-01-2023`, `31.01.23`.
///
/// A four-digit leading component is read as ISO `YYYY-MM-DD`, which is not
/// ambiguous. A trailing time (`05/01/2023 00:00:00`, `2023-01-05T10:00`) is
/// ignored. Month-first input is never guessed.
pub fn parse_day_first_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    let date_part = s.split([' ', 'T']).next().unwrap_or(s);

    let parts: Vec<&str> = date_part.split(['/', '-', '.']).collect();
    let [a, b, c] = parts.as_slice() else {
        return None;
    };
    if ![a, b, c].iter().all(|p| !p.is_empty() && p.bytes().all(|ch| ch.is_ascii_digit())) {
        return None;
    }

    let (year, month, day) = if a.len() == 4 {
        (a, b, c)
    } else {
        (c, b, a)
    };
    if day.len() > 2 || month.len() > 2 {
        return None;
    }

    let year: i32 = match year.len() {
        2 => 2000 + year.parse::<i32>().ok()?,
        4 => year.parse().ok()?,
        _ => return None,
    };
    NaiveDate::from_ymd_opt(year, month.parse().ok()?, day.parse().ok()?)
}

/// Parse a monetary cell: optional sign, optional leading currency symbol,
/// optional thousands-separator commas, then a decimal number.
///
/// `"$1,234.50"`, `"1234.50"`, `"-$20"`, `"$-20"` and `"€ 7,896 "` are all
/// accepted. At most one sign, before or after the symbol. Commas may only
/// separate 3-digit groups of the integer part. The error is a short reason
/// for [`PipelineError::AmountParse`].
pub fn parse_amount(s: &str) -> std::result::Result<f64, &'static str> {
    let (outer, rest) = split_sign(s.trim());
    let rest = rest
        .trim_start_matches(|c: char| {
            !c.is_alphanumeric() && !c.is_whitespace() && !matches!(c, '-' | '+' | '.')
        })
        .trim_start();
    let (inner, rest) = split_sign(rest);
    if outer.is_some() && inner.is_some() {
        return Err("more than one sign");
    }

    let digits = strip_thousands(rest).ok_or("misplaced thousands separator")?;
    if digits.is_empty() {
        return Err("empty");
    }
    if !digits.bytes().all(|b| b.is_ascii_digit() || b == b'.') {
        return Err("not numeric");
    }
    let value: f64 = digits.parse().map_err(|_| "not numeric")?;
    if !value.is_finite() {
        return Err("not finite");
    }
    Ok(match outer.or(inner) {
        Some('-') => -value,
        _ => value,
    })
}

/// Parse a non-negative integer count, allowing thousands-separator commas.
pub fn parse_count(s: &str) -> Option<u64> {
    let digits = strip_thousands(s.trim())?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

fn split_sign(s: &str) -> (Option<char>, &str) {
    match s.chars().next() {
        Some(c @ ('-' | '+')) => (Some(c), &s[1..]),
        _ => (None, s),
    }
}

/// Drop thousands separators, or `None` when a comma is not between 3-digit
/// groups of the integer part (`"1,2,3"`, `"12,34"`, `"1.234,5"`).
fn strip_thousands(s: &str) -> Option<String> {
    if !s.contains(',') {
        return Some(s.to_string());
    }
    let (int, frac) = match s.split_once('.') {
        Some((int, frac)) => (int, Some(frac)),
        None => (s, None),
    };
    if frac.is_some_and(|f| f.contains(',')) {
        return None;
    }

    let mut groups = int.split(',');
    let first = groups.next()?;
    if first.is_empty() || first.len() > 3 || !groups.all(|g| g.len() == 3) {
        return None;
    }

    let mut out: String = int.chars().filter(|c| *c != ',').collect();
    if let Some(frac) = frac {
        out.push('.');
        out.push_str(frac);
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::ColumnMap;

    fn raw(rows: &[[&str; 5]]) -> RawTable {
        RawTable::new(
            ColumnMap::amount_boxes().names(),
            ColumnMap::amount_boxes(),
            rows.iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn currency_cells_parse_to_the_same_value() {
        assert_eq!(parse_amount("$1,234.50"), Ok(1234.50));
        assert_eq!(parse_amount("1234.50"), Ok(1234.50));
        assert_eq!(parse_amount(" $5,320 "), Ok(5320.0));
        assert_eq!(parse_amount("€ 7,896"), Ok(7896.0));
        assert_eq!(parse_amount("-$20"), Ok(-20.0));
        assert_eq!(parse_amount("$-20"), Ok(-20.0));
    }

    #[test]
    fn bad_currency_cells_are_rejected() {
        assert!(parse_amount("").is_err());
        assert!(parse_amount("$").is_err());
        assert!(parse_amount("twelve").is_err());
        assert!(parse_amount("$12abc").is_err());
        assert!(parse_amount("inf").is_err());
        assert!(parse_amount("NaN").is_err());
        assert!(parse_amount("1e5").is_err());
        assert!(parse_amount("--20").is_err());
        assert!(parse_amount("-$-20").is_err());
    }

    #[test]
    fn doubled_signs_are_rejected() {
        assert_eq!(parse_amount("--20"), Err("more than one sign"));
        assert_eq!(parse_amount("-$-20"), Err("more than one sign"));
        assert_eq!(parse_amount("+$-20"), Err("more than one sign"));
        assert_eq!(parse_amount("+$20"), Ok(20.0));
    }

    #[test]
    fn thousands_separators_must_group_by_three() {
        assert_eq!(parse_amount("$1,234,567.25"), Ok(1_234_567.25));
        assert!(parse_amount("$1,2,3").is_err());
        assert!(parse_amount("12,34").is_err());
        assert!(parse_amount(",123").is_err());
        assert!(parse_amount("1.234,5").is_err());
        assert_eq!(parse_count("1,2,3"), None);
        assert_eq!(parse_count("12,000"), Some(12_000));
    }

    #[test]
    fn dates_are_day_first() {
        let d = parse_day_first_date("05/01/2023").unwrap();
        assert_eq!(d, NaiveDate::from_ymd_opt(2023, 1, 5).unwrap());
        assert_eq!(parse_day_first_date("31-01-2023"), NaiveDate::from_ymd_opt(2023, 1, 31));
        assert_eq!(parse_day_first_date("31.01.23"), NaiveDate::from_ymd_opt(2023, 1, 31));
        assert_eq!(parse_day_first_date("2023-01-05"), NaiveDate::from_ymd_opt(2023, 1, 5));
        assert_eq!(
            parse_day_first_date("05/01/2023 00:00:00"),
            NaiveDate::from_ymd_opt(2023, 1, 5)
        );
    }

    #[test]
    fn month_first_and_garbage_dates_fail() {
        assert_eq!(parse_day_first_date("01/31/2023"), None);
        assert_eq!(parse_day_first_date("Jan 5 2023"), None);
        assert_eq!(parse_day_first_date("05/01"), None);
        assert_eq!(parse_day_first_date(""), None);
        assert_eq!(parse_day_first_date("005/01/2023"), None);
    }

    #[test]
    fn counts_must_be_non_negative_integers() {
        assert_eq!(parse_count("180"), Some(180));
        assert_eq!(parse_count("1,024"), Some(1024));
        assert_eq!(parse_count("-3"), None);
        assert_eq!(parse_count("2.5"), None);
        assert_eq!(parse_count(""), None);
    }

    #[test]
    fn fail_fast_names_row_column_and_value() {
        let table = raw(&[
            ["UK", "Dark", "04/01/2022", "$5,320", "180"],
            ["UK", "Dark", "13/13/2022", "$1", "1"],
        ]);
        let err = normalize(&table, &PipelineConfig::default()).unwrap_err();
        match err {
            PipelineError::DateParse { row, column, value } => {
                assert_eq!(row, 1);
                assert_eq!(column, "Date");
                assert_eq!(value, "13/13/2022");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn skip_policy_collects_bad_rows() {
        let table = raw(&[
            ["UK", "Dark", "04/01/2022", "$5,320", "180"],
            ["UK", "Dark", "05/01/2022", "n/a", "1"],
            ["US", "Milk", "06/01/2022", "$10", "-4"],
        ]);
        let cfg = PipelineConfig {
            row_errors: RowErrorPolicy::Skip,
            ..Default::default()
        };
        let out = normalize(&table, &cfg).unwrap();
        assert_eq!(out.len(), 1);
        let rows: Vec<usize> = out.skipped().iter().map(|s| s.row).collect();
        assert_eq!(rows, vec![1, 2]);
    }

    #[test]
    fn negative_amounts_follow_policy() {
        let table = raw(&[["UK", "Dark", "04/01/2022", "-$50", "1"]]);
        let accepted = normalize(&table, &PipelineConfig::default()).unwrap();
        assert_eq!(accepted.records()[0].amount, -50.0);

        let cfg = PipelineConfig {
            negative_amounts: NegativeAmounts::Reject,
            ..Default::default()
        };
        let err = normalize(&table, &cfg).unwrap_err();
        assert!(matches!(err, PipelineError::AmountParse { row: 0, .. }));
    }

    #[test]
    fn renormalizing_a_table_is_a_no_op() {
        let table = raw(&[
            ["UK", "Dark", "04/01/2022", "$5,320.25", "180"],
            ["India", "Milk", "2022-08-01", "7896", "94"],
        ]);
        let once = normalize(&table, &PipelineConfig::default()).unwrap();
        let twice = normalize(&once.to_raw(), &PipelineConfig::default()).unwrap();
        assert_eq!(once, twice);
    }
}
