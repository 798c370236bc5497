//! Factor tables from CSV.
//!
//! Headers are normalized to snake case. A `begin_month` / `date` / `month`
//! column dates the first row; `end_month` and unnamed columns are ignored.
//! Rows with every factor cell empty (trailing notes) are skipped.

use chrono::NaiveDate;
use refi_core::factors::{normalize_name, FactorBasis, FactorTable};
use refi_core::invest::FactorSeries;
use rust_decimal::Decimal;
use std::io::Read;
use std::str::FromStr;

use super::file::resolve_path;

const DATE_COLUMNS: [&str; 4] = ["begin_month", "start_month", "date", "month"];
const IGNORED_COLUMNS: [&str; 1] = ["end_month"];

/// Load every factor column of a CSV file.
pub fn read_factor_csv(path: &str, basis: FactorBasis) -> Result<FactorTable, Box<dyn std::error::Error>> {
    let canonical = resolve_path(path)?;
    let reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_path(&canonical)
        .map_err(|e| format!("Failed to read '{}': {}", canonical.display(), e))?;
    parse_factor_table(reader, basis)
        .map_err(|e| format!("Invalid factor file '{}': {}", canonical.display(), e).into())
}

fn parse_factor_table<R: Read>(
    mut reader: csv::Reader<R>,
    basis: FactorBasis,
) -> Result<FactorTable, Box<dyn std::error::Error>> {
    let headers: Vec<String> = reader.headers()?.iter().map(normalize_name).collect();
    let date_idx = headers
        .iter()
        .position(|h| DATE_COLUMNS.contains(&h.as_str()));
    let factor_idx: Vec<usize> = headers
        .iter()
        .enumerate()
        .filter(|(i, h)| {
            Some(*i) != date_idx
                && !h.is_empty()
                && !h.starts_with("unnamed")
                && !IGNORED_COLUMNS.contains(&h.as_str())
        })
        .map(|(i, _)| i)
        .collect();
    if factor_idx.is_empty() {
        return Err("no factor columns found".into());
    }

    let mut columns: Vec<Vec<Decimal>> = vec![Vec::new(); factor_idx.len()];
    let mut start_month = None;
    for (row, record) in reader.records().enumerate() {
        let record = record?;
        let cells: Vec<&str> = factor_idx
            .iter()
            .map(|i| record.get(*i).unwrap_or(""))
            .collect();
        if cells.iter().all(|c| c.is_empty()) {
            continue;
        }

        for (col, cell) in cells.iter().enumerate() {
            let value = Decimal::from_str(cell)
                .or_else(|_| Decimal::from_scientific(cell))
                .map_err(|_| {
                    format!(
                        "row {}: column '{}' has non-numeric value '{}'",
                        row + 2,
                        headers[factor_idx[col]],
                        cell
                    )
                })?;
            columns[col].push(value);
        }

        if start_month.is_none() {
            start_month = date_idx.and_then(|i| record.get(i)).and_then(parse_month);
        }
    }

    let series = factor_idx
        .iter()
        .zip(columns)
        .map(|(i, factors)| FactorSeries {
            name: headers[*i].clone(),
            start_month,
            factors,
        })
        .collect();

    let table = FactorTable::new(basis, series);
    table.validate()?;
    Ok(table)
}

fn parse_month(value: &str) -> Option<NaiveDate> {
    ["%Y-%m-%d", "%m/%d/%Y", "%Y/%m/%d"]
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
        .or_else(|| NaiveDate::parse_from_str(&format!("{value}-01"), "%Y-%m-%d").ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::io::Write;

    fn load(contents: &str) -> Result<FactorTable, Box<dyn std::error::Error>> {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        read_factor_csv(file.path().to_str().unwrap(), FactorBasis::TrailingAnnual)
    }

    #[test]
    fn test_loads_normalized_columns_and_start_month() {
        let table = load(
            "Begin Month,End Month,LBM 100E,LBM 100F\n\
             1990-01,1990-12,1.12,1.04\n\
             1990-02,1991-01,0.95,1.05\n\
             ,,,\n\
             Source: index provider,,,\n",
        )
        .unwrap();
        assert_eq!(table.names(), vec!["lbm_100e", "lbm_100f"]);
        let equity = table.get("LBM 100E").unwrap();
        assert_eq!(equity.factors, vec![dec!(1.12), dec!(0.95)]);
        assert_eq!(equity.start_month, NaiveDate::from_ymd_opt(1990, 1, 1));
    }

    #[test]
    fn test_rejects_non_numeric_cell() {
        let err = load("date,stocks\n2001-01-01,1.01\n2001-02-01,n/a\n").unwrap_err();
        assert!(err.to_string().contains("row 3"));
    }

    #[test]
    fn test_rejects_non_positive_factor() {
        assert!(load("stocks\n1.01\n0\n").is_err());
    }

    #[test]
    fn test_requires_factor_columns() {
        assert!(load("date\n2001-01-01\n").is_err());
    }

    #[test]
    fn test_parse_month_formats() {
        assert_eq!(parse_month("1995-07"), NaiveDate::from_ymd_opt(1995, 7, 1));
        assert_eq!(parse_month("07/15/1995"), NaiveDate::from_ymd_opt(1995, 7, 15));
        assert_eq!(parse_month("garbage"), None);
    }
}
