//! Monthly series loading
//!
//! A dataset is a CSV file with a header row. An optional date column must
//! advance by exactly one calendar month per row; every numeric column is
//! flattened into the series in row order.

use crate::error::{ForecastError, Result};
use chrono::{Datelike, NaiveDate};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

/// Names that mark the period column
const DATE_COLUMN_HINTS: [&str; 4] = ["date", "period", "laikotarpis", "month"];

/// A monthly series read from one dataset
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeries {
    name: String,
    /// One date per CSV row, empty when the file has no date column
    dates: Vec<NaiveDate>,
    values: Vec<f64>,
}

impl TimeSeries {
    pub fn new(name: impl Into<String>, values: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            dates: Vec::new(),
            values,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn into_values(self) -> Vec<f64> {
        self.values
    }
}

/// Loader for monthly series CSV files
#[derive(Debug)]
pub struct SeriesLoader;

impl SeriesLoader {
    /// Load one dataset; its name is the file stem
    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<TimeSeries> {
        let path = path.as_ref();
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| ForecastError::DataError(format!("Invalid dataset path {}", path.display())))?;
        let file = File::open(path)?;
        Self::from_reader(name, file)
    }

    /// Load a dataset from any CSV source
    pub fn from_reader<R: Read>(name: &str, reader: R) -> Result<TimeSeries> {
        let mut csv_reader = csv::ReaderBuilder::new().has_headers(true).trim(csv::Trim::All).from_reader(reader);
        let headers = csv_reader.headers()?.clone();
        let date_column = headers.iter().position(|h| {
            let lower = h.to_lowercase();
            DATE_COLUMN_HINTS.iter().any(|hint| lower.contains(hint))
        });

        let records: Vec<csv::StringRecord> = csv_reader.records().collect::<std::result::Result<_, _>>()?;

        // A column is numeric when every row parses as a number.
        let numeric: Vec<usize> = (0..headers.len())
            .filter(|&c| Some(c) != date_column)
            .filter(|&c| {
                !records.is_empty()
                    && records
                        .iter()
                        .all(|r| r.get(c).map_or(false, |v| v.parse::<f64>().is_ok()))
            })
            .collect();
        if numeric.is_empty() {
            return Err(ForecastError::DataError(format!("Dataset {} has no numeric column", name)));
        }

        let dates = match date_column {
            Some(c) => {
                let dates = records
                    .iter()
                    .map(|r| parse_period(r.get(c).unwrap_or_default()))
                    .collect::<Result<Vec<_>>>()?;
                check_monthly(&dates)?;
                dates
            }
            None => Vec::new(),
        };

        let mut values = Vec::with_capacity(records.len() * numeric.len());
        for record in &records {
            for &c in &numeric {
                let value: f64 = record.get(c).unwrap_or_default().parse().map_err(|_| {
                    ForecastError::DataError(format!("Non-numeric value in column {}", &headers[c]))
                })?;
                values.push(value);
            }
        }

        debug!(dataset = name, rows = records.len(), columns = numeric.len(), "series loaded");
        Ok(TimeSeries {
            name: name.to_string(),
            dates,
            values,
        })
    }

    /// Load every `*.csv` file of a directory, keyed by file stem
    pub fn from_dir<P: AsRef<Path>>(dir: P) -> Result<BTreeMap<String, TimeSeries>> {
        let dir = dir.as_ref();
        let mut series = BTreeMap::new();
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            if path.extension().map_or(false, |ext| ext == "csv") {
                let loaded = Self::from_csv(&path)?;
                series.insert(loaded.name().to_string(), loaded);
            }
        }
        info!(datasets = series.len(), dir = %dir.display(), "datasets loaded");
        Ok(series)
    }
}

/// Parse `YYYY-MM-DD` or `YYYY-MM`
fn parse_period(text: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(&format!("{}-01", text), "%Y-%m-%d"))
        .map_err(|_| ForecastError::DataError(format!("Cannot parse period '{}'", text)))
}

fn month_index(date: NaiveDate) -> i64 {
    i64::from(date.year()) * 12 + i64::from(date.month0())
}

fn check_monthly(dates: &[NaiveDate]) -> Result<()> {
    for pair in dates.windows(2) {
        if month_index(pair[1]) != month_index(pair[0]) + 1 {
            return Err(ForecastError::DataError(format!(
                "Series is not monthly: {} is followed by {}",
                pair[0], pair[1]
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_period_formats() {
        assert_eq!(parse_period("2020-03").unwrap(), NaiveDate::from_ymd_opt(2020, 3, 1).unwrap());
        assert_eq!(parse_period("2020-03-01").unwrap(), NaiveDate::from_ymd_opt(2020, 3, 1).unwrap());
        assert!(parse_period("March 2020").is_err());
    }

    #[test]
    fn test_month_end_dates_are_monthly() {
        let dates = [
            NaiveDate::from_ymd_opt(2021, 1, 31).unwrap(),
            NaiveDate::from_ymd_opt(2021, 2, 28).unwrap(),
            NaiveDate::from_ymd_opt(2021, 3, 31).unwrap(),
        ];
        assert!(check_monthly(&dates).is_ok());
        assert!(check_monthly(&dates[..1]).is_ok());
        assert!(check_monthly(&[dates[0], dates[2]]).is_err());
    }
}
