//! Flat output rows and the extraction result

use std::collections::BTreeMap;
use std::io::Write;

use serde::Serialize;

use crate::assumptions::CohortYears;
use crate::error::Result;

use super::expenses::CohortExpenseTable;
use super::row::{cohort_column, CohortMetrics, ProjectionRow};

/// A fully resolved row: base fields plus `<metric>_<cohortYear>` columns
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlatProjectionRow {
    #[serde(flatten)]
    pub base: ProjectionRow,
    #[serde(flatten)]
    pub cohort_values: BTreeMap<String, f64>,
}

impl FlatProjectionRow {
    /// Value of a numeric column by its serialized name
    pub fn column(&self, name: &str) -> Option<f64> {
        if let Some(value) = self.cohort_values.get(name) {
            return Some(*value);
        }
        self.base
            .numeric_columns()
            .into_iter()
            .find(|(column, _)| *column == name)
            .map(|(_, value)| value)
    }

    /// Value of a cohort metric, e.g. `cohort_value("closingCsm", "2026")`
    pub fn cohort_value(&self, metric: &str, cohort_year: &str) -> Option<f64> {
        self.cohort_values.get(&cohort_column(metric, cohort_year)).copied()
    }
}

/// Output of one engine run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionResult {
    pub rows: Vec<FlatProjectionRow>,
    pub cohort_expenses: CohortExpenseTable,
}

/// Copy every cohort's metrics into suffixed flat columns, in cohort order
pub fn flatten_rows(
    rows: Vec<ProjectionRow>,
    cohort_years: &CohortYears,
) -> Vec<FlatProjectionRow> {
    rows.into_iter()
        .map(|mut base| {
            let mut cohorts = std::mem::take(&mut base.cohorts);
            let mut cohort_values = BTreeMap::new();
            for label in cohort_years.labels() {
                let metrics = cohorts.remove(label).unwrap_or_default();
                for (metric, value) in metrics.columns() {
                    cohort_values.insert(cohort_column(metric, label), value);
                }
            }
            FlatProjectionRow { base, cohort_values }
        })
        .collect()
}

/// Write flat rows as CSV: base columns, then cohort columns grouped by cohort year
pub fn write_rows_csv<W: Write>(
    writer: W,
    rows: &[FlatProjectionRow],
    cohort_years: &CohortYears,
) -> Result<()> {
    let mut csv = csv::Writer::from_writer(writer);

    let base_names: Vec<&str> = ProjectionRow::default()
        .numeric_columns()
        .into_iter()
        .map(|(name, _)| name)
        .collect();
    let cohort_names: Vec<String> = cohort_years
        .labels()
        .iter()
        .flat_map(|label| {
            CohortMetrics::column_names()
                .into_iter()
                .map(move |metric| cohort_column(metric, label))
        })
        .collect();

    let mut header: Vec<String> = vec!["ValuationDate".to_string()];
    header.extend(base_names.iter().map(|name| name.to_string()));
    header.extend(cohort_names.iter().cloned());
    csv.write_record(&header)?;

    for row in rows {
        let mut record = Vec::with_capacity(header.len());
        record.push(row.base.valuation_date.clone());
        record.extend(row.base.numeric_columns().into_iter().map(|(_, v)| v.to_string()));
        record.extend(
            cohort_names
                .iter()
                .map(|name| row.cohort_values.get(name).copied().unwrap_or(0.0).to_string()),
        );
        csv.write_record(&record)?;
    }

    csv.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn years() -> CohortYears {
        CohortYears::parse(&["2025", "2026", "2027", "2028", "2029"]).unwrap()
    }

    fn row_with_cohorts() -> ProjectionRow {
        let mut row = ProjectionRow::new(1, 3, "2025-08-31".to_string(), 2025);
        row.premium_income = 250.0;
        for (i, label) in years().labels().iter().enumerate() {
            let metrics = CohortMetrics {
                closing_csm: 100.0 * i as f64,
                ..Default::default()
            };
            row.cohorts.insert(label.clone(), metrics);
        }
        row
    }

    #[test]
    fn test_flatten_names_and_values() {
        let flat = flatten_rows(vec![row_with_cohorts()], &years());
        assert_eq!(flat.len(), 1);
        let row = &flat[0];

        assert_eq!(row.cohort_values.len(), 5 * CohortMetrics::column_names().len());
        assert_eq!(row.cohort_value("closingCsm", "2027"), Some(200.0));
        assert_eq!(row.column("closingCsm_2029"), Some(400.0));
        assert_eq!(row.column("premiumIncome"), Some(250.0));
        assert_eq!(row.column("Year"), Some(2025.0));
        assert_eq!(row.column("noSuchColumn"), None);
        assert!(row.base.cohorts.is_empty());
    }

    #[test]
    fn test_missing_cohort_flattens_to_zero() {
        let mut row = row_with_cohorts();
        row.cohorts.remove("2028");
        let flat = flatten_rows(vec![row], &years());
        assert_eq!(flat[0].cohort_value("netCsm", "2028"), Some(0.0));
    }

    #[test]
    fn test_serialized_row_is_flat() {
        let flat = flatten_rows(vec![row_with_cohorts()], &years());
        let json = serde_json::to_value(&flat[0]).unwrap();
        assert_eq!(json["ValuationDate"], "2025-08-31");
        assert_eq!(json["closingCsm_2026"], 100.0);
        assert_eq!(json["premiumIncome"], 250.0);
    }

    #[test]
    fn test_csv_header_and_width() {
        let flat = flatten_rows(vec![row_with_cohorts()], &years());
        let mut buffer = Vec::new();
        write_rows_csv(&mut buffer, &flat, &years()).unwrap();

        let text = String::from_utf8(buffer).unwrap();
        let mut lines = text.lines();
        let header: Vec<&str> = lines.next().unwrap().split(',').collect();
        let first: Vec<&str> = lines.next().unwrap().split(',').collect();

        assert_eq!(header[0], "ValuationDate");
        assert!(header.contains(&"closingCsm_2029"));
        assert_eq!(header.len(), first.len());
        assert_eq!(first[0], "2025-08-31");
    }
}
