//! Historical dataset with named numeric columns.
//!
//! Cells are `Option<f64>`: `None` marks a missing value. Rows are numbered
//! from 1 in error messages (the first data row after the header).

pub mod synthetic;

use crate::error::TrainingDataError;
use std::io;
use std::path::Path;
use tracing::debug;

/// Auxiliary column used only during cleaning
pub const EDUCATION_COLUMN: &str = "education";

/// Default binary outcome column
pub const DEFAULT_LABEL_COLUMN: &str = "TenYearCHD";

const MISSING_MARKERS: [&str; 5] = ["", "NA", "NaN", "nan", "null"];

/// One named column
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub values: Vec<Option<f64>>,
}

impl Column {
    pub fn new(name: impl Into<String>, values: Vec<Option<f64>>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    /// Number of missing cells
    pub fn missing_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_none()).count()
    }
}

/// Column-oriented table of historical patient rows
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Dataset {
    columns: Vec<Column>,
    rows: usize,
}

impl Dataset {
    /// Build a dataset from columns of equal length
    pub fn from_columns(columns: Vec<Column>) -> Result<Self, TrainingDataError> {
        let rows = columns.first().map(|c| c.values.len()).unwrap_or(0);
        if let Some(ragged) = columns.iter().find(|c| c.values.len() != rows) {
            return Err(TrainingDataError::ColumnLength {
                column: ragged.name.clone(),
                expected: rows,
                found: ragged.values.len(),
            });
        }
        Ok(Self { columns, rows })
    }

    /// Read a CSV file with a header row
    pub fn from_csv_path<P: AsRef<Path>>(path: P) -> Result<Self, TrainingDataError> {
        let path = path.as_ref();
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(path)
            .map_err(|source| TrainingDataError::Read {
                path: path.to_path_buf(),
                source,
            })?;

        let dataset = Self::from_csv(reader)?;
        debug!(
            path = %path.display(),
            rows = dataset.len(),
            columns = dataset.columns.len(),
            "Dataset loaded"
        );
        Ok(dataset)
    }

    /// Read CSV data with a header row from any reader
    pub fn from_csv_reader<R: io::Read>(reader: R) -> Result<Self, TrainingDataError> {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        Self::from_csv(reader)
    }

    fn from_csv<R: io::Read>(mut reader: csv::Reader<R>) -> Result<Self, TrainingDataError> {
        let headers = reader.headers()?.clone();
        let mut columns: Vec<Column> = headers
            .iter()
            .map(|name| Column::new(name, Vec::new()))
            .collect();

        for (index, record) in reader.records().enumerate() {
            let record = record?;
            let row = index + 1;

            for (column, field) in columns.iter_mut().zip(record.iter()) {
                column.values.push(parse_cell(&column.name, row, field)?);
            }
        }

        Self::from_columns(columns)
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Values of a named column
    pub fn column(&self, name: &str) -> Option<&[Option<f64>]> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.values.as_slice())
    }

    /// Values of a named column that must be present
    pub fn require(&self, name: &str) -> Result<&[Option<f64>], TrainingDataError> {
        self.column(name)
            .ok_or_else(|| TrainingDataError::MissingColumn(name.to_string()))
    }

    /// Replace a column's values, or append the column if absent
    pub fn with_column(
        mut self,
        name: &str,
        values: Vec<Option<f64>>,
    ) -> Result<Self, TrainingDataError> {
        if values.len() != self.rows && !self.columns.is_empty() {
            return Err(TrainingDataError::ColumnLength {
                column: name.to_string(),
                expected: self.rows,
                found: values.len(),
            });
        }

        match self.columns.iter_mut().find(|c| c.name == name) {
            Some(column) => column.values = values,
            None => {
                self.rows = values.len();
                self.columns.push(Column::new(name, values));
            }
        }
        Ok(self)
    }

    /// Drop a column if present
    pub fn without_column(mut self, name: &str) -> Self {
        self.columns.retain(|c| c.name != name);
        self
    }

    /// Write the dataset as CSV; missing cells are written empty
    pub fn write_csv<W: io::Write>(&self, writer: W) -> Result<(), csv::Error> {
        let mut writer = csv::Writer::from_writer(writer);
        writer.write_record(self.columns.iter().map(|c| c.name.as_str()))?;

        for row in 0..self.rows {
            writer.write_record(self.columns.iter().map(|c| match c.values[row] {
                Some(value) => value.to_string(),
                None => String::new(),
            }))?;
        }

        writer.flush()?;
        Ok(())
    }
}

fn parse_cell(column: &str, row: usize, field: &str) -> Result<Option<f64>, TrainingDataError> {
    if MISSING_MARKERS.contains(&field) {
        return Ok(None);
    }

    match field.parse::<f64>() {
        Ok(value) if value.is_nan() => Ok(None),
        Ok(value) if value.is_infinite() => Err(TrainingDataError::NonFinite {
            column: column.to_string(),
            row,
            value: field.to_string(),
        }),
        Ok(value) => Ok(Some(value)),
        Err(_) => Err(TrainingDataError::NonNumeric {
            column: column.to_string(),
            row,
            value: field.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
male,age,education,TenYearCHD
1,39,4,0
0,46,,1
1, 48 ,NA,0
";

    #[test]
    fn test_read_csv_with_missing_values() {
        let dataset = Dataset::from_csv_reader(SAMPLE.as_bytes()).unwrap();

        assert_eq!(dataset.len(), 3);
        assert_eq!(dataset.column_names(), vec!["male", "age", "education", "TenYearCHD"]);
        assert_eq!(
            dataset.column("education").unwrap(),
            &[Some(4.0), None, None]
        );
        assert_eq!(dataset.column("age").unwrap()[2], Some(48.0));
    }

    #[test]
    fn test_non_numeric_cell() {
        let err = Dataset::from_csv_reader("age\nabc\n".as_bytes()).unwrap_err();
        assert!(matches!(
            err,
            TrainingDataError::NonNumeric { ref column, row: 1, .. } if column == "age"
        ));
    }

    #[test]
    fn test_infinite_cell_rejected() {
        let err = Dataset::from_csv_reader("age,glucose\n40,90\n52,inf\n".as_bytes()).unwrap_err();
        assert!(matches!(
            err,
            TrainingDataError::NonFinite { ref column, row: 2, ref value }
                if column == "glucose" && value == "inf"
        ));

        let err = Dataset::from_csv_reader("age\n-Infinity\n".as_bytes()).unwrap_err();
        assert!(matches!(err, TrainingDataError::NonFinite { row: 1, .. }));
    }

    #[test]
    fn test_require_missing_column() {
        let dataset = Dataset::from_csv_reader(SAMPLE.as_bytes()).unwrap();
        let err = dataset.require("glucose").unwrap_err();
        assert!(matches!(err, TrainingDataError::MissingColumn(ref c) if c == "glucose"));
    }

    #[test]
    fn test_with_and_without_column() {
        let dataset = Dataset::from_csv_reader(SAMPLE.as_bytes())
            .unwrap()
            .with_column("education", vec![Some(4.0), Some(3.0), Some(3.0)])
            .unwrap();
        assert_eq!(dataset.column("education").unwrap()[1], Some(3.0));

        let dataset = dataset.without_column("education");
        assert!(dataset.column("education").is_none());
        assert_eq!(dataset.len(), 3);

        assert!(dataset.with_column("extra", vec![Some(1.0)]).is_err());
    }

    #[test]
    fn test_write_then_read_csv() {
        let dataset = Dataset::from_csv_reader(SAMPLE.as_bytes()).unwrap();
        let mut buffer = Vec::new();
        dataset.write_csv(&mut buffer).unwrap();

        let reread = Dataset::from_csv_reader(buffer.as_slice()).unwrap();
        assert_eq!(reread, dataset);
    }

    #[test]
    fn test_ragged_columns_rejected() {
        let err = Dataset::from_columns(vec![
            Column::new("a", vec![Some(1.0), Some(2.0)]),
            Column::new("b", vec![Some(1.0)]),
        ])
        .unwrap_err();
        assert!(matches!(err, TrainingDataError::ColumnLength { found: 1, .. }));
    }
}
