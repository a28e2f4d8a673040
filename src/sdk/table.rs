use std::collections::HashMap;
use std::fmt;
use std::fs::File;
use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, Writer};

use crate::sdk::error::GaodeError;

/// A single cell. Cells that parse as a number on load are kept numeric so
/// arithmetic comparisons (the zero-distance sentinel) work without
/// re-parsing; everything else stays text.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Number(f64),
    Text(String),
}

impl Value {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            Value::Text(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Number(_) => None,
            Value::Text(s) => Some(s),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{}", n),
            Value::Text(s) => write!(f, "{}", s),
        }
    }
}

/// An ordered CSV-backed table with a fixed header, addressable by
/// (row index, column name). The whole table is rewritten on every save;
/// there is exactly one writer, so a completed save is always consistent.
#[derive(Debug, Clone)]
pub struct Table {
    header: Vec<String>,
    index: HashMap<String, usize>,
    rows: Vec<Vec<Value>>,
}

impl Table {
    pub fn new(header: Vec<String>) -> Self {
        let index = header
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), i))
            .collect();
        Self {
            header,
            index,
            rows: Vec::new(),
        }
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, GaodeError> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let mut rdr = ReaderBuilder::new()
            .delimiter(b',')
            .flexible(true)
            .from_reader(file);

        let header: Vec<String> = rdr
            .headers()?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();
        let mut table = Table::new(header);

        for (i, result) in rdr.records().enumerate() {
            let record = result?;
            if record.len() != table.header.len() {
                return Err(GaodeError::MalformedTable {
                    path: PathBuf::from(path),
                    detail: format!(
                        "row {} has {} fields, header has {}",
                        i + 1,
                        record.len(),
                        table.header.len()
                    ),
                });
            }
            let row = record.iter().map(parse_cell).collect();
            table.rows.push(row);
        }

        log::debug!("loaded {} rows from {}", table.rows.len(), path.display());
        Ok(table)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), GaodeError> {
        let mut wtr = Writer::from_path(path.as_ref())?;
        wtr.write_record(&self.header)?;
        for row in &self.rows {
            wtr.write_record(row.iter().map(|v| v.to_string()))?;
        }
        wtr.flush()?;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn header(&self) -> &[String] {
        &self.header
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.index.contains_key(column)
    }

    pub fn get(&self, row: usize, column: &str) -> Result<&Value, GaodeError> {
        let col = self.column(column)?;
        self.rows
            .get(row)
            .map(|r| &r[col])
            .ok_or(GaodeError::RowOutOfRange(row))
    }

    pub fn set(&mut self, row: usize, column: &str, value: Value) -> Result<(), GaodeError> {
        let col = self.column(column)?;
        let cells = self
            .rows
            .get_mut(row)
            .ok_or(GaodeError::RowOutOfRange(row))?;
        cells[col] = value;
        Ok(())
    }

    /// Appends a new column, filling every existing row via `fill`.
    pub fn add_column<F>(&mut self, name: &str, mut fill: F)
    where
        F: FnMut(&[Value]) -> Value,
    {
        self.index.insert(name.to_string(), self.header.len());
        self.header.push(name.to_string());
        for row in &mut self.rows {
            let value = fill(row);
            row.push(value);
        }
    }

    pub fn push_row(&mut self, row: Vec<Value>) -> Result<(), GaodeError> {
        if row.len() != self.header.len() {
            return Err(GaodeError::MalformedTable {
                path: PathBuf::new(),
                detail: format!(
                    "pushed row has {} fields, header has {}",
                    row.len(),
                    self.header.len()
                ),
            });
        }
        self.rows.push(row);
        Ok(())
    }

    fn column(&self, name: &str) -> Result<usize, GaodeError> {
        self.index
            .get(name)
            .copied()
            .ok_or_else(|| GaodeError::UnknownColumn(name.to_string()))
    }
}

fn parse_cell(raw: &str) -> Value {
    let trimmed = raw.trim();
    match trimmed.parse::<f64>() {
        Ok(n) => Value::Number(n),
        Err(_) => Value::Text(trimmed.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    const SAMPLE: &str = "origin,destination,gaode_map_distance,duration\n\
                          上海,北京,0,0\n\
                          上海,广州,1520.5,54000\n";

    #[test]
    fn round_trip_preserves_rows_and_column_order() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("routes.csv");
        fs::write(&path, SAMPLE).unwrap();

        let table = Table::load(&path).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(
            table.header(),
            &["origin", "destination", "gaode_map_distance", "duration"]
        );

        let copy = dir.path().join("copy.csv");
        table.save(&copy).unwrap();
        assert_eq!(fs::read_to_string(&copy).unwrap(), SAMPLE);
    }

    #[test]
    fn cells_parse_numeric_when_possible() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("routes.csv");
        fs::write(&path, SAMPLE).unwrap();

        let table = Table::load(&path).unwrap();
        assert_eq!(table.get(0, "origin").unwrap().as_str(), Some("上海"));
        assert_eq!(
            table.get(1, "gaode_map_distance").unwrap().as_f64(),
            Some(1520.5)
        );
    }

    #[test]
    fn point_updates_land_in_the_right_cell() {
        let mut table = Table::new(vec!["a".into(), "b".into()]);
        table
            .push_row(vec![Value::Number(0.0), Value::Text("x".into())])
            .unwrap();
        table.set(0, "a", Value::Number(42.0)).unwrap();
        assert_eq!(table.get(0, "a").unwrap().as_f64(), Some(42.0));
        assert_eq!(table.get(0, "b").unwrap().as_str(), Some("x"));
    }

    #[test]
    fn unknown_column_and_row_are_errors() {
        let mut table = Table::new(vec!["a".into()]);
        table.push_row(vec![Value::Number(1.0)]).unwrap();
        assert!(matches!(
            table.get(0, "nope"),
            Err(GaodeError::UnknownColumn(_))
        ));
        assert!(matches!(
            table.set(5, "a", Value::Number(0.0)),
            Err(GaodeError::RowOutOfRange(5))
        ));
    }

    #[test]
    fn arity_mismatch_is_rejected_at_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.csv");
        fs::write(&path, "a,b\n1\n").unwrap();
        assert!(matches!(
            Table::load(&path),
            Err(GaodeError::MalformedTable { .. })
        ));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        assert!(matches!(
            Table::load("/nonexistent/routes.csv"),
            Err(GaodeError::Io(_))
        ));
    }

    #[test]
    fn add_column_extends_every_row() {
        let mut table = Table::new(vec!["d".into()]);
        table.push_row(vec![Value::Number(0.0)]).unwrap();
        table.push_row(vec![Value::Number(3.5)]).unwrap();
        table.add_column("status", |row| {
            Value::Text(if row[0].as_f64() == Some(0.0) {
                "pending".into()
            } else {
                "done".into()
            })
        });
        assert_eq!(table.get(0, "status").unwrap().as_str(), Some("pending"));
        assert_eq!(table.get(1, "status").unwrap().as_str(), Some("done"));
    }
}
