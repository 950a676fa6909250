use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;

use crate::types::{DiversitySummary, GroupSummary, MaintenanceTrendPoint, Row, SegmentCountEntry};
use crate::util::{format_int, format_number};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    Text(String),
    Number(f64),
    Count(usize),
    Date(NaiveDate),
    Missing,
}

impl Cell {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Number(v) => Some(*v),
            Cell::Count(n) => Some(*n as f64),
            _ => None,
        }
    }
}

impl From<Option<f64>> for Cell {
    fn from(v: Option<f64>) -> Self {
        v.map_or(Cell::Missing, Cell::Number)
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Cell::Text(s.to_string())
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Text(s) => f.write_str(s),
            Cell::Number(v) => f.write_str(&format_number(*v, 2)),
            Cell::Count(n) => f.write_str(&format_int(*n)),
            Cell::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Cell::Missing => f.write_str("n/a"),
        }
    }
}

pub trait TableRecord {
    const COLUMNS: &'static [&'static str];

    fn cells(&self) -> Vec<Cell>;
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl DataTable {
    pub fn from_records<'a, T, I>(records: I) -> Self
    where
        T: TableRecord + 'a,
        I: IntoIterator<Item = &'a T>,
    {
        DataTable {
            columns: T::COLUMNS.iter().map(|c| c.to_string()).collect(),
            rows: records.into_iter().map(T::cells).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Cells of one column, top to bottom.
    pub fn column<'a>(&'a self, name: &str) -> Option<impl Iterator<Item = &'a Cell> + 'a> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(move |row| &row[idx]))
    }
}

impl TableRecord for Row {
    const COLUMNS: &'static [&'static str] = &[
        "segment_id",
        "road_type",
        "iri",
        "pci",
        "rutting",
        "asphalt_type",
        "last_maintenance",
    ];

    fn cells(&self) -> Vec<Cell> {
        vec![
            self.segment_id.as_str().into(),
            self.road_type.as_str().into(),
            self.iri.into(),
            self.pci.into(),
            self.rutting.into(),
            self.asphalt_type.as_deref().map_or(Cell::Missing, Cell::from),
            self.last_maintenance
                .as_deref()
                .map_or(Cell::Missing, Cell::from),
        ]
    }
}

impl TableRecord for GroupSummary {
    const COLUMNS: &'static [&'static str] = &["road_type", "avg_iri", "avg_pci", "segment_count"];

    fn cells(&self) -> Vec<Cell> {
        vec![
            self.road_type.as_str().into(),
            self.avg_iri.into(),
            self.avg_pci.into(),
            Cell::Count(self.segment_count),
        ]
    }
}

impl TableRecord for DiversitySummary {
    const COLUMNS: &'static [&'static str] = &["road_type", "unique_asphalt_types"];

    fn cells(&self) -> Vec<Cell> {
        vec![
            self.road_type.as_str().into(),
            Cell::Count(self.unique_asphalt_types),
        ]
    }
}

impl TableRecord for SegmentCountEntry {
    const COLUMNS: &'static [&'static str] = &["road_type", "segment_id", "count"];

    fn cells(&self) -> Vec<Cell> {
        vec![
            self.road_type.as_str().into(),
            self.segment_id.as_str().into(),
            Cell::Count(self.count),
        ]
    }
}

impl TableRecord for MaintenanceTrendPoint {
    const COLUMNS: &'static [&'static str] = &["last_maintenance", "pci"];

    fn cells(&self) -> Vec<Cell> {
        vec![Cell::Date(self.last_maintenance), self.pci.into()]
    }
}
