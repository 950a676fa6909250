use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::util::coerce_f64;

/// Column headers the loader requires, in source order.
pub const REQUIRED_COLUMNS: [&str; 7] = [
    "Segment ID",
    "Road Type",
    "IRI",
    "PCI",
    "Rutting",
    "Asphalt Type",
    "Last Maintenance",
];

/// One CSV record exactly as it appears in the source; every field is text.
#[derive(Debug, Deserialize)]
pub struct RawRow {
    #[serde(rename = "Segment ID")]
    pub segment_id: Option<String>,
    #[serde(rename = "Road Type")]
    pub road_type: Option<String>,
    #[serde(rename = "IRI")]
    pub iri: Option<String>,
    #[serde(rename = "PCI")]
    pub pci: Option<String>,
    #[serde(rename = "Rutting")]
    pub rutting: Option<String>,
    #[serde(rename = "Asphalt Type")]
    pub asphalt_type: Option<String>,
    #[serde(rename = "Last Maintenance")]
    pub last_maintenance: Option<String>,
}

/// A pavement segment observation with numeric fields already coerced.
///
/// `last_maintenance` stays as text: dates are parsed by the maintenance
/// trend transform, where an unparseable value is filtered rather than
/// rejected. A blank asphalt type is `None`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Row {
    pub line: u64,
    pub segment_id: String,
    pub road_type: String,
    pub iri: Option<f64>,
    pub pci: Option<f64>,
    pub rutting: Option<f64>,
    pub asphalt_type: Option<String>,
    pub last_maintenance: Option<String>,
}

impl Row {
    /// Coerce a raw record. Blank numeric fields become `None`; anything else
    /// that does not parse as a finite number is a coercion error.
    pub fn from_raw(raw: RawRow, line: u64) -> Result<Self> {
        let iri = coerce_f64("iri", raw.iri.as_deref(), line)?;
        let pci = coerce_f64("pci", raw.pci.as_deref(), line)?;
        let rutting = coerce_f64("rutting", raw.rutting.as_deref(), line)?;

        let segment_id = raw.segment_id.unwrap_or_default().trim().to_string();
        let road_type = raw.road_type.unwrap_or_default().trim().to_string();
        let asphalt_type = raw
            .asphalt_type
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        let last_maintenance = raw
            .last_maintenance
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        Ok(Row {
            line,
            segment_id,
            road_type,
            iri,
            pci,
            rutting,
            asphalt_type,
            last_maintenance,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupSummary {
    pub road_type: String,
    pub avg_iri: Option<f64>,
    pub avg_pci: Option<f64>,
    pub segment_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiversitySummary {
    pub road_type: String,
    pub unique_asphalt_types: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SegmentCountEntry {
    pub road_type: String,
    pub segment_id: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MaintenanceTrendPoint {
    pub last_maintenance: NaiveDate,
    pub pci: Option<f64>,
}

/// A numbered item of the narrative findings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Finding {
    pub title: String,
    pub detail: String,
}
