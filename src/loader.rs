use crate::error::{ReportError, Result};
use crate::types::{RawRow, Row, REQUIRED_COLUMNS};
use csv::{ReaderBuilder, StringRecord, Trim};
use serde::Serialize;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    pub total_rows: usize,
    pub missing_iri: usize,
    pub missing_pci: usize,
    pub missing_rutting: usize,
    pub missing_dates: usize,
}

pub fn load_rows(path: &Path) -> Result<(Vec<Row>, LoadReport)> {
    let file = File::open(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => ReportError::SourceNotFound {
            path: path.to_path_buf(),
        },
        _ => ReportError::Io(e),
    })?;
    info!(path = %path.display(), "Loading pavement segments");
    load_from_reader(file)
}

/// Read every record from a headered CSV stream into typed rows.
///
/// Field-count mismatches and missing columns abort the load with
/// [`ReportError::MalformedRecord`]; numeric text that does not coerce aborts
/// with [`ReportError::Coercion`].
pub fn load_from_reader<R: Read>(reader: R) -> Result<(Vec<Row>, LoadReport)> {
    let mut rdr = ReaderBuilder::new().trim(Trim::Headers).from_reader(reader);
    let headers = rdr.headers().map_err(malformed)?.clone();
    check_headers(&headers)?;

    let mut rows: Vec<Row> = Vec::new();
    let mut report = LoadReport::default();

    for result in rdr.records() {
        let record = result.map_err(malformed)?;
        let line = record.position().map(|p| p.line()).unwrap_or_default();
        let raw: RawRow =
            record
                .deserialize(Some(&headers))
                .map_err(|e| ReportError::MalformedRecord {
                    line,
                    message: e.to_string(),
                })?;
        let row = Row::from_raw(raw, line)?;

        report.total_rows += 1;
        if row.iri.is_none() {
            report.missing_iri += 1;
        }
        if row.pci.is_none() {
            report.missing_pci += 1;
        }
        if row.rutting.is_none() {
            report.missing_rutting += 1;
        }
        if row.last_maintenance.is_none() {
            report.missing_dates += 1;
        }
        rows.push(row);
    }

    if report.missing_iri > 0 || report.missing_pci > 0 {
        warn!(
            missing_iri = report.missing_iri,
            missing_pci = report.missing_pci,
            "Blank IRI/PCI values are excluded from group means"
        );
    }
    debug!(?report, "Finished loading");
    Ok((rows, report))
}

fn check_headers(headers: &StringRecord) -> Result<()> {
    for column in REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h == column) {
            return Err(ReportError::MalformedRecord {
                line: 1,
                message: format!("missing required column `{}`", column),
            });
        }
    }
    Ok(())
}

fn malformed(e: csv::Error) -> ReportError {
    let line = e.position().map(|p| p.line()).unwrap_or_default();
    ReportError::MalformedRecord {
        line,
        message: e.to_string(),
    }
}
