use tracing::debug;

use crate::types::{MaintenanceTrendPoint, Row};
use crate::util::parse_date_safe;

pub const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%d";

/// PCI readings ordered by last maintenance date.
///
/// Rows whose `last_maintenance` is blank or does not match `date_format` are
/// filtered out; this is not an error. Equal dates keep input order.
pub fn build_maintenance_trend(
    rows: &[Row],
    date_format: &str,
) -> impl Iterator<Item = MaintenanceTrendPoint> {
    let mut points: Vec<MaintenanceTrendPoint> = rows
        .iter()
        .filter_map(|r| {
            let date = parse_date_safe(r.last_maintenance.as_deref(), date_format)?;
            Some(MaintenanceTrendPoint {
                last_maintenance: date,
                pci: r.pci,
            })
        })
        .collect();

    let dropped = rows.len() - points.len();
    if dropped > 0 {
        debug!(dropped, date_format, "Rows without a usable maintenance date left out of trend");
    }

    // `sort_by_key` is stable.
    points.sort_by_key(|p| p.last_maintenance);
    points.into_iter()
}
