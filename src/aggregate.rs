// Groups are held in BTreeMaps, so every result comes out sorted by key.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::{ReportError, Result};
use crate::types::{DiversitySummary, GroupSummary, Row, SegmentCountEntry};
use crate::util::{mean, pearson};

fn road_type_of(row: &Row) -> Result<&str> {
    if row.road_type.is_empty() {
        return Err(ReportError::InvalidField {
            field: "road_type",
            line: row.line,
        });
    }
    Ok(&row.road_type)
}

/// Mean IRI, mean PCI and segment count per road type.
///
/// Missing IRI/PCI values are left out of the corresponding mean but the row
/// still counts toward `segment_count`.
pub fn summarize_by_road_type(rows: &[Row]) -> Result<Vec<GroupSummary>> {
    #[derive(Default)]
    struct Acc {
        iri: Vec<f64>,
        pci: Vec<f64>,
        count: usize,
    }

    let mut map: BTreeMap<&str, Acc> = BTreeMap::new();
    for r in rows {
        let e = map.entry(road_type_of(r)?).or_default();
        e.count += 1;
        e.iri.extend(r.iri);
        e.pci.extend(r.pci);
    }

    Ok(map
        .into_iter()
        .map(|(road_type, acc)| GroupSummary {
            road_type: road_type.to_string(),
            avg_iri: mean(&acc.iri),
            avg_pci: mean(&acc.pci),
            segment_count: acc.count,
        })
        .collect())
}

/// Distinct asphalt types per road type. Blank types are not counted, except
/// that a group whose rows are all blank reports a single unspecified type.
pub fn diversity_by_road_type(rows: &[Row]) -> Result<Vec<DiversitySummary>> {
    let mut map: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
    for r in rows {
        let kinds = map.entry(road_type_of(r)?).or_default();
        if let Some(kind) = r.asphalt_type.as_deref() {
            kinds.insert(kind);
        }
    }
    Ok(map
        .into_iter()
        .map(|(road_type, kinds)| DiversitySummary {
            road_type: road_type.to_string(),
            unique_asphalt_types: kinds.len().max(1),
        })
        .collect())
}

/// Row counts per (road type, segment id). The same segment id under two
/// road types yields two entries.
pub fn segment_counts(rows: &[Row]) -> Result<Vec<SegmentCountEntry>> {
    let mut map: BTreeMap<(&str, &str), usize> = BTreeMap::new();
    for r in rows {
        let road_type = road_type_of(r)?;
        if r.segment_id.is_empty() {
            return Err(ReportError::InvalidField {
                field: "segment_id",
                line: r.line,
            });
        }
        *map.entry((road_type, r.segment_id.as_str())).or_default() += 1;
    }
    Ok(map
        .into_iter()
        .map(|((road_type, segment_id), count)| SegmentCountEntry {
            road_type: road_type.to_string(),
            segment_id: segment_id.to_string(),
            count,
        })
        .collect())
}

/// Pearson correlation between PCI and IRI over rows that carry both.
pub fn pci_iri_correlation(rows: &[Row]) -> Option<f64> {
    let pairs: Vec<(f64, f64)> = rows
        .iter()
        .filter_map(|r| Some((r.pci?, r.iri?)))
        .collect();
    pearson(&pairs)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::HashSet;

    pub(crate) fn row(
        line: u64,
        road_type: &str,
        segment_id: &str,
        iri: Option<f64>,
        pci: Option<f64>,
    ) -> Row {
        Row {
            line,
            segment_id: segment_id.to_string(),
            road_type: road_type.to_string(),
            iri,
            pci,
            rutting: None,
            asphalt_type: Some("HMA".to_string()),
            last_maintenance: None,
        }
    }

    fn sample() -> Vec<Row> {
        vec![
            row(2, "Primary", "S1", Some(2.0), Some(80.0)),
            row(3, "Primary", "S2", Some(4.0), Some(60.0)),
            row(4, "Secondary", "S3", Some(6.0), Some(50.0)),
        ]
    }

    #[test]
    fn summarize_matches_worked_example() {
        let summary = summarize_by_road_type(&sample()).unwrap();
        assert_eq!(
            summary,
            vec![
                GroupSummary {
                    road_type: "Primary".to_string(),
                    avg_iri: Some(3.0),
                    avg_pci: Some(70.0),
                    segment_count: 2,
                },
                GroupSummary {
                    road_type: "Secondary".to_string(),
                    avg_iri: Some(6.0),
                    avg_pci: Some(50.0),
                    segment_count: 1,
                },
            ]
        );
    }

    #[test]
    fn summarize_preserves_counts_and_groups() {
        let mut rows = sample();
        rows.push(row(5, "Tertiary", "S4", Some(7.5), None));
        rows.push(row(6, "primary", "S5", None, Some(90.0)));

        let summary = summarize_by_road_type(&rows).unwrap();
        let total: usize = summary.iter().map(|g| g.segment_count).sum();
        assert_eq!(total, rows.len());

        let input: HashSet<&str> = rows.iter().map(|r| r.road_type.as_str()).collect();
        let output: HashSet<&str> = summary.iter().map(|g| g.road_type.as_str()).collect();
        assert_eq!(input, output);
        assert_eq!(summary.len(), 4, "grouping is case-sensitive");
    }

    #[test]
    fn missing_values_are_excluded_from_mean_but_counted() {
        let rows = vec![
            row(2, "Primary", "S1", Some(2.0), None),
            row(3, "Primary", "S2", None, None),
            row(4, "Primary", "S3", Some(5.0), Some(40.0)),
        ];
        let summary = summarize_by_road_type(&rows).unwrap();
        assert_eq!(summary[0].segment_count, 3);
        assert!((summary[0].avg_iri.unwrap() - 3.5).abs() < 1e-9);
        assert_eq!(summary[0].avg_pci, Some(40.0));

        let all_missing = vec![row(2, "Local", "S1", None, None)];
        let summary = summarize_by_road_type(&all_missing).unwrap();
        assert_eq!(summary[0].avg_iri, None);
        assert_eq!(summary[0].segment_count, 1);
    }

    #[test]
    fn empty_road_type_is_invalid_field() {
        let mut rows = sample();
        rows.push(row(9, "", "S9", Some(1.0), Some(1.0)));
        for err in [
            summarize_by_road_type(&rows).unwrap_err(),
            diversity_by_road_type(&rows).unwrap_err(),
            segment_counts(&rows).unwrap_err(),
        ] {
            assert!(matches!(
                err,
                ReportError::InvalidField { field: "road_type", line: 9 }
            ));
        }
    }

    #[test]
    fn diversity_counts_distinct_asphalt_types_within_bounds() {
        let mut rows = sample();
        rows[1].asphalt_type = Some("WMA".to_string());
        rows.push(row(5, "Primary", "S4", None, None));
        rows[3].asphalt_type = Some("WMA".to_string());

        let diversity = diversity_by_road_type(&rows).unwrap();
        assert_eq!(
            diversity,
            vec![
                DiversitySummary {
                    road_type: "Primary".to_string(),
                    unique_asphalt_types: 2,
                },
                DiversitySummary {
                    road_type: "Secondary".to_string(),
                    unique_asphalt_types: 1,
                },
            ]
        );
        let summary = summarize_by_road_type(&rows).unwrap();
        for (d, g) in diversity.iter().zip(&summary) {
            assert!(d.unique_asphalt_types >= 1);
            assert!(d.unique_asphalt_types <= g.segment_count);
        }
    }

    #[test]
    fn blank_asphalt_types_are_not_a_distinct_kind() {
        let mut rows = vec![
            row(2, "Primary", "S1", None, None),
            row(3, "Primary", "S2", None, None),
            row(4, "Local", "S3", None, None),
            row(5, "Local", "S4", None, None),
        ];
        rows[0].asphalt_type = Some("Hot Mix".to_string());
        rows[1].asphalt_type = None;
        rows[2].asphalt_type = None;
        rows[3].asphalt_type = None;

        let diversity = diversity_by_road_type(&rows).unwrap();
        assert_eq!(diversity.len(), 2);
        assert_eq!(diversity[0].road_type, "Local");
        assert_eq!(diversity[0].unique_asphalt_types, 1, "all blank");
        assert_eq!(diversity[1].road_type, "Primary");
        assert_eq!(diversity[1].unique_asphalt_types, 1, "blank beside Hot Mix");
    }

    #[test]
    fn segment_counts_use_composite_key() {
        let rows = vec![
            row(2, "Primary", "S1", None, None),
            row(3, "Primary", "S1", None, None),
            row(4, "Secondary", "S1", None, None),
        ];
        let counts = segment_counts(&rows).unwrap();
        assert_eq!(counts.len(), 2);
        assert_eq!(counts[0].road_type, "Primary");
        assert_eq!(counts[0].count, 2);
        assert_eq!(counts[1].road_type, "Secondary");
        assert_eq!(counts[1].count, 1);
    }

    #[test]
    fn segment_counts_reject_empty_segment_id() {
        let rows = vec![row(4, "Primary", "", None, None)];
        assert!(matches!(
            segment_counts(&rows).unwrap_err(),
            ReportError::InvalidField { field: "segment_id", line: 4 }
        ));
    }

    #[test]
    fn correlation_uses_rows_with_both_values() {
        let mut rows = sample();
        rows.push(row(5, "Primary", "S4", None, Some(10.0)));
        let r = pci_iri_correlation(&rows).unwrap();
        assert!(r < -0.9);
    }
}
