use crate::aggregate::pci_iri_correlation;
use crate::types::{DiversitySummary, Finding, GroupSummary, MaintenanceTrendPoint, Row};
use crate::util::{format_int, format_number, mean, median};

const INSUFFICIENT: &str = "Not enough data to draw a conclusion.";

fn finding(title: &str, detail: String) -> Finding {
    Finding {
        title: title.to_string(),
        detail,
    }
}

fn max_by_key<'a, T>(items: &'a [T], key: impl Fn(&T) -> Option<f64>) -> Option<(&'a T, f64)> {
    items
        .iter()
        .filter_map(|item| key(item).map(|v| (item, v)))
        .fold(None, |best, (item, v)| match best {
            Some((_, bv)) if bv >= v => best,
            _ => Some((item, v)),
        })
}

pub fn derive_findings(
    summary: &[GroupSummary],
    diversity: &[DiversitySummary],
    rows: &[Row],
    trend: &[MaintenanceTrendPoint],
    rutting_threshold_mm: f64,
) -> Vec<Finding> {
    vec![
        road_type_differences(summary),
        pci_iri_relationship(rows),
        rutting_distribution(rows, rutting_threshold_mm),
        asphalt_diversity(diversity),
        maintenance_trends(trend),
    ]
}

fn road_type_differences(summary: &[GroupSummary]) -> Finding {
    let roughest = max_by_key(summary, |g| g.avg_iri);
    let best = max_by_key(summary, |g| g.avg_pci);
    let detail = match (roughest, best) {
        (Some((r, iri)), Some((b, pci))) => format!(
            "{} roads have the highest average IRI ({} m/km), meaning rougher surfaces, \
             while {} roads show the highest average PCI ({}), reflecting better overall condition.",
            r.road_type,
            format_number(iri, 2),
            b.road_type,
            format_number(pci, 1)
        ),
        _ => INSUFFICIENT.to_string(),
    };
    finding("Road Type Differences", detail)
}

fn pci_iri_relationship(rows: &[Row]) -> Finding {
    let detail = match pci_iri_correlation(rows) {
        Some(r) => {
            let shape = if r <= -0.5 {
                "a strong inverse correlation; smoother roads tend to have higher condition ratings"
            } else if r < -0.2 {
                "a moderate inverse correlation between roughness and condition"
            } else if r >= 0.2 {
                "an unexpected positive correlation between roughness and condition"
            } else {
                "only a weak relationship between roughness and condition"
            };
            format!("PCI and IRI show {} (r = {}).", shape, format_number(r, 2))
        }
        None => INSUFFICIENT.to_string(),
    };
    finding("PCI vs IRI Relationship", detail)
}

fn rutting_distribution(rows: &[Row], threshold: f64) -> Finding {
    let values: Vec<f64> = rows.iter().filter_map(|r| r.rutting).collect();
    let total = values.len();
    let above = values.iter().filter(|v| **v > threshold).count();
    let detail = match median(values) {
        Some(med) => format!(
            "Median rutting is {} mm; {} of {} measured segments ({}%) exceed {} mm, \
             suggesting localized distress needing targeted repair.",
            format_number(med, 2),
            format_int(above),
            format_int(total),
            format_number(above as f64 / total as f64 * 100.0, 1),
            format_number(threshold, 1)
        ),
        None => INSUFFICIENT.to_string(),
    };
    finding("Rutting Distribution", detail)
}

fn asphalt_diversity(diversity: &[DiversitySummary]) -> Finding {
    let widest = max_by_key(diversity, |d| Some(d.unique_asphalt_types as f64));
    let detail = match widest {
        Some((d, _)) => format!(
            "{} roads use the widest variety of asphalt mixes ({} distinct types).",
            d.road_type,
            format_int(d.unique_asphalt_types)
        ),
        None => INSUFFICIENT.to_string(),
    };
    finding("Asphalt Diversity", detail)
}

fn maintenance_trends(trend: &[MaintenanceTrendPoint]) -> Finding {
    let (Some(first), Some(last)) = (trend.first(), trend.last()) else {
        return finding("Maintenance Trends", INSUFFICIENT.to_string());
    };
    let mid = trend.len() / 2;
    let pci_of = |points: &[MaintenanceTrendPoint]| {
        mean(&points.iter().filter_map(|p| p.pci).collect::<Vec<_>>())
    };
    let halves = match (pci_of(&trend[..mid]), pci_of(&trend[mid..])) {
        (Some(early), Some(late)) => format!(
            " Segments maintained in the earlier half of the period average PCI {}, \
             against {} for the later half.",
            format_number(early, 1),
            format_number(late, 1)
        ),
        _ => String::new(),
    };
    let detail = format!(
        "{} segments have a recorded maintenance date between {} and {}.{}",
        format_int(trend.len()),
        first.last_maintenance.format("%Y-%m-%d"),
        last.last_maintenance.format("%Y-%m-%d"),
        halves
    );
    finding("Maintenance Trends", detail)
}

/// Render findings as a numbered markdown list.
pub fn to_markdown(findings: &[Finding]) -> String {
    findings
        .iter()
        .enumerate()
        .map(|(i, f)| format!("{}. **{}**: {}", i + 1, f.title, f.detail))
        .collect::<Vec<_>>()
        .join("\n")
}
