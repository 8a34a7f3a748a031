use std::cmp::Ordering;
use std::collections::BTreeSet;

use super::model::{ConstraintRow, Dataset, Query, ResultSet, StructuralFilter, StructureKind};
use crate::config::PREFERRED_FRACTION;
use crate::error::InvalidSelectionError;

// ---------------------------------------------------------------------------
// Selector options
// ---------------------------------------------------------------------------

/// Distinct fraction counts present in the table, ascending.
pub fn fraction_options(dataset: &Dataset) -> Vec<u32> {
    dataset
        .rows()
        .iter()
        .filter_map(|row| row.fractions)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// [`PREFERRED_FRACTION`] when offered, otherwise the smallest option.
pub fn default_fraction(options: &[u32]) -> Option<u32> {
    if options.contains(&PREFERRED_FRACTION) {
        Some(PREFERRED_FRACTION)
    } else {
        options.first().copied()
    }
}

/// Distinct organs reachable for `(fraction, filter)`, in ordinal order.
pub fn organ_options(dataset: &Dataset, fraction: u32, filter: StructuralFilter) -> Vec<String> {
    candidates(dataset, fraction, filter)
        .map(|row| row.tissue.as_str())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}

/// Keep `previous` if it is still offered, otherwise fall back to the first
/// option. `None` means there is nothing to select.
pub fn resolve_organ(options: &[String], previous: Option<&str>) -> Option<String> {
    match previous {
        Some(organ) if options.iter().any(|o| o == organ) => Some(organ.to_string()),
        _ => {
            if let Some(stale) = previous {
                log::debug!("Selection '{stale}' no longer offered; resetting");
            }
            options.first().cloned()
        }
    }
}

// ---------------------------------------------------------------------------
// Row selection
// ---------------------------------------------------------------------------

/// Rows eligible for a fraction count before organ selection, in source order.
///
/// Parallel-organ rows are fraction-independent: they are offered for every
/// fraction count. Serial rows (and rows of unrecognised type) must match
/// `fraction` exactly. Rows without a fraction count are never offered.
fn candidates(
    dataset: &Dataset,
    fraction: u32,
    filter: StructuralFilter,
) -> impl Iterator<Item = &ConstraintRow> {
    dataset.rows().iter().filter(move |row| {
        let kind = row.kind();
        let in_scheme = match (kind, row.fractions) {
            (_, None) => false,
            (StructureKind::Parallel, Some(_)) => true,
            (_, Some(fx)) => fx == fraction,
        };
        in_scheme && filter.admits(kind)
    })
}

/// Constraint rows for one organ under one fractionation scheme.
///
/// An empty candidate set yields an empty [`ResultSet`]. Otherwise `organ`
/// must be one of [`organ_options`] for the same `(fraction, filter)`.
///
/// Rows are ordered by `Occ` when the table has that column and any selected
/// row carries a value (rows without one go last), else by type; ties keep
/// source order.
pub fn select(
    dataset: &Dataset,
    fraction: u32,
    filter: StructuralFilter,
    organ: &str,
) -> Result<ResultSet, InvalidSelectionError> {
    let pool: Vec<&ConstraintRow> = candidates(dataset, fraction, filter).collect();

    let query = Query {
        fraction,
        filter,
        organ: organ.to_string(),
    };

    if pool.is_empty() {
        return Ok(ResultSet {
            query,
            rows: Vec::new(),
        });
    }

    let mut rows: Vec<ConstraintRow> = pool
        .into_iter()
        .filter(|row| row.tissue == organ)
        .cloned()
        .collect();

    if rows.is_empty() {
        return Err(InvalidSelectionError {
            organ: query.organ,
            fraction,
            filter,
        });
    }

    if dataset.has_occurrence_column() && rows.iter().any(|row| row.occurrence.is_some()) {
        rows.sort_by(|a, b| {
            cmp_occurrence(a.occurrence, b.occurrence).then(a.source_index.cmp(&b.source_index))
        });
    } else {
        rows.sort_by_cached_key(|row| (row.type_label.to_lowercase(), row.source_index));
    }

    Ok(ResultSet { query, rows })
}

fn cmp_occurrence(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => x.total_cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(fractions: Option<u32>, type_label: &str, tissue: &str) -> ConstraintRow {
        ConstraintRow {
            fractions,
            tissue: tissue.to_string(),
            type_label: type_label.to_string(),
            contouring_instructions: "Not given".to_string(),
            volume: String::new(),
            volume_max_gy: String::new(),
            max_point_dose_gy: String::new(),
            endpoint: String::new(),
            occurrence: None,
            source_index: 0,
        }
    }

    fn dataset(mut rows: Vec<ConstraintRow>) -> Dataset {
        for (i, r) in rows.iter_mut().enumerate() {
            r.source_index = i;
        }
        let has_occ = rows.iter().any(|r| r.occurrence.is_some());
        Dataset::new(rows, has_occ)
    }

    fn tissues_and_types(rs: &ResultSet) -> Vec<(String, String)> {
        rs.rows
            .iter()
            .map(|r| (r.tissue.clone(), r.type_label.clone()))
            .collect()
    }

    #[test]
    fn test_single_serial_row_returned_as_given() {
        let mut r = row(Some(3), "Serial", "Spinal Cord");
        r.volume_max_gy = "18".to_string();
        let ds = dataset(vec![r]);

        let rs = select(&ds, 3, StructuralFilter::All, "Spinal Cord").unwrap();
        assert_eq!(rs.rows.len(), 1);
        let got = &rs.rows[0];
        assert_eq!(got.type_label, "Serial");
        assert_eq!(got.volume_max_gy, "18");
        assert_eq!(got.volume, "");
        assert_eq!(got.max_point_dose_gy, "");
        assert_eq!(got.endpoint, "");
        assert_eq!(rs.query.organ, "Spinal Cord");
    }

    #[test]
    fn test_parallel_rows_ignore_fraction_count() {
        let ds = dataset(vec![
            row(Some(5), "parallel", "Lung"),
            row(Some(3), "serial", "Lung"),
        ]);

        let all = select(&ds, 3, StructuralFilter::All, "Lung").unwrap();
        assert_eq!(all.rows.len(), 2);

        let serial = select(&ds, 3, StructuralFilter::SerialOnly, "Lung").unwrap();
        assert_eq!(
            tissues_and_types(&serial),
            vec![("Lung".to_string(), "serial".to_string())]
        );

        let parallel = select(&ds, 1, StructuralFilter::ParallelOnly, "Lung").unwrap();
        assert_eq!(
            tissues_and_types(&parallel),
            vec![("Lung".to_string(), "parallel".to_string())]
        );
    }

    #[test]
    fn test_parallel_row_present_for_every_other_fraction() {
        let ds = dataset(vec![
            row(Some(1), "Serial", "Spinal Cord"),
            row(Some(3), "Serial", "Spinal Cord"),
            row(Some(5), "Parallel", "Liver"),
        ]);
        for fx in [1, 2, 3, 4, 8] {
            let rs = select(&ds, fx, StructuralFilter::All, "Liver").unwrap();
            assert_eq!(rs.rows.len(), 1, "fraction {fx}");
            assert!(organ_options(&ds, fx, StructuralFilter::All).contains(&"Liver".to_string()));
        }
    }

    #[test]
    fn test_serial_rows_are_fraction_specific() {
        let ds = dataset(vec![
            row(Some(1), "Serial", "Spinal Cord"),
            row(Some(3), "Serial", "Spinal Cord"),
            row(Some(3), "Serial", "Trachea"),
        ]);
        let rs = select(&ds, 1, StructuralFilter::All, "Spinal Cord").unwrap();
        assert_eq!(rs.rows.len(), 1);
        assert_eq!(rs.rows[0].fractions, Some(1));
        assert_eq!(organ_options(&ds, 1, StructuralFilter::All), vec!["Spinal Cord"]);
    }

    #[test]
    fn test_stale_organ_is_rejected() {
        let ds = dataset(vec![
            row(Some(3), "Serial", "Spinal Cord"),
            row(Some(3), "Parallel", "Lung"),
        ]);
        let err = select(&ds, 3, StructuralFilter::SerialOnly, "Lung").unwrap_err();
        assert_eq!(err.organ, "Lung");
        assert_eq!(err.fraction, 3);
        assert_eq!(err.filter, StructuralFilter::SerialOnly);

        assert!(select(&ds, 3, StructuralFilter::All, "Kidney").is_err());
    }

    #[test]
    fn test_no_candidates_is_empty_not_error() {
        let ds = dataset(vec![row(Some(3), "Serial", "Spinal Cord")]);
        let rs = select(&ds, 8, StructuralFilter::All, "Spinal Cord").unwrap();
        assert!(rs.is_empty());
        assert!(organ_options(&ds, 8, StructuralFilter::All).is_empty());
    }

    #[test]
    fn test_unrecognised_type_only_under_all() {
        let ds = dataset(vec![
            row(Some(3), "Serial", "Skin"),
            row(Some(3), "Mixed", "Skin"),
        ]);
        assert_eq!(select(&ds, 3, StructuralFilter::All, "Skin").unwrap().rows.len(), 2);
        assert_eq!(select(&ds, 3, StructuralFilter::SerialOnly, "Skin").unwrap().rows.len(), 1);
        assert!(organ_options(&ds, 3, StructuralFilter::ParallelOnly).is_empty());
    }

    #[test]
    fn test_rows_without_fractions_never_selected() {
        let ds = dataset(vec![
            row(None, "Parallel", "Kidney"),
            row(None, "Serial", "Ureter"),
            row(Some(3), "Serial", "Heart"),
        ]);
        assert_eq!(fraction_options(&ds), vec![3]);
        assert_eq!(organ_options(&ds, 3, StructuralFilter::All), vec!["Heart"]);
        assert!(select(&ds, 3, StructuralFilter::All, "Kidney").is_err());
    }

    #[test]
    fn test_organ_options_sorted_ordinally() {
        let ds = dataset(vec![
            row(Some(3), "Serial", "bowel"),
            row(Some(3), "Serial", "Trachea"),
            row(Some(3), "Serial", "Bladder wall"),
            row(Some(3), "Serial", "Trachea"),
        ]);
        assert_eq!(
            organ_options(&ds, 3, StructuralFilter::All),
            vec!["Bladder wall", "Trachea", "bowel"]
        );
    }

    #[test]
    fn test_order_by_occurrence_then_source() {
        let mut a = row(Some(3), "Serial", "Heart");
        a.occurrence = Some(2.0);
        a.endpoint = "a".into();
        let mut b = row(Some(3), "Serial", "Heart");
        b.occurrence = None;
        b.endpoint = "b".into();
        let mut c = row(Some(3), "Serial", "Heart");
        c.occurrence = Some(1.0);
        c.endpoint = "c".into();
        let mut d = row(Some(3), "Serial", "Heart");
        d.occurrence = Some(2.0);
        d.endpoint = "d".into();
        let ds = dataset(vec![a, b, c, d]);

        let rs = select(&ds, 3, StructuralFilter::All, "Heart").unwrap();
        let order: Vec<_> = rs.rows.iter().map(|r| r.endpoint.as_str()).collect();
        assert_eq!(order, vec!["c", "a", "d", "b"]);
    }

    #[test]
    fn test_occurrence_ignored_without_occ_column() {
        let mut a = row(Some(3), "Serial", "Lung");
        a.occurrence = Some(1.0);
        let mut b = row(Some(3), "Parallel", "Lung");
        b.occurrence = Some(2.0);
        let mut rows = vec![a, b];
        for (i, r) in rows.iter_mut().enumerate() {
            r.source_index = i;
        }
        let ds = Dataset::new(rows, false);

        let rs = select(&ds, 3, StructuralFilter::All, "Lung").unwrap();
        let order: Vec<_> = rs.rows.iter().map(|r| r.type_label.as_str()).collect();
        assert_eq!(order, vec!["Parallel", "Serial"]);
    }

    #[test]
    fn test_footnote_rows_never_offered_or_selected() {
        let mut footnote = row(Some(3), "  Serial ", "*footnote text");
        footnote.contouring_instructions = String::new();
        let ds = dataset(vec![footnote, row(Some(3), "Serial", "Heart")]);

        assert_eq!(organ_options(&ds, 3, StructuralFilter::All), vec!["Heart"]);
        assert!(select(&ds, 3, StructuralFilter::All, "*footnote text").is_err());
    }

    #[test]
    fn test_order_by_type_without_occurrence() {
        let ds = dataset(vec![
            row(Some(3), "Serial", "Lung"),
            row(Some(5), "Parallel", "Lung"),
            row(Some(3), "serial", "Lung"),
            row(Some(1), "parallel", "Lung"),
        ]);
        let rs = select(&ds, 3, StructuralFilter::All, "Lung").unwrap();
        let order: Vec<_> = rs.rows.iter().map(|r| r.source_index).collect();
        assert_eq!(order, vec![1, 3, 0, 2]);
    }

    #[test]
    fn test_select_is_deterministic() {
        let ds = dataset(vec![
            row(Some(3), "Serial", "Lung"),
            row(Some(5), "Parallel", "Lung"),
            row(Some(1), "Parallel", "Lung"),
        ]);
        let first = select(&ds, 3, StructuralFilter::All, "Lung").unwrap();
        for _ in 0..10 {
            assert_eq!(select(&ds, 3, StructuralFilter::All, "Lung").unwrap(), first);
        }
    }

    #[test]
    fn test_fraction_options_and_default() {
        let ds = dataset(vec![
            row(Some(5), "Serial", "A"),
            row(Some(1), "Serial", "B"),
            row(Some(3), "Serial", "C"),
            row(Some(5), "Parallel", "D"),
        ]);
        let opts = fraction_options(&ds);
        assert_eq!(opts, vec![1, 3, 5]);
        assert_eq!(default_fraction(&opts), Some(3));
        assert_eq!(default_fraction(&[1, 5]), Some(1));
        assert_eq!(default_fraction(&[]), None);
    }

    #[test]
    fn test_resolve_organ() {
        let opts = vec!["Heart".to_string(), "Lung".to_string()];
        assert_eq!(resolve_organ(&opts, Some("Lung")), Some("Lung".to_string()));
        assert_eq!(resolve_organ(&opts, Some("Kidney")), Some("Heart".to_string()));
        assert_eq!(resolve_organ(&opts, None), Some("Heart".to_string()));
        assert_eq!(resolve_organ(&[], Some("Lung")), None);
    }

    #[test]
    fn test_select_leaves_dataset_untouched() {
        let ds = dataset(vec![
            row(Some(3), "Serial", "Lung"),
            row(Some(5), "Parallel", "Lung"),
        ]);
        let before = ds.clone();
        let _ = select(&ds, 3, StructuralFilter::All, "Lung");
        let _ = select(&ds, 3, StructuralFilter::All, "Nope");
        assert_eq!(ds, before);
    }
}
