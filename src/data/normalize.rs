use super::model::{NormalizedSounding, RawSounding};
use super::schema::{DEPTH, PENETRATION_LENGTH};

// ---------------------------------------------------------------------------
// Reference frame normalisation
// ---------------------------------------------------------------------------

/// Place a raw sounding on the shared vertical datum.
///
/// Rows are stably sorted by `penetrationLength` first, so "last row" is
/// always the deepest penetration. Then per row
/// `referenceDepth = surfaceOffset - depth`, and the maximum explored
/// reference depth is that of the last row. A sounding without rows has
/// explored nothing below ground level, so its maximum is the offset itself.
pub fn normalize(mut raw: RawSounding) -> NormalizedSounding {
    raw.rows
        .sort_by(|a, b| a[PENETRATION_LENGTH].total_cmp(&b[PENETRATION_LENGTH]));

    let offset = raw.surface_offset;
    let reference_depth: Vec<f64> = raw.rows.iter().map(|row| offset - row[DEPTH]).collect();
    let max_explored = reference_depth.last().copied().unwrap_or(offset);

    log::debug!(
        "normalised {} rows, offset {offset}, deepest reference depth {max_explored}",
        raw.rows.len()
    );

    NormalizedSounding::from_parts(raw, reference_depth, max_explored)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::{OffsetSource, Row};
    use crate::data::schema::{CONE_RESISTANCE, COLUMN_COUNT, FRICTION_RATIO};

    fn row(penetration: f64, depth: f64, qc: f64, rf: f64) -> Row {
        let mut r = [0.0; COLUMN_COUNT];
        r[PENETRATION_LENGTH] = penetration;
        r[DEPTH] = depth;
        r[CONE_RESISTANCE] = qc;
        r[FRICTION_RATIO] = rf;
        r
    }

    #[test]
    fn test_reference_depth_per_row() {
        let raw = RawSounding::new(
            vec![row(0.0, 0.0, 1.0, 2.0), row(1.0, 1.0, 3.0, 4.0)],
            10.0,
            OffsetSource::Present,
        );
        let n = normalize(raw);
        assert_eq!(n.reference_depth(), &[10.0, 9.0]);
        assert_eq!(n.max_explored_reference_depth(), 9.0);
        assert_eq!(n.series(CONE_RESISTANCE), vec![(1.0, 10.0), (3.0, 9.0)]);
    }

    #[test]
    fn test_rows_are_sorted_by_penetration_before_taking_last() {
        let raw = RawSounding::new(
            vec![
                row(2.0, 1.9, 0.0, 0.0),
                row(0.0, 0.0, 0.0, 0.0),
                row(1.0, 0.95, 0.0, 0.0),
            ],
            -1.5,
            OffsetSource::Present,
        );
        let n = normalize(raw);
        let pen: Vec<f64> = n.raw().rows.iter().map(|r| r[PENETRATION_LENGTH]).collect();
        assert_eq!(pen, vec![0.0, 1.0, 2.0]);
        assert_eq!(n.max_explored_reference_depth(), -1.5 - 1.9);
        for (r, z) in n.raw().rows.iter().zip(n.reference_depth()) {
            assert_eq!(*z, -1.5 - r[DEPTH]);
        }
    }

    #[test]
    fn test_equal_penetration_keeps_source_order() {
        let raw = RawSounding::new(
            vec![row(1.0, 0.8, 0.0, 0.0), row(1.0, 0.9, 0.0, 0.0)],
            0.0,
            OffsetSource::Present,
        );
        let n = normalize(raw);
        let depth: Vec<f64> = n.raw().rows.iter().map(|r| r[DEPTH]).collect();
        assert_eq!(depth, vec![0.8, 0.9]);
        assert_eq!(n.max_explored_reference_depth(), -0.9);
    }

    #[test]
    fn test_empty_sounding_explores_nothing() {
        let n = normalize(RawSounding::new(Vec::new(), 3.0, OffsetSource::Defaulted));
        assert_eq!(n.len(), 0);
        assert_eq!(n.max_explored_reference_depth(), 3.0);
    }
}
