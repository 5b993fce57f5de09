//! `SplitChooser`: picks a split axis and plane offset from one or more
//! `AxisSummary`s, with a score used to compare candidates when evaluating
//! more than one axis.

use crate::vkdt::axis_summary::AxisSummary;
use crate::vkdt::node::Axis;

#[derive(Debug, Clone, Copy)]
pub struct SplitRecommendation {
    pub axis: Axis,
    /// Tree-local offset of the split plane; always strictly inside the
    /// node's extent along `axis`.
    pub offset: i32,
    pub score: f64,
}

/// offset = slices/2, clamped to >= 1; always scores zero.
pub fn offset_picker_blind_center(summary: &AxisSummary) -> SplitRecommendation {
    let num_slices = summary.solids_per_plane.len() as i32;
    let offset = (num_slices / 2).max(1);
    SplitRecommendation {
        axis: summary.axis,
        offset: summary.offset + offset,
        score: 0.0,
    }
}

/// Finds the longest run of equal values in `solids_per_plane` and places
/// the split at the run's end if it starts at index 0, otherwise at the
/// run's start. The score rewards larger, more decisive cuts and penalizes
/// an axis that is one single run end to end (it cannot meaningfully cut).
pub fn offset_picker_longest_run_bias(summary: &AxisSummary) -> SplitRecommendation {
    let solids = &summary.solids_per_plane;
    let num_slices = solids.len();

    let mut best_run_start = 0usize;
    let mut best_run_len = 0usize;
    let mut run_start = 0usize;
    for i in 1..=num_slices {
        let run_broken = i == num_slices || solids[i] != solids[run_start];
        if run_broken {
            let run_len = i - run_start;
            if run_len > best_run_len {
                best_run_len = run_len;
                best_run_start = run_start;
            }
            run_start = i;
        }
    }

    let whole_axis_is_one_run = best_run_len == num_slices;

    let raw_offset = if best_run_start == 0 {
        best_run_start + best_run_len
    } else {
        best_run_start
    };
    debug_assert!(num_slices >= 2, "an extent-1 axis has no valid split plane");
    let offset = (raw_offset as i32).clamp(1, num_slices as i32 - 1);

    let volume_to_split = summary.total_solid_count.max(0) as f64;
    let surface_area = summary.plane_area as f64;
    let run_length = best_run_len as f64;
    let mut score = volume_to_split * surface_area * run_length;
    if whole_axis_is_one_run {
        score = -score;
    }

    SplitRecommendation {
        axis: summary.axis,
        offset: summary.offset + offset,
        score,
    }
}

/// "Longest axis with lowest-index tiebreak": picks whichever axis extent is
/// largest, breaking ties toward X, then Y. Needs only the cuboid's extent,
/// not a table scan.
pub fn axis_picker_longest(extent: &crate::V3c<i32>) -> usize {
    let mut best = 0usize;
    for i in 1..3 {
        if extent.component(i) > extent.component(best) {
            best = i;
        }
    }
    best
}

/// Evaluates longest-run-bias on all three axes and returns the best-scored
/// recommendation; used when the build setting requests exhaustive search.
/// Axes with only one slice (extent 1) are excluded from candidacy: there is
/// no valid split plane strictly inside a single-slice axis, and including
/// one here could hand back an offset at the extent, producing a
/// zero-volume far child. A node only reaches this picker when its volume is
/// large enough to split, so at least one axis always has 2+ slices.
pub fn axis_picker_exhaustive(summaries: &[AxisSummary; 3]) -> SplitRecommendation {
    let mut best: Option<SplitRecommendation> = None;
    for summary in summaries {
        if summary.solids_per_plane.len() <= 1 {
            continue;
        }
        let candidate = offset_picker_longest_run_bias(summary);
        if best.map_or(true, |b| candidate.score > b.score) {
            best = Some(candidate);
        }
    }
    best.expect("a splittable node's volume >= 2 guarantees at least one axis has 2+ slices")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::voxel::Voxel;

    fn summary(axis: Axis, solids_per_plane: Vec<i64>) -> AxisSummary {
        let homogeneous = vec![Voxel::Empty; solids_per_plane.len()];
        AxisSummary {
            axis,
            offset: 0,
            plane_area: 32 * 32,
            plane_perimeter: 4 * 32,
            total_solid_count: solids_per_plane.iter().sum(),
            solids_per_plane,
            homogeneous_material_per_plane: homogeneous,
        }
    }

    #[test]
    fn slab_split_lands_at_the_run_boundary() {
        let mut solids = vec![1024i64; 16];
        solids.extend(vec![0i64; 16]);
        let summary = summary(Axis::Z, solids);
        let rec = offset_picker_longest_run_bias(&summary);
        assert_eq!(rec.offset, 16);
    }

    #[test]
    fn blind_center_ignores_data_entirely() {
        let summary = summary(Axis::X, vec![0, 5, 100, 3]);
        let rec = offset_picker_blind_center(&summary);
        assert_eq!(rec.offset, 2);
        assert_eq!(rec.score, 0.0);
    }

    #[test]
    fn uniform_axis_scores_negative() {
        let summary = summary(Axis::Y, vec![7, 7, 7, 7]);
        let rec = offset_picker_longest_run_bias(&summary);
        assert!(rec.score <= 0.0);
    }

    #[test]
    fn exhaustive_search_never_picks_an_extent_one_axis() {
        // A 1x4x1 cuboid: X and Z have a single slice each (tying at the
        // same negative "one whole run" score), Y has four uniform slices.
        // Only Y has a valid split plane.
        let x = summary(Axis::X, vec![4]);
        let y = summary(Axis::Y, vec![1, 1, 1, 1]);
        let z = summary(Axis::Z, vec![4]);
        let rec = axis_picker_exhaustive(&[x, y, z]);
        assert_eq!(rec.axis, Axis::Y);
        assert!(rec.offset >= 1 && rec.offset <= 3);
    }
}
