//! Property tests for grid planning and batch partitioning.
//!
//! These tests verify, for arbitrary valid inputs:
//! - Every pixel of the slide is covered by at least one crop
//! - Every crop lies inside the slide
//! - Batches and cohorts partition the coordinates without loss

use proptest::prelude::*;

use slide_crop::{grid_shape, plan, BatchScheduler, CropCoordinate, SlideDimensions, TilingParameters};

/// Sorted distinct offsets along one axis.
fn axis_offsets(coordinates: &[CropCoordinate], axis: impl Fn(&CropCoordinate) -> u32) -> Vec<u32> {
    let mut offsets: Vec<u32> = coordinates.iter().map(axis).collect();
    offsets.sort_unstable();
    offsets.dedup();
    offsets
}

/// Whether crops at `offsets` cover `[0, extent)`.
fn covers(offsets: &[u32], crop_size: u32, extent: u32) -> bool {
    let mut reached = 0u32;
    for &offset in offsets {
        if offset > reached {
            return false;
        }
        reached = reached.max(offset + crop_size);
    }
    reached >= extent
}

fn tiling_strategy() -> impl Strategy<Value = TilingParameters> {
    (16u32..64, 1u32..4, 0.0f64..0.75)
        .prop_map(|(tile, scale, ratio)| TilingParameters::new(tile, scale, ratio).unwrap())
}

proptest! {
    /// Property: the union of all crops covers the whole slide
    #[test]
    fn grid_covers_slide(
        tiling in tiling_strategy(),
        extra_width in 0u32..600,
        extra_height in 0u32..600,
    ) {
        let crop = tiling.crop_size();
        let dims = SlideDimensions::new(crop + extra_width, crop + extra_height);
        let coordinates = plan(dims, crop, tiling.non_overlap_size()).unwrap();

        // The grid is a product of per-axis offsets, so per-axis coverage suffices
        let xs = axis_offsets(&coordinates, |c| c.x);
        let ys = axis_offsets(&coordinates, |c| c.y);
        prop_assert!(covers(&xs, crop, dims.width), "x offsets {:?} miss part of {}", xs, dims.width);
        prop_assert!(covers(&ys, crop, dims.height), "y offsets {:?} miss part of {}", ys, dims.height);
    }

    /// Property: every crop lies inside the slide and the last ones are flush
    #[test]
    fn grid_stays_in_bounds(
        tiling in tiling_strategy(),
        extra_width in 0u32..600,
        extra_height in 0u32..600,
    ) {
        let crop = tiling.crop_size();
        let dims = SlideDimensions::new(crop + extra_width, crop + extra_height);
        let coordinates = plan(dims, crop, tiling.non_overlap_size()).unwrap();

        for c in &coordinates {
            prop_assert!(c.x + crop <= dims.width);
            prop_assert!(c.y + crop <= dims.height);
        }

        let last = coordinates.last().unwrap();
        prop_assert_eq!(last.x, dims.width - crop);
        prop_assert_eq!(last.y, dims.height - crop);
    }

    /// Property: the coordinate count is rows x cols
    #[test]
    fn grid_count_matches_shape(
        tiling in tiling_strategy(),
        extra_width in 0u32..600,
        extra_height in 0u32..600,
    ) {
        let crop = tiling.crop_size();
        let dims = SlideDimensions::new(crop + extra_width, crop + extra_height);
        let coordinates = plan(dims, crop, tiling.non_overlap_size()).unwrap();
        let (rows, cols) = grid_shape(dims, tiling.non_overlap_size());

        prop_assert_eq!(coordinates.len(), rows * cols);

        // Row-major: y never decreases
        prop_assert!(coordinates.windows(2).all(|w| w[0].y <= w[1].y));
    }

    /// Property: crop_size is tile_size x crop_scale
    #[test]
    fn crop_size_is_product(tiling in tiling_strategy()) {
        prop_assert_eq!(tiling.crop_size(), tiling.tile_size() * tiling.crop_scale());
        prop_assert!(tiling.non_overlap_size() > 0.0);
    }

    /// Property: batches and cohorts partition the input in order
    #[test]
    fn batches_partition_coordinates(
        len in 0u32..500,
        batch_size in 1usize..40,
        cohort_size in 1usize..10,
    ) {
        let scheduler = BatchScheduler::new(batch_size, cohort_size).unwrap();
        let coordinates: Vec<CropCoordinate> = (0..len).map(|i| CropCoordinate::new(i, 0)).collect();
        let cohorts = scheduler.plan(&coordinates);

        let batches = scheduler.batch_count(coordinates.len());
        prop_assert_eq!(batches, coordinates.len().div_ceil(batch_size));
        prop_assert_eq!(cohorts.len(), scheduler.cohort_count(batches));

        let all_batches: Vec<&Vec<CropCoordinate>> = cohorts.iter().flatten().collect();
        prop_assert_eq!(all_batches.len(), batches);
        if let Some((last, rest)) = all_batches.split_last() {
            prop_assert!(rest.iter().all(|b| b.len() == batch_size));
            prop_assert!(!last.is_empty() && last.len() <= batch_size);
        }
        if let Some((last, rest)) = cohorts.split_last() {
            prop_assert!(rest.iter().all(|c| c.len() == cohort_size));
            prop_assert!(!last.is_empty() && last.len() <= cohort_size);
        }

        let flattened: Vec<CropCoordinate> = cohorts.into_iter().flatten().flatten().collect();
        prop_assert_eq!(flattened, coordinates);
    }
}

// =============================================================================
// Reference Scenario
// =============================================================================

#[test]
fn test_reference_grid() {
    let tiling = TilingParameters::new(100, 2, 0.25).unwrap();
    let dims = SlideDimensions::new(2000, 1000);
    let coordinates = plan(dims, tiling.crop_size(), tiling.non_overlap_size()).unwrap();

    assert_eq!(grid_shape(dims, tiling.non_overlap_size()), (8, 15));
    assert_eq!(coordinates.len(), 120);

    let xs = axis_offsets(&coordinates, |c| c.x);
    let ys = axis_offsets(&coordinates, |c| c.y);
    assert_eq!(xs.last(), Some(&1800));
    assert_eq!(ys.last(), Some(&800));
    assert_eq!(&ys, &[0, 150, 300, 450, 600, 750, 800]);
}
