//! Integration tests for cohort dispatch.
//!
//! These tests verify:
//! - Batch and cohort counts for the reference scenario
//! - Workers are spawned lazily, one per cohort
//! - Tiles are resampled and placed at `coordinate / crop_scale`
//! - Pull-ahead consumers get the same results as sequential ones

use slide_crop::{plan, CropOptions, SlideCropDriver, SlideDimensions};

use super::test_utils::{drain_sequentially, reference_options, MockSlideBackend};

// =============================================================================
// Counts
// =============================================================================

#[tokio::test]
async fn test_reference_scenario_counts() {
    let backend = MockSlideBackend::new(2000, 1000);
    let driver = SlideCropDriver::open(backend, reference_options("slide.svs"))
        .await
        .unwrap();

    assert_eq!(driver.original_size(), (1000, 2000));
    assert_eq!(driver.predicted_size(), (500, 1000));

    let (cohorts, total_batches) = driver.crop(10).unwrap();
    assert_eq!(total_batches, 12);
    assert_eq!(cohorts.total_crops(), 120);
    assert_eq!(cohorts.len(), 3);

    let outcomes = drain_sequentially(cohorts).await;
    let sizes: Vec<usize> = outcomes.iter().map(|o| o.batch_sizes.len()).collect();
    assert_eq!(sizes, vec![5, 5, 2]);

    for outcome in &outcomes {
        assert!(outcome.batch_sizes.iter().all(|&len| len == 10));
    }
}

#[tokio::test]
async fn test_predicted_size_floors() {
    let backend = MockSlideBackend::new(1001, 999);
    let options = CropOptions::new("slide.svs")
        .with_tile_size(100)
        .with_crop_scale(4);
    let driver = SlideCropDriver::open(backend, options).await.unwrap();

    assert_eq!(driver.original_size(), (999, 1001));
    assert_eq!(driver.predicted_size(), (249, 250));
    assert_eq!(driver.summary(8).unwrap().predicted_size, (249, 250));
}

#[tokio::test]
async fn test_summary_matches_dispatch() {
    let backend = MockSlideBackend::new(2000, 1000);
    let driver = SlideCropDriver::open(backend, reference_options("slide.svs"))
        .await
        .unwrap();

    let summary = driver.summary(10).unwrap();
    assert_eq!(summary.dimensions, SlideDimensions::new(2000, 1000));
    assert_eq!(summary.grid, (8, 15));
    assert_eq!(summary.coordinates, 120);
    assert_eq!(summary.batches, 12);
    assert_eq!(summary.cohorts, 3);
    assert_eq!(summary.tiling.crop_size(), 200);
    assert_eq!(summary.overlap_size, 50.0);
    assert_eq!(summary.non_overlap_size, 150.0);

    // Only the dimensions worker has been spawned
    assert_eq!(driver.workers_spawned(), 1);
}

#[tokio::test]
async fn test_last_batch_shorter() {
    let backend = MockSlideBackend::new(2000, 1000);
    let driver = SlideCropDriver::open(backend, reference_options("slide.svs"))
        .await
        .unwrap();

    // 120 crops in batches of 7 -> 17 full batches and one of 1
    let (cohorts, total_batches) = driver.crop(7).unwrap();
    assert_eq!(total_batches, 18);

    let outcomes = drain_sequentially(cohorts).await;
    let sizes: Vec<usize> = outcomes
        .iter()
        .flat_map(|o| o.batch_sizes.iter().copied())
        .collect();
    assert_eq!(sizes.len(), 18);
    assert_eq!(sizes.iter().sum::<usize>(), 120);
    assert_eq!(sizes.last(), Some(&1));
}

// =============================================================================
// Laziness and Worker Rotation
// =============================================================================

#[tokio::test]
async fn test_dispatch_is_lazy() {
    let backend = MockSlideBackend::new(2000, 1000);
    let counters = backend.clone();
    let driver = SlideCropDriver::open(backend, reference_options("slide.svs"))
        .await
        .unwrap();

    // The dimensions worker opened the slide once to read its dimensions
    assert_eq!(counters.open_count(), 1);

    let (mut cohorts, _) = driver.crop(10).unwrap();
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
    assert_eq!(counters.open_count(), 1);
    assert_eq!(counters.read_count(), 0);
    assert_eq!(driver.workers_spawned(), 1);

    let first = cohorts.next().unwrap();
    assert_eq!(driver.workers_spawned(), 2);
    assert_eq!(cohorts.remaining_batches(), 7);

    for batch in first.into_batches() {
        assert!(batch.resolve().await.iter().all(Result::is_ok));
    }
    assert_eq!(counters.open_count(), 2);
    assert_eq!(counters.read_count(), 50);
}

#[tokio::test]
async fn test_fresh_worker_per_cohort() {
    let backend = MockSlideBackend::new(2000, 1000);
    let counters = backend.clone();
    let driver = SlideCropDriver::open(backend, reference_options("slide.svs"))
        .await
        .unwrap();

    let (cohorts, _) = driver.crop(10).unwrap();
    let outcomes = drain_sequentially(cohorts).await;

    let workers: Vec<usize> = outcomes.iter().map(|o| o.worker_id).collect();
    assert_eq!(workers, vec![1, 2, 3]);
    let indices: Vec<usize> = outcomes.iter().map(|o| o.index).collect();
    assert_eq!(indices, vec![0, 1, 2]);

    // One open for the dimensions worker plus one per cohort
    assert_eq!(counters.open_count(), 4);
    assert_eq!(counters.read_count(), 120);
}

#[tokio::test]
async fn test_crop_can_be_called_twice() {
    let backend = MockSlideBackend::new(2000, 1000);
    let driver = SlideCropDriver::open(backend, reference_options("slide.svs"))
        .await
        .unwrap();

    let (_, first) = driver.crop(10).unwrap();
    let (_, second) = driver.crop(40).unwrap();
    assert_eq!(first, 12);
    assert_eq!(second, 3);
}

// =============================================================================
// Results
// =============================================================================

#[tokio::test]
async fn test_results_follow_coordinate_order() {
    let backend = MockSlideBackend::new(2000, 1000);
    let driver = SlideCropDriver::open(backend, reference_options("slide.svs"))
        .await
        .unwrap();

    let expected = plan(driver.dimensions(), 200, 150.0).unwrap();
    let (cohorts, _) = driver.crop(10).unwrap();
    let outcomes = drain_sequentially(cohorts).await;

    let results: Vec<_> = outcomes
        .into_iter()
        .flat_map(|o| o.results)
        .map(Result::unwrap)
        .collect();
    assert_eq!(results.len(), expected.len());

    for (result, coordinate) in results.iter().zip(&expected) {
        assert_eq!(result.coordinate, *coordinate);
        assert_eq!(result.position.x, coordinate.x / 2);
        assert_eq!(result.position.y, coordinate.y / 2);
        assert_eq!(result.tile.dimensions(), (100, 100));
    }

    // The last crop is flush with the bottom-right corner
    let last = results.last().unwrap();
    assert_eq!((last.coordinate.x, last.coordinate.y), (1800, 800));
    assert_eq!((last.position.x, last.position.y), (900, 400));
}

#[tokio::test]
async fn test_tile_values_stay_in_source_range() {
    let backend = MockSlideBackend::new(512, 512);
    let options = CropOptions::new("slide.svs")
        .with_tile_size(64)
        .with_crop_scale(4)
        .with_overlap_ratio(0.0);
    let driver = SlideCropDriver::open(backend, options).await.unwrap();

    let (mut cohorts, _) = driver.crop(4).unwrap();
    let cohort = cohorts.next().unwrap();
    let batch = cohort.into_batches().into_iter().next().unwrap();
    let result = batch.into_pending().remove(0).await.unwrap();

    assert_eq!(result.coordinate.x, 0);
    assert_eq!(result.coordinate.y, 0);

    let max = result.tile.pixels().flat_map(|p| p.0).fold(0.0f32, f32::max);
    let min = result.tile.pixels().flat_map(|p| p.0).fold(255.0f32, f32::min);
    assert!(max > 200.0 && max <= 255.0, "max was {}", max);
    assert!(min >= 0.0);

    // Constant blue channel survives resampling
    let blue = result.tile.get_pixel(32, 32).0[2];
    assert!((blue - 64.0).abs() < 0.5, "blue was {}", blue);
}

#[tokio::test]
async fn test_crop_at_coarser_level() {
    let backend = MockSlideBackend::new(2000, 1000).with_levels(3);
    let counters = backend.clone();
    let options = reference_options("slide.svs").with_level(1);
    let driver = SlideCropDriver::open(backend, options).await.unwrap();

    assert_eq!(driver.original_size(), (500, 1000));

    let (cohorts, _) = driver.crop(10).unwrap();
    let outcomes = drain_sequentially(cohorts).await;
    let results: Vec<_> = outcomes.into_iter().flat_map(|o| o.results).collect();

    assert!(!results.is_empty());
    assert!(results.iter().all(Result::is_ok));
    assert_eq!(counters.read_count(), results.len());
}

// =============================================================================
// Pull-Ahead
// =============================================================================

#[tokio::test]
async fn test_pull_ahead_matches_sequential() {
    let backend = MockSlideBackend::new(2000, 1000);
    let driver = SlideCropDriver::open(backend, reference_options("slide.svs"))
        .await
        .unwrap();

    // Dispatch every cohort before resolving any of them
    let (cohorts, _) = driver.crop(10).unwrap();
    let dispatched: Vec<_> = cohorts.collect();
    assert_eq!(dispatched.len(), 3);
    assert_eq!(driver.workers_spawned(), 4);

    let mut positions = Vec::new();
    for cohort in dispatched {
        for batch in cohort.into_batches() {
            for result in batch.resolve().await {
                positions.push(result.unwrap().position);
            }
        }
    }

    let (cohorts, _) = driver.crop(10).unwrap();
    let sequential: Vec<_> = drain_sequentially(cohorts)
        .await
        .into_iter()
        .flat_map(|o| o.results)
        .map(|r| r.unwrap().position)
        .collect();

    assert_eq!(positions, sequential);
}
