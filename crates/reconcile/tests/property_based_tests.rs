//! Property-Based Tests
//!
//! Invariants of the reconciliation core checked over generated inputs:
//! - Grouping partitions the box set
//! - IoU is symmetric and never divides by zero
//! - Raising the threshold never joins a pair that was apart
//! - Pixel -> normalized -> pixel moves an edge by at most one pixel

use label_finder_reconcile::{
    find_box_groups, group_members, merge_boxes, to_absolute, to_normalized, BoundingBox,
    ImageSize,
};
use proptest::prelude::*;

/// Integer pixel boxes with non-negative extents inside a 2000x2000 sheet
fn pixel_box() -> impl Strategy<Value = BoundingBox> {
    (0u32..2000, 0u32..2000, 0u32..400, 0u32..400).prop_map(|(left, top, w, h)| {
        BoundingBox::new(
            f64::from(left),
            f64::from(top),
            f64::from(left + w),
            f64::from(top + h),
        )
    })
}

/// Boxes clustered in a small area so overlaps are common
fn crowded_box() -> impl Strategy<Value = BoundingBox> {
    (0u32..60, 0u32..60, 0u32..40, 0u32..40).prop_map(|(left, top, w, h)| {
        BoundingBox::new(
            f64::from(left),
            f64::from(top),
            f64::from(left + w),
            f64::from(top + h),
        )
    })
}

// ============================================================================
// Geometry Properties
// ============================================================================

#[test]
fn proptest_iou_symmetric_and_bounded() {
    proptest!(|(a in pixel_box(), b in pixel_box())| {
        let ab = a.iou(&b);
        let ba = b.iou(&a);
        prop_assert_eq!(ab, ba);
        prop_assert!((0.0..=1.0).contains(&ab));
    });
}

#[test]
fn proptest_zero_area_iou_is_zero() {
    proptest!(|(x in 0u32..100, y in 0u32..100, other in crowded_box())| {
        let point = BoundingBox::new(f64::from(x), f64::from(y), f64::from(x), f64::from(y));
        prop_assert_eq!(point.iou(&other), 0.0);
        prop_assert_eq!(other.iou(&point), 0.0);
        prop_assert_eq!(point.iou(&point), 0.0);
    });
}

// ============================================================================
// Grouping Properties
// ============================================================================

#[test]
fn proptest_groups_partition_boxes() {
    proptest!(|(input in prop::collection::vec(crowded_box(), 0..25), threshold in 0.0f64..=1.0)| {
        let groups = find_box_groups(&input, threshold).unwrap();
        prop_assert_eq!(groups.len(), input.len());

        let members = group_members(&groups);
        let mut seen: Vec<usize> = members.iter().flatten().copied().collect();
        seen.sort_unstable();
        prop_assert_eq!(seen, (0..input.len()).collect::<Vec<_>>());
        prop_assert!(members.iter().all(|m| !m.is_empty()));
    });
}

#[test]
fn proptest_matching_pairs_share_a_group() {
    proptest!(|(input in prop::collection::vec(crowded_box(), 0..20), threshold in 0.0f64..=1.0)| {
        let groups = find_box_groups(&input, threshold).unwrap();
        for i in 0..input.len() {
            for j in (i + 1)..input.len() {
                if input[i].iou(&input[j]) >= threshold {
                    prop_assert_eq!(groups[i], groups[j]);
                }
            }
        }
    });
}

#[test]
fn proptest_pairwise_threshold_monotonicity() {
    proptest!(|(a in crowded_box(), b in crowded_box(), low in 0.0f64..=1.0, high in 0.0f64..=1.0)| {
        let (low, high) = if low <= high { (low, high) } else { (high, low) };
        let pair = [a, b];
        let at_low = find_box_groups(&pair, low).unwrap();
        let at_high = find_box_groups(&pair, high).unwrap();

        // Apart at the lower threshold implies apart at the higher one
        if at_low[0] != at_low[1] {
            prop_assert_ne!(at_high[0], at_high[1]);
        }
    });
}

#[test]
fn proptest_merged_box_encloses_group() {
    proptest!(|(input in prop::collection::vec(crowded_box(), 1..10))| {
        let merged = merge_boxes(&input, 1.0).unwrap();
        for bbox in &input {
            prop_assert!(merged.left <= bbox.left && merged.top <= bbox.top);
            prop_assert!(merged.right >= bbox.right && merged.bottom >= bbox.bottom);
        }
    });
}

// ============================================================================
// Codec Properties
// ============================================================================

#[test]
fn proptest_codec_round_trip_within_one_pixel() {
    proptest!(|(bbox in pixel_box(), width in 1u32..5000, height in 1u32..5000)| {
        let size = ImageSize::new(width, height).unwrap();
        let back = to_absolute(&to_normalized(&bbox, size), size);

        prop_assert!((back.left - bbox.left).abs() <= 1.0, "left {} vs {}", back.left, bbox.left);
        prop_assert!((back.top - bbox.top).abs() <= 1.0, "top {} vs {}", back.top, bbox.top);
        prop_assert!((back.right - bbox.right).abs() <= 1.0, "right {} vs {}", back.right, bbox.right);
        prop_assert!((back.bottom - bbox.bottom).abs() <= 1.0, "bottom {} vs {}", back.bottom, bbox.bottom);
    });
}
