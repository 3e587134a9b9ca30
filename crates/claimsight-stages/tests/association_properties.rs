//! Property-based tests for overlap and part association over random boxes.

use claimsight_core::{
    overlap, BoundingBox, DamageType, Detection, DetectionId, PartBox, Taxonomy,
};
use claimsight_stages::PartAssociator;
use proptest::prelude::*;
use std::collections::HashSet;
use std::sync::Arc;

/// Boxes on a 0..500 canvas, including degenerate and inverted ones
fn any_box() -> impl Strategy<Value = BoundingBox> {
    (0.0..500.0f64, 0.0..500.0f64, 0.0..500.0f64, 0.0..500.0f64)
        .prop_map(|(x1, y1, x2, y2)| BoundingBox::from([x1, y1, x2, y2]))
}

/// Well-formed boxes with positive width and height
fn proper_box() -> impl Strategy<Value = BoundingBox> {
    (0.0..400.0f64, 0.0..400.0f64, 1.0..100.0f64, 1.0..100.0f64)
        .prop_map(|(x, y, w, h)| BoundingBox::from([x, y, x + w, y + h]))
}

fn detections(boxes: Vec<BoundingBox>) -> Vec<Detection> {
    boxes
        .into_iter()
        .enumerate()
        .map(|(i, bbox)| Detection {
            id: DetectionId(i as u32),
            bbox,
            confidence: 0.9,
            damage_type: DamageType::new("dent"),
        })
        .collect()
}

fn part_boxes(boxes: Vec<(BoundingBox, u32)>) -> Vec<PartBox> {
    boxes
        .into_iter()
        .map(|(bbox, class_id)| PartBox { bbox, class_id })
        .collect()
}

// ============================================================================
// Overlap
// ============================================================================

#[test]
fn proptest_overlap_is_symmetric_and_bounded() {
    proptest!(|(a in any_box(), b in any_box())| {
        let ab = overlap(&a, &b);
        let ba = overlap(&b, &a);

        prop_assert_eq!(ab, ba);
        prop_assert!((0.0..=1.0).contains(&ab), "overlap {} out of range", ab);
    });
}

#[test]
fn proptest_box_fully_overlaps_itself() {
    proptest!(|(a in proper_box())| {
        prop_assert!((overlap(&a, &a) - 1.0).abs() < 1e-9);
    });
}

// ============================================================================
// Association
// ============================================================================

#[test]
fn proptest_at_most_one_match_per_damage() {
    let associator = PartAssociator::new(Arc::new(Taxonomy::builtin().clone()));

    proptest!(|(
        damages in prop::collection::vec(proper_box(), 0..8),
        parts in prop::collection::vec((proper_box(), 0u32..18), 0..8),
    )| {
        let damages = detections(damages);
        let parts = part_boxes(parts);
        let matches = associator.associate(&damages, &parts);

        prop_assert!(matches.len() <= damages.len());

        let mut seen = HashSet::new();
        for m in &matches {
            prop_assert!(seen.insert(m.detection_id), "{} matched twice", m.detection_id);
            prop_assert!(m.damage_percentage <= 100);
        }

        // Damage order is preserved
        let ids: Vec<u32> = matches.iter().map(|m| m.detection_id.0).collect();
        let mut sorted = ids.clone();
        sorted.sort_unstable();
        prop_assert_eq!(ids, sorted);
    });
}

#[test]
fn proptest_every_match_clears_the_threshold() {
    let associator = PartAssociator::new(Arc::new(Taxonomy::builtin().clone()));

    proptest!(|(
        damages in prop::collection::vec(proper_box(), 1..6),
        parts in prop::collection::vec((proper_box(), 0u32..18), 1..6),
    )| {
        let damages = detections(damages);
        let parts = part_boxes(parts);

        for m in associator.associate(&damages, &parts) {
            let damage = &damages[m.detection_id.0 as usize];
            let best = parts
                .iter()
                .map(|p| overlap(&damage.bbox, &p.bbox))
                .fold(0.0, f64::max);
            prop_assert!(best > associator.min_overlap());
        }
    });
}
