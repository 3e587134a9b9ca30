//! Part association: attributes each damage to the part box it overlaps most
use claimsight_core::{overlap, Detection, PartBox, PartMatch, PartName, Taxonomy};
use std::collections::HashMap;
use std::sync::Arc;

/// Minimum IoU a damage must exceed against its best part to be attributed.
///
/// Effectively "any non-zero overlap". Smaller values match more damages at
/// lower precision; larger values are more conservative.
pub const MIN_PART_OVERLAP: f64 = 0.01;

#[derive(Debug, Clone)]
pub struct PartAssociator {
    min_overlap: f64,
    taxonomy: Arc<Taxonomy>,
}

impl PartAssociator {
    pub fn new(taxonomy: Arc<Taxonomy>) -> Self {
        Self::with_min_overlap(taxonomy, MIN_PART_OVERLAP)
    }

    pub fn with_min_overlap(taxonomy: Arc<Taxonomy>, min_overlap: f64) -> Self {
        Self { min_overlap, taxonomy }
    }

    pub fn min_overlap(&self) -> f64 {
        self.min_overlap
    }

    /// One match at most per damage, in damage order. Damages whose best
    /// overlap does not exceed the threshold are dropped.
    pub fn associate(&self, damages: &[Detection], parts: &[PartBox]) -> Vec<PartMatch> {
        let mut matches = Vec::new();
        if damages.is_empty() || parts.is_empty() {
            return matches;
        }

        let mut occurrences: HashMap<PartName, u32> = HashMap::new();

        for damage in damages {
            let Some((part, best)) = best_part(damage, parts) else {
                continue;
            };
            if best <= self.min_overlap {
                tracing::debug!(
                    detection = %damage.id,
                    best,
                    "damage below part overlap threshold"
                );
                continue;
            }

            let part_name = self.taxonomy.part_label(part.class_id);
            let seq = occurrences.entry(part_name.clone()).or_insert(0);
            *seq += 1;

            matches.push(PartMatch {
                detection_id: damage.id,
                part_id: part_id(&part_name, *seq),
                part_name,
                damage_percentage: damage_percentage(damage, part),
                bbox: damage.bbox,
                damage_type: damage.damage_type.clone(),
            });
        }

        matches
    }
}

/// Part with the strictly greatest overlap; the first one seen wins ties.
fn best_part<'a>(damage: &Detection, parts: &'a [PartBox]) -> Option<(&'a PartBox, f64)> {
    let mut best: Option<(&PartBox, f64)> = None;

    for part in parts {
        let iou = overlap(&damage.bbox, &part.bbox);
        if iou > best.map_or(0.0, |(_, b)| b) {
            best = Some((part, iou));
        }
    }

    best
}

fn part_id(part_name: &PartName, seq: u32) -> String {
    let prefix: String = part_name.as_str().to_uppercase().chars().take(4).collect();
    format!("{}-{:03}", prefix, seq)
}

/// Share of the part box covered by the damage, 0-100
fn damage_percentage(damage: &Detection, part: &PartBox) -> u8 {
    let area = part.bbox.area();
    if area <= 0.0 {
        return 0;
    }
    let share = damage.bbox.intersection_area(&part.bbox) / area * 100.0;
    share.round().clamp(0.0, 100.0) as u8
}
