use std::collections::HashMap;
use std::f32::consts::{FRAC_PI_2, PI, TAU};

use crate::{MIN_GROUP_SEPARATION, Point, RING_PHASE, RING_SPACING, Viewport};

/// Compute the base anchor position for each team.
///
/// The first team sits at the viewport center; later teams fill concentric
/// rings of hexagonal capacity (6, 12, 18, ...), each ring completed before
/// the next is started. Members of a ring are evenly spaced, with a per-ring
/// phase offset so successive rings do not line up on the same axes. Output
/// is a pure function of the group ordering and viewport, so repeated calls
/// (for example on every resize) are bit-identical.
pub fn compute_anchors(groups: &[String], viewport: Viewport) -> HashMap<String, Point> {
    let mut anchors = HashMap::with_capacity(groups.len());
    let Some((first, rest)) = groups.split_first() else {
        return anchors;
    };

    let center = viewport.center();
    anchors.insert(first.clone(), center);

    let mut remaining = rest;
    let mut ring = 0usize;
    let mut radius = 0.0f32;
    while !remaining.is_empty() {
        ring += 1;
        let count = remaining.len().min(6 * ring);
        radius = ring_radius(radius, count);
        let phase = ring as f32 * RING_PHASE - FRAC_PI_2;

        for (slot, key) in remaining[..count].iter().enumerate() {
            let angle = phase + slot as f32 / count as f32 * TAU;
            anchors.insert(
                key.clone(),
                Point {
                    x: center.x + radius * angle.cos(),
                    y: center.y + radius * angle.sin(),
                },
            );
        }

        remaining = &remaining[count..];
    }

    anchors
}

/// A ring sits at least RING_SPACING outside the previous one, widened when
/// the chord between adjacent members would dip below the minimum
/// separation.
fn ring_radius(previous: f32, count: usize) -> f32 {
    let stepped = previous + RING_SPACING;
    if count < 2 {
        return stepped;
    }
    let chord = MIN_GROUP_SEPARATION / (2.0 * (PI / count as f32).sin());
    stepped.max(chord)
}

/// Anchor state for one simulation run: base positions from
/// [`compute_anchors`] plus the offsets accumulated from user interaction.
///
/// The effective anchor of a group is `base + group offset + global offset`.
/// Group offsets are written only by per-entity drags; the global offset is
/// written only by pans. Both survive a viewport resize; only the bases are
/// recomputed.
#[derive(Debug, Clone)]
pub struct AnchorSet {
    bases: HashMap<String, Point>,
    group_offsets: HashMap<String, Point>,
    global_offset: Point,
}

impl AnchorSet {
    pub fn new(groups: &[String], viewport: Viewport) -> Self {
        Self {
            bases: compute_anchors(groups, viewport),
            group_offsets: HashMap::new(),
            global_offset: Point::ZERO,
        }
    }

    /// Replace base positions for a new viewport, preserving offsets.
    pub fn recompute(&mut self, groups: &[String], viewport: Viewport) {
        self.bases = compute_anchors(groups, viewport);
    }

    pub fn effective(&self, group: &str) -> Option<Point> {
        let base = self.bases.get(group)?;
        let offset = self
            .group_offsets
            .get(group)
            .copied()
            .unwrap_or(Point::ZERO);
        Some(Point {
            x: base.x + offset.x + self.global_offset.x,
            y: base.y + offset.y + self.global_offset.y,
        })
    }

    pub fn base(&self, group: &str) -> Option<Point> {
        self.bases.get(group).copied()
    }

    pub fn group_offset(&self, group: &str) -> Point {
        self.group_offsets
            .get(group)
            .copied()
            .unwrap_or(Point::ZERO)
    }

    pub fn global_offset(&self) -> Point {
        self.global_offset
    }

    pub fn shift_group(&mut self, group: &str, dx: f32, dy: f32) {
        let offset = self
            .group_offsets
            .entry(group.to_string())
            .or_insert(Point::ZERO);
        offset.x += dx;
        offset.y += dy;
    }

    pub fn shift_all(&mut self, dx: f32, dy: f32) {
        self.global_offset.x += dx;
        self.global_offset.y += dy;
    }

    pub fn len(&self) -> usize {
        self.bases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bases.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn groups(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("T{i}")).collect()
    }

    #[test]
    fn no_groups_yields_no_anchors() {
        let anchors = compute_anchors(&[], Viewport::new(800.0, 500.0));
        assert!(anchors.is_empty());
    }

    #[test]
    fn single_group_sits_at_viewport_center() {
        let anchors = compute_anchors(&groups(1), Viewport::new(800.0, 500.0));
        assert_eq!(anchors["T0"], Point::new(400.0, 250.0));
    }

    #[test]
    fn first_ring_holds_six_groups() {
        let viewport = Viewport::new(800.0, 500.0);
        let anchors = compute_anchors(&groups(7), viewport);
        let center = viewport.center();
        for i in 1..7 {
            let d = anchors[&format!("T{i}")].distance(center);
            assert!((d - RING_SPACING).abs() < 0.01, "ring-1 radius was {d}");
        }
    }

    #[test]
    fn eighth_group_starts_the_second_ring() {
        let viewport = Viewport::new(800.0, 500.0);
        let anchors = compute_anchors(&groups(8), viewport);
        let d = anchors["T7"].distance(viewport.center());
        assert!(d > RING_SPACING * 1.5, "second ring radius was {d}");
    }

    #[test]
    fn offsets_compose_into_effective_anchor() {
        let mut anchors = AnchorSet::new(&groups(2), Viewport::new(800.0, 500.0));
        let base = anchors.base("T1").unwrap();

        anchors.shift_group("T1", 10.0, -5.0);
        anchors.shift_all(3.0, 3.0);

        let effective = anchors.effective("T1").unwrap();
        assert_eq!(effective, Point::new(base.x + 13.0, base.y - 2.0));

        // T0 only picks up the global offset.
        let t0 = anchors.effective("T0").unwrap();
        let t0_base = anchors.base("T0").unwrap();
        assert_eq!(t0, Point::new(t0_base.x + 3.0, t0_base.y + 3.0));
    }

    #[test]
    fn recompute_preserves_offsets() {
        let keys = groups(3);
        let mut anchors = AnchorSet::new(&keys, Viewport::new(800.0, 500.0));
        anchors.shift_group("T2", 40.0, 0.0);
        anchors.shift_all(0.0, -12.0);

        anchors.recompute(&keys, Viewport::new(400.0, 300.0));

        assert_eq!(anchors.base("T0").unwrap(), Point::new(200.0, 150.0));
        assert_eq!(anchors.group_offset("T2"), Point::new(40.0, 0.0));
        assert_eq!(anchors.global_offset(), Point::new(0.0, -12.0));
    }
}
