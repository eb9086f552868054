use std::collections::HashMap;

use crate::layout::AnchorSet;
use crate::{
    ALPHA_DECAY, ALPHA_MIN, ANCHOR_STRENGTH, CHARGE_STRENGTH, CLAMP_PULL, COLLIDE_ITERATIONS,
    COLLIDE_PADDING, MAX_ANCHOR_DISTANCE, NODE_RADIUS, Point, VELOCITY_DECAY, Viewport,
};

/// Spiral constants for seeding entities without an initial position.
const GOLDEN_ANGLE: f32 = 2.399_963;
const INITIAL_SCATTER: f32 = 10.0;

/// One simulated player node.
///
/// Positions default to NaN, meaning "uninitialized"; the simulation seeds
/// such entities deterministically around their group anchor. While `fx`/`fy`
/// are set the entity tracks that pin instead of the integrated forces.
#[derive(Debug, Clone)]
pub struct Entity {
    pub id: String,
    pub label: String,
    pub group: String,
    pub jersey: Option<u32>,
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub fx: Option<f32>,
    pub fy: Option<f32>,
}

impl Entity {
    pub fn new(
        id: impl Into<String>,
        label: impl Into<String>,
        group: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            group: group.into(),
            jersey: None,
            x: f32::NAN,
            y: f32::NAN,
            vx: 0.0,
            vy: 0.0,
            fx: None,
            fy: None,
        }
    }

    pub fn with_jersey(mut self, jersey: Option<u32>) -> Self {
        self.jersey = jersey;
        self
    }

    pub fn position(&self) -> Point {
        Point {
            x: self.x,
            y: self.y,
        }
    }

    pub fn is_pinned(&self) -> bool {
        self.fx.is_some() && self.fy.is_some()
    }
}

#[derive(Debug, Clone)]
pub struct SimulationConfig {
    pub charge_strength: f32,
    /// Per-entity collision radius; pairs are kept `2 * collide_radius` apart.
    pub collide_radius: f32,
    pub collide_iterations: usize,
    pub anchor_strength: f32,
    pub max_anchor_distance: f32,
    pub clamp_pull: f32,
    pub velocity_decay: f32,
    pub alpha_min: f32,
    pub alpha_decay: f32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            charge_strength: CHARGE_STRENGTH,
            collide_radius: NODE_RADIUS + COLLIDE_PADDING,
            collide_iterations: COLLIDE_ITERATIONS,
            anchor_strength: ANCHOR_STRENGTH,
            max_anchor_distance: MAX_ANCHOR_DISTANCE,
            clamp_pull: CLAMP_PULL,
            velocity_decay: VELOCITY_DECAY,
            alpha_min: ALPHA_MIN,
            alpha_decay: ALPHA_DECAY,
        }
    }
}

/// Continuously-stepped force integrator over the entity collection.
///
/// Each step decays alpha toward its target, accumulates the force stack
/// (repulsion, collision, anchor attraction, distance clamp) into entity
/// velocities, then integrates. Stepping never panics: degenerate geometry
/// is jiggled apart deterministically and unknown groups simply receive no
/// anchor forces.
#[derive(Debug)]
pub struct Simulation {
    entities: Vec<Entity>,
    index: HashMap<String, usize>,
    alpha: f32,
    alpha_target: f32,
    config: SimulationConfig,
}

impl Simulation {
    pub fn new(
        mut entities: Vec<Entity>,
        anchors: &AnchorSet,
        viewport: Viewport,
        config: SimulationConfig,
    ) -> Self {
        let fallback = viewport.center();
        for (i, entity) in entities.iter_mut().enumerate() {
            if entity.x.is_finite() && entity.y.is_finite() {
                continue;
            }
            let seed = anchors.effective(&entity.group).unwrap_or(fallback);
            let radius = INITIAL_SCATTER * (0.5 + i as f32).sqrt();
            let angle = i as f32 * GOLDEN_ANGLE;
            entity.x = seed.x + radius * angle.cos();
            entity.y = seed.y + radius * angle.sin();
            entity.vx = 0.0;
            entity.vy = 0.0;
        }

        let mut index = HashMap::with_capacity(entities.len());
        for (i, entity) in entities.iter().enumerate() {
            index.entry(entity.id.clone()).or_insert(i);
        }

        Self {
            entities,
            index,
            alpha: 1.0,
            alpha_target: 0.0,
            config,
        }
    }

    pub fn step(&mut self, anchors: &AnchorSet) {
        self.alpha += (self.alpha_target - self.alpha) * self.config.alpha_decay;

        self.apply_repulsion();
        self.apply_collision();
        self.apply_anchor_attraction(anchors);
        self.apply_distance_clamp(anchors);

        for entity in &mut self.entities {
            if let (Some(fx), Some(fy)) = (entity.fx, entity.fy) {
                entity.x = fx;
                entity.y = fy;
                entity.vx = 0.0;
                entity.vy = 0.0;
                continue;
            }
            entity.vx *= self.config.velocity_decay;
            entity.vy *= self.config.velocity_decay;
            entity.x += entity.vx;
            entity.y += entity.vy;
        }
    }

    fn apply_repulsion(&mut self) {
        let scale = self.config.charge_strength * self.alpha;
        for i in 0..self.entities.len() {
            for j in (i + 1)..self.entities.len() {
                let mut dx = self.entities[j].x - self.entities[i].x;
                let mut dy = self.entities[j].y - self.entities[i].y;
                let mut d2 = dx * dx + dy * dy;
                if d2 < 1e-6 {
                    (dx, dy) = jiggle(i + j);
                    d2 = dx * dx + dy * dy;
                }
                // Collision, not charge, is responsible for separating
                // near-coincident nodes.
                let w = scale / d2.max(1.0);
                self.entities[i].vx += dx * w;
                self.entities[i].vy += dy * w;
                self.entities[j].vx -= dx * w;
                self.entities[j].vy -= dy * w;
            }
        }
    }

    fn apply_collision(&mut self) {
        let min_dist = 2.0 * self.config.collide_radius;
        for _ in 0..self.config.collide_iterations {
            for i in 0..self.entities.len() {
                for j in (i + 1)..self.entities.len() {
                    // Resolve against where the entities are headed this step.
                    let xi = self.entities[i].x + self.entities[i].vx;
                    let yi = self.entities[i].y + self.entities[i].vy;
                    let xj = self.entities[j].x + self.entities[j].vx;
                    let yj = self.entities[j].y + self.entities[j].vy;

                    let mut dx = xj - xi;
                    let mut dy = yj - yi;
                    let mut d2 = dx * dx + dy * dy;
                    if d2 >= min_dist * min_dist {
                        continue;
                    }
                    if d2 < 1e-6 {
                        (dx, dy) = jiggle(i * 31 + j);
                        d2 = dx * dx + dy * dy;
                    }
                    let d = d2.sqrt();
                    let push = (min_dist - d) / d * 0.5;
                    let ox = dx * push;
                    let oy = dy * push;
                    self.entities[i].vx -= ox;
                    self.entities[i].vy -= oy;
                    self.entities[j].vx += ox;
                    self.entities[j].vy += oy;
                }
            }
        }
    }

    fn apply_anchor_attraction(&mut self, anchors: &AnchorSet) {
        let k = self.config.anchor_strength * self.alpha;
        for entity in &mut self.entities {
            let Some(anchor) = anchors.effective(&entity.group) else {
                continue;
            };
            entity.vx += (anchor.x - entity.x) * k;
            entity.vy += (anchor.y - entity.y) * k;
        }
    }

    fn apply_distance_clamp(&mut self, anchors: &AnchorSet) {
        let max = self.config.max_anchor_distance;
        for entity in &mut self.entities {
            let Some(anchor) = anchors.effective(&entity.group) else {
                continue;
            };
            let dx = entity.x - anchor.x;
            let dy = entity.y - anchor.y;
            let dist = (dx * dx + dy * dy).sqrt();
            if dist <= max || dist <= f32::EPSILON {
                continue;
            }
            let pull = (dist - max) * self.config.clamp_pull;
            entity.vx -= dx / dist * pull;
            entity.vy -= dy / dist * pull;
        }
    }

    pub fn pin(&mut self, id: &str, x: f32, y: f32) -> bool {
        let Some(&i) = self.index.get(id) else {
            return false;
        };
        self.entities[i].fx = Some(x);
        self.entities[i].fy = Some(y);
        true
    }

    pub fn unpin(&mut self, id: &str) -> bool {
        let Some(&i) = self.index.get(id) else {
            return false;
        };
        self.entities[i].fx = None;
        self.entities[i].fy = None;
        true
    }

    pub fn get(&self, id: &str) -> Option<&Entity> {
        self.index.get(id).map(|&i| &self.entities[i])
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn positions(&self) -> HashMap<String, Point> {
        self.entities
            .iter()
            .map(|entity| (entity.id.clone(), entity.position()))
            .collect()
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    pub fn set_alpha_target(&mut self, target: f32) {
        self.alpha_target = target;
    }

    /// Raise alpha (never lower it) after a structural change.
    pub fn reheat(&mut self, alpha: f32) {
        self.alpha = self.alpha.max(alpha);
    }

    pub fn is_settled(&self) -> bool {
        self.alpha < self.config.alpha_min
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

/// Coincident points are nudged apart along an index-derived direction so
/// pairwise math never divides by zero and repeated runs stay identical.
fn jiggle(seed: usize) -> (f32, f32) {
    let angle = seed as f32 * GOLDEN_ANGLE;
    (1e-3 * angle.cos(), 1e-3 * angle.sin())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn one_group() -> (Vec<String>, AnchorSet, Viewport) {
        let groups = vec!["GS".to_string()];
        let viewport = Viewport::new(800.0, 500.0);
        let anchors = AnchorSet::new(&groups, viewport);
        (groups, anchors, viewport)
    }

    fn entity(i: usize) -> Entity {
        Entity::new(format!("p{i}"), format!("P {i}"), "GS")
    }

    #[test]
    fn uninitialized_entities_are_seeded_deterministically() {
        let (_, anchors, viewport) = one_group();
        let make = || {
            Simulation::new(
                (0..4).map(entity).collect(),
                &anchors,
                viewport,
                SimulationConfig::default(),
            )
        };
        let a = make();
        let b = make();
        for (ea, eb) in a.entities().iter().zip(b.entities()) {
            assert!(ea.x.is_finite() && ea.y.is_finite());
            assert_eq!(ea.x, eb.x);
            assert_eq!(ea.y, eb.y);
        }
    }

    #[test]
    fn coincident_entities_do_not_produce_nan() {
        let (_, anchors, viewport) = one_group();
        let mut entities: Vec<Entity> = (0..3).map(entity).collect();
        for e in &mut entities {
            e.x = 400.0;
            e.y = 250.0;
        }
        let mut sim = Simulation::new(entities, &anchors, viewport, SimulationConfig::default());
        for _ in 0..50 {
            sim.step(&anchors);
        }
        for e in sim.entities() {
            assert!(e.x.is_finite() && e.y.is_finite(), "{:?} went non-finite", e.id);
        }
    }

    #[test]
    fn alpha_decays_toward_zero_then_settles() {
        let (_, anchors, viewport) = one_group();
        let mut sim = Simulation::new(
            vec![entity(0)],
            &anchors,
            viewport,
            SimulationConfig::default(),
        );
        let mut previous = sim.alpha();
        for _ in 0..320 {
            sim.step(&anchors);
            assert!(sim.alpha() < previous);
            previous = sim.alpha();
        }
        assert!(sim.is_settled());
    }

    #[test]
    fn alpha_rises_toward_an_elevated_target() {
        let (_, anchors, viewport) = one_group();
        let mut sim = Simulation::new(
            vec![entity(0)],
            &anchors,
            viewport,
            SimulationConfig::default(),
        );
        for _ in 0..400 {
            sim.step(&anchors);
        }
        sim.set_alpha_target(0.3);
        for _ in 0..200 {
            sim.step(&anchors);
        }
        assert!(sim.alpha() > 0.25, "alpha was {}", sim.alpha());
    }

    #[test]
    fn pinned_entity_ignores_forces() {
        let (_, anchors, viewport) = one_group();
        let mut sim = Simulation::new(
            (0..5).map(entity).collect(),
            &anchors,
            viewport,
            SimulationConfig::default(),
        );
        assert!(sim.pin("p2", 120.0, 80.0));
        for _ in 0..40 {
            sim.step(&anchors);
            let e = sim.get("p2").unwrap();
            assert_eq!(e.position(), Point::new(120.0, 80.0));
        }
        assert!(sim.unpin("p2"));
        assert!(!sim.get("p2").unwrap().is_pinned());
    }

    #[test]
    fn unknown_ids_are_rejected() {
        let (_, anchors, viewport) = one_group();
        let mut sim = Simulation::new(
            vec![entity(0)],
            &anchors,
            viewport,
            SimulationConfig::default(),
        );
        assert!(!sim.pin("nope", 0.0, 0.0));
        assert!(!sim.unpin("nope"));
        assert!(sim.get("nope").is_none());
    }
}
