pub mod graph;
pub mod interaction;
pub mod layout;
pub mod render;
pub mod roster;
#[cfg(feature = "server")]
pub mod serve;
pub mod simulation;
pub mod utils;

pub use graph::RosterGraph;
pub use interaction::{InteractionController, InteractionMode, ViewTransform};
pub use layout::{AnchorSet, compute_anchors};
pub use render::render_svg;
pub use roster::{
    BuiltRoster, Palette, RosterDocument, RosterError, TeamColors, build_entities, fetch_roster,
    read_roster,
};
pub use simulation::{Entity, Simulation, SimulationConfig};
pub use utils::{escape_xml, parse_team_list};

use serde::{Deserialize, Serialize};

/// Visual radius of a player node.
pub const NODE_RADIUS: f32 = 36.0;
/// Extra spacing enforced between node rims by collision resolution.
pub const COLLIDE_PADDING: f32 = 10.0;
/// Many-body charge; negative values repel.
pub const CHARGE_STRENGTH: f32 = -80.0;
/// Pull toward the owning team's anchor, scaled by alpha.
pub const ANCHOR_STRENGTH: f32 = 0.08;
/// Beyond this distance from its anchor a node is pulled back in.
pub const MAX_ANCHOR_DISTANCE: f32 = 220.0;
/// Strength of the inward pull past MAX_ANCHOR_DISTANCE.
pub const CLAMP_PULL: f32 = 0.15;
/// Velocity multiplier applied after force accumulation.
pub const VELOCITY_DECAY: f32 = 0.5;
/// Below this alpha the simulation is considered settled.
pub const ALPHA_MIN: f32 = 0.001;
/// Per-step convergence rate of alpha toward its target
/// (1 - ALPHA_MIN^(1/300), i.e. ~300 steps from 1.0 to the floor).
pub const ALPHA_DECAY: f32 = 0.022_763;
/// Alpha target held while a drag or pan gesture is active.
pub const DRAG_ALPHA_TARGET: f32 = 0.3;
/// Alpha restored after a viewport resize so nodes migrate visibly.
pub const RESIZE_REHEAT_ALPHA: f32 = 0.5;
/// Radial gap between successive anchor rings.
pub const RING_SPACING: f32 = 300.0;
/// Minimum distance between any two team anchors.
pub const MIN_GROUP_SEPARATION: f32 = 240.0;
/// Per-ring angular phase offset, keeps rings off axis alignment.
pub const RING_PHASE: f32 = std::f32::consts::FRAC_PI_6;
pub const ZOOM_MIN: f32 = 0.5;
pub const ZOOM_MAX: f32 = 4.0;
pub const COLLIDE_ITERATIONS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const ZERO: Point = Point { x: 0.0, y: 0.0 };

    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(self, other: Point) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn center(self) -> Point {
        Point {
            x: self.width / 2.0,
            y: self.height / 2.0,
        }
    }
}
