use std::collections::HashMap;

use crate::interaction::{InteractionController, InteractionMode, ViewTransform};
use crate::layout::AnchorSet;
use crate::roster::Palette;
use crate::simulation::{Entity, Simulation, SimulationConfig};
use crate::{NODE_RADIUS, Point, RESIZE_REHEAT_ALPHA, Viewport};

/// One running roster visualization: the entity simulation, its team
/// anchors, the interaction state, and the palette for rendering.
///
/// A graph is built wholesale from a roster selection and replaced wholesale
/// when the selection changes; there is no incremental patching. All methods
/// are synchronous and expect to be driven from a single animation loop.
#[derive(Debug)]
pub struct RosterGraph {
    viewport: Viewport,
    groups: Vec<String>,
    palette: Palette,
    anchors: AnchorSet,
    simulation: Simulation,
    controller: InteractionController,
    data_error: Option<String>,
}

impl RosterGraph {
    pub fn new(
        entities: Vec<Entity>,
        groups: Vec<String>,
        palette: Palette,
        viewport: Viewport,
        mode: InteractionMode,
    ) -> Self {
        let anchors = AnchorSet::new(&groups, viewport);
        let simulation = Simulation::new(entities, &anchors, viewport, SimulationConfig::default());
        Self {
            viewport,
            groups,
            palette,
            anchors,
            simulation,
            controller: InteractionController::new(mode),
            data_error: None,
        }
    }

    /// The valid "nothing selected" state: zero entities, still steppable.
    pub fn empty(viewport: Viewport, mode: InteractionMode) -> Self {
        Self::new(Vec::new(), Vec::new(), Palette::default(), viewport, mode)
    }

    /// The "data unavailable" state after a failed fetch: zero entities plus
    /// a message for the render layer. Never panics, never throws.
    pub fn unavailable(viewport: Viewport, mode: InteractionMode, message: impl Into<String>) -> Self {
        let mut graph = Self::empty(viewport, mode);
        graph.data_error = Some(message.into());
        graph
    }

    pub fn step_once(&mut self) {
        self.simulation.step(&self.anchors);
    }

    pub fn run(&mut self, steps: usize) {
        for _ in 0..steps {
            self.step_once();
        }
    }

    pub fn positions(&self) -> HashMap<String, Point> {
        self.simulation.positions()
    }

    pub fn drag_start(&mut self, id: &str) -> bool {
        self.controller.drag_start(&mut self.simulation, id)
    }

    /// Coordinates are in simulation space (pre-transform).
    pub fn drag_move(&mut self, id: &str, x: f32, y: f32) -> bool {
        self.controller
            .drag_move(&mut self.simulation, &mut self.anchors, id, x, y)
    }

    pub fn drag_end(&mut self, id: &str) -> bool {
        self.controller.drag_end(&mut self.simulation, id)
    }

    pub fn pan(&mut self, dx: f32, dy: f32) -> bool {
        self.controller
            .pan(&mut self.simulation, &mut self.anchors, dx, dy)
    }

    pub fn zoom(&mut self, factor: f32, focal: Point) {
        self.controller.zoom(factor, focal);
    }

    /// Recompute anchor bases for the new viewport (user offsets survive)
    /// and reheat so entities migrate instead of jumping.
    pub fn resize(&mut self, width: f32, height: f32) {
        self.viewport = Viewport::new(width, height);
        self.anchors.recompute(&self.groups, self.viewport);
        self.simulation.reheat(RESIZE_REHEAT_ALPHA);
    }

    /// Hit-test a screen-space point, for hover tooltips.
    pub fn entity_at(&self, screen: Point) -> Option<&Entity> {
        let point = self.controller.transform().to_simulation(screen);
        self.simulation
            .entities()
            .iter()
            .find(|entity| entity.position().distance(point) <= NODE_RADIUS)
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn groups(&self) -> &[String] {
        &self.groups
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    pub fn anchors(&self) -> &AnchorSet {
        &self.anchors
    }

    pub fn entities(&self) -> &[Entity] {
        self.simulation.entities()
    }

    pub fn transform(&self) -> ViewTransform {
        self.controller.transform()
    }

    pub fn mode(&self) -> InteractionMode {
        self.controller.mode()
    }

    pub fn dragging(&self) -> Option<&str> {
        self.controller.dragging()
    }

    pub fn alpha(&self) -> f32 {
        self.simulation.alpha()
    }

    pub fn is_settled(&self) -> bool {
        self.simulation.is_settled()
    }

    pub fn data_error(&self) -> Option<&str> {
        self.data_error.as_deref()
    }
}
