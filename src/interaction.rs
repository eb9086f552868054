use serde::Serialize;

use crate::layout::AnchorSet;
use crate::simulation::Simulation;
use crate::{DRAG_ALPHA_TARGET, Point, ZOOM_MAX, ZOOM_MIN};

/// Pointer interaction mode, chosen when the graph is built. The two modes
/// are mutually exclusive for the lifetime of a simulation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum InteractionMode {
    /// Dragging an entity pins it to the pointer and pulls its whole team
    /// along via the group offset.
    Drag,
    /// Pointer movement anywhere shifts every team through the shared
    /// global offset; nothing is pinned.
    Pan,
}

impl InteractionMode {
    pub fn as_str(self) -> &'static str {
        match self {
            InteractionMode::Drag => "drag",
            InteractionMode::Pan => "pan",
        }
    }
}

impl std::fmt::Display for InteractionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Scale + translate applied to the rendered scene only. Simulation
/// coordinates are never touched by zooming.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ViewTransform {
    pub scale: f32,
    pub translate: Point,
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self {
            scale: 1.0,
            translate: Point::ZERO,
        }
    }
}

impl ViewTransform {
    /// Scale by `factor` about `focal` (a screen-space point), keeping the
    /// simulation point under the focal stationary. The resulting scale is
    /// clamped to [ZOOM_MIN, ZOOM_MAX].
    pub fn zoom(&mut self, factor: f32, focal: Point) {
        if !factor.is_finite() || factor <= 0.0 {
            return;
        }
        let target = (self.scale * factor).clamp(ZOOM_MIN, ZOOM_MAX);
        let applied = target / self.scale;
        self.translate.x = focal.x - (focal.x - self.translate.x) * applied;
        self.translate.y = focal.y - (focal.y - self.translate.y) * applied;
        self.scale = target;
    }

    pub fn to_screen(&self, p: Point) -> Point {
        Point {
            x: p.x * self.scale + self.translate.x,
            y: p.y * self.scale + self.translate.y,
        }
    }

    pub fn to_simulation(&self, p: Point) -> Point {
        Point {
            x: (p.x - self.translate.x) / self.scale,
            y: (p.y - self.translate.y) / self.scale,
        }
    }
}

#[derive(Debug, Clone)]
struct DragGesture {
    entity: String,
    group: String,
    last: Point,
}

/// Translates pointer input into simulation and anchor mutations.
///
/// While a drag gesture is active the controller holds exclusive use of the
/// dragged entity's pin and releases it on `drag_end`. All methods are plain
/// synchronous mutations; the caller drives them from the same loop that
/// steps the simulation.
#[derive(Debug)]
pub struct InteractionController {
    mode: InteractionMode,
    drag: Option<DragGesture>,
    transform: ViewTransform,
}

impl InteractionController {
    pub fn new(mode: InteractionMode) -> Self {
        Self {
            mode,
            drag: None,
            transform: ViewTransform::default(),
        }
    }

    pub fn mode(&self) -> InteractionMode {
        self.mode
    }

    pub fn transform(&self) -> ViewTransform {
        self.transform
    }

    pub fn dragging(&self) -> Option<&str> {
        self.drag.as_ref().map(|gesture| gesture.entity.as_str())
    }

    /// Begin dragging `id`: pin it where it stands and hold the simulation
    /// at the interaction alpha target. Returns false when the mode is not
    /// `Drag` or the entity does not exist.
    pub fn drag_start(&mut self, simulation: &mut Simulation, id: &str) -> bool {
        if self.mode != InteractionMode::Drag {
            return false;
        }
        let Some(entity) = simulation.get(id) else {
            return false;
        };
        let position = entity.position();
        let group = entity.group.clone();
        simulation.pin(id, position.x, position.y);
        simulation.set_alpha_target(DRAG_ALPHA_TARGET);
        self.drag = Some(DragGesture {
            entity: id.to_string(),
            group,
            last: position,
        });
        true
    }

    /// Move the active drag to `(x, y)` in simulation space. The pointer
    /// delta is also folded into the group's anchor offset so the rest of
    /// the team follows the dragged entity.
    pub fn drag_move(
        &mut self,
        simulation: &mut Simulation,
        anchors: &mut AnchorSet,
        id: &str,
        x: f32,
        y: f32,
    ) -> bool {
        let Some(gesture) = self.drag.as_mut() else {
            return false;
        };
        if gesture.entity != id {
            return false;
        }
        simulation.pin(id, x, y);
        anchors.shift_group(&gesture.group, x - gesture.last.x, y - gesture.last.y);
        gesture.last = Point::new(x, y);
        true
    }

    /// Release the active drag: clear the pin and let alpha decay again.
    pub fn drag_end(&mut self, simulation: &mut Simulation, id: &str) -> bool {
        let Some(gesture) = self.drag.as_ref() else {
            return false;
        };
        if gesture.entity != id {
            return false;
        }
        simulation.unpin(id);
        simulation.set_alpha_target(0.0);
        self.drag = None;
        true
    }

    /// Shift all groups by `(dx, dy)` in simulation space. Only legal in
    /// `Pan` mode. Each delta bumps alpha so the layout stays animated for
    /// the duration of the gesture.
    pub fn pan(
        &mut self,
        simulation: &mut Simulation,
        anchors: &mut AnchorSet,
        dx: f32,
        dy: f32,
    ) -> bool {
        if self.mode != InteractionMode::Pan {
            return false;
        }
        anchors.shift_all(dx, dy);
        simulation.reheat(DRAG_ALPHA_TARGET);
        true
    }

    pub fn zoom(&mut self, factor: f32, focal: Point) {
        self.transform.zoom(factor, focal);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn zoom_clamps_to_bounds() {
        let mut transform = ViewTransform::default();
        transform.zoom(100.0, Point::ZERO);
        assert_eq!(transform.scale, ZOOM_MAX);
        transform.zoom(1e-6, Point::ZERO);
        assert_eq!(transform.scale, ZOOM_MIN);
    }

    #[test]
    fn zoom_keeps_the_focal_point_fixed() {
        let mut transform = ViewTransform::default();
        let focal = Point::new(400.0, 250.0);
        let under_focal = transform.to_simulation(focal);
        transform.zoom(2.0, focal);
        let after = transform.to_screen(under_focal);
        assert_relative_eq!(after.x, focal.x, epsilon = 1e-3);
        assert_relative_eq!(after.y, focal.y, epsilon = 1e-3);
    }

    #[test]
    fn screen_and_simulation_mappings_round_trip() {
        let mut transform = ViewTransform::default();
        transform.zoom(1.7, Point::new(120.0, 90.0));
        let p = Point::new(333.0, -41.5);
        let back = transform.to_simulation(transform.to_screen(p));
        assert_relative_eq!(back.x, p.x, epsilon = 1e-3);
        assert_relative_eq!(back.y, p.y, epsilon = 1e-3);
    }

    #[test]
    fn ignores_degenerate_zoom_factors() {
        let mut transform = ViewTransform::default();
        transform.zoom(0.0, Point::ZERO);
        transform.zoom(f32::NAN, Point::ZERO);
        assert_eq!(transform.scale, 1.0);
    }
}
