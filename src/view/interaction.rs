//! Pointer and wheel handling: drag-to-rotate, wheel-to-zoom, click-to-lock.

use serde::Serialize;

use super::projection::{Projector, ViewState};
use crate::options::{PointerButton, PuzzleOptions};
use crate::scene::{Scene, SourceId, ToggleOutcome};
use crate::services::{AudioCue, AudioSink};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScreenPoint {
    pub x: f64,
    pub y: f64,
}

impl ScreenPoint {
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    #[must_use]
    pub fn distance_to(self, other: Self) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

#[derive(Debug, Clone, Copy)]
struct Drag {
    last: ScreenPoint,
    travelled: f64,
}

/// Turns raw input into view changes and lock toggles.
///
/// Only the configured drag button rotates the view. A press that travels more
/// than `click_slop` pixels is a drag, and the click the host reports on release
/// is swallowed so a rotation never toggles a lock by accident.
#[derive(Debug, Clone)]
pub struct InteractionController {
    sensitivity: f64,
    max_pitch: f64,
    zoom_speed: f64,
    zoom_range: (f64, f64),
    pick_radius: f64,
    drag_button: PointerButton,
    click_slop: f64,
    max_locked: usize,

    drag: Option<Drag>,
    swallow_click: bool,
}

impl InteractionController {
    #[must_use]
    pub fn new(options: &PuzzleOptions) -> Self {
        Self {
            sensitivity: options.rotation_sensitivity,
            max_pitch: options.max_pitch,
            zoom_speed: options.zoom_speed,
            zoom_range: (options.min_zoom, options.max_zoom),
            pick_radius: options.pick_radius,
            drag_button: options.drag_button,
            click_slop: options.click_slop,
            max_locked: options.max_locked,
            drag: None,
            swallow_click: false,
        }
    }

    #[must_use]
    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// Returns `true` when the press starts a rotation drag.
    pub fn pointer_down(&mut self, at: ScreenPoint, button: PointerButton) -> bool {
        self.swallow_click = false;
        if button != self.drag_button {
            return false;
        }
        self.drag = Some(Drag {
            last: at,
            travelled: 0.0,
        });
        true
    }

    /// Rotates the view while dragging. Returns `true` when the view changed.
    pub fn pointer_move(&mut self, at: ScreenPoint, view: &mut ViewState) -> bool {
        let Some(drag) = self.drag.as_mut() else {
            return false;
        };
        let dx = at.x - drag.last.x;
        let dy = at.y - drag.last.y;
        if !(dx.is_finite() && dy.is_finite()) || (dx == 0.0 && dy == 0.0) {
            return false;
        }
        drag.travelled += dx.hypot(dy);
        drag.last = at;
        view.rotate_by(dx, dy, self.sensitivity, self.max_pitch);
        true
    }

    pub fn pointer_up(&mut self, _at: ScreenPoint) {
        if let Some(drag) = self.drag.take() {
            self.swallow_click = drag.travelled > self.click_slop;
        }
    }

    /// Applies a wheel delta to the zoom. Returns `true` when the zoom changed.
    pub fn wheel(&mut self, delta_y: f64, view: &mut ViewState) -> bool {
        if !delta_y.is_finite() {
            return false;
        }
        let before = view.zoom;
        view.zoom_by(delta_y, self.zoom_speed, self.zoom_range.0, self.zoom_range.1);
        view.zoom != before
    }

    /// Nearest source whose projected position lies within the pick radius.
    ///
    /// The radius is fixed in screen pixels and does not follow marker scale.
    #[must_use]
    pub fn pick(&self, at: ScreenPoint, scene: &Scene, projector: &Projector) -> Option<SourceId> {
        scene
            .sources()
            .iter()
            .filter_map(|source| {
                let projected = projector.project(source.position);
                if projected.behind_camera {
                    return None;
                }
                let distance = at.distance_to(ScreenPoint::new(projected.x, projected.y));
                (distance <= self.pick_radius).then_some((source.id, distance))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(id, _)| id)
    }

    /// Toggles the lock of the source under the pointer.
    ///
    /// Emits exactly one [`AudioCue::Click`] per accepted lock or unlock; a full
    /// lock set, an empty spot or a click ending a drag is silently ignored.
    pub fn click(
        &mut self,
        at: ScreenPoint,
        scene: &mut Scene,
        projector: &Projector,
        audio: &mut dyn AudioSink,
    ) -> ToggleOutcome {
        if std::mem::take(&mut self.swallow_click) {
            return ToggleOutcome::Missed;
        }
        let Some(id) = self.pick(at, scene, projector) else {
            return ToggleOutcome::Missed;
        };
        let outcome = scene.toggle_lock(id, self.max_locked);
        if outcome.changed() {
            audio.play(AudioCue::Click);
        }
        outcome
    }
}
